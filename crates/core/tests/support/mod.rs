//! Shared test helpers for `modsync-core` integration tests.
//!
//! Schema builders plus in-memory implementations of every sync port, so
//! service tests can script upstream behaviour and inspect what was
//! persisted and emitted.

#![allow(dead_code)]

pub mod repositories;
pub mod schemas;
