//! Macro for implementing Display and FromStr for domain enums
//!
//! Diff and sync enums carry a fixed wire string per variant (the same one
//! serde uses). This macro keeps `Display`/`FromStr` in step with it.
//!
//! # Example
//!
//! ```rust
//! use modsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum RolloutStage {
//!     Staged,
//!     Applied,
//!     RolledBack,
//! }
//!
//! impl_domain_status_conversions!(RolloutStage {
//!     Staged => "staged",
//!     Applied => "applied",
//!     RolledBack => "rolled_back",
//! });
//!
//! assert_eq!(RolloutStage::RolledBack.to_string(), "rolled_back");
//! assert_eq!("APPLIED".parse::<RolloutStage>(), Ok(RolloutStage::Applied));
//! ```

/// Implements Display and FromStr traits for domain enums
///
/// - `Display` writes the mapped string exactly
/// - `FromStr` lowercases its input before matching, so mapped strings
///   must be lowercase
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Preparation,
        Migration,
        PostCheck,
    }

    impl_domain_status_conversions!(Phase {
        Preparation => "preparation",
        Migration => "migration",
        PostCheck => "post-check",
    });

    #[test]
    fn test_display_uses_mapped_string() {
        assert_eq!(Phase::Preparation.to_string(), "preparation");
        assert_eq!(Phase::PostCheck.to_string(), "post-check");
    }

    #[test]
    fn test_fromstr_is_case_insensitive() {
        assert_eq!(Phase::from_str("MIGRATION").unwrap(), Phase::Migration);
        assert_eq!(Phase::from_str("Post-Check").unwrap(), Phase::PostCheck);
    }

    #[test]
    fn test_fromstr_rejects_unknown() {
        let err = Phase::from_str("rollback").unwrap_err();
        assert!(err.contains("Invalid Phase: rollback"));
        assert!(Phase::from_str("").is_err());
    }

    #[test]
    fn test_roundtrip() {
        for phase in [Phase::Preparation, Phase::Migration, Phase::PostCheck] {
            assert_eq!(Phase::from_str(&phase.to_string()).unwrap(), phase);
        }
    }
}
