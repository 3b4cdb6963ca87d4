//! Schema fetch adapter over the platform API client

use std::sync::Arc;

use async_trait::async_trait;
use modsync_core::SchemaSource;
use modsync_domain::{Result, SchemaDefinition};
use tracing::{debug, instrument};

use super::client::ResilientHttpClient;

/// Fetches the live schema for one tenant with `GET {schema_path}`
#[derive(Debug, Clone)]
pub struct HttpSchemaSource {
    client: Arc<ResilientHttpClient>,
    tenant_id: String,
    schema_path: String,
}

impl HttpSchemaSource {
    pub fn new(
        client: Arc<ResilientHttpClient>,
        tenant_id: impl Into<String>,
        schema_path: impl Into<String>,
    ) -> Self {
        Self { client, tenant_id: tenant_id.into(), schema_path: schema_path.into() }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

#[async_trait]
impl SchemaSource for HttpSchemaSource {
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id, path = %self.schema_path))]
    async fn fetch_schema(&self) -> Result<SchemaDefinition> {
        let schema: SchemaDefinition = self.client.get(&self.tenant_id, &self.schema_path).await?;
        debug!(version = %schema.version, field_types = schema.field_types.len(), "Fetched schema");
        Ok(schema)
    }
}
