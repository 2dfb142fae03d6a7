use tracing::warn;

use crate::schema::field_model::FieldSpec;
use crate::schema::loader::parse_schema;

const KYC_SCHEMA: &str = include_str!("../../schemas/kyc.json");

/// The bundled KYC intake schema, used until a schema has been saved.
pub fn default_schema() -> Vec<FieldSpec> {
    match parse_schema(KYC_SCHEMA) {
        Ok(fields) => fields,
        Err(e) => {
            warn!("bundled schema failed to load: {}", e);
            Vec::new()
        }
    }
}
