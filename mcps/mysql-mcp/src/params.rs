//! Parameter types for MySQL MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(description = "SQL to run. It executes inside a read-only transaction that is always rolled back.")]
    pub sql: String,
}
