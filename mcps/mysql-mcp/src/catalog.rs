//! Resource catalog: one schema resource per table

use crate::db::{Database, DbError};
use crate::types::{ColumnDescriptor, ResourceDescriptor, ServerError};
use crate::uri::{parse_table_name, ResourceBase};

/// Describe every table of the current database as a schema resource
pub async fn list_resources(
    db: &dyn Database,
    base: &ResourceBase,
) -> Result<Vec<ResourceDescriptor>, DbError> {
    let tables = db.list_tables().await?;
    tracing::info!("Listing {} table schema resource(s)", tables.len());

    Ok(tables
        .into_iter()
        .map(|table| {
            let uri = base.format(&table);
            ResourceDescriptor::new(table, uri)
        })
        .collect())
}

/// Columns of the table a schema URI points at
///
/// The URI is validated before any database work. A table that does not
/// exist reads as an empty column list.
pub async fn read_schema(db: &dyn Database, uri: &str) -> Result<Vec<ColumnDescriptor>, ServerError> {
    let table = parse_table_name(uri)?;
    tracing::debug!(table = %table, "Reading table schema");
    Ok(db.table_columns(&table).await?)
}
