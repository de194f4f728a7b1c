use crate::{
    capabilities::TableStore,
    database::{DbConnection, PgPool},
    errors::CleanupError,
    models::{AuthenticatedIdentity, CleanupOutcome, CleanupTarget},
    utils::regex_utils,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::RunQueryDsl;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Table store backed by Postgres through the shared diesel pool.
#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
    owner_column: String,
}

impl PgTableStore {
    pub fn new(pool: PgPool, owner_column: impl Into<String>) -> Self {
        Self {
            pool,
            owner_column: owner_column.into(),
        }
    }
}

fn delete_statement(table: &str, owner_column: &str) -> Result<String> {
    for name in [table, owner_column] {
        if !regex_utils::SQL_IDENTIFIER_REGEX.is_match(name) {
            anyhow::bail!("'{}' is not a valid SQL identifier", name);
        }
    }

    Ok(format!(
        r#"DELETE FROM "{}" WHERE "{}" = $1"#,
        table, owner_column
    ))
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn delete_by_owner(&self, table: &str, owner: Uuid) -> Result<usize> {
        let statement = delete_statement(table, &self.owner_column)?;
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || -> Result<usize> {
            let mut conn: DbConnection = pool.get().context("Failed to get database connection")?;

            diesel::sql_query(statement)
                .bind::<diesel::sql_types::Uuid, _>(owner)
                .execute(&mut conn)
                .context("Failed to delete owned rows")
        })
        .await
        .context("Delete task did not complete")?
    }
}

#[derive(Clone)]
pub struct RecordCleaner {
    store: Arc<dyn TableStore>,
}

impl RecordCleaner {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Deletes every row of `table` owned by the identity. Zero rows is success.
    pub async fn clean(&self, table: &str, identity: &AuthenticatedIdentity) -> CleanupOutcome {
        let target = CleanupTarget::Table {
            table: table.to_string(),
        };

        match self.store.delete_by_owner(table, identity.id).await {
            Ok(rows) => {
                debug!(table, identity = %identity, rows, "Owned rows deleted");
                CleanupOutcome::succeeded(target)
            }
            Err(source) => {
                let err = CleanupError { target, source };
                warn!(identity = %identity, "{}", err);
                CleanupOutcome::failed(err.target, format!("{:#}", err.source))
            }
        }
    }
}

#[cfg(test)]
#[path = "record_cleaner_tests.rs"]
mod tests;
