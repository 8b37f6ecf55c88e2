//! SQLite-backed release sink

use super::ReleaseSink;
use crate::error::ReleaseResult;
use async_trait::async_trait;
use htan_common::db;
use htan_common::Table;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Release warehouse stored in one SQLite file
#[derive(Clone)]
pub struct SqliteWarehouse {
    pool: SqlitePool,
}

impl SqliteWarehouse {
    pub async fn open(path: &Path) -> ReleaseResult<Self> {
        let pool = db::init_warehouse(path).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn list_tables(&self) -> ReleaseResult<Vec<String>> {
        Ok(db::list_tables(&self.pool).await?)
    }
}

#[async_trait]
impl ReleaseSink for SqliteWarehouse {
    async fn write_table(&self, name: &str, table: &Table) -> ReleaseResult<()> {
        db::write_table(&self.pool, name, table).await?;
        info!(table = name, rows = table.len(), "Published table");
        Ok(())
    }

    async fn read_table(&self, name: &str) -> ReleaseResult<Option<Table>> {
        if !db::table_exists(&self.pool, name).await? {
            return Ok(None);
        }
        Ok(Some(db::read_table(&self.pool, name).await?))
    }
}
