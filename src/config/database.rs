//! Database configuration module.
//!
//! Handles the `SQLite` connection behind the key-value store and creates its
//! table from the entity definition using `SeaORM`'s schema generation.

use crate::entities::KvEntry;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/loan_buddy.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Creates the directory holding a file-backed `SQLite` database, if any.
///
/// `SQLite` creates the file itself (`mode=rwc`) but not missing directories.
pub fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the key-value table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut kv_table = schema.create_table_from_entity(KvEntry);
    kv_table.if_not_exists();

    db.execute(builder.build(&kv_table)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::KvEntryModel;
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<KvEntryModel> = KvEntry::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_dir_ignores_memory_databases() -> Result<()> {
        ensure_sqlite_dir("sqlite::memory:")?;
        ensure_sqlite_dir("sqlite://plain.sqlite?mode=rwc")?;
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_dir_creates_parent() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("loan_buddy_test_{}", std::process::id()));
        let url = format!("sqlite://{}/nested/db.sqlite?mode=rwc", dir.display());

        ensure_sqlite_dir(&url)?;

        assert!(dir.join("nested").is_dir());
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
