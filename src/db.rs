use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::debug;

use crate::error::AppResult;

const SCHEMA: &str = include_str!("../schema.sql");

pub async fn connect(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA journal_mode=WAL".to_string(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA synchronous=NORMAL".to_string(),
    ))
    .await?;

    Ok(db)
}

// Recreates the catalog schema from scratch. Each statement runs in
// isolation; the first failure aborts the run before any data is staged.
pub async fn bootstrap(db: &DatabaseConnection) -> AppResult<()> {
    let mut executed = 0usize;
    for stmt in SCHEMA.split(';') {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }
        db.execute(Statement::from_string(db.get_database_backend(), stmt.to_string())).await?;
        executed += 1;
    }
    debug!(statements = executed, "schema bootstrapped");
    Ok(())
}
