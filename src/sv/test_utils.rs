//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema,
  };

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    // Create affiliate table
    let stmt = schema.create_table_from_entity(affiliate::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    // Create downline table
    let stmt = schema.create_table_from_entity(downline::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }
}
