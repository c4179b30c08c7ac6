use migration::{Migrator, MigratorTrait};

use crate::prelude::*;

pub struct AppState {
  pub db: DatabaseConnection,
  pub admins: HashSet<i64>,
  pub secret: String,
}

impl AppState {
  pub async fn new(db_url: &str, admins: HashSet<i64>, secret: String) -> Self {
    let db = Database::connect(db_url)
      .await
      .expect("Failed to connect to database");

    Migrator::up(&db, None).await.expect("Failed to run migrations");

    Self { db, admins, secret }
  }
}
