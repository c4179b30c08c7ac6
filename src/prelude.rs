pub use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
  time::Duration,
};

pub use chrono::{NaiveDateTime as DateTime, Utc};
pub use sea_orm::{
  ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection,
  EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
pub use tracing::{debug, error, info, trace, warn};

pub use crate::error::{Error, Result};
