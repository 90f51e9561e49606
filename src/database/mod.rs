pub mod db;
pub mod db_structs;

use std::collections::HashMap;

use thiserror::Error;

use db_structs::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String)
}

/// Durable user repository consumed by the engine and the service.
///
/// Paged reads are ordered by rating descending, then username ascending;
/// username matching is case-insensitive. `update_user_rating` is an
/// idempotent write. `all_rating_counts` is read once at engine startup.
#[allow(async_fn_in_trait)]
pub trait UserStore: Send + Sync {
    async fn top_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError>;

    async fn search_users(&self, pattern: &str, limit: i64, offset: i64) -> Result<Vec<User>, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<User, StoreError>;

    async fn update_user_rating(&self, user_id: i64, new_rating: i32) -> Result<(), StoreError>;

    async fn all_rating_counts(&self) -> Result<HashMap<i32, i64>, StoreError>;

    async fn random_users(&self, count: i64) -> Result<Vec<User>, StoreError>;
}
