use std::{collections::HashMap, sync::Arc};

use itertools::Itertools;
use tokio_postgres::{Client, NoTls, Row};

use crate::{
    constants::{MAX_RATING, MIN_RATING},
    database::{db_structs::User, StoreError, UserStore}
};

#[derive(Clone)]
pub struct DbClient {
    client: Arc<Client>
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

        // Spawn the connection object to run in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("database connection error: {}", e);
            }
        });

        Ok(DbClient {
            client: Arc::new(client)
        })
    }

    /// Verifies the persisted layout the ranking engine relies on: unique
    /// usernames and ratings constrained to the supported range. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let schema = format!(
            "CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                rating INT NOT NULL CHECK (rating BETWEEN {MIN_RATING} AND {MAX_RATING})
            );

            CREATE INDEX IF NOT EXISTS idx_users_rating ON users (rating DESC);

            CREATE INDEX IF NOT EXISTS idx_users_username_lower ON users (LOWER(username));"
        );

        self.client.batch_execute(&schema).await?;
        Ok(())
    }

    fn user_from_row(row: &Row) -> User {
        User {
            id: row.get("id"),
            username: row.get("username"),
            rating: row.get("rating")
        }
    }
}

impl UserStore for DbClient {
    async fn top_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT id, username, rating FROM users \
                 ORDER BY rating DESC, username ASC \
                 LIMIT $1 OFFSET $2",
                &[&limit, &offset]
            )
            .await?;

        Ok(rows.iter().map(Self::user_from_row).collect_vec())
    }

    async fn search_users(&self, pattern: &str, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let pattern = format!("%{}%", pattern);
        let rows = self
            .client
            .query(
                "SELECT id, username, rating FROM users \
                 WHERE username ILIKE $1 \
                 ORDER BY rating DESC, username ASC \
                 LIMIT $2 OFFSET $3",
                &[&pattern, &limit, &offset]
            )
            .await?;

        Ok(rows.iter().map(Self::user_from_row).collect_vec())
    }

    async fn user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT id, username, rating FROM users \
                 WHERE LOWER(username) = LOWER($1) \
                 LIMIT 1",
                &[&username]
            )
            .await?;

        rows.first()
            .map(Self::user_from_row)
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
    }

    async fn update_user_rating(&self, user_id: i64, new_rating: i32) -> Result<(), StoreError> {
        self.client
            .execute("UPDATE users SET rating = $1 WHERE id = $2", &[&new_rating, &user_id])
            .await?;

        Ok(())
    }

    async fn all_rating_counts(&self) -> Result<HashMap<i32, i64>, StoreError> {
        let rows = self
            .client
            .query("SELECT rating, COUNT(*) AS count FROM users GROUP BY rating", &[])
            .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<_, i32>("rating"), row.get::<_, i64>("count")))
            .collect())
    }

    async fn random_users(&self, count: i64) -> Result<Vec<User>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT id, username, rating FROM users ORDER BY RANDOM() LIMIT $1",
                &[&count]
            )
            .await?;

        Ok(rows.iter().map(Self::user_from_row).collect_vec())
    }
}
