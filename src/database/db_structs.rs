use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub rating: i32
}

/// One rating transition: created by the service, consumed by the engine
/// and the store, discarded once both have seen it (or the transition has
/// been compensated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingUpdate {
    pub user_id: i64,
    pub old_rating: i32,
    pub new_rating: i32
}
