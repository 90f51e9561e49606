use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex
    }
};

use itertools::Itertools;
use rand::seq::SliceRandom;

use crate::database::{db_structs::User, StoreError, UserStore};

/// In-memory stand-in for the durable user store. Paged reads follow the
/// store ordering contract (rating descending, then username ascending) and
/// writes can be made to fail, globally or per user, to exercise the
/// compensation paths.
///
/// Clones share state, mirroring how the postgres client shares its
/// connection.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>
}

struct MemoryStoreInner {
    users: Mutex<Vec<User>>,
    failing_users: Mutex<HashSet<i64>>,
    fail_all_writes: AtomicBool
}

impl MemoryStore {
    pub fn new(users: Vec<User>) -> MemoryStore {
        MemoryStore {
            inner: Arc::new(MemoryStoreInner {
                users: Mutex::new(users),
                failing_users: Mutex::new(HashSet::new()),
                fail_all_writes: AtomicBool::new(false)
            })
        }
    }

    /// Store seeded with one `player_N` user per rating, ids starting at 1.
    pub fn with_ratings(ratings: &[i32]) -> MemoryStore {
        MemoryStore::new(users_with_ratings(ratings))
    }

    /// Makes every subsequent rating write fail.
    pub fn fail_all_writes(&self) {
        self.inner.fail_all_writes.store(true, Ordering::SeqCst);
    }

    /// Makes rating writes for `user_id` fail.
    pub fn fail_writes_for(&self, user_id: i64) {
        self.lock_failing().insert(user_id);
    }

    pub fn rating_of(&self, user_id: i64) -> Option<i32> {
        self.lock_users().iter().find(|u| u.id == user_id).map(|u| u.rating)
    }

    pub fn snapshot(&self) -> Vec<User> {
        self.lock_users().clone()
    }

    fn lock_users(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        self.inner.users.lock().expect("user store lock")
    }

    fn lock_failing(&self) -> std::sync::MutexGuard<'_, HashSet<i64>> {
        self.inner.failing_users.lock().expect("failure set lock")
    }

    fn ordered_users(&self) -> Vec<User> {
        self.lock_users()
            .iter()
            .cloned()
            .sorted_by(|a, b| b.rating.cmp(&a.rating).then_with(|| a.username.cmp(&b.username)))
            .collect_vec()
    }
}

impl UserStore for MemoryStore {
    async fn top_users(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        Ok(self
            .ordered_users()
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect_vec())
    }

    async fn search_users(&self, pattern: &str, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let needle = pattern.to_lowercase();

        Ok(self
            .ordered_users()
            .into_iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect_vec())
    }

    async fn user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.lock_users()
            .iter()
            .find(|u| u.username.to_lowercase() == username.to_lowercase())
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
    }

    async fn update_user_rating(&self, user_id: i64, new_rating: i32) -> Result<(), StoreError> {
        if self.inner.fail_all_writes.load(Ordering::SeqCst) || self.lock_failing().contains(&user_id) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }

        let mut users = self.lock_users();
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.rating = new_rating;
        }

        Ok(())
    }

    async fn all_rating_counts(&self) -> Result<HashMap<i32, i64>, StoreError> {
        let mut counts: HashMap<i32, i64> = HashMap::new();
        for user in self.lock_users().iter() {
            *counts.entry(user.rating).or_insert(0) += 1;
        }

        Ok(counts)
    }

    async fn random_users(&self, count: i64) -> Result<Vec<User>, StoreError> {
        let users = self.lock_users();

        Ok(users
            .choose_multiple(&mut rand::thread_rng(), count.max(0) as usize)
            .cloned()
            .collect_vec())
    }
}

/// One `player_N` user per rating, ids starting at 1.
pub fn users_with_ratings(ratings: &[i32]) -> Vec<User> {
    ratings
        .iter()
        .enumerate()
        .map(|(i, &rating)| User {
            id: i as i64 + 1,
            username: format!("player_{}", i + 1),
            rating
        })
        .collect_vec()
}
