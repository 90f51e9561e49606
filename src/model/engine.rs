use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard}
};

use thiserror::Error;

use crate::{
    database::{db_structs::RatingUpdate, StoreError, UserStore},
    model::{HistogramStats, RankError, RatingHistogram}
};

/// Raised while bootstrapping the engine from the store. Both variants are
/// fatal: the process must not serve ranks it cannot trust.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to load rating counts from the store: {0}")]
    Store(#[from] StoreError),

    #[error("store holds {count} user(s) at rating {rating}, outside the supported range")]
    CorruptRating { rating: i32, count: i64 }
}

/// One rejected entry from a batch of rating transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedUpdate {
    pub index: usize,
    pub user_id: i64,
    pub reason: RankError
}

/// Report returned by [`RankingEngine::batch_update_ratings`]. Skipped items
/// carry enough context for the caller to reconcile against the store.
#[derive(Debug, Default)]
pub struct BatchUpdateOutcome {
    pub applied: usize,
    pub skipped: Vec<SkippedUpdate>
}

/// Process-wide owner of the rating histogram.
///
/// A single reader/writer lock serializes access for the engine's lifetime:
/// rank queries share the lock, rating transitions exclude each other and
/// all readers. Hold times are bounded by one suffix-sum pass or two counter
/// bumps; the lock is never held across I/O.
///
/// The engine starts uninitialized and rejects every operation with
/// [`RankError::NotReady`] until [`RankingEngine::initialize_from_store`]
/// has scanned the store. The transition is one-way.
pub struct RankingEngine {
    hist: RwLock<Option<RatingHistogram>>
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RankingEngine {
    pub fn new() -> RankingEngine {
        RankingEngine {
            hist: RwLock::new(None)
        }
    }

    // Histogram mutations are checked before they touch a bucket, so a
    // panic can never leave a half-applied transition behind; recovering a
    // poisoned lock is therefore sound.
    fn read(&self) -> RwLockReadGuard<'_, Option<RatingHistogram>> {
        self.hist.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<RatingHistogram>> {
        self.hist.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds the histogram from the store's rating aggregate. Called once
    /// at process start, before the engine is shared with request handlers.
    /// The store is read without holding the lock; the lock is taken only
    /// to install the finished histogram.
    pub async fn initialize_from_store<S: UserStore>(&self, store: &S) -> Result<(), InitError> {
        let counts = store.all_rating_counts().await?;
        self.initialize_from_counts(&counts)
    }

    /// Installs a histogram built from a rating/count aggregate. Every
    /// rating must fall inside the supported range or startup is refused.
    pub fn initialize_from_counts(&self, counts: &HashMap<i32, i64>) -> Result<(), InitError> {
        let mut hist = RatingHistogram::new();
        for (&rating, &count) in counts {
            hist.bump(rating, count)
                .map_err(|_| InitError::CorruptRating { rating, count })?;
        }

        *self.write() = Some(hist);
        Ok(())
    }

    /// Rank of a single rating under a shared lock.
    pub fn get_rank(&self, rating: i32) -> Result<i64, RankError> {
        let guard = self.read();
        let hist = guard.as_ref().ok_or(RankError::NotReady)?;

        hist.rank_of(rating)
    }

    /// Ranks for a whole page under one shared-lock acquisition. All
    /// returned ranks reflect the same histogram snapshot; one out-of-range
    /// rating rejects the whole batch.
    pub fn get_rank_batch(&self, ratings: &[i32]) -> Result<Vec<i64>, RankError> {
        let guard = self.read();
        let hist = guard.as_ref().ok_or(RankError::NotReady)?;

        hist.rank_batch(ratings)
    }

    /// Moves one user from `old_rating` to `new_rating` atomically under
    /// the write lock. On failure the histogram is left unchanged.
    pub fn update_rating(&self, old_rating: i32, new_rating: i32) -> Result<(), RankError> {
        let mut guard = self.write();
        let hist = guard.as_mut().ok_or(RankError::NotReady)?;

        Self::apply_transition(hist, old_rating, new_rating)
    }

    /// Applies `updates` in order under a single write-lock acquisition.
    /// Items that fail are skipped and reported; earlier items stay applied
    /// and later items are still attempted.
    pub fn batch_update_ratings(&self, updates: &[RatingUpdate]) -> Result<BatchUpdateOutcome, RankError> {
        let mut guard = self.write();
        let hist = guard.as_mut().ok_or(RankError::NotReady)?;

        let mut outcome = BatchUpdateOutcome::default();
        for (index, update) in updates.iter().enumerate() {
            match Self::apply_transition(hist, update.old_rating, update.new_rating) {
                Ok(()) => outcome.applied += 1,
                Err(reason) => {
                    log::warn!(
                        "skipping rating transition {} -> {} for user {}: {}",
                        update.old_rating,
                        update.new_rating,
                        update.user_id,
                        reason
                    );
                    outcome.skipped.push(SkippedUpdate {
                        index,
                        user_id: update.user_id,
                        reason
                    });
                }
            }
        }

        Ok(outcome)
    }

    pub fn stats(&self) -> Result<HistogramStats, RankError> {
        let guard = self.read();
        let hist = guard.as_ref().ok_or(RankError::NotReady)?;

        Ok(hist.stats())
    }

    fn apply_transition(hist: &mut RatingHistogram, old_rating: i32, new_rating: i32) -> Result<(), RankError> {
        if old_rating == new_rating {
            // Still a bounds check; a no-op transition of an illegal rating
            // is a caller bug worth surfacing.
            return hist.count_at(old_rating).map(|_| ());
        }

        // Validate the destination before touching the source bucket so a
        // refused transition leaves no trace.
        hist.count_at(new_rating)?;
        hist.bump(old_rating, -1)?;
        hist.bump(new_rating, 1)
    }
}
