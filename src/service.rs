use std::{collections::HashSet, fmt::Display, sync::Arc};

use rand::Rng;
use thiserror::Error;

use crate::{
    api::api_structs::UserWithRank,
    constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MAX_PERTURBATION, MAX_RATING, MIN_RATING},
    database::{
        db_structs::RatingUpdate,
        StoreError, UserStore
    },
    model::{HistogramStats, RankingEngine}
};

/// Caller-visible error taxonomy. Messages are concise and machine
/// readable; diagnostic detail goes to the log instead.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    Internal(String)
}

impl ServiceError {
    /// HTTP status the transport should attach to this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::NotFound => 404,
            ServiceError::Internal(_) => 500
        }
    }
}

/// Which flavor of paginated read to serve.
#[derive(Debug, Clone, Copy)]
pub enum PageRequest<'a> {
    Leaderboard,
    Search(&'a str)
}

/// A page of ranked users plus the normalized paging echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPage {
    pub data: Vec<UserWithRank>,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool
}

/// Outcome of a single-user rating change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingChange {
    pub username: String,
    pub old_rating: i32,
    pub new_rating: i32
}

/// Per-request composer of store and engine operations. Stateless between
/// calls: every method validates its inputs, drives the store and the
/// engine in a consistent order, and never holds the engine lock across
/// store I/O.
pub struct RankingService<S> {
    store: S,
    engine: Arc<RankingEngine>
}

impl<S: UserStore> RankingService<S> {
    pub fn new(store: S, engine: Arc<RankingEngine>) -> RankingService<S> {
        RankingService { store, engine }
    }

    /// Serves one leaderboard or search page. Fetches one record past the
    /// requested limit to learn whether another page exists, then ranks the
    /// surviving records from a single engine snapshot, preserving store
    /// order.
    pub async fn page(
        &self,
        kind: PageRequest<'_>,
        page: Option<i64>,
        limit: Option<i64>
    ) -> Result<RankedPage, ServiceError> {
        let (page, limit) = normalize_paging(page, limit);
        let offset = (page - 1) * limit;

        let mut users = match kind {
            PageRequest::Leaderboard => self
                .store
                .top_users(limit + 1, offset)
                .await
                .map_err(|e| internal("Failed to fetch leaderboard", e))?,
            PageRequest::Search(query) => {
                let query = query.trim();
                if query.is_empty() {
                    return Err(ServiceError::BadRequest(
                        "Username query parameter is required".to_string()
                    ));
                }

                self.store
                    .search_users(query, limit + 1, offset)
                    .await
                    .map_err(|e| internal("Failed to search users", e))?
            }
        };

        let has_more = users.len() as i64 > limit;
        if has_more {
            users.truncate(limit as usize);
        }

        if users.is_empty() {
            return Ok(RankedPage {
                data: Vec::new(),
                page,
                limit,
                has_more: false
            });
        }

        let ratings = users.iter().map(|u| u.rating).collect::<Vec<_>>();

        // An out-of-range rating here means the store holds something the
        // engine never admitted; surface it as an internal fault.
        let ranks = self
            .engine
            .get_rank_batch(&ratings)
            .map_err(|e| internal("Failed to rank page", e))?;

        let data = users
            .into_iter()
            .zip(ranks)
            .map(|(user, rank)| UserWithRank {
                rank,
                username: user.username,
                rating: user.rating
            })
            .collect();

        Ok(RankedPage { data, page, limit, has_more })
    }

    /// Moves one user to `new_rating`: validate, look the user up, shift
    /// the histogram, then persist. A failed persist compensates the
    /// histogram before reporting, so the engine never counts a rating the
    /// store refused.
    pub async fn set_rating(&self, username: &str, new_rating: i32) -> Result<RatingChange, ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&new_rating) {
            return Err(ServiceError::BadRequest(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let user = match self.store.user_by_username(username).await {
            Ok(user) => user,
            Err(StoreError::UserNotFound(_)) => return Err(ServiceError::NotFound),
            Err(e) => return Err(internal("Failed to update rating", e))
        };

        let old_rating = user.rating;
        self.engine
            .update_rating(old_rating, new_rating)
            .map_err(|e| internal("Failed to update rating", e))?;

        if let Err(e) = self.store.update_user_rating(user.id, new_rating).await {
            // The histogram already moved; put the user back before failing.
            if let Err(revert) = self.engine.update_rating(new_rating, old_rating) {
                log::error!(
                    "failed to compensate rating transition for {}: {}",
                    user.username,
                    revert
                );
            }
            return Err(internal("Failed to update rating", e));
        }

        log::info!("updated {} rating: {} -> {}", user.username, old_rating, new_rating);

        Ok(RatingChange {
            username: user.username,
            old_rating,
            new_rating
        })
    }

    /// Demonstration and load-testing path: perturbs `count` randomly
    /// sampled users, applies the whole batch to the engine under one lock
    /// acquisition, then persists each applied update independently. A
    /// failed persist compensates that user's transition only. Returns the
    /// number of durably persisted updates.
    pub async fn simulate_bulk(&self, count: usize) -> Result<usize, ServiceError> {
        let users = self
            .store
            .random_users(count as i64)
            .await
            .map_err(|e| internal("Failed to start simulation", e))?;

        if users.is_empty() {
            return Ok(0);
        }

        let mut rng = rand::thread_rng();
        let updates = users
            .iter()
            .map(|user| RatingUpdate {
                user_id: user.id,
                old_rating: user.rating,
                new_rating: perturb(user.rating, &mut rng)
            })
            .collect::<Vec<_>>();

        let outcome = self
            .engine
            .batch_update_ratings(&updates)
            .map_err(|e| internal("Failed to start simulation", e))?;

        // Updates the engine refused never reach the store; persisting them
        // anyway would knowingly diverge the histogram from the store.
        let skipped: HashSet<usize> = outcome.skipped.iter().map(|s| s.index).collect();

        let mut persisted = 0;
        for (index, update) in updates.iter().enumerate() {
            if skipped.contains(&index) {
                continue;
            }

            match self.store.update_user_rating(update.user_id, update.new_rating).await {
                Ok(()) => persisted += 1,
                Err(e) => {
                    log::warn!("failed to persist rating for user {}: {}", update.user_id, e);
                    if let Err(revert) = self.engine.update_rating(update.new_rating, update.old_rating) {
                        log::error!(
                            "failed to compensate simulated transition for user {}: {}",
                            update.user_id,
                            revert
                        );
                    }
                }
            }
        }

        log::info!(
            "simulation complete: {}/{} rating updates persisted",
            persisted,
            updates.len()
        );

        Ok(persisted)
    }

    pub fn stats(&self) -> Result<HistogramStats, ServiceError> {
        self.engine
            .stats()
            .map_err(|e| internal("Failed to read engine stats", e))
    }
}

fn internal(message: &str, err: impl Display) -> ServiceError {
    log::error!("{}: {}", message, err);
    ServiceError::Internal(message.to_string())
}

/// Uniform perturbation in [-MAX_PERTURBATION, +MAX_PERTURBATION], clamped
/// into the rating bounds. Clamping biases draws near the extrema toward
/// the bounds; accepted.
fn perturb(rating: i32, rng: &mut impl Rng) -> i32 {
    let delta = rng.gen_range(-MAX_PERTURBATION..=MAX_PERTURBATION);
    (rating + delta).clamp(MIN_RATING, MAX_RATING)
}

/// Page defaults to 1 and is raised to at least 1. Limit defaults when
/// absent or non-positive and is capped at MAX_PAGE_SIZE.
pub fn normalize_paging(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);

    let mut limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit < 1 {
        limit = DEFAULT_PAGE_SIZE;
    }
    if limit > MAX_PAGE_SIZE {
        limit = MAX_PAGE_SIZE;
    }

    (page, limit)
}
