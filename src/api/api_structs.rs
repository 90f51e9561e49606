use serde::{Deserialize, Serialize};

use crate::{
    constants::{MAX_RATING, MIN_RATING},
    model::HistogramStats,
    service::{RankedPage, RatingChange, ServiceError}
};

/// One leaderboard row: a user enriched with their current global rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWithRank {
    pub rank: i64,
    pub username: String,
    pub rating: i32
}

/// Envelope for the paginated read endpoints (leaderboard and search).
/// `count` always equals `data.len()`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub success: bool,
    pub data: Vec<UserWithRank>,
    pub count: usize,
    pub page: i64,
    pub limit: i64,
    pub has_more: bool
}

impl From<RankedPage> for LeaderboardResponse {
    fn from(page: RankedPage) -> Self {
        LeaderboardResponse {
            success: true,
            count: page.data.len(),
            data: page.data,
            page: page.page,
            limit: page.limit,
            has_more: page.has_more
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        ErrorResponse {
            success: false,
            error: err.to_string()
        }
    }
}

/// Body accepted by the simulate endpoint. A present username selects the
/// specific-user branch; an absent one selects the bulk branch.
#[derive(Debug, Serialize, Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub new_rating: Option<i32>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub success: bool,
    pub message: String,
    pub updated: usize
}

impl From<RatingChange> for SimulateResponse {
    fn from(_change: RatingChange) -> Self {
        SimulateResponse {
            success: true,
            message: "Rating updated successfully".to_string(),
            updated: 1
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StatsBody
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsBody {
    pub total_users: i64,
    pub unique_ratings: i64,
    pub min_rating: i32,
    pub max_rating: i32,
    pub rating_range: String
}

impl From<HistogramStats> for StatsResponse {
    fn from(stats: HistogramStats) -> Self {
        StatsResponse {
            success: true,
            stats: StatsBody {
                total_users: stats.total_users,
                unique_ratings: stats.unique_ratings,
                min_rating: stats.min_rating,
                max_rating: stats.max_rating,
                rating_range: format!("{}-{}", MIN_RATING, MAX_RATING)
            }
        }
    }
}
