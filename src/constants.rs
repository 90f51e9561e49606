/// Inclusive bounds of the supported rating range. Ratings outside these
/// bounds are rejected at every boundary and never reach the engine.
pub const MIN_RATING: i32 = 100;
pub const MAX_RATING: i32 = 5000;

/// One histogram bucket per representable rating.
pub const BUCKET_COUNT: usize = (MAX_RATING - MIN_RATING + 1) as usize;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Users touched by one bulk simulation round.
pub const BULK_SIMULATION_SIZE: usize = 50;

/// Largest rating swing a simulated update may apply in either direction.
pub const MAX_PERTURBATION: i32 = 500;
