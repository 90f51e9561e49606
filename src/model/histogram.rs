use crate::{
    constants::{BUCKET_COUNT, MAX_RATING, MIN_RATING},
    model::RankError
};

/// Dense count of users at each rating. The range is small and fixed, so the
/// whole structure is one flat array (~40 KB) regardless of user count.
///
/// Pure data: callers are expected to provide their own synchronization.
pub struct RatingHistogram {
    counts: Vec<i64>
}

/// Aggregate view over the histogram. `min_rating` and `max_rating` are the
/// lowest and highest occupied buckets, or 0 when the histogram is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramStats {
    pub total_users: i64,
    pub unique_ratings: i64,
    pub min_rating: i32,
    pub max_rating: i32
}

impl Default for RatingHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingHistogram {
    pub fn new() -> RatingHistogram {
        RatingHistogram {
            counts: vec![0; BUCKET_COUNT]
        }
    }

    fn index(rating: i32) -> Result<usize, RankError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(RankError::OutOfRange(rating));
        }

        Ok((rating - MIN_RATING) as usize)
    }

    /// Returns the number of users currently recorded at `rating`.
    pub fn count_at(&self, rating: i32) -> Result<i64, RankError> {
        Ok(self.counts[Self::index(rating)?])
    }

    /// Adjusts the count at `rating` by `delta`. The delta may be negative
    /// or larger than one in magnitude; a result below zero is refused and
    /// leaves the bucket untouched.
    pub fn bump(&mut self, rating: i32, delta: i64) -> Result<(), RankError> {
        let idx = Self::index(rating)?;
        let next = self.counts[idx] + delta;
        if next < 0 {
            return Err(RankError::Underflow(rating));
        }

        self.counts[idx] = next;
        Ok(())
    }

    /// Rank of `rating`: one more than the number of users rated strictly
    /// higher. Users sharing a rating share the rank, and the next distinct
    /// rating below starts at `rank + count` (1, 2, 2, 4, ...). An empty
    /// bucket still ranks: its rank is the one an insertion would take.
    ///
    /// Walks the tail of the array, so the cost is bounded by the rating
    /// range, not by the number of users.
    pub fn rank_of(&self, rating: i32) -> Result<i64, RankError> {
        let idx = Self::index(rating)?;
        Ok(1 + self.counts[idx + 1..].iter().sum::<i64>())
    }

    /// Suffix sums over the counts: `sums[i]` is the number of users at or
    /// above bucket `i`. One trailing zero keeps the `sums[i + 1] + 1` rank
    /// lookup in bounds at MAX_RATING.
    pub fn suffix_sums(&self) -> Vec<i64> {
        let mut sums = vec![0i64; BUCKET_COUNT + 1];
        for i in (0..BUCKET_COUNT).rev() {
            sums[i] = sums[i + 1] + self.counts[i];
        }

        sums
    }

    /// Ranks for every rating in `ratings`, computed from a single pass over
    /// the counts so the cost is one tail scan no matter how many ratings
    /// are asked for. Any out-of-range rating rejects the whole batch.
    pub fn rank_batch(&self, ratings: &[i32]) -> Result<Vec<i64>, RankError> {
        let sums = self.suffix_sums();

        ratings
            .iter()
            .map(|&rating| Ok(sums[Self::index(rating)? + 1] + 1))
            .collect()
    }

    pub fn stats(&self) -> HistogramStats {
        let mut stats = HistogramStats {
            total_users: 0,
            unique_ratings: 0,
            min_rating: 0,
            max_rating: 0
        };

        for (i, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }

            let rating = MIN_RATING + i as i32;
            stats.total_users += count;
            stats.unique_ratings += 1;
            if stats.min_rating == 0 {
                stats.min_rating = rating;
            }
            stats.max_rating = rating;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_with(ratings: &[i32]) -> RatingHistogram {
        let mut hist = RatingHistogram::new();
        for &rating in ratings {
            hist.bump(rating, 1).expect("test rating must be in range");
        }

        hist
    }

    #[test]
    fn test_empty_histogram() {
        let hist = RatingHistogram::new();

        assert_eq!(hist.count_at(MIN_RATING), Ok(0));
        assert_eq!(hist.count_at(MAX_RATING), Ok(0));
        assert_eq!(
            hist.stats(),
            HistogramStats {
                total_users: 0,
                unique_ratings: 0,
                min_rating: 0,
                max_rating: 0
            }
        );

        // The rank of an empty bucket is the rank an insertion would take.
        assert_eq!(hist.rank_of(MAX_RATING), Ok(1));
        assert_eq!(hist.rank_of(MIN_RATING), Ok(1));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut hist = RatingHistogram::new();

        assert!(hist.bump(MIN_RATING, 1).is_ok());
        assert!(hist.bump(MAX_RATING, 1).is_ok());

        assert_eq!(hist.bump(MIN_RATING - 1, 1), Err(RankError::OutOfRange(99)));
        assert_eq!(hist.bump(MAX_RATING + 1, 1), Err(RankError::OutOfRange(5001)));
        assert_eq!(hist.count_at(0), Err(RankError::OutOfRange(0)));
        assert_eq!(hist.rank_of(6000), Err(RankError::OutOfRange(6000)));
    }

    #[test]
    fn test_bump_accumulates_and_underflows() {
        let mut hist = RatingHistogram::new();

        hist.bump(1500, 5).expect("bump in range");
        assert_eq!(hist.count_at(1500), Ok(5));

        hist.bump(1500, -5).expect("bump back to zero");
        assert_eq!(hist.count_at(1500), Ok(0));

        assert_eq!(hist.bump(1500, -1), Err(RankError::Underflow(1500)));
        // A refused bump leaves the bucket untouched.
        assert_eq!(hist.count_at(1500), Ok(0));
    }

    #[test]
    fn test_tie_aware_ranks() {
        let hist = histogram_with(&[5000, 4952, 4952, 4900]);

        assert_eq!(hist.rank_of(5000), Ok(1));
        assert_eq!(hist.rank_of(4952), Ok(2));
        assert_eq!(hist.rank_of(4900), Ok(4));

        // The group below a tie starts past the whole tied group.
        let tied = hist.count_at(4952).expect("count in range");
        assert_eq!(hist.rank_of(4952).expect("rank in range") + tied, hist.rank_of(4900).expect("rank in range"));
    }

    #[test]
    fn test_rank_batch_matches_rank_of() {
        let hist = histogram_with(&[100, 250, 250, 1000, 4999, 5000, 5000]);
        let queries = [100, 250, 999, 1000, 4999, 5000, MAX_RATING, MIN_RATING];

        let batch = hist.rank_batch(&queries).expect("queries in range");
        for (i, &rating) in queries.iter().enumerate() {
            assert_eq!(batch[i], hist.rank_of(rating).expect("rank in range"), "rating {}", rating);
        }
    }

    #[test]
    fn test_rank_batch_rejects_whole_batch() {
        let hist = histogram_with(&[1000]);

        assert_eq!(hist.rank_batch(&[1000, 99]), Err(RankError::OutOfRange(99)));
    }

    #[test]
    fn test_suffix_sums_definition() {
        let hist = histogram_with(&[100, 100, 3000, 5000]);
        let sums = hist.suffix_sums();

        // sums[i] counts users at or above bucket i; the tail entry is zero.
        assert_eq!(sums[0], 4);
        assert_eq!(sums[(3000 - MIN_RATING) as usize], 2);
        assert_eq!(sums[(5000 - MIN_RATING) as usize], 1);
        assert_eq!(sums[BUCKET_COUNT], 0);
    }

    #[test]
    fn test_stats() {
        let hist = histogram_with(&[200, 200, 200, 1750, 4800]);

        assert_eq!(
            hist.stats(),
            HistogramStats {
                total_users: 5,
                unique_ratings: 3,
                min_rating: 200,
                max_rating: 4800
            }
        );
    }
}
