//! Database metrics collection.

use metrics::histogram;
use std::time::Instant;

/// Times a repository query and records its duration histogram.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("insert_location");
/// let result = sqlx::query_as::<_, LocationEntity>(...).fetch_one(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query_name
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}
