/// Admission tuning for a [`crate::TaskManager`]: how many tasks may run
/// concurrently, and how many more may wait behind them.
///
/// Defaults to a concurrency limit of 10 with an equally sized queue: a
/// configurable concurrency cap with a matching queue cap behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskManagerConfig {
    pub concurrency_limit: usize,
    pub queue_limit: usize,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 10,
            queue_limit: 10,
        }
    }
}

impl TaskManagerConfig {
    /// Both the concurrency and queue limits set to the same value, the
    /// common case for a fixed-size worker pool.
    #[must_use]
    pub fn with_concurrency_limit(limit: usize) -> Self {
        Self {
            concurrency_limit: limit,
            queue_limit: limit,
        }
    }
}
