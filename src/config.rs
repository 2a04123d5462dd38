use crate::constants::{DEFAULT_MAX_BODY_SIZE, DEFAULT_POOL_CAPACITY};

/// Runtime settings of a [`Router`](crate::Router).
///
/// # Examples
///
/// ```
/// use trellis::{Config, Router};
///
/// let config = Config::default().pool_capacity(64).max_body_size(64 * 1024);
/// let router = Router::builder().config(config).build();
/// assert_eq!(router.config().max_body_size, 64 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The maximum number of idle request contexts kept for reuse.
    pub pool_capacity: usize,
    /// The largest request body the hyper service reads, in bytes. Larger bodies are answered with
    /// `413 Payload Too Large`.
    pub max_body_size: usize,
    /// Whether the hyper service catches a panic that escaped every middleware. A caught panic fails only that
    /// request's connection; otherwise it unwinds into the runtime task.
    pub catch_unwind: bool,
}

impl Config {
    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    pub fn catch_unwind(mut self, enabled: bool) -> Self {
        self.catch_unwind = enabled;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            catch_unwind: true,
        }
    }
}
