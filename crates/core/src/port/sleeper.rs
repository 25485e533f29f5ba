// Sleeper Port (for testability)

use async_trait::async_trait;
use std::time::Duration;

/// Suspension interface (allows instant sleeps in tests)
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Tokio timer sleeper (production)
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records requested sleeps and returns immediately
    #[derive(Clone, Default)]
    pub struct RecordingSleeper {
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }
    impl RecordingSleeper {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn sleep_count(&self) -> usize {
            self.sleeps.lock().unwrap().len()
        }
        pub fn total(&self) -> Duration {
            self.sleeps.lock().unwrap().iter().sum()
        }
    }
    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }
}
