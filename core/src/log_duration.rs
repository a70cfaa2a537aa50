use std::time::{Duration, Instant};

/// Logs how long a scope took when dropped.
#[derive(Debug)]
pub struct LogDuration {
    operation: String,
    start: Instant,
}

impl LogDuration {
    pub fn new(operation: impl Into<String>) -> Self {
        Self { operation: operation.into(), start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed wall time in fractional seconds, as logged on drop.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

impl Drop for LogDuration {
    fn drop(&mut self) {
        tracing::info!(
            operation = %self.operation,
            elapsed_s = self.elapsed_secs(),
            "operation finished"
        );
    }
}

/// Times the rest of the enclosing block.
#[macro_export]
macro_rules! log_duration {
    ($operation:expr) => {
        let _log_duration_guard = $crate::log_duration::LogDuration::new($operation);
    };
}
