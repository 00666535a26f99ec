use std::time::Duration;


/// Transport settings handed to every remote store client at construction.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on a whole request, including client side retries.
    pub operation_timeout: Duration,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
    /// Attempts made by the client library per request, before the error
    /// reaches the caller's own retry loop.
    pub max_attempts: u32
}


impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Duration::from_secs(60),
            attempt_timeout: Duration::from_secs(60),
            max_attempts: 1
        }
    }
}
