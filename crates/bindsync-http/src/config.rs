//! Timeouts, retry budget and pacing for [`HttpClient`](crate::HttpClient)

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Total attempts per request, first try included
    pub max_attempts: u32,
    /// Base retry delay, multiplied by the attempt number
    pub retry_delay: Duration,
    /// Upper bound for a single backoff sleep
    pub max_retry_delay: Duration,
    /// Fixed delay after every request
    pub pacing: Duration,
    pub proxy: Option<String>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_attempts: 4,
            retry_delay: Duration::from_millis(800),
            max_retry_delay: Duration::from_secs(30),
            pacing: Duration::from_millis(350),
            proxy: None,
            user_agent: format!("bindsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single attempt, no pacing
    pub fn fast() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            max_attempts: 1,
            retry_delay: Duration::ZERO,
            pacing: Duration::ZERO,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clamped to at least one
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_remote_rate_limits() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.retry_delay, Duration::from_millis(800));
        assert_eq!(config.pacing, Duration::from_millis(350));
        assert!(config.user_agent.starts_with("bindsync/"));
    }

    #[test]
    fn test_fast_config() {
        let config = HttpConfig::fast();
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.pacing, Duration::ZERO);
    }

    #[test]
    fn test_builders() {
        let config = HttpConfig::new()
            .with_timeout(Duration::from_secs(15))
            .with_max_attempts(0)
            .with_pacing(Duration::from_millis(5))
            .with_proxy("http://127.0.0.1:3128");

        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.pacing, Duration::from_millis(5));
        assert_eq!(config.proxy.as_deref(), Some("http://127.0.0.1:3128"));
    }
}
