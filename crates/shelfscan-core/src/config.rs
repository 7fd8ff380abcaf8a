use std::time::Duration;

/// Runtime configuration for the recognition core.
///
/// There is no on-disk persistence; the embedding application constructs
/// this once at startup and hands it to [`crate::AppState::new`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the recognition service (no trailing slash required)
    pub api_base_url: String,
    /// Per-request timeout; a timeout counts as a transport failure
    pub request_timeout: Duration,
    /// Delay between a status response and the next status fetch
    pub poll_interval: Duration,
    /// Give up on a task after this many non-terminal status checks.
    /// `None` keeps polling until the server reports a terminal state.
    pub max_status_checks: Option<u32>,
    /// JPEG quality used when preparing an image for upload
    pub upload_quality: u8,
}

impl Config {
    /// Configuration pointing at the given service, defaults elsewhere.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            max_status_checks: None,
            upload_quality: crate::prepare::INTERACTIVE_QUALITY,
        }
    }
}
