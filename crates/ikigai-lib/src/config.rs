//! Connection settings for the Ikigai platform.

use std::fmt;
use std::time::Duration;

/// Credentials used to authenticate every request against the platform.
///
/// `Debug` redacts the API key so the struct can be logged safely.
#[derive(Clone)]
pub struct Credentials {
    pub base_url: String,
    pub user_email: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(
        base_url: impl Into<String>,
        user_email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            user_email: user_email.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("user_email", &self.user_email)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Tunables for the HTTP client and flow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound for a single HTTP request.
    pub request_timeout: Duration,
    /// Upper bound for the whole `run_flow` wait, trigger to run log.
    pub run_timeout: Duration,
    /// Delay between status polls while a flow is running.
    pub poll_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            run_timeout: Duration::from_secs(3600),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_api_key() {
        let creds = Credentials::new("https://api.ikigailabs.io", "me@example.com", "s3cret");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("me@example.com"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn default_options() {
        let opts = ClientOptions::default();
        assert_eq!(opts.request_timeout, Duration::from_secs(60));
        assert_eq!(opts.run_timeout, Duration::from_secs(3600));
        assert_eq!(opts.poll_interval, Duration::from_secs(1));
    }
}
