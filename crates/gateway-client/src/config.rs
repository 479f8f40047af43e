//! Client configuration.
use std::time::Duration;

use courier_common::consts::DEFAULT_POLL_INTERVAL;
use reqwest::Url;
use serde_with::{serde_as, DurationMilliSeconds};

use crate::poller::ConfirmationPolicy;

/// Request timeout used unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Retries of a failed read unless configured otherwise.
pub const DEFAULT_READ_RETRIES: usize = 3;

/// Everything a [Client](crate::Client) needs to know about the network it
/// talks to.
///
/// ```json
/// {
///     "read_endpoint": "https://alpha-sepolia.starknet.io/feeder_gateway/",
///     "write_endpoint": "https://alpha-sepolia.starknet.io/gateway/",
///     "poll_interval_ms": 5000,
///     "confirmation": "require_accepted_onchain"
/// }
/// ```
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Base of the feeder gateway, which serves every read.
    pub read_endpoint: Url,
    /// Base of the gateway, which accepts transactions.
    pub write_endpoint: Url,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "poll_interval_ms", default = "default_poll_interval")]
    pub poll_interval: Duration,
    #[serde(default)]
    pub confirmation: ConfirmationPolicy,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "request_timeout_ms", default = "default_request_timeout")]
    pub request_timeout: Duration,
    #[serde(default = "default_read_retries")]
    pub read_retries: usize,
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn default_read_retries() -> usize {
    DEFAULT_READ_RETRIES
}

impl GatewayConfig {
    pub fn new(read_endpoint: Url, write_endpoint: Url) -> Self {
        Self {
            read_endpoint,
            write_endpoint,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation: ConfirmationPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            read_retries: DEFAULT_READ_RETRIES,
        }
    }

    /// Configuration for a deployment serving `feeder_gateway/` and
    /// `gateway/` under a shared base.
    pub fn from_base_url(base: Url) -> Result<Self, url::ParseError> {
        let read_endpoint = base.join("feeder_gateway/")?;
        let write_endpoint = base.join("gateway/")?;
        Ok(Self::new(read_endpoint, write_endpoint))
    }

    /// Starknet mainnet.
    pub fn mainnet() -> Self {
        Self::from_base_url(Url::parse("https://alpha-mainnet.starknet.io/").expect("Valid URL"))
            .expect("Valid URL")
    }

    /// Starknet Sepolia testnet.
    pub fn sepolia() -> Self {
        Self::from_base_url(Url::parse("https://alpha-sepolia.starknet.io/").expect("Valid URL"))
            .expect("Valid URL")
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Zero disables retries of reads.
    pub fn with_read_retries(mut self, read_retries: usize) -> Self {
        self.read_retries = read_retries;
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions_sorted::assert_eq;

    use super::*;

    #[test]
    fn endpoints_from_base_url() {
        let config = GatewayConfig::from_base_url(Url::parse("http://localhost:5050").unwrap())
            .unwrap();
        assert_eq!(
            config.read_endpoint.as_str(),
            "http://localhost:5050/feeder_gateway/"
        );
        assert_eq!(config.write_endpoint.as_str(), "http://localhost:5050/gateway/");
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.confirmation, ConfirmationPolicy::AcceptPending);
    }

    #[test]
    fn presets() {
        assert_eq!(
            GatewayConfig::mainnet().write_endpoint.as_str(),
            "https://alpha-mainnet.starknet.io/gateway/"
        );
        assert_eq!(
            GatewayConfig::sepolia().read_endpoint.as_str(),
            "https://alpha-sepolia.starknet.io/feeder_gateway/"
        );
    }

    #[test]
    fn deserialize_with_defaults() {
        let config = serde_json::from_str::<GatewayConfig>(
            r#"{
                "read_endpoint": "http://localhost/feeder_gateway/",
                "write_endpoint": "http://localhost/gateway/"
            }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            GatewayConfig::from_base_url(Url::parse("http://localhost/").unwrap()).unwrap()
        );
    }

    #[test]
    fn deserialize_overrides() {
        let config = serde_json::from_str::<GatewayConfig>(
            r#"{
                "read_endpoint": "http://localhost/feeder_gateway/",
                "write_endpoint": "http://localhost/gateway/",
                "poll_interval_ms": 250,
                "confirmation": "require_accepted_onchain",
                "request_timeout_ms": 1000,
                "read_retries": 0
            }"#,
        )
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.confirmation, ConfirmationPolicy::RequireAcceptedOnchain);
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.read_retries, 0);
    }
}
