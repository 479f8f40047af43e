//! Metrics related utilities
use std::future::Future;

use courier_common::BlockId;
use courier_gateway_types::error::SequencerError;

use crate::builder::stage::Method;
use crate::builder::Request;

const METRIC_REQUESTS: &str = "gateway_requests_total";
const METRIC_FAILED_REQUESTS: &str = "gateway_requests_failed_total";
const METRIC_REQUESTS_LATENCY: &str = "gateway_request_duration_seconds";
const METRICS: [&str; 2] = [METRIC_REQUESTS, METRIC_FAILED_REQUESTS];
const METHODS_WITH_TAGS: [&str; 1] = ["get_block"];
const TAG_LATEST: &str = "latest";
const TAG_PENDING: &str = "pending";
const TAGS: [&str; 2] = [TAG_LATEST, TAG_PENDING];
const REASON_DECODE: &str = "decode";
const REASON_STARKNET: &str = "starknet";
const REASON_RATE_LIMITING: &str = "rate_limiting";
const REASON_TIMEOUT: &str = "timeout";
const REASONS: [&str; 4] = [
    REASON_DECODE,
    REASON_RATE_LIMITING,
    REASON_STARKNET,
    REASON_TIMEOUT,
];

/// Register all gateway related metrics
pub fn register() {
    for name in METRICS {
        for &method in Request::<'_, Method>::METHODS {
            let _ = metrics::counter!(name, "method" => method);
        }

        for method in METHODS_WITH_TAGS {
            for tag in TAGS {
                let _ = metrics::counter!(name, "method" => method, "tag" => tag);
            }
        }
    }

    for &method in Request::<'_, Method>::METHODS {
        let _ = metrics::histogram!(METRIC_REQUESTS_LATENCY, "method" => method);
    }

    for reason in REASONS {
        for &method in Request::<'_, Method>::METHODS {
            let _ = metrics::counter!(METRIC_FAILED_REQUESTS, "method" => method, "reason" => reason);
        }

        for method in METHODS_WITH_TAGS {
            for tag in TAGS {
                let _ = metrics::counter!(METRIC_FAILED_REQUESTS, "method" => method, "tag" => tag, "reason" => reason);
            }
        }
    }
}

/// Marks requests addressed at a block tag, so the tag does not have to be
/// parsed back out of the url.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    None,
    Latest,
    Pending,
}

impl From<BlockId> for BlockTag {
    fn from(x: BlockId) -> Self {
        match x {
            BlockId::Number(_) | BlockId::Hash(_) => Self::None,
            BlockId::Latest => Self::Latest,
            BlockId::Pending => Self::Pending,
        }
    }
}

impl BlockTag {
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            BlockTag::None => None,
            BlockTag::Latest => Some(TAG_LATEST),
            BlockTag::Pending => Some(TAG_PENDING),
        }
    }
}

/// Carries metrics metadata while creating gateway requests
#[derive(Clone, Copy, Debug)]
pub struct RequestMetadata {
    pub method: &'static str,
    pub tag: BlockTag,
}

impl RequestMetadata {
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            tag: BlockTag::None,
        }
    }
}

/// Awaits `f`, counting it in `gateway_requests_total` and, if it fails, in
/// `gateway_requests_failed_total`. The duration is recorded in
/// `gateway_request_duration_seconds`.
///
/// `get_block` requests addressed at `latest` or `pending` are also counted
/// with a `tag` label. Failures are further counted by `reason`:
/// - `starknet` for errors reported by the gateway,
/// - `decode` for bodies that could not be decoded,
/// - `rate_limiting` for [`reqwest::StatusCode::TOO_MANY_REQUESTS`],
/// - `timeout` for requests which timed out.
pub async fn with_metrics<T>(
    meta: RequestMetadata,
    f: impl Future<Output = Result<T, SequencerError>>,
) -> Result<T, SequencerError> {
    fn increment(counter_name: &'static str, meta: RequestMetadata) {
        let method = meta.method;
        metrics::counter!(counter_name, "method" => method).increment(1);

        if let (true, Some(tag)) = (METHODS_WITH_TAGS.contains(&method), meta.tag.as_str()) {
            metrics::counter!(counter_name, "method" => method, "tag" => tag).increment(1);
        }
    }

    fn increment_failed(meta: RequestMetadata, reason: &'static str) {
        let method = meta.method;
        metrics::counter!(METRIC_FAILED_REQUESTS, "method" => method, "reason" => reason)
            .increment(1);

        if let (true, Some(tag)) = (METHODS_WITH_TAGS.contains(&method), meta.tag.as_str()) {
            metrics::counter!(METRIC_FAILED_REQUESTS, "method" => method, "tag" => tag, "reason" => reason).increment(1);
        }
    }

    increment(METRIC_REQUESTS, meta);

    let started = std::time::Instant::now();
    let result = f.await;
    let elapsed = started.elapsed();

    metrics::histogram!(METRIC_REQUESTS_LATENCY, "method" => meta.method)
        .record(elapsed.as_secs_f64());

    result.inspect_err(|e| {
        increment(METRIC_FAILED_REQUESTS, meta);

        let reason = match e {
            SequencerError::StarknetError(_) => Some(REASON_STARKNET),
            SequencerError::InvalidStarknetErrorVariant => Some(REASON_DECODE),
            SequencerError::ReqwestError(e) if e.is_decode() => Some(REASON_DECODE),
            SequencerError::ReqwestError(e)
                if e.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) =>
            {
                Some(REASON_RATE_LIMITING)
            }
            SequencerError::ReqwestError(e) if e.is_timeout() => Some(REASON_TIMEOUT),
            SequencerError::ReqwestError(_)
            | SequencerError::Encode(_)
            | SequencerError::Serialization(_) => None,
        };

        if let Some(reason) = reason {
            increment_failed(meta, reason);
        }
    })
}
