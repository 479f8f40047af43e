//! Provides a builder API for creating and sending gateway REST requests.
//!
//! This builder utilises a type state builder pattern with generics to only
//! allow valid operations at each stage of the build process. Each stage is
//! consumed to generate the next stage and the final stage executes the query.
//!
//! Here is an overview of the four builder stages.
//!
//!   1. [Init](stage::Init) which provides the entry point of the
//!      [builder](Request).
//!   2. [Method](stage::Method) where you select the REST API method.
//!   3. [Params](stage::Params) where you select the retry behavior.
//!   4. [Final](stage::Final) where you select the REST operation type, which
//!      is then executed.
use std::time::Duration;

use courier_common::prelude::*;
use courier_gateway_types::error::{SequencerError, StarknetError};

use crate::metrics::{with_metrics, BlockTag, RequestMetadata};

/// A gateway request builder.
pub struct Request<'a, S: RequestState> {
    state: S,
    url: reqwest::Url,
    client: &'a reqwest::Client,
}

/// How often a failed request is attempted again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retry {
    Disabled,
    /// Up to this many additional attempts.
    Bounded(usize),
}

pub mod stage {
    use crate::metrics::RequestMetadata;

    /// Provides the [builder](super::Request::builder) entry-point.
    #[allow(dead_code)]
    pub struct Init;

    /// Select the gateway API method to call:
    /// - [add_transaction](super::Request::add_transaction)
    /// - [call_contract](super::Request::call_contract)
    /// - [get_block](super::Request::get_block)
    /// - [get_code](super::Request::get_code)
    /// - [get_contract_addresses](super::Request::get_contract_addresses)
    /// - [get_storage_at](super::Request::get_storage_at)
    /// - [get_transaction](super::Request::get_transaction)
    /// - [get_transaction_status](super::Request::get_transaction_status)
    pub struct Method;

    /// Specify the request parameters:
    /// - [block](super::Request::block)
    /// - [contract_address](super::Request::contract_address)
    /// - [key](super::Request::key)
    /// - [transaction_hash](super::Request::transaction_hash)
    /// - [param](super::Request::param) (allows adding custom (name, value)
    ///   parameter)
    ///
    /// and then specify the [retry behavior](super::Request::retry).
    pub struct Params {
        pub meta: RequestMetadata,
    }

    /// Specify the REST operation send the request:
    /// - [get](super::Request::get)
    /// - [post_with_json](super::Request::post_with_json)
    pub struct Final {
        pub meta: RequestMetadata,
        pub retry: super::Retry,
    }

    impl super::RequestState for Init {}
    impl super::RequestState for Method {}
    impl super::RequestState for Params {}
    impl super::RequestState for Final {}
}

impl<'a> Request<'a, stage::Init> {
    /// Initialize a [Request] builder.
    ///
    /// `url` must be usable as a base, which [Client](crate::Client) checks
    /// on construction.
    pub fn builder(client: &'a reqwest::Client, url: reqwest::Url) -> Request<'a, stage::Method> {
        Request {
            url,
            client,
            state: stage::Method,
        }
    }
}

/// Helper macros used in [`stage::Method`]
mod request_macros {
    /// Generates the const `METHODS` slice. At least one item is required.
    macro_rules! method_names {
        () => {
            compile_error!("At least one method has to be defined");
        };
        ($($x:ident),+ $(,)?) => {
            pub const METHODS: &'static [&'static str] = &[$(stringify!($x)),+];
        };
    }

    /// Generates one method with `name`, delegating to `method`.
    macro_rules! method {
        ($name:ident) => {
            pub fn $name(self) -> Request<'a, stage::Params> {
                self.method(stringify!($name))
            }
        };
    }

    /// Generates methods with names from the list and a const slice `METHODS`
    /// which then can be used to register metrics per method.
    macro_rules! methods {
        () => {
            request_macros::method_names!();
        };
        ($($x:ident),+ $(,)?) => {
            request_macros::method_names!($($x),+);
            $(request_macros::method!($x);)+
        };
    }

    pub(super) use {method, method_names, methods};
}

impl<'a> Request<'a, stage::Method> {
    request_macros::methods!(
        add_transaction,
        call_contract,
        get_block,
        get_code,
        get_contract_addresses,
        get_storage_at,
        get_transaction,
        get_transaction_status,
    );

    /// Appends the given method to the request url.
    fn method(mut self, method: &'static str) -> Request<'a, stage::Params> {
        self.url
            .path_segments_mut()
            .expect("Base URL is valid")
            .pop_if_empty()
            .push(method);

        Request {
            url: self.url,
            client: self.client,
            state: stage::Params {
                meta: RequestMetadata::new(method),
            },
        }
    }
}

impl<'a> Request<'a, stage::Params> {
    /// Addresses a block. Hashes go in `blockHash`, everything else in
    /// `blockId`, where `null` selects the latest block.
    pub fn block<B: Into<BlockId>>(self, block: B) -> Self {
        use std::borrow::Cow;

        let block: BlockId = block.into();
        let (name, value) = match block {
            BlockId::Number(number) => ("blockId", Cow::from(number.get().to_string())),
            BlockId::Hash(hash) => ("blockHash", hash.0.to_hex_str()),
            BlockId::Latest => ("blockId", Cow::from("null")),
            BlockId::Pending => ("blockId", Cow::from("pending")),
        };

        self.block_tag(block.into()).param(name, &value)
    }

    pub fn contract_address(self, address: ContractAddress) -> Self {
        self.param("contractAddress", &address.0.to_hex_str())
    }

    /// Storage keys are sent in decimal.
    pub fn key(self, key: StorageAddress) -> Self {
        self.param("key", &key.0.to_decimal_str())
    }

    pub fn transaction_hash(self, hash: TransactionHash) -> Self {
        self.param("transactionHash", &hash.0.to_hex_str())
    }

    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    fn block_tag(mut self, tag: BlockTag) -> Self {
        self.state.meta.tag = tag;
        self
    }

    /// Sets the request retry behavior.
    pub fn retry(self, retry: Retry) -> Request<'a, stage::Final> {
        Request {
            url: self.url,
            client: self.client,
            state: stage::Final {
                meta: self.state.meta,
                retry,
            },
        }
    }
}

impl Request<'_, stage::Final> {
    /// Sends the request as a REST `GET` operation and parses the response
    /// into `T`.
    pub async fn get<T>(self) -> Result<T, SequencerError>
    where
        T: serde::de::DeserializeOwned,
    {
        async fn send_request<T: serde::de::DeserializeOwned>(
            url: reqwest::Url,
            client: &reqwest::Client,
            meta: RequestMetadata,
        ) -> Result<T, SequencerError> {
            with_metrics(meta, async move {
                tracing::trace!(%url, "Fetching data from feeder gateway");
                let response = client.get(url).send().await?;
                parse::<T>(response).await
            })
            .await
        }

        match self.state.retry {
            Retry::Disabled => send_request(self.url, self.client, self.state.meta).await,
            Retry::Bounded(retries) => {
                retry0(
                    || send_request(self.url.clone(), self.client, self.state.meta),
                    retries,
                )
                .await
            }
        }
    }

    /// Sends the request as a REST `POST` operation with `json` as its body.
    /// The response is parsed as type `T`.
    ///
    /// The body is produced by [to_wire_json](courier_serde::json::to_wire_json),
    /// so nothing is sent if it holds a number JSON consumers cannot
    /// represent exactly.
    pub async fn post_with_json<T, J>(self, json: &J) -> Result<T, SequencerError>
    where
        T: serde::de::DeserializeOwned,
        J: serde::Serialize + ?Sized,
    {
        async fn post_inner<T: serde::de::DeserializeOwned>(
            url: reqwest::Url,
            client: &reqwest::Client,
            meta: RequestMetadata,
            body: Vec<u8>,
        ) -> Result<T, SequencerError> {
            with_metrics(meta, async move {
                tracing::trace!(%url, "Posting data to gateway");
                let response = client
                    .post(url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
                    .await?;
                parse::<T>(response).await
            })
            .await
        }

        let body = courier_serde::json::to_wire_json(json)?;

        match self.state.retry {
            Retry::Disabled => post_inner(self.url, self.client, self.state.meta, body).await,
            Retry::Bounded(retries) => {
                retry0(
                    || post_inner(self.url.clone(), self.client, self.state.meta, body.clone()),
                    retries,
                )
                .await
            }
        }
    }
}

async fn parse<T>(response: reqwest::Response) -> Result<T, SequencerError>
where
    T: ::serde::de::DeserializeOwned,
{
    let response = parse_raw(response).await?;
    let response = response.json::<T>().await?;
    Ok(response)
}

/// Turns error statuses into [SequencerError]s, leaving successful responses
/// untouched.
async fn parse_raw(response: reqwest::Response) -> Result<reqwest::Response, SequencerError> {
    tracing::trace!(status=%response.status(), "Parsing response from gateway");

    // Starknet specific errors end with a 400 or 500 status code
    // but the body contains a JSON object with the error description
    if response.status() == reqwest::StatusCode::INTERNAL_SERVER_ERROR
        || response.status() == reqwest::StatusCode::BAD_REQUEST
    {
        let body = response.text().await?;
        return match serde_json::from_str::<StarknetError>(&body) {
            Ok(e) => Err(SequencerError::StarknetError(e)),
            Err(e) => {
                tracing::error!(reason=?e, %body, "Failed to decode Starknet error from gateway response");
                Err(SequencerError::InvalidStarknetErrorVariant)
            }
        };
    }

    // Other 4xx and 5xx statuses are transport errors
    response.error_for_status_ref()?;
    Ok(response)
}

pub trait RequestState {}

/// Retries `future_factory` with capped exponential backoff, at most
/// `retries` times and only for errors accepted by [retry_condition].
///
/// Delays start at 2 seconds and double up to 10 seconds.
async fn retry0<T, Fut, FutureFactory>(
    future_factory: FutureFactory,
    retries: usize,
) -> Result<T, SequencerError>
where
    Fut: std::future::Future<Output = Result<T, SequencerError>>,
    FutureFactory: FnMut() -> Fut,
{
    use tokio_retry::strategy::ExponentialBackoff;

    let strategy = ExponentialBackoff::from_millis(2)
        .factor(1000)
        .max_delay(Duration::from_secs(10))
        .take(retries);

    tokio_retry::RetryIf::spawn(strategy, future_factory, retry_condition).await
}

/// Determines if an error is retryable or not.
fn retry_condition(e: &SequencerError) -> bool {
    use reqwest::StatusCode;
    use tracing::{debug, error, info, warn};

    match e {
        SequencerError::ReqwestError(e) => {
            if e.is_timeout() {
                info!(reason=?e, "Request failed, retrying. Fetching the response or parts of it timed out. Try increasing the request timeout.");
                return true;
            }

            if e.is_body() || e.is_connect() {
                info!(reason=?e, "Request failed, retrying");
            } else if let Some(status) = e.status() {
                match status {
                    StatusCode::NOT_FOUND
                    | StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT => {
                        debug!(reason=?e, "Request failed, retrying");
                    }
                    _ => warn!(reason=?e, "Request failed, retrying"),
                }
            } else if e.is_decode() {
                error!(reason=?e, "Request failed, retrying");
            } else {
                warn!(reason=?e, "Request failed, retrying");
            }

            true
        }
        SequencerError::InvalidStarknetErrorVariant => {
            error!(reason=?e, "Request failed, retrying");
            true
        }
        SequencerError::StarknetError(_)
        | SequencerError::Encode(_)
        | SequencerError::Serialization(_) => false,
    }
}
