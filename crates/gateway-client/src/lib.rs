//! Starknet gateway and feeder gateway client.
//!
//! Reads go to the feeder gateway and are retried on transient failures.
//! Transactions go to the gateway and are never retried: resubmitting an
//! accepted transaction is answered with `DUPLICATED_TRANSACTION`, not
//! ignored.
use anyhow::Context;
use courier_common::prelude::*;
use courier_common::Chain;
use courier_gateway_types::error::SequencerError;
use courier_gateway_types::reply;
use courier_gateway_types::request::Call;
use courier_gateway_types::transaction::{self, CompiledContract, Deploy, Transaction};
use courier_serde::NumericLiteral;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

mod builder;
mod config;
mod metrics;
mod poller;

pub use builder::Retry;
pub use config::{GatewayConfig, DEFAULT_READ_RETRIES, DEFAULT_REQUEST_TIMEOUT};
pub use poller::{ConfirmationPolicy, PollState, Poller, WaitError};

#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait::async_trait]
pub trait GatewayApi: Sync {
    async fn block(&self, block: BlockId) -> Result<reply::Block, SequencerError>;

    async fn code(
        &self,
        contract_address: ContractAddress,
        block: BlockId,
    ) -> Result<reply::Code, SequencerError>;

    async fn storage(
        &self,
        contract_address: ContractAddress,
        key: StorageAddress,
        block: BlockId,
    ) -> Result<StorageValue, SequencerError>;

    async fn transaction(
        &self,
        transaction_hash: TransactionHash,
    ) -> Result<reply::TransactionReply, SequencerError>;

    async fn transaction_status(
        &self,
        transaction_hash: TransactionHash,
    ) -> Result<reply::TransactionStatus, SequencerError>;

    async fn call_contract(
        &self,
        call: Call,
        block: BlockId,
    ) -> Result<reply::CallResponse, SequencerError>;

    async fn contract_addresses(&self) -> Result<reply::ContractAddresses, SequencerError>;

    async fn add_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<reply::AddTransactionResponse, SequencerError>;
}

/// Waits until `transaction_hash` reaches a terminal status, polling
/// `gateway` with `poller`.
pub async fn wait_for_transaction<G: GatewayApi + ?Sized>(
    gateway: &G,
    transaction_hash: TransactionHash,
    poller: &Poller,
    cancellation: &CancellationToken,
) -> Result<reply::Status, WaitError<SequencerError>> {
    poller
        .run(
            || async {
                gateway
                    .transaction_status(transaction_hash)
                    .await
                    .map(|status| status.tx_status)
            },
            cancellation,
        )
        .await
}

/// Starknet gateway client using the REST API.
///
/// Reads are retried on all errors __except for__
/// [Starknet specific errors](courier_gateway_types::error::StarknetError),
/// up to [GatewayConfig::read_retries] times. The backoff starts at 2
/// seconds and saturates at 10 seconds.
#[derive(Debug, Clone)]
pub struct Client {
    /// This client is internally refcounted
    inner: reqwest::Client,
    config: GatewayConfig,
}

impl Client {
    /// Creates a client for the endpoints of `config`.
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        for endpoint in [&config.read_endpoint, &config.write_endpoint] {
            anyhow::ensure!(
                !endpoint.cannot_be_a_base(),
                "Endpoint {endpoint} cannot be used as a base URL"
            );
        }

        metrics::register();

        Ok(Self {
            inner: reqwest::Client::builder()
                .timeout(config.request_timeout)
                .user_agent(courier_common::consts::USER_AGENT)
                .build()
                .context("Creating HTTP client")?,
            config,
        })
    }

    /// Creates a [Client] for [Chain::Mainnet].
    pub fn mainnet() -> anyhow::Result<Self> {
        Self::new(GatewayConfig::mainnet())
    }

    /// Creates a [Client] for [Chain::SepoliaTestnet].
    pub fn sepolia() -> anyhow::Result<Self> {
        Self::new(GatewayConfig::sepolia())
    }

    /// Creates a [Client] with a shared feeder gateway and gateway base url.
    pub fn with_base_url(base: Url) -> anyhow::Result<Self> {
        Self::new(GatewayConfig::from_base_url(base)?)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn gateway_request(&self) -> builder::Request<'_, builder::stage::Method> {
        builder::Request::builder(&self.inner, self.config.write_endpoint.clone())
    }

    fn feeder_gateway_request(&self) -> builder::Request<'_, builder::stage::Method> {
        builder::Request::builder(&self.inner, self.config.read_endpoint.clone())
    }

    fn read_retry(&self) -> Retry {
        match self.config.read_retries {
            0 => Retry::Disabled,
            retries => Retry::Bounded(retries),
        }
    }

    fn poller(&self) -> Poller {
        Poller::new(self.config.poll_interval, self.config.confirmation)
    }

    /// Deploys `contract`, drawing a random salt if `salt` is not set.
    #[tracing::instrument(skip(self, contract))]
    pub async fn deploy_contract(
        &self,
        contract: CompiledContract,
        constructor_calldata: Vec<NumericLiteral>,
        salt: Option<NumericLiteral>,
    ) -> Result<reply::AddTransactionResponse, SequencerError> {
        let deploy = Deploy::new(contract, constructor_calldata, salt);
        self.add_transaction(Transaction::Deploy(deploy)).await
    }

    /// Polls the status of `transaction_hash` every
    /// [poll interval](GatewayConfig::poll_interval) until it is confirmed
    /// under the configured [ConfirmationPolicy].
    pub async fn wait_for_tx(
        &self,
        transaction_hash: TransactionHash,
    ) -> Result<reply::Status, WaitError<SequencerError>> {
        self.wait_for_tx_with_cancellation(transaction_hash, CancellationToken::new())
            .await
    }

    /// Same as [Client::wait_for_tx], ending with [WaitError::Cancelled] once
    /// `cancellation` fires.
    #[tracing::instrument(skip(self, cancellation))]
    pub async fn wait_for_tx_with_cancellation(
        &self,
        transaction_hash: TransactionHash,
        cancellation: CancellationToken,
    ) -> Result<reply::Status, WaitError<SequencerError>> {
        wait_for_transaction(self, transaction_hash, &self.poller(), &cancellation).await
    }

    /// Returns the [network chain](Chain) this client is operating on.
    pub async fn chain(&self) -> anyhow::Result<Chain> {
        use courier_common::consts::{MAINNET_GENESIS_HASH, SEPOLIA_TESTNET_GENESIS_HASH};

        let genesis_hash = self
            .block(BlockNumber::GENESIS.into())
            .await?
            .block_hash
            .context("Genesis block has no hash")?;

        Ok(match genesis_hash {
            mainnet if mainnet == MAINNET_GENESIS_HASH => Chain::Mainnet,
            sepolia if sepolia == SEPOLIA_TESTNET_GENESIS_HASH => Chain::SepoliaTestnet,
            _ => Chain::Custom,
        })
    }
}

#[async_trait::async_trait]
impl GatewayApi for Client {
    #[tracing::instrument(skip(self))]
    async fn block(&self, block: BlockId) -> Result<reply::Block, SequencerError> {
        self.feeder_gateway_request()
            .get_block()
            .block(block)
            .retry(self.read_retry())
            .get()
            .await
    }

    /// Gets the bytecode and ABI of a deployed contract.
    #[tracing::instrument(skip(self))]
    async fn code(
        &self,
        contract_address: ContractAddress,
        block: BlockId,
    ) -> Result<reply::Code, SequencerError> {
        self.feeder_gateway_request()
            .get_code()
            .contract_address(contract_address)
            .block(block)
            .retry(self.read_retry())
            .get()
            .await
    }

    /// Gets storage value associated with a `key` for a particular contract.
    #[tracing::instrument(skip(self))]
    async fn storage(
        &self,
        contract_address: ContractAddress,
        key: StorageAddress,
        block: BlockId,
    ) -> Result<StorageValue, SequencerError> {
        self.feeder_gateway_request()
            .get_storage_at()
            .contract_address(contract_address)
            .key(key)
            .block(block)
            .retry(self.read_retry())
            .get()
            .await
    }

    /// Gets transaction by hash.
    #[tracing::instrument(skip(self))]
    async fn transaction(
        &self,
        transaction_hash: TransactionHash,
    ) -> Result<reply::TransactionReply, SequencerError> {
        self.feeder_gateway_request()
            .get_transaction()
            .transaction_hash(transaction_hash)
            .retry(self.read_retry())
            .get()
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn transaction_status(
        &self,
        transaction_hash: TransactionHash,
    ) -> Result<reply::TransactionStatus, SequencerError> {
        self.feeder_gateway_request()
            .get_transaction_status()
            .transaction_hash(transaction_hash)
            .retry(self.read_retry())
            .get()
            .await
    }

    /// Executes a view call. Nothing is submitted, so this is retried like
    /// any other read.
    #[tracing::instrument(skip(self))]
    async fn call_contract(
        &self,
        call: Call,
        block: BlockId,
    ) -> Result<reply::CallResponse, SequencerError> {
        self.feeder_gateway_request()
            .call_contract()
            .block(block)
            .retry(self.read_retry())
            .post_with_json(&call)
            .await
    }

    /// Gets addresses of the Ethereum contracts crucial to Starknet operation.
    #[tracing::instrument(skip(self))]
    async fn contract_addresses(&self) -> Result<reply::ContractAddresses, SequencerError> {
        self.feeder_gateway_request()
            .get_contract_addresses()
            .retry(self.read_retry())
            .get()
            .await
    }

    /// Encodes and submits `transaction`.
    #[tracing::instrument(skip(self, transaction), fields(kind = %transaction.kind()))]
    async fn add_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<reply::AddTransactionResponse, SequencerError> {
        let payload = transaction::encode(&transaction)?;

        // Note that we don't do retries here, a resubmission is not a no-op.
        self.gateway_request()
            .add_transaction()
            .retry(Retry::Disabled)
            .post_with_json(&payload)
            .await
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use courier_gateway_test_utils::{response_from, setup, setup_with_varied_responses};
    use courier_gateway_types::error::{KnownStarknetErrorCode, StarknetErrorCode};
    use courier_gateway_types::reply::Status;
    use pretty_assertions_sorted::assert_eq;
    use std::time::Duration;

    use super::*;

    fn client(url: Url) -> Client {
        let config = GatewayConfig::from_base_url(url)
            .unwrap()
            .with_read_retries(0)
            .with_poll_interval(Duration::from_millis(10));
        Client::new(config).unwrap()
    }

    const BLOCK: &str = r#"{
        "block_hash": "0x47c3637b57c2b079b93c61539950c17e868a28f46cdef28f88521067f21e943",
        "block_number": 0,
        "parent_block_hash": "0x0",
        "state_root": "0x21870ba80540e7831fb21c591ee93481f5ae1bb71ff85a86ddd465be4eddee6",
        "status": "ACCEPTED_ON_L1",
        "timestamp": 1637069048,
        "transactions": [],
        "transaction_receipts": []
    }"#;

    mod block {
        use pretty_assertions_sorted::assert_eq;

        use super::*;

        #[tokio::test]
        async fn latest() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_block?blockId=null",
                (BLOCK, 200),
            )]);
            let block = client(url).block(BlockId::Latest).await.unwrap();
            assert_eq!(block.block_number, Some(BlockNumber::GENESIS));
            assert_eq!(block.status, Status::AcceptedOnchain);
        }

        #[tokio::test]
        async fn by_hash() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_block?blockHash=0x47c3637b57c2b079b93c61539950c17e868a28f46cdef28f88521067f21e943",
                (BLOCK, 200),
            )]);
            let hash =
                block_hash!("0x047c3637b57c2b079b93c61539950c17e868a28f46cdef28f88521067f21e943");
            client(url).block(hash.into()).await.unwrap();
        }

        #[tokio::test]
        async fn not_found() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_block?blockId=99999999",
                response_from(KnownStarknetErrorCode::BlockNotFound),
            )]);
            let error = client(url)
                .block(BlockNumber::new_or_panic(99999999).into())
                .await
                .unwrap_err();
            assert_eq!(
                error.known_code(),
                Some(KnownStarknetErrorCode::BlockNotFound)
            );
        }

        #[tokio::test]
        async fn unknown_error_code_is_surfaced_as_is() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_block?blockId=pending",
                (
                    r#"{"code":"StarknetErrorCode.BRAND_NEW","message":"new"}"#,
                    500,
                ),
            )]);
            let error = client(url).block(BlockId::Pending).await.unwrap_err();
            assert_matches!(
                error,
                SequencerError::StarknetError(e) => assert_eq!(
                    e.code,
                    StarknetErrorCode::Unknown("StarknetErrorCode.BRAND_NEW".to_owned())
                )
            );
        }

        #[tokio::test]
        async fn chain() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_block?blockId=0",
                (BLOCK, 200),
            )]);
            assert_eq!(client(url).chain().await.unwrap(), Chain::Mainnet);
        }
    }

    #[tokio::test]
    async fn code() {
        let (_jh, url) = setup([(
            "/feeder_gateway/get_code?contractAddress=0x123&blockId=null",
            (r#"{"bytecode": ["0x40780017fff7fff", "0x1"], "abi": []}"#, 200),
        )]);
        let code = client(url)
            .code(contract_address!("0x123"), BlockId::Latest)
            .await
            .unwrap();
        assert_eq!(code.bytecode, vec![felt!("0x40780017fff7fff"), felt!("0x1")]);
    }

    #[tokio::test]
    async fn storage() {
        let (_jh, url) = setup([(
            "/feeder_gateway/get_storage_at?contractAddress=0x123&key=16&blockId=7",
            (r#""0x1e240""#, 200),
        )]);
        let value = client(url)
            .storage(
                contract_address!("0x123"),
                storage_address!("0x10"),
                BlockNumber::new_or_panic(7).into(),
            )
            .await
            .unwrap();
        assert_eq!(value, storage_value!("0x1e240"));
    }

    #[tokio::test]
    async fn call_contract() {
        let (_jh, url) = setup([(
            "/feeder_gateway/call_contract?blockId=null",
            (r#"{"result": ["0x64", "0x0"]}"#, 200),
        )]);
        let call = Call {
            contract_address: contract_address!("0x1"),
            entry_point_selector: EntryPoint::hashed(b"balanceOf"),
            calldata: vec![call_param!("0x20")],
            signature: vec![],
        };
        let reply = client(url)
            .call_contract(call, BlockId::Latest)
            .await
            .unwrap();
        assert_eq!(
            reply.result,
            vec![call_result_value!("0x64"), call_result_value!("0x0")]
        );
    }

    #[tokio::test]
    async fn transaction() {
        let (_jh, url) = setup([(
            "/feeder_gateway/get_transaction?transactionHash=0xabc",
            (
                r#"{
                    "status": "ACCEPTED_ON_L2",
                    "block_hash": "0x1",
                    "block_number": 3,
                    "transaction_index": 0,
                    "transaction": {
                        "type": "INVOKE_FUNCTION",
                        "transaction_hash": "0xabc",
                        "contract_address": "0x5",
                        "entry_point_selector": "0x6",
                        "calldata": ["1"],
                        "signature": []
                    }
                }"#,
                200,
            ),
        )]);
        let reply = client(url)
            .transaction(transaction_hash!("0xabc"))
            .await
            .unwrap();
        assert_eq!(reply.status, Status::Pending);
        assert_eq!(reply.transaction.unwrap().hash(), transaction_hash!("0xabc"));
    }

    #[tokio::test]
    async fn contract_addresses() {
        let (_jh, url) = setup([(
            "/feeder_gateway/get_contract_addresses",
            (
                r#"{"Starknet": "0xc662c410C0ECf747543f5bA90660f6ABeBD9C8c4", "GpsStatementVerifier": "0x47312450B3Ac8b5b8e247a6bB6d523e7605bDb60"}"#,
                200,
            ),
        )]);
        let addresses = client(url).contract_addresses().await.unwrap();
        assert_eq!(
            addresses.gps_statement_verifier,
            "0x47312450B3Ac8b5b8e247a6bB6d523e7605bDb60"
        );
    }

    #[test_log::test(tokio::test)]
    async fn reads_are_retried() {
        let (_jh, url) = setup_with_varied_responses([(
            "/feeder_gateway/get_transaction_status?transactionHash=0x1".to_owned(),
            [
                ("".to_owned(), 503),
                (r#"{"tx_status": "RECEIVED"}"#.to_owned(), 200),
            ],
        )]);
        let config = GatewayConfig::from_base_url(url).unwrap().with_read_retries(1);
        let status = Client::new(config)
            .unwrap()
            .transaction_status(transaction_hash!("0x1"))
            .await
            .unwrap();
        assert_eq!(status.tx_status, Status::Received);
    }

    mod wait_for_tx {
        use pretty_assertions_sorted::assert_eq;

        use super::*;

        #[tokio::test]
        async fn confirmed_after_pending() {
            let (_jh, url) = setup_with_varied_responses([(
                "/feeder_gateway/get_transaction_status?transactionHash=0x1".to_owned(),
                [
                    (r#"{"tx_status": "RECEIVED"}"#.to_owned(), 200),
                    (r#"{"tx_status": "RECEIVED"}"#.to_owned(), 200),
                    (
                        r#"{"tx_status": "ACCEPTED_ON_L2", "block_hash": "0x2"}"#.to_owned(),
                        200,
                    ),
                ],
            )]);
            let status = client(url)
                .wait_for_tx(transaction_hash!("0x1"))
                .await
                .unwrap();
            assert_eq!(status, Status::Pending);
        }

        #[tokio::test]
        async fn rejected() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_transaction_status?transactionHash=0x1",
                (r#"{"tx_status": "REJECTED"}"#, 200),
            )]);
            let error = client(url)
                .wait_for_tx(transaction_hash!("0x1"))
                .await
                .unwrap_err();
            assert_eq!(error.reason(), Some("REJECTED"));
        }

        #[tokio::test]
        async fn reverted_is_final() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_transaction_status?transactionHash=0x1",
                (
                    r#"{"tx_status": "REVERTED", "block_hash": "0x2"}"#,
                    200,
                ),
            )]);
            let status = client(url)
                .wait_for_tx(transaction_hash!("0x1"))
                .await
                .unwrap();
            assert_eq!(status, Status::Reverted);
        }

        #[tokio::test]
        async fn aborted() {
            let (_jh, url) = setup([(
                "/feeder_gateway/get_transaction_status?transactionHash=0x1",
                (r#"{"tx_status": "ABORTED"}"#, 200),
            )]);
            let error = client(url)
                .wait_for_tx(transaction_hash!("0x1"))
                .await
                .unwrap_err();
            assert_matches!(error, WaitError::Rejected { reason } => assert_eq!(reason, "ABORTED"));
        }

        #[tokio::test]
        async fn with_mock_gateway() {
            use mockall::Sequence;

            let mut gateway = MockGatewayApi::new();
            let mut sequence = Sequence::new();
            for status in [Status::Received, Status::NotReceived] {
                gateway
                    .expect_transaction_status()
                    .times(1)
                    .in_sequence(&mut sequence)
                    .returning(move |_| {
                        Ok(reply::TransactionStatus {
                            tx_status: status,
                            block_hash: None,
                            tx_failure_reason: None,
                        })
                    });
            }

            let poller = Poller::new(Duration::from_millis(1), ConfirmationPolicy::AcceptPending);
            let error = wait_for_transaction(
                &gateway,
                transaction_hash!("0x7"),
                &poller,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
            assert_matches!(error, WaitError::NotReceived { reason } => assert_eq!(reason, "NOT_RECEIVED"));
        }
    }

    mod add_transaction {
        use courier_gateway_types::program::compress;
        use courier_gateway_types::transaction::InvokeFunction;
        use httpmock::prelude::*;
        use pretty_assertions_sorted::assert_eq;
        use serde_json::json;

        use super::*;

        fn contract() -> CompiledContract {
            serde_json::from_value(json!({
                "program": {"data": ["0x1", "0x2"], "main_scope": "__main__"},
                "entry_points_by_type": {"CONSTRUCTOR": [], "EXTERNAL": [], "L1_HANDLER": []},
                "abi": [],
            }))
            .unwrap()
        }

        #[tokio::test]
        async fn invoke() {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(POST)
                    .path("/gateway/add_transaction")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "type": "INVOKE_FUNCTION",
                        "version": "0x1",
                        "max_fee": "0x2386f26fc10000",
                        "signature": [],
                        "nonce": "0x0",
                        "contract_address": "0x4d2",
                        "calldata": ["1", "340282366920938463463374607431768211455"],
                    }));
                then.status(200).json_body(json!({
                    "code": "TRANSACTION_RECEIVED",
                    "transaction_hash": "0x3bc",
                }));
            });

            let tx = Transaction::InvokeFunction(InvokeFunction {
                contract_address: 1234u64.into(),
                entry_point_selector: None,
                calldata: vec![1u64.into(), u128::MAX.into()],
                signature: vec![],
                max_fee: Some("0x2386f26fc10000".into()),
                nonce: Some(0u64.into()),
                version: Some(1u64.into()),
            });

            let response = client(server.base_url().parse().unwrap())
                .add_transaction(tx)
                .await
                .unwrap();

            mock.assert();
            assert_eq!(response.transaction_hash, transaction_hash!("0x3bc"));
        }

        #[tokio::test]
        async fn deploy_contract_with_fixed_salt() {
            let contract = contract();
            let expected = json!({
                "type": "DEPLOY",
                "contract_address_salt": "0x3039",
                "contract_definition": {
                    "program": compress(&contract.program).unwrap(),
                },
            });

            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(POST)
                    .path("/gateway/add_transaction")
                    .json_body_partial(expected.to_string());
                then.status(200).json_body(json!({
                    "code": "TRANSACTION_RECEIVED",
                    "transaction_hash": "0x1",
                    "address": "0x2",
                }));
            });

            let response = client(server.base_url().parse().unwrap())
                .deploy_contract(contract, vec![], Some(12345u64.into()))
                .await
                .unwrap();

            mock.assert();
            assert_eq!(response.address, Some(contract_address!("0x2")));
        }

        #[tokio::test]
        async fn duplicate_is_not_retried() {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.method(POST).path("/gateway/add_transaction");
                then.status(400).json_body(json!({
                    "code": "StarknetErrorCode.DUPLICATED_TRANSACTION",
                    "message": "Transaction already exists",
                }));
            });

            let config = GatewayConfig::from_base_url(server.base_url().parse().unwrap())
                .unwrap()
                .with_read_retries(5);
            let error = Client::new(config)
                .unwrap()
                .deploy_contract(contract(), vec![], Some(1u64.into()))
                .await
                .unwrap_err();

            mock.assert_hits(1);
            assert_eq!(
                error.known_code(),
                Some(KnownStarknetErrorCode::DuplicatedTransaction)
            );
        }

        #[tokio::test]
        async fn encoding_errors_are_not_sent() {
            let server = MockServer::start_async().await;
            let mock = server.mock(|when, then| {
                when.any_request();
                then.status(200);
            });

            let tx = Transaction::InvokeFunction(InvokeFunction {
                contract_address: "not a number".into(),
                entry_point_selector: None,
                calldata: vec![],
                signature: vec![],
                max_fee: None,
                nonce: None,
                version: None,
            });
            let error = client(server.base_url().parse().unwrap())
                .add_transaction(tx)
                .await
                .unwrap_err();

            mock.assert_hits(0);
            assert_matches!(error, SequencerError::Encode(_));
        }
    }
}
