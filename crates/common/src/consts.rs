//! Constants shared by the courier crates.
use std::time::Duration;

use crate::{felt, BlockHash};

/// User agent used in http clients
pub const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Interval between two transaction status queries unless configured
/// otherwise. This is the only process wide default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

pub const MAINNET_GENESIS_HASH: BlockHash = BlockHash(felt!(
    "0x047C3637B57C2B079B93C61539950C17E868A28F46CDEF28F88521067F21E943"
));

pub const SEPOLIA_TESTNET_GENESIS_HASH: BlockHash = BlockHash(felt!(
    "0x5c627d4aeb51280058bed93c7889bce78114d63baad1be0f0aeb32496d5f19c"
));
