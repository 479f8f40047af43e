//! Transaction encoding and the wire types of the gateway and feeder gateway.
pub mod error;
pub mod program;
pub mod reply;
pub mod request;
pub mod transaction;
