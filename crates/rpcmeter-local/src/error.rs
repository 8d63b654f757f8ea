//! Local server error types.

use thiserror::Error;

/// Errors from server bookkeeping.
///
/// Call paths report [`rpcmeter_proto::Error`] directly.
#[derive(Debug, Error)]
pub enum Error {
    /// No subscription with this id.
    #[error("subscription {0} not found")]
    SubscriptionNotFound(u64),

    /// Framework error.
    #[error(transparent)]
    Rpc(#[from] rpcmeter_proto::Error),
}
