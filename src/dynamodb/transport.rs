use async_trait::async_trait;

use crate::dynamodb::error::TransportError;

pub use futures_util::future::BoxFuture;

/// API version prefix of every control-plane target.
pub const API_VERSION: &str = "DynamoDB_20120810";

/// Builds the `X-Amz-Target` value for an operation, e.g. `DynamoDB_20120810.ListTables`.
pub fn target(operation: &str) -> String {
    format!("{API_VERSION}.{operation}")
}

/// Splits a target back into its operation name.
pub fn operation_of(target: &str) -> Option<&str> {
    target
        .strip_prefix(API_VERSION)
        .and_then(|rest| rest.strip_prefix('.'))
}

/// Sends signed control-plane requests.
///
/// Implementations own authentication, connection reuse and the
/// classification of failures into HTTP status and service error code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, target: &str, body: &[u8]) -> Result<Vec<u8>, TransportError>;
}
