//! Table administration for Amazon DynamoDB.
//!
//! See the [`dynamodb`] module for the client, the table description model
//! and the retry policies.

pub mod dynamodb;
pub mod logging;

#[cfg(test)]
mod tests;
