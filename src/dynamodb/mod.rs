//! # DynamoDB Module
//!
//! This module provides table administration for Amazon DynamoDB: creating,
//! listing, describing, updating and deleting tables over the JSON
//! control-plane protocol.
//!
//! ## Components
//!
//! - `DynamoDb`: The client performing table operations.
//! - `Table`: A handle on one table, with its primary key and retry policy.
//! - `TableDescription`: The administrative metadata of a table.
//! - `Query`: Builds request bodies.
//! - `RetryPolicy`: Decides whether failed requests are repeated.
//! - `Transport`: Sends signed requests; `SdkTransport` does so through the AWS SDK.
//!
//! ## Usage
//!
//! When using `SdkTransport`, set up the following environment variables:
//!
//! - `AWS_ACCESS_KEY_ID`: Your AWS access key ID.
//! - `AWS_SECRET_ACCESS_KEY`: Your AWS secret access key.
//! - `AWS_REGION`: The AWS region where your DynamoDB tables are located.
//!
//! Optionally, you can also set:
//! - `AWS_SESSION_TOKEN`: If you're using temporary credentials.
//! - `AWS_ENDPOINT_URL`: For using a custom endpoint (e.g., for local development).
//!
//! ## Example
//!
//! ```rust,no_run
//! use dynamodb_table_admin::dynamodb::{AttributeType, DynamoDb, TableDescription, TableStatus};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = aws_config::load_from_env().await;
//!     let client = DynamoDb::from_sdk_config(&config);
//!
//!     let description = TableDescription::new("user_messages")
//!         .with_hash_key("user_id", AttributeType::String)
//!         .with_range_key("timestamp", AttributeType::Number)
//!         .with_throughput(1, 1);
//!
//!     client.create_table(&description).await?;
//!     client
//!         .wait_for_status("user_messages", TableStatus::Active, Duration::from_secs(2), 30)
//!         .await?;
//!
//!     let table = client.table(&description)?;
//!     table.update(&TableDescription::default().with_throughput(2, 2)).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod description;
mod error;
mod paginator;
mod query;
mod response;
mod retry;
mod schema;
mod sdk;
mod table;
mod transport;

pub use client::{DynamoDb, StatusOutcome};
pub use description::{
    GlobalSecondaryIndex, LocalSecondaryIndex, Projection, ProjectionType, ProvisionedThroughput,
    TableDescription, TableStatus,
};
pub use error::{Error, Result, TransportError};
pub use paginator::TableNamePages;
pub use query::Query;
pub use response::{
    decode_describe_table, decode_table_names_page, decode_table_status, TableNamesPage,
};
pub use retry::{
    is_transient, operation, Attempt, AttemptFn, BoundedBackoffRetry, NoRetry, RetryEvent,
    RetryObserver, RetryPolicy, TracingObserver, BASE_DELAY, MAX_RETRIES,
};
pub use schema::{
    build_primary_key, Attribute, AttributeDefinition, AttributeType, KeySchemaElement, KeyType,
    PrimaryKey,
};
pub use sdk::SdkTransport;
pub use table::Table;
pub use transport::{operation_of, target, BoxFuture, Transport, API_VERSION};
