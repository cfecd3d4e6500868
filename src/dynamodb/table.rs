use std::sync::Arc;

use crate::dynamodb::client::DynamoDb;
use crate::dynamodb::description::{TableDescription, TableStatus};
use crate::dynamodb::error::Result;
use crate::dynamodb::retry::{BoundedBackoffRetry, RetryPolicy};
use crate::dynamodb::schema::PrimaryKey;

/// Handle on a single DynamoDB table.
///
/// A handle pairs a table name with the primary key derived from its key
/// schema, and runs its requests through its own retry policy.
///
/// # Table Structure
///
/// - **Table Name**: A unique identifier for the table within your AWS account and region.
/// - **Primary Key**: Consists of a partition key and an optional sort key.
///   - **Partition Key**: Determines the partition where the item is stored.
///   - **Sort Key**: Optional. Used to sort items with the same partition key.
///
/// # Retry policy
///
/// New handles retry transient failures with [`BoundedBackoffRetry`]. The
/// policy can be swapped with [`Table::set_retry_policy`]; since that takes
/// `&mut self`, a handle cannot be reconfigured while one of its requests is
/// in flight. Handles cloned before the swap keep the policy they had.
///
/// # Example
///
/// ```rust,no_run
/// use dynamodb_table_admin::dynamodb::{AttributeType, DynamoDb, NoRetry, TableDescription};
/// use std::sync::Arc;
///
/// # async fn example(client: DynamoDb) -> dynamodb_table_admin::dynamodb::Result<()> {
/// let description = TableDescription::new("user_messages")
///     .with_hash_key("user_id", AttributeType::String)
///     .with_range_key("timestamp", AttributeType::Number);
///
/// let mut table = client.table(&description)?;
/// table.set_retry_policy(Arc::new(NoRetry));
/// let description = table.describe().await?;
/// println!("{:?}", description.table_status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    server: DynamoDb,
    name: String,
    key: PrimaryKey,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl Table {
    pub(crate) fn new(server: DynamoDb, name: String, key: PrimaryKey) -> Self {
        Self {
            server,
            name,
            key,
            retry_policy: Arc::new(BoundedBackoffRetry::default()),
        }
    }

    /// Returns the name of the table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary key of the table.
    pub fn key(&self) -> &PrimaryKey {
        &self.key
    }

    pub fn server(&self) -> &DynamoDb {
        &self.server
    }

    pub fn retry_policy(&self) -> &Arc<dyn RetryPolicy> {
        &self.retry_policy
    }

    /// Replaces the retry policy; applies from the next request on.
    pub fn set_retry_policy(&mut self, retry_policy: Arc<dyn RetryPolicy>) {
        self.retry_policy = retry_policy;
    }

    /// Retrieves the current description of the table.
    pub async fn describe(&self) -> Result<TableDescription> {
        self.server
            .describe_table_with(self.retry_policy.as_ref(), &self.name)
            .await
    }

    /// Applies a partial description to this table. The description's own
    /// table name is ignored.
    pub async fn update(&self, changes: &TableDescription) -> Result<TableStatus> {
        let changes = TableDescription {
            table_name: self.name.clone(),
            ..changes.clone()
        };
        self.server
            .update_table_with(self.retry_policy.as_ref(), &changes)
            .await
    }

    /// Deletes the table.
    pub async fn delete(&self) -> Result<TableStatus> {
        self.server
            .delete_table_with(self.retry_policy.as_ref(), &TableDescription::new(&self.name))
            .await
    }
}
