use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::dynamodb::description::{TableDescription, TableStatus};
use crate::dynamodb::error::{Error, Result};
use crate::dynamodb::paginator::TableNamePages;
use crate::dynamodb::query::Query;
use crate::dynamodb::response::{
    decode_describe_table, decode_table_names_page, decode_table_status, TableNamesPage,
};
use crate::dynamodb::retry::{NoRetry, RetryPolicy};
use crate::dynamodb::schema::PrimaryKey;
use crate::dynamodb::sdk::SdkTransport;
use crate::dynamodb::table::Table;
use crate::dynamodb::transport::{target, Transport};

/// DynamoDB client for table administration.
///
/// This struct turns typed table descriptions into control-plane requests,
/// hands them to a [`Transport`], and decodes the responses.
///
/// # Operations
///
/// - **CreateTable**: Create a table from a [`TableDescription`]
/// - **DeleteTable**: Delete a table by name
/// - **DescribeTable**: Fetch the full description of a table
/// - **UpdateTable**: Change throughput of a table or its global indexes
/// - **ListTables**: List every table, following pagination cursors
///
/// # Retries
///
/// Every request runs through the client's [`RetryPolicy`], which is
/// [`NoRetry`] unless replaced with [`DynamoDb::with_retry_policy`]. [`Table`]
/// handles carry their own policy.
///
/// # Example
///
/// ```rust,no_run
/// use dynamodb_table_admin::dynamodb::{AttributeType, DynamoDb, TableDescription};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = aws_config::load_from_env().await;
///     let client = DynamoDb::from_sdk_config(&config);
///
///     let description = TableDescription::new("users")
///         .with_hash_key("user_id", AttributeType::String)
///         .with_throughput(1, 1);
///     let status = client.create_table(&description).await?;
///     println!("users is {status}");
///
///     for name in client.list_tables().await? {
///         println!("{name}");
///     }
///     Ok(())
/// }
/// ```
///
/// # Error Handling
///
/// Methods return [`Result`](crate::dynamodb::Result). Status-returning
/// operations can be reduced to a status with [`StatusOutcome::status`], which
/// yields [`TableStatus::Unknown`] for failures.
#[derive(Clone)]
pub struct DynamoDb {
    transport: Arc<dyn Transport>,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl fmt::Debug for DynamoDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoDb")
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl DynamoDb {
    /// Creates a new `DynamoDb` instance on top of a transport.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry_policy: Arc::new(NoRetry),
        }
    }

    /// Creates a client that sends requests through the AWS SDK.
    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(SdkTransport::new(sdk_config))
    }

    /// Replaces the retry policy used by the client's own operations.
    pub fn with_retry_policy(mut self, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn retry_policy(&self) -> &Arc<dyn RetryPolicy> {
        &self.retry_policy
    }

    /// Verifies the endpoint and credentials by requesting the first page of tables.
    pub async fn check_connection(&self) -> Result<()> {
        self.list_tables_page("").await.map_err(|e| {
            error!("Connection check failed: {}", e);
            e
        })?;
        info!("Connection check successful");
        Ok(())
    }

    // --- Table handles ---

    /// Creates a handle for a table whose key is already known.
    pub fn new_table(&self, name: impl Into<String>, key: PrimaryKey) -> Table {
        Table::new(self.clone(), name.into(), key)
    }

    /// Creates a handle for the table described by `description`.
    pub fn table(&self, description: &TableDescription) -> Result<Table> {
        let key = description.build_primary_key()?;
        Ok(self.new_table(description.table_name.clone(), key))
    }

    // --- Table Operations ---

    /// Creates a table. Returns the status reported by the service, normally
    /// `CREATING` or `ACTIVE`.
    pub async fn create_table(&self, description: &TableDescription) -> Result<TableStatus> {
        description.build_primary_key()?;

        let mut query = Query::new();
        query.add_create_request_table(description)?;

        let status = self
            .table_status_request(self.retry_policy.as_ref(), "CreateTable", &query)
            .await?;
        info!("Table '{}' is {}", description.table_name, status);
        Ok(status)
    }

    /// Deletes the table named by `description`; all other fields are ignored.
    pub async fn delete_table(&self, description: &TableDescription) -> Result<TableStatus> {
        self.delete_table_with(self.retry_policy.as_ref(), description)
            .await
    }

    /// Sends the fields of a partial description that UpdateTable can change.
    pub async fn update_table(&self, description: &TableDescription) -> Result<TableStatus> {
        self.update_table_with(self.retry_policy.as_ref(), description)
            .await
    }

    /// Retrieves the full description of a table.
    pub async fn describe_table(&self, name: &str) -> Result<TableDescription> {
        self.describe_table_with(self.retry_policy.as_ref(), name)
            .await
    }

    /// Lists every table, in the order returned by the service.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.table_pages().collect_all().await
    }

    /// Visits every table name; `ControlFlow::Break` ends the listing early.
    pub async fn list_tables_each<F>(&self, visit: F) -> Result<()>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        self.table_pages().for_each(visit).await
    }

    /// Starts a page-by-page listing of tables.
    pub fn table_pages(&self) -> TableNamePages<'_> {
        TableNamePages::new(self)
    }

    /// Checks if a table exists.
    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let mut found = false;
        self.list_tables_each(|table| {
            if table == name {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;
        Ok(found)
    }

    /// Polls DescribeTable until the table reports `status`.
    ///
    /// Gives up with [`Error::StatusTimeout`] after `max_polls` descriptions
    /// that did not match.
    pub async fn wait_for_status(
        &self,
        name: &str,
        status: TableStatus,
        interval: Duration,
        max_polls: u32,
    ) -> Result<TableDescription> {
        let mut last = TableStatus::Unknown;
        for poll in 0..max_polls {
            let description = self.describe_table(name).await?;
            if description.table_status.as_ref() == Some(&status) {
                info!("Table '{name}' reached {status}");
                return Ok(description);
            }

            last = description.table_status.unwrap_or(TableStatus::Unknown);
            debug!("Table '{name}' is {last}, waiting for {status} (poll {})", poll + 1);
            if poll + 1 < max_polls {
                sleep(interval).await;
            }
        }

        Err(Error::StatusTimeout {
            table_name: name.to_string(),
            expected: status,
            last,
        })
    }

    // --- Request plumbing ---

    pub(crate) async fn delete_table_with(
        &self,
        policy: &dyn RetryPolicy,
        description: &TableDescription,
    ) -> Result<TableStatus> {
        let mut query = Query::new();
        query.add_delete_request_table(description);

        let status = self
            .table_status_request(policy, "DeleteTable", &query)
            .await?;
        info!("Table '{}' is {}", description.table_name, status);
        Ok(status)
    }

    pub(crate) async fn update_table_with(
        &self,
        policy: &dyn RetryPolicy,
        description: &TableDescription,
    ) -> Result<TableStatus> {
        let mut query = Query::new();
        query.add_update_request_table(description);

        let status = self
            .table_status_request(policy, "UpdateTable", &query)
            .await?;
        info!("Table '{}' is {}", description.table_name, status);
        Ok(status)
    }

    pub(crate) async fn describe_table_with(
        &self,
        policy: &dyn RetryPolicy,
        name: &str,
    ) -> Result<TableDescription> {
        let mut query = Query::new();
        query.add_table_by_name(name);

        let response = self.query_server(policy, "DescribeTable", &query).await?;
        decode_describe_table(&response)
    }

    pub(crate) async fn list_tables_page(&self, cursor: &str) -> Result<TableNamesPage> {
        let mut query = Query::new();
        query.add_exclusive_start_table_name(cursor);

        let response = self
            .query_server(self.retry_policy.as_ref(), "ListTables", &query)
            .await?;
        decode_table_names_page(&response)
    }

    async fn table_status_request(
        &self,
        policy: &dyn RetryPolicy,
        operation: &str,
        query: &Query,
    ) -> Result<TableStatus> {
        let response = self.query_server(policy, operation, query).await?;
        decode_table_status(&response)
    }

    async fn query_server(
        &self,
        policy: &dyn RetryPolicy,
        operation: &str,
        query: &Query,
    ) -> Result<Vec<u8>> {
        let body = query.to_body()?;
        let target = target(operation);
        debug!("Sending {target} ({} bytes)", body.len());

        let attempt = || self.transport.send(&target, &body);
        policy.execute(&attempt).await.map_err(Error::from)
    }
}

/// Reduces the outcome of a status-returning operation to a status.
pub trait StatusOutcome {
    /// The reported status, or [`TableStatus::Unknown`] if the operation failed.
    fn status(&self) -> TableStatus;
}

impl StatusOutcome for Result<TableStatus> {
    fn status(&self) -> TableStatus {
        match self {
            Ok(status) => status.clone(),
            Err(_) => TableStatus::Unknown,
        }
    }
}
