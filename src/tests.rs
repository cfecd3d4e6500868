//! Tests for the table administration client.
//!
//! These tests drive `DynamoDb` and `Table` against in-memory transports that
//! replay scripted responses and record every request they receive, so no
//! DynamoDB endpoint or AWS credentials are needed.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::dynamodb::{
    AttemptFn, AttributeType, DynamoDb, Error, GlobalSecondaryIndex, KeyType, NoRetry,
    Projection, ProjectionType, ProvisionedThroughput, RetryPolicy, StatusOutcome,
    TableDescription, TableStatus, Transport, TransportError,
};

const TEST_TABLE_NAME: &str = "test-products";
const CATEGORY_PARTITION_KEY: &str = "category";
const PRODUCT_NAME_SORT_KEY: &str = "product_name";

#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTransport {
    fn new(responses: impl IntoIterator<Item = Result<Value, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, target: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let body: Value = serde_json::from_slice(body).expect("request body is JSON");
        self.requests.lock().unwrap().push((target.to_string(), body));

        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Dispatch("no scripted response".to_string())));
        response.map(|value| serde_json::to_vec(&value).unwrap())
    }
}

/// Answers DescribeTable with whatever the last CreateTable request carried.
#[derive(Default)]
struct EchoTransport {
    created: Mutex<Option<Value>>,
}

#[async_trait]
impl Transport for EchoTransport {
    async fn send(&self, target: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let body: Value = serde_json::from_slice(body).unwrap();
        let response = match target {
            "DynamoDB_20120810.CreateTable" => {
                *self.created.lock().unwrap() = Some(body);
                json!({"TableDescription": {"TableStatus": "CREATING"}})
            }
            "DynamoDB_20120810.DescribeTable" => {
                let mut table = self.created.lock().unwrap().clone().unwrap_or(Value::Null);
                table["TableStatus"] = json!("ACTIVE");
                json!({ "Table": table })
            }
            other => return Err(TransportError::Dispatch(format!("unexpected {other}"))),
        };
        Ok(serde_json::to_vec(&response).unwrap())
    }
}

fn service_error(status: u16, code: &str) -> TransportError {
    TransportError::Service {
        status,
        code: code.to_string(),
        message: format!("{code} from test"),
    }
}

fn status_response(status: &str) -> Result<Value, TransportError> {
    Ok(json!({"TableDescription": {"TableStatus": status}}))
}

fn describe_response(status: &str) -> Result<Value, TransportError> {
    Ok(json!({"Table": {
        "TableName": TEST_TABLE_NAME,
        "TableStatus": status,
        "AttributeDefinitions": [
            {"AttributeName": CATEGORY_PARTITION_KEY, "AttributeType": "S"},
            {"AttributeName": PRODUCT_NAME_SORT_KEY, "AttributeType": "S"},
        ],
        "KeySchema": [
            {"AttributeName": CATEGORY_PARTITION_KEY, "KeyType": "HASH"},
            {"AttributeName": PRODUCT_NAME_SORT_KEY, "KeyType": "RANGE"},
        ],
        "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 1},
    }}))
}

fn products_table() -> TableDescription {
    TableDescription::new(TEST_TABLE_NAME)
        .with_hash_key(CATEGORY_PARTITION_KEY, AttributeType::String)
        .with_range_key(PRODUCT_NAME_SORT_KEY, AttributeType::Number)
        .with_throughput(1, 1)
}

// --- ListTables ---

#[tokio::test]
async fn test_list_tables_follows_cursor() {
    let transport = ScriptedTransport::new([
        Ok(json!({"TableNames": ["A", "B"], "LastEvaluatedTableName": "B"})),
        Ok(json!({"TableNames": ["C"]})),
    ]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let tables = ddb.list_tables().await.unwrap();

    assert_eq!(tables, vec!["A", "B", "C"]);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].0, "DynamoDB_20120810.ListTables");
    assert_eq!(requests[0].1, json!({}));
    assert_eq!(requests[1].1, json!({"ExclusiveStartTableName": "B"}));
}

#[tokio::test]
async fn test_list_tables_stops_on_malformed_page() {
    let transport = ScriptedTransport::new([
        Ok(json!({"LastEvaluatedTableName": "B"})),
        Ok(json!({"TableNames": ["C"]})),
    ]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let err = ddb.list_tables().await.unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_list_tables_each_stops_early() {
    let transport = ScriptedTransport::new([
        Ok(json!({"TableNames": ["A", "B", "C"], "LastEvaluatedTableName": "C"})),
        Ok(json!({"TableNames": ["D"]})),
    ]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let mut visited = Vec::new();
    ddb.list_tables_each(|name| {
        visited.push(name.to_string());
        if name == "B" {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .await
    .unwrap();

    assert_eq!(visited, vec!["A", "B"]);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_list_tables_each_keeps_visited_names_on_failure() {
    let transport = ScriptedTransport::new([
        Ok(json!({"TableNames": ["A", "B"], "LastEvaluatedTableName": "B"})),
        Err(service_error(400, "AccessDeniedException")),
    ]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let mut visited = Vec::new();
    let result = ddb
        .list_tables_each(|name| {
            visited.push(name.to_string());
            ControlFlow::Continue(())
        })
        .await;

    assert!(matches!(result, Err(Error::PermanentServiceFailure(_))));
    assert_eq!(visited, vec!["A", "B"]);
}

#[tokio::test]
async fn test_table_pages_are_exhausted_after_last_page() {
    let transport = ScriptedTransport::new([Ok(json!({"TableNames": ["A"]}))]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let mut pages = ddb.table_pages();
    assert_eq!(pages.next_page().await.unwrap(), Some(vec!["A".to_string()]));
    assert!(pages.is_done());
    assert_eq!(pages.next_page().await.unwrap(), None);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_table_exists() {
    let transport = ScriptedTransport::new([
        Ok(json!({"TableNames": ["orders", TEST_TABLE_NAME], "LastEvaluatedTableName": TEST_TABLE_NAME})),
        Ok(json!({"TableNames": ["orders"]})),
    ]);
    let ddb = DynamoDb::with_transport(transport.clone());

    assert!(ddb.table_exists(TEST_TABLE_NAME).await.unwrap());
    assert!(!ddb.table_exists("missing").await.unwrap());
}

// --- Create / Update / Delete ---

#[tokio::test]
async fn test_create_table_returns_reported_status() {
    let transport = ScriptedTransport::new([status_response("CREATING")]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let outcome = ddb.create_table(&products_table()).await;

    assert_eq!(outcome.status(), TableStatus::Creating);
    let requests = transport.requests();
    assert_eq!(requests[0].0, "DynamoDB_20120810.CreateTable");
    assert_eq!(requests[0].1["TableName"], TEST_TABLE_NAME);
    assert_eq!(
        requests[0].1["ProvisionedThroughput"],
        json!({"ReadCapacityUnits": 1, "WriteCapacityUnits": 1})
    );
}

#[tokio::test]
async fn test_failures_report_unknown_status() {
    let transport = ScriptedTransport::new([Err(service_error(400, "ResourceInUseException"))]);
    let ddb = DynamoDb::with_transport(transport);

    let outcome = ddb.create_table(&products_table()).await;

    assert_eq!(outcome.status(), TableStatus::Unknown);
    assert_eq!(outcome.status().as_str(), "unknown");
    match outcome {
        Err(Error::PermanentServiceFailure(err)) => {
            assert_eq!(err.code(), Some("ResourceInUseException"))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_table_rejects_inconsistent_schema() {
    let transport = ScriptedTransport::new([status_response("CREATING")]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let mut description = products_table();
    description.attribute_definitions.pop();
    let outcome = ddb.create_table(&description).await;

    assert!(matches!(outcome, Err(Error::SchemaInconsistency(_))));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_status_string_passes_through() {
    let transport = ScriptedTransport::new([status_response("unknown")]);
    let ddb = DynamoDb::with_transport(transport);

    let outcome = ddb.create_table(&products_table()).await;

    assert_eq!(outcome.unwrap(), TableStatus::Other("unknown".to_string()));
}

#[tokio::test]
async fn test_missing_status_is_malformed() {
    let transport = ScriptedTransport::new([Ok(json!({"TableDescription": {}}))]);
    let ddb = DynamoDb::with_transport(transport);

    let outcome = ddb.delete_table(&products_table()).await;

    assert!(matches!(outcome, Err(Error::MalformedResponse { .. })));
    assert_eq!(outcome.status(), TableStatus::Unknown);
}

#[tokio::test]
async fn test_delete_table_sends_only_name() {
    let transport = ScriptedTransport::new([status_response("DELETING")]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let status = ddb.delete_table(&products_table()).await.unwrap();

    assert_eq!(status, TableStatus::Deleting);
    assert_eq!(
        transport.requests()[0],
        (
            "DynamoDB_20120810.DeleteTable".to_string(),
            json!({"TableName": TEST_TABLE_NAME})
        )
    );
}

#[tokio::test]
async fn test_update_table_sends_throughput_changes() {
    let transport = ScriptedTransport::new([status_response("UPDATING")]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let changes = TableDescription::new(TEST_TABLE_NAME)
        .with_throughput(2, 3)
        .with_global_secondary_index(GlobalSecondaryIndex {
            index_name: "by_price".to_string(),
            provisioned_throughput: ProvisionedThroughput::new(4, 5),
            ..GlobalSecondaryIndex::default()
        });
    let status = ddb.update_table(&changes).await.unwrap();

    assert_eq!(status, TableStatus::Updating);
    assert_eq!(
        transport.requests()[0].1,
        json!({
            "TableName": TEST_TABLE_NAME,
            "ProvisionedThroughput": {"ReadCapacityUnits": 2, "WriteCapacityUnits": 3},
            "GlobalSecondaryIndexUpdates": [{"Update": {
                "IndexName": "by_price",
                "ProvisionedThroughput": {"ReadCapacityUnits": 4, "WriteCapacityUnits": 5},
            }}],
        })
    );
}

// --- DescribeTable ---

#[tokio::test]
async fn test_create_then_describe_round_trip() {
    let ddb = DynamoDb::new(EchoTransport::default());
    let description = products_table()
        .with_attribute("price", AttributeType::Number)
        .with_global_secondary_index(GlobalSecondaryIndex {
            index_name: "by_price".to_string(),
            key_schema: vec![crate::dynamodb::KeySchemaElement::new("price", KeyType::Hash)],
            projection: Projection::include(["title"]),
            provisioned_throughput: ProvisionedThroughput::new(1, 1),
            ..GlobalSecondaryIndex::default()
        });

    ddb.create_table(&description).await.unwrap();
    let echoed = ddb.describe_table(TEST_TABLE_NAME).await.unwrap();

    assert_eq!(echoed.table_name, TEST_TABLE_NAME);
    assert_eq!(echoed.attribute_definitions, description.attribute_definitions);
    assert_eq!(echoed.key_schema, description.key_schema);
    assert_eq!(echoed.table_status, Some(TableStatus::Active));
    assert_eq!(
        echoed.global_secondary_indexes[0].projection.projection_type,
        ProjectionType::Include
    );
    assert_eq!(
        echoed.build_primary_key().unwrap(),
        description.build_primary_key().unwrap()
    );
}

#[tokio::test]
async fn test_describe_table_requires_table_field() {
    let transport = ScriptedTransport::new([Ok(json!({"TableDescription": {}}))]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let err = ddb.describe_table(TEST_TABLE_NAME).await.unwrap_err();

    assert!(matches!(err, Error::MalformedResponse { .. }));
    assert_eq!(
        transport.requests()[0],
        (
            "DynamoDB_20120810.DescribeTable".to_string(),
            json!({"TableName": TEST_TABLE_NAME})
        )
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_status_polls_until_active() {
    let transport =
        ScriptedTransport::new([describe_response("CREATING"), describe_response("ACTIVE")]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let description = ddb
        .wait_for_status(TEST_TABLE_NAME, TableStatus::Active, Duration::from_secs(1), 5)
        .await
        .unwrap();

    assert_eq!(description.table_status, Some(TableStatus::Active));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_status_gives_up() {
    let transport =
        ScriptedTransport::new([describe_response("CREATING"), describe_response("CREATING")]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let err = ddb
        .wait_for_status(TEST_TABLE_NAME, TableStatus::Active, Duration::from_secs(1), 2)
        .await
        .unwrap_err();

    match err {
        Error::StatusTimeout { expected, last, .. } => {
            assert_eq!(expected, TableStatus::Active);
            assert_eq!(last, TableStatus::Creating);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(transport.requests().len(), 2);
}

// --- Table handles ---

#[tokio::test]
async fn test_table_handle_from_inconsistent_description() {
    let transport = ScriptedTransport::new([]);
    let ddb = DynamoDb::with_transport(transport.clone());

    let mut description = products_table();
    description.attribute_definitions.pop();

    assert!(matches!(
        ddb.table(&description),
        Err(Error::SchemaInconsistency(_))
    ));
    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_table_handle_retries_with_its_own_policy() {
    let transport = ScriptedTransport::new([
        Err(service_error(500, "InternalServerError")),
        describe_response("ACTIVE"),
        Err(service_error(500, "InternalServerError")),
    ]);
    let ddb = DynamoDb::with_transport(transport.clone());
    let mut table = ddb.table(&products_table()).unwrap();

    assert_eq!(table.name(), TEST_TABLE_NAME);
    assert_eq!(table.key().key_attribute.name, CATEGORY_PARTITION_KEY);
    assert_eq!(
        table.key().range_attribute.as_ref().map(|a| &a.attribute_type),
        Some(&AttributeType::Number)
    );

    let description = table.describe().await.unwrap();
    assert_eq!(description.table_status, Some(TableStatus::Active));
    assert_eq!(transport.requests().len(), 2);

    table.set_retry_policy(Arc::new(NoRetry));
    let err = table.describe().await.unwrap_err();
    assert!(matches!(err, Error::TransientServiceFailure(_)));
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_table_update_uses_handle_name() {
    let transport = ScriptedTransport::new([status_response("UPDATING"), status_response("DELETING")]);
    let ddb = DynamoDb::with_transport(transport.clone());
    let table = ddb.table(&products_table()).unwrap();

    let changes = TableDescription::new("some-other-table").with_throughput(3, 3);
    assert_eq!(table.update(&changes).await.unwrap(), TableStatus::Updating);
    assert_eq!(table.delete().await.unwrap(), TableStatus::Deleting);

    let requests = transport.requests();
    assert_eq!(requests[0].1["TableName"], TEST_TABLE_NAME);
    assert_eq!(requests[1].1, json!({"TableName": TEST_TABLE_NAME}));
}

/// Retries dispatch failures once; stands in for a caller-supplied policy.
#[derive(Debug, Default)]
struct RetryDispatchOnce {
    invocations: AtomicUsize,
}

#[async_trait]
impl RetryPolicy for RetryDispatchOnce {
    async fn execute<'a>(&self, attempt: &'a AttemptFn<'a>) -> Result<Vec<u8>, TransportError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match attempt().await {
            Err(TransportError::Dispatch(_)) => attempt().await,
            outcome => outcome,
        }
    }
}

#[tokio::test]
async fn test_custom_retry_policy_plugs_in() {
    let transport = ScriptedTransport::new([
        Err(TransportError::Dispatch("connection reset".to_string())),
        Ok(json!({"TableNames": ["A"]})),
    ]);
    let policy = Arc::new(RetryDispatchOnce::default());
    let ddb = DynamoDb::with_transport(transport.clone()).with_retry_policy(policy.clone());

    assert_eq!(ddb.list_tables().await.unwrap(), vec!["A"]);
    assert_eq!(policy.invocations.load(Ordering::SeqCst), 1);
    assert_eq!(transport.requests().len(), 2);
}
