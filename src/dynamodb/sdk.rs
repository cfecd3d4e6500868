//! [`Transport`] backed by the AWS SDK.
//!
//! The SDK owns credentials, request signing and HTTP. Its built-in retries are
//! disabled so that the [`RetryPolicy`](crate::dynamodb::RetryPolicy) attached
//! to the client or table stays the only retry layer.

use async_trait::async_trait;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::config::retry::RetryConfig;
use aws_sdk_dynamodb::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types as sdk;
use aws_sdk_dynamodb::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::dynamodb::description::{
    GlobalSecondaryIndex, LocalSecondaryIndex, Projection, ProjectionType, ProvisionedThroughput,
    TableDescription, TableStatus,
};
use crate::dynamodb::error::TransportError;
use crate::dynamodb::schema::{AttributeDefinition, AttributeType, KeySchemaElement, KeyType};
use crate::dynamodb::transport::{operation_of, Transport};

/// Sends control-plane requests through an `aws_sdk_dynamodb::Client`.
#[derive(Debug, Clone)]
pub struct SdkTransport {
    client: Client,
}

impl SdkTransport {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        let config = aws_sdk_dynamodb::config::Builder::from(sdk_config)
            .retry_config(RetryConfig::disabled())
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }

    /// Wraps an existing client as-is, including its retry configuration.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn create_table(&self, request: TableDescription) -> Result<Value, TransportError> {
        let mut builder = self
            .client
            .create_table()
            .table_name(request.table_name)
            .set_attribute_definitions(Some(to_sdk_attribute_definitions(
                &request.attribute_definitions,
            )?))
            .set_key_schema(Some(to_sdk_key_schema(&request.key_schema)?))
            .provisioned_throughput(to_sdk_throughput(&request.provisioned_throughput)?);

        if !request.local_secondary_indexes.is_empty() {
            let indexes = request
                .local_secondary_indexes
                .iter()
                .map(|index| -> Result<_, TransportError> {
                    sdk::LocalSecondaryIndex::builder()
                        .index_name(&index.index_name)
                        .set_key_schema(Some(to_sdk_key_schema(&index.key_schema)?))
                        .projection(to_sdk_projection(&index.projection))
                        .build()
                        .map_err(invalid_request)
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.set_local_secondary_indexes(Some(indexes));
        }

        if !request.global_secondary_indexes.is_empty() {
            let indexes = request
                .global_secondary_indexes
                .iter()
                .map(|index| -> Result<_, TransportError> {
                    sdk::GlobalSecondaryIndex::builder()
                        .index_name(&index.index_name)
                        .set_key_schema(Some(to_sdk_key_schema(&index.key_schema)?))
                        .projection(to_sdk_projection(&index.projection))
                        .provisioned_throughput(to_sdk_throughput(&index.provisioned_throughput)?)
                        .build()
                        .map_err(invalid_request)
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.set_global_secondary_indexes(Some(indexes));
        }

        let output = builder.send().await.map_err(map_sdk_error)?;
        Ok(json!({ "TableDescription": output.table_description().map(from_sdk_description) }))
    }

    async fn delete_table(&self, request: TableDescription) -> Result<Value, TransportError> {
        let output = self
            .client
            .delete_table()
            .table_name(request.table_name)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(json!({ "TableDescription": output.table_description().map(from_sdk_description) }))
    }

    async fn describe_table(&self, request: TableDescription) -> Result<Value, TransportError> {
        let output = self
            .client
            .describe_table()
            .table_name(request.table_name)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(json!({ "Table": output.table().map(from_sdk_description) }))
    }

    async fn update_table(&self, request: UpdateTableBody) -> Result<Value, TransportError> {
        let throughput = request
            .provisioned_throughput
            .as_ref()
            .map(to_sdk_throughput)
            .transpose()?;

        let updates = request
            .global_secondary_index_updates
            .iter()
            .map(|update| -> Result<_, TransportError> {
                let action = sdk::UpdateGlobalSecondaryIndexAction::builder()
                    .index_name(&update.update.index_name)
                    .provisioned_throughput(to_sdk_throughput(
                        &update.update.provisioned_throughput,
                    )?)
                    .build()
                    .map_err(invalid_request)?;
                Ok(sdk::GlobalSecondaryIndexUpdate::builder()
                    .update(action)
                    .build())
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .update_table()
            .table_name(request.table_name)
            .set_provisioned_throughput(throughput)
            .set_global_secondary_index_updates((!updates.is_empty()).then_some(updates))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(json!({ "TableDescription": output.table_description().map(from_sdk_description) }))
    }

    async fn list_tables(&self, request: ListTablesBody) -> Result<Value, TransportError> {
        let output = self
            .client
            .list_tables()
            .set_exclusive_start_table_name(request.exclusive_start_table_name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let mut response = json!({ "TableNames": output.table_names() });
        if let Some(last) = output.last_evaluated_table_name() {
            response["LastEvaluatedTableName"] = Value::String(last.to_string());
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for SdkTransport {
    async fn send(&self, target: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let operation = operation_of(target)
            .ok_or_else(|| TransportError::Dispatch(format!("unknown target '{target}'")))?;
        debug!("Dispatching {operation} through the AWS SDK");

        let response = match operation {
            "CreateTable" => self.create_table(parse_body(body)?).await?,
            "DeleteTable" => self.delete_table(parse_body(body)?).await?,
            "DescribeTable" => self.describe_table(parse_body(body)?).await?,
            "UpdateTable" => self.update_table(parse_body(body)?).await?,
            "ListTables" => self.list_tables(parse_body(body)?).await?,
            other => {
                return Err(TransportError::Dispatch(format!(
                    "unsupported operation '{other}'"
                )))
            }
        };

        serde_json::to_vec(&response).map_err(|e| TransportError::Dispatch(e.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct UpdateTableBody {
    table_name: String,
    provisioned_throughput: Option<ProvisionedThroughput>,
    global_secondary_index_updates: Vec<IndexUpdateBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IndexUpdateBody {
    update: IndexThroughputBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IndexThroughputBody {
    index_name: String,
    provisioned_throughput: ProvisionedThroughput,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListTablesBody {
    exclusive_start_table_name: Option<String>,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(body)
        .map_err(|e| TransportError::Dispatch(format!("invalid request body: {e}")))
}

fn invalid_request(err: BuildError) -> TransportError {
    TransportError::Dispatch(format!("invalid request: {err}"))
}

fn map_sdk_error<E>(err: SdkError<E, HttpResponse>) -> TransportError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err.raw_response().map(|response| response.status().as_u16()) {
        Some(status) => TransportError::Service {
            status,
            code: err.code().unwrap_or_default().to_string(),
            message: err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
        },
        None => TransportError::Dispatch(DisplayErrorContext(&err).to_string()),
    }
}

// --- Request conversion ---

fn to_sdk_attribute_definitions(
    definitions: &[AttributeDefinition],
) -> Result<Vec<sdk::AttributeDefinition>, TransportError> {
    definitions
        .iter()
        .map(|definition| {
            sdk::AttributeDefinition::builder()
                .attribute_name(&definition.attribute_name)
                .attribute_type(sdk::ScalarAttributeType::from(
                    definition.attribute_type.as_str(),
                ))
                .build()
                .map_err(invalid_request)
        })
        .collect()
}

fn to_sdk_key_schema(
    elements: &[KeySchemaElement],
) -> Result<Vec<sdk::KeySchemaElement>, TransportError> {
    elements
        .iter()
        .map(|element| {
            let key_type = match element.key_type {
                KeyType::Hash => sdk::KeyType::Hash,
                KeyType::Range => sdk::KeyType::Range,
            };
            sdk::KeySchemaElement::builder()
                .attribute_name(&element.attribute_name)
                .key_type(key_type)
                .build()
                .map_err(invalid_request)
        })
        .collect()
}

fn to_sdk_throughput(
    throughput: &ProvisionedThroughput,
) -> Result<sdk::ProvisionedThroughput, TransportError> {
    sdk::ProvisionedThroughput::builder()
        .read_capacity_units(throughput.read_capacity_units)
        .write_capacity_units(throughput.write_capacity_units)
        .build()
        .map_err(invalid_request)
}

fn to_sdk_projection(projection: &Projection) -> sdk::Projection {
    let projection_type = match projection.projection_type {
        ProjectionType::All => sdk::ProjectionType::All,
        ProjectionType::KeysOnly => sdk::ProjectionType::KeysOnly,
        ProjectionType::Include => sdk::ProjectionType::Include,
    };
    let non_key_attributes = (!projection.non_key_attributes.is_empty())
        .then(|| projection.non_key_attributes.clone());
    sdk::Projection::builder()
        .projection_type(projection_type)
        .set_non_key_attributes(non_key_attributes)
        .build()
}

// --- Response conversion ---

fn from_sdk_key_schema(elements: &[sdk::KeySchemaElement]) -> Vec<KeySchemaElement> {
    elements
        .iter()
        .filter_map(|element| {
            let key_type = match element.key_type() {
                sdk::KeyType::Hash => KeyType::Hash,
                sdk::KeyType::Range => KeyType::Range,
                _ => return None,
            };
            Some(KeySchemaElement::new(element.attribute_name(), key_type))
        })
        .collect()
}

fn from_sdk_throughput(throughput: &sdk::ProvisionedThroughputDescription) -> ProvisionedThroughput {
    ProvisionedThroughput {
        number_of_decreases_today: throughput.number_of_decreases_today().unwrap_or_default(),
        read_capacity_units: throughput.read_capacity_units().unwrap_or_default(),
        write_capacity_units: throughput.write_capacity_units().unwrap_or_default(),
    }
}

fn from_sdk_projection(projection: Option<&sdk::Projection>) -> Projection {
    let Some(projection) = projection else {
        return Projection::default();
    };
    let projection_type = match projection.projection_type() {
        Some(sdk::ProjectionType::KeysOnly) => ProjectionType::KeysOnly,
        Some(sdk::ProjectionType::Include) => ProjectionType::Include,
        _ => ProjectionType::All,
    };
    Projection {
        projection_type,
        non_key_attributes: projection.non_key_attributes().to_vec(),
    }
}

fn from_sdk_description(description: &sdk::TableDescription) -> TableDescription {
    TableDescription {
        table_name: description.table_name().unwrap_or_default().to_string(),
        attribute_definitions: description
            .attribute_definitions()
            .iter()
            .map(|definition| {
                AttributeDefinition::new(
                    definition.attribute_name(),
                    AttributeType::from(definition.attribute_type().as_str().to_string()),
                )
            })
            .collect(),
        key_schema: from_sdk_key_schema(description.key_schema()),
        provisioned_throughput: description
            .provisioned_throughput()
            .map(from_sdk_throughput)
            .unwrap_or_default(),
        local_secondary_indexes: description
            .local_secondary_indexes()
            .iter()
            .map(|index| LocalSecondaryIndex {
                index_name: index.index_name().unwrap_or_default().to_string(),
                index_size_bytes: index.index_size_bytes().unwrap_or_default(),
                item_count: index.item_count().unwrap_or_default(),
                key_schema: from_sdk_key_schema(index.key_schema()),
                projection: from_sdk_projection(index.projection()),
            })
            .collect(),
        global_secondary_indexes: description
            .global_secondary_indexes()
            .iter()
            .map(|index| GlobalSecondaryIndex {
                index_name: index.index_name().unwrap_or_default().to_string(),
                index_size_bytes: index.index_size_bytes().unwrap_or_default(),
                item_count: index.item_count().unwrap_or_default(),
                key_schema: from_sdk_key_schema(index.key_schema()),
                projection: from_sdk_projection(index.projection()),
                provisioned_throughput: index
                    .provisioned_throughput()
                    .map(from_sdk_throughput)
                    .unwrap_or_default(),
            })
            .collect(),
        item_count: description.item_count().unwrap_or_default(),
        table_size_bytes: description.table_size_bytes().unwrap_or_default(),
        table_status: description
            .table_status()
            .map(|status| TableStatus::from(status.as_str())),
        creation_date_time: description
            .creation_date_time()
            .map(|created| created.as_secs_f64())
            .unwrap_or_default(),
    }
}
