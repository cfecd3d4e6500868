use serde_json::{json, Map, Value};

use crate::dynamodb::description::{GlobalSecondaryIndex, LocalSecondaryIndex, TableDescription};
use crate::dynamodb::error::Result;

/// Accumulates the JSON body of a single control-plane request.
///
/// Each operation populates a fresh query and serializes it once with
/// [`Query::to_body`]; nothing is sent until the whole body has been built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    buffer: Map<String, Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_table_by_name(&mut self, name: &str) {
        self.buffer
            .insert("TableName".to_string(), Value::String(name.to_string()));
    }

    /// Adds the pagination cursor. An empty name means the first page and adds nothing.
    pub fn add_exclusive_start_table_name(&mut self, name: &str) {
        if !name.is_empty() {
            self.buffer.insert(
                "ExclusiveStartTableName".to_string(),
                Value::String(name.to_string()),
            );
        }
    }

    pub fn add_create_request_table(&mut self, description: &TableDescription) -> Result<()> {
        self.add_table_by_name(&description.table_name);
        self.buffer.insert(
            "AttributeDefinitions".to_string(),
            serde_json::to_value(&description.attribute_definitions)?,
        );
        self.buffer.insert(
            "KeySchema".to_string(),
            serde_json::to_value(&description.key_schema)?,
        );
        self.buffer.insert(
            "ProvisionedThroughput".to_string(),
            throughput_value(
                description.provisioned_throughput.read_capacity_units,
                description.provisioned_throughput.write_capacity_units,
            ),
        );

        if !description.local_secondary_indexes.is_empty() {
            let indexes = description
                .local_secondary_indexes
                .iter()
                .map(local_index_value)
                .collect::<Result<Vec<_>>>()?;
            self.buffer
                .insert("LocalSecondaryIndexes".to_string(), Value::Array(indexes));
        }

        if !description.global_secondary_indexes.is_empty() {
            let indexes = description
                .global_secondary_indexes
                .iter()
                .map(global_index_value)
                .collect::<Result<Vec<_>>>()?;
            self.buffer
                .insert("GlobalSecondaryIndexes".to_string(), Value::Array(indexes));
        }

        Ok(())
    }

    /// Only the table name is sent; the rest of the description is ignored.
    pub fn add_delete_request_table(&mut self, description: &TableDescription) {
        self.add_table_by_name(&description.table_name);
    }

    /// Adds the fields of a partial description that an UpdateTable request can change.
    pub fn add_update_request_table(&mut self, description: &TableDescription) {
        self.add_table_by_name(&description.table_name);

        let throughput = description.provisioned_throughput;
        if throughput.is_set() {
            self.buffer.insert(
                "ProvisionedThroughput".to_string(),
                throughput_value(throughput.read_capacity_units, throughput.write_capacity_units),
            );
        }

        let updates: Vec<Value> = description
            .global_secondary_indexes
            .iter()
            .filter(|index| index.provisioned_throughput.is_set())
            .map(|index| {
                json!({
                    "Update": {
                        "IndexName": index.index_name,
                        "ProvisionedThroughput": throughput_value(
                            index.provisioned_throughput.read_capacity_units,
                            index.provisioned_throughput.write_capacity_units,
                        ),
                    }
                })
            })
            .collect();
        if !updates.is_empty() {
            self.buffer
                .insert("GlobalSecondaryIndexUpdates".to_string(), Value::Array(updates));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Serializes the accumulated parameters into a request body.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.buffer)?)
    }
}

fn throughput_value(read_capacity_units: i64, write_capacity_units: i64) -> Value {
    json!({
        "ReadCapacityUnits": read_capacity_units,
        "WriteCapacityUnits": write_capacity_units,
    })
}

fn local_index_value(index: &LocalSecondaryIndex) -> Result<Value> {
    Ok(json!({
        "IndexName": index.index_name,
        "KeySchema": serde_json::to_value(&index.key_schema)?,
        "Projection": serde_json::to_value(&index.projection)?,
    }))
}

fn global_index_value(index: &GlobalSecondaryIndex) -> Result<Value> {
    Ok(json!({
        "IndexName": index.index_name,
        "KeySchema": serde_json::to_value(&index.key_schema)?,
        "Projection": serde_json::to_value(&index.projection)?,
        "ProvisionedThroughput": throughput_value(
            index.provisioned_throughput.read_capacity_units,
            index.provisioned_throughput.write_capacity_units,
        ),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamodb::description::{Projection, ProjectionType, ProvisionedThroughput};
    use crate::dynamodb::schema::{AttributeType, KeySchemaElement, KeyType};

    fn body(query: &Query) -> Value {
        serde_json::from_slice(&query.to_body().unwrap()).unwrap()
    }

    #[test]
    fn first_page_has_no_cursor() {
        let mut query = Query::new();
        query.add_exclusive_start_table_name("");
        assert!(query.is_empty());
        assert_eq!(body(&query), json!({}));

        query.add_exclusive_start_table_name("orders");
        assert_eq!(body(&query), json!({"ExclusiveStartTableName": "orders"}));
    }

    #[test]
    fn create_request_carries_schema_and_indexes() {
        let description = TableDescription::new("users")
            .with_hash_key("UserId", AttributeType::String)
            .with_range_key("OSType", AttributeType::String)
            .with_attribute("IMSI", AttributeType::String)
            .with_throughput(1, 2)
            .with_global_secondary_index(GlobalSecondaryIndex {
                index_name: "IMSIIndex".to_string(),
                key_schema: vec![KeySchemaElement::new("IMSI", KeyType::Hash)],
                projection: Projection::new(ProjectionType::KeysOnly),
                provisioned_throughput: ProvisionedThroughput::new(3, 4),
                ..GlobalSecondaryIndex::default()
            });

        let mut query = Query::new();
        query.add_create_request_table(&description).unwrap();

        assert_eq!(
            body(&query),
            json!({
                "TableName": "users",
                "AttributeDefinitions": [
                    {"AttributeName": "UserId", "AttributeType": "S"},
                    {"AttributeName": "OSType", "AttributeType": "S"},
                    {"AttributeName": "IMSI", "AttributeType": "S"},
                ],
                "KeySchema": [
                    {"AttributeName": "UserId", "KeyType": "HASH"},
                    {"AttributeName": "OSType", "KeyType": "RANGE"},
                ],
                "ProvisionedThroughput": {"ReadCapacityUnits": 1, "WriteCapacityUnits": 2},
                "GlobalSecondaryIndexes": [{
                    "IndexName": "IMSIIndex",
                    "KeySchema": [{"AttributeName": "IMSI", "KeyType": "HASH"}],
                    "Projection": {"ProjectionType": "KEYS_ONLY"},
                    "ProvisionedThroughput": {"ReadCapacityUnits": 3, "WriteCapacityUnits": 4},
                }],
            })
        );
    }

    #[test]
    fn create_request_carries_local_indexes() {
        let description = TableDescription::new("threads")
            .with_hash_key("ForumName", AttributeType::String)
            .with_range_key("Subject", AttributeType::String)
            .with_attribute("LastPostDateTime", AttributeType::String)
            .with_local_secondary_index(LocalSecondaryIndex {
                index_name: "LastPostIndex".to_string(),
                key_schema: vec![
                    KeySchemaElement::new("ForumName", KeyType::Hash),
                    KeySchemaElement::new("LastPostDateTime", KeyType::Range),
                ],
                projection: Projection::include(["Replies"]),
                ..LocalSecondaryIndex::default()
            });

        let mut query = Query::new();
        query.add_create_request_table(&description).unwrap();

        let body = body(&query);
        assert_eq!(
            body["LocalSecondaryIndexes"],
            json!([{
                "IndexName": "LastPostIndex",
                "KeySchema": [
                    {"AttributeName": "ForumName", "KeyType": "HASH"},
                    {"AttributeName": "LastPostDateTime", "KeyType": "RANGE"},
                ],
                "Projection": {"ProjectionType": "INCLUDE", "NonKeyAttributes": ["Replies"]},
            }])
        );
        assert!(body.get("GlobalSecondaryIndexes").is_none());
    }

    #[test]
    fn delete_request_sends_only_the_name() {
        let description = TableDescription::new("users")
            .with_hash_key("id", AttributeType::Number)
            .with_throughput(5, 5);

        let mut query = Query::new();
        query.add_delete_request_table(&description);
        assert_eq!(body(&query), json!({"TableName": "users"}));
    }

    #[test]
    fn update_request_omits_unset_fields() {
        let mut query = Query::new();
        query.add_update_request_table(&TableDescription::new("users"));
        assert_eq!(body(&query), json!({"TableName": "users"}));

        let mut query = Query::new();
        query.add_update_request_table(&TableDescription::new("users").with_throughput(2, 3));
        assert_eq!(
            body(&query),
            json!({
                "TableName": "users",
                "ProvisionedThroughput": {"ReadCapacityUnits": 2, "WriteCapacityUnits": 3},
            })
        );
    }
}
