use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dynamodb::error::Result;
use crate::dynamodb::schema::{
    build_primary_key, AttributeDefinition, AttributeType, KeySchemaElement, KeyType, PrimaryKey,
};

/// Lifecycle status of a table as reported by the service.
///
/// Statuses the client does not know are passed through verbatim as `Other`.
/// `Unknown` is never sent by the service; it stands in for the status of an
/// operation that failed before any response could be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    Other(String),
    Unknown,
}

impl TableStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TableStatus::Creating => "CREATING",
            TableStatus::Active => "ACTIVE",
            TableStatus::Updating => "UPDATING",
            TableStatus::Deleting => "DELETING",
            TableStatus::Other(raw) => raw,
            TableStatus::Unknown => "unknown",
        }
    }
}

impl From<String> for TableStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "CREATING" => TableStatus::Creating,
            "ACTIVE" => TableStatus::Active,
            "UPDATING" => TableStatus::Updating,
            "DELETING" => TableStatus::Deleting,
            _ => TableStatus::Other(raw),
        }
    }
}

impl From<&str> for TableStatus {
    fn from(raw: &str) -> Self {
        TableStatus::from(raw.to_string())
    }
}

impl From<TableStatus> for String {
    fn from(status: TableStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read and write capacity of a table or global secondary index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProvisionedThroughput {
    pub number_of_decreases_today: i64,
    pub read_capacity_units: i64,
    pub write_capacity_units: i64,
}

impl ProvisionedThroughput {
    pub fn new(read_capacity_units: i64, write_capacity_units: i64) -> Self {
        Self {
            number_of_decreases_today: 0,
            read_capacity_units,
            write_capacity_units,
        }
    }

    /// True when either capacity has been set.
    pub fn is_set(&self) -> bool {
        self.read_capacity_units > 0 || self.write_capacity_units > 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    #[default]
    All,
    KeysOnly,
    Include,
}

/// Attributes copied from the table into a secondary index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Projection {
    pub projection_type: ProjectionType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub non_key_attributes: Vec<String>,
}

impl Projection {
    pub fn new(projection_type: ProjectionType) -> Self {
        Self {
            projection_type,
            non_key_attributes: Vec::new(),
        }
    }

    pub fn include(attributes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            projection_type: ProjectionType::Include,
            non_key_attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocalSecondaryIndex {
    pub index_name: String,
    pub index_size_bytes: i64,
    pub item_count: i64,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GlobalSecondaryIndex {
    pub index_name: String,
    pub index_size_bytes: i64,
    pub item_count: i64,
    pub key_schema: Vec<KeySchemaElement>,
    pub projection: Projection,
    pub provisioned_throughput: ProvisionedThroughput,
}

/// Administrative metadata of a table.
///
/// Requests only need the fields relevant to the operation: a create request
/// needs the name, attribute definitions, key schema and throughput; an update
/// request the name plus whatever changes. Describe responses come back fully
/// populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TableDescription {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub provisioned_throughput: ProvisionedThroughput,
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,
    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    pub item_count: i64,
    pub table_size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_status: Option<TableStatus>,
    pub creation_date_time: f64,
}

impl TableDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table_name: name.into(),
            ..Self::default()
        }
    }

    /// Declares the partition key attribute.
    pub fn with_hash_key(self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.with_key(name.into(), attribute_type, KeyType::Hash)
    }

    /// Declares the sort key attribute.
    pub fn with_range_key(self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.with_key(name.into(), attribute_type, KeyType::Range)
    }

    fn with_key(mut self, name: String, attribute_type: AttributeType, key_type: KeyType) -> Self {
        if !self
            .attribute_definitions
            .iter()
            .any(|d| d.attribute_name == name)
        {
            self.attribute_definitions
                .push(AttributeDefinition::new(name.clone(), attribute_type));
        }
        self.key_schema.push(KeySchemaElement::new(name, key_type));
        self
    }

    /// Declares an attribute without giving it a key role, e.g. one only used
    /// by a secondary index.
    pub fn with_attribute(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.attribute_definitions
            .push(AttributeDefinition::new(name, attribute_type));
        self
    }

    pub fn with_throughput(mut self, read_capacity_units: i64, write_capacity_units: i64) -> Self {
        self.provisioned_throughput =
            ProvisionedThroughput::new(read_capacity_units, write_capacity_units);
        self
    }

    pub fn with_local_secondary_index(mut self, index: LocalSecondaryIndex) -> Self {
        self.local_secondary_indexes.push(index);
        self
    }

    pub fn with_global_secondary_index(mut self, index: GlobalSecondaryIndex) -> Self {
        self.global_secondary_indexes.push(index);
        self
    }

    /// Derives the table's primary key from its key schema.
    pub fn build_primary_key(&self) -> Result<PrimaryKey> {
        build_primary_key(&self.attribute_definitions, &self.key_schema)
    }
}
