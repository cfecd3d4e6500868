use serde::{Deserialize, Serialize};

use crate::dynamodb::error::{Error, Result};

/// Scalar type of a key attribute.
///
/// DynamoDB only allows strings, numbers and binary blobs as key attributes.
/// Values the service reports that fall outside that set are kept verbatim as
/// `Unsupported` so they can be detected when a primary key is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeType {
    /// `S`
    String,
    /// `N`
    Number,
    /// `B`
    Binary,
    Unsupported(String),
}

impl AttributeType {
    pub fn as_str(&self) -> &str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
            AttributeType::Unsupported(raw) => raw,
        }
    }
}

impl From<String> for AttributeType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "S" => AttributeType::String,
            "N" => AttributeType::Number,
            "B" => AttributeType::Binary,
            _ => AttributeType::Unsupported(raw),
        }
    }
}

impl From<AttributeType> for String {
    fn from(attribute_type: AttributeType) -> Self {
        attribute_type.as_str().to_string()
    }
}

/// Declares the name and scalar type of an attribute used in a key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    pub attribute_name: String,
    pub attribute_type: AttributeType,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            attribute_name: name.into(),
            attribute_type,
        }
    }

    /// Returns an empty-valued attribute of this definition's type, or `None`
    /// when the type is not a key scalar.
    pub fn empty_attribute(&self) -> Option<Attribute> {
        match self.attribute_type {
            AttributeType::String | AttributeType::Number | AttributeType::Binary => {
                Some(Attribute::empty(
                    self.attribute_name.clone(),
                    self.attribute_type.clone(),
                ))
            }
            AttributeType::Unsupported(_) => None,
        }
    }
}

/// Role of an attribute in the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub key_type: KeyType,
}

impl KeySchemaElement {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            attribute_name: name.into(),
            key_type,
        }
    }
}

/// A typed attribute value.
///
/// Primary keys hold empty-valued attributes that only describe the name and
/// type of each key component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub attribute_type: AttributeType,
    pub value: String,
}

impl Attribute {
    pub fn empty(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            value: String::new(),
        }
    }
}

/// The primary key of a table: a partition key and an optional sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub key_attribute: Attribute,
    pub range_attribute: Option<Attribute>,
}

impl PrimaryKey {
    pub fn has_range(&self) -> bool {
        self.range_attribute.is_some()
    }
}

fn find_attribute_definition<'a>(
    definitions: &'a [AttributeDefinition],
    name: &str,
) -> Option<&'a AttributeDefinition> {
    definitions.iter().find(|d| d.attribute_name == name)
}

/// Derives the primary key from a key schema and the attribute definitions it
/// references.
pub fn build_primary_key(
    attribute_definitions: &[AttributeDefinition],
    key_schema: &[KeySchemaElement],
) -> Result<PrimaryKey> {
    let mut key_attribute = None;
    let mut range_attribute = None;

    for element in key_schema {
        let definition = find_attribute_definition(attribute_definitions, &element.attribute_name)
            .ok_or_else(|| {
                Error::SchemaInconsistency(format!(
                    "key attribute '{}' has no attribute definition",
                    element.attribute_name
                ))
            })?;

        let attribute = definition.empty_attribute().ok_or_else(|| {
            Error::SchemaInconsistency(format!(
                "key attribute '{}' has unsupported type '{}'",
                element.attribute_name,
                definition.attribute_type.as_str()
            ))
        })?;

        match element.key_type {
            KeyType::Hash => key_attribute = Some(attribute),
            KeyType::Range => range_attribute = Some(attribute),
        }
    }

    let key_attribute = key_attribute.ok_or_else(|| {
        Error::SchemaInconsistency("key schema has no HASH element".to_string())
    })?;

    Ok(PrimaryKey {
        key_attribute,
        range_attribute,
    })
}
