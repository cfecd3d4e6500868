use serde::Deserialize;
use serde_json::Value;

use crate::dynamodb::description::{TableDescription, TableStatus};
use crate::dynamodb::error::{Error, Result};

/// One page of a ListTables response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableNamesPage {
    pub table_names: Vec<String>,
    /// Empty when this is the last page.
    pub last_evaluated_table_name: String,
}

fn parse(raw: &[u8]) -> Result<Value> {
    serde_json::from_slice(raw).map_err(|e| Error::malformed(format!("invalid JSON: {e}"), raw))
}

/// Extracts `TableDescription.TableStatus` from a Create/Update/DeleteTable response.
pub fn decode_table_status(raw: &[u8]) -> Result<TableStatus> {
    let json = parse(raw)?;
    json.pointer("/TableDescription/TableStatus")
        .and_then(Value::as_str)
        .map(TableStatus::from)
        .ok_or_else(|| Error::malformed("missing TableDescription.TableStatus", raw))
}

/// Extracts the table names and continuation cursor from a ListTables response.
pub fn decode_table_names_page(raw: &[u8]) -> Result<TableNamesPage> {
    let json = parse(raw)?;

    let last_evaluated_table_name = match json.get("LastEvaluatedTableName") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(name)) => name.clone(),
        Some(_) => return Err(Error::malformed("LastEvaluatedTableName is not a string", raw)),
    };

    let names = json
        .get("TableNames")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::malformed("missing TableNames", raw))?;

    let table_names = names
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::malformed("TableNames holds a non-string entry", raw))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TableNamesPage {
        table_names,
        last_evaluated_table_name,
    })
}

#[derive(Deserialize)]
struct DescribeTableResponse {
    #[serde(rename = "Table")]
    table: TableDescription,
}

/// Decodes the full table description of a DescribeTable response.
pub fn decode_describe_table(raw: &[u8]) -> Result<TableDescription> {
    serde_json::from_slice::<DescribeTableResponse>(raw)
        .map(|response| response.table)
        .map_err(|e| Error::malformed(e.to_string(), raw))
}
