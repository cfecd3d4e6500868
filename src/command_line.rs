use anyhow::{anyhow, Result};
use dynamodb_table_admin::dynamodb::{
    AttributeType, DynamoDb, StatusOutcome, TableDescription, TableStatus,
};
use std::io::{self, Write};
use std::time::Duration;
use tracing::info;

/// Runs the interactive table administration shell.
///
/// This function enters a loop that prompts the user for commands and executes them.
/// The supported commands are:
/// - list: List every table
/// - describe: Print the description of a table
/// - create: Create a table with a partition key and optional sort key
/// - update: Change the provisioned throughput of a table
/// - delete: Delete a table
/// - wait: Wait until a table reaches a status
/// - exit: Exit the program
///
/// Errors from individual commands are printed and the loop continues.
pub async fn run(ddb: &DynamoDb) -> Result<()> {
    loop {
        let command = prompt(
            "Enter command (list/describe/create/update/delete/wait/exit): ",
            None,
        )?;
        let outcome = match command.as_str() {
            "list" => list_tables(ddb).await,
            "describe" => describe_table(ddb).await,
            "create" => create_table(ddb).await,
            "update" => update_table(ddb).await,
            "delete" => delete_table(ddb).await,
            "wait" => wait_for_status(ddb).await,
            "exit" => break,
            _ => {
                println!("Unknown command. Please try again.");
                Ok(())
            }
        };
        if let Err(e) = outcome {
            println!("Error: {e}");
        }
    }
    Ok(())
}

async fn list_tables(ddb: &DynamoDb) -> Result<()> {
    let tables = ddb.list_tables().await?;

    println!("\n--- Tables ---");
    tables.iter().for_each(|name| println!("{name}"));
    println!("--------------\n");
    Ok(())
}

/// Prints detailed information about a table.
///
/// The following information is displayed:
/// - Table name and status
/// - Attribute definitions and key schema
/// - Provisioned throughput
/// - Secondary indexes
/// - Item count and table size in bytes
async fn describe_table(ddb: &DynamoDb) -> Result<()> {
    let name = prompt("Table name", None)?;
    let table = ddb.describe_table(&name).await?;

    println!("\n--- Table Information ---");
    println!("Table Name: {}", table.table_name);
    println!(
        "Table Status: {}",
        table.table_status.unwrap_or(TableStatus::Unknown)
    );
    println!("Attributes:");
    for definition in &table.attribute_definitions {
        println!(
            "  {}: {}",
            definition.attribute_name,
            definition.attribute_type.as_str()
        );
    }
    println!("Key Schema:");
    for element in &table.key_schema {
        println!("  {}: {:?}", element.attribute_name, element.key_type);
    }
    println!(
        "Provisioned Throughput: read={} write={} (decreases today: {})",
        table.provisioned_throughput.read_capacity_units,
        table.provisioned_throughput.write_capacity_units,
        table.provisioned_throughput.number_of_decreases_today
    );
    for index in &table.local_secondary_indexes {
        println!(
            "Local Index: {} ({:?})",
            index.index_name, index.projection.projection_type
        );
    }
    for index in &table.global_secondary_indexes {
        println!(
            "Global Index: {} ({:?}, read={} write={})",
            index.index_name,
            index.projection.projection_type,
            index.provisioned_throughput.read_capacity_units,
            index.provisioned_throughput.write_capacity_units
        );
    }
    println!("Item Count: {}", table.item_count);
    println!("Table Size (bytes): {}", table.table_size_bytes);
    println!("-------------------------\n");
    Ok(())
}

/// Creates a table from a partition key, an optional sort key and a throughput.
async fn create_table(ddb: &DynamoDb) -> Result<()> {
    let name = prompt("Table name", None)?;
    let partition_key = prompt("Partition key name", Some("id"))?;
    let partition_type = prompt_attribute_type("Partition key type")?;

    let mut description = TableDescription::new(&name).with_hash_key(partition_key, partition_type);
    if let Some(sort_key) = prompt_optional("Sort key name (empty for none)", None)? {
        let sort_type = prompt_attribute_type("Sort key type")?;
        description = description.with_range_key(sort_key, sort_type);
    }

    let read = prompt_number("Read capacity units", 1)?;
    let write = prompt_number("Write capacity units", 1)?;
    description = description.with_throughput(read, write);

    let status = ddb.create_table(&description).await?;
    println!("Table '{name}' is {status}");
    Ok(())
}

async fn update_table(ddb: &DynamoDb) -> Result<()> {
    let name = prompt("Table name", None)?;
    let read = prompt_number("New read capacity units", 1)?;
    let write = prompt_number("New write capacity units", 1)?;

    let changes = TableDescription::new(&name).with_throughput(read, write);
    let status = ddb.update_table(&changes).await?;
    println!("Table '{name}' is {status}");
    Ok(())
}

/// Deletes a table.
///
/// This function prompts the user for confirmation before deleting the table.
async fn delete_table(ddb: &DynamoDb) -> Result<()> {
    let name = prompt("Table name", None)?;
    let confirmed = prompt_bool(
        &format!(
            "Are you sure you want to delete the table '{}'? This action cannot be undone.",
            name
        ),
        false,
    )?;

    if confirmed {
        let outcome = ddb.delete_table(&TableDescription::new(&name)).await;
        println!("Table '{}' is {}", name, outcome.status());
        outcome?;
    } else {
        println!("Table deletion cancelled.");
    }

    Ok(())
}

async fn wait_for_status(ddb: &DynamoDb) -> Result<()> {
    let name = prompt("Table name", None)?;
    let status = TableStatus::from(prompt("Status", Some("ACTIVE"))?);
    let polls = prompt_number("Maximum polls", 30)?;

    ddb.wait_for_status(
        &name,
        status,
        Duration::from_secs(2),
        u32::try_from(polls).map_err(|_| anyhow!("Invalid number of polls"))?,
    )
    .await?;
    info!("Table '{name}' reached the requested status");
    Ok(())
}

fn prompt(message: &str, example: Option<&str>) -> Result<String> {
    match example {
        Some(example) => print!("{message} (e.g. {example}): "),
        None => print!("{message}: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_string();
    Ok(match example {
        Some(example) if input.is_empty() => example.to_string(),
        _ => input,
    })
}

fn prompt_optional(message: &str, example: Option<&str>) -> Result<Option<String>> {
    let input = prompt(message, example)?;
    Ok(if input.is_empty() { None } else { Some(input) })
}

fn prompt_bool(message: &str, default: bool) -> Result<bool> {
    let input = prompt(
        &format!("{} (y/n)", message),
        Some(if default { "y" } else { "n" }),
    )?;
    Ok(input.to_lowercase().starts_with('y'))
}

fn prompt_number(message: &str, default: i64) -> Result<i64> {
    let input = prompt(message, Some(&default.to_string()))?;
    input
        .parse()
        .map_err(|_| anyhow!("'{input}' is not a number"))
}

fn prompt_attribute_type(message: &str) -> Result<AttributeType> {
    let input = prompt(&format!("{message} (S/N/B)"), Some("S"))?;
    match AttributeType::from(input.to_uppercase()) {
        AttributeType::Unsupported(raw) => Err(anyhow!("Unsupported key type '{raw}'")),
        attribute_type => Ok(attribute_type),
    }
}
