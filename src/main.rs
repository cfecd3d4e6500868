mod command_line;

use std::sync::Arc;

use anyhow::Result;
use dynamodb_table_admin::dynamodb::{BoundedBackoffRetry, DynamoDb};
use dynamodb_table_admin::logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging(logging::level_from_env())?;

    let sdk_config = aws_config::load_from_env().await;

    let ddb = DynamoDb::from_sdk_config(&sdk_config)
        .with_retry_policy(Arc::new(BoundedBackoffRetry::default()));

    ddb.check_connection().await?;

    command_line::run(&ddb).await
}
