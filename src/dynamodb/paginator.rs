use std::ops::ControlFlow;

use crate::dynamodb::client::DynamoDb;
use crate::dynamodb::error::Result;

/// Cursor over the pages of a ListTables listing.
///
/// Each call to [`DynamoDb::table_pages`] starts a new listing from the first
/// page. Once the last page has been returned, or a request has failed, the
/// cursor stays exhausted.
#[derive(Debug)]
pub struct TableNamePages<'a> {
    client: &'a DynamoDb,
    cursor: String,
    done: bool,
}

impl<'a> TableNamePages<'a> {
    pub(crate) fn new(client: &'a DynamoDb) -> Self {
        Self {
            client,
            cursor: String::new(),
            done: false,
        }
    }

    /// Name of the last table returned so far, empty before the first page
    /// and after the last one.
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetches the next page of table names, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<String>>> {
        if self.done {
            return Ok(None);
        }

        let page = match self.client.list_tables_page(&self.cursor).await {
            Ok(page) => page,
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        };

        self.cursor = page.last_evaluated_table_name;
        self.done = self.cursor.is_empty();
        Ok(Some(page.table_names))
    }

    /// Visits every table name in server order. Returning `ControlFlow::Break`
    /// stops the listing without fetching further pages.
    pub async fn for_each<F>(mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(&str) -> ControlFlow<()>,
    {
        while let Some(names) = self.next_page().await? {
            for name in &names {
                if visit(name).is_break() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Collects every remaining table name.
    pub async fn collect_all(self) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        self.for_each(|name| {
            tables.push(name.to_string());
            ControlFlow::Continue(())
        })
        .await?;
        Ok(tables)
    }
}
