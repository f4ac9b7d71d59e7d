//! Pagination driver
use crate::error::Result;
use crate::filter::EventFilter;
use crate::merge::{concat_data, empty_result};
use crate::query::{QueryCommand, QueryExecutor, QueryTransport};
use log::debug;
use serde_json::Value;

/// Response field carrying the continuation token of a paged query
pub const NEXT_PAGE_KEY: &str = "opc-next-page";

/// Run one logical query to completion, following continuation tokens.
///
/// Each page has its token field stripped and its `data` filtered before
/// being folded into the running result; an empty page still contributes
/// its (empty) `data`. A non-empty token re-issues the original command
/// with `--page <token>` appended. Any executor error aborts the loop and
/// propagates.
///
/// # Errors
///
/// Propagates executor errors and merge schema errors.
pub async fn collect_pages<T: QueryTransport>(
    executor: &QueryExecutor<T>,
    command: &QueryCommand,
    filter: &EventFilter,
) -> Result<Value> {
    let mut merged: Option<Value> = None;
    let mut current = command.clone();
    let mut pages: u32 = 0;

    loop {
        let mut page = executor.execute(&current).await?;
        pages = pages.saturating_add(1);

        let token = page
            .as_object_mut()
            .and_then(|fields| fields.remove(NEXT_PAGE_KEY))
            .and_then(|token| token.as_str().map(str::to_owned))
            .filter(|token| !token.is_empty());

        merged = concat_data(merged, Some(filter.apply(page)))?;

        match token {
            Some(token) => current = command.with_page(&token),
            None => break,
        }
    }

    debug!("collected {pages} page(s) for `{}`", command.signature());
    Ok(merged.unwrap_or_else(empty_result))
}
