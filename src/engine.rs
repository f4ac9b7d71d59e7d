//! Export engine surface
//!
//! Ties the pieces together: resolve the requested date range, partition it
//! into windows, resolve the compartment set, fan each window out and fold
//! everything into one `{"data": [...]}` document.
use crate::cache::CacheStore;
use crate::compartments::CompartmentSet;
use crate::config::EngineConfig;
use crate::error::{ExportError, Result};
use crate::fanout::run_across_compartments;
use crate::filter::EventFilter;
use crate::merge::{concat_data, empty_result};
use crate::paging::collect_pages;
use crate::query::{QueryCommand, QueryExecutor, QueryTransport};
use crate::window::partition;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use log::{debug, info};
use serde_json::Value;
use std::time::Duration;

/// One export request: an inclusive calendar date range and, optionally, an
/// explicit compartment set.
///
/// Dates left unset fall back to the configured lookback ending today.
/// Compartments left unset are discovered from the tenancy listing.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub compartments: Option<CompartmentSet>,
}

impl ExportRequest {
    /// Request with all defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export from this calendar date (inclusive)
    #[must_use]
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Export up to this calendar date (inclusive)
    #[must_use]
    pub fn with_end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// Fan out over these compartments instead of discovering them
    #[must_use]
    pub fn with_compartments(mut self, compartments: CompartmentSet) -> Self {
        self.compartments = Some(compartments);
        self
    }
}

/// The audit export engine.
///
/// Owns the query executor (deadline, validation, cache) and the engine
/// configuration; every entry point runs strictly sequentially.
pub struct AuditExporter<T> {
    executor: QueryExecutor<T>,
    config: EngineConfig,
}

impl<T: QueryTransport> AuditExporter<T> {
    /// Build an exporter over an authenticated transport.
    ///
    /// # Errors
    ///
    /// Returns an error if caching is enabled but the cache directory
    /// cannot be opened, or if the cache configuration is incomplete.
    pub fn new(transport: T, config: EngineConfig) -> Result<Self> {
        let cache = if config.cache_enabled {
            let dir = config.cache_dir.as_ref().ok_or_else(|| {
                ExportError::InvalidConfig(
                    "caching is enabled but no cache directory is set".to_string(),
                )
            })?;
            Some(CacheStore::open(dir, config.cache_validity_days)?)
        } else {
            None
        };

        let executor = QueryExecutor::new(
            transport,
            Duration::from_secs(config.call_timeout_secs),
            cache,
            config.region.clone(),
        );

        Ok(Self { executor, config })
    }

    /// Export all non-read audit events for the requested range.
    ///
    /// The range is partitioned into slices, each slice is fanned out over
    /// the compartment set (discovered when the request does not carry one),
    /// and every result is merged into a single `{"data": [...]}` document.
    /// Events whose `request-action` is `GET` are excluded.
    ///
    /// # Errors
    ///
    /// Fails fast on the first window or compartment that cannot be
    /// retrieved; no partial result is returned.
    pub async fn export_events(&self, request: &ExportRequest) -> Result<Value> {
        let (start, end) = self.resolve_range(request)?;
        let windows = partition(start, end, self.config.slice_seconds)?;

        let compartments = match &request.compartments {
            Some(set) => set.clone(),
            None => self.discover_compartments().await?,
        };

        info!(
            "exporting audit events over {} window(s) and {} compartment(s)",
            windows.len(),
            compartments.len()
        );

        let mut merged: Option<Value> = None;
        for window in &windows {
            let (window_start, window_end) = window.bounds();
            debug!("window [{window_start}, {window_end})");

            let template = QueryCommand::audit_events(&window_start, &window_end);
            let result = run_across_compartments(
                &self.executor,
                &template,
                &EventFilter::ExcludeReadActions,
                &compartments,
            )
            .await?;
            merged = concat_data(merged, Some(result))?;
        }

        Ok(merged.unwrap_or_else(empty_result))
    }

    /// Export the tenancy's compartment listing, deleted entries excluded.
    ///
    /// # Errors
    ///
    /// Propagates executor and merge errors.
    pub async fn export_compartments(&self) -> Result<Value> {
        collect_pages(
            &self.executor,
            &QueryCommand::list_compartments(),
            &EventFilter::ExcludeDeletedCompartments,
        )
        .await
    }

    /// Discover the compartment set to fan out over: every live compartment
    /// in listing order, with the synthesized root (tenancy) id appended.
    ///
    /// # Errors
    ///
    /// Propagates executor errors and listing shape errors.
    pub async fn discover_compartments(&self) -> Result<CompartmentSet> {
        let listing = collect_pages(
            &self.executor,
            &QueryCommand::list_compartments(),
            &EventFilter::None,
        )
        .await?;
        let set = CompartmentSet::from_listing(&listing)?;
        debug!("discovered {} compartment(s)", set.len());
        Ok(set)
    }

    /// Map the request's inclusive calendar dates to half-open UTC bounds.
    ///
    /// The inclusive end date becomes an exclusive bound at the following
    /// midnight, so the final day's events are part of the export.
    fn resolve_range(&self, request: &ExportRequest) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let today = Utc::now().date_naive();
        let end_date = request.end_date.unwrap_or(today);
        let start_date = match request.start_date {
            Some(date) => date,
            None => end_date
                .checked_sub_signed(ChronoDuration::days(i64::from(self.config.lookback_days)))
                .ok_or_else(|| {
                    ExportError::InvalidDate(format!(
                        "cannot look back {} days from {end_date}",
                        self.config.lookback_days
                    ))
                })?,
        };

        if end_date < start_date {
            return Err(ExportError::DateRangeInvalid(format!(
                "start date {start_date} is after end date {end_date}"
            )));
        }

        let exclusive_end = end_date.succ_opt().ok_or_else(|| {
            ExportError::InvalidDate(format!("end date {end_date} has no following day"))
        })?;

        Ok((
            start_date.and_time(NaiveTime::MIN).and_utc(),
            exclusive_end.and_time(NaiveTime::MIN).and_utc(),
        ))
    }
}
