//! Query construction and execution
//!
//! This module contains the command/signature model, the authenticated
//! transport boundary, and the executor that wraps every call with a hard
//! deadline, JSON validation and the read-through response cache.
use crate::cache::CacheStore;
use crate::error::{ExportError, Result};
use log::{debug, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

/// Flag carrying the lower time bound of a query
pub const START_TIME_FLAG: &str = "--start-time";
/// Flag carrying the upper time bound of a query
pub const END_TIME_FLAG: &str = "--end-time";
/// Flag targeting a query at one compartment
pub const COMPARTMENT_FLAG: &str = "--compartment-id";
/// Flag carrying the continuation token of a paged query
pub const PAGE_FLAG: &str = "--page";

/// One logical query expressed as an ordered argument vector.
///
/// The space-joined argument string is the query's *signature*: the cache
/// key and the unit of equality. Two commands are the same query iff their
/// arguments are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCommand {
    args: Vec<String>,
}

impl QueryCommand {
    /// Build a command from raw arguments
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Audit event listing bounded to `[start_time, end_time)`
    #[must_use]
    pub fn audit_events(start_time: &str, end_time: &str) -> Self {
        Self::new([
            "audit",
            "event",
            "list",
            START_TIME_FLAG,
            start_time,
            END_TIME_FLAG,
            end_time,
        ])
    }

    /// Compartment listing for the tenancy
    #[must_use]
    pub fn list_compartments() -> Self {
        Self::new(["iam", "compartment", "list"])
    }

    /// Derive the same query targeted at one compartment
    #[must_use]
    pub fn with_compartment(&self, compartment_id: &str) -> Self {
        let mut derived = self.clone();
        derived.args.push(COMPARTMENT_FLAG.to_string());
        derived.args.push(compartment_id.to_string());
        derived
    }

    /// Derive the follow-up query for a continuation token
    #[must_use]
    pub fn with_page(&self, token: &str) -> Self {
        let mut derived = self.clone();
        derived.args.push(PAGE_FLAG.to_string());
        derived.args.push(token.to_string());
        derived
    }

    /// The raw arguments, in order
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The full argument string identifying this query
    #[must_use]
    pub fn signature(&self) -> String {
        self.args.join(" ")
    }
}

/// The authenticated query boundary.
///
/// Implementations own credentials and the wire protocol; the engine only
/// hands over arguments and receives the raw response body. Execution is
/// strictly sequential, so implementations never see overlapping calls.
#[allow(async_fn_in_trait)]
pub trait QueryTransport {
    /// Run one call and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Upstream`] when the provider reports a
    /// failure, or an I/O error when the call cannot be made at all.
    async fn invoke(&self, args: &[String]) -> Result<String>;
}

/// Transport that shells out to an already-authenticated provider CLI
#[derive(Debug, Clone)]
pub struct CliTransport {
    program: PathBuf,
}

impl CliTransport {
    /// Use the given program for every call
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl QueryTransport for CliTransport {
    async fn invoke(&self, args: &[String]) -> Result<String> {
        let output = Command::new(&self.program).args(args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::Upstream(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Executes single queries: deadline, validation, read-through cache.
///
/// A timeout is terminal, never retried. Responses must parse as JSON;
/// anything else is a protocol error. When a cache is attached, it is
/// consulted before the transport and populated (best effort) after it.
pub struct QueryExecutor<T> {
    transport: T,
    deadline: Duration,
    cache: Option<CacheStore>,
    region: Option<String>,
}

impl<T: QueryTransport> QueryExecutor<T> {
    /// Wrap a transport
    pub fn new(
        transport: T,
        deadline: Duration,
        cache: Option<CacheStore>,
        region: Option<String>,
    ) -> Self {
        Self {
            transport,
            deadline,
            cache,
            region,
        }
    }

    /// The key a command is cached under, region-scoped when configured
    fn cache_key(&self, command: &QueryCommand) -> String {
        match &self.region {
            Some(region) => format!("{region}|{}", command.signature()),
            None => command.signature(),
        }
    }

    /// Run one query to the transport, via the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Timeout`] when the deadline expires,
    /// [`ExportError::Protocol`] when the response is not well-formed JSON,
    /// or whatever the transport reported.
    pub async fn execute(&self, command: &QueryCommand) -> Result<Value> {
        let key = self.cache_key(command);

        if let Some(cache) = &self.cache
            && let Some(hit) = cache.lookup(&key)
        {
            debug!("cache hit for `{key}`");
            return Ok(hit);
        }

        debug!("executing query: {}", command.signature());
        let raw = match tokio::time::timeout(self.deadline, self.transport.invoke(command.args()))
            .await
        {
            Ok(outcome) => outcome?,
            Err(_) => return Err(ExportError::Timeout(self.deadline.as_secs())),
        };

        let payload: Value = serde_json::from_str(&raw).map_err(|e| {
            ExportError::Protocol(format!("response is not well-formed JSON: {e}"))
        })?;

        // Correctness never depends on the cache, so a failed store is only
        // worth a warning.
        if let Some(cache) = &self.cache
            && let Err(e) = cache.store(&key, &payload)
        {
            warn!("failed to record `{key}` in the cache: {e}");
        }

        Ok(payload)
    }
}
