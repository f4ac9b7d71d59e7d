//! Export option dispatch table
//!
//! The exportable datasets are a fixed, ordered table of records iterated
//! or looked up directly; callers drive them by name and get back the JSON
//! document plus the conventional output file name.
use crate::engine::{AuditExporter, ExportRequest};
use crate::error::Result;
use crate::query::QueryTransport;
use serde_json::Value;

/// What an export option retrieves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionHandler {
    /// Windowed, fanned-out audit event export
    AuditEvents,
    /// Compartment listing with deleted entries excluded
    Compartments,
}

/// One row of the dispatch table
#[derive(Debug, Clone, Copy)]
pub struct ExportOption {
    /// Name callers select the option by
    pub name: &'static str,
    /// Conventional file name for the exported document
    pub output_file: &'static str,
    pub handler: OptionHandler,
}

/// Every exportable dataset, in presentation order
pub const EXPORT_OPTIONS: &[ExportOption] = &[
    ExportOption {
        name: "audit-events",
        output_file: "audit_events.json",
        handler: OptionHandler::AuditEvents,
    },
    ExportOption {
        name: "compartments",
        output_file: "compartments.json",
        handler: OptionHandler::Compartments,
    },
];

/// Look an option up by name
#[must_use]
pub fn find_option(name: &str) -> Option<&'static ExportOption> {
    EXPORT_OPTIONS.iter().find(|option| option.name == name)
}

impl<T: QueryTransport> AuditExporter<T> {
    /// Run one option from the dispatch table.
    ///
    /// # Errors
    ///
    /// Propagates whatever the underlying export reports.
    pub async fn run_option(
        &self,
        option: &ExportOption,
        request: &ExportRequest,
    ) -> Result<Value> {
        match option.handler {
            OptionHandler::AuditEvents => self.export_events(request).await,
            OptionHandler::Compartments => self.export_compartments().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartments::CompartmentSet;
    use crate::config::EngineConfig;
    use crate::error::ExportError;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedTransport {
        responses: Mutex<VecDeque<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: &[Value]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(Value::to_string).collect()),
            }
        }
    }

    impl QueryTransport for &ScriptedTransport {
        async fn invoke(&self, _args: &[String]) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ExportError::Upstream("no scripted response left".to_string()))
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let option = find_option("audit-events").unwrap();
        assert_eq!(option.output_file, "audit_events.json");
        assert_eq!(option.handler, OptionHandler::AuditEvents);

        assert!(find_option("no-such-option").is_none());
    }

    #[test]
    fn test_table_order_and_names_are_stable() {
        let names: Vec<&str> = EXPORT_OPTIONS.iter().map(|option| option.name).collect();
        assert_eq!(names, ["audit-events", "compartments"]);
    }

    #[tokio::test]
    async fn test_dispatch_reaches_the_compartment_export() {
        let transport = ScriptedTransport::new(&[json!({ "data": [
            { "id": "c1", "lifecycle-state": "ACTIVE" },
        ]})]);
        let exporter = AuditExporter::new(&transport, EngineConfig::default()).unwrap();

        let option = find_option("compartments").unwrap();
        let result = exporter
            .run_option(option, &ExportRequest::new())
            .await
            .unwrap();
        assert_eq!(
            result,
            json!({ "data": [ { "id": "c1", "lifecycle-state": "ACTIVE" } ] })
        );
    }

    #[tokio::test]
    async fn test_dispatch_reaches_the_event_export() {
        let transport = ScriptedTransport::new(&[json!({ "data": [] })]);
        let exporter = AuditExporter::new(&transport, EngineConfig::default()).unwrap();

        let start: NaiveDate = "2025-03-01".parse().unwrap();
        let request = ExportRequest::new()
            .with_start_date(start)
            .with_end_date(start)
            .with_compartments(CompartmentSet::new(vec!["c1".to_string()]));

        let option = find_option("audit-events").unwrap();
        let result = exporter.run_option(option, &request).await.unwrap();
        assert_eq!(result, json!({ "data": [] }));
    }
}
