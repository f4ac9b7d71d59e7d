//! Compartment fan-out
use crate::compartments::CompartmentSet;
use crate::error::Result;
use crate::filter::EventFilter;
use crate::merge::{concat_data, empty_result};
use crate::paging::collect_pages;
use crate::query::{QueryCommand, QueryExecutor, QueryTransport};
use log::{debug, info};
use serde_json::Value;

/// Run one logical query against every compartment and merge the results.
///
/// For each compartment id in set order, the template command is targeted
/// with `--compartment-id <id>`, run to pagination completion, and folded
/// into the running result. The first failure aborts the whole fan-out;
/// skipping a compartment would make the export silently incomplete, which
/// is worse than a hard stop. An empty set yields `{"data": []}`.
///
/// # Errors
///
/// Propagates the first executor or merge error.
pub async fn run_across_compartments<T: QueryTransport>(
    executor: &QueryExecutor<T>,
    template: &QueryCommand,
    filter: &EventFilter,
    compartments: &CompartmentSet,
) -> Result<Value> {
    info!("fanning out over {} compartment(s)", compartments.len());

    let mut merged: Option<Value> = None;
    for id in compartments.ids() {
        debug!("querying compartment {id}");
        let result = collect_pages(executor, &template.with_compartment(id), filter).await?;
        merged = concat_data(merged, Some(result))?;
    }

    Ok(merged.unwrap_or_else(empty_result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl QueryTransport for &ScriptedTransport {
        async fn invoke(&self, args: &[String]) -> Result<String> {
            self.calls.lock().unwrap().push(args.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExportError::Upstream("no scripted response left".to_string())))
        }
    }

    fn executor(transport: &ScriptedTransport) -> QueryExecutor<&ScriptedTransport> {
        QueryExecutor::new(transport, Duration::from_secs(5), None, None)
    }

    #[tokio::test]
    async fn test_results_merge_across_compartments_in_order() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({ "data": [1, 2] }).to_string()),
            Ok(json!({ "data": [3] }).to_string()),
        ]);

        let set = CompartmentSet::new(vec!["c1".to_string(), "c2".to_string()]);
        let template = QueryCommand::audit_events("S", "E");
        let result =
            run_across_compartments(&executor(&transport), &template, &EventFilter::None, &set)
                .await
                .unwrap();

        assert_eq!(result, json!({ "data": [1, 2, 3] }));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0][calls[0].len() - 2..], ["--compartment-id", "c1"]);
        assert_eq!(calls[1][calls[1].len() - 2..], ["--compartment-id", "c2"]);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_before_later_compartments() {
        let transport = ScriptedTransport::new(vec![Err(ExportError::Upstream(
            "compartment query failed".to_string(),
        ))]);

        let set = CompartmentSet::new(vec!["c1".to_string(), "c2".to_string()]);
        let template = QueryCommand::audit_events("S", "E");
        let result =
            run_across_compartments(&executor(&transport), &template, &EventFilter::None, &set)
                .await;

        assert!(matches!(result, Err(ExportError::Upstream(_))));
        // c2 was never queried
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_set_yields_empty_result() {
        let transport = ScriptedTransport::new(vec![]);

        let set = CompartmentSet::new(Vec::new());
        let template = QueryCommand::audit_events("S", "E");
        let result =
            run_across_compartments(&executor(&transport), &template, &EventFilter::None, &set)
                .await
                .unwrap();

        assert_eq!(result, json!({ "data": [] }));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_pagination_runs_per_compartment() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({ "data": [1], "opc-next-page": "T1" }).to_string()),
            Ok(json!({ "data": [2] }).to_string()),
            Ok(json!({ "data": [3] }).to_string()),
        ]);

        let set = CompartmentSet::new(vec!["c1".to_string(), "c2".to_string()]);
        let template = QueryCommand::audit_events("S", "E");
        let result =
            run_across_compartments(&executor(&transport), &template, &EventFilter::None, &set)
                .await
                .unwrap();

        assert_eq!(result, json!({ "data": [1, 2, 3] }));
        assert_eq!(transport.call_count(), 3);
    }
}
