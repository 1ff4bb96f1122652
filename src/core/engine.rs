use crate::core::aggregator::AggregationReport;
use crate::core::planner::plan_missing_visits;
use crate::core::record_sync::{enrich_capture_record, AggregationPolicy};
use crate::domain::model::{AggregateStore, CaptureRecord};
use crate::domain::ports::{Storage, VenueVisitor};
use crate::utils::error::{CaptureError, Result};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    /// `None` when the record had no store to aggregate.
    pub report: Option<AggregationReport>,
}

/// 讀取擷取紀錄、彙整、寫回
pub struct CaptureEngine<S: Storage> {
    storage: S,
    policy: AggregationPolicy,
}

impl<S: Storage> CaptureEngine<S> {
    pub fn new(storage: S, policy: AggregationPolicy) -> Self {
        Self { storage, policy }
    }

    pub async fn load_record(&self, input: &str) -> Result<CaptureRecord> {
        let bytes = self.storage.read_file(input).await?;
        let record: CaptureRecord = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            "Loaded capture record from {} ({} token entries, {} storage keys)",
            input,
            record.bearer_tokens.len(),
            record.local_storage.len()
        );
        Ok(record)
    }

    /// Sites that a run would visit, without visiting them.
    pub async fn plan(&self, input: &str) -> Result<Vec<String>> {
        let record = self.load_record(input).await?;
        let Some(seed) = record.serialized_store(&self.policy.store_key) else {
            return Ok(Vec::new());
        };
        let store = AggregateStore::from_json(seed).map_err(|e| CaptureError::ValidationError {
            message: format!("store '{}' is not a JSON object: {}", self.policy.store_key, e),
        })?;
        Ok(plan_missing_visits(&store, &self.policy.allowlist))
    }

    pub async fn run<V>(&self, input: &str, output: &str, visitor: &mut V) -> Result<RunSummary>
    where
        V: VenueVisitor + ?Sized,
    {
        tracing::info!("Starting capture enrichment");

        let mut record = self.load_record(input).await?;

        let report = enrich_capture_record(&mut record, &self.policy, visitor).await;
        if let Some(report) = &report {
            tracing::info!(
                "Aggregated {} planned site(s): {} merged, {} without data",
                report.planned.len(),
                report.merged_sites().count(),
                report.failed_sites().count()
            );
        }

        let json = serde_json::to_string_pretty(&record)?;
        self.storage.write_file(output, json.as_bytes()).await?;
        tracing::info!("Wrote {}", output);

        Ok(RunSummary {
            output_path: output.to_string(),
            report,
        })
    }
}
