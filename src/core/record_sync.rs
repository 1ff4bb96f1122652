use crate::core::aggregator::{aggregate, AggregationReport};
use crate::domain::model::{Allowlist, CaptureRecord, TokenEntry};
use crate::domain::ports::{ConfigProvider, VenueVisitor};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

pub const LOCAL_STORAGE_SOURCE: &str = "localStorage";

/// Where the store lives inside a capture record and which venues are in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationPolicy {
    pub store_key: String,
    pub allowlist: Allowlist,
}

impl AggregationPolicy {
    pub fn new(store_key: impl Into<String>, allowlist: Allowlist) -> Self {
        Self {
            store_key: store_key.into(),
            allowlist,
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(config.store_key(), config.allowlist())
    }
}

/// 將序列化後的 store 同步到擷取紀錄的權杖清單
///
/// The first entry keyed by `store_key` takes the new value and any later
/// duplicates are dropped; without one, a `localStorage` entry stamped with
/// the current time is appended.
pub fn sync_store_into_record(record: &mut CaptureRecord, store_key: &str, serialized: &str) {
    let mut seen = false;
    record.bearer_tokens.retain_mut(|entry| {
        if entry.key.as_deref() != Some(store_key) {
            return true;
        }
        if seen {
            return false;
        }
        seen = true;
        entry.value = Value::String(serialized.to_string());
        true
    });

    if !seen {
        record.bearer_tokens.push(TokenEntry {
            source: LOCAL_STORAGE_SOURCE.to_string(),
            key: Some(store_key.to_string()),
            value: Value::String(serialized.to_string()),
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            extra: Default::default(),
        });
    }
}

/// 彙整擷取紀錄中的 store 並寫回
///
/// Returns `None` when the record holds no store under the policy key. A
/// rejected seed leaves the record untouched.
pub async fn enrich_capture_record<V>(
    record: &mut CaptureRecord,
    policy: &AggregationPolicy,
    visitor: &mut V,
) -> Option<AggregationReport>
where
    V: VenueVisitor + ?Sized,
{
    let Some(seed) = record.serialized_store(&policy.store_key).map(str::to_string) else {
        tracing::info!("Capture record has no '{}' entry, nothing to aggregate", policy.store_key);
        return None;
    };

    let report = aggregate(&seed, &policy.allowlist, visitor).await;
    if report.seed_parsed() {
        record.set_serialized_store(&policy.store_key, &report.serialized);
        sync_store_into_record(record, &policy.store_key, &report.serialized);
    }
    Some(report)
}
