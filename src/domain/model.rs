use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Identifier -> record. A `None` value is a JSON `null` kept as read.
pub type Keyed<V> = BTreeMap<String, Option<V>>;

/// 允許清單：在範圍內的場館代碼
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist(BTreeSet<String>);

impl Allowlist {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, site_id: &str) -> bool {
        self.0.contains(site_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `allSiteIds`: ordered discovery list of every site the page has seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteIdIndex {
    /// Normally an array of identifiers; entries that are not strings are kept but never read as ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A `sitesById` record, kept as read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteRecord(pub Value);

impl SiteRecord {
    /// `payload.name.text`, or `payload.name` when it is a plain string.
    pub fn display_name(&self) -> Option<&str> {
        match self.0.get("payload")?.get("name")? {
            Value::String(text) => Some(text),
            Value::Object(obj) => obj.get("text").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// A `showtimesById` record, kept as read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowtimeRecord(pub Value);

impl ShowtimeRecord {
    fn payload_str(&self, field: &str) -> Option<&str> {
        self.0.get("payload")?.get(field)?.as_str()
    }

    pub fn site_id(&self) -> Option<&str> {
        self.payload_str("siteId")
    }

    pub fn film_id(&self) -> Option<&str> {
        self.payload_str("filmId")
    }
}

/// 瀏覽網域快取 (browsing-domain-store) 的型別化表示
///
/// Only the four collections the aggregation touches are typed; every other
/// key of the client-side store is carried in `extra` and written back as-is.
/// Reading is lenient: any JSON object is a store. A collection with the
/// wrong shape is dropped with a warning, and records are kept as raw JSON so
/// an odd field never fails the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_site_ids: Option<SiteIdIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites_by_id: Option<Keyed<SiteRecord>>,
    /// Film payloads are opaque to the aggregation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub films_by_id: Option<Keyed<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showtimes_by_id: Option<Keyed<ShowtimeRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for AggregateStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// The part of a venue's store that feeds the aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueContribution {
    pub films_by_id: Option<Keyed<Value>>,
    pub showtimes_by_id: Option<Keyed<ShowtimeRecord>>,
}

impl VenueContribution {
    /// Reads only `filmsById` and `showtimesById`; the rest of the store is ignored.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut map) = value else {
            return Err(de::Error::custom("venue store must be a JSON object"));
        };
        Ok(Self {
            films_by_id: take_collection(&mut map, "filmsById"),
            showtimes_by_id: take_collection(&mut map, "showtimesById"),
        })
    }
}

fn take_collection<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Option<T> {
    let raw = map.remove(key)?;
    if raw.is_null() {
        return None;
    }
    match serde_json::from_value(raw) {
        Ok(collection) => Some(collection),
        Err(e) => {
            tracing::warn!("Ignoring malformed '{}' collection: {}", key, e);
            None
        }
    }
}

/// Derived view of a site record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: String,
    pub name: Option<String>,
    pub slug: String,
}

/// Derived view of a showtime record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Showtime {
    pub id: String,
    pub site_id: Option<String>,
    pub film_id: Option<String>,
}

impl AggregateStore {
    /// Fails only when `text` is not JSON or not a JSON object.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(de::Error::custom("browsing store must be a JSON object"));
        };
        Ok(Self {
            all_site_ids: take_collection(&mut map, "allSiteIds"),
            sites_by_id: take_collection(&mut map, "sitesById"),
            films_by_id: take_collection(&mut map, "filmsById"),
            showtimes_by_id: take_collection(&mut map, "showtimesById"),
            extra: map,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Non-empty identifiers from `allSiteIds.payload`, in discovery order.
    pub fn known_site_ids(&self) -> impl Iterator<Item = &str> {
        self.all_site_ids
            .iter()
            .filter_map(|index| index.payload.as_ref()?.as_array())
            .flatten()
            .filter_map(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn sites(&self) -> Vec<Site> {
        self.sites_by_id
            .iter()
            .flatten()
            .map(|(id, record)| {
                let name = record
                    .as_ref()
                    .and_then(SiteRecord::display_name)
                    .map(str::to_string);
                Site {
                    id: id.clone(),
                    slug: crate::core::slug::derive_slug(name.as_deref().unwrap_or(""), id),
                    name,
                }
            })
            .collect()
    }

    pub fn showtimes(&self) -> Vec<Showtime> {
        self.showtimes_by_id
            .iter()
            .flatten()
            .map(|(id, record)| Showtime {
                id: id.clone(),
                site_id: record
                    .as_ref()
                    .and_then(ShowtimeRecord::site_id)
                    .map(str::to_string),
                film_id: record
                    .as_ref()
                    .and_then(ShowtimeRecord::film_id)
                    .map(str::to_string),
            })
            .collect()
    }

    pub fn film_ids(&self) -> impl Iterator<Item = &str> {
        self.films_by_id.iter().flat_map(|films| films.keys().map(String::as_str))
    }

    /// Sites with at least one showtime.
    pub fn sites_with_showtimes(&self) -> BTreeSet<String> {
        self.showtimes_by_id
            .iter()
            .flat_map(|showtimes| showtimes.values())
            .filter_map(|record| record.as_ref()?.site_id())
            .map(str::to_string)
            .collect()
    }
}

/// 一筆擷取到的權杖或儲存值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenEntry {
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// `url`, `headerName`, `name`, `domain` ... depending on the source.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 擷取紀錄：headless 瀏覽器工作階段的輸出檔
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub bearer_tokens: Vec<TokenEntry>,
    #[serde(default)]
    pub correlation_ids: Vec<Value>,
    #[serde(default)]
    pub cookies: Vec<Value>,
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub session_storage: BTreeMap<String, String>,
    #[serde(default)]
    pub requests: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CaptureRecord {
    pub fn serialized_store(&self, store_key: &str) -> Option<&str> {
        self.local_storage.get(store_key).map(String::as_str)
    }

    pub fn set_serialized_store(&mut self, store_key: &str, serialized: &str) {
        self.local_storage
            .insert(store_key.to_string(), serialized.to_string());
    }

    pub fn entries_for_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a TokenEntry> {
        self.bearer_tokens
            .iter()
            .filter(move |entry| entry.key.as_deref() == Some(key))
    }
}
