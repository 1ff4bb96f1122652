use crate::core::filter::{filter_store, FilterStats};
use crate::core::merge::merge_keyed;
use crate::core::planner::plan_missing_visits;
use crate::core::slug::derive_slug;
use crate::domain::model::{Allowlist, AggregateStore, VenueContribution};
use crate::domain::ports::VenueVisitor;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of parsing the seed store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedStatus {
    Parsed,
    /// The seed was not a valid store; the report carries it back unchanged.
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither a display name nor an identifier yielded a slug.
    NoSlug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitFailure {
    Navigation(String),
    ReadStore(String),
    EmptyStore,
    InvalidStore(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitStatus {
    Merged { films: usize, showtimes: usize },
    Skipped(SkipReason),
    Failed(VisitFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitReport {
    pub site_id: String,
    pub slug: Option<String>,
    pub status: VisitStatus,
}

/// 一次彙整流程的結果
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationReport {
    /// Serialized aggregate, or the untouched seed when it was rejected.
    pub serialized: String,
    pub seed: SeedStatus,
    pub planned: Vec<String>,
    pub visits: Vec<VisitReport>,
    /// Allow-listed sites that need no further visit in this pass.
    pub covered: BTreeSet<String>,
    pub filter: FilterStats,
}

impl AggregationReport {
    fn rejected(seed: &str, reason: String) -> Self {
        Self {
            serialized: seed.to_string(),
            seed: SeedStatus::Rejected { reason },
            planned: Vec::new(),
            visits: Vec::new(),
            covered: BTreeSet::new(),
            filter: FilterStats::default(),
        }
    }

    pub fn seed_parsed(&self) -> bool {
        self.seed == SeedStatus::Parsed
    }

    pub fn merged_sites(&self) -> impl Iterator<Item = &str> {
        self.visits
            .iter()
            .filter(|visit| matches!(visit.status, VisitStatus::Merged { .. }))
            .map(|visit| visit.site_id.as_str())
    }

    pub fn failed_sites(&self) -> impl Iterator<Item = &str> {
        self.visits
            .iter()
            .filter(|visit| !matches!(visit.status, VisitStatus::Merged { .. }))
            .map(|visit| visit.site_id.as_str())
    }
}

/// 跨場館彙整場次資料
///
/// Parses `seed`, visits every allow-listed site that has no showtime yet,
/// merges the films and showtimes each visit exposes, prunes the result to
/// `allowed` and serializes it. Visits run strictly one after another on
/// `visitor`; a failing venue is reported and the pass moves on. Only an
/// unparsable seed stops the pass, in which case the seed is returned as-is.
pub async fn aggregate<V>(seed: &str, allowed: &Allowlist, visitor: &mut V) -> AggregationReport
where
    V: VenueVisitor + ?Sized,
{
    let mut store = match AggregateStore::from_json(seed) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Failed to parse initial browsing store: {}", e);
            return AggregationReport::rejected(seed, e.to_string());
        }
    };

    let slugs = slug_map(&store);

    let planned = plan_missing_visits(&store, allowed);
    let mut covered: BTreeSet<String> = store
        .sites_with_showtimes()
        .into_iter()
        .filter(|site_id| allowed.contains(site_id))
        .collect();
    let mut visits = Vec::with_capacity(planned.len());

    if planned.is_empty() {
        tracing::debug!("All allow-listed sites already have showtimes");
    } else {
        tracing::info!("Aggregating showtimes for {} additional site(s)", planned.len());
    }

    for site_id in &planned {
        let report = match slugs.get(site_id) {
            None => {
                tracing::warn!("Skipping {}: unable to derive slug", site_id);
                VisitReport {
                    site_id: site_id.clone(),
                    slug: None,
                    status: VisitStatus::Skipped(SkipReason::NoSlug),
                }
            }
            Some(slug) => {
                tracing::info!("Visiting {} -> {}", site_id, slug);
                let status = visit_site(&mut store, site_id, slug, &mut *visitor).await;
                VisitReport {
                    site_id: site_id.clone(),
                    slug: Some(slug.clone()),
                    status,
                }
            }
        };
        // 無論成功與否都視為已處理，避免同一輪重試
        covered.insert(site_id.clone());
        visits.push(report);
    }

    let filter = filter_store(&mut store, allowed);

    let serialized = match store.to_json() {
        Ok(serialized) => serialized,
        Err(e) => {
            tracing::error!("Failed to serialize aggregated store: {}", e);
            return AggregationReport::rejected(seed, e.to_string());
        }
    };

    AggregationReport {
        serialized,
        seed: SeedStatus::Parsed,
        planned,
        visits,
        covered,
        filter,
    }
}

/// Slug per known site: from its record when there is one, else from its id.
/// Sites whose slug comes out empty are left out.
fn slug_map(store: &AggregateStore) -> BTreeMap<String, String> {
    let mut slugs: BTreeMap<String, String> = store
        .sites()
        .into_iter()
        .map(|site| (site.id, site.slug))
        .collect();
    for site_id in store.known_site_ids() {
        slugs
            .entry(site_id.to_string())
            .or_insert_with(|| derive_slug("", site_id));
    }
    slugs.retain(|_, slug| !slug.is_empty());
    slugs
}

async fn visit_site<V>(store: &mut AggregateStore, site_id: &str, slug: &str, visitor: &mut V) -> VisitStatus
where
    V: VenueVisitor + ?Sized,
{
    if let Err(e) = visitor.navigate(slug).await {
        tracing::warn!("Failed to capture site {}: {}", site_id, e);
        return VisitStatus::Failed(VisitFailure::Navigation(e.reason));
    }

    let text = match visitor.read_serialized_store().await {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::warn!("No store content for {}", site_id);
            return VisitStatus::Failed(VisitFailure::EmptyStore);
        }
        Err(e) => {
            tracing::warn!("Failed to read store for {}: {}", site_id, e);
            return VisitStatus::Failed(VisitFailure::ReadStore(e.reason));
        }
    };

    let contribution = match VenueContribution::from_json(&text) {
        Ok(contribution) => contribution,
        Err(e) => {
            tracing::warn!("Invalid store JSON for {}: {}", site_id, e);
            return VisitStatus::Failed(VisitFailure::InvalidStore(e.to_string()));
        }
    };

    let films = merge_keyed(
        store.films_by_id.get_or_insert_with(BTreeMap::new),
        contribution.films_by_id,
    );
    let showtimes = merge_keyed(
        store.showtimes_by_id.get_or_insert_with(BTreeMap::new),
        contribution.showtimes_by_id,
    );
    tracing::debug!(
        "Merged {} film(s) and {} showtime(s) from {}",
        films,
        showtimes,
        site_id
    );

    VisitStatus::Merged { films, showtimes }
}
