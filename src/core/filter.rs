use crate::domain::model::{Allowlist, AggregateStore};
use serde_json::Value;
use std::collections::BTreeSet;

/// Entries removed by one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub site_ids_removed: usize,
    pub sites_removed: usize,
    pub showtimes_removed: usize,
    pub films_removed: usize,
}

/// 依允許清單裁剪彙整資料
///
/// Runs in dependency order: the discovery list, then sites, then showtimes
/// by their site, then showtimes whose film is missing, then films that no
/// surviving showtime references. An empty allowlist leaves the store untouched.
pub fn filter_store(store: &mut AggregateStore, allowed: &Allowlist) -> FilterStats {
    let mut stats = FilterStats::default();
    if allowed.is_empty() {
        return stats;
    }

    if let Some(payload) = store.all_site_ids.as_mut().and_then(|index| index.payload.as_mut()) {
        if !payload.is_array() {
            *payload = Value::Array(Vec::new());
        }
        if let Some(ids) = payload.as_array_mut() {
            let before = ids.len();
            ids.retain(|id| id.as_str().is_some_and(|id| allowed.contains(id)));
            stats.site_ids_removed = before - ids.len();
        }
    }

    if let Some(sites) = store.sites_by_id.as_mut() {
        let before = sites.len();
        sites.retain(|site_id, _| allowed.contains(site_id));
        stats.sites_removed = before - sites.len();
    }

    if let Some(showtimes) = store.showtimes_by_id.as_mut() {
        let before = showtimes.len();
        showtimes.retain(|_, record| {
            record
                .as_ref()
                .and_then(|r| r.site_id())
                .is_some_and(|site_id| allowed.contains(site_id))
        });
        stats.showtimes_removed = before - showtimes.len();
    }

    // 場次必須指向現存的影片
    let known_films: BTreeSet<String> = store.film_ids().map(str::to_string).collect();
    if let Some(showtimes) = store.showtimes_by_id.as_mut() {
        let before = showtimes.len();
        showtimes.retain(|_, record| {
            record
                .as_ref()
                .and_then(|r| r.film_id())
                .is_some_and(|film_id| known_films.contains(film_id))
        });
        stats.showtimes_removed += before - showtimes.len();
    }

    let films_in_use: BTreeSet<String> = store
        .showtimes_by_id
        .iter()
        .flat_map(|showtimes| showtimes.values())
        .filter_map(|record| record.as_ref()?.film_id())
        .filter(|film_id| !film_id.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(films) = store.films_by_id.as_mut() {
        let before = films.len();
        films.retain(|film_id, _| films_in_use.contains(film_id));
        stats.films_removed = before - films.len();
    }

    tracing::debug!(
        "Filtered store: removed {} site id(s), {} site(s), {} showtime(s), {} film(s)",
        stats.site_ids_removed,
        stats.sites_removed,
        stats.showtimes_removed,
        stats.films_removed
    );

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> AggregateStore {
        serde_json::from_value(json!({
            "allSiteIds": { "payload": ["MAY1", "XXX1", null, "BLO1"] },
            "sitesById": {
                "MAY1": { "payload": { "name": { "text": "Curzon Mayfair" } } },
                "BLO1": null,
                "XXX1": { "payload": { "name": { "text": "Somewhere Else" } } }
            },
            "filmsById": {
                "F1": { "payload": {} },
                "F2": { "payload": {} },
                "F3": { "payload": {} }
            },
            "showtimesById": {
                "S1": { "payload": { "siteId": "MAY1", "filmId": "F1" } },
                "S2": { "payload": { "siteId": "XXX1", "filmId": "F2" } },
                "S3": { "payload": { "siteId": "BLO1", "filmId": "F1" } },
                "S4": { "payload": { "filmId": "F3" } },
                "S5": null
            }
        }))
        .unwrap()
    }

    fn allowed() -> Allowlist {
        Allowlist::new(["MAY1", "BLO1"])
    }

    #[test]
    fn test_filter_cascades_to_films() {
        let mut store = store();
        let stats = filter_store(&mut store, &allowed());

        let ids: Vec<&str> = store.known_site_ids().collect();
        assert_eq!(ids, vec!["MAY1", "BLO1"]);
        assert_eq!(
            store.all_site_ids.as_ref().unwrap().payload.as_ref().unwrap().as_array().unwrap().len(),
            2
        );

        let sites = store.sites_by_id.as_ref().unwrap();
        assert!(sites.contains_key("MAY1"));
        assert!(sites.contains_key("BLO1"));
        assert!(!sites.contains_key("XXX1"));

        let showtimes = store.showtimes_by_id.as_ref().unwrap();
        let mut showtime_ids: Vec<&String> = showtimes.keys().collect();
        showtime_ids.sort();
        assert_eq!(showtime_ids, vec!["S1", "S3"]);

        let films: Vec<&str> = store.film_ids().collect();
        assert_eq!(films, vec!["F1"]);

        assert_eq!(
            stats,
            FilterStats {
                site_ids_removed: 2,
                sites_removed: 1,
                showtimes_removed: 3,
                films_removed: 2,
            }
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let mut once = store();
        filter_store(&mut once, &allowed());

        let mut twice = once.clone();
        let stats = filter_store(&mut twice, &allowed());

        assert_eq!(once, twice);
        assert_eq!(stats, FilterStats::default());
    }

    #[test]
    fn test_filtered_showtimes_reference_allowed_sites_and_known_films() {
        let mut store = store();
        let allowed = allowed();
        filter_store(&mut store, &allowed);

        let films = store.films_by_id.as_ref().unwrap();
        for showtime in store.showtimes() {
            assert!(allowed.contains(showtime.site_id.as_deref().unwrap()));
            assert!(films.contains_key(showtime.film_id.as_deref().unwrap()));
        }
    }

    #[test]
    fn test_showtimes_with_missing_films_are_pruned() {
        let mut store: AggregateStore = serde_json::from_value(json!({
            "filmsById": { "F1": { "payload": {} }, "F8": null },
            "showtimesById": {
                "S1": { "payload": { "siteId": "MAY1", "filmId": "F9" } },
                "S2": { "payload": { "siteId": "MAY1", "filmId": "F1" } },
                "S3": { "payload": { "siteId": "BLO1" } },
                "S4": { "payload": { "siteId": "BLO1", "filmId": "F8" } }
            }
        }))
        .unwrap();

        let stats = filter_store(&mut store, &allowed());

        let showtimes = store.showtimes_by_id.as_ref().unwrap();
        let mut kept: Vec<&String> = showtimes.keys().collect();
        kept.sort();
        assert_eq!(kept, vec!["S2", "S4"]);
        assert_eq!(stats.showtimes_removed, 2);

        let films = store.films_by_id.as_ref().unwrap();
        for showtime in store.showtimes() {
            assert!(films.contains_key(showtime.film_id.as_deref().unwrap()));
        }
        assert_eq!(filter_store(&mut store, &allowed()), FilterStats::default());
    }

    #[test]
    fn test_non_array_discovery_list_is_reset() {
        let mut store: AggregateStore =
            serde_json::from_value(json!({ "allSiteIds": { "payload": "MAY1" } })).unwrap();
        filter_store(&mut store, &allowed());
        assert_eq!(store.all_site_ids.unwrap().payload, Some(json!([])));
    }

    #[test]
    fn test_empty_allowlist_is_noop() {
        let mut filtered = store();
        let stats = filter_store(&mut filtered, &Allowlist::default());
        assert_eq!(filtered, store());
        assert_eq!(stats, FilterStats::default());
    }

    #[test]
    fn test_missing_collections_stay_missing() {
        let mut store = AggregateStore::default();
        filter_store(&mut store, &allowed());
        assert!(store.sites_by_id.is_none());
        assert!(store.films_by_id.is_none());
        assert!(store.showtimes_by_id.is_none());
    }
}
