use crate::domain::model::{Allowlist, AggregateStore};

/// 找出尚未有場次資料、需要再造訪的場館
///
/// Allow-listed ids from the discovery list, minus every site that already
/// owns at least one showtime, in discovery order. Duplicated ids in the
/// discovery list are planned once. An empty result means no visit is needed.
pub fn plan_missing_visits(store: &AggregateStore, allowed: &Allowlist) -> Vec<String> {
    let covered = store.sites_with_showtimes();
    let mut plan: Vec<String> = Vec::new();

    for site_id in store.known_site_ids() {
        if !allowed.contains(site_id) || covered.contains(site_id) {
            continue;
        }
        if !plan.iter().any(|planned| planned == site_id) {
            plan.push(site_id.to_string());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: serde_json::Value) -> AggregateStore {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_plan_lists_uncovered_allowed_sites_in_discovery_order() {
        let store = store(json!({
            "allSiteIds": { "payload": ["VIC1", "MAY1", "XXX1", "BLO1"] },
            "showtimesById": {
                "S1": { "payload": { "siteId": "MAY1", "filmId": "F1" } }
            }
        }));
        let allowed = Allowlist::new(["MAY1", "BLO1", "VIC1"]);

        assert_eq!(plan_missing_visits(&store, &allowed), vec!["VIC1", "BLO1"]);
    }

    #[test]
    fn test_plan_is_empty_when_everything_is_covered() {
        let store = store(json!({
            "allSiteIds": { "payload": ["MAY1"] },
            "showtimesById": {
                "S1": { "payload": { "siteId": "MAY1", "filmId": "F1" } }
            }
        }));
        assert!(plan_missing_visits(&store, &Allowlist::new(["MAY1"])).is_empty());
    }

    #[test]
    fn test_plan_is_empty_without_targets() {
        let no_index = store(json!({ "showtimesById": {} }));
        assert!(plan_missing_visits(&no_index, &Allowlist::new(["MAY1"])).is_empty());

        let outside = store(json!({ "allSiteIds": { "payload": ["XXX1"] } }));
        assert!(plan_missing_visits(&outside, &Allowlist::new(["MAY1"])).is_empty());
        assert!(plan_missing_visits(&outside, &Allowlist::default()).is_empty());
    }

    #[test]
    fn test_plan_ignores_null_and_duplicate_ids() {
        let store = store(json!({
            "allSiteIds": { "payload": ["BLO1", null, "", "BLO1"] }
        }));
        assert_eq!(
            plan_missing_visits(&store, &Allowlist::new(["BLO1"])),
            vec!["BLO1"]
        );
    }
}
