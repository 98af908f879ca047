use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveTime};
use proptest::prelude::*;

use divelog::{
    engine::SearchRequest,
    entry::EntryDraft,
    filter::FilterSet,
    persist::LogStore,
    types::EntryId,
};

const COUNTRIES: [&str; 3] = ["Palau", "Egypt", "Mexico"];
const WORDS: [&str; 5] = ["manta", "wreck", "turtle", "current", "coral"];

#[derive(Debug, Clone)]
struct Spec {
    day: u16,
    minute: u16,
    depth: u8,
    country: usize,
    words: Vec<usize>,
}

fn spec_strategy() -> impl Strategy<Value = Spec> {
    (
        0u16..30,
        0u16..(24 * 60),
        0u8..60,
        0usize..COUNTRIES.len(),
        prop::collection::vec(0usize..WORDS.len(), 0..4),
    )
        .prop_map(|(day, minute, depth, country, words)| Spec {
            day,
            minute,
            depth,
            country,
            words,
        })
}

fn draft_from(spec: &Spec) -> EntryDraft {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Days::new(u64::from(spec.day));
    let time = NaiveTime::from_hms_opt(u32::from(spec.minute / 60), u32::from(spec.minute % 60), 0)
        .unwrap();
    let mut d = EntryDraft::new(
        "Site",
        date,
        time,
        f64::from(spec.depth),
        40,
        vec!["reef".to_string()],
    );
    d.country = Some(COUNTRIES[spec.country].to_string());
    let text: Vec<&str> = spec.words.iter().map(|w| WORDS[*w]).collect();
    if !text.is_empty() {
        d.highlights = Some(text.join(" "));
    }
    d
}

fn load(specs: &[Spec]) -> (LogStore, Vec<(EntryId, EntryDraft)>) {
    let mut store = LogStore::open_in_memory().expect("open");
    let created = specs
        .iter()
        .map(|s| {
            let d = draft_from(s);
            (store.create(d.clone()).expect("create"), d)
        })
        .collect();
    (store, created)
}

fn id_set(hits: &[divelog::engine::SearchHit]) -> BTreeSet<EntryId> {
    hits.iter().map(|h| h.entry.id).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn get_all_is_sorted_newest_first_with_stable_ties(specs in prop::collection::vec(spec_strategy(), 0..40)) {
        let (store, created) = load(&specs);
        let all = store.get_all().expect("all");
        prop_assert_eq!(all.len(), created.len());

        let position = |id: &EntryId| created.iter().position(|(c, _)| c == id).unwrap();
        for pair in all.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!((a.date, a.time) >= (b.date, b.time));
            if (a.date, a.time) == (b.date, b.time) {
                prop_assert!(position(&a.id) < position(&b.id));
            }
        }
    }

    #[test]
    fn created_entries_round_trip(specs in prop::collection::vec(spec_strategy(), 1..15)) {
        let (store, created) = load(&specs);
        for (id, draft) in created {
            prop_assert_eq!(store.get_by_id(&id).expect("get"), draft.into_entry(id));
        }
    }

    #[test]
    fn filter_only_depth_range_is_exact(
        specs in prop::collection::vec(spec_strategy(), 0..40),
        a in 0u8..60,
        b in 0u8..60,
    ) {
        let (min, max) = (f64::from(a.min(b)), f64::from(a.max(b)));
        let (store, created) = load(&specs);
        let hits = store
            .search(
                &SearchRequest::filtered(FilterSet {
                    min_depth: Some(min),
                    max_depth: Some(max),
                    ..FilterSet::default()
                })
                .with_limit(100),
            )
            .expect("search");

        let expected: BTreeSet<EntryId> = created
            .iter()
            .filter(|(_, d)| min <= d.depth_max && d.depth_max <= max)
            .map(|(id, _)| *id)
            .collect();
        prop_assert_eq!(id_set(&hits), expected);
    }

    #[test]
    fn combined_results_are_a_bounded_duplicate_free_union(
        specs in prop::collection::vec(spec_strategy(), 0..30),
        country in 0usize..COUNTRIES.len(),
        word in 0usize..WORDS.len(),
        limit in 1usize..8,
    ) {
        let (store, _) = load(&specs);
        let filters = FilterSet {
            country: Some(COUNTRIES[country].to_string()),
            ..FilterSet::default()
        };

        let combined = store
            .search(&SearchRequest::filtered(filters.clone()).with_query(WORDS[word]).with_limit(limit))
            .expect("combined");
        let filter_only = store
            .search(&SearchRequest::filtered(filters).with_limit(limit))
            .expect("filter");
        let text_only = store
            .search(&SearchRequest::text(WORDS[word]).with_limit(limit))
            .expect("text");

        prop_assert!(combined.len() <= limit);
        let combined_ids = id_set(&combined);
        prop_assert_eq!(combined_ids.len(), combined.len());

        let union: BTreeSet<EntryId> = id_set(&filter_only).union(&id_set(&text_only)).copied().collect();
        prop_assert!(combined_ids.is_subset(&union));

        // Filter matches lead the list and are never displaced.
        let lead: Vec<EntryId> = combined.iter().take(filter_only.len()).map(|h| h.entry.id).collect();
        let expected_lead: Vec<EntryId> = filter_only.iter().map(|h| h.entry.id).collect();
        prop_assert_eq!(lead, expected_lead);
    }
}
