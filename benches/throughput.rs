use chrono::{Days, NaiveDate, NaiveTime};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use divelog::{
    engine::SearchRequest,
    entry::EntryDraft,
    filter::FilterSet,
    persist::LogStore,
};

const COUNTRIES: [&str; 4] = ["Palau", "Egypt", "Mexico", "Indonesia"];
const HIGHLIGHTS: [&str; 4] = [
    "manta rays at the cleaning station",
    "wreck penetration with strong current",
    "turtles and reef sharks on the wall",
    "macro life, nudibranchs, frogfish",
];

fn draft(i: u64) -> EntryDraft {
    let idx = (i % 4) as usize;
    let mut d = EntryDraft::new(
        format!("Site {}", i % 97),
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Days::new(i % 1500),
        NaiveTime::from_hms_opt((i % 24) as u32, (i % 60) as u32, 0).unwrap(),
        (i % 45) as f64,
        45,
        vec!["reef".to_string()],
    );
    d.country = Some(COUNTRIES[idx].to_string());
    d.highlights = Some(HIGHLIGHTS[idx].to_string());
    d
}

fn populated(n: u64) -> LogStore {
    let mut store = LogStore::open_in_memory().expect("open");
    for i in 0..n {
        store.create(draft(i)).expect("create");
    }
    store
}

fn bench_creates(c: &mut Criterion) {
    c.bench_function("store_create_1k", |b| {
        b.iter(|| populated(1_000));
    });
}

fn bench_search_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let store = populated(5_000);

    let requests = [
        ("filter_only", SearchRequest::filtered(FilterSet {
            country: Some("Palau".to_string()),
            min_depth: Some(10.0),
            max_depth: Some(30.0),
            ..FilterSet::default()
        })),
        ("text_only", SearchRequest::text("manta current")),
        ("combined", SearchRequest::filtered(FilterSet {
            country: Some("Egypt".to_string()),
            ..FilterSet::default()
        })
        .with_query("sharks wreck")),
    ];

    for (name, request) in &requests {
        for limit in [10usize, 100usize] {
            let request = request.clone().with_limit(limit);
            group.bench_with_input(BenchmarkId::new(*name, limit), &request, |b, req| {
                b.iter(|| store.search(req).expect("search"));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_creates, bench_search_paths);
criterion_main!(benches);
