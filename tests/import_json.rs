use std::io::Write;

use tempfile::NamedTempFile;

use divelog::{
    ErrorKind,
    engine::SearchRequest,
    filter::FilterSet,
    import::import_json,
    persist::LogStore,
};

const SAMPLE: &str = r#"[
  {
    "date": "2024-03-15", "time": "09:30", "max_depth": 30, "dive_type": "wall,drift",
    "location_site": "Blue Corner", "dive_length": 50,
    "location_area": "Koror", "location_country": "Palau",
    "highlights": "barracuda schools, reef sharks", "depth_avg": 18
  },
  {
    "date": "2023-10-02", "time": "07:45", "max_depth": 31, "dive_type": "wreck",
    "location_site": "SS Thistlegorm", "dive_length": 48,
    "location_area": "Red Sea", "location_country": "Egypt",
    "content": "Motorbikes in the holds."
  },
  {
    "date": "not a date", "time": "07:45", "max_depth": 12, "dive_type": "reef",
    "location_site": "Broken", "dive_length": 30
  },
  {
    "date": "2023-10-03", "time": "07:45", "max_depth": 12, "dive_type": "reef",
    "location_site": "", "dive_length": 30
  },
  { "location_site": "Missing everything" }
]"#;

#[test]
fn imports_valid_records_and_reports_the_rest() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut file = NamedTempFile::new().expect("tmp");
    file.write_all(SAMPLE.as_bytes()).expect("write");

    let mut store = LogStore::open_in_memory().expect("open");
    let report = import_json(&mut store, std::fs::File::open(file.path()).expect("open json"))
        .expect("import");

    assert_eq!(report.inserted.len(), 2);
    let failed: Vec<(usize, ErrorKind)> = report
        .failures
        .iter()
        .map(|f| (f.index, f.error.kind()))
        .collect();
    assert_eq!(
        failed,
        vec![
            (2, ErrorKind::Validation),
            (3, ErrorKind::Validation),
            (4, ErrorKind::Decode),
        ]
    );
    assert_eq!(store.count().expect("count"), 2);

    let wrecks = store
        .search(&SearchRequest::filtered(FilterSet {
            category: Some("Wreck".to_string()),
            ..FilterSet::default()
        }))
        .expect("search");
    assert_eq!(wrecks.len(), 1);
    assert_eq!(wrecks[0].entry.site, "SS Thistlegorm");

    let sharks = store.search(&SearchRequest::text("sharks")).expect("search");
    assert_eq!(sharks[0].entry.site, "Blue Corner");
    assert_eq!(sharks[0].entry.depth_avg, Some(18.0));
}

#[test]
fn non_array_input_is_a_decode_error() {
    let mut store = LogStore::open_in_memory().expect("open");
    let err = import_json(&mut store, r#"{"date": "2024-01-01"}"#.as_bytes()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(store.count().expect("count"), 0);
}
