//! Saving and loading drawings through the file-backed store.

use std::fs;

use charter_drawing::persistence::read_document;
use charter_drawing::{
    ChartView, DrawingKind, DrawingManager, DrawingMode, JsonFileStore, LinearCoordinates, MemoryStore,
    PersistError,
};
use serde_json::json;
use tempfile::tempdir;

fn coords() -> LinearCoordinates {
    LinearCoordinates::new((0.0, 400.0), (0.0, 400.0), 400.0, 400.0)
}

fn draw(m: &mut DrawingManager, view: &ChartView<'_>, kind: DrawingKind, clicks: &[(f64, f64)]) {
    m.set_mode(DrawingMode::Create(kind));
    for &(x, y) in clicks {
        assert!(m.handle_press(view, x, y));
    }
    assert!(m.active().is_none(), "{kind} not committed");
}

/// Test a save and load cycle through files keeps every drawing intact.
#[test]
fn test_file_roundtrip() {
    let dir = tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path());
    let coords = coords();
    let view = ChartView::new(&coords, &[]);

    let mut m = DrawingManager::new();
    draw(&mut m, &view, DrawingKind::TrendLine, &[(10.0, 10.0), (90.0, 50.0)]);
    draw(&mut m, &view, DrawingKind::ParallelChannel, &[(100.0, 300.0), (200.0, 250.0), (150.0, 200.0)]);
    draw(&mut m, &view, DrawingKind::Text, &[(50.0, 50.0)]);
    let id = m.drawings()[0].id();
    m.set_drawing_locked(id, true);

    assert_eq!(m.save_to(&mut store, "BTC/USDT").unwrap(), 3);
    assert!(dir.path().join("BTC%2FUSDT.json").exists());
    assert!(!dir.path().join("BTC%2FUSDT.json.tmp").exists());

    let mut restored = DrawingManager::new();
    let report = restored.load_from(&store, "BTC/USDT").unwrap();
    assert!(report.is_clean());
    assert_eq!(report.loaded, 3);
    assert_eq!(restored.symbol(), Some("BTC/USDT"));

    for (a, b) in m.drawings().iter().zip(restored.drawings()) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.points(), b.points());
        assert_eq!(a.style(), b.style());
        assert_eq!(a.is_locked(), b.is_locked());
    }
}

/// Test the saved document is a plain array of records.
#[test]
fn test_document_shape() {
    let dir = tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path());
    let coords = coords();
    let view = ChartView::new(&coords, &[]);

    let mut m = DrawingManager::new();
    draw(&mut m, &view, DrawingKind::Ray, &[(10.0, 10.0), (90.0, 50.0)]);
    m.save_to(&mut store, "ETH").unwrap();

    let records = read_document(&store.path_for("ETH")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["type"], "ray");
    assert_eq!(records[0]["state"], "complete");
    assert_eq!(records[0]["points"].as_array().map(Vec::len), Some(2));
}

/// Test that a missing file loads as an empty collection.
#[test]
fn test_missing_symbol_is_empty() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("not-created-yet"));
    let mut m = DrawingManager::new();
    let report = m.load_from(&store, "SOL").unwrap();
    assert_eq!(report.loaded, 0);
    assert!(m.is_empty());
}

/// Test corrupt entries are dropped while the rest of the document loads.
#[test]
fn test_corrupt_entries_isolated() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let document = json!([
        {"id": 10, "type": "trendLine", "points": [{"time": 1.0, "price": 2.0}, {"time": 3.0, "price": 4.0}]},
        {"id": 11, "type": "pitchfork", "points": []},
        {"id": 12, "type": "horizontalLine", "points": [{"time": 1.0, "price": "high"}]},
        {"id": 13, "type": "rectangle", "points": [{"time": 1.0, "price": 1.0}, {"time": 2.0, "price": 2.0}],
         "style": {"color": [1.0, 0.0, 0.0, 1.0], "lineWidth": 3.0}},
        {"id": 10, "type": "verticalLine", "points": [{"time": 5.0, "price": 0.0}]}
    ]);
    fs::write(store.path_for("XRP"), document.to_string()).unwrap();

    let mut m = DrawingManager::new();
    let report = m.load_from(&store, "XRP").unwrap();
    assert_eq!(report.loaded, 2);
    let dropped: Vec<usize> = report.dropped.iter().map(|d| d.index).collect();
    assert_eq!(dropped, vec![1, 2, 4]);
    assert_eq!(m.drawings()[1].style().line_width, 3.0);
}

/// Test a document that is not an array is a format error.
#[test]
fn test_non_array_document() {
    let dir = tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    fs::write(store.path_for("ADA"), r#"{"drawings": []}"#).unwrap();

    let mut m = DrawingManager::new();
    match m.load_from(&store, "ADA") {
        Err(PersistError::Format { symbol }) => assert_eq!(symbol, "ADA"),
        other => panic!("expected format error, got {other:?}"),
    }

    fs::write(store.path_for("DOT"), "[{").unwrap();
    assert!(matches!(m.load_from(&store, "DOT"), Err(PersistError::Json(_))));
}

/// Test switching symbols flushes the current drawings first.
#[test]
fn test_switch_symbol_flushes() {
    let dir = tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path());
    let coords = coords();
    let view = ChartView::new(&coords, &[]);

    let mut m = DrawingManager::new();
    m.switch_symbol(&mut store, "AAA").unwrap();
    draw(&mut m, &view, DrawingKind::HorizontalLine, &[(10.0, 100.0)]);

    m.switch_symbol(&mut store, "BBB").unwrap();
    assert!(m.is_empty());
    draw(&mut m, &view, DrawingKind::VerticalLine, &[(20.0, 100.0)]);
    draw(&mut m, &view, DrawingKind::VerticalLine, &[(30.0, 100.0)]);

    let report = m.switch_symbol(&mut store, "AAA").unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(m.drawings()[0].kind(), DrawingKind::HorizontalLine);
    assert_eq!(read_document(&store.path_for("BBB")).unwrap().len(), 2);
}

/// Test new drawings never reuse an id that was loaded.
#[test]
fn test_ids_stay_ahead_of_loaded() {
    let mut store = MemoryStore::new();
    store.insert(
        "LTC",
        vec![json!({"id": 9_000_000, "type": "verticalLine", "points": [{"time": 5.0, "price": 0.0}]})],
    );
    let coords = coords();
    let view = ChartView::new(&coords, &[]);

    let mut m = DrawingManager::new();
    m.load_from(&store, "LTC").unwrap();
    draw(&mut m, &view, DrawingKind::HorizontalLine, &[(10.0, 100.0)]);

    assert!(m.drawings()[1].id().raw() > 9_000_000);
    m.save_to(&mut store, "LTC").unwrap();
    assert_eq!(store.get("LTC").map(<[_]>::len), Some(2));
}

/// Test symbols that differ only in punctuation keep separate files.
#[test]
fn test_similar_symbols_do_not_collide() {
    let dir = tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path());
    let coords = coords();
    let view = ChartView::new(&coords, &[]);

    let mut slash = DrawingManager::new();
    draw(&mut slash, &view, DrawingKind::HorizontalLine, &[(10.0, 10.0)]);
    slash.save_to(&mut store, "BTC/USDT").unwrap();

    let mut underscore = DrawingManager::new();
    draw(&mut underscore, &view, DrawingKind::Text, &[(20.0, 20.0)]);
    draw(&mut underscore, &view, DrawingKind::Text, &[(30.0, 30.0)]);
    underscore.save_to(&mut store, "BTC_USDT").unwrap();

    let mut restored = DrawingManager::new();
    assert_eq!(restored.load_from(&store, "BTC/USDT").unwrap().loaded, 1);
    assert_eq!(restored.drawings()[0].kind(), DrawingKind::HorizontalLine);
    assert_eq!(restored.load_from(&store, "BTC_USDT").unwrap().loaded, 2);
    assert!(restored.load_from(&store, "BTC:USDT").unwrap().is_clean());
    assert!(restored.is_empty());
}
