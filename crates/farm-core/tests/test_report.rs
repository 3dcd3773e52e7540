mod common;

use async_trait::async_trait;
use chrono::{NaiveDateTime, NaiveTime};
use common::*;
use farm_core::clients::NoticeLevel;
use farm_core::config::ReportConfig;
use farm_core::report::builder::{FEED_RECORDS, HEALTH_RECORDS, HERD_STATUS, KEY_METRICS, MILK_RECORDS};
use farm_core::report::exporter::{EXPORT_FAILURE, EXPORT_SUCCESS};
use farm_core::report::{DocumentRenderer, JsonRenderer, ReportDocument, TextRenderer};
use farm_core::{FarmError, FarmSnapshot, ReportExporter, Result};
use farm_types::{CowFilter, CowId, CowStatus, DateRange, HealthStatus, Scope};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Notify;

fn generated_at() -> NaiveDateTime {
    date(2024, 1, 5).and_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap())
}

fn snapshot() -> FarmSnapshot {
    FarmSnapshot {
        cows: vec![
            cow("a", "Amani", CowStatus::Active),
            cow("b", "Baraka", CowStatus::Dry),
        ],
        milk_records: vec![
            milk("m1", "a", date(2024, 1, 1), 6.0),
            milk("m2", "a", date(2024, 1, 3), 7.0),
            milk("m3", "ghost", date(2024, 1, 3), 2.0),
        ],
        feed_records: vec![feed("f1", "b", date(2024, 1, 2), 3.0)],
        health_records: vec![health("h1", "a", date(2024, 1, 3), HealthStatus::Healthy)],
        sales: Vec::new(),
    }
}

fn exporter_in(dir: &TempDir, renderer: Box<dyn DocumentRenderer>) -> (ReportExporter, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let config = ReportConfig { output_dir: dir.path().join("reports"), ..Default::default() };
    (ReportExporter::new(renderer, notifier.clone(), &config), notifier)
}

#[tokio::test]
async fn test_single_day_header_shows_one_date() {
    let dir = TempDir::new().unwrap();
    let (exporter, _) = exporter_in(&dir, Box::new(JsonRenderer));
    let scope = Scope::all_cows(DateRange::single_day(date(2024, 1, 3)));

    let document = exporter.build_document(&snapshot(), &scope, generated_at());
    assert_eq!(document.header_lines[0], "Generated: January 5, 2024 9:30:00 AM");
    assert_eq!(document.header_lines[1], "Report Period: January 3, 2024");
    assert_eq!(document.header_lines[3], "Total Days Analyzed: 1");
}

#[tokio::test]
async fn test_section_order_depends_on_scope() {
    let dir = TempDir::new().unwrap();
    let (exporter, _) = exporter_in(&dir, Box::new(JsonRenderer));
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();

    let herd = exporter.build_document(&snapshot(), &Scope::all_cows(range), generated_at());
    assert_eq!(
        herd.headings(),
        vec![KEY_METRICS, HERD_STATUS, MILK_RECORDS, FEED_RECORDS, HEALTH_RECORDS]
    );

    let single = Scope::new(CowFilter::Cow(CowId::from("a")), range);
    let one_cow = exporter.build_document(&snapshot(), &single, generated_at());
    assert_eq!(one_cow.headings(), vec![KEY_METRICS, MILK_RECORDS, FEED_RECORDS, HEALTH_RECORDS]);
    assert_eq!(one_cow.header_lines[2], "Data Scope: Amani");

    let metrics = one_cow.section(KEY_METRICS).and_then(|s| s.as_table()).unwrap();
    assert_eq!(metrics.rows[0], vec!["Total Milk Production", "13.00", "Litres"]);
    assert_eq!(metrics.rows[1][0], "Average per Day");
    assert_eq!(metrics.rows[2], vec!["Total Cows", "1", "Count"]);
}

#[tokio::test]
async fn test_milk_detail_newest_first_with_unknown_cow() {
    let dir = TempDir::new().unwrap();
    let (exporter, _) = exporter_in(&dir, Box::new(JsonRenderer));
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();

    let document = exporter.build_document(&snapshot(), &Scope::all_cows(range), generated_at());
    let milk = document.section(MILK_RECORDS).and_then(|s| s.as_table()).unwrap();

    let rows: Vec<(&str, &str)> = milk.rows.iter().map(|r| (r[0].as_str(), r[1].as_str())).collect();
    assert_eq!(
        rows,
        vec![("Jan 3, 2024", "Amani"), ("Jan 3, 2024", "Unknown"), ("Jan 1, 2024", "Amani")]
    );
    assert_eq!(milk.rows[1][2], "N/A");

    let herd = document.section(HERD_STATUS).and_then(|s| s.as_table()).unwrap();
    assert_eq!(herd.rows[2], vec!["Dry", "1", "50.0%"]);
}

#[tokio::test]
async fn test_export_writes_named_file() {
    let dir = TempDir::new().unwrap();
    let (exporter, notifier) = exporter_in(&dir, Box::new(TextRenderer::new(20)));
    let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();

    let path = exporter.export(&snapshot(), &Scope::all_cows(range), generated_at()).await.unwrap();

    assert_eq!(path.file_name().unwrap(), "TRYDT_Report_2024-01-01_All-Cows.txt");
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Milk Production Records"));
    assert!(text.contains("Page 1 of"));
    assert!(text.contains('\u{0c}'));
    assert!(!exporter.is_generating());
    assert_eq!(notifier.messages(NoticeLevel::Success), vec![EXPORT_SUCCESS]);

    // Only the persisted report remains in the directory
    let entries = std::fs::read_dir(exporter.output_dir()).unwrap().count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn test_export_for_cow_name_with_path_separators() {
    let dir = TempDir::new().unwrap();
    let (exporter, _notifier) = exporter_in(&dir, Box::new(JsonRenderer));
    let mut snapshot = snapshot();
    snapshot.cows.push(cow("s", "Daisy/II", CowStatus::Active));
    snapshot.cows.push(cow("e", "../../escaped", CowStatus::Active));
    let range = DateRange::single_day(date(2024, 1, 3));

    let path = exporter
        .export(&snapshot, &Scope::new(CowFilter::Cow(CowId::from("s")), range), generated_at())
        .await
        .unwrap();
    assert_eq!(path.file_name().unwrap(), "TRYDT_Report_2024-01-03_Daisy-II.json");
    assert_eq!(path.parent().unwrap(), exporter.output_dir());

    let path = exporter
        .export(&snapshot, &Scope::new(CowFilter::Cow(CowId::from("e")), range), generated_at())
        .await
        .unwrap();
    assert_eq!(path.parent().unwrap(), exporter.output_dir());
    assert!(path.exists());
    assert_eq!(std::fs::read_dir(exporter.output_dir()).unwrap().count(), 2);
}

struct FailingRenderer;

#[async_trait]
impl DocumentRenderer for FailingRenderer {
    fn file_extension(&self) -> &'static str {
        "pdf"
    }

    async fn render(&self, _document: &ReportDocument) -> Result<Vec<u8>> {
        Err(FarmError::ServiceUnavailable("PDF service returned 503".to_string()))
    }
}

#[tokio::test]
async fn test_failed_export_leaves_no_file_and_resets() {
    let dir = TempDir::new().unwrap();
    let (exporter, notifier) = exporter_in(&dir, Box::new(FailingRenderer));
    let scope = Scope::all_cows(DateRange::single_day(date(2024, 1, 3)));

    assert!(exporter.export(&snapshot(), &scope, generated_at()).await.is_err());
    assert!(!exporter.is_generating());
    assert_eq!(notifier.messages(NoticeLevel::Error), vec![EXPORT_FAILURE]);

    let leftover = std::fs::read_dir(exporter.output_dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

/// Holds rendering open until the test releases it
struct GatedRenderer {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl DocumentRenderer for GatedRenderer {
    fn file_extension(&self) -> &'static str {
        "json"
    }

    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(serde_json::to_vec(document)?)
    }
}

#[tokio::test]
async fn test_concurrent_export_is_rejected() {
    let dir = TempDir::new().unwrap();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let renderer = GatedRenderer { started: started.clone(), release: release.clone() };
    let (exporter, _) = exporter_in(&dir, Box::new(renderer));
    let exporter = Arc::new(exporter);

    let snapshot = Arc::new(snapshot());
    let scope = Scope::all_cows(DateRange::single_day(date(2024, 1, 3)));

    let first = tokio::spawn({
        let exporter = exporter.clone();
        let snapshot = snapshot.clone();
        let scope = scope.clone();
        async move { exporter.export(&snapshot, &scope, generated_at()).await }
    });

    started.notified().await;
    assert!(exporter.is_generating());
    let second = exporter.export(&snapshot, &scope, generated_at()).await;
    assert!(matches!(second, Err(FarmError::Export(_))));

    release.notify_one();
    let path = first.await.unwrap().unwrap();
    assert!(path.ends_with("TRYDT_Report_2024-01-03_All-Cows.json"));
    assert!(!exporter.is_generating());
}
