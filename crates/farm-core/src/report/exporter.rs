//! Writes rendered reports to the output directory

use super::builder::{scope_label, ReportBuilder};
use super::document::ReportDocument;
use super::render::DocumentRenderer;
use crate::clients::{Notice, Notifier};
use crate::config::ReportConfig;
use crate::error::{FarmError, Result};
use crate::store::FarmSnapshot;
use chrono::{NaiveDate, NaiveDateTime};
use farm_types::Scope;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const EXPORT_SUCCESS: &str = "Report exported successfully";
pub const EXPORT_FAILURE: &str = "Failed to generate report";

fn filename_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FarmError::Export(format!("Invalid filename pattern: {}", e)))
}

/// `TRYDT_Report_2024-01-01_All-Cows.pdf`
///
/// The label is reduced to letters, digits, `.`, `_` and `-` so the name
/// stays a single component inside the output directory.
pub fn report_file_name(from: NaiveDate, scope_label: &str, extension: &str) -> Result<String> {
    let unsafe_chars = filename_pattern(r"[^\p{L}\p{N}._-]+")?;
    let dot_runs = filename_pattern(r"\.{2,}")?;

    let label = unsafe_chars.replace_all(scope_label.trim(), "-");
    let label = dot_runs.replace_all(&label, ".");
    let label = match label.trim_matches(&['-', '.'][..]) {
        "" => "Unknown-Cow",
        trimmed => trimmed,
    };
    Ok(format!("TRYDT_Report_{}_{}.{}", from.format("%Y-%m-%d"), label, extension))
}

/// Clears the generating flag however the export ends
struct GeneratingGuard<'a>(&'a AtomicBool);

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ReportExporter {
    renderer: Box<dyn DocumentRenderer>,
    notifier: Arc<dyn Notifier>,
    output_dir: PathBuf,
    farm_name: String,
    generating: AtomicBool,
}

impl ReportExporter {
    pub fn new(
        renderer: Box<dyn DocumentRenderer>,
        notifier: Arc<dyn Notifier>,
        config: &ReportConfig,
    ) -> Self {
        Self {
            renderer,
            notifier,
            output_dir: config.output_dir.clone(),
            farm_name: config.farm_name.clone(),
            generating: AtomicBool::new(false),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::SeqCst)
    }

    pub fn build_document(
        &self,
        snapshot: &FarmSnapshot,
        scope: &Scope,
        generated_at: NaiveDateTime,
    ) -> ReportDocument {
        ReportBuilder::new(snapshot, scope, self.farm_name.as_str()).build(generated_at)
    }

    /// Build, render and save one report. Only one export runs at a time;
    /// a second call while one is in flight is rejected.
    pub async fn export(
        &self,
        snapshot: &FarmSnapshot,
        scope: &Scope,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf> {
        if self
            .generating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("Report export requested while another is in progress");
            return Err(FarmError::Export("A report is already being generated".to_string()));
        }
        let _guard = GeneratingGuard(&self.generating);

        match self.generate(snapshot, scope, generated_at).await {
            Ok(path) => {
                log::info!("Report written to {}", path.display());
                self.notifier.notify(Notice::success(EXPORT_SUCCESS));
                Ok(path)
            }
            Err(e) => {
                log::error!("Report export failed: {}", e);
                self.notifier.notify(Notice::error(EXPORT_FAILURE));
                Err(e)
            }
        }
    }

    async fn generate(
        &self,
        snapshot: &FarmSnapshot,
        scope: &Scope,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf> {
        let document = self.build_document(snapshot, scope, generated_at);
        let bytes = self.renderer.render(&document).await?;

        let file_name = report_file_name(
            scope.range.from(),
            &scope_label(snapshot, &scope.cow_filter),
            self.renderer.file_extension(),
        )?;
        self.write_atomically(&file_name, &bytes)
    }

    /// The file appears under its final name complete or not at all
    fn write_atomically(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut file = NamedTempFile::new_in(&self.output_dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        let path = self.output_dir.join(file_name);
        file.persist(&path).map_err(|e| FarmError::Io(e.error))?;
        Ok(path)
    }
}
