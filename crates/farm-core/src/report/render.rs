//! Output encodings for report documents

use super::document::{ReportDocument, ReportTable, SectionBody};
use crate::clients::PdfService;
use crate::error::Result;
use async_trait::async_trait;

/// Turns a document into the bytes of one output file
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    fn file_extension(&self) -> &'static str;

    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>>;
}

const PAGE_BREAK: char = '\u{0c}';
const NO_RECORDS: &str = "No records for this period";

/// Fixed-width plain text, paginated with form feeds
pub struct TextRenderer {
    page_height: usize,
}

impl TextRenderer {
    pub fn new(page_height: usize) -> Self {
        Self { page_height }
    }

    fn table_lines(table: &ReportTable) -> Vec<String> {
        let widths = table.column_widths();
        let format_row = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![
            format_row(table.columns.as_slice()),
            widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-"),
        ];
        if table.is_empty() {
            lines.push(NO_RECORDS.to_string());
        }
        lines.extend(table.rows.iter().map(|row| format_row(row.as_slice())));
        lines
    }

    /// Unpaginated body lines
    pub fn lines(&self, document: &ReportDocument) -> Vec<String> {
        let mut lines = vec![document.title.clone(), document.subtitle.clone(), String::new()];
        lines.extend(document.header_lines.iter().cloned());

        for section in &document.sections {
            lines.push(String::new());
            lines.push(section.heading.clone());
            match &section.body {
                SectionBody::Table(table) => lines.extend(Self::table_lines(table)),
                SectionBody::Unavailable { notice } => lines.push(notice.clone()),
            }
        }

        lines.push(String::new());
        lines.extend(document.footer_lines.iter().cloned());
        lines
    }

    /// Split body lines into pages, each closed by a `Page n of m` line
    pub fn paginate(&self, lines: &[String]) -> String {
        // Two lines per page are taken by the spacer and the page number
        let body_height = self.page_height.saturating_sub(2).max(1);
        let pages: Vec<&[String]> = lines.chunks(body_height).collect();
        let total = pages.len().max(1);

        let mut output = String::new();
        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                output.push(PAGE_BREAK);
            }
            for line in page.iter() {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
            output.push_str(&format!("Page {} of {}\n", i + 1, total));
        }
        output
    }
}

#[async_trait]
impl DocumentRenderer for TextRenderer {
    fn file_extension(&self) -> &'static str {
        "txt"
    }

    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        Ok(self.paginate(&self.lines(document)).into_bytes())
    }
}

/// The document model as pretty-printed JSON
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

#[async_trait]
impl DocumentRenderer for JsonRenderer {
    fn file_extension(&self) -> &'static str {
        "json"
    }

    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(document)?)
    }
}

/// Delegates layout to the PDF service
pub struct PdfServiceRenderer {
    service: PdfService,
}

impl PdfServiceRenderer {
    pub fn new(service: PdfService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl DocumentRenderer for PdfServiceRenderer {
    fn file_extension(&self) -> &'static str {
        "pdf"
    }

    async fn render(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        self.service.render_report(document).await
    }
}
