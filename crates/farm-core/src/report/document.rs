//! Report document model, independent of the output encoding

use crate::error::{FarmError, Result};
use serde::Serialize;

/// A finished report: header lines, ordered sections, footer lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: String,
    pub header_lines: Vec<String>,
    pub sections: Vec<ReportSection>,
    pub footer_lines: Vec<String>,
}

impl ReportDocument {
    pub fn section(&self, heading: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    pub fn headings(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.heading.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub heading: String,
    #[serde(flatten)]
    pub body: SectionBody,
}

impl ReportSection {
    pub fn table(heading: impl Into<String>, table: ReportTable) -> Self {
        Self { heading: heading.into(), body: SectionBody::Table(table) }
    }

    /// Placeholder for a section whose content could not be built
    pub fn unavailable(heading: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { heading: heading.into(), body: SectionBody::Unavailable { notice: reason.into() } }
    }

    pub fn as_table(&self) -> Option<&ReportTable> {
        match &self.body {
            SectionBody::Table(table) => Some(table),
            SectionBody::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    Table(ReportTable),
    Unavailable { notice: String },
}

/// Column headers plus rows of already formatted cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(FarmError::Render(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Display width of each column over header and cells
    pub fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_checks_width() {
        let mut table = ReportTable::new(&["Metric", "Value", "Unit"]);
        assert!(table.push_row(vec!["a".into(), "1".into(), "Count".into()]).is_ok());
        assert!(matches!(table.push_row(vec!["short".into()]), Err(FarmError::Render(_))));
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.column_widths(), vec![6, 5, 5]);
    }

    #[test]
    fn test_section_serializes_with_kind_tag() {
        let section = ReportSection::unavailable("Feed Distribution Records", "Section unavailable");
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["heading"], "Feed Distribution Records");
        assert_eq!(json["kind"], "unavailable");
        assert_eq!(json["notice"], "Section unavailable");
    }
}
