//! Farm analytics report: document model, builder, renderers and export

pub mod document;
pub mod builder;
pub mod render;
pub mod exporter;

pub use document::{ReportDocument, ReportSection, ReportTable, SectionBody};
pub use builder::ReportBuilder;
pub use render::{DocumentRenderer, JsonRenderer, PdfServiceRenderer, TextRenderer};
pub use exporter::{report_file_name, ReportExporter};
