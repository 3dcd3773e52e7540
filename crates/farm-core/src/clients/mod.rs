//! Client modules for external collaborators

pub mod backend;
pub mod postgrest;
pub mod memory;
pub mod notifier;
pub mod pdf;

// Re-export all client types
pub use backend::FarmBackend;
pub use postgrest::PostgrestClient;
pub use memory::InMemoryBackend;
pub use notifier::{Notifier, LogNotifier, Notice, NoticeLevel};
pub use pdf::PdfService;
