pub mod checklist;
pub mod event;
pub mod invoice;
pub mod phase;
pub mod state;

pub use checklist::ChecklistEntry;
pub use event::{ScanEvent, ScanSource};
pub use invoice::{InvoiceItem, InvoicePayload};
pub use phase::PackingPhase;
pub use state::UiState;
