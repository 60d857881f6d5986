pub mod auth;
pub mod codec;
pub mod exporter;
pub mod feed;
pub mod packer;
pub mod session;

pub use auth::AuthGate;
pub use feed::ScanDebouncer;
pub use packer::PackerService;
pub use session::{Effect, PackingSession, ScanOutcome};
