//! Application layer module
//!
//! Orchestrates the domain logic: paginated fetching, reconciliation,
//! field diffing and the one-way sync, wired together by
//! [`ComparisonService`].

pub mod comparator;
pub mod comparison_service;
pub mod detail_differ;
pub mod events;
pub mod paginated_fetcher;
pub mod state;
pub mod sync_orchestrator;
pub mod sync_payload;

pub use comparison_service::{ComparisonService, EngineSettings};
pub use events::ChannelReporter;
pub use state::AppState;
