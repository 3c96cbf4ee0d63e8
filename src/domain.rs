//! Domain module - entities, comparison records and the ports of the engine
//!
//! Each submodule is its own file in the domain/ directory; commonly used
//! items are re-exported here.

pub mod comparison;
pub mod entities;
pub mod environment;
pub mod errors;
pub mod events;
pub mod mutations;
pub mod reports;
pub mod repositories;

pub use comparison::{ComparisonRecord, RecordStatus};
pub use entities::{BasicEntity, DetailedEntity, EntityKey, EntityKind, EntityPage};
pub use environment::{Environment, SyncDirection};
pub use errors::{EngineResult, FailureCategory, RemoteError, StoreError, SyncEngineError};
pub use events::{ProgressReporter, SilentReporter};
pub use mutations::{EntityInput, Mutation, MutationOutcome, UserError};
pub use reports::{CompareReport, KeyFailure, ProgressUpdate, SyncReport};
pub use repositories::{ComparisonStore, RemoteEntityClient};
