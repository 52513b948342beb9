//! Reconciling extracted records against the store

mod orchestrator;

pub use orchestrator::{find_or_create_location, AvailabilityReport, SyncOrchestrator};
