#![deny(unsafe_code)]

/// Change notifications and render snapshots.
pub mod events;
/// Line-based command parsing and rendering.
pub mod presenter;
/// Settings persistence.
pub mod settings;
pub mod workflow;

pub use events::{Indicators, Snapshot, StoreEvent};
pub use workflow::{WorkflowCoordinator, WorkflowError, WorkflowResult};
