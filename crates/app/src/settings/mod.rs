pub mod state;

pub use state::{
    AssistantSettings, ProviderSettings, SettingsError, SettingsStore, WorkflowSettings,
};
