use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use langai_llm::{DEFAULT_OPENAI_MODEL, LanguageCode, ProviderConfig, SummarizeOptions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use snafu::{ResultExt, Snafu};

use crate::workflow::{StaleResultPolicy, SummarizePolicy};

pub const DEFAULT_PROVIDER_ID: &str = "openai";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const SETTINGS_DIRECTORY_NAME: &str = "langai";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ENV_PREFIX: &str = "LANGAI_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_id: default_provider_id(),
            api_key: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
        }
    }
}

impl ProviderSettings {
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(&self.provider_id, &self.api_key, &self.endpoint, &self.model)
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn normalized(mut self) -> Self {
        self.provider_id = if self.provider_id.trim().is_empty() {
            default_provider_id()
        } else {
            self.provider_id.trim().to_string()
        };
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = if self.endpoint.trim().is_empty() {
            default_endpoint()
        } else {
            self.endpoint.trim().to_string()
        };
        self.model = if self.model.trim().is_empty() {
            default_model()
        } else {
            self.model.trim().to_string()
        };
        self
    }
}

/// Behaviour of the message workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default = "LanguageCode::default_target")]
    pub default_target_language: LanguageCode,
    #[serde(default)]
    pub summarize: SummarizePolicy,
    #[serde(default)]
    pub summary_options: SummarizeOptions,
    #[serde(default)]
    pub stale_results: StaleResultPolicy,
    /// Create the translator for (detected, target) as soon as detection succeeds.
    #[serde(default = "default_prewarm_translator")]
    pub prewarm_translator: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            default_target_language: LanguageCode::default_target(),
            summarize: SummarizePolicy::default(),
            summary_options: SummarizeOptions::default(),
            stale_results: StaleResultPolicy::default(),
            prewarm_translator: default_prewarm_translator(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub workflow: WorkflowSettings,
}

impl AssistantSettings {
    pub fn normalized(mut self) -> Self {
        self.provider = self.provider.normalized();
        self
    }

    /// Defaults, then the JSON file, then `LANGAI_*` variables (`__` separates
    /// nested keys), then `OPENAI_API_KEY` when no key was configured.
    pub fn figment(path: &Path) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let has_key = figment
            .extract_inner::<String>("provider.api_key")
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false);
        if has_key {
            figment
        } else {
            figment.merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "provider.api_key".into()),
            )
        }
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<AssistantSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".langai"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<AssistantSettings> {
        self.settings.load_full()
    }

    /// Saves `workflow` into the settings file and swaps it in.
    ///
    /// Only the `workflow` section of the file is rewritten; the provider section
    /// stays as the user wrote it, so keys supplied through the environment are
    /// never written to disk.
    pub fn update_workflow(&self, workflow: WorkflowSettings) -> Result<(), SettingsError> {
        self.persist_workflow(&workflow)?;
        let current = self.settings();
        self.settings.store(Arc::new(AssistantSettings {
            provider: current.provider.clone(),
            workflow,
        }));
        Ok(())
    }

    fn load_from(path: &Path) -> AssistantSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        match AssistantSettings::figment(path).extract::<AssistantSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                AssistantSettings::default()
            }
        }
    }

    fn persist_workflow(&self, workflow: &WorkflowSettings) -> Result<(), SettingsError> {
        let path = &self.config_path;
        let mut document = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<Value>(&content).context(ParseExistingSnafu {
                stage: "parse-existing-settings",
                path: path.clone(),
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
            Err(source) => {
                return Err(SettingsError::ReadFile {
                    stage: "read-existing-settings",
                    path: path.clone(),
                    source,
                });
            }
        };

        let section = serde_json::to_value(workflow).context(SerializeConfigSnafu {
            stage: "serialize-workflow-settings",
        })?;
        match document.as_object_mut() {
            Some(sections) => {
                sections.insert("workflow".to_string(), section);
            }
            None => document = json!({ "workflow": section }),
        }
        let content = serde_json::to_string_pretty(&document).context(SerializeConfigSnafu {
            stage: "serialize-settings-document",
        })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        // Write next to the target and rename so readers never see a partial file.
        let staged = path.with_extension("json.tmp");
        std::fs::write(&staged, content).context(WriteFileSnafu {
            stage: "write-staged-settings",
            path: staged.clone(),
        })?;
        std::fs::rename(&staged, path).context(RenameTempFileSnafu {
            stage: "replace-settings-file",
            from: staged,
            to: path.clone(),
        })?;

        tracing::info!(path = ?path, "saved workflow settings");
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to read settings file at {path:?} on `{stage}`: {source}"))]
    ReadFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("settings file at {path:?} is not valid JSON on `{stage}`: {source}"))]
    ParseExisting {
        stage: &'static str,
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn default_provider_id() -> String {
    DEFAULT_PROVIDER_ID.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_OPENAI_MODEL.to_string()
}

fn default_prewarm_translator() -> bool {
    true
}
