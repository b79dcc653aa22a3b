//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, the optional YAML settings file, and
//! the resolved configuration that a chat session starts from.

use std::path::{Path, PathBuf};

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::DEFAULT_ENDPOINT;
use crate::error::{Error, Result};

/// Model used when neither the command line nor the settings file names one.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Settings file read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "duologue.yaml";

/// Command-line arguments for the duologue tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Address of the inference server.
    #[arrrg(optional, "Inference server (default: http://localhost:11434/)", "URL")]
    pub endpoint: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: llama3.2)", "MODEL")]
    pub model: Option<String>,

    /// Path to the YAML settings file.
    #[arrrg(optional, "Settings file (default: ./duologue.yaml)", "PATH")]
    pub config: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings loaded from YAML.  Every key is optional.
///
/// ```yaml
/// system_prompt: You are a helpful assistant.
/// agent_prompt: You are a curious user asking follow-up questions.
/// autonomous: false
/// step: true
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    /// System prompt for the primary conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// System prompt for the agent persona in autonomous mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_prompt: Option<String>,

    /// Start in autonomous mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autonomous: Option<bool>,

    /// Pause after every autonomous round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<bool>,

    /// Model to start with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Inference server address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ConfigFile {
    /// Parses settings from YAML text.  Empty text yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads settings from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read {}", path.display()), err)
        })?;
        Self::from_yaml_str(&content)
    }

    /// Save settings to a YAML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)
            .map_err(|err| Error::io("failed to write settings file", err))
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the settings file with appropriate defaults.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Address of the inference server.
    pub endpoint: Url,

    /// The model to use for generating responses.
    pub model: String,

    /// System prompt of the primary conversation; `forget` restores it.
    pub system_prompt: String,

    /// System prompt of the agent conversation.
    pub agent_prompt: String,

    /// Whether the session starts in autonomous mode.
    pub autonomous: bool,

    /// Whether autonomous mode pauses after every round.
    pub step: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: http://localhost:11434/
    /// - Model: llama3.2
    /// - Prompts: empty
    /// - Autonomous and step mode: off
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: String::new(),
            agent_prompt: String::new(),
            autonomous: false,
            step: false,
            use_color: true,
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the agent prompt.
    pub fn with_agent_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.agent_prompt = prompt.into();
        self
    }

    /// Sets whether the session starts in autonomous mode.
    pub fn with_autonomous(mut self, autonomous: bool) -> Self {
        self.autonomous = autonomous;
        self
    }

    /// Sets whether autonomous mode pauses between rounds.
    pub fn with_step(mut self, step: bool) -> Self {
        self.step = step;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Applies settings from a file.  Values already set by the caller are overwritten.
    pub fn merge_file(mut self, file: ConfigFile, warnings: &mut Vec<String>) -> Self {
        if let Some(prompt) = file.system_prompt {
            self.system_prompt = prompt;
        }
        if let Some(prompt) = file.agent_prompt {
            self.agent_prompt = prompt;
        }
        if let Some(autonomous) = file.autonomous {
            self.autonomous = autonomous;
        }
        if let Some(step) = file.step {
            self.step = step;
        }
        if let Some(model) = file.model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint_or_default(&endpoint, warnings);
        }
        self
    }

    /// Resolves command-line arguments and the settings file into a configuration.
    ///
    /// Nothing here is fatal: problems are returned as warnings and defaults are used.
    /// Command-line values take precedence over the settings file.
    pub fn resolve(args: ChatArgs) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut config = ChatConfig::new();

        let (path, explicit) = match args.config {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if explicit || path.exists() {
            match ConfigFile::from_file(&path) {
                Ok(file) => config = config.merge_file(file, &mut warnings),
                Err(err) => warnings.push(format!(
                    "ignoring settings file {}: {err}",
                    path.display()
                )),
            }
        }

        if let Some(endpoint) = args.endpoint {
            config.endpoint = endpoint_or_default(&endpoint, &mut warnings);
        }
        if let Some(model) = args.model.filter(|m| !m.trim().is_empty()) {
            config.model = model;
        }
        if args.no_color {
            config.use_color = false;
        }
        (config, warnings)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses an endpoint address.
///
/// Only `http` and `https` URLs are accepted.  The path is given a trailing slash so that
/// route names join beneath it.
pub fn parse_endpoint(input: &str) -> Result<Url> {
    let mut url = Url::parse(input.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(
            format!("unsupported scheme '{}'", url.scheme()),
            Some("endpoint".to_string()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_endpoint() -> Url {
    // DEFAULT_ENDPOINT is a valid literal.
    Url::parse(DEFAULT_ENDPOINT).expect("default endpoint must parse")
}

fn endpoint_or_default(input: &str, warnings: &mut Vec<String>) -> Url {
    match parse_endpoint(input) {
        Ok(url) => url,
        Err(err) => {
            warnings.push(format!(
                "invalid endpoint '{input}' ({err}); using {DEFAULT_ENDPOINT}"
            ));
            default_endpoint()
        }
    }
}
