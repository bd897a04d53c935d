//! Environment drivers for LLM Rate Lens
//!
//! A driver prepares the runtime for one parameter combination, exposes the
//! endpoint URL and model name to probe, and cleans up afterwards. Drivers
//! are selected by name from the configuration file.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{error, info};

use crate::benchmarks::matrix::ParamSet;
use crate::error::DriverError;

/// Parameter naming the endpoint URL
pub const URL_PARAM: &str = "url";
/// Parameter naming the model
pub const MODEL_PARAM: &str = "model";
/// Parameter holding the setup shell command
pub const SETUP_CMD_PARAM: &str = "setup_cmd";
/// Parameter holding the teardown shell command
pub const TEARDOWN_CMD_PARAM: &str = "teardown_cmd";

/// Names accepted by [`create_driver`]
pub const DRIVER_NAMES: &[&str] = &["dummy", "local_cmd"];

/// Manages the LLM runtime environment around a benchmark run
#[async_trait]
pub trait Driver: Send {
    /// Driver name as written in the configuration
    fn name(&self) -> &'static str;

    /// Prepare the environment for the given parameter combination
    async fn setup(&mut self, params: &ParamSet) -> Result<(), DriverError>;

    /// Release whatever `setup` acquired
    async fn teardown(&mut self) -> Result<(), DriverError>;

    /// Endpoint URL resolved by the last `setup`
    fn url(&self) -> &str;

    /// Model name resolved by the last `setup`
    fn model(&self) -> &str;
}

/// Create a driver by configuration name
pub fn create_driver(kind: &str) -> Result<Box<dyn Driver>, DriverError> {
    match kind {
        "dummy" => Ok(Box::new(DummyDriver::new())),
        "local_cmd" => Ok(Box::new(LocalCmdDriver::new())),
        other => Err(DriverError::Unsupported(other.to_string())),
    }
}

/// Passes `url` and `model` through without touching the environment
#[derive(Debug, Default, Clone)]
pub struct DummyDriver {
    url: String,
    model: String,
}

impl DummyDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Driver for DummyDriver {
    fn name(&self) -> &'static str {
        "dummy"
    }

    async fn setup(&mut self, params: &ParamSet) -> Result<(), DriverError> {
        if let Some(url) = params.get(URL_PARAM) {
            self.url = url.clone();
        }
        if let Some(model) = params.get(MODEL_PARAM) {
            self.model = model.clone();
        }
        info!(driver = "dummy", url = %self.url, model = %self.model, "Driver setup completed");
        Ok(())
    }

    async fn teardown(&mut self) -> Result<(), DriverError> {
        info!(driver = "dummy", "Driver teardown completed (no-op)");
        Ok(())
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Runs `setup_cmd` / `teardown_cmd` through `sh -c`
///
/// Commands may reference any parameter as `{{.name}}`. When the trimmed
/// output of the setup command is an http(s) URL it replaces the `url`
/// parameter.
#[derive(Debug, Default, Clone)]
pub struct LocalCmdDriver {
    url: String,
    model: String,
    teardown_cmd: Option<String>,
}

impl LocalCmdDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Driver for LocalCmdDriver {
    fn name(&self) -> &'static str {
        "local_cmd"
    }

    async fn setup(&mut self, params: &ParamSet) -> Result<(), DriverError> {
        if let Some(url) = params.get(URL_PARAM).filter(|u| !u.is_empty()) {
            self.url = url.clone();
        }
        if let Some(model) = params.get(MODEL_PARAM).filter(|m| !m.is_empty()) {
            self.model = model.clone();
        }

        self.teardown_cmd = match params.get(TEARDOWN_CMD_PARAM).filter(|c| !c.is_empty()) {
            Some(template) => Some(interpolate(template, params)?),
            None => None,
        };

        let Some(template) = params.get(SETUP_CMD_PARAM).filter(|c| !c.is_empty()) else {
            return Ok(());
        };
        let command = interpolate(template, params)?;

        info!(driver = "local_cmd", command = %command, "Running setup command");
        let output = run_shell("setup", &command).await?;
        info!(driver = "local_cmd", "Setup command completed successfully");

        let trimmed = output.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            info!(driver = "local_cmd", url = %trimmed, "Using URL reported by setup command");
            self.url = trimmed.to_string();
        }

        Ok(())
    }

    async fn teardown(&mut self) -> Result<(), DriverError> {
        let Some(command) = self.teardown_cmd.take() else {
            return Ok(());
        };

        info!(driver = "local_cmd", command = %command, "Running teardown command");
        run_shell("teardown", &command).await?;
        info!(driver = "local_cmd", "Teardown command completed successfully");
        Ok(())
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// `{{.name}}` / `{{ .name }}`
static PLACEHOLDER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\{\{\s*\.(\w+)\s*\}\}").ok());

/// Substitute `{{.name}}` placeholders with parameter values
pub fn interpolate(template: &str, params: &ParamSet) -> Result<String, DriverError> {
    let placeholder = PLACEHOLDER
        .as_ref()
        .ok_or_else(|| DriverError::Template("placeholder pattern unavailable".to_string()))?;

    if let Some(unknown) = placeholder
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|key| !params.contains_key(key))
    {
        return Err(DriverError::Template(format!("unknown parameter {unknown:?}")));
    }

    if placeholder.replace_all(template, "").contains("{{") {
        return Err(DriverError::Template(format!(
            "malformed placeholder in {template:?}, expected {{{{.name}}}}"
        )));
    }

    Ok(placeholder
        .replace_all(template, |caps: &Captures| {
            params.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}

/// Run a command through `sh -c`, returning combined stdout and stderr
async fn run_shell(stage: &'static str, command: &str) -> Result<String, DriverError> {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .await
        .map_err(|source| DriverError::Spawn { stage, source })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        error!(stage, status = %output.status, output = %combined.trim(), "Driver command failed");
        return Err(DriverError::CommandFailed {
            stage,
            status: output.status.to_string(),
            output: combined.trim().to_string(),
        });
    }

    Ok(combined)
}
