//! Configuration for a process to spawn.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{ProcessError, Result};

/// Everything needed to construct a [`ProcessHandle`](crate::ProcessHandle).
///
/// The environment is the child's complete environment; nothing from the
/// parent is inherited unless [`ProcessOptions::with_inherited_env`] is used.
///
/// # Example
///
/// ```rust
/// use process_kit::ProcessOptions;
///
/// let options = ProcessOptions::new("ls")
///     .with_arg("-l")
///     .with_env("LC_ALL", "C")
///     .with_capture_output(true);
/// assert_eq!(options.arguments, vec!["-l".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Executable name (searched on `PATH`) or path.
    pub executable: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default)]
    pub capture_output: bool,
}

impl ProcessOptions {
    /// Create options for the given executable with no arguments, an empty
    /// environment and capture disabled.
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Default::default()
        }
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProcessError::InvalidArgument(format!("invalid process options: {}", e)))
    }

    /// Append one argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set one environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables.
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Copy the parent's environment into the mapping.
    ///
    /// Variables already set are kept; non-Unicode variables are skipped.
    pub fn with_inherited_env(mut self) -> Self {
        for (key, value) in std::env::vars_os() {
            if let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) {
                self.environment.entry(key).or_insert(value);
            }
        }
        self
    }

    /// Enable or disable stdout/stderr capture.
    pub fn with_capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }
}
