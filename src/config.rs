//! Server configuration
//!
//! Loaded from an optional TOML file. Every field has a default, so an
//! empty file (or no file) yields a working configuration.

use std::fs;

use serde::Deserialize;

use crate::error::AppError;

/// Runtime settings for the listener, the actor and each connection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the TCP listener binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Capacity of the handler → ChatServer command channel
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
    /// Capacity of each client's outbound channel. A client that falls
    /// this far behind starts missing messages.
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,
    /// Longest accepted input line in bytes
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_command_buffer() -> usize {
    256
}

fn default_client_buffer() -> usize {
    32
}

fn default_max_line_length() -> usize {
    4096
}

fn default_log_filter() -> String {
    "whisper_chat=info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            command_buffer: default_command_buffer(),
            client_buffer: default_client_buffer(),
            max_line_length: default_max_line_length(),
            log_filter: default_log_filter(),
        }
    }
}

impl ServerConfig {
    /// Read and validate a TOML config file
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let contents = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, AppError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make channels or framing unusable
    pub fn validate(&self) -> Result<(), AppError> {
        if self.command_buffer == 0 {
            return Err(AppError::InvalidConfig(
                "command_buffer must be greater than 0".to_string(),
            ));
        }
        if self.client_buffer == 0 {
            return Err(AppError::InvalidConfig(
                "client_buffer must be greater than 0".to_string(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(AppError::InvalidConfig(
                "max_line_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
