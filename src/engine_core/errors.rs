// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Domain error types - no secrets or internal paths leak through user_message()

use thiserror::Error;

use crate::engine_core::models::ConnectionId;

/// Main error type for the control plane
#[derive(Error, Debug)]
pub enum OperError {
    /// Configuration could not be loaded or is malformed
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Extension manager returned an error or went away
    #[error("Extension error: {0}")]
    ExtensionError(String),

    /// Connection subsystem failure
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Session registry failure
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// The request came from a connection the registry does not know
    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// Process exit or image replacement failed
    #[error("Process error: {0}")]
    ProcessError(String),

    /// An asynchronous sub-call exceeded the configured bound
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// Malformed inbound line
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// I/O Error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),
}

impl OperError {
    /// Get user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            OperError::ConfigurationError(_) => "Configuration error".to_string(),
            OperError::ExtensionError(reason) => reason.clone(),
            OperError::ConnectionError(_) => "Connection subsystem unavailable".to_string(),
            OperError::RegistryError(_) => "Session registry unavailable".to_string(),
            OperError::UnknownConnection(_) => "Unknown connection".to_string(),
            OperError::ProcessError(_) => "Internal process error".to_string(),
            OperError::Timeout(what) => format!("Timed out waiting for {}", what),
            OperError::ProtocolError(reason) => format!("Protocol error: {}", reason),
            OperError::IoError(_) => "Internal system error".to_string(),
            OperError::YamlError(_) => "Configuration error".to_string(),
        }
    }
}
