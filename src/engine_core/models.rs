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

//! Domain models for the operator control plane.
//!
//! This module contains pure data structures representing principals,
//! privileged requests and extension registrations. It is free of I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

use crate::engine_core::constants::modes;

/// Newtype wrapper around Uuid identifying one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random ConnectionId
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for ConnectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(ConnectionId)
    }
}

impl From<ConnectionId> for String {
    fn from(id: ConnectionId) -> Self {
        id.0.to_string()
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = uuid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Uuid::parse_str(&s).map(ConnectionId)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected session as seen by the control plane.
///
/// The registry owns principals; the control plane only reads them and,
/// after a successful OPER, persists a copy carrying the operator mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub connection: ConnectionId,
    pub address: IpAddr,
    pub nick: String,
    pub user: String,
    pub host: String,
    pub modes: BTreeSet<char>,
}

impl Principal {
    pub fn new(
        connection: ConnectionId,
        address: IpAddr,
        nick: impl Into<String>,
        user: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            address,
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
            modes: BTreeSet::new(),
        }
    }

    /// Full origin string matched against credential patterns (`user@host`).
    pub fn origin(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Message prefix (`nick!user@host`).
    pub fn prefix(&self) -> String {
        format!("{}!{}@{}", self.nick, self.user, self.host)
    }

    pub fn is_operator(&self) -> bool {
        self.modes.contains(&modes::OPERATOR)
    }

    /// Grant the operator mode. Returns false if it was already set.
    pub fn elevate(&mut self) -> bool {
        self.modes.insert(modes::OPERATOR)
    }

    /// Drop the operator mode. Returns false if it was not set.
    pub fn demote(&mut self) -> bool {
        self.modes.remove(&modes::OPERATOR)
    }

    /// Mode string in `+abc` form, empty when no modes are set.
    pub fn mode_string(&self) -> String {
        if self.modes.is_empty() {
            String::new()
        } else {
            std::iter::once('+').chain(self.modes.iter().copied()).collect()
        }
    }
}

/// One of the fixed set of privileged operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperCommand {
    Oper { name: String, secret: String },
    Load { name: String },
    Unload { name: String },
    Reload { name: String },
    Die,
    Restart,
    Kill { target: String, reason: Option<String> },
    Rehash,
}

impl OperCommand {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        use crate::engine_core::constants::commands;
        match self {
            Self::Oper { .. } => commands::OPER,
            Self::Load { .. } => commands::LOAD,
            Self::Unload { .. } => commands::UNLOAD,
            Self::Reload { .. } => commands::RELOAD,
            Self::Die => commands::DIE,
            Self::Restart => commands::RESTART,
            Self::Kill { .. } => commands::KILL,
            Self::Rehash => commands::REHASH,
        }
    }

    /// Every command except OPER requires the caller to already be an operator.
    pub fn requires_operator(&self) -> bool {
        !matches!(self, Self::Oper { .. })
    }
}

/// A decoded privileged request, alive for the duration of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedRequest {
    pub connection: ConnectionId,
    /// Prefix the line arrived with, if any
    pub source: Option<String>,
    pub command: OperCommand,
}

/// Status text returned by the extension manager for load/unload
pub type StatusText = String;

/// Registration of a loaded extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub loaded_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loaded_at: Utc::now(),
        }
    }
}
