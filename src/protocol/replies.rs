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

//! Reply vocabulary and wire formatting.
//!
//! `Reply` is the symbolic signal the dispatcher produces; `Message` is the
//! line that goes out on a transport. `ReplyEmitter` ties the two to the
//! connection subsystem.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::engine_core::constants::{notices, numerics};
use crate::engine_core::errors::OperError;
use crate::engine_core::models::{ConnectionId, Principal};
use crate::engine_core::traits::ConnectionControl;

/// One protocol line: `[:prefix] COMMAND params... [:trailing]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    pub fn new(prefix: Option<&str>, command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            command: command.into(),
            params,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;

        if let Some((last, rest)) = self.params.split_last() {
            for p in rest {
                write!(f, " {}", clean(p))?;
            }
            let last = clean(last);
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}

/// Drop characters that would end or corrupt a frame.
fn clean(param: &str) -> Cow<'_, str> {
    if param.contains(&['\r', '\n', '\0'][..]) {
        Cow::Owned(
            param
                .chars()
                .filter(|c| !matches!(c, '\r' | '\n' | '\0'))
                .collect(),
        )
    } else {
        Cow::Borrowed(param)
    }
}

/// Symbolic replies emitted by the control plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    NoSuchNick(String),
    /// `ERROR` frame sent to a transport before it is torn down
    Error { host: String, reason: String },
    NoOperatorHost,
    NoPrivileges,
    PasswordMismatch,
    YouAreOperator,
    Notice { target: String, text: String },
    NeedMoreParams(String),
}

impl Reply {
    /// Server notice addressed to `*`
    pub fn notice(text: impl Into<String>) -> Self {
        Self::Notice {
            target: notices::NOTICE_TARGET.to_string(),
            text: text.into(),
        }
    }

    pub fn numeric(&self) -> Option<u16> {
        match self {
            Self::NoSuchNick(_) => Some(numerics::ERR_NOSUCHNICK),
            Self::NoOperatorHost => Some(numerics::ERR_NOOPERHOST),
            Self::NoPrivileges => Some(numerics::ERR_NOPRIVILEGES),
            Self::PasswordMismatch => Some(numerics::ERR_PASSWDMISMATCH),
            Self::YouAreOperator => Some(numerics::RPL_YOUREOPER),
            Self::NeedMoreParams(_) => Some(numerics::ERR_NEEDMOREPARAMS),
            Self::Error { .. } | Self::Notice { .. } => None,
        }
    }

    /// Render for a recipient known by `nick`, sent from `server`.
    pub fn to_message(&self, server: &str, nick: &str) -> Message {
        let numeric = |params: Vec<String>| {
            let code = format!("{:03}", self.numeric().unwrap_or_default());
            let mut all = vec![nick.to_string()];
            all.extend(params);
            Message::new(Some(server), code, all)
        };

        match self {
            Self::NoSuchNick(target) => {
                numeric(vec![target.clone(), "No such nick/channel".to_string()])
            }
            Self::Error { host, reason } => Message::new(
                None,
                "ERROR",
                vec![format!("Closing Link: {} ({})", host, reason)],
            ),
            Self::NoOperatorHost => numeric(vec!["No O-lines for your host".to_string()]),
            Self::NoPrivileges => numeric(vec![
                "Permission Denied- You're not an IRC operator".to_string(),
            ]),
            Self::PasswordMismatch => numeric(vec!["Password incorrect".to_string()]),
            Self::YouAreOperator => numeric(vec!["You are now an IRC operator".to_string()]),
            Self::NeedMoreParams(command) => {
                numeric(vec![command.clone(), "Not enough parameters".to_string()])
            }
            Self::Notice { target, text } => {
                Message::new(Some(server), "NOTICE", vec![target.clone(), text.clone()])
            }
        }
    }
}

/// Formats replies and hands them to the connection subsystem.
#[derive(Clone)]
pub struct ReplyEmitter {
    server_name: Arc<str>,
    connections: Arc<dyn ConnectionControl>,
}

impl ReplyEmitter {
    pub fn new(server_name: &str, connections: Arc<dyn ConnectionControl>) -> Self {
        Self {
            server_name: Arc::from(server_name),
            connections,
        }
    }

    pub async fn emit(&self, to: &Principal, reply: Reply) -> Result<(), OperError> {
        self.emit_to(to.connection, &to.nick, reply).await
    }

    pub async fn emit_to(
        &self,
        connection: ConnectionId,
        nick: &str,
        reply: Reply,
    ) -> Result<(), OperError> {
        let message = reply.to_message(&self.server_name, nick);
        debug!("-> {}: {}", connection, message);
        self.connections.send(connection, message).await
    }
}
