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

//! Decoding of inbound lines into privileged commands.
//!
//! Only the fixed operator vocabulary is recognised here. Anything else is
//! left for the rest of the server and decodes to `None`.

use crate::engine_core::constants::commands;
use crate::engine_core::errors::OperError;
use crate::engine_core::models::OperCommand;
use crate::protocol::replies::Reply;

/// A tokenized protocol line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Line {
    pub fn parse(raw: &str) -> Result<Self, OperError> {
        let mut rest = raw.trim_end_matches(&['\r', '\n'][..]).trim_start();

        let prefix = match rest.strip_prefix(':') {
            Some(after) => {
                let (prefix, tail) = after.split_once(' ').ok_or_else(|| {
                    OperError::ProtocolError("prefix without command".to_string())
                })?;
                rest = tail.trim_start();
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, mut tail) = match rest.split_once(' ') {
            Some((c, t)) => (c, t),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(OperError::ProtocolError("empty command".to_string()));
        }

        let mut params = Vec::new();
        loop {
            tail = tail.trim_start_matches(' ');
            if tail.is_empty() {
                break;
            }
            if let Some(trailing) = tail.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match tail.split_once(' ') {
                Some((p, t)) => {
                    params.push(p.to_string());
                    tail = t;
                }
                None => {
                    params.push(tail.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Decode into an operator command.
    ///
    /// `Ok(None)` means the line is not a privileged command. `Err` carries
    /// the reply to send when a privileged command lacks parameters.
    pub fn decode(&self) -> Result<Option<OperCommand>, Reply> {
        let arg = |i: usize| -> Result<String, Reply> {
            self.params
                .get(i)
                .filter(|p| !p.is_empty())
                .cloned()
                .ok_or_else(|| Reply::NeedMoreParams(self.command.clone()))
        };
        // Names and nicks are echoed back as middle params, so they must be single tokens.
        let target = |i: usize| -> Result<String, Reply> {
            let value = arg(i)?;
            if value.contains(' ') || value.starts_with(':') {
                return Err(Reply::NeedMoreParams(self.command.clone()));
            }
            Ok(value)
        };

        let command = match self.command.as_str() {
            commands::OPER => OperCommand::Oper {
                name: arg(0)?,
                secret: arg(1)?,
            },
            commands::LOAD => OperCommand::Load { name: target(0)? },
            commands::UNLOAD => OperCommand::Unload { name: target(0)? },
            commands::RELOAD => OperCommand::Reload { name: target(0)? },
            commands::DIE => OperCommand::Die,
            commands::RESTART => OperCommand::Restart,
            commands::KILL => OperCommand::Kill {
                target: target(0)?,
                reason: self.params.get(1).filter(|r| !r.is_empty()).cloned(),
            },
            commands::REHASH => OperCommand::Rehash,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}
