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

//! Process boundary: exit and in-place restart.
//!
//! On Unix the running image is replaced with `exec`. Windows has no exec,
//! so a fresh copy is spawned with pre-quoted arguments and this one exits.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::{error, info};

use crate::engine_core::errors::OperError;
use crate::engine_core::traits::ProcessControl;

/// How this process was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    /// Original arguments, byte for byte, without argv[0]
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new<I, A>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Capture the current executable and its arguments (without argv[0]).
    pub fn current() -> Result<Self, OperError> {
        let program = std::env::current_exe().map_err(|e| {
            OperError::ProcessError(format!("Failed to get current executable path: {}", e))
        })?;
        Ok(Self::new(program, std::env::args_os().skip(1)))
    }

    /// Arguments rendered for the host environment.
    pub fn host_args(&self) -> Vec<OsString> {
        quote_args(&self.args, cfg!(windows))
    }
}

/// Wrap every argument in double quotes when the host needs it (Windows),
/// so paths containing spaces survive the command line round trip.
pub fn quote_args(args: &[OsString], windows: bool) -> Vec<OsString> {
    if windows {
        args.iter()
            .map(|a| {
                let mut quoted = OsString::with_capacity(a.len() + 2);
                quoted.push("\"");
                quoted.push(a);
                quoted.push("\"");
                quoted
            })
            .collect()
    } else {
        args.to_vec()
    }
}

/// The real process boundary
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcess;

impl ProcessControl for SystemProcess {
    fn exit(&self, code: i32) -> Result<(), OperError> {
        info!("Exiting with status {}", code);
        std::process::exit(code)
    }

    fn restart(&self, invocation: &Invocation) -> Result<(), OperError> {
        info!(
            "Restarting... Program: {} Args: {:?}",
            invocation.program.display(),
            invocation.host_args()
        );

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // exec only returns on failure
            let err = Command::new(&invocation.program)
                .args(&invocation.args)
                .exec();
            error!("exec failed: {}", err);
            Err(OperError::ProcessError(format!("exec failed: {}", err)))
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            let mut command = Command::new(&invocation.program);
            for arg in invocation.host_args() {
                command.raw_arg(arg);
            }
            command.spawn().map_err(|e| {
                error!("spawn failed: {}", e);
                OperError::ProcessError(format!("Failed to spawn replacement process: {}", e))
            })?;
            std::process::exit(0)
        }

        #[cfg(not(any(unix, windows)))]
        {
            let _ = Command::new(&invocation.program);
            Err(OperError::ProcessError(
                "Restart is not supported on this platform".to_string(),
            ))
        }
    }
}
