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

//! Extension manager actor.
//!
//! Serves the bridge's request channel from its own task. It only tracks
//! which names are installed and which are loaded; resolving and running
//! extension code is left to whatever embeds it.

use std::collections::{BTreeSet, HashMap};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::bridge::{ExtensionOp, ExtensionReply, ExtensionRequest};
use crate::engine_core::models::Registration;

#[derive(Debug, Default)]
pub struct ExtensionManager {
    installed: BTreeSet<String>,
    loaded: HashMap<String, Registration>,
}

impl ExtensionManager {
    pub fn new<I, S>(installed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            installed: installed.into_iter().map(Into::into).collect(),
            loaded: HashMap::new(),
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    pub fn load(&mut self, name: &str) -> Result<ExtensionReply, String> {
        if !self.installed.contains(name) {
            return Err(format!("Unknown extension: {}", name));
        }
        if self.loaded.contains_key(name) {
            return Ok(ExtensionReply::Status(format!(
                "Extension already loaded: {}",
                name
            )));
        }
        self.loaded
            .insert(name.to_string(), Registration::new(name));
        info!("Loaded extension {}", name);
        Ok(ExtensionReply::Status(format!("Loaded extension: {}", name)))
    }

    pub fn unload(&mut self, name: &str) -> Result<ExtensionReply, String> {
        match self.loaded.remove(name) {
            Some(_) => {
                info!("Unloaded extension {}", name);
                Ok(ExtensionReply::Status(format!("Unloaded extension: {}", name)))
            }
            None => Err(format!("Extension not loaded: {}", name)),
        }
    }

    pub fn query(&self, name: &str) -> ExtensionReply {
        ExtensionReply::Registration(self.loaded.get(name).cloned())
    }

    pub fn handle(&mut self, request: ExtensionRequest) {
        debug!("Serving extension call {} {:?} '{}'", request.id, request.op, request.name);
        let result = match request.op {
            ExtensionOp::Load => self.load(&request.name),
            ExtensionOp::Unload => self.unload(&request.name),
            ExtensionOp::Query => Ok(self.query(&request.name)),
        };
        request.respond(result);
    }

    /// Serve requests until every bridge handle is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<ExtensionRequest>) -> Self {
        while let Some(request) = rx.recv().await {
            self.handle(request);
        }
        debug!("Extension bridge closed, manager stopping");
        self
    }

    pub fn spawn(self, rx: mpsc::Receiver<ExtensionRequest>) -> JoinHandle<Self> {
        tokio::spawn(self.run(rx))
    }
}
