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

//! Recording fakes shared by the integration tests.
//!
//! Every collaborator appends to one journal so tests can assert on the
//! relative order of side effects across subsystems.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use opsgate::config::{Config, YamlConfig};
use opsgate::engine::dispatcher::{Collaborators, OperDispatcher};
use opsgate::engine_core::errors::OperError;
use opsgate::engine_core::events::ControlEvent;
use opsgate::engine_core::models::{ConnectionId, Principal, Registration, StatusText};
use opsgate::engine_core::traits::{
    ConfigSource, ConnectionControl, ExtensionControl, ProcessControl, SessionRegistry,
};
use opsgate::lifecycle::process::Invocation;
use opsgate::protocol::replies::Message;
use opsgate::runtime::registry::InMemoryRegistry;

pub const SERVER: &str = "irc.test";

pub const OLINES: &str = r#"
admin:
  olines:
    - pattern: "*@*.admin.example.com"
      name: root
      password: hunter2
    - pattern: "ops@10.0.*"
      name: netops
      password: s3cret
"#;

/// Ordered record of every side effect
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries().iter().any(|e| e.starts_with(prefix))
    }
}

pub struct RecordingConnections {
    journal: Journal,
    sent: Mutex<Vec<(ConnectionId, String)>>,
    closed: Mutex<Vec<ConnectionId>>,
    pub fail_close_all: bool,
}

impl RecordingConnections {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            fail_close_all: false,
        }
    }

    /// Rendered lines sent to `connection`, in order.
    pub fn sent_to(&self, connection: ConnectionId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| *c == connection)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn closed(&self) -> Vec<ConnectionId> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionControl for RecordingConnections {
    async fn send(&self, connection: ConnectionId, message: Message) -> Result<(), OperError> {
        let line = message.to_string();
        self.journal.push(format!("send {}", line));
        self.sent.lock().unwrap().push((connection, line));
        Ok(())
    }

    async fn close(&self, connection: ConnectionId) -> Result<(), OperError> {
        self.journal.push(format!("close {}", connection));
        self.closed.lock().unwrap().push(connection);
        Ok(())
    }

    async fn close_all(&self) -> Result<(), OperError> {
        self.journal.push("close_all");
        if self.fail_close_all {
            return Err(OperError::ConnectionError("listener stuck".to_string()));
        }
        Ok(())
    }
}

pub struct RecordingExtensions {
    journal: Journal,
    loaded: Mutex<BTreeSet<String>>,
    pub fail_unload: bool,
    pub hang_unload: bool,
    pub fail_query: bool,
}

impl RecordingExtensions {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            loaded: Mutex::new(BTreeSet::new()),
            fail_unload: false,
            hang_unload: false,
            fail_query: false,
        }
    }

    pub fn preload(&self, name: &str) {
        self.loaded.lock().unwrap().insert(name.to_string());
    }
}

#[async_trait]
impl ExtensionControl for RecordingExtensions {
    async fn load(&self, name: &str) -> Result<StatusText, OperError> {
        self.journal.push(format!("load {}", name));
        self.loaded.lock().unwrap().insert(name.to_string());
        Ok(format!("Loaded extension: {}", name))
    }

    async fn unload(&self, name: &str) -> Result<StatusText, OperError> {
        self.journal.push(format!("unload {}", name));
        if self.hang_unload {
            std::future::pending::<()>().await;
        }
        if self.fail_unload {
            return Err(OperError::ExtensionError(format!(
                "Extension is busy: {}",
                name
            )));
        }
        self.loaded.lock().unwrap().remove(name);
        Ok(format!("Unloaded extension: {}", name))
    }

    async fn query(&self, name: &str) -> Result<Option<Registration>, OperError> {
        self.journal.push(format!("query {}", name));
        if self.fail_query {
            return Err(OperError::ExtensionError(
                "Extension manager is not running".to_string(),
            ));
        }
        Ok(self
            .loaded
            .lock()
            .unwrap()
            .contains(name)
            .then(|| Registration::new(name)))
    }
}

pub struct RecordingProcess {
    journal: Journal,
}

impl RecordingProcess {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl ProcessControl for RecordingProcess {
    fn exit(&self, code: i32) -> Result<(), OperError> {
        self.journal.push(format!("exit {}", code));
        Ok(())
    }

    fn restart(&self, invocation: &Invocation) -> Result<(), OperError> {
        self.journal
            .push(format!("restart {}", invocation.program.display()));
        Ok(())
    }
}

pub struct Harness {
    pub dispatcher: OperDispatcher,
    pub registry: Arc<InMemoryRegistry>,
    pub connections: Arc<RecordingConnections>,
    pub extensions: Arc<RecordingExtensions>,
    pub journal: Journal,
    pub events: broadcast::Receiver<ControlEvent>,
}

pub struct Builder {
    config: Arc<dyn ConfigSource>,
    settings: Config,
    fail_close_all: bool,
    fail_unload: bool,
    hang_unload: bool,
    fail_query: bool,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            config: Arc::new(YamlConfig::from_yaml_str(OLINES).unwrap()),
            settings: Config {
                server_name: SERVER.to_string(),
                ..Config::default()
            },
            fail_close_all: false,
            fail_unload: false,
            hang_unload: false,
            fail_query: false,
        }
    }

    pub fn config(mut self, config: Arc<dyn ConfigSource>) -> Self {
        self.config = config;
        self
    }

    pub fn settings(mut self, f: impl FnOnce(&mut Config)) -> Self {
        f(&mut self.settings);
        self
    }

    pub fn failing_close_all(mut self) -> Self {
        self.fail_close_all = true;
        self
    }

    pub fn failing_unload(mut self) -> Self {
        self.fail_unload = true;
        self
    }

    /// Unload never completes; pair with a call timeout.
    pub fn hanging_unload(mut self) -> Self {
        self.hang_unload = true;
        self
    }

    pub fn failing_query(mut self) -> Self {
        self.fail_query = true;
        self
    }

    pub async fn build(self) -> Harness {
        let journal = Journal::default();
        let registry = Arc::new(InMemoryRegistry::new());
        let mut connections = RecordingConnections::new(journal.clone());
        connections.fail_close_all = self.fail_close_all;
        let connections = Arc::new(connections);
        let mut extensions = RecordingExtensions::new(journal.clone());
        extensions.fail_unload = self.fail_unload;
        extensions.hang_unload = self.hang_unload;
        extensions.fail_query = self.fail_query;
        let extensions = Arc::new(extensions);
        let (tx, events) = broadcast::channel(16);

        let dispatcher = OperDispatcher::new(
            &self.settings,
            Collaborators {
                registry: registry.clone(),
                extensions: extensions.clone(),
                connections: connections.clone(),
                config: self.config,
                events: Arc::new(tx),
                process: Arc::new(RecordingProcess::new(journal.clone())),
            },
            Invocation::new("/usr/local/bin/opsgate", ["--config"]),
        )
        .await
        .expect("dispatcher should initialize");

        Harness {
            dispatcher,
            registry,
            connections,
            extensions,
            journal,
            events,
        }
    }
}

impl Harness {
    pub async fn connect(&self, nick: &str, user: &str, host: &str) -> Principal {
        let principal = Principal::new(
            ConnectionId::generate(),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
            nick,
            user,
            host,
        );
        self.registry.register(principal.clone()).await;
        principal
    }

    /// Connect a session that already carries the operator mode.
    pub async fn connect_operator(&self, nick: &str) -> Principal {
        let mut principal = self.connect(nick, nick, "ops.admin.example.com").await;
        principal.elevate();
        self.registry.persist(principal.clone()).await.unwrap();
        principal
    }

    /// Feed one raw line from `principal` and wait for its handler to finish.
    pub async fn run(&self, principal: &Principal, raw: &str) {
        if let Some(handle) = self
            .dispatcher
            .handle_line(principal.connection, raw)
            .await
            .unwrap()
        {
            handle.await.unwrap();
        }
    }

    pub async fn reload(&self, principal: &Principal) -> Principal {
        self.registry
            .find_by_connection(principal.connection)
            .await
            .unwrap()
            .unwrap()
    }

    pub fn sent_to(&self, principal: &Principal) -> Vec<String> {
        self.connections.sent_to(principal.connection)
    }
}
