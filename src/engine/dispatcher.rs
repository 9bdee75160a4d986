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

//! Command Dispatcher.
//!
//! Entry point for privileged requests. Resolves the caller, gates on the
//! operator mode, and runs the handler for the command. Handlers that talk
//! to the extension manager await each sub-call in turn, so replies for one
//! command always go out in issuance order. Each request runs as its own
//! task; a suspended handler never holds up other requests.

use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::engine::matcher::{CredentialStore, CredentialTable};
use crate::engine_core::audit::AuditLogger;
use crate::engine_core::constants::{config as keys, notices};
use crate::engine_core::errors::OperError;
use crate::engine_core::events::ControlEvent;
use crate::engine_core::models::{ConnectionId, OperCommand, Principal, PrivilegedRequest};
use crate::engine_core::traits::{
    ConfigSource, ConnectionControl, EventSink, ExtensionControl, ProcessControl, SessionRegistry,
};
use crate::lifecycle::coordinator::LifecycleCoordinator;
use crate::lifecycle::process::Invocation;
use crate::protocol::command::Line;
use crate::protocol::replies::{Reply, ReplyEmitter};

/// External subsystems the dispatcher is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn SessionRegistry>,
    pub extensions: Arc<dyn ExtensionControl>,
    pub connections: Arc<dyn ConnectionControl>,
    pub config: Arc<dyn ConfigSource>,
    pub events: Arc<dyn EventSink>,
    pub process: Arc<dyn ProcessControl>,
}

#[derive(Clone)]
pub struct OperDispatcher {
    registry: Arc<dyn SessionRegistry>,
    extensions: Arc<dyn ExtensionControl>,
    config: Arc<dyn ConfigSource>,
    events: Arc<dyn EventSink>,
    emitter: ReplyEmitter,
    lifecycle: LifecycleCoordinator,
    credentials: CredentialStore,
    audit: Arc<AuditLogger>,
    call_timeout: Option<Duration>,
}

impl OperDispatcher {
    /// Wire the dispatcher and load the initial credential table.
    pub async fn new(
        settings: &Config,
        collaborators: Collaborators,
        invocation: Invocation,
    ) -> Result<Self, OperError> {
        let table = load_credentials(collaborators.config.as_ref()).await?;
        info!("Loaded {} O-line(s)", table.len());

        let emitter = ReplyEmitter::new(&settings.server_name, collaborators.connections.clone());
        let lifecycle = LifecycleCoordinator::new(
            collaborators.connections,
            collaborators.events.clone(),
            collaborators.process,
            emitter.clone(),
            invocation,
            settings.kill_close_delay(),
        );

        Ok(Self {
            registry: collaborators.registry,
            extensions: collaborators.extensions,
            config: collaborators.config,
            events: collaborators.events,
            emitter,
            lifecycle,
            credentials: CredentialStore::new(table),
            audit: Arc::new(AuditLogger::default()),
            call_timeout: settings.call_timeout(),
        })
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Decode a raw line and, if it is a privileged command, start handling it.
    ///
    /// Returns the handle of the spawned task, or `None` when the line is not
    /// ours or was answered immediately.
    pub async fn handle_line(
        &self,
        connection: ConnectionId,
        raw: &str,
    ) -> Result<Option<JoinHandle<()>>, OperError> {
        let line = Line::parse(raw)?;
        match line.decode() {
            Ok(Some(command)) => Ok(Some(self.spawn(PrivilegedRequest {
                connection,
                source: line.prefix,
                command,
            }))),
            Ok(None) => {
                debug!("Ignoring non-privileged command {}", line.command);
                Ok(None)
            }
            Err(reply) => {
                let principal = self.caller(connection).await?;
                self.emitter.emit(&principal, reply).await?;
                Ok(None)
            }
        }
    }

    /// Run one request as an independent task.
    pub fn spawn(&self, request: PrivilegedRequest) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let command = request.command.name();
            if let Err(e) = this.dispatch(request).await {
                error!("{} failed: {}", command, e);
            }
        })
    }

    /// Handle one request to completion.
    pub async fn dispatch(&self, request: PrivilegedRequest) -> Result<(), OperError> {
        let principal = self.caller(request.connection).await?;
        debug!("{} from {}", request.command.name(), principal.prefix());

        if request.command.requires_operator() && !principal.is_operator() {
            warn!(
                "{} denied for non-operator {}",
                request.command.name(),
                principal.prefix()
            );
            self.audit.log(
                &principal.prefix(),
                "Denied",
                json!({ "command": request.command.name(), "reason": "not an operator" }),
            );
            return self.emitter.emit(&principal, Reply::NoPrivileges).await;
        }

        match request.command {
            OperCommand::Oper { name, secret } => self.oper(principal, &name, &secret).await,
            OperCommand::Load { name } => self.load(&principal, &name).await,
            OperCommand::Unload { name } => self.unload(&principal, &name).await,
            OperCommand::Reload { name } => self.reload(&principal, &name).await,
            OperCommand::Die => self.die(&principal),
            OperCommand::Restart => self.restart(&principal).await,
            OperCommand::Kill { target, reason } => {
                self.kill(&principal, &target, reason.as_deref())
                    .await
                    .map(|_| ())
            }
            OperCommand::Rehash => self.rehash(&principal).await,
        }
    }

    async fn caller(&self, connection: ConnectionId) -> Result<Principal, OperError> {
        self.registry
            .find_by_connection(connection)
            .await?
            .ok_or(OperError::UnknownConnection(connection))
    }

    async fn oper(&self, mut principal: Principal, name: &str, secret: &str) -> Result<(), OperError> {
        if principal.is_operator() {
            debug!("{} is already an operator", principal.nick);
            return Ok(());
        }

        let table = self.credentials.current();
        let reply = match table.lookup(&principal.origin()) {
            None => {
                warn!("OPER from {}: no O-line for host", principal.prefix());
                Reply::NoOperatorHost
            }
            Some(entry) if entry.accepts(name, secret) => {
                principal.elevate();
                self.registry.persist(principal.clone()).await?;
                info!("{} is now an operator ({})", principal.prefix(), name);
                Reply::YouAreOperator
            }
            Some(_) => {
                warn!("OPER from {}: credential mismatch", principal.prefix());
                Reply::PasswordMismatch
            }
        };

        let outcome = match reply {
            Reply::YouAreOperator => "granted",
            Reply::PasswordMismatch => "password_mismatch",
            _ => "no_oper_host",
        };
        self.audit.log(
            &principal.prefix(),
            "Oper",
            json!({ "name": name, "result": outcome }),
        );

        self.emitter.emit(&principal, reply).await
    }

    /// Await an extension call, bounded by the configured timeout if any.
    async fn call<T>(
        &self,
        what: &str,
        fut: impl Future<Output = Result<T, OperError>>,
    ) -> Result<T, OperError> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| OperError::Timeout(what.to_string()))?,
            None => fut.await,
        }
    }

    /// Status text of a completed load/unload, or the failure text.
    fn status_text(result: Result<String, OperError>) -> String {
        match result {
            Ok(status) => status,
            Err(e) => {
                warn!("Extension call failed: {}", e);
                e.user_message()
            }
        }
    }

    async fn notice(&self, to: &Principal, text: impl Into<String>) -> Result<(), OperError> {
        self.emitter.emit(to, Reply::notice(text)).await
    }

    async fn load(&self, principal: &Principal, name: &str) -> Result<(), OperError> {
        self.audit.log(&principal.prefix(), "Load", json!({ "extension": name }));
        let result = self.call("load", self.extensions.load(name)).await;
        self.notice(principal, Self::status_text(result)).await
    }

    /// Query the registration; on absence (or failure) tell the caller and report false.
    async fn ensure_registered(&self, principal: &Principal, name: &str) -> Result<bool, OperError> {
        match self.call("query", self.extensions.query(name)).await {
            Ok(Some(_)) => Ok(true),
            Ok(None) => {
                self.notice(
                    principal,
                    format!("{}: {}", notices::NO_SUCH_EXTENSION, name),
                )
                .await?;
                Ok(false)
            }
            Err(e) => {
                warn!("Extension query for '{}' failed: {}", name, e);
                self.notice(principal, e.user_message()).await?;
                Ok(false)
            }
        }
    }

    async fn unload(&self, principal: &Principal, name: &str) -> Result<(), OperError> {
        if !self.ensure_registered(principal, name).await? {
            return Ok(());
        }
        self.audit.log(&principal.prefix(), "Unload", json!({ "extension": name }));
        let result = self.call("unload", self.extensions.unload(name)).await;
        self.notice(principal, Self::status_text(result)).await
    }

    async fn reload(&self, principal: &Principal, name: &str) -> Result<(), OperError> {
        if !self.ensure_registered(principal, name).await? {
            return Ok(());
        }
        self.audit.log(&principal.prefix(), "Reload", json!({ "extension": name }));

        // Load runs even when unload failed; there is no rollback.
        let unloaded = self.call("unload", self.extensions.unload(name)).await;
        self.notice(principal, Self::status_text(unloaded)).await?;

        let loaded = self.call("load", self.extensions.load(name)).await;
        self.notice(principal, Self::status_text(loaded)).await
    }

    fn die(&self, principal: &Principal) -> Result<(), OperError> {
        self.audit.log(&principal.prefix(), "Die", json!({}));
        self.lifecycle.die()
    }

    async fn restart(&self, principal: &Principal) -> Result<(), OperError> {
        self.audit.log(&principal.prefix(), "Restart", json!({}));
        self.lifecycle.restart().await
    }

    /// Returns the delayed-close handle when a session was killed.
    pub async fn kill(
        &self,
        principal: &Principal,
        target: &str,
        reason: Option<&str>,
    ) -> Result<Option<JoinHandle<()>>, OperError> {
        if !principal.is_operator() {
            self.emitter.emit(principal, Reply::NoPrivileges).await?;
            return Ok(None);
        }

        let Some(victim) = self.registry.find_by_name(target).await? else {
            self.emitter
                .emit(principal, Reply::NoSuchNick(target.to_string()))
                .await?;
            return Ok(None);
        };

        self.audit.log(
            &principal.prefix(),
            "Kill",
            json!({ "target": victim.prefix(), "reason": reason }),
        );
        Ok(Some(self.lifecycle.kill(principal, &victim, reason).await))
    }

    async fn rehash(&self, principal: &Principal) -> Result<(), OperError> {
        self.audit.log(&principal.prefix(), "Rehash", json!({}));

        let refreshed = match self.config.reload().await {
            Ok(()) => load_credentials(self.config.as_ref()).await,
            Err(e) => Err(e),
        };
        let table = match refreshed {
            Ok(table) => table,
            Err(e) => {
                error!("Rehash failed, keeping previous configuration: {}", e);
                return self.notice(principal, e.user_message()).await;
            }
        };

        info!("Rehashed: {} O-line(s)", table.len());
        self.credentials.replace(table);
        self.events.emit(ControlEvent::Rehashed);
        self.notice(principal, notices::CONFIG_RELOADED).await
    }
}

async fn load_credentials(config: &dyn ConfigSource) -> Result<CredentialTable, OperError> {
    let value = config
        .get(keys::KEY_OLINES, serde_yaml_ng::Value::Null)
        .await;
    CredentialTable::from_value(&value)
}
