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

//! Collaborator interfaces.
//!
//! The control plane never reaches for global state. Every subsystem it
//! talks to is injected as one of these capabilities, so the dispatcher can
//! be driven against in-memory fakes.

use async_trait::async_trait;
use serde_yaml_ng::Value;
use tokio::sync::broadcast;

use crate::engine_core::errors::OperError;
use crate::engine_core::events::ControlEvent;
use crate::engine_core::models::{ConnectionId, Principal, Registration, StatusText};
use crate::lifecycle::process::Invocation;
use crate::protocol::replies::Message;

/// Lookup and persistence of connected principals.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    async fn find_by_connection(
        &self,
        connection: ConnectionId,
    ) -> Result<Option<Principal>, OperError>;

    async fn find_by_name(&self, nick: &str) -> Result<Option<Principal>, OperError>;

    async fn persist(&self, principal: Principal) -> Result<(), OperError>;
}

/// Asynchronous control of the extension manager, keyed by extension name.
#[async_trait]
pub trait ExtensionControl: Send + Sync {
    async fn load(&self, name: &str) -> Result<StatusText, OperError>;

    async fn unload(&self, name: &str) -> Result<StatusText, OperError>;

    async fn query(&self, name: &str) -> Result<Option<Registration>, OperError>;
}

/// Outbound side of the connection subsystem.
#[async_trait]
pub trait ConnectionControl: Send + Sync {
    /// Queue a frame on the connection's transport.
    async fn send(&self, connection: ConnectionId, message: Message) -> Result<(), OperError>;

    /// Tear down one transport unconditionally.
    async fn close(&self, connection: ConnectionId) -> Result<(), OperError>;

    /// Close every listener and connection. Resolves once the subsystem acknowledges.
    async fn close_all(&self) -> Result<(), OperError>;
}

/// The configuration subsystem.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Re-read configuration from its backing store.
    async fn reload(&self) -> Result<(), OperError>;

    /// Resolve a dotted key, falling back to `default` when absent.
    async fn get(&self, key: &str, default: Value) -> Value;
}

/// Fire-and-forget broadcast of control events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ControlEvent);
}

impl EventSink for broadcast::Sender<ControlEvent> {
    fn emit(&self, event: ControlEvent) {
        // No subscribers is not an error: nobody cares about this event yet.
        let _ = self.send(event);
    }
}

/// Process boundary. Real implementations do not return on success.
pub trait ProcessControl: Send + Sync {
    fn exit(&self, code: i32) -> Result<(), OperError>;

    fn restart(&self, invocation: &Invocation) -> Result<(), OperError>;
}
