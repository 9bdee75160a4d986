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

//! Lifecycle Coordinator.
//!
//! Disruptive operations: process termination, in-place restart and forced
//! session termination. Ordering matters here. RESTART closes the network
//! side before replacing the image; KILL sends the ERROR frame before the
//! transport close is allowed to run.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine_core::errors::OperError;
use crate::engine_core::events::ControlEvent;
use crate::engine_core::models::{ConnectionId, Principal};
use crate::engine_core::traits::{ConnectionControl, EventSink, ProcessControl};
use crate::lifecycle::process::Invocation;
use crate::protocol::replies::{Reply, ReplyEmitter};

/// Reason attached to a KILL: `Killed by <actor>: <reason or target nick>`.
pub fn kill_reason(actor: &str, target: &str, reason: Option<&str>) -> String {
    format!("Killed by {}: {}", actor, reason.unwrap_or(target))
}

#[derive(Clone)]
pub struct LifecycleCoordinator {
    connections: Arc<dyn ConnectionControl>,
    events: Arc<dyn EventSink>,
    process: Arc<dyn ProcessControl>,
    emitter: ReplyEmitter,
    invocation: Invocation,
    kill_close_delay: Duration,
}

impl LifecycleCoordinator {
    pub fn new(
        connections: Arc<dyn ConnectionControl>,
        events: Arc<dyn EventSink>,
        process: Arc<dyn ProcessControl>,
        emitter: ReplyEmitter,
        invocation: Invocation,
        kill_close_delay: Duration,
    ) -> Self {
        Self {
            connections,
            events,
            process,
            emitter,
            invocation,
            kill_close_delay,
        }
    }

    /// Terminate the process with status 0. Does not return on the real boundary.
    pub fn die(&self) -> Result<(), OperError> {
        info!("DIE requested, terminating");
        self.process.exit(0)
    }

    /// Close all connections, then replace the process image.
    ///
    /// A failing `close_all` does not stop the restart.
    pub async fn restart(&self) -> Result<(), OperError> {
        if let Err(e) = self.connections.close_all().await {
            warn!("Closing connections before restart failed, restarting anyway: {}", e);
        }
        self.process.restart(&self.invocation)
    }

    /// Forcefully terminate `target`'s session on behalf of `actor`.
    ///
    /// Returns the handle of the delayed close so callers may await it.
    pub async fn kill(
        &self,
        actor: &Principal,
        target: &Principal,
        reason: Option<&str>,
    ) -> JoinHandle<()> {
        let reason = kill_reason(&actor.nick, &target.nick, reason);
        info!("{} killed {} ({})", actor.nick, target.nick, reason);

        self.events.emit(ControlEvent::Quit {
            connection: target.connection,
            source: target.prefix(),
            reason: reason.clone(),
            disconnect: false,
        });

        let frame = Reply::Error {
            host: target.host.clone(),
            reason,
        };
        if let Err(e) = self.emitter.emit(target, frame).await {
            warn!("Failed to send ERROR to {}: {}", target.nick, e);
        }

        self.schedule_close(target.connection, self.kill_close_delay)
    }

    /// Close `connection` once `delay` has elapsed, regardless of its state then.
    pub fn schedule_close(&self, connection: ConnectionId, delay: Duration) -> JoinHandle<()> {
        let connections = Arc::clone(&self.connections);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match connections.close(connection).await {
                Ok(()) => debug!("Closed connection {}", connection),
                Err(e) => warn!("Delayed close of {} failed: {}", connection, e),
            }
        })
    }
}
