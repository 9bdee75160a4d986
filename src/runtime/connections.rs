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

//! Connection hub.
//!
//! Routes outbound frames to per-connection channels. A transport task owns
//! the receiving end and performs the actual writes; `Outbound::Close` tells
//! it to flush and hang up.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::engine_core::constants::limits;
use crate::engine_core::errors::OperError;
use crate::engine_core::models::ConnectionId;
use crate::engine_core::traits::ConnectionControl;
use crate::protocol::replies::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Frame(Message),
    Close,
}

#[derive(Default)]
pub struct ConnectionHub {
    routes: RwLock<HashMap<ConnectionId, mpsc::Sender<Outbound>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a transport; the returned receiver yields everything sent to it.
    pub async fn attach(&self, connection: ConnectionId) -> mpsc::Receiver<Outbound> {
        let (tx, rx) = mpsc::channel(limits::OUTBOUND_CHANNEL_CAPACITY);
        self.routes.write().await.insert(connection, tx);
        debug!("Attached transport for {}", connection);
        rx
    }

    pub async fn is_attached(&self, connection: ConnectionId) -> bool {
        self.routes.read().await.contains_key(&connection)
    }

    pub async fn len(&self) -> usize {
        self.routes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.routes.read().await.is_empty()
    }
}

#[async_trait]
impl ConnectionControl for ConnectionHub {
    async fn send(&self, connection: ConnectionId, message: Message) -> Result<(), OperError> {
        let tx = self
            .routes
            .read()
            .await
            .get(&connection)
            .cloned()
            .ok_or_else(|| OperError::ConnectionError(format!("No transport for {}", connection)))?;
        tx.send(Outbound::Frame(message))
            .await
            .map_err(|_| OperError::ConnectionError(format!("Transport for {} is gone", connection)))
    }

    /// Closing an already closed connection is not an error.
    async fn close(&self, connection: ConnectionId) -> Result<(), OperError> {
        let tx = self.routes.write().await.remove(&connection);
        if let Some(tx) = tx {
            let _ = tx.send(Outbound::Close).await;
            debug!("Closed transport for {}", connection);
        }
        Ok(())
    }

    async fn close_all(&self) -> Result<(), OperError> {
        let routes: Vec<_> = self.routes.write().await.drain().collect();
        info!("Closing {} connection(s)", routes.len());
        for (_, tx) in routes {
            let _ = tx.send(Outbound::Close).await;
        }
        Ok(())
    }
}
