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

//! In-process session registry.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::engine_core::errors::OperError;
use crate::engine_core::models::{ConnectionId, Principal};
use crate::engine_core::traits::SessionRegistry;

#[derive(Default)]
pub struct InMemoryRegistry {
    sessions: RwLock<HashMap<ConnectionId, Principal>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, principal: Principal) {
        debug!("Registered {} on {}", principal.prefix(), principal.connection);
        self.sessions
            .write()
            .await
            .insert(principal.connection, principal);
    }

    pub async fn remove(&self, connection: ConnectionId) -> Option<Principal> {
        self.sessions.write().await.remove(&connection)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionRegistry for InMemoryRegistry {
    async fn find_by_connection(
        &self,
        connection: ConnectionId,
    ) -> Result<Option<Principal>, OperError> {
        Ok(self.sessions.read().await.get(&connection).cloned())
    }

    /// Nicknames compare ASCII case-insensitively.
    async fn find_by_name(&self, nick: &str) -> Result<Option<Principal>, OperError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|p| p.nick.eq_ignore_ascii_case(nick))
            .cloned())
    }

    /// Persisting a principal whose connection has gone away is a no-op.
    async fn persist(&self, principal: Principal) -> Result<(), OperError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&principal.connection) {
            Some(slot) => {
                *slot = principal;
                Ok(())
            }
            None => {
                debug!("Dropping update for departed connection {}", principal.connection);
                Ok(())
            }
        }
    }
}
