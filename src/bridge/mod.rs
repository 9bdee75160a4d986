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

//! Extension Control Bridge.
//!
//! Request/response plumbing between command handlers and an independently
//! scheduled extension manager. Each call is sent over an mpsc channel with
//! its own oneshot reply slot; the caller holds a `CallToken` and awaits it.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::engine_core::errors::OperError;
use crate::engine_core::models::{Registration, StatusText};
use crate::engine_core::traits::ExtensionControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionOp {
    Load,
    Unload,
    Query,
}

/// Typed result of an extension call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionReply {
    Status(StatusText),
    Registration(Option<Registration>),
}

/// A call in flight, as seen by the extension manager
#[derive(Debug)]
pub struct ExtensionRequest {
    pub id: Uuid,
    pub op: ExtensionOp,
    pub name: String,
    pub reply: oneshot::Sender<Result<ExtensionReply, String>>,
}

impl ExtensionRequest {
    /// Resolve the caller's token. A caller that stopped waiting is ignored.
    pub fn respond(self, result: Result<ExtensionReply, String>) {
        if self.reply.send(result).is_err() {
            debug!("Extension call {} abandoned by caller", self.id);
        }
    }
}

/// Handle on an outstanding extension call
#[derive(Debug)]
pub struct CallToken {
    id: Uuid,
    rx: oneshot::Receiver<Result<ExtensionReply, String>>,
}

impl CallToken {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn resolve(self) -> Result<ExtensionReply, OperError> {
        match self.rx.await {
            Ok(Ok(reply)) => {
                trace!("Extension call {} resolved", self.id);
                Ok(reply)
            }
            Ok(Err(status)) => Err(OperError::ExtensionError(status)),
            Err(_) => Err(OperError::ExtensionError(
                "Extension manager dropped the request".to_string(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct ExtensionBridge {
    tx: mpsc::Sender<ExtensionRequest>,
}

impl ExtensionBridge {
    pub fn new(tx: mpsc::Sender<ExtensionRequest>) -> Self {
        Self { tx }
    }

    /// Create a bridge together with the receiving end for an extension manager.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ExtensionRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn issue(&self, op: ExtensionOp, name: &str) -> Result<CallToken, OperError> {
        let (reply, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        debug!("Extension call {} {:?} '{}'", id, op, name);

        self.tx
            .send(ExtensionRequest {
                id,
                op,
                name: name.to_string(),
                reply,
            })
            .await
            .map_err(|_| OperError::ExtensionError("Extension manager is not running".to_string()))?;

        Ok(CallToken { id, rx })
    }

    async fn status(&self, op: ExtensionOp, name: &str) -> Result<StatusText, OperError> {
        match self.issue(op, name).await?.resolve().await? {
            ExtensionReply::Status(text) => Ok(text),
            other => Err(OperError::ExtensionError(format!(
                "Unexpected reply to {:?}: {:?}",
                op, other
            ))),
        }
    }
}

#[async_trait]
impl ExtensionControl for ExtensionBridge {
    async fn load(&self, name: &str) -> Result<StatusText, OperError> {
        self.status(ExtensionOp::Load, name).await
    }

    async fn unload(&self, name: &str) -> Result<StatusText, OperError> {
        self.status(ExtensionOp::Unload, name).await
    }

    async fn query(&self, name: &str) -> Result<Option<Registration>, OperError> {
        match self.issue(ExtensionOp::Query, name).await?.resolve().await? {
            ExtensionReply::Registration(registration) => Ok(registration),
            other => Err(OperError::ExtensionError(format!(
                "Unexpected reply to Query: {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_token_carries_correlation_id() {
        let (bridge, mut rx) = ExtensionBridge::channel(4);
        let token = bridge.issue(ExtensionOp::Load, "hello").await.unwrap();

        let request = rx.recv().await.unwrap();
        assert_eq!(request.id, token.id());
        assert_eq!(request.op, ExtensionOp::Load);
        assert_eq!(request.name, "hello");

        request.respond(Ok(ExtensionReply::Status("Loaded extension: hello".into())));
        assert_eq!(
            token.resolve().await.unwrap(),
            ExtensionReply::Status("Loaded extension: hello".into())
        );
    }

    #[tokio::test]
    async fn test_manager_failure_becomes_extension_error() {
        let (bridge, mut rx) = ExtensionBridge::channel(4);
        let server = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            request.respond(Err("Unknown extension: nope".into()));
        });

        let err = bridge.load("nope").await.unwrap_err();
        assert_eq!(err.user_message(), "Unknown extension: nope");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_request_resolves_to_error() {
        let (bridge, mut rx) = ExtensionBridge::channel(4);
        let server = tokio::spawn(async move {
            drop(rx.recv().await);
        });

        assert!(bridge.query("hello").await.is_err());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_stopped_manager_fails_fast() {
        let (bridge, rx) = ExtensionBridge::channel(4);
        drop(rx);
        let err = bridge.unload("hello").await.unwrap_err();
        assert!(matches!(err, OperError::ExtensionError(_)));
    }

    #[tokio::test]
    async fn test_mismatched_reply_is_rejected() {
        let (bridge, mut rx) = ExtensionBridge::channel(4);
        let server = tokio::spawn(async move {
            let request = rx.recv().await.unwrap();
            request.respond(Ok(ExtensionReply::Registration(None)));
        });

        assert!(bridge.load("hello").await.is_err());
        server.await.unwrap();
    }
}
