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

//! Tamper-evident audit trail for privileged actions.
//!
//! Every record is serialized to JSON and signed with an ephemeral
//! HMAC-SHA256 key, then emitted on the `audit` tracing target.

use hmac::{Hmac, Mac};
use rand::Rng;
use serde::Serialize;
use sha2::Sha256;
use tracing::info;

use crate::engine_core::constants::crypto;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize)]
struct AuditEntry<'a> {
    actor: &'a str,
    timestamp: String,
    event_type: &'a str,
    details: serde_json::Value,
}

#[derive(Clone)]
pub struct AuditSigner {
    secret: [u8; crypto::SECRET_KEY_LENGTH],
}

impl AuditSigner {
    /// Create a signer with a random ephemeral key
    pub fn generate() -> Self {
        let mut secret = [0u8; crypto::SECRET_KEY_LENGTH];
        rand::rng().fill(&mut secret);
        Self { secret }
    }

    pub fn sign(&self, payload: &[u8]) -> String {
        // HMAC accepts keys of any length; construction cannot fail for a fixed-size key.
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(m) => m,
            Err(_) => return String::new(),
        };
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time verification of a hex signature
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let provided = match hex::decode(signature) {
            Ok(b) => b,
            Err(_) => return false,
        };
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(m) => m,
            Err(_) => return false,
        };
        mac.update(payload);
        mac.verify_slice(&provided).is_ok()
    }
}

pub struct AuditLogger {
    signer: AuditSigner,
}

impl AuditLogger {
    pub fn new(signer: AuditSigner) -> Self {
        Self { signer }
    }

    /// Build the canonical payload and its signature without emitting it.
    pub fn record(
        &self,
        actor: &str,
        event_type: &str,
        details: serde_json::Value,
    ) -> (String, String) {
        let entry = AuditEntry {
            actor,
            timestamp: chrono::Utc::now().to_rfc3339(),
            event_type,
            details,
        };
        let payload = serde_json::to_string(&entry).unwrap_or_default();
        let signature = self.signer.sign(payload.as_bytes());
        (payload, signature)
    }

    pub fn log(&self, actor: &str, event_type: &str, details: serde_json::Value) {
        let (payload, signature) = self.record(actor, event_type, details);
        info!(
            target: "audit",
            signature = %signature,
            payload = %payload,
            "PRIVILEGED_AUDIT_LOG"
        );
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(AuditSigner::generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_signature_verifies() {
        let signer = AuditSigner::generate();
        let logger = AuditLogger::new(signer.clone());
        let (payload, signature) = logger.record("alice", "Oper", json!({ "result": "granted" }));

        assert!(payload.contains("\"actor\":\"alice\""));
        assert!(signer.verify(payload.as_bytes(), &signature));
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let signer = AuditSigner::generate();
        let logger = AuditLogger::new(signer.clone());
        let (payload, signature) = logger.record("alice", "Kill", json!({ "target": "bob" }));

        let tampered = payload.replace("bob", "carol");
        assert!(!signer.verify(tampered.as_bytes(), &signature));
        assert!(!signer.verify(payload.as_bytes(), "not-hex"));
    }

    #[test]
    fn test_keys_are_ephemeral() {
        let a = AuditSigner::generate();
        let b = AuditSigner::generate();
        assert_ne!(a.sign(b"payload"), b.sign(b"payload"));
    }
}
