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

//! Authorization matcher.
//!
//! An ordered list of credential entries (O-lines), each mapping a glob
//! pattern over the `user@host` origin to a name/secret pair. Lookup is a
//! pure function: the first entry whose pattern matches is authoritative.

use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::engine_core::errors::OperError;

/// Case-sensitive glob match supporting `*` (any run, possibly empty) and `?` (one char).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    // Position of the last `*` seen and the text index it was tried against
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}

/// One O-line
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub pattern: String,
    pub name: String,
    #[serde(alias = "secret")]
    pub password: String,
}

impl CredentialEntry {
    pub fn new(
        pattern: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            name: name.into(),
            password: password.into(),
        }
    }

    pub fn matches_origin(&self, origin: &str) -> bool {
        glob_match(&self.pattern, origin)
    }

    /// Exact comparison of the supplied pair.
    pub fn accepts(&self, name: &str, password: &str) -> bool {
        self.name == name && self.password == password
    }
}

impl fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Short form accepted under a mapping: `pattern: [name, password]` or `pattern: {name, password}`
#[derive(Deserialize)]
#[serde(untagged)]
enum Credentials {
    Pair(String, String),
    Named {
        name: String,
        #[serde(alias = "secret")]
        password: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialTable {
    entries: Vec<CredentialEntry>,
}

impl CredentialTable {
    pub fn new(entries: Vec<CredentialEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }

    /// First entry whose pattern matches `origin`, in configuration order.
    pub fn lookup(&self, origin: &str) -> Option<&CredentialEntry> {
        self.entries.iter().find(|e| e.matches_origin(origin))
    }

    /// Build from the `admin.olines` configuration value.
    ///
    /// Accepts a sequence of `{pattern, name, password}` mappings, or a mapping
    /// keyed by pattern (document order is preserved). `null` yields an empty table.
    pub fn from_value(value: &Value) -> Result<Self, OperError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Sequence(_) => {
                let entries: Vec<CredentialEntry> = serde_yaml_ng::from_value(value.clone())?;
                Ok(Self::new(entries))
            }
            Value::Mapping(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (k, v) in map {
                    let pattern = k.as_str().ok_or_else(|| {
                        OperError::ConfigurationError("O-line pattern must be a string".to_string())
                    })?;
                    let entry = match serde_yaml_ng::from_value::<Credentials>(v.clone())? {
                        Credentials::Pair(name, password) => {
                            CredentialEntry::new(pattern, name, password)
                        }
                        Credentials::Named { name, password } => {
                            CredentialEntry::new(pattern, name, password)
                        }
                    };
                    entries.push(entry);
                }
                Ok(Self::new(entries))
            }
            other => Err(OperError::ConfigurationError(format!(
                "O-lines must be a list or mapping, got {:?}",
                other
            ))),
        }
    }
}

/// Atomically replaceable handle to the current credential table.
///
/// Readers always see a complete table: either the one before or the one
/// after a rehash.
#[derive(Clone)]
pub struct CredentialStore {
    tx: Arc<watch::Sender<Arc<CredentialTable>>>,
}

impl CredentialStore {
    pub fn new(table: CredentialTable) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(table));
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Arc<CredentialTable> {
        self.tx.borrow().clone()
    }

    pub fn replace(&self, table: CredentialTable) {
        self.tx.send_replace(Arc::new(table));
    }

    /// Observe table replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<CredentialTable>> {
        self.tx.subscribe()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(CredentialTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_wildcards() {
        assert!(glob_match("*.admin.example.com", "ops.admin.example.com"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
        assert!(glob_match("*@*.example.*", "root@db.example.org"));
        assert!(!glob_match("*.admin.example.com", "ops.example.com"));
        assert!(glob_match("a*b*c", "aXXbYYbc"));
        assert!(!glob_match("abc", "abcd"));
    }

    #[test]
    fn test_glob_is_case_sensitive_and_literal() {
        assert!(!glob_match("*.Example.com", "ops.example.com"));
        // Regex metacharacters carry no meaning
        assert!(!glob_match("a.c", "abc"));
        assert!(glob_match("[x]", "[x]"));
    }

    #[test]
    fn test_first_match_wins() {
        let table = CredentialTable::new(vec![
            CredentialEntry::new("*@*.admin.example.com", "root", "s3cret"),
            CredentialEntry::new("*", "guest", "guest"),
        ]);
        assert_eq!(table.lookup("ali@ops.admin.example.com").unwrap().name, "root");
        assert_eq!(table.lookup("bob@elsewhere.net").unwrap().name, "guest");
    }

    #[test]
    fn test_empty_table_never_matches() {
        assert!(CredentialTable::default().lookup("anyone@anywhere").is_none());
    }

    #[test]
    fn test_accepts_requires_exact_pair() {
        let entry = CredentialEntry::new("*", "root", "s3cret");
        assert!(entry.accepts("root", "s3cret"));
        assert!(!entry.accepts("root", "S3cret"));
        assert!(!entry.accepts("admin", "s3cret"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let entry = CredentialEntry::new("*", "root", "s3cret");
        assert!(!format!("{:?}", entry).contains("s3cret"));
    }

    #[test]
    fn test_from_sequence_value() {
        let value: Value = serde_yaml_ng::from_str(
            r#"
- pattern: "*@*.admin.example.com"
  name: root
  password: s3cret
- pattern: "*"
  name: guest
  secret: guest
"#,
        )
        .unwrap();
        let table = CredentialTable::from_value(&value).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[1].password, "guest");
    }

    #[test]
    fn test_from_mapping_value_keeps_document_order() {
        let value: Value = serde_yaml_ng::from_str(
            r#"
"*@ops.*": [root, s3cret]
"*": { name: guest, password: guest }
"#,
        )
        .unwrap();
        let table = CredentialTable::from_value(&value).unwrap();
        assert_eq!(table.entries()[0].pattern, "*@ops.*");
        assert_eq!(table.entries()[0].name, "root");
        assert_eq!(table.entries()[1].name, "guest");
    }

    #[test]
    fn test_from_invalid_value() {
        assert!(CredentialTable::from_value(&Value::Bool(true)).is_err());
        assert!(CredentialTable::from_value(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_store_replaces_whole_table() {
        let store = CredentialStore::new(CredentialTable::new(vec![CredentialEntry::new(
            "*", "old", "old",
        )]));
        let before = store.current();
        store.replace(CredentialTable::new(vec![
            CredentialEntry::new("*", "new", "new"),
            CredentialEntry::new("x", "new2", "new2"),
        ]));

        assert_eq!(before.len(), 1);
        assert_eq!(before.entries()[0].name, "old");
        assert_eq!(store.current().len(), 2);
        assert_eq!(store.current().entries()[0].name, "new");
    }
}
