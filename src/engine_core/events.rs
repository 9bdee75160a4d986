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

//! Events the control plane broadcasts to the rest of the server.

use serde::{Deserialize, Serialize};

use crate::engine_core::models::ConnectionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlEvent {
    /// A session is being terminated by an operator.
    Quit {
        connection: ConnectionId,
        /// `nick!user@host` of the departing session
        source: String,
        reason: String,
        /// When false the transport close is handled by the issuer, not the quit path.
        disconnect: bool,
    },
    /// Configuration was reloaded; derived state should be rebuilt.
    Rehashed,
}
