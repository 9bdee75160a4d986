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

//! opsgate Constants - Single source of truth for all configuration values.
//!
//! This module centralizes reply numerics, configuration keys and timing
//! defaults so the dispatcher and the reply emitter agree on them.

/// Numeric replies (RFC 1459 / RFC 2812)
pub mod numerics {
    /// ERR_NOSUCHNICK
    pub const ERR_NOSUCHNICK: u16 = 401;
    /// ERR_NEEDMOREPARAMS
    pub const ERR_NEEDMOREPARAMS: u16 = 461;
    /// ERR_PASSWDMISMATCH
    pub const ERR_PASSWDMISMATCH: u16 = 464;
    /// ERR_NOPRIVILEGES
    pub const ERR_NOPRIVILEGES: u16 = 481;
    /// ERR_NOOPERHOST
    pub const ERR_NOOPERHOST: u16 = 491;
    /// RPL_YOUREOPER
    pub const RPL_YOUREOPER: u16 = 381;
}

/// Privileged command names as they appear on the wire
pub mod commands {
    pub const OPER: &str = "OPER";
    pub const LOAD: &str = "LOAD";
    pub const UNLOAD: &str = "UNLOAD";
    pub const RELOAD: &str = "RELOAD";
    pub const DIE: &str = "DIE";
    pub const RESTART: &str = "RESTART";
    pub const KILL: &str = "KILL";
    pub const REHASH: &str = "REHASH";
}

/// User modes
pub mod modes {
    /// Operator mode flag granted by a successful OPER
    pub const OPERATOR: char = 'o';
}

/// Notice texts emitted by the dispatcher
pub mod notices {
    /// Target of server notices sent to the caller
    pub const NOTICE_TARGET: &str = "*";
    /// Prefix of the notice emitted when an extension is not registered
    pub const NO_SUCH_EXTENSION: &str = "No such extension";
    /// Confirmation sent after a successful REHASH
    pub const CONFIG_RELOADED: &str = "Configuration reloaded";
}

/// Configuration keys and environment variables
pub mod config {
    /// Dotted key holding the credential table
    pub const KEY_OLINES: &str = "admin.olines";

    pub const ENV_CONFIG_PATH: &str = "OPSGATE_CONFIG";
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
    pub const ENV_SERVER_NAME: &str = "OPSGATE_SERVER_NAME";
    pub const ENV_KILL_DELAY_MS: &str = "OPSGATE_KILL_DELAY_MS";
    pub const ENV_CALL_TIMEOUT_MS: &str = "OPSGATE_CALL_TIMEOUT_MS";

    pub const DEFAULT_SERVER_NAME: &str = "opsgate.local";
}

/// Timing
pub mod timing {
    /// Delay between the ERROR frame of a KILL and the transport close (one scheduler tick)
    pub const KILL_CLOSE_DELAY_MS: u64 = 1000;
}

/// Cryptographic constants
pub mod crypto {
    /// HMAC-SHA256 audit key length in bytes
    pub const SECRET_KEY_LENGTH: usize = 32;
}

/// Transport Limits (DoS Protection)
pub mod limits {
    /// Maximum accepted line length, including the terminator
    pub const MAX_LINE_LENGTH: usize = 512;
    /// Capacity of the request channel feeding the extension manager
    pub const BRIDGE_CHANNEL_CAPACITY: usize = 32;
    /// Capacity of a per-connection outbound frame channel
    pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;
}
