//! Session identifiers used as counter keys.

use std::fmt;

const ANON_PREFIX: &str = "anon_";
const ANON_SUFFIX_LEN: usize = 7;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Opaque per-client session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Use the client's id when it sent a non-blank one, otherwise mint an
    /// anonymous id.
    pub fn resolve(client_supplied: Option<&str>) -> Self {
        match client_supplied.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Self(id.to_string()),
            None => Self::anonymous(),
        }
    }

    /// A fresh `anon_xxxxxxx` id.
    pub fn anonymous() -> Self {
        let suffix: String = (0..ANON_SUFFIX_LEN)
            .map(|_| ALPHABET[fastrand::usize(..ALPHABET.len())] as char)
            .collect();
        Self(format!("{}{}", ANON_PREFIX, suffix))
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.starts_with(ANON_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
