//! Identifiers and shared value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Call identifier, opaque to the negotiation layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub String);

impl CallId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Which side of the call this endpoint is on
///
/// The caller generated the offer; the callee generated the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallRole {
    Caller,
    Callee,
}

impl fmt::Display for CallRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallRole::Caller => f.write_str("CALLER"),
            CallRole::Callee => f.write_str("CALLEE"),
        }
    }
}

/// Network endpoint as advertised in a session description
///
/// The address is kept as text: session-level connection data may name a
/// host rather than a literal IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.address.contains(':') {
            write!(f, "[{}]:{}", self.address, self.port)
        } else {
            write!(f, "{}:{}", self.address, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("10.0.0.1", 20000).to_string(), "10.0.0.1:20000");
        assert_eq!(Endpoint::new("2001:db8::1", 20000).to_string(), "[2001:db8::1]:20000");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(CallRole::Caller.to_string(), "CALLER");
        assert_eq!(CallRole::Callee.to_string(), "CALLEE");
    }
}
