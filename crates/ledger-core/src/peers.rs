use crate::error::PeerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A peer's network location in canonical `host:port` form.
///
/// Parsing accepts full URLs (`http://10.0.0.5:5000/`) as well as bare
/// authorities (`10.0.0.5:5000`). Scheme, path and query are dropped and the
/// host is lowercased, so the same node registered two ways dedupes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress(String);

impl PeerAddress {
    pub fn parse(raw: &str) -> Result<Self, PeerError> {
        let invalid = || PeerError::Invalid(raw.to_string());

        let trimmed = raw.trim();
        let without_scheme = match trimmed.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() => rest,
            Some(_) => return Err(invalid()),
            None => trimmed,
        };
        let authority = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        // Userinfo is never part of the canonical location.
        let authority = authority.rsplit('@').next().unwrap_or_default();

        let (host, port) = if authority.starts_with('[') {
            // IPv6 literal: the brackets stay part of the host.
            let close = authority.find(']').ok_or_else(invalid)?;
            let (host, rest) = authority.split_at(close + 1);
            if host.len() == 2 {
                return Err(invalid());
            }
            match rest {
                "" => (host, None),
                _ => (host, Some(rest.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let host = host.to_ascii_lowercase();

        match port {
            Some(port) => {
                let port: u16 = port.parse().map_err(|_| invalid())?;
                Ok(Self(format!("{host}:{port}")))
            }
            None => Ok(Self(host)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base URL used to reach the peer over HTTP.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = PeerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PeerAddress> for String {
    fn from(value: PeerAddress) -> Self {
        value.0
    }
}
