//! Endpoint identity and ordering.

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

/// Compare two endpoint identities by host.
///
/// Bytes are compared left to right. A `/` or the end of the string ends an
/// identity and sorts before any other byte, so `"h1"` and `"h1/rs0"`
/// compare equal while `"h1"` still sorts before `"h10"`.
#[must_use]
pub fn compare_hosts(a: &str, b: &str) -> Ordering {
    let mut a = a.bytes();
    let mut b = b.bytes();
    loop {
        let x = a.next().filter(|&c| c != b'/');
        let y = b.next().filter(|&c| c != b'/');
        match (x, y) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match x.cmp(&y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}

/// Whether two identities name the same host under [`compare_hosts`].
#[must_use]
pub fn same_host(a: &str, b: &str) -> bool {
    compare_hosts(a, b) == Ordering::Equal
}

/// Key of one [`EndpointPool`](crate::EndpointPool).
///
/// Connections configured with different socket timeouts live in different
/// pools even when they share a host.
#[derive(Debug, Clone)]
pub struct EndpointKey {
    /// Canonical endpoint identity.
    pub identity: String,
    /// Socket timeout the pool's connections were created with.
    pub socket_timeout: Duration,
}

impl EndpointKey {
    /// Create a key.
    pub fn new(identity: impl Into<String>, socket_timeout: Duration) -> Self {
        Self {
            identity: identity.into(),
            socket_timeout,
        }
    }
}

impl Ord for EndpointKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_hosts(&self.identity, &other.identity)
            .then_with(|| self.socket_timeout.cmp(&other.socket_timeout))
    }
}

impl PartialOrd for EndpointKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EndpointKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EndpointKey {}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.identity, self.socket_timeout.as_secs_f64())
    }
}
