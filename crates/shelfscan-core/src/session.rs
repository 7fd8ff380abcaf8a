//! Session identity.
//!
//! One id per application run. The server scopes temporary uploads to it;
//! the id is attached to every outgoing request and never persisted.

use chrono::Utc;
use rand::Rng;

const SUFFIX_LEN: usize = 9;
const SUFFIX_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A client-generated correlation id, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
}

impl Session {
    /// Generate a fresh session id: millisecond timestamp plus a random
    /// base-36 suffix. Collisions are negligible within one run.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
            .collect();
        Self {
            id: format!("session_{millis}_{suffix}"),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_expected_shape() {
        let session = Session::generate();
        let parts: Vec<&str> = session.id().splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .bytes()
            .all(|b| SUFFIX_CHARSET.contains(&b)));
    }

    #[test]
    fn two_sessions_differ() {
        assert_ne!(Session::generate().id(), Session::generate().id());
    }
}
