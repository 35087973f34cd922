//! Webhook verification handshake types.

use serde::Deserialize;

/// Only mode accepted on the verification handshake.
pub const SUBSCRIBE_MODE: &str = "subscribe";

/// Query of `GET /webhook?hub.mode=..&hub.verify_token=..&hub.challenge=..`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

impl VerifyParams {
    /// The challenge to echo when mode is `subscribe` and the token equals `expected` exactly.
    /// A missing expected token rejects every handshake. A missing challenge echoes "".
    pub fn accept(&self, expected: Option<&str>) -> Option<String> {
        let expected = expected?;
        if self.mode.as_deref() != Some(SUBSCRIBE_MODE) {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected) {
            return None;
        }
        Some(self.challenge.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mode: Option<&str>, token: Option<&str>, challenge: Option<&str>) -> VerifyParams {
        VerifyParams {
            mode: mode.map(String::from),
            verify_token: token.map(String::from),
            challenge: challenge.map(String::from),
        }
    }

    #[test]
    fn matching_token_echoes_challenge() {
        let p = params(Some("subscribe"), Some("secret"), Some("1158201444"));
        assert_eq!(p.accept(Some("secret")).as_deref(), Some("1158201444"));
    }

    #[test]
    fn token_must_match_exactly() {
        for token in ["secre", "secret2", "SECRET", " secret", ""] {
            let p = params(Some("subscribe"), Some(token), Some("c"));
            assert_eq!(p.accept(Some("secret")), None, "token {:?}", token);
        }
        assert_eq!(params(Some("subscribe"), None, Some("c")).accept(Some("secret")), None);
    }

    #[test]
    fn mode_must_be_subscribe() {
        assert_eq!(params(Some("unsubscribe"), Some("secret"), Some("c")).accept(Some("secret")), None);
        assert_eq!(params(None, Some("secret"), Some("c")).accept(Some("secret")), None);
    }

    #[test]
    fn no_configured_token_rejects() {
        let p = params(Some("subscribe"), Some(""), Some("c"));
        assert_eq!(p.accept(None), None);
    }

    #[test]
    fn missing_challenge_echoes_empty() {
        let p = params(Some("subscribe"), Some("secret"), None);
        assert_eq!(p.accept(Some("secret")).as_deref(), Some(""));
    }
}
