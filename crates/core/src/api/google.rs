//! Google ID token verification through the public `tokeninfo` endpoint
//!
//! Google validates the signature server side; we check expiry, audience and
//! the presence of an email on the decoded claims it returns.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CoreResult, QuizError};
use crate::identity::IdentityVerifier;
use crate::types::VerifiedIdentity;

pub const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Claims returned by `tokeninfo`. Numeric claims arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenInfo {
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub aud: Option<String>,
    pub exp: Option<String>,
}

/// Verifier backed by Google's `tokeninfo` endpoint
#[derive(Clone)]
pub struct GoogleTokenVerifier {
    client: Client,
    tokeninfo_url: String,
    /// OAuth client id; when set, the token audience must match it
    client_id: Option<String>,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: Option<String>) -> CoreResult<Self> {
        Self::with_url(DEFAULT_TOKENINFO_URL, client_id)
    }

    pub fn with_url(tokeninfo_url: impl Into<String>, client_id: Option<String>) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| QuizError::IdentityProvider(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            tokeninfo_url: tokeninfo_url.into(),
            client_id,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> CoreResult<VerifiedIdentity> {
        debug!("Verifying Google ID token with tokeninfo endpoint");

        let resp = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| QuizError::IdentityProvider(format!("tokeninfo request failed: {e}")))?;

        let status = resp.status();
        if status.is_client_error() {
            warn!(%status, "tokeninfo rejected the token");
            return Err(QuizError::InvalidToken(format!("tokeninfo returned {status}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QuizError::IdentityProvider(format!(
                "tokeninfo error {status}: {body}"
            )));
        }

        let info: TokenInfo = resp
            .json()
            .await
            .map_err(|e| QuizError::InvalidToken(format!("malformed tokeninfo response: {e}")))?;

        identity_from_claims(info, self.client_id.as_deref(), Utc::now().timestamp())
    }
}

/// Validate decoded claims and extract the identity.
/// A missing display name falls back to the email address.
pub fn identity_from_claims(
    info: TokenInfo,
    expected_audience: Option<&str>,
    now: i64,
) -> CoreResult<VerifiedIdentity> {
    if let Some(exp) = info.exp.as_deref() {
        let exp: i64 = exp
            .parse()
            .map_err(|_| QuizError::InvalidToken(format!("unparseable exp claim: {exp}")))?;
        if exp < now {
            return Err(QuizError::InvalidToken("token has expired".into()));
        }
    }

    if let Some(expected) = expected_audience {
        match info.aud.as_deref() {
            Some(aud) if aud == expected => {}
            Some(aud) => {
                warn!(token_audience = %aud, "Google token audience mismatch");
                return Err(QuizError::InvalidToken("token audience mismatch".into()));
            }
            None => return Err(QuizError::InvalidToken("token missing audience".into())),
        }
    }

    if info.email_verified.as_deref() == Some("false") {
        warn!("Google token carries an unverified email address");
    }

    let email = info
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| QuizError::InvalidToken("token missing email".into()))?;
    let name = info
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.clone());

    Ok(VerifiedIdentity {
        email,
        name,
        picture: info.picture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn claims(json: serde_json::Value) -> TokenInfo {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_valid_claims() {
        let info = claims(serde_json::json!({
            "email": "a@x.com",
            "email_verified": "true",
            "name": "Ada",
            "picture": "https://img/ada.png",
            "aud": "client-1",
            "exp": "1700003600",
            "sub": "1234"
        }));
        let identity = identity_from_claims(info, Some("client-1"), NOW).unwrap();
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.name, "Ada");
        assert_eq!(identity.picture.as_deref(), Some("https://img/ada.png"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let info = claims(serde_json::json!({ "email": "a@x.com", "exp": "1699999999" }));
        let err = identity_from_claims(info, None, NOW).unwrap_err();
        assert!(matches!(err, QuizError::InvalidToken(_)));
    }

    #[test]
    fn test_audience_mismatch_rejected() {
        let info = claims(serde_json::json!({ "email": "a@x.com", "aud": "someone-else" }));
        assert!(matches!(
            identity_from_claims(info, Some("client-1"), NOW),
            Err(QuizError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_audience_ignored_when_not_configured() {
        let info = claims(serde_json::json!({ "email": "a@x.com", "aud": "anything" }));
        assert!(identity_from_claims(info, None, NOW).is_ok());
    }

    #[test]
    fn test_missing_email_rejected() {
        let info = claims(serde_json::json!({ "name": "Nobody" }));
        assert!(matches!(
            identity_from_claims(info, None, NOW),
            Err(QuizError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_missing_name_falls_back_to_email() {
        let info = claims(serde_json::json!({ "email": "b@x.com" }));
        let identity = identity_from_claims(info, None, NOW).unwrap();
        assert_eq!(identity.name, "b@x.com");
        assert!(identity.picture.is_none());
    }
}
