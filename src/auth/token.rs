use std::collections::BTreeSet;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::scope::Scope;
use crate::clock::SharedClock;
use crate::config::AuthSettings;

/// Tier assumed when a token request or a token omits one.
pub const DEFAULT_TIER: &str = "basic";

#[derive(Error, Diagnostic, Debug, PartialEq)]
pub enum TokenError {
    /// Bad signature, wrong issuer or audience, expired or malformed. The
    /// reason is deliberately not exposed.
    #[error("Invalid token")]
    #[diagnostic(code(mcpw::auth::invalid_token))]
    Invalid,

    #[error("Failed to sign token: {0}")]
    #[diagnostic(code(mcpw::auth::signing))]
    Signing(String),
}

/// Identity attached to a request once its bearer token verifies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: String,
    pub scopes: BTreeSet<String>,
    pub tier: String,
}

impl Principal {
    /// `admin` satisfies everything, `write` also satisfies `read`, anything
    /// else needs an exact match.
    pub fn has_scope(&self, required: Scope) -> bool {
        if self.scopes.contains(Scope::Admin.as_str()) {
            return true;
        }
        if required == Scope::Read && self.scopes.contains(Scope::Write.as_str()) {
            return true;
        }
        self.scopes.contains(required.as_str())
    }
}

/// A freshly signed token and its lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    /// Space-joined scope list.
    #[serde(default)]
    scope: String,
    #[serde(default)]
    tier: Option<String>,
    jti: String,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
///
/// Tokens are not stored anywhere; rotating the secret invalidates every
/// token issued with the old one.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    lifetime: Duration,
    clock: SharedClock,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings, clock: SharedClock) -> Self {
        Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
            lifetime: Duration::minutes(settings.token_lifetime_minutes),
            clock,
        }
    }

    /// Lifetime of tokens from [`TokenIssuer::issue`], in seconds.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    pub fn issue(
        &self,
        subject_id: &str,
        scopes: &[String],
        tier: &str,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_with_lifetime(subject_id, scopes, tier, self.lifetime)
    }

    /// Issue a token with an explicit lifetime. A negative lifetime yields a
    /// token that is already expired.
    pub fn issue_with_lifetime(
        &self,
        subject_id: &str,
        scopes: &[String],
        tier: &str,
        lifetime: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: subject_id.to_string(),
            scope: scopes.join(" "),
            tier: Some(tier.to_string()),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: lifetime.num_seconds(),
        })
    }

    /// Verify signature, issuer, audience and expiry with no clock skew.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;
        // Expiry is checked below against the injected clock.
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Invalid);
        }

        Ok(Principal {
            subject_id: claims.sub,
            scopes: claims
                .scope
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            tier: claims
                .tier
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TIER.to_string()),
        })
    }
}
