//! JWT authentication: verifies the bearer token a client presents when
//! upgrading to a websocket connection, and mints the token a client uses
//! in its login/lobby flow.
//!
//! Grounded on `messaging/socket/auth.go`'s `VerifyToken`/`CreateToken`:
//! HS256, a `playerId`/`name`/`exp` claim set, signed with the shared
//! secret from configuration rather than a hardcoded literal.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaim {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    pub exp: i64,
}

pub struct AuthService {
    secret: String,
}

impl AuthService {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    pub fn create_token(&self, player_id: &str, name: &str) -> GameResult<String> {
        let claims = AuthClaim {
            player_id: player_id.to_string(),
            name: name.to_string(),
            exp: (chrono::Utc::now() + chrono::Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| GameError::Unauthorized.tap_log(e))
    }

    /// Returns the authenticated player's id and display name.
    pub fn verify_token(&self, token: &str) -> GameResult<(String, String)> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<AuthClaim>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation)
            .map_err(|_| GameError::Unauthorized)?;

        Ok((data.claims.player_id, data.claims.name))
    }
}

/// `jsonwebtoken`'s own error carries no client-useful detail beyond "401";
/// logging it here keeps that detail out of the return type.
trait TapLog {
    fn tap_log(self, err: jsonwebtoken::errors::Error) -> GameError;
}

impl TapLog for GameError {
    fn tap_log(self, err: jsonwebtoken::errors::Error) -> GameError {
        tracing::warn!(%err, "token signing failed");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let auth = AuthService::new("test-secret".to_string());
        let token = auth.create_token("player-1", "Alice").unwrap();
        let (player_id, name) = auth.verify_token(&token).unwrap();
        assert_eq!(player_id, "player-1");
        assert_eq!(name, "Alice");
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let signer = AuthService::new("secret-a".to_string());
        let verifier = AuthService::new("secret-b".to_string());
        let token = signer.create_token("player-1", "Alice").unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn rejects_garbage() {
        let auth = AuthService::new("test-secret".to_string());
        assert!(auth.verify_token("not-a-token").is_err());
    }
}
