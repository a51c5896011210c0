use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

/// HS256 signing and verification keys, built once from config at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::seconds(cfg.ttl_hours.saturating_mul(3600)),
        }
    }

    #[cfg(test)]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    /// Signs a token as if issued at `issued_at`; expiry is `issued_at + ttl`.
    pub fn issue_at(&self, user_id: Uuid, issued_at: OffsetDateTime) -> anyhow::Result<String> {
        let exp = issued_at
            .checked_add(self.ttl)
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range"))?;
        let claims = Claims {
            id: user_id,
            exp: exp.unix_timestamp().max(0) as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Checks signature and expiry (no leeway) and returns the claims.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_hours: 72,
        })
    }

    #[test]
    fn issued_token_verifies_to_same_id() {
        let keys = make_keys("dev-secret-dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.id, user_id);
    }

    #[test]
    fn expiry_is_seventy_two_hours_after_issuance() {
        let keys = make_keys("dev-secret-dev-secret");
        let issued_at = OffsetDateTime::now_utc();
        let token = keys.issue_at(Uuid::new_v4(), issued_at).unwrap();
        let claims = keys.verify(&token).unwrap();
        let expected = (issued_at + Duration::hours(72)).unix_timestamp() as usize;
        assert_eq!(claims.exp, expected);
    }

    #[test]
    fn token_near_end_of_window_is_still_valid() {
        let keys = make_keys("dev-secret-dev-secret");
        let issued_at = OffsetDateTime::now_utc() - Duration::hours(71);
        let token = keys.issue_at(Uuid::new_v4(), issued_at).unwrap();
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = make_keys("dev-secret-dev-secret");
        let issued_at = OffsetDateTime::now_utc() - Duration::hours(72) - Duration::minutes(1);
        let token = keys.issue_at(Uuid::new_v4(), issued_at).unwrap();
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let good = make_keys("the-real-secret-value");
        let bad = make_keys("some-other-secret-value");
        let token = bad.issue(Uuid::new_v4()).unwrap();
        assert!(good.verify(&token).is_err());
    }

    #[test]
    fn keys_from_state_share_one_secret() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user_id = Uuid::new_v4();
        let token = state.jwt.issue(user_id).unwrap();
        assert_eq!(keys.verify(&token).unwrap().id, user_id);
        assert_eq!(keys.ttl(), Duration::hours(72));
    }

    #[test]
    fn out_of_range_ttl_fails_to_sign_instead_of_panicking() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret-dev-secret".into(),
            ttl_hours: i64::MAX,
        });
        assert!(keys.issue(Uuid::new_v4()).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let keys = make_keys("dev-secret-dev-secret");
        assert!(keys.verify("not.a.jwt").is_err());
    }
}
