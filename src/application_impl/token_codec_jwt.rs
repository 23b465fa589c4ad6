use crate::application_port::*;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub verification_ttl: Duration,
    pub signing_key: Vec<u8>,
}

/// Keeps a token of one kind from being accepted as another.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TokenKind {
    Access,
    Refresh,
    Verification,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
    kind: TokenKind,
}

fn encode_claims(
    uid: UserId,
    jti: String,
    kind: TokenKind,
    ttl: Duration,
    cfg: &JwtConfig,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + ttl;
    let claims = Claims {
        sub: uid.0.to_string(),
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
        jti,
        kind,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

fn decode_claims(token: &str, kind: TokenKind, cfg: &JwtConfig) -> Result<Claims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.leeway = 0;
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
    if data.claims.kind != kind {
        return Err(AuthError::TokenInvalid);
    }
    Ok(data.claims)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[inline]
    fn parse_user_id(sub: &str) -> Result<UserId, AuthError> {
        sub.parse::<UserId>().map_err(|_| AuthError::TokenInvalid)
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
        jti: Option<String>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let jti = jti.unwrap_or_else(Self::gen_jti);
        let (token, exp_dt) =
            encode_claims(user, jti, TokenKind::Access, self.cfg.access_ttl, &self.cfg)?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        user: UserId,
        jti: String,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) =
            encode_claims(user, jti, TokenKind::Refresh, self.cfg.refresh_ttl, &self.cfg)?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn issue_verification_token(
        &self,
        user: UserId,
    ) -> Result<VerificationToken, AuthError> {
        let (token, _) = encode_claims(
            user,
            Self::gen_jti(),
            TokenKind::Verification,
            self.cfg.verification_ttl,
            &self.cfg,
        )?;
        Ok(VerificationToken(token))
    }

    async fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let claims = decode_claims(&token.0, TokenKind::Access, &self.cfg)?;
        let user_id = Self::parse_user_id(&claims.sub)?;
        Ok(TokenVerifyResult {
            user_id,
            jti: Some(claims.jti),
        })
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<TokenVerifyResult, AuthError> {
        let claims = decode_claims(&token.0, TokenKind::Refresh, &self.cfg)?;
        let user_id = Self::parse_user_id(&claims.sub)?;
        Ok(TokenVerifyResult {
            user_id,
            jti: Some(claims.jti),
        })
    }

    async fn verify_verification_token(
        &self,
        token: &VerificationToken,
    ) -> Result<UserId, AuthError> {
        let claims = decode_claims(&token.0, TokenKind::Verification, &self.cfg)?;
        Self::parse_user_id(&claims.sub)
    }
}
