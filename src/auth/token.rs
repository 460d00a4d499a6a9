//! パスワードハッシュ・トークン・ID生成
//!
//! トークンは署名なしのbase64(JSON)。改ざん検知は行わない。

use crate::error::{Result, WaterFootprintError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use water_footprint_common::{AuthToken, Role, User};

/// トークンに埋め込む内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    /// 有効期限（エポックミリ秒）
    pub exp: i64,
}

/// SHA-256(password + secret) の16進表記
pub fn hash_password(password: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, secret: &str, hash: &str) -> bool {
    hash_password(password, secret) == hash
}

pub fn encode_claims(claims: &TokenClaims) -> Result<String> {
    let json = serde_json::to_vec(claims)?;
    Ok(STANDARD.encode(json))
}

pub fn generate_token(user: &User, ttl: chrono::Duration) -> Result<AuthToken> {
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| WaterFootprintError::Config("トークンの有効期限が範囲外です".into()))?
        .timestamp_millis();
    let claims = TokenClaims {
        user_id: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
        exp: expires_at,
    };

    Ok(AuthToken {
        token: encode_claims(&claims)?,
        expires_at,
        user: user.clone(),
    })
}

/// 期限切れ・不正なトークンはNone
pub fn verify_token(token: &str) -> Option<TokenClaims> {
    verify_token_at(token, Utc::now().timestamp_millis())
}

pub fn verify_token_at(token: &str, now_ms: i64) -> Option<TokenClaims> {
    let bytes = STANDARD.decode(token.trim()).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    if claims.exp < now_ms {
        return None;
    }
    Some(claims)
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// "<エポックミリ秒>-<base36の9文字>"
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}
