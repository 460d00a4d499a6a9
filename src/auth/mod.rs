//! 認証（ストア上のユーザー一覧とセッショントークン）
//!
//! 最初に登録したユーザーが管理者になる。ログイン状態はストアの
//! `authToken` キーに保存したトークンで表す。

pub mod token;

pub use token::{generate_id, generate_token, hash_password, verify_password, verify_token, TokenClaims};

use crate::config::Config;
use crate::error::{Result, WaterFootprintError};
use crate::store::{KeyValueStore, KeyValueStoreExt, AUTH_TOKEN_KEY, USERS_KEY};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use water_footprint_common::{AuthToken, Role, User};

pub const MIN_PASSWORD_LEN: usize = 6;

/// ストアに保存するユーザー（パスワードハッシュつき）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(flatten)]
    user: User,
    password_hash: String,
}

fn is_valid_email(email: &str) -> bool {
    lazy_static::lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub struct AuthService<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    secret: String,
    token_ttl: chrono::Duration,
}

impl<'a, S: KeyValueStore + ?Sized> AuthService<'a, S> {
    pub fn new(store: &'a S, secret: impl Into<String>, token_ttl: chrono::Duration) -> Self {
        Self {
            store,
            secret: secret.into(),
            token_ttl,
        }
    }

    pub fn from_config(store: &'a S, config: &Config) -> Result<Self> {
        Ok(Self::new(store, config.password_secret.clone(), config.token_ttl()?))
    }

    fn users(&self) -> Result<Vec<StoredUser>> {
        self.store.load_or_default(USERS_KEY)
    }

    /// ユーザー登録。成功するとそのままログイン状態になる
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() {
            return Err(WaterFootprintError::Validation("名前を入力してください".into()));
        }
        if !is_valid_email(email) {
            return Err(WaterFootprintError::Validation(format!(
                "メールアドレスの形式が正しくありません: {}",
                email
            )));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(WaterFootprintError::Validation(format!(
                "パスワードは{}文字以上にしてください",
                MIN_PASSWORD_LEN
            )));
        }

        let mut users = self.users()?;
        if users.iter().any(|u| u.user.email == email) {
            return Err(WaterFootprintError::EmailAlreadyRegistered);
        }

        let role = if users.is_empty() { Role::Admin } else { Role::User };
        let user = User {
            id: generate_id(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
            is_active: true,
        };

        // 期限が作れない場合はユーザーも保存しない
        let token = generate_token(&user, self.token_ttl)?;

        users.push(StoredUser {
            user: user.clone(),
            password_hash: hash_password(password, &self.secret),
        });
        self.store.save(USERS_KEY, &users)?;
        tracing::info!("ユーザーを登録しました: {} ({})", user.email, user.role);

        self.store.save(AUTH_TOKEN_KEY, &token)?;
        Ok(user)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        let users = self.users()?;

        let found = users
            .into_iter()
            .find(|u| u.user.email == email)
            .ok_or(WaterFootprintError::InvalidCredentials)?;

        if !verify_password(password, &self.secret, &found.password_hash) {
            tracing::debug!("パスワード不一致: {}", email);
            return Err(WaterFootprintError::InvalidCredentials);
        }

        if !found.user.is_active {
            return Err(WaterFootprintError::AccountInactive);
        }

        self.start_session(&found.user)?;
        tracing::info!("ログインしました: {}", found.user.email);
        Ok(found.user)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.remove(AUTH_TOKEN_KEY)
    }

    fn start_session(&self, user: &User) -> Result<AuthToken> {
        let token = generate_token(user, self.token_ttl)?;
        self.store.save(AUTH_TOKEN_KEY, &token)?;
        Ok(token)
    }

    /// 保存済みトークンからログイン中のユーザーを復元
    ///
    /// 期限切れ・不正なトークンはストアから消してNoneを返す。
    pub fn current_user(&self) -> Result<Option<User>> {
        let token: AuthToken = match self.store.load(AUTH_TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(WaterFootprintError::JsonParse(e)) => {
                tracing::warn!("保存されたトークンが不正です: {}", e);
                self.store.remove(AUTH_TOKEN_KEY)?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match verify_token(&token.token) {
            Some(_) => Ok(Some(token.user)),
            None => {
                tracing::info!("セッションの期限が切れました: {}", token.user.email);
                self.store.remove(AUTH_TOKEN_KEY)?;
                Ok(None)
            }
        }
    }

    pub fn require_user(&self) -> Result<User> {
        self.current_user()?.ok_or(WaterFootprintError::NotAuthenticated)
    }

    pub fn require_admin(&self) -> Result<User> {
        let user = self.require_user()?;
        if !user.is_admin() {
            return Err(WaterFootprintError::NotAuthorized);
        }
        Ok(user)
    }
}
