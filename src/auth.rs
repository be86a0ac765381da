// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Users, passwords and bearer-token sessions.
//!
//! A token is accepted only when its JWT signature and expiry check out
//! AND a matching, unexpired session row exists. Logging out deletes the
//! row, which invalidates the token even though the JWT itself is still
//! well-formed.

use argon2::{
    Argon2,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use once_cell::sync::Lazy;
use rand::{Rng, RngCore};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AuthSettings;
use crate::currencies;
use crate::error::{FinanceError, Result};
use crate::ledger::{self, NewAccount};
use crate::models::{Account, Session, User};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

const MIN_PASSWORD_LEN: usize = 6;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, default_currency_id, created_at, updated_at";

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        username: r.get(1)?,
        email: r.get(2)?,
        password_hash: r.get(3)?,
        default_currency_id: r.get(4)?,
        created_at: r.get(5)?,
        updated_at: r.get(6)?,
    })
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1"),
            params![id],
            user_from_row,
        )
        .optional()?)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email=?1"),
            params![normalize_email(email)],
            user_from_row,
        )
        .optional()?)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| FinanceError::Internal(format!("Failed to encode salt: {}", e)))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| FinanceError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(hash: &str, candidate: &str) -> Result<()> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| FinanceError::Internal(format!("Invalid stored password hash: {}", e)))?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|err| match err {
            PasswordHashError::Password => FinanceError::InvalidCredentials,
            other => FinanceError::Internal(format!("Password verification failed: {}", other)),
        })
}

pub fn register(conn: &Connection, new: &NewUser) -> Result<User> {
    let username = new.username.trim();
    let email = normalize_email(&new.email);
    if username.is_empty() {
        return Err(FinanceError::Validation("username is required".into()));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(FinanceError::Validation(format!(
            "'{}' is not a valid email",
            new.email
        )));
    }
    if new.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FinanceError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if get_user_by_email(conn, &email)?.is_some() {
        return Err(FinanceError::EmailTaken(email));
    }

    let hash = hash_password(&new.password)?;
    let now = Utc::now();
    conn.execute(
        "INSERT INTO users(username, email, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![username, email, hash, now],
    )?;
    let id = conn.last_insert_rowid();
    info!(user = id, "user registered");
    get_user(conn, id)?.ok_or(FinanceError::UserNotFound(id))
}

/// Record the user's currency. A user without accounts also gets a default
/// account in that currency, which is returned.
pub fn set_default_currency(
    conn: &mut Connection,
    user_id: i64,
    currency_id: i64,
) -> Result<Option<Account>> {
    let currency = currencies::require(conn, currency_id)?;
    let updated = conn.execute(
        "UPDATE users SET default_currency_id=?1, updated_at=?2 WHERE id=?3",
        params![currency.id, Utc::now(), user_id],
    )?;
    if updated == 0 {
        return Err(FinanceError::UserNotFound(user_id));
    }

    if ledger::list_accounts(conn, user_id)?.is_empty() {
        let mut new = NewAccount::new(user_id, currency.id);
        new.is_default = true;
        let account = ledger::create_account(conn, &new)?;
        info!(user = user_id, account = account.id, currency = %currency.code, "default account created");
        return Ok(Some(account));
    }
    Ok(None)
}

pub fn user_with_accounts(conn: &Connection, user_id: i64) -> Result<(User, Vec<Account>)> {
    let user = get_user(conn, user_id)?.ok_or(FinanceError::UserNotFound(user_id))?;
    let accounts = ledger::list_accounts(conn, user.id)?;
    Ok((user, accounts))
}

/// Strip the `Bearer ` scheme from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Result<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(FinanceError::InvalidOrExpiredToken),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Issues and checks session tokens.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: chrono::Duration,
}

impl AuthManager {
    pub fn new(settings: &AuthSettings) -> Result<Self> {
        if settings.jwt_secret.trim().is_empty() {
            return Err(FinanceError::Validation("JWT secret cannot be empty".into()));
        }
        let secret = settings.jwt_secret.as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            session_ttl: settings.session_ttl,
        })
    }

    fn issue_token(&self, user: &User, now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            jti: format!("{:016x}", rand::thread_rng().r#gen::<u64>()),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| FinanceError::Internal(format!("Failed to sign token: {}", e)))
    }

    fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                FinanceError::InvalidOrExpiredToken
            })
    }

    /// Check credentials and open a session. Returns the user and its token.
    pub fn login(&self, conn: &Connection, email: &str, password: &str) -> Result<(User, String)> {
        let user = get_user_by_email(conn, email)?.ok_or(FinanceError::InvalidCredentials)?;
        verify_password(&user.password_hash, password)?;

        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        let token = self.issue_token(&user, now, expires_at)?;
        conn.execute(
            "INSERT INTO sessions(user_id, token, expires_at, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user.id, token, expires_at, now],
        )?;
        info!(user = user.id, "session opened");
        Ok((user, token))
    }

    /// Resolve a token to its user, or fail with `InvalidOrExpiredToken`.
    pub fn validate(&self, conn: &Connection, token: &str) -> Result<User> {
        let claims = self.verify_token(token)?;
        let session = live_session(conn, token)?.ok_or(FinanceError::InvalidOrExpiredToken)?;
        if claims.sub != session.user_id.to_string() {
            return Err(FinanceError::InvalidOrExpiredToken);
        }
        get_user(conn, session.user_id)?.ok_or(FinanceError::InvalidOrExpiredToken)
    }

    pub fn logout(&self, conn: &Connection, token: &str) -> Result<()> {
        let removed = conn.execute("DELETE FROM sessions WHERE token=?1", params![token])?;
        debug!(removed, "session closed");
        Ok(())
    }
}

fn live_session(conn: &Connection, token: &str) -> Result<Option<Session>> {
    Ok(conn
        .query_row(
            "SELECT id, user_id, token, expires_at, created_at
             FROM sessions WHERE token=?1 AND expires_at > ?2",
            params![token, Utc::now()],
            |r| {
                Ok(Session {
                    id: r.get(0)?,
                    user_id: r.get(1)?,
                    token: r.get(2)?,
                    expires_at: r.get(3)?,
                    created_at: r.get(4)?,
                })
            },
        )
        .optional()?)
}

/// Delete sessions whose expiry has passed; returns how many were removed.
pub fn purge_expired(conn: &Connection) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![Utc::now()],
    )?;
    Ok(n)
}
