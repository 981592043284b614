use crate::db::DatabasePool;
use crate::error::AppError;
use crate::forms::{Credentials, PasswordChange, Registration};
use crate::models::User;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use rusqlite::{ErrorCode, OptionalExtension};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key under which the logged in user is stored.
pub const SESSION_KEY: &str = "SESSION";

/// The authenticated user bound to the current session.
///
/// Used as an extractor, it gates a handler: requests without a session are
/// redirected to `/login` before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match validate_session(&session).await {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(Redirect::to("/login").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Return the user bound to the session, if any.
pub async fn validate_session(session: &Session) -> Result<Option<SessionUser>, AppError> {
    Ok(session.get::<SessionUser>(SESSION_KEY).await?)
}

/// Bind `user` to the session under a fresh session id.
pub async fn start_session(session: &Session, user: &SessionUser) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(SESSION_KEY, user).await?;
    Ok(())
}

/// Forget the session entirely, removing it from the store.
pub async fn end_session(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(AppError::Hash)?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Create a new user and return its session identity.
pub async fn register(pool: &DatabasePool, reg: Registration) -> Result<SessionUser, AppError> {
    let hash = hash_password(&reg.password)?;

    let mut conn = pool.lock().await;
    let tx = conn.transaction()?;

    let taken: Option<i64> = tx
        .query_row(
            "SELECT id FROM users WHERE username = ?",
            [&reg.username],
            |row| row.get(0),
        )
        .optional()?;
    if taken.is_some() {
        return Err(AppError::Conflict("invalid username"));
    }

    tx.execute(
        "INSERT INTO users (username, hash) VALUES (?, ?)",
        rusqlite::params![&reg.username, &hash],
    )
    .map_err(|e| match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => AppError::Conflict("invalid username"),
        _ => AppError::Database(e),
    })?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    tracing::info!("Registered user {} ({})", reg.username, id);
    Ok(SessionUser {
        id,
        username: reg.username,
    })
}

/// Check credentials and return the matching user.
pub async fn login(pool: &DatabasePool, creds: Credentials) -> Result<SessionUser, AppError> {
    let user = {
        let conn = pool.lock().await;
        find_user_by_name(&conn, &creds.username)?
    };

    match user {
        Some(user) if verify_password(&creds.password, &user.password_hash) => {
            tracing::info!("User {} logged in", user.username);
            Ok(SessionUser {
                id: user.id,
                username: user.username,
            })
        }
        _ => Err(AppError::Auth("invalid username and/or password")),
    }
}

/// Replace the user's password after checking the current one.
///
/// Hashing happens without holding the connection. The update only applies
/// if the stored hash is still the one that was verified.
pub async fn change_password(
    pool: &DatabasePool,
    user_id: i64,
    change: PasswordChange,
) -> Result<(), AppError> {
    let current_hash: String = {
        let conn = pool.lock().await;
        conn.query_row("SELECT hash FROM users WHERE id = ?", [user_id], |row| {
            row.get(0)
        })?
    };
    if !verify_password(&change.current, &current_hash) {
        return Err(AppError::Validation("invalid current password"));
    }

    let hash = hash_password(&change.new)?;
    replace_hash(pool, user_id, &current_hash, &hash).await?;

    tracing::info!("User {} changed password", user_id);
    Ok(())
}

async fn replace_hash(
    pool: &DatabasePool,
    user_id: i64,
    expected: &str,
    hash: &str,
) -> Result<(), AppError> {
    let conn = pool.lock().await;
    let updated = conn.execute(
        "UPDATE users SET hash = ? WHERE id = ? AND hash = ?",
        rusqlite::params![hash, user_id, expected],
    )?;
    if updated == 0 {
        return Err(AppError::Validation("invalid current password"));
    }
    Ok(())
}

fn find_user_by_name(
    conn: &rusqlite::Connection,
    username: &str,
) -> Result<Option<User>, rusqlite::Error> {
    conn.query_row(
        "SELECT id, username, hash, cash FROM users WHERE username = ?",
        [username],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                cash: row.get(3)?,
            })
        },
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(username: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn hashes_verify_only_their_password() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not a hash"));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let pool = DatabasePool::in_memory().unwrap();
        register(&pool, registration("alice", "pw")).await.unwrap();

        let err = register(&pool, registration("alice", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn login_accepts_only_the_right_password() {
        let pool = DatabasePool::in_memory().unwrap();
        let registered = register(&pool, registration("bob", "pw")).await.unwrap();

        let user = login(&pool, credentials("bob", "pw")).await.unwrap();
        assert_eq!(user, registered);

        let err = login(&pool, credentials("bob", "wrong")).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        let err = login(&pool, credentials("nobody", "pw")).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let pool = DatabasePool::in_memory().unwrap();
        let user = register(&pool, registration("carol", "old")).await.unwrap();

        let err = change_password(
            &pool,
            user.id,
            PasswordChange {
                current: "guess".into(),
                new: "new".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation("invalid current password")));

        change_password(
            &pool,
            user.id,
            PasswordChange {
                current: "old".into(),
                new: "new".into(),
            },
        )
        .await
        .unwrap();

        assert!(login(&pool, credentials("carol", "old")).await.is_err());
        assert!(login(&pool, credentials("carol", "new")).await.is_ok());
    }

    #[tokio::test]
    async fn stale_hash_is_not_overwritten() {
        let pool = DatabasePool::in_memory().unwrap();
        let user = register(&pool, registration("dan", "first")).await.unwrap();
        let first_hash: String = pool
            .lock()
            .await
            .query_row("SELECT hash FROM users WHERE id = ?", [user.id], |row| {
                row.get(0)
            })
            .unwrap();

        // Another request changes the password after this one verified
        change_password(
            &pool,
            user.id,
            PasswordChange {
                current: "first".into(),
                new: "second".into(),
            },
        )
        .await
        .unwrap();

        let err = replace_hash(&pool, user.id, &first_hash, &hash_password("third").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation("invalid current password")));
        assert!(login(&pool, credentials("dan", "second")).await.is_ok());
        assert!(login(&pool, credentials("dan", "third")).await.is_err());
    }
}
