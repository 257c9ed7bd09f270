use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{AppError, AppResult};
use crate::forms::SignUp;
use crate::state::DbPool;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

/// Outcome of a sign-up attempt that did not hit an infrastructure error.
#[derive(Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    Created { user_id: String },
    EmailTaken,
}

/// Create the user and its profile in one transaction.
pub fn create_account(pool: &DbPool, sign_up: &SignUp) -> AppResult<SignUpOutcome> {
    let mut conn = pool.get()?;

    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![sign_up.email],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(SignUpOutcome::EmailTaken);
    }

    let password_hash = bcrypt::hash(&sign_up.password, HASH_COST)?;
    let user_id = uuid::Uuid::now_v7().to_string();
    insert_account(&mut conn, &user_id, sign_up, &password_hash)
}

/// The `users.email` unique index settles sign-ups that race past the lookup.
fn insert_account(
    conn: &mut Connection,
    user_id: &str,
    sign_up: &SignUp,
    password_hash: &str,
) -> AppResult<SignUpOutcome> {
    let tx = conn.transaction()?;
    match tx.execute(
        "INSERT INTO users (id, email, password_hash) VALUES (?1, ?2, ?3)",
        params![user_id, sign_up.email, password_hash],
    ) {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            tracing::info!("Sign-up lost a race for an existing email");
            return Ok(SignUpOutcome::EmailTaken);
        }
        Err(e) => return Err(e.into()),
    }
    tx.execute(
        "INSERT INTO profiles (id, name) VALUES (?1, ?2)",
        params![user_id, sign_up.name],
    )?;
    tx.commit()?;

    tracing::info!(user_id = %user_id, "Account created");
    Ok(SignUpOutcome::Created {
        user_id: user_id.to_string(),
    })
}

/// Returns the user id when the email exists and the password matches.
pub fn verify_credentials(pool: &DbPool, email: &str, password: &str) -> AppResult<Option<String>> {
    let conn = pool.get()?;

    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM users WHERE email = ?1",
            params![email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((user_id, hash)) = row else {
        return Ok(None);
    };

    match bcrypt::verify(password, &hash) {
        Ok(true) => Ok(Some(user_id)),
        Ok(false) => Ok(None),
        Err(e) => Err(AppError::Password(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn ada() -> SignUp {
        SignUp {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "analytical".into(),
        }
    }

    #[test]
    fn sign_up_creates_user_and_profile() {
        let pool = db::test_pool();
        let SignUpOutcome::Created { user_id } = create_account(&pool, &ada()).unwrap() else {
            panic!("expected account to be created");
        };

        let conn = pool.get().unwrap();
        let (name, hash): (String, String) = conn
            .query_row(
                "SELECT p.name, u.password_hash FROM users u JOIN profiles p ON p.id = u.id
                 WHERE u.id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(name, "Ada");
        assert_ne!(hash, "analytical");
    }

    #[test]
    fn duplicate_email_is_reported() {
        let pool = db::test_pool();
        create_account(&pool, &ada()).unwrap();
        assert_eq!(
            create_account(&pool, &ada()).unwrap(),
            SignUpOutcome::EmailTaken
        );
    }

    #[test]
    fn racing_duplicate_email_is_reported_not_failed() {
        let pool = db::test_pool();
        create_account(&pool, &ada()).unwrap();

        // a second writer that passed the lookup before the first committed
        let mut conn = pool.get().unwrap();
        let outcome = insert_account(&mut conn, "late-user", &ada(), "hash").unwrap();
        assert_eq!(outcome, SignUpOutcome::EmailTaken);

        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap();
        let profiles: i64 = conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
            .unwrap();
        assert_eq!((users, profiles), (1, 1));
    }

    #[test]
    fn credentials_are_checked() {
        let pool = db::test_pool();
        let SignUpOutcome::Created { user_id } = create_account(&pool, &ada()).unwrap() else {
            panic!("expected account to be created");
        };

        assert_eq!(
            verify_credentials(&pool, "ada@example.com", "analytical").unwrap(),
            Some(user_id)
        );
        assert_eq!(
            verify_credentials(&pool, "ada@example.com", "wrong-pass").unwrap(),
            None
        );
        assert_eq!(
            verify_credentials(&pool, "bob@example.com", "analytical").unwrap(),
            None
        );
    }
}
