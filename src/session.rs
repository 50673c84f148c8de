use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::models::AuthUser;
use crate::repository::Users;
use crate::storage::{self, keys, Store};

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

/// The current login, kept under [`keys::CURRENT_USER`].
///
/// There is no token and no expiry; whatever sits under the key is the session.
pub struct Session<'s> {
    store: &'s dyn Store,
}

impl<'s> Session<'s> {
    pub fn new(store: &'s dyn Store) -> Self {
        Session { store }
    }

    /// Checks the credentials and, on success, persists and returns the session user.
    ///
    /// A failed attempt leaves any existing session in place.
    pub fn login(&self, username: &str, password: &str) -> Option<AuthUser> {
        let user = match Users::new(self.store).by_username(username) {
            Some(user) => user,
            None => {
                log::info!("login rejected: unknown user '{username}'");
                return None;
            }
        };
        if !verify_password(password, &user.password_hash) {
            log::info!("login rejected: bad password for '{username}'");
            return None;
        }
        let auth = AuthUser::from(&user);
        storage::write(self.store, keys::CURRENT_USER, &auth);
        log::info!("logged in as '{}' ({})", auth.username, auth.role);
        Some(auth)
    }

    pub fn logout(&self) {
        storage::remove(self.store, keys::CURRENT_USER);
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        storage::read(self.store, keys::CURRENT_USER, None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_rejects_garbage_hashes() {
        assert!(!verify_password("admin123", "admin123"));
        assert!(!verify_password("admin123", ""));
    }

    #[test]
    fn hash_round_trips_through_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("S3cret", &hash));
    }
}
