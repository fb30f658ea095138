//! Staff password verification using Argon2id.

use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Verify a plaintext password against the Argon2id PHC string stored on
/// the staff record.
///
/// The hash carries its own parameters, so records hashed with older
/// cost settings keep verifying. `pepper`, when set, is prepended to the
/// password exactly as at hashing time.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let peppered: String;
    let input = match pepper {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let parsed_hash = argon2::PasswordHash::new(hash)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gymdesk_db::repository::hash_password;

    #[test]
    fn stored_hash_verifies() {
        let hash = hash_password("Treino#2025", None).unwrap();
        assert!(verify_password("Treino#2025", &hash, None).unwrap());
        assert!(!verify_password("treino#2025", &hash, None).unwrap());
    }

    #[test]
    fn pepper_must_match() {
        let hash = hash_password("Treino#2025", Some("pimenta")).unwrap();
        assert!(verify_password("Treino#2025", &hash, Some("pimenta")).unwrap());
        assert!(!verify_password("Treino#2025", &hash, None).unwrap());
        assert!(!verify_password("Treino#2025", &hash, Some("sal")).unwrap());
    }

    #[test]
    fn malformed_hash_returns_error() {
        assert!(matches!(
            verify_password("pw", "not-a-hash", None),
            Err(AuthError::Crypto(_))
        ));
    }
}
