use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use ammonia::Builder;
use rand::rngs::OsRng;
use regex::Regex;
use serde::Serialize;
use spin_sdk::http::{Request, Response};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::core::errors::ApiError;

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn validate_uuid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Regex should compile")
    })
}

pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Strips every HTML tag, leaving plain text.
pub fn sanitize_text(text: &str) -> String {
    Builder::default()
        .tags(std::collections::HashSet::new())
        .clean(text)
        .to_string()
}

pub fn avatar_for_seed(seed: &str) -> String {
    format!("{}{}", crate::config::AVATAR_BASE_URL, urlencoding::encode(seed))
}

pub fn parse_body(req: &Request) -> Result<serde_json::Value, ApiError> {
    serde_json::from_slice(req.body()).map_err(|_| ApiError::BadRequest("Invalid JSON body".to_string()))
}

/// Last path segment, e.g. the id in `/shayaris/<id>`.
pub fn path_tail<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.trim_start_matches(prefix).trim_matches('/')
}

pub fn json_response<T: Serialize>(status: u16, value: &T) -> Result<Response, ApiError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_vec(value)?)
        .build())
}

pub fn no_content() -> Response {
    Response::builder().status(204).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_password("secret1", &hash));
        assert!(!verify_password("secret2", &hash));
        assert!(!verify_password("secret1", "not-a-hash"));
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("mir@ruhverse.app"));
        assert!(!validate_email("mir@ruhverse"));
        assert!(!validate_email("no spaces@x.io"));
    }

    #[test]
    fn sanitize_strips_tags() {
        assert_eq!(sanitize_text("<b>Ghalib</b>"), "Ghalib");
    }

    #[test]
    fn avatar_seed_is_encoded() {
        assert_eq!(
            avatar_for_seed("Mirza Ghalib"),
            "https://api.dicebear.com/7.x/avataaars/svg?seed=Mirza%20Ghalib"
        );
    }

    #[test]
    fn tail_of_path() {
        assert_eq!(path_tail("/shayaris/abc", "/shayaris/"), "abc");
        assert_eq!(path_tail("/followers/", "/followers/"), "");
    }
}
