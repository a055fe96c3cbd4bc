use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

// === Limits ===
pub const MAX_POST_LENGTH: usize = 5000;
pub const MIN_NAME_LENGTH: usize = 1;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_BIO_LENGTH: usize = 500;
pub const MAX_PHONE_LENGTH: usize = 32;
pub const MAX_MEDIA_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_SEARCH_LIMIT: usize = 5;
pub const CHANGE_LOG_CAPACITY: usize = 200;
pub const GUEST_VISIBLE_POSTS: usize = 2;
pub const TOAST_TTL_SECS: i64 = 3;

pub const DEFAULT_AUTHOR_NAME: &str = "Anonymous";
pub const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

// === Key layout ===
pub const USERS_LIST_KEY: &str = "users_list";
pub const FEED_KEY: &str = "feed";
pub const TOKENS_LIST_KEY: &str = "tokens_list";
pub const VERIFICATION_LIST_KEY: &str = "verification_list";
pub const MEDIA_LIST_KEY: &str = "media_list";
pub const CHANGES_KEY: &str = "changes";
pub const CHANGE_SEQ_KEY: &str = "changes_seq";

pub fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

pub fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

pub fn token_key(token: &str) -> String {
    format!("token:{}", token)
}

pub fn followings_key(user_id: &str) -> String {
    format!("followings:{}", user_id)
}

pub fn likes_key(user_id: &str) -> String {
    format!("likes:{}", user_id)
}

pub fn likers_key(post_id: &str) -> String {
    format!("likers:{}", post_id)
}

pub fn favorites_key(user_id: &str) -> String {
    format!("favorites:{}", user_id)
}

pub fn verification_key(id: &str) -> String {
    format!("verification:{}", id)
}

pub fn media_meta_key(public_id: &str) -> String {
    format!("media:{}", public_id)
}

pub fn media_blob_key(public_id: &str) -> String {
    format!("media_blob:{}", public_id)
}

// === Per-request knobs ===
pub fn token_expiration_hours() -> i64 {
    std::env::var("RUHVERSE_TOKEN_EXPIRATION_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(24)
}

pub fn media_base_url() -> String {
    std::env::var("RUHVERSE_MEDIA_BASE_URL")
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_default()
}

/// Emails that are granted the admin flag when they sign up.
pub fn admin_emails() -> Vec<String> {
    std::env::var("RUHVERSE_ADMIN_EMAILS")
        .unwrap_or_default()
        .split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

// === Process config ===
pub struct Config {
    pub port: u16,
    pub health_port: u16,
    pub seed_demo: bool,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUHVERSE_PORT", "80"),
            health_port: try_load("PORT", "3000"),
            seed_demo: try_load("RUHVERSE_SEED_DEMO", "false"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            fallback(default)
        }
    }
}

fn fallback<T: FromStr>(default: &str) -> T
where
    T::Err: Display,
{
    match default.parse() {
        Ok(value) => value,
        Err(e) => unreachable!("built-in default {default:?} must parse: {e}"),
    }
}
