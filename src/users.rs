use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::auth::{require_account, validate_token};
use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{avatar_for_seed, json_response, now_iso, parse_body, path_tail, sanitize_text};
use crate::core::query_params::{get_int, get_string, parse_query_params};
use crate::core::store::{KvStore, KvStoreExt};
use crate::follow;
use crate::models::models::{Account, Profile, ProfileUpdate, SessionState};
use crate::reactions;

pub fn load_account(store: &dyn KvStore, id: &str) -> anyhow::Result<Option<Account>> {
    store.get_json(&user_key(id))
}

pub fn save_account(store: &dyn KvStore, account: &Account) -> anyhow::Result<()> {
    store.set_json(&user_key(&account.id), account)
}

pub fn insert_account(store: &dyn KvStore, account: &Account) -> anyhow::Result<()> {
    save_account(store, account)?;

    let mut users: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    users.push(account.id.clone());
    store.set_json(USERS_LIST_KEY, &users)
}

pub fn all_accounts(store: &dyn KvStore) -> anyhow::Result<Vec<Account>> {
    let users: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    let mut accounts = Vec::with_capacity(users.len());
    for id in users {
        if let Some(account) = load_account(store, &id)? {
            accounts.push(account);
        }
    }
    Ok(accounts)
}

pub fn find_by_email(store: &dyn KvStore, email: &str) -> anyhow::Result<Option<Account>> {
    Ok(all_accounts(store)?.into_iter().find(|a| a.email == email))
}

/// Display names are not unique; the earliest account wins.
pub fn find_by_name(store: &dyn KvStore, name: &str) -> anyhow::Result<Option<Account>> {
    Ok(all_accounts(store)?.into_iter().find(|a| a.full_name == name))
}

pub fn update_profile(
    store: &dyn KvStore,
    account: &mut Account,
    update: &ProfileUpdate,
) -> Result<Profile, ApiError> {
    if let Some(name) = &update.name {
        let name = sanitize_text(name.trim());
        let len = name.chars().count();
        if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len) {
            return Err(ApiError::BadRequest("Name must be 1-50 characters".to_string()));
        }
        account.full_name = name;
    }

    if let Some(bio) = &update.bio {
        if bio.chars().count() > MAX_BIO_LENGTH {
            return Err(ApiError::BadRequest("Bio too long (max 500 chars)".to_string()));
        }
        let sanitized_bio = sanitize_text(bio.trim());
        account.bio = if sanitized_bio.is_empty() { None } else { Some(sanitized_bio) };
    }

    // An uploaded avatar beats a seed change
    if let Some(url) = update.avatar_url.as_deref().filter(|u| !u.is_empty()) {
        account.avatar_url = Some(url.to_string());
    } else if let Some(seed) = update.avatar_seed.as_deref().filter(|s| !s.is_empty()) {
        account.avatar_url = Some(avatar_for_seed(seed));
    }

    account.updated_at = Some(now_iso());
    save_account(store, account)?;
    info!(user_id = %account.id, "profile updated");

    Ok(account.profile())
}

/// Case-insensitive name search, excluding `exclude_id`.
pub fn search_profiles(
    store: &dyn KvStore,
    term: &str,
    exclude_id: Option<&str>,
    limit: usize,
) -> anyhow::Result<Vec<Profile>> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Ok(Vec::new());
    }

    Ok(all_accounts(store)?
        .into_iter()
        .filter(|a| Some(a.id.as_str()) != exclude_id)
        .filter(|a| a.full_name.to_lowercase().contains(&term))
        .take(limit)
        .map(|a| a.profile())
        .collect())
}

pub fn session_state(store: &dyn KvStore, account: &Account) -> anyhow::Result<SessionState> {
    let mut following = Vec::new();
    for id in follow::get_followings(store, &account.id)? {
        if let Some(followed) = load_account(store, &id)? {
            following.push(followed.full_name);
        }
    }

    Ok(SessionState {
        profile: account.profile(),
        likes: reactions::liked_posts(store, &account.id)?,
        favorites: reactions::favorite_posts(store, &account.id)?,
        following,
    })
}

// === HTTP Handlers ===

pub fn get_profile(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    json_response(200, &account.profile())
}

pub fn handle_update_profile(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let mut account = require_account(store, req)?;
    let update: ProfileUpdate = serde_json::from_value(parse_body(req)?)
        .map_err(|_| ApiError::BadRequest("Invalid profile update".to_string()))?;

    let profile = update_profile(store, &mut account, &update)?;
    json_response(200, &profile)
}

pub fn get_public_profile(store: &dyn KvStore, path: &str) -> Result<Response, ApiError> {
    let encoded = path_tail(path, "/profiles/by-name/");
    let name = urlencoding::decode(encoded)
        .map(|n| n.into_owned())
        .unwrap_or_else(|_| encoded.to_string());

    let account = find_by_name(store, &name)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let follower_count = follow::get_followers(store, &account.id)?.len();

    json_response(
        200,
        &serde_json::json!({
            "profile": account.profile(),
            "follower_count": follower_count,
        }),
    )
}

pub fn handle_search(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let params = parse_query_params(&req.uri());
    let term = get_string(&params, "q", Some("")).unwrap_or_default();
    let limit = get_int(&params, "limit", DEFAULT_SEARCH_LIMIT);
    let caller = validate_token(store, req);

    let found = search_profiles(store, &term, caller.as_deref(), limit)?;
    json_response(200, &found)
}
