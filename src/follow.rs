use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::auth::require_account;
use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, parse_body, path_tail, validate_uuid};
use crate::core::store::{KvStore, KvStoreExt};
use crate::models::models::Account;
use crate::users;

pub fn follow_user(store: &dyn KvStore, follower_id: &str, following_id: &str) -> Result<(), ApiError> {
    if follower_id == following_id {
        return Err(ApiError::BadRequest("You cannot follow yourself".to_string()));
    }

    let followings_key = followings_key(follower_id);
    let mut followings: Vec<String> = store.get_json(&followings_key)?.unwrap_or_default();

    if followings.iter().any(|id| id == following_id) {
        return Err(ApiError::Conflict("Already following".to_string()));
    }

    followings.push(following_id.to_string());
    store.set_json(&followings_key, &followings)?;
    info!(follower = follower_id, following = following_id, "follow created");

    Ok(())
}

pub fn unfollow_user(store: &dyn KvStore, follower_id: &str, following_id: &str) -> anyhow::Result<()> {
    let followings_key = followings_key(follower_id);
    let mut followings: Vec<String> = store.get_json(&followings_key)?.unwrap_or_default();

    followings.retain(|id| id != following_id);
    store.set_json(&followings_key, &followings)?;

    Ok(())
}

pub fn get_followings(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Vec<String>> {
    let followings: Vec<String> = store.get_json(&followings_key(user_id))?.unwrap_or_default();
    Ok(followings)
}

pub fn get_followers(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Vec<String>> {
    let users: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    let mut followers = Vec::new();

    for id in users {
        if get_followings(store, &id)?.iter().any(|f| f == user_id) {
            followers.push(id);
        }
    }

    Ok(followers)
}

/// Accepts either `target_user_id` or `target_name`.
fn resolve_target(store: &dyn KvStore, value: &serde_json::Value) -> Result<Account, ApiError> {
    if let Some(id) = value["target_user_id"].as_str().filter(|id| !id.is_empty()) {
        if !validate_uuid(id) {
            return Err(ApiError::BadRequest("Invalid target user".to_string()));
        }
        return users::load_account(store, id)?
            .ok_or_else(|| ApiError::NotFound("Target user not found".to_string()));
    }

    if let Some(name) = value["target_name"].as_str().filter(|n| !n.is_empty()) {
        return users::find_by_name(store, name)?
            .ok_or_else(|| ApiError::NotFound("Target user not found".to_string()));
    }

    Err(ApiError::BadRequest("Invalid target user".to_string()))
}

pub fn follow_by_name(store: &dyn KvStore, follower: &Account, name: &str) -> Result<Account, ApiError> {
    let target = users::find_by_name(store, name)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    follow_user(store, &follower.id, &target.id)?;
    Ok(target)
}

pub fn unfollow_by_name(store: &dyn KvStore, follower: &Account, name: &str) -> Result<Account, ApiError> {
    let target = users::find_by_name(store, name)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    unfollow_user(store, &follower.id, &target.id)?;
    Ok(target)
}

// === HTTP Handlers ===

pub fn handle_follow(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    let target = resolve_target(store, &parse_body(req)?)?;

    follow_user(store, &account.id, &target.id)?;

    json_response(200, &serde_json::json!({"status": "followed"}))
}

pub fn handle_unfollow(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    let target = resolve_target(store, &parse_body(req)?)?;

    unfollow_user(store, &account.id, &target.id)?;

    json_response(200, &serde_json::json!({"status": "unfollowed"}))
}

pub fn get_followings_list(store: &dyn KvStore, path: &str) -> Result<Response, ApiError> {
    let user_id = path_tail(path, "/followings/");

    if user_id.is_empty() || !validate_uuid(user_id) {
        return Err(ApiError::BadRequest("User ID required".to_string()));
    }

    json_response(200, &get_followings(store, user_id)?)
}

pub fn get_followers_list(store: &dyn KvStore, path: &str) -> Result<Response, ApiError> {
    let user_id = path_tail(path, "/followers/");

    if user_id.is_empty() || !validate_uuid(user_id) {
        return Err(ApiError::BadRequest("User ID required".to_string()));
    }

    json_response(200, &get_followers(store, user_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::sign_up;
    use crate::core::store::MemoryStore;

    #[test]
    fn follow_edges_are_directed_and_unique() {
        let store = MemoryStore::new();
        let (a, _) = sign_up(&store, "Amrita", "amrita@example.com", "secret1").unwrap();
        let (b, _) = sign_up(&store, "Sahir", "sahir@example.com", "secret1").unwrap();

        follow_user(&store, &a.id, &b.id).unwrap();
        assert!(matches!(follow_user(&store, &a.id, &b.id), Err(ApiError::Conflict(_))));

        assert_eq!(get_followings(&store, &a.id).unwrap(), vec![b.id.clone()]);
        assert_eq!(get_followers(&store, &b.id).unwrap(), vec![a.id.clone()]);
        assert!(get_followers(&store, &a.id).unwrap().is_empty());

        unfollow_user(&store, &a.id, &b.id).unwrap();
        unfollow_user(&store, &a.id, &b.id).unwrap();
        assert!(get_followers(&store, &b.id).unwrap().is_empty());
    }

    #[test]
    fn cannot_follow_self() {
        let store = MemoryStore::new();
        let (a, _) = sign_up(&store, "Amrita", "amrita@example.com", "secret1").unwrap();
        assert!(matches!(follow_user(&store, &a.id, &a.id), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn follow_by_display_name() {
        let store = MemoryStore::new();
        let (a, _) = sign_up(&store, "Amrita", "amrita@example.com", "secret1").unwrap();
        let (b, _) = sign_up(&store, "Sahir", "sahir@example.com", "secret1").unwrap();

        let target = follow_by_name(&store, &a, "Sahir").unwrap();
        assert_eq!(target.id, b.id);
        assert!(matches!(
            follow_by_name(&store, &a, "Nobody"),
            Err(ApiError::NotFound(_))
        ));
    }
}
