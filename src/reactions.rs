//! Likes (public hearts) and favorites (private bookmarks).
//!
//! A like is stored twice: in the liker's list and in the post's liker list,
//! so counts don't need a scan. Favorites only live on the account.

use spin_sdk::http::{Request, Response};
use tracing::debug;

use crate::auth::require_account;
use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::json_response;
use crate::core::store::{KvStore, KvStoreExt};
use crate::posts;

fn ensure_post(store: &dyn KvStore, post_id: &str) -> Result<(), ApiError> {
    match posts::load_post(store, post_id)? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Post not found".to_string())),
    }
}

fn add_unique(store: &dyn KvStore, key: &str, item: &str) -> Result<bool, ApiError> {
    let mut items: Vec<String> = store.get_json(key)?.unwrap_or_default();
    if items.iter().any(|i| i == item) {
        return Ok(false);
    }
    items.push(item.to_string());
    store.set_json(key, &items)?;
    Ok(true)
}

fn remove_item(store: &dyn KvStore, key: &str, item: &str) -> anyhow::Result<()> {
    let mut items: Vec<String> = store.get_json(key)?.unwrap_or_default();
    let before = items.len();
    items.retain(|i| i != item);
    if items.len() != before {
        store.set_json(key, &items)?;
    }
    Ok(())
}

pub fn like(store: &dyn KvStore, user_id: &str, post_id: &str) -> Result<u64, ApiError> {
    ensure_post(store, post_id)?;

    if !add_unique(store, &likes_key(user_id), post_id)? {
        return Err(ApiError::Conflict("Already liked".to_string()));
    }
    add_unique(store, &likers_key(post_id), user_id)?;
    debug!(user_id, post_id, "liked");

    Ok(like_count(store, post_id)?)
}

pub fn unlike(store: &dyn KvStore, user_id: &str, post_id: &str) -> Result<u64, ApiError> {
    remove_item(store, &likes_key(user_id), post_id)?;
    remove_item(store, &likers_key(post_id), user_id)?;

    Ok(like_count(store, post_id)?)
}

pub fn like_count(store: &dyn KvStore, post_id: &str) -> anyhow::Result<u64> {
    let likers: Vec<String> = store.get_json(&likers_key(post_id))?.unwrap_or_default();
    Ok(likers.len() as u64)
}

pub fn liked_posts(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Vec<String>> {
    Ok(store.get_json(&likes_key(user_id))?.unwrap_or_default())
}

pub fn favorite(store: &dyn KvStore, user_id: &str, post_id: &str) -> Result<(), ApiError> {
    ensure_post(store, post_id)?;

    if !add_unique(store, &favorites_key(user_id), post_id)? {
        return Err(ApiError::Conflict("Already in favorites".to_string()));
    }
    Ok(())
}

pub fn unfavorite(store: &dyn KvStore, user_id: &str, post_id: &str) -> anyhow::Result<()> {
    remove_item(store, &favorites_key(user_id), post_id)
}

pub fn favorite_posts(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Vec<String>> {
    Ok(store.get_json(&favorites_key(user_id))?.unwrap_or_default())
}

/// Drops every like and favorite pointing at a deleted post.
pub fn purge_post(store: &dyn KvStore, post_id: &str) -> anyhow::Result<()> {
    let likers: Vec<String> = store.get_json(&likers_key(post_id))?.unwrap_or_default();
    for user_id in &likers {
        remove_item(store, &likes_key(user_id), post_id)?;
    }
    store.delete(&likers_key(post_id))?;

    let users: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    for user_id in &users {
        remove_item(store, &favorites_key(user_id), post_id)?;
    }

    Ok(())
}

// === HTTP Handlers ===

/// `/shayaris/<id>/like` and `/shayaris/<id>/favorite`
fn reaction_target<'a>(path: &'a str, suffix: &str) -> Result<&'a str, ApiError> {
    let post_id = path
        .trim_start_matches("/shayaris/")
        .trim_end_matches(suffix)
        .trim_matches('/');
    if post_id.is_empty() || post_id.contains('/') {
        return Err(ApiError::BadRequest("Post ID required".to_string()));
    }
    Ok(post_id)
}

pub fn handle_like(store: &dyn KvStore, req: &Request, liked: bool) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    let post_id = reaction_target(req.path(), "/like")?;

    let like_count = if liked {
        like(store, &account.id, post_id)?
    } else {
        unlike(store, &account.id, post_id)?
    };

    json_response(200, &serde_json::json!({ "liked": liked, "like_count": like_count }))
}

pub fn handle_favorite(store: &dyn KvStore, req: &Request, favorited: bool) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    let post_id = reaction_target(req.path(), "/favorite")?;

    if favorited {
        favorite(store, &account.id, post_id)?;
    } else {
        unfavorite(store, &account.id, post_id)?;
    }

    json_response(200, &serde_json::json!({ "favorited": favorited }))
}

pub fn list_likes(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    json_response(200, &liked_posts(store, &account.id)?)
}

pub fn list_favorites(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    json_response(200, &favorite_posts(store, &account.id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::sign_up;
    use crate::core::store::MemoryStore;
    use crate::models::models::PostDraft;

    fn setup() -> (MemoryStore, String, String) {
        let store = MemoryStore::new();
        let (account, _) = sign_up(&store, "Parveen", "parveen@example.com", "secret1").unwrap();
        let post = posts::create_post(
            &store,
            &account,
            PostDraft {
                content: "khushboo".into(),
                ..Default::default()
            },
        )
        .unwrap();
        (store, account.id, post.id)
    }

    #[test]
    fn like_pair_is_unique() {
        let (store, user, post) = setup();
        assert_eq!(like(&store, &user, &post).unwrap(), 1);
        assert!(matches!(like(&store, &user, &post), Err(ApiError::Conflict(_))));
        assert_eq!(like_count(&store, &post).unwrap(), 1);
    }

    #[test]
    fn like_then_unlike_restores_count() {
        let (store, user, post) = setup();
        like(&store, &user, &post).unwrap();
        assert_eq!(unlike(&store, &user, &post).unwrap(), 0);
        assert!(liked_posts(&store, &user).unwrap().is_empty());
        // idempotent
        assert_eq!(unlike(&store, &user, &post).unwrap(), 0);
    }

    #[test]
    fn liking_missing_post_is_not_found() {
        let (store, user, _) = setup();
        assert!(matches!(like(&store, &user, "nope"), Err(ApiError::NotFound(_))));
        assert!(matches!(favorite(&store, &user, "nope"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn favorites_are_per_account() {
        let (store, user, post) = setup();
        favorite(&store, &user, &post).unwrap();
        assert!(matches!(favorite(&store, &user, &post), Err(ApiError::Conflict(_))));
        assert_eq!(favorite_posts(&store, &user).unwrap(), vec![post.clone()]);

        unfavorite(&store, &user, &post).unwrap();
        assert!(favorite_posts(&store, &user).unwrap().is_empty());
    }

    #[test]
    fn purge_clears_reactions() {
        let (store, user, post) = setup();
        like(&store, &user, &post).unwrap();
        favorite(&store, &user, &post).unwrap();

        purge_post(&store, &post).unwrap();
        assert!(liked_posts(&store, &user).unwrap().is_empty());
        assert!(favorite_posts(&store, &user).unwrap().is_empty());
        assert_eq!(like_count(&store, &post).unwrap(), 0);
    }

    #[test]
    fn reaction_path_parsing() {
        assert_eq!(reaction_target("/shayaris/abc/like", "/like").unwrap(), "abc");
        assert_eq!(reaction_target("/shayaris/abc/favorite", "/favorite").unwrap(), "abc");
        assert!(reaction_target("/shayaris//like", "/like").is_err());
    }
}
