use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::auth::require_account;
use crate::changes;
use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, new_id, no_content, now_iso, parse_body, path_tail, sanitize_text};
use crate::core::query_params::{get_string, parse_query_params};
use crate::core::store::{KvStore, KvStoreExt};
use crate::media;
use crate::models::models::{Account, MediaKind, Post, PostDraft, PostView};
use crate::reactions;
use crate::users;

pub fn load_post(store: &dyn KvStore, id: &str) -> anyhow::Result<Option<Post>> {
    store.get_json(&post_key(id))
}

fn validate_media_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://") || url.starts_with("/media/")
}

pub fn create_post(store: &dyn KvStore, author: &Account, draft: PostDraft) -> Result<Post, ApiError> {
    let content = draft.content.trim();
    if content.is_empty() || content.chars().count() > MAX_POST_LENGTH {
        return Err(ApiError::BadRequest("Invalid content".to_string()));
    }

    let media_url = draft.media_url.filter(|u| !u.is_empty());
    if let Some(url) = &media_url {
        if !validate_media_url(url) {
            return Err(ApiError::BadRequest("Invalid media URL".to_string()));
        }
    }
    let media_type = match (&media_url, draft.media_type) {
        (Some(_), Some(kind)) => Some(kind),
        (Some(url), None) => Some(media::kind_from_path(url)),
        (None, _) => None,
    };

    let author_name = draft
        .author_name
        .map(|n| sanitize_text(n.trim()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| author.full_name.clone());

    let post = Post {
        id: new_id(),
        user_id: author.id.clone(),
        author_name,
        content: content.to_string(),
        media_url,
        media_type,
        created_at: now_iso(),
    };

    store.set_json(&post_key(&post.id), &post)?;

    let mut feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    feed.insert(0, post.id.clone()); // prepend newest
    store.set_json(FEED_KEY, &feed)?;

    changes::record_insert(store, &post)?;
    info!(post_id = %post.id, user_id = %author.id, "shayari created");

    Ok(post)
}

/// Owners delete their own posts; admins may delete any.
pub fn delete_post(store: &dyn KvStore, actor: &Account, post_id: &str) -> Result<(), ApiError> {
    let post = load_post(store, post_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.user_id != actor.id && !actor.is_admin {
        return Err(ApiError::Forbidden);
    }

    store.delete(&post_key(post_id))?;

    let mut feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    feed.retain(|id| id != post_id);
    store.set_json(FEED_KEY, &feed)?;

    reactions::purge_post(store, post_id)?;
    changes::forget_post(store, post_id)?;
    info!(post_id, actor = %actor.id, "shayari deleted");

    Ok(())
}

pub fn view_of(store: &dyn KvStore, post: Post) -> anyhow::Result<PostView> {
    let author = users::load_account(store, &post.user_id)?;
    Ok(PostView {
        like_count: reactions::like_count(store, &post.id)?,
        author_is_admin: author.as_ref().map(|a| a.is_admin).unwrap_or(false),
        author_avatar_url: author.and_then(|a| a.avatar_url),
        post,
    })
}

/// Newest first, optionally restricted to one author name.
pub fn list_posts(store: &dyn KvStore, author: Option<&str>) -> anyhow::Result<Vec<PostView>> {
    let feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();

    let mut posts = Vec::new();
    for id in feed.iter() {
        if let Some(p) = load_post(store, id)? {
            if author.map_or(true, |name| p.author_name == name) {
                posts.push(view_of(store, p)?);
            }
        }
    }

    Ok(posts)
}

pub fn count_posts(store: &dyn KvStore) -> anyhow::Result<usize> {
    let feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    Ok(feed.len())
}

// === HTTP Handlers ===

pub fn handle_create_post(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    let draft: PostDraft = serde_json::from_value(parse_body(req)?)
        .map_err(|_| ApiError::BadRequest("Invalid post".to_string()))?;

    let post = create_post(store, &account, draft)?;
    json_response(201, &post)
}

pub fn handle_delete_post(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    let post_id = path_tail(req.path(), "/shayaris/");

    if post_id.is_empty() {
        return Err(ApiError::BadRequest("Post ID required".to_string()));
    }

    delete_post(store, &account, post_id)?;
    Ok(no_content())
}

pub fn handle_list_posts(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let params = parse_query_params(&req.uri());
    let author = get_string(&params, "author", None);

    json_response(200, &list_posts(store, author.as_deref())?)
}

pub fn media_kind_label(kind: Option<MediaKind>) -> &'static str {
    kind.map(|k| k.as_str()).unwrap_or("text")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::sign_up;
    use crate::core::store::MemoryStore;

    fn draft(content: &str) -> PostDraft {
        PostDraft {
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_and_list_newest_first() {
        let store = MemoryStore::new();
        let (author, _) = sign_up(&store, "Jaun", "jaun@example.com", "secret1").unwrap();

        create_post(&store, &author, draft("pehla")).unwrap();
        let second = create_post(&store, &author, draft("doosra")).unwrap();

        let listed = list_posts(&store, None).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].post.id, second.id);
        assert_eq!(listed[0].post.author_name, "Jaun");
        assert_eq!(listed[0].like_count, 0);
        assert!(listed[0].author_avatar_url.is_some());
    }

    #[test]
    fn content_is_validated() {
        let store = MemoryStore::new();
        let (author, _) = sign_up(&store, "Jaun", "jaun@example.com", "secret1").unwrap();

        assert!(matches!(create_post(&store, &author, draft("   ")), Err(ApiError::BadRequest(_))));
        let long = "a".repeat(MAX_POST_LENGTH + 1);
        assert!(matches!(create_post(&store, &author, draft(&long)), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn media_kind_inferred_from_url() {
        let store = MemoryStore::new();
        let (author, _) = sign_up(&store, "Jaun", "jaun@example.com", "secret1").unwrap();

        let post = create_post(
            &store,
            &author,
            PostDraft {
                content: "shaam".into(),
                media_url: Some("https://cdn.example.com/sunset.mp4".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(post.media_type, Some(MediaKind::Video));

        let bad = PostDraft {
            content: "x".into(),
            media_url: Some("javascript:alert(1)".into()),
            ..Default::default()
        };
        assert!(matches!(create_post(&store, &author, bad), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn only_owner_or_admin_deletes() {
        let store = MemoryStore::new();
        let (owner, _) = sign_up(&store, "Jaun", "jaun@example.com", "secret1").unwrap();
        let (other, _) = sign_up(&store, "Zia", "zia@example.com", "secret1").unwrap();
        let post = create_post(&store, &owner, draft("mera")).unwrap();

        assert!(matches!(delete_post(&store, &other, &post.id), Err(ApiError::Forbidden)));

        let mut admin = other.clone();
        admin.is_admin = true;
        delete_post(&store, &admin, &post.id).unwrap();
        assert!(list_posts(&store, None).unwrap().is_empty());
        assert!(matches!(delete_post(&store, &owner, &post.id), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn filter_by_author_name() {
        let store = MemoryStore::new();
        let (jaun, _) = sign_up(&store, "Jaun", "jaun@example.com", "secret1").unwrap();
        let (zia, _) = sign_up(&store, "Zia", "zia@example.com", "secret1").unwrap();
        create_post(&store, &jaun, draft("one")).unwrap();
        create_post(&store, &zia, draft("two")).unwrap();

        let only = list_posts(&store, Some("Zia")).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].post.content, "two");
        assert_eq!(count_posts(&store).unwrap(), 2);
    }
}
