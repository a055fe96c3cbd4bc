use spin_sdk::http::{Method, Request, Response};
use tracing::{debug, error, warn};

use crate::core::errors::ApiError;
use crate::core::store::KvStore;
use crate::{auth, changes, follow, media, posts, reactions, templates, users, verification};

/// Dispatches one request. Errors are rendered here, never propagated.
pub fn route(store: &dyn KvStore, req: &Request) -> Response {
    let path = req.path().to_string();
    debug!(path = %path, "request");

    match dispatch(store, req, &path) {
        Ok(resp) => resp,
        Err(err) => {
            match &err {
                ApiError::InternalError(detail) => error!(path = %path, "{detail}"),
                other => warn!(path = %path, "{other}"),
            }
            err.into()
        }
    }
}

fn dispatch(store: &dyn KvStore, req: &Request, path: &str) -> Result<Response, ApiError> {
    match (req.method(), path) {
        (Method::Post, "/auth/signup") => auth::handle_signup(store, req),
        (Method::Post, "/auth/login") => auth::handle_login(store, req),
        (Method::Post, "/auth/logout") => auth::handle_logout(store, req),
        (Method::Get, "/auth/session") => auth::handle_session(store, req),

        (Method::Get, "/profiles/me") => users::get_profile(store, req),
        (Method::Put, "/profiles/me") => users::handle_update_profile(store, req),
        (Method::Get, "/profiles/search") => users::handle_search(store, req),
        (Method::Get, p) if p.starts_with("/profiles/by-name/") => users::get_public_profile(store, p),
        (Method::Get, p) if p.starts_with("/profile/") => templates::render_user_profile(store, p),

        (Method::Get, "/shayaris") => posts::handle_list_posts(store, req),
        (Method::Post, "/shayaris") => posts::handle_create_post(store, req),
        (Method::Post, p) if is_reaction(p, "/like") => reactions::handle_like(store, req, true),
        (Method::Delete, p) if is_reaction(p, "/like") => reactions::handle_like(store, req, false),
        (Method::Post, p) if is_reaction(p, "/favorite") => reactions::handle_favorite(store, req, true),
        (Method::Delete, p) if is_reaction(p, "/favorite") => reactions::handle_favorite(store, req, false),
        (Method::Delete, p) if p.starts_with("/shayaris/") => posts::handle_delete_post(store, req),
        (Method::Get, "/likes") => reactions::list_likes(store, req),
        (Method::Get, "/favorites") => reactions::list_favorites(store, req),

        (Method::Post, "/follow") => follow::handle_follow(store, req),
        (Method::Post, "/unfollow") => follow::handle_unfollow(store, req),
        (Method::Get, p) if p.starts_with("/followings/") => follow::get_followings_list(store, p),
        (Method::Get, p) if p.starts_with("/followers/") => follow::get_followers_list(store, p),

        (Method::Get, "/changes") => changes::handle_changes(store, req),

        (Method::Post, "/media") => media::handle_upload(store, req),
        (Method::Get, p) if p.starts_with("/media/") => media::serve_media(store, p),

        (Method::Post, "/verification") => verification::handle_submit(store, req),
        (Method::Get, "/admin/verification") => verification::handle_list(store, req),
        (Method::Post, p) if p.starts_with("/admin/verification/") => verification::handle_review(store, req),
        (Method::Get, "/admin/stats") => verification::handle_stats(store, req),

        _ => Err(ApiError::NotFound("No route found".to_string())),
    }
}

fn is_reaction(path: &str, suffix: &str) -> bool {
    path.starts_with("/shayaris/") && path.ends_with(suffix)
}
