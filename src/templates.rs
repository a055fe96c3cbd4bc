use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use spin_sdk::http::Response;
use std::sync::OnceLock;

use crate::core::errors::ApiError;
use crate::core::helpers::path_tail;
use crate::core::store::KvStore;
use crate::follow;
use crate::models::models::{MediaKind, Post, PostView};
use crate::posts;
use crate::users;

const PROFILE_TEMPLATE: &str = include_str!("../templates/profile.html");

fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"https?://[^\s<]+").expect("Regex should compile"))
}

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"PROFILE_(NAME|AVATAR|VERIFIED|FOLLOWERS|BIO|POSTS)").expect("Regex should compile"))
}

/// Escapes post text and turns bare URLs into links.
pub fn render_content(content: &str) -> String {
    let escaped = encode_text(content).to_string();
    url_regex()
        .replace_all(&escaped, |caps: &regex::Captures| {
            let url = &caps[0];
            format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                encode_double_quoted_attribute(url),
                url
            )
        })
        .to_string()
}

fn render_media(post: &Post) -> String {
    let Some(url) = post.media_url.as_deref() else {
        return String::new();
    };
    let src = encode_double_quoted_attribute(url);
    match post.media_type {
        Some(MediaKind::Video) => format!(r#"<video src="{}" controls playsinline></video>"#, src),
        _ => format!(r#"<img src="{}" alt="Shared moment">"#, src),
    }
}

fn render_post(view: &PostView) -> String {
    let date = chrono::DateTime::parse_from_rfc3339(&view.post.created_at)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();
    format!(
        r#"<article class="shayari-card">{}<p class="shayari-content">{}</p><div class="shayari-meta">{} · {} · {} likes</div></article>"#,
        render_media(&view.post),
        render_content(&view.post.content),
        encode_text(&date),
        posts::media_kind_label(view.post.media_type),
        view.like_count
    )
}

pub fn render_profile_page(
    name: &str,
    avatar_url: Option<&str>,
    bio: Option<&str>,
    verified: bool,
    follower_count: usize,
    posts: &[PostView],
) -> String {
    let bio_section = bio
        .map(|bio| format!(r#"<p class="profile-bio">{}</p>"#, encode_text(bio)))
        .unwrap_or_default();
    let verified_badge = if verified {
        r#"<span class="verified">✔ Verified</span>"#
    } else {
        ""
    };
    let followers = match follower_count {
        1 => "1 follower".to_string(),
        n => format!("{} followers", n),
    };
    let post_list = if posts.is_empty() {
        "<p>No writings yet.</p>".to_string()
    } else {
        posts.iter().map(render_post).collect::<Vec<_>>().join("\n")
    };

    let name = encode_text(name);
    let avatar = encode_double_quoted_attribute(avatar_url.unwrap_or(""));

    // Single pass: filled-in text is never scanned for placeholders again.
    placeholder_regex()
        .replace_all(PROFILE_TEMPLATE, |caps: &regex::Captures| match &caps[0] {
            "PROFILE_NAME" => name.to_string(),
            "PROFILE_AVATAR" => avatar.to_string(),
            "PROFILE_VERIFIED" => verified_badge.to_string(),
            "PROFILE_FOLLOWERS" => followers.clone(),
            "PROFILE_BIO" => bio_section.clone(),
            "PROFILE_POSTS" => post_list.clone(),
            other => other.to_string(),
        })
        .into_owned()
}

/// `GET /profile/<name>`. Authors without an account still get a page
/// listing the posts signed with that name.
pub fn render_user_profile(store: &dyn KvStore, path: &str) -> Result<Response, ApiError> {
    let encoded = path_tail(path, "/profile/");
    let name = urlencoding::decode(encoded)
        .map(|n| n.into_owned())
        .unwrap_or_else(|_| encoded.to_string());
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name required".to_string()));
    }

    let account = users::find_by_name(store, &name)?;
    let author_posts = posts::list_posts(store, Some(&name))?;
    if account.is_none() && author_posts.is_empty() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let follower_count = match &account {
        Some(a) => follow::get_followers(store, &a.id)?.len(),
        None => 0,
    };

    let html = render_profile_page(
        &name,
        account.as_ref().and_then(|a| a.avatar_url.as_deref()),
        account.as_ref().and_then(|a| a.bio.as_deref()),
        account.as_ref().map(|a| a.is_verified).unwrap_or(false),
        follower_count,
        &author_posts,
    );

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(html.into_bytes())
        .build())
}

/// Text handed to the share sheet (or the clipboard).
pub fn share_text(post: &Post, origin: &str) -> String {
    let author = if post.author_name.is_empty() {
        crate::config::DEFAULT_AUTHOR_NAME
    } else {
        post.author_name.as_str()
    };
    format!(
        "\"{}\" - {}\n\nRead more on RuhVerse: {}/profile/{}",
        post.content,
        author,
        origin.trim_end_matches('/'),
        urlencoding::encode(author)
    )
}
