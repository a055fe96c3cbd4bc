//! Client state layer: caches what the screens show and keeps it in step
//! with the collaborators.
//!
//! Every action follows the same policy: apply the change locally, make one
//! backend call, and on failure log it, revert, and push an error toast.
//! Nothing is retried; the next fetch is the source of truth.

pub mod backend;
pub mod search;
pub mod theme;
pub mod toast;

use std::collections::HashSet;

use tracing::{error, info, warn};

use crate::config::{DEFAULT_SEARCH_LIMIT, GUEST_VISIBLE_POSTS};
use crate::core::errors::ApiError;
use crate::models::models::{
    Post, PostDraft, PostView, Profile, ProfileUpdate, SessionState, StatusFilter, VerificationRequest,
    VerificationStatus, VerificationSubmission,
};

pub use backend::{Backend, LocalBackend};
pub use theme::Theme;
pub use toast::{Toast, ToastKind, ToastQueue};

/// The signed-in account as the client sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentUser {
    pub profile: Profile,
    pub likes: HashSet<String>,
    pub favorites: HashSet<String>,
    pub following: Vec<String>,
}

impl From<SessionState> for CurrentUser {
    fn from(state: SessionState) -> Self {
        Self {
            profile: state.profile,
            likes: state.likes.into_iter().collect(),
            favorites: state.favorites.into_iter().collect(),
            following: state.following,
        }
    }
}

/// A file picked for upload.
#[derive(Clone, Debug)]
pub struct MediaFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct Client<B> {
    backend: B,
    token: Option<String>,
    user: Option<CurrentUser>,
    posts: Vec<PostView>,
    removed: HashSet<String>,
    last_seq: u64,
    toasts: ToastQueue,
    theme: Theme,
    admin_filter: StatusFilter,
    admin_requests: Vec<VerificationRequest>,
}

impl<B: Backend> Client<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            token: None,
            user: None,
            posts: Vec::new(),
            removed: HashSet::new(),
            last_seq: 0,
            toasts: ToastQueue::new(),
            theme: Theme::default(),
            admin_filter: StatusFilter::default(),
            admin_requests: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn posts(&self) -> &[PostView] {
        &self.posts
    }

    pub fn post(&self, id: &str) -> Option<&PostView> {
        self.posts.iter().find(|p| p.id() == id)
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn admin_requests(&self) -> &[VerificationRequest] {
        &self.admin_requests
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().map(|u| u.profile.is_admin).unwrap_or(false)
    }

    fn fail(&mut self, action: &str, err: &ApiError, message: impl Into<String>) {
        error!("{action} failed: {err}");
        self.toasts.push(message, ToastKind::Error);
    }

    fn signed_in(&mut self, hint: &str) -> Option<String> {
        if self.user.is_none() {
            self.toasts.push(hint, ToastKind::Info);
        }
        self.user.as_ref().and(self.token.clone())
    }

    // === Session ===

    pub fn sign_up(&mut self, name: &str, email: &str, password: &str) -> bool {
        match self.backend.sign_up(name, email, password) {
            Ok(session) => {
                self.token = Some(session.token);
                self.refresh_session()
            }
            Err(e) => {
                let message = format!("Signup failed: {}", e.public_message());
                self.fail("sign up", &e, message);
                false
            }
        }
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> bool {
        match self.backend.sign_in(email, password) {
            Ok(session) => {
                self.token = Some(session.token);
                self.refresh_session()
            }
            Err(e) => {
                self.fail("sign in", &e, "Invalid email or password");
                false
            }
        }
    }

    pub fn sign_out(&mut self) -> bool {
        let Some(token) = self.token.clone() else {
            return true;
        };
        match self.backend.sign_out(&token) {
            Ok(()) => {
                self.token = None;
                self.user = None;
                self.admin_requests.clear();
                true
            }
            Err(e) => {
                self.fail("sign out", &e, "Failed to log out");
                false
            }
        }
    }

    /// Reloads the current user. A rejected token ends the session.
    pub fn refresh_session(&mut self) -> bool {
        let Some(token) = self.token.clone() else {
            self.user = None;
            return false;
        };
        match self.backend.session(&token) {
            Ok(state) => {
                self.user = Some(state.into());
                true
            }
            Err(ApiError::Unauthorized) => {
                warn!("session expired");
                self.token = None;
                self.user = None;
                false
            }
            Err(e) => {
                self.fail("session refresh", &e, "Could not load your profile");
                false
            }
        }
    }

    pub fn update_profile(&mut self, mut update: ProfileUpdate, avatar: Option<MediaFile>) -> bool {
        let Some(token) = self.signed_in("Please log in to edit your profile") else {
            return false;
        };

        if let Some(file) = avatar {
            match self.backend.upload_media(&file.filename, file.content_type.as_deref(), &file.bytes) {
                Ok(uploaded) => update.avatar_url = Some(uploaded.url),
                Err(e) => {
                    self.fail("avatar upload", &e, "Failed to upload avatar image.");
                    return false;
                }
            }
        }

        match self.backend.update_profile(&token, &update) {
            Ok(profile) => {
                if let Some(user) = self.user.as_mut() {
                    user.profile = profile;
                }
                self.toasts.push("Profile updated", ToastKind::Success);
                true
            }
            Err(e) => {
                let message = format!("Failed to update profile: {}", e.public_message());
                self.fail("profile update", &e, message);
                false
            }
        }
    }

    // === Posts ===

    /// Reloads the feed and skips the change log up to this point; older
    /// inserts are already in the listing.
    pub fn refresh_posts(&mut self) -> bool {
        let seq = match self.backend.latest_seq() {
            Ok(seq) => seq,
            Err(e) => {
                error!("reading feed position failed: {e}");
                return false;
            }
        };
        match self.backend.fetch_posts() {
            Ok(posts) => {
                self.posts = posts;
                self.last_seq = self.last_seq.max(seq);
                true
            }
            Err(e) => {
                error!("fetching shayaris failed: {e}");
                false
            }
        }
    }

    /// Adds a post pushed by the change feed. Locally deleted and already
    /// known posts are ignored.
    pub fn apply_insert(&mut self, post: Post) -> bool {
        if self.removed.contains(&post.id) || self.posts.iter().any(|p| p.id() == post.id) {
            return false;
        }
        self.posts.insert(0, PostView::bare(post));
        true
    }

    /// Pulls new inserts from the change feed; returns how many were added.
    pub fn poll_changes(&mut self) -> usize {
        match self.backend.changes_since(self.last_seq) {
            Ok(events) => {
                let mut added = 0;
                for event in events {
                    self.last_seq = self.last_seq.max(event.seq);
                    if self.apply_insert(event.post) {
                        added += 1;
                    }
                }
                added
            }
            Err(e) => {
                error!("polling changes failed: {e}");
                0
            }
        }
    }

    /// Uploads `media` (if any) and publishes the post.
    pub fn add_post(&mut self, content: &str, author: Option<&str>, media: Option<MediaFile>) -> bool {
        let Some(token) = self.signed_in("Please log in to share your writing") else {
            return false;
        };

        let mut draft = PostDraft {
            content: content.to_string(),
            author_name: author.map(str::to_string),
            ..Default::default()
        };

        if let Some(file) = media {
            info!(filename = %file.filename, "uploading media");
            match self.backend.upload_media(&file.filename, file.content_type.as_deref(), &file.bytes) {
                Ok(uploaded) => {
                    draft.media_url = Some(uploaded.url);
                    draft.media_type = Some(uploaded.kind);
                }
                Err(e) => {
                    let message = format!("Failed to upload media: {}", e.public_message());
                    self.fail("media upload", &e, message);
                    return false;
                }
            }
        }

        match self.backend.insert_post(&token, &draft) {
            Ok(view) => {
                if !self.posts.iter().any(|p| p.id() == view.id()) {
                    self.posts.insert(0, view);
                }
                self.toasts.push("Your writing has been shared", ToastKind::Success);
                true
            }
            Err(e) => {
                let message = format!("Failed to post: {}", e.public_message());
                self.fail("posting", &e, message);
                false
            }
        }
    }

    pub fn delete_post(&mut self, post_id: &str) -> bool {
        let Some(token) = self.signed_in("Please log in first") else {
            return false;
        };

        match self.backend.delete_post(&token, post_id) {
            Ok(()) => {
                self.posts.retain(|p| p.id() != post_id);
                self.removed.insert(post_id.to_string());
                self.toasts.push("Writing deleted", ToastKind::Info);
                true
            }
            Err(e) => {
                let message = format!("Failed to delete: {}", e.public_message());
                self.fail("deleting", &e, message);
                false
            }
        }
    }

    /// Guests only see the newest few posts.
    pub fn visible_posts(&self) -> Vec<&PostView> {
        let limit = if self.user.is_some() { self.posts.len() } else { GUEST_VISIBLE_POSTS };
        self.posts.iter().take(limit).collect()
    }

    pub fn search_posts(&self, term: &str) -> Vec<&PostView> {
        search::filter_posts(self.visible_posts(), term)
    }

    pub fn my_posts(&self) -> Vec<&PostView> {
        match &self.user {
            Some(user) => self.posts.iter().filter(|p| p.post.user_id == user.profile.id).collect(),
            None => Vec::new(),
        }
    }

    pub fn favorite_posts(&self) -> Vec<&PostView> {
        match &self.user {
            Some(user) => self.posts.iter().filter(|p| user.favorites.contains(p.id())).collect(),
            None => Vec::new(),
        }
    }

    pub fn posts_by_author(&self, name: &str) -> Vec<&PostView> {
        self.posts.iter().filter(|p| p.post.author_name == name).collect()
    }

    pub fn search_poets(&mut self, term: &str) -> Vec<Profile> {
        if term.trim().is_empty() {
            return Vec::new();
        }
        match self.backend.search_profiles(self.token.as_deref(), term, DEFAULT_SEARCH_LIMIT) {
            Ok(found) => found,
            Err(e) => {
                error!("user search failed: {e}");
                Vec::new()
            }
        }
    }

    // === Optimistic toggles ===

    fn set_like(&mut self, post_id: &str, liked: bool) {
        if let Some(user) = self.user.as_mut() {
            if liked {
                user.likes.insert(post_id.to_string());
            } else {
                user.likes.remove(post_id);
            }
        }
        if let Some(post) = self.posts.iter_mut().find(|p| p.post.id == post_id) {
            post.like_count = if liked {
                post.like_count + 1
            } else {
                post.like_count.saturating_sub(1)
            };
        }
    }

    /// Returns the new liked state, or `None` if nothing changed.
    pub fn toggle_like(&mut self, post_id: &str) -> Option<bool> {
        let token = self.signed_in("Please login to like posts")?;
        let was_liked = self.user.as_ref().is_some_and(|u| u.likes.contains(post_id));
        let previous_count = self.post(post_id).map(|p| p.like_count);

        self.set_like(post_id, !was_liked);

        let result = if was_liked {
            self.backend.unlike(&token, post_id)
        } else {
            self.backend.like(&token, post_id)
        };

        match result {
            Ok(()) => Some(!was_liked),
            Err(e) => {
                self.set_like(post_id, was_liked);
                if let (Some(count), Some(post)) =
                    (previous_count, self.posts.iter_mut().find(|p| p.post.id == post_id))
                {
                    post.like_count = count;
                }
                let message = format!("Action failed: {}", e.public_message());
                self.fail("toggling like", &e, message);
                None
            }
        }
    }

    fn set_favorite(&mut self, post_id: &str, favorited: bool) {
        if let Some(user) = self.user.as_mut() {
            if favorited {
                user.favorites.insert(post_id.to_string());
            } else {
                user.favorites.remove(post_id);
            }
        }
    }

    pub fn toggle_favorite(&mut self, post_id: &str) -> Option<bool> {
        let token = self.signed_in("Please login to see bookmarks")?;
        let was_favorited = self.user.as_ref().is_some_and(|u| u.favorites.contains(post_id));

        self.set_favorite(post_id, !was_favorited);

        let result = if was_favorited {
            self.backend.unfavorite(&token, post_id)
        } else {
            self.backend.favorite(&token, post_id)
        };

        match result {
            Ok(()) => {
                let message = if was_favorited { "Removed from favorites" } else { "Saved to favorites" };
                self.toasts.push(message, ToastKind::Success);
                Some(!was_favorited)
            }
            Err(e) => {
                self.set_favorite(post_id, was_favorited);
                self.fail("toggling favorite", &e, "Failed to update favorite");
                None
            }
        }
    }

    fn set_following(&mut self, name: &str, following: bool) {
        if let Some(user) = self.user.as_mut() {
            user.following.retain(|n| n != name);
            if following {
                user.following.push(name.to_string());
            }
        }
    }

    pub fn toggle_follow(&mut self, name: &str) -> Option<bool> {
        let token = self.signed_in("Please log in to follow poets")?;
        let was_following = self.user.as_ref().is_some_and(|u| u.following.iter().any(|n| n == name));

        self.set_following(name, !was_following);

        let result = if was_following {
            self.backend.unfollow(&token, name)
        } else {
            self.backend.follow(&token, name)
        };

        match result {
            Ok(()) => {
                let message = if was_following {
                    format!("Unfollowed {name}")
                } else {
                    format!("Following {name}")
                };
                self.toasts.push(message, ToastKind::Success);
                Some(!was_following)
            }
            Err(e) => {
                self.set_following(name, was_following);
                let message = format!("Failed to update follow: {}", e.public_message());
                self.fail("toggling follow", &e, message);
                None
            }
        }
    }

    // === Verification ===

    pub fn submit_verification(&mut self, full_name: &str, phone: &str, id_image: Option<MediaFile>) -> bool {
        let Some(token) = self.signed_in("Please log in to request verification") else {
            return false;
        };

        let mut submission = VerificationSubmission {
            full_name: full_name.to_string(),
            phone: phone.to_string(),
            id_image_url: None,
        };

        if let Some(file) = id_image {
            match self.backend.upload_media(&file.filename, file.content_type.as_deref(), &file.bytes) {
                Ok(uploaded) => submission.id_image_url = Some(uploaded.url),
                Err(e) => {
                    self.fail("ID upload", &e, "Failed to upload ID document.");
                    return false;
                }
            }
        }

        match self.backend.submit_verification(&token, &submission) {
            Ok(_) => {
                self.toasts.push("Verification request submitted", ToastKind::Success);
                true
            }
            Err(e) => {
                let message = format!("Verification failed: {}", e.public_message());
                self.fail("verification submit", &e, message);
                false
            }
        }
    }

    pub fn load_verification_requests(&mut self, filter: StatusFilter) -> bool {
        let Some(token) = self.token.clone().filter(|_| self.is_admin()) else {
            return false;
        };

        match self.backend.verification_requests(&token, filter) {
            Ok(requests) => {
                self.admin_filter = filter;
                self.admin_requests = requests;
                true
            }
            Err(e) => {
                error!("fetching verification requests failed: {e}");
                false
            }
        }
    }

    fn review(&mut self, request_id: &str, decision: VerificationStatus) -> bool {
        let Some(token) = self.token.clone().filter(|_| self.is_admin()) else {
            return false;
        };

        match self.backend.review_verification(&token, request_id, decision) {
            Ok(updated) => {
                for request in self.admin_requests.iter_mut().filter(|r| r.id == updated.id) {
                    *request = updated.clone();
                }
                let filter = self.admin_filter;
                self.admin_requests.retain(|r| filter.matches(r.status));

                if decision == VerificationStatus::Approved {
                    self.toasts.push("User verified successfully", ToastKind::Success);
                } else {
                    self.toasts.push("Request rejected", ToastKind::Info);
                }
                true
            }
            Err(e) => {
                let message = if decision == VerificationStatus::Approved {
                    "Failed to approve request"
                } else {
                    "Failed to reject request"
                };
                self.fail("review", &e, message);
                false
            }
        }
    }

    pub fn approve_request(&mut self, request_id: &str) -> bool {
        self.review(request_id, VerificationStatus::Approved)
    }

    pub fn reject_request(&mut self, request_id: &str) -> bool {
        self.review(request_id, VerificationStatus::Rejected)
    }

    // === Theme ===

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Applies a theme saved by an earlier session. Unknown values keep the
    /// current theme.
    pub fn restore_theme(&mut self, saved: &str) -> Theme {
        match saved.parse() {
            Ok(theme) => self.theme = theme,
            Err(e) => warn!("ignoring saved theme: {e}"),
        }
        self.theme
    }

    /// Class for the document root, if the theme needs one.
    pub fn theme_class(&self) -> Option<&'static str> {
        self.theme.css_class()
    }
}
