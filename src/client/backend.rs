//! The boundary between the client state layer and the collaborators.

use crate::auth;
use crate::changes;
use crate::core::errors::ApiError;
use crate::core::store::KvStore;
use crate::follow;
use crate::media;
use crate::models::models::{
    ChangeEvent, PostDraft, PostView, Profile, ProfileUpdate, Session, SessionState, StatusFilter,
    UploadedMedia, VerificationRequest, VerificationStatus, VerificationSubmission,
};
use crate::posts;
use crate::reactions;
use crate::users;
use crate::verification;

/// Every call the client makes. Each one is a single request with no retry.
pub trait Backend {
    fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Session, ApiError>;
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError>;
    fn sign_out(&self, token: &str) -> Result<(), ApiError>;
    fn session(&self, token: &str) -> Result<SessionState, ApiError>;
    fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<Profile, ApiError>;
    fn search_profiles(&self, token: Option<&str>, term: &str, limit: usize) -> Result<Vec<Profile>, ApiError>;

    fn fetch_posts(&self) -> Result<Vec<PostView>, ApiError>;
    fn insert_post(&self, token: &str, draft: &PostDraft) -> Result<PostView, ApiError>;
    fn delete_post(&self, token: &str, post_id: &str) -> Result<(), ApiError>;
    fn changes_since(&self, seq: u64) -> Result<Vec<ChangeEvent>, ApiError>;
    fn latest_seq(&self) -> Result<u64, ApiError>;

    fn like(&self, token: &str, post_id: &str) -> Result<(), ApiError>;
    fn unlike(&self, token: &str, post_id: &str) -> Result<(), ApiError>;
    fn favorite(&self, token: &str, post_id: &str) -> Result<(), ApiError>;
    fn unfavorite(&self, token: &str, post_id: &str) -> Result<(), ApiError>;
    fn follow(&self, token: &str, target_name: &str) -> Result<(), ApiError>;
    fn unfollow(&self, token: &str, target_name: &str) -> Result<(), ApiError>;

    fn upload_media(&self, filename: &str, content_type: Option<&str>, bytes: &[u8]) -> Result<UploadedMedia, ApiError>;

    fn submit_verification(
        &self,
        token: &str,
        submission: &VerificationSubmission,
    ) -> Result<VerificationRequest, ApiError>;
    fn verification_requests(&self, token: &str, filter: StatusFilter) -> Result<Vec<VerificationRequest>, ApiError>;
    fn review_verification(
        &self,
        token: &str,
        request_id: &str,
        decision: VerificationStatus,
    ) -> Result<VerificationRequest, ApiError>;
}

/// Talks to the collaborators in-process over a key/value store.
pub struct LocalBackend<S> {
    store: S,
}

impl<S: KvStore> LocalBackend<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KvStore> Backend for LocalBackend<S> {
    fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<Session, ApiError> {
        auth::sign_up(&self.store, name, email, password).map(|(_, session)| session)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        auth::sign_in(&self.store, email, password)
    }

    fn sign_out(&self, token: &str) -> Result<(), ApiError> {
        auth::sign_out(&self.store, token)
    }

    fn session(&self, token: &str) -> Result<SessionState, ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        Ok(users::session_state(&self.store, &account)?)
    }

    fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<Profile, ApiError> {
        let mut account = auth::account_for_token(&self.store, token)?;
        users::update_profile(&self.store, &mut account, update)
    }

    fn search_profiles(&self, token: Option<&str>, term: &str, limit: usize) -> Result<Vec<Profile>, ApiError> {
        let caller = match token {
            Some(t) => auth::account_for_token(&self.store, t).ok().map(|a| a.id),
            None => None,
        };
        Ok(users::search_profiles(&self.store, term, caller.as_deref(), limit)?)
    }

    fn fetch_posts(&self) -> Result<Vec<PostView>, ApiError> {
        Ok(posts::list_posts(&self.store, None)?)
    }

    fn insert_post(&self, token: &str, draft: &PostDraft) -> Result<PostView, ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        let post = posts::create_post(&self.store, &account, draft.clone())?;
        Ok(posts::view_of(&self.store, post)?)
    }

    fn delete_post(&self, token: &str, post_id: &str) -> Result<(), ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        posts::delete_post(&self.store, &account, post_id)
    }

    fn changes_since(&self, seq: u64) -> Result<Vec<ChangeEvent>, ApiError> {
        Ok(changes::changes_since(&self.store, seq)?)
    }

    fn latest_seq(&self) -> Result<u64, ApiError> {
        Ok(changes::latest_seq(&self.store)?)
    }

    fn like(&self, token: &str, post_id: &str) -> Result<(), ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        reactions::like(&self.store, &account.id, post_id).map(|_| ())
    }

    fn unlike(&self, token: &str, post_id: &str) -> Result<(), ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        reactions::unlike(&self.store, &account.id, post_id).map(|_| ())
    }

    fn favorite(&self, token: &str, post_id: &str) -> Result<(), ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        reactions::favorite(&self.store, &account.id, post_id)
    }

    fn unfavorite(&self, token: &str, post_id: &str) -> Result<(), ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        Ok(reactions::unfavorite(&self.store, &account.id, post_id)?)
    }

    fn follow(&self, token: &str, target_name: &str) -> Result<(), ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        follow::follow_by_name(&self.store, &account, target_name).map(|_| ())
    }

    fn unfollow(&self, token: &str, target_name: &str) -> Result<(), ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        follow::unfollow_by_name(&self.store, &account, target_name).map(|_| ())
    }

    fn upload_media(&self, filename: &str, content_type: Option<&str>, bytes: &[u8]) -> Result<UploadedMedia, ApiError> {
        media::upload(&self.store, filename, content_type, bytes)
    }

    fn submit_verification(
        &self,
        token: &str,
        submission: &VerificationSubmission,
    ) -> Result<VerificationRequest, ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        verification::submit(&self.store, &account, submission.clone())
    }

    fn verification_requests(&self, token: &str, filter: StatusFilter) -> Result<Vec<VerificationRequest>, ApiError> {
        let account = auth::account_for_token(&self.store, token)?;
        if !account.is_admin {
            return Err(ApiError::Forbidden);
        }
        Ok(verification::list_requests(&self.store, filter)?)
    }

    fn review_verification(
        &self,
        token: &str,
        request_id: &str,
        decision: VerificationStatus,
    ) -> Result<VerificationRequest, ApiError> {
        let admin = auth::account_for_token(&self.store, token)?;
        verification::review(&self.store, &admin, request_id, decision)
    }
}
