use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::auth::{require_account, require_admin};
use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, new_id, now_iso, parse_body, sanitize_text};
use crate::core::query_params::{get_string, parse_query_params};
use crate::core::store::{KvStore, KvStoreExt};
use crate::models::models::{
    Account, AdminStats, StatusFilter, VerificationRequest, VerificationStatus, VerificationSubmission,
};
use crate::posts;
use crate::users;

pub fn submit(
    store: &dyn KvStore,
    account: &Account,
    submission: VerificationSubmission,
) -> Result<VerificationRequest, ApiError> {
    let full_name = sanitize_text(submission.full_name.trim());
    let phone = submission.phone.trim().to_string();

    if full_name.is_empty() || full_name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest("Full name is required".to_string()));
    }
    if phone.is_empty()
        || phone.len() > MAX_PHONE_LENGTH
        || !phone.chars().all(|c| c.is_ascii_digit() || "+-() ".contains(c))
    {
        return Err(ApiError::BadRequest("Invalid phone number".to_string()));
    }

    let request = VerificationRequest {
        id: new_id(),
        user_id: account.id.clone(),
        full_name,
        phone,
        id_image_url: submission.id_image_url.filter(|u| !u.is_empty()),
        status: VerificationStatus::Pending,
        created_at: now_iso(),
        reviewed_at: None,
    };

    store.set_json(&verification_key(&request.id), &request)?;

    let mut list: Vec<String> = store.get_json(VERIFICATION_LIST_KEY)?.unwrap_or_default();
    list.insert(0, request.id.clone()); // newest first
    store.set_json(VERIFICATION_LIST_KEY, &list)?;

    info!(request_id = %request.id, user_id = %account.id, "verification requested");
    Ok(request)
}

pub fn list_requests(store: &dyn KvStore, filter: StatusFilter) -> anyhow::Result<Vec<VerificationRequest>> {
    let list: Vec<String> = store.get_json(VERIFICATION_LIST_KEY)?.unwrap_or_default();

    let mut requests = Vec::new();
    for id in list {
        if let Some(request) = store.get_json::<VerificationRequest>(&verification_key(&id))? {
            if filter.matches(request.status) {
                requests.push(request);
            }
        }
    }
    Ok(requests)
}

/// Moves a pending request to approved or rejected. Decisions are final.
pub fn review(
    store: &dyn KvStore,
    admin: &Account,
    request_id: &str,
    decision: VerificationStatus,
) -> Result<VerificationRequest, ApiError> {
    if !admin.is_admin {
        return Err(ApiError::Forbidden);
    }
    if decision == VerificationStatus::Pending {
        return Err(ApiError::BadRequest("Decision must be approved or rejected".to_string()));
    }

    let key = verification_key(request_id);
    let mut request: VerificationRequest = store
        .get_json(&key)?
        .ok_or_else(|| ApiError::NotFound("Request not found".to_string()))?;

    if request.status != VerificationStatus::Pending {
        return Err(ApiError::Conflict(format!("Request already {}", request.status)));
    }

    if decision == VerificationStatus::Approved {
        let mut account = users::load_account(store, &request.user_id)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        account.is_verified = true;
        account.updated_at = Some(now_iso());
        users::save_account(store, &account)?;
    }

    request.status = decision;
    request.reviewed_at = Some(now_iso());
    store.set_json(&key, &request)?;

    info!(request_id, admin = %admin.id, decision = %decision, "verification reviewed");
    Ok(request)
}

pub fn stats(store: &dyn KvStore) -> anyhow::Result<AdminStats> {
    let users: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();
    Ok(AdminStats {
        total_users: users.len(),
        total_posts: posts::count_posts(store)?,
        pending_reviews: list_requests(store, StatusFilter::Only(VerificationStatus::Pending))?.len(),
    })
}

// === HTTP Handlers ===

pub fn handle_submit(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    let submission: VerificationSubmission = serde_json::from_value(parse_body(req)?)
        .map_err(|_| ApiError::BadRequest("Invalid verification request".to_string()))?;

    let request = submit(store, &account, submission)?;
    json_response(201, &request)
}

pub fn handle_list(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    require_admin(store, req)?;
    let params = parse_query_params(&req.uri());
    let filter: StatusFilter = get_string(&params, "status", Some("all"))
        .unwrap_or_default()
        .parse()
        .map_err(ApiError::BadRequest)?;

    json_response(200, &list_requests(store, filter)?)
}

/// `/admin/verification/<id>/approve` or `/admin/verification/<id>/reject`
pub fn handle_review(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let admin = require_admin(store, req)?;
    let rest = req.path().trim_start_matches("/admin/verification/");

    let (request_id, decision) = match rest.rsplit_once('/') {
        Some((id, "approve")) => (id, VerificationStatus::Approved),
        Some((id, "reject")) => (id, VerificationStatus::Rejected),
        _ => return Err(ApiError::NotFound("Unknown review action".to_string())),
    };

    let request = review(store, &admin, request_id, decision)?;
    json_response(200, &request)
}

pub fn handle_stats(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    require_admin(store, req)?;
    json_response(200, &stats(store)?)
}
