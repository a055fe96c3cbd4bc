use spin_sdk::http::{Request, Response};
use tracing::{info, warn};

use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{
    avatar_for_seed, hash_password, json_response, new_id, now_iso, parse_body, sanitize_text,
    validate_email, verify_password,
};
use crate::core::store::{KvStore, KvStoreExt};
use crate::models::models::{Account, Session, TokenData};
use crate::users;

pub fn sign_up(
    store: &dyn KvStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(Account, Session), ApiError> {
    let email = email.trim().to_lowercase();
    let name = sanitize_text(name.trim());

    if !validate_email(&email) {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    let name_len = name.chars().count();
    if !(MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name_len) {
        return Err(ApiError::BadRequest("Name must be 1-50 characters".to_string()));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if users::find_by_email(store, &email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let account = Account {
        id: new_id(),
        is_admin: admin_emails().contains(&email),
        email,
        password: hash_password(password)?,
        avatar_url: Some(avatar_for_seed(&name)),
        full_name: name,
        bio: None,
        is_verified: false,
        created_at: now_iso(),
        updated_at: None,
    };
    users::insert_account(store, &account)?;

    let token = issue_token(store, &account.id)?;
    info!(user_id = %account.id, admin = account.is_admin, "account created");

    let session = Session {
        token,
        user_id: account.id.clone(),
    };
    Ok((account, session))
}

pub fn sign_in(store: &dyn KvStore, email: &str, password: &str) -> Result<Session, ApiError> {
    let email = email.trim().to_lowercase();

    match users::find_by_email(store, &email)? {
        Some(account) if verify_password(password, &account.password) => {
            let token = issue_token(store, &account.id)?;
            info!(user_id = %account.id, "signed in");
            Ok(Session {
                token,
                user_id: account.id,
            })
        }
        _ => {
            warn!("failed sign-in attempt");
            Err(ApiError::Unauthorized)
        }
    }
}

pub fn sign_out(store: &dyn KvStore, token: &str) -> Result<(), ApiError> {
    store.delete(&token_key(token))?;

    let mut tokens: Vec<String> = store.get_json(TOKENS_LIST_KEY)?.unwrap_or_default();
    tokens.retain(|t| t != token);
    store.set_json(TOKENS_LIST_KEY, &tokens)?;

    Ok(())
}

fn issue_token(store: &dyn KvStore, user_id: &str) -> anyhow::Result<String> {
    let token = new_id();
    let data = TokenData {
        user_id: user_id.to_string(),
        created_at: now_iso(),
    };
    store.set_json(&token_key(&token), &data)?;

    let mut tokens: Vec<String> = store.get_json(TOKENS_LIST_KEY)?.unwrap_or_default();
    tokens.push(token.clone());
    store.set_json(TOKENS_LIST_KEY, &tokens)?;

    Ok(token)
}

/// Resolves a session token to its account. Expired tokens and tokens of
/// vanished accounts are rejected.
pub fn account_for_token(store: &dyn KvStore, token: &str) -> Result<Account, ApiError> {
    let data = store
        .get_json::<TokenData>(&token_key(token))?
        .ok_or(ApiError::Unauthorized)?;

    if let Ok(created) = chrono::DateTime::parse_from_rfc3339(&data.created_at) {
        let age_hours = (chrono::Utc::now() - created.with_timezone(&chrono::Utc)).num_hours();
        if age_hours > token_expiration_hours() {
            return Err(ApiError::Unauthorized);
        }
    }

    users::load_account(store, &data.user_id)?.ok_or(ApiError::Unauthorized)
}

pub fn bearer_token(req: &Request) -> Option<&str> {
    req.header("Authorization")?
        .as_str()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn validate_token(store: &dyn KvStore, req: &Request) -> Option<String> {
    let token = bearer_token(req)?;
    account_for_token(store, token).ok().map(|a| a.id)
}

pub fn require_account(store: &dyn KvStore, req: &Request) -> Result<Account, ApiError> {
    let token = bearer_token(req).ok_or(ApiError::Unauthorized)?;
    account_for_token(store, token)
}

pub fn require_admin(store: &dyn KvStore, req: &Request) -> Result<Account, ApiError> {
    let account = require_account(store, req)?;
    if !account.is_admin {
        return Err(ApiError::Forbidden);
    }
    Ok(account)
}

// === HTTP Handlers ===

pub fn handle_signup(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let value = parse_body(req)?;
    let name = value["name"].as_str().unwrap_or_default();
    let email = value["email"].as_str().unwrap_or_default();
    let password = value["password"].as_str().unwrap_or_default();

    let (account, session) = sign_up(store, name, email, password)?;

    json_response(
        201,
        &serde_json::json!({
            "token": session.token,
            "user": account.profile(),
        }),
    )
}

pub fn handle_login(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let value = parse_body(req)?;
    let email = value["email"].as_str().unwrap_or_default();
    let password = value["password"].as_str().unwrap_or_default();

    let session = sign_in(store, email, password)?;
    json_response(200, &session)
}

pub fn handle_logout(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let token = bearer_token(req).ok_or(ApiError::Unauthorized)?;
    sign_out(store, token)?;

    json_response(200, &serde_json::json!({ "message": "Logged out successfully" }))
}

pub fn handle_session(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let account = require_account(store, req)?;
    json_response(200, &users::session_state(store, &account)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    #[test]
    fn signup_then_login() {
        let store = MemoryStore::new();
        let (account, session) = sign_up(&store, "Faiz", "Faiz@Example.com", "hum-dekhenge").unwrap();
        assert_eq!(account.email, "faiz@example.com");
        assert_eq!(session.user_id, account.id);
        assert!(account.avatar_url.unwrap().ends_with("seed=Faiz"));

        let login = sign_in(&store, "faiz@example.com", "hum-dekhenge").unwrap();
        assert_eq!(login.user_id, account.id);
        assert_eq!(account_for_token(&store, &login.token).unwrap().id, account.id);
    }

    #[test]
    fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        sign_up(&store, "Faiz", "faiz@example.com", "secret1").unwrap();
        let err = sign_up(&store, "Other", "FAIZ@example.com", "secret2").unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn rejects_bad_input() {
        let store = MemoryStore::new();
        assert!(matches!(
            sign_up(&store, "Faiz", "not-an-email", "secret1"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            sign_up(&store, "Faiz", "faiz@example.com", "123"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            sign_up(&store, "   ", "faiz@example.com", "secret1"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let store = MemoryStore::new();
        sign_up(&store, "Faiz", "faiz@example.com", "secret1").unwrap();
        assert!(matches!(
            sign_in(&store, "faiz@example.com", "nope-nope"),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            sign_in(&store, "nobody@example.com", "secret1"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn sign_out_invalidates_token() {
        let store = MemoryStore::new();
        let (_, session) = sign_up(&store, "Faiz", "faiz@example.com", "secret1").unwrap();
        sign_out(&store, &session.token).unwrap();
        assert!(matches!(
            account_for_token(&store, &session.token),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let store = MemoryStore::new();
        let (account, session) = sign_up(&store, "Faiz", "faiz@example.com", "secret1").unwrap();
        let stale = TokenData {
            user_id: account.id,
            created_at: (chrono::Utc::now() - chrono::Duration::days(30)).to_rfc3339(),
        };
        store.set_json(&token_key(&session.token), &stale).unwrap();

        assert!(matches!(
            account_for_token(&store, &session.token),
            Err(ApiError::Unauthorized)
        ));
    }
}
