use tracing::info;

use crate::auth;
use crate::config::*;
use crate::core::store::{KvStore, KvStoreExt};
use crate::follow;
use crate::models::models::{Account, PostDraft, VerificationSubmission};
use crate::posts;
use crate::users;
use crate::verification;

pub const DEMO_ADMIN_EMAIL: &str = "admin@ruhverse.app";
pub const DEMO_PASSWORD: &str = "ruhverse";

fn ensure_account(store: &dyn KvStore, name: &str, email: &str, bio: &str) -> anyhow::Result<(Account, bool)> {
    if let Some(existing) = users::find_by_email(store, email)? {
        return Ok((existing, false));
    }

    let (mut account, _) = auth::sign_up(store, name, email, DEMO_PASSWORD)
        .map_err(|e| anyhow::anyhow!("seeding {email}: {e}"))?;
    account.bio = Some(bio.to_string());
    users::save_account(store, &account)?;
    Ok((account, true))
}

fn seed_post(store: &dyn KvStore, author: &Account, content: &str) -> anyhow::Result<()> {
    posts::create_post(
        store,
        author,
        PostDraft {
            content: content.to_string(),
            ..Default::default()
        },
    )
    .map_err(|e| anyhow::anyhow!("seeding post: {e}"))?;
    Ok(())
}

/// Seeds an admin, two poets with a few shayaris, a follow edge and a pending
/// verification request. Safe to call on every start.
pub fn init_seed_data(store: &dyn KvStore) -> anyhow::Result<()> {
    let (mut admin, _) = ensure_account(store, "RuhVerse Team", DEMO_ADMIN_EMAIL, "Keepers of the verse")?;
    if !admin.is_admin {
        admin.is_admin = true;
        admin.is_verified = true;
        users::save_account(store, &admin)?;
    }

    let (zoya, zoya_is_new) = ensure_account(store, "Zoya", "zoya@ruhverse.app", "Words at dusk")?;
    if zoya_is_new {
        seed_post(store, &zoya, "Chand bhi tanha hai, aur raat bhi,\nhum bhi akele hain, aur baat bhi.")?;
        seed_post(store, &zoya, "Khamoshi ki bhi apni zubaan hoti hai.")?;
    }

    let (arman, arman_is_new) = ensure_account(store, "Arman", "arman@ruhverse.app", "Collecting unsent letters")?;
    if arman_is_new {
        seed_post(store, &arman, "Har mod pe ek kahani milti hai.")?;
        verification::submit(
            store,
            &arman,
            VerificationSubmission {
                full_name: "Arman Qureshi".to_string(),
                phone: "+91 90000 00000".to_string(),
                id_image_url: None,
            },
        )
        .map_err(|e| anyhow::anyhow!("seeding verification: {e}"))?;
    }

    if !follow::get_followings(store, &arman.id)?.contains(&zoya.id) {
        follow::follow_user(store, &arman.id, &zoya.id).map_err(|e| anyhow::anyhow!("seeding follow: {e}"))?;
    }

    info!("demo data ready");
    Ok(())
}

pub fn reset_db_data(store: &dyn KvStore) -> anyhow::Result<()> {
    let users: Vec<String> = store.get_json(USERS_LIST_KEY)?.unwrap_or_default();

    for id in &users {
        store.delete(&user_key(id))?;
        store.delete(&followings_key(id))?;
        store.delete(&likes_key(id))?;
        store.delete(&favorites_key(id))?;
    }

    let feed: Vec<String> = store.get_json(FEED_KEY)?.unwrap_or_default();
    for id in &feed {
        store.delete(&post_key(id))?;
        store.delete(&likers_key(id))?;
    }

    let tokens: Vec<String> = store.get_json(TOKENS_LIST_KEY)?.unwrap_or_default();
    for token in &tokens {
        store.delete(&token_key(token))?;
    }

    let requests: Vec<String> = store.get_json(VERIFICATION_LIST_KEY)?.unwrap_or_default();
    for id in &requests {
        store.delete(&verification_key(id))?;
    }

    let media: Vec<String> = store.get_json(MEDIA_LIST_KEY)?.unwrap_or_default();
    for id in &media {
        store.delete(&media_meta_key(id))?;
        store.delete(&media_blob_key(id))?;
    }

    for key in [
        USERS_LIST_KEY,
        FEED_KEY,
        TOKENS_LIST_KEY,
        VERIFICATION_LIST_KEY,
        MEDIA_LIST_KEY,
        CHANGES_KEY,
        CHANGE_SEQ_KEY,
    ] {
        store.delete(key)?;
    }

    info!("all data removed");
    Ok(())
}
