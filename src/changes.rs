//! Insert feed for posts. Readers poll with the last sequence number they saw.

use spin_sdk::http::{Request, Response};

use crate::config::{CHANGES_KEY, CHANGE_LOG_CAPACITY, CHANGE_SEQ_KEY};
use crate::core::errors::ApiError;
use crate::core::helpers::json_response;
use crate::core::query_params::{get_seq, parse_query_params};
use crate::core::store::{KvStore, KvStoreExt};
use crate::models::models::{ChangeEvent, Post};

pub fn record_insert(store: &dyn KvStore, post: &Post) -> anyhow::Result<u64> {
    let seq = store.get_json::<u64>(CHANGE_SEQ_KEY)?.unwrap_or(0) + 1;
    store.set_json(CHANGE_SEQ_KEY, &seq)?;

    let mut log: Vec<ChangeEvent> = store.get_json(CHANGES_KEY)?.unwrap_or_default();
    log.push(ChangeEvent {
        seq,
        post: post.clone(),
    });
    if log.len() > CHANGE_LOG_CAPACITY {
        let overflow = log.len() - CHANGE_LOG_CAPACITY;
        log.drain(..overflow);
    }
    store.set_json(CHANGES_KEY, &log)?;

    Ok(seq)
}

/// Events after `since`, oldest first.
pub fn changes_since(store: &dyn KvStore, since: u64) -> anyhow::Result<Vec<ChangeEvent>> {
    let log: Vec<ChangeEvent> = store.get_json(CHANGES_KEY)?.unwrap_or_default();
    Ok(log.into_iter().filter(|e| e.seq > since).collect())
}

pub fn latest_seq(store: &dyn KvStore) -> anyhow::Result<u64> {
    Ok(store.get_json::<u64>(CHANGE_SEQ_KEY)?.unwrap_or(0))
}

/// Drops the events of a deleted post so no reader replays it.
pub fn forget_post(store: &dyn KvStore, post_id: &str) -> anyhow::Result<()> {
    let mut log: Vec<ChangeEvent> = store.get_json(CHANGES_KEY)?.unwrap_or_default();
    let before = log.len();
    log.retain(|e| e.post.id != post_id);
    if log.len() != before {
        store.set_json(CHANGES_KEY, &log)?;
    }
    Ok(())
}

pub fn handle_changes(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let params = parse_query_params(&req.uri());
    let since = get_seq(&params, "since");

    json_response(200, &changes_since(store, since)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            user_id: "u".into(),
            author_name: "Gulzar".into(),
            content: "raat".into(),
            media_url: None,
            media_type: None,
            created_at: "2026-01-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn sequence_numbers_increase() {
        let store = MemoryStore::new();
        assert_eq!(record_insert(&store, &post("a")).unwrap(), 1);
        assert_eq!(record_insert(&store, &post("b")).unwrap(), 2);
        assert_eq!(latest_seq(&store).unwrap(), 2);

        let after_first = changes_since(&store, 1).unwrap();
        assert_eq!(after_first.len(), 1);
        assert_eq!(after_first[0].post.id, "b");
        assert!(changes_since(&store, 2).unwrap().is_empty());
    }

    #[test]
    fn forgotten_posts_leave_the_log() {
        let store = MemoryStore::new();
        record_insert(&store, &post("a")).unwrap();
        record_insert(&store, &post("b")).unwrap();

        forget_post(&store, "a").unwrap();
        let ids: Vec<String> = changes_since(&store, 0).unwrap().into_iter().map(|e| e.post.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
        assert_eq!(latest_seq(&store).unwrap(), 2);

        forget_post(&store, "missing").unwrap();
        assert_eq!(changes_since(&store, 0).unwrap().len(), 1);
    }

    #[test]
    fn log_is_bounded() {
        let store = MemoryStore::new();
        for i in 0..CHANGE_LOG_CAPACITY + 5 {
            record_insert(&store, &post(&i.to_string())).unwrap();
        }
        let all = changes_since(&store, 0).unwrap();
        assert_eq!(all.len(), CHANGE_LOG_CAPACITY);
        assert_eq!(all[0].seq, 6);
    }
}
