//! RuhVerse: share shayari, follow poets, get verified.
//!
//! The HTTP surface runs as a Spin component (wasm32) or natively behind
//! actix-web (`src/bin/main.rs`). Both feed the same [`router::route`].
//! [`client`] is the typed state layer a front end drives.

pub mod auth;
pub mod changes;
pub mod client;
pub mod config;
pub mod core;
pub mod follow;
#[cfg(not(target_arch = "wasm32"))]
pub mod health;
pub mod media;
pub mod models;
pub mod posts;
pub mod reactions;
pub mod router;
pub mod templates;
pub mod users;
pub mod verification;

#[cfg(target_arch = "wasm32")]
mod component {
    use spin_sdk::http::{IntoResponse, Request};
    use spin_sdk::http_component;

    use crate::core::{db, store::SpinStore};

    #[http_component]
    fn handle(req: Request) -> anyhow::Result<impl IntoResponse> {
        let store = SpinStore::open_default()?;
        if let Err(e) = db::init_seed_data(&store) {
            tracing::warn!("seeding failed: {e}");
        }
        Ok(crate::router::route(&store, &req))
    }
}
