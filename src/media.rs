//! Object storage for uploaded images and videos.

use mime_guess::from_path;
use spin_sdk::http::{Request, Response};
use tracing::info;

use crate::config::*;
use crate::core::errors::ApiError;
use crate::core::helpers::{json_response, new_id, now_iso, path_tail};
use crate::core::query_params::{get_string, parse_query_params};
use crate::core::store::{KvStore, KvStoreExt};
use crate::models::models::{MediaKind, MediaObject, UploadedMedia};

fn kind_from_mime(mime: &str) -> MediaKind {
    if mime.starts_with("image/") {
        MediaKind::Image
    } else if mime.starts_with("video/") {
        MediaKind::Video
    } else {
        MediaKind::Raw
    }
}

pub fn kind_from_path(path: &str) -> MediaKind {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    kind_from_mime(from_path(path).first_or_octet_stream().essence_str())
}

/// Content type of an upload: an explicit, specific header wins over the
/// filename extension.
pub fn detect_content_type(filename: &str, declared: Option<&str>) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_string(),
        _ => from_path(filename).first_or_octet_stream().to_string(),
    }
}

pub fn upload(
    store: &dyn KvStore,
    filename: &str,
    declared_type: Option<&str>,
    bytes: &[u8],
) -> Result<UploadedMedia, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Empty upload".to_string()));
    }
    if bytes.len() > MAX_MEDIA_BYTES {
        return Err(ApiError::BadRequest("File too large (max 10 MiB)".to_string()));
    }

    let content_type = detect_content_type(filename, declared_type);
    let object = MediaObject {
        public_id: new_id(),
        filename: filename.to_string(),
        kind: kind_from_mime(&content_type),
        content_type,
        size: bytes.len(),
        created_at: now_iso(),
    };

    store.set(&media_blob_key(&object.public_id), bytes)?;
    store.set_json(&media_meta_key(&object.public_id), &object)?;

    let mut list: Vec<String> = store.get_json(MEDIA_LIST_KEY)?.unwrap_or_default();
    list.push(object.public_id.clone());
    store.set_json(MEDIA_LIST_KEY, &list)?;

    info!(public_id = %object.public_id, kind = object.kind.as_str(), size = object.size, "media stored");

    Ok(UploadedMedia {
        url: format!("{}/media/{}", media_base_url(), object.public_id),
        kind: object.kind,
        public_id: object.public_id,
    })
}

pub fn fetch(store: &dyn KvStore, public_id: &str) -> Result<(MediaObject, Vec<u8>), ApiError> {
    let object: MediaObject = store
        .get_json(&media_meta_key(public_id))?
        .ok_or_else(|| ApiError::NotFound("Media not found".to_string()))?;
    let bytes = store
        .get(&media_blob_key(public_id))?
        .ok_or_else(|| ApiError::NotFound("Media not found".to_string()))?;
    Ok((object, bytes))
}

// === HTTP Handlers ===

pub fn handle_upload(store: &dyn KvStore, req: &Request) -> Result<Response, ApiError> {
    let params = parse_query_params(&req.uri());
    let filename = get_string(&params, "filename", Some("upload")).unwrap_or_default();
    let declared = req.header("Content-Type").and_then(|h| h.as_str());

    let uploaded = upload(store, &filename, declared, req.body())?;
    json_response(201, &uploaded)
}

pub fn serve_media(store: &dyn KvStore, path: &str) -> Result<Response, ApiError> {
    let public_id = path_tail(path, "/media/");
    if public_id.is_empty() {
        return Err(ApiError::BadRequest("Media ID required".to_string()));
    }

    let (object, bytes) = fetch(store, public_id)?;
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", object.content_type.as_str())
        .body(bytes)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    #[test]
    fn kinds_from_paths() {
        assert_eq!(kind_from_path("moon.png"), MediaKind::Image);
        assert_eq!(kind_from_path("https://cdn.x/clip.mp4?v=2"), MediaKind::Video);
        assert_eq!(kind_from_path("notes.pdf"), MediaKind::Raw);
        assert_eq!(kind_from_path("/media/0b7e"), MediaKind::Raw);
    }

    #[test]
    fn declared_type_beats_extension() {
        assert_eq!(detect_content_type("capture.bin", Some("image/png")), "image/png");
        assert_eq!(
            detect_content_type("capture.jpg", Some("application/octet-stream")),
            "image/jpeg"
        );
        assert_eq!(detect_content_type("capture.jpg", None), "image/jpeg");
    }

    #[test]
    fn upload_then_fetch() {
        let store = MemoryStore::new();
        let uploaded = upload(&store, "moon.png", None, b"\x89PNG....").unwrap();
        assert_eq!(uploaded.kind, MediaKind::Image);
        assert!(uploaded.url.ends_with(&format!("/media/{}", uploaded.public_id)));

        let (object, bytes) = fetch(&store, &uploaded.public_id).unwrap();
        assert_eq!(object.content_type, "image/png");
        assert_eq!(bytes, b"\x89PNG....");
    }

    #[test]
    fn rejects_empty_and_oversized() {
        let store = MemoryStore::new();
        assert!(matches!(upload(&store, "a.png", None, b""), Err(ApiError::BadRequest(_))));
        let big = vec![0u8; MAX_MEDIA_BYTES + 1];
        assert!(matches!(upload(&store, "a.png", None, &big), Err(ApiError::BadRequest(_))));
    }
}
