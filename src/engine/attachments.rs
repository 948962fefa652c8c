//! Media attachment for freshly created threads and comments.
//!
//! Uploads run after the record exists and outside any counter update. Each
//! URL is appended as soon as its upload succeeds; the first failure stops
//! the loop and surfaces as a storage error while the record and any files
//! already attached stay in place.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::like::ItemKind,
    store::Store,
    utils::media::{ObjectStore, Upload},
};

pub async fn attach(
    store: &dyn Store,
    objects: &dyn ObjectStore,
    kind: ItemKind,
    id: Uuid,
    uploads: Vec<Upload>,
) -> Result<Vec<String>, AppError> {
    let mut attached = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let url = objects
            .store(upload.bytes, &upload.file_name, &upload.content_type)
            .await?;

        if !store.append_files(kind, id, std::slice::from_ref(&url)).await? {
            return Err(match kind {
                ItemKind::Thread => AppError::thread_not_found(),
                ItemKind::Comment => AppError::comment_not_found(),
            });
        }
        attached.push(url);
    }

    if !attached.is_empty() {
        tracing::info!(kind = kind.as_str(), %id, files = attached.len(), "files attached");
    }
    Ok(attached)
}
