//! Proof-of-payment upload handlers.
//!
//! An upload is written twice: to the private `payment-proofs` container
//! and to `contracts/payments` on the file share. The two writes are not
//! coordinated; a failure in the second leaves the blob in place.

use abc_retailers_core::{ObjectNaming, Visibility};
use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    middleware::{Flash, take_flash},
    state::AppState,
    storage::{
        CONTRACTS_SHARE, PAYMENT_PROOFS_CONTAINER, PAYMENTS_DIRECTORY, StorageError,
        blob::content_type_for,
    },
};

use super::{UploadedFile, failure_message, multipart_error, render};

/// Upload page template.
#[derive(Template)]
#[template(path = "uploads/index.html")]
pub struct UploadTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub error: Option<String>,
    /// Name of the copy on the file share, for the download link.
    pub share_file: Option<String>,
}

impl UploadTemplate {
    fn new(flashes: Vec<Flash>, error: Option<String>, share_file: Option<String>) -> Self {
        Self {
            current_path: "/uploads".to_string(),
            flashes,
            error,
            share_file,
        }
    }
}

/// Upload form handler.
pub async fn index(session: Session) -> Html<String> {
    render(&UploadTemplate::new(take_flash(&session).await, None, None))
}

/// Upload handler. Expects a `proof_of_payment` file field.
#[instrument(skip(state, multipart))]
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Result<Response, AppError> {
    let mut proof = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("proof_of_payment") {
            proof = UploadedFile::read(field).await?;
        }
    }

    let Some(proof) = proof else {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            render(&UploadTemplate::new(
                Vec::new(),
                Some("Please select a file to upload.".to_string()),
                None,
            )),
        )
            .into_response());
    };

    let storage = state.storage();
    let result: Result<(String, String), StorageError> = async {
        let stored = storage
            .objects()
            .put_object(
                PAYMENT_PROOFS_CONTAINER,
                proof.content.clone(),
                &proof.filename,
                Visibility::Private,
                ObjectNaming::Timestamped,
            )
            .await?;
        let share_file = storage
            .files()
            .put_file(CONTRACTS_SHARE, PAYMENTS_DIRECTORY, &proof.content, &proof.filename)
            .await?;
        Ok((stored.name, share_file))
    }
    .await;

    match result {
        Ok((blob_name, share_file)) => {
            let flash = Flash::success(format!(
                "File uploaded successfully! File name: {blob_name}"
            ));
            Ok(render(&UploadTemplate::new(vec![flash], None, Some(share_file))).into_response())
        }
        Err(e) => {
            let message = failure_message("Error uploading file", &e);
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                render(&UploadTemplate::new(Vec::new(), Some(message), None)),
            )
                .into_response())
        }
    }
}

/// Download a proof of payment from `contracts/payments`.
#[instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let content = state
        .storage()
        .files()
        .get_file(CONTRACTS_SHARE, PAYMENTS_DIRECTORY, &name)
        .await
        .map_err(|e| match e {
            StorageError::NotFound => AppError::NotFound(format!("file {name}")),
            other => AppError::Storage(other),
        })?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        name.replace('"', "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(content_type_for(&name))),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, HeaderValue::from_static("private, no-store")),
        ],
        content,
    )
        .into_response())
}
