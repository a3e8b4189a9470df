//! Update package uploads.

use axum::{
    Json, Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::instrument;

use metra_core::{UpdateId, UpdateType, UserId};

use super::{ApiPath, DELETED};
use crate::db::UpdateRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::{NewUpdate, Update};
use crate::services::UploadStore;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/updates/", get(list).post(create))
        .route("/api/dashboard/updates/{id}/", get(retrieve).delete(destroy))
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Form fields collected from a multipart upload.
#[derive(Debug, Default)]
struct UploadForm {
    title: String,
    update_type: String,
    description: String,
    version: String,
    file: Option<(String, Vec<u8>)>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            match field.name().unwrap_or_default() {
                "file" => {
                    let name = field.file_name().unwrap_or("upload").to_string();
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.file = Some((name, bytes.to_vec()));
                    }
                }
                "title" => form.title = field.text().await?,
                "update_type" => form.update_type = field.text().await?,
                "description" => form.description = field.text().await?,
                "version" => form.version = field.text().await?,
                other => tracing::debug!(field = other, "Ignoring unknown upload field"),
            }
        }
        Ok(form)
    }

    /// The record to insert once the file has been stored as `file`.
    fn into_update(
        self,
        uploaded_by: UserId,
    ) -> std::result::Result<(NewUpdate, String, Vec<u8>), String> {
        let (file_name, bytes) = self.file.ok_or("No file provided")?;
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err("Title is required.".to_string());
        }
        let version = self.version.trim().to_string();
        if version.is_empty() {
            return Err("Version is required.".to_string());
        }
        let update_type = self
            .update_type
            .trim()
            .parse::<UpdateType>()
            .map_err(|_| format!("\"{}\" is not a valid update type.", self.update_type.trim()))?;

        let update = NewUpdate {
            title,
            update_type,
            description: self.description.trim().to_string(),
            version,
            file: String::new(),
            uploaded_by,
        };
        Ok((update, file_name, bytes))
    }
}

/// # Errors
///
/// Returns an error if the query fails.
#[instrument(skip(state, _staff))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<Update>>> {
    Ok(Json(UpdateRepository::new(state.pool()).list().await?))
}

/// Multipart upload: `title`, `update_type`, `description`, `version`, `file`.
///
/// # Errors
///
/// 400 "No file provided" without a file, 400 for other invalid fields.
#[instrument(skip(state, staff, multipart), fields(staff = %staff.username))]
pub async fn create(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let form = UploadForm::read(multipart?).await?;
    let (mut update, file_name, bytes) =
        form.into_update(staff.id).map_err(AppError::BadRequest)?;

    let store = UploadStore::new(&state.config().upload_dir);
    update.file = store
        .save(&file_name, &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store upload: {e}")))?;

    match UpdateRepository::new(state.pool()).create(&update).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created)).into_response()),
        Err(e) => {
            if let Err(cleanup) = store.remove(&update.file).await {
                tracing::warn!(
                    file = %update.file,
                    error = %cleanup,
                    "Failed to remove orphaned upload"
                );
            }
            Err(e.into())
        }
    }
}

/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn retrieve(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UpdateId>,
) -> Result<Json<Update>> {
    Ok(Json(UpdateRepository::new(state.pool()).get(id).await?))
}

/// Delete the record, then its file.
///
/// # Errors
///
/// 404 for an unknown ID.
#[instrument(skip(state, _staff))]
pub async fn destroy(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UpdateId>,
) -> Result<StatusCode> {
    let file = UpdateRepository::new(state.pool()).delete(id).await?;
    if let Err(e) = UploadStore::new(&state.config().upload_dir).remove(&file).await {
        tracing::warn!(%id, %file, error = %e, "Failed to remove update file");
    }
    Ok(DELETED)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> UploadForm {
        UploadForm {
            title: " Patch ".to_string(),
            update_type: "security".to_string(),
            description: String::new(),
            version: "1.2.0".to_string(),
            file: Some(("patch.zip".to_string(), vec![1, 2, 3])),
        }
    }

    #[test]
    fn test_form_becomes_update() {
        let (update, name, bytes) = form().into_update(UserId::new(1)).unwrap();
        assert_eq!(update.title, "Patch");
        assert_eq!(update.update_type, UpdateType::Security);
        assert_eq!(name, "patch.zip");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_file_is_reported_first() {
        let mut missing = form();
        missing.file = None;
        missing.title = String::new();
        assert_eq!(
            missing.into_update(UserId::new(1)).unwrap_err(),
            "No file provided"
        );
    }

    #[test]
    fn test_rejects_unknown_type() {
        let mut bad = form();
        bad.update_type = "firmware".to_string();
        assert!(bad.into_update(UserId::new(1)).is_err());
    }
}
