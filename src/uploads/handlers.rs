use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{errors::ApiError, state::AppState};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Accept a single `image` part, persist it under a generated name and
/// hand back the public URL it will be served from.
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let ext = sanitized_ext(field.file_name());
        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let filename = format!("image-{}-{}{}", millis, rand::random::<u32>(), ext);

        state.uploads.save(&filename, body).await?;

        let url = format!(
            "{}/image/{}",
            state.config.public_base_url.trim_end_matches('/'),
            filename
        );
        info!(%filename, "image uploaded");
        return Ok(Json(UploadResponse { url }));
    }

    Err(ApiError::BadRequest("Image file is required!".into()))
}

/// Client file names contribute nothing but the extension, and only a
/// clean alphanumeric one.
fn sanitized_ext(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
