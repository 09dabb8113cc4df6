//! Uploaded medical files: upload, list, show and download.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::db::UserRepository;
use crate::file::{
    sanitize_filename, FileRepository, NewUploadedFile, UploadedFile, MAX_DESCRIPTION_LENGTH,
};
use crate::web::dto::{FileView, UserView};
use crate::web::error::WebError;
use crate::web::flash::Flash;
use crate::web::handlers::auth::multipart_error;
use crate::web::handlers::{profile_path, redirect_with, require_owner, AppState};
use crate::web::middleware::AuthUser;
use crate::web::page::Page;

/// Build a Content-Disposition value that cannot break out of the header.
///
/// Control characters, quotes and backslashes are dropped from the plain
/// `filename`; non-ASCII names also get an RFC 5987 `filename*`.
fn content_disposition_header(disposition: &str, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("{disposition}; filename=\"{filename}\"");
    }

    format!(
        "{disposition}; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

async fn owner_view(state: &AppState, id: i64) -> Result<UserView, WebError> {
    UserRepository::new(state.db.pool())
        .get_by_id(id)
        .await?
        .map(|u| UserView::from(&u))
        .ok_or_else(|| WebError::not_found("User not found"))
}

/// Fetch a file that must belong to `owner_id`.
async fn owned_file(state: &AppState, owner_id: i64, file_id: i64) -> Result<UploadedFile, WebError> {
    FileRepository::new(state.db.pool())
        .get_by_id(file_id)
        .await?
        .filter(|f| f.owner_id == owner_id)
        .ok_or_else(|| WebError::not_found("File not found"))
}

/// GET /caredata/users/:id/upload - Upload page.
pub async fn upload_form(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;

    let profile_user = owner_view(&state, id).await?;
    let file_count = FileRepository::new(state.db.pool())
        .count_by_owner(id)
        .await?;

    Ok(Page::new("file/upload", "Upload a file")
        .with_serialized("profile_user", &profile_user)?
        .with("file_count", file_count)
        .with("max_upload_mb", (state.max_upload_size / (1024 * 1024)) as i64)
        .render(&state, jar, Some(&user))?
        .into_response())
}

/// POST /caredata/users/:id/upload - Store an uploaded file.
///
/// Request body: multipart/form-data with "file" and optional "description".
pub async fn upload_file(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;
    let upload_path = format!("{}/upload", profile_path(id));

    let mut upload = None;
    let mut description = String::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().map(sanitize_filename);
                let data = field.bytes().await.map_err(multipart_error)?;
                upload = filename.map(|f| (f, data));
            }
            Some("description") => {
                description = field.text().await.map_err(multipart_error)?;
            }
            _ => {}
        }
    }

    let Some((filename, data)) = upload.filter(|(_, data)| !data.is_empty()) else {
        return Ok(redirect_with(jar, Flash::error("Choose a file to upload"), &upload_path));
    };

    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Ok(redirect_with(
            jar,
            Flash::error(format!(
                "Description must be at most {MAX_DESCRIPTION_LENGTH} characters"
            )),
            &upload_path,
        ));
    }

    let content_type = mime_guess::from_path(&filename)
        .first_or_octet_stream()
        .to_string();
    let stored_name = state.storage.save(&data, &filename)?;

    let mut new_file =
        NewUploadedFile::new(id, &filename, &stored_name, content_type, data.len() as i64);
    if !description.is_empty() {
        new_file = new_file.with_description(description);
    }

    let file = match FileRepository::new(state.db.pool()).create(&new_file).await {
        Ok(file) => file,
        Err(e) => {
            if let Err(err) = state.storage.delete(&stored_name) {
                tracing::warn!(error = %err, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        user_id = id,
        file_id = file.id,
        size = file.size,
        content_type = %file.content_type,
        "File uploaded"
    );

    Ok(redirect_with(
        jar,
        Flash::success("Your file has been uploaded"),
        &format!("{upload_path}/{}", file.id),
    ))
}

/// GET /caredata/users/:id/upload/:file_id - One uploaded file.
pub async fn show_file(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, file_id)): Path<(i64, i64)>,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;

    let profile_user = owner_view(&state, id).await?;
    let file = owned_file(&state, id, file_id).await?;

    Ok(Page::new("file/show", file.filename.clone())
        .with_serialized("profile_user", &profile_user)?
        .with_serialized("file", &FileView::from(&file))?
        .render(&state, jar, Some(&user))?
        .into_response())
}

/// GET /caredata/users/:id/files - All files of a user, newest first.
pub async fn list_files(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    jar: SignedCookieJar,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;

    let profile_user = owner_view(&state, id).await?;
    let files: Vec<FileView> = FileRepository::new(state.db.pool())
        .list_by_owner(id)
        .await?
        .iter()
        .map(FileView::from)
        .collect();

    Ok(Page::new("file/list", "Files")
        .with_serialized("profile_user", &profile_user)?
        .with_serialized("files", &files)?
        .render(&state, jar, Some(&user))?
        .into_response())
}

/// GET /caredata/users/:id/files/:file_id/raw - File content.
///
/// Images are served inline, everything else as an attachment.
pub async fn download_file(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, file_id)): Path<(i64, i64)>,
) -> Result<Response, WebError> {
    require_owner(&user, id)?;

    let file = owned_file(&state, id, file_id).await?;
    let content = state.storage.load(&file.stored_name)?;
    let disposition = if file.is_image() { "inline" } else { "attachment" };

    Response::builder()
        .header(header::CONTENT_TYPE, &file.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(disposition, &file.filename),
        )
        .header(header::CONTENT_LENGTH, content.len())
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build download response");
            WebError::internal(crate::web::error::INTERNAL_ERROR_MESSAGE)
        })
}
