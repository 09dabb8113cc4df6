//! Medical file uploads over HTTP.

mod common;

use axum::http::{header, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use common::{assert_redirect, count_rows, header_value, image_part, location, register, spawn_app};

fn report(content: &[u8], filename: &str) -> MultipartForm {
    MultipartForm::new()
        .add_part(
            "file",
            Part::bytes(content.to_vec())
                .file_name(filename.to_string())
                .mime_type("application/pdf"),
        )
        .add_text("description", "Blood test, March")
}

#[tokio::test]
async fn test_upload_show_list_and_download() {
    let app = spawn_app().await;
    let id = register(&app.server, "alice", "patient").await;

    app.server
        .get(&format!("/caredata/users/{id}/upload"))
        .await
        .assert_status_ok();

    let response = app
        .server
        .post(&format!("/caredata/users/{id}/upload"))
        .multipart(report(b"%PDF-1.4 report", "report.pdf"))
        .await;
    response.assert_status(StatusCode::SEE_OTHER);
    let show_path = location(&response);
    assert!(show_path.starts_with(&format!("/caredata/users/{id}/upload/")));

    let show = app.server.get(&show_path).await;
    show.assert_status_ok();
    let body = show.text();
    assert!(body.contains("Your file has been uploaded"));
    assert!(body.contains("report.pdf"));
    assert!(body.contains("Blood test, March"));
    assert!(body.contains("application/pdf"));

    let list = app.server.get(&format!("/caredata/users/{id}/files")).await;
    list.assert_status_ok();
    assert!(list.text().contains(&show_path));

    let file_id = show_path.rsplit('/').next().unwrap();
    let raw = app
        .server
        .get(&format!("/caredata/users/{id}/files/{file_id}/raw"))
        .await;
    raw.assert_status_ok();
    assert_eq!(raw.as_bytes().as_ref(), b"%PDF-1.4 report");
    assert_eq!(header_value(&raw, header::CONTENT_TYPE), "application/pdf");
    assert_eq!(
        header_value(&raw, header::CONTENT_DISPOSITION),
        "attachment; filename=\"report.pdf\""
    );
}

#[tokio::test]
async fn test_images_are_served_inline() {
    let app = spawn_app().await;
    let id = register(&app.server, "alice", "patient").await;

    let response = app
        .server
        .post(&format!("/caredata/users/{id}/upload"))
        .multipart(MultipartForm::new().add_part("file", image_part("xray.png")))
        .await;
    let show_path = location(&response);
    assert!(app.server.get(&show_path).await.text().contains("<img"));

    let file_id = show_path.rsplit('/').next().unwrap();
    let raw = app
        .server
        .get(&format!("/caredata/users/{id}/files/{file_id}/raw"))
        .await;
    assert_eq!(
        header_value(&raw, header::CONTENT_DISPOSITION),
        "inline; filename=\"xray.png\""
    );
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let app = spawn_app().await;
    let id = register(&app.server, "alice", "patient").await;
    let upload_path = format!("/caredata/users/{id}/upload");

    let response = app
        .server
        .post(&upload_path)
        .multipart(report(b"", "empty.pdf"))
        .await;
    assert_redirect(&response, &upload_path);

    let response = app
        .server
        .post(&upload_path)
        .multipart(MultipartForm::new().add_text("description", "no file"))
        .await;
    assert_redirect(&response, &upload_path);

    assert!(app.server.get(&upload_path).await.text().contains("Choose a file to upload"));
    assert_eq!(count_rows(app.db(), "uploaded_files").await, 0);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = spawn_app().await;
    let id = register(&app.server, "alice", "patient").await;

    let too_big = vec![b'x'; 2 * 1024 * 1024];
    let response = app
        .server
        .post(&format!("/caredata/users/{id}/upload"))
        .multipart(report(&too_big, "scan.pdf"))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(count_rows(app.db(), "uploaded_files").await, 0);
}

#[tokio::test]
async fn test_files_are_private_to_their_owner() {
    let app = spawn_app().await;
    let alice = register(&app.server, "alice", "patient").await;
    let response = app
        .server
        .post(&format!("/caredata/users/{alice}/upload"))
        .multipart(report(b"private", "report.pdf"))
        .await;
    let show_path = location(&response);
    let file_id: i64 = show_path.rsplit('/').next().unwrap().parse().unwrap();

    let mallory = app.new_client();
    let mallory_id = register(&mallory, "mallory", "patient").await;

    for path in [
        show_path.clone(),
        format!("/caredata/users/{alice}/files"),
        format!("/caredata/users/{alice}/upload"),
        format!("/caredata/users/{alice}/files/{file_id}/raw"),
    ] {
        mallory.get(&path).await.assert_status(StatusCode::FORBIDDEN);
    }

    let response = mallory
        .post(&format!("/caredata/users/{alice}/upload"))
        .multipart(report(b"planted", "planted.pdf"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(count_rows(app.db(), "uploaded_files").await, 1);

    // A file id under the wrong owner does not exist.
    mallory
        .get(&format!("/caredata/users/{mallory_id}/upload/{file_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    mallory
        .get(&format!("/caredata/users/{mallory_id}/files/{file_id}/raw"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_counts_files() {
    let app = spawn_app().await;
    let id = register(&app.server, "alice", "patient").await;

    for name in ["a.pdf", "b.pdf"] {
        app.server
            .post(&format!("/caredata/users/{id}/upload"))
            .multipart(report(b"data", name))
            .await
            .assert_status(StatusCode::SEE_OTHER);
    }

    let profile = app.server.get(&format!("/caredata/users/{id}")).await.text();
    assert!(profile.contains("My files (2)"));
}
