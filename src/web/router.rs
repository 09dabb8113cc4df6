//! Router configuration.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_details, add_details_form, doctors_info, download_file, edit_form, health, home,
    list_doctors, list_files, login, login_form, logout, not_found, profile_image, register,
    register_form, root, show_file, show_profile, update_image, update_profile,
    update_profile_override, upload_file, upload_form, AppState,
};
use super::middleware::{render_error_pages, resolve_session, security_headers};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/caredata", get(home))
        .route("/doctorsProfile", get(doctors_info))
        .route("/caredata/doctors", get(list_doctors))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
        .route("/caredata/users/:id/image", get(profile_image).post(update_image));

    // Every handler below takes `AuthUser`.
    let user_routes = Router::new()
        .route(
            "/caredata/users/:id",
            get(show_profile)
                .put(update_profile)
                .post(update_profile_override),
        )
        .route("/caredata/users/:id/edit", get(edit_form).put(update_profile))
        .route(
            "/caredata/users/:id/adddetails",
            get(add_details_form).post(add_details),
        )
        .route("/caredata/users/:id/upload", get(upload_form).post(upload_file))
        .route("/caredata/users/:id/upload/:file_id", get(show_file))
        .route("/caredata/users/:id/files", get(list_files))
        .route("/caredata/users/:id/files/:file_id/raw", get(download_file));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(create_health_router())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.max_upload_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    render_error_pages,
                )),
        )
        .with_state(state)
}

/// Create a health check router.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_router() {
        let response = create_health_router::<()>()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
