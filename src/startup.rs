use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::backend::DirectoryClient;
use crate::config::AppConfig;
use crate::logging::logging_middleware;
use crate::resource;

/// Build the SCIM router rooted at `server.base_path`
pub fn build_router(directory: Arc<dyn DirectoryClient>, app_config: Arc<AppConfig>) -> Router {
    let base_path = app_config.server.base_path.trim_end_matches('/').to_string();

    Router::new()
        .route(&format!("{}/Users", base_path), post(resource::user::create_user))
        .route(&format!("{}/Groups", base_path), post(resource::group::create_group))
        .route(
            &format!("{}/Users/{{id}}", base_path),
            get(resource::user::get_user)
                .patch(resource::user::patch_user)
                .delete(resource::user::delete_user),
        )
        .route(
            &format!("{}/Groups/{{id}}", base_path),
            get(resource::group::get_group)
                .patch(resource::group::patch_group)
                .delete(resource::group::delete_group),
        )
        .layer(middleware::from_fn(logging_middleware))
        .with_state((directory, app_config))
}
