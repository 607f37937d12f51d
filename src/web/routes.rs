//! HTTP routes: one GET path per operation under each release version

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::error;

use crate::tools::error::LoadError;
use crate::tools::factory::ToolsFactory;
use crate::tools::service::ToolsService;
use crate::web::render;

/// Placeholder path segment redirected to the newest release
pub const LATEST: &str = "latest";

type Params = HashMap<String, String>;

#[derive(Clone)]
pub struct AppState {
    factory: Arc<dyn ToolsFactory>,
}

pub fn router(factory: Arc<dyn ToolsFactory>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/latest", get(latest))
        .route("/latest/*rest", get(latest))
        .route("/:version", get(release_index))
        .route("/:version/parse-framework", get(parse_framework))
        .route(
            "/:version/framework-compatibility",
            get(framework_compatibility),
        )
        .route("/:version/get-nearest-framework", get(nearest_framework))
        .route("/:version/framework-precedence", get(framework_precedence))
        .route("/:version/parse-version", get(parse_version))
        .route("/:version/version-comparison", get(version_comparison))
        .route("/:version/sort-versions", get(sort_versions))
        .route("/:version/parse-version-range", get(parse_version_range))
        .route("/:version/version-satisfies", get(version_satisfies))
        .route(
            "/:version/find-best-version-match",
            get(find_best_version_match),
        )
        .with_state(AppState { factory })
}

fn redirect(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn not_found(version: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        format!("NuGet version {} is not available.\n", version),
    )
        .into_response()
}

fn load_failure(version: &str, e: LoadError) -> Response {
    error!("Request for NuGet {} failed: {}", version, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("NuGet {} could not be loaded: {}\n", version, e),
    )
        .into_response()
}

fn required<'q>(query: &'q Params, name: &str) -> Result<&'q str, String> {
    query
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| render::missing_parameter(name))
}

/// Runs `render` against the tools service of `version`.
///
/// Both arms of the render result are answered with 200.
async fn with_tools<F>(state: &AppState, version: &str, render: F) -> Response
where
    F: FnOnce(&ToolsService) -> Result<String, String>,
{
    match state.factory.tools_service(version).await {
        Ok(Some(tools)) => match render(tools.as_ref()) {
            Ok(text) | Err(text) => text.into_response(),
        },
        Ok(None) => not_found(version),
        Err(e) => load_failure(version, e),
    }
}

async fn root(State(state): State<AppState>) -> Response {
    match state.factory.latest_version().await {
        Ok(Some(latest)) => redirect(format!("/{}", latest)),
        Ok(None) => (StatusCode::NOT_FOUND, "No NuGet versions are available.\n").into_response(),
        Err(e) => load_failure(LATEST, e),
    }
}

/// Rewrites `/latest/...` to the newest release, keeping the rest of the path and the query
async fn latest(State(state): State<AppState>, uri: Uri) -> Response {
    let latest = match state.factory.latest_version().await {
        Ok(Some(latest)) => latest,
        Ok(None) => return not_found(LATEST),
        Err(e) => return load_failure(LATEST, e),
    };

    let rest = uri
        .path()
        .strip_prefix("/latest")
        .unwrap_or_default()
        .to_string();
    let location = match uri.query() {
        Some(query) => format!("/{}{}?{}", latest, rest, query),
        None => format!("/{}{}", latest, rest),
    };
    redirect(location)
}

async fn release_index(State(state): State<AppState>, Path(version): Path<String>) -> Response {
    let available = match state.factory.available_versions().await {
        Ok(available) => available,
        Err(e) => return load_failure(&version, e),
    };

    match available
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(&version))
    {
        Some(release) => render::index(release, &available).into_response(),
        None => not_found(&version),
    }
}

async fn parse_framework(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let framework = required(&query, "framework")?;
        Ok(render::parse_framework(tools, framework))
    })
    .await
}

async fn framework_compatibility(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let project = required(&query, "project")?;
        let package = required(&query, "package")?;
        Ok(render::framework_compatibility(tools, project, package))
    })
    .await
}

async fn nearest_framework(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let project = required(&query, "project")?;
        let packages = required(&query, "package")?;
        Ok(render::nearest_framework(tools, project, packages))
    })
    .await
}

async fn framework_precedence(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    let precedence = match state.factory.precedence_service(&version).await {
        Ok(Some(precedence)) => precedence,
        Ok(None) => return not_found(&version),
        Err(e) => return load_failure(&version, e),
    };

    match required(&query, "framework") {
        Ok(framework) => render::framework_precedence(&precedence, framework).into_response(),
        Err(text) => text.into_response(),
    }
}

async fn parse_version(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let input = required(&query, "version")?;
        Ok(render::parse_version(tools, input))
    })
    .await
}

async fn version_comparison(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let a = required(&query, "versionA")?;
        let b = required(&query, "versionB")?;
        Ok(render::version_comparison(tools, a, b))
    })
    .await
}

async fn sort_versions(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let versions = required(&query, "versions")?;
        Ok(render::sort_versions(tools, versions))
    })
    .await
}

async fn parse_version_range(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let range = required(&query, "versionRange")?;
        Ok(render::parse_version_range(tools, range))
    })
    .await
}

async fn version_satisfies(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let range = required(&query, "versionRange")?;
        let input = required(&query, "version")?;
        Ok(render::version_satisfies(tools, range, input))
    })
    .await
}

async fn find_best_version_match(
    State(state): State<AppState>,
    Path(version): Path<String>,
    Query(query): Query<Params>,
) -> Response {
    with_tools(&state, &version, |tools| {
        let range = required(&query, "versionRange")?;
        let versions = required(&query, "versions")?;
        Ok(render::find_best_version_match(tools, range, versions))
    })
    .await
}
