//! REST API handlers.
//!
//! Each handler drives a stack lifecycle call via the engine and blocks the
//! request until it completes. No retries and no local bookkeeping; the
//! engine's state is the only source of truth.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::warn;

use geostacks_core::{Site, SiteSummary, validate_username};
use geostacks_engine::{EngineError, Outputs, SiteProgram, WEBSITE_URL_OUTPUT};

use crate::ApiState;

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse + use<> {
    (
        status,
        Json(ErrorBody {
            error: msg.to_string(),
        }),
    )
}

/// Map an engine failure to a response status.
///
/// Engine-reported provisioning/teardown failures are the upstream's fault,
/// hence 502; spawn and output-parsing failures are ours, hence 500.
fn engine_status(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) | EngineError::ConcurrentUpdate(_) => StatusCode::CONFLICT,
        EngineError::Command { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn engine_error(err: &EngineError) -> impl IntoResponse + use<> {
    error_response(&err.to_string(), engine_status(err))
}

fn website_url(stack: &str, outputs: &Outputs) -> Result<String, EngineError> {
    outputs
        .get(WEBSITE_URL_OUTPUT)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| EngineError::MissingOutput {
            stack: stack.to_string(),
            output: WEBSITE_URL_OUTPUT.to_string(),
        })
}

// ── Sites ──────────────────────────────────────────────────────

/// Create request body.
#[derive(serde::Deserialize)]
pub struct CreateSiteRequest {
    #[serde(default)]
    pub username: String,
}

/// POST /site
pub async fn create_site(
    State(state): State<ApiState>,
    Json(req): Json<CreateSiteRequest>,
) -> impl IntoResponse {
    if let Err(msg) = validate_username(&req.username) {
        return error_response(&msg, StatusCode::BAD_REQUEST).into_response();
    }

    let program = SiteProgram::new(&req.username, &state.settings.project);
    match state.engine.create(&req.username, &program).await {
        Ok(outputs) => match website_url(&req.username, &outputs) {
            Ok(url) => (
                StatusCode::CREATED,
                Json(Site {
                    id: req.username,
                    url,
                }),
            )
                .into_response(),
            Err(e) => engine_error(&e).into_response(),
        },
        Err(e) => engine_error(&e).into_response(),
    }
}

/// GET /site
pub async fn list_sites(State(state): State<ApiState>) -> impl IntoResponse {
    let names = match state.engine.list().await {
        Ok(names) => names,
        Err(e) => return engine_error(&e).into_response(),
    };

    // Output reads are best-effort; a stack mid-provision has no url yet.
    let mut sites = Vec::with_capacity(names.len());
    for name in names {
        let url = match state.engine.outputs(&name).await {
            Ok(outputs) => website_url(&name, &outputs).ok(),
            Err(e) => {
                warn!(stack = %name, error = %e, "could not read outputs while listing");
                None
            }
        };
        sites.push(SiteSummary { id: name, url });
    }
    Json(sites).into_response()
}

/// GET /site/{username}
pub async fn get_site(
    State(state): State<ApiState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    if let Err(e) = state.engine.select(&username).await {
        return engine_error(&e).into_response();
    }
    match state.engine.outputs(&username).await {
        Ok(outputs) => match website_url(&username, &outputs) {
            Ok(url) => Json(Site { id: username, url }).into_response(),
            Err(e) => engine_error(&e).into_response(),
        },
        Err(e) => engine_error(&e).into_response(),
    }
}

/// Delete response body.
#[derive(serde::Serialize)]
struct DeleteResponse {
    message: String,
}

/// DELETE /site/{username}
pub async fn delete_site(
    State(state): State<ApiState>,
    Path(username): Path<String>,
) -> impl IntoResponse {
    if let Err(e) = state.engine.select(&username).await {
        return engine_error(&e).into_response();
    }
    if let Err(e) = state.engine.destroy(&username).await {
        return engine_error(&e).into_response();
    }
    // Drop the stack entry so the name becomes creatable again.
    if let Err(e) = state.engine.remove(&username).await {
        return engine_error(&e).into_response();
    }
    Json(DeleteResponse {
        message: format!("Stack '{username}' resources successfully removed!"),
    })
    .into_response()
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use geostacks_core::Settings;
    use geostacks_engine::MemoryEngine;

    fn test_state() -> ApiState {
        ApiState {
            engine: Arc::new(MemoryEngine::new()),
            settings: Arc::new(Settings::default()),
        }
    }

    fn create_req(username: &str) -> Json<CreateSiteRequest> {
        Json(CreateSiteRequest {
            username: username.to_string(),
        })
    }

    #[tokio::test]
    async fn list_sites_empty() {
        let state = test_state();
        let resp = list_sites(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_and_get_site() {
        let state = test_state();

        let resp = create_site(State(state.clone()), create_req("chris"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = get_site(State(state), Path("chris".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_duplicate_conflicts() {
        let state = test_state();

        let resp = create_site(State(state.clone()), create_req("chris"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = create_site(State(state), create_req("chris"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_rejects_invalid_usernames() {
        let state = test_state();

        for bad in ["", "Chris", "chris smith", "-chris"] {
            let resp = create_site(State(state.clone()), create_req(bad))
                .await
                .into_response();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "username: {bad:?}");
        }
    }

    #[tokio::test]
    async fn error_bodies_carry_the_engine_message() {
        let state = test_state();
        create_site(State(state.clone()), create_req("chris")).await;

        let resp = create_site(State(state), create_req("chris"))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "stack 'chris' already exists");
    }

    #[tokio::test]
    async fn get_nonexistent_site() {
        let state = test_state();
        let resp = get_site(State(state), Path("nope".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_site_then_get_is_not_found() {
        let state = test_state();

        create_site(State(state.clone()), create_req("chris")).await;

        let resp = delete_site(State(state.clone()), Path("chris".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = get_site(State(state), Path("chris".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_nonexistent_site() {
        let state = test_state();
        let resp = delete_site(State(state), Path("nope".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_includes_created_sites() {
        let state = test_state();
        for name in ["alpha", "beta", "gamma"] {
            create_site(State(state.clone()), create_req(name)).await;
        }

        let sites = match state.engine.list().await {
            Ok(names) => names,
            Err(e) => panic!("list failed: {e}"),
        };
        assert_eq!(sites.len(), 3);

        let resp = list_sites(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn healthz_ok() {
        let resp = healthz().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
