//! # API REST
//!
//! REST API and web form for DDX.
//!
//! Handles:
//! - the HTML case report form (`GET /`, `POST /`) with per-session state
//! - JSON endpoints for diagnosis, term extraction and ontology lookups
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, cookies)
//!
//! Uses `api-shared` for common types and `ddx-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod html;
pub mod sessions;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use api_shared::{
    DiagnoseReq, DiagnoseRes, ErrorRes, HealthRes, HealthService, LookupQuery, LookupRes,
    TermsQuery, TermsRes,
};
use ddx_core::{
    extract_terms, update, DefaultDiagnosisService, DiagnosisError, HpoTermDetails,
    OntologyLookup, SessionEvent,
};
use html::render_page;
use sessions::{session_cookie, session_id_from_headers, SessionStore};

/// Application state shared across REST API handlers
///
/// Holds the diagnosis pipeline and the per-browser session store. Both are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    service: Arc<DefaultDiagnosisService>,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(service: DefaultDiagnosisService) -> Self {
        Self {
            service: Arc::new(service),
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, diagnose, terms, lookup, query_symptoms),
    components(schemas(
        HealthRes,
        DiagnoseReq,
        DiagnoseRes,
        TermsRes,
        LookupRes,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Build the application router with all routes, documentation and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health))
        .route("/api/diagnose", post(diagnose))
        .route("/api/terms", get(terms))
        .route("/api/lookup", get(lookup))
        .route("/query", get(query_symptoms))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    case_report: String,
}

/// Resolve the caller's session, minting a new id when there is no valid cookie.
fn session_for(headers: &HeaderMap) -> (Uuid, bool) {
    match session_id_from_headers(headers) {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    }
}

fn page_response(id: Uuid, is_new: bool, page: String) -> Response {
    if is_new {
        ([(header::SET_COOKIE, session_cookie(id))], Html(page)).into_response()
    } else {
        Html(page).into_response()
    }
}

/// Render the case report form with the caller's current session state.
async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (id, is_new) = session_for(&headers);
    let view = state.sessions.get(id).await.view();
    page_response(id, is_new, render_page(&view, ""))
}

/// Handle a form submission and render the settled result.
///
/// The session is marked pending before the pipeline runs and replaced with the settled state
/// afterwards; the previous outcome is never shown alongside the new one.
async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SubmitForm>,
) -> Response {
    let (id, is_new) = session_for(&headers);

    let previous = state.sessions.get(id).await;
    let pending = update(previous, SessionEvent::Submitted);
    state.sessions.set(id, pending.clone()).await;

    let resolved = state
        .service
        .resolve_submission(pending, &form.case_report)
        .await;
    state.sessions.set(id, resolved.clone()).await;

    page_response(id, is_new, render_page(&resolved.view(), &form.case_report))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the DDX service.
/// This endpoint is used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

fn status_for(err: &DiagnosisError) -> StatusCode {
    if matches!(err, DiagnosisError::InvalidInput(_)) {
        StatusCode::BAD_REQUEST
    } else if err.is_auth_error() {
        StatusCode::UNAUTHORIZED
    } else if err.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::BAD_GATEWAY
    }
}

#[utoipa::path(
    post,
    path = "/api/diagnose",
    request_body = DiagnoseReq,
    responses(
        (status = 200, description = "Differential diagnosis", body = DiagnoseRes),
        (status = 400, description = "Empty case report", body = ErrorRes),
        (status = 401, description = "Completion service credentials missing or rejected", body = ErrorRes),
        (status = 502, description = "Completion service failed", body = ErrorRes),
        (status = 504, description = "Completion service timed out", body = ErrorRes)
    )
)]
/// Run the full pipeline for a case report
///
/// Extracts terms, enriches them from the ontology (best effort), composes the prompt and asks
/// the language model for a differential diagnosis.
///
/// # Errors
/// Returns `400` for blank input, `401` for credential problems, `504` when the final
/// completion attempt timed out and `502` for any other completion failure.
#[axum::debug_handler]
async fn diagnose(
    State(state): State<AppState>,
    Json(req): Json<DiagnoseReq>,
) -> Result<Json<DiagnoseRes>, (StatusCode, Json<ErrorRes>)> {
    match state.service.diagnose(&req.case_report).await {
        Ok(diagnosis) => Ok(Json(diagnosis.into())),
        Err(e) => {
            tracing::error!("Diagnose error: {:?}", e);
            Err((status_for(&e), Json(ErrorRes::new(e.user_message()))))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/terms",
    params(TermsQuery),
    responses(
        (status = 200, description = "Extracted terms", body = TermsRes)
    )
)]
/// Split text into the unique lower-cased terms used for ontology lookups
#[axum::debug_handler]
async fn terms(Query(q): Query<TermsQuery>) -> Json<TermsRes> {
    Json(TermsRes {
        terms: extract_terms(&q.text).into_vec(),
    })
}

#[utoipa::path(
    get,
    path = "/api/lookup",
    params(LookupQuery),
    responses(
        (status = 200, description = "Ontology labels for the term", body = LookupRes),
        (status = 400, description = "Empty term", body = ErrorRes),
        (status = 502, description = "Ontology service failed", body = ErrorRes)
    )
)]
/// Resolve one term against the ontology search endpoint
#[axum::debug_handler]
async fn lookup(
    State(state): State<AppState>,
    Query(q): Query<LookupQuery>,
) -> Result<Json<LookupRes>, (StatusCode, Json<ErrorRes>)> {
    let term = q.term.trim();
    if term.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorRes::new("term is required"))));
    }

    match state.service.ontology().lookup(term).await {
        Ok(labels) => Ok(Json(LookupRes {
            term: term.to_string(),
            labels,
        })),
        Err(e) => {
            tracing::error!("Ontology lookup error: {:?}", e);
            Err((StatusCode::BAD_GATEWAY, Json(ErrorRes::new(e.to_string()))))
        }
    }
}

#[utoipa::path(
    get,
    path = "/query",
    params(
        ("symptoms" = Vec<String>, Query, description = "Symptom to search for; repeat for several")
    ),
    responses(
        (status = 200, description = "HPO term details for every term matching any symptom")
    )
)]
/// Look up HPO term details for one or more symptoms
///
/// Each symptom is searched in the HPO terms API and the details of every matching term are
/// returned in order. Symptoms or terms that fail to resolve are skipped.
#[axum::debug_handler]
async fn query_symptoms(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<Vec<HpoTermDetails>> {
    let symptoms: Vec<String> = params
        .into_iter()
        .filter(|(key, value)| key == "symptoms" && !value.trim().is_empty())
        .map(|(_, value)| value)
        .collect();

    Json(state.service.ontology().query_symptoms(&symptoms).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::Path;
    use axum::http::Request;
    use ddx_core::{CompletionSettings, CoreConfig, RetryPolicy};
    use reqwest::Url;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn spawn_upstream() -> Url {
        let app = Router::new()
            .route(
                "/search",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    match q.get("terms").map(String::as_str) {
                        Some("fever") => Ok(Json(json!([1, [], null, [["HP:0001945", "Fever"]]]))),
                        Some("crash") => Err(StatusCode::INTERNAL_SERVER_ERROR),
                        _ => Ok(Json(json!([0, [], null, []]))),
                    }
                }),
            )
            .route(
                "/api/hp/terms",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    match q.get("filter").map(String::as_str) {
                        Some("fever") => Json(json!([{"id": "HP:0001945", "name": "Fever"}])),
                        _ => Json(json!([])),
                    }
                }),
            )
            .route(
                "/api/hp/terms/:id",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"id": id, "name": "Fever", "definition": "High temperature."}))
                }),
            )
            .route(
                "/v1/chat/completions",
                post(|Json(body): Json<Value>| async move {
                    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
                    let answer = if prompt.contains("- Fever") {
                        "1. Influenza <likely>"
                    } else {
                        "1. Unknown"
                    };
                    Json(json!({"choices": [{"message": {"role": "assistant", "content": answer}}]}))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream");
        let addr = listener.local_addr().expect("upstream address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("upstream server");
        });
        Url::parse(&format!("http://{addr}/")).expect("upstream url")
    }

    async fn test_app(api_key: Option<&str>) -> (Router, AppState) {
        let base = spawn_upstream().await;
        let mut completion = CompletionSettings::new(
            base.join("v1").expect("completion url"),
            api_key.map(str::to_owned),
        );
        completion.retry = RetryPolicy {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(5),
            initial_delay: Duration::from_millis(10),
        };
        let cfg = CoreConfig::new(
            completion,
            base.join("search").expect("search url"),
            base.join("api/hp").expect("api url"),
        );
        let service = DefaultDiagnosisService::from_config(&cfg).expect("service");
        let state = AppState::new(service);
        (router(state.clone()), state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).expect("json body")
    }

    fn form_post(body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = test_app(Some("sk-test")).await;
        let response = app.oneshot(get_request("/health")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn index_sets_session_cookie_and_hides_header() {
        let (app, _) = test_app(Some("sk-test")).await;
        let response = app.oneshot(get_request("/")).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("session cookie")
            .to_string();
        assert!(cookie.starts_with("ddx_session="));

        let page = body_text(response).await;
        assert!(page.contains("<textarea"));
        assert!(page.contains(" hidden>Response</h2>"));
    }

    #[tokio::test]
    async fn form_submission_renders_result_and_persists_it() {
        let (app, state) = test_app(Some("sk-test")).await;
        let id = Uuid::new_v4();
        let cookie = format!("ddx_session={id}");

        let response = app
            .clone()
            .oneshot(form_post("case_report=Patient+has+fever", Some(&cookie)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());

        let page = body_text(response).await;
        assert!(page.contains("<h2 id=\"response-header\">Response</h2>"));
        assert!(page.contains("<div id=\"result\">1. Influenza &lt;likely&gt;</div>"));
        assert!(page.contains("<pre id=\"result-copy\">1. Influenza &lt;likely&gt;</pre>"));
        assert!(page.contains("<div id=\"error\"></div>"));
        assert!(page.contains(">Patient has fever</textarea>"));

        let stored = state.sessions().get(id).await.view();
        assert_eq!(stored.result, "1. Influenza <likely>");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let page = body_text(response).await;
        assert!(page.contains("1. Influenza &lt;likely&gt;"));
    }

    #[tokio::test]
    async fn form_submission_without_key_shows_auth_error() {
        let (app, _) = test_app(None).await;
        let response = app
            .oneshot(form_post("case_report=cough", None))
            .await
            .expect("response");

        assert!(response.headers().get(header::SET_COOKIE).is_some());
        let page = body_text(response).await;
        assert!(page.contains("API key is not configured"));
        assert!(page.contains(" hidden>Response</h2>"));
        assert!(page.contains("<div id=\"result\"></div>"));
    }

    #[tokio::test]
    async fn diagnose_returns_pipeline_details() {
        let (app, _) = test_app(Some("sk-test")).await;
        let response = app
            .oneshot(json_post(
                "/api/diagnose",
                json!({"case_report": "Patient has fever and cough"}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["terms"],
            json!(["and", "cough", "fever", "has", "patient"])
        );
        assert_eq!(json["matches"], json!(["HP:0001945", "Fever"]));
        assert_eq!(json["result"], "1. Influenza <likely>");
    }

    #[tokio::test]
    async fn diagnose_survives_failing_ontology_terms() {
        let (app, _) = test_app(Some("sk-test")).await;
        let response = app
            .oneshot(json_post("/api/diagnose", json!({"case_report": "crash fever"})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["matches"], json!(["HP:0001945", "Fever"]));
    }

    #[tokio::test]
    async fn diagnose_rejects_blank_input() {
        let (app, _) = test_app(Some("sk-test")).await;
        let response = app
            .oneshot(json_post("/api/diagnose", json!({"case_report": "  "})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn diagnose_without_key_is_unauthorized() {
        let (app, _) = test_app(None).await;
        let response = app
            .oneshot(json_post("/api/diagnose", json!({"case_report": "fever"})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap_or_default().contains("API key"));
    }

    #[tokio::test]
    async fn terms_endpoint_extracts_terms() {
        let (app, _) = test_app(Some("sk-test")).await;
        let response = app
            .oneshot(get_request("/api/terms?text=Fever%2C%20fever%20and%20RASH"))
            .await
            .expect("response");

        let json = body_json(response).await;
        assert_eq!(json["terms"], json!(["and", "fever", "rash"]));
    }

    #[tokio::test]
    async fn lookup_endpoint_maps_upstream_failures() {
        let (app, _) = test_app(Some("sk-test")).await;

        let ok = app
            .clone()
            .oneshot(get_request("/api/lookup?term=fever"))
            .await
            .expect("response");
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(ok).await["labels"], json!(["HP:0001945", "Fever"]));

        let failed = app
            .clone()
            .oneshot(get_request("/api/lookup?term=crash"))
            .await
            .expect("response");
        assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);

        let blank = app
            .oneshot(get_request("/api/lookup?term=%20"))
            .await
            .expect("response");
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_returns_term_details_for_each_symptom() {
        let (app, _) = test_app(Some("sk-test")).await;
        let response = app
            .oneshot(get_request("/query?symptoms=fever&symptoms=nothing"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let details = json.as_array().expect("list");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["id"], "HP:0001945");
        assert_eq!(details[0]["definition"], "High temperature.");
    }

    #[test]
    fn openapi_lists_json_endpoints() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/api/diagnose", "/api/terms", "/api/lookup", "/query"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
