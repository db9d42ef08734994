//! HTTP client for the HPO services.

use crate::search::labels_from_search_response;
use crate::terms::{HpoTermDetails, HpoTermSummary, TermsSearchResponse};
use crate::{HpoError, HpoResult};
use reqwest::{Client, Response, Url};
use std::future::Future;

/// Resolves a single free-text term to ontology labels.
///
/// This is the seam the diagnosis pipeline depends on, so it can be driven by a stub in tests.
pub trait OntologyLookup: Send + Sync {
    /// Look up one term, issuing at most one upstream request.
    fn lookup(&self, term: &str) -> impl Future<Output = HpoResult<Vec<String>>> + Send;
}

/// Client for the HPO label search endpoint and the HPO terms API.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its connection pool.
#[derive(Clone, Debug)]
pub struct HpoClient {
    http: Client,
    search_url: Url,
    api_url: Url,
}

impl HpoClient {
    /// Create a client.
    ///
    /// # Arguments
    /// * `http` - Shared HTTP client
    /// * `search_url` - Label search endpoint, queried as `?terms=<term>`
    /// * `api_url` - Base of the HPO terms API, for example `https://ontology.jax.org/api/hp`
    pub fn new(http: Client, search_url: Url, api_url: Url) -> Self {
        Self {
            http,
            search_url,
            api_url,
        }
    }

    /// Search the terms API, returning the matching term summaries.
    ///
    /// # Errors
    ///
    /// Returns an `HpoError` if the request fails, the service answers with a non-success
    /// status, or the body is not a list of terms.
    pub async fn search_terms(&self, filter: &str) -> HpoResult<Vec<HpoTermSummary>> {
        let url = self.api_endpoint(&["terms"])?;
        let response = self
            .http
            .get(url)
            .query(&[("filter", filter)])
            .send()
            .await?;
        let response = ensure_success(response)?;
        let body: TermsSearchResponse = response
            .json()
            .await
            .map_err(|e| HpoError::MalformedResponse(e.to_string()))?;
        Ok(body.into_terms())
    }

    /// Fetch the full record for one term id.
    ///
    /// # Errors
    ///
    /// Returns an `HpoError` if the request fails, the service answers with a non-success
    /// status, or the body is not a term record.
    pub async fn term_details(&self, term_id: &str) -> HpoResult<HpoTermDetails> {
        let url = self.api_endpoint(&["terms", term_id])?;
        let response = self.http.get(url).send().await?;
        let response = ensure_success(response)?;
        response
            .json()
            .await
            .map_err(|e| HpoError::MalformedResponse(e.to_string()))
    }

    /// Resolve each symptom to the details of every matching term.
    ///
    /// Symptoms are processed one at a time and in order. A failed search skips that symptom
    /// and a failed details fetch skips that term; both are logged.
    pub async fn query_symptoms(&self, symptoms: &[String]) -> Vec<HpoTermDetails> {
        let mut details = Vec::new();

        for symptom in symptoms {
            let terms = match self.search_terms(symptom).await {
                Ok(terms) => terms,
                Err(e) => {
                    tracing::warn!("error fetching HPO terms for symptom {symptom:?}: {e}");
                    continue;
                }
            };

            for term in terms {
                match self.term_details(&term.id).await {
                    Ok(d) => details.push(d),
                    Err(e) => {
                        tracing::warn!("error fetching details for HPO term {}: {e}", term.id)
                    }
                }
            }
        }

        details
    }

    fn api_endpoint(&self, segments: &[&str]) -> HpoResult<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| HpoError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl OntologyLookup for HpoClient {
    async fn lookup(&self, term: &str) -> HpoResult<Vec<String>> {
        let response = self
            .http
            .get(self.search_url.clone())
            .query(&[("terms", term)])
            .send()
            .await?;
        let response = ensure_success(response)?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| HpoError::MalformedResponse(e.to_string()))?;
        labels_from_search_response(&body)
    }
}

fn ensure_success(response: Response) -> HpoResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(HpoError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_stub(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });
        Url::parse(&format!("http://{addr}/")).expect("stub url")
    }

    async fn search(Query(q): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        match q.get("terms").map(String::as_str) {
            Some("fever") => Ok(Json(json!([1, ["HP:0001945"], null, [["HP:0001945", "Fever"]]]))),
            Some("broken") => Err(StatusCode::INTERNAL_SERVER_ERROR),
            Some("odd") => Ok(Json(json!({"unexpected": true}))),
            _ => Ok(Json(json!([0, [], null, []]))),
        }
    }

    async fn terms(Query(q): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        match q.get("filter").map(String::as_str) {
            Some("fever") => Ok(Json(json!([
                {"id": "HP:0001945", "name": "Fever"},
                {"id": "HP:9999999", "name": "Missing"}
            ]))),
            Some("down") => Err(StatusCode::SERVICE_UNAVAILABLE),
            _ => Ok(Json(json!([]))),
        }
    }

    async fn term(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
        if id == "HP:0001945" {
            Ok(Json(json!({"id": id, "name": "Fever", "synonyms": ["Pyrexia"]})))
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    async fn stub_client() -> HpoClient {
        let app = Router::new()
            .route("/search", get(search))
            .route("/api/hp/terms", get(terms))
            .route("/api/hp/terms/:id", get(term));
        let base = spawn_stub(app).await;
        HpoClient::new(
            Client::new(),
            base.join("search").expect("search url"),
            base.join("api/hp").expect("api url"),
        )
    }

    #[tokio::test]
    async fn lookup_returns_flattened_labels() {
        let client = stub_client().await;
        let labels = client.lookup("fever").await.expect("lookup fever");
        assert_eq!(labels, vec!["HP:0001945", "Fever"]);

        let none = client.lookup("cough").await.expect("lookup cough");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn lookup_surfaces_server_errors() {
        let client = stub_client().await;
        let err = client.lookup("broken").await.expect_err("500 should fail");
        match err {
            HpoError::Status { status, .. } => assert_eq!(status, 500),
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lookup_reports_malformed_bodies() {
        let client = stub_client().await;
        let err = client.lookup("odd").await.expect_err("object body");
        assert!(matches!(err, HpoError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn term_details_hits_the_terms_path() {
        let client = stub_client().await;
        let details = client.term_details("HP:0001945").await.expect("details");
        assert_eq!(details.name, "Fever");
        assert_eq!(details.synonyms, vec!["Pyrexia"]);
    }

    #[tokio::test]
    async fn query_symptoms_skips_failures() {
        let client = stub_client().await;
        let symptoms = vec!["fever".to_string(), "down".to_string(), "none".to_string()];

        let details = client.query_symptoms(&symptoms).await;
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, "HP:0001945");
    }
}
