//! Request routing: prefix strip, `(resource, resource_id)` segment split,
//! OPTIONS pre-flight, and the top-level error catch that turns any handler
//! failure into a JSON error body.

use crate::AppState;
use crate::api;
use crate::errors::Result;
use crate::response::{HandlerBody, error_response, preflight_response};
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use std::sync::Arc;

#[derive(Clone)]
pub struct Router {
    state: Arc<AppState>,
}

/// Path split into the leading resource segment and an optional id.
fn split_path<'a>(path: &'a str, prefix: &str) -> (&'a str, Option<&'a str>) {
    let stripped = path.strip_prefix(prefix).unwrap_or(path);
    let mut segments = stripped.split('/').filter(|s| !s.is_empty());
    let resource = segments.next().unwrap_or("");
    let resource_id = segments.next().filter(|s| !s.is_empty());
    (resource, resource_id)
}

impl Router {
    pub fn new(state: Arc<AppState>) -> Self {
        Router { state }
    }

    pub async fn route<B>(&self, req: Request<B>) -> Response<HandlerBody>
    where
        B: hyper::body::Body + Send,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        if parts.method == Method::OPTIONS {
            return match preflight_response() {
                Ok(response) => response,
                Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
            };
        }

        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Failed to read request body: {e}"),
                );
            }
        };

        let path = parts.uri.path().to_string();
        let (resource, resource_id) = split_path(&path, &self.state.config.path_prefix);

        tracing::debug!(method = %parts.method, resource, ?resource_id, "Dispatching");

        let result = self
            .dispatch(resource, resource_id, &parts.method, &parts.headers, &bytes)
            .await;

        match result {
            Ok(response) => response,
            Err(e) => {
                let status = e.status();
                if status.is_server_error() {
                    tracing::error!(method = %parts.method, path, error = %e, "Request failed");
                } else {
                    tracing::debug!(method = %parts.method, path, error = %e, "Request rejected");
                }
                error_response(status, &e.to_string())
            }
        }
    }

    async fn dispatch(
        &self,
        resource: &str,
        resource_id: Option<&str>,
        method: &Method,
        headers: &hyper::header::HeaderMap,
        body: &Bytes,
    ) -> Result<Response<HandlerBody>> {
        let state = self.state.as_ref();

        match (resource, resource_id) {
            ("price-list", None) if method == Method::POST => {
                api::price_list::create(state, body).await
            }
            ("price-list", Some(id)) if method == Method::GET => {
                api::price_list::get(state, id).await
            }
            ("sample-request", None) if method == Method::POST => {
                api::sample_request::create(state, body).await
            }
            ("sample-request", None) if method == Method::GET => {
                api::sample_request::list(state).await
            }
            ("sample-request", Some(id)) if method == Method::GET => {
                api::sample_request::get(state, id).await
            }
            ("sample-request", Some(id)) if method == Method::PATCH => {
                api::sample_request::patch_status(state, id, body).await
            }
            ("states", None) if method == Method::GET => api::states::get(state).await,
            ("track", Some(id)) if method == Method::GET => {
                api::track::view(state, id, headers).await
            }
            ("track-duration", None) if method == Method::POST => {
                api::track::duration(state, body).await
            }
            _ => Ok(error_response(StatusCode::NOT_FOUND, "Not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Databases, Listener, StoreConfig};
    use crate::store::props;
    use crate::testutils::MemoryStore;
    use crate::{AppState, StoreHandle};
    use http_body_util::{BodyExt, Empty, Full};
    use serde_json::Value;

    fn databases() -> Databases {
        Databases {
            exports: "exports".to_string(),
            products: "products".to_string(),
            producers: "producers".to_string(),
            requests: "requests".to_string(),
            states: None,
        }
    }

    fn test_config() -> Config {
        Config {
            listener: Listener::default(),
            base_url: url::Url::parse("https://samples.example.com").unwrap(),
            path_prefix: "/api".to_string(),
            store: Some(StoreConfig {
                token: "test".to_string(),
                api_url: url::Url::parse("https://api.notion.com").unwrap(),
                databases: databases(),
            }),
            email: None,
            geo: Default::default(),
        }
    }

    fn test_router() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState {
            config: test_config(),
            store: Some(StoreHandle {
                store: store.clone(),
                databases: databases(),
            }),
            email: None,
            geo: crate::geo::GeoClient::new(&Default::default()),
        };
        (Router::new(Arc::new(state)), store)
    }

    fn get_request(path: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Empty::new())
            .unwrap()
    }

    fn post_request(path: &str, body: Value) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_json(response: Response<HandlerBody>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/api/price-list", "/api"), ("price-list", None));
        assert_eq!(
            split_path("/api/price-list/abc", "/api"),
            ("price-list", Some("abc"))
        );
        assert_eq!(split_path("/states", "/api"), ("states", None));
        assert_eq!(split_path("/api/", "/api"), ("", None));
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let (router, _) = test_router();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/anything/at/all")
            .body(Empty::<Bytes>::new())
            .unwrap();

        let response = router.route(req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("Access-Control-Allow-Origin")
                .unwrap(),
            "*"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_404() {
        let (router, _) = test_router();
        let response = router.route(get_request("/api/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn test_price_list_create_and_get() {
        let (router, store) = test_router();

        let payload = serde_json::json!({
            "name": "Fall Portfolio",
            "company": "Loon Trading",
            "wines": [
                { "Product Name": "Bonnet Blanc", "Producer": "Lurton", "Region": "Bordeaux" },
                { "name": "Tertre du Bosquet", "producer": "Bercut", "region": "Languedoc" },
            ]
        });
        let response = router.route(post_request("/api/price-list", payload)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["wineCount"], 2);
        let id = body["id"].as_str().unwrap().to_string();
        assert!(body["sampleUrl"].as_str().unwrap().contains(&id));
        assert_eq!(store.len("exports"), 1);

        let response = router
            .route(get_request(&format!("/api/price-list/{id}")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["displayName"], "Fall Portfolio");
        assert_eq!(body["productCount"], 2);
        assert_eq!(body["wines"]["Bordeaux"]["Lurton"][0]["name"], "Bonnet Blanc");
        assert_eq!(
            body["wines"]["Languedoc"]["Bercut"][0]["name"],
            "Tertre du Bosquet"
        );
    }

    #[tokio::test]
    async fn test_filtered_variant_decorates_display_name() {
        let (router, _) = test_router();
        let payload = serde_json::json!({
            "name": "Fall Portfolio",
            "wines": [{ "Product Name": "W", "Producer": "P", "Region": "R" }]
        });
        let response = router.route(post_request("/api/price-list", payload)).await;
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = router
            .route(get_request(&format!("/api/price-list/{id}-92")))
            .await;
        let body = body_json(response).await;
        assert_eq!(body["displayName"], "Fall Portfolio (92+ Rated)");
        assert_eq!(body["id"], format!("{id}-92"));
    }

    #[tokio::test]
    async fn test_price_list_unknown_id_404() {
        let (router, _) = test_router();
        let response = router.route(get_request("/api/price-list/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("missing"));
    }

    #[tokio::test]
    async fn test_price_list_create_requires_wines() {
        let (router, _) = test_router();
        let response = router
            .route(post_request(
                "/api/price-list",
                serde_json::json!({ "name": "Empty" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sample_request_fans_out_per_producer() {
        let (router, store) = test_router();
        let payload = serde_json::json!({
            "contact": {
                "company": "Vinoteca SF",
                "firstName": "Dana",
                "lastName": "Whitfield",
                "email": "dana@vinoteca.example"
            },
            "shipping": { "address1": "500 Embarcadero", "city": "San Francisco", "state": "CA", "zip": "94111" },
            "wines": [
                { "Product Name": "W1", "Producer": "A", "Region": "R" },
                { "Product Name": "W2", "Producer": "B", "Region": "R" },
                { "Product Name": "W3", "Producer": "A", "Region": "R" },
            ]
        });

        let response = router
            .route(post_request("/api/sample-request", payload))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert!(body["notionPageId"].is_string());

        let pages = store.pages("requests");
        assert_eq!(pages.len(), 2);
        let titles: Vec<String> = pages
            .iter()
            .filter_map(|p| props::read_text(&p.properties, "Name"))
            .collect();
        assert!(titles.iter().all(|t| t.contains("/ CA / Vinoteca SF /")));
        let counts: Vec<f64> = pages
            .iter()
            .filter_map(|p| props::read_number(&p.properties, "Wines Count"))
            .collect();
        assert_eq!(counts, vec![2.0, 1.0]);
    }

    #[tokio::test]
    async fn test_sample_request_listing_and_patch() {
        let (router, store) = test_router();
        let payload = serde_json::json!({
            "contact": { "company": "Brix", "firstName": "Sam", "lastName": "O", "email": "s@b.c" },
            "shipping": { "address1": "1 Main", "city": "Portland", "state": "OR", "zip": "97201" },
            "wines": [{ "Product Name": "W1", "Producer": "A", "Region": "R" }]
        });
        router
            .route(post_request("/api/sample-request", payload))
            .await;

        let response = router.route(get_request("/api/sample-request")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let listing = body.as_array().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0]["company"], "Brix");
        assert_eq!(listing[0]["status"], "New");

        let page_id = store.pages("requests")[0].id.clone();
        let req = Request::builder()
            .method(Method::PATCH)
            .uri(format!("/api/sample-request/{page_id}"))
            .body(Full::new(Bytes::from(
                serde_json::json!({ "status": "Shipped" }).to_string(),
            )))
            .unwrap();
        let response = router.route(req).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .route(get_request(&format!("/api/sample-request/{page_id}")))
            .await;
        let body = body_json(response).await;
        assert_eq!(body["status"], "Shipped");
    }

    #[tokio::test]
    async fn test_states_fallback_when_table_unconfigured() {
        let (router, _) = test_router();
        let response = router.route(get_request("/api/states")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let states = body["states"].as_array().unwrap();
        assert_eq!(states.len(), 51);
        assert_eq!(states[0]["abbrev"], "AL");
    }

    #[tokio::test]
    async fn test_track_and_duration_rolling_average() {
        let (router, store) = test_router();
        let payload = serde_json::json!({
            "name": "L",
            "wines": [{ "Product Name": "W", "Producer": "P", "Region": "R" }]
        });
        let response = router.route(post_request("/api/price-list", payload)).await;
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        // First view from a private address: counted, no geolocation
        let req = Request::builder()
            .method(Method::GET)
            .uri(format!("/api/track/{id}"))
            .header("x-forwarded-for", "192.168.1.10")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let body = body_json(router.route(req).await).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["views"], 1);
        assert_eq!(body["location"], "");

        let report = serde_json::json!({ "priceListId": id, "duration": 60 });
        let response = router
            .route(post_request("/api/track-duration", report))
            .await;
        assert_eq!(body_json(response).await["success"], true);

        let export = &store.pages("exports")[0];
        assert_eq!(props::read_number(&export.properties, "Views"), Some(1.0));
        assert_eq!(
            props::read_number(&export.properties, "Avg Duration"),
            Some(60.0)
        );
        assert_eq!(
            props::read_number(&export.properties, "Max Duration"),
            Some(60.0)
        );
        let log = props::read_text(&export.properties, "Access Log").unwrap();
        assert!(log.contains("192.168.1.10"));
    }

    #[tokio::test]
    async fn test_track_survives_unknown_list() {
        let (router, _) = test_router();
        let body = body_json(router.route(get_request("/api/track/ghost")).await).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["views"], 0);
    }

    #[tokio::test]
    async fn test_duration_report_discards_non_positive() {
        let (router, store) = test_router();
        let payload = serde_json::json!({
            "wines": [{ "Product Name": "W", "Producer": "P", "Region": "R" }]
        });
        let response = router.route(post_request("/api/price-list", payload)).await;
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let report = serde_json::json!({ "priceListId": id, "duration": -5 });
        let response = router
            .route(post_request("/api/track-duration", report))
            .await;
        assert_eq!(body_json(response).await["success"], true);

        let export = &store.pages("exports")[0];
        assert_eq!(props::read_number(&export.properties, "Avg Duration"), None);
    }
}
