pub mod analytics;
pub mod api;
pub mod config;
pub mod email;
pub mod errors;
pub mod geo;
pub mod price_list;
pub mod response;
pub mod router;
pub mod sample_request;
pub mod states;
pub mod store;
pub mod templates;
pub mod wine;

#[cfg(test)]
pub mod testutils;

use crate::config::{Config, Databases};
use crate::email::EmailClient;
use crate::errors::CellarError;
use crate::geo::GeoClient;
use crate::response::HandlerBody;
use crate::router::Router;
use crate::store::DocumentStore;
use crate::store::notion::NotionStore;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response};
use shared::http::run_http_service;
use std::pin::Pin;
use std::sync::Arc;

/// A configured document store plus its database ids.
pub struct StoreHandle {
    pub store: Arc<dyn DocumentStore>,
    pub databases: Databases,
}

/// Everything a handler needs, injected per request. No other state
/// survives a request.
pub struct AppState {
    pub config: Config,
    pub store: Option<StoreHandle>,
    pub email: Option<EmailClient>,
    pub geo: GeoClient,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let store = config.store.as_ref().map(|store_config| StoreHandle {
            store: Arc::new(NotionStore::new(store_config)) as Arc<dyn DocumentStore>,
            databases: store_config.databases.clone(),
        });
        if store.is_none() {
            tracing::warn!("No document store configured; nothing will be persisted");
        }

        let email = config.email.as_ref().map(EmailClient::new);
        if email.is_none() {
            tracing::warn!("No email API configured; notifications are disabled");
        }

        let geo = GeoClient::new(&config.geo);

        AppState {
            config,
            store,
            email,
            geo,
        }
    }
}

pub async fn run(config: Config) -> Result<(), CellarError> {
    let listener = config.listener.clone();
    let state = Arc::new(AppState::from_config(config));
    let service = CellarService {
        router: Router::new(state),
    };
    run_http_service(&listener.host, listener.port, service).await
}

struct CellarService {
    router: Router,
}

impl Service<Request<Incoming>> for CellarService {
    type Response = Response<HandlerBody>;
    type Error = CellarError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let router = self.router.clone();
        Box::pin(async move { Ok(router.route(req).await) })
    }
}
