use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::Authenticator;
use crate::config::SecurityConfig;
use crate::handlers::{auth, resource, system};
use crate::middleware::require_principal;
use crate::resources::{Contact, Project, Resource, ResourceService, Timeline};
use crate::store::DocumentStore;

/// Shared handles injected into every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub authenticator: Arc<Authenticator>,
    pub contacts: Arc<ResourceService<Contact>>,
    pub projects: Arc<ResourceService<Project>>,
    pub timeline: Arc<ResourceService<Timeline>>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            contacts: Arc::new(ResourceService::new(store.clone())),
            projects: Arc::new(ResourceService::new(store.clone())),
            timeline: Arc::new(ResourceService::new(store.clone())),
            store,
            authenticator,
        }
    }
}

impl FromRef<AppState> for Arc<ResourceService<Contact>> {
    fn from_ref(state: &AppState) -> Self {
        state.contacts.clone()
    }
}

impl FromRef<AppState> for Arc<ResourceService<Project>> {
    fn from_ref(state: &AppState) -> Self {
        state.projects.clone()
    }
}

impl FromRef<AppState> for Arc<ResourceService<Timeline>> {
    fn from_ref(state: &AppState) -> Self {
        state.timeline.clone()
    }
}

pub fn app(state: AppState, security: &SecurityConfig) -> Router {
    let protected = Router::new()
        .merge(resource_write_routes::<Contact>())
        .merge(resource_write_routes::<Project>())
        .merge(resource_write_routes::<Timeline>())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_principal));

    Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .merge(resource_read_routes::<Contact>())
        .merge(resource_read_routes::<Project>())
        .merge(resource_read_routes::<Timeline>())
        // Bearer token required
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(security)),
        )
        .with_state(state)
}

fn resource_read_routes<R>() -> Router<AppState>
where
    R: Resource,
    Arc<ResourceService<R>>: FromRef<AppState>,
{
    Router::new().route(&format!("/{}/:username", R::NAME), get(resource::list::<R>))
}

fn resource_write_routes<R>() -> Router<AppState>
where
    R: Resource,
    Arc<ResourceService<R>>: FromRef<AppState>,
{
    Router::new().route(
        &format!("/{}", R::NAME),
        post(resource::create::<R>)
            .patch(resource::update::<R>)
            .delete(resource::delete::<R>),
    )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
