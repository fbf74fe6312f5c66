//! Context providers scoped around the route tree.
//!
//! Descendant handlers read shared context through `Extension` extractors:
//! - [`DataClient`]: read access to user data (outer scope)
//! - [`AuthContext`]: auth provider settings (inner scope)

use std::sync::Arc;

use axum::{Extension, Router};
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;

use crate::store::{StoreError, User, UserStore};

/// Data-fetching client shared with every route.
#[derive(Clone)]
pub struct DataClient {
    store: Arc<dyn UserStore>,
}

impl DataClient {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn user(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.store.get_user(id).await
    }
}

/// Authentication context shared with every route.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub publishable_key: Option<String>,
}

impl AuthContext {
    pub fn new(publishable_key: Option<String>) -> Self {
        Self { publishable_key }
    }
}

/// Stack two provider layers; `outer` sees each request before `inner`.
pub fn provider_stack<O, I>(outer: O, inner: I) -> ServiceBuilder<Stack<I, Stack<O, Identity>>> {
    ServiceBuilder::new().layer(outer).layer(inner)
}

/// Wrap `router` with the data client outermost and auth context innermost.
pub fn with_providers<S>(router: Router<S>, data_client: DataClient, auth: AuthContext) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(provider_stack(Extension(data_client), Extension(auth)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Mutex;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::{service_fn, util::MapRequestLayer, ServiceExt};

    use crate::store::InMemoryUserStore;

    #[tokio::test]
    async fn test_outer_provider_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = |name: &'static str| {
            let log = log.clone();
            MapRequestLayer::new(move |req: Request<()>| {
                log.lock().unwrap().push(name);
                req
            })
        };

        let svc = provider_stack(record("data_client"), record("auth")).service(service_fn(
            |_req: Request<()>| async { Ok::<_, Infallible>(()) },
        ));
        svc.oneshot(Request::new(())).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["data_client", "auth"]);
    }

    #[tokio::test]
    async fn test_routes_see_both_contexts() {
        let store = InMemoryUserStore::new();
        store
            .create_user(&User {
                id: "user_1".to_string(),
                email_address: String::new(),
                first_name: "Ada".to_string(),
                last_name: String::new(),
                image_url: String::new(),
            })
            .await
            .unwrap();

        async fn probe(
            Extension(client): Extension<DataClient>,
            Extension(auth): Extension<AuthContext>,
        ) -> String {
            let user = client.user("user_1").await.unwrap().unwrap();
            format!("{}:{}", user.first_name, auth.publishable_key.unwrap_or_default())
        }

        let router = with_providers(
            Router::new().route("/probe", get(probe)),
            DataClient::new(Arc::new(store)),
            AuthContext::new(Some("pk_test_123".to_string())),
        );

        let response = router
            .oneshot(Request::builder().uri("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Ada:pk_test_123");
    }
}
