use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::database::models::Role;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, rate_limit_middleware, require_role, Accounts, RateLimiter, UserTable};

pub fn app() -> Router {
    app_with(Arc::new(UserTable))
}

/// The router with a custom source for account status.
pub fn app_with(accounts: Accounts) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/auth/login", post(public::auth::login))
        // Protected API
        .nest("/api", api_routes(accounts))
        .layer(DefaultBodyLimit::max(config().api.max_request_size_bytes))
        .layer(cors_layer());

    if config().api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn api_routes(accounts: Accounts) -> Router {
    Router::new()
        .route("/auth/me", get(protected::account::me))
        .route("/auth/password", put(protected::account::change_password))
        .route("/dashboard/summary", get(protected::dashboard::summary))
        .merge(user_routes())
        .merge(crm_routes())
        .merge(billing_routes())
        // Layers run bottom-up: authenticate, then count the request against the user
        .route_layer(from_fn_with_state(RateLimiter::from_config(), rate_limit_middleware))
        .route_layer(from_fn_with_state(accounts, jwt_auth_middleware))
}

fn user_routes() -> Router {
    use protected::users;

    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::show)
                .put(users::update)
                .patch(users::update)
                .delete(users::delete),
        )
        .route_layer(from_fn_with_state(Role::Admin, require_role))
}

fn crm_routes() -> Router {
    use protected::{clients, leads, people, projects, rate_cards};

    Router::new()
        .route("/clients", get(clients::list).post(clients::create))
        .route(
            "/clients/:id",
            get(clients::show)
                .put(clients::update)
                .patch(clients::update)
                .delete(clients::delete),
        )
        .route("/leads", get(leads::list).post(leads::create))
        .route(
            "/leads/:id",
            get(leads::show)
                .put(leads::update)
                .patch(leads::update)
                .delete(leads::delete),
        )
        .route("/leads/:id/convert", post(leads::convert))
        .route("/people", get(people::list).post(people::create))
        .route(
            "/people/:id",
            get(people::show)
                .put(people::update)
                .patch(people::update)
                .delete(people::delete),
        )
        .route("/people/:id/rate-cards", get(people::rate_cards))
        .route("/rate-cards", get(rate_cards::list).post(rate_cards::create))
        .route(
            "/rate-cards/:id",
            get(rate_cards::show)
                .put(rate_cards::update)
                .patch(rate_cards::update)
                .delete(rate_cards::delete),
        )
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:id",
            get(projects::show)
                .put(projects::update)
                .patch(projects::update)
                .delete(projects::delete),
        )
}

fn billing_routes() -> Router {
    use protected::{invoices, payment_terms, payments};

    Router::new()
        .route("/payment-terms", get(payment_terms::list).post(payment_terms::create))
        .route("/payment-terms/default", get(payment_terms::default_term))
        .route(
            "/payment-terms/:id",
            get(payment_terms::show)
                .put(payment_terms::update)
                .patch(payment_terms::update)
                .delete(payment_terms::delete),
        )
        .route("/invoices", get(invoices::list).post(invoices::create))
        .route(
            "/invoices/:id",
            get(invoices::show)
                .put(invoices::update)
                .patch(invoices::update)
                .delete(invoices::delete),
        )
        .route("/invoices/:id/send", post(invoices::send))
        .route("/invoices/:id/cancel", post(invoices::cancel))
        .route("/invoices/:id/payments", get(invoices::payments))
        .route("/payments", get(payments::list).post(payments::create))
        .route(
            "/payments/:id",
            get(payments::show)
                .put(payments::update)
                .patch(payments::update)
                .delete(payments::delete),
        )
}

fn cors_layer() -> CorsLayer {
    let security = &config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origin = if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::{encode_claims, Claims};
    use crate::error::ApiError;
    use crate::middleware::AccountStatus;

    /// Every account is active except the nil id.
    struct NilIsDisabled;

    #[axum::async_trait]
    impl AccountStatus for NilIsDisabled {
        async fn is_active(&self, id: Uuid) -> Result<bool, ApiError> {
            Ok(!id.is_nil())
        }
    }

    fn bearer(role: Role) -> String {
        token_for(Uuid::new_v4(), role)
    }

    fn token_for(sub: Uuid, role: Role) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub,
            email: "router@agency.test".into(),
            role,
            exp: now + 600,
            iat: now,
        };
        format!("Bearer {}", encode_claims(&claims).unwrap())
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app_with(Arc::new(NilIsDisabled)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let (status, body) = send(Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["data"]["endpoints"]["invoices"].is_string());
    }

    #[tokio::test]
    async fn api_requires_a_token() {
        let (status, body) = send(Request::get("/api/clients").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let request = Request::get("/api/auth/me")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid authentication token");
    }

    #[tokio::test]
    async fn deactivated_accounts_lose_access() {
        let request = Request::get("/api/auth/me")
            .header(header::AUTHORIZATION, token_for(Uuid::nil(), Role::Admin))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Account is disabled");
    }

    #[tokio::test]
    async fn account_lookup_needs_the_database() {
        // Without a pool the users table cannot be consulted, so nothing gets through
        let request = Request::get("/api/clients")
            .header(header::AUTHORIZATION, bearer(Role::Admin))
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn user_admin_is_admin_only() {
        let request = Request::get("/api/users")
            .header(header::AUTHORIZATION, bearer(Role::Manager))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn staff_cannot_delete_clients() {
        let request = Request::delete(format!("/api/clients/{}", Uuid::new_v4()))
            .header(header::AUTHORIZATION, bearer(Role::Staff))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn staff_cannot_issue_invoices() {
        let request = Request::post("/api/invoices")
            .header(header::AUTHORIZATION, bearer(Role::Staff))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn non_uuid_ids_are_bad_requests() {
        let request = Request::get("/api/projects/not-a-uuid")
            .header(header::AUTHORIZATION, bearer(Role::Staff))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "'not-a-uuid' is not a valid id");
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field_errors"]["email"], "is required");
        assert_eq!(body["field_errors"]["password"], "is required");
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let (status, _) = send(Request::get("/nowhere").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
