use std::net::SocketAddr;

use axum::{
    http::{header, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::state::AppState;
use crate::{auth, boxes, pills, users};

async fn route_not_found() -> ApiError {
    ApiError::not_found("route not found")
}

/// Gives the bodiless 405 and 408 responses produced by routing and the
/// timeout layer the same `{"message"}` body as every other error.
async fn json_error_body(res: Response) -> Response {
    let err = match res.status() {
        StatusCode::REQUEST_TIMEOUT => {
            tracing::warn!("request timed out");
            ApiError::timeout()
        }
        StatusCode::METHOD_NOT_ALLOWED => ApiError::method_not_allowed(),
        _ => return res,
    };
    let allow = res.headers().get(header::ALLOW).cloned();
    let mut out = err.into_response();
    if let Some(allow) = allow {
        out.headers_mut().insert(header::ALLOW, allow);
    }
    out
}

pub fn build_app(state: AppState) -> Router {
    let timeout = state.config.request_timeout;

    Router::new()
        .merge(auth::router())
        .merge(users::router(&state))
        .merge(pills::router(&state))
        .merge(boxes::router(&state))
        .route("/health", get(|| async { "ok" }))
        .fallback(route_not_found)
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(map_response(json_error_body))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use axum::http::Method;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        testing::{bearer, json_request, request, send, Mocks},
        users::{repo::UserService, repo_types::User},
    };

    /// A user store whose lookups never complete.
    #[derive(Default)]
    struct StalledUsers {
        lookup_started: AtomicBool,
        update_invoked: AtomicBool,
    }

    #[async_trait]
    impl UserService for StalledUsers {
        async fn user_by_id(&self, _id: i64) -> anyhow::Result<Option<User>> {
            self.lookup_started.store(true, Ordering::SeqCst);
            std::future::pending().await
        }

        async fn user_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
            std::future::pending().await
        }

        async fn users(&self) -> anyhow::Result<Vec<User>> {
            std::future::pending().await
        }

        async fn insert_user(&self, _user: User) -> anyhow::Result<User> {
            std::future::pending().await
        }

        async fn update_user(&self, _id: i64, _user: User) -> anyhow::Result<()> {
            self.update_invoked.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn stalled_store_is_cut_off_by_timeout() {
        let mut config = (*AppState::test_config()).clone();
        config.request_timeout = Duration::from_millis(50);
        let users = Arc::new(StalledUsers::default());
        let mocks = Mocks::default();
        let state = AppState::from_parts(
            Arc::new(config),
            users.clone(),
            mocks.pills.clone(),
            mocks.boxes.clone(),
            mocks.auth.clone(),
        );

        let (status, body) = send(
            build_app(state),
            json_request(Method::POST, "/users/1", r#"{"lastName":"Smyth"}"#, Some(&bearer(1))),
        )
        .await;

        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body, serde_json::json!({ "message": "request timed out" }));
        assert!(users.lookup_started.load(Ordering::SeqCst));
        assert!(!users.update_invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn wrong_method_has_json_body() {
        let res = build_app(AppState::fake())
            .oneshot(request(Method::DELETE, "/health", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(res.headers().contains_key(header::ALLOW));

        let (status, body) =
            send(build_app(AppState::fake()), request(Method::DELETE, "/health", None)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["message"], "method not allowed");
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (status, body) =
            send(build_app(AppState::fake()), request(Method::GET, "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!("ok"));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, body) =
            send(build_app(AppState::fake()), request(Method::GET, "/nope", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "message": "route not found" }));
    }

    #[tokio::test]
    async fn login_then_fetch_own_user() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            app.clone(),
            json_request(
                Method::POST,
                "/login",
                r#"{"email":"Jacob.Smith@unb.ca ","password":"password"}"#,
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().expect("token").to_string();

        let auth = format!("Bearer {token}");
        let (status, body) =
            send(app.clone(), request(Method::GET, "/users/1", Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "jacob.smith@unb.ca");

        let (status, _) = send(app, request(Method::GET, "/users/2", Some(&auth))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
