use crate::agent::{ ChatAgent, TurnError };
use crate::cli::Args;
use crate::models::chat::Conversation;
use crate::render;

use axum::{
    extract::{ Form, State },
    http::{ header, HeaderMap, HeaderValue, StatusCode },
    response::{ Html, IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use log::{ error, info };
use serde::Deserialize;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };
use uuid::Uuid;

const SESSION_COOKIE: &str = "session_id";

#[derive(Clone)]
struct AppState {
    agent: Arc<ChatAgent>,
}

#[derive(Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

pub fn build_router(agent: Arc<ChatAgent>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/api/history", get(history_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<ChatAgent>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = build_router(agent);

    if args.enable_tls && args.tls_cert_path.is_some() && args.tls_key_path.is_some() {
        let cert_path = args.tls_cert_path.as_ref().unwrap();
        let key_path = args.tls_key_path.as_ref().unwrap();

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
    } else {
        info!("Starting HTTP server on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Returns the caller's session id, minting a fresh one when the cookie is
/// absent. The second element says whether a Set-Cookie is needed.
fn resolve_session(headers: &HeaderMap) -> (String, bool) {
    match session_id_from_headers(headers) {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    }
}

fn attach_session_cookie(response: &mut Response, session_id: &str) {
    let cookie = format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, session_id);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session_id, minted) = resolve_session(&headers);

    let conversation = match state.agent.conversation(&session_id).await {
        Ok(conversation) => conversation,
        Err(e) => {
            error!("History lookup failed for session {}: {}", session_id, e);
            Conversation::new(session_id.clone())
        }
    };

    let page = render::render_page(&conversation, None, state.agent.max_message_chars());
    let mut response = Html(page).into_response();
    if minted {
        attach_session_cookie(&mut response, &session_id);
    }
    response
}

async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>
) -> Response {
    let (session_id, minted) = resolve_session(&headers);
    let max_message_chars = state.agent.max_message_chars();

    let (status, conversation, banner) = match
        state.agent.process_turn(&session_id, &form.message).await
    {
        Ok(conversation) => (StatusCode::OK, conversation, None),
        Err(err) => {
            let status = if err.is_validation() {
                info!("Rejected input for session {}: {}", session_id, err);
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                error!("Turn failed for session {}: {}", session_id, err);
                StatusCode::BAD_GATEWAY
            };
            let banner = if err.is_validation() {
                err.to_string()
            } else {
                "The assistant could not be reached. Please try again.".to_string()
            };
            let conversation = state.agent
                .conversation(&session_id).await
                .unwrap_or_else(|_| Conversation::new(session_id.clone()));
            (status, conversation, Some(banner))
        }
    };

    let page = render::render_page(&conversation, banner.as_deref(), max_message_chars);
    let mut response = (status, Html(page)).into_response();
    if minted {
        attach_session_cookie(&mut response, &session_id);
    }
    response
}

async fn history_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session_id, _) = resolve_session(&headers);
    match state.agent.conversation(&session_id).await {
        Ok(conversation) => Json(conversation).into_response(),
        Err(e) => {
            error!("History lookup failed for session {}: {}", session_id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use crate::llm::chat::testing::StubChatClient;
    use axum::body::{ to_bytes, Body };
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(reply: Option<&str>) -> Router {
        let agent = ChatAgent::with_parts(
            Arc::new(StubChatClient {
                reply: reply.map(str::to_string),
            }),
            Arc::new(MemoryHistoryStore::new()),
            100
        );
        build_router(Arc::new(agent))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn chat_request(message_body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, "session_id=test-session")
            .body(Body::from(message_body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn index_mints_a_session_cookie() {
        let router = test_router(Some("hi"));
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("session_id="));

        let body = body_text(response).await;
        assert!(body.contains("<form method='post' action='/chat'>"));
    }

    #[tokio::test]
    async fn index_keeps_an_existing_session_cookie() {
        let router = test_router(Some("hi"));
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, "session_id=test-session")
                    .body(Body::empty())
                    .unwrap()
            ).await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn empty_message_is_rejected_with_banner() {
        let router = test_router(Some("hi"));
        let response = router.oneshot(chat_request("message=")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("Please enter a message."));
    }

    #[tokio::test]
    async fn overlong_message_is_rejected_with_banner() {
        let router = test_router(Some("hi"));
        let body = format!("message={}", "a".repeat(101));
        let response = router.oneshot(chat_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("Character limit exceeded"));
    }

    #[tokio::test]
    async fn successful_turn_rerenders_both_bubbles() {
        let router = test_router(Some("Nice to meet you."));
        let response = router.clone().oneshot(chat_request("message=hello")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("hello"));
        assert!(page.contains("Nice to meet you."));

        let history = router
            .oneshot(
                Request::builder()
                    .uri("/api/history")
                    .header(header::COOKIE, "session_id=test-session")
                    .body(Body::empty())
                    .unwrap()
            ).await
            .unwrap();
        assert_eq!(history.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json
            ::from_str(&body_text(history).await)
            .unwrap();
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn provider_fault_returns_bad_gateway_with_user_message_kept() {
        let router = test_router(None);
        let response = router.clone().oneshot(chat_request("message=hello")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let page = body_text(response).await;
        assert!(page.contains("could not be reached"));
        assert!(page.contains("hello"));

        let history = router
            .oneshot(
                Request::builder()
                    .uri("/api/history")
                    .header(header::COOKIE, "session_id=test-session")
                    .body(Body::empty())
                    .unwrap()
            ).await
            .unwrap();
        let json: serde_json::Value = serde_json
            ::from_str(&body_text(history).await)
            .unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    }
}
