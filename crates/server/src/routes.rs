//! HTTP surface: login, result submission, leaderboard and quiz status

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use quiz_core::{LeaderboardEntry, QuizService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ApiError, AppJson, AppQuery};
use crate::APP_VERSION;

#[derive(Clone)]
pub struct AppState {
    pub quiz: Arc<QuizService>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub user_id: String,
    pub points: i64,
    pub time_taken: f64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    /// Keep only each user's best submission
    #[serde(default)]
    pub best_per_user: bool,
}

#[derive(Debug, Deserialize)]
pub struct HasTakenQuizParams {
    pub user_email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HasTakenQuizResponse {
    pub has_taken: bool,
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(api_health))
        .route("/auth/google", post(api_google_login))
        .route("/result", post(api_submit_result))
        .route("/leaderboard", get(api_leaderboard))
        .route("/user/has-taken-quiz", get(api_has_taken_quiz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// GET /health
async fn api_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "quiz-leaderboard",
        "version": APP_VERSION,
        "backend": state.quiz.backend(),
    }))
}

/// POST /auth/google - verify the token and return (or create) the user
async fn api_google_login(
    State(state): State<AppState>,
    AppJson(request): AppJson<GoogleTokenRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.quiz.login(&request.token).await?;
    info!(user_id = %user.id, "User signed in");

    Ok(Json(LoginResponse {
        user_id: user.id,
        email: user.email,
        name: user.name,
        picture: user.picture,
    }))
}

/// POST /result - record a quiz submission
async fn api_submit_result(
    State(state): State<AppState>,
    AppJson(request): AppJson<SubmitResultRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .quiz
        .submit_result(&request.user_id, request.points, request.time_taken)
        .await?;

    Ok(Json(serde_json::json!({ "msg": "Result saved!" })))
}

/// GET /leaderboard - every submission, best first
async fn api_leaderboard(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<LeaderboardParams>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let entries = if params.best_per_user {
        state.quiz.leaderboard_best_per_user().await?
    } else {
        state.quiz.leaderboard().await?
    };
    Ok(Json(entries))
}

/// GET /user/has-taken-quiz?user_email=...
async fn api_has_taken_quiz(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<HasTakenQuizParams>,
) -> Result<Json<HasTakenQuizResponse>, ApiError> {
    let has_taken = state.quiz.has_taken_quiz(&params.user_email).await?;
    Ok(Json(HasTakenQuizResponse { has_taken }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorsOrigins;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use quiz_core::{CoreResult, IdentityVerifier, MemoryStore, QuizError, VerifiedIdentity};
    use tower::ServiceExt;

    /// Accepts tokens of the form `ok:<email>:<name>`
    struct StaticVerifier;

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> CoreResult<VerifiedIdentity> {
            let mut parts = token.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("ok"), Some(email), Some(name)) => Ok(VerifiedIdentity {
                    email: email.to_string(),
                    name: name.to_string(),
                    picture: None,
                }),
                _ => Err(QuizError::InvalidToken("rejected".into())),
            }
        }
    }

    fn app() -> Router {
        app_with_cors(CorsOrigins::Any)
    }

    fn app_with_cors(origins: CorsOrigins) -> Router {
        let quiz = QuizService::new(Arc::new(MemoryStore::new()), Arc::new(StaticVerifier));
        router(AppState { quiz: Arc::new(quiz) }, origins.layer())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(app: &Router, email: &str, name: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/google",
            Some(serde_json::json!({ "token": format!("ok:{email}:{name}") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["user_id"].as_str().unwrap().to_string()
    }

    async fn submit(app: &Router, user_id: &str, points: i64, time_taken: f64) -> StatusCode {
        let (status, _) = send(
            app,
            Method::POST,
            "/result",
            Some(serde_json::json!({ "user_id": user_id, "points": points, "time_taken": time_taken })),
        )
        .await;
        status
    }

    #[tokio::test]
    async fn test_login_returns_user_payload() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/google",
            Some(serde_json::json!({ "token": "ok:a@x.com:Ada" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["name"], "Ada");
        assert!(body["picture"].is_null());
        assert!(body["user_id"].as_str().is_some_and(|id| !id.is_empty()));

        let again = login(&app, "a@x.com", "Changed").await;
        assert_eq!(body["user_id"].as_str().unwrap(), again);
    }

    #[tokio::test]
    async fn test_login_with_invalid_token_is_400() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/auth/google",
            Some(serde_json::json!({ "token": "garbage" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid Google token");
    }

    #[tokio::test]
    async fn test_submit_result_for_unknown_user_is_404() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/result",
            Some(serde_json::json!({ "user_id": "nope", "points": 3, "time_taken": 1.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "User not found");

        let (_, board) = send(&app, Method::GET, "/leaderboard", None).await;
        assert_eq!(board, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_submit_result_acknowledges() {
        let app = app();
        let user_id = login(&app, "a@x.com", "A").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/result",
            Some(serde_json::json!({ "user_id": user_id, "points": 7, "time_taken": 12 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "msg": "Result saved!" }));
    }

    #[tokio::test]
    async fn test_leaderboard_ordering_and_rows() {
        let app = app();
        let a = login(&app, "a@x.com", "A").await;
        assert_eq!(submit(&app, &a, 10, 5.0).await, StatusCode::OK);
        let b = login(&app, "b@x.com", "B").await;
        assert_eq!(submit(&app, &b, 10, 3.0).await, StatusCode::OK);
        assert_eq!(submit(&app, &a, 4, 1.0).await, StatusCode::OK);

        let (status, board) = send(&app, Method::GET, "/leaderboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            board,
            serde_json::json!([
                { "name": "B", "points": 10, "time_taken": 3.0 },
                { "name": "A", "points": 10, "time_taken": 5.0 },
                { "name": "A", "points": 4, "time_taken": 1.0 },
            ])
        );

        let (_, best) = send(&app, Method::GET, "/leaderboard?best_per_user=true", None).await;
        assert_eq!(best.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_has_taken_quiz() {
        let app = app();
        let uri = "/user/has-taken-quiz?user_email=a@x.com";

        let (_, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(body, serde_json::json!({ "has_taken": false }));

        let a = login(&app, "a@x.com", "A").await;
        let (_, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(body["has_taken"], false);

        submit(&app, &a, 1, 1.0).await;
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_taken"], true);
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "memory");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin_with_credentials() {
        let app = app_with_cors(CorsOrigins::parse("https://quiz.example.app/"));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/leaderboard")
            .header(header::ORIGIN, "https://quiz.example.app")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://quiz.example.app"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_missing_query_parameter_is_json_detail() {
        let (status, body) = send(&app(), Method::GET, "/user/has-taken-quiz", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "detail": "Invalid query parameters" }));
    }

    #[tokio::test]
    async fn test_mistyped_body_is_json_detail() {
        let app = app();
        let user_id = login(&app, "a@x.com", "A").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/result",
            Some(serde_json::json!({ "user_id": user_id, "points": "a", "time_taken": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, serde_json::json!({ "detail": "Invalid request body" }));

        let (_, board) = send(&app, Method::GET, "/leaderboard", None).await;
        assert_eq!(board, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_body_without_json_content_type_is_json_detail() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/google")
            .body(Body::from(r#"{"token":"ok:a@x.com:A"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Invalid request body");
    }
}
