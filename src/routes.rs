use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        applications::applications_handler,
        auth::auth_handler,
        dashboard::dashboard_handler,
        jobs::{jobs_handler, public_jobs_handler},
        payment::payment_handler,
        reviews::reviews_handler,
        users::{public_users_handler, users_handler},
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Reads are public, every write needs a resolved identity.
    let job_routes = Router::new()
        .merge(public_jobs_handler())
        .merge(jobs_handler().layer(middleware::from_fn(auth)));

    let user_routes = Router::new()
        .merge(public_users_handler())
        .merge(users_handler().layer(middleware::from_fn(auth)));

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/jobs", job_routes)
        .nest(
            "/applications",
            applications_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/reviews",
            reviews_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/users", user_routes)
        .nest(
            "/dashboard",
            dashboard_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/payment", payment_handler())
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use hmac::{Hmac, Mac};
    use serde_json::Value;
    use sha2::Sha256;
    use tower::ServiceExt;

    use crate::{config::Config, db::memory::MemoryStore};

    const WEBHOOK_SECRET: &str = "whsec_router";

    fn test_app() -> Router {
        let config = Config {
            database_url: None,
            db_max_connections: 1,
            jwt_secret: "router-test-secret".to_string(),
            jwt_maxage: 60,
            port: 0,
            allowed_origins: vec![],
            razorpay_key_id: "rzp_test".to_string(),
            razorpay_webhook_secret: WEBHOOK_SECRET.to_string(),
            payment_currency: "INR".to_string(),
            log_level: "debug".to_string(),
        };
        let app_state = Arc::new(AppState::new(config, Arc::new(MemoryStore::new())));
        create_router(app_state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// Registers and logs in; returns `(user_id, token)`.
    async fn sign_up(app: &Router, name: &str) -> (String, String) {
        let email = format!("{}@example.com", name.to_lowercase());
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": name,
                "email": email,
                "password": "password123",
                "skills": ["plumbing"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let user_id = body["data"]["user"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (user_id, body["token"].as_str().unwrap().to_string())
    }

    fn job_body() -> Value {
        json!({
            "title": "Fix leaking tap",
            "description": "Kitchen tap drips all night",
            "location": "Kochi, Kerala",
            "payment": 750.0,
            "category": "plumbing",
            "urgency_flag": true
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_auth_errors() {
        let app = test_app();
        sign_up(&app, "Asha").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Asha", "email": "asha@example.com", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "asha@example.com", "password": "wrong-pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");

        let (status, _) = send(&app, Method::POST, "/api/jobs", None, Some(job_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/users/me",
            Some("garbage-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, Method::GET, "/api/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_job_lifecycle_over_http() {
        let app = test_app();
        let (_, poster) = sign_up(&app, "Poster").await;
        let (worker_id, worker) = sign_up(&app, "Worker").await;

        let (status, body) =
            send(&app, Method::POST, "/api/jobs", Some(&poster), Some(job_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        let job_id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["status"], "open");

        // Public read without a token
        let (status, body) = send(&app, Method::GET, "/api/jobs?urgent=true", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        let (status, _) = send(&app, Method::GET, &format!("/api/jobs/{job_id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);

        let apply = format!("/api/jobs/{job_id}/apply");
        let (status, _) = send(&app, Method::POST, &apply, Some(&worker), None).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, Method::POST, &apply, Some(&worker), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let applicants = format!("/api/jobs/{job_id}/applicants");
        let (status, _) = send(&app, Method::GET, &applicants, Some(&worker), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = send(&app, Method::GET, &applicants, Some(&poster), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["applicant"]["id"], worker_id.as_str());

        let select = format!("/api/jobs/{job_id}/select");
        let (status, body) = send(
            &app,
            Method::PUT,
            &select,
            Some(&poster),
            Some(json!({ "applicant_id": worker_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "assigned");

        let (status, _) = send(
            &app,
            Method::PUT,
            &select,
            Some(&poster),
            Some(json!({ "applicant_id": worker_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let messages = format!("/api/jobs/{job_id}/messages");
        let (status, _) = send(
            &app,
            Method::POST,
            &messages,
            Some(&worker),
            Some(json!({ "message": "On my way" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app, Method::GET, &messages, Some(&poster), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["messages"][0]["message"], "On my way");

        let complete = format!("/api/jobs/{job_id}/complete");
        let (status, _) = send(&app, Method::PUT, &complete, Some(&poster), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = send(&app, Method::PUT, &complete, Some(&worker), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "completed");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/reviews",
            Some(&poster),
            Some(json!({
                "job_id": job_id,
                "reviewed_user_id": worker_id,
                "rating": 5,
                "comment": "Quick and tidy"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Profiles and reviews are public.
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/users/{worker_id}/reviews"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rating"], 5.0);
        let (status, body) =
            send(&app, Method::GET, &format!("/api/users/{worker_id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Worker");
        assert!(body["data"].get("email").is_none());

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/jobs/{job_id}/payment"),
            Some(&poster),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["amount"], 75000);

        let (status, body) =
            send(&app, Method::GET, "/api/dashboard/applications", Some(&worker), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["job"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_payment_webhook_requires_valid_signature() {
        let app = test_app();
        let (_, poster) = sign_up(&app, "Poster").await;
        let (worker_id, worker) = sign_up(&app, "Worker").await;

        let (_, body) = send(&app, Method::POST, "/api/jobs", Some(&poster), Some(job_body())).await;
        let job_id = body["data"]["id"].as_str().unwrap().to_string();
        send(&app, Method::POST, &format!("/api/jobs/{job_id}/apply"), Some(&worker), None).await;
        send(
            &app,
            Method::PUT,
            &format!("/api/jobs/{job_id}/select"),
            Some(&poster),
            Some(json!({ "applicant_id": worker_id })),
        )
        .await;
        send(&app, Method::PUT, &format!("/api/jobs/{job_id}/complete"), Some(&worker), None).await;

        let payload = json!({
            "event": "payment.captured",
            "payload": { "payment": { "entity": {
                "id": "pay_123",
                "amount": 75000,
                "currency": "INR",
                "notes": { "job_id": job_id }
            }}}
        })
        .to_string();

        let webhook = |signature: String| {
            Request::builder()
                .method(Method::POST)
                .uri("/api/payment/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .header("X-Razorpay-Signature", signature)
                .body(Body::from(payload.clone()))
                .unwrap()
        };

        let response = app
            .clone()
            .oneshot(webhook("0000".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let response = app.clone().oneshot(webhook(signature)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, body) = send(&app, Method::GET, &format!("/api/jobs/{job_id}"), None, None).await;
        assert_eq!(body["data"]["status"], "paid");
    }

    #[tokio::test]
    async fn test_delete_account_reopens_job() {
        let app = test_app();
        let (_, poster) = sign_up(&app, "Poster").await;
        let (worker_id, worker) = sign_up(&app, "Worker").await;

        let (_, body) = send(&app, Method::POST, "/api/jobs", Some(&poster), Some(job_body())).await;
        let job_id = body["data"]["id"].as_str().unwrap().to_string();
        send(&app, Method::POST, &format!("/api/jobs/{job_id}/apply"), Some(&worker), None).await;
        send(
            &app,
            Method::PUT,
            &format!("/api/jobs/{job_id}/select"),
            Some(&poster),
            Some(json!({ "applicant_id": worker_id })),
        )
        .await;

        let (status, _) = send(&app, Method::DELETE, "/api/users/me", Some(&worker), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, &format!("/api/jobs/{job_id}"), None, None).await;
        assert_eq!(body["data"]["status"], "open");
        assert!(body["data"]["selected_worker_id"].is_null());

        // The token outlives the account but no longer resolves.
        let (status, _) = send(&app, Method::GET, "/api/users/me", Some(&worker), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
