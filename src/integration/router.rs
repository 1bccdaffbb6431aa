//! Router-level tests
//!
//! Drives the full middleware stack with `oneshot` requests.

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use crate::config::ServerConfig;
    use crate::http::create_router;
    use crate::integration::fixtures::*;
    use crate::pipeline::{Pipeline, PipelineStatus, RecordingPipeline};
    use crate::state::AppState;

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_start_valid_job() {
        let (app, state, pipeline) = recording_router();

        let response = app
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["periods"], 1);
        assert_eq!(json["inputs"], 2);

        let jobs = pipeline.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(json["job_id"], jobs[0].id.to_string());
        assert_eq!(state.current_job().map(|j| j.id), Some(jobs[0].id));

        // Defaults were filled in before the hand-off.
        let settings = &jobs[0].config.pipeline;
        assert_eq!(settings.channels, 2);
        assert_eq!(settings.resolutions.len(), 2);
    }

    #[tokio::test]
    async fn test_start_multiperiod_job() {
        let (app, _state, pipeline) = recording_router();

        let response = app
            .oneshot(post_json("/start", &multiperiod_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["periods"], 2);
        assert_eq!(json["inputs"], 2);
        assert!(pipeline.jobs()[0].config.is_live());
    }

    #[tokio::test]
    async fn test_validation_errors_are_teapots() {
        for (case, request, error_type, field_name) in error_cases() {
            let (app, _state, pipeline) = recording_router();

            let response = app.oneshot(post_json("/start", &request)).await.unwrap();
            assert_eq!(response.status(), StatusCode::IM_A_TEAPOT, "{}", case);
            assert_eq!(
                body_json(response).await,
                json!({"error_type": error_type, "field_name": field_name}),
                "{}",
                case
            );
            assert!(pipeline.jobs().is_empty(), "{}", case);
        }
    }

    #[tokio::test]
    async fn test_missing_pipeline_config() {
        let (app, _state, _pipeline) = recording_router();
        let mut request = valid_request();
        request.as_object_mut().unwrap().remove("pipeline_config");

        let response = app.oneshot(post_json("/start", &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            body_json(response).await,
            json!({"error_type": "MissingRequiredField", "field_name": "pipeline_config"})
        );
    }

    #[tokio::test]
    async fn test_rejected_start_keeps_running_job() {
        let (state, pipeline) = recording_state();
        let app = create_router(Arc::clone(&state));

        let response = app
            .clone()
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bad = with_input_field("resolution", json!("wee"));
        let response = app.oneshot(post_json("/start", &bad)).await.unwrap();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);

        assert_eq!(pipeline.status(), PipelineStatus::Running);
        assert_eq!(pipeline.stop_calls(), 1);
        assert_eq!(pipeline.jobs().len(), 1);
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let (app, _state, pipeline) = recording_router();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/start")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("inputs: [oops"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(pipeline.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let (app, _state, pipeline) = recording_router();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/start")
            .body(Body::from(valid_request().to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(pipeline.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_failed_restart_counts_stopped_job() {
        let (state, pipeline) = recording_state();
        let app = create_router(Arc::clone(&state));

        let response = app
            .clone()
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();
        let first = body_json(response).await;

        pipeline.set_fail_start(true);
        let response = app
            .clone()
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The first job was torn down before the second start failed.
        let response = app.clone().oneshot(get("/status")).await.unwrap();
        let status = body_json(response).await;
        assert_eq!(status["state"], "stopped");
        assert_eq!(status["job_id"], first["job_id"]);

        let response = app.oneshot(get("/metrics")).await.unwrap();
        let text = body_text(response).await;
        assert!(text.contains("streamer_jobs_started_total 1\n"));
        assert!(text.contains("streamer_jobs_stopped_total 1\n"));
        assert!(text.contains("streamer_errors_total{kind=\"pipeline\"} 1\n"));
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_plain_500() {
        let pipeline = Arc::new(RecordingPipeline::failing());
        let state = Arc::new(AppState::with_pipeline(
            ServerConfig::default(),
            pipeline.clone(),
        ));
        let app = create_router(Arc::clone(&state));

        let response = app
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let text = body_text(response).await;
        assert!(text.contains("start refused"));
        assert!(!text.contains("error_type"));
        assert!(state.current_job().is_none());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (app, _state, pipeline) = recording_router();

        let response = app
            .clone()
            .oneshot(post_json("/stop", &json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"stopped": false}));

        app.clone()
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_json("/stop", &json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!({"stopped": true}));

        let response = app.oneshot(post_json("/stop", &json!({}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"stopped": false}));
        assert_eq!(pipeline.status(), PipelineStatus::Stopped);
    }

    #[tokio::test]
    async fn test_status() {
        let (app, _state, _pipeline) = recording_router();

        let response = app.clone().oneshot(get("/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"state": "idle", "job_id": null, "started_at": null})
        );

        let response = app
            .clone()
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();
        let started = body_json(response).await;

        let response = app.oneshot(get("/status")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["state"], "running");
        assert_eq!(json["job_id"], started["job_id"]);
        assert_eq!(json["started_at"], started["started_at"]);
    }

    #[tokio::test]
    async fn test_metrics_counts_jobs_and_errors() {
        let (app, _state, _pipeline) = recording_router();

        app.clone()
            .oneshot(post_json("/start", &valid_request()))
            .await
            .unwrap();
        app.clone()
            .oneshot(post_json("/start", &without_input_field("media_type")))
            .await
            .unwrap();

        let response = app.oneshot(get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        assert!(text.contains("streamer_jobs_started_total 1\n"));
        assert!(text.contains(
            "streamer_validation_errors_total{error_type=\"MissingRequiredField\"} 1\n"
        ));
        assert!(text.contains("streamer_requests_by_endpoint{endpoint=\"/start\"} 2\n"));
        assert!(text.contains("streamer_job_running 1\n"));
    }

    #[tokio::test]
    async fn test_serves_output_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hls.m3u8"), "#EXTM3U\n").unwrap();

        let config = ServerConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let (state, _pipeline) = recording_state_with(config);
        let app = create_router(state);

        let response = app.clone().oneshot(get("/output/hls.m3u8")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "#EXTM3U\n");

        let response = app.oneshot(get("/output/missing.mpd")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let config = ServerConfig {
            max_request_size_kb: 1,
            ..Default::default()
        };
        let (state, pipeline) = recording_state_with(config);
        let app = create_router(state);

        let mut request = valid_request();
        request["input_config"]["inputs"][0]["name"] = json!("x".repeat(4096));

        let response = app.oneshot(post_json("/start", &request)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(pipeline.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_health_and_version() {
        let (app, _state, _pipeline) = recording_router();

        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");

        let response = app.oneshot(get("/version")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
