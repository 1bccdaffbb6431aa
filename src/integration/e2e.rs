//! End-to-end integration tests
//!
//! Runs the server on a local socket and talks to it over HTTP the way a
//! control client does.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::http::create_router;
use crate::state::AppState;

/// Serve `state` on an ephemeral local port
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener address");
    let app = create_router(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Test server failed: {}", e);
        }
    });
    addr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::integration::fixtures::*;
    use crate::pipeline::ProcessPipeline;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_job_lifecycle() {
        let (state, pipeline) = recording_state();
        let addr = spawn_server(state).await;
        let client = reqwest::Client::new();
        let base = format!("http://{}", addr);

        let response = client
            .post(format!("{}/start", base))
            .json(&valid_request())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let started: Value = response.json().await.unwrap();
        assert_eq!(started["inputs"], 2);

        let status: Value = client
            .get(format!("{}/status", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["state"], "running");
        assert_eq!(status["job_id"], started["job_id"]);

        for expected in [true, false] {
            let response = client
                .post(format!("{}/stop", base))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 200);
            let body: Value = response.json().await.unwrap();
            assert_eq!(body, json!({"stopped": expected}));
        }

        assert_eq!(pipeline.jobs().len(), 1);
    }

    #[tokio::test]
    async fn test_structured_errors_over_http() {
        let (state, pipeline) = recording_state();
        let addr = spawn_server(state).await;
        let client = reqwest::Client::new();

        for (case, request, error_type, field_name) in error_cases() {
            let response = client
                .post(format!("http://{}/start", addr))
                .json(&request)
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 418, "{}", case);

            let body: Value = response.json().await.unwrap();
            assert_eq!(
                body,
                json!({"error_type": error_type, "field_name": field_name}),
                "{}",
                case
            );
        }

        assert!(pipeline.jobs().is_empty());
    }

    #[tokio::test]
    async fn test_process_pipeline_job() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");

        // Stand-in pipeline: copy the job description next to it.
        let pipeline = Arc::new(ProcessPipeline::new(
            "sh".to_string(),
            vec![
                "-c".to_string(),
                r#"cp "$1" "$2/tmp.json" && mv "$2/tmp.json" "$2/received.json""#.to_string(),
                "pipeline".to_string(),
            ],
            out.clone(),
        ));
        let config = ServerConfig {
            output_dir: out.clone(),
            ..Default::default()
        };
        let state = Arc::new(AppState::with_pipeline(config, pipeline));
        let addr = spawn_server(state).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{}/start", addr))
            .json(&multiperiod_request())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);

        // The pipeline output is served back under /output.
        let mut received = None;
        for _ in 0..200 {
            let response = client
                .get(format!("http://{}/output/received.json", addr))
                .send()
                .await
                .unwrap();
            if response.status().as_u16() == 200 {
                received = Some(response.json::<Value>().await.unwrap());
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }

        let received = received.expect("pipeline output never appeared");
        let periods = received["config"]["periods"].as_array().unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[1]["inputs"][0]["name"], "main.mp4");
        assert_eq!(received["config"]["pipeline"]["streaming_mode"], "live");
    }
}
