//! Test fixtures for integration tests
//!
//! Request bodies and servers backed by an in-memory pipeline, so no
//! transcoder is needed.

use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::http::create_router;
use crate::pipeline::RecordingPipeline;
use crate::state::AppState;

/// A valid VOD request with one video and one audio track
pub fn valid_request() -> Value {
    json!({
        "input_config": {
            "inputs": [
                {
                    "name": "BigBuckBunny.1080p.mp4",
                    "media_type": "video",
                    "resolution": "1080p",
                    "frame_rate": 24.0,
                },
                {
                    "name": "BigBuckBunny.1080p.mp4",
                    "media_type": "audio",
                    "track_num": 1,
                    "language": "en",
                },
            ],
        },
        "pipeline_config": {
            "streaming_mode": "vod",
            "resolutions": ["1080p", "720p"],
        },
    })
}

/// A valid live request with two periods
pub fn multiperiod_request() -> Value {
    json!({
        "input_config": {
            "multiperiod_inputs_list": [
                {"inputs": [{"name": "intro.mp4", "media_type": "video", "resolution": "720p"}]},
                {"inputs": [{"name": "main.mp4", "media_type": "video", "resolution": "720p"}]},
            ],
        },
        "pipeline_config": {
            "streaming_mode": "live",
            "segment_per_file": true,
        },
    })
}

/// A request whose first input has `key` set to `value`
pub fn with_input_field(key: &str, value: Value) -> Value {
    let mut request = valid_request();
    request["input_config"]["inputs"][0][key] = value;
    request
}

/// A request whose first input lacks `key`
pub fn without_input_field(key: &str) -> Value {
    let mut request = valid_request();
    if let Some(input) = request["input_config"]["inputs"][0].as_object_mut() {
        input.remove(key);
    }
    request
}

/// A request with a raw image sequence as its only input
pub fn raw_images_request(extra: Value) -> Value {
    let mut input = json!({
        "name": "frames/%d.png",
        "media_type": "video",
        "input_type": "raw_images",
        "frame_rate": 30,
        "resolution": "720p",
    });
    if let (Some(input), Some(extra)) = (input.as_object_mut(), extra.as_object()) {
        input.extend(extra.clone());
    }

    let mut request = valid_request();
    request["input_config"]["inputs"] = json!([input]);
    request
}

/// A request with `key` set to `value` in the pipeline configuration
pub fn with_pipeline_field(key: &str, value: Value) -> Value {
    let mut request = valid_request();
    request["pipeline_config"][key] = value;
    request
}

/// Each malformed request paired with the error it must produce
pub fn error_cases() -> Vec<(&'static str, Value, &'static str, &'static str)> {
    vec![
        (
            "unknown input field",
            with_input_field("foo", json!("bar")),
            "UnrecognizedField",
            "foo",
        ),
        (
            "missing media_type",
            without_input_field("media_type"),
            "MissingRequiredField",
            "media_type",
        ),
        (
            "video without resolution",
            without_input_field("resolution"),
            "MissingRequiredField",
            "resolution",
        ),
        (
            "frame_rate as string",
            with_input_field("frame_rate", json!("99")),
            "WrongType",
            "frame_rate",
        ),
        (
            "unknown resolution",
            with_input_field("resolution", json!("wee")),
            "WrongType",
            "resolution",
        ),
        (
            "fractional track_num",
            with_input_field("track_num", json!(1.1)),
            "WrongType",
            "track_num",
        ),
        (
            "filters as bare string",
            with_input_field("filters", json!("scale=640:360")),
            "WrongType",
            "filters",
        ),
        (
            "filters with non-string entry",
            with_input_field("filters", json!(["yadif", 7])),
            "WrongType",
            "filters",
        ),
        (
            "start_time on raw images",
            raw_images_request(json!({"start_time": "0:30"})),
            "MalformedField",
            "start_time",
        ),
        (
            "end_time on raw images",
            raw_images_request(json!({"end_time": "1:30"})),
            "MalformedField",
            "end_time",
        ),
        (
            "live without segment_per_file",
            {
                let mut request = with_pipeline_field("streaming_mode", json!("live"));
                request["pipeline_config"]["segment_per_file"] = json!(false);
                request
            },
            "MalformedField",
            "segment_per_file",
        ),
        (
            "content_id not hex",
            with_pipeline_field("encryption", json!({"enable": true, "content_id": "foo"})),
            "MalformedField",
            "content_id",
        ),
    ]
}

/// State backed by an in-memory pipeline the test can inspect
pub fn recording_state() -> (Arc<AppState>, Arc<RecordingPipeline>) {
    recording_state_with(ServerConfig::default())
}

pub fn recording_state_with(config: ServerConfig) -> (Arc<AppState>, Arc<RecordingPipeline>) {
    let pipeline = Arc::new(RecordingPipeline::new());
    let state = Arc::new(AppState::with_pipeline(config, pipeline.clone()));
    (state, pipeline)
}

pub fn recording_router() -> (Router, Arc<AppState>, Arc<RecordingPipeline>) {
    let (state, pipeline) = recording_state();
    (create_router(Arc::clone(&state)), state, pipeline)
}
