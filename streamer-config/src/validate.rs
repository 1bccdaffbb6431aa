//! Staged validation of job configurations
//!
//! Validation runs as a linear pipeline over every object in the
//! configuration, in document order:
//! 1. shape: unrecognized keys
//! 2. required fields
//! 3. types and label domains
//! 4. cross-field semantics
//! 5. normalization
//!
//! Each stage runs over all objects before the next stage starts, and the
//! first failure ends validation.

use serde_json::{Map, Value};

use crate::error::{Result, ValidationError};
use crate::normalize::normalize;
use crate::schema::{lookup, FieldKind, ObjectKind};
use crate::timecode::parse_time;
use crate::types::{InputType, Label, MediaType, NormalizedConfig, StreamingMode};

/// An object found in the configuration, with its location for error reporting
struct Node<'a> {
    kind: ObjectKind,
    object: &'a Map<String, Value>,
    location: String,
}

impl Node<'_> {
    fn field_location(&self, name: &str) -> String {
        if self.location.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.location, name)
        }
    }
}

/// Validate a job configuration and normalize it for the transcode pipeline.
///
/// This is a pure function: the inputs are not modified, nothing outside
/// them is consulted, and two calls with the same arguments always give the
/// same outcome.
pub fn validate(input_config: &Value, pipeline_config: &Value) -> Result<NormalizedConfig> {
    let input_map = input_config
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type("", "input_config"))?;
    let pipeline_map = pipeline_config
        .as_object()
        .ok_or_else(|| ValidationError::wrong_type("", "pipeline_config"))?;

    let mut nodes = Vec::new();
    collect(ObjectKind::InputConfig, input_map, "input_config".into(), &mut nodes);
    collect(ObjectKind::Pipeline, pipeline_map, "pipeline_config".into(), &mut nodes);
    run_stages(&nodes)?;

    normalize(input_map, pipeline_map)
}

/// Validate a control request body of the form `{input_config, pipeline_config}`.
///
/// The envelope is checked with the same rules as the configuration
/// objects, so a stray top-level key or a missing half of the request is
/// reported as a structured error too. A body that is not an object at all
/// is missing `input_config`.
pub fn validate_request(body: &Value) -> Result<NormalizedConfig> {
    let request = body
        .as_object()
        .ok_or_else(|| ValidationError::missing("", "input_config"))?;

    let mut nodes = Vec::new();
    collect(ObjectKind::Request, request, String::new(), &mut nodes);
    run_stages(&nodes)?;

    let input_map = lookup(request, "input_config")
        .and_then(Value::as_object)
        .ok_or_else(|| ValidationError::missing("", "input_config"))?;
    let pipeline_map = lookup(request, "pipeline_config")
        .and_then(Value::as_object)
        .ok_or_else(|| ValidationError::missing("", "pipeline_config"))?;

    normalize(input_map, pipeline_map)
}

/// Gather `object` and every nested configuration object below it, pre-order.
///
/// Values that do not have the shape of an object are skipped here; the
/// type stage reports them.
fn collect<'a>(
    kind: ObjectKind,
    object: &'a Map<String, Value>,
    location: String,
    out: &mut Vec<Node<'a>>,
) {
    let node = Node {
        kind,
        object,
        location,
    };

    let mut children = Vec::new();
    for spec in kind.fields() {
        let Some(value) = lookup(object, spec.name) else {
            continue;
        };
        let child_location = node.field_location(spec.name);
        match spec.kind {
            FieldKind::Object(child_kind) => {
                if let Some(child) = value.as_object() {
                    children.push((child_kind, child, child_location));
                }
            }
            FieldKind::ObjectList(child_kind) => {
                if let Some(items) = value.as_array() {
                    for (i, item) in items.iter().enumerate() {
                        if let Some(child) = item.as_object() {
                            children.push((child_kind, child, format!("{}[{}]", child_location, i)));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    out.push(node);
    for (child_kind, child, child_location) in children {
        collect(child_kind, child, child_location, out);
    }
}

fn run_stages(nodes: &[Node<'_>]) -> Result<()> {
    let result = nodes
        .iter()
        .try_for_each(check_shape)
        .and_then(|_| nodes.iter().try_for_each(check_required))
        .and_then(|_| nodes.iter().try_for_each(check_types))
        .and_then(|_| nodes.iter().try_for_each(check_semantics));

    if let Err(e) = &result {
        tracing::debug!(location = %e.location, "configuration rejected: {}", e.error_type);
    }
    result
}

/// Stage 1: every key must belong to the object's schema.
fn check_shape(node: &Node<'_>) -> Result<()> {
    match node.object.keys().find(|key| node.kind.field(key).is_none()) {
        Some(key) => Err(ValidationError::unrecognized(&node.location, key)),
        None => Ok(()),
    }
}

/// Stage 2: required fields, in declaration order.
fn check_required(node: &Node<'_>) -> Result<()> {
    for spec in node.kind.fields() {
        if lookup(node.object, spec.name).is_none() && spec.requirement.applies(node.object) {
            return Err(ValidationError::missing(&node.location, spec.name));
        }
    }
    Ok(())
}

/// Stage 3: value shapes and label domains, in declaration order.
fn check_types(node: &Node<'_>) -> Result<()> {
    for spec in node.kind.fields() {
        if let Some(value) = lookup(node.object, spec.name) {
            if !spec.kind.accepts(value) {
                return Err(ValidationError::wrong_type(&node.location, spec.name));
            }
        }
    }
    Ok(())
}

/// Stage 4: rules that relate a field to its context.
fn check_semantics(node: &Node<'_>) -> Result<()> {
    match node.kind {
        ObjectKind::Request => Ok(()),
        ObjectKind::InputConfig => check_input_config(node),
        ObjectKind::Period => check_non_empty(node, "inputs"),
        ObjectKind::Input => check_input(node),
        ObjectKind::Pipeline => check_pipeline(node),
        ObjectKind::Encryption => check_encryption(node),
    }
}

fn check_non_empty(node: &Node<'_>, name: &str) -> Result<()> {
    match lookup(node.object, name).and_then(Value::as_array) {
        Some(items) if items.is_empty() => Err(ValidationError::malformed(&node.location, name)),
        _ => Ok(()),
    }
}

fn check_input_config(node: &Node<'_>) -> Result<()> {
    if lookup(node.object, "inputs").is_some()
        && lookup(node.object, "multiperiod_inputs_list").is_some()
    {
        return Err(ValidationError::malformed(&node.location, "multiperiod_inputs_list"));
    }
    check_non_empty(node, "inputs")?;
    check_non_empty(node, "multiperiod_inputs_list")
}

fn check_input(node: &Node<'_>) -> Result<()> {
    let input_type = lookup(node.object, "input_type")
        .and_then(Value::as_str)
        .and_then(InputType::from_label)
        .unwrap_or_default();

    let mut times = [None, None];
    for (slot, name) in times.iter_mut().zip(["start_time", "end_time"]) {
        let Some(value) = lookup(node.object, name).and_then(Value::as_str) else {
            continue;
        };
        if !input_type.is_seekable() {
            return Err(ValidationError::malformed(&node.location, name));
        }
        let seconds =
            parse_time(value).ok_or_else(|| ValidationError::malformed(&node.location, name))?;
        *slot = Some(seconds);
    }

    if let [Some(start), Some(end)] = times {
        if end <= start {
            return Err(ValidationError::malformed(&node.location, "end_time"));
        }
    }

    let media_type = lookup(node.object, "media_type")
        .and_then(Value::as_str)
        .and_then(MediaType::from_label);
    if lookup(node.object, "channels").is_some() && media_type != Some(MediaType::Audio) {
        return Err(ValidationError::malformed(&node.location, "channels"));
    }
    Ok(())
}

/// Label lists that select outputs; an empty one would produce nothing.
const OUTPUT_LISTS: [&str; 4] = ["resolutions", "audio_codecs", "video_codecs", "manifest_format"];

fn check_pipeline(node: &Node<'_>) -> Result<()> {
    for name in OUTPUT_LISTS {
        check_non_empty(node, name)?;
    }

    let live = lookup(node.object, "streaming_mode").and_then(Value::as_str)
        == Some(StreamingMode::Live.label());

    if live && lookup(node.object, "segment_per_file") == Some(&Value::Bool(false)) {
        return Err(ValidationError::malformed(&node.location, "segment_per_file"));
    }
    if !live && lookup(node.object, "low_latency_dash_mode") == Some(&Value::Bool(true)) {
        return Err(ValidationError::malformed(&node.location, "low_latency_dash_mode"));
    }
    Ok(())
}

fn check_encryption(node: &Node<'_>) -> Result<()> {
    if let Some(content_id) = lookup(node.object, "content_id").and_then(Value::as_str) {
        if !is_hex(content_id) {
            return Err(ValidationError::malformed(&node.location, "content_id"));
        }
    }
    Ok(())
}

/// Non-empty, whole bytes, hex digits only.
fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.chars().all(|c| c.is_ascii_hexdigit())
}
