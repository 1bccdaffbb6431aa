//! Schema table for job configuration objects
//!
//! Every object kind has a fixed, ordered list of recognized fields. Each
//! field declares when it is required and which JSON shape or label domain
//! its value must have. The validator walks this table stage by stage, so
//! the declaration order here is also the order in which errors surface.

use serde_json::{Map, Value};

use crate::types::{
    AudioCodec, InputType, Label, ManifestFormat, MediaType, ProtectionScheme, Resolution,
    StreamingMode, VideoCodec,
};

/// The kinds of objects that appear in a job configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// `{input_config, pipeline_config}` as posted to the control server
    Request,
    InputConfig,
    /// One entry of `multiperiod_inputs_list`
    Period,
    Input,
    Pipeline,
    Encryption,
}

/// Declared shape or domain of a field value
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Bool,
    /// Finite number greater than zero; strings are never coerced
    PositiveNumber,
    NonNegativeInt,
    PositiveInt,
    /// A single label out of a fixed set
    Label(&'static [&'static str]),
    /// A list of labels out of a fixed set
    LabelList(&'static [&'static str]),
    StringList,
    /// A string holding a time offset; the format is checked semantically
    Time,
    /// A string holding hex digits; the digits are checked semantically
    HexString,
    Object(ObjectKind),
    ObjectList(ObjectKind),
}

/// When a field must be present
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    Optional,
    Always,
    /// Required when the predicate holds for the enclosing object
    When(fn(&Map<String, Value>) -> bool),
    /// Required unless the named sibling field is present
    Unless(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub requirement: Requirement,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            requirement: Requirement::Optional,
            kind,
        }
    }

    const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            requirement: Requirement::Always,
            kind,
        }
    }

    const fn required_when(
        name: &'static str,
        predicate: fn(&Map<String, Value>) -> bool,
        kind: FieldKind,
    ) -> Self {
        Self {
            name,
            requirement: Requirement::When(predicate),
            kind,
        }
    }

    const fn required_unless(name: &'static str, sibling: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            requirement: Requirement::Unless(sibling),
            kind,
        }
    }
}

/// A field is present when its key exists with a non-null value.
pub fn lookup<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).filter(|v| !v.is_null())
}

fn label_is(object: &Map<String, Value>, name: &str, label: &str) -> bool {
    lookup(object, name).and_then(Value::as_str) == Some(label)
}

fn is_video(object: &Map<String, Value>) -> bool {
    label_is(object, "media_type", MediaType::Video.label())
}

/// Raw image sequences carry no timing, so video from them needs a frame rate.
fn is_raw_video(object: &Map<String, Value>) -> bool {
    is_video(object) && label_is(object, "input_type", InputType::RawImages.label())
}

static REQUEST_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("input_config", FieldKind::Object(ObjectKind::InputConfig)),
    FieldSpec::required("pipeline_config", FieldKind::Object(ObjectKind::Pipeline)),
];

static INPUT_CONFIG_FIELDS: &[FieldSpec] = &[
    FieldSpec::required_unless(
        "inputs",
        "multiperiod_inputs_list",
        FieldKind::ObjectList(ObjectKind::Input),
    ),
    FieldSpec::optional(
        "multiperiod_inputs_list",
        FieldKind::ObjectList(ObjectKind::Period),
    ),
];

static PERIOD_FIELDS: &[FieldSpec] = &[FieldSpec::required(
    "inputs",
    FieldKind::ObjectList(ObjectKind::Input),
)];

static INPUT_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name", FieldKind::String),
    FieldSpec::required("media_type", FieldKind::Label(MediaType::LABELS)),
    FieldSpec::optional("input_type", FieldKind::Label(InputType::LABELS)),
    FieldSpec::required_when("frame_rate", is_raw_video, FieldKind::PositiveNumber),
    FieldSpec::required_when("resolution", is_video, FieldKind::Label(Resolution::LABELS)),
    FieldSpec::optional("track_num", FieldKind::NonNegativeInt),
    FieldSpec::optional("language", FieldKind::String),
    FieldSpec::optional("start_time", FieldKind::Time),
    FieldSpec::optional("end_time", FieldKind::Time),
    FieldSpec::optional("filters", FieldKind::StringList),
    FieldSpec::optional("extra_input_args", FieldKind::String),
    FieldSpec::optional("is_interlaced", FieldKind::Bool),
    FieldSpec::optional("channels", FieldKind::PositiveInt),
    FieldSpec::optional("drm_label", FieldKind::String),
    FieldSpec::optional("skip_encryption", FieldKind::NonNegativeInt),
];

static PIPELINE_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("streaming_mode", FieldKind::Label(StreamingMode::LABELS)),
    FieldSpec::optional("quiet", FieldKind::Bool),
    FieldSpec::optional("debug_logs", FieldKind::Bool),
    FieldSpec::optional("resolutions", FieldKind::LabelList(Resolution::LABELS)),
    FieldSpec::optional("channels", FieldKind::PositiveInt),
    FieldSpec::optional("audio_codecs", FieldKind::LabelList(AudioCodec::LABELS)),
    FieldSpec::optional("video_codecs", FieldKind::LabelList(VideoCodec::LABELS)),
    FieldSpec::optional("manifest_format", FieldKind::LabelList(ManifestFormat::LABELS)),
    FieldSpec::optional("dash_output", FieldKind::String),
    FieldSpec::optional("hls_output", FieldKind::String),
    FieldSpec::optional("segment_folder", FieldKind::String),
    FieldSpec::optional("segment_size", FieldKind::PositiveNumber),
    FieldSpec::optional("segment_per_file", FieldKind::Bool),
    FieldSpec::optional("availability_window", FieldKind::PositiveInt),
    FieldSpec::optional("presentation_delay", FieldKind::PositiveInt),
    FieldSpec::optional("update_period", FieldKind::PositiveInt),
    FieldSpec::optional("low_latency_dash_mode", FieldKind::Bool),
    FieldSpec::optional("utc_timings", FieldKind::StringList),
    FieldSpec::optional("generate_iframe_playlist", FieldKind::Bool),
    FieldSpec::optional("encryption", FieldKind::Object(ObjectKind::Encryption)),
];

static ENCRYPTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional("enable", FieldKind::Bool),
    FieldSpec::optional("content_id", FieldKind::HexString),
    FieldSpec::optional("clear_lead", FieldKind::NonNegativeInt),
    FieldSpec::optional("protection_scheme", FieldKind::Label(ProtectionScheme::LABELS)),
    FieldSpec::optional("key_server_url", FieldKind::String),
];

impl ObjectKind {
    /// Recognized fields, in declaration order
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            ObjectKind::Request => REQUEST_FIELDS,
            ObjectKind::InputConfig => INPUT_CONFIG_FIELDS,
            ObjectKind::Period => PERIOD_FIELDS,
            ObjectKind::Input => INPUT_FIELDS,
            ObjectKind::Pipeline => PIPELINE_FIELDS,
            ObjectKind::Encryption => ENCRYPTION_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }
}

impl Requirement {
    /// Whether the field is required within `object`.
    pub fn applies(&self, object: &Map<String, Value>) -> bool {
        match self {
            Requirement::Optional => false,
            Requirement::Always => true,
            Requirement::When(predicate) => predicate(object),
            Requirement::Unless(sibling) => lookup(object, sibling).is_none(),
        }
    }
}

impl FieldKind {
    /// Whether `value` has the declared shape and lies inside the declared domain.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String | FieldKind::Time | FieldKind::HexString => value.is_string(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::PositiveNumber => value
                .as_f64()
                .is_some_and(|n| n.is_finite() && n > 0.0),
            FieldKind::NonNegativeInt => value.as_u64().is_some(),
            FieldKind::PositiveInt => value.as_u64().is_some_and(|n| n > 0),
            FieldKind::Label(labels) => value.as_str().is_some_and(|s| labels.contains(&s)),
            FieldKind::LabelList(labels) => value.as_array().is_some_and(|items| {
                items
                    .iter()
                    .all(|item| item.as_str().is_some_and(|s| labels.contains(&s)))
            }),
            FieldKind::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            FieldKind::Object(_) => value.is_object(),
            FieldKind::ObjectList(_) => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        }
    }
}
