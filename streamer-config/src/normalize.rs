//! Conversion of a validated configuration into canonical types.
//!
//! Runs only after every validation stage has passed. The accessors still
//! return `Result` so a mismatch between the schema table and this module
//! surfaces as a `WrongType` instead of a panic.

use serde_json::{Map, Value};

use crate::error::{ErrorType, Result, ValidationError};
use crate::schema::lookup;
use crate::timecode::parse_time;
use crate::types::{
    AudioCodec, Encryption, Input, InputType, Label, ManifestFormat, NormalizedConfig, Period,
    PipelineSettings, ProtectionScheme, Resolution, VideoCodec,
};

const DEFAULT_CHANNELS: u64 = 2;
const DEFAULT_SEGMENT_SIZE: f64 = 4.0;
const DEFAULT_AVAILABILITY_WINDOW: u64 = 300;
const DEFAULT_PRESENTATION_DELAY: u64 = 30;
const DEFAULT_UPDATE_PERIOD: u64 = 8;
const DEFAULT_DASH_OUTPUT: &str = "dash.mpd";
const DEFAULT_HLS_OUTPUT: &str = "hls.m3u8";

/// Typed read access to one configuration object
struct Fields<'a> {
    object: &'a Map<String, Value>,
    location: String,
}

impl<'a> Fields<'a> {
    fn new(object: &'a Map<String, Value>, location: impl Into<String>) -> Self {
        Self {
            object,
            location: location.into(),
        }
    }

    fn location(&self, name: &str) -> String {
        format!("{}.{}", self.location, name)
    }

    fn value(&self, name: &str) -> Option<&'a Value> {
        lookup(self.object, name)
    }

    fn string(&self, name: &str) -> Result<Option<String>> {
        self.value(name)
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::wrong_type(&self.location, name))
            })
            .transpose()
    }

    fn required_string(&self, name: &str) -> Result<String> {
        self.string(name)?
            .ok_or_else(|| ValidationError::missing(&self.location, name))
    }

    fn bool_or(&self, name: &str, default: bool) -> Result<bool> {
        match self.value(name) {
            None => Ok(default),
            Some(v) => v
                .as_bool()
                .ok_or_else(|| ValidationError::wrong_type(&self.location, name)),
        }
    }

    fn uint(&self, name: &str) -> Result<Option<u64>> {
        self.value(name)
            .map(|v| {
                v.as_u64()
                    .ok_or_else(|| ValidationError::wrong_type(&self.location, name))
            })
            .transpose()
    }

    fn number(&self, name: &str) -> Result<Option<f64>> {
        self.value(name)
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| ValidationError::wrong_type(&self.location, name))
            })
            .transpose()
    }

    fn time(&self, name: &str) -> Result<Option<f64>> {
        self.string(name)?
            .map(|s| parse_time(&s).ok_or_else(|| ValidationError::malformed(&self.location, name)))
            .transpose()
    }

    fn label<T: Label>(&self, name: &str) -> Result<Option<T>> {
        self.value(name)
            .map(|v| {
                v.as_str()
                    .and_then(T::from_label)
                    .ok_or_else(|| ValidationError::wrong_type(&self.location, name))
            })
            .transpose()
    }

    /// A label list, deduplicated with the first occurrence kept.
    fn label_list<T: Label + PartialEq>(&self, name: &str) -> Result<Option<Vec<T>>> {
        let Some(value) = self.value(name) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| ValidationError::wrong_type(&self.location, name))?;

        let mut out: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            let parsed = item
                .as_str()
                .and_then(T::from_label)
                .ok_or_else(|| ValidationError::wrong_type(&self.location, name))?;
            if !out.contains(&parsed) {
                out.push(parsed);
            }
        }
        Ok(Some(out))
    }

    fn string_list(&self, name: &str) -> Result<Vec<String>> {
        let Some(value) = self.value(name) else {
            return Ok(Vec::new());
        };
        value
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| ValidationError::wrong_type(&self.location, name))
    }

    fn object(&self, name: &str) -> Result<Option<Fields<'a>>> {
        self.value(name)
            .map(|v| {
                v.as_object()
                    .map(|object| Fields::new(object, self.location(name)))
                    .ok_or_else(|| ValidationError::wrong_type(&self.location, name))
            })
            .transpose()
    }

    fn object_list(&self, name: &str) -> Result<Vec<Fields<'a>>> {
        let Some(value) = self.value(name) else {
            return Ok(Vec::new());
        };
        let items = value
            .as_array()
            .ok_or_else(|| ValidationError::wrong_type(&self.location, name))?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let location = format!("{}[{}]", self.location(name), i);
                item.as_object()
                    .map(|object| Fields::new(object, location.clone()))
                    .ok_or_else(|| ValidationError::new(ErrorType::WrongType, name, location))
            })
            .collect()
    }
}

/// Build the normalized configuration from validated objects.
pub(crate) fn normalize(
    input_config: &Map<String, Value>,
    pipeline_config: &Map<String, Value>,
) -> Result<NormalizedConfig> {
    let input_fields = Fields::new(input_config, "input_config");

    let periods = if input_fields.value("multiperiod_inputs_list").is_some() {
        input_fields
            .object_list("multiperiod_inputs_list")?
            .iter()
            .map(normalize_period)
            .collect::<Result<Vec<_>>>()?
    } else {
        vec![normalize_period(&input_fields)?]
    };

    let pipeline = normalize_pipeline(&Fields::new(pipeline_config, "pipeline_config"))?;

    let config = NormalizedConfig { periods, pipeline };
    tracing::debug!(
        periods = config.periods.len(),
        inputs = config.input_count(),
        mode = %config.pipeline.streaming_mode,
        "configuration normalized"
    );
    Ok(config)
}

fn normalize_period(fields: &Fields<'_>) -> Result<Period> {
    let inputs = fields
        .object_list("inputs")?
        .iter()
        .map(normalize_input)
        .collect::<Result<Vec<_>>>()?;
    Ok(Period { inputs })
}

fn normalize_input(fields: &Fields<'_>) -> Result<Input> {
    let media_type = fields
        .label("media_type")?
        .ok_or_else(|| ValidationError::missing(&fields.location, "media_type"))?;

    Ok(Input {
        name: fields.required_string("name")?,
        media_type,
        input_type: fields.label("input_type")?.unwrap_or(InputType::File),
        frame_rate: fields.number("frame_rate")?,
        resolution: fields.label::<Resolution>("resolution")?.map(Resolution::resolve),
        track_num: fields.uint("track_num")?.unwrap_or(0),
        language: fields.string("language")?,
        start_time: fields.time("start_time")?,
        end_time: fields.time("end_time")?,
        filters: fields.string_list("filters")?,
        extra_input_args: fields.string("extra_input_args")?,
        is_interlaced: fields.bool_or("is_interlaced", false)?,
        channels: fields.uint("channels")?,
        drm_label: fields.string("drm_label")?,
        skip_encryption: fields.uint("skip_encryption")?.unwrap_or(0),
    })
}

fn normalize_pipeline(fields: &Fields<'_>) -> Result<PipelineSettings> {
    let streaming_mode = fields
        .label("streaming_mode")?
        .ok_or_else(|| ValidationError::missing(&fields.location, "streaming_mode"))?;

    let resolutions = match fields.label_list::<Resolution>("resolutions")? {
        Some(labels) => labels,
        None => Resolution::LABELS
            .iter()
            .filter_map(|label| Resolution::from_label(label))
            .collect(),
    };

    let encryption = match fields.object("encryption")? {
        Some(enc) => normalize_encryption(&enc)?,
        None => Encryption::default(),
    };

    Ok(PipelineSettings {
        streaming_mode,
        quiet: fields.bool_or("quiet", false)?,
        debug_logs: fields.bool_or("debug_logs", false)?,
        resolutions: resolutions.into_iter().map(Resolution::resolve).collect(),
        channels: fields.uint("channels")?.unwrap_or(DEFAULT_CHANNELS),
        audio_codecs: fields
            .label_list("audio_codecs")?
            .unwrap_or_else(|| vec![AudioCodec::Aac]),
        video_codecs: fields
            .label_list("video_codecs")?
            .unwrap_or_else(|| vec![VideoCodec::H264]),
        manifest_format: fields
            .label_list("manifest_format")?
            .unwrap_or_else(|| vec![ManifestFormat::Dash, ManifestFormat::Hls]),
        dash_output: fields
            .string("dash_output")?
            .unwrap_or_else(|| DEFAULT_DASH_OUTPUT.to_string()),
        hls_output: fields
            .string("hls_output")?
            .unwrap_or_else(|| DEFAULT_HLS_OUTPUT.to_string()),
        segment_folder: fields.string("segment_folder")?.unwrap_or_default(),
        segment_size: fields.number("segment_size")?.unwrap_or(DEFAULT_SEGMENT_SIZE),
        segment_per_file: fields.bool_or("segment_per_file", true)?,
        availability_window: fields
            .uint("availability_window")?
            .unwrap_or(DEFAULT_AVAILABILITY_WINDOW),
        presentation_delay: fields
            .uint("presentation_delay")?
            .unwrap_or(DEFAULT_PRESENTATION_DELAY),
        update_period: fields.uint("update_period")?.unwrap_or(DEFAULT_UPDATE_PERIOD),
        low_latency_dash_mode: fields.bool_or("low_latency_dash_mode", false)?,
        utc_timings: fields.string_list("utc_timings")?,
        generate_iframe_playlist: fields.bool_or("generate_iframe_playlist", false)?,
        encryption,
    })
}

fn normalize_encryption(fields: &Fields<'_>) -> Result<Encryption> {
    Ok(Encryption {
        enable: fields.bool_or("enable", false)?,
        content_id: fields.string("content_id")?.map(|id| id.to_ascii_lowercase()),
        clear_lead: fields.uint("clear_lead")?.unwrap_or(0),
        protection_scheme: fields
            .label("protection_scheme")?
            .unwrap_or(ProtectionScheme::Cenc),
        key_server_url: fields.string("key_server_url")?,
    })
}
