//! Canonical configuration types
//!
//! These are the values handed to the transcode pipeline once a job
//! configuration has been accepted:
//! - Enumerated labels (media type, input type, codecs, ...)
//! - Resolutions resolved to pixel dimensions
//! - Fully defaulted inputs, periods and pipeline settings

use serde::Serialize;
use std::fmt;

/// An enumeration that is spelled as a fixed set of string labels on the wire.
pub trait Label: Sized + Copy + 'static {
    /// Every accepted label, in declaration order
    const LABELS: &'static [&'static str];

    fn label(self) -> &'static str;

    fn from_label(label: &str) -> Option<Self>;
}

// helper.
macro_rules! label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Label for $name {
            const LABELS: &'static [&'static str] = &[$($label),+];

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

label_enum! {
    /// Kind of media carried by an input track
    MediaType {
        Video => "video",
        Audio => "audio",
        Text => "text",
    }
}

label_enum! {
    /// How an input is read
    InputType {
        File => "file",
        LoopedFile => "looped_file",
        RawImages => "raw_images",
        Webcam => "webcam",
        ExternalCommand => "external_command",
    }
}

impl InputType {
    /// Whether the source supports seeking, i.e. `start_time`/`end_time`.
    pub fn is_seekable(self) -> bool {
        matches!(self, InputType::File)
    }
}

impl Default for InputType {
    fn default() -> Self {
        InputType::File
    }
}

label_enum! {
    StreamingMode {
        Vod => "vod",
        Live => "live",
    }
}

label_enum! {
    ManifestFormat {
        Dash => "dash",
        Hls => "hls",
    }
}

label_enum! {
    AudioCodec {
        Aac => "aac",
        Opus => "opus",
        Ac3 => "ac3",
        Eac3 => "eac3",
    }
}

label_enum! {
    /// Video codecs; the `hw:` variants request hardware encoding
    VideoCodec {
        H264 => "h264",
        Hevc => "hevc",
        Vp9 => "vp9",
        Av1 => "av1",
        HwH264 => "hw:h264",
        HwHevc => "hw:hevc",
        HwVp9 => "hw:vp9",
        HwAv1 => "hw:av1",
    }
}

impl VideoCodec {
    pub fn is_hardware(self) -> bool {
        self.label().starts_with("hw:")
    }
}

label_enum! {
    ProtectionScheme {
        Cenc => "cenc",
        Cbcs => "cbcs",
    }
}

label_enum! {
    /// Recognized resolution labels
    Resolution {
        P144 => "144p",
        P240 => "240p",
        P360 => "360p",
        P480 => "480p",
        P576 => "576p",
        P720 => "720p",
        P720Hfr => "720p-hfr",
        P1080 => "1080p",
        P1080Hfr => "1080p-hfr",
        P1440 => "1440p",
        P1440Hfr => "1440p-hfr",
        Uhd4k => "4k",
        Uhd4kHfr => "4k-hfr",
        Uhd8k => "8k",
        Uhd8kHfr => "8k-hfr",
    }
}

impl Resolution {
    /// Width, height and maximum frame rate for this label
    pub fn dimensions(self) -> (u32, u32, f64) {
        match self {
            Resolution::P144 => (256, 144, 30.0),
            Resolution::P240 => (426, 240, 30.0),
            Resolution::P360 => (640, 360, 30.0),
            Resolution::P480 => (854, 480, 30.0),
            Resolution::P576 => (1024, 576, 30.0),
            Resolution::P720 => (1280, 720, 30.0),
            Resolution::P720Hfr => (1280, 720, 60.0),
            Resolution::P1080 => (1920, 1080, 30.0),
            Resolution::P1080Hfr => (1920, 1080, 60.0),
            Resolution::P1440 => (2560, 1440, 30.0),
            Resolution::P1440Hfr => (2560, 1440, 60.0),
            Resolution::Uhd4k => (4096, 2160, 30.0),
            Resolution::Uhd4kHfr => (4096, 2160, 60.0),
            Resolution::Uhd8k => (8192, 4320, 30.0),
            Resolution::Uhd8kHfr => (8192, 4320, 60.0),
        }
    }

    pub fn resolve(self) -> ResolutionSpec {
        let (width, height, max_frame_rate) = self.dimensions();
        ResolutionSpec {
            label: self,
            width,
            height,
            max_frame_rate,
        }
    }
}

/// A resolution label together with its concrete pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionSpec {
    pub label: Resolution,
    pub width: u32,
    pub height: u32,
    pub max_frame_rate: f64,
}

/// One physical input track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Input {
    pub name: String,
    pub media_type: MediaType,
    pub input_type: InputType,
    pub frame_rate: Option<f64>,
    pub resolution: Option<ResolutionSpec>,
    pub track_num: u64,
    /// None means "take it from the container metadata"
    pub language: Option<String>,
    /// Seconds from the start of the source
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub filters: Vec<String>,
    pub extra_input_args: Option<String>,
    pub is_interlaced: bool,
    pub channels: Option<u64>,
    pub drm_label: Option<String>,
    pub skip_encryption: u64,
}

/// A group of inputs played back as one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub inputs: Vec<Input>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encryption {
    pub enable: bool,
    pub content_id: Option<String>,
    pub clear_lead: u64,
    pub protection_scheme: ProtectionScheme,
    pub key_server_url: Option<String>,
}

impl Default for Encryption {
    fn default() -> Self {
        Self {
            enable: false,
            content_id: None,
            clear_lead: 0,
            protection_scheme: ProtectionScheme::Cenc,
            key_server_url: None,
        }
    }
}

/// Global job parameters with every default applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSettings {
    pub streaming_mode: StreamingMode,
    pub quiet: bool,
    pub debug_logs: bool,
    pub resolutions: Vec<ResolutionSpec>,
    pub channels: u64,
    pub audio_codecs: Vec<AudioCodec>,
    pub video_codecs: Vec<VideoCodec>,
    pub manifest_format: Vec<ManifestFormat>,
    pub dash_output: String,
    pub hls_output: String,
    pub segment_folder: String,
    /// Segment duration in seconds
    pub segment_size: f64,
    pub segment_per_file: bool,
    pub availability_window: u64,
    pub presentation_delay: u64,
    pub update_period: u64,
    pub low_latency_dash_mode: bool,
    pub utc_timings: Vec<String>,
    pub generate_iframe_playlist: bool,
    pub encryption: Encryption,
}

/// An accepted job configuration, ready for the transcode pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedConfig {
    pub periods: Vec<Period>,
    pub pipeline: PipelineSettings,
}

impl NormalizedConfig {
    /// All inputs across all periods
    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.periods.iter().flat_map(|p| p.inputs.iter())
    }

    pub fn input_count(&self) -> usize {
        self.periods.iter().map(|p| p.inputs.len()).sum()
    }

    pub fn is_live(&self) -> bool {
        self.pipeline.streaming_mode == StreamingMode::Live
    }
}
