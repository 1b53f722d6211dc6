//! Moving grating stimuli for vision science.
//!
//! - Describe a stimulus with a [`StimulusConfig`]
//! - Synthesize single frames with [`synthesize`]
//! - Stream a full phase sweep into a [`FrameSink`] with [`render_to_sink`], or straight to
//!   MP4 with [`render_to_mp4`]
#![forbid(unsafe_code)]

pub mod encode;
pub mod foundation;
pub mod stimulus;

pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::png::write_png;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::foundation::core::{Fps, FrameIndex};
pub use crate::foundation::error::{GratingError, GratingResult};
pub use crate::stimulus::config::{
    ColorMode, Direction, MAX_FRAMES, Orientation, StimulusConfig, Timing, WaveType,
};
pub use crate::stimulus::sequence::{
    PhaseSequence, RenderStats, RenderThreading, generate_sequence, render_to_mp4,
    render_to_sink,
};
pub use crate::stimulus::synth::{
    BLOCK_SENTINEL, FlatFieldPolicy, FrameRGB, GratingParams, PhaseAxis, square_wave, synthesize,
};
