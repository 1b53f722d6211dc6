//! Export collaborators.
//!
//! Sinks consume frames in playback order and are driven by
//! [`render_to_sink`](crate::render_to_sink).

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Single-frame PNG export.
pub mod png;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
