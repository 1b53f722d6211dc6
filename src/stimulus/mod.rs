//! Stimulus model, grating synthesis and frame sequencing.

pub mod config;
pub mod sequence;
pub mod synth;
