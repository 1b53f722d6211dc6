//! Grating synthesis: stimulus parameters in, one RGB8 raster out.
//!
//! Pipeline per frame:
//! 1. pixel grid scaled by `1 / spatial_frequency`, phase offset added along one axis
//! 2. oriented carrier `sin(cos(θ)·x + sin(θ)·y)`
//! 3. wave shaping (sine, square, block)
//! 4. min-max normalization over the frame
//! 5. two-tone color mapping at the 0.5 threshold

use std::f64::consts::{PI, TAU};

use crate::{
    foundation::error::{GratingError, GratingResult},
    stimulus::config::{ColorMode, WaveType},
};

const WHITE: [u8; 3] = [255, 255, 255];

/// Value that replaces the "both positive" and mixed-positive levels of a block grating.
pub const BLOCK_SENTINEL: f64 = -2.0;

/// Coordinate that receives the phase offset (the direction of apparent motion).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseAxis {
    X,
    Y,
}

/// What to do when a frame's shaped wave has zero range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlatFieldPolicy {
    /// Emit an all-white frame (every pixel below threshold).
    #[default]
    Uniform,
    /// Fail with [`GratingError::Synthesis`].
    Error,
}

/// Inputs of [`synthesize`]. Every dependency of the output is a field here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GratingParams {
    pub spatial_frequency: f64,
    /// Carrier angle in degrees; any finite value.
    pub orientation_deg: f64,
    /// Phase offset in degrees; any finite value.
    pub phase_deg: f64,
    pub phase_axis: PhaseAxis,
    pub wave: WaveType,
    pub width: u32,
    pub height: u32,
    pub colour: ColorMode,
    pub flat_field: FlatFieldPolicy,
}

impl GratingParams {
    pub fn validate(&self) -> GratingResult<()> {
        if !(self.spatial_frequency.is_finite() && self.spatial_frequency > 0.0) {
            return Err(GratingError::config(format!(
                "spatial frequency must be a positive finite number, got {}",
                self.spatial_frequency
            )));
        }
        if !self.orientation_deg.is_finite() || !self.phase_deg.is_finite() {
            return Err(GratingError::config(
                "orientation and phase must be finite",
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(GratingError::config(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// A rendered frame as RGB8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGB {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGB8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGB {
    fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            data: rgb.repeat(n),
        }
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }

    pub fn into_image(self) -> GratingResult<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| GratingError::synthesis("frame data does not match width*height*3"))
    }
}

/// Periodic square wave with period `2π` and 50% duty cycle: `+1` on `[0, π)`, `-1` on `[π, 2π)`.
pub fn square_wave(t: f64) -> f64 {
    if t.rem_euclid(TAU) < PI { 1.0 } else { -1.0 }
}

/// Synthesize one grating frame.
///
/// Deterministic in `params`; the output is always `width x height` RGB8.
pub fn synthesize(params: &GratingParams) -> GratingResult<FrameRGB> {
    params.validate()?;

    let field = shaped_field(params);
    let (min, max) = field
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    if range <= 0.0 || !range.is_finite() {
        return match params.flat_field {
            FlatFieldPolicy::Uniform => {
                tracing::debug!(
                    phase_deg = params.phase_deg,
                    width = params.width,
                    height = params.height,
                    "flat field, emitting uniform frame"
                );
                Ok(FrameRGB::filled(params.width, params.height, WHITE))
            }
            FlatFieldPolicy::Error => Err(GratingError::synthesis(format!(
                "degenerate frame: shaped wave is constant ({min}) at phase {}",
                params.phase_deg
            ))),
        };
    }

    let accent = params.colour.accent_rgb();
    let mut data = Vec::with_capacity(field.len() * 3);
    for v in field {
        let normalized = (v - min) / range;
        let rgb = if normalized > 0.5 { accent } else { WHITE };
        data.extend_from_slice(&rgb);
    }

    Ok(FrameRGB {
        width: params.width,
        height: params.height,
        data,
    })
}

fn shaped_field(params: &GratingParams) -> Vec<f64> {
    let w = params.width as usize;
    let h = params.height as usize;
    let sf = params.spatial_frequency;
    let phase_rad = params.phase_deg.to_radians();

    let (sin_a, cos_a) = params.orientation_deg.rem_euclid(360.0).to_radians().sin_cos();
    let (sin_b, cos_b) = (params.orientation_deg + 90.0)
        .rem_euclid(360.0)
        .to_radians()
        .sin_cos();

    let mut field = Vec::with_capacity(w * h);
    for j in 0..h {
        for i in 0..w {
            let mut x = i as f64 / sf;
            let mut y = j as f64 / sf;
            match params.phase_axis {
                PhaseAxis::X => x += phase_rad,
                PhaseAxis::Y => y += phase_rad,
            }

            let carrier = (cos_a * x + sin_a * y).sin();
            let v = match params.wave {
                WaveType::Sine => carrier,
                WaveType::Square => square_wave(carrier),
                WaveType::Block => {
                    let cross = (cos_b * x + sin_b * y).sin();
                    let sum = square_wave(carrier) + square_wave(cross);
                    if sum > 0.0 { BLOCK_SENTINEL } else { sum }
                }
            };
            field.push(v);
        }
    }
    field
}
