use std::{fmt, path::Path, str::FromStr};

use crate::{
    foundation::{
        core::Fps,
        error::{GratingError, GratingResult},
    },
    stimulus::synth::{FlatFieldPolicy, GratingParams, PhaseAxis},
};

/// Shaping function applied to the sinusoidal carrier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(try_from = "String")]
pub enum WaveType {
    /// The carrier itself.
    #[serde(rename = "sin")]
    #[value(name = "sin", alias = "sine")]
    Sine,
    /// Hard +1/-1 threshold of the carrier.
    #[serde(rename = "sqr")]
    #[value(name = "sqr", alias = "square")]
    Square,
    /// Sum of two orthogonal square waves, collapsed to a checkerboard.
    #[serde(rename = "blk")]
    #[value(name = "blk", alias = "block")]
    Block,
}

/// Which channels are suppressed in the above-threshold region.
///
/// Legacy labels name the resulting accent color.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(try_from = "String")]
pub enum ColorMode {
    /// White and green.
    #[serde(rename = "green")]
    #[value(name = "green", alias = "red-green")]
    RedGreen,
    /// White and blue.
    #[serde(rename = "blue")]
    #[value(name = "blue", alias = "red-blue")]
    RedBlue,
    /// White and black.
    #[serde(rename = "black")]
    #[value(name = "black", alias = "red-green-blue-exclusion")]
    RedGreenBlueExclusion,
}

/// Stripe orientation label.
///
/// Horizontal stripes drift along the vertical axis and vice versa.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Orientation {
    /// Horizontal stripes, carrier at 90 degrees.
    Horizontal,
    /// Vertical stripes, carrier at 0 degrees.
    Vertical,
}

/// Screen direction of the apparent motion.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl WaveType {
    /// Legacy short label (`sin`, `sqr`, `blk`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Sine => "sin",
            Self::Square => "sqr",
            Self::Block => "blk",
        }
    }
}

impl ColorMode {
    /// Legacy label naming the accent color.
    pub fn label(self) -> &'static str {
        match self {
            Self::RedGreen => "green",
            Self::RedBlue => "blue",
            Self::RedGreenBlueExclusion => "black",
        }
    }

    /// Color of the above-threshold region.
    pub fn accent_rgb(self) -> [u8; 3] {
        match self {
            Self::RedGreen => [0, 255, 0],
            Self::RedBlue => [0, 0, 255],
            Self::RedGreenBlueExclusion => [0, 0, 0],
        }
    }
}

impl Orientation {
    pub fn label(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }

    /// Carrier angle in degrees. The carrier runs perpendicular to the visible stripes.
    pub fn carrier_deg(self) -> f64 {
        match self {
            Self::Horizontal => 90.0,
            Self::Vertical => 0.0,
        }
    }

    /// Coordinate that receives the phase offset.
    pub fn phase_axis(self) -> PhaseAxis {
        match self {
            Self::Horizontal => PhaseAxis::Y,
            Self::Vertical => PhaseAxis::X,
        }
    }
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    /// Increasing phase drifts the pattern left/up, so right/down play the phases backwards.
    pub fn reverses_phase(self) -> bool {
        matches!(self, Self::Right | Self::Down)
    }
}

fn parse_label<T: Copy>(
    kind: &str,
    s: &str,
    table: &[(&str, T)],
) -> GratingResult<T> {
    let key = s.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, v)| *v)
        .ok_or_else(|| {
            let accepted: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
            GratingError::config(format!(
                "unknown {kind} '{s}' (expected one of: {})",
                accepted.join(", ")
            ))
        })
}

impl FromStr for WaveType {
    type Err = GratingError;

    fn from_str(s: &str) -> GratingResult<Self> {
        parse_label(
            "wave type",
            s,
            &[
                ("sin", Self::Sine),
                ("sine", Self::Sine),
                ("sqr", Self::Square),
                ("square", Self::Square),
                ("blk", Self::Block),
                ("block", Self::Block),
            ],
        )
    }
}

impl FromStr for ColorMode {
    type Err = GratingError;

    fn from_str(s: &str) -> GratingResult<Self> {
        parse_label(
            "colour",
            s,
            &[
                ("green", Self::RedGreen),
                ("red-green", Self::RedGreen),
                ("blue", Self::RedBlue),
                ("red-blue", Self::RedBlue),
                ("black", Self::RedGreenBlueExclusion),
                ("red-green-blue-exclusion", Self::RedGreenBlueExclusion),
            ],
        )
    }
}

impl FromStr for Orientation {
    type Err = GratingError;

    fn from_str(s: &str) -> GratingResult<Self> {
        parse_label(
            "orientation",
            s,
            &[("horizontal", Self::Horizontal), ("vertical", Self::Vertical)],
        )
    }
}

impl FromStr for Direction {
    type Err = GratingError;

    fn from_str(s: &str) -> GratingResult<Self> {
        parse_label(
            "direction",
            s,
            &[
                ("left", Self::Left),
                ("right", Self::Right),
                ("up", Self::Up),
                ("down", Self::Down),
            ],
        )
    }
}

// JSON goes through `FromStr` too, so every input path accepts the same labels.
macro_rules! label_conversions {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl TryFrom<String> for $t {
            type Error = GratingError;

            fn try_from(s: String) -> GratingResult<Self> {
                s.parse()
            }
        })*
    };
}

label_conversions!(WaveType, ColorMode, Orientation, Direction);

/// Upper bound on the length of one animation.
pub const MAX_FRAMES: u64 = 1_000_000;

/// Playback timing and phase sampling.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timing {
    /// Output frame rate.
    pub fps: Fps,
    /// First phase of each sweep, degrees in `[0, 360)`.
    pub phase_start_deg: f64,
    /// Phase increment between frames, degrees in `(0, 360)`.
    pub phase_step_deg: f64,
    /// Number of full 360 degree sweeps.
    pub cycles: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            phase_start_deg: 1.0,
            phase_step_deg: 2.0,
            cycles: 1,
        }
    }
}

impl Timing {
    pub fn validate(&self) -> GratingResult<()> {
        self.fps.validate()?;
        if !(self.phase_start_deg.is_finite() && (0.0..360.0).contains(&self.phase_start_deg)) {
            return Err(GratingError::config(format!(
                "phase start must be within [0, 360), got {}",
                self.phase_start_deg
            )));
        }
        if !(self.phase_step_deg.is_finite()
            && self.phase_step_deg > 0.0
            && self.phase_step_deg < 360.0)
        {
            return Err(GratingError::config(format!(
                "phase step must be within (0, 360), got {}",
                self.phase_step_deg
            )));
        }
        if self.cycles == 0 {
            return Err(GratingError::config("cycles must be >= 1"));
        }
        let frames =
            ((360.0 - self.phase_start_deg) / self.phase_step_deg).ceil() * f64::from(self.cycles);
        if frames > MAX_FRAMES as f64 {
            return Err(GratingError::config(format!(
                "phase step {} with {} cycle(s) yields more than {MAX_FRAMES} frames",
                self.phase_step_deg, self.cycles
            )));
        }
        Ok(())
    }
}

/// Immutable description of one moving-grating stimulus.
///
/// Construct with [`StimulusConfig::from_labels`], or deserialize / build the struct and call
/// [`StimulusConfig::validate`] before handing it to the renderers. Every renderer validates
/// again before synthesizing the first frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StimulusConfig {
    pub colour: ColorMode,
    pub wave: WaveType,
    pub orientation: Orientation,
    pub direction: Direction,
    /// Pixel coordinates are divided by this before entering the carrier; larger values give
    /// wider stripes.
    pub spatial_frequency: f64,
    pub width: u32,
    pub height: u32,
    pub timing: Timing,
    pub flat_field: FlatFieldPolicy,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            colour: ColorMode::RedGreen,
            wave: WaveType::Square,
            orientation: Orientation::Horizontal,
            direction: Direction::Down,
            spatial_frequency: 100.0,
            width: 1720,
            height: 720,
            timing: Timing::default(),
            flat_field: FlatFieldPolicy::default(),
        }
    }
}

impl StimulusConfig {
    /// Parse legacy string labels and validate in one step.
    pub fn from_labels(
        colour: &str,
        wave: &str,
        orientation: &str,
        direction: &str,
        spatial_frequency: f64,
        width: u32,
        height: u32,
    ) -> GratingResult<Self> {
        let cfg = Self {
            colour: colour.parse()?,
            wave: wave.parse()?,
            orientation: orientation.parse()?,
            direction: direction.parse()?,
            spatial_frequency,
            width,
            height,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a JSON config file. Missing fields take the reference defaults.
    pub fn from_json_path(path: &Path) -> GratingResult<Self> {
        use anyhow::Context as _;
        let bytes = std::fs::read(path)
            .with_context(|| format!("read stimulus config '{}'", path.display()))?;
        // Well-formed JSON with bad values (unknown label, wrong type) is a config error.
        let cfg: Self = serde_json::from_slice(&bytes).map_err(|e| {
            if e.is_data() {
                GratingError::config(format!(
                    "invalid stimulus config '{}': {e}",
                    path.display()
                ))
            } else {
                GratingError::from(e)
            }
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> GratingResult<()> {
        if !(self.spatial_frequency.is_finite() && self.spatial_frequency > 0.0) {
            return Err(GratingError::config(format!(
                "spatial frequency must be a positive finite number, got {}",
                self.spatial_frequency
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(GratingError::config(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(3))
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or_else(|| {
                GratingError::config(format!(
                    "image size {}x{} is too large",
                    self.width, self.height
                ))
            })?;
        self.timing.validate()
    }

    /// Carrier angle in degrees derived from the orientation label.
    pub fn orientation_deg(&self) -> f64 {
        self.orientation.carrier_deg()
    }

    pub fn phase_axis(&self) -> PhaseAxis {
        self.orientation.phase_axis()
    }

    pub fn reverse_motion(&self) -> bool {
        self.direction.reverses_phase()
    }

    /// Synthesizer inputs for one phase value.
    pub fn grating_params(&self, phase_deg: f64) -> GratingParams {
        GratingParams {
            spatial_frequency: self.spatial_frequency,
            orientation_deg: self.orientation_deg(),
            phase_deg,
            phase_axis: self.phase_axis(),
            wave: self.wave,
            width: self.width,
            height: self.height,
            colour: self.colour,
            flat_field: self.flat_field,
        }
    }

    /// Output base name, e.g. `green_sqr_horizontal_down`.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.colour, self.wave, self.orientation, self.direction
        )
    }
}
