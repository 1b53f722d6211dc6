use crate::foundation::error::{GratingError, GratingResult};

/// Absolute 0-based frame position in the output video.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> GratingResult<Self> {
        let fps = Self { num, den };
        fps.validate()?;
        Ok(fps)
    }

    /// Check both parts are non-zero (deserialized values bypass [`Fps::new`]).
    pub fn validate(self) -> GratingResult<()> {
        if self.den == 0 {
            return Err(GratingError::config("fps den must be > 0"));
        }
        if self.num == 0 {
            return Err(GratingError::config("fps num must be > 0"));
        }
        Ok(())
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * f64::from(self.den) / f64::from(self.num)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_rejects_zero_parts() {
        assert!(Fps::new(0, 1).is_err());
        assert!(Fps::new(30, 0).is_err());
        assert!(Fps { num: 30, den: 0 }.validate().is_err());
    }

    #[test]
    fn fps_converts_frames_to_seconds() {
        let fps = Fps::new(30, 1).unwrap();
        assert_eq!(fps.frames_to_secs(180), 6.0);

        let ntsc = Fps::new(30_000, 1001).unwrap();
        assert!((ntsc.as_f64() - 29.97).abs() < 0.01);
    }
}
