use std::path::PathBuf;

use rayon::prelude::*;

use crate::{
    encode::{
        ffmpeg::{FfmpegSink, FfmpegSinkOpts},
        sink::{FrameSink, SinkConfig},
    },
    foundation::{
        core::FrameIndex,
        error::{GratingError, GratingResult},
    },
    stimulus::{
        config::{StimulusConfig, Timing},
        synth::{FrameRGB, synthesize},
    },
};

/// Ordered phase values (degrees) driving one animation.
///
/// Never empty; every value lies in `[0, 360)`.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseSequence {
    phases: Vec<f64>,
}

impl PhaseSequence {
    /// `start, start + step, ...` while below 360, repeated `cycles` times, optionally reversed.
    pub fn from_timing(timing: &Timing, reverse: bool) -> GratingResult<Self> {
        timing.validate()?;

        let sweep: Vec<f64> = (0u32..)
            .map(|k| timing.phase_start_deg + f64::from(k) * timing.phase_step_deg)
            .take_while(|&p| p < 360.0)
            .collect();

        let mut phases = sweep.repeat(timing.cycles as usize);
        if reverse {
            phases.reverse();
        }
        Ok(Self { phases })
    }

    /// Sequence for `cfg`, reversed for rightward/downward motion.
    pub fn for_config(cfg: &StimulusConfig) -> GratingResult<Self> {
        Self::from_timing(&cfg.timing, cfg.reverse_motion())
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.phases
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.phases.iter().copied()
    }
}

/// Frame-level parallelism for the sequence renderers.
#[derive(Clone, Debug)]
pub struct RenderThreading {
    pub parallel: bool,
    /// Frames synthesized per parallel batch; bounds how many frames are held at once.
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

impl RenderThreading {
    pub fn validate(&self) -> GratingResult<()> {
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(GratingError::config(
                "render threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderStats {
    pub frames_total: u64,
    pub duration_secs: f64,
}

/// Synthesize every frame of `cfg` in playback order and keep them all in memory.
///
/// Prefer [`render_to_sink`] for long sequences or large rasters.
pub fn generate_sequence(cfg: &StimulusConfig) -> GratingResult<Vec<FrameRGB>> {
    cfg.validate()?;
    PhaseSequence::for_config(cfg)?
        .iter()
        .map(|phase| synthesize(&cfg.grating_params(phase)))
        .collect()
}

/// Stream every frame of `cfg` into `sink` in playback order.
///
/// Configuration is validated before `begin`. If synthesis or the sink fails part way, the
/// sink is aborted and the error returned.
#[tracing::instrument(skip(cfg, sink), fields(stimulus = %cfg.file_stem()))]
pub fn render_to_sink(
    cfg: &StimulusConfig,
    sink: &mut dyn FrameSink,
    threading: &RenderThreading,
) -> GratingResult<RenderStats> {
    cfg.validate()?;
    threading.validate()?;
    let phases = PhaseSequence::for_config(cfg)?;

    sink.begin(SinkConfig {
        width: cfg.width,
        height: cfg.height,
        fps: cfg.timing.fps,
    })?;

    let frames_total = match stream_frames(cfg, &phases, sink, threading) {
        Ok(n) => n,
        Err(e) => {
            sink.abort();
            return Err(e);
        }
    };
    if let Err(e) = sink.end() {
        sink.abort();
        return Err(e);
    }

    let stats = RenderStats {
        frames_total,
        duration_secs: cfg.timing.fps.frames_to_secs(frames_total),
    };
    tracing::info!(
        frames = stats.frames_total,
        duration_secs = stats.duration_secs,
        "sequence rendered"
    );
    Ok(stats)
}

/// Render `cfg` to an MP4 at `out_path` using the system `ffmpeg`.
pub fn render_to_mp4(
    cfg: &StimulusConfig,
    out_path: impl Into<PathBuf>,
    threading: &RenderThreading,
    overwrite: bool,
) -> GratingResult<RenderStats> {
    let mut opts = FfmpegSinkOpts::new(out_path);
    opts.overwrite = overwrite;
    let mut sink = FfmpegSink::new(opts);
    render_to_sink(cfg, &mut sink, threading)
}

fn stream_frames(
    cfg: &StimulusConfig,
    phases: &PhaseSequence,
    sink: &mut dyn FrameSink,
    threading: &RenderThreading,
) -> GratingResult<u64> {
    let mut next = 0u64;

    if !threading.parallel {
        for phase in phases.iter() {
            let frame = synthesize(&cfg.grating_params(phase))?;
            sink.push_frame(FrameIndex(next), &frame)?;
            next += 1;
        }
        return Ok(next);
    }

    let pool = build_thread_pool(threading.threads)?;
    for (chunk_idx, chunk) in phases
        .as_slice()
        .chunks(normalized_chunk_size(threading.chunk_size))
        .enumerate()
    {
        let frames = pool.install(|| {
            chunk
                .par_iter()
                .map(|&phase| synthesize(&cfg.grating_params(phase)))
                .collect::<GratingResult<Vec<_>>>()
        })?;
        tracing::debug!(chunk = chunk_idx, frames = frames.len(), "rendered chunk");

        for frame in &frames {
            sink.push_frame(FrameIndex(next), frame)?;
            next += 1;
        }
    }
    Ok(next)
}

fn build_thread_pool(threads: Option<usize>) -> GratingResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| GratingError::synthesis(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> usize {
    chunk_size.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encode::sink::InMemorySink,
        stimulus::{
            config::{Direction, Orientation},
            synth::FlatFieldPolicy,
        },
    };

    fn small_cfg() -> StimulusConfig {
        StimulusConfig {
            spatial_frequency: 8.0,
            width: 24,
            height: 16,
            ..StimulusConfig::default()
        }
    }

    #[test]
    fn default_sweep_is_odd_degrees() {
        let seq = PhaseSequence::from_timing(&Timing::default(), false).unwrap();
        assert_eq!(seq.len(), 180);
        let expected: Vec<f64> = (1..360).step_by(2).map(f64::from).collect();
        assert_eq!(seq.as_slice(), expected.as_slice());
    }

    #[test]
    fn direction_controls_order() {
        let left = StimulusConfig {
            direction: Direction::Left,
            ..small_cfg()
        };
        let right = StimulusConfig {
            direction: Direction::Right,
            ..small_cfg()
        };
        let fwd = PhaseSequence::for_config(&left).unwrap();
        let rev = PhaseSequence::for_config(&right).unwrap();

        assert_eq!(fwd.as_slice().first(), Some(&1.0));
        assert_eq!(fwd.as_slice().last(), Some(&359.0));
        let mut back: Vec<f64> = rev.iter().collect();
        back.reverse();
        assert_eq!(back.as_slice(), fwd.as_slice());

        let up = StimulusConfig {
            direction: Direction::Up,
            ..small_cfg()
        };
        assert_eq!(PhaseSequence::for_config(&up).unwrap(), fwd);
    }

    #[test]
    fn cycles_repeat_the_sweep() {
        let timing = Timing {
            phase_start_deg: 0.0,
            phase_step_deg: 90.0,
            cycles: 2,
            ..Timing::default()
        };
        let seq = PhaseSequence::from_timing(&timing, false).unwrap();
        assert_eq!(
            seq.as_slice(),
            &[0.0, 90.0, 180.0, 270.0, 0.0, 90.0, 180.0, 270.0]
        );
        assert!(seq.iter().all(|p| (0.0..360.0).contains(&p)));
    }

    #[test]
    fn generate_sequence_follows_phase_order() {
        let cfg = StimulusConfig {
            orientation: Orientation::Vertical,
            direction: Direction::Right,
            timing: Timing {
                phase_step_deg: 45.0,
                ..Timing::default()
            },
            ..small_cfg()
        };
        let frames = generate_sequence(&cfg).unwrap();
        let phases = PhaseSequence::for_config(&cfg).unwrap();
        assert_eq!(frames.len(), phases.len());
        for (frame, phase) in frames.iter().zip(phases.iter()) {
            assert_eq!(frame, &synthesize(&cfg.grating_params(phase)).unwrap());
        }
    }

    #[test]
    fn render_to_sink_streams_in_order() {
        let cfg = small_cfg();
        let mut sink = InMemorySink::new();
        let stats = render_to_sink(&cfg, &mut sink, &RenderThreading::default()).unwrap();

        assert_eq!(stats.frames_total, 180);
        assert_eq!(stats.duration_secs, 6.0);
        assert!(sink.is_finished());
        let sink_cfg = sink.config().unwrap();
        assert_eq!((sink_cfg.width, sink_cfg.height), (24, 16));
        for (i, (idx, _)) in sink.frames().iter().enumerate() {
            assert_eq!(idx.0, i as u64);
        }
    }

    #[test]
    fn parallel_matches_serial() {
        let cfg = small_cfg();
        let mut serial = InMemorySink::new();
        render_to_sink(&cfg, &mut serial, &RenderThreading::default()).unwrap();

        let mut parallel = InMemorySink::new();
        let threading = RenderThreading {
            parallel: true,
            chunk_size: 7,
            threads: Some(2),
        };
        render_to_sink(&cfg, &mut parallel, &threading).unwrap();

        assert_eq!(serial.frames(), parallel.frames());
    }

    #[test]
    fn failing_frame_aborts_sink() {
        let cfg = StimulusConfig {
            width: 1,
            height: 1,
            flat_field: FlatFieldPolicy::Error,
            ..small_cfg()
        };
        let mut sink = InMemorySink::new();
        let err = render_to_sink(&cfg, &mut sink, &RenderThreading::default()).unwrap_err();
        assert!(matches!(err, GratingError::Synthesis(_)));
        assert!(sink.frames().is_empty());
        assert!(!sink.is_finished());
    }

    #[test]
    fn invalid_config_never_reaches_sink() {
        let cfg = StimulusConfig {
            spatial_frequency: -3.0,
            ..small_cfg()
        };
        let mut sink = InMemorySink::new();
        assert!(
            render_to_sink(&cfg, &mut sink, &RenderThreading::default())
                .unwrap_err()
                .is_config()
        );
        assert!(sink.config().is_none());

        let threading = RenderThreading {
            parallel: true,
            threads: Some(0),
            ..RenderThreading::default()
        };
        assert!(
            render_to_sink(&small_cfg(), &mut sink, &threading)
                .unwrap_err()
                .is_config()
        );
        assert!(sink.config().is_none());
    }
}
