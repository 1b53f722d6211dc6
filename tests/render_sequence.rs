use gratings::{
    ColorMode, Direction, FrameIndex, InMemorySink, Orientation, PhaseSequence, RenderThreading,
    StimulusConfig, WaveType, generate_sequence, render_to_sink, synthesize,
};

fn reference_cfg(direction: &str) -> StimulusConfig {
    StimulusConfig::from_labels("green", "sqr", "horizontal", direction, 100.0, 200, 100).unwrap()
}

#[test]
fn end_to_end_square_horizontal_left() {
    let cfg = reference_cfg("left");
    assert_eq!(cfg.colour, ColorMode::RedGreen);
    assert_eq!(cfg.wave, WaveType::Square);
    assert_eq!(cfg.orientation, Orientation::Horizontal);
    assert_eq!(cfg.direction, Direction::Left);

    let mut sink = InMemorySink::new();
    let stats = render_to_sink(&cfg, &mut sink, &RenderThreading::default()).unwrap();

    assert_eq!(stats.frames_total, 180);
    assert_eq!(stats.duration_secs, 6.0);
    let sink_cfg = sink.config().unwrap();
    assert_eq!((sink_cfg.width, sink_cfg.height), (200, 100));
    assert_eq!(sink_cfg.fps.as_f64(), 30.0);

    let frames = sink.frames();
    assert_eq!(frames.len(), 180);
    for (idx, frame) in frames {
        assert_eq!((frame.width, frame.height), (200, 100));
        assert_eq!(frame.data.len(), 200 * 100 * 3);
        assert!(frame.pixels().all(|p| p[1] == 255));
    }

    assert_eq!(frames[0].0, FrameIndex(0));
    assert_eq!(frames[0].1, synthesize(&cfg.grating_params(1.0)).unwrap());
    assert_eq!(frames[179].0, FrameIndex(179));
    assert_eq!(frames[179].1, synthesize(&cfg.grating_params(359.0)).unwrap());
}

#[test]
fn horizontal_stripes_are_constant_along_rows() {
    let cfg = reference_cfg("down");
    let frame = synthesize(&cfg.grating_params(1.0)).unwrap();
    for y in 0..frame.height {
        let first = frame.pixel(0, y).unwrap();
        assert!((0..frame.width).all(|x| frame.pixel(x, y) == Some(first)), "row {y}");
    }
    // A carrier half-period is 100*pi px, so near phase 0 the whole 100 px frame sits on the
    // positive lobe: the square wave is flat and the frame comes out white.
    assert!(frame.pixels().all(|p| p == [255, 255, 255]));

    // Half a turn later the lower rows have crossed into the negative lobe.
    let frame = synthesize(&cfg.grating_params(171.0)).unwrap();
    assert_eq!(frame.pixel(0, 0), Some([0, 255, 0]));
    assert_eq!(frame.pixel(0, 99), Some([255, 255, 255]));
}

#[test]
fn right_plays_left_backwards() {
    let left = StimulusConfig {
        spatial_frequency: 5.0,
        width: 32,
        height: 20,
        orientation: Orientation::Vertical,
        ..reference_cfg("left")
    };
    let right = StimulusConfig {
        direction: Direction::Right,
        ..left.clone()
    };

    let mut fwd = generate_sequence(&left).unwrap();
    let rev = generate_sequence(&right).unwrap();
    fwd.reverse();
    assert_eq!(fwd, rev);

    let phases = PhaseSequence::for_config(&right).unwrap();
    assert_eq!(phases.as_slice().first(), Some(&359.0));
    assert_eq!(phases.as_slice().last(), Some(&1.0));
}

#[test]
fn invalid_wave_fails_before_synthesis() {
    let err =
        StimulusConfig::from_labels("green", "triangle", "horizontal", "left", 100.0, 200, 100)
            .unwrap_err();
    assert!(err.is_config());
    assert!(err.to_string().contains("triangle"));

    let err = StimulusConfig::from_labels("green", "sqr", "oblique", "left", 100.0, 200, 100)
        .unwrap_err();
    assert!(err.is_config());
}
