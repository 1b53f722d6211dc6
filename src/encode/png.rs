use std::path::Path;

use anyhow::Context as _;

use crate::encode::ffmpeg::{ensure_parent_dir, partial_path_for};
use crate::foundation::error::{GratingError, GratingResult};
use crate::stimulus::synth::FrameRGB;

/// Write a single frame as a PNG.
///
/// The image is encoded into a sibling `*.partial.png` and renamed into place.
pub fn write_png(frame: &FrameRGB, path: &Path) -> GratingResult<()> {
    if frame.data.len() != frame.width as usize * frame.height as usize * 3 {
        return Err(GratingError::export(
            "frame.data size mismatch with width*height*3",
        ));
    }
    ensure_parent_dir(path)?;

    let partial = partial_path_for(path, "png");
    let written = image::save_buffer_with_format(
        &partial,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", partial.display()))
    .and_then(|()| {
        std::fs::rename(&partial, path)
            .with_context(|| format!("move png into place at '{}'", path.display()))
    });

    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(GratingError::Other(e));
    }
    tracing::info!(out = %path.display(), "wrote frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_pixels() {
        let dir = Path::new("target").join("png_unit");
        let path = dir.join("two_px.png");
        let frame = FrameRGB {
            width: 2,
            height: 1,
            data: vec![255, 255, 255, 0, 0, 255],
        };
        write_png(&frame, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 255]);
        assert!(!dir.join("two_px.partial.png").exists());
    }

    #[test]
    fn png_rejects_short_buffers() {
        let frame = FrameRGB {
            width: 4,
            height: 4,
            data: vec![0; 3],
        };
        let path = Path::new("target").join("png_unit").join("short.png");
        assert!(write_png(&frame, &path).is_err());
        assert!(!path.exists());
    }
}
