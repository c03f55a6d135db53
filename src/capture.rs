// The frame-source seam. The OS-specific capture backend lives outside this
// crate; the pipeline only needs one frame per run from something
// implementing `FrameSource`. An image-file source stands in for the backend
// in the binary and in tests.

use std::path::{Path, PathBuf};

use crate::core_modules::frame::Frame;
use crate::error::PipelineError;

pub trait FrameSource {
    /// Produces the single frame for this run. An empty or unobtainable frame
    /// is a hard failure; the run must abort without output.
    fn capture(&mut self) -> Result<Frame, PipelineError>;
}

/// Reads the frame from an image file.
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&mut self) -> Result<Frame, PipelineError> {
        let image = image::open(&self.path).map_err(|err| {
            log::error!("frame source {} unreadable: {err}", self.path.display());
            PipelineError::CaptureFailure
        })?;
        let frame = image.into_rgb8();
        if frame.width() == 0 || frame.height() == 0 {
            return Err(PipelineError::CaptureFailure);
        }
        Ok(frame)
    }
}

/// Loads the previous run's frame snapshot; absent on cold start.
pub fn load_snapshot(path: &Path) -> Option<Frame> {
    match image::open(path) {
        Ok(image) => Some(image.into_rgb8()),
        Err(err) => {
            log::debug!("no previous frame snapshot at {} ({err})", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_frame_file_is_a_capture_failure() {
        let mut source = ImageFileSource::new("/nonexistent/frame.png");
        assert!(matches!(source.capture(), Err(PipelineError::CaptureFailure)));
    }

    #[test]
    fn missing_snapshot_is_a_cold_start() {
        assert!(load_snapshot(Path::new("/nonexistent/prev_frame.png")).is_none());
    }
}
