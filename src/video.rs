use crate::error::Error;

use opencv::{
    core::{self, Mat, Size},
    imgproc,
    prelude::*,
    videoio,
};
use std::{fs, path::Path};
use tracing::{debug, info};

pub struct VideoSource {
    capture: videoio::VideoCapture,
    scale: Option<f64>,
    frames_read: u64,
}

impl VideoSource {
    pub fn open(path: &str) -> Result<Self, Error> {
        let capture = videoio::VideoCapture::from_file(path, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::SourceUnavailable(path.to_string()));
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        let total = capture.get(videoio::CAP_PROP_FRAME_COUNT)? as i64;
        info!("video {}: {}x{} {} frames", path, width, height, total);

        Ok(Self {
            capture,
            scale: None,
            frames_read: 0,
        })
    }

    /// Resizes every frame by `factor` on both axes
    pub fn with_scale(mut self, factor: f64) -> Self {
        self.scale = if (factor - 1.0).abs() > f64::EPSILON {
            Some(factor)
        } else {
            None
        };

        self
    }

    #[inline]
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    pub fn fps(&self) -> Result<f64, Error> {
        Ok(self.capture.get(videoio::CAP_PROP_FPS)?)
    }

    /// Next frame, `None` at end of stream
    pub fn read(&mut self) -> Result<Option<Mat>, Error> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.cols() == 0 || frame.rows() == 0 {
            debug!("end of stream after {} frames", self.frames_read);
            return Ok(None);
        }

        self.frames_read += 1;

        match self.scale {
            Some(factor) => {
                let mut scaled = Mat::default();
                imgproc::resize(
                    &frame,
                    &mut scaled,
                    Size::new(0, 0),
                    factor,
                    factor,
                    imgproc::INTER_LINEAR,
                )?;

                Ok(Some(scaled))
            }
            None => Ok(Some(frame)),
        }
    }

    /// First frame of the stream, needed up front to pick the region of interest
    pub fn first(&mut self) -> Result<Mat, Error> {
        self.read()?.ok_or(Error::EmptyFrame)
    }

    pub fn release(&mut self) -> Result<(), Error> {
        self.capture.release()?;
        Ok(())
    }
}

/// Records annotated frames, reopening the file whenever the frame size changes
pub struct VideoWriter {
    writer: Option<videoio::VideoWriter>,
    size: Option<(i32, i32)>,
    out_file: String,
    fps: f64,
}

impl VideoWriter {
    pub fn new<S: ToString>(out_file: S, fps: f64) -> Self {
        Self {
            writer: None,
            size: None,
            out_file: out_file.to_string(),
            fps,
        }
    }

    pub fn release(&mut self) -> Result<(), Error> {
        if let Some(mut w) = self.writer.take() {
            w.release()?;
        }

        Ok(())
    }

    fn reinit(&mut self, size: (i32, i32)) -> Result<(), Error> {
        self.release()?;
        debug!("recording {} at {}x{}", self.out_file, size.0, size.1);

        if let Some(dir) = Path::new(&self.out_file).parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let writer = videoio::VideoWriter::new(
            &self.out_file,
            videoio::VideoWriter::fourcc(b'X' as _, b'V' as _, b'I' as _, b'D' as _)?,
            self.fps,
            core::Size::new(size.0, size.1),
            true,
        )?;

        if !writer.is_opened()? {
            return Err(Error::SinkUnavailable(self.out_file.clone()));
        }

        self.size = Some(size);
        self.writer = Some(writer);

        Ok(())
    }

    pub fn feed(&mut self, m: &Mat) -> Result<(), Error> {
        let size = (m.cols(), m.rows());

        if self.writer.is_none() || self.size != Some(size) {
            self.reinit(size)?;
        }

        if let Some(w) = self.writer.as_mut() {
            w.write(m)?;
        }

        Ok(())
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_output_fails_on_first_frame() {
        let blocker = std::env::temp_dir().join(format!("blobcount-writer-test-{}", std::process::id()));
        fs::write(&blocker, b"not a directory").unwrap();

        let out = blocker.join("results").join("out.avi");
        let mut writer = VideoWriter::new(out.to_string_lossy(), 24.0);

        let frame = Mat::zeros(32, 32, core::CV_8UC3).unwrap().to_mat().unwrap();
        assert!(writer.feed(&frame).is_err());
        assert!(writer.writer.is_none());

        let _ = fs::remove_file(&blocker);
    }
}
