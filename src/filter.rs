use crate::error::Error;

use opencv::{
    core::{self, Mat, Point, Size},
    imgproc,
    prelude::*,
};
use serde_derive::{Deserialize, Serialize};

/// Structuring element for a morphological operation
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum KernelSpec {
    /// `width`x`height` block of ones
    Ones { width: i32, height: i32 },
    Ellipse { width: i32, height: i32 },
}

impl KernelSpec {
    pub fn build(&self) -> Result<Mat, Error> {
        let kernel = match *self {
            KernelSpec::Ones { width, height } => {
                Mat::ones(height, width, core::CV_8U)?.to_mat()?
            }
            KernelSpec::Ellipse { width, height } => imgproc::get_structuring_element(
                imgproc::MORPH_ELLIPSE,
                Size::new(width, height),
                Point::new(-1, -1),
            )?,
        };

        Ok(kernel)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Closing,
    Opening,
    Dilation,
    /// closing, then opening, then dilation
    Combine,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub mode: FilterMode,
    pub closing: KernelSpec,
    pub opening: KernelSpec,
    pub dilation: KernelSpec,
    pub iterations: i32,
    /// aperture of the median blur run after the chain, `None` to skip
    pub median_ksize: Option<i32>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            mode: FilterMode::Combine,
            closing: KernelSpec::Ones {
                width: 3,
                height: 3,
            },
            opening: KernelSpec::Ones {
                width: 3,
                height: 3,
            },
            dilation: KernelSpec::Ellipse {
                width: 3,
                height: 3,
            },
            iterations: 2,
            median_ksize: None,
        }
    }
}

/// Cleans up a foreground mask with morphological operations
pub struct MorphFilter {
    mode: FilterMode,
    closing: Mat,
    opening: Mat,
    dilation: Mat,
    iterations: i32,
    median_ksize: Option<i32>,
}

impl MorphFilter {
    pub fn new(config: &FilterConfig) -> Result<Self, Error> {
        Ok(Self {
            mode: config.mode,
            closing: config.closing.build()?,
            opening: config.opening.build()?,
            dilation: config.dilation.build()?,
            iterations: config.iterations,
            median_ksize: config.median_ksize,
        })
    }

    pub fn apply(&self, mask: &Mat) -> Result<Mat, Error> {
        let filtered = match self.mode {
            FilterMode::Closing => self.morph(mask, imgproc::MORPH_CLOSE, &self.closing)?,
            FilterMode::Opening => self.morph(mask, imgproc::MORPH_OPEN, &self.opening)?,
            FilterMode::Dilation => self.dilate(mask)?,
            FilterMode::Combine => {
                let closed = self.morph(mask, imgproc::MORPH_CLOSE, &self.closing)?;
                let opened = self.morph(&closed, imgproc::MORPH_OPEN, &self.opening)?;
                self.dilate(&opened)?
            }
        };

        match self.median_ksize {
            Some(ksize) => {
                let mut blurred = Mat::default();
                imgproc::median_blur(&filtered, &mut blurred, ksize)?;
                Ok(blurred)
            }
            None => Ok(filtered),
        }
    }

    fn morph(&self, src: &Mat, op: i32, kernel: &Mat) -> Result<Mat, Error> {
        let mut dst = Mat::default();
        imgproc::morphology_ex(
            src,
            &mut dst,
            op,
            kernel,
            Point::new(-1, -1),
            self.iterations,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        Ok(dst)
    }

    fn dilate(&self, src: &Mat) -> Result<Mat, Error> {
        let mut dst = Mat::default();
        imgproc::dilate(
            src,
            &mut dst,
            &self.dilation,
            Point::new(-1, -1),
            self.iterations,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        Ok(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_kernels() {
        let yaml = "
mode: combine
closing: {shape: ones, width: 11, height: 11}
opening: {shape: ones, width: 5, height: 3}
dilation: {shape: ellipse, width: 2, height: 2}
median_ksize: 5
";
        let config: FilterConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.closing, KernelSpec::Ones { width: 11, height: 11 });
        assert_eq!(config.dilation, KernelSpec::Ellipse { width: 2, height: 2 });
        assert_eq!(config.iterations, 2);
        assert_eq!(config.median_ksize, Some(5));
    }

    #[test]
    fn ones_kernel_has_requested_shape() {
        let kernel = KernelSpec::Ones { width: 5, height: 3 }.build().unwrap();
        assert_eq!((kernel.cols(), kernel.rows()), (5, 3));
    }

    #[test]
    fn combine_removes_speckle_and_keeps_blob() {
        let mut mask = Mat::zeros(60, 60, core::CV_8UC1).unwrap().to_mat().unwrap();
        imgproc::rectangle(
            &mut mask,
            core::Rect::new(20, 20, 20, 20),
            core::Scalar::all(255.0),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
        *mask.at_2d_mut::<u8>(5, 5).unwrap() = 255;

        let filtered = MorphFilter::new(&FilterConfig::default())
            .unwrap()
            .apply(&mask)
            .unwrap();

        assert_eq!(*filtered.at_2d::<u8>(5, 5).unwrap(), 0);
        assert_eq!(*filtered.at_2d::<u8>(30, 30).unwrap(), 255);
    }
}
