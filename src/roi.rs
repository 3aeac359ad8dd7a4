use crate::error::Error;

use opencv::{core, highgui, prelude::*};
use serde_derive::{Deserialize, Serialize};
use tracing::info;

/// Fixed rectangular region of interest, chosen once at startup
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Roi {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Lets the user drag a rectangle over `frame` in a temporary window
    pub fn select(window: &str, frame: &core::Mat) -> Result<Self, Error> {
        let rect = highgui::select_roi(window, frame, false, false)?;
        highgui::destroy_window(window)?;

        let roi = Roi::new(rect.x, rect.y, rect.width, rect.height);
        info!("selected region of interest {:?}", roi);

        Ok(roi)
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    #[inline]
    pub fn rect(&self) -> core::Rect {
        core::Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Checks that the region is non-empty and lies inside a frame of the given size
    pub fn validate(&self, frame_width: i32, frame_height: i32) -> Result<(), Error> {
        let fits = self.width > 0
            && self.height > 0
            && self.x >= 0
            && self.y >= 0
            && self.x + self.width <= frame_width
            && self.y + self.height <= frame_height;

        if fits {
            Ok(())
        } else {
            Err(Error::InvalidRoi {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                frame_width,
                frame_height,
            })
        }
    }

    /// View into `frame` sharing its pixels, drawing on it draws on the frame
    pub fn view(&self, frame: &core::Mat) -> Result<core::Mat, Error> {
        self.validate(frame.cols(), frame.rows())?;

        Ok(core::Mat::roi(frame, self.rect())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_inner_region() {
        assert!(Roi::new(0, 0, 640, 480).validate(640, 480).is_ok());
        assert!(Roi::new(100, 50, 200, 100).validate(640, 480).is_ok());
    }

    #[test]
    fn validate_rejects_empty_or_overflowing_region() {
        assert!(matches!(
            Roi::new(0, 0, 0, 10).validate(640, 480),
            Err(Error::InvalidRoi { .. })
        ));
        assert!(Roi::new(600, 0, 50, 10).validate(640, 480).is_err());
        assert!(Roi::new(-1, 0, 50, 10).validate(640, 480).is_err());
        assert!(Roi::new(0, 400, 50, 81).validate(640, 480).is_err());
    }

    #[test]
    fn area_does_not_overflow() {
        assert_eq!(Roi::new(0, 0, 100_000, 100_000).area(), 10_000_000_000);
    }

    #[test]
    fn view_shares_pixels_with_frame() {
        let frame = core::Mat::zeros(40, 60, core::CV_8UC1).unwrap().to_mat().unwrap();
        let mut view = Roi::new(10, 5, 20, 10).view(&frame).unwrap();
        assert_eq!((view.cols(), view.rows()), (20, 10));

        *view.at_2d_mut::<u8>(0, 0).unwrap() = 7;
        assert_eq!(*frame.at_2d::<u8>(5, 10).unwrap(), 7);
    }
}
