use crate::bbox::{BBox, Ltwh};
use crate::error::Error;
use crate::track::Track;
use crate::tracker::Counts;

use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Vector},
    imgproc,
    prelude::*,
};
use rand::Rng;
use serde_derive::{Deserialize, Serialize};

const FONT: i32 = imgproc::FONT_HERSHEY_SIMPLEX;

/// Color in BGR order
pub type Bgr = [u8; 3];

#[inline]
fn scalar(c: Bgr) -> Scalar {
    Scalar::new(c[0] as f64, c[1] as f64, c[2] as f64, 0.0)
}

fn random_color() -> Bgr {
    let mut rng = rand::thread_rng();
    [rng.gen(), rng.gen(), rng.gen()]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Palette {
    pub entry_line: Bgr,
    pub exit_line: Bgr,
    pub bounding_box: Bgr,
    pub tracker: Bgr,
    pub text: Bgr,
    pub label: Bgr,
    pub warning: Bgr,
    pub warning_banner: Bgr,
    pub motion_banner: Bgr,
    pub cars: Bgr,
    pub trucks: Bgr,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entry_line: [64, 255, 0],
            exit_line: [0, 0, 255],
            bounding_box: [255, 128, 0],
            tracker: [255, 0, 0],
            text: [0, 255, 0],
            label: [255, 255, 255],
            warning: [24, 201, 255],
            warning_banner: [49, 49, 49],
            motion_banner: [255, 0, 0],
            cars: [0, 255, 0],
            trucks: [0, 165, 255],
        }
    }
}

impl Palette {
    /// Default palette with freshly randomized tracker and text colors
    pub fn with_random_accents() -> Self {
        Self {
            tracker: random_color(),
            text: random_color(),
            ..Default::default()
        }
    }
}

/// Draws annotations onto frames with a fixed palette
pub struct Renderer {
    palette: Palette,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn draw_box(&self, img: &mut Mat, bbox: &BBox<Ltwh>, color: Bgr, thickness: i32) -> Result<(), Error> {
        imgproc::rectangle(img, (*bbox).into(), scalar(color), thickness, imgproc::LINE_8, 0)?;
        Ok(())
    }

    fn text(&self, img: &mut Mat, text: &str, org: Point, scale: f64, color: Bgr, thickness: i32) -> Result<(), Error> {
        imgproc::put_text(
            img,
            text,
            org,
            FONT,
            scale,
            scalar(color),
            thickness,
            imgproc::LINE_AA,
            false,
        )?;

        Ok(())
    }

    /// Bounding box with a label above its top-left corner
    pub fn draw_detection(&self, img: &mut Mat, bbox: &BBox<Ltwh>, label: &str) -> Result<(), Error> {
        self.draw_box(img, bbox, self.palette.bounding_box, 2)?;
        self.text(
            img,
            label,
            Point::new(bbox.left(), bbox.top() - 5),
            0.7,
            self.palette.label,
            2,
        )
    }

    pub fn draw_counts(&self, img: &mut Mat, counts: &Counts) -> Result<(), Error> {
        self.text(
            img,
            &format!("Cars Entered: {}", counts.cars),
            Point::new(20, 50),
            1.0,
            self.palette.cars,
            2,
        )?;

        self.text(
            img,
            &format!("Trucks Entered: {}", counts.trucks),
            Point::new(20, 100),
            1.0,
            self.palette.trucks,
            2,
        )
    }

    /// Horizontal lines at the exit and entry y of a region `width` pixels wide
    pub fn draw_entry_lines(&self, img: &mut Mat, width: i32, entry_y: i32, exit_y: i32) -> Result<(), Error> {
        for (y, color) in [(exit_y, self.palette.exit_line), (entry_y, self.palette.entry_line)] {
            imgproc::line(
                img,
                Point::new(0, y),
                Point::new(width, y),
                scalar(color),
                1,
                imgproc::LINE_8,
                0,
            )?;
        }

        Ok(())
    }

    /// Recent path of a track with its id at the head
    pub fn draw_trail(&self, img: &mut Mat, track: &Track) -> Result<(), Error> {
        let color = scalar(self.palette.tracker);
        let points: Vec<Point> = track.trail().map(|p| Point::new(p.x, p.y)).collect();

        for pair in points.windows(2) {
            imgproc::line(img, pair[0], pair[1], color, 2, imgproc::LINE_AA, 0)?;
        }

        if let Some(&head) = points.last() {
            imgproc::circle(img, head, 3, color, imgproc::FILLED, imgproc::LINE_AA, 0)?;
            self.text(
                img,
                &track.track_id.to_string(),
                Point::new(head.x + 5, head.y + 15),
                0.5,
                self.palette.text,
                1,
            )?;
        }

        Ok(())
    }

    pub fn draw_contour(&self, img: &mut Mat, contour: &Vector<Point>, color: Bgr, thickness: i32) -> Result<(), Error> {
        let mut contours: Vector<Vector<Point>> = Vector::new();
        contours.push(contour.clone());

        imgproc::draw_contours(
            img,
            &contours,
            -1,
            scalar(color),
            thickness,
            imgproc::LINE_8,
            &Mat::default(),
            i32::MAX,
            Point::new(0, 0),
        )?;

        Ok(())
    }

    /// Thick contour in the text color with a thin white core
    pub fn draw_outline(&self, img: &mut Mat, contour: &Vector<Point>, thickness: i32) -> Result<(), Error> {
        self.draw_contour(img, contour, self.palette.text, thickness)?;
        self.draw_contour(img, contour, self.palette.label, 1)
    }

    /// Tracker-colored box with a thin white core
    pub fn draw_marker(&self, img: &mut Mat, bbox: &BBox<Ltwh>) -> Result<(), Error> {
        self.draw_box(img, bbox, self.palette.tracker, 3)?;
        self.draw_box(img, bbox, self.palette.label, 1)
    }

    /// Warning tag above the blob and its contour in the warning color
    pub fn draw_warning(&self, img: &mut Mat, bbox: &BBox<Ltwh>, contour: &Vector<Point>, text: &str) -> Result<(), Error> {
        let tag = Rect::new(bbox.left(), bbox.top() - 13, 120, 13);
        imgproc::rectangle(
            img,
            tag,
            scalar(self.palette.warning_banner),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        self.text(
            img,
            text,
            Point::new(bbox.left(), bbox.top() - 2),
            0.4,
            self.palette.label,
            1,
        )?;

        self.draw_contour(img, contour, self.palette.warning, 2)?;
        self.draw_contour(img, contour, self.palette.label, 1)
    }

    /// Filled banner in the top-left corner of the frame
    pub fn draw_banner(&self, img: &mut Mat, text: &str) -> Result<(), Error> {
        imgproc::rectangle(
            img,
            Rect::new(10, 30, 240, 25),
            scalar(self.palette.motion_banner),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )?;

        self.text(img, text, Point::new(10, 50), 1.0, self.palette.text, 2)
    }
}

/// Frame pixels kept by the foreground mask, black elsewhere
pub fn masked(frame: &Mat, mask: &Mat) -> Result<Mat, Error> {
    let mut out = Mat::default();
    core::bitwise_and(frame, frame, &mut out, mask)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_yaml_overrides_single_colors() {
        let palette: Palette = serde_yaml::from_str("warning: [1, 2, 3]").unwrap();
        assert_eq!(palette.warning, [1, 2, 3]);
        assert_eq!(palette.exit_line, Palette::default().exit_line);
    }

    #[test]
    fn random_accents_keep_fixed_colors() {
        let palette = Palette::with_random_accents();
        assert_eq!(palette.entry_line, [64, 255, 0]);
        assert_eq!(palette.bounding_box, [255, 128, 0]);
    }

    #[test]
    fn masked_blacks_out_background() {
        let frame = Mat::new_rows_cols_with_default(4, 4, core::CV_8UC1, Scalar::all(200.0)).unwrap();
        let mut mask = Mat::zeros(4, 4, core::CV_8UC1).unwrap().to_mat().unwrap();
        *mask.at_2d_mut::<u8>(1, 1).unwrap() = 255;

        let out = masked(&frame, &mask).unwrap();
        assert_eq!(*out.at_2d::<u8>(1, 1).unwrap(), 200);
        assert_eq!(*out.at_2d::<u8>(0, 0).unwrap(), 0);
    }
}
