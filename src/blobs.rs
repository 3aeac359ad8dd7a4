use crate::bbox::{BBox, Ltwh};
use crate::detection::Detection;
use crate::error::Error;

use opencv::{
    core::{self, Mat, Point, Vector},
    imgproc,
    prelude::*,
};

/// Foreground region found in a mask
#[derive(Debug, Clone)]
pub struct Blob {
    pub bbox: BBox<Ltwh>,
    pub area: f64,
    pub contour: Vector<Point>,
}

impl Blob {
    #[inline]
    pub fn centroid(&self) -> (i32, i32) {
        self.bbox.centroid()
    }

    #[inline]
    pub fn detection(&self) -> Detection {
        Detection::from_bbox(&self.bbox, self.area)
    }
}

/// Extracts external contours whose area lies in `[min_area, max_area]`
#[derive(Debug, Clone, Copy)]
pub struct BlobExtractor {
    pub min_area: f64,
    pub max_area: Option<f64>,
}

impl BlobExtractor {
    pub fn new(min_area: f64, max_area: Option<f64>) -> Self {
        Self { min_area, max_area }
    }

    #[inline]
    pub fn accepts(&self, area: f64) -> bool {
        area >= self.min_area && self.max_area.map_or(true, |max| area <= max)
    }

    pub fn extract(&self, mask: &Mat) -> Result<Vec<Blob>, Error> {
        let mut contours: Vector<Vector<Point>> = Vector::new();
        imgproc::find_contours(
            mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let mut blobs = Vec::with_capacity(contours.len());
        for contour in contours.iter() {
            let area = imgproc::contour_area(&contour, false)?;
            if !self.accepts(area) {
                continue;
            }

            let rect: core::Rect = imgproc::bounding_rect(&contour)?;
            blobs.push(Blob {
                bbox: rect.into(),
                area,
                contour,
            });
        }

        Ok(blobs)
    }
}
