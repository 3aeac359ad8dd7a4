use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltwh};

/// Contains (x,y) of the blob centroid and its contour area, both in pixels
/// relative to the region of interest
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "a")]
    pub area: f64,
}

impl Detection {
    #[inline]
    pub fn new(x: i32, y: i32, area: f64) -> Self {
        Self { x, y, area }
    }

    /// Detection centered on the bounding box of a blob
    #[inline]
    pub fn from_bbox(bbox: &BBox<Ltwh>, area: f64) -> Self {
        let (x, y) = bbox.centroid();

        Self { x, y, area }
    }
}
