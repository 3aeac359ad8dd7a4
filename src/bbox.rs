use serde_derive::{Deserialize, Serialize};
use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-width-height format, contains left top corner and width-height
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltwh;
impl BBoxFormat for Ltwh {}

/// Left-top-right-bottom format, contains left top and right bottom corners
/// (right and bottom are exclusive)
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Integer pixel box, the format is carried in the type
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct BBox<F: BBoxFormat>([i32; 4], PhantomData<F>);

impl<F: BBoxFormat> From<BBox<F>> for [i32; 4] {
    fn from(bbox: BBox<F>) -> Self {
        bbox.0
    }
}

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[i32; 4] {
        &self.0
    }
}

impl BBox<Ltwh> {
    #[inline]
    pub fn ltwh(left: i32, top: i32, width: i32, height: i32) -> Self {
        BBox([left, top, width, height], PhantomData)
    }

    #[inline(always)]
    pub fn left(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> i32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.0[3]
    }

    /// Center of the box, rounded towards the top-left corner
    #[inline]
    pub fn centroid(&self) -> (i32, i32) {
        (self.left() + self.width() / 2, self.top() + self.height() / 2)
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }

    /// Intersects the box with a `width`x`height` frame anchored at the origin.
    /// Returns `None` when nothing of the box is left.
    pub fn clamp(&self, width: i32, height: i32) -> Option<BBox<Ltwh>> {
        let ltrb = self.as_ltrb();
        let clamped = BBox::ltrb(
            ltrb.left().max(0),
            ltrb.top().max(0),
            ltrb.right().min(width),
            ltrb.bottom().min(height),
        );

        if clamped.right() <= clamped.left() || clamped.bottom() <= clamped.top() {
            None
        } else {
            Some(clamped.as_ltwh())
        }
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        BBox([left, top, right, bottom], PhantomData)
    }

    #[inline]
    pub fn as_ltwh(&self) -> BBox<Ltwh> {
        self.into()
    }

    #[inline(always)]
    pub fn left(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> i32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.0[3]
    }
}

impl<'a> From<&'a BBox<Ltwh>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Ltwh>) -> Self {
        BBox::ltrb(v.0[0], v.0[1], v.0[0] + v.0[2], v.0[1] + v.0[3])
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Ltwh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        BBox::ltwh(v.0[0], v.0[1], v.0[2] - v.0[0], v.0[3] - v.0[1])
    }
}

impl From<opencv::core::Rect> for BBox<Ltwh> {
    #[inline]
    fn from(r: opencv::core::Rect) -> Self {
        BBox::ltwh(r.x, r.y, r.width, r.height)
    }
}

impl From<BBox<Ltwh>> for opencv::core::Rect {
    #[inline]
    fn from(b: BBox<Ltwh>) -> Self {
        opencv::core::Rect::new(b.left(), b.top(), b.width(), b.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_uses_integer_halves() {
        let bbox = BBox::ltwh(10, 20, 31, 15);
        assert_eq!(bbox.centroid(), (25, 27));
    }

    #[test]
    fn clamp_keeps_inner_box() {
        let bbox = BBox::ltwh(5, 5, 10, 10);
        assert_eq!(bbox.clamp(100, 100), Some(bbox));
    }

    #[test]
    fn clamp_cuts_overhanging_box() {
        let bbox = BBox::ltwh(-4, 90, 20, 20);
        assert_eq!(bbox.clamp(100, 100), Some(BBox::ltwh(0, 90, 16, 10)));
    }

    #[test]
    fn clamp_drops_box_outside_frame() {
        assert_eq!(BBox::ltwh(120, 10, 10, 10).clamp(100, 100), None);
        assert_eq!(BBox::ltwh(10, -30, 10, 10).clamp(100, 100), None);
    }
}
