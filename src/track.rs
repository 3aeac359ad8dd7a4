use crate::circular_queue::CircularQueue;
use nalgebra as na;

/// Entry state of a tracked object. `Entered` is terminal: an object is counted
/// at most once over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Entered,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: u64,
    pub state: EntryState,

    // in px, relative to the region of interest
    pub centroid: na::Point2<i32>,

    // index of the last frame this track was matched in
    pub last_seen: u64,

    trail: CircularQueue<na::Point2<i32>>,
}

impl Track {
    pub(crate) fn new(track_id: u64, centroid: na::Point2<i32>, frame: u64, trail_len: usize) -> Self {
        let mut trail = CircularQueue::with_capacity(trail_len);
        trail.push(centroid);

        Self {
            track_id,
            state: EntryState::Pending,
            centroid,
            last_seen: frame,
            trail,
        }
    }

    #[inline]
    pub fn distance(&self, pt: &na::Point2<f32>) -> f32 {
        na::distance(&to_f32(&self.centroid), pt)
    }

    /// Moves the track to `centroid` and returns the previous one
    pub(crate) fn update(&mut self, centroid: na::Point2<i32>, frame: u64) -> na::Point2<i32> {
        let prev = self.centroid;

        self.centroid = centroid;
        self.last_seen = frame;
        self.trail.push(centroid);

        prev
    }

    /// Transitions to `Entered`. Returns false if the track has already entered.
    pub(crate) fn enter(&mut self) -> bool {
        match self.state {
            EntryState::Pending => {
                self.state = EntryState::Entered;
                true
            }
            EntryState::Entered => false,
        }
    }

    #[inline]
    pub fn has_entered(&self) -> bool {
        self.state == EntryState::Entered
    }

    /// Recent centroids, oldest first
    #[inline]
    pub fn trail(&self) -> impl Iterator<Item = &na::Point2<i32>> {
        self.trail.asc_iter()
    }
}

#[inline]
pub(crate) fn to_f32(pt: &na::Point2<i32>) -> na::Point2<f32> {
    na::Point2::new(pt.x as f32, pt.y as f32)
}
