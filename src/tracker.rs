use crate::detection::Detection;
use crate::frame::Frame;
use crate::track::{to_f32, Track};
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Ignore,
    Car,
    Truck,
}

impl VehicleClass {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Ignore => "ignore",
            VehicleClass::Car => "car",
            VehicleClass::Truck => "truck",
        }
    }

    /// Upper-case label used for on-screen annotation and crop file names
    #[inline]
    pub fn display_label(&self) -> &'static str {
        match self {
            VehicleClass::Ignore => "IGNORE",
            VehicleClass::Car => "CAR",
            VehicleClass::Truck => "TRUCK",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of registering one detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub class: VehicleClass,
    /// true if this very call produced a count
    pub counted: bool,
    pub id: Option<u64>,
}

impl Registration {
    pub const IGNORED: Registration = Registration {
        class: VehicleClass::Ignore,
        counted: false,
        id: None,
    };
}

#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub cars: u64,
    pub trucks: u64,
}

impl Counts {
    #[inline]
    pub fn total(&self) -> u64 {
        self.cars + self.trucks
    }

    fn add(&mut self, class: VehicleClass) {
        match class {
            VehicleClass::Car => self.cars += 1,
            VehicleClass::Truck => self.trucks += 1,
            VehicleClass::Ignore => {}
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CounterConfig {
    /// detections below this contour area are noise
    pub min_area: f64,
    pub truck_area_threshold: f64,
    /// gating radius for nearest-centroid matching, exclusive
    pub match_radius: f32,
    /// a centroid below this y counts as entered
    pub entry_line: i32,
    /// a centroid above this y has not entered yet
    pub exit_line: i32,
    /// evict tracks unmatched for this many frames, `None` keeps them forever
    pub max_missed_frames: Option<u64>,
    pub trail_length: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            min_area: 0.0,
            truck_area_threshold: 5000.0,
            match_radius: 50.0,
            entry_line: 10,
            exit_line: 5,
            max_missed_frames: Some(30),
            trail_length: 16,
        }
    }
}

pub trait Counting {
    fn observe(&mut self, det: &Detection) -> Registration;
    fn end_frame(&mut self);
    fn counts(&self) -> Counts;

    fn update(&mut self, frame: &Frame) -> Vec<Registration> {
        let regs: Vec<_> = frame.iter().map(|det| self.observe(det)).collect();
        debug!(frame = frame.index, detections = frame.len(), "frame registered");
        self.end_frame();

        regs
    }
}

/// Nearest-centroid tracker that counts objects entering the region of
/// interest through its top edge.
#[derive(Debug, Clone)]
pub struct EntryCounter {
    config: CounterConfig,
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
    counts: Counts,
    frame: u64,
}

impl EntryCounter {
    pub fn new(min_area: f64, truck_area_threshold: f64) -> Self {
        Self::with_config(CounterConfig {
            min_area,
            truck_area_threshold,
            ..Default::default()
        })
    }

    pub fn with_config(config: CounterConfig) -> Self {
        Self {
            config,
            tracks: BTreeMap::new(),
            next_id: 1,
            counts: Counts::default(),
            frame: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    #[inline]
    pub fn classify(&self, area: f64) -> VehicleClass {
        if area >= self.config.truck_area_threshold {
            VehicleClass::Truck
        } else {
            VehicleClass::Car
        }
    }

    /// Registers one detection at `(cx, cy)` with the given contour area
    pub fn register(&mut self, cx: i32, cy: i32, area: f64) -> Registration {
        if area < self.config.min_area {
            return Registration::IGNORED;
        }

        let pt = na::Point2::new(cx, cy);
        let class = self.classify(area);

        let (id, counted) = match self.match_track(&to_f32(&pt)) {
            None => {
                let id = self.next_id;
                self.next_id += 1;

                let mut track = Track::new(id, pt, self.frame, self.config.trail_length);
                let counted = cy > self.config.entry_line && track.enter();
                self.tracks.insert(id, track);

                (id, counted)
            }

            Some(id) => {
                let (exit_line, entry_line) = (self.config.exit_line, self.config.entry_line);
                let frame = self.frame;

                let counted = match self.tracks.get_mut(&id) {
                    Some(track) => {
                        let prev = track.update(pt, frame);
                        !track.has_entered() && prev.y < exit_line && cy > entry_line && track.enter()
                    }
                    None => false,
                };

                (id, counted)
            }
        };

        if counted {
            self.counts.add(class);
            debug!(id, %class, cx, cy, area, "object entered");
        }

        Registration {
            class,
            counted,
            id: Some(id),
        }
    }

    /// Marks the end of a video frame and evicts stale tracks
    pub fn end_frame(&mut self) {
        self.frame += 1;

        if let Some(max_missed) = self.config.max_missed_frames {
            let frame = self.frame;

            self.tracks.retain(|id, track| {
                let keep = frame - track.last_seen <= max_missed;
                if !keep {
                    debug!(id, entered = track.has_entered(), "track evicted");
                }

                keep
            });
        }
    }

    #[inline]
    pub fn counts(&self) -> Counts {
        self.counts
    }

    #[inline]
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    #[inline]
    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    // Ties go to the lowest id since tracks iterate in id order.
    fn match_track(&self, pt: &na::Point2<f32>) -> Option<u64> {
        let mut best_id = None;
        let mut best_dist = f32::INFINITY;

        for (&id, track) in &self.tracks {
            let dist = track.distance(pt);
            if dist < best_dist && dist < self.config.match_radius {
                best_dist = dist;
                best_id = Some(id);
            }
        }

        best_id
    }
}

impl Counting for EntryCounter {
    #[inline]
    fn observe(&mut self, det: &Detection) -> Registration {
        self.register(det.x, det.y, det.area)
    }

    #[inline]
    fn end_frame(&mut self) {
        EntryCounter::end_frame(self)
    }

    #[inline]
    fn counts(&self) -> Counts {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_AREA: f64 = 100.0;
    const TRUCK_AREA: f64 = 5000.0;

    fn counter() -> EntryCounter {
        EntryCounter::new(MIN_AREA, TRUCK_AREA)
    }

    #[test]
    fn small_area_is_ignored_without_state_change() {
        let mut c = counter();
        assert_eq!(c.register(10, 20, 99.9), Registration::IGNORED);
        assert_eq!(c.register(10, 20, -5.0), Registration::IGNORED);

        assert!(c.is_empty());
        assert_eq!(c.counts(), Counts::default());

        // the id sequence is untouched as well
        assert_eq!(c.register(10, 0, MIN_AREA).id, Some(1));
    }

    #[test]
    fn unmatched_detections_get_sequential_ids() {
        let mut c = counter();
        let ids: Vec<_> = (0..4)
            .map(|i| c.register(i * 100, 0, 500.0).id)
            .collect();

        assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn classification_is_exact_at_threshold() {
        let c = counter();
        assert_eq!(c.classify(TRUCK_AREA), VehicleClass::Truck);
        assert_eq!(c.classify(TRUCK_AREA - 1.0), VehicleClass::Car);

        let mut c = counter();
        assert_eq!(c.register(0, 0, TRUCK_AREA).class, VehicleClass::Truck);
        assert_eq!(c.register(200, 0, TRUCK_AREA - 1.0).class, VehicleClass::Car);
    }

    #[test]
    fn new_object_past_entry_line_counts_immediately() {
        let mut c = counter();
        let reg = c.register(40, 11, 800.0);

        assert_eq!(
            reg,
            Registration {
                class: VehicleClass::Car,
                counted: true,
                id: Some(1)
            }
        );
        assert_eq!(c.counts(), Counts { cars: 1, trucks: 0 });
    }

    #[test]
    fn new_object_on_entry_line_is_not_counted() {
        let mut c = counter();
        let reg = c.register(40, 10, 800.0);

        assert!(!reg.counted);
        assert_eq!(reg.id, Some(1));
        assert_eq!(c.counts().total(), 0);
    }

    #[test]
    fn crossing_counts_once() {
        let mut c = counter();
        assert!(!c.register(40, 3, 6000.0).counted);

        let reg = c.register(42, 11, 6000.0);
        assert!(reg.counted);
        assert_eq!(reg.class, VehicleClass::Truck);
        assert_eq!(reg.id, Some(1));

        let reg = c.register(43, 12, 6000.0);
        assert!(!reg.counted);
        assert_eq!(reg.id, Some(1));

        assert_eq!(c.counts(), Counts { cars: 0, trucks: 1 });
    }

    #[test]
    fn slow_approach_through_the_band_is_not_counted() {
        let mut c = counter();
        c.register(40, 3, 800.0);
        c.register(40, 7, 800.0);

        // previous y is 7, not above the exit line
        assert!(!c.register(40, 11, 800.0).counted);
        assert_eq!(c.counts().total(), 0);
    }

    #[test]
    fn entered_object_never_counts_again() {
        let mut c = counter();
        assert!(c.register(40, 20, 800.0).counted);

        // backs out above the exit line and comes in again
        assert!(!c.register(40, 2, 800.0).counted);
        assert!(!c.register(40, 15, 800.0).counted);

        assert_eq!(c.counts(), Counts { cars: 1, trucks: 0 });
        assert!(c.get(1).map(|t| t.has_entered()).unwrap_or(false));
    }

    #[test]
    fn matching_respects_gating_radius() {
        let mut c = counter();
        let first = c.register(100, 100, 500.0).id;

        // 50 px away is outside the exclusive gate
        assert_ne!(c.register(150, 100, 500.0).id, first);

        let mut c = counter();
        let first = c.register(100, 100, 500.0).id;
        assert_eq!(c.register(120, 130, 500.0).id, first);
        assert_eq!(c.get(1).map(|t| (t.centroid.x, t.centroid.y)), Some((120, 130)));
    }

    #[test]
    fn matching_picks_nearest_track() {
        let mut c = counter();
        c.register(100, 100, 500.0);
        c.register(160, 100, 500.0);

        assert_eq!(c.register(140, 100, 500.0).id, Some(2));
        assert_eq!(c.register(105, 100, 500.0).id, Some(1));
    }

    #[test]
    fn ties_go_to_the_oldest_track() {
        let mut c = counter();
        c.register(100, 100, 500.0);
        c.register(160, 100, 500.0);

        assert_eq!(c.register(130, 100, 500.0).id, Some(1));
    }

    #[test]
    fn counts_follow_class_at_counting_time() {
        let mut c = counter();
        c.register(0, 3, 800.0);
        c.register(200, 3, 800.0);

        assert!(c.register(0, 11, 800.0).counted);
        assert!(c.register(200, 11, 7000.0).counted);
        assert!(c.register(400, 30, 7000.0).counted);

        assert_eq!(c.counts(), Counts { cars: 1, trucks: 2 });
        assert_eq!(c.counts().total(), 3);
    }

    #[test]
    fn stale_tracks_are_evicted() {
        let mut c = EntryCounter::with_config(CounterConfig {
            min_area: MIN_AREA,
            max_missed_frames: Some(2),
            ..Default::default()
        });

        c.register(100, 0, 500.0);
        c.end_frame();
        c.end_frame();
        assert_eq!(c.len(), 1);

        c.end_frame();
        assert!(c.is_empty());

        // ids are never reused
        assert_eq!(c.register(100, 0, 500.0).id, Some(2));
    }

    #[test]
    fn matched_tracks_survive_eviction() {
        let mut c = EntryCounter::with_config(CounterConfig {
            min_area: MIN_AREA,
            max_missed_frames: Some(1),
            ..Default::default()
        });

        for y in 0..10 {
            assert_eq!(c.register(100, y, 500.0).id, Some(1));
            c.end_frame();
        }

        assert_eq!(c.len(), 1);
    }

    #[test]
    fn no_eviction_without_limit() {
        let mut c = EntryCounter::with_config(CounterConfig {
            max_missed_frames: None,
            ..Default::default()
        });

        c.register(0, 0, 1.0);
        for _ in 0..1000 {
            c.end_frame();
        }

        assert_eq!(c.len(), 1);
    }

    #[test]
    fn update_registers_frame_in_order() {
        let mut c = counter();
        let frame = Frame::new(
            0,
            vec![
                Detection::new(10, 20, 600.0),
                Detection::new(10, 20, 50.0),
                Detection::new(300, 2, 9000.0),
            ],
        );

        let regs = c.update(&frame);
        assert_eq!(regs.len(), 3);
        assert!(regs[0].counted);
        assert_eq!(regs[1], Registration::IGNORED);
        assert_eq!(regs[2].class, VehicleClass::Truck);
        assert!(!regs[2].counted);

        assert_eq!(Counting::counts(&c), Counts { cars: 1, trucks: 0 });
    }

    #[test]
    fn ids_keep_growing_past_u32_range() {
        let mut c = counter();
        c.next_id = u32::MAX as u64;

        assert_eq!(c.register(10, 0, 500.0).id, Some(u32::MAX as u64));
        assert_eq!(c.register(300, 0, 500.0).id, Some(u32::MAX as u64 + 1));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn trail_keeps_recent_centroids() {
        let mut c = EntryCounter::with_config(CounterConfig {
            trail_length: 3,
            ..Default::default()
        });

        for y in 0..5 {
            c.register(10, y * 5, 1.0);
        }

        let trail: Vec<_> = c
            .get(1)
            .map(|t| t.trail().map(|p| p.y).collect())
            .unwrap_or_default();
        assert_eq!(trail, vec![10, 15, 20]);
    }
}
