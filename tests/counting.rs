use blobcount::tracker::CounterConfig;
use blobcount::{Counting, Counts, Detection, EntryCounter, Frame, VehicleClass};

/// One vehicle driving down the region at constant speed
struct Vehicle {
    x: i32,
    start_y: i32,
    speed: i32,
    area: f64,
    first_frame: u64,
}

impl Vehicle {
    fn at(&self, frame: u64, height: i32) -> Option<Detection> {
        if frame < self.first_frame {
            return None;
        }

        let y = self.start_y + self.speed * (frame - self.first_frame) as i32;
        if y >= height {
            None
        } else {
            Some(Detection::new(self.x, y, self.area))
        }
    }
}

fn simulate(counter: &mut EntryCounter, vehicles: &[Vehicle], frames: u64) -> Vec<(u64, VehicleClass)> {
    let mut counted = Vec::new();

    for index in 0..frames {
        let mut detections: Vec<Detection> = vehicles.iter().filter_map(|v| v.at(index, 200)).collect();

        // speckle noise well below the minimum area
        detections.push(Detection::new(150, 150, 3.0));

        for reg in counter.update(&Frame::new(index, detections)) {
            if reg.counted {
                counted.push((reg.id.unwrap(), reg.class));
            }
        }
    }

    counted
}

#[test]
fn each_vehicle_is_counted_once() {
    let mut counter = EntryCounter::new(240.0, 5000.0);
    let vehicles = [
        Vehicle { x: 40, start_y: 0, speed: 12, area: 1200.0, first_frame: 0 },
        Vehicle { x: 160, start_y: 2, speed: 9, area: 7000.0, first_frame: 5 },
        Vehicle { x: 280, start_y: 1, speed: 10, area: 900.0, first_frame: 20 },
    ];

    let counted = simulate(&mut counter, &vehicles, 60);

    assert_eq!(
        counted,
        vec![
            (1, VehicleClass::Car),
            (2, VehicleClass::Truck),
            (3, VehicleClass::Car),
        ]
    );
    assert_eq!(counter.counts(), Counts { cars: 2, trucks: 1 });
}

#[test]
fn vehicle_appearing_inside_region_counts_on_first_sight() {
    let mut counter = EntryCounter::new(240.0, 5000.0);
    let vehicles = [Vehicle { x: 100, start_y: 80, speed: 5, area: 600.0, first_frame: 3 }];

    assert_eq!(simulate(&mut counter, &vehicles, 30), vec![(1, VehicleClass::Car)]);
}

#[test]
fn slow_vehicle_creeping_through_the_band_is_missed() {
    // 2 px per frame never jumps from above y=5 to below y=10 in one step
    let mut counter = EntryCounter::new(240.0, 5000.0);
    let vehicles = [Vehicle { x: 100, start_y: 0, speed: 2, area: 600.0, first_frame: 0 }];

    assert!(simulate(&mut counter, &vehicles, 50).is_empty());
    assert_eq!(counter.counts().total(), 0);
}

#[test]
fn lost_track_is_reacquired_under_new_id() {
    let mut counter = EntryCounter::with_config(CounterConfig {
        min_area: 240.0,
        max_missed_frames: Some(5),
        ..Default::default()
    });

    let first = counter.update(&Frame::new(0, vec![Detection::new(100, 50, 800.0)]));
    assert_eq!(first[0].id, Some(1));
    assert!(first[0].counted);

    for index in 1..10 {
        counter.update(&Frame::new(index, vec![]));
    }
    assert!(counter.is_empty());

    let again = counter.update(&Frame::new(10, vec![Detection::new(100, 52, 800.0)]));
    assert_eq!(again[0].id, Some(2));
    assert_eq!(counter.counts().cars, 2);
}
