pub mod bbox;
pub mod blobs;
pub mod config;
pub mod detection;
pub mod display;
pub mod error;
pub mod filter;
pub mod frame;
pub mod render;
pub mod roi;
pub mod snapshot;
pub mod subtractor;
pub mod tracker;
pub mod video;

mod circular_queue;
mod track;

pub use detection::Detection;
pub use frame::Frame;
pub use track::{EntryState, Track};
pub use tracker::{Counting, Counts, EntryCounter, Registration, VehicleClass};

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber, `RUST_LOG` overrides `default_filter`
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
