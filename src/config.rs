use crate::display::WindowSpec;
use crate::error::Error;
use crate::filter::{FilterConfig, KernelSpec};
use crate::render::Palette;
use crate::roi::Roi;
use crate::subtractor::SubtractorKind;
use crate::tracker::CounterConfig;

use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let contents = std::fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&contents)?;
    info!("configuration loaded from {}", path.display());

    Ok(config)
}

/// Loads `path` when given, built-in defaults otherwise
pub fn load_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, Error> {
    match path {
        Some(path) => load(path),
        None => Ok(T::default()),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub source: String,
    /// record the annotated frames here
    pub output: Option<String>,
    /// resize factor applied to every frame
    pub scale: f64,
    /// fallback frame rate for recording when the source reports none
    pub fps: f64,
    /// key polling delay between frames
    pub wait_ms: i32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            output: None,
            scale: 1.0,
            fps: 24.0,
            wait_ms: 1,
        }
    }
}

impl VideoConfig {
    fn with_source(source: &str, scale: f64) -> Self {
        Self {
            source: source.to_string(),
            scale,
            ..Default::default()
        }
    }
}

fn side_by_side_windows(mask_window: &str) -> Vec<WindowSpec> {
    vec![
        WindowSpec::sized("Frame", (800, 450), (50, 50)),
        WindowSpec::sized(mask_window, (800, 450), (900, 50)),
    ]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VehicleCounterConfig {
    pub video: VideoConfig,
    /// selected interactively on the first frame when absent
    pub roi: Option<Roi>,
    pub subtractor: SubtractorKind,
    pub filter: FilterConfig,
    /// blob and counter minimum area, `roi area / 250` when absent
    pub min_area: Option<f64>,
    pub max_area: f64,
    /// `min_area` here is replaced by the top-level one
    pub counter: CounterConfig,
    /// counted vehicles are saved here, `None` disables saving
    pub crops_dir: Option<PathBuf>,
    pub palette: Palette,
    pub windows: Vec<WindowSpec>,
}

impl Default for VehicleCounterConfig {
    fn default() -> Self {
        Self {
            video: VideoConfig::with_source("video/cars.mp4", 1.0),
            roi: None,
            subtractor: SubtractorKind::mog2(),
            filter: FilterConfig::default(),
            min_area: None,
            max_area: 15000.0,
            counter: CounterConfig::default(),
            crops_dir: Some(PathBuf::from("vehicles")),
            palette: Palette::with_random_accents(),
            windows: vec![WindowSpec::autosize("Frame"), WindowSpec::autosize("Mask")],
        }
    }
}

impl VehicleCounterConfig {
    /// Minimum blob area for a region of interest of `roi_area` pixels
    pub fn min_area_for(&self, roi_area: i64) -> f64 {
        self.min_area.unwrap_or((roi_area / 250) as f64)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SocialDistanceConfig {
    pub video: VideoConfig,
    pub subtractor: SubtractorKind,
    pub filter: FilterConfig,
    /// blobs at least this large are outlined
    pub min_area: f64,
    /// blobs at least this large get the warning
    pub warning_area: f64,
    pub warning_text: String,
    pub palette: Palette,
    pub windows: Vec<WindowSpec>,
}

impl Default for SocialDistanceConfig {
    fn default() -> Self {
        Self {
            video: VideoConfig::with_source("video/distanciamento.mp4", 0.5),
            subtractor: SubtractorKind::Mog,
            filter: FilterConfig {
                closing: KernelSpec::Ones {
                    width: 11,
                    height: 11,
                },
                opening: KernelSpec::Ones {
                    width: 5,
                    height: 3,
                },
                dilation: KernelSpec::Ellipse {
                    width: 2,
                    height: 2,
                },
                median_ksize: Some(5),
                ..Default::default()
            },
            min_area: 400.0,
            warning_area: 800.0,
            warning_text: "Distancing warning".to_string(),
            palette: Palette::default(),
            windows: side_by_side_windows("BG Mask"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    pub video: VideoConfig,
    pub subtractor: SubtractorKind,
    pub filter: FilterConfig,
    pub min_area: f64,
    pub banner_text: String,
    pub palette: Palette,
    pub windows: Vec<WindowSpec>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            video: VideoConfig::with_source("video/video_animal.mp4", 0.5),
            subtractor: SubtractorKind::Gmg,
            filter: FilterConfig {
                median_ksize: Some(5),
                ..Default::default()
            },
            min_area: 250.0,
            banner_text: "Motion detected".to_string(),
            palette: Palette::default(),
            windows: side_by_side_windows("BG Mask"),
        }
    }
}
