use crate::bbox::{BBox, Ltwh};
use crate::error::Error;

use opencv::{core, imgcodecs, prelude::*};
use std::path::{Path, PathBuf};
use tracing::info;

/// `{LABEL}_{id}_{timestamp}.jpg`
pub fn crop_file_name(label: &str, id: u64, timestamp: i64) -> String {
    format!("{}_{}_{}.jpg", label, id, timestamp)
}

/// Saves the part of `frame` under `bbox`. Returns the written path, or
/// `None` if nothing of the box lies inside the frame.
pub fn save_crop(
    dir: &Path,
    frame: &core::Mat,
    bbox: &BBox<Ltwh>,
    label: &str,
    id: u64,
) -> Result<Option<PathBuf>, Error> {
    let clamped = match bbox.clamp(frame.cols(), frame.rows()) {
        Some(b) => b,
        None => return Ok(None),
    };

    let crop = core::Mat::roi(frame, clamped.into())?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(crop_file_name(label, id, chrono::Utc::now().timestamp()));

    imgcodecs::imwrite(&path.to_string_lossy(), &crop, &core::Vector::new())?;
    info!("vehicle saved: {}", path.display());

    Ok(Some(path))
}
