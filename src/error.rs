use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("OpenCV Error: {0}")]
    OpenCvError(#[from] opencv::Error),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config Error: {0}")]
    ConfigError(#[from] serde_yaml::Error),

    #[error("unable to open video source {0}")]
    SourceUnavailable(String),

    #[error("region of interest {x},{y} {width}x{height} does not fit a {frame_width}x{frame_height} frame")]
    InvalidRoi {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        frame_width: i32,
        frame_height: i32,
    },

    #[error("unable to open video output {0}")]
    SinkUnavailable(String),

    #[error("video source returned no frames")]
    EmptyFrame,
}
