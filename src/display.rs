use crate::error::Error;

use opencv::{core::Mat, highgui};
use serde_derive::{Deserialize, Serialize};

const QUIT_KEY: i32 = b'q' as i32;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub name: String,
    /// resizable window of this size, autosized when absent
    #[serde(default)]
    pub size: Option<(i32, i32)>,
    #[serde(default)]
    pub position: Option<(i32, i32)>,
}

impl WindowSpec {
    pub fn autosize(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: None,
            position: None,
        }
    }

    pub fn sized(name: &str, size: (i32, i32), position: (i32, i32)) -> Self {
        Self {
            name: name.to_string(),
            size: Some(size),
            position: Some(position),
        }
    }
}

/// On-screen windows of a program
pub struct Display {
    windows: Vec<WindowSpec>,
}

impl Display {
    pub fn open(windows: &[WindowSpec]) -> Result<Self, Error> {
        for w in windows {
            let flags = if w.size.is_some() {
                highgui::WINDOW_NORMAL
            } else {
                highgui::WINDOW_AUTOSIZE
            };

            highgui::named_window(&w.name, flags)?;

            if let Some((width, height)) = w.size {
                highgui::resize_window(&w.name, width, height)?;
            }

            if let Some((x, y)) = w.position {
                highgui::move_window(&w.name, x, y)?;
            }
        }

        Ok(Self {
            windows: windows.to_vec(),
        })
    }

    #[inline]
    pub fn windows(&self) -> &[WindowSpec] {
        &self.windows
    }

    pub fn show(&self, window: &str, image: &Mat) -> Result<(), Error> {
        highgui::imshow(window, image)?;
        Ok(())
    }

    /// Pumps the window events for `delay_ms` and reports whether quit was pressed
    pub fn should_quit(&self, delay_ms: i32) -> Result<bool, Error> {
        let key = highgui::wait_key(delay_ms)?;
        Ok(key >= 0 && (key & 0xFF) == QUIT_KEY)
    }

    pub fn close(&self) -> Result<(), Error> {
        highgui::destroy_all_windows()?;
        Ok(())
    }
}
