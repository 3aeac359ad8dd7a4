use crate::error::Error;

use opencv::{core, prelude::*, video};
use serde_derive::{Deserialize, Serialize};
use tracing::info;

/// Background model used to produce the foreground mask
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SubtractorKind {
    Mog2 {
        #[serde(default = "default_history")]
        history: i32,
        #[serde(default = "default_var_threshold")]
        var_threshold: f64,
        #[serde(default = "default_shadows")]
        detect_shadows: bool,
    },
    Knn {
        #[serde(default = "default_history")]
        history: i32,
        #[serde(default = "default_dist2_threshold")]
        dist2_threshold: f64,
        #[serde(default = "default_shadows")]
        detect_shadows: bool,
    },
    Gmg,
    Mog,
    Cnt,
}

fn default_history() -> i32 {
    500
}

fn default_var_threshold() -> f64 {
    16.0
}

fn default_dist2_threshold() -> f64 {
    400.0
}

fn default_shadows() -> bool {
    true
}

impl SubtractorKind {
    pub fn mog2() -> Self {
        SubtractorKind::Mog2 {
            history: default_history(),
            var_threshold: default_var_threshold(),
            detect_shadows: default_shadows(),
        }
    }

    pub fn knn() -> Self {
        SubtractorKind::Knn {
            history: default_history(),
            dist2_threshold: default_dist2_threshold(),
            detect_shadows: default_shadows(),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            SubtractorKind::Mog2 { .. } => "MOG2",
            SubtractorKind::Knn { .. } => "KNN",
            SubtractorKind::Gmg => "GMG",
            SubtractorKind::Mog => "MOG",
            SubtractorKind::Cnt => "CNT",
        }
    }
}

impl Default for SubtractorKind {
    fn default() -> Self {
        Self::mog2()
    }
}

enum Model {
    Mog2(core::Ptr<dyn video::BackgroundSubtractorMOG2>),
    Knn(core::Ptr<dyn video::BackgroundSubtractorKNN>),
    #[cfg(feature = "contrib")]
    Gmg(core::Ptr<dyn opencv::bgsegm::BackgroundSubtractorGMG>),
    #[cfg(feature = "contrib")]
    Mog(core::Ptr<dyn opencv::bgsegm::BackgroundSubtractorMOG>),
    #[cfg(feature = "contrib")]
    Cnt(core::Ptr<dyn opencv::bgsegm::BackgroundSubtractorCNT>),
}

pub struct Subtractor {
    model: Model,
    name: &'static str,
}

impl Subtractor {
    pub fn new(kind: &SubtractorKind) -> Result<Self, Error> {
        let model = match *kind {
            SubtractorKind::Mog2 {
                history,
                var_threshold,
                detect_shadows,
            } => Model::Mog2(video::create_background_subtractor_mog2(
                history,
                var_threshold,
                detect_shadows,
            )?),

            SubtractorKind::Knn {
                history,
                dist2_threshold,
                detect_shadows,
            } => Model::Knn(video::create_background_subtractor_knn(
                history,
                dist2_threshold,
                detect_shadows,
            )?),

            #[cfg(feature = "contrib")]
            SubtractorKind::Gmg => {
                Model::Gmg(opencv::bgsegm::create_background_subtractor_gmg(120, 0.8)?)
            }

            #[cfg(feature = "contrib")]
            SubtractorKind::Mog => {
                Model::Mog(opencv::bgsegm::create_background_subtractor_mog(200, 5, 0.7, 0.0)?)
            }

            #[cfg(feature = "contrib")]
            SubtractorKind::Cnt => Model::Cnt(opencv::bgsegm::create_background_subtractor_cnt(
                15,
                true,
                15 * 60,
                true,
            )?),

            #[cfg(not(feature = "contrib"))]
            SubtractorKind::Gmg | SubtractorKind::Mog | SubtractorKind::Cnt => {
                tracing::warn!(
                    "{} subtractor needs the `contrib` feature, falling back to MOG2",
                    kind.name()
                );

                return Self::new(&SubtractorKind::mog2());
            }
        };

        info!("background subtractor: {}", kind.name());

        Ok(Self {
            model,
            name: kind.name(),
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Feeds a frame into the background model and returns its foreground mask
    pub fn apply(&mut self, frame: &core::Mat) -> Result<core::Mat, Error> {
        let mut mask = core::Mat::default();

        match &mut self.model {
            Model::Mog2(m) => m.apply(frame, &mut mask, -1.0)?,
            Model::Knn(m) => m.apply(frame, &mut mask, -1.0)?,
            #[cfg(feature = "contrib")]
            Model::Gmg(m) => m.apply(frame, &mut mask, -1.0)?,
            #[cfg(feature = "contrib")]
            Model::Mog(m) => m.apply(frame, &mut mask, -1.0)?,
            #[cfg(feature = "contrib")]
            Model::Cnt(m) => m.apply(frame, &mut mask, -1.0)?,
        }

        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::{Subtractor, SubtractorKind};

    #[test]
    fn kind_defaults_fill_missing_fields() {
        let kind: SubtractorKind = serde_yaml::from_str("kind: mog2\nvar_threshold: 100\n").unwrap();
        assert_eq!(
            kind,
            SubtractorKind::Mog2 {
                history: 500,
                var_threshold: 100.0,
                detect_shadows: true
            }
        );

        let kind: SubtractorKind = serde_yaml::from_str("kind: gmg").unwrap();
        assert_eq!(kind, SubtractorKind::Gmg);
        assert_eq!(kind.name(), "GMG");
    }

    #[test]
    fn subtractor_reports_model_in_use() {
        let s = Subtractor::new(&SubtractorKind::knn()).unwrap();
        assert_eq!(s.name(), "KNN");

        let s = Subtractor::new(&SubtractorKind::Mog).unwrap();
        if cfg!(feature = "contrib") {
            assert_eq!(s.name(), "MOG");
        } else {
            assert_eq!(s.name(), "MOG2");
        }
    }
}
