use serde::{Deserialize, Serialize};

use crate::align::AlignmentMethod;
use crate::detection::StarDetectionConfig;
use crate::filters::ToneSettings;
use crate::postprocess::StarRemovalConfig;
use crate::resample::Interpolation;
use crate::stack::CombineMode;

/// Full configuration of a stacking job.
///
/// Every section has defaults, so an empty TOML document is a valid config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default)]
    pub alignment: AlignmentMethod,
    #[serde(default)]
    pub combine: CombineMode,
    #[serde(default)]
    pub detection: StarDetectionConfig,
    #[serde(default)]
    pub interpolation: Interpolation,
    /// Remove stars from the stacked result.
    #[serde(default)]
    pub star_removal: Option<StarRemovalConfig>,
    /// Tone-map the stacked result.
    #[serde(default)]
    pub tone: Option<ToneSettings>,
}
