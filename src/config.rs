//! Per-class overrides for features that the host draws itself.

use glam::Mat3;
use std::collections::HashMap;

/// Replaces the vector drawing of every feature with a matching class name.
///
/// The host renders its own content in the feature's coordinate space; the
/// optional `matrix` is concatenated on top of the feature matrix first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureConfig {
    pub matrix: Option<Mat3>,
}

impl FeatureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matrix(matrix: Mat3) -> Self {
        Self {
            matrix: Some(matrix),
        }
    }

    /// The extra matrix, unless it is absent or the identity.
    pub fn effective_matrix(&self) -> Option<&Mat3> {
        self.matrix.as_ref().filter(|m| **m != Mat3::IDENTITY)
    }
}

/// Side table of [`FeatureConfig`]s keyed by feature class name.
#[derive(Debug, Clone, Default)]
pub struct FeatureConfigs {
    by_class: HashMap<String, FeatureConfig>,
}

impl FeatureConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class_name: impl Into<String>, config: FeatureConfig) {
        self.by_class.insert(class_name.into(), config);
    }

    pub fn get(&self, class_name: Option<&str>) -> Option<&FeatureConfig> {
        class_name.and_then(|c| self.by_class.get(c))
    }

    pub fn contains(&self, class_name: Option<&str>) -> bool {
        self.get(class_name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FeatureConfig)> for FeatureConfigs {
    fn from_iter<I: IntoIterator<Item = (S, FeatureConfig)>>(iter: I) -> Self {
        Self {
            by_class: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
