//! Rotation configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::rotation::LoopMode;

/// How the current text is cut into animatable units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SplitBy {
    /// One group per space-separated word, one element per grapheme
    #[default]
    Characters,
    /// One unit per space-separated word
    Words,
    /// One unit per line
    Lines,
    /// One unit per piece between occurrences of the delimiter
    Delimiter(String),
}

/// Reference position the per-unit stagger delay is measured from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StaggerFrom {
    #[default]
    First,
    Last,
    Center,
    /// Fresh random origin for every delay computed
    Random,
    /// Fixed origin at the given global position
    Index(usize),
}

/// Whether the container and every unit share one fixed line height.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FixedHeight {
    /// Relative to the inherited font size
    Em(f64),
    /// Absolute pixels
    Px(f64),
}

impl Default for FixedHeight {
    fn default() -> Self {
        FixedHeight::Em(1.2)
    }
}

impl FixedHeight {
    /// The raw magnitude, regardless of unit.
    pub fn value(&self) -> f64 {
        match *self {
            FixedHeight::Em(v) | FixedHeight::Px(v) => v,
        }
    }

    /// Resolve to pixels for a given font size.
    pub fn to_px(&self, font_size: f64) -> f64 {
        match *self {
            FixedHeight::Em(v) => v * font_size,
            FixedHeight::Px(v) => v,
        }
    }
}

impl fmt::Display for FixedHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixedHeight::Em(v) => write!(f, "{}em", v),
            FixedHeight::Px(v) => write!(f, "{}px", v),
        }
    }
}

/// Spring parameters handed to the host animation runtime.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
    /// Distance and speed below which the spring is considered at rest
    pub rest_delta: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::units()
    }
}

impl SpringConfig {
    /// Spring used for every unit's enter/exit transition.
    pub fn units() -> Self {
        Self {
            stiffness: 120.0,
            damping: 28.0,
            mass: 0.5,
            rest_delta: 0.001,
        }
    }

    /// Spring used to resize the container to the measured width.
    pub fn width() -> Self {
        Self {
            stiffness: 100.0,
            damping: 30.0,
            mass: 0.5,
            rest_delta: 0.001,
        }
    }

    /// Damping ratio; 1.0 is critical, above is overdamped.
    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.stiffness.is_finite()
            && self.stiffness > 0.0
            && self.mass.is_finite()
            && self.mass > 0.0
            && self.damping.is_finite()
            && self.damping >= 0.0
            && self.rest_delta >= 0.0;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::InvalidSpring)
        }
    }
}

/// Vertical offset and opacity of a unit at one end of a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitPose {
    /// Offset as a percentage of the unit's own height
    pub y_percent: f64,
    pub opacity: f64,
}

impl UnitPose {
    pub const fn new(y_percent: f64, opacity: f64) -> Self {
        Self { y_percent, opacity }
    }
}

/// Enter, rest and exit poses for units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UnitPoses {
    pub initial: UnitPose,
    pub animate: UnitPose,
    pub exit: UnitPose,
}

impl Default for UnitPoses {
    fn default() -> Self {
        Self {
            initial: UnitPose::new(100.0, 0.0),
            animate: UnitPose::new(0.0, 1.0),
            exit: UnitPose::new(-120.0, 0.0),
        }
    }
}

/// How the outgoing and incoming texts overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PresenceMode {
    /// Outgoing text finishes exiting before the next one enters
    #[default]
    Wait,
    /// Both animate at the same time
    Sync,
    /// Outgoing text is pulled out of layout immediately
    PopLayout,
}

/// Configuration for one rotating text.
///
/// ## Example
///
/// ```rust
/// use rotating_text_core::{RotationConfig, SplitBy, StaggerFrom};
///
/// let config = RotationConfig::new(["fast", "safe", "fun"])
///     .split_by(SplitBy::Characters)
///     .stagger(StaggerFrom::Last, 0.025)
///     .durations([1000, 3000]);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.duration_for(1).as_millis(), 3000);
/// assert_eq!(config.duration_for(2).as_millis(), 2000);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RotationConfig {
    /// Texts to rotate through, in order
    pub texts: Vec<String>,
    pub split_by: SplitBy,
    pub loop_mode: LoopMode,
    /// Advance automatically on a timer
    pub auto: bool,
    /// Time each text stays up unless overridden, in milliseconds
    pub rotation_interval_ms: u64,
    /// Sparse per-index overrides of the rotation interval, in milliseconds
    #[cfg_attr(feature = "serde", serde(with = "index_keys"))]
    pub duration_overrides_ms: BTreeMap<usize, u64>,
    pub stagger_from: StaggerFrom,
    /// Delay added per unit of distance from the stagger origin
    pub stagger_duration: f64,
    pub fixed_height: FixedHeight,
    pub transition: SpringConfig,
    pub width_transition: SpringConfig,
    pub poses: UnitPoses,
    pub presence_mode: PresenceMode,
    /// Animate the very first text in, instead of mounting it at rest
    pub presence_initial: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            texts: Vec::new(),
            split_by: SplitBy::default(),
            loop_mode: LoopMode::Loop,
            auto: true,
            rotation_interval_ms: 2000,
            duration_overrides_ms: BTreeMap::new(),
            stagger_from: StaggerFrom::default(),
            stagger_duration: 0.0,
            fixed_height: FixedHeight::default(),
            transition: SpringConfig::units(),
            width_transition: SpringConfig::width(),
            poses: UnitPoses::default(),
            presence_mode: PresenceMode::default(),
            presence_initial: false,
        }
    }
}

impl RotationConfig {
    /// Create a config for the given texts with every other option at its default.
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Parse a TOML config. Missing keys take their defaults.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the segmentation strategy.
    pub fn split_by(mut self, split_by: SplitBy) -> Self {
        self.split_by = split_by;
        self
    }

    /// Set the loop mode.
    pub fn loop_mode(mut self, mode: LoopMode) -> Self {
        self.loop_mode = mode;
        self
    }

    /// Enable or disable auto-advance.
    pub fn auto(mut self, auto: bool) -> Self {
        self.auto = auto;
        self
    }

    /// Set the default interval between texts.
    pub fn rotation_interval_ms(mut self, ms: u64) -> Self {
        self.rotation_interval_ms = ms;
        self
    }

    /// Override the interval for a single index.
    pub fn duration_override(mut self, index: usize, ms: u64) -> Self {
        self.duration_overrides_ms.insert(index, ms);
        self
    }

    /// Override intervals positionally: entry `i` applies to text `i`.
    pub fn durations<I: IntoIterator<Item = u64>>(mut self, durations: I) -> Self {
        self.duration_overrides_ms = durations.into_iter().enumerate().collect();
        self
    }

    /// Set the stagger origin and the delay step between pieces.
    pub fn stagger(mut self, from: StaggerFrom, duration: f64) -> Self {
        self.stagger_from = from;
        self.stagger_duration = duration;
        self
    }

    /// Set the line height of the container.
    pub fn fixed_height(mut self, height: FixedHeight) -> Self {
        self.fixed_height = height;
        self
    }

    /// Set the spring used for unit transitions.
    pub fn transition(mut self, spring: SpringConfig) -> Self {
        self.transition = spring;
        self
    }

    /// Set the presence mode and whether the first text animates in.
    pub fn presence(mut self, mode: PresenceMode, initial: bool) -> Self {
        self.presence_mode = mode;
        self.presence_initial = initial;
        self
    }

    /// Number of texts.
    #[inline]
    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    /// How long the text at `index` stays up before auto-advance.
    pub fn duration_for(&self, index: usize) -> Duration {
        let ms = self
            .duration_overrides_ms
            .get(&index)
            .copied()
            .unwrap_or(self.rotation_interval_ms);
        Duration::from_millis(ms)
    }

    /// Check the config can drive a rotation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.texts.is_empty() {
            return Err(ConfigError::EmptyTexts);
        }
        if !self.stagger_duration.is_finite() || self.stagger_duration < 0.0 {
            return Err(ConfigError::InvalidStagger(self.stagger_duration));
        }
        let height = self.fixed_height.value();
        if !height.is_finite() || height <= 0.0 {
            return Err(ConfigError::InvalidHeight(height));
        }
        self.transition.validate()?;
        self.width_transition.validate()
    }
}

/// TOML tables only have string keys, so overrides are written as `"1" = 3000`.
#[cfg(feature = "serde")]
mod index_keys {
    use std::collections::BTreeMap;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(map: &BTreeMap<usize, u64>, s: S) -> Result<S::Ok, S::Error> {
        map.iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<String, u64>>()
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<usize, u64>, D::Error> {
        BTreeMap::<String, u64>::deserialize(d)?
            .into_iter()
            .map(|(k, v)| {
                k.trim()
                    .parse::<usize>()
                    .map(|k| (k, v))
                    .map_err(|_| D::Error::custom(format!("invalid text index {:?}", k)))
            })
            .collect()
    }
}
