//! Container width measurement and smoothing.

use std::time::Duration;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::SpringConfig;

/// Measures the rendered width of a string.
///
/// Implementations use an invisible element styled like the visible text.
/// Return `None` while the probe is unavailable (not mounted yet); the
/// width is then left untouched until the next successful measurement.
pub trait TextProbe {
    fn measure(&mut self, text: &str) -> Option<f64>;
}

/// Width estimate for monospace text without a layout engine.
///
/// Useful for terminals and tests: every grapheme is `char_width_ratio`
/// times the font size wide.
#[derive(Clone, Debug)]
pub struct MonospaceProbe {
    /// Font size in pixels
    pub font_size: f64,
    /// Character width as a ratio of font size (typically 0.6 for monospace)
    pub char_width_ratio: f64,
}

impl Default for MonospaceProbe {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            char_width_ratio: 0.6,
        }
    }
}

impl MonospaceProbe {
    /// Create a probe for `font_size` pixels with the default ratio.
    pub fn new(font_size: f64) -> Self {
        Self {
            font_size,
            ..Self::default()
        }
    }

    /// Width of a single character cell in pixels.
    #[inline]
    pub fn char_width(&self) -> f64 {
        self.font_size * self.char_width_ratio
    }
}

impl TextProbe for MonospaceProbe {
    fn measure(&mut self, text: &str) -> Option<f64> {
        Some(text.graphemes(true).count() as f64 * self.char_width())
    }
}

/// A resize of the container from one width to another.
///
/// `from == to` means the container jumps to `to` with no motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthTransition {
    pub from: f64,
    pub to: f64,
    pub spring: SpringConfig,
}

impl WidthTransition {
    /// Whether this is an immediate jump rather than an animation.
    #[inline]
    pub fn is_snap(&self) -> bool {
        self.from == self.to
    }
}

/// Spring integrator for the container width.
///
/// Hosts with their own spring animation can ignore this and use the
/// [`WidthTransition`] directly; others call [`WidthSpring::tick`] once per
/// frame.
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use rotating_text_core::{SpringConfig, WidthSpring};
///
/// let mut spring = WidthSpring::new(0.0, SpringConfig::width());
/// spring.set_target(120.0);
/// for _ in 0..400 {
///     spring.tick(Duration::from_millis(16));
/// }
/// assert!(spring.is_settled());
/// assert_eq!(spring.current(), 120.0);
/// ```
#[derive(Clone, Debug)]
pub struct WidthSpring {
    current: f64,
    target: f64,
    velocity: f64,
    config: SpringConfig,
    settled: bool,
}

impl WidthSpring {
    /// Create a spring resting at `initial`.
    pub fn new(initial: f64, config: SpringConfig) -> Self {
        Self {
            current: initial,
            target: initial,
            velocity: 0.0,
            config,
            settled: true,
        }
    }

    /// Retarget the spring, keeping its current motion.
    pub fn set_target(&mut self, target: f64) {
        if target != self.target {
            self.target = target;
            self.settled = false;
        }
    }

    /// Jump straight to `value` with no motion.
    pub fn snap_to(&mut self, value: f64) {
        self.current = value;
        self.target = value;
        self.velocity = 0.0;
        self.settled = true;
    }

    /// Width the spring is heading for.
    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Width at the last tick, never negative.
    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Whether the spring is at rest on its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Advance the spring by `delta` and return the new width.
    pub fn tick(&mut self, delta: Duration) -> f64 {
        if self.settled {
            return self.current;
        }

        let dt = delta.as_secs_f64();
        let displacement = self.current - self.target;

        // F = -kx - cv
        let spring_force = -self.config.stiffness * displacement;
        let damping_force = -self.config.damping * self.velocity;
        let acceleration = (spring_force + damping_force) / self.config.mass;

        // Semi-implicit Euler
        self.velocity += acceleration * dt;
        self.current += self.velocity * dt;

        // A width cannot go negative, even when an underdamped spring overshoots
        if self.current < 0.0 {
            self.current = 0.0;
            self.velocity = self.velocity.max(0.0);
        }

        let rest = self.config.rest_delta;
        if (self.current - self.target).abs() < rest && self.velocity.abs() < rest {
            self.snap_to(self.target);
        }

        self.current
    }
}

/// Keeps the container width in step with the current text.
#[derive(Clone, Debug)]
pub struct WidthSync {
    width: f64,
    measured: bool,
    spring: WidthSpring,
}

impl WidthSync {
    /// Start unmeasured at width zero.
    pub fn new(spring: SpringConfig) -> Self {
        Self {
            width: 0.0,
            measured: false,
            spring: WidthSpring::new(0.0, spring),
        }
    }

    /// Last successfully measured width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Whether any measurement has succeeded yet.
    #[inline]
    pub fn is_measured(&self) -> bool {
        self.measured
    }

    /// The built-in spring following the measured width.
    #[inline]
    pub fn spring(&self) -> &WidthSpring {
        &self.spring
    }

    /// Measure `text` and retarget the container.
    ///
    /// Returns the resize to apply, or `None` when the width is unchanged
    /// or the probe could not measure. The first successful measurement,
    /// whenever it happens, is a snap (`from == to`) instead of an
    /// animation from zero.
    pub fn remeasure<P: TextProbe + ?Sized>(
        &mut self,
        probe: &mut P,
        text: &str,
    ) -> Option<WidthTransition> {
        let width = match probe.measure(text) {
            Some(w) if w.is_finite() && w >= 0.0 => w,
            Some(w) => {
                log::warn!("discarding invalid width {} for {:?}", w, text);
                return None;
            }
            None => {
                log::warn!("text probe unavailable, keeping width {}", self.width);
                return None;
            }
        };

        if !self.measured {
            self.measured = true;
            self.width = width;
            self.spring.snap_to(width);
            log::debug!("initial width {}", width);
            return Some(WidthTransition {
                from: width,
                to: width,
                spring: self.spring.config,
            });
        }
        if width == self.width {
            return None;
        }

        let from = self.spring.current();
        self.width = width;
        self.spring.set_target(width);
        log::debug!("width {} -> {}", from, width);
        Some(WidthTransition {
            from,
            to: width,
            spring: self.spring.config,
        })
    }

    /// Advance the built-in spring and return the width to display.
    pub fn tick(&mut self, delta: Duration) -> f64 {
        self.spring.tick(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unmounted;

    impl TextProbe for Unmounted {
        fn measure(&mut self, _text: &str) -> Option<f64> {
            None
        }
    }

    struct Broken;

    impl TextProbe for Broken {
        fn measure(&mut self, _text: &str) -> Option<f64> {
            Some(f64::NAN)
        }
    }

    #[test]
    fn monospace_width() {
        let mut probe = MonospaceProbe::new(10.0);
        assert_eq!(probe.measure("abcd"), Some(24.0));
        assert_eq!(probe.measure("e\u{301}"), Some(6.0));
        assert_eq!(probe.measure(""), Some(0.0));
    }

    #[test]
    fn first_measure_snaps() {
        let mut sync = WidthSync::new(SpringConfig::width());
        let mut probe = MonospaceProbe::new(10.0);
        let t = sync.remeasure(&mut probe, "abc").unwrap();
        assert!(t.is_snap());
        assert_eq!(t.to, 18.0);
        assert!(sync.is_measured());
        assert_eq!(sync.width(), 18.0);
        assert_eq!(sync.spring().current(), 18.0);
    }

    #[test]
    fn change_produces_transition() {
        let mut sync = WidthSync::new(SpringConfig::width());
        let mut probe = MonospaceProbe::new(10.0);
        sync.remeasure(&mut probe, "abc");

        let t = sync.remeasure(&mut probe, "abcdef").unwrap();
        assert_eq!(t.from, 18.0);
        assert_eq!(t.to, 36.0);
        assert_eq!(t.spring, SpringConfig::width());

        // Same width again is not a change
        assert_eq!(sync.remeasure(&mut probe, "uvwxyz"), None);
    }

    #[test]
    fn unavailable_probe_keeps_width() {
        let mut sync = WidthSync::new(SpringConfig::width());
        let mut probe = MonospaceProbe::new(10.0);
        sync.remeasure(&mut probe, "abc");

        assert_eq!(sync.remeasure(&mut Unmounted, "abcdef"), None);
        assert_eq!(sync.remeasure(&mut Broken, "abcdef"), None);
        assert_eq!(sync.width(), 18.0);
    }

    #[test]
    fn unmounted_probe_defers_first_measure() {
        let mut sync = WidthSync::new(SpringConfig::width());
        assert_eq!(sync.remeasure(&mut Unmounted, "abc"), None);
        assert!(!sync.is_measured());
        assert_eq!(sync.width(), 0.0);

        // The deferred first measurement is still reported, as a snap
        let t = sync.remeasure(&mut MonospaceProbe::new(10.0), "abcdef").unwrap();
        assert!(t.is_snap());
        assert_eq!(t.to, 36.0);
        assert_eq!(sync.spring().current(), 36.0);
    }

    #[test]
    fn spring_approaches_without_snapping() {
        let mut spring = WidthSpring::new(0.0, SpringConfig::width());
        spring.set_target(100.0);

        let first = spring.tick(Duration::from_millis(16));
        assert!(first > 0.0 && first < 100.0);

        let mut last = first;
        for _ in 0..120 {
            let w = spring.tick(Duration::from_millis(16));
            // Overdamped: monotonic, never past the target
            assert!(w >= last && w <= 100.0);
            last = w;
        }
    }

    #[test]
    fn spring_settles_on_target() {
        let mut spring = WidthSpring::new(50.0, SpringConfig::width());
        spring.set_target(10.0);
        for _ in 0..600 {
            spring.tick(Duration::from_millis(16));
        }
        assert!(spring.is_settled());
        assert_eq!(spring.current(), 10.0);
    }

    #[test]
    fn underdamped_spring_never_goes_negative() {
        let bouncy = SpringConfig {
            damping: 2.0,
            ..SpringConfig::width()
        };
        let mut spring = WidthSpring::new(100.0, bouncy);
        spring.set_target(0.0);
        for _ in 0..600 {
            let w = spring.tick(Duration::from_millis(16));
            assert!(w >= 0.0);
            assert!(spring.current() >= 0.0);
        }
    }
}
