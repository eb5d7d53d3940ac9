//! Per-unit stagger delays.

use rand::Rng;

use crate::config::StaggerFrom;

impl StaggerFrom {
    /// Delay before the piece at `position` starts its enter transition.
    ///
    /// `total` counts every piece of the current text. The result is never
    /// negative. [`StaggerFrom::Random`] draws a new origin on every call.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use rotating_text_core::StaggerFrom;
    ///
    /// assert_eq!(StaggerFrom::First.delay(3, 5, 0.5), 1.5);
    /// assert_eq!(StaggerFrom::Last.delay(3, 5, 0.5), 0.5);
    /// assert_eq!(StaggerFrom::Center.delay(0, 5, 1.0), 2.0);
    /// ```
    pub fn delay(&self, position: usize, total: usize, unit_delay: f64) -> f64 {
        self.delay_with(position, total, unit_delay, &mut rand::rng())
    }

    /// Same as [`StaggerFrom::delay`], drawing random origins from `rng`.
    pub fn delay_with<R: Rng + ?Sized>(
        &self,
        position: usize,
        total: usize,
        unit_delay: f64,
        rng: &mut R,
    ) -> f64 {
        let origin = match *self {
            StaggerFrom::First => 0,
            StaggerFrom::Last => total.saturating_sub(1),
            StaggerFrom::Center => total / 2,
            StaggerFrom::Random if total == 0 => 0,
            StaggerFrom::Random => rng.random_range(0..total),
            StaggerFrom::Index(k) => k,
        };
        origin.abs_diff(position) as f64 * unit_delay.max(0.0)
    }
}
