//! Scroll-gated floating action buttons.

/// Scroll offset past which the buttons appear.
pub const DEFAULT_SCROLL_THRESHOLD: f64 = 300.0;

/// Tracks whether the page has scrolled far enough to show the overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollVisibility {
    threshold: f64,
    visible: bool,
}

impl Default for ScrollVisibility {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_THRESHOLD)
    }
}

impl ScrollVisibility {
    /// Create a hidden tracker that shows past `threshold`.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            visible: false,
        }
    }

    /// Whether the overlay is shown.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Feed the current vertical scroll offset. Returns true if visibility flipped.
    pub fn update(&mut self, scroll_y: f64) -> bool {
        let visible = scroll_y > self.threshold;
        if visible == self.visible {
            return false;
        }
        self.visible = visible;
        true
    }
}

/// Style the host applies to the overlay container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub opacity: f64,
    /// Downward offset in pixels while hidden
    pub translate_y: f64,
    /// Whether the buttons receive pointer events
    pub interactive: bool,
}

/// Two floating buttons: report and radio.
///
/// Clicks are dropped while the overlay is hidden, matching its disabled
/// pointer events.
///
/// ## Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use rotating_text_core::overlay::FloatingActions;
///
/// let reports = Rc::new(Cell::new(0));
/// let counter = Rc::clone(&reports);
/// let mut buttons = FloatingActions::new(move || counter.set(counter.get() + 1), || {});
///
/// buttons.click_report();
/// assert_eq!(reports.get(), 0);
///
/// buttons.on_scroll(400.0);
/// buttons.click_report();
/// assert_eq!(reports.get(), 1);
/// ```
pub struct FloatingActions {
    on_report: Box<dyn FnMut()>,
    on_radio: Box<dyn FnMut()>,
    /// Whether the report modal is open; highlights the report button
    pub report_open: bool,
    visibility: ScrollVisibility,
}

impl FloatingActions {
    /// Create the pair with its click callbacks, hidden until scrolled.
    pub fn new(on_report: impl FnMut() + 'static, on_radio: impl FnMut() + 'static) -> Self {
        Self {
            on_report: Box::new(on_report),
            on_radio: Box::new(on_radio),
            report_open: false,
            visibility: ScrollVisibility::default(),
        }
    }

    /// Use a custom scroll threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.visibility = ScrollVisibility::new(threshold);
        self
    }

    /// Whether the buttons are shown.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    /// Returns true if visibility flipped.
    pub fn on_scroll(&mut self, scroll_y: f64) -> bool {
        self.visibility.update(scroll_y)
    }

    /// Get the container style for the current visibility.
    pub fn style(&self) -> OverlayStyle {
        if self.is_visible() {
            OverlayStyle {
                opacity: 1.0,
                translate_y: 0.0,
                interactive: true,
            }
        } else {
            OverlayStyle {
                opacity: 0.0,
                translate_y: 16.0,
                interactive: false,
            }
        }
    }

    /// Opacity of the report button at rest.
    pub fn report_opacity(&self) -> f64 {
        if self.report_open {
            1.0
        } else {
            0.7
        }
    }

    /// Handle a click on the report button. Returns true if it ran.
    pub fn click_report(&mut self) -> bool {
        if !self.is_visible() {
            return false;
        }
        (self.on_report)();
        true
    }

    /// Handle a click on the radio button. Returns true if it ran.
    pub fn click_radio(&mut self) -> bool {
        if !self.is_visible() {
            return false;
        }
        (self.on_radio)();
        true
    }
}
