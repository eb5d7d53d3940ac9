//! Render plans for the host animation runtime.

use rand::Rng;

use crate::config::{FixedHeight, PresenceMode, RotationConfig, SplitBy, SpringConfig, UnitPoses};
use crate::segment::Segmentation;
use crate::sizing::WidthTransition;

/// Fade duration of the whole-text wrapper between texts.
pub const WRAPPER_FADE: f64 = 0.2;

/// How units are laid out inside the container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Units flow on one line, spaced where needed
    Inline,
    /// Each unit on its own line
    Lines,
}

/// One animated piece with its own enter delay.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderElement {
    /// Index of the owning unit; the host groups elements by it
    pub group: usize,
    /// Index inside the group; `(group, index)` is the element's key
    pub index: usize,
    /// Global position across the text
    pub position: usize,
    pub text: String,
    /// Delay before the enter transition starts
    pub delay: f64,
    /// Render a space after this element (last element of a spaced group)
    pub space_after: bool,
}

/// Everything the host needs to mount one text.
///
/// This is a platform-agnostic description: the host keys the frame by
/// [`RenderFrame::key`], unmounts the previous key with the exit pose and
/// mounts this one, starting every element's enter transition after its
/// own delay. Elements never wait on each other.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    /// Text index; a new key means a new text
    pub key: usize,
    /// Full text for assistive technology
    pub text: String,
    pub layout: Layout,
    pub height: FixedHeight,
    pub presence: PresenceMode,
    /// False only for a first frame that should mount at rest
    pub animate_enter: bool,
    pub poses: UnitPoses,
    pub transition: SpringConfig,
    /// Cross-fade of the whole text wrapper
    pub wrapper_fade: f64,
    pub elements: Vec<RenderElement>,
}

impl RenderFrame {
    /// Longest enter delay in the frame.
    pub fn max_delay(&self) -> f64 {
        self.elements.iter().map(|e| e.delay).fold(0.0, f64::max)
    }
}

/// The host side of the animation contract.
///
/// `present` mounts a new frame, `animate_width` springs the container to
/// a newly measured width.
pub trait Presenter {
    fn present(&mut self, frame: &RenderFrame);

    fn animate_width(&mut self, transition: &WidthTransition) {
        let _ = transition;
    }
}

/// Build the render frame for text `key`.
///
/// ## Example
///
/// ```rust
/// use rotating_text_core::{RotationConfig, Segmentation, StaggerFrom};
/// use rotating_text_core::render::render_frame;
///
/// let config = RotationConfig::new(["ab cd"]).stagger(StaggerFrom::First, 0.5);
/// let seg = Segmentation::split("ab cd", &config.split_by);
/// let frame = render_frame(0, "ab cd", &seg, &config, true);
///
/// let delays: Vec<f64> = frame.elements.iter().map(|e| e.delay).collect();
/// assert_eq!(delays, vec![0.0, 0.5, 1.0, 1.5]);
/// assert!(frame.elements[1].space_after);
/// ```
pub fn render_frame(
    key: usize,
    text: &str,
    segmentation: &Segmentation,
    config: &RotationConfig,
    animate_enter: bool,
) -> RenderFrame {
    render_frame_with(key, text, segmentation, config, animate_enter, &mut rand::rng())
}

/// Same as [`render_frame`], drawing random stagger origins from `rng`.
pub fn render_frame_with<R: Rng + ?Sized>(
    key: usize,
    text: &str,
    segmentation: &Segmentation,
    config: &RotationConfig,
    animate_enter: bool,
    rng: &mut R,
) -> RenderFrame {
    let total = segmentation.total();
    let units = segmentation.units();
    let elements = segmentation
        .elements()
        .map(|e| {
            let unit = &units[e.group];
            RenderElement {
                group: e.group,
                index: e.index,
                position: e.position,
                text: e.text.to_string(),
                delay: config
                    .stagger_from
                    .delay_with(e.position, total, config.stagger_duration, &mut *rng),
                space_after: unit.needs_space && e.index + 1 == unit.len(),
            }
        })
        .collect();

    RenderFrame {
        key,
        text: text.to_string(),
        layout: match config.split_by {
            SplitBy::Lines => Layout::Lines,
            _ => Layout::Inline,
        },
        height: config.fixed_height,
        presence: config.presence_mode,
        animate_enter,
        poses: config.poses,
        transition: config.transition,
        wrapper_fade: WRAPPER_FADE,
        elements,
    }
}

/// Web-specific host implementation.
#[cfg(feature = "web")]
pub mod web {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    use js_sys::Function;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{HtmlElement, Window};

    use super::{Presenter, RenderFrame};
    use crate::config::FixedHeight;
    use crate::sizing::{TextProbe, WidthTransition};
    use crate::timer::{TimerHost, TimerId};

    /// Hidden element, styled like the visible text, used to measure widths.
    #[derive(Debug, Default)]
    pub struct DomProbe {
        element: Option<HtmlElement>,
    }

    impl DomProbe {
        /// Create a probe that is not mounted yet. Measuring returns `None`.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a hidden probe inside `parent`, inheriting its font.
        pub fn mount(parent: &HtmlElement, height: FixedHeight) -> Result<Self, String> {
            let window = web_sys::window().ok_or("No window available")?;
            let document = window.document().ok_or("No document available")?;
            let element = document
                .create_element("div")
                .map_err(|_| "Failed to create probe element")?
                .dyn_into::<HtmlElement>()
                .map_err(|_| "Failed to cast probe to HtmlElement")?;

            let height = height.to_string();
            let style = element.style();
            for (name, value) in [
                ("position", "absolute"),
                ("visibility", "hidden"),
                ("white-space", "nowrap"),
                ("font-size", "inherit"),
                ("font-family", "inherit"),
                ("font-weight", "inherit"),
                ("pointer-events", "none"),
                ("height", height.as_str()),
                ("line-height", height.as_str()),
            ] {
                style
                    .set_property(name, value)
                    .map_err(|_| "Failed to style probe element")?;
            }

            parent
                .append_child(&element)
                .map_err(|_| "Failed to attach probe element")?;
            Ok(Self {
                element: Some(element),
            })
        }

        /// Detach the probe from the document.
        pub fn unmount(&mut self) {
            if let Some(element) = self.element.take() {
                element.remove();
            }
        }
    }

    impl TextProbe for DomProbe {
        fn measure(&mut self, text: &str) -> Option<f64> {
            let element = self.element.as_ref()?;
            if !element.is_connected() {
                return None;
            }
            element.set_text_content(Some(text));
            Some(element.get_bounding_client_rect().width())
        }
    }

    /// Shared slot for the callback that receives fired timers.
    #[derive(Clone, Default)]
    pub struct TimerConnector {
        sink: Rc<RefCell<Option<Rc<dyn Fn(TimerId)>>>>,
    }

    impl TimerConnector {
        /// Route fired timers to `sink`, usually `RotatingText::timer_callback`.
        pub fn connect(&self, sink: impl Fn(TimerId) + 'static) {
            *self.sink.borrow_mut() = Some(Rc::new(sink));
        }
    }

    /// [`TimerHost`] over `window.setTimeout`.
    pub struct WindowTimers {
        window: Window,
        connector: TimerConnector,
        closures: HashMap<i32, Closure<dyn FnMut()>>,
        fired: Rc<RefCell<Vec<i32>>>,
    }

    impl WindowTimers {
        /// Create timers bound to the global window.
        pub fn new() -> Result<Self, String> {
            let window = web_sys::window().ok_or("No window available")?;
            Ok(Self {
                window,
                connector: TimerConnector::default(),
                closures: HashMap::new(),
                fired: Rc::default(),
            })
        }

        /// Handle used to connect the fired-timer callback after construction.
        pub fn connector(&self) -> TimerConnector {
            self.connector.clone()
        }

        /// Release closures of timers that already ran.
        fn prune(&mut self) {
            for handle in self.fired.borrow_mut().drain(..) {
                self.closures.remove(&handle);
            }
        }
    }

    impl TimerHost for WindowTimers {
        fn set_timeout(&mut self, delay: Duration) -> Option<TimerId> {
            self.prune();

            let handle_cell = Rc::new(Cell::new(0));
            let closure = {
                let handle_cell = Rc::clone(&handle_cell);
                let fired = Rc::clone(&self.fired);
                let sink = Rc::clone(&self.connector.sink);
                Closure::wrap(Box::new(move || {
                    let handle = handle_cell.get();
                    fired.borrow_mut().push(handle);
                    let sink = sink.borrow().clone();
                    match sink {
                        Some(sink) => sink(TimerId(handle as u32 as u64)),
                        None => log::warn!("timer {} fired with no receiver", handle),
                    }
                }) as Box<dyn FnMut()>)
            };

            let ms = delay.as_millis().min(i32::MAX as u128) as i32;
            match self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref::<Function>(),
                    ms,
                ) {
                Ok(handle) => {
                    handle_cell.set(handle);
                    self.closures.insert(handle, closure);
                    Some(TimerId(handle as u32 as u64))
                }
                Err(err) => {
                    log::warn!("setTimeout failed: {:?}", err);
                    None
                }
            }
        }

        fn clear_timeout(&mut self, id: TimerId) {
            self.prune();
            let handle = id.0 as u32 as i32;
            self.window.clear_timeout_with_handle(handle);
            self.closures.remove(&handle);
        }
    }

    impl Drop for WindowTimers {
        fn drop(&mut self) {
            for handle in self.closures.keys() {
                self.window.clear_timeout_with_handle(*handle);
            }
        }
    }

    /// Passive `resize` listener on the window, removed on drop.
    pub struct ResizeSubscription {
        window: Window,
        closure: Closure<dyn FnMut()>,
    }

    impl ResizeSubscription {
        /// Start listening; `on_resize` runs on every window resize.
        pub fn new(on_resize: impl FnMut() + 'static) -> Result<Self, String> {
            let window = web_sys::window().ok_or("No window available")?;
            let closure = Closure::wrap(Box::new(on_resize) as Box<dyn FnMut()>);
            window
                .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref::<Function>())
                .map_err(|_| "Failed to listen for resize")?;
            Ok(Self { window, closure })
        }
    }

    impl Drop for ResizeSubscription {
        fn drop(&mut self) {
            let _ = self
                .window
                .remove_event_listener_with_callback("resize", self.closure.as_ref().unchecked_ref());
        }
    }

    /// Write a container width into an element's inline style.
    pub fn apply_container_width(element: &HtmlElement, width: f64) -> Result<(), String> {
        element
            .style()
            .set_property("width", &format!("{:.2}px", width.max(0.0)))
            .map_err(|_| "Failed to set container width".to_string())
    }

    /// Browser host: DOM probe, window timers and a caller-provided presenter.
    ///
    /// Tie the resize listener to the rotation with
    /// `text.listen_resize(ResizeSubscription::new)`, so it is removed when
    /// the rotation is dropped, and connect fired timers with
    /// `timers.connector().connect(text.timer_callback())`.
    pub struct WebHost<P> {
        pub probe: DomProbe,
        pub timers: WindowTimers,
        pub presenter: P,
    }

    impl<P> TextProbe for WebHost<P> {
        fn measure(&mut self, text: &str) -> Option<f64> {
            self.probe.measure(text)
        }
    }

    impl<P> TimerHost for WebHost<P> {
        fn set_timeout(&mut self, delay: Duration) -> Option<TimerId> {
            self.timers.set_timeout(delay)
        }

        fn clear_timeout(&mut self, id: TimerId) {
            self.timers.clear_timeout(id)
        }
    }

    impl<P: Presenter> Presenter for WebHost<P> {
        fn present(&mut self, frame: &RenderFrame) {
            self.presenter.present(frame)
        }

        fn animate_width(&mut self, transition: &WidthTransition) {
            self.presenter.animate_width(transition)
        }
    }
}
