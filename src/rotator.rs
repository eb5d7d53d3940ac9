//! The rotating text engine and its control surface.
//!
//! Every index change runs the same pipeline, whether it came from the
//! auto-advance timer or from a [`RotationHandle`]: resegment the text,
//! remeasure the container, build a new [`RenderFrame`], present it,
//! rearm the timer, then notify the change callback.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::config::{RotationConfig, SplitBy};
use crate::error::ConfigError;
use crate::render::{render_frame, Presenter, RenderFrame};
use crate::rotation::{IndexState, LoopMode};
use crate::segment::{AnimUnit, Segmentation};
use crate::sizing::{TextProbe, WidthSync};
use crate::timer::{RotationTimer, TimerHost, TimerId};

/// Everything a rotation needs from its host: a measurement probe,
/// one-shot timers and an animation runtime.
pub trait HostRuntime: TextProbe + TimerHost + Presenter {}

impl<T: TextProbe + TimerHost + Presenter + ?Sized> HostRuntime for T {}

/// Snapshot of the mutable rotation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationState {
    pub index: usize,
    /// Last measured container width
    pub width: f64,
}

/// The four operations an outside owner may drive.
///
/// Each returns true when the index actually changed.
pub trait RotationControl {
    fn advance(&self) -> bool;
    fn retreat(&self) -> bool;
    fn jump_to(&self, index: isize) -> bool;
    fn reset(&self) -> bool;
}

struct Engine<H: HostRuntime> {
    config: RotationConfig,
    index: IndexState,
    segmentation: Segmentation,
    frame: RenderFrame,
    width: WidthSync,
    timer: RotationTimer,
    /// Viewport resize listener, released on teardown
    resize: Option<Box<dyn Any>>,
    host: H,
}

impl<H: HostRuntime> Engine<H> {
    /// Measure and show the initial text without waiting for a change.
    fn mount(&mut self) {
        self.remeasure();
        self.host.present(&self.frame);
        self.rearm();
    }

    /// Recompute everything derived from the current text and strategy.
    fn refresh(&mut self) {
        let index = self.index.current();
        let text = self.config.texts[index].as_str();

        self.segmentation = Segmentation::split(text, &self.config.split_by);
        self.remeasure();
        let text = self.config.texts[index].as_str();
        self.frame = render_frame(index, text, &self.segmentation, &self.config, true);
        self.host.present(&self.frame);
    }

    fn rearm(&mut self) {
        if self.config.auto {
            let delay = self.config.duration_for(self.index.current());
            self.timer.arm(&mut self.host, delay);
        } else {
            self.timer.cancel(&mut self.host);
        }
    }

    fn settle(&mut self, changed: Option<usize>) -> Option<usize> {
        let index = changed?;
        log::debug!("rotated to text {}", index);
        self.refresh();
        self.rearm();
        Some(index)
    }

    fn remeasure(&mut self) {
        let text = self.config.texts[self.index.current()].as_str();
        if let Some(transition) = self.width.remeasure(&mut self.host, text) {
            self.host.animate_width(&transition);
        }
    }
}

impl<H: HostRuntime> Drop for Engine<H> {
    fn drop(&mut self) {
        self.timer.cancel(&mut self.host);
        if let Some(subscription) = self.resize.take() {
            drop(subscription);
            log::debug!("released resize subscription");
        }
    }
}

/// Change callback plus the indices still waiting to be delivered.
///
/// Callbacks run with no engine borrow held, so they may drive the
/// rotation again; nested changes are queued and delivered in order.
#[derive(Default)]
struct Notifier {
    callback: Option<Box<dyn FnMut(usize)>>,
    queue: VecDeque<usize>,
    dispatching: bool,
}

struct Shared<H: HostRuntime> {
    engine: RefCell<Engine<H>>,
    notifier: RefCell<Notifier>,
    /// Timer that fired while the engine was busy
    deferred_fire: Cell<Option<TimerId>>,
}

impl<H: HostRuntime> Shared<H> {
    /// Read the engine. `None` while the host is inside one of its callbacks.
    fn read<R>(&self, f: impl FnOnce(&Engine<H>) -> R) -> Option<R> {
        match self.engine.try_borrow() {
            Ok(engine) => Some(f(&engine)),
            Err(_) => {
                log::warn!("rotation busy, state unavailable");
                None
            }
        }
    }

    fn try_mutate<R>(&self, what: &str, f: impl FnOnce(&mut Engine<H>) -> R) -> Option<R> {
        match self.engine.try_borrow_mut() {
            Ok(mut engine) => Some(f(&mut engine)),
            Err(_) => {
                log::warn!("rotation busy, ignoring {}", what);
                None
            }
        }
    }

    /// Mutate the engine, then deliver any timer that fired meanwhile.
    fn mutate<R>(&self, what: &str, f: impl FnOnce(&mut Engine<H>) -> R) -> Option<R> {
        let result = self.try_mutate(what, f)?;
        self.fire_deferred();
        Some(result)
    }

    fn apply(&self, op: impl FnOnce(&mut IndexState) -> Option<usize>) -> bool {
        let Some(changed) = self.try_mutate("control call", |engine| {
            let changed = op(&mut engine.index);
            engine.settle(changed)
        }) else {
            return false;
        };
        if let Some(index) = changed {
            self.notify(index);
        }
        self.fire_deferred();
        changed.is_some()
    }

    fn notify(&self, index: usize) {
        {
            let mut notifier = self.notifier.borrow_mut();
            notifier.queue.push_back(index);
            if notifier.dispatching {
                return;
            }
            notifier.dispatching = true;
        }

        loop {
            let (index, mut callback) = {
                let mut notifier = self.notifier.borrow_mut();
                match notifier.queue.pop_front() {
                    Some(index) => (index, notifier.callback.take()),
                    None => {
                        notifier.dispatching = false;
                        return;
                    }
                }
            };
            if let Some(callback) = callback.as_mut() {
                callback(index);
            }
            let mut notifier = self.notifier.borrow_mut();
            // Keep a callback installed from inside the callback
            if notifier.callback.is_none() {
                notifier.callback = callback;
            }
        }
    }

    fn fire(&self, id: TimerId) -> bool {
        let due = match self.engine.try_borrow_mut() {
            Ok(mut engine) => engine.timer.fire(id),
            Err(_) => {
                log::debug!("rotation busy, deferring timer {:?}", id);
                self.deferred_fire.set(Some(id));
                return false;
            }
        };
        due && self.advance()
    }

    fn fire_deferred(&self) {
        if let Some(id) = self.deferred_fire.take() {
            self.fire(id);
        }
    }

    fn resize(&self) {
        self.mutate("resize", |engine| engine.remeasure());
    }
}

impl<H: HostRuntime> RotationControl for Shared<H> {
    fn advance(&self) -> bool {
        self.apply(IndexState::advance)
    }

    fn retreat(&self) -> bool {
        self.apply(IndexState::retreat)
    }

    fn jump_to(&self, index: isize) -> bool {
        self.apply(|state| state.jump_to(index))
    }

    fn reset(&self) -> bool {
        self.apply(IndexState::reset)
    }
}

/// Control capability handed to an outside owner.
///
/// Holds no strong reference: once the rotation is dropped every call is
/// a no-op returning false.
#[derive(Clone)]
pub struct RotationHandle {
    inner: Weak<dyn RotationControl>,
}

impl RotationHandle {
    /// Whether the rotation is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    fn with(&self, f: impl FnOnce(&dyn RotationControl) -> bool) -> bool {
        match self.inner.upgrade() {
            Some(control) => f(control.as_ref()),
            None => false,
        }
    }
}

impl RotationControl for RotationHandle {
    fn advance(&self) -> bool {
        self.with(|c| c.advance())
    }

    fn retreat(&self) -> bool {
        self.with(|c| c.retreat())
    }

    fn jump_to(&self, index: isize) -> bool {
        self.with(|c| c.jump_to(index))
    }

    fn reset(&self) -> bool {
        self.with(|c| c.reset())
    }
}

/// A rotating text bound to a host runtime.
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use rotating_text_core::{
///     MonospaceProbe, Presenter, RenderFrame, RotatingText, RotationConfig, RotationControl,
///     SplitBy, TextProbe, TimerHost, TimerId,
/// };
///
/// struct Host {
///     probe: MonospaceProbe,
///     next_timer: u64,
/// }
///
/// impl TextProbe for Host {
///     fn measure(&mut self, text: &str) -> Option<f64> {
///         self.probe.measure(text)
///     }
/// }
///
/// impl TimerHost for Host {
///     fn set_timeout(&mut self, _delay: Duration) -> Option<TimerId> {
///         self.next_timer += 1;
///         Some(TimerId(self.next_timer))
///     }
///     fn clear_timeout(&mut self, _id: TimerId) {}
/// }
///
/// impl Presenter for Host {
///     fn present(&mut self, _frame: &RenderFrame) {}
/// }
///
/// let host = Host { probe: MonospaceProbe::new(10.0), next_timer: 0 };
/// let config = RotationConfig::new(["Alpha", "Beta"]).split_by(SplitBy::Words);
/// let text = RotatingText::new(config, host).unwrap();
/// let handle = text.handle();
///
/// assert!(handle.advance());
/// assert_eq!(text.state().unwrap().index, 1);
/// assert!(handle.advance());
/// assert_eq!(text.state().unwrap().index, 0);
/// ```
///
/// Accessors return `None`, and setters do nothing, when called from inside
/// one of the host's own callbacks (`present`, `measure`, `animate_width`,
/// timer scheduling). Such calls are logged.
pub struct RotatingText<H: HostRuntime + 'static> {
    shared: Rc<Shared<H>>,
}

impl<H: HostRuntime + 'static> RotatingText<H> {
    /// Validate `config`, mount the first text and arm the timer.
    pub fn new(config: RotationConfig, host: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let index = IndexState::new(config.text_count(), config.loop_mode)?;

        let text = config.texts[index.current()].as_str();
        let segmentation = Segmentation::split(text, &config.split_by);
        let frame = render_frame(
            index.current(),
            text,
            &segmentation,
            &config,
            config.presence_initial,
        );

        let mut engine = Engine {
            width: WidthSync::new(config.width_transition),
            config,
            index,
            segmentation,
            frame,
            timer: RotationTimer::new(),
            resize: None,
            host,
        };
        engine.mount();

        Ok(Self {
            shared: Rc::new(Shared {
                engine: RefCell::new(engine),
                notifier: RefCell::new(Notifier::default()),
                deferred_fire: Cell::new(None),
            }),
        })
    }

    /// Install the change callback, builder style.
    pub fn on_change(self, callback: impl FnMut(usize) + 'static) -> Self {
        self.set_on_change(callback);
        self
    }

    /// Replace the change callback. It only sees real index changes.
    pub fn set_on_change(&self, callback: impl FnMut(usize) + 'static) {
        self.shared.notifier.borrow_mut().callback = Some(Box::new(callback));
    }

    /// Control capability for an outside owner.
    pub fn handle(&self) -> RotationHandle {
        let inner = Rc::downgrade(&self.shared);
        RotationHandle { inner }
    }

    /// Current index and measured width.
    pub fn state(&self) -> Option<RotationState> {
        self.shared.read(|engine| RotationState {
            index: engine.index.current(),
            width: engine.width.width(),
        })
    }

    /// The text currently shown.
    pub fn current_text(&self) -> Option<String> {
        self.shared.read(|engine| engine.config.texts[engine.index.current()].clone())
    }

    /// Units of the current text.
    pub fn units(&self) -> Option<Vec<AnimUnit>> {
        self.shared.read(|engine| engine.segmentation.units().to_vec())
    }

    /// The frame last handed to the host.
    pub fn frame(&self) -> Option<RenderFrame> {
        self.shared.read(|engine| engine.frame.clone())
    }

    /// Id of the live auto-advance timer, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.shared.read(|engine| engine.timer.pending()).flatten()
    }

    /// Report a fired timer. Stale ids are ignored.
    ///
    /// A timer reported while the engine is busy is delivered as soon as
    /// the current operation finishes.
    pub fn fire(&self, id: TimerId) -> bool {
        self.shared.fire(id)
    }

    /// Re-measure after the viewport changed size.
    pub fn on_resize(&self) {
        self.shared.resize();
    }

    /// Advance the built-in width spring and return the width to display.
    pub fn tick(&self, delta: Duration) -> Option<f64> {
        self.shared.mutate("tick", |engine| engine.width.tick(delta))
    }

    /// Turn auto-advance on or off. Turning it off clears the pending timer.
    pub fn set_auto(&self, auto: bool) {
        self.shared.mutate("set_auto", |engine| {
            if engine.config.auto != auto {
                engine.config.auto = auto;
                engine.rearm();
            }
        });
    }

    /// Change the segmentation strategy and re-present the current text.
    pub fn set_split_by(&self, split_by: SplitBy) {
        self.shared.mutate("set_split_by", |engine| {
            if engine.config.split_by != split_by {
                engine.config.split_by = split_by;
                engine.refresh();
            }
        });
    }

    /// Set the loop mode. The current index is kept.
    pub fn set_loop_mode(&self, mode: LoopMode) {
        self.shared.mutate("set_loop_mode", |engine| {
            engine.config.loop_mode = mode;
            engine.index.set_loop_mode(mode);
        });
    }

    /// Run `f` against the host.
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> Option<R> {
        self.shared.mutate("with_host", |engine| f(&mut engine.host))
    }

    /// Subscribe to viewport resizes for the lifetime of this rotation.
    ///
    /// `subscribe` receives the resize callback and returns a guard that
    /// unsubscribes when dropped. The guard is released on teardown, after
    /// the timer is cancelled. A previous guard is released immediately.
    pub fn listen_resize<S, E>(
        &self,
        subscribe: impl FnOnce(Box<dyn FnMut()>) -> Result<S, E>,
    ) -> Result<(), E>
    where
        S: 'static,
    {
        let subscription = subscribe(Box::new(self.resize_callback()))?;
        self.shared.mutate("listen_resize", |engine| {
            engine.resize = Some(Box::new(subscription));
        });
        Ok(())
    }

    /// Callback for hosts that deliver fired timers asynchronously.
    ///
    /// Holds only a weak reference, so it is safe to store inside the host.
    pub fn timer_callback(&self) -> impl Fn(TimerId) + 'static {
        let weak = Rc::downgrade(&self.shared);
        move |id| {
            if let Some(shared) = weak.upgrade() {
                shared.fire(id);
            }
        }
    }

    /// Callback for a passive viewport resize subscription.
    pub fn resize_callback(&self) -> impl FnMut() + 'static {
        let weak = Rc::downgrade(&self.shared);
        move || {
            if let Some(shared) = weak.upgrade() {
                shared.resize();
            }
        }
    }
}

impl<H: HostRuntime + 'static> RotationControl for RotatingText<H> {
    fn advance(&self) -> bool {
        self.shared.advance()
    }

    fn retreat(&self) -> bool {
        self.shared.retreat()
    }

    fn jump_to(&self, index: isize) -> bool {
        self.shared.jump_to(index)
    }

    fn reset(&self) -> bool {
        self.shared.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaggerFrom;
    use crate::sizing::{MonospaceProbe, WidthTransition};
    use std::cell::Cell;

    #[derive(Default)]
    struct Recorder {
        next_timer: u64,
        live: Vec<(TimerId, Duration)>,
        frames: Vec<RenderFrame>,
        widths: Vec<WidthTransition>,
    }

    struct FakeHost {
        log: Rc<RefCell<Recorder>>,
        font_size: Rc<Cell<f64>>,
        mounted: bool,
        /// Runs inside `present`, after the frame is recorded
        on_present: Option<Box<dyn FnMut()>>,
    }

    impl TextProbe for FakeHost {
        fn measure(&mut self, text: &str) -> Option<f64> {
            if !self.mounted {
                return None;
            }
            MonospaceProbe::new(self.font_size.get()).measure(text)
        }
    }

    impl TimerHost for FakeHost {
        fn set_timeout(&mut self, delay: Duration) -> Option<TimerId> {
            let mut log = self.log.borrow_mut();
            log.next_timer += 1;
            let id = TimerId(log.next_timer);
            log.live.push((id, delay));
            Some(id)
        }

        fn clear_timeout(&mut self, id: TimerId) {
            self.log.borrow_mut().live.retain(|(t, _)| *t != id);
        }
    }

    impl Presenter for FakeHost {
        fn present(&mut self, frame: &RenderFrame) {
            self.log.borrow_mut().frames.push(frame.clone());
            if let Some(hook) = self.on_present.as_mut() {
                hook();
            }
        }

        fn animate_width(&mut self, transition: &WidthTransition) {
            self.log.borrow_mut().widths.push(*transition);
        }
    }

    struct Fixture {
        log: Rc<RefCell<Recorder>>,
        font_size: Rc<Cell<f64>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                log: Rc::default(),
                font_size: Rc::new(Cell::new(10.0)),
            }
        }

        fn host(&self) -> FakeHost {
            FakeHost {
                log: Rc::clone(&self.log),
                font_size: Rc::clone(&self.font_size),
                mounted: true,
                on_present: None,
            }
        }

        fn live(&self) -> Vec<(TimerId, Duration)> {
            self.log.borrow().live.clone()
        }

        /// Fire the single live timer, as the host event loop would.
        fn fire<H: HostRuntime + 'static>(&self, text: &RotatingText<H>) -> bool {
            let live = self.live();
            assert_eq!(live.len(), 1, "exactly one timer should be live");
            let (id, _) = live[0];
            self.log.borrow_mut().live.clear();
            text.fire(id)
        }
    }

    fn recorded(log: &Rc<RefCell<Vec<usize>>>) -> impl FnMut(usize) + 'static {
        let log = Rc::clone(log);
        move |i| log.borrow_mut().push(i)
    }

    #[test]
    fn empty_texts_fail() {
        let fx = Fixture::new();
        let result = RotatingText::new(RotationConfig::new(Vec::<String>::new()), fx.host());
        assert!(matches!(result, Err(ConfigError::EmptyTexts)));
        assert!(fx.log.borrow().frames.is_empty());
    }

    #[test]
    fn alpha_beta_loops() {
        let fx = Fixture::new();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let config = RotationConfig::new(["Alpha", "Beta"]).split_by(SplitBy::Words);
        let text = RotatingText::new(config, fx.host())
            .unwrap()
            .on_change(recorded(&changes));

        assert!(text.advance());
        assert_eq!(text.current_text().unwrap(), "Beta");
        assert!(text.advance());
        assert_eq!(text.state().unwrap().index, 0);
        assert_eq!(*changes.borrow(), vec![1, 0]);
    }

    #[test]
    fn mounts_first_text() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["ab cd", "x"]), fx.host()).unwrap();

        let log = fx.log.borrow();
        assert_eq!(log.frames.len(), 1);
        assert_eq!(log.frames[0].key, 0);
        assert!(!log.frames[0].animate_enter);
        // First measurement snaps, no animation
        assert_eq!(log.widths.len(), 1);
        assert!(log.widths[0].is_snap());
        assert_eq!(log.widths[0].to, 30.0);
        assert_eq!(text.state().unwrap().width, 30.0);
        assert_eq!(text.units().unwrap().len(), 2);
    }

    #[test]
    fn presence_initial_animates_first_frame() {
        let fx = Fixture::new();
        let config = RotationConfig::new(["a"]).presence(Default::default(), true);
        let _text = RotatingText::new(config, fx.host()).unwrap();
        assert!(fx.log.borrow().frames[0].animate_enter);
    }

    #[test]
    fn per_index_durations() {
        let fx = Fixture::new();
        let config = RotationConfig::new(["a", "b"]).durations([1000, 3000]);
        let text = RotatingText::new(config, fx.host()).unwrap();

        assert_eq!(fx.live()[0].1, Duration::from_millis(1000));
        assert!(fx.fire(&text));
        assert_eq!(text.state().unwrap().index, 1);
        assert_eq!(fx.live()[0].1, Duration::from_millis(3000));
        assert!(fx.fire(&text));
        assert_eq!(text.state().unwrap().index, 0);
    }

    #[test]
    fn manual_change_rearms_single_timer() {
        let fx = Fixture::new();
        let config = RotationConfig::new(["a", "b", "c"]).duration_override(2, 500);
        let text = RotatingText::new(config, fx.host()).unwrap();
        let handle = text.handle();

        let first = fx.live()[0].0;
        assert!(handle.jump_to(2));
        let live = fx.live();
        assert_eq!(live.len(), 1);
        assert_ne!(live[0].0, first);
        assert_eq!(live[0].1, Duration::from_millis(500));

        // The cleared timer can no longer advance anything
        assert!(!text.fire(first));
        assert_eq!(text.state().unwrap().index, 2);
    }

    #[test]
    fn once_mode_stops_at_end() {
        let fx = Fixture::new();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let config = RotationConfig::new(["a", "b"]).loop_mode(LoopMode::Once);
        let text = RotatingText::new(config, fx.host())
            .unwrap()
            .on_change(recorded(&changes));

        assert!(!text.retreat());
        assert!(fx.fire(&text));
        assert_eq!(text.state().unwrap().index, 1);
        // Timer at the last text fires but cannot advance, nothing is rearmed
        assert!(!fx.fire(&text));
        assert!(fx.live().is_empty());
        assert!(!text.advance());
        assert_eq!(*changes.borrow(), vec![1]);
    }

    #[test]
    fn jump_clamps_and_reset() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["a", "b", "c"]), fx.host()).unwrap();
        let handle = text.handle();

        assert!(handle.jump_to(99));
        assert_eq!(text.state().unwrap().index, 2);
        assert!(handle.jump_to(-5));
        assert_eq!(text.state().unwrap().index, 0);
        assert!(!handle.reset());
        assert!(handle.retreat());
        assert_eq!(text.state().unwrap().index, 2);
        assert!(handle.reset());
        assert_eq!(text.state().unwrap().index, 0);
    }

    #[test]
    fn no_op_does_not_present_or_notify() {
        let fx = Fixture::new();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let text = RotatingText::new(RotationConfig::new(["a", "b"]), fx.host())
            .unwrap()
            .on_change(recorded(&changes));

        assert!(!text.jump_to(0));
        assert_eq!(fx.log.borrow().frames.len(), 1);
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn toggling_auto() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["a", "b"]), fx.host()).unwrap();
        assert!(text.pending_timer().is_some());

        text.set_auto(false);
        assert!(fx.live().is_empty());
        assert_eq!(text.pending_timer(), None);

        // Manual control still works without arming anything
        assert!(text.advance());
        assert!(fx.live().is_empty());

        text.set_auto(true);
        assert_eq!(fx.live().len(), 1);
        assert_eq!(fx.live()[0].1, Duration::from_millis(2000));
    }

    #[test]
    fn auto_off_from_config() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["a", "b"]).auto(false), fx.host()).unwrap();
        assert!(fx.live().is_empty());
        assert!(text.advance());
        assert!(fx.live().is_empty());
    }

    #[test]
    fn width_follows_text() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["abc", "abcdef"]), fx.host()).unwrap();
        assert_eq!(text.state().unwrap().width, 18.0);

        text.advance();
        assert_eq!(text.state().unwrap().width, 36.0);
        let widths = fx.log.borrow().widths.clone();
        assert_eq!(widths.len(), 2);
        assert_eq!((widths[1].from, widths[1].to), (18.0, 36.0));

        // The built-in spring moves toward the new width
        let w = text.tick(Duration::from_millis(16)).unwrap();
        assert!(w > 18.0 && w < 36.0);
    }

    #[test]
    fn resize_remeasures_same_text() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["abcd"]), fx.host()).unwrap();
        let frames = fx.log.borrow().frames.len();

        fx.font_size.set(20.0);
        let mut on_resize = text.resize_callback();
        on_resize();

        assert_eq!(text.state().unwrap().width, 48.0);
        assert_eq!(fx.log.borrow().widths.len(), 2);
        // Resizing does not re-present the text
        assert_eq!(fx.log.borrow().frames.len(), frames);
    }

    #[test]
    fn unmounted_probe_is_not_fatal() {
        let fx = Fixture::new();
        let mut host = fx.host();
        host.mounted = false;
        let text = RotatingText::new(RotationConfig::new(["abc", "de"]), host).unwrap();

        assert!(text.advance());
        assert_eq!(text.state().unwrap().width, 0.0);

        text.with_host(|h| h.mounted = true);
        text.on_resize();
        assert_eq!(text.state().unwrap().width, 12.0);
    }

    #[test]
    fn split_change_re_presents() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["ab cd"]), fx.host()).unwrap();
        assert_eq!(text.frame().unwrap().elements.len(), 4);

        text.set_split_by(SplitBy::Words);
        assert_eq!(text.frame().unwrap().elements.len(), 2);
        assert_eq!(fx.log.borrow().frames.len(), 2);
        assert_eq!(text.units().unwrap()[0].segment, vec!["ab"]);

        // Same strategy again is a no-op
        text.set_split_by(SplitBy::Words);
        assert_eq!(fx.log.borrow().frames.len(), 2);
    }

    #[test]
    fn stagger_reaches_frames() {
        let fx = Fixture::new();
        let config = RotationConfig::new(["x", "abc"]).stagger(StaggerFrom::Center, 0.1);
        let text = RotatingText::new(config, fx.host()).unwrap();
        text.advance();

        let delays: Vec<f64> = text.frame().unwrap().elements.iter().map(|e| e.delay).collect();
        assert_eq!(delays, vec![0.1, 0.0, 0.1]);
    }

    #[test]
    fn callback_may_drive_rotation() {
        let fx = Fixture::new();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let text = RotatingText::new(RotationConfig::new(["a", "b", "c"]).auto(false), fx.host())
            .unwrap();
        let handle = text.handle();
        {
            let changes = Rc::clone(&changes);
            text.set_on_change(move |i| {
                changes.borrow_mut().push(i);
                if i == 1 {
                    assert!(handle.advance());
                }
            });
        }

        assert!(text.advance());
        assert_eq!(text.state().unwrap().index, 2);
        assert_eq!(*changes.borrow(), vec![1, 2]);
    }

    #[test]
    fn timer_callback_fires_through_weak_ref() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["a", "b"]), fx.host()).unwrap();
        let fire = text.timer_callback();

        let (id, _) = fx.live()[0];
        fire(id);
        assert_eq!(text.state().unwrap().index, 1);
    }

    #[test]
    fn drop_cancels_timer_and_disarms_handle() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["a", "b"]), fx.host()).unwrap();
        let handle = text.handle();
        let fire = text.timer_callback();
        let (id, _) = fx.live()[0];
        assert!(handle.is_alive());

        drop(text);
        assert!(fx.live().is_empty());
        assert!(!handle.is_alive());
        assert!(!handle.advance());
        // Late delivery of the old timer is harmless
        fire(id);
    }

    #[test]
    fn deferred_first_measure_reaches_presenter() {
        let fx = Fixture::new();
        let mut host = fx.host();
        host.mounted = false;
        let text = RotatingText::new(RotationConfig::new(["abc", "abcdef"]), host).unwrap();
        assert!(fx.log.borrow().widths.is_empty());

        text.with_host(|h| h.mounted = true);
        assert!(text.advance());

        let widths = fx.log.borrow().widths.clone();
        assert_eq!(widths.len(), 1);
        assert!(widths[0].is_snap());
        assert_eq!(widths[0].to, 36.0);
        assert_eq!(text.state().unwrap().width, 36.0);
    }

    #[test]
    fn host_reentry_is_logged_and_ignored() {
        let fx = Fixture::new();
        let config = RotationConfig::new(["a", "b c"]);
        let text = Rc::new(RotatingText::new(config, fx.host()).unwrap());
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let weak = Rc::downgrade(&text);
            let seen = Rc::clone(&seen);
            let handle = text.handle();
            text.with_host(move |h| {
                h.on_present = Some(Box::new(move || {
                    let Some(text) = weak.upgrade() else { return };
                    seen.borrow_mut().push(text.state());
                    assert_eq!(text.current_text(), None);
                    assert_eq!(text.tick(Duration::from_millis(16)), None);
                    text.set_auto(false);
                    text.set_split_by(SplitBy::Words);
                    assert!(!handle.advance());
                }));
            });
        }

        assert!(text.advance());
        assert_eq!(*seen.borrow(), vec![None]);
        assert_eq!(text.state().unwrap().index, 1);
        // The nested setters had no effect
        assert!(text.pending_timer().is_some());
        assert_eq!(text.frame().unwrap().elements.len(), 3);
        assert_eq!(fx.log.borrow().frames.len(), 2);
    }

    #[test]
    fn timer_fired_while_busy_still_advances() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["a b", "c"]), fx.host()).unwrap();
        {
            let log = Rc::clone(&fx.log);
            let mut fire = Some(text.timer_callback());
            text.with_host(move |h| {
                h.on_present = Some(Box::new(move || {
                    if let Some(fire) = fire.take() {
                        let (id, _) = log.borrow_mut().live.remove(0);
                        fire(id);
                    }
                }));
            });
        }

        // Re-presenting keeps the timer, which fires during `present`
        text.set_split_by(SplitBy::Words);
        assert_eq!(text.state().unwrap().index, 1);
        assert_eq!(fx.log.borrow().frames.len(), 3);
        assert_eq!(fx.live().len(), 1);
    }

    struct Listener {
        released: Rc<Cell<bool>>,
    }

    impl Drop for Listener {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    #[test]
    fn drop_releases_resize_subscription() {
        let fx = Fixture::new();
        let text = RotatingText::new(RotationConfig::new(["abcd"]), fx.host()).unwrap();
        let released = Rc::new(Cell::new(false));
        let slot: Rc<RefCell<Option<Box<dyn FnMut()>>>> = Rc::default();
        {
            let released = Rc::clone(&released);
            let slot = Rc::clone(&slot);
            text.listen_resize(move |on_resize| {
                *slot.borrow_mut() = Some(on_resize);
                Ok::<_, ()>(Listener { released })
            })
            .unwrap();
        }

        fx.font_size.set(20.0);
        (slot.borrow_mut().as_mut().unwrap())();
        assert_eq!(text.state().unwrap().width, 48.0);
        assert!(!released.get());

        drop(text);
        assert!(released.get());
        assert!(fx.live().is_empty());
        // A resize delivered after teardown is harmless
        (slot.borrow_mut().as_mut().unwrap())();
    }
}
