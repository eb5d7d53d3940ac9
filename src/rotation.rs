//! Index state machine for text rotation.

use crate::error::ConfigError;

/// What happens at either end of the text sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LoopMode {
    /// Stop at the first and last text
    Once,
    /// Wrap around at either end
    #[default]
    Loop,
}

/// Tracks which text is current.
///
/// Every transition returns the new index when it actually moved, and
/// `None` for a no-op, so callers only react to real changes.
///
/// ## Example
///
/// ```rust
/// use rotating_text_core::{IndexState, LoopMode};
///
/// let mut state = IndexState::new(2, LoopMode::Loop).unwrap();
/// assert_eq!(state.advance(), Some(1));
/// assert_eq!(state.advance(), Some(0));
///
/// let mut once = IndexState::new(2, LoopMode::Once).unwrap();
/// assert_eq!(once.retreat(), None);
/// assert_eq!(once.jump_to(99), Some(1));
/// assert_eq!(once.advance(), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexState {
    current: usize,
    count: usize,
    loop_mode: LoopMode,
}

impl IndexState {
    /// Start at index 0 of `count` texts.
    pub fn new(count: usize, loop_mode: LoopMode) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::EmptyTexts);
        }
        Ok(Self {
            current: 0,
            count,
            loop_mode,
        })
    }

    /// Get the current index.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Get the total number of texts.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Get the loop mode.
    #[inline]
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Set the loop mode. The current index is kept.
    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    #[inline]
    fn last(&self) -> usize {
        self.count - 1
    }

    /// Move to the next text, wrapping to the first when looping.
    pub fn advance(&mut self) -> Option<usize> {
        let next = if self.current < self.last() {
            self.current + 1
        } else {
            match self.loop_mode {
                LoopMode::Loop => 0,
                LoopMode::Once => self.current,
            }
        };
        self.settle(next)
    }

    /// Move to the previous text, wrapping to the last when looping.
    pub fn retreat(&mut self) -> Option<usize> {
        let prev = if self.current > 0 {
            self.current - 1
        } else {
            match self.loop_mode {
                LoopMode::Loop => self.last(),
                LoopMode::Once => self.current,
            }
        };
        self.settle(prev)
    }

    /// Jump to `index`, clamped into the valid range.
    pub fn jump_to(&mut self, index: isize) -> Option<usize> {
        let clamped = index.clamp(0, self.last() as isize) as usize;
        self.settle(clamped)
    }

    /// Jump back to the first text.
    pub fn reset(&mut self) -> Option<usize> {
        self.jump_to(0)
    }

    fn settle(&mut self, index: usize) -> Option<usize> {
        if index == self.current {
            return None;
        }
        self.current = index;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_is_rejected() {
        assert!(matches!(
            IndexState::new(0, LoopMode::Loop),
            Err(ConfigError::EmptyTexts)
        ));
    }

    #[test]
    fn loop_wraps_both_ways() {
        let mut state = IndexState::new(3, LoopMode::Loop).unwrap();
        assert_eq!(state.retreat(), Some(2));
        assert_eq!(state.advance(), Some(0));
        assert_eq!(state.advance(), Some(1));
    }

    #[test]
    fn once_stops_at_bounds() {
        let mut state = IndexState::new(3, LoopMode::Once).unwrap();
        assert_eq!(state.retreat(), None);
        assert_eq!(state.current(), 0);

        state.jump_to(2);
        assert_eq!(state.advance(), None);
        assert_eq!(state.current(), 2);
        assert_eq!(state.retreat(), Some(1));
    }

    #[test]
    fn jump_clamps() {
        let mut state = IndexState::new(3, LoopMode::Loop).unwrap();
        assert_eq!(state.jump_to(99), Some(2));
        assert_eq!(state.jump_to(-5), Some(0));
        assert_eq!(state.jump_to(0), None);
    }

    #[test]
    fn reset_only_reports_real_changes() {
        let mut state = IndexState::new(3, LoopMode::Loop).unwrap();
        assert_eq!(state.reset(), None);
        state.advance();
        assert_eq!(state.reset(), Some(0));
    }

    #[test]
    fn single_text_never_changes() {
        let mut state = IndexState::new(1, LoopMode::Loop).unwrap();
        assert_eq!(state.advance(), None);
        assert_eq!(state.retreat(), None);
        assert_eq!(state.jump_to(4), None);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Advance,
        Retreat,
        Jump(isize),
        Reset,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Advance),
            Just(Op::Retreat),
            (-20isize..20).prop_map(Op::Jump),
            Just(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn index_stays_in_range(
            count in 1usize..10,
            looping in any::<bool>(),
            ops in prop::collection::vec(op(), 0..50),
        ) {
            let mode = if looping { LoopMode::Loop } else { LoopMode::Once };
            let mut state = IndexState::new(count, mode).unwrap();
            for op in ops {
                let before = state.current();
                let changed = match op {
                    Op::Advance => state.advance(),
                    Op::Retreat => state.retreat(),
                    Op::Jump(i) => state.jump_to(i),
                    Op::Reset => state.reset(),
                };
                prop_assert!(state.current() < count);
                match changed {
                    Some(i) => {
                        prop_assert_eq!(i, state.current());
                        prop_assert_ne!(i, before);
                    }
                    None => prop_assert_eq!(before, state.current()),
                }
            }
        }

        #[test]
        fn looping_advance_is_periodic(count in 1usize..12, start in 0usize..12) {
            let mut state = IndexState::new(count, LoopMode::Loop).unwrap();
            state.jump_to(start as isize);
            let origin = state.current();
            for _ in 0..count {
                state.advance();
            }
            prop_assert_eq!(state.current(), origin);
        }
    }
}
