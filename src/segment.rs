//! Splitting text into animatable units.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::SplitBy;

/// One animatable group of the current text.
///
/// In character mode a unit is a word and its segment holds one entry per
/// grapheme; every other mode yields single-entry segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimUnit {
    /// Ordered pieces animated one by one
    pub segment: Vec<String>,
    /// Render a space after this unit
    pub needs_space: bool,
    /// Global position of the first piece across the whole text
    pub position: usize,
}

impl AnimUnit {
    /// Number of pieces in this unit.
    #[inline]
    pub fn len(&self) -> usize {
        self.segment.len()
    }

    /// Whether the unit has no pieces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segment.is_empty()
    }
}

/// A single animated piece with its place in the text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element<'a> {
    /// Index of the owning unit
    pub group: usize,
    /// Index within the owning unit
    pub index: usize,
    /// Global position across all units
    pub position: usize,
    pub text: &'a str,
}

/// The current text cut into units.
///
/// ## Example
///
/// ```rust
/// use rotating_text_core::{Segmentation, SplitBy};
///
/// let seg = Segmentation::split("ab cd", &SplitBy::Characters);
/// assert_eq!(seg.units().len(), 2);
/// assert_eq!(seg.units()[0].segment, vec!["a", "b"]);
/// assert!(seg.units()[0].needs_space);
/// assert!(!seg.units()[1].needs_space);
/// assert_eq!(seg.total(), 4);
/// assert_eq!(seg.rejoin(&SplitBy::Characters), "ab cd");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Segmentation {
    units: Vec<AnimUnit>,
    total: usize,
}

impl Segmentation {
    /// Split `text` according to `split_by`. Pure: same input, same output.
    pub fn split(text: &str, split_by: &SplitBy) -> Self {
        let groups: Vec<Vec<String>> = match split_by {
            SplitBy::Characters => text
                .split(' ')
                .map(|word| word.graphemes(true).map(String::from).collect())
                .collect(),
            SplitBy::Words => text.split(' ').map(|w| vec![w.to_string()]).collect(),
            SplitBy::Lines => text.split('\n').map(|l| vec![l.to_string()]).collect(),
            SplitBy::Delimiter(d) if d.is_empty() => {
                text.graphemes(true).map(|g| vec![g.to_string()]).collect()
            }
            SplitBy::Delimiter(d) => text.split(d.as_str()).map(|p| vec![p.to_string()]).collect(),
        };

        // Lines break between units instead of spacing them
        let spaced = !matches!(split_by, SplitBy::Lines);
        let last = groups.len().saturating_sub(1);
        let mut position = 0;
        let units: Vec<AnimUnit> = groups
            .into_iter()
            .enumerate()
            .map(|(i, segment)| {
                let unit = AnimUnit {
                    needs_space: spaced && i != last,
                    position,
                    segment,
                };
                position += unit.len();
                unit
            })
            .collect();

        log::trace!("split {:?} into {} units, {} pieces", text, units.len(), position);
        Self {
            units,
            total: position,
        }
    }

    /// Get the units in text order.
    #[inline]
    pub fn units(&self) -> &[AnimUnit] {
        &self.units
    }

    /// Total number of pieces across all units.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Every piece in order, with its group and global position.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        self.units.iter().enumerate().flat_map(|(group, unit)| {
            unit.segment.iter().enumerate().map(move |(index, text)| Element {
                group,
                index,
                position: unit.position + index,
                text: text.as_str(),
            })
        })
    }

    /// Rebuild the source text from the units.
    pub fn rejoin(&self, split_by: &SplitBy) -> String {
        let separator = match split_by {
            SplitBy::Characters | SplitBy::Words => " ",
            SplitBy::Lines => "\n",
            SplitBy::Delimiter(d) => d.as_str(),
        };
        let mut out = String::new();
        for (i, unit) in self.units.iter().enumerate() {
            for piece in &unit.segment {
                out.push_str(piece);
            }
            let more = i + 1 < self.units.len();
            if unit.needs_space || (more && matches!(split_by, SplitBy::Lines)) {
                out.push_str(separator);
            }
        }
        out
    }
}
