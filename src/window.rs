//! Window of recently consumed chain positions.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Counts consumed at or just below the highest count a device has seen.
///
/// The window lets ADD_TIME tokens be entered out of order: an unused ADD_TIME count within the
/// window is still accepted, once. Any other command closes the whole window.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UsedCounts(BTreeSet<u32>);

impl UsedCounts {
    /// An empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `count` was consumed.
    #[must_use]
    pub fn contains(&self, count: u32) -> bool {
        self.0.contains(&count)
    }

    /// Highest consumed count, if any.
    #[must_use]
    pub fn highest(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// Number of counts in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no count was consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumed counts in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Recomputes the window after accepting a token at `count`.
    ///
    /// The window covers `[highest - width, highest]`, where `highest` is the larger of `count`
    /// and the highest count already in the window. When `closes_window` is set (any command
    /// other than a plain ADD_TIME), every position of the window is marked as used; otherwise
    /// only previously used positions and `count` itself are kept.
    #[must_use]
    pub fn updated(&self, count: u32, closes_window: bool, width: u32) -> Self {
        let highest = self.highest().map_or(count, |highest| highest.max(count));
        let window = highest.saturating_sub(width)..=highest;
        if closes_window {
            Self(window.collect())
        } else {
            Self(
                window
                    .filter(|&used| used == count || self.contains(used))
                    .collect(),
            )
        }
    }
}

impl FromIterator<u32> for UsedCounts {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<u32> for UsedCounts {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
