//! Syndrome-based stop criterion.
//!
//! After each iteration the decoder reports whether all the parity checks were
//! satisfied. Decoding stops once this has happened in `depth` consecutive
//! iterations. Requiring more than one clean syndrome in a row avoids stopping
//! on a transient all-zero syndrome before the messages have settled.

/// Stop criterion state for one frame.
///
/// # Examples
/// ```
/// # use ldpc_bp::decoder::syndrome::SyndromeCriterion;
/// let mut criterion = SyndromeCriterion::new(true, 2);
/// assert!(!criterion.update(true));
/// assert!(!criterion.update(false));
/// assert!(!criterion.update(true));
/// assert!(criterion.update(true));
/// ```
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct SyndromeCriterion {
    enabled: bool,
    depth: usize,
    streak: usize,
}

impl SyndromeCriterion {
    /// Creates a new stop criterion.
    ///
    /// If `enabled` is `false` the criterion never stops the decoder. The
    /// `depth` is the number of consecutive satisfied syndromes required to
    /// stop, and should be positive.
    pub fn new(enabled: bool, depth: usize) -> SyndromeCriterion {
        SyndromeCriterion {
            enabled,
            depth,
            streak: 0,
        }
    }

    /// Clears the streak of satisfied syndromes.
    pub fn reset(&mut self) {
        self.streak = 0;
    }

    /// Records the syndrome of one iteration.
    ///
    /// The parameter `satisfied` is `true` if every parity check was
    /// satisfied. Returns `true` if decoding should stop.
    pub fn update(&mut self, satisfied: bool) -> bool {
        if satisfied {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.enabled && self.streak >= self.depth
    }

    /// Returns the current number of consecutive satisfied syndromes.
    pub fn streak(&self) -> usize {
        self.streak
    }
}
