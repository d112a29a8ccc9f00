//! Slot generations
//!
//! A slot's generation changes every time the node living in it is
//! released, so a `NodeId` minted before the release no longer matches.

/// Release counter of one arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Generation(u32);

impl Generation {
    /// Generation of a slot that has never been released
    pub const INITIAL: Self = Generation(0);

    /// Generation after one more release (wraps)
    #[inline]
    pub(crate) const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    /// Whether `self` was issued after `other` for the same slot
    ///
    /// Compared on the wrapping distance, so it stays correct across
    /// overflow as long as the two are less than half the range apart.
    #[inline]
    pub fn is_newer_than(self, other: Self) -> bool {
        let distance = self.0.wrapping_sub(other.0);
        distance != 0 && distance < u32::MAX / 2
    }
}
