//! The two-sided environment model.
//!
//! Every build/serve environment is identified by a [`Side`]. Exactly one
//! side is live at any time; the other is the staging side, which is the
//! only side a rebuild may target. Using an enum (rather than sentinel
//! strings) makes "the other side" a total, pure function.

use std::fmt;

/// Identifier for one of the two parallel build/serve environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Side "A", the side bootstrapped at startup.
    A,
    /// Side "B".
    B,
}

impl Side {
    /// Returns the opposite side.
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Directory name for this side's workspace under the configured root.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::A => "side-a",
            Self::B => "side-b",
        }
    }

    /// Index into per-side arrays.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}
