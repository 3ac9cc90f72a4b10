//! # Tie-break policy for picking up two resources.
//!
//! [`TieBreak`] decides which of its two neighbouring resources an actor reaches
//! for first. Randomizing the order desynchronizes actors that were granted at the
//! same moment.
//!
//! - [`TieBreak::Coin`]: unbiased coin flip per attempt (default)
//! - [`TieBreak::LeftFirst`]: always left, then right
//! - [`TieBreak::RightFirst`]: always right, then left

use rand::Rng;

/// Policy controlling the order an actor acquires its two resources in.
///
/// The arbiter already bounds concurrency, so correctness does not depend on the
/// choice; the deterministic variants exist for reproducible traces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// Flip an unbiased coin before every acquisition.
    #[default]
    Coin,

    /// Left resource (index `i`) first.
    LeftFirst,

    /// Right resource (index `(i + 1) mod N`) first.
    RightFirst,
}

impl TieBreak {
    /// Returns `true` if the left resource should be acquired first.
    pub fn left_first(&self) -> bool {
        match self {
            TieBreak::Coin => rand::rng().random_bool(0.5),
            TieBreak::LeftFirst => true,
            TieBreak::RightFirst => false,
        }
    }

    /// Short name, as accepted by the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::Coin => "coin",
            TieBreak::LeftFirst => "left",
            TieBreak::RightFirst => "right",
        }
    }
}

impl std::str::FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coin" => Ok(TieBreak::Coin),
            "left" => Ok(TieBreak::LeftFirst),
            "right" => Ok(TieBreak::RightFirst),
            other => Err(format!("unknown tie-break '{other}' (expected coin, left or right)")),
        }
    }
}
