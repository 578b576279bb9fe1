// ********* Input data structures ***********

use snafu::Snafu;
use std::ops::BitOr;

/// The options controlling which ranked ballots are accepted by an instant-runoff election.
///
/// Every option is evaluated on its own, and a ballot is rejected as soon as one enabled
/// option rejects it. Options compose with `|`:
///
/// ```
/// use election_core::ValidityPolicy;
///
/// let policy = ValidityPolicy::OPTIONAL | ValidityPolicy::STRICT;
/// assert!(policy.optional && policy.strict);
/// assert!(!policy.full);
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct ValidityPolicy {
    /// Every candidate must be ranked. Unknown names are tolerated and stripped.
    pub full: bool,
    /// Any non-empty ranking is accepted, as long as it names at least one known candidate.
    pub optional: bool,
    /// A ballot naming any unknown candidate is discarded instead of being cleaned up.
    pub strict: bool,
}

impl ValidityPolicy {
    pub const FULL: ValidityPolicy = ValidityPolicy {
        full: true,
        optional: false,
        strict: false,
    };

    pub const OPTIONAL: ValidityPolicy = ValidityPolicy {
        full: false,
        optional: true,
        strict: false,
    };

    pub const STRICT: ValidityPolicy = ValidityPolicy {
        full: false,
        optional: false,
        strict: true,
    };

    pub const fn union(self, other: ValidityPolicy) -> ValidityPolicy {
        ValidityPolicy {
            full: self.full || other.full,
            optional: self.optional || other.optional,
            strict: self.strict || other.strict,
        }
    }

    /// True if every option enabled in `other` is also enabled here.
    pub fn contains(&self, other: ValidityPolicy) -> bool {
        (self.full || !other.full)
            && (self.optional || !other.optional)
            && (self.strict || !other.strict)
    }
}

impl Default for ValidityPolicy {
    fn default() -> Self {
        ValidityPolicy::FULL
    }
}

impl BitOr for ValidityPolicy {
    type Output = ValidityPolicy;
    fn bitor(self, rhs: ValidityPolicy) -> ValidityPolicy {
        self.union(rhs)
    }
}

// ********* Configuration **********

/// How to pick the candidate to eliminate when several share the lowest tally.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum TieBreakMode {
    /// The first of the tied candidates, in the order of the candidate set.
    UseCandidateOrder,
    /// A reproducible permutation of the tied candidates, derived from a
    /// cryptographic hash of the seed, the round number and the candidate name.
    Random(u32),
}

/// The rules that govern an instant-runoff election.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct RankedRules {
    pub validity: ValidityPolicy,
    pub tiebreak_mode: TieBreakMode,
}

impl RankedRules {
    pub const DEFAULT_RULES: RankedRules = RankedRules {
        validity: ValidityPolicy::FULL,
        tiebreak_mode: TieBreakMode::UseCandidateOrder,
    };
}

impl Default for RankedRules {
    fn default() -> Self {
        RankedRules::DEFAULT_RULES
    }
}

// ******** Output data structures *********

/// The vote count of every candidate, in candidate order.
pub type TallyResult = Vec<(String, u64)>;

/// What happened to the ballots of an eliminated candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    pub name: String,
    /// The candidates receiving the ballots, in candidate order.
    pub transfers: Vec<(String, u64)>,
    /// Ballots without any remaining preference for a continuing candidate.
    pub exhausted: u64,
}

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// The tally of all the continuing candidates, in candidate order.
    pub tally: TallyResult,
    pub tally_results_elected: Vec<String>,
    pub tally_result_eliminated: Option<EliminationStats>,
}

/// How an instant-runoff count came to an end.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Resolution {
    /// One candidate holds more than half of the continuing ballots.
    Majority,
    /// Two candidates are left holding ballots and neither has a majority.
    FinalTwoTie,
    /// No ballot is left to count. Every candidate is returned.
    Exhausted,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedOutcome {
    /// The winners, in candidate order.
    pub winners: Vec<String>,
    pub resolution: Resolution,
    /// Winning vote threshold of the last round
    pub threshold: u64,
    pub round_stats: Vec<RoundStats>,
}

/// Errors that prevent an election from being set up.
#[derive(Eq, PartialEq, Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ElectionError {
    #[snafu(display("Cannot run an election with 0 candidates."))]
    InvalidInput {},
}
