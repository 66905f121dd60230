// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A ranked vote, as handed over by the readers.
///
/// The choices are candidate names, from the most preferred to the least
/// preferred. A vote with a `count` greater than one stands for that many
/// identical ballots.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Vote {
    pub candidates: Vec<String>,
    pub count: u64,
}

// ******** Output data structures *********

/// What happened to one seat.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum WinnerSlot {
    /// A real candidate took the seat.
    Seated(String),
    /// There were not enough candidates to fill the seat.
    Vacant,
    /// The seat is blocked by a tie that only a runoff can break.
    Tied,
}

impl WinnerSlot {
    pub fn name(&self) -> &str {
        match self {
            WinnerSlot::Seated(name) => name.as_str(),
            WinnerSlot::Vacant => "Vacant",
            WinnerSlot::Tied => "Tied",
        }
    }
}

impl Display for WinnerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How a round ended.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RoundOutcome {
    /// One or more seats were decided.
    SeatFilled,
    /// The last-place candidates were removed from the count.
    CandidateRemoved,
    /// The last-place candidates can neither all lose nor all win.
    UnbreakableTie,
}

/// The ballots that left a candidate, either because the candidate was
/// eliminated or because they were the surplus of a seated candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TransferStats {
    pub name: String,
    /// Destination candidates, in registration order.
    pub transfers: Vec<(String, u64)>,
    /// Ballots that had no remaining preference.
    pub exhausted: u64,
}

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// Votes of the candidates still in the count when the round started.
    pub tally: Vec<(String, u64)>,
    /// Ballots already spent or exhausted when the round started.
    pub exhausted: u64,
    pub outcome: RoundOutcome,
    pub tally_results_elected: Vec<TransferStats>,
    pub tally_result_eliminated: Vec<TransferStats>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionResult {
    /// The Droop quota used for the whole count.
    pub quota: u64,
    /// The seats, in the order they were decided. Ordinals start at 1.
    pub seats: Vec<(u32, WinnerSlot)>,
    /// Set when an unbreakable tie stopped the count.
    pub needs_runoff: bool,
    pub round_stats: Vec<RoundStats>,
}

impl ElectionResult {
    /// The seat at the given (0-based) position.
    pub fn seat(&self, index: usize) -> Result<&WinnerSlot, VotingErrors> {
        self.seats
            .get(index)
            .map(|(_, slot)| slot)
            .ok_or(VotingErrors::IndexOutOfRange {
                index,
                len: self.seats.len(),
            })
    }

    /// The names of the seated candidates, placeholders excluded.
    pub fn winner_names(&self) -> Vec<String> {
        self.seats
            .iter()
            .filter_map(|(_, slot)| match slot {
                WinnerSlot::Seated(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// The number of seats must be at least one.
    InvalidSeatCount,
    DuplicateCandidate(String),
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    /// The current candidate of an eliminated ballot was requested.
    InvalidState,
    /// A ballot was registered on a candidate it does not point to.
    InvalidAssignment(String),
    NoConvergence,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::InvalidSeatCount => write!(f, "the number of seats must be at least 1"),
            VotingErrors::DuplicateCandidate(name) => {
                write!(f, "candidate {} is registered more than once", name)
            }
            VotingErrors::IndexOutOfRange { index, len } => {
                write!(f, "index {} is out of range (length {})", index, len)
            }
            VotingErrors::InvalidState => {
                write!(f, "an eliminated ballot has no current candidate")
            }
            VotingErrors::InvalidAssignment(name) => {
                write!(f, "ballot does not currently count toward {}", name)
            }
            VotingErrors::NoConvergence => write!(f, "the count did not converge"),
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    /// The number of seats to fill.
    pub number_of_winners: u32,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        number_of_winners: 1,
    };
}
