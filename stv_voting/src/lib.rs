/*!
Single transferable vote (STV) counting.

The count fills several seats from ranked ballots. A candidate who holds the
Droop quota is seated: the first ballots that reached the quota are spent and
the ones registered after them move to their next preference. When nobody
reaches the quota, the candidates tied for last place are removed and their
ballots move on. When a tie can neither be eliminated nor seated safely, the
remaining seats are marked as tied and a runoff is required.

Every transfer and every tiebreak follows a total order: the same input
always produces the same seats, in the same order.

```
use stv_voting::*;

let candidates = vec!["Anna".to_string(), "Bob".to_string(), "Clara".to_string()];
let votes = vec![
    Vote { candidates: vec!["Anna".to_string()], count: 2 },
    Vote { candidates: vec!["Bob".to_string()], count: 1 },
    Vote { candidates: vec!["Clara".to_string()], count: 1 },
];
let result = run_election(&votes, &VoteRules::DEFAULT_RULES, &candidates)?;
assert_eq!(result.quota, 3);
assert_eq!(result.seats, vec![(1, WinnerSlot::Seated("Anna".to_string()))]);

# Ok::<(), VotingErrors>(())
```
*/
mod ballot;
mod candidate;
mod config;
mod election;

pub mod builder;
pub mod manual;

use log::{debug, info, warn};

use std::{
    collections::HashMap,
    ops::{Add, AddAssign},
};

pub use crate::config::*;
use crate::election::Election;

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

impl CandidateId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct BallotId(usize);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

/// Runs the STV count with the given rules for the given votes.
///
/// Arguments:
/// * `coll` the collection of votes to process. Names that are not registered
/// candidates are dropped from the ballots, with a warning.
/// * `rules` the rules that govern this election
/// * `candidates` the registered candidates for this election, in order. The
/// order is the final tiebreak between otherwise identical candidates.
///
/// If there are no more candidates than seats, every candidate is seated in
/// registration order without counting and the remaining seats are vacant.
pub fn run_election(
    coll: &[Vote],
    rules: &VoteRules,
    candidates: &[String],
) -> Result<ElectionResult, VotingErrors> {
    info!(
        "Processing {:?} votes, candidates: {:?}, rules: {:?}",
        coll.len(),
        candidates,
        rules
    );
    if rules.number_of_winners == 0 {
        return Err(VotingErrors::InvalidSeatCount);
    }

    let candidate_ids = checks(candidates)?;
    let preferences = resolve_votes(coll, &candidate_ids);
    debug!(
        "run_election: {} ballots after expanding the vote counts",
        preferences.len()
    );

    let election = Election::new(candidates.to_vec(), preferences, rules.number_of_winners)?;
    info!(
        "Counting {} candidates for {} seats, quota: {}",
        candidates.len(),
        rules.number_of_winners,
        election.quota().0
    );
    if candidates.len() <= rules.number_of_winners as usize {
        info!("run_election: no more candidates than seats, every candidate is elected");
        return election.seat_all_uncontested();
    }
    let result = election.run()?;
    for (ordinal, slot) in result.seats.iter() {
        info!("Seat {}: {}", ordinal, slot);
    }
    if result.needs_runoff {
        warn!("Unbreakable tie, a runoff election must be held");
    }
    Ok(result)
}

// Candidates get ids in registration order.
fn checks(candidates: &[String]) -> Result<HashMap<String, CandidateId>, VotingErrors> {
    let mut ids: HashMap<String, CandidateId> = HashMap::new();
    for (idx, name) in candidates.iter().enumerate() {
        if ids.insert(name.clone(), CandidateId(idx as u32)).is_some() {
            return Err(VotingErrors::DuplicateCandidate(name.clone()));
        }
    }
    Ok(ids)
}

// One list of preferences per ballot, weighted votes expanded in place.
fn resolve_votes(coll: &[Vote], candidate_ids: &HashMap<String, CandidateId>) -> Vec<Vec<CandidateId>> {
    let mut res: Vec<Vec<CandidateId>> = Vec::new();
    for v in coll.iter() {
        let mut prefs: Vec<CandidateId> = Vec::new();
        for name in v.candidates.iter() {
            match candidate_ids.get(name) {
                Some(cid) => prefs.push(*cid),
                None => warn!("Candidate {} does not exist, dropped from the ballot", name),
            }
        }
        for _ in 0..v.count {
            res.push(prefs.clone());
        }
    }
    res
}
