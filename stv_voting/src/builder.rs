use log::warn;

pub use crate::config::*;

/// A builder for adding votes.
///
/// Using the builder should be considered for performance code.
///
/// ```
/// pub use stv_voting::builder::Builder;
/// pub use stv_voting::VoteRules;
/// # use stv_voting::VotingErrors;
///
/// let mut builder = Builder::new(&VoteRules { number_of_winners: 2 })?
///     .candidates(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_vote_simple(&["Anna".to_string(), "Clara".to_string()])?;
/// builder.add_vote(&["Bob".to_string()], 2)?;
///
/// let result = builder.run()?;
/// assert_eq!(result.seats.len(), 2);
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: VoteRules,
    pub(crate) _candidates: Vec<String>,
    pub(crate) _votes: Vec<Vote>,
}

impl Builder {
    pub fn new(rules: &VoteRules) -> Result<Builder, VotingErrors> {
        if rules.number_of_winners == 0 {
            return Err(VotingErrors::InvalidSeatCount);
        }
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _votes: Vec::new(),
        })
    }

    /// Registers the candidates, in order. Any vote added before is discarded.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        for (idx, name) in cands.iter().enumerate() {
            if cands[..idx].contains(name) {
                return Err(VotingErrors::DuplicateCandidate(name.clone()));
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
            _votes: Vec::new(),
        })
    }

    /// Adds a vote to the builder.
    ///
    /// It is the simplest use case for most cases.
    ///
    pub fn add_vote_simple(&mut self, candidates: &[String]) -> Result<(), VotingErrors> {
        self.add_vote(candidates, 1)
    }

    /// Adds a vote, with a potential weight attached to it.
    ///
    /// candidates: the list of choices made by the voter, in order. Names that
    /// are not registered candidates are dropped.
    pub fn add_vote(&mut self, candidates: &[String], count: u32) -> Result<(), VotingErrors> {
        let mut choices: Vec<String> = Vec::new();
        for c in candidates {
            if self._candidates.contains(c) {
                choices.push(c.clone());
            } else {
                warn!("Candidate {} does not exist, they were not added to the ballot", c);
            }
        }
        self.add_vote_2(&Vote {
            count: count as u64,
            candidates: choices,
        })
    }

    pub fn add_vote_2(&mut self, vote: &Vote) -> Result<(), VotingErrors> {
        self._votes.push(vote.clone());
        Ok(())
    }

    /// Runs the count over all the votes added so far.
    pub fn run(&self) -> Result<ElectionResult, VotingErrors> {
        crate::run_election(&self._votes, &self._rules, &self._candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn rejects_duplicate_candidates() {
        let res = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&s(&["A", "B", "B"]));
        assert!(matches!(res, Err(VotingErrors::DuplicateCandidate(n)) if n == "B"));
    }

    #[test]
    fn rejects_zero_seats() {
        let res = Builder::new(&VoteRules {
            number_of_winners: 0,
        });
        assert!(matches!(res, Err(VotingErrors::InvalidSeatCount)));
    }

    #[test]
    fn unknown_names_removed_on_add() {
        let mut b = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&s(&["A", "B"]))
            .unwrap();
        b.add_vote(&s(&["X", "B", "A"]), 3).unwrap();
        assert_eq!(
            b._votes,
            vec![Vote {
                candidates: s(&["B", "A"]),
                count: 3
            }]
        );
    }

    #[test]
    fn runs_the_count() {
        let mut b = Builder::new(&VoteRules::DEFAULT_RULES)
            .unwrap()
            .candidates(&s(&["A", "B", "C"]))
            .unwrap();
        b.add_vote_simple(&s(&["A"])).unwrap();
        b.add_vote_simple(&s(&["A"])).unwrap();
        b.add_vote_simple(&s(&["B"])).unwrap();
        b.add_vote_simple(&s(&["C"])).unwrap();
        let res = b.run().unwrap();
        assert_eq!(res.seats, vec![(1, WinnerSlot::Seated("A".to_string()))]);
    }
}
