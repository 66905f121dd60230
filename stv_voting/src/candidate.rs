use log::debug;

use crate::ballot::Ballot;
use crate::{BallotId, CandidateId, VoteCount, VotingErrors};

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub(crate) enum CandidateStatus {
    Running,
    Seated,
    Eliminated,
}

/// The ballots released by a candidate who reached the quota.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct SeatRelease {
    /// The first `quota` ballots. They filled the seat and are used up.
    pub(crate) spent: Vec<BallotId>,
    /// Everything registered after the quota, to be transferred.
    pub(crate) surplus: Vec<BallotId>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Candidate {
    id: CandidateId,
    name: String,
    // Insertion order decides which ballots are spent and which are surplus.
    active_ballots: Vec<BallotId>,
    // Number of ballots naming this candidate anywhere. Only used for tiebreaks.
    total_appearances: u64,
    status: CandidateStatus,
}

impl Candidate {
    pub(crate) fn new(id: CandidateId, name: String, total_appearances: u64) -> Candidate {
        Candidate {
            id,
            name,
            active_ballots: Vec::new(),
            total_appearances,
            status: CandidateStatus::Running,
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.name.as_str()
    }

    #[cfg(test)]
    pub(crate) fn status(&self) -> CandidateStatus {
        self.status
    }

    pub(crate) fn is_running(&self) -> bool {
        self.status == CandidateStatus::Running
    }

    #[cfg(test)]
    pub(crate) fn total_appearances(&self) -> u64 {
        self.total_appearances
    }

    #[cfg(test)]
    pub(crate) fn active_ballots(&self) -> &[BallotId] {
        &self.active_ballots
    }

    /// Adds a ballot that currently points to this candidate.
    pub(crate) fn register_ballot(
        &mut self,
        bid: BallotId,
        ballot: &Ballot,
    ) -> Result<(), VotingErrors> {
        match ballot.current_candidate() {
            Ok(cid) if cid == self.id => {
                self.active_ballots.push(bid);
                Ok(())
            }
            _ => Err(VotingErrors::InvalidAssignment(self.name.clone())),
        }
    }

    pub(crate) fn vote_count(&self) -> VoteCount {
        VoteCount(self.active_ballots.len() as u64)
    }

    /// Sort key for the last-place search: fewer votes first, then fewer
    /// appearances across all the ballots.
    pub(crate) fn rank_key(&self) -> (VoteCount, u64) {
        (self.vote_count(), self.total_appearances)
    }

    pub(crate) fn ties_with(&self, other: &Candidate) -> bool {
        self.rank_key() == other.rank_key()
    }

    /// Seats this candidate if it holds at least `quota` votes.
    ///
    /// The ballots are split by insertion order. The caller must transfer the
    /// surplus and mark the spent ballots as eliminated.
    pub(crate) fn try_win_seat(&mut self, quota: VoteCount) -> Option<SeatRelease> {
        if !self.is_running() || self.vote_count() < quota {
            return None;
        }
        self.status = CandidateStatus::Seated;
        let surplus = self.active_ballots.split_off(quota.0 as usize);
        let spent = std::mem::take(&mut self.active_ballots);
        debug!(
            "try_win_seat: {} seated with {} spent ballots and a surplus of {}",
            self.name,
            spent.len(),
            surplus.len()
        );
        Some(SeatRelease { spent, surplus })
    }

    /// Seats this candidate without touching its ballots. Used when all the
    /// remaining candidates win at once.
    pub(crate) fn mark_seated(&mut self) {
        self.status = CandidateStatus::Seated;
    }

    /// Removes this candidate from the count and hands back all its ballots,
    /// in insertion order, for transfer.
    pub(crate) fn force_eliminate(&mut self) -> Vec<BallotId> {
        self.status = CandidateStatus::Eliminated;
        std::mem::take(&mut self.active_ballots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(id: u32, ballots: usize, total: u64) -> Candidate {
        let mut c = Candidate::new(CandidateId(id), format!("C{}", id), total);
        let b = Ballot::new(vec![CandidateId(id)]);
        for i in 0..ballots {
            c.register_ballot(BallotId(i), &b).unwrap();
        }
        c
    }

    #[test]
    fn register_checks_current_candidate() {
        let mut c = Candidate::new(CandidateId(0), "A".to_string(), 1);
        let other = Ballot::new(vec![CandidateId(1), CandidateId(0)]);
        assert_eq!(
            c.register_ballot(BallotId(0), &other),
            Err(VotingErrors::InvalidAssignment("A".to_string()))
        );
        let mut exhausted = Ballot::new(vec![CandidateId(0)]);
        exhausted.eliminate();
        assert!(c.register_ballot(BallotId(1), &exhausted).is_err());
        assert_eq!(c.vote_count(), VoteCount(0));
    }

    #[test]
    fn below_quota_has_no_side_effect() {
        let mut c = registered(0, 2, 2);
        assert_eq!(c.try_win_seat(VoteCount(3)), None);
        assert!(c.is_running());
        assert_eq!(c.vote_count(), VoteCount(2));
    }

    #[test]
    fn seat_splits_by_insertion_order() {
        let mut c = registered(0, 5, 5);
        let release = c.try_win_seat(VoteCount(2)).unwrap();
        assert_eq!(release.spent, vec![BallotId(0), BallotId(1)]);
        assert_eq!(release.surplus, vec![BallotId(2), BallotId(3), BallotId(4)]);
        assert_eq!(c.status(), CandidateStatus::Seated);
        assert_eq!(c.vote_count(), VoteCount(0));
    }

    #[test]
    fn exact_quota_has_no_surplus() {
        let mut c = registered(0, 3, 3);
        let release = c.try_win_seat(VoteCount(3)).unwrap();
        assert_eq!(release.spent.len(), 3);
        assert!(release.surplus.is_empty());
    }

    #[test]
    fn force_eliminate_releases_everything() {
        let mut c = registered(0, 3, 4);
        assert_eq!(
            c.force_eliminate(),
            vec![BallotId(0), BallotId(1), BallotId(2)]
        );
        assert_eq!(c.status(), CandidateStatus::Eliminated);
        assert!(c.active_ballots().is_empty());
        // An eliminated candidate can no longer win.
        assert_eq!(c.try_win_seat(VoteCount(0)), None);
    }

    #[test]
    fn fewer_appearances_rank_lower_on_equal_votes() {
        let a = registered(0, 2, 5);
        let b = registered(1, 2, 3);
        let c = registered(2, 1, 9);
        assert!(b.rank_key() < a.rank_key());
        assert!(c.rank_key() < b.rank_key());
        assert!(!a.ties_with(&b));
        assert!(a.ties_with(&registered(3, 2, 5)));
    }
}
