use log::{debug, info, warn};

use std::collections::BTreeMap;

use crate::ballot::Ballot;
use crate::candidate::Candidate;
use crate::config::*;
use crate::{BallotId, CandidateId, RoundId, VoteCount};

// A decided seat. Placeholders are distinct variants, never fake candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub(crate) enum Seat {
    Seated(CandidateId),
    Vacant,
    Tied,
}

// Where the ballots leaving one candidate ended up.
// Keyed by candidate id so that the reporting order is the registration order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub(crate) struct TransferTally {
    pub(crate) transfers: BTreeMap<CandidateId, VoteCount>,
    pub(crate) exhausted: VoteCount,
}

// Resolution of the last-place search for one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) enum LastPlace {
    Eliminated(Vec<(CandidateId, TransferTally)>),
    AllSeated(Vec<CandidateId>),
    Tied,
}

/// Owns every ballot and every candidate. Ballots and candidates refer to
/// each other by index only.
///
/// This is the only place where a ballot changes hands: a ballot is advanced
/// and then registered on its new candidate in the same step.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Registry {
    ballots: Vec<Ballot>,
    candidates: Vec<Candidate>,
}

fn candidate_at(candidates: &mut [Candidate], cid: CandidateId) -> Result<&mut Candidate, VotingErrors> {
    let len = candidates.len();
    candidates
        .get_mut(cid.index())
        .ok_or(VotingErrors::IndexOutOfRange {
            index: cid.index(),
            len,
        })
}

impl Registry {
    fn new(names: Vec<String>, preferences: Vec<Vec<CandidateId>>) -> Result<Registry, VotingErrors> {
        let ballots: Vec<Ballot> = preferences.into_iter().map(Ballot::new).collect();
        let candidates: Vec<Candidate> = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let cid = CandidateId(idx as u32);
                let total_appearances = ballots.iter().filter(|b| b.mentions(cid)).count() as u64;
                Candidate::new(cid, name, total_appearances)
            })
            .collect();

        let mut registry = Registry {
            ballots,
            candidates,
        };
        let Registry {
            ballots,
            candidates,
        } = &mut registry;
        for (idx, ballot) in ballots.iter().enumerate() {
            // Ballots without any preference never count toward anyone.
            if ballot.is_eliminated() {
                continue;
            }
            let cid = ballot.current_candidate()?;
            candidate_at(candidates, cid)?.register_ballot(BallotId(idx), ballot)?;
        }
        Ok(registry)
    }

    pub(crate) fn candidate(&self, cid: CandidateId) -> Result<&Candidate, VotingErrors> {
        self.candidates
            .get(cid.index())
            .ok_or(VotingErrors::IndexOutOfRange {
                index: cid.index(),
                len: self.candidates.len(),
            })
    }

    #[cfg(test)]
    pub(crate) fn ballot(&self, bid: BallotId) -> Result<&Ballot, VotingErrors> {
        self.ballots.get(bid.0).ok_or(VotingErrors::IndexOutOfRange {
            index: bid.0,
            len: self.ballots.len(),
        })
    }

    fn transfer(&mut self, moved: Vec<BallotId>) -> Result<TransferTally, VotingErrors> {
        let Registry {
            ballots,
            candidates,
        } = self;
        let num_ballots = ballots.len();
        let mut tally = TransferTally::default();
        for bid in moved {
            let ballot = ballots
                .get_mut(bid.0)
                .ok_or(VotingErrors::IndexOutOfRange {
                    index: bid.0,
                    len: num_ballots,
                })?;
            let next = ballot.advance_choice(|cid| {
                candidates
                    .get(cid.index())
                    .map(|c| c.is_running())
                    .unwrap_or(false)
            });
            match next {
                Some(cid) => {
                    let choice = ballot.current_choice().ok_or(VotingErrors::InvalidState)?;
                    if ballot.preference_at(choice)? != cid {
                        return Err(VotingErrors::InvalidState);
                    }
                    debug!(
                        "transfer: ballot {:?} moves to {:?}, choice {} of {}",
                        bid,
                        cid,
                        choice + 1,
                        ballot.len()
                    );
                    candidate_at(candidates, cid)?.register_ballot(bid, ballot)?;
                    *tally.transfers.entry(cid).or_insert(VoteCount::EMPTY) += VoteCount(1);
                }
                None => {
                    tally.exhausted += VoteCount(1);
                }
            }
        }
        Ok(tally)
    }

    /// Seats the candidate if it reached the quota, spends the first `quota`
    /// ballots and transfers the surplus.
    pub(crate) fn try_win_seat(
        &mut self,
        cid: CandidateId,
        quota: VoteCount,
    ) -> Result<Option<TransferTally>, VotingErrors> {
        let release = match candidate_at(&mut self.candidates, cid)?.try_win_seat(quota) {
            Some(release) => release,
            None => return Ok(None),
        };
        let num_ballots = self.ballots.len();
        for bid in release.spent.iter() {
            self.ballots
                .get_mut(bid.0)
                .ok_or(VotingErrors::IndexOutOfRange {
                    index: bid.0,
                    len: num_ballots,
                })?
                .eliminate();
        }
        self.transfer(release.surplus).map(Some)
    }

    /// Removes the candidate for good and transfers all its ballots.
    pub(crate) fn force_eliminate(&mut self, cid: CandidateId) -> Result<TransferTally, VotingErrors> {
        let released = candidate_at(&mut self.candidates, cid)?.force_eliminate();
        self.transfer(released)
    }

    fn mark_seated(&mut self, cid: CandidateId) -> Result<(), VotingErrors> {
        candidate_at(&mut self.candidates, cid)?.mark_seated();
        Ok(())
    }

    fn eliminated_ballots(&self) -> VoteCount {
        VoteCount(self.ballots.iter().filter(|b| b.is_eliminated()).count() as u64)
    }

    /// Every ballot is either held by exactly one candidate or eliminated.
    pub(crate) fn ballots_accounted(&self) -> VoteCount {
        let held: VoteCount = self.candidates.iter().map(|c| c.vote_count()).sum();
        held + self.eliminated_ballots()
    }

    fn transfer_stats(&self, cid: CandidateId, tally: &TransferTally) -> Result<TransferStats, VotingErrors> {
        let mut transfers: Vec<(String, u64)> = Vec::new();
        for (to_cid, count) in tally.transfers.iter() {
            transfers.push((self.candidate(*to_cid)?.name().to_string(), count.0));
        }
        Ok(TransferStats {
            name: self.candidate(cid)?.name().to_string(),
            transfers,
            exhausted: tally.exhausted.0,
        })
    }
}

/// Droop quota, computed once from the original number of ballots.
pub(crate) fn get_quota(total_ballots: VoteCount, seats: u32) -> VoteCount {
    VoteCount(total_ballots.0 / (seats as u64 + 1) + 1)
}

/// The round-by-round count.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Election {
    registry: Registry,
    // Undecided candidates, kept sorted by rank key. The sort is stable, so
    // candidates with equal keys keep their previous relative order.
    remaining: Vec<CandidateId>,
    winners: Vec<Seat>,
    quota: VoteCount,
    seats_total: usize,
    total_ballots: VoteCount,
    needs_runoff: bool,
    round_stats: Vec<RoundStats>,
}

impl Election {
    pub(crate) fn new(
        names: Vec<String>,
        preferences: Vec<Vec<CandidateId>>,
        seats: u32,
    ) -> Result<Election, VotingErrors> {
        if seats == 0 {
            return Err(VotingErrors::InvalidSeatCount);
        }
        let total_ballots = VoteCount(preferences.len() as u64);
        let quota = get_quota(total_ballots, seats);
        let remaining: Vec<CandidateId> = (0..names.len()).map(|idx| CandidateId(idx as u32)).collect();
        let registry = Registry::new(names, preferences)?;
        debug!(
            "Election::new: {} ballots, {} candidates, {} seats, quota {:?}",
            total_ballots.0,
            remaining.len(),
            seats,
            quota
        );
        let mut election = Election {
            registry,
            remaining,
            winners: Vec::new(),
            quota,
            seats_total: seats as usize,
            total_ballots,
            needs_runoff: false,
            round_stats: Vec::new(),
        };
        election.sort_remaining();
        Ok(election)
    }

    pub(crate) fn quota(&self) -> VoteCount {
        self.quota
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn remaining(&self) -> &[CandidateId] {
        &self.remaining
    }

    #[cfg(test)]
    pub(crate) fn num_winners(&self) -> usize {
        self.winners.len()
    }

    #[cfg(test)]
    pub(crate) fn winner(&self, index: usize) -> Result<Seat, VotingErrors> {
        self.winners
            .get(index)
            .cloned()
            .ok_or(VotingErrors::IndexOutOfRange {
                index,
                len: self.winners.len(),
            })
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.needs_runoff || self.winners.len() >= self.seats_total
    }

    fn sort_remaining(&mut self) {
        let candidates = &self.registry.candidates;
        self.remaining
            .sort_by_key(|cid| candidates[cid.index()].rank_key());
    }

    fn pad_winners(&mut self, seat: Seat) {
        while self.winners.len() < self.seats_total {
            self.winners.push(seat);
        }
    }

    /// Seats the first candidate, in ranking order, that reached the quota.
    /// At most one seat is filled per call.
    pub(crate) fn process_winners(&mut self) -> Result<Option<(CandidateId, TransferTally)>, VotingErrors> {
        for idx in 0..self.remaining.len() {
            let cid = self.remaining[idx];
            if let Some(tally) = self.registry.try_win_seat(cid, self.quota)? {
                self.remaining.remove(idx);
                self.winners.push(Seat::Seated(cid));
                self.sort_remaining();
                return Ok(Some((cid, tally)));
            }
        }
        Ok(None)
    }

    // Size of the group tied for last place: the prefix of the sorted
    // candidates sharing the rank key of the first one.
    fn tied_prefix_len(&self) -> Result<usize, VotingErrors> {
        let last_place = match self.remaining.first() {
            Some(cid) => self.registry.candidate(*cid)?,
            None => return Ok(0),
        };
        let mut tied = 0;
        for cid in self.remaining.iter() {
            if !self.registry.candidate(*cid)?.ties_with(last_place) {
                break;
            }
            tied += 1;
        }
        Ok(tied)
    }

    /// Removes the candidates tied for last place, or seats everyone left, or
    /// declares an unbreakable tie.
    pub(crate) fn remove_last_place_candidates(&mut self) -> Result<LastPlace, VotingErrors> {
        let tied_count = self.tied_prefix_len()? as isize;
        let available_seats = self.seats_total as isize - self.winners.len() as isize;
        let remaining_losers = self.remaining.len() as isize - available_seats;
        debug!(
            "remove_last_place_candidates: tied {} available seats {} remaining losers {}",
            tied_count, available_seats, remaining_losers
        );

        if tied_count <= remaining_losers {
            let tied: Vec<CandidateId> = self.remaining.drain(..tied_count as usize).collect();
            let mut eliminated: Vec<(CandidateId, TransferTally)> = Vec::new();
            for cid in tied {
                let tally = self.registry.force_eliminate(cid)?;
                eliminated.push((cid, tally));
            }
            self.sort_remaining();
            Ok(LastPlace::Eliminated(eliminated))
        } else if remaining_losers <= 0 {
            let seated: Vec<CandidateId> = self.remaining.drain(..).collect();
            for cid in seated.iter() {
                self.registry.mark_seated(*cid)?;
                self.winners.push(Seat::Seated(*cid));
            }
            self.pad_winners(Seat::Vacant);
            Ok(LastPlace::AllSeated(seated))
        } else {
            self.pad_winners(Seat::Tied);
            self.needs_runoff = true;
            Ok(LastPlace::Tied)
        }
    }

    // Votes of the undecided candidates, in registration order.
    fn current_tally(&self) -> Result<Vec<(String, u64)>, VotingErrors> {
        let mut cids = self.remaining.clone();
        cids.sort();
        let mut tally = Vec::new();
        for cid in cids {
            let c = self.registry.candidate(cid)?;
            tally.push((c.name().to_string(), c.vote_count().0));
        }
        Ok(tally)
    }

    pub(crate) fn run_round(&mut self) -> Result<RoundOutcome, VotingErrors> {
        let round: RoundId = self.round_stats.len() as RoundId + 1;
        let tally = self.current_tally()?;
        info!("Round {} (winning threshold: {})", round, self.quota.0);
        for (name, count) in tally.iter() {
            info!("{:>8} {}", count, name);
        }
        let mut stats = RoundStats {
            round,
            tally,
            exhausted: self.registry.eliminated_ballots().0,
            outcome: RoundOutcome::SeatFilled,
            tally_results_elected: Vec::new(),
            tally_result_eliminated: Vec::new(),
        };

        if let Some((cid, transfers)) = self.process_winners()? {
            let ts = self.registry.transfer_stats(cid, &transfers)?;
            info!("Round {}: {} -> elected, surplus: {:?}", round, ts.name, ts.transfers);
            stats.tally_results_elected.push(ts);
        } else {
            match self.remove_last_place_candidates()? {
                LastPlace::Eliminated(eliminated) => {
                    stats.outcome = RoundOutcome::CandidateRemoved;
                    for (cid, transfers) in eliminated.iter() {
                        let ts = self.registry.transfer_stats(*cid, transfers)?;
                        info!(
                            "Round {}: {} -> eliminated: {:?}, {} exhausted",
                            round, ts.name, ts.transfers, ts.exhausted
                        );
                        stats.tally_result_eliminated.push(ts);
                    }
                }
                LastPlace::AllSeated(seated) => {
                    for cid in seated {
                        let name = self.registry.candidate(cid)?.name().to_string();
                        info!("Round {}: {} -> elected (no remaining competition)", round, name);
                        stats.tally_results_elected.push(TransferStats {
                            name,
                            transfers: Vec::new(),
                            exhausted: 0,
                        });
                    }
                }
                LastPlace::Tied => {
                    stats.outcome = RoundOutcome::UnbreakableTie;
                    warn!("Round {}: unbreakable tie, a runoff election must be held", round);
                }
            }
        }

        debug_assert_eq!(self.registry.ballots_accounted(), self.total_ballots);
        let outcome = stats.outcome;
        self.round_stats.push(stats);
        Ok(outcome)
    }

    /// Runs rounds until every seat is decided or a tie stops the count.
    pub(crate) fn run(mut self) -> Result<ElectionResult, VotingErrors> {
        // Every round but the last removes at least one candidate.
        let max_rounds = self.registry.candidates.len() + 1;
        while !self.is_complete() {
            if self.round_stats.len() >= max_rounds {
                return Err(VotingErrors::NoConvergence);
            }
            self.run_round()?;
        }
        self.into_result()
    }

    /// Seats every candidate in registration order without counting, and
    /// leaves the remaining seats vacant.
    pub(crate) fn seat_all_uncontested(mut self) -> Result<ElectionResult, VotingErrors> {
        let mut cids = std::mem::take(&mut self.remaining);
        cids.sort();
        for cid in cids {
            self.registry.mark_seated(cid)?;
            self.winners.push(Seat::Seated(cid));
        }
        self.pad_winners(Seat::Vacant);
        self.into_result()
    }

    fn into_result(self) -> Result<ElectionResult, VotingErrors> {
        let mut seats: Vec<(u32, WinnerSlot)> = Vec::new();
        for (idx, seat) in self.winners.iter().enumerate() {
            let slot = match seat {
                Seat::Seated(cid) => WinnerSlot::Seated(self.registry.candidate(*cid)?.name().to_string()),
                Seat::Vacant => WinnerSlot::Vacant,
                Seat::Tied => WinnerSlot::Tied,
            };
            seats.push((idx as u32 + 1, slot));
        }
        Ok(ElectionResult {
            quota: self.quota.0,
            seats,
            needs_runoff: self.needs_runoff,
            round_stats: self.round_stats,
        })
    }
}
