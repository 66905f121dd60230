use crate::{CandidateId, VotingErrors};

// Position of a ballot in its list of preferences.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
enum Cursor {
    At(usize),
    Exhausted,
}

/// One voter's ranked preferences.
///
/// The preferences never change after construction. Only the cursor moves,
/// and only forward, until the ballot is eliminated. The ballot never
/// registers itself with a candidate: that is the job of the registry in
/// [`crate::election`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct Ballot {
    preferences: Vec<CandidateId>,
    cursor: Cursor,
}

impl Ballot {
    /// A ballot without any preference starts exhausted.
    pub(crate) fn new(preferences: Vec<CandidateId>) -> Ballot {
        let cursor = if preferences.is_empty() {
            Cursor::Exhausted
        } else {
            Cursor::At(0)
        };
        Ballot {
            preferences,
            cursor,
        }
    }

    pub(crate) fn is_eliminated(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    pub(crate) fn len(&self) -> usize {
        self.preferences.len()
    }

    /// The index of the preference this ballot currently counts toward.
    pub(crate) fn current_choice(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(idx) => Some(idx),
            Cursor::Exhausted => None,
        }
    }

    pub(crate) fn current_candidate(&self) -> Result<CandidateId, VotingErrors> {
        match self.cursor {
            Cursor::At(idx) => Ok(self.preferences[idx]),
            Cursor::Exhausted => Err(VotingErrors::InvalidState),
        }
    }

    pub(crate) fn preference_at(&self, index: usize) -> Result<CandidateId, VotingErrors> {
        self.preferences
            .get(index)
            .cloned()
            .ok_or(VotingErrors::IndexOutOfRange {
                index,
                len: self.preferences.len(),
            })
    }

    pub(crate) fn mentions(&self, cid: CandidateId) -> bool {
        self.preferences.contains(&cid)
    }

    /// Marks the ballot as used up. Used for the votes that filled a seat.
    pub(crate) fn eliminate(&mut self) {
        self.cursor = Cursor::Exhausted;
    }

    /// Moves to the next preference naming a candidate that is still running.
    ///
    /// Several decided candidates may be skipped in one call. Returns the new
    /// current candidate, or None if the ballot is now exhausted. Calling it
    /// on an exhausted ballot does nothing.
    pub(crate) fn advance_choice<F>(&mut self, is_running: F) -> Option<CandidateId>
    where
        F: Fn(CandidateId) -> bool,
    {
        let start = match self.cursor {
            Cursor::At(idx) => idx + 1,
            Cursor::Exhausted => return None,
        };
        let next = self
            .preferences
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, cid)| is_running(**cid));
        match next {
            Some((idx, cid)) => {
                self.cursor = Cursor::At(idx);
                Some(*cid)
            }
            None => {
                self.cursor = Cursor::Exhausted;
                None
            }
        }
    }
}
