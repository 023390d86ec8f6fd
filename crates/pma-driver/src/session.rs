//! Save/restore sessions and the chain cursor
//!
//! The chip walks its neurons with an internal cursor that only moves
//! forward: every read (save) or write (restore) of CAT steps to the next
//! neuron. The host mirrors that position in a [`ChainCursor`] so replay
//! order is an explicit value rather than hidden device state.
//!
//! A session brackets the walk. `begin_*` captures NSR into a [`SavedMode`]
//! token, sets the network-mode bit and resets the chain; the token must be
//! handed back to the matching `end_*` call. [`SaveSession`] and
//! [`RestoreSession`] hold the token for you and hand it back on every exit
//! path, including early returns and panics.

use crate::bus::RegisterBus;
use crate::error::{PmaError, Result};
use crate::matcher::PatternMatcher;
use crate::record::NeuronRecord;
use pma_chip::limits::MAX_NEURONS;

/// NSR value captured when a session began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "pass the saved mode to the matching end call"]
pub struct SavedMode(u16);

impl SavedMode {
    pub(crate) const fn new(nsr: u16) -> Self {
        Self(nsr)
    }

    /// Captured NSR value
    pub const fn nsr(self) -> u16 {
        self.0
    }
}

/// Host-side mirror of the chip's chain cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainCursor {
    position: usize,
}

impl ChainCursor {
    /// Cursor at the first neuron, as left by RSTCHAIN.
    pub const fn reset() -> Self {
        Self { position: 0 }
    }

    /// Zero-based chain position
    pub const fn position(&self) -> usize {
        self.position
    }

    /// One-based identifier of the neuron under the cursor
    pub fn neuron_id(&self) -> u16 {
        u16::try_from(self.position + 1).unwrap_or(u16::MAX)
    }

    pub(crate) fn advance(&mut self) {
        self.position += 1;
    }
}

/// Open save session; iterate it to snapshot the committed neurons in chain
/// order.
///
/// Yields exactly as many records as were committed when the session began.
/// [`next_record`](Self::next_record) reads past that bound when the caller
/// wants uncommitted cells too.
#[derive(Debug)]
pub struct SaveSession<'a, B: RegisterBus> {
    matcher: &'a mut PatternMatcher<B>,
    saved: Option<SavedMode>,
    cursor: ChainCursor,
    remaining: usize,
}

impl<'a, B: RegisterBus> SaveSession<'a, B> {
    pub(crate) fn begin(matcher: &'a mut PatternMatcher<B>) -> Self {
        // The count register is meaningless once the mode bit is set
        let committed = usize::from(matcher.committed_count());
        let (saved, cursor) = matcher.begin_save_mode();
        Self {
            matcher,
            saved: Some(saved),
            cursor,
            remaining: committed,
        }
    }

    /// Read the neuron under the cursor and advance
    pub fn next_record(&mut self) -> NeuronRecord {
        let mut record = NeuronRecord::default();
        self.matcher
            .iterate_neurons_to_save(&mut self.cursor, &mut record);
        self.remaining = self.remaining.saturating_sub(1);
        record
    }

    /// Current cursor
    pub const fn cursor(&self) -> ChainCursor {
        self.cursor
    }

    /// Committed neurons not yet read
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// End the session, restoring the captured NSR
    pub fn finish(mut self) {
        if let Some(saved) = self.saved.take() {
            self.matcher.end_save_mode_restoring(saved);
        }
    }

    /// End the session by zeroing NSR
    pub fn finish_reset(mut self) {
        self.saved = None;
        self.matcher.end_save_mode_reset();
    }
}

impl<B: RegisterBus> Iterator for SaveSession<'_, B> {
    type Item = NeuronRecord;

    fn next(&mut self) -> Option<NeuronRecord> {
        (self.remaining > 0).then(|| self.next_record())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<B: RegisterBus> Drop for SaveSession<'_, B> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.matcher.end_save_mode_restoring(saved);
        }
    }
}

/// Open restore session; push records in the order they were saved.
///
/// Beginning the session has already forgotten all committed knowledge.
#[derive(Debug)]
pub struct RestoreSession<'a, B: RegisterBus> {
    matcher: &'a mut PatternMatcher<B>,
    saved: Option<SavedMode>,
    cursor: ChainCursor,
}

impl<'a, B: RegisterBus> RestoreSession<'a, B> {
    pub(crate) fn begin(matcher: &'a mut PatternMatcher<B>) -> Self {
        let (saved, cursor) = matcher.begin_restore_mode();
        Self {
            matcher,
            saved: Some(saved),
            cursor,
        }
    }

    /// Replay one record into the neuron under the cursor and advance
    ///
    /// # Errors
    ///
    /// Returns [`PmaError::ChainFull`] once every neuron has been written.
    pub fn push(&mut self, record: &NeuronRecord) -> Result<()> {
        if self.cursor.position() >= MAX_NEURONS {
            return Err(PmaError::ChainFull { max: MAX_NEURONS });
        }
        self.matcher
            .iterate_neurons_to_restore(&mut self.cursor, record);
        Ok(())
    }

    /// Current cursor
    pub const fn cursor(&self) -> ChainCursor {
        self.cursor
    }

    /// End the session, restoring the captured NSR
    pub fn finish(mut self) {
        if let Some(saved) = self.saved.take() {
            self.matcher.end_restore_mode_restoring(saved);
        }
    }

    /// End the session by zeroing NSR
    pub fn finish_reset(mut self) {
        self.saved = None;
        self.matcher.end_restore_mode_reset();
    }
}

impl<B: RegisterBus> Drop for RestoreSession<'_, B> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.matcher.end_restore_mode_restoring(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_starts_at_first_neuron() {
        let mut cursor = ChainCursor::reset();
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.neuron_id(), 1);
        cursor.advance();
        assert_eq!(cursor.neuron_id(), 2);
    }

    #[test]
    fn saved_mode_exposes_nsr() {
        assert_eq!(SavedMode::new(0x20).nsr(), 0x20);
    }
}
