//! Linear undo/redo over immutable song snapshots.

use std::sync::Arc;

use crate::song::Song;

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Arc<Song>>,
    cursor: usize,
}

impl History {
    pub fn new(song: Song) -> Self {
        History { entries: vec![Arc::new(song)], cursor: 0 }
    }

    pub fn current(&self) -> &Arc<Song> {
        &self.entries[self.cursor]
    }

    /// Make `song` current. Anything that was undone is discarded.
    pub fn commit(&mut self, song: Song) -> &Arc<Song> {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Arc::new(song));
        self.cursor = self.entries.len() - 1;
        self.current()
    }

    pub fn undo(&mut self) -> Option<&Arc<Song>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&Arc<Song>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{Instrument, InstrumentCategory};
    use crate::song::fixtures::demo_song;

    fn with_chords(song: &Song, name: &str) -> Song {
        song.with_instrument(2, Instrument::new(name, InstrumentCategory::Chords)).unwrap()
    }

    #[test]
    fn undo_redo_walks_snapshots() {
        let mut history = History::new(demo_song());
        let first = Arc::clone(history.current());
        assert!(!history.can_undo());

        let edited = with_chords(&first, "Synth Pad");
        let second = Arc::clone(history.commit(edited));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert!(Arc::ptr_eq(history.undo().unwrap(), &first));
        assert!(history.undo().is_none());
        assert!(Arc::ptr_eq(history.redo().unwrap(), &second));
        assert!(history.redo().is_none());
    }

    #[test]
    fn commit_after_undo_drops_redo_branch() {
        let mut history = History::new(demo_song());
        let base = Arc::clone(history.current());
        history.commit(with_chords(&base, "Synth Pad"));
        history.commit(with_chords(&base, "Electric Piano"));
        assert_eq!(history.len(), 3);

        history.undo();
        history.undo();
        history.commit(with_chords(&base, "Grand Piano"));

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current().tracks[2].instrument.name, "Grand Piano");
        assert!(Arc::ptr_eq(history.undo().unwrap(), &base));
    }
}
