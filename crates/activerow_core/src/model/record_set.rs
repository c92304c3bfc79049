//! Positionable collection of fetched records.
//!
//! # Responsibility
//! - Own the rows of the last fetch plus the active (positioned) record.
//! - Implement bidirectional cursor movement with a `-1` sentinel.
//!
//! # Invariants
//! - `position == -1` whenever the cursor is not positioned on a row.
//! - `has_records == false` implies `position == -1`.
//! - While locked, movement, `reset` and `remove` are no-ops.
//! - The active record is a copy; edits reach `rows` only through
//!   `write_back`/`push`.

use crate::model::record::Record;

/// Fetched rows with a movable cursor.
#[derive(Debug, Clone)]
pub struct RecordSet {
    key_field: String,
    rows: Vec<Record>,
    has_records: bool,
    position: isize,
    current: Record,
    in_position: bool,
    locked: bool,
}

impl RecordSet {
    pub fn new(key_field: impl Into<String>) -> Self {
        let key_field = key_field.into();
        Self {
            current: Record::new(key_field.as_str()),
            key_field,
            rows: Vec::new(),
            has_records: false,
            position: -1,
            in_position: false,
            locked: false,
        }
    }

    /// Replaces all rows with a fresh fetch result.
    ///
    /// Returns `false` without touching state when locked.
    pub fn replace(&mut self, rows: Vec<Record>) -> bool {
        if !self.reset() {
            return false;
        }
        self.rows = rows;
        self.has_records = true;
        true
    }

    /// Drops all rows and un-positions the cursor.
    pub fn reset(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.unposition();
        self.rows.clear();
        self.has_records = false;
        true
    }

    /// Un-positions the cursor and empties the active record.
    ///
    /// Returns `false` without touching state when locked.
    pub fn clear(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.unposition();
        true
    }

    pub fn first(&mut self) -> Option<usize> {
        self.move_to(|_, _| 0)
    }

    pub fn last(&mut self) -> Option<usize> {
        self.move_to(|_, count| count - 1)
    }

    pub fn next(&mut self) -> Option<usize> {
        self.move_to(|position, _| position + 1)
    }

    /// Moves back one row; from the unset state this wraps to the last row.
    pub fn prev(&mut self) -> Option<usize> {
        self.move_to(|position, count| {
            let from = if position == -1 { count } else { position };
            from - 1
        })
    }

    pub fn get(&mut self, index: isize) -> Option<usize> {
        self.move_to(|_, _| index)
    }

    /// Splices the positioned row out of `rows`.
    ///
    /// The cursor is left in place; callers step back with `prev`.
    pub fn remove(&mut self) -> bool {
        if self.locked {
            return false;
        }
        match self.index() {
            Some(index) => {
                self.rows.remove(index);
                true
            }
            None => false,
        }
    }

    /// Reverses row order and clears the cursor. No-op while locked.
    pub fn invert(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.unposition();
        self.rows.reverse();
        true
    }

    /// Appends a newly persisted record and positions on it.
    ///
    /// While locked the row is still appended but the cursor stays put.
    pub fn push(&mut self, record: Record) {
        self.has_records = true;
        if self.locked {
            self.rows.push(record);
            return;
        }
        self.rows.push(record.clone());
        self.position = self.rows.len() as isize - 1;
        self.current = record;
        self.in_position = true;
    }

    /// Writes the active record back into its positioned slot.
    ///
    /// Falls back to `push` when the cursor does not point at a row. While
    /// locked only the slot is updated.
    pub fn write_back(&mut self, record: Record) {
        match self.index() {
            Some(index) if self.locked => self.rows[index] = record,
            Some(index) => {
                self.rows[index] = record.clone();
                self.current = record;
                self.in_position = true;
            }
            None => self.push(record),
        }
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn current(&self) -> &Record {
        &self.current
    }

    pub(crate) fn current_mut(&mut self) -> &mut Record {
        &mut self.current
    }

    /// Replaces the active record; it counts as positioned when it has a key.
    pub fn set_current(&mut self, record: Record) {
        self.in_position = !record.is_new();
        self.current = record;
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self) -> isize {
        self.position
    }

    pub fn has_records(&self) -> bool {
        self.has_records
    }

    pub fn is_available(&self) -> bool {
        self.in_position
    }

    fn move_to(&mut self, target: impl FnOnce(isize, isize) -> isize) -> Option<usize> {
        if self.locked {
            return None;
        }
        self.position = target(self.position, self.rows.len() as isize);
        self.fetch()
    }

    fn fetch(&mut self) -> Option<usize> {
        self.in_position = false;
        match self.index() {
            Some(index) => {
                self.current = self.rows[index].clone();
                self.in_position = true;
                Some(index)
            }
            None => {
                self.unposition();
                None
            }
        }
    }

    fn unposition(&mut self) {
        self.position = -1;
        self.in_position = false;
        self.current = Record::new(self.key_field.as_str());
    }

    fn index(&self) -> Option<usize> {
        if !self.has_records {
            return None;
        }
        usize::try_from(self.position)
            .ok()
            .filter(|index| *index < self.rows.len())
    }
}
