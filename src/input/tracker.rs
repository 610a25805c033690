//! Contact lifecycle tracking between polling cycles.
//!
//! The controller reports which contacts exist right now; it does not say
//! which ones appeared or vanished. The tracker keeps the previous cycle's
//! contacts and classifies each track id by set membership, with no
//! coordinate change detection involved.

use std::collections::BTreeMap;

use crate::drivers::gt911::event::{Contact, TrackId};

/// The contacts present in one fully-read polling cycle, keyed by the
/// controller-assigned track id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchState {
    contacts: BTreeMap<TrackId, Contact>,
}

impl TouchState {
    /// Adds a contact, replacing any earlier contact with the same track id.
    pub fn insert(&mut self, contact: Contact) {
        self.contacts.insert(contact.track_id, contact);
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn contains(&self, track_id: TrackId) -> bool {
        self.contacts.contains_key(&track_id)
    }

    pub fn get(&self, track_id: TrackId) -> Option<&Contact> {
        self.contacts.get(&track_id)
    }

    /// Track ids in ascending order.
    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.contacts.keys().copied()
    }

    /// Contacts in ascending track id order.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }
}

impl FromIterator<Contact> for TouchState {
    fn from_iter<T: IntoIterator<Item = Contact>>(iter: T) -> Self {
        let mut state = Self::default();
        for contact in iter {
            state.insert(contact);
        }
        state
    }
}

/// What happened to one track between consecutive cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTransition {
    /// The track id appeared this cycle.
    New(Contact),
    /// The track id was present last cycle and still is. Reported every
    /// cycle the contact persists, moving or not.
    Updated(Contact),
    /// The track id was present last cycle and is gone.
    Ended(TrackId),
}

/// One cycle's transitions, grouped for batched emission. Groups are
/// disjoint and each is ordered by track id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleDiff {
    pub new: Vec<Contact>,
    pub updated: Vec<Contact>,
    pub ended: Vec<TrackId>,
}

impl CycleDiff {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.updated.is_empty() && self.ended.is_empty()
    }

    /// Flattens the groups into per-track transitions in emission order:
    /// new, then updated, then ended.
    pub fn transitions(&self) -> impl Iterator<Item = TrackTransition> + '_ {
        let new = self.new.iter().copied().map(TrackTransition::New);
        let updated = self.updated.iter().copied().map(TrackTransition::Updated);
        let ended = self.ended.iter().copied().map(TrackTransition::Ended);
        new.chain(updated).chain(ended)
    }
}

/// Classifies every track in `current` and `previous`: ids only in
/// `current` are new, ids in both are updated, ids only in `previous` have
/// ended. New and updated together cover `current`; updated and ended
/// together cover `previous`.
pub fn diff(current: &TouchState, previous: &TouchState) -> CycleDiff {
    let mut cycle = CycleDiff::default();
    for contact in current.contacts() {
        if previous.contains(contact.track_id) {
            cycle.updated.push(*contact);
        } else {
            cycle.new.push(*contact);
        }
    }
    for track_id in previous.track_ids() {
        if !current.contains(track_id) {
            cycle.ended.push(track_id);
        }
    }
    cycle
}

/// Owns the previous cycle's state and diffs each new cycle against it.
#[derive(Debug, Default)]
pub struct TouchTracker {
    previous: TouchState,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifies the current cycle against the retained previous one. The
    /// retained state is untouched until [`commit`](TouchTracker::commit),
    /// so a failed emission can leave the cycle unconsumed.
    pub fn diff(&self, current: &TouchState) -> CycleDiff {
        diff(current, &self.previous)
    }

    /// Replaces the retained state wholesale with the emitted cycle. Ended
    /// tracks fall out here; they never linger into the next diff.
    pub fn commit(&mut self, current: TouchState) {
        self.previous = current;
    }

    pub fn previous(&self) -> &TouchState {
        &self.previous
    }
}
