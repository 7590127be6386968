//! In-memory fingerprint index and song registry.
//!
//! Both live behind the engine's single critical section; this module only
//! defines the data and its append-only mutations.

use std::collections::HashMap;

use serde::Serialize;

use super::fingerprint::{Fingerprint, PairHash};

/// A registered reference recording.
#[derive(Debug, Clone, Serialize)]
pub struct Song {
    pub id: usize,
    pub name: String,
    pub fingerprints: usize,
    pub external_ref: String,
}

/// Multimap from pair hash to `(song_id, anchor_frame)` locators. Buckets
/// are append-only and keep duplicates; repeated locators act as
/// multiplicity weights during voting.
#[derive(Debug, Default)]
pub struct FingerprintIndex {
    buckets: HashMap<PairHash, Vec<(usize, usize)>>,
}

impl FingerprintIndex {
    pub fn insert(&mut self, hash: PairHash, song_id: usize, anchor_frame: usize) {
        self.buckets.entry(hash).or_default().push((song_id, anchor_frame));
    }

    pub fn get(&self, hash: PairHash) -> Option<&[(usize, usize)]> {
        self.buckets.get(&hash).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// The shared mutable state: index plus registry. A song's fingerprints and
/// its registry entry are committed together, so a reader holding the lock
/// sees either all of a song or none of it.
#[derive(Debug, Default)]
pub struct Store {
    pub index: FingerprintIndex,
    pub songs: Vec<Song>,
}

impl Store {
    /// Register a song: the id is the registry length at append time.
    pub fn register(
        &mut self,
        name: String,
        external_ref: String,
        fingerprints: &[Fingerprint],
    ) -> usize {
        let song_id = self.songs.len();
        for fp in fingerprints {
            self.index.insert(fp.hash, song_id, fp.frame_index);
        }
        self.songs.push(Song {
            id: song_id,
            name,
            fingerprints: fingerprints.len(),
            external_ref,
        });
        song_id
    }
}
