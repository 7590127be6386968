//! Offset-histogram voting.
//!
//! A query clip taken from a reference recording produces fingerprints
//! whose database anchor times are all shifted by one constant, the clip's
//! start position. Votes are binned by `(song, Δ)` where Δ = db anchor −
//! query anchor; the tallest bar names the song and the alignment, and its
//! height is the score. Random hash collisions scatter Δ and never
//! concentrate.

use std::collections::HashMap;

use serde::Serialize;

use super::fingerprint::Fingerprint;
use super::store::Store;

/// Candidate list length returned with a match.
const MAX_CANDIDATES: usize = 5;

/// One ranked alternative.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub song_id: usize,
    pub name: String,
    pub external_ref: String,
    pub score: usize,
}

/// The winning song plus the ranked alternatives.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub song_id: usize,
    pub name: String,
    pub external_ref: String,
    /// Height of the tallest (song, Δ) histogram bar.
    pub score: usize,
    /// Frame-wise alignment of the query within the winner.
    pub offset_frames: i64,
    /// Per-song best bars, tallest first, at most five entries.
    pub top: Vec<Candidate>,
}

/// Outcome of a well-formed identification. No probabilistic threshold is
/// applied; the caller interprets `score` as confidence.
#[derive(Debug, Clone)]
pub enum Identification {
    NoMatch,
    Match(MatchReport),
}

/// Probe the index with every query fingerprint and vote. Must run with the
/// store's critical section held.
pub(crate) fn run_query(store: &Store, query: &[Fingerprint]) -> Identification {
    let mut votes: HashMap<(usize, i64), usize> = HashMap::new();
    // (count, song, delta); ties keep the first bin to reach the count
    let mut best: Option<(usize, usize, i64)> = None;

    for fp in query {
        let Some(bucket) = store.index.get(fp.hash) else {
            continue;
        };
        for &(song_id, db_frame) in bucket {
            let delta = db_frame as i64 - fp.frame_index as i64;
            let count = votes.entry((song_id, delta)).or_insert(0);
            *count += 1;
            if best.map_or(true, |(top, _, _)| *count > top) {
                best = Some((*count, song_id, delta));
            }
        }
    }

    let Some((score, song_id, offset_frames)) = best else {
        return Identification::NoMatch;
    };

    // tallest bar per song, then rank
    let mut per_song: HashMap<usize, usize> = HashMap::new();
    for (&(song, _), &count) in &votes {
        let bar = per_song.entry(song).or_insert(0);
        if count > *bar {
            *bar = count;
        }
    }

    let mut ranked: Vec<(usize, usize)> = per_song.into_iter().map(|(song, bar)| (bar, song)).collect();
    ranked.sort_unstable_by(|a, b| b.cmp(a));
    ranked.truncate(MAX_CANDIDATES);

    let top = ranked
        .into_iter()
        .map(|(bar, song)| {
            let record = &store.songs[song];
            Candidate {
                song_id: song,
                name: record.name.clone(),
                external_ref: record.external_ref.clone(),
                score: bar,
            }
        })
        .collect();

    let record = &store.songs[song_id];
    Identification::Match(MatchReport {
        song_id,
        name: record.name.clone(),
        external_ref: record.external_ref.clone(),
        score,
        offset_frames,
        top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fingerprint::PairHash;

    fn fp(f1: u16, f2: u16, dt: u16, frame: usize) -> Fingerprint {
        Fingerprint {
            hash: PairHash::pack(f1, f2, dt),
            frame_index: frame,
        }
    }

    fn store_with(songs: &[(&str, Vec<Fingerprint>)]) -> Store {
        let mut store = Store::default();
        for (name, fps) in songs {
            store.register((*name).to_owned(), String::new(), fps);
        }
        store
    }

    #[test]
    fn empty_query_never_matches() {
        let store = store_with(&[("a", vec![fp(1, 2, 3, 0)])]);
        assert!(matches!(run_query(&store, &[]), Identification::NoMatch));
    }

    #[test]
    fn unknown_hashes_yield_no_match() {
        let store = store_with(&[("a", vec![fp(1, 2, 3, 0)])]);
        let query = [fp(9, 9, 9, 0)];
        assert!(matches!(run_query(&store, &query), Identification::NoMatch));
    }

    #[test]
    fn coherent_offsets_outvote_scattered_ones() {
        // song 0: three fingerprints at frames 10, 20, 30
        let reference = vec![fp(1, 2, 3, 10), fp(4, 5, 6, 20), fp(7, 8, 9, 30)];
        let store = store_with(&[("a", reference)]);

        // the same clip shifted 10 frames earlier: every delta is +10
        let query = [fp(1, 2, 3, 0), fp(4, 5, 6, 10), fp(7, 8, 9, 20)];
        let Identification::Match(report) = run_query(&store, &query) else {
            panic!("expected a match");
        };

        assert_eq!(report.song_id, 0);
        assert_eq!(report.name, "a");
        assert_eq!(report.score, 3);
        assert_eq!(report.offset_frames, 10);
    }

    #[test]
    fn ranking_orders_songs_by_their_best_bar() {
        let strong = vec![fp(1, 2, 3, 0), fp(4, 5, 6, 5), fp(7, 8, 9, 11)];
        // shares one hash with the query at an incoherent offset
        let weak = vec![fp(1, 2, 3, 40)];
        let store = store_with(&[("strong", strong), ("weak", weak)]);

        let query = [fp(1, 2, 3, 0), fp(4, 5, 6, 5), fp(7, 8, 9, 11)];
        let Identification::Match(report) = run_query(&store, &query) else {
            panic!("expected a match");
        };

        assert_eq!(report.song_id, 0);
        assert_eq!(report.score, 3);
        assert_eq!(report.offset_frames, 0);
        assert_eq!(report.top.len(), 2);
        assert_eq!(report.top[0].song_id, 0);
        assert_eq!(report.top[0].score, 3);
        assert_eq!(report.top[1].song_id, 1);
        assert_eq!(report.top[1].score, 1);
    }

    #[test]
    fn candidate_list_is_truncated_to_five() {
        let shared = vec![fp(1, 2, 3, 0)];
        let songs: Vec<(&str, Vec<Fingerprint>)> = (0..7).map(|_| ("s", shared.clone())).collect();
        let store = store_with(&songs);

        let query = [fp(1, 2, 3, 0)];
        let Identification::Match(report) = run_query(&store, &query) else {
            panic!("expected a match");
        };
        assert_eq!(report.top.len(), 5);
    }

    #[test]
    fn duplicate_locators_weight_the_vote() {
        // same hash indexed twice at the same frame counts twice
        let store = store_with(&[
            ("dup", vec![fp(1, 2, 3, 4), fp(1, 2, 3, 4)]),
            ("single", vec![fp(1, 2, 3, 4)]),
        ]);

        let query = [fp(1, 2, 3, 0)];
        let Identification::Match(report) = run_query(&store, &query) else {
            panic!("expected a match");
        };
        assert_eq!(report.song_id, 0);
        assert_eq!(report.score, 2);
    }
}
