//! Acoustic fingerprinting engine.
//!
//! Wires the signal pipeline (spectrogram, peak picking, pair hashing)
//! together and owns the shared index and registry behind one critical
//! section. Hosts construct an [`Engine`] value and carry it explicitly;
//! there is no process-global state.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

mod error;
mod fingerprint;
mod matcher;
mod peaks;
mod spectrogram;
mod store;

pub use error::EngineError;
pub use fingerprint::{Fingerprint, PairHash};
pub use matcher::{Candidate, Identification, MatchReport};
pub use peaks::Peak;
pub use store::Song;

use fingerprint::generate_fingerprints;
use matcher::run_query;
use peaks::find_peaks;
use spectrogram::compute_spectrogram;
use store::Store;

/// Pipeline parameters. The defaults are the supported profile; all time
/// units downstream are frame-indexed, so the sample rate never appears
/// here.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// STFT window length in samples.
    pub window_size: usize,
    /// STFT hop in samples.
    pub hop_size: usize,
    /// Bins kept per frame by the peak picker.
    pub peaks_per_frame: usize,
    /// Lowest eligible frequency bin; everything below is treated as hum.
    pub min_freq_bin: usize,
    /// Fingerprints emitted per anchor, at most.
    pub fan_out: usize,
    /// How far past the anchor targets are searched, in frames.
    pub target_zone_frames: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            window_size: 1024,
            hop_size: 512,
            peaks_per_frame: 5,
            min_freq_bin: 10,
            fan_out: 5,
            target_zone_frames: 45,
        }
    }
}

/// The identification service core: an in-memory fingerprint index plus a
/// song registry, shared behind a single mutex. All methods take `&self`
/// and are safe to call from parallel threads.
pub struct Engine {
    config: EngineConfig,
    store: Mutex<Store>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Engine {
            config,
            store: Mutex::new(Store::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a reference recording and return its id.
    ///
    /// The signal pipeline runs outside the critical section; the id is
    /// allocated and the fingerprints inserted inside it, so a concurrent
    /// `identify` sees either all of the song or none of it. On error the
    /// index and registry are untouched.
    pub fn add_song(
        &self,
        pcm: &[f64],
        sample_rate: u32,
        name: &str,
        external_ref: &str,
    ) -> Result<usize, EngineError> {
        if pcm.len() < self.config.window_size {
            return Err(EngineError::TooShort);
        }

        let spectrogram = compute_spectrogram(pcm, &self.config);
        let peaks = find_peaks(&spectrogram, &self.config);
        if peaks.is_empty() {
            return Err(EngineError::NoPeaks);
        }

        let fingerprints = generate_fingerprints(&peaks, &self.config);
        if fingerprints.is_empty() {
            return Err(EngineError::NoFingerprints);
        }

        let song_id = self
            .lock_store()
            .register(name.to_owned(), external_ref.to_owned(), &fingerprints);

        info!(
            song_id,
            name,
            sample_rate,
            peaks = peaks.len(),
            fingerprints = fingerprints.len(),
            "registered song"
        );
        Ok(song_id)
    }

    /// Identify a query clip against the registered songs.
    ///
    /// Rejects short buffers and an empty registry up front; a query that
    /// simply matches nothing is a well-formed [`Identification::NoMatch`],
    /// not an error.
    pub fn identify(&self, pcm: &[f64], sample_rate: u32) -> Result<Identification, EngineError> {
        if pcm.len() < self.config.window_size {
            return Err(EngineError::TooShort);
        }
        if self.lock_store().songs.is_empty() {
            return Err(EngineError::DbEmpty);
        }

        let spectrogram = compute_spectrogram(pcm, &self.config);
        let peaks = find_peaks(&spectrogram, &self.config);
        let query = generate_fingerprints(&peaks, &self.config);
        if query.is_empty() {
            return Err(EngineError::NoQueryFingerprints);
        }

        debug!(
            sample_rate,
            peaks = peaks.len(),
            fingerprints = query.len(),
            "running identification"
        );

        let store = self.lock_store();
        Ok(run_query(&store, &query))
    }

    /// Snapshot of the registry, in registration order.
    pub fn list_songs(&self) -> Vec<Song> {
        self.lock_store().songs.clone()
    }

    fn lock_store(&self) -> MutexGuard<'_, Store> {
        // a panicking writer cannot leave a half-registered song behind,
        // so a poisoned lock is still consistent
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the scratch directory layout under `data_dir`. The engine itself
/// never touches disk; this exists for parity with hosts that stage
/// uploads and query clips there.
pub fn init(data_dir: impl AsRef<Path>) -> io::Result<()> {
    let root = data_dir.as_ref();
    fs::create_dir_all(root.join("uploads"))?;
    fs::create_dir_all(root.join("queries"))?;
    Ok(())
}
