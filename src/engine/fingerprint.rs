//! Combinatorial hashing of peak pairs.
//!
//! Every anchor peak is paired with the peaks that follow it inside the
//! target zone, and each pair is packed into a 64-bit hash. Collisions are
//! tolerated; the voting stage resolves them.

use serde::{Deserialize, Serialize};

use super::peaks::Peak;
use super::EngineConfig;

/// Packed anchor/target pair hash.
///
/// Layout, low to high: Δt in the low 12 bits, the target bin's low 10 bits
/// at bit 12, the anchor bin's low 10 bits at bit 22. Higher bits are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairHash(u64);

impl PairHash {
    const FREQ_MASK: u64 = 0x3FF;
    const DT_MASK: u64 = 0xFFF;

    pub fn pack(anchor_bin: u16, target_bin: u16, dt: u16) -> Self {
        let f1 = u64::from(anchor_bin) & Self::FREQ_MASK;
        let f2 = u64::from(target_bin) & Self::FREQ_MASK;
        let dt = u64::from(dt) & Self::DT_MASK;
        PairHash((f1 << 22) | (f2 << 12) | dt)
    }

    /// Recover `(anchor_bin, target_bin, dt)`, exact on the masked fields.
    pub fn unpack(self) -> (u16, u16, u16) {
        (
            ((self.0 >> 22) & Self::FREQ_MASK) as u16,
            ((self.0 >> 12) & Self::FREQ_MASK) as u16,
            (self.0 & Self::DT_MASK) as u16,
        )
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// One fingerprint: the pair hash plus the anchor's frame index. The owning
/// song is supplied at insertion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub hash: PairHash,
    pub frame_index: usize,
}

/// Fan each anchor out to the peaks in frames `[anchor + 1, anchor +
/// target_zone_frames]`, emitting at most `fan_out` fingerprints per anchor.
/// The Δt loop is outer, in-frame enumeration inner; both follow the
/// lexicographic peak order, so `peaks` must be sorted by `(frame, bin)`.
pub fn generate_fingerprints(peaks: &[Peak], config: &EngineConfig) -> Vec<Fingerprint> {
    let Some(last) = peaks.last() else {
        return Vec::new();
    };

    let mut by_frame: Vec<Vec<usize>> = vec![Vec::new(); last.frame + 1];
    for (i, peak) in peaks.iter().enumerate() {
        by_frame[peak.frame].push(i);
    }

    let mut fingerprints = Vec::new();
    for anchor in peaks {
        let mut fanned = 0;
        'zone: for dt in 1..=config.target_zone_frames {
            let frame = anchor.frame + dt;
            if frame > last.frame {
                break;
            }
            for &idx in &by_frame[frame] {
                fingerprints.push(Fingerprint {
                    hash: PairHash::pack(anchor.bin as u16, peaks[idx].bin as u16, dt as u16),
                    frame_index: anchor.frame,
                });
                fanned += 1;
                if fanned >= config.fan_out {
                    break 'zone;
                }
            }
        }
    }

    fingerprints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn peak(frame: usize, bin: usize) -> Peak {
        Peak { frame, bin, magnitude: 0.0 }
    }

    #[test]
    fn pack_matches_the_bit_layout() {
        let hash = PairHash::pack(1, 2, 3);
        assert_eq!(hash.as_u64(), (1 << 22) | (2 << 12) | 3);
    }

    #[test]
    fn pack_unpack_round_trips() {
        for &(f1, f2, dt) in &[(0, 0, 0), (10, 500, 1), (511, 10, 45), (1023, 1023, 4095)] {
            assert_eq!(PairHash::pack(f1, f2, dt).unpack(), (f1, f2, dt));
        }
    }

    #[test]
    fn pack_masks_out_of_range_fields() {
        let hash = PairHash::pack(0x7FF, 0xFFFF, 0x1FFF);
        assert_eq!(hash.unpack(), (0x3FF, 0x3FF, 0xFFF));
        // nothing above bit 31 is ever set
        assert_eq!(hash.as_u64() >> 32, 0);
    }

    #[test]
    fn fan_out_is_capped_per_anchor() {
        // one anchor, one target in each of the next ten frames
        let mut peaks = vec![peak(0, 100)];
        peaks.extend((1..=10).map(|t| peak(t, 200)));

        let fps = generate_fingerprints(&peaks, &config());
        let from_anchor: Vec<_> = fps.iter().filter(|fp| fp.frame_index == 0).collect();

        assert_eq!(from_anchor.len(), 5);
        let dts: Vec<u16> = from_anchor.iter().map(|fp| fp.hash.unpack().2).collect();
        assert_eq!(dts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn cap_applies_within_a_single_frame() {
        let mut peaks = vec![peak(0, 100)];
        peaks.extend((0..8).map(|i| peak(1, 100 + i)));

        let fps = generate_fingerprints(&peaks, &config());
        assert_eq!(fps.iter().filter(|fp| fp.frame_index == 0).count(), 5);
    }

    #[test]
    fn targets_beyond_the_zone_are_ignored() {
        let near = vec![peak(0, 100), peak(45, 200)];
        assert_eq!(generate_fingerprints(&near, &config()).len(), 1);

        let far = vec![peak(0, 100), peak(46, 200)];
        assert!(generate_fingerprints(&far, &config()).is_empty());
    }

    #[test]
    fn anchor_is_never_its_own_target() {
        // two peaks in the same frame: neither can reach the other
        let peaks = vec![peak(3, 100), peak(3, 200)];
        assert!(generate_fingerprints(&peaks, &config()).is_empty());
    }

    #[test]
    fn empty_peak_list_yields_nothing() {
        assert!(generate_fingerprints(&[], &config()).is_empty());
    }

    #[test]
    fn every_emission_stays_inside_the_zone() {
        let peaks: Vec<Peak> = (0..200).map(|t| peak(t, 10 + (t * 7) % 500)).collect();
        let fps = generate_fingerprints(&peaks, &config());

        assert!(!fps.is_empty());
        for fp in &fps {
            let (_, _, dt) = fp.hash.unpack();
            assert!((1..=45).contains(&dt));
        }
    }
}
