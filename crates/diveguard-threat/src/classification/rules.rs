//! Heuristic scoring rule table.
//!
//! Every archetype accumulates the weights of the rules it satisfies. The
//! rules are plain data so each one can be tested on its own.

use diveguard_signal::SpectralFeatures;

use crate::domain::{Band, SignatureTable, VesselType};

/// Peaks below this frequency count as propeller harmonics (Hz)
pub const HARMONIC_CEILING_HZ: f64 = 500.0;

/// Condition a rule tests against the spectral features
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    /// Blade-pass frequency inside the archetype's signature range
    BpfInSignature,
    /// Spectral centroid inside a closed band (Hz)
    CentroidWithin(Band),
    /// Spectral centroid strictly above a frequency (Hz)
    CentroidAbove(f64),
    /// Cavitation level strictly above a threshold
    CavitationAbove(f64),
    /// Cavitation level inside a closed band
    CavitationWithin(Band),
    /// Cavitation level strictly below a threshold
    CavitationBelow(f64),
    /// At least this many sub-500 Hz harmonic peaks
    HarmonicsAtLeast(usize),
    /// Fewer than this many sub-500 Hz harmonic peaks
    HarmonicsBelow(usize),
}

/// One weighted scoring rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRule {
    /// Archetype the rule votes for
    pub vessel: VesselType,
    /// Weight added when the criterion holds
    pub weight: f64,
    /// Condition
    pub criterion: Criterion,
}

const fn rule(vessel: VesselType, weight: f64, criterion: Criterion) -> ScoringRule {
    ScoringRule {
        vessel,
        weight,
        criterion,
    }
}

/// The rule table, grouped by heuristic
pub static RULES: &[ScoringRule] = &[
    // Blade-pass frequency match
    rule(VesselType::Ship, 0.3, Criterion::BpfInSignature),
    rule(VesselType::Submarine, 0.3, Criterion::BpfInSignature),
    rule(VesselType::Boat, 0.3, Criterion::BpfInSignature),
    rule(VesselType::Rov, 0.3, Criterion::BpfInSignature),
    rule(VesselType::Auv, 0.3, Criterion::BpfInSignature),
    // Energy profile
    rule(VesselType::Ship, 0.2, Criterion::CentroidWithin(Band::new(50.0, 200.0))),
    rule(VesselType::Submarine, 0.2, Criterion::CentroidWithin(Band::new(100.0, 300.0))),
    rule(VesselType::Boat, 0.2, Criterion::CentroidWithin(Band::new(100.0, 500.0))),
    rule(VesselType::Rov, 0.2, Criterion::CentroidAbove(2000.0)),
    rule(VesselType::Auv, 0.2, Criterion::CentroidWithin(Band::new(300.0, 1000.0))),
    // Cavitation
    rule(VesselType::Submarine, 0.3, Criterion::CavitationAbove(0.3)),
    rule(VesselType::Boat, 0.2, Criterion::CavitationWithin(Band::new(0.1, 0.4))),
    rule(VesselType::Ship, 0.1, Criterion::CavitationBelow(0.1)),
    // Harmonic structure
    rule(VesselType::Ship, 0.2, Criterion::HarmonicsAtLeast(3)),
    rule(VesselType::Rov, 0.2, Criterion::HarmonicsBelow(3)),
];

impl ScoringRule {
    /// Whether the rule's criterion holds for `features`
    pub fn matches(&self, features: &SpectralFeatures, table: &SignatureTable) -> bool {
        let centroid = features.spectral_centroid_hz;
        let cavitation = features.cavitation_level;
        match self.criterion {
            Criterion::BpfInSignature => table
                .get(self.vessel)
                .map_or(false, |sig| sig.bpf_hz.contains(features.bpf_hz)),
            Criterion::CentroidWithin(band) => band.contains(centroid),
            Criterion::CentroidAbove(hz) => centroid > hz,
            Criterion::CavitationAbove(level) => cavitation > level,
            Criterion::CavitationWithin(band) => band.contains(cavitation),
            Criterion::CavitationBelow(level) => cavitation < level,
            Criterion::HarmonicsAtLeast(n) => features.harmonic_count(HARMONIC_CEILING_HZ) >= n,
            Criterion::HarmonicsBelow(n) => features.harmonic_count(HARMONIC_CEILING_HZ) < n,
        }
    }
}

/// Accumulated score of one archetype
pub fn score(vessel: VesselType, features: &SpectralFeatures, table: &SignatureTable) -> f64 {
    RULES
        .iter()
        .filter(|r| r.vessel == vessel && r.matches(features, table))
        .map(|r| r.weight)
        .sum()
}

/// Scores of every archetype in scoring order
pub fn score_all(features: &SpectralFeatures, table: &SignatureTable) -> [(VesselType, f64); 5] {
    VesselType::ARCHETYPES.map(|v| (v, score(v, features, table)))
}

/// Highest scoring archetype; the earliest archetype wins ties.
pub fn best_match(scores: &[(VesselType, f64)]) -> (VesselType, f64) {
    scores
        .iter()
        .copied()
        .fold((VesselType::Unknown, f64::NEG_INFINITY), |best, cand| {
            if cand.1 > best.1 {
                cand
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use diveguard_signal::{FeatureStatus, SpectralPeak};

    fn features(bpf: f64, centroid: f64, cavitation: f64, harmonics: &[f64]) -> SpectralFeatures {
        SpectralFeatures {
            status: FeatureStatus::Complete,
            peaks: harmonics
                .iter()
                .enumerate()
                .map(|(i, &f)| SpectralPeak {
                    bin: i * 10,
                    frequency_hz: f,
                    power: 1.0 / (i + 1) as f64,
                })
                .collect(),
            bpf_hz: bpf,
            bpf_power: 1.0,
            spectral_centroid_hz: centroid,
            kurtosis: 3.0,
            energy_low: 0.0,
            energy_mid: 0.0,
            energy_high: 0.0,
            cavitation_level: cavitation,
        }
    }

    #[test]
    fn test_each_rule_in_isolation() {
        let table = SignatureTable::standard();
        let boat_bpf = rule(VesselType::Boat, 0.3, Criterion::BpfInSignature);
        assert!(boat_bpf.matches(&features(100.0, 0.0, 0.0, &[]), table));
        assert!(!boat_bpf.matches(&features(151.0, 0.0, 0.0, &[]), table));

        let rov_centroid = rule(VesselType::Rov, 0.2, Criterion::CentroidAbove(2000.0));
        assert!(!rov_centroid.matches(&features(0.0, 2000.0, 0.0, &[]), table));
        assert!(rov_centroid.matches(&features(0.0, 2000.1, 0.0, &[]), table));

        let boat_cav = rule(VesselType::Boat, 0.2, Criterion::CavitationWithin(Band::new(0.1, 0.4)));
        assert!(boat_cav.matches(&features(0.0, 0.0, 0.1, &[]), table));
        assert!(boat_cav.matches(&features(0.0, 0.0, 0.4, &[]), table));
        assert!(!boat_cav.matches(&features(0.0, 0.0, 0.41, &[]), table));
    }

    #[test]
    fn test_harmonics_only_count_below_ceiling() {
        let table = SignatureTable::standard();
        let ship_harmonics = rule(VesselType::Ship, 0.2, Criterion::HarmonicsAtLeast(3));
        assert!(ship_harmonics.matches(&features(10.0, 0.0, 0.0, &[10.0, 20.0, 30.0]), table));
        assert!(!ship_harmonics.matches(&features(10.0, 0.0, 0.0, &[10.0, 20.0, 600.0]), table));
    }

    #[test]
    fn test_boat_signature_scores_highest() {
        let table = SignatureTable::standard();
        let f = features(100.0, 250.0, 0.25, &[100.0, 200.0, 300.0]);
        let scores = score_all(&f, table);
        let (winner, best) = best_match(&scores);

        assert_eq!(winner, VesselType::Boat);
        assert!((best - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_ship_full_match() {
        let table = SignatureTable::standard();
        let f = features(10.0, 120.0, 0.05, &[10.0, 20.0, 30.0]);
        assert!((score(VesselType::Ship, &f, table) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_tie_goes_to_first_archetype() {
        let scores = [
            (VesselType::Ship, 0.2),
            (VesselType::Submarine, 0.0),
            (VesselType::Boat, 0.0),
            (VesselType::Rov, 0.2),
            (VesselType::Auv, 0.0),
        ];
        assert_eq!(best_match(&scores).0, VesselType::Ship);
    }

    #[test]
    fn test_scores_never_exceed_one() {
        for vessel in VesselType::ARCHETYPES {
            let max: f64 = RULES.iter().filter(|r| r.vessel == vessel).map(|r| r.weight).sum();
            assert!(max <= 1.0 + 1e-12, "{} can reach {}", vessel, max);
        }
    }
}
