//! Vessel classification from propeller acoustics.
//!
//! A transparent rule table scores each archetype, the best match is turned
//! into RPM / blade-count / threat estimates, and a short history smooths
//! the output between blocks.

pub mod classifier;
pub mod rules;

pub use classifier::{
    estimate_blade_count, estimate_rpm, threat_level, ClassifierConfig, VesselClassifier,
    CLASSIFIER_HISTORY,
};
pub use rules::{best_match, score, score_all, Criterion, ScoringRule, HARMONIC_CEILING_HZ, RULES};
