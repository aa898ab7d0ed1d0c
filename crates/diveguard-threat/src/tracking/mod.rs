//! Kinematic tracking of the nearest threat.
//!
//! A single 6-state constant-velocity EKF fuses sonar fixes and Doppler
//! velocity hints. Steps are transactional, see [`estimator`].

pub mod estimator;
pub mod linalg;

pub use estimator::{
    EstimatorConfig, EstimatorError, EstimatorResult, KinematicEstimator, KinematicState,
};
