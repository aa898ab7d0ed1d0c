//! Extended Kalman filter for the nearest acoustic threat.
//!
//! Constant-velocity model in the vehicle frame.
//! State: [x, y, z, vx, vy, vz] (metres, m/s)
//! Observations: sonar position (spherical → Cartesian) and a Doppler
//! estimate of the x-velocity taken from the blade-pass frequency.
//!
//! Every step builds a candidate state and covariance, validates it and only
//! then commits. A failed step returns an error and leaves the filter exactly
//! as it was.

use diveguard_signal::SpectralPeak;

use super::linalg::{
    all_finite, constant_velocity_transition, mat3_inv, mat3_trace, mat6_add, mat6_mul,
    mat6_mul_vec6, mat6_scaled_identity, mat6_transpose, position_block, symmetrize, Mat6, Vec3,
    Vec6,
};
use crate::domain::{normalize_degrees, spherical_to_cartesian, FusedThreat};
use crate::{Result, ThreatError};

/// Diagonal covariance entries this close below zero are rounding noise
const DIAGONAL_TOLERANCE: f64 = 1e-9;

/// Numerical failure inside the estimator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimatorError {
    /// An input or a candidate state contains NaN or infinity
    #[error("Non-finite value in {0}")]
    NonFinite(&'static str),

    /// Time step is negative or not finite
    #[error("Invalid time step: {0} s")]
    InvalidTimeStep(f64),

    /// Innovation covariance cannot be inverted
    #[error("Singular innovation covariance")]
    SingularInnovation,

    /// Candidate covariance has a negative variance
    #[error("Covariance not positive semi-definite (P[{index}][{index}] = {value})")]
    CovarianceNotPsd {
        /// Diagonal index
        index: usize,
        /// Offending variance
        value: f64,
    },
}

/// Result of a single filter step
pub type EstimatorResult<T> = std::result::Result<T, EstimatorError>;

/// Configuration for the kinematic estimator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimatorConfig {
    /// Prior state [x, y, z, vx, vy, vz]
    pub initial_state: Vec6,
    /// Prior variance on every state component
    pub initial_variance: f64,
    /// Process noise variance, added as `q · I₆` each predict
    pub process_noise: f64,
    /// Sonar position noise variance (m²)
    pub range_noise: f64,
    /// Doppler velocity noise variance ((m/s)²)
    pub acoustic_noise: f64,
    /// Blade-pass frequency assumed for a stationary source (Hz)
    pub doppler_reference_hz: f64,
    /// Speed of sound in water (m/s)
    pub sound_speed_mps: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            // 100 m ahead, closing at 1 m/s
            initial_state: [100.0, 0.0, 0.0, -1.0, 0.0, 0.0],
            initial_variance: 100.0,
            process_noise: 0.01,
            range_noise: 1.0,
            acoustic_noise: 0.5,
            doppler_reference_hz: 100.0,
            sound_speed_mps: 1500.0,
        }
    }
}

impl EstimatorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.initial_state.iter().all(|v| v.is_finite()) {
            return Err(ThreatError::Config("initial state must be finite".into()));
        }
        let non_negative = [
            ("initial_variance", self.initial_variance),
            ("process_noise", self.process_noise),
            ("range_noise", self.range_noise),
            ("acoustic_noise", self.acoustic_noise),
        ];
        if let Some((name, value)) = non_negative
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(ThreatError::Config(format!("{} must be >= 0, got {}", name, value)));
        }
        if !(self.doppler_reference_hz > 0.0) || !(self.sound_speed_mps > 0.0) {
            return Err(ThreatError::Config(
                "Doppler reference and sound speed must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Filter state and covariance
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicState {
    /// State estimate [x, y, z, vx, vy, vz]
    pub x: Vec6,
    /// Error covariance (6×6, symmetric)
    pub p: Mat6,
}

impl KinematicState {
    /// Position [x, y, z]
    pub fn position(&self) -> Vec3 {
        [self.x[0], self.x[1], self.x[2]]
    }

    /// Velocity [vx, vy, vz]
    pub fn velocity(&self) -> Vec3 {
        [self.x[3], self.x[4], self.x[5]]
    }

    /// Sum of the position variances
    pub fn position_uncertainty(&self) -> f64 {
        mat3_trace(&position_block(&self.p))
    }
}

/// 6-state constant-velocity EKF
#[derive(Debug, Clone)]
pub struct KinematicEstimator {
    config: EstimatorConfig,
    state: KinematicState,
    elapsed_secs: f64,
}

impl KinematicEstimator {
    /// Create an estimator at its configured prior
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        let state = prior(&config);
        Ok(Self {
            config,
            state,
            elapsed_secs: 0.0,
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        let config = EstimatorConfig::default();
        Self {
            state: prior(&config),
            config,
            elapsed_secs: 0.0,
        }
    }

    /// Get configuration
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Current state and covariance
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Filter time accumulated over committed predict steps (s)
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    /// Return to the configured prior
    pub fn reset(&mut self) {
        self.state = prior(&self.config);
        self.elapsed_secs = 0.0;
    }

    /// Replace state and covariance, e.g. to restore a snapshot.
    pub fn restore(&mut self, state: KinematicState, elapsed_secs: f64) -> EstimatorResult<()> {
        if !elapsed_secs.is_finite() {
            return Err(EstimatorError::NonFinite("elapsed time"));
        }
        let state = validated(state)?;
        self.state = state;
        self.elapsed_secs = elapsed_secs;
        Ok(())
    }

    /// Advance by `dt_secs`: `x ← F·x`, `P ← F·P·Fᵀ + q·I`.
    pub fn predict(&mut self, dt_secs: f64) -> EstimatorResult<()> {
        if !dt_secs.is_finite() || dt_secs < 0.0 {
            return Err(EstimatorError::InvalidTimeStep(dt_secs));
        }
        let f = constant_velocity_transition(dt_secs);
        let x = mat6_mul_vec6(&f, &self.state.x);
        let fpft = mat6_mul(&mat6_mul(&f, &self.state.p), &mat6_transpose(&f));
        let p = mat6_add(&fpft, &mat6_scaled_identity(self.config.process_noise));

        self.commit(KinematicState { x, p })?;
        self.elapsed_secs += dt_secs;

        tracing::debug!(
            x = self.state.x[0],
            y = self.state.x[1],
            z = self.state.x[2],
            "EKF predict"
        );
        Ok(())
    }

    /// Correct the position with a sonar fix.
    ///
    /// Observation model `H = [I₃ | 0₃]`, noise `r · I₃`.
    pub fn update_range(
        &mut self,
        range_m: f64,
        azimuth_rad: f64,
        elevation_rad: f64,
    ) -> EstimatorResult<()> {
        if !(range_m.is_finite() && azimuth_rad.is_finite() && elevation_rad.is_finite()) {
            return Err(EstimatorError::NonFinite("range measurement"));
        }
        let z = spherical_to_cartesian(range_m, azimuth_rad, elevation_rad);
        let KinematicState { x, p } = &self.state;

        let y: Vec3 = std::array::from_fn(|i| z[i] - x[i]);
        let mut s = position_block(p);
        for (i, row) in s.iter_mut().enumerate() {
            row[i] += self.config.range_noise;
        }
        let s_inv = mat3_inv(&s).ok_or(EstimatorError::SingularInnovation)?;

        // K = P·Hᵀ·S⁻¹; P·Hᵀ is the first three columns of P
        let k: [[f64; 3]; 6] = std::array::from_fn(|i| {
            std::array::from_fn(|j| (0..3).map(|m| p[i][m] * s_inv[m][j]).sum())
        });

        let x_new: Vec6 = std::array::from_fn(|i| x[i] + (0..3).map(|j| k[i][j] * y[j]).sum::<f64>());
        // (I − K·H)·P, where (K·H)·P only touches the first three rows of P
        let p_new: Mat6 = std::array::from_fn(|i| {
            std::array::from_fn(|j| p[i][j] - (0..3).map(|m| k[i][m] * p[m][j]).sum::<f64>())
        });

        self.commit(KinematicState { x: x_new, p: p_new })?;
        tracing::debug!(range_m, "EKF range update");
        Ok(())
    }

    /// Doppler velocity implied by an observed blade-pass frequency
    pub fn doppler_velocity(&self, observed_hz: f64) -> f64 {
        let reference = self.config.doppler_reference_hz;
        (observed_hz - reference) / reference * self.config.sound_speed_mps
    }

    /// Correct the x-velocity from the strongest spectral peak.
    ///
    /// `peaks` must be ranked strongest first. Returns `Ok(false)` without
    /// touching the state when the list is empty.
    pub fn update_acoustic(&mut self, peaks: &[SpectralPeak]) -> EstimatorResult<bool> {
        let Some(first) = peaks.first() else {
            return Ok(false);
        };
        if !first.frequency_hz.is_finite() {
            return Err(EstimatorError::NonFinite("acoustic peak"));
        }
        let velocity = self.doppler_velocity(first.frequency_hz);
        let KinematicState { x, p } = &self.state;

        // H = e₃ (vx)
        const VX: usize = 3;
        let s = p[VX][VX] + self.config.acoustic_noise;
        if !(s.abs() > f64::EPSILON) {
            return Err(EstimatorError::SingularInnovation);
        }
        let k: Vec6 = std::array::from_fn(|i| p[i][VX] / s);
        let innovation = velocity - x[VX];

        let x_new: Vec6 = std::array::from_fn(|i| x[i] + k[i] * innovation);
        let p_new: Mat6 = std::array::from_fn(|i| std::array::from_fn(|j| p[i][j] - k[i] * p[VX][j]));

        self.commit(KinematicState { x: x_new, p: p_new })?;
        tracing::debug!(bpf_hz = first.frequency_hz, velocity, "EKF acoustic update");
        Ok(true)
    }

    /// Spherical view of the current state. Pure: repeated calls agree.
    pub fn read_out(&self) -> FusedThreat {
        let [px, py, pz] = self.state.position();
        let [vx, vy, vz] = self.state.velocity();

        let distance = (px * px + py * py + pz * pz).sqrt();
        let floor = distance.max(1.0);
        let elevation = (pz / floor).clamp(-1.0, 1.0).asin().to_degrees();

        FusedThreat {
            distance_m: distance,
            azimuth_deg: normalize_degrees(py.atan2(px).to_degrees()),
            elevation_deg: elevation,
            closing_speed_mps: -(vx * px + vy * py + vz * pz) / floor,
            confidence: 1.0 - self.state.position_uncertainty() / 1000.0,
            timestamp_secs: self.elapsed_secs,
        }
    }

    fn commit(&mut self, candidate: KinematicState) -> EstimatorResult<()> {
        self.state = validated(candidate)?;
        Ok(())
    }
}

fn prior(config: &EstimatorConfig) -> KinematicState {
    KinematicState {
        x: config.initial_state,
        p: mat6_scaled_identity(config.initial_variance),
    }
}

/// Symmetrize, clear rounding-level negative variances, reject anything else.
fn validated(candidate: KinematicState) -> EstimatorResult<KinematicState> {
    if !candidate.x.iter().all(|v| v.is_finite()) {
        return Err(EstimatorError::NonFinite("state"));
    }
    if !all_finite(&candidate.p) {
        return Err(EstimatorError::NonFinite("covariance"));
    }
    let mut p = symmetrize(&candidate.p);
    for i in 0..6 {
        let value = p[i][i];
        if value < -DIAGONAL_TOLERANCE {
            return Err(EstimatorError::CovarianceNotPsd { index: i, value });
        }
        if value < 0.0 {
            p[i][i] = 0.0;
        }
    }
    Ok(KinematicState { x: candidate.x, p })
}
