//! Sensor readings and the fused kinematic view of the nearest threat.

/// Malformed sensor reading, rejected before any estimator update
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasurementError {
    /// Range is negative or not finite
    #[error("Invalid range: {0} m")]
    InvalidRange(f64),

    /// Azimuth not finite or elevation outside [-90, 90]
    #[error("Invalid bearing: azimuth {azimuth}°, elevation {elevation}°")]
    InvalidBearing {
        /// Azimuth in degrees
        azimuth: f64,
        /// Elevation in degrees
        elevation: f64,
    },

    /// Heading not finite
    #[error("Invalid heading: {0}°")]
    InvalidHeading(f64),
}

/// Range-and-bearing reading from the ranging sonar
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeBearing {
    /// Range to target (m)
    pub distance_m: f64,
    /// Azimuth relative to the vehicle bow (degrees)
    pub azimuth_deg: f64,
    /// Elevation, positive above the vehicle (degrees)
    pub elevation_deg: f64,
}

impl RangeBearing {
    /// Create a reading
    pub fn new(distance_m: f64, azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            distance_m,
            azimuth_deg,
            elevation_deg,
        }
    }

    /// Check the reading is physically meaningful
    pub fn validate(&self) -> Result<(), MeasurementError> {
        if !self.distance_m.is_finite() || self.distance_m < 0.0 {
            return Err(MeasurementError::InvalidRange(self.distance_m));
        }
        if !self.azimuth_deg.is_finite()
            || !self.elevation_deg.is_finite()
            || self.elevation_deg.abs() > 90.0
        {
            return Err(MeasurementError::InvalidBearing {
                azimuth: self.azimuth_deg,
                elevation: self.elevation_deg,
            });
        }
        Ok(())
    }

    /// Azimuth in radians
    pub fn azimuth_rad(&self) -> f64 {
        self.azimuth_deg.to_radians()
    }

    /// Elevation in radians
    pub fn elevation_rad(&self) -> f64 {
        self.elevation_deg.to_radians()
    }

    /// Vehicle-frame Cartesian position `[x, y, z]`
    pub fn to_cartesian(&self) -> [f64; 3] {
        spherical_to_cartesian(self.distance_m, self.azimuth_rad(), self.elevation_rad())
    }
}

/// `x = r·cos(el)·cos(az)`, `y = r·cos(el)·sin(az)`, `z = r·sin(el)`
pub fn spherical_to_cartesian(range: f64, azimuth_rad: f64, elevation_rad: f64) -> [f64; 3] {
    let horizontal = range * elevation_rad.cos();
    [
        horizontal * azimuth_rad.cos(),
        horizontal * azimuth_rad.sin(),
        range * elevation_rad.sin(),
    ]
}

/// Check an absolute compass heading
pub fn validate_heading(heading_deg: f64) -> Result<(), MeasurementError> {
    if heading_deg.is_finite() {
        Ok(())
    } else {
        Err(MeasurementError::InvalidHeading(heading_deg))
    }
}

/// Rotate a vehicle-relative azimuth into the absolute frame, in [0, 360)
pub fn absolute_azimuth(azimuth_deg: f64, heading_deg: f64) -> f64 {
    normalize_degrees(azimuth_deg + heading_deg)
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Read-only kinematic view of the tracked threat
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusedThreat {
    /// Euclidean distance (m)
    pub distance_m: f64,
    /// Azimuth in [0, 360) degrees
    pub azimuth_deg: f64,
    /// Elevation in [-90, 90] degrees
    pub elevation_deg: f64,
    /// Radial approach speed, positive when closing (m/s)
    pub closing_speed_mps: f64,
    /// `1 - trace(P_pos) / 1000`, not clamped
    pub confidence: f64,
    /// Filter time at read-out (s)
    pub timestamp_secs: f64,
}

impl FusedThreat {
    /// True when the target is approaching
    pub fn is_closing(&self) -> bool {
        self.closing_speed_mps > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reading() {
        assert!(RangeBearing::new(150.5, 45.2, -10.0).validate().is_ok());
        assert!(RangeBearing::new(0.0, 0.0, 0.0).validate().is_ok());
        assert_eq!(
            RangeBearing::new(-1.0, 0.0, 0.0).validate(),
            Err(MeasurementError::InvalidRange(-1.0))
        );
        assert!(matches!(
            RangeBearing::new(10.0, f64::NAN, 0.0).validate(),
            Err(MeasurementError::InvalidBearing { .. })
        ));
        assert!(matches!(
            RangeBearing::new(10.0, 0.0, 91.0).validate(),
            Err(MeasurementError::InvalidBearing { .. })
        ));
    }

    #[test]
    fn test_spherical_to_cartesian() {
        let [x, y, z] = RangeBearing::new(100.0, 90.0, 0.0).to_cartesian();
        assert!(x.abs() < 1e-9);
        assert!((y - 100.0).abs() < 1e-9);
        assert!(z.abs() < 1e-9);

        let [x, y, z] = RangeBearing::new(10.0, 0.0, 30.0).to_cartesian();
        assert!((x - 10.0 * 30f64.to_radians().cos()).abs() < 1e-12);
        assert!(y.abs() < 1e-12);
        assert!((z - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_azimuth_wrap() {
        assert!((absolute_azimuth(350.0, 20.0) - 10.0).abs() < 1e-12);
        assert!((absolute_azimuth(10.0, -20.0) - 350.0).abs() < 1e-12);
        assert_eq!(absolute_azimuth(180.0, 180.0), 0.0);
        let tiny = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_heading_validation() {
        assert!(validate_heading(359.9).is_ok());
        assert_eq!(
            validate_heading(f64::INFINITY),
            Err(MeasurementError::InvalidHeading(f64::INFINITY))
        );
    }
}
