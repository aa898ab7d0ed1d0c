//! Vessel archetypes and their acoustic signatures.
//!
//! The signature table is a process-wide constant. Scoring rules in
//! [`crate::classification`] read it but never mutate it.

/// Vessel archetype recognised from a propeller signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VesselType {
    /// Commercial ship, slow large propeller
    Ship,
    /// Submarine
    Submarine,
    /// Small fast boat
    Boat,
    /// Remotely operated vehicle thruster
    Rov,
    /// Autonomous underwater vehicle
    Auv,
    /// No classification possible
    Unknown,
}

impl VesselType {
    /// Archetypes in scoring order; earlier entries win score ties.
    pub const ARCHETYPES: [VesselType; 5] = [
        VesselType::Ship,
        VesselType::Submarine,
        VesselType::Boat,
        VesselType::Rov,
        VesselType::Auv,
    ];

    /// Lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            VesselType::Ship => "ship",
            VesselType::Submarine => "submarine",
            VesselType::Boat => "boat",
            VesselType::Rov => "rov",
            VesselType::Auv => "auv",
            VesselType::Unknown => "unknown",
        }
    }

    /// Threat level before cavitation modulation (1-10)
    pub fn base_threat(&self) -> u8 {
        match self {
            VesselType::Ship => 7,
            VesselType::Submarine => 10,
            VesselType::Boat => 6,
            VesselType::Rov => 3,
            VesselType::Auv => 4,
            VesselType::Unknown => 5,
        }
    }

    /// True for ROV and AUV
    pub fn is_unmanned(&self) -> bool {
        matches!(self, VesselType::Rov | VesselType::Auv)
    }
}

impl std::fmt::Display for VesselType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VesselType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ship" => Ok(VesselType::Ship),
            "submarine" | "sub" => Ok(VesselType::Submarine),
            "boat" => Ok(VesselType::Boat),
            "rov" => Ok(VesselType::Rov),
            "auv" => Ok(VesselType::Auv),
            "unknown" => Ok(VesselType::Unknown),
            other => Err(format!("unknown vessel type '{}'", other)),
        }
    }
}

/// Closed frequency or level interval, `min <= v <= max`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Band {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl Band {
    /// Create a band
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inclusive containment
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Acoustic signature of one archetype
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VesselSignature {
    /// Archetype
    pub vessel_type: VesselType,
    /// Blade-pass frequency range (Hz)
    pub bpf_hz: Band,
    /// Cavitation band (kHz)
    pub cavitation_khz: Band,
    /// Where most acoustic power sits (Hz)
    pub power_peak_hz: Band,
    /// Relative danger weighting
    pub danger_multiplier: f64,
    /// Typical blade count, used to turn BPF into RPM
    pub typical_blades: u8,
}

/// Read-only archetype signature table
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureTable {
    signatures: [VesselSignature; 5],
}

static STANDARD_TABLE: SignatureTable = SignatureTable {
    signatures: [
        VesselSignature {
            vessel_type: VesselType::Ship,
            bpf_hz: Band::new(5.0, 15.0),
            cavitation_khz: Band::new(0.1, 1.0),
            power_peak_hz: Band::new(50.0, 200.0),
            danger_multiplier: 1.2,
            typical_blades: 6,
        },
        VesselSignature {
            vessel_type: VesselType::Submarine,
            bpf_hz: Band::new(10.0, 40.0),
            cavitation_khz: Band::new(5.0, 30.0),
            power_peak_hz: Band::new(100.0, 300.0),
            danger_multiplier: 2.0,
            typical_blades: 4,
        },
        VesselSignature {
            vessel_type: VesselType::Boat,
            bpf_hz: Band::new(50.0, 150.0),
            cavitation_khz: Band::new(5.0, 20.0),
            power_peak_hz: Band::new(100.0, 500.0),
            danger_multiplier: 1.5,
            typical_blades: 4,
        },
        VesselSignature {
            vessel_type: VesselType::Rov,
            bpf_hz: Band::new(200.0, 500.0),
            cavitation_khz: Band::new(1.0, 5.0),
            power_peak_hz: Band::new(2000.0, 10_000.0),
            danger_multiplier: 0.7,
            typical_blades: 3,
        },
        VesselSignature {
            vessel_type: VesselType::Auv,
            bpf_hz: Band::new(20.0, 80.0),
            cavitation_khz: Band::new(0.5, 5.0),
            power_peak_hz: Band::new(300.0, 1000.0),
            danger_multiplier: 0.8,
            typical_blades: 2,
        },
    ],
};

/// Blade count assumed when an archetype has no signature entry
pub const DEFAULT_BLADE_COUNT: u8 = 4;

impl SignatureTable {
    /// The built-in table shared by every classifier
    pub fn standard() -> &'static SignatureTable {
        &STANDARD_TABLE
    }

    /// Signature of `vessel`, `None` for [`VesselType::Unknown`]
    pub fn get(&self, vessel: VesselType) -> Option<&VesselSignature> {
        self.signatures.iter().find(|s| s.vessel_type == vessel)
    }

    /// Signatures in scoring order
    pub fn iter(&self) -> impl Iterator<Item = &VesselSignature> {
        self.signatures.iter()
    }

    /// Typical blade count for `vessel`
    pub fn typical_blades(&self, vessel: VesselType) -> u8 {
        self.get(vessel)
            .map(|s| s.typical_blades)
            .unwrap_or(DEFAULT_BLADE_COUNT)
    }
}

/// Vessel classification, either a single scoring pass or a smoothed result
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VesselClassification {
    /// Winning archetype
    pub vessel_type: VesselType,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Propeller RPM estimate
    pub rpm_estimate: f64,
    /// Blade count estimate, 0 when unknown
    pub blade_count: u8,
    /// Cavitation level carried from the spectral features
    pub cavitation_level: f64,
    /// Raw threat level 1-10, 0 for unknown
    pub threat_level: u8,
}

impl VesselClassification {
    /// The "nothing heard" classification
    pub fn unknown() -> Self {
        Self {
            vessel_type: VesselType::Unknown,
            confidence: 0.0,
            rpm_estimate: 0.0,
            blade_count: 0,
            cavitation_level: 0.0,
            threat_level: 0,
        }
    }

    /// True when no archetype was identified
    pub fn is_unknown(&self) -> bool {
        self.vessel_type == VesselType::Unknown
    }

    /// True when confidence reaches `threshold`
    pub fn is_confident(&self, threshold: f64) -> bool {
        !self.is_unknown() && self.confidence >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_covers_archetypes() {
        let table = SignatureTable::standard();
        for vessel in VesselType::ARCHETYPES {
            assert!(table.get(vessel).is_some(), "missing {}", vessel);
        }
        assert!(table.get(VesselType::Unknown).is_none());
        assert_eq!(table.iter().count(), 5);
    }

    #[test]
    fn test_typical_blades() {
        let table = SignatureTable::standard();
        assert_eq!(table.typical_blades(VesselType::Ship), 6);
        assert_eq!(table.typical_blades(VesselType::Submarine), 4);
        assert_eq!(table.typical_blades(VesselType::Rov), 3);
        assert_eq!(table.typical_blades(VesselType::Auv), 2);
        assert_eq!(table.typical_blades(VesselType::Unknown), DEFAULT_BLADE_COUNT);
    }

    #[test]
    fn test_band_is_inclusive() {
        let band = Band::new(50.0, 150.0);
        assert!(band.contains(50.0));
        assert!(band.contains(150.0));
        assert!(!band.contains(150.0001));
        assert!(!band.contains(f64::NAN));
    }

    #[test]
    fn test_base_threat_levels() {
        assert_eq!(VesselType::Ship.base_threat(), 7);
        assert_eq!(VesselType::Submarine.base_threat(), 10);
        assert_eq!(VesselType::Boat.base_threat(), 6);
        assert_eq!(VesselType::Rov.base_threat(), 3);
        assert_eq!(VesselType::Auv.base_threat(), 4);
        assert_eq!(VesselType::Unknown.base_threat(), 5);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Submarine".parse::<VesselType>(), Ok(VesselType::Submarine));
        assert_eq!(VesselType::Rov.to_string(), "rov");
        assert!("kayak".parse::<VesselType>().is_err());
    }

    #[test]
    fn test_unknown_classification() {
        let c = VesselClassification::unknown();
        assert!(c.is_unknown());
        assert_eq!(c.threat_level, 0);
        assert!(!c.is_confident(0.0));
    }
}
