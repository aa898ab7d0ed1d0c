//! Threat CLI Subcommands
//!
//! This module provides CLI commands for collision-threat work including:
//! - Synthetic approach replays through the full pipeline
//! - One-off assessments of a fused state
//! - The archetype signature table
//! - The default pipeline configuration

use anyhow::{ensure, Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use std::f64::consts::PI;
use tabled::{settings::Style, Table, Tabled};

use diveguard_signal::AcousticBuffer;
use diveguard_threat::{
    classification::threat_level, domain::normalize_degrees, DiveGuardConfig, EvasionManeuver,
    FusedThreat, PipelineStatistics, RangeBearing, RecommendationTier, SensorFrame,
    SignatureTable, ThreatAssessment, ThreatAssessmentEngine, ThreatPipeline,
    VesselClassification, VesselSignature, VesselType,
};

/// Threat subcommand
#[derive(Subcommand, Debug)]
pub enum ThreatCommand {
    /// Replay a synthetic vessel approach through the full pipeline
    Simulate(SimulateArgs),

    /// Assess a single fused state against a vessel type
    Assess(AssessArgs),

    /// Show the archetype signature table
    Signatures(SignaturesArgs),

    /// Print the default pipeline configuration as JSON
    Config,
}

/// Arguments for the simulate command
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Number of processing cycles
    #[arg(short, long, default_value = "20")]
    pub frames: usize,

    /// Vessel distance at the first cycle (m)
    #[arg(long, default_value = "500.0")]
    pub start_distance: f64,

    /// Vessel distance at the last cycle (m)
    #[arg(long, default_value = "50.0")]
    pub end_distance: f64,

    /// Sonar azimuth of the vessel (degrees)
    #[arg(short, long, default_value = "45.0")]
    pub azimuth: f64,

    /// Blade-pass frequency of the synthetic propeller (Hz)
    #[arg(long, default_value = "100.0")]
    pub bpf: f64,

    /// Hydrophone sample rate (Hz)
    #[arg(long, default_value = "48000.0")]
    pub sample_rate: f64,

    /// Cycle period (s); each block holds sample_rate × dt samples
    #[arg(long, default_value = "0.1")]
    pub dt: f64,

    /// Compass heading applied to every cycle (degrees)
    #[arg(long)]
    pub heading: Option<f64>,

    /// Current depth used for the final evasion maneuver (m)
    #[arg(short = 'd', long, default_value = "10.0")]
    pub depth: f64,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the assess command
#[derive(Args, Debug)]
pub struct AssessArgs {
    /// Distance to the vessel (m)
    #[arg(long)]
    pub distance: f64,

    /// Azimuth of the vessel (degrees)
    #[arg(short, long, default_value = "0.0")]
    pub azimuth: f64,

    /// Elevation of the vessel (degrees)
    #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
    pub elevation: f64,

    /// Closing speed, positive when approaching (m/s)
    #[arg(short, long, allow_hyphen_values = true)]
    pub closing: f64,

    /// Vessel type
    #[arg(short, long, value_enum, default_value = "unknown")]
    pub vessel: VesselArg,

    /// Cavitation level (0-1)
    #[arg(long, default_value = "0.0")]
    pub cavitation: f64,

    /// Current depth for the evasion maneuver (m)
    #[arg(short = 'd', long, default_value = "10.0")]
    pub depth: f64,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the signatures command
#[derive(Args, Debug)]
pub struct SignaturesArgs {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Vessel type argument enum for CLI
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum VesselArg {
    Ship,
    Submarine,
    Boat,
    Rov,
    Auv,
    Unknown,
}

impl From<VesselArg> for VesselType {
    fn from(val: VesselArg) -> Self {
        match val {
            VesselArg::Ship => VesselType::Ship,
            VesselArg::Submarine => VesselType::Submarine,
            VesselArg::Boat => VesselType::Boat,
            VesselArg::Rov => VesselType::Rov,
            VesselArg::Auv => VesselType::Auv,
            VesselArg::Unknown => VesselType::Unknown,
        }
    }
}

/// Output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum OutputFormat {
    /// Pretty table output
    #[default]
    Table,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

// ============================================================================
// Display Structs for Tables
// ============================================================================

/// Per-cycle row for the simulation table
#[derive(Tabled)]
struct CycleRow {
    #[tabled(rename = "Cycle")]
    cycle: usize,
    #[tabled(rename = "Sonar (m)")]
    sonar: String,
    #[tabled(rename = "Fused (m)")]
    distance: String,
    #[tabled(rename = "Azimuth")]
    azimuth: String,
    #[tabled(rename = "Closing (m/s)")]
    closing: String,
    #[tabled(rename = "TTC")]
    ttc: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Vessel")]
    vessel: String,
}

/// Signature table row
#[derive(Tabled)]
struct SignatureRow {
    #[tabled(rename = "Vessel")]
    vessel: String,
    #[tabled(rename = "BPF (Hz)")]
    bpf: String,
    #[tabled(rename = "Cavitation (kHz)")]
    cavitation: String,
    #[tabled(rename = "Power Peak (Hz)")]
    power_peak: String,
    #[tabled(rename = "Danger")]
    danger: String,
    #[tabled(rename = "Blades")]
    blades: u8,
    #[tabled(rename = "Base Threat")]
    base_threat: u8,
}

/// Key/value row for summaries
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl FieldRow {
    fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// JSON report for the simulate command
#[derive(Serialize)]
struct SimulationReport {
    assessments: Vec<ThreatAssessment>,
    classification: VesselClassification,
    statistics: PipelineStatistics,
    evasion: Option<EvasionManeuver>,
}

/// JSON report for the assess command
#[derive(Serialize)]
struct AssessmentReport {
    assessment: ThreatAssessment,
    evasion: EvasionManeuver,
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a threat command
pub fn execute(command: ThreatCommand) -> Result<()> {
    match command {
        ThreatCommand::Simulate(args) => execute_simulate(args),
        ThreatCommand::Assess(args) => execute_assess(args),
        ThreatCommand::Signatures(args) => execute_signatures(args),
        ThreatCommand::Config => {
            println!("{}", serde_json::to_string_pretty(&DiveGuardConfig::default())?);
            Ok(())
        }
    }
}

/// Execute the simulate command
fn execute_simulate(args: SimulateArgs) -> Result<()> {
    ensure!(args.frames > 0, "at least one frame is required");
    ensure!(
        args.start_distance > 0.0 && args.end_distance >= 0.0,
        "distances must be positive"
    );

    let config = DiveGuardConfig::builder()
        .sample_rate_hz(args.sample_rate)
        .dt_secs(args.dt)
        .build();
    let mut pipeline = ThreatPipeline::new(config).context("invalid pipeline configuration")?;
    let block_len = ((args.sample_rate * args.dt).round() as usize).max(1);

    let mut assessments = Vec::with_capacity(args.frames);
    let mut rows = Vec::with_capacity(args.frames);

    for frame in 0..args.frames {
        let sonar = approach_distance(frame, args.frames, args.start_distance, args.end_distance);
        let intensity = approach_intensity(sonar, args.start_distance);
        let block = synthesize_block(block_len, args.sample_rate, args.bpf, intensity, frame);

        let mut sensors = SensorFrame::new(
            RangeBearing::new(sonar, args.azimuth, 0.0),
            AcousticBuffer::Pcm16(&block),
        );
        if let Some(heading) = args.heading {
            sensors = sensors.with_heading(heading);
        }

        let Some(assessment) = pipeline.process(sensors) else {
            continue;
        };

        if let OutputFormat::Compact = args.format {
            println!(
                "{:>3} {:>7.1}m {:>6.1}° {:>6.2}m/s risk={} {}",
                frame,
                assessment.distance_m,
                assessment.azimuth_deg,
                assessment.closing_speed_mps,
                assessment.risk_level,
                assessment.vessel_type
            );
        }
        rows.push(CycleRow {
            cycle: frame,
            sonar: format!("{:.1}", sonar),
            distance: format!("{:.1}", assessment.distance_m),
            azimuth: format!("{:.1}°", assessment.azimuth_deg),
            closing: format!("{:.2}", assessment.closing_speed_mps),
            ttc: format_ttc(assessment.time_to_collision_secs),
            risk: format_risk(assessment.risk_level),
            vessel: assessment.vessel_type.to_string(),
        });
        assessments.push(assessment);
    }

    let classification = pipeline.classification();
    let statistics = pipeline.statistics();
    let evasion = pipeline.evasion_maneuver(args.depth);

    match args.format {
        OutputFormat::Json => {
            let report = SimulationReport {
                assessments,
                classification,
                statistics,
                evasion,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Compact => {
            if let Some(last) = assessments.last() {
                println!("{}", last.recommendation);
            }
        }
        OutputFormat::Table => {
            println!(
                "{} Simulated approach: {:.0} m → {:.0} m at {:.0}°, BPF {:.0} Hz",
                "[DIVEGUARD]".bright_cyan().bold(),
                args.start_distance,
                args.end_distance,
                args.azimuth,
                args.bpf
            );
            println!();
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!();

            if let Some(last) = assessments.last() {
                println!("{} {}", format_tier(last.tier), last.recommendation);
                println!();
            }

            println!("{}", "Classification:".bold());
            println!("{}", classification_table(&classification));
            println!();
            println!("{}", "Statistics:".bold());
            println!("{}", statistics_table(&statistics));

            if let Some(maneuver) = evasion {
                println!();
                println!("{}", "Evasion:".bold());
                println!("{}", maneuver_table(&maneuver));
            }
        }
    }

    Ok(())
}

/// Execute the assess command
fn execute_assess(args: AssessArgs) -> Result<()> {
    let reading = RangeBearing::new(args.distance, args.azimuth, args.elevation);
    reading.validate().context("invalid threat position")?;
    ensure!(args.closing.is_finite(), "closing speed must be finite");
    ensure!(args.depth.is_finite(), "depth must be finite");

    let vessel: VesselType = args.vessel.into();
    let cavitation = args.cavitation.clamp(0.0, 1.0);
    let state = FusedThreat {
        distance_m: args.distance,
        azimuth_deg: normalize_degrees(args.azimuth),
        elevation_deg: args.elevation,
        closing_speed_mps: args.closing,
        confidence: 1.0,
        timestamp_secs: 0.0,
    };
    let classification = manual_classification(vessel, cavitation);

    let engine = ThreatAssessmentEngine::with_defaults();
    let assessment = engine.evaluate(&state, &classification);
    let evasion = engine.get_evasion_maneuver(&assessment, args.depth);

    match args.format {
        OutputFormat::Json => {
            let report = AssessmentReport { assessment, evasion };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Compact => {
            println!(
                "risk={} ttc={} p={:.2} yaw={:.0}° {}",
                assessment.risk_level,
                format_ttc(assessment.time_to_collision_secs),
                assessment.threat_probability,
                evasion.yaw_deg,
                assessment.recommendation
            );
        }
        OutputFormat::Table => {
            let rows = vec![
                FieldRow::new("Vessel", assessment.vessel_type),
                FieldRow::new("Distance", format!("{:.1} m", assessment.distance_m)),
                FieldRow::new(
                    "Bearing",
                    format!("{:.1}° ({})", assessment.azimuth_deg, assessment.quadrant().phrase()),
                ),
                FieldRow::new("Closing speed", format!("{:.2} m/s", assessment.closing_speed_mps)),
                FieldRow::new("Time to collision", format_ttc(assessment.time_to_collision_secs)),
                FieldRow::new("Risk level", format_risk(assessment.risk_level)),
                FieldRow::new("Threat probability", format!("{:.2}", assessment.threat_probability)),
            ];
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!();
            println!("{} {}", format_tier(assessment.tier), assessment.recommendation);
            println!();
            println!("{}", "Evasion:".bold());
            println!("{}", maneuver_table(&evasion));
        }
    }

    Ok(())
}

/// Execute the signatures command
fn execute_signatures(args: SignaturesArgs) -> Result<()> {
    let table = SignatureTable::standard();

    match args.format {
        OutputFormat::Json => {
            let signatures: Vec<&VesselSignature> = table.iter().collect();
            println!("{}", serde_json::to_string_pretty(&signatures)?);
        }
        OutputFormat::Compact => {
            for s in table.iter() {
                println!(
                    "{:<10} bpf={}-{}Hz cav={}-{}kHz x{}",
                    s.vessel_type,
                    s.bpf_hz.min,
                    s.bpf_hz.max,
                    s.cavitation_khz.min,
                    s.cavitation_khz.max,
                    s.danger_multiplier
                );
            }
        }
        OutputFormat::Table => {
            let rows: Vec<SignatureRow> = table
                .iter()
                .map(|s| SignatureRow {
                    vessel: s.vessel_type.to_string(),
                    bpf: format!("{}–{}", s.bpf_hz.min, s.bpf_hz.max),
                    cavitation: format!("{}–{}", s.cavitation_khz.min, s.cavitation_khz.max),
                    power_peak: format!("{}–{}", s.power_peak_hz.min, s.power_peak_hz.max),
                    danger: format!("{:.1}", s.danger_multiplier),
                    blades: s.typical_blades,
                    base_threat: s.vessel_type.base_threat(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
    }

    Ok(())
}

// ============================================================================
// Simulation Helpers
// ============================================================================

/// Linear distance schedule from `start` to `end` over `frames` cycles
fn approach_distance(frame: usize, frames: usize, start: f64, end: f64) -> f64 {
    if frames <= 1 {
        return end;
    }
    start + (end - start) * frame as f64 / (frames - 1) as f64
}

/// Source loudness: 0 at the starting distance, 1 at contact
fn approach_intensity(distance: f64, start: f64) -> f64 {
    (1.0 - distance / start).clamp(0.0, 1.0)
}

/// Propeller block: BPF with two harmonics, cavitation at 15 kHz and
/// deterministic background noise, quantized to 16-bit PCM.
fn synthesize_block(n: usize, sample_rate: f64, bpf: f64, intensity: f64, seed: usize) -> Vec<i16> {
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let tonal = intensity
                * ((2.0 * PI * bpf * t).sin()
                    + 0.5 * (2.0 * PI * 2.0 * bpf * t).sin()
                    + 0.3 * (2.0 * PI * 3.0 * bpf * t).sin());
            let cavitation = 0.2 * intensity * (2.0 * PI * 15_000.0 * t).sin();
            let noise = 0.05 * ((i as f64 * 12.9898 + seed as f64 * 78.233).sin() * 43_758.545_3).fract();
            let v = (tonal + cavitation + noise) * 0.4;
            (v.clamp(-1.0, 1.0) * 32767.0) as i16
        })
        .collect()
}

/// Classification for a vessel type given on the command line
fn manual_classification(vessel: VesselType, cavitation: f64) -> VesselClassification {
    if vessel == VesselType::Unknown {
        return VesselClassification {
            cavitation_level: cavitation,
            ..VesselClassification::unknown()
        };
    }
    VesselClassification {
        vessel_type: vessel,
        confidence: 1.0,
        rpm_estimate: 0.0,
        blade_count: SignatureTable::standard().typical_blades(vessel),
        cavitation_level: cavitation,
        threat_level: threat_level(vessel, cavitation),
    }
}

// ============================================================================
// Formatting Helpers
// ============================================================================

fn classification_table(c: &VesselClassification) -> String {
    let rows = vec![
        FieldRow::new("Vessel", c.vessel_type),
        FieldRow::new("Confidence", format!("{:.0}%", c.confidence * 100.0)),
        FieldRow::new("RPM", format!("{:.0}", c.rpm_estimate)),
        FieldRow::new("Blades", c.blade_count),
        FieldRow::new("Cavitation", format!("{:.2}", c.cavitation_level)),
        FieldRow::new("Threat level", c.threat_level),
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

fn statistics_table(s: &PipelineStatistics) -> String {
    let rows = vec![
        FieldRow::new("Threats detected", s.threats_detected),
        FieldRow::new("Critical events", s.critical_events),
        FieldRow::new("Failed cycles", s.failed_cycles),
        FieldRow::new("Avg latency", format!("{:.3} ms", s.avg_processing_ms)),
        FieldRow::new("Max latency", format!("{:.3} ms", s.max_processing_ms)),
        FieldRow::new("Fusion history", s.fusion_history_len),
        FieldRow::new("Risk trend", s.risk_trend),
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

fn maneuver_table(m: &EvasionManeuver) -> String {
    let rows = vec![
        FieldRow::new("Yaw", format!("{:.1}°", m.yaw_deg)),
        FieldRow::new("Pitch", format!("{:.1}°", m.pitch_deg)),
        FieldRow::new("Target depth", format!("{:.1} m", m.depth_m)),
        FieldRow::new("Speed", format!("{}%", m.speed_percent)),
        FieldRow::new("Urgency", m.urgency),
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format time-to-collision, `∞` when not closing
fn format_ttc(ttc: f64) -> String {
    if ttc.is_finite() {
        format!("{:.1}s", ttc)
    } else {
        "∞".to_string()
    }
}

/// Format risk level with color
fn format_risk(risk: u8) -> String {
    let label = format!("{}/10", risk);
    match risk {
        9..=10 => label.red().bold().to_string(),
        7..=8 => label.bright_red().to_string(),
        5..=6 => label.yellow().to_string(),
        3..=4 => label.blue().to_string(),
        _ => label.green().to_string(),
    }
}

/// Format recommendation tier with color
fn format_tier(tier: RecommendationTier) -> String {
    let label = format!("[{}]", tier);
    match tier {
        RecommendationTier::Critical => label.red().bold().to_string(),
        RecommendationTier::HighRiskEvade => label.bright_red().bold().to_string(),
        RecommendationTier::PrepareToManeuver => label.bright_red().to_string(),
        RecommendationTier::Monitor => label.yellow().to_string(),
        RecommendationTier::LowRisk => label.blue().to_string(),
        RecommendationTier::Informational => label.green().to_string(),
    }
}
