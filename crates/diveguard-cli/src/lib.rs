//! DiveGuard CLI
//!
//! Command-line interface for the DiveGuard collision-threat pipeline.
//!
//! # Features
//!
//! - **threat**: Simulated approaches, one-off assessments, signature tables
//! - **version**: Display version information
//!
//! # Usage
//!
//! ```bash
//! # Replay a boat closing from 500 m to 50 m
//! diveguard threat simulate --frames 20
//!
//! # Assess a single fused state
//! diveguard threat assess --distance 100 --azimuth 30 --closing 3.5 --vessel boat --cavitation 0.25
//!
//! # Show the archetype signature table
//! diveguard threat signatures
//! ```

use clap::{Parser, Subcommand};

pub mod threat;

/// DiveGuard Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "diveguard")]
#[command(author, version, about = "Propeller collision-threat detection for divers and AUVs")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Threat detection commands
    #[command(subcommand)]
    Threat(threat::ThreatCommand),

    /// Display version information
    Version,
}
