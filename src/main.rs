//! tcamterp entry point.
//!
//! Loads an IR document and a config document from disk, validates them
//! against each other, interprets a packet literal against the resulting
//! TCAM, and prints the final machine state.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

mod ast;
mod bitvector;
mod config;
mod error;
mod eval;
mod expr;
mod ir;
mod pattern;
mod sizedint;

use error::Result;

/// Interpret a packet against a TCAM program and a hardware configuration.
#[derive(Parser, Debug)]
#[command(name = "tcamterp")]
#[command(about = "Run a TCAM IR program against a packet", long_about = None)]
struct Args {
    /// Path to the IR JSON document describing the TCAM stages.
    ir_file: String,

    /// Path to the config JSON document describing data stores and keys.
    config_file: String,

    /// The input packet, as a `0b…` or `0x…` literal.
    packet: String,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<ast::MachineState> {
    let ir_src = fs::read_to_string(&args.ir_file)
        .map_err(|e| error::TcamError::parse(format!("could not read IR file '{}': {}", args.ir_file, e)))?;
    let config_src = fs::read_to_string(&args.config_file).map_err(|e| {
        error::TcamError::parse(format!("could not read config file '{}': {}", args.config_file, e))
    })?;

    let ir_json: serde_json::Value = serde_json::from_str(&ir_src)
        .map_err(|e| error::TcamError::parse(format!("malformed IR json: {}", e)))?;
    let config_json: serde_json::Value = serde_json::from_str(&config_src)
        .map_err(|e| error::TcamError::parse(format!("malformed config json: {}", e)))?;

    let tcam = ir::parse_ir(&ir_json)?;
    let mut state = config::parse_config(&config_json)?;
    let packet = bitvector::BitVector::new_from_literal(&args.packet)?;

    info!(stages = tcam.len(), packet_bits = packet.length(), "loaded TCAM program");

    eval::validate_keys_patterns(&tcam, &state)?;
    eval::interp_tcam(&tcam, &mut state, &packet)?;

    Ok(state)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    match run(&args) {
        Ok(state) => {
            print!("{}", state);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
