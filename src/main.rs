//! Interconnect - RC interconnect analysis demo
//!
//! Builds the two-line coupled testcase, prints its transfer-function moments,
//! then simulates a step on the aggressor with the victim held quiet.
//!
//! # Usage
//!
//! ```bash
//! interconnect --moments 2 --tstop 1e-9 --tstep 1e-12 > waveform.txt
//! ```
//!
//! Moments go to stderr; each stdout line is `t y_aggressor y_victim`.

use std::io::{self, BufWriter, Write};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use interconnect_core::{
    circuit::reference,
    error::{InterconnectError, Result},
    solver::{
        can_ldlt_decompose, moments, regularize, simulate, uniform_grid, waveform_input,
        TimePoint, TransientConfig, Waveform,
    },
};

/// Coupled RC interconnect analysis
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of moments to compute
    #[arg(short, long, default_value_t = 2)]
    moments: usize,

    /// Simulation end time in seconds (exclusive)
    #[arg(long, default_value_t = 1e-9)]
    tstop: f64,

    /// Simulation time step in seconds
    #[arg(long, default_value_t = 1e-12)]
    tstep: f64,

    /// Skip the transient simulation
    #[arg(long)]
    no_transient: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Write one `t y0 y1 ...` line per time point, then flush.
fn write_waveform<W: Write>(out: &mut W, points: &[TimePoint]) -> io::Result<()> {
    for point in points {
        write!(out, "{}", point.time)?;
        for y in point.outputs.iter() {
            write!(out, " {y}")?;
        }
        writeln!(out)?;
    }
    out.flush()
}

/// A closed pipe ends the run quietly; any other write failure is an error.
fn finish_output(result: io::Result<()>) -> Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result.map_err(InterconnectError::output),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Build the circuit
    let circuit = reference::coupled_lines()?;
    let sys = &circuit.system;
    info!(
        states = sys.size(),
        inputs = ?circuit.input_names,
        g_semidefinite = can_ldlt_decompose(&sys.g)?,
        c_semidefinite = can_ldlt_decompose(&sys.c)?,
        "coupled lines testcase"
    );

    // Compute everything before printing anything
    let block_moments = moments(sys, args.moments)?;

    let waveform = if args.no_transient {
        Vec::new()
    } else {
        let reduced = regularize(sys)?;
        let eliminated: Vec<&str> = reduced
            .eliminated_states()
            .iter()
            .map(|&i| circuit.label(i))
            .collect();
        info!(retained = reduced.dim(), eliminated = ?eliminated, "regularized");
        let times = uniform_grid(0.0, args.tstop, args.tstep)?;
        // vAgg step at time zero; vVic constant 0
        let input = waveform_input(vec![
            Waveform::Step { at: 0.0, level: 1.0 },
            Waveform::Constant(0.0),
        ]);
        simulate(&reduced.system, input, &times, &TransientConfig::default())?
    };

    for (i, m) in block_moments.iter().enumerate() {
        eprintln!("moment {i}=");
        eprintln!("{m}");
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    finish_output(write_waveform(&mut out, &waveform))
}
