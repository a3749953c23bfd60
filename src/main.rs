//! grab-place - run grab-and-place scenarios against simulated host services
//!
//! Usage:
//!   grab-place run demos/scenarios/settle.toml            # print the frame trace
//!   grab-place run demos/scenarios/settle.toml --json     # full report as JSON
//!   grab-place run demos/scenarios/settle.toml --realtime # tick at wall-clock pace
//!   grab-place check demos/scenarios/controller.toml      # validate a controller config

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grab_place::sim::{run_realtime, Frame, Report, Scenario, Simulation};
use grab_place::ControllerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario and print its frame trace
    Run {
        /// Scenario TOML file
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        /// Pace ticks by the scenario's dt instead of stepping flat out
        #[arg(long)]
        realtime: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a controller config file
    Check {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            scenario,
            realtime,
            json,
        } => run(&scenario, realtime, json).await,
        Command::Check { config } => check(&config),
    }
}

async fn run(path: &Path, realtime: bool, json: bool) -> Result<()> {
    let scenario = Scenario::load(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    info!(scenario = %scenario.name, ticks = scenario.ticks, realtime, "running scenario");

    let report = if realtime {
        run_realtime(scenario, |frame| {
            if !json {
                print_frame(frame);
            }
        })
        .await
        .context("Scenario failed")?
    } else {
        let mut sim = Simulation::new(scenario).context("Scenario failed")?;
        sim.run();
        let report = sim.finish();
        if !json {
            report.frames.iter().for_each(print_frame);
        }
        report
    };

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let config = ControllerConfig::load(path)
        .with_context(|| format!("Invalid controller config {}", path.display()))?;
    println!("{}: ok", path.display());
    println!(
        "  keypose {} on {:?} hand, confidence > {}",
        config.keypose.as_str(),
        config.hand,
        config.confidence_threshold
    );
    println!(
        "  speeds {} m/s planar, {} m/s vertical, tolerance {} m",
        config.speed_horizontal, config.speed_vertical, config.settle_tolerance
    );
    println!("  planes {:?} (max {})", config.plane_flags, config.max_planes);
    Ok(())
}

fn print_frame(frame: &Frame) {
    let mut line = format!(
        "{:>5} {:<7} x={:+.3} y={:.3} z={:+.3} target={}cm",
        frame.tick,
        format!("{:?}", frame.status).to_lowercase(),
        frame.pose.x,
        frame.pose.y,
        frame.pose.z,
        frame.target_centimeters,
    );
    if let Some(transition) = frame.transition {
        line.push_str(&format!(" {:?}", transition).to_lowercase());
    }
    if frame.raycast_issued {
        line.push_str(" raycast");
    }
    for response in &frame.responses {
        line.push_str(&format!(" <- {:?}", response));
    }
    println!("{}", line);
}

fn print_summary(report: &Report) {
    let pose = report.final_pose;
    println!();
    println!("Scenario: {}", report.name);
    println!(
        "  {} ticks, {} raycasts, {} plane markers",
        report.frames.len(),
        report.raycasts_issued,
        report.markers.len()
    );
    println!(
        "  base height {:.2}, final position ({:.3}, {:.3}, {:.3})",
        report.base_height, pose.x, pose.y, pose.z
    );
}
