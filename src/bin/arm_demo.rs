//! Arm demo program
//!
//! Connects to the arm, parks it in the retract pose, moves the tool to a
//! default pose and traces a square with a four-task sequence. The demo
//! drives the built-in simulated arm; Ctrl+C stops the arm and exits.

use anyhow::{anyhow, Context, Result};
use armctl::sim::{SimulatedArm, SimulatedTransport};
use armctl::{
    build_cartesian_target, ArmConfig, ArmController, CartesianTarget, ConsoleEvents,
    DeviceConnection, Pose, POSE_RETRACT,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arm_demo")]
#[command(about = "Drive a robotic arm through the retract / default pose / square demo")]
#[command(version)]
struct Args {
    /// IP address of the robot
    #[arg(long, default_value = "192.168.1.10")]
    ip: String,

    /// Username to login
    #[arg(long)]
    username: Option<String>,

    /// Password to login
    #[arg(long)]
    password: Option<String>,

    /// Path to a YAML configuration file (overrides --ip/--username/--password)
    #[arg(short, long)]
    config: Option<String>,

    /// Seconds to wait for each motion to finish
    #[arg(long)]
    timeout: Option<u64>,

    /// Simulated time per motion, in milliseconds
    #[arg(long, default_value = "250")]
    motion_delay_ms: u64,

    /// Print execution events as JSON lines on stdout
    #[arg(long)]
    events: bool,
}

impl Args {
    fn load_config(&self) -> Result<ArmConfig> {
        let mut config = match &self.config {
            Some(path) => ArmConfig::load_from_path(path)
                .with_context(|| format!("Failed to load config {}", path))?,
            None => {
                let mut config = ArmConfig::for_host(&self.ip);
                config.connection.username = self.username.clone();
                config.connection.password = self.password.clone();
                config
            }
        };

        if let Some(seconds) = self.timeout {
            let mut execution = config.execution();
            execution.action_timeout_seconds = Some(seconds);
            config.execution = Some(execution);
        }
        Ok(config)
    }
}

const DEFAULT_POSE: Pose = Pose::new(0.15, 0.0, 0.20, 0.0, 180.0, 90.0);

const SQUARE: [Pose; 4] = [
    Pose::new(0.25, 0.0, 0.20, 0.0, 180.0, 90.0),
    Pose::new(0.25, 0.1, 0.20, 0.0, 180.0, 90.0),
    Pose::new(0.15, 0.1, 0.20, 0.0, 180.0, 90.0),
    Pose::new(0.15, 0.0, 0.20, 0.0, 180.0, 90.0),
];

/// The blocking motion program
fn run_program(arm: &ArmController) -> Result<()> {
    arm.move_named_pose(POSE_RETRACT)?;
    info!("Tool pose after retract:\n{}", arm.get_pose()?);

    let default = arm.create_cartesian_action(CartesianTarget::Absolute(DEFAULT_POSE))?;
    arm.move_sequence(vec![default])?;

    let corners = SQUARE
        .iter()
        .map(|pose| build_cartesian_target(CartesianTarget::Absolute(*pose), None))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    arm.move_sequence(corners)?;

    info!("Tool pose after square:\n{}", arm.get_pose()?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    info!("Robotic arm demo");
    info!("{}", "=".repeat(50));

    let config = args.load_config()?;

    let sim = SimulatedArm::new();
    sim.set_motion_delay(Duration::from_millis(args.motion_delay_ms));

    let connection = DeviceConnection::open(SimulatedTransport::new(sim), &config.connection)
        .context("Failed to connect to the arm")?;
    let device = connection.device();

    let mut arm = ArmController::with_config(Arc::clone(&device), &config);
    if args.events {
        arm = arm.with_events(Arc::new(ConsoleEvents::new()));
    }

    let program = tokio::task::spawn_blocking(move || run_program(&arm));

    let outcome = tokio::select! {
        joined = program => joined.map_err(|e| anyhow!("Motion program panicked: {}", e))?,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping the arm");
            if let Err(e) = device.stop_action() {
                error!("Failed to stop the arm: {}", e);
            }
            if let Err(e) = connection.close() {
                error!("Failed to close the connection: {}", e);
            }
            std::process::exit(130);
        }
    };

    connection.close().context("Failed to close the connection")?;

    match &outcome {
        Ok(()) => info!("Demo complete"),
        Err(e) => error!("Demo failed: {}", e),
    }
    outcome
}
