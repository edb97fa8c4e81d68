use clap::Parser;
use tracing_subscriber::EnvFilter;

use turret_zenoh_runtime::config;
use turret_zenoh_runtime::runtime::RuntimeOptions;

#[derive(Parser, Debug)]
#[command(about = "Turret hardware runtime: vision alignment + shooter motor")]
struct Args {
    /// Use the simulated motor driver instead of hardware
    #[arg(long)]
    sim: bool,

    /// Serial port for the motor controller bridge
    #[arg(long, default_value = config::MOTOR_PORT)]
    port: String,

    /// Device id of the shooter motor controller
    #[arg(long, default_value_t = config::SHOOTER_DEVICE_ID)]
    device_id: u8,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();
    let opts = RuntimeOptions {
        simulate: args.sim,
        port: args.port,
        device_id: args.device_id,
    };

    if let Err(e) = turret_zenoh_runtime::runtime::run(opts).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
