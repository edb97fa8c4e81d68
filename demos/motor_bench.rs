// Motor bench: step-by-step facade exercise
//
// Runs against the simulated driver by default; pass a serial port to
// drive real hardware.
//
// Usage: cargo run --example motor_bench -- [port]
//
// Safety features (hardware mode):
// - Explicit confirmation before any writes
// - Very small open-loop output
// - Easy abort with Ctrl+C

use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

use turret_zenoh_runtime::config::{SHOOTER_CURRENT_LIMIT_AMPS, SHOOTER_DEVICE_ID};
use turret_zenoh_runtime::motor::{
    ControlMode, MotorDriver, MotorFacade, MotorKind, RealMotorDriver, SimulatedMotorDriver,
};
use turret_zenoh_runtime::store::{TableStore, TelemetryStore};

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().unwrap();
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    let port = std::env::args().nth(1);
    let hardware = port.is_some();

    if hardware {
        println!("HARDWARE MODE: this tool WILL spin the shooter motor.");
        println!("Make sure the flywheel is clear before proceeding.");
        println!();
        if !confirm("Continue with hardware writes?") {
            return Ok(());
        }
    } else {
        println!("Simulation mode (pass a serial port for hardware).");
    }

    println!();
    println!("Step 1: Constructing driver...");
    let driver: Box<dyn MotorDriver> = match &port {
        Some(port) => Box::new(RealMotorDriver::new(
            port,
            SHOOTER_DEVICE_ID,
            MotorKind::Brushless,
        )?),
        None => Box::new(SimulatedMotorDriver::new(
            SHOOTER_DEVICE_ID,
            MotorKind::Brushless,
        )),
    };
    println!("  ok");

    println!("Step 2: Building facade (factory reset, encoder, gains)...");
    let dashboard = TableStore::new();
    dashboard.set_number("Shooter P Value", 0.2);
    let mut shooter = MotorFacade::with_tuning(
        "Shooter",
        driver,
        dashboard.clone(),
        Some(SHOOTER_CURRENT_LIMIT_AMPS),
        true,
    )?;
    println!("  gains: {:?}", shooter.gains());

    println!("Step 3: Small open-loop pulse...");
    if !hardware || confirm("Apply 10% output for one second?") {
        shooter.driver_mut().set_output(0.1)?;
        sleep(Duration::from_secs(1));
        println!("  applied output: {}", shooter.driver().applied_output()?);
        println!("  encoder velocity: {} rpm", shooter.encoder().velocity()?);
        shooter.driver_mut().set_output(0.0)?;
    }

    println!("Step 4: Closed-loop reference...");
    if !hardware || confirm("Command 500 rpm via the onboard controller?") {
        if let Some(controller) = shooter.controller_mut() {
            controller.set_reference(500.0, ControlMode::Velocity)?;
        }
        sleep(Duration::from_secs(1));
        if let Some(controller) = shooter.controller_mut() {
            controller.set_reference(0.0, ControlMode::DutyCycle)?;
        }
    }

    println!("Step 5: Live gain edit via the dashboard...");
    dashboard.set_number("Shooter D Value", 0.004);
    shooter.sync_gains_from_store()?;
    println!("  gains now: {:?}", shooter.gains());

    println!();
    println!("Done.");
    Ok(())
}
