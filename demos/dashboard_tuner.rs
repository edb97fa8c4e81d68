// Keyboard tuner: P/I/D/X select value, Up/Down nudge, R/F step size, Q quit
//
// Publishes dashboard overrides the runtime applies to the shooter gains
// and the desired target angle.
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use turret_zenoh_runtime::config::{SHOOTER_MOTOR_NAME, TOPIC_TUNE_DASHBOARD};
use turret_zenoh_runtime::vision::{FOV_HALF_WIDTH_DEG, KEY_DESIRED_TARGET_X};

const STEPS: [f64; 3] = [0.001, 0.01, 0.1];

#[derive(Clone, Copy, PartialEq)]
enum Knob {
    GainP,
    GainI,
    GainD,
    DesiredX,
}

impl Knob {
    fn key(self) -> String {
        match self {
            Knob::GainP => format!("{} P Value", SHOOTER_MOTOR_NAME),
            Knob::GainI => format!("{} I Value", SHOOTER_MOTOR_NAME),
            Knob::GainD => format!("{} D Value", SHOOTER_MOTOR_NAME),
            Knob::DesiredX => KEY_DESIRED_TARGET_X.to_string(),
        }
    }

    fn initial(self) -> f64 {
        match self {
            Knob::GainP => 1.0,
            _ => 0.0,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_TUNE_DASHBOARD).await?;

    info!("Controls: P/I/D/X=select, Up/Down=nudge, R/F=step, Q=quit");

    enable_raw_mode()?;
    let result = run_tuner(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_tuner(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut step_idx: usize = 1;
    let mut knob = Knob::GainP;
    let mut value = knob.initial();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if !event::poll(Duration::from_millis(20))? {
            continue;
        }
        let Event::Key(KeyEvent { code, kind, .. }) = event::read()? else {
            continue;
        };
        let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
        if !pressed {
            continue;
        }

        match code {
            // Knob selection resets the working value to the default
            KeyCode::Char('p') => select(&mut knob, &mut value, Knob::GainP),
            KeyCode::Char('i') => select(&mut knob, &mut value, Knob::GainI),
            KeyCode::Char('d') => select(&mut knob, &mut value, Knob::GainD),
            KeyCode::Char('x') => select(&mut knob, &mut value, Knob::DesiredX),

            KeyCode::Up => {
                value = clamp(knob, value + STEPS[step_idx]);
                publish(publisher, knob, value).await?;
            }
            KeyCode::Down => {
                value = clamp(knob, value - STEPS[step_idx]);
                publish(publisher, knob, value).await?;
            }

            KeyCode::Char('r') => {
                step_idx = (step_idx + 1).min(STEPS.len() - 1);
                info!("Step: {}", STEPS[step_idx]);
            }
            KeyCode::Char('f') => {
                step_idx = step_idx.saturating_sub(1);
                info!("Step: {}", STEPS[step_idx]);
            }

            KeyCode::Char('q') | KeyCode::Esc => break,

            _ => {}
        }
    }

    Ok(())
}

fn clamp(knob: Knob, value: f64) -> f64 {
    // The desired offset has to stay inside the camera's field of view
    match knob {
        Knob::DesiredX => value.clamp(-FOV_HALF_WIDTH_DEG, FOV_HALF_WIDTH_DEG),
        _ => value,
    }
}

fn select(knob: &mut Knob, value: &mut f64, next: Knob) {
    *knob = next;
    *value = next.initial();
    info!("Tuning: {}", next.key());
}

async fn publish(
    publisher: &zenoh::pubsub::Publisher<'_>,
    knob: Knob,
    value: f64,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let update = json!({ "key": knob.key(), "value": value });
    info!("{} = {}", knob.key(), value);
    publisher.put(update.to_string()).await?;
    Ok(())
}
