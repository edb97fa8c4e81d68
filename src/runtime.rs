// 50 Hz loop with a camera-frame watchdog
//
// Bridges the in-process tables over Zenoh: camera frames and dashboard
// overrides come in, vision status and health go out. If the vision
// bridge stops publishing, the watchdog drops the target flag so stale
// telemetry can never hold "aligned" true.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{
    ALIGNMENT_TOLERANCE_DEG, CAMERA_HEIGHT_IN, CAMERA_MOUNTING_ANGLE_DEG, DESIRED_TARGET_X_DEG,
    FRAME_TIMEOUT, LOOP_HZ, SHOOTER_CURRENT_LIMIT_AMPS, SHOOTER_MOTOR_NAME,
    TARGET_HEIGHT_IN, TOPIC_CAMERA_FRAME, TOPIC_STATE_HEALTH, TOPIC_STATE_VISION,
    TOPIC_TUNE_DASHBOARD,
};
use crate::messages::{CameraFrame, RuntimeHealth, TuningUpdate, VisionStatus};
use crate::motor::{MotorDriver, MotorFacade, MotorKind, RealMotorDriver, SimulatedMotorDriver};
use crate::store::{TableStore, TelemetryStore};
use crate::vision::{self, VisionAlignment};

/// Runtime-variable knobs, filled in from the CLI.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub simulate: bool,
    pub port: String,
    pub device_id: u8,
}

struct Watchdog {
    frame_received_at: Instant,
    frames_fresh: bool,
}

impl Watchdog {
    fn new() -> Self {
        Self {
            frame_received_at: Instant::now(),
            frames_fresh: false, // Start stale until first frame
        }
    }

    fn on_frame(&mut self, camera: &TableStore, frame: CameraFrame) {
        camera.set_number(vision::KEY_HORIZONTAL_OFFSET, frame.tx);
        camera.set_number(vision::KEY_VERTICAL_OFFSET, frame.ty);
        camera.set_number(vision::KEY_TARGET_VISIBLE, frame.tv);
        self.frame_received_at = Instant::now();
        self.frames_fresh = true;
    }

    /// Drop the target flag once frames go stale.
    fn check(&mut self, camera: &TableStore) {
        let frame_age = self.frame_received_at.elapsed();
        if self.frames_fresh && frame_age > FRAME_TIMEOUT {
            warn!("Camera frames stale ({:?} old), dropping target", frame_age);
            camera.set_number(vision::KEY_TARGET_VISIBLE, 0.0);
            self.frames_fresh = false;
        }
    }
}

pub async fn run(opts: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let camera = TableStore::new();
    let dashboard = TableStore::new();

    let driver: Box<dyn MotorDriver> = if opts.simulate {
        info!("Motor hardware disabled, using simulated driver");
        Box::new(SimulatedMotorDriver::new(opts.device_id, MotorKind::Brushless))
    } else {
        Box::new(RealMotorDriver::new(
            &opts.port,
            opts.device_id,
            MotorKind::Brushless,
        )?)
    };

    let mut vision = VisionAlignment::new(
        camera.clone(),
        dashboard.clone(),
        TARGET_HEIGHT_IN,
        CAMERA_HEIGHT_IN,
        CAMERA_MOUNTING_ANGLE_DEG,
        ALIGNMENT_TOLERANCE_DEG,
        DESIRED_TARGET_X_DEG,
    );
    let mut shooter = MotorFacade::with_tuning(
        SHOOTER_MOTOR_NAME,
        driver,
        dashboard.clone(),
        Some(SHOOTER_CURRENT_LIMIT_AMPS),
        true,
    )?;
    vision.set_illumination(true);

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_frames = session.declare_subscriber(TOPIC_CAMERA_FRAME).await?;
    let sub_tuning = session.declare_subscriber(TOPIC_TUNE_DASHBOARD).await?;
    let pub_vision = session.declare_publisher(TOPIC_STATE_VISION).await?;
    let pub_health = session.declare_publisher(TOPIC_STATE_HEALTH).await?;

    let mut watchdog = Watchdog::new();
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));
    let mut health = RuntimeHealth::NoTarget;

    info!(
        "Runtime started: {}Hz loop, {}ms frame timeout",
        LOOP_HZ,
        FRAME_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}, {}", TOPIC_CAMERA_FRAME, TOPIC_TUNE_DASHBOARD);
    info!("Publishing to: {}, {}", TOPIC_STATE_VISION, TOPIC_STATE_HEALTH);

    loop {
        tick.tick().await;

        // 1. Drain pending camera frames (non-blocking), keep latest
        while let Ok(Some(sample)) = sub_frames.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<CameraFrame>(&payload) {
                Ok(frame) => watchdog.on_frame(&camera, frame),
                Err(e) => warn!("Failed to parse camera frame: {}", e),
            }
        }

        // 2. Drain dashboard overrides, apply all of them
        while let Ok(Some(sample)) = sub_tuning.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<TuningUpdate>(&payload) {
                Ok(update) => {
                    info!("Dashboard override: {} = {}", update.key, update.value);
                    dashboard.set_number(&update.key, update.value);
                }
                Err(e) => warn!("Failed to parse tuning update: {}", e),
            }
        }

        // 3. Watchdog: stale frames mean no target
        watchdog.check(&camera);

        // 4. Facade housekeeping for this cycle
        vision.publish_telemetry();
        shooter.sync_gains_from_store()?;

        // 5. Publish vision status and health
        let status = VisionStatus {
            target_visible: vision.target_visible(),
            aligned: vision.is_aligned(),
            distance_in: vision.distance_to_target(),
        };
        let next_health = if status.target_visible {
            RuntimeHealth::Ok
        } else {
            RuntimeHealth::NoTarget
        };
        if next_health != health {
            info!("Health: {:?} -> {:?}", health, next_health);
        }
        health = next_health;

        pub_vision.put(serde_json::to_string(&status)?).await?;
        pub_health.put(serde_json::to_string(&health)?).await?;
    }
}
