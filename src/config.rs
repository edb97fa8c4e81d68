// Timeouts, topics, turret geometry, motor configuration
use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Camera frame timeout for watchdog
pub const FRAME_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CAMERA_FRAME: &str = "turret/sensor/camera"; // camera telemetry in
pub const TOPIC_TUNE_DASHBOARD: &str = "turret/tune/dashboard"; // dashboard overrides in
pub const TOPIC_STATE_VISION: &str = "turret/state/vision"; // vision status out
pub const TOPIC_STATE_HEALTH: &str = "turret/state/health"; // health status out

// Vision geometry
// Heights are measured from the carpet (inches), angles in degrees
pub const TARGET_HEIGHT_IN: f64 = 98.25;
pub const CAMERA_HEIGHT_IN: f64 = 20.92;
pub const CAMERA_MOUNTING_ANGLE_DEG: f64 = 29.8;
pub const ALIGNMENT_TOLERANCE_DEG: f64 = 2.0;
pub const DESIRED_TARGET_X_DEG: f64 = 0.0;

// Shooter motor configuration
pub const SHOOTER_MOTOR_NAME: &str = "Shooter";
pub const SHOOTER_DEVICE_ID: u8 = 10;
pub const SHOOTER_CURRENT_LIMIT_AMPS: u16 = 40;

// Serial port for the motor controller bridge
pub const MOTOR_PORT: &str = "/dev/ttyACM0";
