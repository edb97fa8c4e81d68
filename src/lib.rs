// Turret hardware runtime
//
// Provides:
// - Vision alignment facade over the camera telemetry table
// - Motor facade with dashboard-tunable closed-loop gains
// - 50 Hz runtime loop bridging the dashboard over Zenoh

pub mod config;
pub mod messages;
pub mod motor;
pub mod runtime;
pub mod store;
pub mod vision;
