// Define message types for the runtime

use serde::{Deserialize, Serialize};

// Camera telemetry from the vision bridge -> runtime
// Mirrors the camera's own table keys: tx/ty in degrees, tv > 0 means a
// target is in frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct CameraFrame {
    pub tx: f64,
    pub ty: f64,
    pub tv: f64,
}

// Dashboard override from tuning tools -> runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningUpdate {
    pub key: String,
    pub value: f64,
}

// Vision status from runtime -> driver station displays
// Has default values because we publish every cycle, target or not
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct VisionStatus {
    pub target_visible: bool,
    pub aligned: bool,
    pub distance_in: f64,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    NoTarget,
}
