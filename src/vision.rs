// Vision alignment facade over the camera telemetry table
//
// Every query is a stateless recomputation from live table reads, except
// the desired target angle, which caches the last dashboard override.

use crate::store::TelemetryStore;

// Camera table keys
pub const KEY_HORIZONTAL_OFFSET: &str = "tx";
pub const KEY_VERTICAL_OFFSET: &str = "ty";
pub const KEY_TARGET_VISIBLE: &str = "tv";
pub const KEY_LED_MODE: &str = "ledMode";

// Dashboard keys
pub const KEY_DESIRED_TARGET_X: &str = "Desired Target X";
pub const KEY_TARGET_IN_FRAME: &str = "Target in Camera Frame";
pub const KEY_TARGET_ALIGNED: &str = "Target X Aligned";
pub const KEY_DISTANCE_FROM_GOAL: &str = "Distance From Goal";

/// Horizontal field of view half-width of the camera (degrees). Offsets
/// outside ±this indicate no target or a sensor anomaly.
pub const FOV_HALF_WIDTH_DEG: f64 = 27.5;

/// Illumination modes understood by the camera. Only `ForceOn` and
/// `ForceOff` are ever issued here; the other two codes are part of the
/// camera's mode register and kept for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    /// Use the LED behavior configured in the active pipeline
    PipelineDefault,
    ForceOff,
    ForceBlink,
    ForceOn,
}

impl LedMode {
    /// Numeric code written to the camera's mode register.
    pub fn code(self) -> f64 {
        match self {
            LedMode::PipelineDefault => 0.0,
            LedMode::ForceOff => 1.0,
            LedMode::ForceBlink => 2.0,
            LedMode::ForceOn => 3.0,
        }
    }
}

/// Derives alignment and distance metrics from the camera table and keeps
/// the desired target angle tunable from the dashboard.
pub struct VisionAlignment<S: TelemetryStore> {
    camera: S,
    dashboard: S,
    target_height_in: f64,
    camera_height_in: f64,
    mounting_angle_deg: f64,
    alignment_tolerance_deg: f64,
    desired_target_x: f64,
}

impl<S: TelemetryStore> VisionAlignment<S> {
    /// Builds the facade and forces illumination off so the camera does
    /// not blind people while the turret is idle.
    ///
    /// Heights are inches from the carpet; angles are degrees. The
    /// tolerance is the maximum horizontal-angle error still counted as
    /// aligned.
    pub fn new(
        camera: S,
        dashboard: S,
        target_height_in: f64,
        camera_height_in: f64,
        mounting_angle_deg: f64,
        alignment_tolerance_deg: f64,
        desired_target_x: f64,
    ) -> Self {
        let facade = Self {
            camera,
            dashboard,
            target_height_in,
            camera_height_in,
            mounting_angle_deg,
            alignment_tolerance_deg,
            desired_target_x,
        };
        facade.set_illumination(false);
        facade
    }

    /// Horizontal distance to the target (inches):
    /// `(target_height - camera_height) / tan(mounting_angle + ty)`.
    ///
    /// Only meaningful while [`target_visible`](Self::target_visible)
    /// holds; with no target the formula still returns a finite number.
    /// The tangent blows up as the summed angle approaches 90°, so treat
    /// very large magnitudes as "no reliable distance".
    pub fn distance_to_target(&self) -> f64 {
        let ty = self.camera.number(KEY_VERTICAL_OFFSET, 0.0);
        (self.target_height_in - self.camera_height_in)
            / (self.mounting_angle_deg + ty).to_radians().tan()
    }

    /// The target's current horizontal offset in the camera frame
    /// (degrees, valid within ±[`FOV_HALF_WIDTH_DEG`]).
    pub fn current_horizontal_angle(&self) -> f64 {
        self.camera.number(KEY_HORIZONTAL_OFFSET, 0.0)
    }

    /// The horizontal offset at which the target should sit when the
    /// turret is aimed. Refreshed from the dashboard on every call; the
    /// cached value stands when no override has been published.
    pub fn desired_horizontal_angle(&mut self) -> f64 {
        self.desired_target_x = self
            .dashboard
            .number(KEY_DESIRED_TARGET_X, self.desired_target_x);
        self.desired_target_x
    }

    /// Whether the camera currently has a target in frame.
    pub fn target_visible(&self) -> bool {
        self.camera.number(KEY_TARGET_VISIBLE, 0.0) > 0.0
    }

    /// True iff a target is in frame and its horizontal offset is within
    /// tolerance of the desired angle. Never aligned without a target,
    /// whatever the angle error reads.
    pub fn is_aligned(&mut self) -> bool {
        self.target_visible()
            && (self.current_horizontal_angle() - self.desired_horizontal_angle()).abs()
                < self.alignment_tolerance_deg
    }

    /// Forces the camera LEDs on or off.
    pub fn set_illumination(&self, on: bool) {
        let mode = if on { LedMode::ForceOn } else { LedMode::ForceOff };
        self.camera.set_number(KEY_LED_MODE, mode.code());
    }

    /// Pulls the desired-angle override and pushes the derived metrics to
    /// the dashboard. Pure side effect; store reads fall back to
    /// defaults, so this cannot fail.
    pub fn publish_telemetry(&mut self) {
        self.desired_target_x = self
            .dashboard
            .number(KEY_DESIRED_TARGET_X, self.desired_target_x);
        let visible = self.target_visible();
        let aligned = self.is_aligned();
        let distance = self.distance_to_target();
        self.dashboard.set_flag(KEY_TARGET_IN_FRAME, visible);
        self.dashboard.set_flag(KEY_TARGET_ALIGNED, aligned);
        self.dashboard.set_number(KEY_DISTANCE_FROM_GOAL, distance);
    }
}
