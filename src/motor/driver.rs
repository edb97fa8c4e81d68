// Motor driver capability seam
//
// The facade talks to these traits only; the concrete driver (real serial
// bridge or simulated device) is picked once at construction. That keeps
// per-call simulation branching out of every method.

/// Error types for motor driver communication
#[derive(Debug, thiserror::Error)]
pub enum MotorError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response from device {id}: {reason}")]
    InvalidResponse { id: u8, reason: String },

    #[error("Checksum mismatch for device {id}")]
    ChecksumMismatch { id: u8 },

    #[error("Device {id} returned error status: 0x{status:02X}")]
    DeviceError { id: u8, status: u8 },

    #[error("Timeout waiting for response from device {id}")]
    Timeout { id: u8 },

    #[error("Encoder handle for device {id} was already taken")]
    EncoderAlreadyTaken { id: u8 },
}

pub type Result<T> = std::result::Result<T, MotorError>;

/// Commutation style of the attached motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorKind {
    Brushless,
    Brushed,
}

/// The three closed-loop gain slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainSlot {
    Proportional,
    Integral,
    Derivative,
}

/// What a closed-loop reference value means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    DutyCycle,
    Velocity,
    Position,
}

/// Read-only view of the motor's integrated encoder.
pub trait Encoder: Send {
    /// Accumulated rotations since power-on.
    fn position(&self) -> Result<f64>;
    /// Speed in rotations per minute.
    fn velocity(&self) -> Result<f64>;
}

/// The driver's onboard closed-loop controller.
pub trait ClosedLoopController: Send {
    fn set_gain(&mut self, slot: GainSlot, value: f64) -> Result<()>;
    fn set_reference(&mut self, value: f64, mode: ControlMode) -> Result<()>;
}

/// A brushless motor driver and its attachments.
pub trait MotorDriver: Send {
    /// Wipe any configuration left over from a previous session.
    fn restore_factory_defaults(&mut self) -> Result<()>;

    /// Cap the phase current (amps) to keep the robot from browning out.
    fn set_current_limit(&mut self, amps: u16) -> Result<()>;

    /// Seconds from zero to full output under open-loop control.
    fn set_open_loop_ramp_rate(&mut self, seconds: f64) -> Result<()>;

    /// Open-loop output fraction in [-1.0, 1.0].
    fn set_output(&mut self, fraction: f64) -> Result<()>;

    /// The output fraction the driver is actually applying.
    fn applied_output(&self) -> Result<f64>;

    /// Hands out the encoder handle. Succeeds at most once per driver:
    /// re-initializing the encoder mid-session corrupts its state, so a
    /// second call returns [`MotorError::EncoderAlreadyTaken`] instead of
    /// a fresh handle.
    fn take_encoder(&mut self) -> Result<Box<dyn Encoder>>;

    /// The onboard closed-loop controller.
    fn closed_loop_controller(&mut self) -> Result<Box<dyn ClosedLoopController>>;
}
