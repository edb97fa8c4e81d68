// Hardware-backed motor driver
//
// All handle operations go through one serial bridge connection; the
// encoder and controller handles hold their own clones of the bus.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use super::bus::{MotorBus, Register};
use super::driver::{
    ClosedLoopController, ControlMode, Encoder, GainSlot, MotorDriver, MotorError, MotorKind,
    Result,
};

fn lock(bus: &Arc<Mutex<MotorBus>>) -> MutexGuard<'_, MotorBus> {
    bus.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Motor driver talking to real hardware over the serial bridge.
pub struct RealMotorDriver {
    bus: Arc<Mutex<MotorBus>>,
    device_id: u8,
    kind: MotorKind,
    encoder_taken: bool,
}

impl RealMotorDriver {
    /// Connect to the bridge on the given serial port and verify the
    /// device answers before handing the driver out.
    pub fn new(port: &str, device_id: u8, kind: MotorKind) -> Result<Self> {
        info!("Opening motor bus on {} for device {}", port, device_id);
        let mut bus = MotorBus::open(port)?;
        if !bus.ping(device_id)? {
            return Err(MotorError::Timeout { id: device_id });
        }
        Ok(Self {
            bus: Arc::new(Mutex::new(bus)),
            device_id,
            kind,
            encoder_taken: false,
        })
    }

    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    pub fn kind(&self) -> MotorKind {
        self.kind
    }
}

impl MotorDriver for RealMotorDriver {
    fn restore_factory_defaults(&mut self) -> Result<()> {
        info!("Restoring factory defaults on device {}", self.device_id);
        lock(&self.bus).write_u8(self.device_id, Register::FactoryReset, 1)
    }

    fn set_current_limit(&mut self, amps: u16) -> Result<()> {
        info!("Device {}: current limit {} A", self.device_id, amps);
        lock(&self.bus).write_f32(self.device_id, Register::CurrentLimit, amps as f32)
    }

    fn set_open_loop_ramp_rate(&mut self, seconds: f64) -> Result<()> {
        lock(&self.bus).write_f32(self.device_id, Register::RampRate, seconds as f32)
    }

    fn set_output(&mut self, fraction: f64) -> Result<()> {
        lock(&self.bus).write_f32(self.device_id, Register::Output, fraction as f32)
    }

    fn applied_output(&self) -> Result<f64> {
        let raw = lock(&self.bus).read_f32(self.device_id, Register::AppliedOutput)?;
        Ok(raw as f64)
    }

    fn take_encoder(&mut self) -> Result<Box<dyn Encoder>> {
        if self.encoder_taken {
            return Err(MotorError::EncoderAlreadyTaken { id: self.device_id });
        }
        self.encoder_taken = true;
        Ok(Box::new(RealEncoder {
            bus: Arc::clone(&self.bus),
            device_id: self.device_id,
        }))
    }

    fn closed_loop_controller(&mut self) -> Result<Box<dyn ClosedLoopController>> {
        Ok(Box::new(RealController {
            bus: Arc::clone(&self.bus),
            device_id: self.device_id,
        }))
    }
}

impl Drop for RealMotorDriver {
    fn drop(&mut self) {
        // Try to zero the output when the driver goes away (safety measure)
        if let Err(e) = self.set_output(0.0) {
            warn!("Failed to zero output on drop: {}", e);
        }
    }
}

struct RealEncoder {
    bus: Arc<Mutex<MotorBus>>,
    device_id: u8,
}

impl Encoder for RealEncoder {
    fn position(&self) -> Result<f64> {
        let raw = lock(&self.bus).read_f32(self.device_id, Register::Position)?;
        Ok(raw as f64)
    }

    fn velocity(&self) -> Result<f64> {
        let raw = lock(&self.bus).read_f32(self.device_id, Register::Velocity)?;
        Ok(raw as f64)
    }
}

struct RealController {
    bus: Arc<Mutex<MotorBus>>,
    device_id: u8,
}

impl ClosedLoopController for RealController {
    fn set_gain(&mut self, slot: GainSlot, value: f64) -> Result<()> {
        let register = match slot {
            GainSlot::Proportional => Register::GainP,
            GainSlot::Integral => Register::GainI,
            GainSlot::Derivative => Register::GainD,
        };
        lock(&self.bus).write_f32(self.device_id, register, value as f32)
    }

    fn set_reference(&mut self, value: f64, mode: ControlMode) -> Result<()> {
        let mode_code = match mode {
            ControlMode::DutyCycle => 0u8,
            ControlMode::Velocity => 1,
            ControlMode::Position => 2,
        };
        let mut bus = lock(&self.bus);
        bus.write_u8(self.device_id, Register::ControlMode, mode_code)?;
        bus.write_f32(self.device_id, Register::Reference, value as f32)
    }
}
