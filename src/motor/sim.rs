// Simulated motor driver
//
// Records what the robot code asked for instead of moving anything; no
// motor physics are modeled. The encoder and controller handles share the
// device state, so tests and the bench tool can observe every write.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::driver::{
    ClosedLoopController, ControlMode, Encoder, GainSlot, MotorDriver, MotorError, MotorKind,
    Result,
};

/// Everything the simulated device remembers.
#[derive(Debug, Clone, Default)]
pub struct SimDeviceState {
    pub output: f64,
    pub applied_output: f64,
    pub current_limit_amps: Option<u16>,
    pub open_loop_ramp_secs: f64,
    /// [P, I, D]
    pub gains: [f64; 3],
    pub reference: Option<(f64, ControlMode)>,
    pub position: f64,
    pub velocity: f64,
    pub factory_resets: u32,
}

fn lock(state: &Arc<Mutex<SimDeviceState>>) -> MutexGuard<'_, SimDeviceState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drop-in replacement for [`RealMotorDriver`](super::RealMotorDriver)
/// when no hardware is attached.
pub struct SimulatedMotorDriver {
    state: Arc<Mutex<SimDeviceState>>,
    device_id: u8,
    kind: MotorKind,
    encoder_taken: bool,
}

impl SimulatedMotorDriver {
    pub fn new(device_id: u8, kind: MotorKind) -> Self {
        debug!("Simulated motor driver for device {}", device_id);
        Self {
            state: Arc::new(Mutex::new(SimDeviceState::default())),
            device_id,
            kind,
            encoder_taken: false,
        }
    }

    pub fn device_id(&self) -> u8 {
        self.device_id
    }

    pub fn kind(&self) -> MotorKind {
        self.kind
    }

    /// Copy of the current device state.
    pub fn snapshot(&self) -> SimDeviceState {
        lock(&self.state).clone()
    }

    /// Shared handle to the device state, for feeding encoder readings in
    /// or inspecting writes after the driver has been boxed away.
    pub fn state_handle(&self) -> Arc<Mutex<SimDeviceState>> {
        Arc::clone(&self.state)
    }
}

impl MotorDriver for SimulatedMotorDriver {
    fn restore_factory_defaults(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        let resets = state.factory_resets + 1;
        *state = SimDeviceState {
            factory_resets: resets,
            ..SimDeviceState::default()
        };
        Ok(())
    }

    fn set_current_limit(&mut self, amps: u16) -> Result<()> {
        lock(&self.state).current_limit_amps = Some(amps);
        Ok(())
    }

    fn set_open_loop_ramp_rate(&mut self, seconds: f64) -> Result<()> {
        lock(&self.state).open_loop_ramp_secs = seconds;
        Ok(())
    }

    fn set_output(&mut self, fraction: f64) -> Result<()> {
        let mut state = lock(&self.state);
        state.output = fraction;
        // No ramp or load modeled; the request is applied as-is
        state.applied_output = fraction;
        Ok(())
    }

    fn applied_output(&self) -> Result<f64> {
        Ok(lock(&self.state).applied_output)
    }

    fn take_encoder(&mut self) -> Result<Box<dyn Encoder>> {
        if self.encoder_taken {
            return Err(MotorError::EncoderAlreadyTaken { id: self.device_id });
        }
        self.encoder_taken = true;
        Ok(Box::new(SimEncoder {
            state: Arc::clone(&self.state),
        }))
    }

    fn closed_loop_controller(&mut self) -> Result<Box<dyn ClosedLoopController>> {
        Ok(Box::new(SimController {
            state: Arc::clone(&self.state),
        }))
    }
}

struct SimEncoder {
    state: Arc<Mutex<SimDeviceState>>,
}

impl Encoder for SimEncoder {
    fn position(&self) -> Result<f64> {
        Ok(lock(&self.state).position)
    }

    fn velocity(&self) -> Result<f64> {
        Ok(lock(&self.state).velocity)
    }
}

struct SimController {
    state: Arc<Mutex<SimDeviceState>>,
}

impl ClosedLoopController for SimController {
    fn set_gain(&mut self, slot: GainSlot, value: f64) -> Result<()> {
        let index = match slot {
            GainSlot::Proportional => 0,
            GainSlot::Integral => 1,
            GainSlot::Derivative => 2,
        };
        lock(&self.state).gains[index] = value;
        Ok(())
    }

    fn set_reference(&mut self, value: f64, mode: ControlMode) -> Result<()> {
        lock(&self.state).reference = Some((value, mode));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_configuration_writes() {
        let mut driver = SimulatedMotorDriver::new(10, MotorKind::Brushless);
        driver.restore_factory_defaults().unwrap();
        driver.set_current_limit(40).unwrap();
        driver.set_open_loop_ramp_rate(0.1).unwrap();
        driver.set_output(0.25).unwrap();

        let state = driver.snapshot();
        assert_eq!(state.factory_resets, 1);
        assert_eq!(state.current_limit_amps, Some(40));
        assert_eq!(state.open_loop_ramp_secs, 0.1);
        assert_eq!(state.applied_output, 0.25);
        assert_eq!(driver.applied_output().unwrap(), 0.25);
    }

    #[test]
    fn test_factory_reset_wipes_config() {
        let mut driver = SimulatedMotorDriver::new(10, MotorKind::Brushless);
        driver.set_current_limit(30).unwrap();
        driver.restore_factory_defaults().unwrap();

        let state = driver.snapshot();
        assert_eq!(state.current_limit_amps, None);
        assert_eq!(state.factory_resets, 1);
    }

    #[test]
    fn test_encoder_taken_at_most_once() {
        let mut driver = SimulatedMotorDriver::new(10, MotorKind::Brushless);
        assert!(driver.take_encoder().is_ok());
        assert!(matches!(
            driver.take_encoder(),
            Err(MotorError::EncoderAlreadyTaken { id: 10 })
        ));
    }

    #[test]
    fn test_encoder_reads_shared_state() {
        let mut driver = SimulatedMotorDriver::new(10, MotorKind::Brushless);
        let handle = driver.state_handle();
        let encoder = driver.take_encoder().unwrap();

        {
            let mut state = handle.lock().unwrap();
            state.position = 12.5;
            state.velocity = 4200.0;
        }
        assert_eq!(encoder.position().unwrap(), 12.5);
        assert_eq!(encoder.velocity().unwrap(), 4200.0);
    }

    #[test]
    fn test_controller_writes_land_in_state() {
        let mut driver = SimulatedMotorDriver::new(10, MotorKind::Brushless);
        let mut controller = driver.closed_loop_controller().unwrap();
        controller.set_gain(GainSlot::Proportional, 0.8).unwrap();
        controller.set_gain(GainSlot::Derivative, 0.05).unwrap();
        controller.set_reference(3000.0, ControlMode::Velocity).unwrap();

        let state = driver.snapshot();
        assert_eq!(state.gains, [0.8, 0.0, 0.05]);
        assert_eq!(state.reference, Some((3000.0, ControlMode::Velocity)));
    }
}
