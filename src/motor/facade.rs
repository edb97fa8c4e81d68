// Motor facade with dashboard-tunable closed-loop gains
//
// Wraps a boxed driver, takes the encoder handle once at construction,
// and keeps the P/I/D triple synchronized with the dashboard.

use tracing::{debug, info};

use super::driver::{ClosedLoopController, Encoder, GainSlot, MotorDriver, Result};
use crate::store::TelemetryStore;

/// Seconds from zero to full output under open-loop control. Applied to
/// every motor to smooth manual throttle changes.
const OPEN_LOOP_RAMP_SECS: f64 = 0.1;

/// Closed-loop gain triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            proportional: 1.0,
            integral: 0.0,
            derivative: 0.0,
        }
    }
}

impl Gains {
    fn get(&self, slot: GainSlot) -> f64 {
        match slot {
            GainSlot::Proportional => self.proportional,
            GainSlot::Integral => self.integral,
            GainSlot::Derivative => self.derivative,
        }
    }

    fn set(&mut self, slot: GainSlot, value: f64) {
        match slot {
            GainSlot::Proportional => self.proportional = value,
            GainSlot::Integral => self.integral = value,
            GainSlot::Derivative => self.derivative = value,
        }
    }
}

const GAIN_SLOTS: [GainSlot; 3] = [
    GainSlot::Proportional,
    GainSlot::Integral,
    GainSlot::Derivative,
];

fn gain_key(name: &str, slot: GainSlot) -> String {
    let label = match slot {
        GainSlot::Proportional => "P",
        GainSlot::Integral => "I",
        GainSlot::Derivative => "D",
    };
    format!("{} {} Value", name, label)
}

/// A configured motor driver plus its cached attachments.
///
/// The driver hands its encoder out only once, so the facade grabs the
/// handle during construction and exposes the cached one forever after.
pub struct MotorFacade<S: TelemetryStore> {
    name: String,
    driver: Box<dyn MotorDriver>,
    encoder: Box<dyn Encoder>,
    controller: Option<Box<dyn ClosedLoopController>>,
    gains: Gains,
    dashboard: S,
}

impl<S: TelemetryStore> MotorFacade<S> {
    /// Open-loop facade: factory reset, encoder grab, ramp rate, nothing
    /// else.
    pub fn new(name: impl Into<String>, driver: Box<dyn MotorDriver>, dashboard: S) -> Result<Self> {
        Self::with_tuning(name, driver, dashboard, None, false)
    }

    /// Full construction. `current_limit_amps` caps phase current to
    /// prevent brownouts; `closed_loop` attaches the onboard controller
    /// and seeds its gains from the dashboard (defaults 1.0/0.0/0.0).
    pub fn with_tuning(
        name: impl Into<String>,
        mut driver: Box<dyn MotorDriver>,
        dashboard: S,
        current_limit_amps: Option<u16>,
        closed_loop: bool,
    ) -> Result<Self> {
        let name = name.into();
        driver.restore_factory_defaults()?;
        // The one and only encoder fetch for this driver's lifetime
        let encoder = driver.take_encoder()?;

        if let Some(amps) = current_limit_amps {
            driver.set_current_limit(amps)?;
        }

        let mut facade = Self {
            name,
            driver,
            encoder,
            controller: None,
            gains: Gains::default(),
            dashboard,
        };

        if closed_loop {
            let defaults = Gains::default();
            for slot in GAIN_SLOTS {
                let key = gain_key(&facade.name, slot);
                let value = facade.dashboard.number(&key, defaults.get(slot));
                facade.gains.set(slot, value);
            }
            facade.controller = Some(facade.driver.closed_loop_controller()?);
            facade.push_gains()?;
            info!(
                "{}: closed loop enabled with gains {:?}",
                facade.name, facade.gains
            );
        }

        facade.driver.set_open_loop_ramp_rate(OPEN_LOOP_RAMP_SECS)?;
        Ok(facade)
    }

    /// Push all cached gains into the controller and publish them on the
    /// dashboard so the tuning display starts from the live values.
    fn push_gains(&mut self) -> Result<()> {
        let Some(controller) = self.controller.as_mut() else {
            return Ok(());
        };
        for slot in GAIN_SLOTS {
            let value = self.gains.get(slot);
            controller.set_gain(slot, value)?;
            self.dashboard.set_number(&gain_key(&self.name, slot), value);
        }
        Ok(())
    }

    /// Pick up dashboard gain edits. No-op without a controller. Each
    /// slot is compared and pushed independently, so editing one gain
    /// never rewrites the others.
    ///
    /// The comparison is exact floating-point inequality on purpose: the
    /// dashboard is the sole writer of changed values. A store that
    /// round-trips entries through reduced precision would make this
    /// re-push every cycle; that quirk is kept as-is.
    pub fn sync_gains_from_store(&mut self) -> Result<()> {
        if self.controller.is_none() {
            return Ok(());
        }
        for slot in GAIN_SLOTS {
            let cached = self.gains.get(slot);
            let fresh = self.dashboard.number(&gain_key(&self.name, slot), cached);
            if fresh != cached {
                self.gains.set(slot, fresh);
                if let Some(controller) = self.controller.as_mut() {
                    controller.set_gain(slot, fresh)?;
                }
                debug!("{}: {:?} gain now {}", self.name, slot, fresh);
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gains(&self) -> Gains {
        self.gains
    }

    pub fn driver(&self) -> &dyn MotorDriver {
        self.driver.as_ref()
    }

    pub fn driver_mut(&mut self) -> &mut dyn MotorDriver {
        self.driver.as_mut()
    }

    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut (dyn ClosedLoopController + 'static)> {
        self.controller.as_deref_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::driver::MotorKind;
    use crate::motor::sim::{SimDeviceState, SimulatedMotorDriver};
    use crate::store::{TableStore, TelemetryStore};
    use std::sync::{Arc, Mutex};

    fn sim_parts() -> (SimulatedMotorDriver, Arc<Mutex<SimDeviceState>>) {
        let driver = SimulatedMotorDriver::new(10, MotorKind::Brushless);
        let state = driver.state_handle();
        (driver, state)
    }

    #[test]
    fn test_open_loop_construction_sets_ramp_only() {
        let (driver, state) = sim_parts();
        let dashboard = TableStore::new();
        let facade = MotorFacade::new("Shooter", Box::new(driver), dashboard.clone()).unwrap();

        let device = state.lock().unwrap().clone();
        assert_eq!(device.factory_resets, 1);
        assert_eq!(device.open_loop_ramp_secs, 0.1);
        assert_eq!(device.current_limit_amps, None);
        assert!(facade.controller.is_none());
        // No gains published without a controller
        assert!(!dashboard.contains("Shooter P Value"));
    }

    #[test]
    fn test_closed_loop_seeds_default_gains() {
        let (driver, state) = sim_parts();
        let dashboard = TableStore::new();
        let facade =
            MotorFacade::with_tuning("Shooter", Box::new(driver), dashboard.clone(), Some(40), true)
                .unwrap();

        assert_eq!(facade.gains(), Gains::default());
        let device = state.lock().unwrap().clone();
        assert_eq!(device.gains, [1.0, 0.0, 0.0]);
        assert_eq!(device.current_limit_amps, Some(40));
        // Seeded gains are published back for the tuning display
        assert_eq!(dashboard.number("Shooter P Value", -1.0), 1.0);
        assert_eq!(dashboard.number("Shooter I Value", -1.0), 0.0);
        assert_eq!(dashboard.number("Shooter D Value", -1.0), 0.0);
    }

    #[test]
    fn test_closed_loop_reads_preseeded_gains() {
        let (driver, state) = sim_parts();
        let dashboard = TableStore::new();
        dashboard.set_number("Shooter P Value", 0.4);
        dashboard.set_number("Shooter D Value", 0.02);

        let facade =
            MotorFacade::with_tuning("Shooter", Box::new(driver), dashboard, None, true).unwrap();

        assert_eq!(facade.gains().proportional, 0.4);
        assert_eq!(facade.gains().integral, 0.0);
        assert_eq!(facade.gains().derivative, 0.02);
        assert_eq!(state.lock().unwrap().gains, [0.4, 0.0, 0.02]);
    }

    #[test]
    fn test_encoder_fetched_exactly_once() {
        let (driver, _) = sim_parts();
        let mut facade = MotorFacade::new("Shooter", Box::new(driver), TableStore::new()).unwrap();

        // Accessors only ever return the handle cached at construction;
        // a second fetch from the driver itself is refused.
        let _ = facade.encoder();
        let _ = facade.encoder();
        assert!(facade.driver_mut().take_encoder().is_err());
    }

    #[test]
    fn test_sync_without_controller_is_a_noop() {
        let (driver, state) = sim_parts();
        let dashboard = TableStore::new();
        dashboard.set_number("Shooter P Value", 9.0);
        let mut facade = MotorFacade::new("Shooter", Box::new(driver), dashboard).unwrap();

        facade.sync_gains_from_store().unwrap();
        assert_eq!(facade.gains(), Gains::default());
        assert_eq!(state.lock().unwrap().gains, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sync_updates_only_changed_slot() {
        let (driver, state) = sim_parts();
        let dashboard = TableStore::new();
        let mut facade =
            MotorFacade::with_tuning("Shooter", Box::new(driver), dashboard.clone(), None, true)
                .unwrap();

        // Smear the device gains so an unwanted re-push would be visible
        {
            let mut device = state.lock().unwrap();
            device.gains = [9.0, 9.0, 9.0];
        }

        dashboard.set_number("Shooter D Value", 0.07);
        facade.sync_gains_from_store().unwrap();

        let device = state.lock().unwrap().clone();
        assert_eq!(device.gains, [9.0, 9.0, 0.07]);
        assert_eq!(facade.gains().derivative, 0.07);
        assert_eq!(facade.gains().proportional, 1.0);
    }

    #[test]
    fn test_sync_uses_exact_comparison() {
        let (driver, state) = sim_parts();
        let dashboard = TableStore::new();
        let mut facade =
            MotorFacade::with_tuning("Shooter", Box::new(driver), dashboard.clone(), None, true)
                .unwrap();

        {
            let mut device = state.lock().unwrap();
            device.gains = [9.0, 9.0, 9.0];
        }

        // Bit-identical value: no write reaches the controller
        dashboard.set_number("Shooter P Value", 1.0);
        facade.sync_gains_from_store().unwrap();
        assert_eq!(state.lock().unwrap().gains, [9.0, 9.0, 9.0]);

        // Any bit-level difference does
        dashboard.set_number("Shooter P Value", 1.0 + f64::EPSILON);
        facade.sync_gains_from_store().unwrap();
        assert_eq!(state.lock().unwrap().gains[0], 1.0 + f64::EPSILON);
    }

    #[test]
    fn test_sync_with_absent_keys_changes_nothing() {
        let (driver, state) = sim_parts();
        let mut facade =
            MotorFacade::with_tuning("Shooter", Box::new(driver), TableStore::new(), None, true)
                .unwrap();

        // Construction published the defaults; wipe the device to see
        // whether sync pushes anything on its own.
        {
            let mut device = state.lock().unwrap();
            device.gains = [9.0, 9.0, 9.0];
        }
        facade.sync_gains_from_store().unwrap();
        assert_eq!(facade.gains(), Gains::default());
    }
}
