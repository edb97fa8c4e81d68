// Motor control module for the turret shooter
//
// Provides:
// - Driver/encoder/controller capability traits
// - Serial bridge to the motor controller board
// - Real and simulated driver variants
// - Dashboard-tunable motor facade

pub mod bus;
mod driver;
mod facade;
mod real;
mod sim;

pub use bus::MotorBus;
pub use driver::{
    ClosedLoopController, ControlMode, Encoder, GainSlot, MotorDriver, MotorError, MotorKind,
};
pub use facade::{Gains, MotorFacade};
pub use real::RealMotorDriver;
pub use sim::{SimDeviceState, SimulatedMotorDriver};
