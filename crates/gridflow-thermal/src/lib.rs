//! Gridflow Thermal -- heat exchange between adjacent blocks.
//!
//! Each [`HeatParticipant`] holds a temperature relative to ambient. Every
//! tick the [`HeatModule`] runs in two phases: first every participant
//! simulates (converting heat to work, pushing heat into neighbours and
//! losing some to the air) against start-of-tick temperatures, then every
//! participant applies its accumulated heat exactly once. Participants with
//! a [`FuelBurner`] burn fuel into heat before the simulate phase.
//!
//! ```rust
//! use gridflow_core::fixed::Fixed64;
//! use gridflow_core::position::Position;
//! use gridflow_thermal::{HeatContext, HeatModule, HeatParticipant};
//!
//! let mut module = HeatModule::default();
//! let hot = module
//!     .add(HeatParticipant::new(Position::new(0, 0, 0)).with_temperature(Fixed64::from_num(100)))
//!     .unwrap();
//! let cold = module.add(HeatParticipant::new(Position::new(1, 0, 0))).unwrap();
//!
//! module.tick(&HeatContext::new(), 0);
//!
//! assert_eq!(module.participant(cold).unwrap().temperature(), Fixed64::from_num(50));
//! assert!(module.participant(hot).unwrap().temperature() < Fixed64::from_num(50));
//! ```

pub mod config;
pub mod context;
pub mod module;
pub mod participant;

pub use config::ThermalConfig;
pub use context::HeatContext;
pub use module::{HeatEvent, HeatModule, ThermalError};
pub use participant::{EnergySink, FuelBurner, HeatLoss, HeatParticipant};
