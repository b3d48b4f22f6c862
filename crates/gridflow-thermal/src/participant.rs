//! A single block that holds and exchanges heat.

use gridflow_core::action::Action;
use gridflow_core::container::ResourceContainer;
use gridflow_core::fixed::{Fixed64, checked_div_64};
use gridflow_core::id::MultiblockId;
use gridflow_core::position::{Direction, DirectionSet, Position};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Energy sink
// ---------------------------------------------------------------------------

/// Where converted work ends up. Work beyond `capacity` is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergySink {
    pub stored: Fixed64,
    pub capacity: Fixed64,
}

impl EnergySink {
    pub fn new(capacity: Fixed64) -> Self {
        Self {
            stored: Fixed64::ZERO,
            capacity,
        }
    }

    /// Room left before the sink is full.
    pub fn needed(&self) -> Fixed64 {
        (self.capacity - self.stored).max(Fixed64::ZERO)
    }

    /// Add up to `amount`. Returns what was accepted.
    pub fn credit(&mut self, amount: Fixed64) -> Fixed64 {
        let accepted = amount.max(Fixed64::ZERO).min(self.needed());
        self.stored += accepted;
        accepted
    }

    /// Remove up to `amount`. Returns what was removed.
    pub fn take(&mut self, amount: Fixed64) -> Fixed64 {
        let taken = amount.max(Fixed64::ZERO).min(self.stored);
        self.stored -= taken;
        taken
    }
}

// ---------------------------------------------------------------------------
// Fuel
// ---------------------------------------------------------------------------

/// A fuel tank burned into heat while the participant's energy sink has
/// room, plus the adjacent heat sources that warm it for free.
#[derive(Debug, Clone)]
pub struct FuelBurner {
    pub tank: ResourceContainer,
    /// Adjacent heat sources (open lava next to a heat generator, say).
    /// Kept up to date by the host.
    pub adjacent_sources: u32,
    pub(crate) burning: bool,
}

impl FuelBurner {
    pub fn new(tank: ResourceContainer) -> Self {
        Self {
            tank,
            adjacent_sources: 0,
            burning: false,
        }
    }

    /// Whether fuel burned during the last tick.
    pub fn is_burning(&self) -> bool {
        self.burning
    }
}

impl PartialEq for FuelBurner {
    fn eq(&self, other: &Self) -> bool {
        self.tank.stack() == other.tank.stack()
            && self.tank.capacity() == other.tank.capacity()
            && self.adjacent_sources == other.adjacent_sources
            && self.burning == other.burning
    }
}

// ---------------------------------------------------------------------------
// Heat loss
// ---------------------------------------------------------------------------

/// Heat a participant gave away during one simulate step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatLoss {
    /// Moved into neighbouring participants.
    pub transfer: Fixed64,
    /// Lost to the surrounding air.
    pub environment: Fixed64,
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// Thermal state of one block.
///
/// Temperatures are relative to ambient: 0 means "at ambient". Heat added
/// during a tick accumulates in `pending` and only becomes temperature in
/// [`apply_pending_heat`](Self::apply_pending_heat), so every participant
/// simulates against the temperatures from the start of the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatParticipant {
    pub(crate) position: Position,
    pub(crate) temperature: Fixed64,
    pub(crate) pending: Fixed64,
    /// Fraction of its temperature converted to work each tick. Zero for
    /// participants that don't generate.
    pub thermal_efficiency: Fixed64,
    pub inv_heat_capacity: Fixed64,
    pub inv_conduction: Fixed64,
    /// Insulation per side, indexed by [`Direction::index`].
    pub insulation: [Fixed64; 6],
    /// Sides that exchange heat with neighbours. Every other side loses heat
    /// to the environment.
    pub connect_sides: DirectionSet,
    pub energy: Option<EnergySink>,
    #[serde(skip)]
    pub fuel: Option<FuelBurner>,
    /// Work credited to the energy sink during the last conversion.
    pub(crate) producing: Fixed64,
    pub(crate) multiblock: Option<MultiblockId>,
    pub(crate) active: bool,
    pub(crate) last_loss: HeatLoss,
}

impl HeatParticipant {
    /// An ambient-temperature participant with unit heat capacity and
    /// conduction, no insulation, connected on every side.
    pub fn new(position: Position) -> Self {
        Self {
            position,
            temperature: Fixed64::ZERO,
            pending: Fixed64::ZERO,
            thermal_efficiency: Fixed64::ZERO,
            inv_heat_capacity: Fixed64::ONE,
            inv_conduction: Fixed64::ONE,
            insulation: [Fixed64::ZERO; 6],
            connect_sides: DirectionSet::ALL,
            energy: None,
            fuel: None,
            producing: Fixed64::ZERO,
            multiblock: None,
            active: false,
            last_loss: HeatLoss::default(),
        }
    }

    /// A heat generator: converts half its temperature each tick and only
    /// exchanges heat through its bottom face. The other faces are heavily
    /// insulated.
    pub fn generator(position: Position, energy_capacity: Fixed64) -> Self {
        let mut insulation = [Fixed64::from_num(10_000); 6];
        insulation[Direction::Down.index()] = Fixed64::ZERO;
        Self {
            thermal_efficiency: Fixed64::from_num(0.5),
            insulation,
            connect_sides: DirectionSet::only(Direction::Down),
            energy: Some(EnergySink::new(energy_capacity)),
            ..Self::new(position)
        }
    }

    pub fn with_temperature(mut self, temperature: Fixed64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_efficiency(mut self, efficiency: Fixed64) -> Self {
        self.thermal_efficiency = efficiency;
        self
    }

    pub fn with_insulation(mut self, side: Direction, insulation: Fixed64) -> Self {
        self.insulation[side.index()] = insulation;
        self
    }

    pub fn with_connect_sides(mut self, sides: DirectionSet) -> Self {
        self.connect_sides = sides;
        self
    }

    pub fn with_energy_sink(mut self, capacity: Fixed64) -> Self {
        self.energy = Some(EnergySink::new(capacity));
        self
    }

    /// Burn fuel from `tank` into heat every tick. See
    /// [`burn_fuel`](Self::burn_fuel).
    pub fn with_fuel(mut self, tank: ResourceContainer) -> Self {
        self.fuel = Some(FuelBurner::new(tank));
        self
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn temperature(&self) -> Fixed64 {
        self.temperature
    }

    /// Heat absorbed (or, if negative, emitted) since the last apply.
    pub fn pending(&self) -> Fixed64 {
        self.pending
    }

    pub fn insulation(&self, side: Direction) -> Fixed64 {
        self.insulation[side.index()]
    }

    pub fn multiblock(&self) -> Option<MultiblockId> {
        self.multiblock
    }

    /// Whether the participant's multiblock was hot at the last tick.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Losses from the most recent simulate step.
    pub fn last_loss(&self) -> HeatLoss {
        self.last_loss
    }

    pub fn stored_energy(&self) -> Fixed64 {
        self.energy.map_or(Fixed64::ZERO, |e| e.stored)
    }

    /// Work the energy sink accepted during the last conversion.
    pub fn producing_energy(&self) -> Fixed64 {
        self.producing
    }

    pub fn is_burning(&self) -> bool {
        self.fuel.as_ref().is_some_and(FuelBurner::is_burning)
    }

    /// Queue `heat` for absorption at the next apply. Negative values cool.
    pub fn transfer_heat_to(&mut self, heat: Fixed64) {
        self.pending = self.pending.saturating_add(heat);
    }

    /// Run one tick of the fuel burner, if there is one.
    ///
    /// Every adjacent source adds `boost_per_source` heat. Then, if the
    /// energy sink has room and the tank holds a full `rate`, that much fuel
    /// is consumed and `heat` is queued. Returns whether fuel burned.
    pub fn burn_fuel(&mut self, rate: u64, heat: Fixed64, boost_per_source: Fixed64) -> bool {
        let has_room = self.energy.is_some_and(|e| e.needed() > Fixed64::ZERO);
        let Some(fuel) = self.fuel.as_mut() else {
            return false;
        };
        let boost = boost_per_source.saturating_mul(Fixed64::from_num(fuel.adjacent_sources));
        let burning = has_room && fuel.tank.extract(rate, Action::Simulate).amount == rate;
        if burning {
            fuel.tank.extract(rate, Action::Execute);
        }
        fuel.burning = burning;

        self.transfer_heat_to(boost);
        if burning {
            self.transfer_heat_to(heat);
        }
        burning
    }

    /// Convert part of the current temperature into work.
    ///
    /// With a positive temperature and a non-zero efficiency,
    /// `heat_lost = efficiency * T` leaves the participant and
    /// `heat_lost * T / (T + ambient)` is credited to the energy sink.
    /// Returns the work done, including any the sink could not hold.
    pub fn convert_heat(&mut self, ambient: Fixed64) -> Fixed64 {
        self.producing = Fixed64::ZERO;
        let temp = self.temperature;
        if temp <= Fixed64::ZERO || self.thermal_efficiency == Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        let Some(carnot) = checked_div_64(temp, temp.saturating_add(ambient)) else {
            return Fixed64::ZERO;
        };
        let heat_lost = self.thermal_efficiency.saturating_mul(temp);
        let work = heat_lost.saturating_mul(carnot);
        self.transfer_heat_to(-heat_lost);
        if let Some(sink) = self.energy.as_mut() {
            self.producing = sink.credit(work);
        }
        work
    }

    /// Turn pending heat into temperature and clear the accumulator.
    /// Returns the new temperature.
    pub fn apply_pending_heat(&mut self) -> Fixed64 {
        let delta = self.inv_heat_capacity.saturating_mul(self.pending);
        self.temperature = self.temperature.saturating_add(delta);
        self.pending = Fixed64::ZERO;
        self.temperature
    }
}
