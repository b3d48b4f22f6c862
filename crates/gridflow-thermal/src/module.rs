//! The heat module: every thermal participant in a world and the two-phase
//! tick that moves heat between them.

use std::collections::BTreeMap;

use gridflow_core::fixed::{Fixed64, Ticks, checked_div_64};
use gridflow_core::id::{HeatNodeId, MultiblockId};
use gridflow_core::position::{Direction, Position};
use slotmap::SlotMap;

use crate::config::ThermalConfig;
use crate::context::HeatContext;
use crate::participant::{FuelBurner, HeatLoss, HeatParticipant};

// ---------------------------------------------------------------------------
// Errors and events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThermalError {
    #[error("unknown heat node {0:?}")]
    UnknownNode(HeatNodeId),
    #[error("position {0:?} already holds a heat participant")]
    PositionOccupied(Position),
}

/// Changes reported by [`HeatModule::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeatEvent {
    /// A multiblock member became active (its multiblock is hot) or
    /// inactive.
    ActivityChanged {
        node: HeatNodeId,
        multiblock: MultiblockId,
        active: bool,
        tick: Ticks,
    },
    /// A participant with a fuel tank started or stopped burning.
    BurningChanged {
        node: HeatNodeId,
        burning: bool,
        tick: Ticks,
    },
}

// ---------------------------------------------------------------------------
// Heat module
// ---------------------------------------------------------------------------

/// Owns the thermal participants of one world, indexed by position.
#[derive(Debug, Clone)]
pub struct HeatModule {
    ambient: Fixed64,
    air_inverse: Fixed64,
    fuel_rate: u64,
    heat_generation: Fixed64,
    source_boost: Fixed64,
    nodes: SlotMap<HeatNodeId, HeatParticipant>,
    by_position: BTreeMap<Position, HeatNodeId>,
}

impl Default for HeatModule {
    fn default() -> Self {
        Self::new(ThermalConfig::default())
    }
}

impl HeatModule {
    pub fn new(config: ThermalConfig) -> Self {
        Self {
            ambient: config.ambient(),
            air_inverse: config.air_inverse(),
            fuel_rate: config.fuel_rate,
            heat_generation: config.heat_generation(),
            source_boost: config.source_boost(),
            nodes: SlotMap::with_key(),
            by_position: BTreeMap::new(),
        }
    }

    pub fn ambient(&self) -> Fixed64 {
        self.ambient
    }

    /// Add a participant at its position.
    pub fn add(&mut self, participant: HeatParticipant) -> Result<HeatNodeId, ThermalError> {
        let position = participant.position();
        if self.by_position.contains_key(&position) {
            return Err(ThermalError::PositionOccupied(position));
        }
        let id = self.nodes.insert(participant);
        self.by_position.insert(position, id);
        Ok(id)
    }

    /// Remove a participant, dropping its multiblock's entry from `ctx`.
    pub fn remove(
        &mut self,
        id: HeatNodeId,
        ctx: &mut HeatContext,
    ) -> Result<HeatParticipant, ThermalError> {
        self.leave_multiblock(id, ctx)?;
        let participant = self.nodes.remove(id).ok_or(ThermalError::UnknownNode(id))?;
        self.by_position.remove(&participant.position());
        Ok(participant)
    }

    pub fn participant(&self, id: HeatNodeId) -> Option<&HeatParticipant> {
        self.nodes.get(id)
    }

    pub fn participant_mut(&mut self, id: HeatNodeId) -> Option<&mut HeatParticipant> {
        self.nodes.get_mut(id)
    }

    pub fn at(&self, position: Position) -> Option<HeatNodeId> {
        self.by_position.get(&position).copied()
    }

    /// All participants in position order.
    pub fn iter(&self) -> impl Iterator<Item = (HeatNodeId, &HeatParticipant)> + '_ {
        self.by_position
            .values()
            .filter_map(|&id| self.nodes.get(id).map(|p| (id, p)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&mut self, id: HeatNodeId) -> Result<&mut HeatParticipant, ThermalError> {
        self.nodes.get_mut(id).ok_or(ThermalError::UnknownNode(id))
    }

    // -----------------------------------------------------------------------
    // Multiblocks
    // -----------------------------------------------------------------------

    pub fn join_multiblock(
        &mut self,
        id: HeatNodeId,
        multiblock: MultiblockId,
    ) -> Result<(), ThermalError> {
        self.node(id)?.multiblock = Some(multiblock);
        Ok(())
    }

    /// Leave the current multiblock. Its hot flag is removed from `ctx`.
    pub fn leave_multiblock(
        &mut self,
        id: HeatNodeId,
        ctx: &mut HeatContext,
    ) -> Result<Option<MultiblockId>, ThermalError> {
        let node = self.node(id)?;
        let left = node.multiblock.take();
        if let Some(multiblock) = left {
            node.active = false;
            ctx.remove(multiblock);
        }
        Ok(left)
    }

    // -----------------------------------------------------------------------
    // Heat operations
    // -----------------------------------------------------------------------

    /// Queue heat for absorption at the next apply.
    pub fn transfer_heat_to(&mut self, id: HeatNodeId, heat: Fixed64) -> Result<(), ThermalError> {
        self.node(id)?.transfer_heat_to(heat);
        Ok(())
    }

    /// Convert part of a participant's temperature into work. Returns the
    /// work done.
    pub fn convert_heat(&mut self, id: HeatNodeId) -> Result<Fixed64, ThermalError> {
        let ambient = self.ambient;
        Ok(self.node(id)?.convert_heat(ambient))
    }

    /// Run one participant's simulate step: convert heat, then exchange with
    /// each neighbour or lose heat to the environment on each side.
    ///
    /// A side exchanges with a neighbour only when it is one of the
    /// participant's `connect_sides` and the neighbour connects on the
    /// facing side. Every other side loses
    /// `T / (air_inverse + insulation + inv_conduction)`.
    pub fn simulate(&mut self, id: HeatNodeId) -> Result<HeatLoss, ThermalError> {
        self.simulate_node(id).ok_or(ThermalError::UnknownNode(id))
    }

    fn simulate_node(&mut self, id: HeatNodeId) -> Option<HeatLoss> {
        let ambient = self.ambient;
        self.nodes.get_mut(id)?.convert_heat(ambient);
        let source = self.nodes.get(id)?;
        let temp = source.temperature();

        let mut loss = HeatLoss::default();
        let mut transfers: Vec<(HeatNodeId, Fixed64)> = Vec::new();
        for dir in Direction::ALL {
            match self.exchange_partner(source, dir) {
                Some((sink_id, sink)) => {
                    let resistance = source.inv_conduction
                        + sink.inv_conduction
                        + source.insulation(dir)
                        + sink.insulation(dir.opposite());
                    let q = divide(temp, resistance, source.position(), dir);
                    loss.transfer += q;
                    transfers.push((sink_id, q));
                }
                None => {
                    let resistance =
                        self.air_inverse + source.insulation(dir) + source.inv_conduction;
                    loss.environment += divide(temp, resistance, source.position(), dir);
                }
            }
        }

        for (sink_id, q) in transfers {
            if let Some(sink) = self.nodes.get_mut(sink_id) {
                sink.transfer_heat_to(q);
            }
        }
        let source = self.nodes.get_mut(id)?;
        source.transfer_heat_to(-(loss.transfer + loss.environment));
        source.last_loss = loss;
        Some(loss)
    }

    fn exchange_partner(
        &self,
        source: &HeatParticipant,
        dir: Direction,
    ) -> Option<(HeatNodeId, &HeatParticipant)> {
        if !source.connect_sides.contains(dir) {
            return None;
        }
        let sink_id = self.at(source.position().offset(dir))?;
        let sink = self.nodes.get(sink_id)?;
        sink.connect_sides
            .contains(dir.opposite())
            .then_some((sink_id, sink))
    }

    /// Turn a participant's pending heat into temperature.
    pub fn apply_pending_heat(&mut self, id: HeatNodeId) -> Result<Fixed64, ThermalError> {
        Ok(self.node(id)?.apply_pending_heat())
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every participant by one tick.
    ///
    /// 1. Burn fuel, queueing the heat it releases.
    /// 2. Simulate every participant against start-of-tick temperatures.
    /// 3. Apply every participant's pending heat.
    /// 4. Refresh multiblock members' activity from `ctx`.
    ///
    /// Returns an event for every burner that started or stopped and every
    /// member whose activity changed.
    pub fn tick(&mut self, ctx: &HeatContext, current_tick: Ticks) -> Vec<HeatEvent> {
        let ids: Vec<HeatNodeId> = self.by_position.values().copied().collect();
        let mut events = Vec::new();

        for &id in &ids {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let Some(was_burning) = node.fuel.as_ref().map(FuelBurner::is_burning) else {
                continue;
            };
            let burning = node.burn_fuel(self.fuel_rate, self.heat_generation, self.source_boost);
            if burning != was_burning {
                events.push(HeatEvent::BurningChanged {
                    node: id,
                    burning,
                    tick: current_tick,
                });
            }
        }
        for &id in &ids {
            if self.simulate_node(id).is_none() {
                log::error!("heat node {id:?} is indexed but missing");
            }
        }
        for &id in &ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.apply_pending_heat();
            }
        }

        for &id in &ids {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let Some(multiblock) = node.multiblock else {
                continue;
            };
            let hot = ctx.is_hot(multiblock);
            if hot != node.active {
                node.active = hot;
                events.push(HeatEvent::ActivityChanged {
                    node: id,
                    multiblock,
                    active: hot,
                    tick: current_tick,
                });
            }
        }
        events
    }
}

fn divide(temp: Fixed64, resistance: Fixed64, at: Position, dir: Direction) -> Fixed64 {
    checked_div_64(temp, resistance).unwrap_or_else(|| {
        log::warn!("zero thermal resistance at {at:?} towards {dir:?}; no heat moved");
        Fixed64::ZERO
    })
}

// ===========================================================================
// Tests
// ===========================================================================
