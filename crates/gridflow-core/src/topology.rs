//! The boundary between the simulation and the world around it.
//!
//! The network simulation never inspects blocks directly. It asks a
//! [`Topology`] whether a position is loaded and which [`Acceptor`] exposes a
//! given medium on a given face. [`CapabilityRegistry`] is the in-memory
//! implementation: acceptors are registered once with the faces they expose,
//! and every lookup afterwards is a map query.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::action::Action;
use crate::container::ResourceContainer;
use crate::id::{AcceptorId, ResourceTypeId};
use crate::position::{Direction, DirectionSet, Position};
use crate::stack::ResourceStack;

// ---------------------------------------------------------------------------
// Medium
// ---------------------------------------------------------------------------

/// The kind of resource a transmitter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Medium {
    Fluid,
    Chemical,
    Energy,
}

// ---------------------------------------------------------------------------
// Acceptor
// ---------------------------------------------------------------------------

/// A non-transmitter neighbour that resources can be drained from or
/// filled into (a tank, a machine, a battery).
pub trait Acceptor: std::fmt::Debug + Send {
    /// Remove up to `amount`. With `Some(resource)` only that type may be
    /// drained; with `None` whatever the acceptor holds.
    fn drain(
        &mut self,
        resource: Option<ResourceTypeId>,
        amount: u64,
        action: Action,
    ) -> ResourceStack;

    /// Offer `stack`. Returns how much was (or would be) accepted.
    fn fill(&mut self, stack: ResourceStack, action: Action) -> u64;

    /// What the acceptor currently stores, for inspection only.
    fn contents(&self) -> ResourceStack {
        ResourceStack::EMPTY
    }
}

/// An acceptor backed by a single [`ResourceContainer`].
#[derive(Debug, Clone)]
pub struct TankAcceptor {
    container: ResourceContainer,
}

impl TankAcceptor {
    pub fn new(container: ResourceContainer) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &ResourceContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut ResourceContainer {
        &mut self.container
    }
}

impl Acceptor for TankAcceptor {
    fn drain(
        &mut self,
        resource: Option<ResourceTypeId>,
        amount: u64,
        action: Action,
    ) -> ResourceStack {
        match resource {
            Some(resource) => self.container.extract_matching(resource, amount, action),
            None => self.container.extract(amount, action),
        }
    }

    fn fill(&mut self, stack: ResourceStack, action: Action) -> u64 {
        stack.amount - self.container.insert(stack, action).amount
    }

    fn contents(&self) -> ResourceStack {
        self.container.stack()
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// World oracle queried by the simulation.
pub trait Topology {
    /// Whether the block at `pos` is loaded. Unloaded positions are treated
    /// as absent, never as empty.
    fn is_loaded(&self, pos: Position) -> bool;

    /// The acceptor exposing `medium` on face `face` of the block at `pos`.
    fn acceptor_at(&self, pos: Position, face: Direction, medium: Medium) -> Option<AcceptorId>;

    fn acceptor_mut(&mut self, id: AcceptorId) -> Option<&mut dyn Acceptor>;
}

// ---------------------------------------------------------------------------
// CapabilityRegistry
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Registered {
    position: Position,
    medium: Medium,
    sides: DirectionSet,
    acceptor: Box<dyn Acceptor>,
}

/// In-memory [`Topology`]: acceptors keyed by (position, face, medium),
/// resolved when they are registered.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    acceptors: SlotMap<AcceptorId, Registered>,
    faces: BTreeMap<(Position, Direction, Medium), AcceptorId>,
    unloaded: BTreeSet<Position>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an acceptor at `pos` exposing `medium` on `sides`.
    ///
    /// A face already claimed for the same medium is taken over by the new
    /// acceptor.
    pub fn register(
        &mut self,
        pos: Position,
        medium: Medium,
        sides: DirectionSet,
        acceptor: impl Acceptor + 'static,
    ) -> AcceptorId {
        let id = self.acceptors.insert(Registered {
            position: pos,
            medium,
            sides,
            acceptor: Box::new(acceptor),
        });
        for face in sides.iter() {
            if let Some(previous) = self.faces.insert((pos, face, medium), id) {
                log::debug!("face {face:?} at {pos:?} reassigned from {previous:?} to {id:?}");
            }
        }
        id
    }

    /// Remove an acceptor and all its faces.
    pub fn remove(&mut self, id: AcceptorId) -> Option<Box<dyn Acceptor>> {
        let entry = self.acceptors.remove(id)?;
        for face in entry.sides.iter() {
            let key = (entry.position, face, entry.medium);
            if self.faces.get(&key) == Some(&id) {
                self.faces.remove(&key);
            }
        }
        Some(entry.acceptor)
    }

    pub fn acceptor(&self, id: AcceptorId) -> Option<&dyn Acceptor> {
        self.acceptors.get(id).map(|e| e.acceptor.as_ref())
    }

    pub fn position_of(&self, id: AcceptorId) -> Option<Position> {
        self.acceptors.get(id).map(|e| e.position)
    }

    /// Mark a position unloaded. Its acceptors stay registered but are
    /// invisible until [`load`](Self::load) is called.
    pub fn unload(&mut self, pos: Position) {
        self.unloaded.insert(pos);
    }

    pub fn load(&mut self, pos: Position) {
        self.unloaded.remove(&pos);
    }

    pub fn len(&self) -> usize {
        self.acceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acceptors.is_empty()
    }
}

impl Topology for CapabilityRegistry {
    fn is_loaded(&self, pos: Position) -> bool {
        !self.unloaded.contains(&pos)
    }

    fn acceptor_at(&self, pos: Position, face: Direction, medium: Medium) -> Option<AcceptorId> {
        if !self.is_loaded(pos) {
            return None;
        }
        self.faces.get(&(pos, face, medium)).copied()
    }

    fn acceptor_mut(&mut self, id: AcceptorId) -> Option<&mut dyn Acceptor> {
        let entry = self.acceptors.get_mut(id)?;
        if self.unloaded.contains(&entry.position) {
            return None;
        }
        Some(entry.acceptor.as_mut())
    }
}
