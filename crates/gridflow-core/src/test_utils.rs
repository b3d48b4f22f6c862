//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::action::Action;
use crate::container::{ContentsListener, ResourceContainer, ResourceFilter};
use crate::fixed::Fixed64;
use crate::id::ResourceTypeId;
use crate::position::Position;
use crate::stack::ResourceStack;
use crate::topology::Acceptor;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Resource constructors
// ===========================================================================

pub fn water() -> ResourceTypeId {
    ResourceTypeId(0)
}
pub fn lava() -> ResourceTypeId {
    ResourceTypeId(1)
}
pub fn hydrogen() -> ResourceTypeId {
    ResourceTypeId(2)
}
pub fn energy() -> ResourceTypeId {
    ResourceTypeId(3)
}

pub fn stack(resource: ResourceTypeId, amount: u64) -> ResourceStack {
    ResourceStack::new(resource, amount)
}

// ===========================================================================
// Positions and containers
// ===========================================================================

pub fn pos(x: i32, y: i32, z: i32) -> Position {
    Position::new(x, y, z)
}

/// Positions `(0,0,0) .. (len-1,0,0)` along the x axis.
pub fn line(len: i32) -> Vec<Position> {
    (0..len).map(|x| Position::new(x, 0, 0)).collect()
}

/// An empty container that accepts anything.
pub fn tank(capacity: u64) -> ResourceContainer {
    ResourceContainer::new(capacity, ResourceFilter::Any)
}

/// A container already holding `amount` of `resource`.
pub fn filled_tank(capacity: u64, resource: ResourceTypeId, amount: u64) -> ResourceContainer {
    let mut container = tank(capacity);
    container.insert(ResourceStack::new(resource, amount), Action::Execute);
    container
}

// ===========================================================================
// Listeners
// ===========================================================================

/// Counts change notifications and remembers the last stack seen.
#[derive(Debug, Default)]
pub struct CountingListener {
    count: AtomicU64,
    last: Mutex<Option<ResourceStack>>,
}

impl CountingListener {
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<ResourceStack> {
        self.last.lock().ok().and_then(|guard| *guard)
    }
}

impl ContentsListener for CountingListener {
    fn on_contents_changed(&self, stack: &ResourceStack) {
        self.count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last.lock() {
            *guard = Some(*stack);
        }
    }
}

// ===========================================================================
// Acceptors
// ===========================================================================

/// An endless supply of one resource, limited only per call.
#[derive(Debug, Clone)]
pub struct EndlessSource {
    pub resource: ResourceTypeId,
    pub drained: u64,
}

impl EndlessSource {
    pub fn new(resource: ResourceTypeId) -> Self {
        Self {
            resource,
            drained: 0,
        }
    }
}

impl Acceptor for EndlessSource {
    fn drain(
        &mut self,
        resource: Option<ResourceTypeId>,
        amount: u64,
        action: Action,
    ) -> ResourceStack {
        if resource.is_some_and(|r| r != self.resource) {
            return ResourceStack::EMPTY;
        }
        if action.execute() {
            self.drained += amount;
        }
        ResourceStack::new(self.resource, amount)
    }

    fn fill(&mut self, _stack: ResourceStack, _action: Action) -> u64 {
        0
    }
}

/// Accepts anything up to a per-call limit and counts what it received.
#[derive(Debug, Clone)]
pub struct Sink {
    pub per_call: u64,
    pub received: ResourceStack,
}

impl Sink {
    pub fn new(per_call: u64) -> Self {
        Self {
            per_call,
            received: ResourceStack::EMPTY,
        }
    }
}

impl Acceptor for Sink {
    fn drain(
        &mut self,
        _resource: Option<ResourceTypeId>,
        _amount: u64,
        _action: Action,
    ) -> ResourceStack {
        ResourceStack::EMPTY
    }

    fn fill(&mut self, stack: ResourceStack, action: Action) -> u64 {
        let accepted = stack.amount.min(self.per_call);
        if action.execute() && accepted > 0 {
            self.received = ResourceStack::new(stack.resource, self.received.amount + accepted);
        }
        accepted
    }

    fn contents(&self) -> ResourceStack {
        self.received
    }
}
