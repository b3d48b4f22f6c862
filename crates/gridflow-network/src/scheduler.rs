//! Per-tick resource distribution.
//!
//! Every tick the scheduler:
//!
//! 1. reattaches orphans (join, bridge or form networks),
//! 2. for each network in id order, pulls from acceptors on `Pull` sides
//!    and pushes the pool into acceptors on `Normal` sides,
//! 3. runs the same pull/push for every orphan against its own buffer.
//!
//! Pulls are atomic per acceptor: the drain and the insertion are probed
//! with `Simulate` and only committed when the pool absorbs the whole
//! offer. Pushes use equal-share water-filling (see [`water_fill`]) with a
//! per-network round-robin cursor for the final units, so equal acceptors
//! receive equal amounts over time.

use gridflow_core::action::Action;
use gridflow_core::container::ResourceContainer;
use gridflow_core::fixed::Ticks;
use gridflow_core::id::{AcceptorId, SegmentId};
use gridflow_core::position::Direction;
use gridflow_core::stack::ResourceStack;
use gridflow_core::topology::{Acceptor, Topology};

use crate::event::NetworkEvent;
use crate::graph::{FlowStats, Neighbor, NetworkTable};
use crate::segment::ConnectionType;
use crate::share::water_fill;

/// Drives a [`NetworkTable`] one tick at a time.
#[derive(Debug, Clone, Default)]
pub struct DistributionScheduler {
    next_tick: Ticks,
}

impl DistributionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume counting from `tick`, e.g. after loading a snapshot.
    pub fn starting_at(tick: Ticks) -> Self {
        Self { next_tick: tick }
    }

    /// The tick the next [`step`](Self::step) will run.
    pub fn current_tick(&self) -> Ticks {
        self.next_tick
    }

    /// Run one tick and advance the counter.
    pub fn step<T: Topology + ?Sized>(
        &mut self,
        table: &mut NetworkTable,
        topology: &mut T,
    ) -> Vec<NetworkEvent> {
        let events = Self::tick(table, topology, self.next_tick);
        self.next_tick += 1;
        events
    }

    /// Run a single tick stamped `current_tick`. Returns the events emitted
    /// during it.
    pub fn tick<T: Topology + ?Sized>(
        table: &mut NetworkTable,
        topology: &mut T,
        current_tick: Ticks,
    ) -> Vec<NetworkEvent> {
        table.set_tick(current_tick);
        table.reattach_orphans(&*topology);

        for net_id in table.network_ids() {
            let Some(network) = table.network(net_id) else {
                continue;
            };
            let members = table.by_position_order(network.members());
            let pulls = pull_sides(table, &*topology, &members);
            let pushes = push_targets(table, &*topology, &members);

            let Some(network) = table.network_mut(net_id) else {
                continue;
            };
            let cursor = network.push_cursor;
            network.push_cursor = network.push_cursor.wrapping_add(1);
            let pulled: u64 = pulls
                .iter()
                .map(|&(acceptor, rate)| pull_into(network.pooled_mut(), topology, acceptor, rate))
                .sum();
            let pushed = push_from(network.pooled_mut(), topology, &pushes, cursor);
            network.stats = FlowStats { pulled, pushed };
        }

        for id in table.orphans() {
            let loaded = table
                .segment(id)
                .is_some_and(|s| topology.is_loaded(s.position()));
            if !loaded {
                continue;
            }
            let pulls = pull_sides(table, &*topology, &[id]);
            let pushes = push_targets(table, &*topology, &[id]);
            let Some(segment) = table.segment_mut(id) else {
                continue;
            };
            for &(acceptor, rate) in &pulls {
                pull_into(&mut segment.buffer, topology, acceptor, rate);
            }
            push_from(&mut segment.buffer, topology, &pushes, current_tick);
        }

        table.drain_events()
    }
}

// ---------------------------------------------------------------------------
// Side discovery
// ---------------------------------------------------------------------------

/// Every (acceptor, pull rate) on a `Pull` side, one entry per side.
fn pull_sides<T: Topology + ?Sized>(
    table: &NetworkTable,
    topology: &T,
    members: &[SegmentId],
) -> Vec<(AcceptorId, u64)> {
    let mut sides = Vec::new();
    for &id in members {
        let Some(segment) = table.segment(id) else {
            continue;
        };
        for dir in Direction::ALL {
            if segment.connection(dir) != ConnectionType::Pull {
                continue;
            }
            if let Neighbor::Acceptor(acceptor) =
                table.neighbor(topology, segment.position(), dir, segment.medium())
            {
                sides.push((acceptor, segment.pull_rate()));
            }
        }
    }
    sides
}

/// Acceptors on `Normal` sides, deduplicated, in member then direction
/// order.
fn push_targets<T: Topology + ?Sized>(
    table: &NetworkTable,
    topology: &T,
    members: &[SegmentId],
) -> Vec<AcceptorId> {
    let mut targets = Vec::new();
    for &id in members {
        let Some(segment) = table.segment(id) else {
            continue;
        };
        for dir in Direction::ALL {
            if segment.connection(dir) != ConnectionType::Normal {
                continue;
            }
            if let Neighbor::Acceptor(acceptor) =
                table.neighbor(topology, segment.position(), dir, segment.medium())
            {
                if !targets.contains(&acceptor) {
                    targets.push(acceptor);
                }
            }
        }
    }
    targets
}

// ---------------------------------------------------------------------------
// Pull
// ---------------------------------------------------------------------------

/// Drain up to `rate` from one acceptor into `store`. Returns the amount
/// moved.
fn pull_into<T: Topology + ?Sized>(
    store: &mut ResourceContainer,
    topology: &mut T,
    id: AcceptorId,
    rate: u64,
) -> u64 {
    let Some(acceptor) = topology.acceptor_mut(id) else {
        return 0;
    };
    let available = rate.min(store.needed());
    if available == 0 {
        return 0;
    }
    let wanted = store.resource_type();
    let offered = acceptor.drain(wanted, available, Action::Simulate);
    if offered.is_empty() {
        return 0;
    }
    if offered.amount > available || wanted.is_some_and(|w| w != offered.resource) {
        log::warn!("acceptor {id:?} offered {offered:?} for a pull of {available} {wanted:?}");
        return 0;
    }
    if !store.insert(offered, Action::Simulate).is_empty() {
        return 0;
    }

    store.insert(offered, Action::Execute);
    let drained = acceptor.drain(Some(offered.resource), offered.amount, Action::Execute);
    if drained == offered {
        return offered.amount;
    }
    log::warn!("acceptor {id:?} promised {offered:?} but drained {drained:?}");
    reconcile_pull(store, acceptor, id, offered, drained)
}

/// Bring `store` in line with what an acceptor actually handed over.
fn reconcile_pull(
    store: &mut ResourceContainer,
    acceptor: &mut dyn Acceptor,
    id: AcceptorId,
    offered: ResourceStack,
    drained: ResourceStack,
) -> u64 {
    let same_kind = drained.is_empty() || drained.resource == offered.resource;
    if same_kind && drained.amount <= offered.amount {
        store.shrink((offered.amount - drained.amount) as i64, Action::Execute);
        return drained.amount;
    }

    // Undo the insertion and hand back whatever came out.
    store.shrink(offered.amount as i64, Action::Execute);
    let returned = acceptor.fill(drained, Action::Execute).min(drained.amount);
    if returned == drained.amount {
        return 0;
    }
    let kept = drained.with_amount(drained.amount - returned);
    let lost = store.insert(kept, Action::Execute);
    if !lost.is_empty() {
        log::error!("discarded {} units reconciling a pull from {id:?}", lost.amount);
    }
    kept.amount - lost.amount
}

// ---------------------------------------------------------------------------
// Push
// ---------------------------------------------------------------------------

/// Push the contents of `store` into `targets`. Returns the amount moved.
fn push_from<T: Topology + ?Sized>(
    store: &mut ResourceContainer,
    topology: &mut T,
    targets: &[AcceptorId],
    cursor: u64,
) -> u64 {
    let stack = store.stack();
    if stack.is_empty() || targets.is_empty() {
        return 0;
    }
    let limits: Vec<u64> = targets
        .iter()
        .map(|&id| {
            topology
                .acceptor_mut(id)
                .map(|a| a.fill(stack, Action::Simulate).min(stack.amount))
                .unwrap_or(0)
        })
        .collect();
    let plan = water_fill(stack.amount, &limits, cursor);

    let mut pushed = 0;
    for (&id, &amount) in targets.iter().zip(plan.iter()) {
        if amount == 0 {
            continue;
        }
        let Some(acceptor) = topology.acceptor_mut(id) else {
            continue;
        };
        let out = store.extract(amount, Action::Execute);
        if out.is_empty() {
            break;
        }
        let accepted = acceptor.fill(out, Action::Execute);
        if accepted < out.amount {
            log::warn!("acceptor {id:?} took {accepted} of a promised {}", out.amount);
            let back = store.insert(out.with_amount(out.amount - accepted), Action::Execute);
            if !back.is_empty() {
                log::error!("discarded {} units returning a push from {id:?}", back.amount);
            }
        } else if accepted > out.amount {
            log::warn!("acceptor {id:?} claims {accepted} of {}", out.amount);
        }
        pushed += accepted.min(out.amount);
    }
    pushed
}

// ===========================================================================
// Tests
// ===========================================================================
