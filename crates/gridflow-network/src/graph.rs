//! The network table: every placed segment, every live network, and the
//! rules that merge, split and reattach them.
//!
//! # Ownership
//!
//! The table is the single owner of all segments and networks. Segments
//! refer to their network by [`NetworkId`]; a segment with no network is an
//! orphan and works against its own local buffer until reattachment finds
//! it a network.
//!
//! # Conservation
//!
//! A network's pooled capacity is always the sum of its members'
//! capacities. Merges sum amounts, splits apportion the pooled amount by
//! capacity share, and a removed segment leaves with its own share. No
//! operation creates or destroys resources.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use gridflow_core::action::Action;
use gridflow_core::container::{ContainerError, ResourceContainer, ResourceFilter};
use gridflow_core::fixed::Ticks;
use gridflow_core::id::{AcceptorId, NetworkId, ResourceTypeId, SegmentId};
use gridflow_core::position::{Direction, Position};
use gridflow_core::stack::ResourceStack;
use gridflow_core::topology::{Medium, Topology};
use slotmap::SlotMap;

use crate::config::NetworkConfig;
use crate::event::NetworkEvent;
use crate::segment::{ConnectionType, SegmentSpec, TransmitterSegment};
use crate::share::apportion;
use crate::tier::Tier;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Misuse of the network table API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("unknown segment {0:?}")]
    UnknownSegment(SegmentId),
    #[error("position {0:?} already holds a segment")]
    PositionOccupied(Position),
    #[error("cannot change tier from {from:?} to {to:?}")]
    InvalidTierChange { from: Tier, to: Tier },
}

/// Why two networks could not be merged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("network {0:?} does not exist")]
    UnknownNetwork(NetworkId),
    #[error("cannot merge network {0:?} with itself")]
    SameNetwork(NetworkId),
    #[error("networks carry different media ({0:?} and {1:?})")]
    MediumMismatch(Medium, Medium),
    #[error("incompatible contents {0:?} and {1:?}")]
    Incompatible(Option<ResourceTypeId>, Option<ResourceTypeId>),
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Amounts moved by a network during the last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowStats {
    pub pulled: u64,
    pub pushed: u64,
}

/// A connected set of segments sharing one pooled buffer.
#[derive(Debug, Clone)]
pub struct Network {
    id: NetworkId,
    medium: Medium,
    members: BTreeSet<SegmentId>,
    pooled: ResourceContainer,
    pub(crate) stats: FlowStats,
    /// Where the push remainder starts handing out single units.
    pub(crate) push_cursor: u64,
}

impl Network {
    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn medium(&self) -> Medium {
        self.medium
    }

    pub fn members(&self) -> &BTreeSet<SegmentId> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, segment: SegmentId) -> bool {
        self.members.contains(&segment)
    }

    pub fn pooled(&self) -> &ResourceContainer {
        &self.pooled
    }

    pub(crate) fn pooled_mut(&mut self) -> &mut ResourceContainer {
        &mut self.pooled
    }

    pub fn stats(&self) -> FlowStats {
        self.stats
    }
}

// ---------------------------------------------------------------------------
// Neighbour lookup
// ---------------------------------------------------------------------------

/// What lies beyond one side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    Segment(SegmentId),
    Acceptor(AcceptorId),
    Vacant,
    Unloaded,
}

// ---------------------------------------------------------------------------
// NetworkTable
// ---------------------------------------------------------------------------

/// Arena owning all segments and networks.
#[derive(Debug)]
pub struct NetworkTable {
    config: NetworkConfig,
    segments: SlotMap<SegmentId, TransmitterSegment>,
    by_position: BTreeMap<Position, SegmentId>,
    networks: SlotMap<NetworkId, Network>,
    events: Vec<NetworkEvent>,
    tick: Ticks,
}

impl Default for NetworkTable {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

impl NetworkTable {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            config,
            segments: SlotMap::with_key(),
            by_position: BTreeMap::new(),
            networks: SlotMap::with_key(),
            events: Vec::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// The tick stamped on events.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn set_tick(&mut self, tick: Ticks) {
        self.tick = tick;
    }

    /// Take all events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<NetworkEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: NetworkEvent) {
        self.events.push(event);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn segment(&self, id: SegmentId) -> Option<&TransmitterSegment> {
        self.segments.get(id)
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> Option<&mut TransmitterSegment> {
        self.segments.get_mut(id)
    }

    pub fn segment_at(&self, pos: Position) -> Option<SegmentId> {
        self.by_position.get(&pos).copied()
    }

    /// All segments in position order.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &TransmitterSegment)> + '_ {
        self.by_position
            .values()
            .filter_map(|&id| self.segments.get(id).map(|s| (id, s)))
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn network(&self, id: NetworkId) -> Option<&Network> {
        self.networks.get(id)
    }

    pub(crate) fn network_mut(&mut self, id: NetworkId) -> Option<&mut Network> {
        self.networks.get_mut(id)
    }

    pub fn network_of(&self, segment: SegmentId) -> Option<&Network> {
        self.segments
            .get(segment)
            .and_then(|s| s.network)
            .and_then(|n| self.networks.get(n))
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> + '_ {
        self.networks.values()
    }

    /// Live network ids in ascending order.
    pub fn network_ids(&self) -> Vec<NetworkId> {
        let mut ids: Vec<NetworkId> = self.networks.keys().collect();
        ids.sort();
        ids
    }

    pub fn network_count(&self) -> usize {
        self.networks.len()
    }

    /// Orphan segments in position order.
    pub fn orphans(&self) -> Vec<SegmentId> {
        self.segments()
            .filter(|(_, s)| s.is_orphan())
            .map(|(id, _)| id)
            .collect()
    }

    /// Members of `members` sorted by position.
    pub fn by_position_order(&self, members: &BTreeSet<SegmentId>) -> Vec<SegmentId> {
        let mut ordered: Vec<SegmentId> = members.iter().copied().collect();
        ordered.sort_by_key(|id| self.segments.get(*id).map(|s| s.position));
        ordered
    }

    /// The stack a segment effectively holds: its network's pooled stack,
    /// or its own buffer when orphaned.
    pub fn contents(&self, segment: SegmentId) -> ResourceStack {
        match self.network_of(segment) {
            Some(network) => network.pooled.stack(),
            None => self
                .segments
                .get(segment)
                .map(|s| s.buffer.stack())
                .unwrap_or(ResourceStack::EMPTY),
        }
    }

    /// Sum of every pooled buffer and every orphan buffer.
    pub fn total_stored(&self) -> u64 {
        let pooled: u64 = self.networks.values().map(|n| n.pooled.stored()).sum();
        let orphaned: u64 = self
            .segments
            .values()
            .filter(|s| s.is_orphan())
            .map(|s| s.buffer.stored())
            .sum();
        pooled + orphaned
    }

    /// What lies on side `dir` of `pos`, as seen by a transmitter of
    /// `medium`.
    pub fn neighbor<T: Topology + ?Sized>(
        &self,
        topology: &T,
        pos: Position,
        dir: Direction,
        medium: Medium,
    ) -> Neighbor {
        let target = pos.offset(dir);
        if !topology.is_loaded(target) {
            return Neighbor::Unloaded;
        }
        if let Some(&segment) = self.by_position.get(&target) {
            return Neighbor::Segment(segment);
        }
        match topology.acceptor_at(target, dir.opposite(), medium) {
            Some(acceptor) => Neighbor::Acceptor(acceptor),
            None => Neighbor::Vacant,
        }
    }

    /// The segment linked to `id` across `dir`: same medium and both facing
    /// sides open. Loadedness is not checked.
    fn linked(&self, id: SegmentId, dir: Direction) -> Option<SegmentId> {
        let segment = self.segments.get(id)?;
        if !segment.connection(dir).is_open() {
            return None;
        }
        let other_id = *self.by_position.get(&segment.position.offset(dir))?;
        let other = self.segments.get(other_id)?;
        (other.medium == segment.medium && other.connection(dir.opposite()).is_open())
            .then_some(other_id)
    }

    /// [`linked`](Self::linked), but only between two loaded positions.
    fn linked_loaded<T: Topology + ?Sized>(
        &self,
        topology: &T,
        id: SegmentId,
        dir: Direction,
    ) -> Option<SegmentId> {
        let segment = self.segments.get(id)?;
        if !topology.is_loaded(segment.position) || !topology.is_loaded(segment.position.offset(dir))
        {
            return None;
        }
        self.linked(id, dir)
    }

    // -----------------------------------------------------------------------
    // Direct buffer access
    // -----------------------------------------------------------------------

    /// Insert into the store a segment works against (pooled or local).
    /// Returns what did not fit.
    pub fn insert_into(
        &mut self,
        segment: SegmentId,
        stack: ResourceStack,
        action: Action,
    ) -> Result<ResourceStack, NetworkError> {
        Ok(self.store_mut(segment)?.insert(stack, action))
    }

    /// Extract from the store a segment works against.
    pub fn extract_from(
        &mut self,
        segment: SegmentId,
        amount: u64,
        action: Action,
    ) -> Result<ResourceStack, NetworkError> {
        Ok(self.store_mut(segment)?.extract(amount, action))
    }

    fn store_mut(&mut self, segment: SegmentId) -> Result<&mut ResourceContainer, NetworkError> {
        let seg = self
            .segments
            .get_mut(segment)
            .ok_or(NetworkError::UnknownSegment(segment))?;
        match seg.network.and_then(|n| self.networks.get_mut(n)) {
            Some(network) => Ok(&mut network.pooled),
            None => Ok(&mut seg.buffer),
        }
    }

    // -----------------------------------------------------------------------
    // Placement and removal
    // -----------------------------------------------------------------------

    /// Place a segment as an orphan. It joins or forms a network at the
    /// next reattachment.
    pub fn place_segment(&mut self, spec: SegmentSpec) -> Result<SegmentId, NetworkError> {
        if self.by_position.contains_key(&spec.position) {
            return Err(NetworkError::PositionOccupied(spec.position));
        }
        let tier_spec = self.config.spec(spec.medium, spec.tier);
        let id = self
            .segments
            .insert(TransmitterSegment::new(&spec, tier_spec));
        self.by_position.insert(spec.position, id);
        log::debug!(
            "placed {:?} {:?} segment {id:?} at {:?}",
            spec.tier,
            spec.medium,
            spec.position
        );
        Ok(id)
    }

    /// Remove a segment. Returns the contents it takes with it: its local
    /// buffer if orphaned, otherwise its capacity share of the pool.
    ///
    /// The rest of its network is split into connected components.
    pub fn remove_segment(&mut self, id: SegmentId) -> Result<ResourceStack, NetworkError> {
        let segment = self
            .segments
            .remove(id)
            .ok_or(NetworkError::UnknownSegment(id))?;
        self.by_position.remove(&segment.position);
        let Some(net_id) = segment.network else {
            return Ok(segment.buffer.stack());
        };
        Ok(self.release_member(id, net_id, segment.capacity()))
    }

    /// Take `id` out of `net_id` along with its capacity share of the pool,
    /// then dissolve or split what is left. Returns the share.
    fn release_member(&mut self, id: SegmentId, net_id: NetworkId, own: u64) -> ResourceStack {
        let Some(network) = self.networks.get_mut(net_id) else {
            log::error!("segment {id:?} referenced missing network {net_id:?}");
            return ResourceStack::EMPTY;
        };

        network.members.remove(&id);
        let pooled_capacity = network.pooled.capacity();
        let total = network.pooled.stored();
        let share = if pooled_capacity == 0 {
            0
        } else {
            (u128::from(total) * u128::from(own) / u128::from(pooled_capacity)) as u64
        };
        let taken = network.pooled.extract(share, Action::Execute);
        let overflow = network
            .pooled
            .set_capacity(pooled_capacity.saturating_sub(own));
        let taken = if overflow.is_empty() {
            taken
        } else {
            log::error!("releasing {id:?} overflowed the pool of {net_id:?} by {}", overflow.amount);
            overflow.with_amount(overflow.amount + taken.amount)
        };

        if network.members.is_empty() {
            self.networks.remove(net_id);
            log::debug!("network {net_id:?} dissolved");
            self.emit(NetworkEvent::NetworkDissolved {
                network: net_id,
                tick: self.tick,
            });
        } else {
            self.split_network(net_id);
        }
        taken
    }

    /// Turn a networked segment back into an orphan holding its capacity
    /// share, so reattachment retries it.
    fn detach(&mut self, id: SegmentId) {
        let Some(segment) = self.segments.get_mut(id) else {
            return;
        };
        let Some(net_id) = segment.network.take() else {
            return;
        };
        let own = segment.capacity();
        let share = self.release_member(id, net_id, own);
        if let Some(segment) = self.segments.get_mut(id) {
            if let Err(e) = segment.buffer.set_stack(share) {
                log::error!("detaching {id:?} discarded {} units: {e}", share.amount);
            }
        }
        log::debug!("segment {id:?} detached from {net_id:?}");
    }

    // -----------------------------------------------------------------------
    // Connection and tier changes
    // -----------------------------------------------------------------------

    /// Change one side's connection type.
    ///
    /// Closing a side that linked two members of a network splits it if the
    /// network is no longer connected. Opening a side that links two
    /// different networks attempts a merge; if the contents conflict, the
    /// segment is detached as an orphan and retries at every reattachment.
    /// Orphans pick the change up at the next reattachment.
    pub fn set_connection(
        &mut self,
        id: SegmentId,
        dir: Direction,
        connection: ConnectionType,
    ) -> Result<(), NetworkError> {
        let before = self.linked(id, dir);
        let segment = self
            .segments
            .get_mut(id)
            .ok_or(NetworkError::UnknownSegment(id))?;
        segment.connections[dir.index()] = connection;
        let own_network = segment.network;
        let after = self.linked(id, dir);

        match (before, after) {
            (Some(other), None) => {
                let other_network = self.segments.get(other).and_then(|s| s.network);
                if let Some(net) = own_network {
                    if other_network == Some(net) {
                        self.split_network(net);
                    }
                }
            }
            (None, Some(other)) => {
                let other_network = self.segments.get(other).and_then(|s| s.network);
                if let (Some(a), Some(b)) = (own_network, other_network) {
                    if a != b && self.merge_networks(a, b).is_err() {
                        self.connection_failed(id);
                        self.detach(id);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Move a segment one tier up or down. Returns whatever no longer fits.
    pub fn change_tier(&mut self, id: SegmentId, tier: Tier) -> Result<ResourceStack, NetworkError> {
        let segment = self
            .segments
            .get_mut(id)
            .ok_or(NetworkError::UnknownSegment(id))?;
        let from = segment.tier;
        if !from.is_adjacent(tier) {
            return Err(NetworkError::InvalidTierChange { from, to: tier });
        }
        let spec = self.config.spec(segment.medium, tier);
        let old_capacity = segment.capacity();
        segment.tier = tier;
        segment.pull_rate = spec.pull_rate;
        let local_spill = segment.buffer.set_capacity(spec.capacity);

        let spilled = match segment.network.and_then(|n| self.networks.get_mut(n)) {
            Some(network) => {
                let capacity = network.pooled.capacity() - old_capacity + spec.capacity;
                network.pooled.set_capacity(capacity)
            }
            None => local_spill,
        };
        log::debug!("segment {id:?} changed tier {from:?} -> {tier:?}, spilled {}", spilled.amount);
        self.emit(NetworkEvent::TierChanged {
            segment: id,
            from,
            to: tier,
            spilled,
            tick: self.tick,
        });
        Ok(spilled)
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    fn create_network(&mut self, medium: Medium) -> NetworkId {
        self.networks.insert_with_key(|id| Network {
            id,
            medium,
            members: BTreeSet::new(),
            pooled: ResourceContainer::new(0, ResourceFilter::Any),
            stats: FlowStats::default(),
            push_cursor: 0,
        })
    }

    /// Move an orphan into `net_id`, carrying its buffer into the pool.
    /// Callers check compatibility first.
    fn join(&mut self, id: SegmentId, net_id: NetworkId) {
        let Some(segment) = self.segments.get_mut(id) else {
            return;
        };
        let Some(network) = self.networks.get_mut(net_id) else {
            return;
        };
        let stack = segment.take_buffer();
        segment.network = Some(net_id);
        network.members.insert(id);
        let capacity = network.pooled.capacity() + segment.capacity();
        network.pooled.set_capacity(capacity);
        let rest = network.pooled.insert(stack, Action::Execute);
        debug_assert!(rest.is_empty(), "joining {id:?} lost {rest:?}");
        if !rest.is_empty() {
            log::error!("joining {id:?} to {net_id:?} discarded {} units", rest.amount);
        }
    }

    /// Merge two networks. The one with more members survives (ties keep
    /// `a`); amounts and capacities are summed.
    ///
    /// Incompatible contents leave both networks untouched.
    pub fn merge_networks(&mut self, a: NetworkId, b: NetworkId) -> Result<NetworkId, MergeError> {
        if a == b {
            return Err(MergeError::SameNetwork(a));
        }
        let first = self.networks.get(a).ok_or(MergeError::UnknownNetwork(a))?;
        let second = self.networks.get(b).ok_or(MergeError::UnknownNetwork(b))?;
        if first.medium != second.medium {
            return Err(MergeError::MediumMismatch(first.medium, second.medium));
        }
        let (sa, sb) = (first.pooled.stack(), second.pooled.stack());
        if !sa.is_compatible(&sb) {
            log::warn!(
                "refusing to merge {a:?} ({:?}) with {b:?} ({:?})",
                sa.resource_type(),
                sb.resource_type()
            );
            return Err(MergeError::Incompatible(sa.resource_type(), sb.resource_type()));
        }
        let (survivor, absorbed) = if second.members.len() > first.members.len() {
            (b, a)
        } else {
            (a, b)
        };

        let absorbed_network = self
            .networks
            .remove(absorbed)
            .ok_or(MergeError::UnknownNetwork(absorbed))?;
        for member in &absorbed_network.members {
            if let Some(segment) = self.segments.get_mut(*member) {
                segment.network = Some(survivor);
            }
        }
        let target = self
            .networks
            .get_mut(survivor)
            .ok_or(MergeError::UnknownNetwork(survivor))?;
        target.members.extend(absorbed_network.members.iter().copied());
        let capacity = target.pooled.capacity() + absorbed_network.pooled.capacity();
        target.pooled.set_capacity(capacity);
        let rest = target
            .pooled
            .insert(absorbed_network.pooled.stack(), Action::Execute);
        debug_assert!(rest.is_empty(), "merge lost {rest:?}");
        if !rest.is_empty() {
            log::error!("merging {absorbed:?} into {survivor:?} discarded {} units", rest.amount);
        }

        log::debug!("merged network {absorbed:?} into {survivor:?}");
        self.emit(NetworkEvent::NetworksMerged {
            survivor,
            absorbed,
            tick: self.tick,
        });
        Ok(survivor)
    }

    // -----------------------------------------------------------------------
    // Split
    // -----------------------------------------------------------------------

    /// Connected components of `members`, each in position order, ordered
    /// by their first position.
    fn components(&self, members: &BTreeSet<SegmentId>) -> Vec<Vec<SegmentId>> {
        let mut seen = BTreeSet::new();
        let mut components = Vec::new();
        for start in self.by_position_order(members) {
            if !seen.insert(start) {
                continue;
            }
            let mut component = BTreeSet::from([start]);
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for dir in Direction::ALL {
                    if let Some(next) = self.linked(current, dir) {
                        if members.contains(&next) && seen.insert(next) {
                            component.insert(next);
                            queue.push_back(next);
                        }
                    }
                }
            }
            components.push(self.by_position_order(&component));
        }
        components
    }

    /// Recompute a network's connected components and split it if there is
    /// more than one. Returns the ids of newly created networks.
    ///
    /// The pooled amount is apportioned by capacity share and the component
    /// with the largest capacity keeps the original id.
    pub fn split_network(&mut self, net_id: NetworkId) -> Vec<NetworkId> {
        let Some(network) = self.networks.get(net_id) else {
            return Vec::new();
        };
        let components = self.components(&network.members);
        if components.len() <= 1 {
            return Vec::new();
        }
        let medium = network.medium;
        let stack = network.pooled.stack();
        let capacities: Vec<u64> = components
            .iter()
            .map(|c| {
                c.iter()
                    .filter_map(|s| self.segments.get(*s))
                    .map(|s| s.capacity())
                    .sum()
            })
            .collect();
        let shares = apportion(stack.amount, &capacities);
        let keep = (0..components.len())
            .max_by(|&x, &y| capacities[x].cmp(&capacities[y]).then(y.cmp(&x)))
            .unwrap_or(0);

        let mut created = Vec::new();
        for (i, component) in components.into_iter().enumerate() {
            let target = if i == keep {
                net_id
            } else {
                let new_id = self.create_network(medium);
                created.push(new_id);
                new_id
            };
            for member in &component {
                if let Some(segment) = self.segments.get_mut(*member) {
                    segment.network = Some(target);
                }
            }
            let Some(network) = self.networks.get_mut(target) else {
                continue;
            };
            network.members = component.into_iter().collect();
            if i == keep {
                network.pooled.set_empty();
            }
            network.pooled.set_capacity(capacities[i]);
            let rest = network
                .pooled
                .insert(stack.with_amount(shares[i]), Action::Execute);
            if !rest.is_empty() {
                log::error!("split of {net_id:?} discarded {} units", rest.amount);
            }
        }

        log::debug!("network {net_id:?} split into {} parts", created.len() + 1);
        self.emit(NetworkEvent::NetworkSplit {
            original: net_id,
            created: created.clone(),
            tick: self.tick,
        });
        created
    }

    // -----------------------------------------------------------------------
    // Orphan reattachment
    // -----------------------------------------------------------------------

    fn connection_failed(&mut self, id: SegmentId) {
        let Some(segment) = self.segments.get_mut(id) else {
            return;
        };
        segment.failed_connections += 1;
        let position = segment.position;
        log::warn!("segment {id:?} at {position:?} failed to connect to an incompatible network");
        self.emit(NetworkEvent::ConnectionFailed {
            segment: id,
            position,
            tick: self.tick,
        });
    }

    /// Give every loaded orphan a chance to join, bridge or form a network.
    ///
    /// Orphans are visited in position order and their sides in direction
    /// order, so the outcome only depends on the layout.
    pub fn reattach_orphans<T: Topology + ?Sized>(&mut self, topology: &T) {
        for id in self.orphans() {
            let ready = self
                .segments
                .get(id)
                .is_some_and(|s| s.is_orphan() && topology.is_loaded(s.position));
            if ready {
                self.attach_orphan(topology, id);
            }
        }
    }

    /// Distinct networks linked to `id`, in direction order.
    fn adjacent_networks<T: Topology + ?Sized>(&self, topology: &T, id: SegmentId) -> Vec<NetworkId> {
        let mut networks = Vec::new();
        for dir in Direction::ALL {
            let net = self
                .linked_loaded(topology, id, dir)
                .and_then(|other| self.segments.get(other))
                .and_then(|s| s.network);
            if let Some(net) = net {
                if !networks.contains(&net) {
                    networks.push(net);
                }
            }
        }
        networks
    }

    /// Join the orphan to its neighbouring networks, bridging them, or form
    /// a new network if it has none. If the orphan's buffer and those
    /// networks do not all agree on a resource type, nothing changes and
    /// every conflicting network is signalled.
    fn attach_orphan<T: Topology + ?Sized>(&mut self, topology: &T, id: SegmentId) {
        let networks = self.adjacent_networks(topology, id);
        let Some((&first, rest)) = networks.split_first() else {
            self.form_network(topology, id);
            return;
        };

        let mut kind = self.contents(id);
        let mut conflicts = 0;
        for net in &networks {
            let pooled = self
                .networks
                .get(*net)
                .map_or(ResourceStack::EMPTY, |n| n.pooled.stack());
            if !kind.is_compatible(&pooled) {
                conflicts += 1;
            } else if kind.is_empty() {
                kind = pooled;
            }
        }
        if conflicts > 0 {
            for _ in 0..conflicts {
                self.connection_failed(id);
            }
            return;
        }

        self.join(id, first);
        self.emit(NetworkEvent::SegmentJoined {
            segment: id,
            network: first,
            tick: self.tick,
        });
        let mut joined = first;
        for &net in rest {
            match self.merge_networks(joined, net) {
                Ok(survivor) => joined = survivor,
                Err(_) => self.connection_failed(id),
            }
        }
    }

    /// Gather the compatible orphans connected to `start` into a new
    /// network. Orphans that touch a network are left to attach on their
    /// own turn.
    fn form_network<T: Topology + ?Sized>(&mut self, topology: &T, start: SegmentId) {
        let Some(medium) = self.segments.get(start).map(|s| s.medium) else {
            return;
        };
        let mut kind = self.contents(start);
        let mut members = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for dir in Direction::ALL {
                let Some(next) = self.linked_loaded(topology, current, dir) else {
                    continue;
                };
                let Some(segment) = self.segments.get(next) else {
                    continue;
                };
                if members.contains(&next) || !segment.is_orphan() {
                    continue;
                }
                let held = segment.buffer.stack();
                if !kind.is_compatible(&held) || !self.adjacent_networks(topology, next).is_empty() {
                    continue;
                }
                if kind.is_empty() {
                    kind = held;
                }
                members.insert(next);
                queue.push_back(next);
            }
        }

        let net_id = self.create_network(medium);
        let ordered = self.by_position_order(&members);
        for member in &ordered {
            self.join(*member, net_id);
        }
        log::debug!("formed network {net_id:?} with {} segments", ordered.len());
        self.emit(NetworkEvent::NetworkFormed {
            network: net_id,
            members: ordered.len(),
            tick: self.tick,
        });
    }

    /// Restore a segment's local buffer. Only used while loading snapshots.
    pub(crate) fn restore_buffer(
        &mut self,
        id: SegmentId,
        stack: ResourceStack,
    ) -> Result<(), ContainerError> {
        match self.segments.get_mut(id) {
            Some(segment) => segment.buffer.set_stack(stack),
            None => Ok(()),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
