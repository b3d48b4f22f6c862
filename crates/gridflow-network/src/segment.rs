//! Transmitter segments: the pipes, tubes and cables networks are built from.

use gridflow_core::container::{ResourceContainer, ResourceFilter};
use gridflow_core::id::NetworkId;
use gridflow_core::position::{Direction, Position};
use gridflow_core::stack::ResourceStack;
use gridflow_core::topology::Medium;
use serde::{Deserialize, Serialize};

use crate::config::TierSpec;
use crate::tier::Tier;

// ---------------------------------------------------------------------------
// Connection mask
// ---------------------------------------------------------------------------

/// How a segment side interacts with whatever is beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Side is closed.
    None,
    /// Links to segments; pushes into acceptors.
    #[default]
    Normal,
    /// Links to segments; drains acceptors into the buffer.
    Pull,
}

impl ConnectionType {
    pub fn is_open(self) -> bool {
        self != ConnectionType::None
    }
}

// ---------------------------------------------------------------------------
// Placement spec
// ---------------------------------------------------------------------------

/// Everything needed to place a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSpec {
    pub position: Position,
    pub medium: Medium,
    pub tier: Tier,
    pub connections: [ConnectionType; 6],
}

impl SegmentSpec {
    /// A segment with every side `Normal`.
    pub fn new(position: Position, medium: Medium, tier: Tier) -> Self {
        Self {
            position,
            medium,
            tier,
            connections: [ConnectionType::Normal; 6],
        }
    }

    pub fn with_connection(mut self, dir: Direction, connection: ConnectionType) -> Self {
        self.connections[dir.index()] = connection;
        self
    }
}

// ---------------------------------------------------------------------------
// TransmitterSegment
// ---------------------------------------------------------------------------

/// One placed transmitter.
///
/// The local buffer is only used while the segment is an orphan. On joining
/// a network its contents move into the network's pooled buffer, and on
/// leaving one the segment gets its capacity share back.
#[derive(Debug, Clone)]
pub struct TransmitterSegment {
    pub(crate) position: Position,
    pub(crate) medium: Medium,
    pub(crate) tier: Tier,
    pub(crate) pull_rate: u64,
    pub(crate) connections: [ConnectionType; 6],
    pub(crate) buffer: ResourceContainer,
    pub(crate) network: Option<NetworkId>,
    pub(crate) failed_connections: u64,
}

impl TransmitterSegment {
    pub(crate) fn new(spec: &SegmentSpec, tier_spec: TierSpec) -> Self {
        Self {
            position: spec.position,
            medium: spec.medium,
            tier: spec.tier,
            pull_rate: tier_spec.pull_rate,
            connections: spec.connections,
            buffer: ResourceContainer::new(tier_spec.capacity, ResourceFilter::Any),
            network: None,
            failed_connections: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn medium(&self) -> Medium {
        self.medium
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// What this segment contributes to its network's pooled capacity.
    pub fn capacity(&self) -> u64 {
        self.buffer.capacity()
    }

    pub fn pull_rate(&self) -> u64 {
        self.pull_rate
    }

    pub fn connection(&self, dir: Direction) -> ConnectionType {
        self.connections[dir.index()]
    }

    pub fn connections(&self) -> [ConnectionType; 6] {
        self.connections
    }

    pub fn network(&self) -> Option<NetworkId> {
        self.network
    }

    pub fn is_orphan(&self) -> bool {
        self.network.is_none()
    }

    /// The local buffer. Always empty while the segment is networked.
    pub fn buffer(&self) -> &ResourceContainer {
        &self.buffer
    }

    /// How many times this segment failed to join or bridge a network.
    pub fn failed_connections(&self) -> u64 {
        self.failed_connections
    }

    pub(crate) fn take_buffer(&mut self) -> ResourceStack {
        let stack = self.buffer.stack();
        self.buffer.set_empty();
        stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_defaults_to_normal_sides() {
        let spec = SegmentSpec::new(Position::new(0, 0, 0), Medium::Fluid, Tier::Basic)
            .with_connection(Direction::Down, ConnectionType::Pull)
            .with_connection(Direction::Up, ConnectionType::None);
        assert_eq!(spec.connections[Direction::Down.index()], ConnectionType::Pull);
        assert_eq!(spec.connections[Direction::Up.index()], ConnectionType::None);
        assert_eq!(spec.connections[Direction::East.index()], ConnectionType::Normal);
    }

    #[test]
    fn new_segment_is_orphan_with_tier_buffer() {
        let spec = SegmentSpec::new(Position::new(1, 2, 3), Medium::Chemical, Tier::Elite);
        let segment = TransmitterSegment::new(&spec, TierSpec::new(256_000, 64_000));
        assert!(segment.is_orphan());
        assert_eq!(segment.capacity(), 256_000);
        assert_eq!(segment.pull_rate(), 64_000);
        assert!(segment.buffer().is_empty());
        assert!(!ConnectionType::None.is_open());
        assert!(segment.connection(Direction::West).is_open());
    }
}
