use gridflow_core::fixed::Ticks;
use gridflow_core::id::{NetworkId, SegmentId};
use gridflow_core::position::Position;
use gridflow_core::stack::ResourceStack;

use crate::tier::Tier;

/// Structural changes reported by the network table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// Orphans formed a new network.
    NetworkFormed {
        network: NetworkId,
        members: usize,
        tick: Ticks,
    },
    /// An orphan joined an existing network.
    SegmentJoined {
        segment: SegmentId,
        network: NetworkId,
        tick: Ticks,
    },
    /// `absorbed` was merged into `survivor` and no longer exists.
    NetworksMerged {
        survivor: NetworkId,
        absorbed: NetworkId,
        tick: Ticks,
    },
    /// A network fell apart; `original` kept the largest component.
    NetworkSplit {
        original: NetworkId,
        created: Vec<NetworkId>,
        tick: Ticks,
    },
    /// The last member of a network left.
    NetworkDissolved { network: NetworkId, tick: Ticks },
    /// A segment could not join or bridge an incompatible network.
    ConnectionFailed {
        segment: SegmentId,
        position: Position,
        tick: Ticks,
    },
    /// A segment changed tier; `spilled` is what no longer fit.
    TierChanged {
        segment: SegmentId,
        from: Tier,
        to: Tier,
        spilled: ResourceStack,
        tick: Ticks,
    },
}
