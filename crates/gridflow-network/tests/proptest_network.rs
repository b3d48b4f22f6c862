//! Property-based tests for network topology changes.
//!
//! Builds random layouts, applies random edits and ticks, and checks that
//! resources are conserved and capacities stay consistent.

use gridflow_core::action::Action;
use gridflow_core::position::{Direction, Position};
use gridflow_core::stack::ResourceStack;
use gridflow_core::test_utils::*;
use gridflow_core::topology::{CapabilityRegistry, Medium};
use gridflow_network::share::{apportion, water_fill};
use gridflow_network::{ConnectionType, DistributionScheduler, NetworkTable, SegmentSpec, Tier};
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum Edit {
    Place(i32, i32, bool),
    Remove(usize),
    Close(usize, usize),
    Open(usize, usize),
    Fill(usize, bool, u64),
    Tick,
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0..5i32, 0..3i32, any::<bool>()).prop_map(|(x, z, adv)| Edit::Place(x, z, adv)),
        (0..32usize).prop_map(Edit::Remove),
        (0..32usize, 0..6usize).prop_map(|(s, d)| Edit::Close(s, d)),
        (0..32usize, 0..6usize).prop_map(|(s, d)| Edit::Open(s, d)),
        (0..32usize, any::<bool>(), 1..5000u64).prop_map(|(s, lava, a)| Edit::Fill(s, lava, a)),
        Just(Edit::Tick),
    ]
}

fn nth_segment(table: &NetworkTable, n: usize) -> Option<gridflow_core::id::SegmentId> {
    let count = table.segment_count();
    if count == 0 {
        return None;
    }
    table.segments().nth(n % count).map(|(id, _)| id)
}

/// Check the structural invariants and return the stored total.
fn check(table: &NetworkTable) -> Result<u64, TestCaseError> {
    for network in table.networks() {
        let capacity: u64 = network
            .members()
            .iter()
            .map(|m| table.segment(*m).map(|s| s.capacity()).unwrap_or(0))
            .sum();
        prop_assert_eq!(network.pooled().capacity(), capacity);
        prop_assert!(network.pooled().stored() <= capacity);
        for member in network.members() {
            let segment = table.segment(*member);
            prop_assert!(segment.is_some());
            if let Some(segment) = segment {
                prop_assert_eq!(segment.network(), Some(network.id()));
                prop_assert!(segment.buffer().is_empty());
            }
        }
    }
    Ok(table.total_stored())
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// No edit or tick creates or destroys resources, and pools always
    /// match their members' capacities.
    #[test]
    fn edits_conserve_resources(edits in proptest::collection::vec(arb_edit(), 1..60)) {
        let mut table = NetworkTable::default();
        let mut world = CapabilityRegistry::new();
        let mut inside: u64 = 0;
        let mut tick = 0;

        for edit in &edits {
            match *edit {
                Edit::Place(x, z, advanced) => {
                    let tier = if advanced { Tier::Advanced } else { Tier::Basic };
                    let _ = table.place_segment(SegmentSpec::new(Position::new(x, 0, z), Medium::Fluid, tier));
                }
                Edit::Remove(n) => {
                    if let Some(id) = nth_segment(&table, n) {
                        let taken = table.remove_segment(id).unwrap();
                        inside -= taken.amount;
                    }
                }
                Edit::Close(n, d) | Edit::Open(n, d) => {
                    if let Some(id) = nth_segment(&table, n) {
                        let kind = if matches!(edit, Edit::Close(..)) {
                            ConnectionType::None
                        } else {
                            ConnectionType::Normal
                        };
                        table.set_connection(id, Direction::ALL[d], kind).unwrap();
                    }
                }
                Edit::Fill(n, lava_fill, amount) => {
                    if let Some(id) = nth_segment(&table, n) {
                        let resource = if lava_fill { lava() } else { water() };
                        let offered = ResourceStack::new(resource, amount);
                        let rest = table.insert_into(id, offered, Action::Execute).unwrap();
                        inside += amount - rest.amount;
                    }
                }
                Edit::Tick => {
                    DistributionScheduler::tick(&mut table, &mut world, tick);
                    tick += 1;
                }
            }
            let total = check(&table)?;
            prop_assert_eq!(total, inside);
        }
    }

    /// Split shares never exceed capacity and always sum to the total.
    #[test]
    fn apportion_conserves(caps in proptest::collection::vec(0..100_000u64, 1..12), frac in 0.0..=1.0f64) {
        let sum: u64 = caps.iter().sum();
        let total = ((sum as f64) * frac) as u64;
        let shares = apportion(total.min(sum), &caps);
        prop_assert_eq!(shares.iter().sum::<u64>(), total.min(sum));
        for (s, c) in shares.iter().zip(caps.iter()) {
            prop_assert!(s <= c);
        }
    }

    /// Water-filling hands out min(total, sum of limits) and treats
    /// unlimited parts within one unit of each other.
    #[test]
    fn water_fill_is_fair(total in 0..100_000u64, n in 1..8usize, cursor in 0..100u64) {
        let limits = vec![u64::MAX; n];
        let plan = water_fill(total, &limits, cursor);
        prop_assert_eq!(plan.iter().sum::<u64>(), total);
        let max = plan.iter().max().copied().unwrap_or(0);
        let min = plan.iter().min().copied().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }
}
