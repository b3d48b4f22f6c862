//! Property-based tests for resource containers.
//!
//! Drives containers through random operation sequences and checks the
//! storage invariants after every step.

use gridflow_core::action::Action;
use gridflow_core::container::ResourceContainer;
use gridflow_core::serialize::{ContainerRecord, decode, encode};
use gridflow_core::stack::ResourceStack;
use gridflow_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

#[derive(Debug, Clone)]
enum Op {
    Insert(u32, u64, bool),
    Extract(u64, bool),
    Grow(i64, bool),
    SetSize(u64, bool),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3u32, 0..5000u64, any::<bool>()).prop_map(|(r, a, e)| Op::Insert(r, a, e)),
        (0..5000u64, any::<bool>()).prop_map(|(a, e)| Op::Extract(a, e)),
        (-5000..5000i64, any::<bool>()).prop_map(|(d, e)| Op::Grow(d, e)),
        (0..5000u64, any::<bool>()).prop_map(|(a, e)| Op::SetSize(a, e)),
    ]
}

fn apply(container: &mut ResourceContainer, op: &Op) {
    match *op {
        Op::Insert(r, amount, execute) => {
            let offered = ResourceStack::new(gridflow_core::id::ResourceTypeId(r), amount);
            let remainder = container.insert(offered, Action::get(execute));
            assert!(remainder.amount <= offered.amount);
        }
        Op::Extract(amount, execute) => {
            let got = container.extract(amount, Action::get(execute));
            assert!(got.amount <= amount);
        }
        Op::Grow(delta, execute) => {
            container.grow(delta, Action::get(execute));
        }
        Op::SetSize(amount, execute) => {
            container.set_size(amount, Action::get(execute));
        }
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Stored amount stays within [0, capacity] over any operation sequence.
    #[test]
    fn stored_never_exceeds_capacity(
        capacity in 1..3000u64,
        ops in proptest::collection::vec(arb_op(), 1..40),
    ) {
        let mut container = tank(capacity);
        for op in &ops {
            apply(&mut container, op);
            prop_assert!(container.stored() <= container.capacity());
            prop_assert_eq!(container.is_empty(), container.stored() == 0);
        }
    }

    /// Simulated operations never change contents.
    #[test]
    fn simulate_is_side_effect_free(
        capacity in 1..3000u64,
        fill in 0..3000u64,
        amount in 0..5000u64,
        delta in -5000..5000i64,
    ) {
        let mut container = filled_tank(capacity, water(), fill.min(capacity));
        let before = container.stack();
        let revision = container.revision();
        container.insert(ResourceStack::new(water(), amount), Action::Simulate);
        container.extract(amount, Action::Simulate);
        container.grow(delta, Action::Simulate);
        container.set_size(amount, Action::Simulate);
        prop_assert_eq!(container.stack(), before);
        prop_assert_eq!(container.revision(), revision);
    }

    /// shrink(x) is exactly -grow(-x), in simulation and in execution.
    #[test]
    fn shrink_mirrors_grow(
        capacity in 1..3000u64,
        fill in 0..3000u64,
        x in -10_000..10_000i64,
    ) {
        let mut a = filled_tank(capacity, lava(), fill.min(capacity));
        let mut b = a.clone();
        prop_assert_eq!(a.shrink(x, Action::Simulate), -b.grow(-x, Action::Simulate));
        prop_assert_eq!(a.shrink(x, Action::Execute), -b.grow(-x, Action::Execute));
        prop_assert_eq!(a.stack(), b.stack());
    }

    /// Insert then extract of the same type conserves mass.
    #[test]
    fn insert_extract_conserves(capacity in 1..3000u64, amount in 1..5000u64) {
        let mut container = tank(capacity);
        let remainder = container.insert(ResourceStack::new(water(), amount), Action::Execute);
        prop_assert_eq!(remainder.amount + container.stored(), amount);
        let out = container.extract(u64::MAX, Action::Execute);
        prop_assert_eq!(out.amount + remainder.amount, amount);
        prop_assert!(container.is_empty());
    }

    /// Re-serializing a decoded record is byte-identical.
    #[test]
    fn record_reserialize_is_identical(capacity in 1..3000u64, fill in 0..3000u64) {
        let container = filled_tank(capacity, hydrogen(), fill.min(capacity));
        let bytes = encode(&container.record()).unwrap();
        let decoded: ContainerRecord = decode(&bytes).unwrap();
        prop_assert_eq!(encode(&decoded).unwrap(), bytes);
        prop_assert_eq!(decoded.to_stack(), container.stack());
    }
}
