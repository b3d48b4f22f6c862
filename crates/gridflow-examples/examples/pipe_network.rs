//! Pipe network example: pooling, distribution, splits and type conflicts.
//!
//! Lays a line of eight basic pipes. The first pipe pulls water from a
//! reservoir below it; every other pipe feeds a small tank above it. Then
//! the middle pipe is removed, a lava pipe is placed next to the line, the
//! survivor is upgraded and the table is saved and reloaded.
//!
//! Run with: `cargo run -p gridflow-examples --example pipe_network -- --verbose`

use gridflow_core::action::Action;
use gridflow_core::container::{ResourceContainer, ResourceFilter};
use gridflow_core::id::{AcceptorId, ResourceTypeId};
use gridflow_core::position::{Direction, DirectionSet, Position};
use gridflow_core::stack::ResourceStack;
use gridflow_core::topology::{Acceptor, CapabilityRegistry, Medium, TankAcceptor};
use gridflow_network::{
    ConnectionType, DistributionScheduler, NetworkConfig, NetworkEvent, NetworkTable, SegmentSpec,
    Tier,
};

const WATER: ResourceTypeId = ResourceTypeId(0);
const LAVA: ResourceTypeId = ResourceTypeId(1);

fn report(table: &NetworkTable, world: &CapabilityRegistry, tanks: &[AcceptorId]) {
    for network in table.networks() {
        println!(
            "  network {:?}: {} segments, pool {}/{} (pulled {}, pushed {})",
            network.id(),
            network.len(),
            network.pooled().stored(),
            network.pooled().capacity(),
            network.stats().pulled,
            network.stats().pushed,
        );
    }
    let levels: Vec<u64> = tanks
        .iter()
        .filter_map(|&id| world.acceptor(id))
        .map(|a| a.contents().amount)
        .collect();
    println!("  tanks: {levels:?}");
}

fn print_events(events: &[NetworkEvent]) {
    for event in events {
        println!("  event: {event:?}");
    }
}

fn main() {
    gridflow_examples::init_logging(gridflow_examples::verbose_flag());

    let mut table = NetworkTable::new(NetworkConfig::default());
    let mut world = CapabilityRegistry::new();

    // Reservoir under the first pipe.
    let mut reservoir = TankAcceptor::new(ResourceContainer::new(100_000, ResourceFilter::Only(WATER)));
    reservoir.fill(ResourceStack::new(WATER, 100_000), Action::Execute);
    world.register(Position::new(0, -1, 0), Medium::Fluid, DirectionSet::ALL, reservoir);

    let mut tanks = Vec::new();
    for x in 0..8 {
        let mut spec = SegmentSpec::new(Position::new(x, 0, 0), Medium::Fluid, Tier::Basic);
        if x == 0 {
            spec = spec.with_connection(Direction::Down, ConnectionType::Pull);
        } else {
            let tank = TankAcceptor::new(ResourceContainer::new(1_000, ResourceFilter::Any));
            tanks.push(world.register(Position::new(x, 1, 0), Medium::Fluid, DirectionSet::ALL, tank));
        }
        if let Err(e) = table.place_segment(spec) {
            eprintln!("could not place pipe at x={x}: {e}");
            return;
        }
    }

    let mut scheduler = DistributionScheduler::new();

    println!("=== Scenario 1: one network of eight pipes ===\n");
    for _ in 0..4 {
        let events = scheduler.step(&mut table, &mut world);
        println!("Tick {}:", scheduler.current_tick() - 1);
        print_events(&events);
        report(&table, &world, &tanks);
    }

    println!("\n=== Scenario 2: remove the middle pipe ===\n");
    if let Some(middle) = table.segment_at(Position::new(4, 0, 0)) {
        match table.remove_segment(middle) {
            Ok(taken) => println!("removed pipe took {taken:?} with it"),
            Err(e) => eprintln!("remove failed: {e}"),
        }
    }
    print_events(&table.drain_events());
    for _ in 0..2 {
        scheduler.step(&mut table, &mut world);
    }
    report(&table, &world, &tanks);

    println!("\n=== Scenario 3: a lava pipe next to the water line ===\n");
    let lava_pipe = table
        .place_segment(SegmentSpec::new(Position::new(4, 0, 0), Medium::Fluid, Tier::Basic))
        .ok();
    if let Some(lava_pipe) = lava_pipe {
        let _ = table.insert_into(
            lava_pipe,
            ResourceStack::new(LAVA, 500),
            Action::Execute,
        );
        for _ in 0..2 {
            let events = scheduler.step(&mut table, &mut world);
            print_events(&events);
        }
        if let Some(segment) = table.segment(lava_pipe) {
            println!(
                "lava pipe is {} and has failed {} connections",
                if segment.is_orphan() { "an orphan" } else { "networked" },
                segment.failed_connections()
            );
        }
    }

    println!("\n=== Scenario 4: upgrade the first pipe ===\n");
    if let Some(first) = table.segment_at(Position::new(0, 0, 0)) {
        match table.change_tier(first, Tier::Advanced) {
            Ok(spilled) => println!("upgraded, spilled {spilled:?}"),
            Err(e) => eprintln!("upgrade failed: {e}"),
        }
    }
    scheduler.step(&mut table, &mut world);
    report(&table, &world, &tanks);

    println!("\n=== Scenario 5: save and reload ===\n");
    let bytes = match table.save() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("save failed: {e}");
            return;
        }
    };
    println!("snapshot: {} bytes, {} stored", bytes.len(), table.total_stored());
    match NetworkTable::load(&bytes, NetworkConfig::default()) {
        Ok(mut restored) => {
            let mut scheduler = DistributionScheduler::starting_at(restored.tick() + 1);
            scheduler.step(&mut restored, &mut world);
            println!(
                "reloaded: {} segments in {} networks, {} stored",
                restored.segment_count(),
                restored.network_count(),
                restored.total_stored()
            );
        }
        Err(e) => eprintln!("load failed: {e}"),
    }
}
