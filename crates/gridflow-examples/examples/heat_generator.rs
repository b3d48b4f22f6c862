//! Heat generator example: conduction, conversion and multiblock activity.
//!
//! A heat generator sits on top of a furnace block that receives a fixed
//! amount of heat every tick. The generator only exchanges heat through its
//! bottom face and turns half of its temperature into work each tick. A
//! superheating element next to the furnace follows its boiler's hot flag.
//! A second generator burns lava from its own tank.
//!
//! Run with: `cargo run -p gridflow-examples --example heat_generator`

use gridflow_core::action::Action;
use gridflow_core::container::{ResourceContainer, ResourceFilter};
use gridflow_core::fixed::{Fixed64, fixed64_to_f64};
use gridflow_core::id::{MultiblockId, ResourceTypeId};
use gridflow_core::position::Position;
use gridflow_core::stack::ResourceStack;
use gridflow_thermal::{HeatContext, HeatModule, HeatParticipant, ThermalConfig};

const LAVA: ResourceTypeId = ResourceTypeId(1);

fn main() {
    gridflow_examples::init_logging(gridflow_examples::verbose_flag());

    let mut module = HeatModule::new(ThermalConfig::default());
    let mut ctx = HeatContext::new();
    let boiler = MultiblockId(1);

    let (furnace, generator, element) = match (
        module.add(HeatParticipant::new(Position::new(0, 0, 0))),
        module.add(HeatParticipant::generator(
            Position::new(0, 1, 0),
            Fixed64::from_num(10_000),
        )),
        module.add(HeatParticipant::new(Position::new(1, 0, 0))),
    ) {
        (Ok(f), Ok(g), Ok(e)) => (f, g, e),
        _ => {
            eprintln!("could not place participants");
            return;
        }
    };
    if let Err(e) = module.join_multiblock(element, boiler) {
        eprintln!("could not join boiler: {e}");
        return;
    }

    println!("=== Scenario 1: furnace heats the generator ===\n");
    for tick in 1..=10 {
        if tick == 5 {
            ctx.set_hot(boiler, true);
        }
        let _ = module.transfer_heat_to(furnace, Fixed64::from_num(200));
        let events = module.tick(&ctx, tick);

        let temp = |id| {
            module
                .participant(id)
                .map_or(0.0, |p| fixed64_to_f64(p.temperature()))
        };
        let energy = module
            .participant(generator)
            .map_or(0.0, |p| fixed64_to_f64(p.stored_energy()));
        println!(
            "Tick {tick}: furnace={:.2} generator={:.2} element={:.2} energy={:.2}",
            temp(furnace),
            temp(generator),
            temp(element),
            energy
        );
        for event in &events {
            println!("  event: {event:?}");
        }
    }

    println!("\n=== Scenario 2: element leaves the boiler ===\n");
    match module.leave_multiblock(element, &mut ctx) {
        Ok(left) => println!("left {left:?}; hot flags remaining: {}", ctx.len()),
        Err(e) => eprintln!("leave failed: {e}"),
    }
    if let Some(p) = module.participant(generator) {
        let loss = p.last_loss();
        println!(
            "generator last tick: transfer loss {:.3}, environment loss {:.3}",
            fixed64_to_f64(loss.transfer),
            fixed64_to_f64(loss.environment)
        );
    }

    println!("\n=== Scenario 3: a lava-fuelled generator ===\n");
    let mut tank = ResourceContainer::new(24_000, ResourceFilter::Only(LAVA));
    tank.insert(ResourceStack::new(LAVA, 40), Action::Execute);
    let burner = match module.add(
        HeatParticipant::generator(Position::new(10, 0, 0), Fixed64::from_num(400))
            .with_fuel(tank),
    ) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("could not place the lava generator: {e}");
            return;
        }
    };
    for tick in 11..=16 {
        let events = module.tick(&ctx, tick);
        if let Some(p) = module.participant(burner) {
            println!(
                "Tick {tick}: temperature={:.2} producing={:.3} energy={:.2} fuel={}",
                fixed64_to_f64(p.temperature()),
                fixed64_to_f64(p.producing_energy()),
                fixed64_to_f64(p.stored_energy()),
                p.fuel.as_ref().map_or(0, |f| f.tank.stored())
            );
        }
        for event in &events {
            println!("  event: {event:?}");
        }
    }
}
