//! Headless 2D physics scenarios
//!
//! Steps a world without rendering and logs the collision/separation stream.
//!
//! Run with: cargo run -p void_physics2d_demo -- [simple|compound|all]
//! Verbosity follows RUST_LOG (default `info`).

use void_physics2d::prelude::*;

/// Scenario selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    Simple,
    Compound,
    All,
}

impl Scenario {
    fn parse(arg: Option<&str>) -> Option<Self> {
        match arg {
            None | Some("all") => Some(Self::All),
            Some("simple") => Some(Self::Simple),
            Some("compound") => Some(Self::Compound),
            Some(_) => None,
        }
    }
}

/// Logs every pair event and remembers how many it saw
#[derive(Default)]
struct EventLogger {
    collisions: usize,
    separations: usize,
}

impl ContactListener for EventLogger {
    fn collided(&mut self, event: &CollisionEvent<'_>, _commands: &mut WorldCommands) {
        self.collisions += 1;
        log::info!(
            "Collision {:?} / {:?} at {:?}",
            event.body_a,
            event.body_b,
            event.contact.reference_point()
        );
    }

    fn separated(&mut self, event: &CollisionEvent<'_>, _commands: &mut WorldCommands) {
        self.separations += 1;
        log::info!("Separate {:?} / {:?}", event.body_a, event.body_b);
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let arg = std::env::args().nth(1);
    let Some(scenario) = Scenario::parse(arg.as_deref()) else {
        log::error!("unknown scenario {arg:?}, expected simple, compound or all");
        std::process::exit(2);
    };

    let result = match scenario {
        Scenario::Simple => run_simple(),
        Scenario::Compound => run_compound(),
        Scenario::All => run_simple().and_then(|_| run_compound()),
    };

    if let Err(e) = result {
        log::error!("scenario failed: {e}");
        std::process::exit(1);
    }
}

/// A circle dropped onto a static floor
fn run_simple() -> Result<()> {
    log::info!("== simple: circle onto floor ==");
    let mut world = World::new(PhysicsConfig::default())?;

    let ball = world.add_body(BodyDesc::dynamic(Shape::circle(10.0)))?;
    let floor = world.add_body(
        BodyDesc::fixed(Shape::rectangle(200.0, 10.0)).with_position(0.0, -50.0),
    )?;

    let logger = shared(EventLogger::default());
    world.add_listener(logger.clone());

    for _ in 0..4000 {
        world.update(0.01);
    }

    let [x, y] = world.position(ball)?;
    let logger = logger.lock();
    log::info!(
        "ball at ({x:.2}, {y:.2}), touching floor: {}, {} collisions, {} separations",
        world.is_touching(ball, floor),
        logger.collisions,
        logger.separations
    );
    Ok(())
}

/// Two compound bodies falling into a walled, bounded box
fn run_compound() -> Result<()> {
    log::info!("== compound: bodies in a walled world ==");
    let mut world = World::new(PhysicsConfig::default())?;
    world.set_bounds_centered(800.0, 800.0)?;
    world.set_out_of_bounds_behavior(OutOfBoundsPolicy::Destroy, None);

    let damped = PhysicsMaterial::default().with_restitution(0.1);

    let first = world.create_body(BodyDesc::dynamic(Shape::compound([
        Shape::rectangle(20.0, 10.0).with_offset(-5.0, 0.0, 0.0),
        Shape::rectangle(10.0, 10.0).with_offset(0.0, 10.0, 0.0),
    ])));
    world.set_material(first, damped)?;
    world.add(first)?;
    world.set_rotation(first, 0.5)?;

    let spike = Shape::polygon(vec![[10.0, 15.0], [0.0, 30.0], [-10.0, 15.0]]);
    let second = world.create_body(
        BodyDesc::dynamic(Shape::compound([
            Shape::rectangle(10.0, 10.0),
            Shape::rectangle(10.0, 10.0).with_offset(-10.0, 0.0, 0.0),
            Shape::rectangle(10.0, 10.0).with_offset(0.0, 10.0, 0.0),
            spike,
        ]))
        .with_position(-10.0, 80.0),
    );
    world.set_material(second, damped)?;
    world.add(second)?;
    world.set_rotation(second, 0.5)?;

    let walls = [
        (200.0, 10.0, 0.0, -50.0),
        (10.0, 100.0, -105.0, 0.0),
        (10.0, 100.0, 105.0, 0.0),
    ];
    for (width, height, x, y) in walls {
        let wall = world.add_body(
            BodyDesc::fixed(Shape::rectangle(width, height).with_material(damped))
                .with_position(x, y),
        )?;
        log::debug!("wall {wall:?} at ({x}, {y})");
    }

    let logger = shared(EventLogger::default());
    world.add_listener(logger.clone());

    for step in 0..2000 {
        world.update(1.0 / 60.0);
        if step % 500 == 0 {
            for id in [first, second] {
                if let Ok([x, y]) = world.position(id) {
                    log::debug!("step {step}: {id:?} at ({x:.1}, {y:.1})");
                }
            }
        }
    }

    let logger = logger.lock();
    log::info!(
        "{} bodies remain, {} collisions, {} separations",
        world.body_count(),
        logger.collisions,
        logger.separations
    );
    Ok(())
}
