//! Integration tests for void_physics2d

use approx::assert_relative_eq;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use void_physics2d::*;

const DT: f32 = 1.0 / 60.0;

fn still() -> PhysicsMaterial {
    PhysicsMaterial::default().with_restitution(0.0).with_friction(0.5)
}

fn step(world: &mut World, steps: usize) {
    for _ in 0..steps {
        world.update(DT);
    }
}

/// Circle of radius 0.5 at height 5 above a 20x1 floor centred on the origin
fn ball_over_floor(config: PhysicsConfig) -> (World, BodyId, BodyId) {
    let mut world = World::new(config).expect("valid config");
    let floor = world
        .add_body(BodyDesc::fixed(Shape::rectangle(20.0, 1.0).with_material(still())))
        .unwrap();
    let ball = world
        .add_body(
            BodyDesc::dynamic(Shape::circle(0.5).with_material(still())).with_position(0.0, 5.0),
        )
        .unwrap();
    (world, ball, floor)
}

#[test]
fn test_falling_circle_rests_on_floor() {
    let (mut world, ball, floor) = ball_over_floor(PhysicsConfig::default());
    let events = shared(EventCollector::new());
    world.add_listener(events.clone());

    step(&mut world, 300);

    let y = world.position(ball).unwrap()[1];
    assert!((y - 1.0).abs() < 0.05, "ball should rest on the floor, y = {y}");
    assert!(world.is_touching(ball, floor));
    assert!(world.is_touching(floor, ball));
    assert_eq!(world.touch_count(ball, floor), world.touch_count(floor, ball));

    let events = events.lock();
    assert_eq!(events.collisions().count(), 1);
    assert_eq!(events.separations().count(), 0);

    let first = &events.events[0];
    assert!(first.body_a == ball || first.body_b == ball);
    assert!(first.body_a == floor || first.body_b == floor);
    assert!(first.contact.point_count() >= 1);
}

#[test]
fn test_unit_scale_applies_per_world() {
    let config = PhysicsConfig::default()
        .with_pixels_per_meter(50.0)
        .with_gravity(0.0, -500.0);
    let mut world = World::new(config).unwrap();
    world
        .add_body(BodyDesc::fixed(Shape::rectangle(1000.0, 50.0).with_material(still())))
        .unwrap();
    let ball = world
        .add_body(
            BodyDesc::dynamic(Shape::circle(25.0).with_material(still())).with_position(0.0, 250.0),
        )
        .unwrap();

    step(&mut world, 300);

    let y = world.position(ball).unwrap()[1];
    assert!((y - 50.0).abs() < 2.5, "ball should rest at 50 display units, y = {y}");
    assert_relative_eq!(world.gravity()[1], -500.0, epsilon = 1e-3);

    // An unscaled world is unaffected
    let (default_world, _, _) = ball_over_floor(PhysicsConfig::default());
    assert_relative_eq!(default_world.scale().pixels_per_meter(), 1.0);
}

#[test]
fn test_compound_contact_fires_once() {
    let mut world = World::new(PhysicsConfig::default()).unwrap();
    let floor = world
        .add_body(BodyDesc::fixed(Shape::rectangle(20.0, 1.0).with_material(still())))
        .unwrap();
    let plank = world
        .add_body(
            BodyDesc::dynamic(
                Shape::compound([
                    Shape::rectangle(2.0, 1.0).with_offset(-1.0, 0.0, 0.0),
                    Shape::rectangle(2.0, 1.0).with_offset(1.0, 0.0, 0.0),
                ])
                .with_material(still()),
            )
            .with_position(0.0, 2.0),
        )
        .unwrap();

    let events = shared(EventCollector::new());
    world.add_listener(events.clone());
    step(&mut world, 240);

    assert!(world.touch_count(plank, floor) >= 2);
    assert_eq!(world.touching(floor), vec![plank]);
    assert_eq!(events.lock().collisions().count(), 1);
    assert_eq!(events.lock().separations().count(), 0);
}

#[test]
fn test_remove_clears_partners_without_events() {
    let (mut world, ball, floor) = ball_over_floor(PhysicsConfig::default());
    let events = shared(EventCollector::new());
    world.add_listener(events.clone());
    step(&mut world, 300);
    assert!(world.is_touching(floor, ball));
    events.lock().clear();

    world.remove(ball).unwrap();
    assert!(!world.is_touching(floor, ball));
    assert_eq!(world.touch_count(floor, ball), 0);
    assert!(world.touching(floor).is_empty());

    step(&mut world, 10);
    assert!(events.lock().events.is_empty());
    assert_eq!(world.body_count(), 1);
    assert_eq!(world.position(ball), Err(PhysicsError::NotAttached(ball)));
}

#[test]
fn test_listener_in_three_scopes_gets_three_calls() {
    let (mut world, ball, floor) = ball_over_floor(PhysicsConfig::default());
    let events = shared(EventCollector::new());
    world.add_listener(events.clone());
    world.add_body_listener(ball, events.clone()).unwrap();
    world.add_body_listener(floor, events.clone()).unwrap();

    step(&mut world, 300);

    assert_eq!(events.lock().collisions().count(), 3);
}

#[test]
fn test_body_listener_only_sees_its_body() {
    let (mut world, ball, floor) = ball_over_floor(PhysicsConfig::default());
    let other = world
        .add_body(
            BodyDesc::dynamic(Shape::circle(0.5).with_material(still())).with_position(5.0, 5.0),
        )
        .unwrap();

    let ball_events = shared(EventCollector::new());
    world.add_body_listener(ball, ball_events.clone()).unwrap();

    step(&mut world, 300);

    assert!(world.is_touching(other, floor));
    let ball_events = ball_events.lock();
    assert_eq!(ball_events.collisions().count(), 1);
    assert!(ball_events.events.iter().all(|e| e.body_a == ball || e.body_b == ball));
}

#[test]
fn test_removed_listener_not_called() {
    let (mut world, _, _) = ball_over_floor(PhysicsConfig::default());
    let events = shared(EventCollector::new());
    world.add_listener(events.clone());
    assert!(world.remove_listener(&events));
    assert_eq!(world.listener_count(), 0);

    step(&mut world, 300);
    assert!(events.lock().events.is_empty());
}

#[test]
fn test_listener_removes_body_through_commands() {
    let (mut world, ball, floor) = ball_over_floor(PhysicsConfig::default());
    let separations = Arc::new(Mutex::new(0u32));
    let counted = separations.clone();

    let handler = ContactHandler::new()
        .on_collided(move |event, commands| {
            if let Some(other) = event.other(floor) {
                commands.remove_body(other);
            }
        })
        .on_separated(move |_, _| *counted.lock() += 1);
    world.add_listener(shared(handler));

    step(&mut world, 300);

    assert!(!world.contains(ball));
    assert_eq!(world.body_count(), 1);
    assert!(world.touching(floor).is_empty());
    assert_eq!(*separations.lock(), 0);
}

#[test]
fn test_deactivation_separates_and_reactivation_collides() {
    let (mut world, ball, floor) = ball_over_floor(PhysicsConfig::default());
    let events = shared(EventCollector::new());
    world.add_listener(events.clone());
    step(&mut world, 300);
    assert_eq!(events.lock().collisions().count(), 1);

    world.set_active(ball, false).unwrap();
    world.update(DT);

    assert_eq!(events.lock().separations().count(), 1);
    assert!(!world.is_touching(ball, floor));
    assert!(!world.is_touching(floor, ball));
    assert_eq!(world.touch_count(floor, ball), 0);
    assert!(world.contains(ball));

    world.set_active(ball, true).unwrap();
    step(&mut world, 30);

    let events = events.lock();
    assert_eq!(events.collisions().count(), 2);
    assert_eq!(events.separations().count(), 1);
    assert!(world.is_touching(ball, floor));
}

/// Records collisions and drops its own global registration on the first one
struct LeavesGlobalScope {
    this: Weak<Mutex<LeavesGlobalScope>>,
    collisions: u32,
}

impl ContactListener for LeavesGlobalScope {
    fn collided(&mut self, _: &CollisionEvent<'_>, commands: &mut WorldCommands) {
        self.collisions += 1;
        if let Some(this) = self.this.upgrade() {
            commands.remove_listener(&this);
        }
    }

    fn separated(&mut self, _: &CollisionEvent<'_>, _: &mut WorldCommands) {}
}

#[test]
fn test_listener_removing_itself_keeps_current_delivery() {
    let (mut world, ball, _) = ball_over_floor(PhysicsConfig::default());
    let listener = Arc::new_cyclic(|this| {
        Mutex::new(LeavesGlobalScope {
            this: this.clone(),
            collisions: 0,
        })
    });
    assert!(world.add_listener(listener.clone()));
    assert_eq!(world.add_body_listener(ball, listener.clone()), Ok(true));

    step(&mut world, 300);

    // Global and body scope both saw the first collision
    assert_eq!(listener.lock().collisions, 2);
    assert_eq!(world.listener_count(), 0);
    assert_eq!(world.body_listener_count(ball), 1);

    // Lift the ball and let it land again
    world.set_position(ball, 0.0, 5.0).unwrap();
    world.set_linear_velocity(ball, 0.0, 0.0).unwrap();
    step(&mut world, 300);

    assert_eq!(listener.lock().collisions, 3);
}

/// Zero-gravity world bounded by a 100x100 square, one body inside and one
/// fully outside on the right
fn bounded_world(
    policy: OutOfBoundsPolicy,
    veto: Option<OutOfBoundsVeto>,
) -> (World, BodyId, BodyId) {
    let config = PhysicsConfig::top_down().with_bounds(BoundingBox::centered(100.0, 100.0));
    let mut world = World::new(config).unwrap();
    world.set_out_of_bounds_behavior(policy, veto);

    let inside = world.add_body(BodyDesc::dynamic(Shape::circle(1.0))).unwrap();
    let outside = world
        .add_body(BodyDesc::dynamic(Shape::circle(1.0)).with_position(200.0, 0.0))
        .unwrap();
    (world, inside, outside)
}

#[test]
fn test_deactivate_policy_keeps_body() {
    let (mut world, inside, outside) = bounded_world(OutOfBoundsPolicy::Deactivate, None);
    world.update(DT);

    assert!(!world.is_active(outside).unwrap());
    assert!(world.is_active(inside).unwrap());
    assert_eq!(world.body_count(), 2);
    assert_eq!(world.body(1), Some(outside));

    // Reactivation sticks once the body is back inside
    world.set_position(outside, 0.0, 20.0).unwrap();
    world.set_active(outside, true).unwrap();
    step(&mut world, 2);
    assert!(world.is_active(outside).unwrap());
}

#[test]
fn test_destroy_policy_removes_body() {
    let (mut world, inside, outside) = bounded_world(OutOfBoundsPolicy::Destroy, None);
    world.update(DT);

    assert!(!world.contains(outside));
    assert!(world.contains(inside));
    assert_eq!(world.body_count(), 1);
    assert_eq!(world.bodies().collect::<Vec<_>>(), vec![inside]);
}

#[test]
fn test_partially_outside_counts() {
    let (mut world, inside, _) = bounded_world(OutOfBoundsPolicy::Deactivate, None);
    let straddling = world
        .add_body(BodyDesc::dynamic(Shape::rectangle(10.0, 10.0)).with_position(0.0, 50.0))
        .unwrap();
    world.update(DT);

    assert!(!world.is_active(straddling).unwrap());
    assert!(world.is_active(inside).unwrap());
}

#[test]
fn test_veto_emptying_candidates_prevents_action() {
    let offered = Arc::new(Mutex::new(Vec::new()));
    let seen = offered.clone();
    let veto: OutOfBoundsVeto = Box::new(move |candidates: &mut Vec<BodyId>| {
        seen.lock().extend(candidates.drain(..));
        true
    });

    let (mut world, _, outside) = bounded_world(OutOfBoundsPolicy::Destroy, Some(veto));
    world.update(DT);

    assert!(world.contains(outside));
    assert!(world.is_active(outside).unwrap());
    assert_eq!(*offered.lock(), vec![outside]);
}

#[test]
fn test_veto_returning_false_skips_step() {
    let veto: OutOfBoundsVeto = Box::new(|_: &mut Vec<BodyId>| false);
    let (mut world, _, outside) = bounded_world(OutOfBoundsPolicy::Deactivate, Some(veto));
    step(&mut world, 5);
    assert!(world.is_active(outside).unwrap());
}

#[test]
fn test_veto_runs_under_none_policy() {
    let calls = Arc::new(Mutex::new(0u32));
    let counted = calls.clone();
    let veto: OutOfBoundsVeto = Box::new(move |_: &mut Vec<BodyId>| {
        *counted.lock() += 1;
        true
    });

    let (mut world, _, outside) = bounded_world(OutOfBoundsPolicy::None, Some(veto));
    step(&mut world, 3);

    assert_eq!(*calls.lock(), 3);
    assert!(world.is_active(outside).unwrap());
}

#[test]
fn test_cleared_bounds_stop_enforcement() {
    let (mut world, _, outside) = bounded_world(OutOfBoundsPolicy::Destroy, None);
    world.clear_bounds();
    world.update(DT);
    assert!(world.contains(outside));

    assert!(matches!(
        world.set_bounds(0.0, 0.0, 0.0, 0.0),
        Err(PhysicsError::InvalidBounds(_))
    ));
    world.set_bounds(-300.0, -300.0, 300.0, 300.0).unwrap();
    world.update(DT);
    assert!(world.contains(outside));
}

#[test]
fn test_scene_from_json() {
    let json = r#"{
        "body_type": "Dynamic",
        "shape": { "primitives": [{
            "geometry": { "Circle": { "radius": 0.5 } },
            "offset": [0.0, 0.0],
            "angle": 0.0,
            "material": {
                "density": 1.0,
                "friction": 0.5,
                "restitution": 0.0,
                "friction_combine": "Average",
                "restitution_combine": "Average"
            }
        }]},
        "position": [0.0, 3.0],
        "rotation": 0.0,
        "linear_damping": 0.0,
        "angular_damping": 0.0,
        "fixed_rotation": false,
        "bullet": false
    }"#;
    let desc: BodyDesc = serde_json::from_str(json).unwrap();

    let mut world = World::new(PhysicsConfig::default()).unwrap();
    let id = world.add_body(desc).unwrap();
    assert_relative_eq!(world.position(id).unwrap()[1], 3.0);
}
