use std::{collections::BTreeMap, time::Duration};

use proptest::prelude::*;
use weapon_factory_core::{TimedTask, TurnDirection, WorldPoint};
use weapon_factory_system_clock::{ManualClock, Scheduler};
use weapon_factory_system_physics::{bearing, Rotation};

const ORIGIN: WorldPoint = WorldPoint::new(100.0, 100.0);

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn scheduler() -> Scheduler {
    Scheduler::new(ManualClock::default())
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn bearing_covers_axes_and_quadrants() {
    let cases = [
        ((10.0, 0.0), 0.0),
        ((0.0, -10.0), 90.0),
        ((-10.0, 0.0), 180.0),
        ((0.0, 10.0), 270.0),
        ((10.0, -10.0), 45.0),
        ((-10.0, -10.0), 135.0),
        ((-10.0, 10.0), 225.0),
        ((10.0, 10.0), 315.0),
    ];
    for ((dx, dy), expected) in cases {
        let to = WorldPoint::new(ORIGIN.x + dx, ORIGIN.y + dy);
        assert_close(bearing(ORIGIN, to).expect("distinct points"), expected);
    }
    assert_eq!(bearing(ORIGIN, ORIGIN), None);
}

#[test]
fn looking_at_the_own_position_changes_nothing() {
    let mut scheduler = scheduler();
    let mut rotation = Rotation::register(&mut scheduler, 30.0, 1.0);

    assert_eq!(rotation.look_at(ORIGIN, ORIGIN, &mut scheduler), Ok(false));
    assert!(rotation.is_done());
    assert!(scheduler.is_paused(rotation.task()));
}

#[test]
fn looking_at_a_non_finite_point_changes_nothing() {
    let mut scheduler = scheduler();
    let mut rotation = Rotation::register(&mut scheduler, 45.0, 1.0);

    for point in [
        WorldPoint::new(f64::NAN, ORIGIN.y),
        WorldPoint::new(ORIGIN.x, f64::INFINITY),
        WorldPoint::new(f64::NEG_INFINITY, f64::NAN),
    ] {
        assert_eq!(bearing(ORIGIN, point), None);
        assert_eq!(rotation.look_at(ORIGIN, point, &mut scheduler), Ok(false));
    }
    assert!(rotation.is_done());
    assert_eq!(rotation.angle(), 45.0);
    assert!(scheduler.is_paused(rotation.task()));
}

#[test]
fn looking_along_the_current_angle_changes_nothing() {
    let mut scheduler = scheduler();
    let mut rotation = Rotation::register(&mut scheduler, 0.0, 1.0);

    let east = WorldPoint::new(ORIGIN.x + 5.0, ORIGIN.y);
    assert_eq!(rotation.look_at(ORIGIN, east, &mut scheduler), Ok(false));
    assert!(scheduler.is_paused(rotation.task()));
}

#[test]
fn turning_picks_the_shorter_arc_and_breaks_ties_counter_clockwise() {
    let mut scheduler = scheduler();
    let mut rotation = Rotation::register(&mut scheduler, 0.0, 1.0);

    assert_eq!(rotation.turn_to(270.0, &mut scheduler), Ok(true));
    assert_eq!(rotation.direction(), TurnDirection::Clockwise);
    assert!(scheduler.is_running(rotation.task()));

    assert_eq!(rotation.turn_to(180.0, &mut scheduler), Ok(true));
    assert_eq!(rotation.direction(), TurnDirection::CounterClockwise);

    assert_eq!(rotation.turn_to(90.0, &mut scheduler), Ok(true));
    assert_eq!(rotation.direction(), TurnDirection::CounterClockwise);
}

#[test]
fn counter_clockwise_turn_wraps_through_zero_and_snaps() {
    let mut scheduler = scheduler();
    let mut rotation = Rotation::register(&mut scheduler, 350.0, 1.0);
    let _ = rotation.turn_to(10.0, &mut scheduler).expect("registered");

    rotation.add_time(ms(15));
    assert_close(rotation.angle(), 5.0);
    assert!(!rotation.is_done());

    rotation.add_time(ms(15));
    assert_eq!(rotation.angle(), 10.0);
    assert!(rotation.is_done());
}

#[test]
fn turns_onto_zero_land_exactly_on_zero() {
    let mut scheduler = scheduler();
    let mut counter_clockwise = Rotation::register(&mut scheduler, 300.0, 1.0);
    let _ = counter_clockwise
        .turn_to(0.0, &mut scheduler)
        .expect("registered");
    assert_eq!(counter_clockwise.direction(), TurnDirection::CounterClockwise);
    counter_clockwise.add_time(ms(30));
    assert_eq!(counter_clockwise.angle(), 330.0);
    counter_clockwise.add_time(ms(45));
    assert_eq!(counter_clockwise.angle(), 0.0);
    assert!(counter_clockwise.is_done());

    let mut clockwise = Rotation::register(&mut scheduler, 10.0, 1.0);
    let _ = clockwise.turn_to(360.0, &mut scheduler).expect("registered");
    assert_eq!(clockwise.direction(), TurnDirection::Clockwise);
    clockwise.add_time(ms(30));
    assert_eq!(clockwise.angle(), 0.0);
    assert!(clockwise.is_done());
}

#[test]
fn scheduler_parks_the_rotation_once_facing_the_target() {
    let mut scheduler = scheduler();
    let rotation = Rotation::register(&mut scheduler, 0.0, 0.5);
    let task = rotation.task();
    let mut tasks = BTreeMap::from([(task, rotation)]);

    let north = WorldPoint::new(ORIGIN.x, ORIGIN.y - 20.0);
    let started = tasks
        .get_mut(&task)
        .expect("rotation present")
        .look_at(ORIGIN, north, &mut scheduler)
        .expect("registered");
    assert!(started);

    let _ = scheduler.advance(ms(100), &mut tasks);
    assert!(scheduler.is_running(task));
    let _ = scheduler.advance(ms(100), &mut tasks);

    assert!(scheduler.is_paused(task));
    assert_eq!(tasks[&task].angle(), 90.0);
}

#[test]
#[should_panic(expected = "while idle")]
fn idle_rotation_rejects_time() {
    let mut scheduler = scheduler();
    let mut rotation = Rotation::register(&mut scheduler, 0.0, 1.0);

    rotation.add_time(ms(1));
}

fn quarter_degrees() -> impl Strategy<Value = f64> {
    (0u32..1440).prop_map(|quarters| f64::from(quarters) / 4.0)
}

proptest! {
    #[test]
    fn chosen_arc_never_exceeds_half_a_turn(start in quarter_degrees(), target in quarter_degrees()) {
        let mut scheduler = scheduler();
        let mut rotation = Rotation::register(&mut scheduler, start, 1.0);

        let _ = rotation.turn_to(target, &mut scheduler).expect("registered");

        prop_assert!(rotation.remaining_arc() <= 180.0);
    }

    #[test]
    fn split_elapsed_matches_single_elapsed(
        start in quarter_degrees(),
        target in quarter_degrees(),
        first in 0u64..400,
        second in 0u64..400,
    ) {
        let mut scheduler = scheduler();
        let mut whole = Rotation::register(&mut scheduler, start, 0.25);
        let mut split = Rotation::register(&mut scheduler, start, 0.25);
        let _ = whole.turn_to(target, &mut scheduler).expect("registered");
        let _ = split.turn_to(target, &mut scheduler).expect("registered");

        if !whole.is_done() {
            whole.add_time(ms(first + second));
        }
        for elapsed in [first, second] {
            if !split.is_done() {
                split.add_time(ms(elapsed));
            }
        }

        prop_assert_eq!(whole.angle(), split.angle());
        prop_assert_eq!(whole.is_done(), split.is_done());
    }
}
