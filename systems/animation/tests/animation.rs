use std::time::Duration;

use proptest::prelude::*;
use weapon_factory_core::{AnimationDefinition, FrameSpec, TimedTask};
use weapon_factory_system_animation::{AnimationError, AnimationState};

fn definition(durations: &[u64], looped: bool) -> AnimationDefinition {
    AnimationDefinition {
        name: String::from("test"),
        frames: durations
            .iter()
            .enumerate()
            .map(|(index, duration)| FrameSpec::new(format!("frame-{index}"), *duration))
            .collect(),
        looped,
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn long_elapsed_on_a_one_shot_animation_finishes_on_the_last_frame() {
    let mut animation =
        AnimationState::new(&definition(&[50, 50, 50, 50], false)).expect("valid definition");

    animation.add_time(ms(220));

    assert!(animation.is_done());
    assert_eq!(animation.frame_index(), 3);
    assert_eq!(animation.frame(), "frame-3");
}

#[test]
#[should_panic(expected = "finished animation")]
fn time_added_after_completion_is_a_precondition_violation() {
    let mut animation =
        AnimationState::new(&definition(&[50, 50, 50, 50], false)).expect("valid definition");
    animation.add_time(ms(220));

    animation.add_time(ms(1));
}

#[test]
fn surplus_time_carries_into_following_frames() {
    let mut animation =
        AnimationState::new(&definition(&[30, 20, 40], true)).expect("valid definition");

    animation.add_time(ms(45));
    assert_eq!(animation.frame_index(), 1);
    assert_eq!(animation.remaining(), ms(5));

    animation.add_time(ms(5));
    assert_eq!(animation.frame_index(), 2);
    assert_eq!(animation.remaining(), ms(40));
}

#[test]
fn looping_animation_never_finishes() {
    let mut animation =
        AnimationState::new(&definition(&[10, 10], true)).expect("valid definition");

    animation.add_time(ms(1_000_005));

    assert!(!animation.is_done());
    assert_eq!(animation.frame_index(), 0);
    assert_eq!(animation.remaining(), ms(5));
}

#[test]
fn rewind_is_allowed_mid_frame() {
    let mut animation =
        AnimationState::new(&definition(&[10, 10, 10], false)).expect("valid definition");
    animation.add_time(ms(17));

    animation.rewind();

    assert_eq!(animation.frame(), "frame-0");
    assert_eq!(animation.remaining(), ms(10));
}

#[test]
fn unusable_definitions_are_rejected() {
    assert_eq!(
        AnimationState::new(&definition(&[], true)).err(),
        Some(AnimationError::NoFrames {
            name: String::from("test")
        })
    );
    assert_eq!(
        AnimationState::new(&definition(&[10, 0, 10], true)).err(),
        Some(AnimationError::ZeroDuration {
            name: String::from("test"),
            index: 1
        })
    );
}

proptest! {
    #[test]
    fn whole_loops_return_to_the_same_frame(
        durations in prop::collection::vec(1u64..200, 1..8),
        loops in 0u64..5,
        offset in 0u64..2_000,
    ) {
        let definition = definition(&durations, true);
        let total: u64 = durations.iter().sum();
        let remainder = offset % total;

        let mut reference = AnimationState::new(&definition).expect("valid definition");
        if remainder > 0 {
            reference.add_time(ms(remainder));
        }

        let mut looped = AnimationState::new(&definition).expect("valid definition");
        let elapsed = loops * total + remainder;
        if elapsed > 0 {
            looped.add_time(ms(elapsed));
        }

        prop_assert_eq!(looped.frame_index(), reference.frame_index());
        prop_assert_eq!(looped.remaining(), reference.remaining());
    }

    #[test]
    fn one_full_loop_restores_the_first_frame(
        durations in prop::collection::vec(1u64..200, 1..8),
    ) {
        let definition = definition(&durations, true);
        let mut animation = AnimationState::new(&definition).expect("valid definition");

        animation.add_time(animation.total_duration());

        prop_assert_eq!(animation.frame_index(), 0);
        prop_assert_eq!(animation.remaining(), ms(durations[0]));
    }
}
