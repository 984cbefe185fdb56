use serde::Serialize;

use crate::collision::CollisionGroup;

pub const SQUISH_TIME: f32 = 2.0;
pub const GEAR_TIME: f32 = 2.0;
pub const BURN_TIME: f32 = 1.0;

/// Life-cycle phase of an enemy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyState {
    Init,
    Inactive,
    Active,
    Squished,
    Falling,
    Burning,
    Melting,
    GroundMelting,
    InsideMelting,
    Gear,
}

/// Group change applied when a state is entered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GroupOnEnter {
    Keep,
    /// Restore the variant's active group.
    ActiveGroup,
    Set(CollisionGroup),
}

/// Work done on every tick spent in a state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TickAction {
    /// Variant behaviour hook.
    Behave,
    /// Inactive hook, then an activation attempt.
    Dormant,
    /// Integrate physics only.
    Integrate,
}

/// Condition that ends a terminal state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExitRule {
    /// Left only through an external transition.
    External,
    /// Removed once the state timer has run out.
    TimerExpired,
    /// Removed once the current sprite action has played out.
    AnimationDone,
    /// Removed, leaving a water drop, on animation end or ground contact.
    AnimationDoneOrGround,
    /// Moves on to [`EnemyState::Gear`] once grounded and animation is done.
    GroundedAnimationThenGear,
}

#[derive(Clone, Copy, Debug)]
pub struct StateRule {
    pub timer: Option<f32>,
    pub group: GroupOnEnter,
    pub tick: TickAction,
    pub exit: ExitRule,
    /// Remove immediately when entered from one of these states.
    pub reaps_from: &'static [EnemyState],
}

const NOTHING: &[EnemyState] = &[];

pub fn rule_for(state: EnemyState) -> StateRule {
    use EnemyState::*;
    match state {
        Init => StateRule {
            timer: None,
            group: GroupOnEnter::Keep,
            tick: TickAction::Dormant,
            exit: ExitRule::External,
            reaps_from: NOTHING,
        },
        Inactive => StateRule {
            timer: None,
            group: GroupOnEnter::Set(CollisionGroup::Disabled),
            tick: TickAction::Dormant,
            exit: ExitRule::External,
            reaps_from: &[Squished, Falling],
        },
        Active => StateRule {
            timer: None,
            group: GroupOnEnter::ActiveGroup,
            tick: TickAction::Behave,
            exit: ExitRule::External,
            reaps_from: NOTHING,
        },
        Falling => StateRule {
            timer: None,
            group: GroupOnEnter::Set(CollisionGroup::Disabled),
            tick: TickAction::Integrate,
            exit: ExitRule::External,
            reaps_from: NOTHING,
        },
        Squished => StateRule {
            timer: Some(SQUISH_TIME),
            group: GroupOnEnter::Keep,
            tick: TickAction::Integrate,
            exit: ExitRule::TimerExpired,
            reaps_from: NOTHING,
        },
        Gear => StateRule {
            timer: Some(GEAR_TIME),
            group: GroupOnEnter::Keep,
            tick: TickAction::Integrate,
            exit: ExitRule::TimerExpired,
            reaps_from: NOTHING,
        },
        Burning => StateRule {
            timer: Some(BURN_TIME),
            group: GroupOnEnter::Keep,
            tick: TickAction::Integrate,
            exit: ExitRule::AnimationDone,
            reaps_from: NOTHING,
        },
        Melting => StateRule {
            timer: None,
            group: GroupOnEnter::Keep,
            tick: TickAction::Integrate,
            exit: ExitRule::AnimationDoneOrGround,
            reaps_from: NOTHING,
        },
        GroundMelting => StateRule {
            timer: None,
            group: GroupOnEnter::Keep,
            tick: TickAction::Integrate,
            exit: ExitRule::AnimationDone,
            reaps_from: NOTHING,
        },
        InsideMelting => StateRule {
            timer: None,
            group: GroupOnEnter::Keep,
            tick: TickAction::Integrate,
            exit: ExitRule::GroundedAnimationThenGear,
            reaps_from: NOTHING,
        },
    }
}

/// Countdown used by time-boxed states.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateTimer {
    remaining: Option<f32>,
}

impl StateTimer {
    pub fn start(&mut self, period: f32) {
        self.remaining = Some(period);
    }

    pub fn stop(&mut self) {
        self.remaining = None;
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= dt;
        }
    }

    pub fn remaining(&self) -> Option<f32> {
        self.remaining
    }

    /// True once the countdown has run out; the timer stops afterwards.
    pub fn check(&mut self) -> bool {
        match self.remaining {
            Some(remaining) if remaining <= 0.0 => {
                self.remaining = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_states_carry_their_periods() {
        assert_eq!(rule_for(EnemyState::Squished).timer, Some(SQUISH_TIME));
        assert_eq!(rule_for(EnemyState::Gear).timer, Some(GEAR_TIME));
        assert_eq!(rule_for(EnemyState::Burning).timer, Some(BURN_TIME));
        assert_eq!(rule_for(EnemyState::Melting).timer, None);
    }

    #[test]
    fn only_inactive_reaps_dead_enemies() {
        assert!(rule_for(EnemyState::Inactive)
            .reaps_from
            .contains(&EnemyState::Squished));
        assert!(rule_for(EnemyState::Active).reaps_from.is_empty());
    }

    #[test]
    fn timer_fires_once_after_period() {
        let mut timer = StateTimer::default();
        timer.start(2.0);
        timer.tick(1.5);
        assert!(!timer.check());
        timer.tick(0.5);
        assert!(timer.check());
        assert!(!timer.check());
        assert_eq!(timer.remaining(), None);
    }
}
