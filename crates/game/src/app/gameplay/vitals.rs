use engine::{Timestamp, Vec2};

use crate::app::tuning::VitalsTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DamageOutcome {
    /// Inside the immunity window, or already dead.
    Ignored,
    Applied { dealt: u32 },
    Killed { dealt: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeadState {
    Alive,
    StillDead,
    Respawned,
}

/// Health, mana and the Alive/Dead machine for the player.
///
/// Every timer is a last-event timestamp compared against `now`, so results do
/// not depend on how often `regenerate` runs.
#[derive(Debug, Clone)]
pub(crate) struct PlayerVitals {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    hit_points: u32,
    mana: u32,
    last_damage: Timestamp,
    last_health_regen: Timestamp,
    last_mana_regen: Timestamp,
    current_mana_regen_rate: f64,
    is_dead: bool,
    death_time: Option<Timestamp>,
    tuning: VitalsTuning,
}

impl PlayerVitals {
    pub(crate) fn new(tuning: &VitalsTuning, position: Vec2, now: Timestamp) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            hit_points: tuning.max_hit_points,
            mana: tuning.initial_mana.min(tuning.max_mana),
            last_damage: now,
            last_health_regen: now,
            last_mana_regen: now,
            current_mana_regen_rate: tuning.base_mana_regen_per_second,
            is_dead: false,
            death_time: None,
            tuning: tuning.clone(),
        }
    }

    pub(crate) fn hit_points(&self) -> u32 {
        self.hit_points
    }

    pub(crate) fn max_hit_points(&self) -> u32 {
        self.tuning.max_hit_points
    }

    pub(crate) fn mana(&self) -> u32 {
        self.mana
    }

    pub(crate) fn max_mana(&self) -> u32 {
        self.tuning.max_mana
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub(crate) fn death_time(&self) -> Option<Timestamp> {
        self.death_time
    }

    pub(crate) fn respawn_seconds(&self) -> f64 {
        self.tuning.respawn_seconds
    }

    pub(crate) fn move_speed(&self) -> f32 {
        self.tuning.move_speed
    }

    #[cfg(test)]
    pub(crate) fn current_mana_regen_rate(&self) -> f64 {
        self.current_mana_regen_rate
    }

    pub(crate) fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }

    pub(crate) fn take_damage(&mut self, amount: u32, now: Timestamp) -> DamageOutcome {
        if self.is_dead || now.seconds_since(self.last_damage) < self.tuning.immunity_seconds {
            return DamageOutcome::Ignored;
        }
        self.last_damage = now;
        let dealt = amount.min(self.hit_points);
        self.hit_points -= dealt;
        if self.hit_points == 0 {
            self.die(now);
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Applied { dealt }
        }
    }

    /// Spends mana when there is enough; otherwise changes nothing.
    pub(crate) fn use_mana(&mut self, amount: u32) -> bool {
        if amount > self.mana {
            return false;
        }
        self.mana -= amount;
        self.current_mana_regen_rate = self.tuning.base_mana_regen_per_second;
        true
    }

    pub(crate) fn regenerate(&mut self, now: Timestamp) {
        if self.hit_points < self.tuning.max_hit_points
            && now.seconds_since(self.last_damage) >= self.tuning.health_regen_delay_seconds
            && now.seconds_since(self.last_health_regen)
                >= 1.0 / self.tuning.health_regen_per_second
        {
            let gain = if self.is_moving() { 1 } else { 2 };
            self.hit_points = (self.hit_points + gain).min(self.tuning.max_hit_points);
            self.last_health_regen = now;
        }

        if self.mana < self.tuning.max_mana
            && now.seconds_since(self.last_mana_regen) >= 1.0 / self.current_mana_regen_rate
        {
            self.mana += 1;
            self.last_mana_regen = now;
            self.current_mana_regen_rate *= self.tuning.mana_regen_multiplier;
        }
    }

    fn die(&mut self, now: Timestamp) {
        self.hit_points = 0;
        self.velocity = Vec2::ZERO;
        self.is_dead = true;
        self.death_time = Some(now);
    }

    pub(crate) fn respawn(&mut self) {
        self.position = self.tuning.spawn_point;
        self.velocity = Vec2::ZERO;
        self.hit_points = self.tuning.max_hit_points;
        self.mana = self.tuning.max_mana;
        self.is_dead = false;
        self.death_time = None;
    }

    /// Runs at the start of each player update; respawns once the timer elapses.
    pub(crate) fn update_dead_state(&mut self, now: Timestamp) -> DeadState {
        let Some(death_time) = self.death_time.filter(|_| self.is_dead) else {
            return DeadState::Alive;
        };
        if now.seconds_since(death_time) >= self.tuning.respawn_seconds {
            self.respawn();
            DeadState::Respawned
        } else {
            self.velocity = Vec2::ZERO;
            DeadState::StillDead
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: f64) -> Timestamp {
        Timestamp::from_secs_f64(seconds)
    }

    fn fresh() -> PlayerVitals {
        PlayerVitals::new(&VitalsTuning::default(), Vec2::ZERO, at(0.0))
    }

    #[test]
    fn starts_full_health_with_initial_mana() {
        let vitals = fresh();
        assert_eq!(vitals.hit_points(), 400);
        assert_eq!(vitals.mana(), 190);
        assert!(!vitals.is_dead());
    }

    #[test]
    fn use_mana_failure_changes_nothing() {
        let mut vitals = fresh();
        assert!(vitals.use_mana(100));
        vitals.regenerate(at(0.25));
        vitals.regenerate(at(0.5));
        let rate_before = vitals.current_mana_regen_rate();
        let mana_before = vitals.mana();

        assert!(!vitals.use_mana(mana_before + 1));
        assert_eq!(vitals.mana(), mana_before);
        assert_eq!(vitals.current_mana_regen_rate(), rate_before);
        assert!(rate_before > 5.0);
    }

    #[test]
    fn spending_mana_resets_regen_rate_to_base() {
        let mut vitals = fresh();
        for step in 1..=5 {
            vitals.regenerate(at(step as f64 * 0.25));
        }
        assert!(vitals.current_mana_regen_rate() > 5.0);

        assert!(vitals.use_mana(15));
        assert_eq!(vitals.current_mana_regen_rate(), 5.0);
    }

    #[test]
    fn mana_regen_rate_grows_per_tick() {
        let mut vitals = fresh();
        vitals.regenerate(at(0.2));
        assert_eq!(vitals.mana(), 191);
        assert!((vitals.current_mana_regen_rate() - 5.075).abs() < 1e-9);

        vitals.regenerate(at(0.25));
        assert_eq!(vitals.mana(), 191);
    }

    #[test]
    fn immunity_window_ignores_second_hit() {
        let mut vitals = fresh();
        assert_eq!(vitals.take_damage(10, at(0.0)), DamageOutcome::Ignored);
        assert_eq!(
            vitals.take_damage(10, at(1.0)),
            DamageOutcome::Applied { dealt: 10 }
        );
        assert_eq!(vitals.take_damage(10, at(1.5)), DamageOutcome::Ignored);
        assert_eq!(vitals.hit_points(), 390);
        assert_eq!(
            vitals.take_damage(10, at(1.75)),
            DamageOutcome::Applied { dealt: 10 }
        );
        assert_eq!(vitals.hit_points(), 380);
    }

    #[test]
    fn hit_points_clamp_at_zero_and_kill() {
        let mut vitals = fresh();
        assert_eq!(
            vitals.take_damage(450, at(1.0)),
            DamageOutcome::Killed { dealt: 400 }
        );
        assert_eq!(vitals.hit_points(), 0);
        assert!(vitals.is_dead());
        assert_eq!(vitals.death_time(), Some(at(1.0)));
        assert_eq!(vitals.take_damage(5, at(5.0)), DamageOutcome::Ignored);
    }

    #[test]
    fn health_regen_waits_for_delay_and_ticks_at_two_per_second() {
        let mut vitals = fresh();
        vitals.take_damage(100, at(1.0));
        vitals.regenerate(at(10.9));
        assert_eq!(vitals.hit_points(), 300);

        vitals.regenerate(at(11.0));
        assert_eq!(vitals.hit_points(), 302);
        vitals.regenerate(at(11.2));
        assert_eq!(vitals.hit_points(), 302);

        vitals.velocity = Vec2::new(250.0, 0.0);
        vitals.regenerate(at(11.5));
        assert_eq!(vitals.hit_points(), 303);
    }

    #[test]
    fn health_regen_never_exceeds_max() {
        let mut vitals = fresh();
        vitals.take_damage(1, at(1.0));
        vitals.regenerate(at(20.0));
        assert_eq!(vitals.hit_points(), 400);
        vitals.regenerate(at(30.0));
        assert_eq!(vitals.hit_points(), 400);
    }

    #[test]
    fn respawns_after_timer_with_full_stats_at_spawn_point() {
        let mut vitals = fresh();
        vitals.position = Vec2::new(55.0, -20.0);
        vitals.use_mana(50);
        vitals.take_damage(400, at(2.0));

        assert_eq!(vitals.update_dead_state(at(11.9)), DeadState::StillDead);
        assert!(vitals.is_dead());
        assert_eq!(vitals.update_dead_state(at(12.0)), DeadState::Respawned);

        assert!(!vitals.is_dead());
        assert_eq!(vitals.death_time(), None);
        assert_eq!(vitals.position, Vec2::ZERO);
        assert_eq!(vitals.hit_points(), 400);
        assert_eq!(vitals.mana(), 200);
        assert_eq!(vitals.update_dead_state(at(12.1)), DeadState::Alive);
    }
}
