use engine::{HudBars, Timestamp};

use super::vitals::PlayerVitals;

pub(crate) const DEATH_NOTICE: &str = "You died";

/// Read-only view of the player's vitals for the HUD.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HudSnapshot {
    pub(crate) hit_points: u32,
    pub(crate) max_hit_points: u32,
    pub(crate) mana: u32,
    pub(crate) max_mana: u32,
    pub(crate) is_dead: bool,
    pub(crate) death_time: Option<Timestamp>,
    pub(crate) death_notice: Option<&'static str>,
    pub(crate) respawn_countdown: Option<String>,
}

impl HudSnapshot {
    pub(crate) fn capture(vitals: &PlayerVitals, now: Timestamp) -> Self {
        let countdown = vitals
            .death_time()
            .filter(|_| vitals.is_dead())
            .map(|death_time| {
                let elapsed = now.seconds_since(death_time).round();
                let remaining = (vitals.respawn_seconds() - elapsed).max(0.0) as i64;
                format!("Respawning in... {remaining}")
            });
        Self {
            hit_points: vitals.hit_points(),
            max_hit_points: vitals.max_hit_points(),
            mana: vitals.mana(),
            max_mana: vitals.max_mana(),
            is_dead: vitals.is_dead(),
            death_time: vitals.death_time(),
            death_notice: vitals.is_dead().then_some(DEATH_NOTICE),
            respawn_countdown: countdown,
        }
    }

    pub(crate) fn bars(&self) -> HudBars {
        HudBars {
            hit_points: self.hit_points,
            max_hit_points: self.max_hit_points,
            mana: self.mana,
            max_mana: self.max_mana,
            is_dead: self.is_dead,
        }
    }
}
