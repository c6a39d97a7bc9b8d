use engine::EntityId;

use super::actions::ActionKind;

/// Audio playback lives outside the simulation; these name the cue to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SoundCue {
    Swing,
    BowRelease,
    ArrowImpact,
    ProjectileImpact,
    ManaBolt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GameplayEvent {
    PlayerDamaged { amount: u32, hit_points: u32 },
    PlayerDied,
    PlayerRespawned,
    EnemyDamaged { entity_id: EntityId, amount: u32 },
    EnemyKilled { entity_id: EntityId },
    ActionStarted { kind: ActionKind },
    ActionFinished { kind: ActionKind },
    PackProtectEngaged,
    PackReset,
    SoundCue(SoundCue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GameplayEventKind {
    PlayerDamaged,
    PlayerDied,
    PlayerRespawned,
    EnemyDamaged,
    EnemyKilled,
    ActionStarted,
    ActionFinished,
    PackProtectEngaged,
    PackReset,
    SoundCue,
}

impl GameplayEvent {
    pub(crate) fn kind(self) -> GameplayEventKind {
        match self {
            Self::PlayerDamaged { .. } => GameplayEventKind::PlayerDamaged,
            Self::PlayerDied => GameplayEventKind::PlayerDied,
            Self::PlayerRespawned => GameplayEventKind::PlayerRespawned,
            Self::EnemyDamaged { .. } => GameplayEventKind::EnemyDamaged,
            Self::EnemyKilled { .. } => GameplayEventKind::EnemyKilled,
            Self::ActionStarted { .. } => GameplayEventKind::ActionStarted,
            Self::ActionFinished { .. } => GameplayEventKind::ActionFinished,
            Self::PackProtectEngaged => GameplayEventKind::PackProtectEngaged,
            Self::PackReset => GameplayEventKind::PackReset,
            Self::SoundCue(_) => GameplayEventKind::SoundCue,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GameplayEventCounts {
    pub(crate) total: u32,
    pub(crate) player_damaged: u32,
    pub(crate) player_died: u32,
    pub(crate) player_respawned: u32,
    pub(crate) enemy_damaged: u32,
    pub(crate) enemy_killed: u32,
    pub(crate) action_started: u32,
    pub(crate) action_finished: u32,
    pub(crate) pack_protect_engaged: u32,
    pub(crate) pack_reset: u32,
    pub(crate) sound_cue: u32,
}

impl GameplayEventCounts {
    fn record(&mut self, kind: GameplayEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            GameplayEventKind::PlayerDamaged => &mut self.player_damaged,
            GameplayEventKind::PlayerDied => &mut self.player_died,
            GameplayEventKind::PlayerRespawned => &mut self.player_respawned,
            GameplayEventKind::EnemyDamaged => &mut self.enemy_damaged,
            GameplayEventKind::EnemyKilled => &mut self.enemy_killed,
            GameplayEventKind::ActionStarted => &mut self.action_started,
            GameplayEventKind::ActionFinished => &mut self.action_finished,
            GameplayEventKind::PackProtectEngaged => &mut self.pack_protect_engaged,
            GameplayEventKind::PackReset => &mut self.pack_reset,
            GameplayEventKind::SoundCue => &mut self.sound_cue,
        };
        *slot = slot.saturating_add(1);
    }
}

#[derive(Debug, Default)]
pub(crate) struct GameplayEventBus {
    current_tick_events: Vec<GameplayEvent>,
    last_tick_events: Vec<GameplayEvent>,
    last_tick_counts: GameplayEventCounts,
}

impl GameplayEventBus {
    pub(crate) fn emit(&mut self, event: GameplayEvent) {
        self.current_tick_events.push(event);
    }

    #[cfg(test)]
    pub(crate) fn iter_emitted_so_far(&self) -> impl Iterator<Item = &GameplayEvent> {
        self.current_tick_events.iter()
    }

    /// Closes the tick: counts what was emitted and keeps it readable until the
    /// next rollover.
    pub(crate) fn finish_tick_rollover(&mut self) {
        let mut counts = GameplayEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        std::mem::swap(&mut self.last_tick_events, &mut self.current_tick_events);
        self.current_tick_events.clear();
    }

    pub(crate) fn last_tick_counts(&self) -> GameplayEventCounts {
        self.last_tick_counts
    }

    #[cfg(test)]
    pub(crate) fn last_tick_events(&self) -> &[GameplayEvent] {
        &self.last_tick_events
    }
}
