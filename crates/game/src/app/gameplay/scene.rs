use engine::{
    EntityCategory, EntitySpec, Flicker, FrameTime, HudBars, InputSnapshot, LightAnchor,
    LightSource, LightingCompositor, RenderableDesc, Scene, SceneCommand, SceneWorld, Size,
    Timestamp, Vec2,
};
use tracing::{debug, info};

use super::actions::{ActionSet, Wielder};
use super::events::GameplayEventBus;
use super::hud::HudSnapshot;
use super::pack::WolfPack;
use super::player::Player;
use super::systems::{GameplaySystemContext, GameplaySystemsHost};
use crate::app::tuning::GameTuning;

const TORCH_SIZE: Size = Size::new(16.0, 32.0);

pub(crate) struct GameplayScene {
    tuning: GameTuning,
    player: Option<Player>,
    actions: ActionSet,
    pack: Option<WolfPack>,
    lighting: LightingCompositor,
    events: GameplayEventBus,
    systems: GameplaySystemsHost,
    last_now: Timestamp,
}

impl GameplayScene {
    pub(crate) fn new(tuning: GameTuning) -> Self {
        let lighting = LightingCompositor::new(
            tuning.lighting.ambient_color,
            tuning.lighting.ambient_alpha,
        );
        Self {
            tuning,
            player: None,
            actions: ActionSet::default(),
            pack: None,
            lighting,
            events: GameplayEventBus::default(),
            systems: GameplaySystemsHost::default(),
            last_now: Timestamp::ZERO,
        }
    }

    pub(crate) fn hud(&self) -> Option<HudSnapshot> {
        self.player
            .as_ref()
            .map(|player| HudSnapshot::capture(&player.vitals, self.last_now))
    }

    fn spawn_world(&mut self, world: &mut SceneWorld) {
        let world_tuning = &self.tuning.world;
        for obstacle in &world_tuning.obstacles {
            world.spawn(EntitySpec::new(
                EntityCategory::Obstacle,
                obstacle.position,
                obstacle.size,
                "rock",
            ));
        }

        let torch = &self.tuning.lighting.torch;
        for position in &world_tuning.torches {
            world.spawn(
                EntitySpec::new(EntityCategory::Decoration, *position, TORCH_SIZE, "torch")
                    .with_collider(None)
                    .with_renderable(RenderableDesc::sprite("decoration/torch", "torch")),
            );
            let flame = Vec2::new(TORCH_SIZE.w * 0.5, TORCH_SIZE.h * 0.25);
            self.lighting.add_light_source(LightSource::new(
                LightAnchor::Fixed(*position + flame),
                torch.radius,
                torch.color,
                torch.intensity,
            ));
        }

        self.pack = world_tuning
            .den_position
            .map(|den_position| WolfPack::spawn(world, den_position, &self.tuning.pack));

        let player = Player::spawn(
            world,
            world_tuning.player_start,
            &self.tuning.vitals,
            Timestamp::ZERO,
        );
        let light = &self.tuning.lighting.player_light;
        self.lighting.add_light_source(
            LightSource::new(
                LightAnchor::Entity(player.entity_id()),
                light.radius,
                light.color,
                light.intensity,
            )
            .with_flicker(Flicker::new(
                light.flicker_intensity,
                light.flicker_radius,
                light.flicker_hz,
            )),
        );
        world.camera_mut().position = player.center();
        self.player = Some(player);
    }
}

#[cfg(test)]
impl GameplayScene {
    pub(crate) fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub(crate) fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    pub(crate) fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub(crate) fn pack(&self) -> Option<&WolfPack> {
        self.pack.as_ref()
    }

    pub(crate) fn events(&self) -> &GameplayEventBus {
        &self.events
    }

    pub(crate) fn systems(&self) -> &GameplaySystemsHost {
        &self.systems
    }
}

impl Scene for GameplayScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.clear();
        self.actions.clear();
        self.lighting.clear_lights();
        self.events = GameplayEventBus::default();
        self.last_now = Timestamp::ZERO;
        self.spawn_world(world);
        world.apply_pending();
        info!(
            entity_count = world.entity_count(),
            light_count = self.lighting.light_count(),
            has_pack = self.pack.is_some(),
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        frame: FrameTime,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        let Some(player) = self.player.as_mut() else {
            return SceneCommand::None;
        };
        self.last_now = frame.now;

        let mut context = GameplaySystemContext {
            frame,
            input,
            world,
            player,
            actions: &mut self.actions,
            pack: self.pack.as_mut(),
            lighting: &mut self.lighting,
            events: &mut self.events,
            tuning: &self.tuning,
        };
        self.systems.run_once_per_tick(&mut context);
        self.events.finish_tick_rollover();

        let counts = self.events.last_tick_counts();
        if counts.total > 0 {
            debug!(
                total = counts.total,
                enemy_damaged = counts.enemy_damaged,
                enemy_killed = counts.enemy_killed,
                player_damaged = counts.player_damaged,
                sound_cues = counts.sound_cue,
                "gameplay_tick_events"
            );
        }
        SceneCommand::None
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        self.actions.clear();
        self.lighting.clear_lights();
        self.player = None;
        self.pack = None;
        world.clear();
        info!("scene_unloaded");
    }

    fn lighting(&self) -> Option<&LightingCompositor> {
        Some(&self.lighting)
    }

    fn hud_bars(&self) -> Option<HudBars> {
        self.hud().map(|hud| hud.bars())
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        let hud = self.hud()?;
        let status = match (hud.death_notice, hud.respawn_countdown) {
            (Some(notice), Some(countdown)) => format!("{notice} | {countdown}"),
            _ => format!(
                "HP {}/{} | Mana {}/{}",
                hud.hit_points, hud.max_hit_points, hud.mana, hud.max_mana
            ),
        };
        let enraged = if self.pack.as_ref().is_some_and(WolfPack::protect_mode) {
            " | pack enraged"
        } else {
            ""
        };
        Some(format!(
            "Lanternfall | {status}{enraged} | entities {} | lights {}",
            world.entity_count(),
            self.lighting.light_count()
        ))
    }
}
