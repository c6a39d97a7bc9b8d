use engine::{
    FrameTime, InputAction, InputSnapshot, LightingCompositor, SceneWorld, Vec2, Viewport,
};
use tracing::debug;

use super::actions::{ActionFrame, ActionSet, AttackDirection, Wielder};
use super::events::GameplayEventBus;
use super::pack::WolfPack;
use super::player::{update_player, Player};
use crate::app::tuning::GameTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GameplaySystemId {
    PlayerVitals,
    ActionInput,
    CombatActions,
    GroupCoordination,
    Lighting,
    Cleanup,
}

impl GameplaySystemId {
    #[cfg(test)]
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::PlayerVitals => "PlayerVitals",
            Self::ActionInput => "ActionInput",
            Self::CombatActions => "CombatActions",
            Self::GroupCoordination => "GroupCoordination",
            Self::Lighting => "Lighting",
            Self::Cleanup => "Cleanup",
        }
    }
}

pub(crate) const GAMEPLAY_SYSTEM_ORDER: [GameplaySystemId; 6] = [
    GameplaySystemId::PlayerVitals,
    GameplaySystemId::ActionInput,
    GameplaySystemId::CombatActions,
    GameplaySystemId::GroupCoordination,
    GameplaySystemId::Lighting,
    GameplaySystemId::Cleanup,
];

pub(crate) struct GameplaySystemContext<'a> {
    pub(crate) frame: FrameTime,
    pub(crate) input: &'a InputSnapshot,
    pub(crate) world: &'a mut SceneWorld,
    pub(crate) player: &'a mut Player,
    pub(crate) actions: &'a mut ActionSet,
    pub(crate) pack: Option<&'a mut WolfPack>,
    pub(crate) lighting: &'a mut LightingCompositor,
    pub(crate) events: &'a mut GameplayEventBus,
    pub(crate) tuning: &'a GameTuning,
}

#[derive(Debug, Default)]
pub(crate) struct GameplaySystemsHost {
    last_tick_order: Vec<GameplaySystemId>,
}

impl GameplaySystemsHost {
    pub(crate) fn run_once_per_tick(&mut self, context: &mut GameplaySystemContext<'_>) {
        self.last_tick_order.clear();
        for system_id in GAMEPLAY_SYSTEM_ORDER {
            self.last_tick_order.push(system_id);
            Self::run_system(system_id, context);
        }
    }

    pub(crate) fn last_tick_order(&self) -> &[GameplaySystemId] {
        &self.last_tick_order
    }

    fn run_system(system_id: GameplaySystemId, context: &mut GameplaySystemContext<'_>) {
        match system_id {
            GameplaySystemId::PlayerVitals => update_player(
                context.player,
                context.frame,
                context.input,
                context.world,
                context.events,
            ),
            GameplaySystemId::ActionInput => Self::run_action_input_system(context),
            GameplaySystemId::CombatActions => {
                let mut frame = ActionFrame {
                    frame: context.frame,
                    world: &mut *context.world,
                    wielder: &mut *context.player,
                    events: &mut *context.events,
                    cull_distance: context.tuning.weapons.cull_distance,
                };
                context.actions.update_active(&mut frame);
            }
            GameplaySystemId::GroupCoordination => {
                if let Some(pack) = context.pack.as_deref_mut() {
                    pack.update(
                        context.world,
                        context.player.vitals.is_dead(),
                        context.events,
                    );
                }
            }
            GameplaySystemId::Lighting => Self::run_lighting_system(context),
            GameplaySystemId::Cleanup => context.actions.promote_pending(),
        }
    }

    /// Starts at most one new action per tick, and none while one is running.
    fn run_action_input_system(context: &mut GameplaySystemContext<'_>) {
        let player = &mut *context.player;
        if player.vitals.is_dead() || player.is_attacking() {
            return;
        }
        let input = context.input;
        let weapons = &context.tuning.weapons;

        let swing = if input.is_down(InputAction::SwingLeft) {
            Some(AttackDirection::Left)
        } else if input.is_down(InputAction::SwingRight) {
            Some(AttackDirection::Right)
        } else {
            None
        };
        if let Some(direction) = swing {
            context.actions.start_melee(
                direction,
                &weapons.sword,
                context.world,
                player,
                context.events,
            );
            return;
        }

        if !input.left_click_pressed() && !input.right_click_pressed() {
            return;
        }
        let Some(cursor) = input.cursor_position_px() else {
            return;
        };
        let (width, height) = input.window_size();
        let aim = cursor - Vec2::new(width as f32 * 0.5, height as f32 * 0.5);

        if input.left_click_pressed() {
            context.actions.start_bow_shot(
                aim,
                context.frame.now,
                weapons,
                context.world,
                context.lighting,
                player,
                context.events,
            );
        } else if player.vitals.use_mana(weapons.mana_bolt.mana_cost) {
            context.actions.start_water_sphere(
                aim,
                context.frame.now,
                weapons,
                context.world,
                context.lighting,
                player,
                context.events,
            );
        } else {
            debug!(
                mana = player.vitals.mana(),
                cost = weapons.mana_bolt.mana_cost,
                "cast_rejected_insufficient_mana"
            );
        }
    }

    /// Centres the camera on the player, then composites the light mask.
    fn run_lighting_system(context: &mut GameplaySystemContext<'_>) {
        context.world.camera_mut().position = context.player.center();
        let (width, height) = context.input.window_size();
        context.lighting.update(
            context.frame.now,
            context.world,
            Viewport { width, height },
        );
    }
}
