use engine::{
    BoundingBox, EntityCategory, EntityId, EntitySpec, FrameTime, InputAction, InputSnapshot,
    Padding, RenderableDesc, RenderableKind, SceneWorld, Size, Timestamp, Vec2,
};
use tracing::info;

use super::actions::{AttackDirection, AttackState, Wielder};
use super::events::{GameplayEvent, GameplayEventBus};
use super::vitals::{DamageOutcome, DeadState, PlayerVitals};
use crate::app::tuning::VitalsTuning;

/// The player character: vitals plus the world entity that mirrors its pose.
#[derive(Debug, Clone)]
pub(crate) struct Player {
    entity_id: EntityId,
    size: Size,
    padding: Padding,
    pub(crate) vitals: PlayerVitals,
    attack: AttackState,
}

impl Player {
    pub(crate) fn spawn(
        world: &mut SceneWorld,
        position: Vec2,
        tuning: &VitalsTuning,
        now: Timestamp,
    ) -> Self {
        let entity_id = world.spawn(
            EntitySpec::new(EntityCategory::Player, position, tuning.size, "player")
                .with_collider(Some(tuning.padding))
                .with_renderable(RenderableDesc::sprite("character/doug", "player")),
        );
        Self {
            entity_id,
            size: tuning.size,
            padding: tuning.padding,
            vitals: PlayerVitals::new(tuning, position, now),
            attack: AttackState::default(),
        }
    }

    pub(crate) fn bounding_box(&self) -> BoundingBox {
        BoundingBox::padded(self.vitals.position, self.size, self.padding)
    }

    /// Copies the authoritative position into the world entity and faces the
    /// sprite toward the current attack.
    pub(crate) fn sync_entity(&self, world: &mut SceneWorld) {
        let Some(entity) = world.find_any_mut(self.entity_id) else {
            return;
        };
        entity.transform.position = self.vitals.position;
        if let RenderableKind::Sprite { frame, .. } = &mut entity.renderable.kind {
            *frame = match self.attack.direction() {
                Some(AttackDirection::Left) => 1,
                _ => 0,
            };
        }
    }
}

impl Wielder for Player {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn position(&self) -> Vec2 {
        self.vitals.position
    }

    fn center(&self) -> Vec2 {
        self.vitals.position + Vec2::new(self.size.w * 0.5, self.size.h * 0.5)
    }

    fn attack_state(&self) -> &AttackState {
        &self.attack
    }

    fn attack_state_mut(&mut self) -> &mut AttackState {
        &mut self.attack
    }
}

/// Velocity from the held movement actions; diagonals keep the same speed.
pub(crate) fn movement_velocity(input: &InputSnapshot, speed: f32) -> Vec2 {
    let axis = |negative: InputAction, positive: InputAction| -> f32 {
        match (input.is_down(negative), input.is_down(positive)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    };
    let x = axis(InputAction::MoveLeft, InputAction::MoveRight);
    let y = axis(InputAction::MoveUp, InputAction::MoveDown);
    if x != 0.0 && y != 0.0 {
        let diagonal = speed / std::f32::consts::SQRT_2;
        Vec2::new(x * diagonal, y * diagonal)
    } else {
        Vec2::new(x * speed, y * speed)
    }
}

fn blocked_by_obstacle(world: &SceneWorld, bounds: BoundingBox) -> bool {
    world
        .iter_category(EntityCategory::Obstacle)
        .filter_map(|obstacle| obstacle.bounding_box())
        .any(|obstacle| obstacle.collides(&bounds))
}

/// One frame of player logic: the dead/respawn check, movement, enemy contact
/// damage and regeneration.
pub(crate) fn update_player(
    player: &mut Player,
    frame: FrameTime,
    input: &InputSnapshot,
    world: &mut SceneWorld,
    events: &mut GameplayEventBus,
) {
    let now = frame.now;
    match player.vitals.update_dead_state(now) {
        DeadState::StillDead => {
            player.sync_entity(world);
            return;
        }
        DeadState::Respawned => {
            events.emit(GameplayEvent::PlayerRespawned);
            info!(
                hit_points = player.vitals.hit_points(),
                x = player.vitals.position.x,
                y = player.vitals.position.y,
                "player_respawned"
            );
        }
        DeadState::Alive => {}
    }

    let velocity = movement_velocity(input, player.vitals.move_speed());
    player.vitals.velocity = velocity;
    let dt = frame.dt_seconds;
    let step_x = Vec2::new(velocity.x * dt, 0.0);
    if step_x.x != 0.0 && !blocked_by_obstacle(world, player.bounding_box().translated(step_x)) {
        player.vitals.position += step_x;
    }
    let step_y = Vec2::new(0.0, velocity.y * dt);
    if step_y.y != 0.0 && !blocked_by_obstacle(world, player.bounding_box().translated(step_y)) {
        player.vitals.position += step_y;
    }
    player.sync_entity(world);

    let bounds = player.bounding_box();
    let contacts: Vec<u32> = world
        .iter_category(EntityCategory::Enemy)
        .filter(|enemy| {
            enemy
                .bounding_box()
                .is_some_and(|other| other.collides(&bounds))
        })
        .filter_map(|enemy| enemy.combatant.map(|combatant| combatant.contact_damage))
        .collect();
    for contact_damage in contacts {
        match player.vitals.take_damage(contact_damage, now) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Applied { dealt } => {
                events.emit(GameplayEvent::PlayerDamaged {
                    amount: dealt,
                    hit_points: player.vitals.hit_points(),
                });
            }
            DamageOutcome::Killed { dealt } => {
                events.emit(GameplayEvent::PlayerDamaged {
                    amount: dealt,
                    hit_points: 0,
                });
                events.emit(GameplayEvent::PlayerDied);
                info!(
                    x = player.vitals.position.x,
                    y = player.vitals.position.y,
                    "player_died"
                );
                return;
            }
        }
    }

    player.vitals.regenerate(now);
}
