use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

use engine::{
    BoundingBox, EntityCategory, EntityId, EntitySpec, FrameTime, LightAnchor, LightSource,
    LightingCompositor, Padding, RenderableDesc, RenderableKind, SceneWorld, Size, Timestamp,
    Vec2,
};
use tracing::{debug, warn};

use super::events::{GameplayEvent, GameplayEventBus, SoundCue};
use crate::app::tuning::{CastTuning, ProjectileTuning, SwordTuning, WeaponsTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttackDirection {
    Left,
    Right,
}

impl AttackDirection {
    /// Left when the aim points left of the screen centre.
    pub(crate) fn from_aim(aim: Vec2) -> Self {
        if aim.x < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionKind {
    MeleeSwing,
    BowDraw,
    Arrow,
    ManaBoltCast,
    WaterSphere,
}

impl ActionKind {
    fn sprite_key(self) -> &'static str {
        match self {
            Self::MeleeSwing => "weapon/sword",
            Self::BowDraw => "weapon/bow",
            Self::Arrow => "projectile/arrow",
            Self::ManaBoltCast => "weapon/mana_bolt",
            Self::WaterSphere => "projectile/water_sphere",
        }
    }

    fn debug_name(self) -> &'static str {
        match self {
            Self::MeleeSwing => "sword",
            Self::BowDraw => "bow",
            Self::Arrow => "arrow",
            Self::ManaBoltCast => "mana_bolt",
            Self::WaterSphere => "water_sphere",
        }
    }
}

/// Identifies which action currently owns the wielder's attack state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ActionToken(u64);

/// Whoever holds an action. Actions read its position and toggle its attack
/// state; they never reach it through anything else.
pub(crate) trait Wielder {
    fn entity_id(&self) -> EntityId;
    /// Top-left of the wielder's drawn rectangle.
    fn position(&self) -> Vec2;
    fn center(&self) -> Vec2;
    fn attack_state(&self) -> &AttackState;
    fn attack_state_mut(&mut self) -> &mut AttackState;

    fn is_attacking(&self) -> bool {
        self.attack_state().is_attacking()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AttackState {
    holder: Option<(ActionToken, AttackDirection)>,
}

impl AttackState {
    pub(crate) fn is_attacking(&self) -> bool {
        self.holder.is_some()
    }

    pub(crate) fn direction(&self) -> Option<AttackDirection> {
        self.holder.map(|(_, direction)| direction)
    }

    fn claim(&mut self, token: ActionToken, direction: AttackDirection) {
        self.holder = Some((token, direction));
    }

    /// Only the current holder may clear the flag.
    fn release(&mut self, token: ActionToken) -> bool {
        match self.holder {
            Some((holder, _)) if holder == token => {
                self.holder = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct MeleeSwing {
    direction: AttackDirection,
    angle: f32,
    angular_velocity: f32,
    end_angle: f32,
    offset: Vec2,
    hitbox_size: Size,
    damage: u32,
    hit_memory: HashSet<EntityId>,
}

impl MeleeSwing {
    fn new(direction: AttackDirection, tuning: &SwordTuning) -> Self {
        let (angle, angular_velocity, end_angle, offset) = match direction {
            AttackDirection::Right => (
                0.0,
                tuning.angular_speed,
                tuning.right_end_angle,
                tuning.right_offset,
            ),
            AttackDirection::Left => (
                FRAC_PI_2,
                -tuning.angular_speed,
                tuning.left_end_angle,
                tuning.left_offset,
            ),
        };
        Self {
            direction,
            angle,
            angular_velocity,
            end_angle,
            offset,
            hitbox_size: tuning.hitbox,
            damage: tuning.damage,
            hit_memory: HashSet::new(),
        }
    }

    fn hitbox(&self, wielder_position: Vec2) -> BoundingBox {
        BoundingBox::new(wielder_position + self.offset, self.hitbox_size)
    }

    fn reached_end(&self) -> bool {
        match self.direction {
            AttackDirection::Right => self.angle >= self.end_angle,
            AttackDirection::Left => self.angle <= self.end_angle,
        }
    }
}

#[derive(Debug, Clone)]
struct TimedCast {
    started_at: Timestamp,
    duration_seconds: f64,
    pose_offset_y: f32,
}

#[derive(Debug, Clone)]
struct Projectile {
    position: Vec2,
    direction: Option<Vec2>,
    speed: f32,
    size: Size,
    padding: Padding,
    damage: u32,
    obstacle_cue: SoundCue,
    enemy_cue: Option<SoundCue>,
}

#[derive(Debug, Clone)]
enum ActionBody {
    Melee(MeleeSwing),
    Cast(TimedCast),
    Projectile(Projectile),
}

/// One live combat action plus the world entity that carries its pose.
#[derive(Debug, Clone)]
pub(crate) struct ActionEntity {
    token: ActionToken,
    kind: ActionKind,
    entity_id: EntityId,
    claims_attack: bool,
    finished: bool,
    body: ActionBody,
}

pub(crate) struct ActionFrame<'a> {
    pub(crate) frame: FrameTime,
    pub(crate) world: &'a mut SceneWorld,
    pub(crate) wielder: &'a mut dyn Wielder,
    pub(crate) events: &'a mut GameplayEventBus,
    pub(crate) cull_distance: f32,
}

impl ActionEntity {
    #[cfg(test)]
    pub(crate) fn kind(&self) -> ActionKind {
        self.kind
    }

    #[cfg(test)]
    pub(crate) fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    fn update(&mut self, ctx: &mut ActionFrame<'_>) {
        if self.finished {
            return;
        }
        if ctx.world.is_removed(self.entity_id) {
            self.teardown(ctx);
            return;
        }
        let done = match &mut self.body {
            ActionBody::Melee(swing) => update_melee(swing, self.entity_id, ctx),
            ActionBody::Cast(cast) => update_cast(cast, self.entity_id, ctx),
            ActionBody::Projectile(projectile) => {
                update_projectile(projectile, self.kind, self.entity_id, ctx)
            }
        };
        if done {
            self.teardown(ctx);
        }
    }

    fn teardown(&mut self, ctx: &mut ActionFrame<'_>) {
        self.finished = true;
        if self.claims_attack {
            ctx.wielder.attack_state_mut().release(self.token);
        }
        ctx.world.mark_removed(self.entity_id);
        ctx.events.emit(GameplayEvent::ActionFinished { kind: self.kind });
        debug!(kind = ?self.kind, entity_id = self.entity_id.0, "action_finished");
    }
}

fn update_melee(swing: &mut MeleeSwing, entity_id: EntityId, ctx: &mut ActionFrame<'_>) -> bool {
    swing.angle += swing.angular_velocity * ctx.frame.dt_seconds;
    let hitbox = swing.hitbox(ctx.wielder.position());
    set_pose(ctx.world, entity_id, hitbox.origin, Some(swing.angle));

    let targets: Vec<EntityId> = ctx
        .world
        .iter_category(EntityCategory::Enemy)
        .filter(|enemy| {
            enemy
                .bounding_box()
                .is_some_and(|bounds| bounds.collides(&hitbox))
        })
        .map(|enemy| enemy.id)
        .collect();
    for target in targets {
        if swing.hit_memory.insert(target) {
            damage_enemy(ctx.world, target, swing.damage, ctx.events);
        }
    }

    swing.reached_end()
}

fn update_cast(cast: &TimedCast, entity_id: EntityId, ctx: &mut ActionFrame<'_>) -> bool {
    let pose = ctx.wielder.position() + Vec2::new(0.0, cast.pose_offset_y);
    set_pose(ctx.world, entity_id, pose, None);
    ctx.frame.now.seconds_since(cast.started_at) > cast.duration_seconds
}

fn update_projectile(
    projectile: &mut Projectile,
    kind: ActionKind,
    entity_id: EntityId,
    ctx: &mut ActionFrame<'_>,
) -> bool {
    let Some(direction) = projectile.direction else {
        warn!(kind = ?kind, "action_rejected_zero_direction");
        return true;
    };
    projectile.position += direction * (projectile.speed * ctx.frame.dt_seconds);
    set_pose(
        ctx.world,
        entity_id,
        projectile.position,
        Some(direction.y.atan2(direction.x)),
    );

    let wielder_position = ctx.wielder.position();
    let distance_to_wielder = projectile.position.distance(wielder_position);
    if distance_to_wielder > ctx.cull_distance {
        debug!(kind = ?kind, distance = distance_to_wielder, "projectile_culled");
        return true;
    }

    let bounds = BoundingBox::padded(projectile.position, projectile.size, projectile.padding);
    let wielder_id = ctx.wielder.entity_id();
    let hit = ctx.world.entities().iter().find_map(|entity| {
        if entity.id == wielder_id
            || !entity.is_alive()
            || !matches!(
                entity.category,
                EntityCategory::Enemy | EntityCategory::Obstacle
            )
        {
            return None;
        }
        entity
            .bounding_box()
            .filter(|other| other.collides(&bounds))
            .map(|_| (entity.id, entity.category))
    });

    match hit {
        Some((_, EntityCategory::Obstacle)) => {
            if distance_to_wielder < ctx.cull_distance {
                ctx.events
                    .emit(GameplayEvent::SoundCue(projectile.obstacle_cue));
            }
            true
        }
        Some((target, _)) => {
            damage_enemy(ctx.world, target, projectile.damage, ctx.events);
            if let Some(cue) = projectile.enemy_cue {
                ctx.events.emit(GameplayEvent::SoundCue(cue));
            }
            true
        }
        None => false,
    }
}

fn set_pose(world: &mut SceneWorld, entity_id: EntityId, position: Vec2, rotation: Option<f32>) {
    let Some(entity) = world.find_any_mut(entity_id) else {
        return;
    };
    entity.transform.position = position;
    entity.transform.rotation_radians = rotation;
    if let (Some(radians), RenderableKind::Sprite { frame, .. }) =
        (rotation, &mut entity.renderable.kind)
    {
        *frame = pose_frame(radians);
    }
}

/// Eight sprite frames per turn, picked from the pose angle.
fn pose_frame(radians: f32) -> u32 {
    let turns = radians.rem_euclid(std::f32::consts::TAU) / std::f32::consts::TAU;
    ((turns * 8.0).floor() as u32).min(7)
}

/// Applies damage to a live enemy, marking it removed when its health runs out.
pub(crate) fn damage_enemy(
    world: &mut SceneWorld,
    target: EntityId,
    amount: u32,
    events: &mut GameplayEventBus,
) -> bool {
    let Some(entity) = world.find_entity_mut(target) else {
        return false;
    };
    if !entity.is_alive() {
        return false;
    }
    let Some(combatant) = entity.combatant.as_mut() else {
        return false;
    };
    let dealt = combatant.health.apply_damage(amount);
    let killed = combatant.health.is_depleted();
    events.emit(GameplayEvent::EnemyDamaged {
        entity_id: target,
        amount: dealt,
    });
    if killed {
        entity.mark_removed();
        events.emit(GameplayEvent::EnemyKilled { entity_id: target });
        debug!(entity_id = target.0, "enemy_killed");
    }
    true
}

/// Live actions plus the ones started this frame, which begin updating on the
/// next frame.
#[derive(Debug, Default)]
pub(crate) struct ActionSet {
    active: Vec<ActionEntity>,
    pending: Vec<ActionEntity>,
    next_token: u64,
}

impl ActionSet {
    #[cfg(test)]
    pub(crate) fn active(&self) -> &[ActionEntity] {
        &self.active
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.active.is_empty() && self.pending.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.active.clear();
        self.pending.clear();
    }

    fn alloc_token(&mut self) -> ActionToken {
        let token = ActionToken(self.next_token);
        self.next_token = self.next_token.saturating_add(1);
        token
    }

    fn register(
        &mut self,
        kind: ActionKind,
        position: Vec2,
        size: Size,
        body: ActionBody,
        world: &mut SceneWorld,
        events: &mut GameplayEventBus,
    ) -> EntityId {
        let token = self.alloc_token();
        let entity_id = world.spawn(
            EntitySpec::new(EntityCategory::Projectile, position, size, kind.debug_name())
                .with_collider(None)
                .with_renderable(RenderableDesc::sprite(kind.sprite_key(), kind.debug_name())),
        );
        self.pending.push(ActionEntity {
            token,
            kind,
            entity_id,
            claims_attack: false,
            finished: false,
            body,
        });
        events.emit(GameplayEvent::ActionStarted { kind });
        entity_id
    }

    /// Marks the most recently registered action as the wielder's attack.
    fn claim_latest(&mut self, wielder: &mut dyn Wielder, direction: AttackDirection) {
        if let Some(action) = self.pending.last_mut() {
            action.claims_attack = true;
            wielder.attack_state_mut().claim(action.token, direction);
        }
    }

    pub(crate) fn start_melee(
        &mut self,
        direction: AttackDirection,
        tuning: &SwordTuning,
        world: &mut SceneWorld,
        wielder: &mut dyn Wielder,
        events: &mut GameplayEventBus,
    ) -> EntityId {
        let swing = MeleeSwing::new(direction, tuning);
        let hitbox = swing.hitbox(wielder.position());
        let entity_id = self.register(
            ActionKind::MeleeSwing,
            hitbox.origin,
            hitbox.size,
            ActionBody::Melee(swing),
            world,
            events,
        );
        self.claim_latest(wielder, direction);
        events.emit(GameplayEvent::SoundCue(SoundCue::Swing));
        entity_id
    }

    /// Fires an arrow along `aim` and holds the bow drawn for its duration.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn start_bow_shot(
        &mut self,
        aim: Vec2,
        now: Timestamp,
        weapons: &WeaponsTuning,
        world: &mut SceneWorld,
        lighting: &mut LightingCompositor,
        wielder: &mut dyn Wielder,
        events: &mut GameplayEventBus,
    ) -> EntityId {
        let arrow = self.launch_projectile(
            ActionKind::Arrow,
            aim,
            &weapons.arrow,
            SoundCue::ArrowImpact,
            None,
            world,
            lighting,
            wielder,
            events,
        );
        events.emit(GameplayEvent::SoundCue(SoundCue::BowRelease));
        self.start_cast(
            ActionKind::BowDraw,
            AttackDirection::from_aim(aim),
            now,
            &weapons.bow,
            world,
            wielder,
            events,
        );
        arrow
    }

    /// Launches a water sphere along `aim`. The caller has already paid its mana.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn start_water_sphere(
        &mut self,
        aim: Vec2,
        now: Timestamp,
        weapons: &WeaponsTuning,
        world: &mut SceneWorld,
        lighting: &mut LightingCompositor,
        wielder: &mut dyn Wielder,
        events: &mut GameplayEventBus,
    ) -> EntityId {
        events.emit(GameplayEvent::SoundCue(SoundCue::ManaBolt));
        let sphere = self.launch_projectile(
            ActionKind::WaterSphere,
            aim,
            &weapons.water_sphere,
            SoundCue::ProjectileImpact,
            Some(SoundCue::ProjectileImpact),
            world,
            lighting,
            wielder,
            events,
        );
        self.start_cast(
            ActionKind::ManaBoltCast,
            AttackDirection::from_aim(aim),
            now,
            &weapons.mana_bolt,
            world,
            wielder,
            events,
        );
        sphere
    }

    #[allow(clippy::too_many_arguments)]
    fn start_cast(
        &mut self,
        kind: ActionKind,
        direction: AttackDirection,
        now: Timestamp,
        tuning: &CastTuning,
        world: &mut SceneWorld,
        wielder: &mut dyn Wielder,
        events: &mut GameplayEventBus,
    ) {
        let position = wielder.position() + Vec2::new(0.0, tuning.pose_offset_y);
        self.register(
            kind,
            position,
            Size::new(44.0, 44.0),
            ActionBody::Cast(TimedCast {
                started_at: now,
                duration_seconds: tuning.duration_seconds,
                pose_offset_y: tuning.pose_offset_y,
            }),
            world,
            events,
        );
        self.claim_latest(wielder, direction);
    }

    #[allow(clippy::too_many_arguments)]
    fn launch_projectile(
        &mut self,
        kind: ActionKind,
        aim: Vec2,
        tuning: &ProjectileTuning,
        obstacle_cue: SoundCue,
        enemy_cue: Option<SoundCue>,
        world: &mut SceneWorld,
        lighting: &mut LightingCompositor,
        wielder: &mut dyn Wielder,
        events: &mut GameplayEventBus,
    ) -> EntityId {
        let direction = aim.normalized();
        let centered = wielder.center() - Vec2::new(tuning.size.w * 0.5, tuning.size.h * 0.5);
        let position = match direction {
            Some(direction) => centered + direction * tuning.launch_offset,
            None => centered,
        };
        let entity_id = self.register(
            kind,
            position,
            tuning.size,
            ActionBody::Projectile(Projectile {
                position,
                direction,
                speed: tuning.speed,
                size: tuning.size,
                padding: tuning.padding,
                damage: tuning.damage,
                obstacle_cue,
                enemy_cue,
            }),
            world,
            events,
        );
        lighting.add_light_source(LightSource::new(
            LightAnchor::Entity(entity_id),
            tuning.light_radius,
            tuning.light_color,
            tuning.light_intensity,
        ));
        entity_id
    }

    pub(crate) fn update_active(&mut self, ctx: &mut ActionFrame<'_>) {
        for action in &mut self.active {
            action.update(ctx);
        }
        self.active.retain(|action| !action.finished);
    }

    pub(crate) fn promote_pending(&mut self) {
        self.active.append(&mut self.pending);
    }
}
