use super::clock::FrameTime;
use super::geometry::{BoundingBox, Padding, Size, Vec2};
use super::input::{ActionStates, InputAction};
use super::rendering::LightingCompositor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    right_click_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        cursor_position_px: Option<Vec2>,
        left_click_pressed: bool,
        right_click_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            cursor_position_px,
            left_click_pressed,
            right_click_pressed,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested || self.actions.is_down(InputAction::Quit)
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_right_click_pressed(mut self, right_click_pressed: bool) -> Self {
        self.right_click_pressed = right_click_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn right_click_pressed(&self) -> bool {
        self.right_click_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Flat capability tag queried by collision code instead of inspecting types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Player,
    Enemy,
    Obstacle,
    Projectile,
    Decoration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation_radians: Option<f32>,
}

impl Transform {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            rotation_radians: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Returns the damage actually removed.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.current);
        self.current -= dealt;
        dealt
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }
}

/// Health and behavior flags for anything that can fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combatant {
    pub health: Health,
    pub contact_damage: u32,
    pub enraged: bool,
}

impl Combatant {
    pub fn new(max_hit_points: u32, contact_damage: u32) -> Self {
        Self {
            health: Health::full(max_hit_points),
            contact_damage,
            enraged: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder,
    Sprite { key: &'static str, frame: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
}

impl RenderableDesc {
    pub fn placeholder(debug_name: &'static str) -> Self {
        Self {
            kind: RenderableKind::Placeholder,
            debug_name,
        }
    }

    pub fn sprite(key: &'static str, debug_name: &'static str) -> Self {
        Self {
            kind: RenderableKind::Sprite { key, frame: 0 },
            debug_name,
        }
    }
}

/// Everything needed to register a new entity.
#[derive(Debug, Clone, Copy)]
pub struct EntitySpec {
    pub category: EntityCategory,
    pub transform: Transform,
    pub size: Size,
    pub collider: Option<Padding>,
    pub combatant: Option<Combatant>,
    pub renderable: RenderableDesc,
}

impl EntitySpec {
    pub fn new(
        category: EntityCategory,
        position: Vec2,
        size: Size,
        debug_name: &'static str,
    ) -> Self {
        Self {
            category,
            transform: Transform::at(position),
            size,
            collider: Some(Padding::NONE),
            combatant: None,
            renderable: RenderableDesc::placeholder(debug_name),
        }
    }

    pub fn with_collider(mut self, collider: Option<Padding>) -> Self {
        self.collider = collider;
        self
    }

    pub fn with_combatant(mut self, combatant: Combatant) -> Self {
        self.combatant = Some(combatant);
        self
    }

    pub fn with_renderable(mut self, renderable: RenderableDesc) -> Self {
        self.renderable = renderable;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub category: EntityCategory,
    pub transform: Transform,
    pub size: Size,
    pub collider: Option<Padding>,
    pub combatant: Option<Combatant>,
    pub renderable: RenderableDesc,
    remove_from_world: bool,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.collider
            .map(|padding| BoundingBox::padded(self.transform.position, self.size, padding))
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.transform.position.x + self.size.w * 0.5,
            self.transform.position.y + self.size.h * 0.5,
        )
    }

    pub fn is_marked_removed(&self) -> bool {
        self.remove_from_world
    }

    pub fn mark_removed(&mut self) {
        self.remove_from_world = true;
    }

    pub fn is_alive(&self) -> bool {
        !self.remove_from_world
    }

    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Foreground entity collection.
///
/// Spawns and removals are deferred: `spawn` queues, `mark_removed` sets a tombstone
/// flag, and `apply_pending` compacts both at a frame boundary. Ids are never reused.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
}

impl SceneWorld {
    pub fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            category: spec.category,
            transform: spec.transform,
            size: spec.size,
            collider: spec.collider,
            combatant: spec.combatant,
            renderable: spec.renderable,
            remove_from_world: false,
            applied_spawn_order: 0,
        });
        id
    }

    /// Sets the removal flag on a live or pending entity. Returns false if unknown.
    pub fn mark_removed(&mut self, id: EntityId) -> bool {
        match self.find_any_mut(id) {
            Some(entity) => {
                entity.remove_from_world = true;
                true
            }
            None => false,
        }
    }

    /// True if the entity is flagged for removal or no longer exists.
    pub fn is_removed(&self, id: EntityId) -> bool {
        self.find_any(id)
            .map_or(true, |entity| entity.remove_from_world)
    }

    pub fn apply_pending(&mut self) {
        self.entities.retain(|entity| !entity.remove_from_world);

        if !self.pending_spawns.is_empty() {
            for mut entity in self.pending_spawns.drain(..) {
                if entity.remove_from_world {
                    continue;
                }
                entity.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.entities.push(entity);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn pending_spawn_count(&self) -> usize {
        self.pending_spawns.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Live (not removed) entities of one category, in traversal order.
    pub fn iter_category(&self, category: EntityCategory) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |entity| entity.category == category && entity.is_alive())
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    /// Looks up live entities first, then ones registered this frame.
    pub fn find_any(&self, id: EntityId) -> Option<&Entity> {
        self.find_entity(id)
            .or_else(|| self.pending_spawns.iter().find(|entity| entity.id == id))
    }

    pub fn find_any_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if let Some(index) = self.entities.iter().position(|entity| entity.id == id) {
            return self.entities.get_mut(index);
        }
        self.pending_spawns.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }
}

/// HP/mana values a scene exposes for the bar overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudBars {
    pub hit_points: u32,
    pub max_hit_points: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub is_dead: bool,
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        frame: FrameTime,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    fn lighting(&self) -> Option<&LightingCompositor> {
        None
    }
    fn hud_bars(&self) -> Option<HudBars> {
        None
    }
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRunner {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRunner {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, frame: FrameTime, input: &InputSnapshot) -> SceneCommand {
        self.scene.update(frame, input, &mut self.world)
    }

    pub(crate) fn apply_pending(&mut self) {
        self.world.apply_pending();
    }

    pub(crate) fn scene(&self) -> &dyn Scene {
        self.scene.as_ref()
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Timestamp;

    fn obstacle_at(x: f32, y: f32) -> EntitySpec {
        EntitySpec::new(
            EntityCategory::Obstacle,
            Vec2::new(x, y),
            Size::new(32.0, 32.0),
            "rock",
        )
    }

    fn enemy_at(x: f32, y: f32) -> EntitySpec {
        EntitySpec::new(
            EntityCategory::Enemy,
            Vec2::new(x, y),
            Size::new(32.0, 32.0),
            "enemy",
        )
        .with_combatant(Combatant::new(50, 5))
    }

    struct CountingScene {
        spawn_count: usize,
        updates: u32,
    }

    impl Scene for CountingScene {
        fn load(&mut self, world: &mut SceneWorld) {
            for index in 0..self.spawn_count {
                world.spawn(obstacle_at(index as f32 * 40.0, 0.0));
            }
            world.apply_pending();
        }

        fn update(
            &mut self,
            _frame: FrameTime,
            _input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            self.updates += 1;
            if let Some(entity) = world.entities_mut().first_mut() {
                entity.transform.position.x += 1.0;
            }
            SceneCommand::None
        }

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn spawn_is_deferred_until_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(obstacle_at(0.0, 0.0));
        assert_eq!(world.entity_count(), 0);
        assert!(world.find_entity(id).is_none());
        assert!(world.find_any(id).is_some());

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(id).is_some());
    }

    #[test]
    fn removed_entity_stays_readable_until_frame_boundary() {
        let mut world = SceneWorld::default();
        let id = world.spawn(obstacle_at(0.0, 0.0));
        world.apply_pending();

        assert!(world.mark_removed(id));
        let entity = world.find_entity(id).expect("still present this frame");
        assert!(entity.is_marked_removed());
        assert!(world.is_removed(id));
        assert_eq!(world.iter_category(EntityCategory::Obstacle).count(), 0);

        world.apply_pending();
        assert!(world.find_entity(id).is_none());
        assert!(world.is_removed(id));
    }

    #[test]
    fn duplicate_removal_marks_are_idempotent() {
        let mut world = SceneWorld::default();
        let doomed = world.spawn(obstacle_at(0.0, 0.0));
        let survivor = world.spawn(obstacle_at(64.0, 0.0));
        world.apply_pending();

        assert!(world.mark_removed(doomed));
        assert!(world.mark_removed(doomed));
        world.apply_pending();

        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(survivor).is_some());
        assert!(!world.mark_removed(doomed));
    }

    #[test]
    fn entity_removed_while_pending_never_lands() {
        let mut world = SceneWorld::default();
        let id = world.spawn(obstacle_at(0.0, 0.0));
        assert!(world.mark_removed(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn iter_category_filters_by_tag_in_traversal_order() {
        let mut world = SceneWorld::default();
        let first = world.spawn(enemy_at(0.0, 0.0));
        world.spawn(obstacle_at(0.0, 0.0));
        let second = world.spawn(enemy_at(10.0, 0.0));
        world.apply_pending();

        let enemies: Vec<EntityId> = world
            .iter_category(EntityCategory::Enemy)
            .map(|entity| entity.id)
            .collect();
        assert_eq!(enemies, vec![first, second]);
    }

    #[test]
    fn bounding_box_follows_transform_and_padding() {
        let mut world = SceneWorld::default();
        let id = world.spawn(
            obstacle_at(0.0, 0.0).with_collider(Some(Padding::new(2.0, 4.0, 6.0, 8.0))),
        );
        world.apply_pending();
        let entity = world.find_entity_mut(id).expect("entity");
        entity.transform.position = Vec2::new(100.0, 50.0);

        let bb = entity.bounding_box().expect("collider");
        assert_eq!(bb.origin, Vec2::new(108.0, 52.0));
        assert_eq!(bb.size, Size::new(20.0, 24.0));
    }

    #[test]
    fn entity_without_collider_has_no_bounding_box() {
        let mut world = SceneWorld::default();
        let id = world.spawn(obstacle_at(0.0, 0.0).with_collider(None));
        world.apply_pending();
        assert!(world.find_entity(id).expect("entity").bounding_box().is_none());
    }

    #[test]
    fn health_damage_saturates_at_zero() {
        let mut health = Health::full(30);
        assert_eq!(health.apply_damage(12), 12);
        assert_eq!(health.apply_damage(100), 18);
        assert!(health.is_depleted());
        health.heal(500);
        assert_eq!(health.current, 30);
    }

    #[test]
    fn runner_loads_once_and_shutdown_clears_world() {
        let mut runner = SceneRunner::new(Box::new(CountingScene {
            spawn_count: 2,
            updates: 0,
        }));
        runner.load();
        runner.load();
        assert_eq!(runner.world().entity_count(), 2);

        let frame = FrameTime::new(Timestamp::ZERO, 1.0 / 60.0);
        let _ = runner.update(frame, &InputSnapshot::empty());
        runner.apply_pending();
        assert_eq!(runner.world().entities()[0].transform.position.x, 1.0);

        runner.shutdown();
        assert_eq!(runner.world().entity_count(), 0);
    }

    #[test]
    fn input_snapshot_builders_round_trip() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_left_click_pressed(true)
            .with_cursor_position_px(Some(Vec2::new(3.0, 4.0)))
            .with_window_size((1024, 768));

        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
        assert!(snapshot.left_click_pressed());
        assert!(!snapshot.right_click_pressed());
        assert_eq!(snapshot.cursor_position_px(), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(snapshot.window_size(), (1024, 768));
    }
}
