use engine::{
    Combatant, EntityCategory, EntitySpec, FrameTime, InputAction, InputSnapshot, Scene,
    SceneCommand, SceneWorld, Size, Timestamp, Vec2,
};

use super::actions::{ActionKind, Wielder};
use super::events::{GameplayEvent, SoundCue};
use super::systems::GAMEPLAY_SYSTEM_ORDER;
use super::GameplayScene;
use crate::app::tuning::{GameTuning, ObstacleTuning};

const DT: f32 = 1.0 / 60.0;
const WINDOW: (u32, u32) = (200, 100);

fn empty_world_tuning() -> GameTuning {
    let mut tuning = GameTuning::default();
    tuning.world.obstacles.clear();
    tuning.world.torches.clear();
    tuning.world.den_position = None;
    tuning
}

fn loaded(tuning: GameTuning) -> (GameplayScene, SceneWorld) {
    let mut scene = GameplayScene::new(tuning);
    let mut world = SceneWorld::default();
    scene.load(&mut world);
    (scene, world)
}

fn idle_input() -> InputSnapshot {
    InputSnapshot::empty().with_window_size(WINDOW)
}

fn left_click_at(cursor_px: Vec2) -> InputSnapshot {
    idle_input()
        .with_left_click_pressed(true)
        .with_cursor_position_px(Some(cursor_px))
}

fn right_click_at(cursor_px: Vec2) -> InputSnapshot {
    idle_input()
        .with_right_click_pressed(true)
        .with_cursor_position_px(Some(cursor_px))
}

/// Runs one tick the way the loop does: scene update, then the frame boundary.
fn tick(
    scene: &mut GameplayScene,
    world: &mut SceneWorld,
    seconds: f64,
    input: &InputSnapshot,
) -> SceneCommand {
    let frame = FrameTime::new(Timestamp::from_secs_f64(seconds), DT);
    let command = scene.update(frame, input, world);
    world.apply_pending();
    command
}

fn advance(scene: &mut GameplayScene, world: &mut SceneWorld, start: f64, steps: usize) {
    let input = idle_input();
    for step in 0..steps {
        tick(scene, world, start + step as f64 * DT as f64, &input);
    }
}

fn light_count(scene: &GameplayScene) -> usize {
    scene.lighting().map_or(0, |lighting| lighting.light_count())
}

fn assert_vec2_close(actual: Vec2, expected: Vec2, epsilon: f32) {
    assert!(
        (actual.x - expected.x).abs() <= epsilon && (actual.y - expected.y).abs() <= epsilon,
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn gameplay_system_order_is_stable_and_expected_names() {
    let (mut scene, mut world) = loaded(empty_world_tuning());
    tick(&mut scene, &mut world, 0.1, &idle_input());

    let names: Vec<&str> = scene
        .systems()
        .last_tick_order()
        .iter()
        .map(|system| system.name())
        .collect();
    assert_eq!(
        names.join(">"),
        "PlayerVitals>ActionInput>CombatActions>GroupCoordination>Lighting>Cleanup"
    );
    assert_eq!(scene.systems().last_tick_order(), GAMEPLAY_SYSTEM_ORDER);
}

#[test]
fn load_builds_demo_world_with_lights() {
    let (scene, world) = loaded(GameTuning::default());
    let tuning = GameTuning::default();
    let expected_entities = tuning.world.obstacles.len() + tuning.world.torches.len() + 1 + 4 + 1;

    assert_eq!(world.entity_count(), expected_entities);
    assert_eq!(light_count(&scene), tuning.world.torches.len() + 1);
    assert_eq!(world.iter_category(EntityCategory::Enemy).count(), 4);
    let player = scene.player().expect("player");
    assert_eq!(player.position(), Vec2::new(-140.0, 0.0));
    assert_vec2_close(world.camera().position, player.center(), 1e-4);
}

#[test]
fn quit_input_returns_quit_command() {
    let (mut scene, mut world) = loaded(empty_world_tuning());
    assert_eq!(
        tick(&mut scene, &mut world, 0.1, &idle_input()),
        SceneCommand::None
    );

    let quit = idle_input().with_action_down(InputAction::Quit, true);
    assert_eq!(tick(&mut scene, &mut world, 0.12, &quit), SceneCommand::Quit);
}

#[test]
fn death_and_respawn_end_to_end() {
    let (mut scene, mut world) = loaded(empty_world_tuning());
    world.spawn(
        EntitySpec::new(
            EntityCategory::Enemy,
            Vec2::new(-150.0, 20.0),
            Size::new(64.0, 64.0),
            "brute",
        )
        .with_combatant(Combatant::new(500, 450)),
    );
    world.apply_pending();

    tick(&mut scene, &mut world, 0.5, &idle_input());
    assert_eq!(scene.hud().expect("hud").hit_points, 400);

    tick(&mut scene, &mut world, 1.0, &idle_input());
    let hud = scene.hud().expect("hud");
    assert!(hud.is_dead);
    assert_eq!(hud.hit_points, 0);
    assert_eq!(hud.death_notice, Some("You died"));
    assert_eq!(hud.respawn_countdown.as_deref(), Some("Respawning in... 10"));
    assert!(scene
        .events()
        .last_tick_events()
        .contains(&GameplayEvent::PlayerDied));

    let moving = idle_input().with_action_down(InputAction::MoveRight, true);
    tick(&mut scene, &mut world, 10.9, &moving);
    let player = scene.player().expect("player");
    assert!(player.vitals.is_dead());
    assert_eq!(player.position(), Vec2::new(-140.0, 0.0));

    tick(&mut scene, &mut world, 11.0, &idle_input());
    let player = scene.player().expect("player");
    assert!(!player.vitals.is_dead());
    assert_eq!(player.position(), Vec2::ZERO);
    assert_eq!(player.vitals.hit_points(), 400);
    assert_eq!(player.vitals.mana(), 200);
    assert!(scene
        .events()
        .last_tick_events()
        .contains(&GameplayEvent::PlayerRespawned));
    assert_eq!(scene.hud().expect("hud").respawn_countdown, None);
}

#[test]
fn right_click_spends_mana_and_casts_water_sphere() {
    let (mut scene, mut world) = loaded(empty_world_tuning());
    let lights_before = light_count(&scene);

    tick(&mut scene, &mut world, 0.1, &right_click_at(Vec2::new(180.0, 50.0)));

    let player = scene.player().expect("player");
    assert_eq!(player.vitals.mana(), 175);
    assert!(player.is_attacking());
    let kinds: Vec<ActionKind> = scene
        .actions()
        .active()
        .iter()
        .map(|action| action.kind())
        .collect();
    assert_eq!(kinds, vec![ActionKind::WaterSphere, ActionKind::ManaBoltCast]);
    assert_eq!(light_count(&scene), lights_before + 1);
    assert!(scene
        .events()
        .last_tick_events()
        .contains(&GameplayEvent::SoundCue(SoundCue::ManaBolt)));
}

#[test]
fn cast_without_enough_mana_does_nothing() {
    let mut tuning = empty_world_tuning();
    tuning.vitals.initial_mana = 10;
    let (mut scene, mut world) = loaded(tuning);

    tick(&mut scene, &mut world, 0.1, &right_click_at(Vec2::new(180.0, 50.0)));

    let player = scene.player().expect("player");
    assert_eq!(player.vitals.mana(), 10);
    assert!(!player.is_attacking());
    assert!(scene.actions().is_empty());
}

#[test]
fn new_actions_are_gated_while_attacking() {
    let (mut scene, mut world) = loaded(empty_world_tuning());
    let swing = idle_input().with_action_down(InputAction::SwingRight, true);

    tick(&mut scene, &mut world, 0.1, &swing);
    assert_eq!(scene.actions().active().len(), 1);

    tick(&mut scene, &mut world, 0.12, &left_click_at(Vec2::new(180.0, 50.0)));
    assert_eq!(scene.actions().active().len(), 1);
    assert_eq!(scene.actions().pending_len(), 0);
    assert_eq!(scene.actions().active()[0].kind(), ActionKind::MeleeSwing);

    advance(&mut scene, &mut world, 0.14, 30);
    let player = scene.player().expect("player");
    assert!(!player.is_attacking());
    assert!(scene.actions().is_empty());

    tick(&mut scene, &mut world, 1.0, &left_click_at(Vec2::new(180.0, 50.0)));
    assert_eq!(scene.actions().active().len(), 2);
}

#[test]
fn arrow_light_is_pruned_when_arrow_hits_obstacle() {
    let mut tuning = empty_world_tuning();
    tuning.world.obstacles.push(ObstacleTuning {
        position: Vec2::new(0.0, 0.0),
        size: Size::new(64.0, 64.0),
    });
    let (mut scene, mut world) = loaded(tuning);
    let lights_before = light_count(&scene);

    tick(&mut scene, &mut world, 0.1, &left_click_at(Vec2::new(180.0, 50.0)));
    assert_eq!(light_count(&scene), lights_before + 1);
    let arrow_id = scene
        .actions()
        .active()
        .iter()
        .find(|action| action.kind() == ActionKind::Arrow)
        .map(|action| action.entity_id())
        .expect("arrow");

    advance(&mut scene, &mut world, 0.12, 30);

    assert!(world.find_entity(arrow_id).is_none());
    assert_eq!(light_count(&scene), lights_before);
    let stats = scene.lighting().expect("lighting").stats();
    assert!(stats.lights_pruned_total >= 1);
}

#[test]
fn wolf_pack_enrages_until_player_death() {
    let mut tuning = empty_world_tuning();
    tuning.world.den_position = Some(Vec2::new(400.0, -600.0));
    let (mut scene, mut world) = loaded(tuning);
    let members = *scene.pack().expect("pack").members();

    world
        .find_entity_mut(members[2])
        .and_then(|entity| entity.combatant.as_mut())
        .expect("wolf")
        .health
        .apply_damage(25);
    tick(&mut scene, &mut world, 0.1, &idle_input());

    assert!(scene.pack().expect("pack").protect_mode());
    assert!(world
        .iter_category(EntityCategory::Enemy)
        .all(|wolf| wolf.combatant.is_some_and(|combatant| combatant.enraged)));
    assert!(scene
        .debug_title(&world)
        .expect("title")
        .contains("pack enraged"));

    let player = scene.player_mut().expect("player");
    player
        .vitals
        .take_damage(1_000, Timestamp::from_secs_f64(2.0));
    tick(&mut scene, &mut world, 2.0, &idle_input());

    let pack = scene.pack().expect("pack");
    assert!(!pack.protect_mode());
    assert_eq!(pack.baselines(), &[90, 90, 65, 90]);
    assert!(world
        .iter_category(EntityCategory::Enemy)
        .all(|wolf| wolf.combatant.is_some_and(|combatant| !combatant.enraged)));
    assert!(scene
        .debug_title(&world)
        .expect("title")
        .contains("You died"));
}

#[test]
fn zero_ambient_alpha_skips_lighting_work() {
    let mut tuning = empty_world_tuning();
    tuning.lighting.ambient_alpha = 0.0;
    let (mut scene, mut world) = loaded(tuning);

    advance(&mut scene, &mut world, 0.1, 3);

    let lighting = scene.lighting().expect("lighting");
    assert_eq!(lighting.stats().frames_composited, 0);
    assert_eq!(lighting.mask().width(), 0);
}

#[test]
fn lighting_mask_tracks_window_size() {
    let (mut scene, mut world) = loaded(empty_world_tuning());
    advance(&mut scene, &mut world, 0.1, 1);

    let lighting = scene.lighting().expect("lighting");
    assert_eq!(
        (lighting.mask().width(), lighting.mask().height()),
        WINDOW
    );
    assert_eq!(lighting.stats().lights_drawn_last_frame, 1);
}

#[test]
fn unload_clears_world_and_state() {
    let (mut scene, mut world) = loaded(GameTuning::default());
    scene.unload(&mut world);
    assert_eq!(world.entity_count(), 0);
    assert!(scene.player().is_none());
    assert_eq!(light_count(&scene), 0);
    assert!(scene.hud_bars().is_none());
}
