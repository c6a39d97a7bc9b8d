pub mod app;

pub use app::{
    run_app, seconds_between, world_to_screen, world_to_screen_px, AppError, BoundingBox,
    Camera2D, Combatant, Entity, EntityCategory, EntityId, EntitySpec, Flicker, FrameTime, Health,
    HudBars, InputAction, InputSnapshot, LightAnchor, LightId, LightMask, LightSource,
    LightingCompositor, LightingStats, LoopConfig, LoopMetricsSnapshot, Padding, RenderableDesc,
    RenderableKind, Renderer, Scene, SceneCommand, SceneWorld, SimClock, Size, Timestamp,
    Transform, Vec2, Viewport, SLOW_FRAME_ENV_VAR,
};
