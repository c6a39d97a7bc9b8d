mod clock;
mod geometry;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use clock::{seconds_between, FrameTime, SimClock, Timestamp};
pub use geometry::{BoundingBox, Padding, Size, Vec2};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    world_to_screen, world_to_screen_px, Flicker, LightAnchor, LightId, LightMask, LightSource,
    LightingCompositor, LightingStats, Renderer, Viewport,
};
pub use scene::{
    Camera2D, Combatant, Entity, EntityCategory, EntityId, EntitySpec, Health, HudBars,
    InputSnapshot, RenderableDesc, RenderableKind, Scene, SceneCommand, SceneWorld, Transform,
};
