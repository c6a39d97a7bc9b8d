mod lighting;
mod renderer;
mod transform;

pub use lighting::{
    Flicker, LightAnchor, LightId, LightMask, LightSource, LightingCompositor, LightingStats,
};
pub use renderer::Renderer;
pub use transform::{world_to_screen, world_to_screen_px, Viewport};
