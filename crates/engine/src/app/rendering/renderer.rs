use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{Entity, EntityCategory, HudBars, RenderableKind, SceneWorld, Vec2};

use super::{world_to_screen_px, LightingCompositor, Viewport};

const CLEAR_COLOR: [u8; 4] = [38, 44, 36, 255];
const PLAYER_COLOR: [u8; 4] = [220, 220, 240, 255];
const ENEMY_COLOR: [u8; 4] = [150, 140, 130, 255];
const ENRAGED_ENEMY_COLOR: [u8; 4] = [210, 70, 60, 255];
const OBSTACLE_COLOR: [u8; 4] = [96, 92, 88, 255];
const PROJECTILE_COLOR: [u8; 4] = [255, 200, 120, 255];
const DECORATION_COLOR: [u8; 4] = [70, 58, 44, 255];
const POSE_MARKER_COLOR: [u8; 4] = [255, 255, 255, 255];
const POSE_MARKER_LENGTH_PX: f32 = 24.0;
const HUD_BAR_WIDTH_PX: i32 = 200;
const HUD_BAR_HEIGHT_PX: i32 = 12;
const HUD_MARGIN_PX: i32 = 16;
const HUD_BAR_GAP_PX: i32 = 6;
const HUD_BACKGROUND_COLOR: [u8; 4] = [20, 20, 24, 255];
const HUD_HEALTH_COLOR: [u8; 4] = [200, 40, 40, 255];
const HUD_MANA_COLOR: [u8; 4] = [60, 90, 220, 255];
const HUD_DEAD_COLOR: [u8; 4] = [90, 90, 90, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

pub struct Renderer {
    window: &'static Window,
    pixels: Pixels<'static>,
    viewport: Viewport,
    draw_order: Vec<usize>,
}

impl Renderer {
    pub fn new(window: &'static Window) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(window, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            draw_order: Vec::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(self.window, width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: &'static Window,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    /// Draws world entities, multiplies the light mask, then draws the HUD on top.
    pub(crate) fn render_world(
        &mut self,
        world: &SceneWorld,
        lighting: Option<&LightingCompositor>,
        hud: Option<HudBars>,
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        collect_draw_order(world, &mut self.draw_order);
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        for index in self.draw_order.iter().copied() {
            let entity = &world.entities()[index];
            draw_entity(frame, viewport, world, entity);
        }

        if let Some(lighting) = lighting {
            lighting.apply_to_frame(frame, viewport.width, viewport.height);
        }

        if let Some(hud) = hud {
            draw_hud_bars(frame, viewport, hud);
        }

        self.pixels.render()
    }
}

fn draw_layer(category: EntityCategory) -> u8 {
    match category {
        EntityCategory::Decoration => 0,
        EntityCategory::Obstacle => 1,
        EntityCategory::Enemy => 2,
        EntityCategory::Player => 3,
        EntityCategory::Projectile => 4,
    }
}

fn collect_draw_order(world: &SceneWorld, out: &mut Vec<usize>) {
    out.clear();
    out.extend(
        world
            .entities()
            .iter()
            .enumerate()
            .filter(|(_, entity)| entity.is_alive())
            .map(|(index, _)| index),
    );
    let entities = world.entities();
    out.sort_by_key(|index| {
        let entity = &entities[*index];
        (draw_layer(entity.category), entity.applied_spawn_order())
    });
}

fn entity_color(entity: &Entity) -> [u8; 4] {
    match entity.category {
        EntityCategory::Player => PLAYER_COLOR,
        EntityCategory::Enemy => {
            let enraged = entity.combatant.map_or(false, |combatant| combatant.enraged);
            if enraged {
                ENRAGED_ENEMY_COLOR
            } else {
                ENEMY_COLOR
            }
        }
        EntityCategory::Obstacle => OBSTACLE_COLOR,
        EntityCategory::Projectile => PROJECTILE_COLOR,
        EntityCategory::Decoration => DECORATION_COLOR,
    }
}

fn screen_rect_for_entity(
    entity: &Entity,
    world: &SceneWorld,
    viewport: Viewport,
) -> ScreenRectPx {
    let (left, top) = world_to_screen_px(entity.transform.position, world.camera(), viewport);
    ScreenRectPx {
        left,
        top,
        right: left + entity.size.w.round() as i32,
        bottom: top + entity.size.h.round() as i32,
    }
}

fn draw_entity(frame: &mut [u8], viewport: Viewport, world: &SceneWorld, entity: &Entity) {
    let rect = screen_rect_for_entity(entity, world, viewport);
    let color = entity_color(entity);
    match entity.renderable.kind {
        RenderableKind::Placeholder => fill_rect_clipped(frame, viewport, rect, color),
        RenderableKind::Sprite { .. } => {
            fill_rect_clipped(frame, viewport, rect, color);
            draw_rect_outline(frame, viewport, rect, POSE_MARKER_COLOR);
        }
    }

    if let Some(rotation) = entity.transform.rotation_radians {
        let (cx, cy) = world_to_screen_px(entity.center(), world.camera(), viewport);
        let tip = Vec2::new(
            cx as f32 + rotation.cos() * POSE_MARKER_LENGTH_PX,
            cy as f32 + rotation.sin() * POSE_MARKER_LENGTH_PX,
        );
        draw_line(
            frame,
            viewport,
            (cx, cy),
            (tip.x.round() as i32, tip.y.round() as i32),
            POSE_MARKER_COLOR,
        );
    }
}

fn draw_hud_bars(frame: &mut [u8], viewport: Viewport, hud: HudBars) {
    let left = HUD_MARGIN_PX;
    let health_top = HUD_MARGIN_PX;
    let mana_top = health_top + HUD_BAR_HEIGHT_PX + HUD_BAR_GAP_PX;
    let health_color = if hud.is_dead {
        HUD_DEAD_COLOR
    } else {
        HUD_HEALTH_COLOR
    };
    draw_bar(
        frame,
        viewport,
        left,
        health_top,
        hud.hit_points,
        hud.max_hit_points,
        health_color,
    );
    draw_bar(
        frame,
        viewport,
        left,
        mana_top,
        hud.mana,
        hud.max_mana,
        HUD_MANA_COLOR,
    );
}

fn bar_fill_width_px(value: u32, max: u32, width_px: i32) -> i32 {
    if max == 0 {
        return 0;
    }
    let ratio = value.min(max) as f32 / max as f32;
    (ratio * width_px as f32).round() as i32
}

fn draw_bar(
    frame: &mut [u8],
    viewport: Viewport,
    left: i32,
    top: i32,
    value: u32,
    max: u32,
    color: [u8; 4],
) {
    let background = ScreenRectPx {
        left,
        top,
        right: left + HUD_BAR_WIDTH_PX,
        bottom: top + HUD_BAR_HEIGHT_PX,
    };
    fill_rect_clipped(frame, viewport, background, HUD_BACKGROUND_COLOR);
    let fill = ScreenRectPx {
        right: left + bar_fill_width_px(value, max, HUD_BAR_WIDTH_PX),
        ..background
    };
    fill_rect_clipped(frame, viewport, fill, color);
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

/// Fills `[left, right) x [top, bottom)`, clipped to the viewport.
fn fill_rect_clipped(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(viewport.width as i32);
    let bottom = rect.bottom.min(viewport.height as i32);
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn draw_rect_outline(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let width = viewport.width as usize;
    for x in rect.left..rect.right {
        write_pixel_rgba_clipped(frame, width, x, rect.top, color);
        write_pixel_rgba_clipped(frame, width, x, rect.bottom - 1, color);
    }
    for y in rect.top..rect.bottom {
        write_pixel_rgba_clipped(frame, width, rect.left, y, color);
        write_pixel_rgba_clipped(frame, width, rect.right - 1, y, color);
    }
}

fn draw_line(
    frame: &mut [u8],
    viewport: Viewport,
    from: (i32, i32),
    to: (i32, i32),
    color: [u8; 4],
) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let steps = dx.abs().max(dy.abs()).max(1);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = from.0 as f32 + dx as f32 * t;
        let y = from.1 as f32 + dy as f32 * t;
        if y < 0.0 || y >= viewport.height as f32 {
            continue;
        }
        write_pixel_rgba_clipped(
            frame,
            viewport.width as usize,
            x.round() as i32,
            y.round() as i32,
            color,
        );
    }
}
