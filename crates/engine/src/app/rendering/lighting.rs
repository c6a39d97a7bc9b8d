use std::f32::consts::TAU;

use tracing::trace;

use crate::app::{EntityId, SceneWorld, Timestamp, Vec2};

use super::{world_to_screen, Viewport};

const MASK_ALPHA: u8 = 255;

/// What a light follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightAnchor {
    Entity(EntityId),
    Fixed(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub u64);

/// Deterministic, time-driven modulation of a light's intensity and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flicker {
    pub intensity_amplitude: f32,
    pub radius_amplitude: f32,
    pub frequency_hz: f32,
    pub phase: f32,
}

impl Flicker {
    pub fn new(intensity_amplitude: f32, radius_amplitude: f32, frequency_hz: f32) -> Self {
        Self {
            intensity_amplitude,
            radius_amplitude,
            frequency_hz,
            phase: 0.0,
        }
    }

    pub fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    /// Two detuned sines mixed into [-1, 1].
    fn wave(&self, now: Timestamp) -> f32 {
        let t = now.as_secs_f64() as f32;
        let base = (TAU * self.frequency_hz * t + self.phase).sin();
        let detuned = (TAU * self.frequency_hz * 2.3 * t + self.phase + 1.3).sin();
        (base * 0.6 + detuned * 0.4).clamp(-1.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct LightSource {
    anchor: LightAnchor,
    offset: Vec2,
    radius: f32,
    color: [u8; 3],
    intensity: f32,
    flicker: Option<Flicker>,
    current_radius: f32,
    current_intensity: f32,
    removed: bool,
}

impl LightSource {
    pub fn new(anchor: LightAnchor, radius: f32, color: [u8; 3], intensity: f32) -> Self {
        let radius = sanitize_non_negative(radius);
        let intensity = sanitize_non_negative(intensity).min(1.0);
        Self {
            anchor,
            offset: Vec2::ZERO,
            radius,
            color,
            intensity,
            flicker: None,
            current_radius: radius,
            current_intensity: intensity,
            removed: false,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_flicker(mut self, flicker: Flicker) -> Self {
        self.flicker = Some(flicker);
        self
    }

    pub fn anchor(&self) -> LightAnchor {
        self.anchor
    }

    pub fn radius(&self) -> f32 {
        self.current_radius
    }

    pub fn intensity(&self) -> f32 {
        self.current_intensity
    }

    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn mark_removed(&mut self) {
        self.removed = true;
    }

    /// Advances time-based state such as flicker.
    pub fn update(&mut self, now: Timestamp) {
        match self.flicker {
            Some(flicker) => {
                let wave = flicker.wave(now);
                self.current_intensity =
                    (self.intensity * (1.0 + flicker.intensity_amplitude * wave)).clamp(0.0, 1.0);
                self.current_radius =
                    (self.radius * (1.0 + flicker.radius_amplitude * wave)).max(0.0);
            }
            None => {
                self.current_intensity = self.intensity;
                self.current_radius = self.radius;
            }
        }
    }

    /// World-space center, or `None` if the anchor entity is gone or flagged for removal.
    pub fn resolve_center(&self, world: &SceneWorld) -> Option<Vec2> {
        match self.anchor {
            LightAnchor::Fixed(point) => Some(point + self.offset),
            LightAnchor::Entity(id) => world
                .find_any(id)
                .filter(|entity| entity.is_alive())
                .map(|entity| entity.center() + self.offset),
        }
    }
}

/// Per-pixel RGBA multiplier sized to the viewport.
#[derive(Debug, Default)]
pub struct LightMask {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LightMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(self.rgba.get(offset..offset + 4)?);
        Some(out)
    }

    /// Reallocates only when the viewport size changed.
    fn ensure_size(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.rgba = vec![0; (width as usize) * (height as usize) * 4];
    }

    fn fill(&mut self, rgb: [u8; 3]) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk[0] = rgb[0];
            chunk[1] = rgb[1];
            chunk[2] = rgb[2];
            chunk[3] = MASK_ALPHA;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightingStats {
    pub frames_composited: u64,
    pub lights_drawn_last_frame: usize,
    pub lights_pruned_total: u64,
}

/// Owns the scene's light sources and rebuilds one illumination mask per frame.
///
/// The mask starts at the ambient factor `(1 - a) + a * ambient`, and each light
/// raises pixels toward its color with a lighten (per-channel max) blend. Every
/// light's contribution depends only on the ambient factor, so the result does not
/// depend on the order lights were added.
#[derive(Debug)]
pub struct LightingCompositor {
    ambient_color: [u8; 3],
    ambient_alpha: f32,
    lights: Vec<(LightId, LightSource)>,
    next_light_id: u64,
    mask: LightMask,
    stats: LightingStats,
}

impl Default for LightingCompositor {
    fn default() -> Self {
        Self::new([0, 0, 0], 1.0)
    }
}

impl LightingCompositor {
    pub fn new(ambient_color: [u8; 3], ambient_alpha: f32) -> Self {
        Self {
            ambient_color,
            ambient_alpha: sanitize_alpha(ambient_alpha),
            lights: Vec::new(),
            next_light_id: 0,
            mask: LightMask::default(),
            stats: LightingStats::default(),
        }
    }

    pub fn ambient_color(&self) -> [u8; 3] {
        self.ambient_color
    }

    pub fn ambient_alpha(&self) -> f32 {
        self.ambient_alpha
    }

    pub fn set_ambient(&mut self, ambient_color: [u8; 3], ambient_alpha: f32) {
        self.ambient_color = ambient_color;
        self.ambient_alpha = sanitize_alpha(ambient_alpha);
    }

    pub fn add_light_source(&mut self, light: LightSource) -> LightId {
        let id = LightId(self.next_light_id);
        self.next_light_id = self.next_light_id.saturating_add(1);
        self.lights.push((id, light));
        id
    }

    pub fn light(&self, id: LightId) -> Option<&LightSource> {
        self.lights
            .iter()
            .find(|(light_id, _)| *light_id == id)
            .map(|(_, light)| light)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut LightSource> {
        self.lights
            .iter_mut()
            .find(|(light_id, _)| *light_id == id)
            .map(|(_, light)| light)
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    pub fn mask(&self) -> &LightMask {
        &self.mask
    }

    pub fn stats(&self) -> LightingStats {
        self.stats
    }

    fn ambient_factor(&self) -> [f32; 3] {
        let a = self.ambient_alpha;
        self.ambient_color
            .map(|channel| (1.0 - a) + a * (channel as f32 / 255.0))
    }

    /// Rebuilds the mask for this frame. A zero ambient alpha skips everything,
    /// including pruning.
    pub fn update(&mut self, now: Timestamp, world: &SceneWorld, viewport: Viewport) {
        if self.ambient_alpha <= 0.0 {
            return;
        }

        self.mask.ensure_size(viewport.width, viewport.height);
        let ambient = self.ambient_factor();
        self.mask.fill(ambient.map(factor_to_byte));

        let mut drawn = 0usize;
        for index in (0..self.lights.len()).rev() {
            let center = {
                let (_, light) = &self.lights[index];
                if light.is_removed() {
                    None
                } else {
                    light.resolve_center(world)
                }
            };
            let Some(center) = center else {
                let (light_id, _) = self.lights.remove(index);
                self.stats.lights_pruned_total = self.stats.lights_pruned_total.saturating_add(1);
                trace!(light_id = light_id.0, "light_pruned");
                continue;
            };

            let (_, light) = &mut self.lights[index];
            light.update(now);
            let (sx, sy) = world_to_screen(center, world.camera(), viewport);
            draw_radial_glow(&mut self.mask, sx, sy, light, ambient);
            drawn += 1;
        }

        self.stats.frames_composited = self.stats.frames_composited.saturating_add(1);
        self.stats.lights_drawn_last_frame = drawn;
    }

    /// Multiplies the mask onto an RGBA frame of the same size. No-op while ambient
    /// alpha is zero or before the first composited frame.
    pub fn apply_to_frame(&self, frame: &mut [u8], width: u32, height: u32) {
        if self.ambient_alpha <= 0.0 {
            return;
        }
        if self.mask.width != width || self.mask.height != height {
            return;
        }
        if frame.len() != self.mask.rgba.len() {
            return;
        }
        for (pixel, factor) in frame
            .chunks_exact_mut(4)
            .zip(self.mask.rgba.chunks_exact(4))
        {
            for channel in 0..3 {
                pixel[channel] = multiply_channel(pixel[channel], factor[channel]);
            }
        }
    }
}

fn draw_radial_glow(
    mask: &mut LightMask,
    cx: f32,
    cy: f32,
    light: &LightSource,
    ambient: [f32; 3],
) {
    let radius = light.radius();
    let intensity = light.intensity();
    if radius <= 0.0 || intensity <= 0.0 || mask.width == 0 || mask.height == 0 {
        return;
    }
    let color = light.color().map(|channel| channel as f32 / 255.0);

    let x_min = (cx - radius).floor().max(0.0) as u32;
    let y_min = (cy - radius).floor().max(0.0) as u32;
    let x_max = ((cx + radius).ceil().max(0.0) as u32).min(mask.width);
    let y_max = ((cy + radius).ceil().max(0.0) as u32).min(mask.height);
    let width = mask.width as usize;

    for y in y_min..y_max {
        for x in x_min..x_max {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance >= radius {
                continue;
            }
            let strength = (intensity * (1.0 - distance / radius)).clamp(0.0, 1.0);
            let offset = ((y as usize) * width + x as usize) * 4;
            for channel in 0..3 {
                let lit = ambient[channel] + (color[channel] - ambient[channel]) * strength;
                let value = factor_to_byte(lit);
                let slot = &mut mask.rgba[offset + channel];
                if value > *slot {
                    *slot = value;
                }
            }
        }
    }
}

fn factor_to_byte(factor: f32) -> u8 {
    (factor.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn multiply_channel(value: u8, factor: u8) -> u8 {
    ((value as u16 * factor as u16 + 127) / 255) as u8
}

fn sanitize_alpha(alpha: f32) -> f32 {
    if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn sanitize_non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
