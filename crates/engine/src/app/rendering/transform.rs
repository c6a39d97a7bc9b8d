use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }
}

/// World pixels to screen pixels. Both spaces grow downward in y and the camera
/// position lands on the viewport center.
pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (f32, f32) {
    let center = viewport.center();
    (
        world.x - camera.position.x + center.x,
        world.y - camera.position.y + center.y,
    )
}

pub fn world_to_screen_px(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let (x, y) = world_to_screen(world, camera, viewport);
    (x.round() as i32, y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = Camera2D {
            position: Vec2::new(40.0, -20.0),
        };
        assert_eq!(
            world_to_screen_px(Vec2::new(40.0, -20.0), &camera, viewport),
            (400, 300)
        );
    }

    #[test]
    fn y_grows_downward_on_screen() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = Camera2D::default();
        let (_, above) = world_to_screen_px(Vec2::new(0.0, -10.0), &camera, viewport);
        let (_, below) = world_to_screen_px(Vec2::new(0.0, 10.0), &camera, viewport);
        assert_eq!(above, 290);
        assert_eq!(below, 310);
    }
}
