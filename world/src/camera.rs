//! Scrolling camera clamped to the map.

use glam::Vec2;
use skirmish_core::Viewport;

/// Camera presenting a window onto the battlefield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Camera {
    viewport: Viewport,
    pending: Vec2,
}

impl Camera {
    pub(crate) fn new(size: Vec2) -> Self {
        Self {
            viewport: Viewport {
                origin: Vec2::ZERO,
                size,
                scale: 1.0,
            },
            pending: Vec2::ZERO,
        }
    }

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Queues a scroll applied on the next update.
    pub(crate) fn scroll(&mut self, delta: Vec2) {
        self.pending += delta;
    }

    pub(crate) fn resize(&mut self, size: Vec2) {
        self.viewport.size = size.max(Vec2::ZERO);
    }

    /// Applies pending scroll and clamps the origin so the view stays within
    /// `margin` world units of the map edges.
    pub(crate) fn update(&mut self, map_size: Vec2, margin: f32) {
        let origin = self.viewport.origin + std::mem::take(&mut self.pending);
        let (view_min, view_max) = self.viewport.world_bounds();
        let view_size = view_max - view_min;

        let low = Vec2::splat(-margin);
        let high = map_size - view_size + Vec2::splat(margin);
        self.viewport.origin = Vec2::new(
            clamp_axis(origin.x, low.x, high.x, map_size.x, view_size.x),
            clamp_axis(origin.y, low.y, high.y, map_size.y, view_size.y),
        );
    }
}

fn clamp_axis(value: f32, low: f32, high: f32, map: f32, view: f32) -> f32 {
    if high < low {
        (map - view) / 2.0
    } else {
        value.clamp(low, high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_is_clamped_to_map_minus_margin() {
        let mut camera = Camera::new(Vec2::new(100.0, 100.0));
        camera.scroll(Vec2::new(-500.0, 50.0));
        camera.update(Vec2::new(400.0, 300.0), 20.0);
        assert_eq!(camera.viewport().origin, Vec2::new(-20.0, 50.0));

        camera.scroll(Vec2::new(1_000.0, 1_000.0));
        camera.update(Vec2::new(400.0, 300.0), 20.0);
        assert_eq!(camera.viewport().origin, Vec2::new(320.0, 220.0));
    }

    #[test]
    fn oversized_view_is_centred() {
        let mut camera = Camera::new(Vec2::new(500.0, 100.0));
        camera.scroll(Vec2::new(30.0, 0.0));
        camera.update(Vec2::new(200.0, 300.0), 10.0);
        assert_eq!(camera.viewport().origin.x, -150.0);
    }
}
