//! Backend that composites frames without presenting them.

use std::time::Duration;

use anyhow::{ensure, Result};
use tracing::{debug, info};

use crate::{Compositor, Presentation, RenderingBackend, Scene};

/// Rendering backend that runs a fixed number of frames off-screen.
///
/// Useful for batch simulations and for exercising the compositor in tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadlessBackend {
    frames: u32,
    frame_time: Duration,
}

impl HeadlessBackend {
    /// Creates a backend that renders `frames` frames spaced `frame_time` apart.
    #[must_use]
    pub const fn new(frames: u32, frame_time: Duration) -> Self {
        Self { frames, frame_time }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, &mut Scene),
    {
        ensure!(
            !self.frame_time.is_zero(),
            "headless frame time must be positive"
        );

        let Presentation {
            window_title,
            scene,
            ..
        } = presentation;
        let mut scene = scene;
        let mut compositor = Compositor::new();
        let mut commands = 0usize;

        for index in 0..self.frames {
            update_scene(self.frame_time, &mut scene);
            let frame = compositor.compose(&scene);
            commands += frame.commands.len();
            debug!(frame = index, commands = frame.commands.len(), "frame composited");
        }

        info!(
            title = %window_title,
            frames = self.frames,
            commands,
            "headless run finished"
        );
        Ok(())
    }
}
