use std::time::Duration;

/// Render loop configuration.
#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Fixed frame period. `None` renders on every tick.
    pub delay: Option<Duration>,

    /// Color the drawable is cleared to before the render pass draws.
    pub clear_color: wgpu::Color,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            delay: None,
            clear_color: wgpu::Color::BLACK,
        }
    }
}

impl LoopOptions {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_clear_color(mut self, clear_color: wgpu::Color) -> Self {
        self.clear_color = clear_color;
        self
    }
}
