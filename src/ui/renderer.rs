use {
    super::layout::{render_layout, ChartOptions},
    crate::{pipeline::LoopStats, state::Snapshot},
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    ratatui::{backend::Backend, Terminal},
    std::time::Duration,
};

/// Default pause after each frame so the terminal can flush
pub const DEFAULT_RENDER_PAUSE: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "Render IO error: {}", e),
        }
    }
}

impl std::error::Error for RenderError {}

/// Something that can redraw the chart from a snapshot.
///
/// Returning from `render` means the frame is complete, pause included.
#[async_trait]
pub trait Render: Send {
    async fn render(&mut self, snapshot: &Snapshot, stats: &LoopStats) -> Result<(), RenderError>;
}

/// Grouped bar chart drawn on a long-lived ratatui terminal
pub struct ChartRenderer<B: Backend> {
    terminal: Terminal<B>,
    options: ChartOptions,
    pause: Duration,
    frames: u64,
    last_frame: Option<(Snapshot, LoopStats)>,
}

impl<B: Backend> ChartRenderer<B> {
    pub fn new(terminal: Terminal<B>, options: ChartOptions) -> Self {
        Self {
            terminal,
            options,
            pause: DEFAULT_RENDER_PAUSE,
            frames: 0,
            last_frame: None,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Draw one frame without the flush pause
    pub fn draw(&mut self, snapshot: &Snapshot, stats: &LoopStats) -> Result<(), RenderError> {
        let options = &self.options;
        self.terminal.draw(|f| {
            let area = f.size();
            render_layout(f, area, snapshot, stats, options);
        })?;
        self.frames += 1;
        self.last_frame = Some((snapshot.clone(), stats.clone()));
        Ok(())
    }

    /// Repaint the most recent frame, e.g. after a terminal resize
    pub fn redraw(&mut self) -> Result<(), RenderError> {
        if let Some((snapshot, stats)) = self.last_frame.take() {
            let result = self.draw(&snapshot, &stats);
            self.last_frame = Some((snapshot, stats));
            result?;
        }
        Ok(())
    }
}

#[async_trait]
impl<B: Backend + Send> Render for ChartRenderer<B> {
    async fn render(&mut self, snapshot: &Snapshot, stats: &LoopStats) -> Result<(), RenderError> {
        self.draw(snapshot, stats)?;
        tokio::time::sleep(self.pause).await;
        Ok(())
    }
}

/// Format the last insert time for the status line
pub fn format_update_time(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "N/A".to_string(),
    }
}
