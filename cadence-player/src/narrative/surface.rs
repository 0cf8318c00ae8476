//! Narrative rendering surface
//!
//! The scroll synchroniser only needs two things from a surface: how far it
//! can scroll after laying out the text, and a way to set the position.

/// Where the narrative text is displayed
pub trait NarrativeSurface: Send {
    /// Lay out `lines` and return the scrollable height (content minus viewport)
    fn render(&mut self, lines: &[String]) -> f64;

    fn scroll_to(&mut self, position: f64);

    /// Current scroll position
    fn position(&self) -> f64;
}

/// Headless surface that measures text with fixed line metrics
#[derive(Debug, Clone)]
pub struct LineMetricsSurface {
    /// Characters per visual line before wrapping
    pub columns: usize,
    pub line_height: f64,
    pub viewport_height: f64,
    position: f64,
}

impl Default for LineMetricsSurface {
    fn default() -> Self {
        Self::new(48, 24.0, 240.0)
    }
}

impl LineMetricsSurface {
    pub fn new(columns: usize, line_height: f64, viewport_height: f64) -> Self {
        Self {
            columns: columns.max(1),
            line_height,
            viewport_height,
            position: 0.0,
        }
    }

    /// Visual lines occupied by one text line after wrapping
    fn wrapped_rows(&self, line: &str) -> usize {
        let chars = line.chars().count();
        chars.div_ceil(self.columns).max(1)
    }
}

impl NarrativeSurface for LineMetricsSurface {
    fn render(&mut self, lines: &[String]) -> f64 {
        let rows: usize = lines.iter().map(|l| self.wrapped_rows(l)).sum();
        let content = rows as f64 * self.line_height;
        self.position = 0.0;
        (content - self.viewport_height).max(0.0)
    }

    fn scroll_to(&mut self, position: f64) {
        self.position = position;
    }

    fn position(&self) -> f64 {
        self.position
    }
}
