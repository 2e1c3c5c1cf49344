//! Loading indicator for a dashboard load
//!
//! Shows the animated frame with the current step out of the three load
//! stages, a pip row for progress, and the backend being contacted.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use super::{centered, write_line};
use crate::services::LoadStage;

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Load stages in the order the dashboard service reports them
const STAGES: [LoadStage; 3] = [
    LoadStage::Connecting,
    LoadStage::Fetching,
    LoadStage::Aggregating,
];

/// Status line for a dashboard load stage
pub fn stage_message(stage: LoadStage) -> &'static str {
    match stage {
        LoadStage::Connecting => "Connecting to backend...",
        LoadStage::Fetching => "Fetching reservations...",
        LoadStage::Aggregating => "Aggregating revenue...",
    }
}

/// 1-based position of `stage` among the load stages
pub fn stage_step(stage: LoadStage) -> usize {
    STAGES.iter().position(|s| *s == stage).map_or(1, |i| i + 1)
}

/// "● ● ○": finished and current stages filled
pub fn progress_pips(stage: LoadStage) -> String {
    let step = stage_step(stage);
    (1..=STAGES.len())
        .map(|i| if i <= step { "●" } else { "○" })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Spinner<'a> {
    frame: usize,
    stage: LoadStage,
    /// Backend host shown under the progress row
    target: Option<&'a str>,
}

impl<'a> Spinner<'a> {
    pub fn new(frame: usize, stage: LoadStage) -> Self {
        Self {
            frame,
            stage,
            target: None,
        }
    }

    pub fn target(mut self, target: &'a str) -> Self {
        self.target = Some(target);
        self
    }

    pub fn current_char(&self) -> char {
        SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()]
    }

    /// Advance to next frame, returning the new frame index
    pub fn next_frame(frame: usize) -> usize {
        (frame + 1) % SPINNER_FRAMES.len()
    }

    fn status_line(&self) -> String {
        format!(
            "{} [{}/{}] {}",
            self.current_char(),
            stage_step(self.stage),
            STAGES.len(),
            stage_message(self.stage)
        )
    }
}

impl Widget for Spinner<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width < 20 {
            return;
        }

        let mid = area.height / 2;
        let status = self.status_line();
        write_line(buf, area, centered(area, &status), mid, &status, Style::default().fg(Color::Cyan));

        let pips = progress_pips(self.stage);
        write_line(buf, area, centered(area, &pips), mid + 1, &pips, Style::default().fg(Color::Cyan));

        if let Some(target) = self.target {
            let line = format!("from {}", target);
            write_line(buf, area, centered(area, &line), mid + 2, &line, Style::default().fg(Color::DarkGray));
        }
    }
}
