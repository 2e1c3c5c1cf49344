//! Tab bar: view switcher on the left, hotel and business date on the right

use chrono::NaiveDate;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use super::write_line;

/// Dashboard views, bound to number keys 1-3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Channels,
    FrontDesk,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Channels => "Channels",
            Self::FrontDesk => "Front desk",
        }
    }

    pub fn all() -> &'static [Tab] {
        &[Tab::Overview, Tab::Channels, Tab::FrontDesk]
    }

    /// Tab bound to a number key, 1-based
    pub fn from_index(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::all().get(i).copied())
    }

    fn position(self) -> usize {
        Self::all().iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Next view, wrapping
    pub fn next(self) -> Self {
        let all = Self::all();
        all[(self.position() + 1) % all.len()]
    }

    /// Previous view, wrapping
    pub fn prev(self) -> Self {
        let all = Self::all();
        all[(self.position() + all.len() - 1) % all.len()]
    }
}

/// Right-hand caption: "hotel h-42 | Fri 10 May", plus an offline marker
pub fn status_caption(hotel_id: Option<&str>, today: Option<NaiveDate>, offline: bool) -> String {
    let mut parts = vec![format!("hotel {}", hotel_id.unwrap_or("all"))];
    if let Some(today) = today {
        parts.push(today.format("%a %d %b").to_string());
    }
    if offline {
        parts.push("OFFLINE".to_string());
    }
    parts.join(" | ")
}

pub struct TabBar {
    selected: Tab,
    caption: Option<String>,
}

impl TabBar {
    pub fn new(selected: Tab) -> Self {
        Self {
            selected,
            caption: None,
        }
    }

    pub fn caption(mut self, caption: String) -> Self {
        self.caption = Some(caption);
        self
    }
}

impl Widget for TabBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let mut x: u16 = 1;
        for (i, tab) in Tab::all().iter().enumerate() {
            let is_selected = *tab == self.selected;
            let label = format!("{} {}", i + 1, tab.label());
            let display = if is_selected {
                format!("[{}]", label)
            } else {
                label
            };

            let display_len = display.chars().count() as u16;
            if x + display_len > area.width {
                break;
            }

            let style = if is_selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            write_line(buf, area, x, 0, &display, style);
            x += display_len + 2;
        }

        // Caption only when it fits after the tabs
        if let Some(caption) = self.caption {
            let len = caption.chars().count() as u16;
            if x + len + 1 <= area.width {
                let style = if caption.ends_with("OFFLINE") {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                write_line(buf, area, area.width - len - 1, 0, &caption, style);
            }
        }
    }
}
