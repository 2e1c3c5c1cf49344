//! Channel distribution widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use super::overview::bar_width;
use super::write_line;
use crate::types::ChannelShare;

const LABEL_WIDTH: u16 = 16;
const VALUE_WIDTH: u16 = 14;

const CHANNEL_COLORS: &[Color] = &[
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::Red,
    Color::LightCyan,
    Color::LightGreen,
];

/// Percentage of `total` held by `value`
pub fn share_pct(value: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        value as f64 * 100.0 / total as f64
    }
}

/// Reservations per channel over the lookback window
pub struct ChannelMix<'a> {
    channels: &'a [ChannelShare],
}

impl<'a> ChannelMix<'a> {
    pub fn new(channels: &'a [ChannelShare]) -> Self {
        Self { channels }
    }
}

impl Widget for ChannelMix<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width <= LABEL_WIDTH + VALUE_WIDTH {
            return;
        }

        write_line(
            buf,
            area,
            0,
            0,
            "Reservations by channel, last 30 days",
            Style::default().add_modifier(Modifier::BOLD),
        );

        if self.channels.is_empty() {
            write_line(
                buf,
                area,
                0,
                2,
                "No reservations in this period",
                Style::default().fg(Color::DarkGray),
            );
            return;
        }

        let total: u64 = self.channels.iter().map(|c| c.value).sum();
        let max = self.channels.iter().map(|c| c.value).max().unwrap_or(0);
        let bar_area = area.width - LABEL_WIDTH - VALUE_WIDTH;

        for (i, channel) in self.channels.iter().enumerate() {
            let y = area.y + 2 + i as u16;
            if y >= area.y + area.height {
                break;
            }

            let label: String = channel.label.chars().take(LABEL_WIDTH as usize - 1).collect();
            buf.set_string(area.x, y, &label, Style::default());

            let cells = bar_width(channel.value as i64, max as i64, bar_area);
            let color = CHANNEL_COLORS[i % CHANNEL_COLORS.len()];
            buf.set_string(
                area.x + LABEL_WIDTH,
                y,
                "█".repeat(cells as usize),
                Style::default().fg(color),
            );

            let value = format!("{:>4} {:>5.1}%", channel.value, share_pct(channel.value, total));
            let value_x = area.x + area.width - value.len() as u16;
            buf.set_string(value_x, y, &value, Style::default().fg(Color::DarkGray));
        }
    }
}
