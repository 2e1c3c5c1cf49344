//! Today's arrivals and departures

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use super::overview::format_amount;
use super::write_line;
use crate::types::{Dashboard, Reservation};

/// One list row: guest, rooms and nights, outstanding balance
pub fn format_row(r: &Reservation, width: usize) -> String {
    let detail = format!(
        "{}r {}n {:>9}",
        r.rooms,
        r.nights_total(),
        format_amount(r.balance())
    );
    let name_width = width.saturating_sub(detail.len() + 1);
    let name: String = r.guest_name.chars().take(name_width).collect();
    format!("{:<name_width$} {}", name, detail, name_width = name_width)
}

/// Side-by-side arrival and departure lists
pub struct FrontDesk<'a> {
    dashboard: &'a Dashboard,
}

impl<'a> FrontDesk<'a> {
    pub fn new(dashboard: &'a Dashboard) -> Self {
        Self { dashboard }
    }
}

impl Widget for FrontDesk<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .spacing(2)
                .areas(area);

        let kpi = &self.dashboard.kpi;
        render_list(
            left,
            buf,
            &format!("Arrivals ({} rooms)", kpi.arrivals),
            &self.dashboard.arrivals,
        );
        render_list(
            right,
            buf,
            &format!("Departures ({} rooms)", kpi.departures),
            &self.dashboard.departures,
        );
    }
}

fn render_list(area: Rect, buf: &mut Buffer, title: &str, rows: &[Reservation]) {
    if area.height == 0 || area.width < 20 {
        return;
    }

    write_line(buf, area, 0, 0, title, Style::default().add_modifier(Modifier::BOLD));

    if rows.is_empty() {
        write_line(buf, area, 0, 2, "None today", Style::default().fg(Color::DarkGray));
        return;
    }

    let visible = usize::from(area.height.saturating_sub(2));
    for (i, r) in rows.iter().take(visible).enumerate() {
        let line = format_row(r, usize::from(area.width));
        write_line(buf, area, 0, 2 + i as u16, &line, Style::default());
    }
}
