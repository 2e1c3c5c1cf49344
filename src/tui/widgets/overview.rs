//! Overview layout widget

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::write_line;
use crate::services::aggregator::round_currency;
use crate::types::{Dashboard, NightlyRevenueShare};

/// Width reserved in front of each bar ("Mon 05-06 ")
const BAR_LABEL_WIDTH: u16 = 10;
/// Width reserved after each bar for the amount
const BAR_VALUE_WIDTH: u16 = 12;

/// Format a number with thousand separators (e.g., 1234567 -> "1,234,567")
pub fn format_number(n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let chars: Vec<char> = s.chars().collect();

    for (i, ch) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(*ch);
    }

    result
}

/// Format a money amount in whole units with separators
pub fn format_amount(amount: f64) -> String {
    let rounded = round_currency(amount);
    let formatted = format_number(rounded.unsigned_abs());
    if rounded < 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Bar length for `amount` when `max` fills `width` cells. Any positive
/// amount gets at least one cell.
pub fn bar_width(amount: i64, max: i64, width: u16) -> u16 {
    if amount <= 0 || max <= 0 || width == 0 {
        return 0;
    }
    let cells = (amount.min(max) as i128 * i128::from(width) / max as i128) as u16;
    cells.max(1)
}

/// Overview widget: KPI header and the trailing week of nightly revenue
pub struct Overview<'a> {
    dashboard: &'a Dashboard,
    currency: &'a str,
}

impl<'a> Overview<'a> {
    pub fn new(dashboard: &'a Dashboard, currency: &'a str) -> Self {
        Self {
            dashboard,
            currency,
        }
    }
}

impl Widget for Overview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::vertical([
            Constraint::Length(4), // KPIs
            Constraint::Length(1), // Section title
            Constraint::Min(7),    // Week bars
        ])
        .split(area);

        self.render_kpis(chunks[0], buf);
        write_line(
            buf,
            chunks[1],
            0,
            0,
            "Revenue, last 7 nights",
            Style::default().add_modifier(Modifier::BOLD),
        );
        WeekBars::new(&self.dashboard.week_series, self.dashboard.today).render(chunks[2], buf);
    }
}

impl Overview<'_> {
    fn render_kpis(&self, area: Rect, buf: &mut Buffer) {
        let kpi = &self.dashboard.kpi;
        let label = Style::default().fg(Color::DarkGray);

        let title = format!(
            "MTD revenue: {} {}",
            format_amount(kpi.mtd_revenue),
            self.currency
        );

        let occupancy = Line::from(vec![
            Span::styled("In-house ", label),
            Span::styled(kpi.in_house.to_string(), Style::default().fg(Color::Green)),
            Span::styled("  Arrivals ", label),
            Span::raw(kpi.arrivals.to_string()),
            Span::styled("  Departures ", label),
            Span::raw(kpi.departures.to_string()),
            Span::styled("  Occupancy ", label),
            Span::styled(
                format!("{}%", kpi.occupancy_today),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(format!(" of {} rooms", kpi.total_rooms), label),
        ]);

        let rates = Line::from(vec![
            Span::styled("MTD ADR ", label),
            Span::raw(format!("{:.2}", kpi.mtd_adr)),
            Span::styled("  MTD RevPAR ", label),
            Span::raw(format!("{:.2}", kpi.mtd_revpar)),
        ]);

        Paragraph::new(vec![
            Line::from(Span::styled(title, Style::default().fg(Color::Cyan))),
            occupancy,
            rates,
        ])
        .render(area, buf);
    }
}

/// Horizontal bar per night, today highlighted
pub struct WeekBars<'a> {
    series: &'a [NightlyRevenueShare],
    today: chrono::NaiveDate,
}

impl<'a> WeekBars<'a> {
    pub fn new(series: &'a [NightlyRevenueShare], today: chrono::NaiveDate) -> Self {
        Self { series, today }
    }
}

impl Widget for WeekBars<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width <= BAR_LABEL_WIDTH + BAR_VALUE_WIDTH || area.height == 0 {
            return;
        }

        let max = self.series.iter().map(|d| d.amount).max().unwrap_or(0);
        let bar_area = area.width - BAR_LABEL_WIDTH - BAR_VALUE_WIDTH;

        for (row, day) in self.series.iter().take(area.height as usize).enumerate() {
            let y = area.y + row as u16;
            let is_today = day.date == self.today;

            buf.set_string(
                area.x,
                y,
                day.date.format("%a %m-%d").to_string(),
                Style::default().fg(Color::DarkGray),
            );

            let cells = bar_width(day.amount, max, bar_area);
            let color = if is_today { Color::Cyan } else { Color::Green };
            buf.set_string(
                area.x + BAR_LABEL_WIDTH,
                y,
                "█".repeat(cells as usize),
                Style::default().fg(color),
            );

            let value = format_amount(day.amount as f64);
            let value_x = area.x + area.width - (value.len() as u16).min(BAR_VALUE_WIDTH);
            buf.set_string(value_x, y, &value, Style::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DashboardKpi, DashboardSource};
    use chrono::{Duration, NaiveDate};

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    // ========== format_number tests ==========

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0), "0");
    }

    #[test]
    fn test_format_number_small() {
        assert_eq!(format_number(999), "999");
    }

    #[test]
    fn test_format_number_thousand() {
        assert_eq!(format_number(1000), "1,000");
    }

    #[test]
    fn test_format_number_large() {
        assert_eq!(format_number(1234567), "1,234,567");
    }

    // ========== format_amount tests ==========

    #[test]
    fn test_format_amount_rounds() {
        assert_eq!(format_amount(1234.4), "1,234");
        assert_eq!(format_amount(2.5), "2");
        assert_eq!(format_amount(-1500.0), "-1,500");
    }

    // ========== bar_width tests ==========

    #[test]
    fn test_bar_width_scales_to_max() {
        assert_eq!(bar_width(100, 100, 40), 40);
        assert_eq!(bar_width(50, 100, 40), 20);
    }

    #[test]
    fn test_bar_width_small_amounts_visible() {
        assert_eq!(bar_width(1, 1_000_000, 40), 1);
    }

    #[test]
    fn test_bar_width_zero_cases() {
        assert_eq!(bar_width(0, 100, 40), 0);
        assert_eq!(bar_width(10, 0, 40), 0);
        assert_eq!(bar_width(10, 100, 0), 0);
    }

    // ========== render tests ==========

    #[test]
    fn test_overview_renders_kpis_and_week() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let week_series = (0..7)
            .map(|i| NightlyRevenueShare {
                date: today - Duration::days(6 - i),
                amount: i * 100,
            })
            .collect();
        let dashboard = Dashboard {
            today,
            kpi: DashboardKpi {
                in_house: 4,
                mtd_revenue: 12345.0,
                occupancy_today: 40,
                total_rooms: 10,
                ..Default::default()
            },
            week_series,
            channels: Vec::new(),
            arrivals: Vec::new(),
            departures: Vec::new(),
            source: DashboardSource::Computed,
        };

        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);
        Overview::new(&dashboard, "TRY").render(area, &mut buf);

        assert!(row(&buf, 0).contains("MTD revenue: 12,345 TRY"));
        assert!(row(&buf, 1).contains("In-house 4"));
        assert!(row(&buf, 1).contains("40% of 10 rooms"));
        assert!(row(&buf, 4).contains("Revenue, last 7 nights"));
        // Last bar row is today with the largest amount
        let last = row(&buf, 11);
        assert!(last.starts_with("Fri 05-10"));
        assert!(last.trim_end().ends_with("600"));
    }

    #[test]
    fn test_overview_short_areas() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let dashboard = Dashboard {
            today,
            kpi: DashboardKpi::default(),
            week_series: vec![NightlyRevenueShare { date: today, amount: 10 }],
            channels: Vec::new(),
            arrivals: Vec::new(),
            departures: Vec::new(),
            source: DashboardSource::Computed,
        };
        for height in 1..=4 {
            let area = Rect::new(0, 0, 80, height);
            let mut buf = Buffer::empty(area);
            Overview::new(&dashboard, "TRY").render(area, &mut buf);
            // Layout squeezes sections; every write must stay inside
            assert_eq!(buf.area, area);
        }
    }
}
