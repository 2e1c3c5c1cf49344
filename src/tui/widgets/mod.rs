//! TUI widgets

pub mod channels;
pub mod front_desk;
pub mod overview;
pub mod spinner;
pub mod tabs;

use ratatui::{buffer::Buffer, layout::Rect, style::Style};

/// Write `text` at offset (`dx`, `dy`) inside `area`, clipped to its width.
/// Offsets that fall outside `area` write nothing.
pub(crate) fn write_line(buf: &mut Buffer, area: Rect, dx: u16, dy: u16, text: &str, style: Style) {
    if dy >= area.height || dx >= area.width {
        return;
    }
    buf.set_stringn(
        area.x + dx,
        area.y + dy,
        text,
        usize::from(area.width - dx),
        style,
    );
}

/// Column offset that centers `text` in `area`
pub(crate) fn centered(area: Rect, text: &str) -> u16 {
    area.width.saturating_sub(text.chars().count() as u16) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_line_clips_and_skips() {
        let area = Rect::new(0, 0, 10, 2);
        let mut buf = Buffer::empty(area);

        write_line(&mut buf, area, 6, 0, "overflowing", Style::default());
        write_line(&mut buf, area, 0, 2, "below", Style::default());
        write_line(&mut buf, area, 10, 1, "right", Style::default());

        let row: String = (0..10).map(|x| buf[(x, 0)].symbol()).collect();
        assert_eq!(row, "      over");
        let second: String = (0..10).map(|x| buf[(x, 1)].symbol()).collect();
        assert_eq!(second.trim(), "");
    }

    #[test]
    fn test_centered_offset() {
        let area = Rect::new(5, 0, 20, 1);
        assert_eq!(centered(area, "abcd"), 8);
        assert_eq!(centered(area, &"x".repeat(30)), 0);
    }
}
