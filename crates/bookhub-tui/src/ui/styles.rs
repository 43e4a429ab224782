use ratatui::style::{Color, Modifier, Style};

// Color palette
pub const INK: Color = Color::Rgb(70, 130, 180);
pub const SHELF_GREEN: Color = Color::Rgb(96, 160, 96);
pub const BRASS: Color = Color::Rgb(200, 160, 72);
pub const WARNING: Color = Color::Rgb(210, 140, 60);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 44, 60);
pub const STATUS_BG: Color = Color::Rgb(32, 30, 40);

/// Copies at or below this count are shown as running low
const LOW_STOCK_COPIES: u32 = 1;

// Styles
pub fn title_style() -> Style {
    Style::default().fg(INK).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(BRASS)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(INK)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(STATUS_BG).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(BRASS)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Form input text; the focused field is underlined
pub fn input_style(focused: bool) -> Style {
    if focused {
        selected_style().add_modifier(Modifier::UNDERLINED)
    } else {
        list_item_style()
    }
}

/// Form submit button, dimmed while its request is in flight
pub fn button_style(focused: bool, busy: bool) -> Style {
    if busy {
        muted_style().add_modifier(Modifier::ITALIC)
    } else if focused {
        Style::default().fg(Color::Black).bg(INK).add_modifier(Modifier::BOLD)
    } else {
        list_item_style()
    }
}

/// Color for a book's copy count: out, low, in stock or unknown
pub fn availability_style(copies_available: Option<u32>) -> Style {
    match copies_available {
        Some(0) => error_style(),
        Some(n) if n <= LOW_STOCK_COPIES => Style::default().fg(WARNING),
        Some(_) => Style::default().fg(SHELF_GREEN),
        None => muted_style(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_style_by_stock() {
        assert_eq!(availability_style(Some(0)).fg, Some(ERROR));
        assert_eq!(availability_style(Some(1)).fg, Some(WARNING));
        assert_eq!(availability_style(Some(4)).fg, Some(SHELF_GREEN));
        assert_eq!(availability_style(None).fg, Some(MUTED));
    }

    #[test]
    fn test_busy_button_is_muted() {
        assert_eq!(button_style(true, true).fg, Some(MUTED));
        assert_eq!(button_style(true, false).bg, Some(INK));
    }
}
