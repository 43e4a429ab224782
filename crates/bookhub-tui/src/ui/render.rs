use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, BookFormFocus, LoginFocus, Route};

use super::books;
use super::styles;

const APP_TITLE: &str = "  Learning & Wellbeing Hub";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Navigation bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_nav_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, app),
        AppState::AddingBook if app.route() == Route::Books => render_add_book_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        _ => {}
    }
}

fn render_nav_bar(frame: &mut Frame, app: &App, area: Rect) {
    let actions: &[(&str, &str)] = if app.session.is_authenticated() {
        &[("[a]", "dd book"), ("[u]", "pdate"), ("[l]", "ogout"), ("[?]", " Help")]
    } else {
        &[("[?]", " Help")]
    };

    let actions_width: usize = actions
        .iter()
        .map(|(key, desc)| key.len() + desc.len() + 2)
        .sum();

    let mut spans = vec![
        Span::styled(APP_TITLE, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(APP_TITLE.len() + actions_width + 2),
        )),
    ];
    for (key, desc) in actions {
        spans.push(Span::styled(*key, styles::help_key_style()));
        spans.push(Span::styled(format!("{}  ", desc), styles::muted_style()));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route() {
        Route::Books => books::render(frame, app, area),
        Route::Login => render_login_form(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.route() {
        Route::Books => "[j/k] select | [q]uit",
        Route::Login => "[tab] next field | [esc] quit",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None if app.session.is_loading() => " Loading... ".to_string(),
        None => match app.route() {
            Route::Books => format!(" {} books ", app.session.books().len()),
            Route::Login => " Not logged in ".to_string(),
        },
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

/// An input row: `label [value▌]`
fn input_line<'a>(label: &'a str, value: &str, focused: bool) -> Line<'a> {
    let style = styles::input_style(focused);
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{:<20}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool, busy_label: Option<&str>) -> Line<'static> {
    let text = match busy_label {
        Some(busy) => format!(" {} ", busy),
        None if focused => format!(" ▶ {} ◀ ", label),
        None => format!("   {}   ", label),
    };
    let style = styles::button_style(focused, busy_label.is_some());
    Line::from(vec![
        Span::raw("            ["),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn tail(value: &str, width: usize) -> String {
    let count = value.chars().count();
    value.chars().skip(count.saturating_sub(width)).collect()
}

fn render_login_form(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect_fixed(46, 12, area);
    frame.render_widget(Clear, area);

    let in_flight = app.login_in_progress();
    let password_masked = "*".repeat(app.login_password.chars().count().min(20));

    let mut lines = vec![
        Line::from(Span::styled("   Sign in to continue", styles::title_style())),
        Line::from(""),
        input_line(
            "Username: ",
            &tail(&app.login_username, 20),
            app.login_focus == LoginFocus::Username,
        ),
        input_line(
            "Password: ",
            &password_masked,
            app.login_focus == LoginFocus::Password,
        ),
        Line::from(""),
        button_line(
            "Login",
            app.login_focus == LoginFocus::Button,
            in_flight.then_some("Logging in..."),
        ),
    ];

    // Error message
    if let Some(error) = app.session.login_error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Login ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_add_book_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(50, 13, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        input_line(
            "Title:     ",
            &tail(&app.book_title, 20),
            app.book_focus == BookFormFocus::Title,
        ),
        input_line(
            "Author:    ",
            &tail(&app.book_author, 20),
            app.book_focus == BookFormFocus::Author,
        ),
        input_line(
            "Published: ",
            &app.book_published_date,
            app.book_focus == BookFormFocus::PublishedDate,
        ),
        Line::from(Span::styled("              (YYYY-MM-DD)", styles::muted_style())),
        Line::from(""),
        button_line(
            "Save",
            app.book_focus == BookFormFocus::Button,
            app.add_in_progress().then_some("Saving..."),
        ),
    ];

    if let Some(ref error) = app.book_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Add Book [esc] cancel ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(46, 14, frame.area());
    frame.render_widget(Clear, area);

    let entry = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("   {:<10}", key), styles::help_key_style()),
            Span::styled(desc, styles::help_desc_style()),
        ])
    };

    let mut lines = vec![Line::from("")];
    lines.extend(
        help_entries(app.session.is_authenticated())
            .iter()
            .map(|&(key, desc)| entry(key, desc)),
    );

    let block = Block::default()
        .title(" Help ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Key bindings for the current route. On the login form letters are
/// typed into the fields, so only non-character keys are listed.
fn help_entries(authenticated: bool) -> &'static [(&'static str, &'static str)] {
    if authenticated {
        &[
            ("j / ↓", "Next book"),
            ("k / ↑", "Previous book"),
            ("g / G", "First / last book"),
            ("PgDn/PgUp", "Scroll a page"),
            ("a", "Add a book"),
            ("u", "Reload books"),
            ("l", "Log out"),
            ("q", "Quit"),
            ("?", "Toggle help"),
        ]
    } else {
        &[
            ("Tab / ↓", "Next field"),
            ("S-Tab / ↑", "Previous field"),
            ("Enter", "Next field / log in"),
            ("Esc", "Quit"),
        ]
    }
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
