//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Network work is only queued here and runs
//! from the main loop after the next draw.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_book_field_char, can_add_date_char, can_add_password_char, can_add_username_char,
    App, AppState, BookFormFocus, LoginFocus, Route, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.route() {
        Route::Login => handle_login_input(app, key),
        Route::Books if app.state == AppState::AddingBook => {
            handle_add_book_input(app, key);
            Ok(false)
        }
        Route::Books => {
            handle_books_input(app, key);
            Ok(false)
        }
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password => app.login_focus = LoginFocus::Button,
            LoginFocus::Button => app.submit_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {
                if c == '?' {
                    app.state = AppState::ShowingHelp;
                }
            }
        },
        _ => {}
    }
    Ok(false)
}

fn handle_books_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('j') | KeyCode::Down => app.select_next(1),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(1),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Char('u') => {
            app.status_message = Some("Refreshing...".to_string());
            app.reload_books();
        }
        KeyCode::Char('a') => app.start_add_book(),
        KeyCode::Char('l') => app.logout(),
        KeyCode::Esc => app.status_message = None,
        _ => {}
    }
}

fn handle_add_book_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_add_book(),
        KeyCode::Down | KeyCode::Tab => app.book_focus = app.book_focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.book_focus = app.book_focus.prev(),
        KeyCode::Enter => match app.book_focus {
            BookFormFocus::Button => app.submit_add_book(),
            focus => app.book_focus = focus.next(),
        },
        KeyCode::Backspace => {
            if let Some(field) = focused_book_field(app) {
                field.pop();
            }
        }
        KeyCode::Char(c) => {
            let accept = match app.book_focus {
                BookFormFocus::Title => can_add_book_field_char(app.book_title.chars().count(), c),
                BookFormFocus::Author => {
                    can_add_book_field_char(app.book_author.chars().count(), c)
                }
                BookFormFocus::PublishedDate => {
                    can_add_date_char(app.book_published_date.len(), c)
                }
                BookFormFocus::Button => false,
            };
            if accept {
                if let Some(field) = focused_book_field(app) {
                    field.push(c);
                }
            }
        }
        _ => {}
    }
}

fn focused_book_field(app: &mut App) -> Option<&mut String> {
    match app.book_focus {
        BookFormFocus::Title => Some(&mut app.book_title),
        BookFormFocus::Author => Some(&mut app.book_author),
        BookFormFocus::PublishedDate => Some(&mut app.book_published_date),
        BookFormFocus::Button => None,
    }
}
