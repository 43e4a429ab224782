use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use bookhub_core::Book;

use crate::app::App;
use crate::ui::styles;

/// Shown in place of the list when the backend returns no books
pub const EMPTY_BOOKS_MESSAGE: &str = "No books found.";

pub const LOADING_MESSAGE: &str = "Loading books...";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let view = ListView {
        books: app.session.books(),
        selection: app.book_selection,
        loading: app.session.is_loading(),
        error: app.session.error_message(),
    };
    render_book_list(frame, &view, chunks[0]);
    render_book_detail(frame, app.session.books().get(app.book_selection), chunks[1]);
}

/// What the list pane needs to draw itself
pub struct ListView<'a> {
    pub books: &'a [Book],
    pub selection: usize,
    pub loading: bool,
    pub error: Option<&'a str>,
}

pub fn render_book_list(frame: &mut Frame, view: &ListView, area: Rect) {
    let block = Block::default()
        .title(format!(" Available Books ({}) ", view.books.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut header: Vec<Line> = Vec::new();
    if view.loading {
        header.push(Line::from(Span::styled(LOADING_MESSAGE, styles::muted_style())));
    }
    if let Some(error) = view.error {
        header.push(Line::from(Span::styled(error.to_string(), styles::error_style())));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header.len() as u16), Constraint::Min(0)])
        .split(inner);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    if view.books.is_empty() {
        if !view.loading {
            let empty = Paragraph::new(Line::from(Span::styled(
                EMPTY_BOOKS_MESSAGE,
                styles::muted_style(),
            )));
            frame.render_widget(empty, chunks[1]);
        }
        return;
    }

    let items: Vec<ListItem> = view
        .books
        .iter()
        .enumerate()
        .map(|(i, book)| {
            let style = if i == view.selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(book.display_line())).style(style)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(view.selection.min(view.books.len() - 1)));

    frame.render_stateful_widget(List::new(items), chunks[1], &mut state);
}

fn render_book_detail(frame: &mut Frame, book: Option<&Book>, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(book) = book else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<12}", label), styles::highlight_style()),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        Line::from(Span::styled(book.title.clone(), styles::title_style())),
        Line::from(""),
        field("Author", book.author.clone()),
    ];
    if let Some(ref isbn) = book.isbn {
        lines.push(field("ISBN", isbn.clone()));
    }
    if let Some(date) = book.published_date {
        lines.push(field("Published", date.format("%b %d, %Y").to_string()));
    }
    if let Some(ref genre) = book.genre {
        lines.push(field("Genre", genre.clone()));
    }
    lines.push(Line::from(vec![
        Span::styled(format!("{:<12}", "Copies"), styles::highlight_style()),
        Span::styled(
            book.availability_display(),
            styles::availability_style(book.copies_available),
        ),
    ]));
    if let Some(ref summary) = book.summary {
        lines.push(Line::from(""));
        lines.push(Line::from(summary.clone()));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;

    fn book(id: i64, title: &str, author: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            isbn: None,
            published_date: None,
            copies_available: None,
            genre: None,
            summary: None,
            created_at: None,
        }
    }

    fn draw(view: &ListView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal
            .draw(|frame| render_book_list(frame, view, frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_empty_list_renders_empty_state() {
        let screen = draw(&ListView {
            books: &[],
            selection: 0,
            loading: false,
            error: None,
        });
        assert!(screen.contains(EMPTY_BOOKS_MESSAGE));
        assert!(screen.contains("Available Books (0)"));
    }

    #[test]
    fn test_loading_hides_empty_state() {
        let screen = draw(&ListView {
            books: &[],
            selection: 0,
            loading: true,
            error: None,
        });
        assert!(screen.contains(LOADING_MESSAGE));
        assert!(!screen.contains(EMPTY_BOOKS_MESSAGE));
    }

    #[test]
    fn test_books_render_in_order() {
        let books = vec![book(1, "Dune", "Frank Herbert"), book(2, "Emma", "Jane Austen")];
        let screen = draw(&ListView {
            books: &books,
            selection: 5,
            loading: false,
            error: None,
        });
        let dune = screen.find("Dune by Frank Herbert").expect("first book shown");
        let emma = screen.find("Emma by Jane Austen").expect("second book shown");
        assert!(dune < emma);
    }

    #[test]
    fn test_error_shown_with_empty_list() {
        let screen = draw(&ListView {
            books: &[],
            selection: 0,
            loading: false,
            error: Some("Network error. Please try again."),
        });
        assert!(screen.contains("Network error. Please try again."));
        assert!(screen.contains(EMPTY_BOOKS_MESSAGE));
    }
}
