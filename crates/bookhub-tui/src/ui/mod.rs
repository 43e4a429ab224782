//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering, navigation bar, login form and overlays
//! - `books`: Book list and detail panes
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling

pub mod books;
pub mod input;
pub mod render;
pub mod styles;
