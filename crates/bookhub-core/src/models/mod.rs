//! Data models for Bookhub entities.
//!
//! - `Book`: a library record as returned by `GET /books/`
//! - `NewBook`: the body of `POST /books/`

pub mod book;

pub use book::{Book, NewBook};
