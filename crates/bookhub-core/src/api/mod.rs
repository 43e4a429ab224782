//! REST API client module for the Bookhub backend.
//!
//! This module provides the `ApiClient` for authenticating and fetching
//! book data. Requests carry a JWT bearer token; an expired token is
//! refreshed once per call through `/token/refresh/`.

pub mod client;
pub mod error;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ApiClient, RequestOptions};
pub use error::{ApiError, TransportError};
pub use transport::{HttpResponse, ReqwestTransport, RequestDescriptor, Transport};
