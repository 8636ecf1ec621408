//! Client for the document repository's search and detail API.
//!
//! `GET {base}/search?q=..` returns a page of [`DocumentSummary`] items and
//! `GET {base}/detail?url=..` returns one [`DocumentDetail`]. Both wrap their
//! payload in `{ "status": "success", "data": ... }`; anything else is an
//! [`Error`].

pub mod client;
pub mod error;
pub mod types;

pub use {
    client::{RepositoryApi, RepositoryClient, UnconfiguredRepository},
    error::{Error, Result},
    types::{DocumentDetail, DocumentSummary, DownloadLink, Metadata, SearchResultSet},
};
