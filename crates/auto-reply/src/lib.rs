//! Inbound message processing: the glue between the chat transport, the
//! document repository and the summarizer.
//!
//! Flow: inbound message → [`classify`] → [`command::parse`] → [`Router`]
//! dispatch (inline reply, search into the [`ResultCache`], detail lookup, or a
//! [`DocumentPipeline`] run) → replies through the channel outbound.

pub mod cache;
pub mod classify;
pub mod command;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod render;
pub mod reply;

pub use {
    cache::ResultCache,
    classify::{ClassifiedMessage, QuotedMessage, classify},
    command::{Command, ParseError},
    error::{Error, ReferenceError, Result},
    notify::Notifier,
    pipeline::{DocumentInfo, DocumentPipeline, PipelineError, PipelineRequest},
    reply::{Router, RouterSettings},
};
