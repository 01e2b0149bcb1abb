//! # Curriculum RAG
//!
//! Retrieval-and-generation core of a curriculum-aligned tutoring assistant.
//!
//! Given a question, a grade (1–12) and a subject, the service finds relevant
//! curriculum passages by semantic search (with result caching), fetches
//! their full text in a stable order, and asks a generative model for a
//! localized explanation. Independently, it scores arbitrary content against
//! Chilean curriculum standards with a weighted rubric.
//!
//! ## Architecture
//!
//! ```text
//!            ┌───────────────────────────────┐
//!            │      HTTP (axum) / CLI        │
//!            └──────────────┬────────────────┘
//!                           ▼
//!            ┌───────────────────────────────┐
//!            │      CurriculumService        │
//!            │ search · fetch · generate ·   │
//!            │           validate            │
//!            └──┬──────┬──────┬──────┬────┬──┘
//!               ▼      ▼      ▼      ▼    ▼
//!           Embedder Generator Index Store Cache
//! ```
//!
//! The usual composition is search → fetch → generate, but every operation
//! is independent and keeps no in-process state between calls.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Request and result types |
//! | [`error`] | Error codes and the JSON error envelope |
//! | [`traits`] | Collaborator interfaces |
//! | [`service`] | The service object holding injected collaborators |
//! | [`search`] | Cached semantic search |
//! | [`fetch`] | Ordered batch document retrieval |
//! | [`generate`] | Prompted answer generation |
//! | [`validate`] | Rubric scoring and response parsing |
//! | [`prompt`] | Deterministic prompt builders |
//! | [`embedding`] | Embedding clients |
//! | [`generation`] | Generation clients |
//! | [`vector`] | Vector index variants |
//! | [`store`] | SQLite content store |
//! | [`cache`] | Result cache variants |
//! | [`import`] | Corpus import |
//! | [`server`] | HTTP server |

pub mod cache;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod generation;
mod http;
pub mod import;
mod input;
pub mod migrate;
pub mod models;
pub mod prompt;
pub mod search;
pub mod server;
pub mod service;
pub mod store;
pub mod traits;
pub mod validate;
pub mod vector;
