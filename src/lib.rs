//! # docqa
//!
//! A local document question-answering server with streamed, cited answers.
//!
//! docqa loads a directory of documents into memory, scores their pages
//! against natural-language questions, and streams back a synthesized
//! answer as an ordered sequence of typed events: status updates,
//! citations, text fragments, source attributions, and a completion marker.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌───────────┐
//! │ Documents │──▶│  Store   │──▶│  Scorer    │
//! │ pdf/txt/md│   │ per-page │   │ top-5     │
//! └───────────┘   └──────────┘   └────┬──────┘
//!                                     │
//!                ┌────────────────────┤
//!                ▼                    ▼
//!          ┌──────────┐        ┌───────────┐
//!          │ Generator │──────▶│ Pipeline   │
//!          │ gemini /  │       │ event     │
//!          │ template  │       │ stream    │
//!          └──────────┘        └────┬──────┘
//!                                   │
//!                    ┌──────────────┤
//!                    ▼              ▼
//!               ┌──────────┐  ┌──────────┐
//!               │   CLI    │  │   HTTP   │
//!               │  (dqa)   │  │  (SSE)   │
//!               └──────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dqa documents                  # list the loaded corpus
//! dqa search "deployment"        # score pages from the CLI
//! dqa ask "how do we deploy?"    # run the full pipeline to stdout
//! dqa serve                      # start the HTTP/SSE server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`extract`] | Per-page text extraction (PDF, plain text) |
//! | [`store`] | In-memory document cache with atomic reload |
//! | [`scorer`] | Page relevance scoring and excerpts |
//! | [`generate`] | Answer provider abstraction (Gemini, template) |
//! | [`events`] | Typed stream event union |
//! | [`pipeline`] | Ordered answer event stream |
//! | [`jobs`] | Bounded in-memory job registry |
//! | [`server`] | HTTP/SSE transport |

pub mod config;
pub mod events;
pub mod extract;
pub mod generate;
pub mod jobs;
pub mod pipeline;
pub mod scorer;
pub mod server;
pub mod store;
