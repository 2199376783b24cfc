//! # mdviewer
//!
//! A local, single-user markdown viewer. Lists the markdown files under a
//! root directory, serves their raw content to a browser-side renderer,
//! searches their text, and keeps per-directory tags and "opened" flags in
//! `.mdviewer` sidecar files.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  HTTP (axum) │  server
//! └──────┬───────┘
//!        │ every path input
//!        ▼
//! ┌──────────────┐   ┌──────────┐ ┌──────────┐ ┌──────────┐
//! │ paths        │──▶│  index   │ │ metadata │ │  search  │
//! │ sanitize/join│   │ (walk)   │ │ sidecars │ │ (scan)   │
//! └──────────────┘   └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`paths`] | Path sanitization and containment |
//! | [`index`] | Markdown file listing |
//! | [`metadata`] | Sidecar tag/opened store |
//! | [`archive`] | Moving files into `.archive` |
//! | [`tags`] | Tag vocabulary and actions |
//! | [`search`] | Content search with context snippets |
//! | [`server`] | HTTP API and client shell |
//! | [`page`] | Client shell rendering |
//! | [`config`] | Configuration |
//! | [`error`] | Error taxonomy |

pub mod archive;
pub mod config;
pub mod error;
pub mod index;
pub mod metadata;
pub mod page;
pub mod paths;
pub mod search;
pub mod server;
pub mod tags;
