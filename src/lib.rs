//! # Advisory Post
//!
//! Drafts a LinkedIn advisory post from today's Indian market headlines and
//! emails it, keeping a copy on disk if the email cannot be sent.
//!
//! ## Usage
//!
//! ```sh
//! # GMAIL_USER, GMAIL_APP_PASSWORD, EMAIL_TO and OPENAI_KEY from the
//! # environment or a .env file
//! advisory_post
//! ```
//!
//! ## Architecture
//!
//! The application is a single forward pipeline:
//! 1. **Fetching**: Scrape up to ten headlines from the markets news page
//! 2. **Generating**: Ask an OpenAI-compatible model for the post (one request)
//! 3. **Delivering**: Email the post with fixed-delay retries; on total failure
//!    save it under `failed_posts/` for manual sending
//!
//! Everything runs sequentially on one thread. Stage failures are reported on
//! the console and the process still exits normally.

pub mod api;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod error;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod prompt;
pub mod scrapers;
pub mod utils;
