//! Comic panel generation service: prompt sanitizing, story structuring,
//! scene prompt composition, speech bubble overlays and the bubble editor core.

#![allow(clippy::multiple_crate_versions)]
#![deny(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::disallowed_methods)]
#![deny(clippy::expect_used)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::panic)]
#![deny(clippy::perf)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::unreachable)]
#![deny(clippy::unwrap_used)]
#![deny(warnings)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod cli;
pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod fetch;
pub mod model;
pub mod openai;
pub mod overlay;
pub mod pipeline;
pub mod prompt;
pub mod sanitizer;
pub mod story;
pub mod web;
