// SPDX-License-Identifier: MPL-2.0
//! `toastling` shows transient toast notifications inside an in-memory
//! document tree.
//!
//! A [`notifier::Notifier`] renders a single toast into a shared
//! [`dom::Document`], refreshes it in place and retires it on a deadline
//! schedule; [`service::AsyncNotifier`] drives those deadlines from a
//! tokio task. Presentation presets load from a TOML file via [`config`].

#![doc(html_root_url = "https://docs.rs/toastling/0.1.0")]

pub mod config;
pub mod dom;
pub mod error;
pub mod notifier;
pub mod service;
