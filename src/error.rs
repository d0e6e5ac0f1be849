// SPDX-License-Identifier: MPL-2.0
use std::fmt;

/// Crate-wide error type.
///
/// Most of the widget surface is infallible by construction; the variants
/// here cover the few boundaries that can genuinely fail: markup parsing,
/// preset file handling, and talking to a driver task that has exited.
#[derive(Debug, Clone)]
pub enum Error {
    /// A markup fragment could not be parsed (render-html mode only).
    Markup(String),
    /// `update` was called while no live element exists.
    NotShown,
    /// A preset file could not be parsed or serialized.
    Config(String),
    /// A preset file could not be read or written.
    Io(String),
    /// The async driver task is no longer running.
    Stopped,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Markup(e) => write!(f, "Markup Error: {}", e),
            Error::NotShown => write!(f, "no live element: call show() first"),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Stopped => write!(f, "notifier task is not running"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Markup(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
