// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for the notifier configuration.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Content**: Placeholder message
//! - **Timing**: Auto-removal duration and the fade grace delay
//! - **Placement**: Default position classifier
//! - **Markup**: Class tokens and the element id prefix

// ==========================================================================
// Content Defaults
// ==========================================================================

/// Placeholder message shown when no message is configured.
pub const DEFAULT_MESSAGE: &str = "Woohoo, you rock!";

// ==========================================================================
// Timing Defaults
// ==========================================================================

/// Default time until a shown notification auto-removes itself (ms).
pub const DEFAULT_DURATION_MS: u64 = 3000;

/// Grace delay between the fade signal (opacity 0) and physical detachment
/// of the element from the tree (ms). During this window a `show` call
/// revives the element instead of creating a second one.
pub const FADE_GRACE_MS: u64 = 1000;

// ==========================================================================
// Placement Defaults
// ==========================================================================

/// Default position classifier, applied verbatim as class tokens.
pub const DEFAULT_POSITION: &str = "bottom right";

// ==========================================================================
// Markup Tokens
// ==========================================================================

/// Class carried by every notification root element.
pub const CONTAINER_CLASS: &str = "toastling-container";

/// Class carried by the message child element.
pub const MESSAGE_CLASS: &str = "toastling-message";

/// Class added to the root element when `is_error` is set.
pub const ERROR_CLASS: &str = "error";

/// Prefix for generated element ids (`toastling-<n>`).
pub const ID_PREFIX: &str = "toastling-";

/// Tag used for the root and message elements.
pub const ELEMENT_TAG: &str = "div";

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Timing validation
    assert!(DEFAULT_DURATION_MS > 0);
    assert!(FADE_GRACE_MS > 0);

    // Token validation: empty tokens would produce unstylable elements
    assert!(!DEFAULT_MESSAGE.is_empty());
    assert!(!DEFAULT_POSITION.is_empty());
    assert!(!CONTAINER_CLASS.is_empty());
    assert!(!MESSAGE_CLASS.is_empty());
    assert!(!ERROR_CLASS.is_empty());
    assert!(!ID_PREFIX.is_empty());
    assert!(!ELEMENT_TAG.is_empty());
};
