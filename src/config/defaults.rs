//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn language() -> String {
        "en-US".into()
    }

    pub fn posts_per_page() -> usize {
        10
    }
}

// ============================================================================
// [content] Section Defaults
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn posts() -> PathBuf {
        "posts".into()
    }

    pub fn pages() -> PathBuf {
        "pages".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn production_port() -> u16 {
        3000
    }

    pub fn development_port() -> u16 {
        3001
    }

    pub fn debounce_ms() -> u64 {
        300
    }

    pub fn workers() -> usize {
        4
    }

    pub fn grace_ms() -> u64 {
        5000
    }
}
