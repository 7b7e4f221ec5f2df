//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn rest_prefix() -> String {
        "wp-json".into()
    }

    pub fn api_namespace() -> String {
        "clutch/v1".into()
    }

    pub fn wp_namespace() -> String {
        "wp/v2".into()
    }
}

// ============================================================================
// [http] Section Defaults
// ============================================================================

pub mod http {
    pub fn timeout_secs() -> u64 {
        30
    }

    pub fn user_agent() -> String {
        concat!("clutch/", env!("CARGO_PKG_VERSION")).into()
    }
}

// ============================================================================
// [routing] Section Defaults
// ============================================================================

pub mod routing {
    use std::path::PathBuf;

    pub fn templates_file() -> Option<PathBuf> {
        None
    }
}

// ============================================================================
// Query Defaults
// ============================================================================

pub mod query {
    pub fn post_type() -> String {
        "post".into()
    }

    pub fn taxonomy() -> String {
        "category".into()
    }
}
