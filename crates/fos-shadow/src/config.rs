//! Overlay configuration

/// Configuration for a [`ShadowDom`](crate::ShadowDom)
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the initial document
    pub url: String,
    /// Flush passes `render_all_pending` runs before giving up on hosts
    /// that keep re-invalidating themselves
    pub max_render_passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            max_render_passes: 16,
        }
    }
}
