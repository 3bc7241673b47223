//! Embedded static resources.
//!
//! - `serve::LIVERELOAD_SCRIPT` - client snippet injected into every HTML page
//! - `serve::PLACEHOLDER_HTML` - shown for the root index before it exists
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{PLACEHOLDER_HTML, PlaceholderVars};
//!
//! let html = PLACEHOLDER_HTML.render(&PlaceholderVars { index: "index.html".into(), root: ".".into() });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Subscribes to `/_has_update` and reloads on the first `'reload'` event.
    pub const LIVERELOAD_SCRIPT: &str = include_str!("serve/livereload.html");

    /// Variables for placeholder.html.
    pub struct PlaceholderVars {
        pub index: String,
        pub root: String,
    }

    impl TemplateVars for PlaceholderVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__INDEX__", &crate::utils::html::escape(&self.index))
                .replace("__ROOT__", &crate::utils::html::escape(&self.root))
        }
    }

    /// Page served for the root index document while it does not exist.
    pub const PLACEHOLDER_HTML: Template<PlaceholderVars> =
        Template::new(include_str!("serve/placeholder.html"));
}
