//! Hard navigation for the redirect refresh policy

use unidash_core::Navigator;

/// Navigates the whole tab through `window.location`
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, location: &str) {
        if let Err(err) = gloo::utils::window().location().set_href(location) {
            tracing::warn!(?err, %location, "navigation failed");
        }
    }
}
