//! Terminal review actions.
//!
//! The host application is reached through [`ReviewHost`]; this module only
//! chooses what to ask of it. Store-listing launches try the store app
//! first and fall back to the web listing when no store app is installed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::LaunchError;

const STORE_APP_BASE: &str = "market://details";
const STORE_WEB_BASE: &str = "https://play.google.com/store/apps/details";

/// How a "rate now" is carried out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewLauncher {
    /// The platform's in-process review dialog.
    #[default]
    InApp,
    /// Open the app's store listing.
    StoreListing { package_name: String },
}

/// Who should handle an [`ReviewHost::open_uri`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriTarget {
    /// Only the store app; no generic handler.
    StoreApp,
    Browser,
}

/// Handle to the host UI.
#[async_trait]
pub trait ReviewHost: Send + Sync {
    /// Run the native review flow to completion.
    ///
    /// `Ok` means the flow finished, not that a dialog was shown.
    async fn launch_review_flow(&self) -> Result<(), LaunchError>;

    /// Open `uri`. Must return [`LaunchError::NotResolvable`] when nothing
    /// can handle it for `target`.
    async fn open_uri(&self, uri: &str, target: UriTarget) -> Result<(), LaunchError>;
}

/// Store-app deep link for `package_name`.
pub fn store_app_uri(package_name: &str) -> String {
    listing_uri(STORE_APP_BASE, package_name)
}

/// Web listing for `package_name`.
pub fn store_web_url(package_name: &str) -> String {
    listing_uri(STORE_WEB_BASE, package_name)
}

fn listing_uri(base: &str, package_name: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("id", package_name)
        .append_pair("showAllReviews", "true")
        .finish();
    format!("{base}?{query}")
}

impl ReviewLauncher {
    /// Run the action against `host`.
    pub async fn launch(&self, host: &dyn ReviewHost) -> Result<(), LaunchError> {
        match self {
            ReviewLauncher::InApp => {
                tracing::debug!("requesting in-app review flow");
                host.launch_review_flow().await
            }
            ReviewLauncher::StoreListing { package_name } => {
                let app_uri = store_app_uri(package_name);
                tracing::debug!(uri = %app_uri, "opening store listing");
                match host.open_uri(&app_uri, UriTarget::StoreApp).await {
                    Err(LaunchError::NotResolvable { .. }) => {
                        let web_url = store_web_url(package_name);
                        tracing::debug!(uri = %web_url, "store app not found, trying browser");
                        host.open_uri(&web_url, UriTarget::Browser).await
                    }
                    other => other,
                }
            }
        }
    }
}

/// Host for desktop applications.
///
/// There is no native review flow and no store app on the desktop, so only
/// the web listing can succeed. URIs are handed to the system opener.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopHost;

#[async_trait]
impl ReviewHost for DesktopHost {
    async fn launch_review_flow(&self) -> Result<(), LaunchError> {
        Err(LaunchError::Unsupported(
            "in-app review is not available on desktop".into(),
        ))
    }

    async fn open_uri(&self, uri: &str, target: UriTarget) -> Result<(), LaunchError> {
        match target {
            UriTarget::StoreApp => Err(LaunchError::NotResolvable {
                uri: uri.to_string(),
            }),
            UriTarget::Browser => {
                let owned = uri.to_string();
                tokio::task::spawn_blocking(move || open::that(&owned))
                    .await
                    .map_err(|e| LaunchError::Failed(e.to_string()))?
                    .map_err(|e| LaunchError::Failed(format!("{uri}: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeHost;

    #[test]
    fn listing_uris() {
        assert_eq!(
            store_app_uri("com.example.app"),
            "market://details?id=com.example.app&showAllReviews=true"
        );
        assert_eq!(
            store_web_url("com.example.app"),
            "https://play.google.com/store/apps/details?id=com.example.app&showAllReviews=true"
        );
    }

    #[test]
    fn package_name_is_encoded() {
        assert_eq!(
            store_web_url("a b&c"),
            "https://play.google.com/store/apps/details?id=a+b%26c&showAllReviews=true"
        );
    }

    #[tokio::test]
    async fn in_app_uses_native_flow() {
        let host = FakeHost::succeeding();
        ReviewLauncher::InApp.launch(&host).await.unwrap();
        assert_eq!(host.native_calls(), 1);
        assert!(host.opened().is_empty());
    }

    #[tokio::test]
    async fn store_listing_prefers_store_app() {
        let host = FakeHost::succeeding();
        let launcher = ReviewLauncher::StoreListing {
            package_name: "com.example.app".into(),
        };
        launcher.launch(&host).await.unwrap();

        assert_eq!(
            host.opened(),
            vec![(store_app_uri("com.example.app"), UriTarget::StoreApp)]
        );
    }

    #[tokio::test]
    async fn store_listing_falls_back_to_web() {
        let host = FakeHost::without_store_app();
        let launcher = ReviewLauncher::StoreListing {
            package_name: "com.example.app".into(),
        };
        launcher.launch(&host).await.unwrap();

        assert_eq!(
            host.opened(),
            vec![
                (store_app_uri("com.example.app"), UriTarget::StoreApp),
                (store_web_url("com.example.app"), UriTarget::Browser),
            ]
        );
    }

    #[tokio::test]
    async fn store_app_failure_does_not_fall_back() {
        let host = FakeHost::failing();
        let launcher = ReviewLauncher::StoreListing {
            package_name: "com.example.app".into(),
        };
        let err = launcher.launch(&host).await.unwrap_err();

        assert!(matches!(err, LaunchError::Failed(_)));
        assert_eq!(host.opened().len(), 1);
    }

    #[tokio::test]
    async fn desktop_has_no_store_app_or_native_flow() {
        let host = DesktopHost;
        assert!(matches!(
            host.launch_review_flow().await,
            Err(LaunchError::Unsupported(_))
        ));
        assert!(matches!(
            host.open_uri("market://details?id=x", UriTarget::StoreApp).await,
            Err(LaunchError::NotResolvable { .. })
        ));
    }

    #[test]
    fn launcher_config_shape() {
        let launcher: ReviewLauncher =
            toml::from_str("kind = \"store_listing\"\npackage_name = \"com.example.app\"")
                .unwrap();
        assert_eq!(
            launcher,
            ReviewLauncher::StoreListing {
                package_name: "com.example.app".into()
            }
        );
        let in_app: ReviewLauncher = toml::from_str("kind = \"in_app\"").unwrap();
        assert_eq!(in_app, ReviewLauncher::InApp);
    }
}
