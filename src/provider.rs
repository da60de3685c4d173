use crate::{BridgeError, Platform, Playlist, Result, Track};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Catalog operations one streaming platform must offer to take part in a
/// transfer.
///
/// The matcher and transfer orchestrator are written against this trait
/// only. Each platform integration parses its raw API data into [`Track`] and
/// [`Playlist`] values inside its implementation; untyped data never crosses
/// this boundary.
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides
/// `MockCatalogProvider` that implements this trait using the `mockall`
/// library.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// The platform this provider talks to.
    fn platform(&self) -> Platform;

    /// Fetch a playlist with every track, in platform order.
    ///
    /// Pagination is the provider's concern: the returned playlist is fully
    /// hydrated. A missing playlist is reported as [`BridgeError::NotFound`].
    async fn fetch_playlist(&self, playlist_id: &str) -> Result<Playlist>;

    /// Find this platform's best single match for a neutral track.
    ///
    /// Implementations look the track up by ISRC first when it carries one,
    /// then fall back to a free-text search on name and artist. `Ok(None)` is
    /// the explicit "no result" answer.
    async fn search_track(&self, query: &Track) -> Result<Option<Track>>;

    /// Create a playlist holding the tracks that carry an ID for this
    /// platform, in the given order.
    ///
    /// Tracks without such an ID are skipped.
    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        tracks: &[Track],
    ) -> Result<Playlist>;
}

/// Runtime lookup of catalog providers by platform tag.
///
/// # Examples
///
/// ```rust
/// use beatbridge::{MemoryCatalog, Platform, ProviderRegistry};
/// use std::sync::Arc;
///
/// let mut registry = ProviderRegistry::new();
/// registry.register(Arc::new(MemoryCatalog::new(Platform::Spotify)));
///
/// assert!(registry.get(Platform::Spotify).is_ok());
/// assert!(registry.get(Platform::AppleMusic).is_err());
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Platform, Arc<dyn CatalogProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own platform tag, replacing any
    /// provider previously registered for that platform.
    pub fn register(&mut self, provider: Arc<dyn CatalogProvider>) {
        let platform = provider.platform();
        if self.providers.insert(platform, provider).is_some() {
            log::debug!("Replaced catalog provider for {platform}");
        }
    }

    /// The provider for `platform`.
    pub fn get(&self, platform: Platform) -> Result<Arc<dyn CatalogProvider>> {
        self.providers.get(&platform).cloned().ok_or_else(|| {
            BridgeError::ProviderUnavailable(format!(
                "No catalog provider registered for {}",
                platform.display_name()
            ))
        })
    }

    /// Registered platforms in tag order.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.providers.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_for(platform: Platform) -> Arc<dyn CatalogProvider> {
        let mut mock = MockCatalogProvider::new();
        mock.expect_platform().return_const(platform);
        Arc::new(mock)
    }

    #[test]
    fn test_registry_selects_by_platform() {
        let mut registry = ProviderRegistry::new();
        registry.register(mock_for(Platform::YoutubeMusic));
        registry.register(mock_for(Platform::Spotify));

        assert_eq!(
            registry.platforms(),
            vec![Platform::Spotify, Platform::YoutubeMusic]
        );
        assert_eq!(
            registry.get(Platform::YoutubeMusic).unwrap().platform(),
            Platform::YoutubeMusic
        );
    }

    #[test]
    fn test_missing_provider_is_fatal() {
        let registry = ProviderRegistry::new();
        let err = registry.get(Platform::AppleMusic).err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Apple Music"));
    }
}
