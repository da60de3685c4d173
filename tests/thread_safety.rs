use beatbridge::{
    BridgeConfig, CancellationState, CatalogProvider, MemoryCatalog, Platform, PlaylistTransfer,
    ProviderRegistry, Track, TrackMatcher,
};
use std::sync::Arc;

/// Test that the shared handles can move between tasks.
#[test]
fn test_handles_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<MemoryCatalog>();
    assert_send_sync::<ProviderRegistry>();
    assert_send_sync::<TrackMatcher>();
    assert_send_sync::<PlaylistTransfer>();
    assert_send_sync::<CancellationState>();
    assert_send_sync::<BridgeConfig>();
    assert_send_sync::<Arc<dyn CatalogProvider>>();
}

/// Test that provider futures are Send.
/// This ensures they can be spawned onto a multi-threaded runtime.
#[test_log::test(tokio::test)]
async fn test_provider_futures_are_send() {
    fn assert_send<T: Send>(_: T) {}

    let catalog = MemoryCatalog::new(Platform::Spotify);
    let query = Track::new("Test", "Artist");

    assert_send(catalog.fetch_playlist("playlist"));
    assert_send(catalog.search_track(&query));
    assert_send(catalog.create_playlist("name", "description", &[]));
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_catalog_shared_across_tasks() {
    let mut catalog = MemoryCatalog::new(Platform::AppleMusic);
    catalog.add_track(Track::new("Song", "Artist").with_platform_id(Platform::AppleMusic, "1"));
    let catalog = Arc::new(catalog);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let catalog = Arc::clone(&catalog);
        handles.push(tokio::spawn(async move {
            catalog
                .search_track(&Track::new("song", "artist"))
                .await
                .map(|found| found.is_some())
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }
}
