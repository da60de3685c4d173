mod common;

use beatbridge::{
    CancellationState, CatalogProvider, Platform, PlaylistTransfer, ProviderRegistry,
    TransferOptions,
};
use common::{apple_catalog, instant_config, spotify_catalog, SOURCE_PLAYLIST_ID};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[test_log::test(tokio::test)]
async fn test_end_to_end_transfer() {
    let spotify = spotify_catalog();
    let apple = apple_catalog();

    let result = PlaylistTransfer::new(instant_config())
        .run(&spotify, SOURCE_PLAYLIST_ID, &apple, &TransferOptions::default())
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(
        result.message,
        "Successfully created Apple Music playlist with 3 tracks. 1 tracks could not be found."
    );
    assert_eq!(result.total_tracks, 4);
    assert_eq!(result.matched_tracks, 3);
    assert_eq!(result.failed_tracks.len(), 1);
    assert_eq!(result.failed_tracks[0].name, "Some Obscure B-Side");
    assert_eq!(result.failed_tracks[0].artist, "Local Band");

    let created_id = result.destination_playlist_id.expect("playlist id");
    let created = apple.fetch_playlist(&created_id).await.unwrap();
    assert_eq!(created.name, "Today's Top Hits");
    assert_eq!(created.platform, Platform::AppleMusic);
    assert_eq!(created.description, "Transferred from Spotify");

    let ids: Vec<&str> = created
        .tracks
        .iter()
        .filter_map(|t| t.platform_id(Platform::AppleMusic))
        .collect();
    assert_eq!(ids, vec!["1499378615", "1538003843", "1485802967"]);

    // The source catalog is never modified
    let source = spotify.fetch_playlist(SOURCE_PLAYLIST_ID).await.unwrap();
    assert!(source
        .tracks
        .iter()
        .all(|t| !t.is_resolved_on(Platform::AppleMusic)));
}

#[tokio::test]
async fn test_transfer_through_registry() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(spotify_catalog()));
    registry.register(Arc::new(apple_catalog()));

    let options = TransferOptions::default().with_playlist_name("Hits, copied");
    let result = PlaylistTransfer::new(instant_config())
        .run_with_registry(
            &registry,
            Platform::Spotify,
            SOURCE_PLAYLIST_ID,
            Platform::AppleMusic,
            &options,
        )
        .await;

    assert!(result.success);
    let apple = registry.get(Platform::AppleMusic).unwrap();
    let created = apple
        .fetch_playlist(result.destination_playlist_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(created.name, "Hits, copied");
}

#[tokio::test]
async fn test_unreachable_destination_fails_without_playlist() {
    let spotify = spotify_catalog();
    let apple = apple_catalog();
    apple.set_available(false);

    let result = PlaylistTransfer::new(instant_config())
        .run(&spotify, SOURCE_PLAYLIST_ID, &apple, &TransferOptions::default())
        .await;

    assert!(!result.success);
    assert!(result.message.contains("Apple Music catalog is unreachable"));
    assert!(result.destination_playlist_id.is_none());
}

#[tokio::test]
async fn test_missing_source_playlist() {
    let result = PlaylistTransfer::new(instant_config())
        .run(
            &spotify_catalog(),
            "does-not-exist",
            &apple_catalog(),
            &TransferOptions::default(),
        )
        .await;

    assert!(!result.success);
    assert!(result.message.contains("not found"));
    assert_eq!(result.total_tracks, 0);
}

#[tokio::test]
async fn test_deadline_keeps_partial_progress() {
    let spotify = spotify_catalog();
    let apple = apple_catalog();
    let playlist = spotify.fetch_playlist(SOURCE_PLAYLIST_ID).await.unwrap();

    // The first search starts immediately; the second slot lies past the deadline
    let config = instant_config().with_request_delay(Duration::from_millis(500));
    let deadline = Instant::now() + Duration::from_millis(100);

    let result = PlaylistTransfer::new(config)
        .transfer_playlist(playlist, &apple, &TransferOptions::default(), Some(deadline))
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.matched_tracks, 1);
    assert_eq!(result.failed_tracks.len(), 3);
    assert!(result
        .failed_tracks
        .iter()
        .all(|f| f.reason == "Not attempted: transfer timed out"));
    assert!(result
        .message
        .ends_with("Transfer stopped early: 3 tracks were not attempted."));
}

#[tokio::test]
async fn test_cancelled_transfer_creates_nothing() {
    let cancellation = CancellationState::new();
    cancellation.cancel();

    let result = PlaylistTransfer::new(instant_config())
        .with_cancellation(cancellation)
        .run(
            &spotify_catalog(),
            SOURCE_PLAYLIST_ID,
            &apple_catalog(),
            &TransferOptions::default(),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "No tracks could be matched on Apple Music");
    assert_eq!(result.failed_tracks.len(), 4);
    assert_eq!(
        result.failed_tracks[0].reason,
        "Not attempted: transfer cancelled"
    );
}

#[tokio::test]
async fn test_sub_second_timeout_still_transfers() {
    let options = TransferOptions::default().with_timeout(Duration::from_millis(900));
    assert_eq!(options.timeout(), Some(Duration::from_millis(900)));

    let result = PlaylistTransfer::new(instant_config())
        .run(&spotify_catalog(), SOURCE_PLAYLIST_ID, &apple_catalog(), &options)
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.matched_tracks, 3);
    assert!(result
        .failed_tracks
        .iter()
        .all(|f| !f.reason.starts_with("Not attempted")));
}
