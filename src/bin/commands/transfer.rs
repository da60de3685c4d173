use super::OutputFormat;
use beatbridge::events::{create_event_channel, TransferEvent};
use beatbridge::playlist_url::{detect_platform, validate_playlist_url};
use beatbridge::{BridgeConfig, CatalogProvider, MemoryCatalog, PlaylistTransfer, TransferResult};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;

/// Arguments of the `transfer` command
pub struct TransferRequest {
    pub source: PathBuf,
    pub playlist: String,
    pub destination: PathBuf,
    pub name: Option<String>,
    pub description: Option<String>,
    pub dedupe: bool,
    pub verify: bool,
    pub threshold: Option<f64>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
}

/// Resolve a share URL to a playlist ID; anything else is taken as an ID.
fn playlist_id(source: &MemoryCatalog, playlist: &str) -> beatbridge::Result<String> {
    if detect_platform(playlist).is_some() || playlist.contains("://") {
        validate_playlist_url(playlist, source.platform())
    } else {
        Ok(playlist.to_string())
    }
}

fn build_config(request: &TransferRequest) -> beatbridge::Result<BridgeConfig> {
    let mut config = BridgeConfig::resolve(request.config.as_deref())?;

    if let Some(threshold) = request.threshold {
        config.matching.acceptance_threshold = threshold;
    }
    if let Some(concurrency) = request.concurrency {
        config.matching.max_concurrent_searches = concurrency;
    }
    if request.verify {
        config.matching.verify_matches = true;
    }
    if request.dedupe {
        config.transfer.deduplicate = true;
    }
    if let Some(secs) = request.timeout_secs {
        config.transfer.timeout_ms = Some(secs.saturating_mul(1000));
    }
    if request.name.is_some() {
        config.transfer.playlist_name = request.name.clone();
    }
    if request.description.is_some() {
        config.transfer.description = request.description.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Print per-track progress lines until the transfer drops its sender
async fn print_progress(mut receiver: tokio::sync::broadcast::Receiver<TransferEvent>) {
    loop {
        match receiver.recv().await {
            Ok(TransferEvent::PlaylistFetched {
                playlist_name,
                track_count,
                platform,
                ..
            }) => {
                println!(
                    "📥 Read '{playlist_name}' from {} ({track_count} tracks)",
                    platform.display_name()
                );
            }
            Ok(TransferEvent::TrackMatched {
                index, name, artist, ..
            }) => println!("  ✅ {}. {name} by {artist}", index + 1),
            Ok(TransferEvent::TrackUnmatched {
                index,
                name,
                artist,
                reason,
                ..
            }) => println!("  ❌ {}. {name} by {artist}: {reason}", index + 1),
            Ok(TransferEvent::RateLimited { delay_seconds, .. }) => {
                println!("  ⏳ Rate limited, waiting {delay_seconds}s");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("Progress output lagged, {skipped} events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_result(result: &TransferResult) {
    println!();
    if result.success {
        println!("🎉 {}", result.message);
    } else {
        println!("❌ {}", result.message);
    }
    if let Some(url) = &result.destination_playlist_url {
        println!("🔗 {url}");
    }
    if result.total_tracks > 0 {
        println!(
            "📊 {}/{} tracks transferred ({:.1}%)",
            result.matched_tracks,
            result.total_tracks,
            result.success_rate()
        );
    }
    if !result.failed_tracks.is_empty() {
        println!("\nTracks not transferred:");
        for failed in &result.failed_tracks {
            println!("  - {} by {}: {}", failed.name, failed.artist, failed.reason);
        }
    }
}

/// Handle the `transfer` command
pub async fn handle_transfer(
    request: TransferRequest,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&request)?;
    let source = MemoryCatalog::load(&request.source)?;
    let destination = MemoryCatalog::load(&request.destination)?
        .with_match_threshold(config.matching.acceptance_threshold);
    let playlist_id = playlist_id(&source, &request.playlist)?;

    log::info!(
        "Transferring {playlist_id} from {} to {}",
        source.platform().display_name(),
        destination.platform().display_name()
    );

    let result = if format == OutputFormat::Text {
        let (sender, receiver) = create_event_channel();
        let printer = tokio::spawn(print_progress(receiver));

        let transfer = PlaylistTransfer::new(config.matching).with_events(sender);
        let result = transfer
            .run(&source, &playlist_id, &destination, &config.transfer)
            .await;
        drop(transfer);

        printer.await?;
        result
    } else {
        PlaylistTransfer::new(config.matching)
            .run(&source, &playlist_id, &destination, &config.transfer)
            .await
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_result(&result),
    }

    if result.success && !request.dry_run {
        destination.save(&request.destination)?;
        log::info!("Updated {}", request.destination.display());
    }

    if result.success {
        Ok(())
    } else {
        Err(result.message.into())
    }
}
