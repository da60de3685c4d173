use super::OutputFormat;
use beatbridge::playlist_url::{detect_platform, validate_playlist_url};
use beatbridge::Platform;

/// Handle the `parse-url` command
pub fn handle_parse_url(
    url: &str,
    platform: Option<&str>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let platform = match platform {
        Some(tag) => tag.parse::<Platform>()?,
        None => detect_platform(url)
            .ok_or("Could not detect the platform; pass --platform explicitly")?,
    };

    let playlist_id = validate_playlist_url(url, platform)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "platform": platform,
                "playlist_id": playlist_id,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("🎧 Platform: {}", platform.display_name());
            println!("🆔 Playlist ID: {playlist_id}");
        }
    }

    Ok(())
}
