use super::{OutputFormat, TrackArgs};
use beatbridge::similarity::score_breakdown;
use beatbridge::Track;

fn to_track(args: &TrackArgs) -> Track {
    Track::new(args.name.as_str(), args.artist.as_str())
        .with_album(args.album.as_str())
        .with_duration_ms(args.duration_ms)
}

/// Handle the `score` command
pub fn handle_score(
    track: &TrackArgs,
    candidate: &TrackArgs,
    threshold: f64,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(format!("Threshold must be between 0 and 1, got {threshold}").into());
    }

    let track = to_track(track);
    let candidate = to_track(candidate);
    let breakdown = score_breakdown(&track, &candidate);
    let score = breakdown.value();
    let accepted = score >= threshold;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "track": track,
                "candidate": candidate,
                "score": score,
                "credited_weight": breakdown.credited,
                "applicable_weight": breakdown.applicable,
                "threshold": threshold,
                "accepted": accepted,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("🎵 {track}");
            println!("🎯 {candidate}");
            println!(
                "📊 Score: {score:.3} ({:.2} of {:.2} applicable weight)",
                breakdown.credited, breakdown.applicable
            );
            if accepted {
                println!("✅ Same recording at threshold {threshold}");
            } else {
                println!("❌ Different recordings at threshold {threshold}");
            }
        }
    }

    Ok(())
}
