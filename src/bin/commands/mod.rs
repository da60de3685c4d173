pub mod parse_url;
pub mod score;
pub mod transfer;

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One side of a `score` comparison
#[derive(Args, Debug, Clone)]
pub struct TrackArgs {
    /// Track title
    #[arg(long)]
    pub name: String,

    /// Primary artist
    #[arg(long)]
    pub artist: String,

    /// Album name
    #[arg(long, default_value = "")]
    pub album: String,

    /// Duration in milliseconds (0 for unknown)
    #[arg(long, default_value = "0")]
    pub duration_ms: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transfer a playlist between two catalogs
    ///
    /// Catalogs are JSON files holding a platform tag, its playlists and its
    /// searchable tracks. The destination playlist is written back into the
    /// destination catalog file unless --dry-run is given.
    ///
    /// Usage examples:
    /// # Transfer by playlist ID
    /// beatbridge transfer spotify.json 37i9dQZF1DX4sWSpwq3LiO apple.json
    ///
    /// # Transfer by share URL, dropping duplicates, under a new name
    /// beatbridge transfer spotify.json "https://open.spotify.com/playlist/37i9dQZF1DX4sWSpwq3LiO" apple.json --dedupe --name "Road Trip"
    ///
    /// # Reject provider results scoring under 0.9
    /// beatbridge transfer spotify.json 37i9dQZF1DX4sWSpwq3LiO apple.json --verify --threshold 0.9
    Transfer {
        /// Source catalog file
        source: PathBuf,

        /// Playlist ID or share URL on the source platform
        playlist: String,

        /// Destination catalog file
        destination: PathBuf,

        /// Name for the destination playlist (defaults to the source name)
        #[arg(long)]
        name: Option<String>,

        /// Description for the destination playlist
        #[arg(long)]
        description: Option<String>,

        /// Drop repeated title/artist pairs before matching
        #[arg(long)]
        dedupe: bool,

        /// Score provider results and reject those under the threshold
        #[arg(long)]
        verify: bool,

        /// Acceptance threshold between 0 and 1
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of searches in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Stop starting searches after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Config file (defaults to ~/.config/beatbridge/config.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Do not write the created playlist back to the destination catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Score how likely two tracks are the same recording
    ///
    /// Usage examples:
    /// # Same song, slightly different durations
    /// beatbridge score --name "Blinding Lights" --artist "The Weeknd" --duration-ms 200040 \
    ///     --candidate-name "Blinding Lights" --candidate-artist "The Weeknd" --candidate-duration-ms 201000
    Score {
        #[command(flatten)]
        track: TrackArgs,

        /// Candidate track title
        #[arg(long)]
        candidate_name: String,

        /// Candidate primary artist
        #[arg(long)]
        candidate_artist: String,

        /// Candidate album name
        #[arg(long, default_value = "")]
        candidate_album: String,

        /// Candidate duration in milliseconds (0 for unknown)
        #[arg(long, default_value = "0")]
        candidate_duration_ms: u64,

        /// Acceptance threshold to report against
        #[arg(long, default_value = "0.8")]
        threshold: f64,
    },

    /// Detect the platform of a playlist share URL and extract its ID
    ///
    /// Usage examples:
    /// beatbridge parse-url "https://music.apple.com/us/playlist/top-100-global/pl.d25f5d1181894928af76c85c967f8f31"
    ///
    /// # Check a link against a specific platform
    /// beatbridge parse-url "spotify:playlist:37i9dQZF1DX4sWSpwq3LiO" --platform spotify
    ParseUrl {
        /// Share URL or URI
        url: String,

        /// Platform to validate against (detected from the URL when omitted)
        #[arg(long)]
        platform: Option<String>,
    },
}

/// Execute the appropriate command handler based on the parsed command
pub async fn execute_command(
    command: Commands,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Transfer {
            source,
            playlist,
            destination,
            name,
            description,
            dedupe,
            verify,
            threshold,
            concurrency,
            timeout_secs,
            config,
            dry_run,
        } => {
            let request = transfer::TransferRequest {
                source,
                playlist,
                destination,
                name,
                description,
                dedupe,
                verify,
                threshold,
                concurrency,
                timeout_secs,
                config,
                dry_run,
            };
            transfer::handle_transfer(request, format).await
        }

        Commands::Score {
            track,
            candidate_name,
            candidate_artist,
            candidate_album,
            candidate_duration_ms,
            threshold,
        } => {
            let candidate = TrackArgs {
                name: candidate_name,
                artist: candidate_artist,
                album: candidate_album,
                duration_ms: candidate_duration_ms,
            };
            score::handle_score(&track, &candidate, threshold, format)
        }

        Commands::ParseUrl { url, platform } => {
            parse_url::handle_parse_url(&url, platform.as_deref(), format)
        }
    }
}
