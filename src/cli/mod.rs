use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{self, Config};
use crate::domain::track::{ServiceName, TrackDescriptor};
use crate::download::{
    Backends, Orchestrator, extractor::ExtractorBackend, soundcloud::SoundCloudBackend,
    tags::Id3Sink,
};
use crate::export::ExportReader;
use crate::extract::extract_tracks;
use crate::naming::NamingPolicy;

#[derive(Parser)]
#[command(name = "trackdig")]
#[command(version = "0.1")]
#[command(about = "Archive music shared in a chat export as tagged mp3 files")]
pub struct Cli {
    /// Path to an optional config TOML file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Channel to search and back up
    #[arg(long, default_value = "general")]
    pub channel: String,

    /// Path to the unzipped export
    pub export_path: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the tracks found in a channel, in download order
    List {
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Download and tag every track of a channel
    Download {
        #[command(flatten)]
        export: ExportArgs,

        /// Directory the files are written under
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How file names are built
        #[arg(long, value_enum)]
        naming: Option<NamingPolicy>,

        /// SoundCloud client id
        #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
        client_id: Option<String>,
    },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::List { export } => {
            let tracks = load_tracks(&export)?;
            for track in &tracks {
                print_track(track);
            }
            println!("---------------------------");
            println!("Extracted {} tracks", tracks.len());
        }

        Commands::Download {
            export,
            output,
            naming,
            client_id,
        } => {
            let client_id = client_id
                .or_else(|| cfg.soundcloud.client_id.clone())
                .filter(|id| !id.is_empty());
            let Some(client_id) = client_id else {
                bail!("Ensure CLIENT_ID is set with a SoundCloud client ID");
            };

            let backends = build_backends(&client_id, &cfg)?;
            let output = output.unwrap_or_else(|| cfg.output.root.clone());
            let naming = naming.unwrap_or(cfg.output.naming);

            let tracks = load_tracks(&export)?;
            let orchestrator = Orchestrator::new(&output, naming, backends, Id3Sink);

            let report = orchestrator.process(&export.channel, &tracks, |entry| {
                println!("{} - {}", entry.track_url, entry.outcome);
            });

            println!("---------------------------");
            println!("Extracted {} tracks", tracks.len());
            println!(
                "  downloaded: {}, already present: {}, skipped: {}, failed: {}, saved without tags: {}",
                report.downloaded(),
                report.already_present(),
                report.unsupported(),
                report.failed(),
                report.tag_failures()
            );
        }
    }

    Ok(())
}

fn load_tracks(export: &ExportArgs) -> anyhow::Result<Vec<TrackDescriptor>> {
    let reader = ExportReader::new(&export.export_path);
    extract_tracks(&reader, &export.channel).with_context(|| {
        format!(
            "Failed to extract tracks of #{} from {}",
            export.channel,
            export.export_path.display()
        )
    })
}

fn build_backends(client_id: &str, cfg: &config::Config) -> anyhow::Result<Backends> {
    let soundcloud = SoundCloudBackend::new(client_id, &cfg.soundcloud)
        .with_context(|| "Failed to set up the SoundCloud client")?;

    Ok(Backends::new()
        .with(ServiceName::SoundCloud, soundcloud)
        .with(ServiceName::YouTube, ExtractorBackend::new(&cfg.extractor)))
}

fn print_track(track: &TrackDescriptor) {
    let artist = if track.artist_name.is_empty() {
        String::new()
    } else {
        format!(" by {}", track.artist_name)
    };
    println!(
        "{} [{}] {}{} (shared by {})",
        track.date, track.service_name, track.track_name, artist, track.user_name
    );
    println!("    {}", track.track_url);
}
