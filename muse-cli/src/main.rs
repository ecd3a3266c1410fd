//! Muse CLI - generate images, edits, videos and design inspiration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use muse::StudioConfig;
use muse::credential::{CredentialChain, CredentialGate, KeyStore};
use muse::gateway::{AspectRatio, ImageSize, Studio};
use muse::state::{AppState, CreativeWork};
use muse_cli::{TerminalSelector, Workbench};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Muse CLI - generative creative studio
#[derive(Parser, Debug)]
#[command(name = "muse")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Display name to sign in with
    #[arg(long, env = "MUSE_USER", default_value = "")]
    user: String,

    /// API key (otherwise GEMINI_API_KEY or API_KEY is used)
    #[arg(long)]
    api_key: Option<String>,

    /// Prompt for a key on the terminal when an operation requires a selected one
    #[arg(long)]
    select_key: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an image from a prompt
    Image {
        /// What to draw
        prompt: String,
        /// Output resolution (1K, 2K or 4K)
        #[arg(long, default_value_t = ImageSize::OneK)]
        size: ImageSize,
        /// Where to write the PNG
        #[arg(short, long, default_value = "muse-image.png")]
        output: PathBuf,
    },
    /// Edit an image with a natural-language instruction
    Edit {
        /// Source image
        input: PathBuf,
        /// What to change
        instruction: String,
        /// Where to write the PNG
        #[arg(short, long, default_value = "muse-edit.png")]
        output: PathBuf,
    },
    /// Animate a still image into a short video
    Video {
        /// First frame
        input: PathBuf,
        /// Frame shape (16:9 or 9:16)
        #[arg(long, default_value_t = AspectRatio::Landscape)]
        aspect: AspectRatio,
        /// Motion prompt
        #[arg(long)]
        prompt: Option<String>,
        /// Where to write the MP4
        #[arg(short, long, default_value = "muse-video.mp4")]
        output: PathBuf,
    },
    /// Search for design inspiration on a topic
    Inspire {
        /// The topic
        query: String,
        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("muse=debug,muse_cli=debug")
    } else {
        EnvFilter::new("muse=warn,muse_cli=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_work(work: &CreativeWork, output: &std::path::Path) {
    println!("Saved {:?} work {} -> {}", work.kind, work.id, output.display());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let store = KeyStore::new();
    if let Some(key) = &args.api_key {
        store.set(key);
    }
    let mut gate = CredentialGate::new(CredentialChain::from_env(store.clone()));
    if args.select_key {
        gate = gate.with_selector(Arc::new(TerminalSelector::new(store)));
    }

    let studio = Studio::from_config(StudioConfig::from_env()?, gate)?;
    let mut state = AppState::with_demo_works();
    let user = state.login(&args.user);
    tracing::info!(user = %user.name, "signed in");

    let mut bench = Workbench::new(studio, state);

    match args.command {
        Command::Image {
            prompt,
            size,
            output,
        } => {
            let work = bench.image(&prompt, size, &output).await?;
            print_work(work, &output);
        }
        Command::Edit {
            input,
            instruction,
            output,
        } => {
            let work = bench.edit(&input, &instruction, &output).await?;
            print_work(work, &output);
        }
        Command::Video {
            input,
            aspect,
            prompt,
            output,
        } => {
            let work = bench
                .video(&input, aspect, prompt.as_deref(), &output)
                .await?;
            print_work(work, &output);
        }
        Command::Inspire { query, json } => {
            let inspiration = bench.inspire(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&inspiration)?);
            } else {
                for (i, idea) in inspiration.ideas.iter().enumerate() {
                    println!("{}. {}\n   {}\n", i + 1, idea.title, idea.content);
                }
                if !inspiration.sources.is_empty() {
                    println!("Sources:");
                    for source in &inspiration.sources {
                        println!("  - {} <{}>", source.title, source.uri);
                    }
                }
            }
        }
    }

    println!("Feed now holds {} works.", bench.state().works().len());
    Ok(())
}
