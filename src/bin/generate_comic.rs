use anyhow::{Context, Result, anyhow};
use clap::Parser;
use comicgen::cli::ProviderOptions;
use comicgen::config::{ProviderConfig, setup_logging};
use comicgen::constants::{CANVAS_SIZE, MAX_PANELS};
use comicgen::fetch::fetch_image_bytes;
use comicgen::model::Bubble;
use comicgen::overlay::Compositor;
use comicgen::pipeline::{ComicRequest, generate_comic};
use comicgen::prompt::ArtStyle;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Generate a comic page from the command line.
///
/// Minimal UX:
///   generate_comic "two robots share an umbrella" --panels 4
#[derive(Parser, Debug)]
#[command(name = "generate_comic")]
#[command(about = "Generate a comic page: prompt -> story -> image, with optional speech bubbles")]
struct Args {
    /// What the comic is about
    prompt: String,

    /// Drawing style: manga, comic or realistic
    #[arg(long, default_value_t = ArtStyle::Manga)]
    style: ArtStyle,

    /// Number of panels on the page
    #[arg(long)]
    panels: Option<usize>,

    /// JSON file with `{ "dialogues": [...], "thoughts": [...] }` to draw on the page
    #[arg(long)]
    bubbles: Option<PathBuf>,

    /// Where to write the PNG
    #[arg(long, short, default_value = "comic.png")]
    out: PathBuf,

    #[clap(flatten)]
    provider: ProviderOptions,

    /// Write the story JSON and the image prompt next to the output
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BubbleFile {
    dialogues: Vec<Bubble>,
    thoughts: Vec<Bubble>,
}

fn read_bubbles(path: &Path) -> Result<BubbleFile> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn debug_path(out: &Path, suffix: &str) -> PathBuf {
    let stem = out
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "comic".to_string());
    out.with_file_name(format!("{stem}.{suffix}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug).map_err(|err| anyhow!("Failed to set up logging: {err}"))?;

    if let Some(panels) = args.panels
        && !(1..=MAX_PANELS).contains(&panels)
    {
        return Err(anyhow!("--panels must be between 1 and {MAX_PANELS}"));
    }

    let bubbles = match args.bubbles.as_deref() {
        Some(path) => read_bubbles(path)?,
        None => BubbleFile::default(),
    };

    let http = reqwest::Client::new();
    let config = ProviderConfig::from(args.provider);
    if config.api_key.is_none() {
        return Err(anyhow!("OPENAI_API_KEY is required"));
    }
    let client = comicgen::openai::OpenAiClient::new(http.clone(), config);

    let page = generate_comic(
        &client,
        &ComicRequest {
            prompt: args.prompt,
            style: args.style,
            panels: args.panels,
        },
    )
    .await
    .context("Comic generation failed")?;

    if args.debug {
        fs::write(
            debug_path(&args.out, "story.json"),
            serde_json::to_vec_pretty(&page.story).unwrap_or_default(),
        )
        .ok();
        fs::write(debug_path(&args.out, "prompt.txt"), &page.scene_prompt).ok();
    }

    let source = fetch_image_bytes(&http, &page.image.url)
        .await
        .context("Failed to fetch generated image")?;

    let compositor = Compositor::with_system_fonts(CANVAS_SIZE);
    let png = compositor
        .compose_png(&source, &bubbles.dialogues, &bubbles.thoughts)
        .context("Failed to draw bubbles")?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&args.out, &png)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    eprintln!("Saved: {}", args.out.display());
    Ok(())
}
