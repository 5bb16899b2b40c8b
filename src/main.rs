use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prompt_compositor::{BuildSettings, Prompt, Video, VideoFileName};

#[derive(Parser)]
#[command(
    name = "prompt-compositor",
    version,
    about = "Assemble short videos from text, image and audio prompts",
    long_about = "Prompt-Compositor builds a video from a prompt by chaining generation, interpolation, stitching, music, narration and subtitle stages, and names every artifact after the stages applied to it."
)]
struct Cli {
    /// Prompt text to generate the video from
    #[arg(short, long)]
    prompt: Option<String>,

    /// Image to animate instead of generating from text alone
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Extract keywords from the prompt before generating
    #[arg(long)]
    keywords: bool,

    /// Recorded audio of the prompt, used for subtitles and soundtrack
    #[arg(long)]
    recording: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for intermediate and final artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// File name given to the final video
    #[arg(long)]
    output_name: Option<String>,

    /// Interpolate generated clips
    #[arg(long)]
    interpolate: bool,

    /// Add generated background music
    #[arg(long)]
    music: bool,

    /// Read the prompt aloud over the video
    #[arg(long)]
    read_aloud: bool,

    /// Write subtitles from the recorded prompt
    #[arg(long)]
    subtitles: bool,

    /// Decode a video file name, print its fields and exit
    #[arg(long, value_name = "FILE_NAME")]
    check_name: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Some(name) = &cli.check_name {
        return check_name(name);
    }

    info!("Starting Prompt-Compositor v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut settings = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            BuildSettings::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            BuildSettings::default()
        }
    };

    apply_cli_overrides(&mut settings, &cli)?;
    settings.validate()?;

    let mut video = video_from_cli(&cli)?;
    info!("Build {} ({} video)", settings.id(), video.video_type());

    video.build(&settings).await.map_err(|e| {
        anyhow::anyhow!("{}", e.user_message())
    })?;

    match video.media_url() {
        Some(media) => info!("Video complete! Output saved to: {:?}", media),
        None => info!("Video complete, no media was produced"),
    }
    Ok(())
}

fn apply_cli_overrides(settings: &mut BuildSettings, cli: &Cli) -> Result<()> {
    if let Some(dir) = &cli.output_dir {
        settings.output_path = Some(dir.clone());
    }
    if let Some(name) = &cli.output_name {
        settings.output_video_file_name = Some(name.clone());
    }

    settings.interpolate |= cli.interpolate;
    settings.include_read_aloud_prompt |= cli.read_aloud;
    settings.include_audio_subtitles |= cli.subtitles;
    if cli.music {
        settings.music_building_context.apply_background_music = true;
        settings.music_building_context.generate_background_music = true;
    }

    if cli.prompt.is_some() || cli.recording.is_some() {
        let mut prompt = settings.prompt.take().unwrap_or_default();
        if let Some(text) = &cli.prompt {
            prompt.text = text.clone();
        }
        if let Some(recording) = &cli.recording {
            prompt.audio_recording = Some(recording.clone());
            settings.music_building_context.use_recorded_prompt_as_audio = true;
        }
        settings.prompt = Some(prompt);
    }

    Ok(())
}

fn video_from_cli(cli: &Cli) -> Result<Video> {
    let video = match (&cli.image, &cli.prompt) {
        (Some(image), text) => Video::raw_image(image, text.clone())?,
        (None, Some(text)) if cli.keywords => Video::prompt_based(Prompt::from_text(text.as_str())?)?,
        (None, Some(text)) => Video::raw_text(text.as_str())?,
        (None, None) => anyhow::bail!("Either --prompt or --image is required"),
    };
    Ok(video)
}

fn check_name(name: &str) -> Result<()> {
    let parsed = VideoFileName::parse(name)?;

    println!("title:      {}", parsed.title());
    println!("type:       {}", parsed.video_type());
    println!("features:   {}", parsed.features());
    match parsed.decoded_features() {
        Ok(features) => println!("            {:?}", features),
        Err(e) => println!("            ({})", e),
    }
    println!("build id:   {}", parsed.build_id());
    println!("build date: {}", parsed.build_date());
    println!("build time: {}", parsed.build_time());
    println!("unique id:  {}", parsed.unique_id());
    println!("extension:  {}", parsed.extension());
    Ok(())
}
