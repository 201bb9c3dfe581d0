use caption_forge::{CaptionGenerator, GenerationRequest, ImageInput, ProviderSettings};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let first = args.next().unwrap_or_else(|| {
        eprintln!("Usage: generate <description | image path> [niche] [keywords] [hashtag count]");
        std::process::exit(1);
    });
    let niche = args.next().unwrap_or_else(|| "lifestyle".to_string());
    let keywords = args.next();
    let count = args.next().and_then(|c| c.parse().ok()).unwrap_or(10);

    let request = if Path::new(&first).is_file() {
        GenerationRequest::image(ImageInput::from_path(Path::new(&first))?).niche(niche)
    } else {
        GenerationRequest::text(first, niche)
    };
    let mut request = request.hashtag_count(count);
    if let Some(keywords) = keywords {
        request = request.keywords(keywords);
    }

    let settings = ProviderSettings::from_env()?;
    let generator = CaptionGenerator::new(settings.build(reqwest::Client::new()));
    println!("Generating with {:?}...", generator);

    let result = generator.generate(&request).await?;

    println!("\nCaption:\n  {}", result.caption);
    println!("\nHashtags ({}):\n  {}", result.hashtags.len(), result.hashtag_line());
    if result.needs_advisory() {
        if let Some(note) = &result.error_note {
            println!("\nNote: {}", note);
        }
    }

    Ok(())
}
