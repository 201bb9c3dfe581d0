//! # caption-forge
//!
//! Social media caption and hashtag generation backed by a hosted LLM, with
//! tolerant reply parsing and a deterministic offline fallback.
//!
//! ## Features
//!
//! - **One capability interface** for completion providers, with adapters for
//!   OpenAI chat completions, Ollama and Gemini
//! - **Text or image input**: images are base64-encoded into the provider's
//!   multi-part message shape
//! - **Tolerant parsing**: JSON object, then `caption:` / `hashtags:` key
//!   patterns, then the raw reply as the caption
//! - **Always renderable**: network failures and empty replies resolve to a
//!   caption and hashtags drawn from a fixed local corpus, seeded so the same
//!   attempt always produces the same suggestion
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use caption_forge::{CaptionGenerator, GenerationRequest, ProviderSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ProviderSettings::from_env()?.build(reqwest::Client::new());
//!     let generator = CaptionGenerator::new(provider);
//!
//!     let request = GenerationRequest::text("sunrise hike above the clouds", "travel")
//!         .keywords("mountains, golden hour")
//!         .hashtag_count(8);
//!
//!     let result = generator.generate(&request).await?;
//!     println!("{}", result.clipboard_text());
//!     if let Some(note) = &result.error_note {
//!         eprintln!("note: {}", note);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Parsing Robustness
//!
//! ```rust
//! use caption_forge::parse_response;
//!
//! let parsed = parse_response(r##"{"caption": "Hello", "hashtags": ["#a"]}"##).unwrap();
//! assert_eq!(parsed.caption, "Hello");
//!
//! let parsed = parse_response("Sure! caption: Great day hashtags: [sun, beach]").unwrap();
//! assert_eq!(parsed.hashtags, vec!["#sun", "#beach"]);
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod resolver;
pub mod types;

pub use config::{ProviderKind, ProviderSettings};
pub use error::{GenerationError, Result};
pub use fallback::LocalCorpus;
pub use generator::CaptionGenerator;
pub use parser::{parse_response, strip_think_tags, ParseStrategy, ParsedResponse};
pub use prompt::{build_prompt, resolve_seed, EncodedImage, Prompt};
pub use providers::{CompletionProvider, GeminiProvider, OllamaProvider, OpenAiProvider};
pub use resolver::ResponseResolver;
pub use types::{GenerationMode, GenerationRequest, GenerationResult, ImageInput};
