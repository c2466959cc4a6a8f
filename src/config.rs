//! Configuration types for magazine generation.
//!
//! Every knob lives in [`GenerationConfig`], built via
//! [`GenerationConfigBuilder`] so callers set only what they care about and
//! rely on the documented defaults for the rest. Defaults reproduce the
//! department's usual run: `gpt-4.1` for the article, Stable Diffusion XL on
//! Hugging Face for the illustration, images under `temp_uploads/`, output
//! at `outputs/final_magazine.docx`.

use crate::error::MagazineError;
use crate::pipeline::layout::LayoutOptions;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used for the article when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Hugging Face text-to-image model used by default.
pub const DEFAULT_IMAGE_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";

/// Configuration for one magazine run.
///
/// # Example
/// ```rust
/// use automag::{ArticleImageSource, GenerationConfig};
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4.1-mini")
///     .image_source(ArticleImageSource::Disabled)
///     .output_path("out/magazine.docx")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model for the topic and article calls. None → [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for both text calls. Default: 0.7.
    ///
    /// Topic selection should vary between issues, so this is well above
    /// the near-zero values used for transcription work.
    pub temperature: f32,

    /// Maximum tokens per text call. Default: 2048.
    ///
    /// Six paragraphs of 120 words is roughly 1 000 tokens.
    pub max_tokens: usize,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Replaces [`crate::prompts::TOPIC_PROMPT`].
    pub topic_prompt: Option<String>,

    /// Replaces [`crate::prompts::ARTICLE_PROMPT_TEMPLATE`]; must contain `{heading}`.
    pub article_prompt: Option<String>,

    /// Skip the AI step; TECHNICAL ARTICLES stays empty. Default: false.
    pub skip_article: bool,

    /// Where the article illustration comes from. Default: Hugging Face.
    pub image_source: ArticleImageSource,

    /// Hugging Face model id for [`ArticleImageSource::HuggingFace`].
    pub image_model: String,

    /// Image request timeout in seconds. Default: 60.
    pub image_timeout_secs: u64,

    /// Directory the article image is written to (Hugging Face) or picked
    /// from (local). Default: `assets/technical_article_images`.
    pub article_image_dir: PathBuf,

    /// Scratch directory; extracted images go to `doc1_images/` and
    /// `doc2_images/` below it. Default: `temp_uploads`.
    pub work_dir: PathBuf,

    /// Display width of inserted images in inches. Range: 0.5–8.0. Default: 4.0.
    pub image_width_in: f64,

    /// Structure flattened rows of schema-bound sections into tables. Default: false.
    pub text_tables: bool,

    /// Tolerances for the layout table finder.
    pub layout: LayoutOptions,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Output DOCX path. Default: `outputs/final_magazine.docx`.
    pub output_path: PathBuf,

    /// Optional progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 2048,
            api_timeout_secs: 120,
            topic_prompt: None,
            article_prompt: None,
            skip_article: false,
            image_source: ArticleImageSource::default(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            image_timeout_secs: 60,
            article_image_dir: PathBuf::from("assets/technical_article_images"),
            work_dir: PathBuf::from("temp_uploads"),
            image_width_in: 4.0,
            text_tables: false,
            layout: LayoutOptions::default(),
            download_timeout_secs: 120,
            output_path: PathBuf::from("outputs/final_magazine.docx"),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("skip_article", &self.skip_article)
            .field("image_source", &self.image_source)
            .field("image_model", &self.image_model)
            .field("article_image_dir", &self.article_image_dir)
            .field("work_dir", &self.work_dir)
            .field("image_width_in", &self.image_width_in)
            .field("text_tables", &self.text_tables)
            .field("layout", &self.layout)
            .field("output_path", &self.output_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model name to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Directory images of source document `document` (1 or 2) are written to.
    pub fn image_dir_for(&self, document: usize) -> PathBuf {
        self.work_dir.join(format!("doc{document}_images"))
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl fmt::Debug for GenerationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn topic_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.topic_prompt = Some(prompt.into());
        self
    }

    pub fn article_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.article_prompt = Some(prompt.into());
        self
    }

    pub fn skip_article(mut self, v: bool) -> Self {
        self.config.skip_article = v;
        self
    }

    pub fn image_source(mut self, source: ArticleImageSource) -> Self {
        self.config.image_source = source;
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn image_timeout_secs(mut self, secs: u64) -> Self {
        self.config.image_timeout_secs = secs;
        self
    }

    pub fn article_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.article_image_dir = dir.into();
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn image_width_in(mut self, inches: f64) -> Self {
        self.config.image_width_in = inches.clamp(0.5, 8.0);
        self
    }

    pub fn text_tables(mut self, v: bool) -> Self {
        self.config.text_tables = v;
        self
    }

    pub fn layout(mut self, layout: LayoutOptions) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, MagazineError> {
        let c = &self.config;
        if let Some(ref prompt) = c.article_prompt {
            if !prompt.contains("{heading}") {
                return Err(MagazineError::InvalidConfig(
                    "article prompt must contain the {heading} placeholder".into(),
                ));
            }
        }
        if c.image_model.trim().is_empty() {
            return Err(MagazineError::InvalidConfig("image model must not be empty".into()));
        }
        if c.layout.min_columns < 2 || c.layout.min_rows < 2 {
            return Err(MagazineError::InvalidConfig(format!(
                "layout tables need at least 2 rows and 2 columns, got {}x{}",
                c.layout.min_rows, c.layout.min_columns
            )));
        }
        if c.output_path.as_os_str().is_empty() {
            return Err(MagazineError::InvalidConfig("output path must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where the technical article's illustration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArticleImageSource {
    /// Generate one with the Hugging Face inference API (needs `HF_API_KEY`). (default)
    #[default]
    HuggingFace,
    /// Use the first `*.png` (sorted by name) in `article_image_dir`, if any.
    LocalDirectory,
    /// No illustration.
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_run() {
        let c = GenerationConfig::default();
        assert_eq!(c.model_or_default(), "gpt-4.1");
        assert_eq!(c.image_source, ArticleImageSource::HuggingFace);
        assert_eq!(c.image_timeout_secs, 60);
        assert_eq!(c.download_timeout_secs, 120);
        assert_eq!(c.output_path, PathBuf::from("outputs/final_magazine.docx"));
        assert_eq!(c.image_dir_for(2), PathBuf::from("temp_uploads/doc2_images"));
        assert!(!c.text_tables);
    }

    #[test]
    fn setters_clamp() {
        let c = GenerationConfig::builder()
            .temperature(5.0)
            .image_width_in(20.0)
            .max_tokens(0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.image_width_in, 8.0);
        assert_eq!(c.max_tokens, 1);
    }

    #[test]
    fn article_prompt_needs_placeholder() {
        let err = GenerationConfig::builder()
            .article_prompt("Write about something")
            .build()
            .unwrap_err();
        assert!(matches!(err, MagazineError::InvalidConfig(_)));

        assert!(GenerationConfig::builder()
            .article_prompt("Write about {heading}")
            .build()
            .is_ok());
    }

    #[test]
    fn degenerate_layout_is_rejected() {
        let layout = LayoutOptions {
            min_columns: 1,
            ..LayoutOptions::default()
        };
        assert!(GenerationConfig::builder().layout(layout).build().is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let s = format!("{:?}", GenerationConfig::default());
        assert!(s.contains("GenerationConfig"));
        assert!(s.contains("image_model"));
    }
}
