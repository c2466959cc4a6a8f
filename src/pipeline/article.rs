//! Technical-article generation: two LLM calls and one illustration.
//!
//! The magazine's TECHNICAL ARTICLES section is written fresh for every
//! issue rather than copied from the source reports. A first call picks a
//! trending topic (the heading); a second writes the body for that heading.
//! The illustration comes from the configured [`ArticleImageSource`].
//!
//! There are no retries: a failed call fails the run before any output is
//! written, and the caller can simply run again.

use crate::config::{ArticleImageSource, GenerationConfig};
use crate::error::MagazineError;
use crate::pipeline::postprocess::{clean_article, clean_heading};
use crate::prompts::{
    article_prompt, image_prompt, ARTICLE_PROMPT_TEMPLATE, SYSTEM_PROMPT, TOPIC_PROMPT,
};
use crate::sections::SectionBundle;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const HF_ENDPOINT: &str = "https://router.huggingface.co/hf-inference/models";

/// File name of the generated illustration inside `article_image_dir`.
pub const ARTICLE_IMAGE_NAME: &str = "technical_article.png";

/// The generated article before it becomes a section bundle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratedArticle {
    pub heading: String,
    pub paragraphs: Vec<String>,
    pub image: Option<PathBuf>,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl GeneratedArticle {
    /// `text = [heading] ++ paragraphs`, no tables, at most one image.
    pub fn into_bundle(self) -> SectionBundle {
        let mut text = Vec::with_capacity(self.paragraphs.len() + 1);
        text.push(self.heading);
        text.extend(self.paragraphs);
        SectionBundle {
            text,
            tables: Vec::new(),
            images: self.image.into_iter().collect(),
        }
    }
}

/// Write the article with `provider` and fetch its illustration.
pub async fn generate_article(
    provider: &Arc<dyn LLMProvider>,
    config: &GenerationConfig,
) -> Result<GeneratedArticle, MagazineError> {
    info!("Writing technical article with {}", config.model_or_default());

    let topic_prompt = config.topic_prompt.as_deref().unwrap_or(TOPIC_PROMPT);
    let topic = chat(provider, "topic selection", topic_prompt, config).await?;
    let heading = clean_heading(&topic.content);
    if heading.is_empty() {
        return Err(MagazineError::LlmApiError {
            step: "topic selection",
            message: "model returned an empty heading".into(),
        });
    }
    info!("Article topic: {}", heading);

    let template = config
        .article_prompt
        .as_deref()
        .unwrap_or(ARTICLE_PROMPT_TEMPLATE);
    let body = chat(
        provider,
        "article writing",
        &article_prompt(template, &heading),
        config,
    )
    .await?;
    let paragraphs = clean_article(&body.content, &heading);
    debug!("Article: {} paragraphs", paragraphs.len());

    let image = article_image(config, &heading).await?;

    Ok(GeneratedArticle {
        heading,
        paragraphs,
        image,
        input_tokens: topic.prompt_tokens + body.prompt_tokens,
        output_tokens: topic.completion_tokens + body.completion_tokens,
    })
}

struct ChatReply {
    content: String,
    prompt_tokens: usize,
    completion_tokens: usize,
}

async fn chat(
    provider: &Arc<dyn LLMProvider>,
    step: &'static str,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<ChatReply, MagazineError> {
    let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
    let options = build_options(config);

    let call = provider.chat(&messages, Some(&options));
    let response = tokio::time::timeout(Duration::from_secs(config.api_timeout_secs), call)
        .await
        .map_err(|_| MagazineError::LlmTimeout {
            step,
            secs: config.api_timeout_secs,
        })?
        .map_err(|e| MagazineError::LlmApiError {
            step,
            message: e.to_string(),
        })?;

    debug!(
        "{}: {} input tokens, {} output tokens",
        step, response.prompt_tokens, response.completion_tokens
    );
    Ok(ChatReply {
        content: response.content,
        prompt_tokens: response.prompt_tokens,
        completion_tokens: response.completion_tokens,
    })
}

fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, MagazineError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        MagazineError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider`, used as-is.
/// 2. `config.provider_name` with the configured model.
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 4. OpenAI when `OPENAI_API_KEY` is set.
/// 5. [`ProviderFactory::from_env`] auto-detection.
pub async fn resolve_provider(
    config: &GenerationConfig,
) -> Result<Arc<dyn LLMProvider>, MagazineError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
        MagazineError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, or pass --provider/--model.\n\
                Error: {}",
                e
            ),
        }
    })?;

    Ok(llm_provider)
}

// ── Illustration ─────────────────────────────────────────────────────────

/// Inference URL for a Hugging Face model id.
pub fn hf_endpoint(model: &str) -> String {
    format!("{}/{}", HF_ENDPOINT, model.trim_matches('/'))
}

/// Fetch the article illustration according to `config.image_source`.
pub async fn article_image(
    config: &GenerationConfig,
    topic: &str,
) -> Result<Option<PathBuf>, MagazineError> {
    match config.image_source {
        ArticleImageSource::Disabled => Ok(None),
        ArticleImageSource::LocalDirectory => Ok(first_png(&config.article_image_dir)),
        ArticleImageSource::HuggingFace => {
            let key = hf_api_key()?;
            generate_hf_image(config, &key, topic).await.map(Some)
        }
    }
}

/// Fail early when the configured image source needs a missing credential.
pub fn check_image_credentials(config: &GenerationConfig) -> Result<(), MagazineError> {
    match config.image_source {
        ArticleImageSource::HuggingFace => hf_api_key().map(|_| ()),
        _ => Ok(()),
    }
}

fn hf_api_key() -> Result<String, MagazineError> {
    std::env::var("HF_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or(MagazineError::MissingCredential { var: "HF_API_KEY" })
}

/// First `*.png` in `dir` by file name, if the directory exists and has one.
pub fn first_png(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut pngs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    pngs.sort();
    pngs.into_iter().next()
}

async fn generate_hf_image(
    config: &GenerationConfig,
    api_key: &str,
    topic: &str,
) -> Result<PathBuf, MagazineError> {
    let url = hf_endpoint(&config.image_model);
    info!("Requesting article image from {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.image_timeout_secs))
        .build()
        .map_err(|e| MagazineError::ImageRequestFailed(e.to_string()))?;

    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&serde_json::json!({ "inputs": image_prompt(topic) }))
        .send()
        .await
        .map_err(|e| MagazineError::ImageRequestFailed(e.to_string()))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(MagazineError::ImageGenerationFailed {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MagazineError::ImageRequestFailed(e.to_string()))?;

    let dir = &config.article_image_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MagazineError::ImageDirFailed {
            path: dir.clone(),
            source: e,
        })?;
    let path = dir.join(ARTICLE_IMAGE_NAME);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| MagazineError::ImageDirFailed {
            path: path.clone(),
            source: e,
        })?;

    info!("Article image saved to {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_puts_heading_first() {
        let article = GeneratedArticle {
            heading: "Edge AI".into(),
            paragraphs: vec!["One.".into(), "Two.".into()],
            image: Some(PathBuf::from("a.png")),
            ..Default::default()
        };
        let bundle = article.into_bundle();
        assert_eq!(bundle.text, vec!["Edge AI", "One.", "Two."]);
        assert!(bundle.tables.is_empty());
        assert_eq!(bundle.images, vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn bundle_without_image_has_no_images() {
        let bundle = GeneratedArticle {
            heading: "Digital Twins".into(),
            ..Default::default()
        }
        .into_bundle();
        assert_eq!(bundle.text, vec!["Digital Twins"]);
        assert!(bundle.images.is_empty());
    }

    #[test]
    fn hf_endpoint_joins_model_id() {
        assert_eq!(
            hf_endpoint("stabilityai/stable-diffusion-xl-base-1.0"),
            "https://router.huggingface.co/hf-inference/models/stabilityai/stable-diffusion-xl-base-1.0"
        );
        assert_eq!(hf_endpoint("/org/model/"), format!("{HF_ENDPOINT}/org/model"));
    }

    #[test]
    fn first_png_is_sorted_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "c.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        assert_eq!(first_png(dir.path()), Some(dir.path().join("b.png")));
        assert_eq!(first_png(&dir.path().join("missing")), None);
    }

    #[tokio::test]
    async fn disabled_and_local_sources_need_no_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.png"), b"x").unwrap();

        let disabled = GenerationConfig::builder()
            .image_source(ArticleImageSource::Disabled)
            .build()
            .unwrap();
        assert_eq!(article_image(&disabled, "Edge AI").await.unwrap(), None);

        let local = GenerationConfig::builder()
            .image_source(ArticleImageSource::LocalDirectory)
            .article_image_dir(dir.path())
            .build()
            .unwrap();
        assert_eq!(
            article_image(&local, "Edge AI").await.unwrap(),
            Some(dir.path().join("cover.png"))
        );
    }

    #[test]
    fn build_options_uses_config() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(2048));
    }
}
