//! Prompts for the technical-article step.
//!
//! Keeping every prompt here means changing what the model is asked for is
//! a one-file edit, and tests can inspect the prompts without a live model.
//! Callers can override the text prompts through
//! [`crate::config::GenerationConfig`]; these constants are the defaults.

/// Step 1: pick a topic. The answer becomes the article heading.
pub const TOPIC_PROMPT: &str = "Select ONE recent and trending computer science topic (2023–2025) suitable for a college technical magazine.

Rules:
- Must be a current or emerging trend
- Avoid generic topics like 'Artificial Intelligence'
- Examples (do not copy directly):
  • Retrieval-Augmented Generation
  • Edge AI
  • Digital Twins
  • Zero Trust Security
  • Multimodal AI Systems

Return ONLY a short, clear heading (max 8 words).";

/// Step 2: write the article. `{heading}` is replaced with the topic.
pub const ARTICLE_PROMPT_TEMPLATE: &str = "Write a technical article for a college magazine on the topic:

'{heading}'

IMPORTANT RULES:
- Do NOT repeat the topic title
- Do NOT include headings or subheadings
- Do NOT use markdown formatting
- Start directly with the introduction paragraph

CONTENT REQUIREMENTS:
- 4 to 6 paragraphs
- Each paragraph should be well-developed (80–120 words)
- Explain concepts clearly with depth
- Discuss why the topic is trending now
- Mention real-world applications or systems
- Academic but easy-to-understand language
- Suitable for undergraduate readers
";

/// Illustration prompt for the image service. `{topic}` is replaced.
pub const IMAGE_PROMPT_TEMPLATE: &str = "Minimalist conceptual illustration representing the idea of {topic}. \
Clean and modern visual style, smooth shapes, soft lighting, \
abstract technological theme, professional academic look. \
Simple composition, neutral colors, white or light background. \
No text, no labels, no diagrams, no arrows, no people, no watermark.";

/// System message sent with both text calls.
pub const SYSTEM_PROMPT: &str =
    "You are a technical writer for a university department magazine. Answer with plain text only.";

/// Fill `{heading}` in an article prompt template.
pub fn article_prompt(template: &str, heading: &str) -> String {
    template.replace("{heading}", heading)
}

/// Fill `{topic}` in the image prompt template.
pub fn image_prompt(topic: &str) -> String {
    IMAGE_PROMPT_TEMPLATE.replace("{topic}", topic)
}
