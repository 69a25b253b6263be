//! Blog post composition.
//!
//! The whole [`ResearchBundle`] is embedded as pretty JSON in a prompt that
//! fixes the frontmatter, section layout, citation style and tone of the post.

use crate::api::{AskAsync, CompletionError, CompletionRequest, ask_timed};
use crate::config::ModelSettings;
use crate::models::ResearchBundle;
use tracing::{info, instrument};

pub const SYSTEM_PROMPT: &str = "You are an expert technical writer specializing in AI/ML/Data Science. Write comprehensive, well-researched blog posts with proper citations. Target audience: data scientists, ML engineers, technical hiring managers. Style: professional, factual, engaging, accessible.";

/// Build the composition prompt for `bundle`.
pub fn compose_prompt(bundle: &ResearchBundle) -> String {
    let bundle_json = serde_json::to_string_pretty(bundle).unwrap_or_else(|_| "{}".to_string());
    let tags_json = serde_json::to_string(&bundle.tags).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Create a comprehensive blog post using this research bundle:

{bundle_json}

REQUIREMENTS:

1. YAML FRONTMATTER (first lines):
---
title: "Compelling Title (60-70 chars)"
date: {date}
author: "AI Research Assistant"
tags: {tags_json}
summary: "One compelling sentence (150-160 chars for SEO)"
ai_generated: true
human_reviewed: false
---

2. STRUCTURE:
- ## 🎯 TL;DR (3-4 bullet points)
- ## 📖 Introduction (2-3 paragraphs, set context)
- ## 🔍 Background (explain fundamentals)
- ## 🚀 Recent Developments (one H3 section per major finding from sources)
- ## 🏢 Industry Applications (real company examples from sources)
- ## 💡 Practical Implications (for data scientists/engineers)
- ## 📊 Code Example (if applicable, simple Python/pseudocode)
- ## 🔮 Future Outlook (brief, grounded in sources)
- ## 📚 References (numbered list with full URLs)

3. CITATION RULES:
- Use [1], [2] inline after factual claims
- Each source must be cited at least once
- References section: [1] Title - Source Name (Date) - URL

4. STYLE:
- Use emojis for section headers only
- Write in active voice
- Use short paragraphs (3-4 sentences max)
- Include transition sentences
- Technical but accessible
- 1200-1800 words total

5. SEO:
- Include keywords naturally: AI, machine learning, data science
- Use descriptive subheadings
- Meta description in frontmatter

6. TRANSPARENCY:
- Mention "This post was generated by AI and aggregates recent research" in intro
- Link to original sources

Generate the COMPLETE Markdown blog post now (including frontmatter)."#,
        date = bundle.generated_date,
    )
}

/// Ask the model for the full post.
///
/// # Errors
///
/// Any completion failure, including an empty reply, is returned; the caller
/// treats it as fatal for the run.
#[instrument(level = "info", skip_all, fields(sources = bundle.total_sources))]
pub async fn compose_post<A: AskAsync>(
    llm: &A,
    bundle: &ResearchBundle,
    settings: &ModelSettings,
) -> Result<String, CompletionError> {
    let request = CompletionRequest::new(settings, SYSTEM_PROMPT, compose_prompt(bundle));
    let post = ask_timed(llm, &request).await?;
    info!(chars = post.chars().count(), "Generated blog post");
    Ok(post)
}
