use crate::config::ExtractionSettings;
use crate::models::{LinkKind, SocialLink};
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during content extraction
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Source requires credentials and cannot be scraped: {0}")]
    UnsupportedSource(String),

    #[error("No usable content at {0}")]
    EmptyContent(String),
}

/// Content pulled from a single public URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub body: String,
    pub content_length: usize,
    pub extracted_at: DateTime<Utc>,
}

/// Result of extracting one link from a submission
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub link: SocialLink,
    pub outcome: Result<ExtractedContent, String>,
}

/// Aggregated corpus plus per-source metadata
#[derive(Debug, Clone)]
pub struct AggregatedContent {
    pub corpus: String,
    pub metadata: Value,
}

/// Fetches public pages and reduces them to analyzable text.
///
/// Credentialed socials (twitter/x, instagram, linkedin) are rejected up
/// front rather than fetched; everything else is treated as a website.
pub struct ContentExtractor {
    client: Client,
    max_content_length: usize,
    tag_re: Regex,
    script_re: Regex,
    title_re: Regex,
    meta_re: Regex,
    whitespace_re: Regex,
}

impl ContentExtractor {
    pub fn new(settings: &ExtractionSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; DateMeDocBot/1.0)")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            max_content_length: settings.max_content_length,
            script_re: Regex::new(r"(?is)<(script|style|nav|footer|header)\b.*?</(script|style|nav|footer|header)>")
                .expect("invalid script regex"),
            tag_re: Regex::new(r"(?s)<[^>]+>").expect("invalid tag regex"),
            title_re: Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("invalid title regex"),
            meta_re: Regex::new(
                r#"(?is)<meta\s+name=["']description["']\s+content=["']([^"']*)["']"#,
            )
            .expect("invalid meta regex"),
            whitespace_re: Regex::new(r"\s+").expect("invalid whitespace regex"),
        }
    }

    /// Extract text content from a public website
    pub async fn extract_from_website(&self, url: &str) -> Result<ExtractedContent, ExtractorError> {
        let response = self.client.get(url).send().await?;
        let html = response.text().await?;

        let title = self
            .title_re
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| self.collapse(m.as_str()))
            .filter(|t| !t.is_empty());

        let meta_description = self
            .meta_re
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|d| !d.is_empty());

        let without_blocks = self.script_re.replace_all(&html, " ");
        let without_tags = self.tag_re.replace_all(&without_blocks, " ");
        let decoded = decode_entities(&without_tags);
        let mut body = self.collapse(&decoded);

        if body.is_empty() {
            return Err(ExtractorError::EmptyContent(url.to_string()));
        }

        if body.len() > self.max_content_length {
            let cut = floor_char_boundary(&body, self.max_content_length);
            body.truncate(cut);
        }

        let content_length = body.len();

        Ok(ExtractedContent {
            url: url.to_string(),
            title,
            meta_description,
            body,
            content_length,
            extracted_at: Utc::now(),
        })
    }

    /// Extract content from a link, routing by source kind
    pub async fn extract_from_link(
        &self,
        link: &SocialLink,
    ) -> Result<ExtractedContent, ExtractorError> {
        let kind = detect_kind(&link.url, link.kind);

        if kind.requires_credentials() {
            return Err(ExtractorError::UnsupportedSource(format!(
                "{:?} ({})",
                kind, link.url
            )));
        }

        self.extract_from_website(&link.url).await
    }

    /// Walk a list of submitted links, extracting each in turn
    pub async fn extract_many(&self, links: &[SocialLink]) -> Vec<ExtractionResult> {
        let mut results = Vec::with_capacity(links.len());

        for link in links {
            let outcome = match self.extract_from_link(link).await {
                Ok(content) => Ok(content),
                Err(e) => {
                    tracing::warn!("Extraction failed for {}: {}", link.url, e);
                    Err(e.to_string())
                }
            };
            results.push(ExtractionResult {
                link: link.clone(),
                outcome,
            });
        }

        results
    }

    /// Aggregate extraction results into one corpus with source metadata
    pub fn aggregate(&self, results: &[ExtractionResult]) -> AggregatedContent {
        let mut corpus = String::new();
        let mut sources = Vec::new();
        let mut successful = 0usize;
        let mut failed = 0usize;

        for result in results {
            match &result.outcome {
                Ok(content) => {
                    successful += 1;
                    sources.push(serde_json::json!({
                        "type": result.link.kind,
                        "url": result.link.url,
                        "success": true,
                    }));

                    corpus.push_str(&format!("\n\n--- Content from {} ---\n", content.url));
                    if let Some(title) = &content.title {
                        corpus.push_str(&format!("{}\n", title));
                    }
                    if let Some(description) = &content.meta_description {
                        corpus.push_str(&format!("{}\n", description));
                    }
                    corpus.push_str(&content.body);
                }
                Err(error) => {
                    failed += 1;
                    sources.push(serde_json::json!({
                        "type": result.link.kind,
                        "url": result.link.url,
                        "success": false,
                        "error": error,
                    }));
                }
            }
        }

        let corpus = corpus.trim().to_string();
        let metadata = serde_json::json!({
            "sources": sources,
            "total_length": corpus.len(),
            "successful_extractions": successful,
            "failed_extractions": failed,
        });

        AggregatedContent { corpus, metadata }
    }

    fn collapse(&self, text: &str) -> String {
        self.whitespace_re.replace_all(text, " ").trim().to_string()
    }
}

/// Re-detect the source kind from the URL host; submitters often tag
/// social links as "website"
fn detect_kind(url: &str, declared: LinkKind) -> LinkKind {
    if url.contains("twitter.com") || url.contains("x.com") {
        LinkKind::Twitter
    } else if url.contains("instagram.com") {
        LinkKind::Instagram
    } else if url.contains("linkedin.com") {
        LinkKind::Linkedin
    } else {
        declared
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut idx = index;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionSettings;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(&ExtractionSettings {
            max_content_length: 50_000,
            fetch_timeout_secs: 5,
        })
    }

    fn link(kind: LinkKind, url: &str) -> SocialLink {
        SocialLink {
            kind,
            url: url.to_string(),
            handle: None,
        }
    }

    #[test]
    fn test_detect_kind_overrides_declared() {
        assert_eq!(
            detect_kind("https://twitter.com/someone", LinkKind::Website),
            LinkKind::Twitter
        );
        assert_eq!(
            detect_kind("https://www.instagram.com/someone", LinkKind::Other),
            LinkKind::Instagram
        );
        assert_eq!(
            detect_kind("https://blog.example.com", LinkKind::Blog),
            LinkKind::Blog
        );
    }

    #[tokio::test]
    async fn test_credentialed_sources_rejected() {
        let ex = extractor();
        let result = ex
            .extract_from_link(&link(LinkKind::Website, "https://twitter.com/someone"))
            .await;

        assert!(matches!(result, Err(ExtractorError::UnsupportedSource(_))));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b&nbsp;&lt;c&gt;"), "a & b <c>");
    }

    #[test]
    fn test_aggregate_builds_corpus_and_metadata() {
        let ex = extractor();
        let results = vec![
            ExtractionResult {
                link: link(LinkKind::Website, "https://blog.example.com"),
                outcome: Ok(ExtractedContent {
                    url: "https://blog.example.com".to_string(),
                    title: Some("My Blog".to_string()),
                    meta_description: None,
                    body: "I write about climbing and jazz.".to_string(),
                    content_length: 32,
                    extracted_at: Utc::now(),
                }),
            },
            ExtractionResult {
                link: link(LinkKind::Twitter, "https://twitter.com/someone"),
                outcome: Err("requires credentials".to_string()),
            },
        ];

        let aggregated = ex.aggregate(&results);

        assert!(aggregated.corpus.contains("My Blog"));
        assert!(aggregated.corpus.contains("climbing and jazz"));
        assert_eq!(aggregated.metadata["successful_extractions"], 1);
        assert_eq!(aggregated.metadata["failed_extractions"], 1);
        assert_eq!(aggregated.metadata["sources"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_aggregate_empty_results() {
        let ex = extractor();
        let aggregated = ex.aggregate(&[]);

        assert!(aggregated.corpus.is_empty());
        assert_eq!(aggregated.metadata["total_length"], 0);
    }

    #[test]
    fn test_floor_char_boundary() {
        let s = "héllo";
        // Index 2 lands inside the two-byte 'é'
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(floor_char_boundary(s, 100), s.len());
    }
}
