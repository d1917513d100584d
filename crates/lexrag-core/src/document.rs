//! Input document models for the three ingested families.
//!
//! These arrive from upstream collaborators (statute API client, PDF
//! extractor, QA corpus loader) already decoded to UTF-8 text. The chunkers
//! consume them read-only.

use serde::{Deserialize, Serialize};

use crate::source::QaSource;

/// A statute as a hierarchy of articles, paragraphs and items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LawDocument {
    pub law_id: String,
    pub law_title: String,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Bare article number, e.g. `"5"` or `"16-2"` for inserted articles.
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free text directly under the article (articles without paragraphs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub number: u32,
    pub content: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Item marker as printed, e.g. `"一"` or `"1"`.
    pub number: String,
    pub content: String,
}

/// A PDF-derived guideline document: full text plus per-page text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineDocument {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub full_text: String,
    #[serde(default)]
    pub pages: Vec<String>,
}

impl GuidelineDocument {
    /// Filename without its extension, used as the chunk id parent.
    pub fn stem(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }
}

/// A question/answer corpus grouped under one provenance source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaDocument {
    pub source: QaSource,
    pub items: Vec<QaItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaItem {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
