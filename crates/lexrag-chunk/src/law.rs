//! Statute chunker: one chunk per article or per paragraph.
//!
//! Article mode folds an article's paragraphs and items into one body;
//! paragraph mode emits one chunk per paragraph carrying the owning
//! article's heading as context. Both modes run the shared merge pass, and
//! merged chunks carry a combined article-number range such as `"5-6"`.

use lexrag_core::chunk::{Chunk, ChunkMetadata, LawChunkKind, LawMetadata};
use lexrag_core::document::{Article, LawDocument, Paragraph};
use tracing::debug;

use crate::merge::merge_undersized;
use crate::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE};

/// Granularity of statute chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LawChunkMode {
    /// One chunk per article (paragraphs and items folded in).
    #[default]
    Article,
    /// One chunk per paragraph; articles without paragraphs fall back to a
    /// single article-level chunk.
    Paragraph,
}

#[derive(Debug, Clone)]
pub struct LawChunkOptions {
    pub mode: LawChunkMode,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

impl Default for LawChunkOptions {
    fn default() -> Self {
        Self {
            mode: LawChunkMode::Article,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// Chunk a statute into bounded units per the selected mode.
///
/// Never fails: articles with no content and no paragraphs are skipped,
/// everything else degrades to the simplest chunk shape that fits.
pub fn chunk_law(doc: &LawDocument, opts: &LawChunkOptions) -> Vec<Chunk> {
    let raw = match opts.mode {
        LawChunkMode::Article => article_chunks(doc),
        LawChunkMode::Paragraph => paragraph_chunks(doc),
    };
    let merged = merge_undersized(raw, opts.min_chunk_size, opts.max_chunk_size, combine_law);
    debug!(
        law_id = %doc.law_id,
        mode = ?opts.mode,
        chunks = merged.len(),
        "chunked law document"
    );
    merged
}

fn article_chunks(doc: &LawDocument) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for article in &doc.articles {
        let mut lines = vec![article_heading(article)];
        if article.paragraphs.is_empty() {
            match article.content.as_deref().map(str::trim) {
                Some(content) if !content.is_empty() => lines.push(content.to_string()),
                // Nothing beneath this article at all; emit no chunk.
                _ => continue,
            }
        } else {
            for paragraph in &article.paragraphs {
                push_paragraph_lines(&mut lines, paragraph);
            }
        }
        chunks.push(Chunk {
            id: format!("{}-art{}", doc.law_id, article.number),
            content: lines.join("\n"),
            metadata: law_meta(doc, article, None, LawChunkKind::Article),
        });
    }
    chunks
}

fn paragraph_chunks(doc: &LawDocument) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for article in &doc.articles {
        if article.paragraphs.is_empty() {
            // Fall back to one article-level chunk.
            let Some(content) = article.content.as_deref().map(str::trim) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            chunks.push(Chunk {
                id: format!("{}-art{}", doc.law_id, article.number),
                content: format!("{}\n{}", article_heading(article), content),
                metadata: law_meta(doc, article, None, LawChunkKind::Article),
            });
            continue;
        }
        for paragraph in &article.paragraphs {
            let mut lines = vec![article_heading(article)];
            push_paragraph_lines(&mut lines, paragraph);
            chunks.push(Chunk {
                id: format!("{}-art{}-p{}", doc.law_id, article.number, paragraph.number),
                content: lines.join("\n"),
                metadata: law_meta(
                    doc,
                    article,
                    Some(paragraph.number),
                    LawChunkKind::Paragraph,
                ),
            });
        }
    }
    chunks
}

/// Heading line: `第5条` or `第5条（強制労働の禁止）`.
fn article_heading(article: &Article) -> String {
    match article.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => format!("第{}条（{}）", article.number, title),
        _ => format!("第{}条", article.number),
    }
}

/// Paragraph body plus item lines; paragraph 1 carries no number prefix.
fn push_paragraph_lines(lines: &mut Vec<String>, paragraph: &Paragraph) {
    let body = paragraph.content.trim();
    if !body.is_empty() {
        if paragraph.number == 1 {
            lines.push(body.to_string());
        } else {
            lines.push(format!("{} {}", paragraph.number, body));
        }
    }
    for item in &paragraph.items {
        let item_body = item.content.trim();
        if !item_body.is_empty() {
            lines.push(format!("{} {}", item.number, item_body));
        }
    }
}

fn law_meta(
    doc: &LawDocument,
    article: &Article,
    paragraph_number: Option<u32>,
    chunk_type: LawChunkKind,
) -> ChunkMetadata {
    ChunkMetadata::Law(LawMetadata {
        law_id: doc.law_id.clone(),
        law_title: doc.law_title.clone(),
        article_number: article.number.clone(),
        article_title: article.title.clone(),
        paragraph_number,
        item_number: None,
        chunk_type,
    })
}

/// Metadata/id combination for merged law chunks.
///
/// Equal article numbers keep the number (and paragraph provenance of the
/// left chunk); differing numbers produce the range `"A-B"` and the merged
/// chunk degrades to article granularity.
fn combine_law(left: &Chunk, right: &Chunk) -> (String, ChunkMetadata) {
    let (ChunkMetadata::Law(a), ChunkMetadata::Law(b)) = (&left.metadata, &right.metadata)
    else {
        // The law merge pass only ever sees law chunks.
        return (left.id.clone(), left.metadata.clone());
    };

    let mut meta = a.clone();
    if a.article_number == b.article_number {
        let id = match meta.paragraph_number {
            Some(p) => format!("{}-art{}-p{}", meta.law_id, meta.article_number, p),
            None => format!("{}-art{}", meta.law_id, meta.article_number),
        };
        return (id, ChunkMetadata::Law(meta));
    }

    meta.article_number = combine_article_numbers(&a.article_number, &b.article_number);
    meta.paragraph_number = None;
    meta.item_number = None;
    meta.chunk_type = LawChunkKind::Article;
    let id = format!("{}-art{}", meta.law_id, meta.article_number);
    (id, ChunkMetadata::Law(meta))
}

/// `"5"` + `"6"` → `"5-6"`; `"5-6"` + `"7"` → `"5-7"`.
fn combine_article_numbers(left: &str, right: &str) -> String {
    let first = left.split('-').next().unwrap_or(left);
    let last = right.split('-').next_back().unwrap_or(right);
    format!("{first}-{last}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexrag_core::document::Item;

    fn law(articles: Vec<Article>) -> LawDocument {
        LawDocument {
            law_id: "L001".into(),
            law_title: "テスト法".into(),
            articles,
        }
    }

    fn article(number: &str, title: Option<&str>, paragraphs: Vec<Paragraph>) -> Article {
        Article {
            number: number.into(),
            title: title.map(Into::into),
            content: None,
            paragraphs,
        }
    }

    fn paragraph(number: u32, content: &str) -> Paragraph {
        Paragraph {
            number,
            content: content.into(),
            items: vec![],
        }
    }

    fn meta(chunk: &Chunk) -> &LawMetadata {
        match &chunk.metadata {
            ChunkMetadata::Law(m) => m,
            other => panic!("expected law metadata, got {other:?}"),
        }
    }

    // Disable merging so the structural shape can be asserted directly.
    fn no_merge(mode: LawChunkMode) -> LawChunkOptions {
        LawChunkOptions {
            mode,
            min_chunk_size: 0,
            max_chunk_size: usize::MAX,
        }
    }

    #[test]
    fn article_mode_folds_paragraphs_and_items() {
        let doc = law(vec![Article {
            number: "5".into(),
            title: Some("定義".into()),
            content: None,
            paragraphs: vec![
                paragraph(1, "この法律において定義する。"),
                Paragraph {
                    number: 2,
                    content: "次の各号に掲げる用語の意義は当該各号に定める。".into(),
                    items: vec![
                        Item {
                            number: "一".into(),
                            content: "事業者 商品を供給する者をいう。".into(),
                        },
                        Item {
                            number: "二".into(),
                            content: "表示 顧客を誘引する手段をいう。".into(),
                        },
                    ],
                },
            ],
        }]);
        let chunks = chunk_law(&doc, &no_merge(LawChunkMode::Article));
        assert_eq!(chunks.len(), 1);
        let c = &chunks[0];
        assert_eq!(c.id, "L001-art5");
        let lines: Vec<&str> = c.content.lines().collect();
        assert_eq!(lines[0], "第5条（定義）");
        // Paragraph 1 has no number prefix, paragraph 2 does.
        assert_eq!(lines[1], "この法律において定義する。");
        assert!(lines[2].starts_with("2 "));
        assert!(lines[3].starts_with("一 "));
        assert!(lines[4].starts_with("二 "));
        assert_eq!(meta(c).chunk_type, LawChunkKind::Article);
    }

    #[test]
    fn article_mode_uses_content_when_no_paragraphs() {
        let doc = law(vec![Article {
            number: "1".into(),
            title: None,
            content: Some("この法律は公正な競争を確保する。".into()),
            paragraphs: vec![],
        }]);
        let chunks = chunk_law(&doc, &no_merge(LawChunkMode::Article));
        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].content,
            "第1条\nこの法律は公正な競争を確保する。"
        );
    }

    #[test]
    fn empty_article_is_skipped() {
        let doc = law(vec![
            article("1", None, vec![]),
            Article {
                number: "2".into(),
                title: None,
                content: Some("本文あり。".into()),
                paragraphs: vec![],
            },
        ]);
        let chunks = chunk_law(&doc, &no_merge(LawChunkMode::Article));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "L001-art2");
    }

    #[test]
    fn paragraph_mode_emits_one_chunk_per_paragraph() {
        let doc = law(vec![article(
            "3",
            Some("表示の禁止"),
            vec![paragraph(1, "第一項の本文。"), paragraph(2, "第二項の本文。")],
        )]);
        let chunks = chunk_law(&doc, &no_merge(LawChunkMode::Paragraph));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "L001-art3-p1");
        assert_eq!(chunks[1].id, "L001-art3-p2");
        // Both carry the article heading as context.
        assert!(chunks[0].content.starts_with("第3条（表示の禁止）"));
        assert!(chunks[1].content.starts_with("第3条（表示の禁止）"));
        assert_eq!(meta(&chunks[0]).paragraph_number, Some(1));
        assert_eq!(meta(&chunks[1]).chunk_type, LawChunkKind::Paragraph);
    }

    #[test]
    fn paragraph_mode_falls_back_for_bare_articles() {
        let doc = law(vec![Article {
            number: "9".into(),
            title: None,
            content: Some("附則的な規定。".into()),
            paragraphs: vec![],
        }]);
        let chunks = chunk_law(&doc, &no_merge(LawChunkMode::Paragraph));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "L001-art9");
        assert_eq!(meta(&chunks[0]).chunk_type, LawChunkKind::Article);
    }

    #[test]
    fn small_articles_merge_into_range() {
        // Article 5 is ~80 chars, article 6 is ~150: they merge into "5-6".
        let doc = law(vec![
            Article {
                number: "5".into(),
                title: None,
                content: Some("あ".repeat(76)),
                paragraphs: vec![],
            },
            Article {
                number: "6".into(),
                title: None,
                content: Some("い".repeat(146)),
                paragraphs: vec![],
            },
        ]);
        let chunks = chunk_law(&doc, &LawChunkOptions::default());
        assert_eq!(chunks.len(), 1);
        let c = &chunks[0];
        assert_eq!(meta(c).article_number, "5-6");
        assert_eq!(c.id, "L001-art5-6");
        assert!(c.content.contains("\n\n"), "merged bodies keep a blank line");
    }

    #[test]
    fn merged_range_extends_over_chains() {
        let doc = law(vec![
            Article {
                number: "5".into(),
                title: None,
                content: Some("あ".repeat(30)),
                paragraphs: vec![],
            },
            Article {
                number: "6".into(),
                title: None,
                content: Some("い".repeat(30)),
                paragraphs: vec![],
            },
            Article {
                number: "7".into(),
                title: None,
                content: Some("う".repeat(120)),
                paragraphs: vec![],
            },
        ]);
        let chunks = chunk_law(&doc, &LawChunkOptions::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(meta(&chunks[0]).article_number, "5-7");
    }

    #[test]
    fn equal_article_numbers_stay_unchanged_on_merge() {
        // Two tiny paragraphs of the same article merge without a range.
        let doc = law(vec![article(
            "4",
            None,
            vec![paragraph(1, "短い。"), paragraph(2, "こちらも短い。")],
        )]);
        let chunks = chunk_law(
            &doc,
            &LawChunkOptions {
                mode: LawChunkMode::Paragraph,
                ..Default::default()
            },
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(meta(&chunks[0]).article_number, "4");
        assert_eq!(chunks[0].id, "L001-art4-p1");
    }

    #[test]
    fn oversized_article_not_merged() {
        let doc = law(vec![
            Article {
                number: "1".into(),
                title: None,
                content: Some("あ".repeat(80)),
                paragraphs: vec![],
            },
            Article {
                number: "2".into(),
                title: None,
                content: Some("い".repeat(1990)),
                paragraphs: vec![],
            },
        ]);
        let chunks = chunk_law(&doc, &LawChunkOptions::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(meta(&chunks[0]).article_number, "1");
        assert_eq!(meta(&chunks[1]).article_number, "2");
    }

    #[test]
    fn combine_article_numbers_cases() {
        assert_eq!(combine_article_numbers("5", "6"), "5-6");
        assert_eq!(combine_article_numbers("5-6", "7"), "5-7");
        assert_eq!(combine_article_numbers("3", "4-8"), "3-8");
    }
}
