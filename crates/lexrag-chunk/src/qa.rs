//! QA chunker: one chunk per question/answer item, or greedy per-category
//! grouping up to a maximum size.
//!
//! Combine mode has no minimum-size merge pass; grouped chunks are
//! assembled to approach the maximum, never to fall under a minimum.

use lexrag_core::chunk::{Chunk, ChunkMetadata, QaMetadata};
use lexrag_core::document::{QaDocument, QaItem};
use lexrag_core::char_len;
use tracing::debug;

use crate::DEFAULT_MAX_CHUNK_SIZE;

/// Separator between grouped QA entries.
const QA_RULE: &str = "\n\n---\n\n";

#[derive(Debug, Clone)]
pub struct QaChunkOptions {
    /// Group items by category into larger chunks instead of one per item.
    pub combine_by_category: bool,
    pub max_chunk_size: usize,
}

impl Default for QaChunkOptions {
    fn default() -> Self {
        Self {
            combine_by_category: false,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// Chunk a QA corpus. Items with a blank question or answer are skipped.
pub fn chunk_qa(doc: &QaDocument, opts: &QaChunkOptions) -> Vec<Chunk> {
    let items: Vec<&QaItem> = doc
        .items
        .iter()
        .filter(|i| !i.question.trim().is_empty() && !i.answer.trim().is_empty())
        .collect();

    let chunks = if opts.combine_by_category {
        combined_chunks(doc, &items, opts.max_chunk_size)
    } else {
        per_item_chunks(doc, &items)
    };
    debug!(
        qa_source = %doc.source,
        items = items.len(),
        chunks = chunks.len(),
        "chunked QA corpus"
    );
    chunks
}

fn per_item_chunks(doc: &QaDocument, items: &[&QaItem]) -> Vec<Chunk> {
    items
        .iter()
        .map(|item| {
            let formatted = format_item(item);
            let content = match item.category.trim() {
                "" => formatted,
                category => format!("[{category}]\n{formatted}"),
            };
            Chunk {
                id: format!("{}-qa{}", doc.source, item.id),
                content,
                metadata: ChunkMetadata::Qa(QaMetadata {
                    qa_source: doc.source,
                    category: item.category.clone(),
                    original_id: item.id.clone(),
                    url: item.url.clone(),
                }),
            }
        })
        .collect()
}

/// Greedy accumulation per category: flush whenever adding the next item
/// would push the buffer past `max_size`.
fn combined_chunks(doc: &QaDocument, items: &[&QaItem], max_size: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for (category, group) in group_by_category(items) {
        let mut buffer: Vec<String> = Vec::new();
        let mut buffer_len = 0usize;
        let mut ids: Vec<String> = Vec::new();
        let mut url: Option<String> = None;
        let mut seq = 1usize;

        let header_len = if category.is_empty() {
            0
        } else {
            char_len(&category) + 3 // "[…]\n"
        };

        for item in group {
            let formatted = format_item(item);
            let added = if buffer.is_empty() {
                char_len(&formatted)
            } else {
                char_len(QA_RULE) + char_len(&formatted)
            };
            if !buffer.is_empty() && header_len + buffer_len + added > max_size {
                chunks.push(flush_group(doc, &category, &buffer, &ids, &url, seq));
                seq += 1;
                buffer.clear();
                buffer_len = 0;
                ids.clear();
                url = None;
            }
            buffer_len += if buffer.is_empty() {
                char_len(&formatted)
            } else {
                char_len(QA_RULE) + char_len(&formatted)
            };
            buffer.push(formatted);
            ids.push(item.id.clone());
            if url.is_none() {
                url = item.url.clone();
            }
        }
        if !buffer.is_empty() {
            chunks.push(flush_group(doc, &category, &buffer, &ids, &url, seq));
        }
    }
    chunks
}

fn flush_group(
    doc: &QaDocument,
    category: &str,
    buffer: &[String],
    ids: &[String],
    url: &Option<String>,
    seq: usize,
) -> Chunk {
    let joined = buffer.join(QA_RULE);
    let content = if category.is_empty() {
        joined
    } else {
        format!("[{category}]\n{joined}")
    };
    Chunk {
        id: format!("{}-{}-g{}", doc.source, sanitize_id_component(category), seq),
        content,
        metadata: ChunkMetadata::Qa(QaMetadata {
            qa_source: doc.source,
            category: category.to_string(),
            original_id: ids.join(","),
            url: url.clone(),
        }),
    }
}

fn format_item(item: &QaItem) -> String {
    format!("Q: {}\n\nA: {}", item.question.trim(), item.answer.trim())
}

/// Group items by category, preserving first-appearance order.
fn group_by_category<'a>(items: &[&'a QaItem]) -> Vec<(String, Vec<&'a QaItem>)> {
    let mut groups: Vec<(String, Vec<&QaItem>)> = Vec::new();
    for item in items {
        let category = item.category.trim().to_string();
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, group)) => group.push(item),
            None => groups.push((category, vec![item])),
        }
    }
    groups
}

/// Make a category usable inside a chunk id: alphanumerics survive,
/// everything else collapses to single hyphens.
fn sanitize_id_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_dash = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("uncategorized");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexrag_core::source::QaSource;

    fn item(id: &str, category: &str, question: &str, answer: &str) -> QaItem {
        QaItem {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            category: category.into(),
            url: None,
        }
    }

    fn doc(items: Vec<QaItem>) -> QaDocument {
        QaDocument {
            source: QaSource::Faq,
            items,
        }
    }

    fn meta(chunk: &Chunk) -> &QaMetadata {
        match &chunk.metadata {
            ChunkMetadata::Qa(m) => m,
            other => panic!("expected QA metadata, got {other:?}"),
        }
    }

    #[test]
    fn default_mode_formats_one_chunk_per_item() {
        let d = doc(vec![item(
            "q1",
            "広告表示",
            "二重価格表示は違反ですか。",
            "比較対照価格が実売価格であれば違反になりません。",
        )]);
        let chunks = chunk_qa(&d, &QaChunkOptions::default());
        assert_eq!(chunks.len(), 1);
        let c = &chunks[0];
        assert_eq!(c.id, "faq-qaq1");
        assert_eq!(
            c.content,
            "[広告表示]\nQ: 二重価格表示は違反ですか。\n\nA: 比較対照価格が実売価格であれば違反になりません。"
        );
        assert_eq!(meta(c).original_id, "q1");
        assert_eq!(meta(c).qa_source, QaSource::Faq);
    }

    #[test]
    fn blank_category_omits_header() {
        let d = doc(vec![item("q1", "", "質問。", "回答。")]);
        let chunks = chunk_qa(&d, &QaChunkOptions::default());
        assert_eq!(chunks[0].content, "Q: 質問。\n\nA: 回答。");
    }

    #[test]
    fn items_missing_question_or_answer_are_skipped() {
        let d = doc(vec![
            item("q1", "c", "", "回答のみ。"),
            item("q2", "c", "質問のみ。", "  "),
            item("q3", "c", "有効な質問。", "有効な回答。"),
        ]);
        let chunks = chunk_qa(&d, &QaChunkOptions::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(meta(&chunks[0]).original_id, "q3");
    }

    #[test]
    fn combine_groups_by_category() {
        let d = doc(vec![
            item("q1", "価格", "質問一。", "回答一。"),
            item("q2", "景品", "質問二。", "回答二。"),
            item("q3", "価格", "質問三。", "回答三。"),
        ]);
        let opts = QaChunkOptions {
            combine_by_category: true,
            ..Default::default()
        };
        let chunks = chunk_qa(&d, &opts);
        assert_eq!(chunks.len(), 2);
        // First-appearance order: 価格, then 景品.
        assert_eq!(chunks[0].id, "faq-価格-g1");
        assert_eq!(meta(&chunks[0]).original_id, "q1,q3");
        assert!(chunks[0].content.contains("---"));
        assert_eq!(chunks[1].id, "faq-景品-g1");
        assert_eq!(meta(&chunks[1]).original_id, "q2");
    }

    #[test]
    fn combine_flushes_at_max_size() {
        let long_answer = "あ".repeat(800);
        let d = doc(vec![
            item("q1", "c", "質問一。", &long_answer),
            item("q2", "c", "質問二。", &long_answer),
            item("q3", "c", "質問三。", &long_answer),
        ]);
        let opts = QaChunkOptions {
            combine_by_category: true,
            max_chunk_size: 2000,
        };
        let chunks = chunk_qa(&d, &opts);
        // Each entry is ~810 chars; two fit under 2000, the third flushes.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "faq-c-g1");
        assert_eq!(meta(&chunks[0]).original_id, "q1,q2");
        assert_eq!(chunks[1].id, "faq-c-g2");
        assert_eq!(meta(&chunks[1]).original_id, "q3");
        for c in &chunks {
            assert!(c.len() <= 2000);
        }
    }

    #[test]
    fn combine_keeps_first_url() {
        let mut a = item("q1", "c", "質問一。", "回答一。");
        a.url = Some("https://example.go.jp/1".into());
        let mut b = item("q2", "c", "質問二。", "回答二。");
        b.url = Some("https://example.go.jp/2".into());
        let d = doc(vec![a, b]);
        let opts = QaChunkOptions {
            combine_by_category: true,
            ..Default::default()
        };
        let chunks = chunk_qa(&d, &opts);
        assert_eq!(chunks.len(), 1);
        assert_eq!(meta(&chunks[0]).url.as_deref(), Some("https://example.go.jp/1"));
    }

    #[test]
    fn sanitize_collapses_non_alphanumerics() {
        assert_eq!(sanitize_id_component("広告 表示"), "広告-表示");
        assert_eq!(sanitize_id_component("price / premium"), "price-premium");
        assert_eq!(sanitize_id_component("!!"), "uncategorized");
    }

    #[test]
    fn empty_corpus_yields_no_chunks() {
        let chunks = chunk_qa(&doc(vec![]), &QaChunkOptions::default());
        assert!(chunks.is_empty());
    }
}
