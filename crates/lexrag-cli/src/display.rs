//! Vertical card display for search results.

use lexrag_core::chunk::ChunkMetadata;
use lexrag_store::SearchResult;

const MAX_SNIPPET_CHARS: usize = 240;

/// Print ranked results as human-readable cards.
pub fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("(no results)");
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "#{:<2} [{}] {}  (distance {:.4})",
            rank + 1,
            result.source,
            result.id,
            result.score
        );
        if let Some(line) = provenance_line(&result.metadata) {
            println!("    {line}");
        }
        println!("    {}", snippet(&result.content));
        println!();
    }
}

/// One-line provenance summary per document family.
fn provenance_line(metadata: &ChunkMetadata) -> Option<String> {
    match metadata {
        ChunkMetadata::Law(m) => Some(format!("{} 第{}条", m.law_title, m.article_number)),
        ChunkMetadata::Guideline(m) => {
            let mut line = m.filename.clone();
            if let Some(section) = &m.section_title {
                line.push_str(" — ");
                line.push_str(section);
            }
            Some(line)
        }
        ChunkMetadata::Qa(m) => Some(format!("{} / {}", m.qa_source, m.category)),
        ChunkMetadata::Violation(m) => Some(m.category.clone()),
    }
}

/// First line-folded `MAX_SNIPPET_CHARS` characters of the content.
fn snippet(content: &str) -> String {
    let flat: String = content
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .take(MAX_SNIPPET_CHARS)
        .collect();
    if content.chars().count() > MAX_SNIPPET_CHARS {
        format!("{flat}…")
    } else {
        flat
    }
}
