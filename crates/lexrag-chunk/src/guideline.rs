//! Guideline chunker: heading-based section split, then an overlapping
//! sliding window per oversized section, then the shared merge pass.
//!
//! A page-oriented mode (one chunk per physical page, no sectioning) exists
//! for diagnostic paths and is not part of the default ingestion flow.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use lexrag_core::char_len;
use lexrag_core::chunk::{Chunk, ChunkMetadata, GuidelineMetadata};
use lexrag_core::document::GuidelineDocument;

use crate::merge::merge_undersized;
use crate::{DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MIN_CHUNK_SIZE};

/// Default heading pattern: chapter/section/article markers (`第N章`,
/// `第N節`, `第N条`, `第N款`, Arabic or kanji numerals) and bracketed
/// headings (`【…】`, `[…]`). Plain numeric list markers (`1.`, `２．`) are
/// deliberately not headings; treating them as such shreds enumerations
/// into one-line sections.
static DEFAULT_HEADING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(第[0-9０-９一二三四五六七八九十百千]+(章|節|条|款)|【[^】]+】|\[[^\]]+\])")
        .expect("default heading pattern compiles")
});

/// Characters the sliding window treats as sentence terminators.
const SENTENCE_STOPS: [char; 2] = ['。', '.'];

#[derive(Debug, Clone)]
pub struct GuidelineChunkOptions {
    /// Target window size for the sliding-window split.
    pub chunk_size: usize,
    /// Characters shared between adjacent windows.
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    /// Overrides the default heading pattern when set.
    pub heading_pattern: Option<Regex>,
    /// Emit one chunk per physical page instead of sectioning.
    pub by_page: bool,
}

impl Default for GuidelineChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            heading_pattern: None,
            by_page: false,
        }
    }
}

/// Chunk a PDF-derived guideline document.
pub fn chunk_guideline(doc: &GuidelineDocument, opts: &GuidelineChunkOptions) -> Vec<Chunk> {
    if opts.by_page {
        return page_chunks(doc);
    }

    let pattern = opts
        .heading_pattern
        .as_ref()
        .unwrap_or(&DEFAULT_HEADING_PATTERN);
    let sections = split_sections(&doc.full_text, pattern);
    let stem = doc.stem();

    let mut chunks = Vec::new();
    for section in &sections {
        let body = section.body.trim();
        if body.is_empty() {
            continue;
        }
        let windows = if char_len(body) > opts.chunk_size {
            sliding_windows(body, opts.chunk_size, opts.chunk_overlap)
        } else {
            vec![body.to_string()]
        };
        for window in windows {
            let content = match &section.title {
                Some(title) => format!("{title}\n{window}"),
                None => window,
            };
            let index = chunks.len();
            chunks.push(Chunk {
                id: format!("{stem}-c{index}"),
                content,
                metadata: ChunkMetadata::Guideline(GuidelineMetadata {
                    filename: doc.filename.clone(),
                    title: doc.title.clone(),
                    page_number: None,
                    section_title: section.title.clone(),
                    chunk_index: index,
                }),
            });
        }
    }

    let merged = merge_undersized(
        chunks,
        opts.min_chunk_size,
        opts.max_chunk_size,
        combine_guideline,
    );
    let renumbered = renumber(merged, stem);
    debug!(
        filename = %doc.filename,
        sections = sections.len(),
        chunks = renumbered.len(),
        "chunked guideline document"
    );
    renumbered
}

// ── Section split ──

struct Section {
    title: Option<String>,
    body: String,
}

/// Scan line by line; a heading line starts a new section and subsequent
/// lines accumulate as its body. Text before the first heading becomes an
/// untitled leading section.
fn split_sections(text: &str, pattern: &Regex) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        title: None,
        body: String::new(),
    };

    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && pattern.is_match(trimmed) {
            if current.title.is_some() || !current.body.trim().is_empty() {
                sections.push(current);
            }
            current = Section {
                title: Some(trimmed.to_string()),
                body: String::new(),
            };
        } else {
            if !current.body.is_empty() {
                current.body.push('\n');
            }
            current.body.push_str(line);
        }
    }
    if current.title.is_some() || !current.body.trim().is_empty() {
        sections.push(current);
    }
    sections
}

// ── Sliding window ──

/// Split a section body into overlapping windows of `size` characters.
///
/// A window boundary that would fall mid-sentence snaps back to the nearest
/// preceding full stop, provided that stop lies past half the window (a
/// closer snap would starve the window). Windows advance by
/// `size − overlap`; when the remainder is smaller than the overlap the
/// next window starts flush at the previous end instead of looping forever.
fn sliding_windows(body: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = body.chars().collect();
    let len = chars.len();
    if len <= size {
        return vec![body.to_string()];
    }

    let mut windows = Vec::new();
    let mut start = 0usize;
    loop {
        let mut end = (start + size).min(len);
        if end < len {
            if let Some(rel) = chars[start..end]
                .iter()
                .rposition(|c| SENTENCE_STOPS.contains(c))
            {
                if rel + 1 > size / 2 {
                    end = start + rel + 1;
                }
            }
        }
        windows.push(chars[start..end].iter().collect());
        if end >= len {
            break;
        }
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }
    windows
}

// ── Merge & renumber ──

/// Merged guideline chunks keep the left chunk's provenance; indices and
/// ids are renumbered over the final sequence afterwards.
fn combine_guideline(left: &Chunk, _right: &Chunk) -> (String, ChunkMetadata) {
    (left.id.clone(), left.metadata.clone())
}

fn renumber(mut chunks: Vec<Chunk>, stem: &str) -> Vec<Chunk> {
    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.id = format!("{stem}-c{index}");
        if let ChunkMetadata::Guideline(meta) = &mut chunk.metadata {
            meta.chunk_index = index;
        }
    }
    chunks
}

// ── Page mode ──

fn page_chunks(doc: &GuidelineDocument) -> Vec<Chunk> {
    let stem = doc.stem();
    let mut chunks = Vec::new();
    for (i, page) in doc.pages.iter().enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        let page_number = (i + 1) as u32;
        let index = chunks.len();
        chunks.push(Chunk {
            id: format!("{stem}-page{page_number}"),
            content: page.clone(),
            metadata: ChunkMetadata::Guideline(GuidelineMetadata {
                filename: doc.filename.clone(),
                title: doc.title.clone(),
                page_number: Some(page_number),
                section_title: None,
                chunk_index: index,
            }),
        });
    }
    chunks
}
