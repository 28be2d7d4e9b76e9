//! Page relevance scoring and excerpt extraction.
//!
//! Scoring is intentionally simple and fully deterministic: a verbatim
//! phrase hit on a page is worth 100, each query token found as a substring
//! is worth 10, and the best five pages win. The excerpt is a fixed window
//! around the first hit, so a page matched only through tokens anchors on
//! the first token's first occurrence rather than the densest region. That
//! imprecision is part of the contract; clients rely on the exact ranking.

use crate::store::Corpus;

/// Maximum matches returned per query.
pub const MAX_MATCHES: usize = 5;

/// Score contribution of a verbatim phrase hit.
const PHRASE_SCORE: u32 = 100;
/// Score contribution per matching query token.
const TOKEN_SCORE: u32 = 10;
/// Query tokens this short are treated as stop words.
const MIN_TOKEN_CHARS: usize = 3;
/// Excerpt window: characters kept before the anchor.
const EXCERPT_BEFORE: usize = 100;
/// Excerpt window: characters kept after the anchor.
const EXCERPT_AFTER: usize = 300;

/// One scored page, with the score already stripped. Produced fresh per
/// query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMatch {
    pub document: String,
    pub page: u32,
    pub excerpt: String,
}

/// Scorer-internal match carrying the score and excerpt anchor.
#[derive(Debug)]
struct ScoredPage {
    document: String,
    page: u32,
    excerpt: String,
    score: u32,
}

/// Scores every page in the corpus against `query` and returns the top
/// matches, best first. At most [`MAX_MATCHES`] entries come back.
pub fn search(query: &str, corpus: &Corpus) -> Vec<PageMatch> {
    score_pages(query, corpus)
        .into_iter()
        .map(|s| PageMatch {
            document: s.document,
            page: s.page,
            excerpt: s.excerpt,
        })
        .collect()
}

fn score_pages(query: &str, corpus: &Corpus) -> Vec<ScoredPage> {
    let query_lower = query.to_lowercase();
    let tokens: Vec<&str> = query_lower
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .collect();

    let mut scored = Vec::new();

    for (filename, doc) in corpus {
        for (&page, text) in doc.pages() {
            let text_lower = text.to_lowercase();

            let mut score = 0u32;
            let mut anchor: Option<usize> = None;

            // Verbatim phrase hit dominates and pins the anchor.
            if text_lower.contains(&query_lower) {
                score += PHRASE_SCORE;
                anchor = text_lower.find(&query_lower);
            }

            for token in &tokens {
                if text_lower.contains(token) {
                    score += TOKEN_SCORE;
                    if anchor.is_none() {
                        anchor = text_lower.find(token);
                    }
                }
            }

            if score == 0 {
                continue;
            }

            let excerpt = excerpt_around(text, anchor.unwrap_or(0));
            if excerpt.is_empty() {
                continue;
            }

            scored.push(ScoredPage {
                document: filename.clone(),
                page,
                excerpt,
                score,
            });
        }
    }

    // Stable sort: equal scores keep corpus (filename, page) order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(MAX_MATCHES);
    scored
}

/// Cuts the excerpt window around `anchor`, a byte offset into the
/// lowercased page text. The window is clamped to char boundaries of the
/// original text, so the excerpt is always a contiguous substring of it.
fn excerpt_around(text: &str, anchor: usize) -> String {
    let anchor = anchor.min(text.len());

    let mut start = anchor.saturating_sub(EXCERPT_BEFORE);
    while !text.is_char_boundary(start) {
        start -= 1;
    }

    let mut end = (anchor + EXCERPT_AFTER).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }

    text[start..end].trim().to_string()
}
