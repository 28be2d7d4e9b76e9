//! The answer event pipeline.
//!
//! Turns one query into the canonical ordered event sequence:
//!
//! ```text
//! tool_call(thinking) → tool_call(searching_documents) → [scorer]
//!   → tool_call(retrieving_pdf) → tool_call(analyzing_content)
//!   → citation* → text* → source* → done
//! ```
//!
//! Citations always precede the first text fragment and sources always
//! follow the last one; clients render citation markers while text streams
//! and resolve them once the attribution list arrives. A failure during
//! generation produces a single terminal `error` event instead; no `done`
//! follows an `error`.
//!
//! The stream is lazy and suspends at every pacing delay, so a dropped
//! consumer (client disconnect) abandons the pipeline at the next
//! suspension point. Each invocation is independent; the only shared state
//! is the corpus snapshot taken once per run.

use futures::Stream;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PacingConfig;
use crate::events::{Citation, SourceAttribution, StreamEvent};
use crate::generate::{self, AnswerProvider};
use crate::scorer;
use crate::store::DocumentStore;

/// Runs the full pipeline for `query`, yielding events in protocol order.
pub fn answer_events(
    store: Arc<DocumentStore>,
    provider: Arc<dyn AnswerProvider>,
    pacing: PacingConfig,
    query: String,
) -> impl Stream<Item = StreamEvent> {
    async_stream::stream! {
        yield StreamEvent::stage("thinking", "Analyzing your question...");
        pause(pacing.thinking_ms).await;

        yield StreamEvent::stage("searching_documents", "🔍 Searching documents...");
        pause(pacing.searching_ms).await;

        let corpus = store.snapshot();
        let matches = scorer::search(&query, &corpus);
        tracing::info!("query matched {} pages", matches.len());

        yield StreamEvent::stage("retrieving_pdf", "📄 Reading PDF sections...");
        pause(pacing.retrieving_ms).await;

        yield StreamEvent::stage("analyzing_content", "🤔 Analyzing content...");
        pause(pacing.analyzing_ms).await;

        for (i, m) in matches.iter().enumerate() {
            yield StreamEvent::Citation {
                data: Citation {
                    id: i + 1,
                    document: m.document.clone(),
                    page: m.page,
                    text: m.excerpt.clone(),
                },
            };
        }

        if matches.is_empty() {
            for word in generate::NO_MATCH_MESSAGE.split_whitespace() {
                yield StreamEvent::text(format!("{} ", word));
                pause(pacing.word_delay_ms).await;
            }
            yield StreamEvent::Done;
        } else {
            match generate::generate_answer(provider.as_ref(), &query, &matches).await {
                Err(err) => {
                    // Terminal: no done event after an error.
                    tracing::error!("pipeline failed during generation: {:#}", err);
                    yield StreamEvent::error(err.to_string());
                }
                Ok(answer) => {
                    for word in answer.split_whitespace() {
                        yield StreamEvent::text(format!("{} ", word));
                        pause(pacing.word_delay_ms).await;
                    }

                    for (i, m) in matches.iter().enumerate() {
                        yield StreamEvent::Source {
                            data: SourceAttribution {
                                id: i + 1,
                                title: title_from_filename(&m.document),
                                document: m.document.clone(),
                                page: m.page,
                            },
                        };
                    }

                    yield StreamEvent::Done;
                }
            }
        }
    }
}

async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Display title for a source: extension stripped, underscores spaced,
/// words title-cased. `machine_learning_basics.pdf` → `Machine Learning Basics`.
fn title_from_filename(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    stem.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_derived_from_filenames() {
        assert_eq!(title_from_filename("ai.pdf"), "Ai");
        assert_eq!(
            title_from_filename("machine_learning_basics.pdf"),
            "Machine Learning Basics"
        );
        assert_eq!(title_from_filename("MIXED_case_NAME.txt"), "Mixed Case Name");
        assert_eq!(title_from_filename("no_extension"), "No Extension");
    }
}
