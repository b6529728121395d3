//! One-narrative classification over a [`CompletionBackend`].

use tracing::{debug, warn};

use crate::client::CompletionBackend;
use crate::parse::parse_classification;
use crate::prompt;
use crate::taxonomy::ClassificationItem;

/// Result of classifying one narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyOutcome {
    /// Entries, or a single error descriptor.
    pub items: Vec<ClassificationItem>,
    /// Whether the service was called at all.
    pub called: bool,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ClassifyOutcome {
    pub fn is_error(&self) -> bool {
        self.items.iter().any(ClassificationItem::is_error)
    }
}

/// Classify `narrative`, turning every service or parse failure into an
/// inline error item.
///
/// Blank narratives yield an empty list without contacting the service.
pub async fn classify_narrative<B: CompletionBackend>(
    backend: &B,
    narrative: &str,
) -> ClassifyOutcome {
    if narrative.trim().is_empty() {
        debug!("blank narrative, skipping service call");
        return ClassifyOutcome::default();
    }

    let prompt = prompt::render(narrative);

    match backend.complete(&prompt).await {
        Ok(completion) => ClassifyOutcome {
            items: parse_classification(&completion.text),
            called: true,
            input_tokens: completion.input_tokens,
            output_tokens: completion.output_tokens,
        },
        Err(e) => {
            warn!(error = %e, "classification request failed");
            ClassifyOutcome {
                items: ClassificationItem::error_list(format!("API error: {e}"), None),
                called: true,
                ..ClassifyOutcome::default()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use asrskit_shared::{AsrsError, Result};

    use super::*;
    use crate::client::Completion;

    /// Backend answering from a script and recording every prompt it saw.
    #[derive(Default)]
    pub(crate) struct ScriptedBackend {
        answers: Mutex<VecDeque<Result<Completion>>>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn answer(self, text: &str) -> Self {
            self.answers.lock().unwrap().push_back(Ok(Completion {
                text: text.to_string(),
                input_tokens: 100,
                output_tokens: 40,
            }));
            self
        }

        pub(crate) fn fail(self, err: AsrsError) -> Self {
            self.answers.lock().unwrap().push_back(Err(err));
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, prompt: &str) -> Result<Completion> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Completion {
                    text: "[]".into(),
                    ..Completion::default()
                }))
        }
    }

    #[tokio::test]
    async fn blank_narrative_never_calls_service() {
        let backend = ScriptedBackend::new();
        for narrative in ["", "   ", "\n\t"] {
            let outcome = classify_narrative(&backend, narrative).await;
            assert!(outcome.items.is_empty());
            assert!(!outcome.called);
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn answer_is_parsed_into_entries() {
        let backend = ScriptedBackend::new().answer(
            r#"```json
[{"level":"Unsafe Acts of Operators","category":"Errors","sub_category":"Skill-Based Errors","justification_from_narrative":"Missed the altitude."}]
```"#,
        );
        let outcome = classify_narrative(&backend, "We missed the altitude.").await;

        assert!(outcome.called);
        assert!(!outcome.is_error());
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.input_tokens, 100);
        assert!(backend.prompts.lock().unwrap()[0].contains("We missed the altitude."));
    }

    #[tokio::test]
    async fn service_failure_becomes_inline_error() {
        let backend = ScriptedBackend::new().fail(AsrsError::Api {
            status: 500,
            body: "upstream overloaded".into(),
        });
        let outcome = classify_narrative(&backend, "Some narrative").await;

        assert!(outcome.is_error());
        match &outcome.items[..] {
            [ClassificationItem::Error(err)] => {
                assert!(err.error.starts_with("API error:"));
                assert!(err.error.contains("upstream overloaded"));
                assert!(err.raw_output.is_none());
            }
            other => panic!("expected single error, got {other:?}"),
        }
    }
}
