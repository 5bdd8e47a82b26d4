//! Boolean refine-stage predicates.
//!
//! A [`DecisionClassifier`] asks the provider when it has one and falls back on the
//! keyword heuristic otherwise, so every record it sees resolves to a decision.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::heuristics;
use super::Classifier;
use crate::core::config::ProviderConfig;
use crate::core::errors::{Result, ThememinerError};
use crate::core::types::{Decision, DecisionSource, Record, Verdict};
use crate::provider::{CompletionProvider, CompletionRequest, ResponseShape};

const INTERESTING_PROMPT: &str = "You are classifying whether a conversation's short theme tags \
indicate an interesting topic versus mundane.\n\
Interesting: unique ideas, abstractions, deep or novel concepts, aesthetics, philosophy, \
math/geometry, visually evocative seeds, or intellectually rich discussions.\n\
Mundane: logistics, how-to, troubleshooting, device setup/unlocking, security/account \
configuration, basic cooking or food safety, household cleaning/maintenance, wedding/event \
logistics, generic software/CLI usage, OS/configuration (e.g., Arch Linux, packages, drivers), \
diagnosing performance/stability or productivity tips (e.g., tmux shortcuts), remote \
access/protocols (SSH/X11/SCP), browser extensions, notebooks/scraping, git/admin, house \
maintenance/pest control, event linens/planning, and administrative/policy or etiquette \
questions.\n\
Default to mundane if uncertain or if tags are primarily tools, vendors, errors, or \
operational verbs.\n\
Use the hints as soft guidance; they are not exhaustive.\n\
Answer using a strict JSON schema with a single boolean field 'interesting'.";

const PHILOSOPHICAL_PROMPT: &str = "Decide if a conversation described by short theme tags is \
philosophically interesting.\n\
Philosophically interesting = engages questions of meaning, knowledge, mind, values, ethics, \
metaphysics, ontology, epistemology, aesthetics, logic, agency, consciousness, semantics, or \
deep reflective themes (e.g., alignment ethics, wisdom pacing).\n\
Mundane/logistical topics (device setup, drivers, packages, generic troubleshooting, event \
logistics) are not philosophically interesting. When in doubt, return false.\n\
Answer with strict JSON schema containing one boolean field 'philosophically_interesting'.";

/// Decisions answer with a single boolean; a few tokens suffice.
const DECISION_MAX_OUTPUT_TOKENS: u32 = 10;

/// Which refine-stage question is asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionPredicate {
    /// Interesting (image-prompt-worthy) versus mundane
    Interesting,
    /// Philosophically interesting
    Philosophical,
}

impl DecisionPredicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interesting => "interesting",
            Self::Philosophical => "philosophical",
        }
    }

    /// JSON field holding the boolean answer.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Interesting => "interesting",
            Self::Philosophical => "philosophically_interesting",
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            Self::Interesting => "InterestingDecision",
            Self::Philosophical => "PhilosophyDecision",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Interesting => INTERESTING_PROMPT,
            Self::Philosophical => PHILOSOPHICAL_PROMPT,
        }
    }

    /// Strict schema with one required boolean.
    pub fn schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(self.field().to_string(), json!({ "type": "boolean" }));
        json!({
            "type": "object",
            "properties": properties,
            "required": [self.field()],
            "additionalProperties": false
        })
    }

    /// Prompt text for a set of tags.
    pub fn user_prompt(&self, tags: &[String]) -> String {
        let mut prompt = format!("Theme tags: {}\n\n", tags.join(", "));
        if *self == Self::Interesting {
            prompt.push_str("Guidance (hints, not rules):\n");
            prompt.push_str(&format!(
                "Positive cues: {}\n",
                heuristics::INTERESTING_POSITIVE_HINTS.join(", ")
            ));
            prompt.push_str(&format!(
                "Negative cues: {}\n\n",
                heuristics::INTERESTING_NEGATIVE_HINTS.join(", ")
            ));
        }
        prompt.push_str("Return JSON only.");
        prompt
    }

    /// Keyword fallback.
    pub fn heuristic(&self, tags: &[String]) -> (bool, String) {
        match self {
            Self::Interesting => heuristics::is_interesting(tags),
            Self::Philosophical => heuristics::is_philosophical(tags),
        }
    }

    /// Title used for the stage rollup.
    pub fn rollup_title(&self) -> &'static str {
        match self {
            Self::Interesting => "Interesting Conversations",
            Self::Philosophical => "Philosophically Interesting Conversations",
        }
    }
}

impl fmt::Display for DecisionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate classifier over tagged records.
pub struct DecisionClassifier {
    predicate: DecisionPredicate,
    provider: Option<Arc<dyn CompletionProvider>>,
    model: String,
}

impl DecisionClassifier {
    /// Without a provider every decision comes from the heuristic.
    pub fn new(
        predicate: DecisionPredicate,
        provider: Option<Arc<dyn CompletionProvider>>,
        config: &ProviderConfig,
    ) -> Self {
        Self {
            predicate,
            provider,
            model: config.resolved_decision_model(),
        }
    }

    pub fn predicate(&self) -> DecisionPredicate {
        self.predicate
    }

    pub fn uses_provider(&self) -> bool {
        self.provider.is_some()
    }

    fn request(&self, tags: &[String]) -> CompletionRequest {
        CompletionRequest {
            system: self.predicate.system_prompt().to_string(),
            user: self.predicate.user_prompt(tags),
            model: self.model.clone(),
            max_output_tokens: DECISION_MAX_OUTPUT_TOKENS,
            temperature: 0.0,
            shape: ResponseShape::JsonSchema {
                name: self.predicate.schema_name().to_string(),
                schema: self.predicate.schema(),
            },
        }
    }

    async fn ask_provider(
        &self,
        provider: &dyn CompletionProvider,
        tags: &[String],
    ) -> Result<bool> {
        let raw = provider.complete(&self.request(tags)).await?;
        parse_decision_completion(self.predicate, &raw)
    }

    fn heuristic_verdict(&self, tags: &[String]) -> Verdict {
        let (accepted, rationale) = self.predicate.heuristic(tags);
        Verdict::Decision {
            decision: Decision {
                accepted,
                source: DecisionSource::Heuristic,
            },
            rationale: Some(rationale),
        }
    }
}

#[async_trait]
impl Classifier for DecisionClassifier {
    async fn classify(&self, record: &Record) -> Result<Verdict> {
        let tags = record.tags();
        let Some(provider) = &self.provider else {
            return Ok(self.heuristic_verdict(tags));
        };

        match self.ask_provider(provider.as_ref(), tags).await {
            Ok(accepted) => {
                debug!(id = %record.id, predicate = %self.predicate, accepted, "provider decision");
                Ok(Verdict::Decision {
                    decision: Decision {
                        accepted,
                        source: DecisionSource::Provider,
                    },
                    rationale: None,
                })
            }
            Err(err) => {
                warn!(
                    id = %record.id,
                    predicate = %self.predicate,
                    error = %err,
                    "provider decision unavailable, using keyword heuristic"
                );
                Ok(self.heuristic_verdict(tags))
            }
        }
    }
}

/// Extract the predicate's boolean from a completion.
pub fn parse_decision_completion(predicate: DecisionPredicate, raw: &str) -> Result<bool> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ThememinerError::malformed(format!("decision is not JSON: {e}"), raw))?;
    value
        .get(predicate.field())
        .and_then(Value::as_bool)
        .ok_or_else(|| {
            ThememinerError::malformed(
                format!("decision has no boolean '{}'", predicate.field()),
                raw,
            )
        })
}
