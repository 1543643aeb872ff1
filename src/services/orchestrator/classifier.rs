//! Intent Classifier
//!
//! Three phases, first hit wins:
//! 1. the deterministic routing table (lowest matching priority),
//! 2. the loaded-file edit rule,
//! 3. the generation collaborator, scored and clamped.
//!
//! Classification never fails: a broken fallback yields `generate` at zero
//! confidence with a `classification_failure` fault.

use std::sync::Arc;

use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use will_of_code_llm::TextGenerator;

use super::constants::{
    default_routing_rules, RoutingRule, DEFAULT_CLARIFICATION_QUESTION,
    DETERMINISTIC_CONFIDENCE, EDIT_VERBS,
};
use crate::models::state::{FileContext, Intent, TurnFault, WorkingState};
use crate::utils::error::{AppError, AppResult};

// ============================================================================
// Routing Table
// ============================================================================

struct CompiledRoute {
    intent: Intent,
    priority: u32,
    patterns: RegexSet,
}

/// Deterministic routing table, kept sorted by priority.
pub struct RoutingTable {
    routes: Vec<CompiledRoute>,
}

impl std::fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| (r.priority, r.intent)))
            .finish()
    }
}

impl RoutingTable {
    /// Compile and sort a table. Rejects duplicate priorities, invalid
    /// regexes, and the `clarify` pseudo-intent.
    pub fn new(rules: Vec<RoutingRule>) -> AppResult<Self> {
        let mut routes = Vec::with_capacity(rules.len());
        for rule in rules {
            if rule.intent == Intent::Clarify {
                return Err(AppError::config(
                    "Routing table cannot target the clarify intent",
                ));
            }
            let patterns = RegexSetBuilder::new(&rule.patterns)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    AppError::config(format!(
                        "Invalid routing pattern for {}: {}",
                        rule.intent, e
                    ))
                })?;
            routes.push(CompiledRoute {
                intent: rule.intent,
                priority: rule.priority,
                patterns,
            });
        }

        routes.sort_by_key(|r| r.priority);
        if let Some(dup) = routes.windows(2).find(|w| w[0].priority == w[1].priority) {
            return Err(AppError::config(format!(
                "Duplicate routing priority {} ({} and {})",
                dup[0].priority, dup[0].intent, dup[1].intent
            )));
        }

        Ok(Self { routes })
    }

    /// The built-in table.
    pub fn default_table() -> AppResult<Self> {
        Self::new(default_routing_rules())
    }

    /// Lowest-priority route whose pattern set matches.
    pub fn match_intent(&self, query: &str) -> Option<Intent> {
        self.routes
            .iter()
            .find(|r| r.patterns.is_match(query))
            .map(|r| r.intent)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Which phase produced the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPhase {
    Pattern,
    FileContext,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f32,
    pub phase: ClassificationPhase,
    pub clarification_question: Option<String>,
    pub fault: Option<TurnFault>,
}

impl Classification {
    fn deterministic(intent: Intent, phase: ClassificationPhase) -> Self {
        Self {
            intent,
            confidence: DETERMINISTIC_CONFIDENCE,
            phase,
            clarification_question: None,
            fault: None,
        }
    }

    fn failure(reason: impl Into<String>) -> Self {
        Self {
            intent: Intent::Generate,
            confidence: 0.0,
            phase: ClassificationPhase::Fallback,
            clarification_question: None,
            fault: Some(TurnFault::ClassificationFailure {
                reason: reason.into(),
            }),
        }
    }
}

/// Fallback reply shape.
#[derive(Debug, Deserialize)]
struct FallbackReply {
    intent: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    needs_clarification: bool,
    #[serde(default)]
    clarification_question: Option<String>,
}

const CLASSIFIER_SYSTEM_PROMPT: &str = "You route requests for a coding assistant. \
Pick exactly one category for the request and rate your confidence from 0 to 1. \
Respond only with a JSON object.";

pub struct Classifier {
    table: RoutingTable,
    generator: Arc<dyn TextGenerator>,
    clarification_threshold: f32,
}

impl Classifier {
    pub fn new(
        table: RoutingTable,
        generator: Arc<dyn TextGenerator>,
        clarification_threshold: f32,
    ) -> Self {
        Self {
            table,
            generator,
            clarification_threshold,
        }
    }

    /// Classify a request.
    pub fn classify(&self, query: &str, file_context: Option<&FileContext>) -> Classification {
        if let Some(intent) = self.table.match_intent(query) {
            debug!(intent = %intent, "Classified by routing table");
            return Classification::deterministic(intent, ClassificationPhase::Pattern);
        }

        if file_context.is_some() && contains_edit_verb(query) {
            debug!("Classified as file edit from loaded file");
            return Classification::deterministic(
                Intent::FileEdit,
                ClassificationPhase::FileContext,
            );
        }

        self.classify_fallback(query)
    }

    /// Classify the state's request and record the result on it.
    pub fn apply(&self, state: &mut WorkingState) -> Classification {
        let classification = self.classify(state.query(), state.file_context.as_ref());
        state.classify(classification.intent, classification.confidence);
        state.clarification_question = classification.clarification_question.clone();
        if classification.fault.is_some() {
            state.fault = classification.fault.clone();
        }
        classification
    }

    fn classify_fallback(&self, query: &str) -> Classification {
        let prompt = fallback_prompt(query);
        let reply = match self.generator.generate_json(CLASSIFIER_SYSTEM_PROMPT, &prompt) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Fallback classification failed");
                return Classification::failure(e.to_string());
            }
        };

        match self.interpret(reply) {
            Ok(classification) => {
                debug!(
                    intent = %classification.intent,
                    confidence = classification.confidence,
                    "Classified by fallback"
                );
                classification
            }
            Err(reason) => {
                warn!(reason = %reason, "Fallback classification reply unusable");
                Classification::failure(reason)
            }
        }
    }

    fn interpret(&self, reply: Value) -> Result<Classification, String> {
        let reply: FallbackReply = serde_json::from_value(reply)
            .map_err(|e| format!("Unparseable classification reply: {}", e))?;

        let intent = Intent::parse(&reply.intent)
            .filter(|i| Intent::CLASSIFIABLE.contains(i))
            .unwrap_or(Intent::Generate);

        let raw = reply.confidence.unwrap_or(0.0) as f32;
        let confidence = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };

        if reply.needs_clarification && confidence < self.clarification_threshold {
            let question = reply
                .clarification_question
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .unwrap_or_else(|| DEFAULT_CLARIFICATION_QUESTION.to_string());
            return Ok(Classification {
                intent: Intent::Clarify,
                confidence,
                phase: ClassificationPhase::Fallback,
                clarification_question: Some(question),
                fault: None,
            });
        }

        Ok(Classification {
            intent,
            confidence,
            phase: ClassificationPhase::Fallback,
            clarification_question: None,
            fault: None,
        })
    }
}

fn contains_edit_verb(query: &str) -> bool {
    query
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| EDIT_VERBS.iter().any(|v| word.eq_ignore_ascii_case(v)))
}

fn fallback_prompt(query: &str) -> String {
    let categories: Vec<&str> = Intent::CLASSIFIABLE.iter().map(|i| i.as_str()).collect();
    format!(
        "Categories: {}\n\n\
         Request:\n{}\n\n\
         Return JSON: {{\"intent\": \"<category>\", \"confidence\": 0.0, \
         \"needs_clarification\": false, \"clarification_question\": null}}",
        categories.join(", "),
        query
    )
}
