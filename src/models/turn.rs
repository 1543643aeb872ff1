//! Turn Request/Response Models
//!
//! External shapes of a turn and of the resume call that settles a
//! suspended proposal.

use serde::{Deserialize, Serialize};

use super::state::{ActionPayload, FileContext, Intent, PendingAction, TurnFault, WorkingState};

/// A file the caller already has open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInput {
    pub path: String,
    pub content: String,
}

/// Inbound request for one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Correlation token; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_context: Option<FileInput>,
}

impl TurnRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            thread_id: None,
            query: query.into(),
            file_context: None,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.file_context = Some(FileInput {
            path: path.into(),
            content: content.into(),
        });
        self
    }

    /// Attach a file loaded by an earlier turn, if any.
    pub fn with_loaded_file(self, file: Option<&FileContext>) -> Self {
        match file {
            Some(f) => self.with_file(f.path.clone(), f.content.clone()),
            None => self,
        }
    }
}

/// Read-only projection of a pending proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalDescriptor {
    pub kind: PendingAction,
    pub payload: ActionPayload,
    pub question: String,
}

impl ProposalDescriptor {
    pub fn from_payload(payload: &ActionPayload) -> Self {
        let question = match payload {
            ActionPayload::ApplyEdit { path: Some(p), .. } => {
                format!("Apply the proposed changes to {}?", p)
            }
            ActionPayload::ApplyEdit { path: None, .. } => {
                "Do you accept the proposed changes?".to_string()
            }
            ActionPayload::DeleteFile { path } => format!("Delete {}?", path),
            ActionPayload::RunCode { .. } => "Execute this code?".to_string(),
        };
        Self {
            kind: payload.pending_action(),
            payload: payload.clone(),
            question,
        }
    }
}

/// Outbound result of a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub thread_id: String,
    pub result_text: String,
    pub intent: Option<Intent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_payload: Option<ActionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal: Option<ProposalDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<TurnFault>,
    /// File loaded during or before this turn; send it back with the next
    /// request to keep working on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_context: Option<FileContext>,
}

impl TurnResponse {
    pub fn from_state(
        thread_id: impl Into<String>,
        state: &WorkingState,
        proposal: Option<ProposalDescriptor>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            result_text: state.result_text.clone(),
            intent: state.intent,
            confidence: state.confidence(),
            pending_action: state.pending_action(),
            action_payload: state.action_payload().cloned(),
            proposal,
            clarification_question: state.clarification_question.clone(),
            fault: state.fault.clone(),
            file_context: state.file_context.clone(),
        }
    }

    /// Whether the turn is waiting on a resume decision.
    pub fn is_suspended(&self) -> bool {
        self.proposal.is_some()
    }
}

/// Caller's verdict on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "a" | "yes" | "y" => Ok(Decision::Accept),
            "reject" | "r" | "no" | "n" => Ok(Decision::Reject),
            other => Err(format!("unknown decision: {}", other)),
        }
    }
}

/// Resume call for a suspended turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRequest {
    pub thread_id: String,
    pub decision: Decision,
}

/// Final result of a resumed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub result_text: String,
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::EditSource;

    #[test]
    fn test_turn_request_deserialize_minimal() {
        let req: TurnRequest = serde_json::from_str(r#"{"query": "hello"}"#).unwrap();
        assert_eq!(req.query, "hello");
        assert!(req.thread_id.is_none());
        assert!(req.file_context.is_none());
    }

    #[test]
    fn test_decision_wire_and_parse() {
        let req: ResumeRequest =
            serde_json::from_str(r#"{"thread_id": "t", "decision": "reject"}"#).unwrap();
        assert_eq!(req.decision, Decision::Reject);
        assert_eq!("Accept".parse::<Decision>().unwrap(), Decision::Accept);
        assert_eq!("n".parse::<Decision>().unwrap(), Decision::Reject);
        assert!("maybe".parse::<Decision>().is_err());
    }

    #[test]
    fn test_proposal_descriptor_projection() {
        let payload = ActionPayload::ApplyEdit {
            source: EditSource::Documentation,
            path: Some("lib.py".to_string()),
            code: "\"\"\"doc\"\"\"".to_string(),
            changes: None,
        };
        let proposal = ProposalDescriptor::from_payload(&payload);
        assert_eq!(proposal.kind, PendingAction::ConfirmEdit);
        assert_eq!(proposal.payload, payload);
        assert!(proposal.question.contains("lib.py"));

        let delete = ProposalDescriptor::from_payload(&ActionPayload::DeleteFile {
            path: "x.txt".to_string(),
        });
        assert_eq!(delete.kind, PendingAction::Delete);
    }

    #[test]
    fn test_turn_response_from_state() {
        let mut state = WorkingState::new("run: print(1)");
        state.classify(Intent::RunCode, 0.95);
        state.propose(ActionPayload::RunCode {
            code: "print(1)".to_string(),
        });
        state.result_text = "confirm?".to_string();

        let proposal = state.action_payload().map(ProposalDescriptor::from_payload);
        let response = TurnResponse::from_state("t-1", &state, proposal);
        assert!(response.is_suspended());
        assert_eq!(response.pending_action, Some(PendingAction::RunCode));
        assert_eq!(response.intent, Some(Intent::RunCode));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["pending_action"], "run_code");
        assert_eq!(json["action_payload"]["code"], "print(1)");
        assert!(json.get("fault").is_none());
        assert!(json.get("file_context").is_none());
    }

    #[test]
    fn test_file_context_round_trips_into_next_request() {
        let mut state = WorkingState::new("read file calc.py");
        state.classify(Intent::FileRead, 0.95);
        state.file_context = Some(FileContext::new("/w/calc.py", "x = 1\n"));

        let response = TurnResponse::from_state("t-2", &state, None);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["file_context"]["path"], "/w/calc.py");
        assert_eq!(json["file_context"]["detected_language"], "python");

        let next = TurnRequest::new("add a main guard")
            .with_loaded_file(response.file_context.as_ref());
        assert_eq!(
            next.file_context,
            Some(FileInput {
                path: "/w/calc.py".to_string(),
                content: "x = 1\n".to_string(),
            })
        );
        assert!(TurnRequest::new("hi").with_loaded_file(None).file_context.is_none());
    }
}
