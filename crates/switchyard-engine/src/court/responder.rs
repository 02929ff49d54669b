//! The seam between a proceeding and whatever answers its prompts.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use switchyard_types::{Result, SwitchyardError};

use crate::court::CourtStage;

/// One prompt sent to a responder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponderRequest {
    pub case_id: String,
    pub stage: CourtStage,
    pub prompt: String,
}

/// Answers stage prompts with raw JSON. A model adapter in production, a
/// script in tests and dry runs.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, request: &ResponderRequest) -> Result<Value>;
}

/// Replays canned responses per stage and records every request.
///
/// Responses are consumed in order; the last one for a stage is repeated
/// once the queue is down to it. A stage with nothing scripted is an error.
#[derive(Debug, Default)]
pub struct ScriptedResponder {
    queues: Mutex<HashMap<CourtStage, VecDeque<Value>>>,
    requests: Mutex<Vec<ResponderRequest>>,
}

impl ScriptedResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, stage: CourtStage, responses: impl IntoIterator<Item = Value>) -> Self {
        for response in responses {
            self.push(stage, response);
        }
        self
    }

    pub fn push(&self, stage: CourtStage, response: Value) {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(stage)
            .or_default()
            .push_back(response);
    }

    /// Builds a script from `{"indict": [..], "verdict": {..}, ...}`. A bare
    /// object stands for a single response.
    pub fn from_json(script: &Value) -> Result<Self> {
        let Value::Object(map) = script else {
            return Err(SwitchyardError::Other(
                "script must be an object keyed by stage".into(),
            ));
        };
        let responder = Self::new();
        for (key, value) in map {
            let stage: CourtStage = key.parse().map_err(SwitchyardError::Other)?;
            match value {
                Value::Array(items) => {
                    for item in items {
                        responder.push(stage, item.clone());
                    }
                }
                other => responder.push(stage, other.clone()),
            }
        }
        Ok(responder)
    }

    pub fn requests(&self) -> Vec<ResponderRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn respond(&self, request: &ResponderRequest) -> Result<Value> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = queues.get_mut(&request.stage);
        match queue {
            Some(q) if q.len() > 1 => Ok(q.pop_front().unwrap_or_default()),
            Some(q) if !q.is_empty() => Ok(q[0].clone()),
            _ => Err(SwitchyardError::HandlerError {
                node: request.stage.to_string(),
                message: "no scripted response".into(),
            }),
        }
    }
}
