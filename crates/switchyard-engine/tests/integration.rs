//! End-to-end tests for the Switchyard engine.
//!
//! Each test loads a YAML pipeline, builds the graph, walks it, and checks the
//! walker state. The later tests run whole court and dialectic proceedings
//! against scripted responders.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use switchyard_dsl::{load_pipeline, EdgeDef, NodeDef, PipelineDef};
use switchyard_engine::court::{
    run_court, run_dialectic, CaseFile, CourtConfig, CourtStage, ScriptedResponder,
    VerdictDecision,
};
use switchyard_engine::{
    build_graph, build_graph_with, default_light_masks, equip_mask, load_state, save_state,
    Artifact, DirectWalker, Edge, EdgeFactory, EventEmitter, Graph, GraphOptions, Node,
    NodeContext, NodeRegistry, Transition, WalkEvent, Walker,
};
use switchyard_types::{persona_by_name, Result, SwitchyardError, WalkStatus, WalkerState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Mark {
    confidence: f64,
}

impl Artifact for Mark {
    fn kind(&self) -> &str {
        "mark"
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Emits a [`Mark`] with a fixed confidence.
struct Step {
    name: String,
    confidence: f64,
}

#[async_trait]
impl Node for Step {
    fn name(&self) -> &str {
        &self.name
    }
    async fn process(&self, _nc: &NodeContext<'_>) -> Result<Box<dyn Artifact>> {
        Ok(Box::new(Mark {
            confidence: self.confidence,
        }))
    }
}

struct Broken(String);

#[async_trait]
impl Node for Broken {
    fn name(&self) -> &str {
        &self.0
    }
    async fn process(&self, _nc: &NodeContext<'_>) -> Result<Box<dyn Artifact>> {
        Err(SwitchyardError::HandlerError {
            node: self.0.clone(),
            message: "disk full".into(),
        })
    }
}

/// Fires when the artifact's confidence reaches `min`.
struct Threshold {
    def: EdgeDef,
    min: f64,
}

impl Edge for Threshold {
    fn id(&self) -> &str {
        &self.def.id
    }
    fn source(&self) -> &str {
        &self.def.from
    }
    fn target(&self) -> &str {
        &self.def.to
    }
    fn is_shortcut(&self) -> bool {
        self.def.shortcut
    }
    fn evaluate(&self, artifact: &dyn Artifact, _state: &mut WalkerState) -> Option<Transition> {
        (artifact.confidence() >= self.min)
            .then(|| Transition::to(&self.def.to, format!("confidence >= {}", self.min)))
    }
}

/// Fires until its own loop counter, keyed by edge id, reaches `limit`.
struct Bounded {
    def: EdgeDef,
    limit: u32,
}

impl Edge for Bounded {
    fn id(&self) -> &str {
        &self.def.id
    }
    fn source(&self) -> &str {
        &self.def.from
    }
    fn target(&self) -> &str {
        &self.def.to
    }
    fn is_loop(&self) -> bool {
        true
    }
    fn evaluate(&self, _artifact: &dyn Artifact, state: &mut WalkerState) -> Option<Transition> {
        if state.loop_count(&self.def.id) >= self.limit {
            return None;
        }
        let n = state.increment_loop(&self.def.id);
        Some(Transition::to(&self.def.to, format!("pass {n}")).with_context("pass", json!(n)))
    }
}

struct Never(EdgeDef);

impl Edge for Never {
    fn id(&self) -> &str {
        &self.0.id
    }
    fn source(&self) -> &str {
        &self.0.from
    }
    fn target(&self) -> &str {
        &self.0.to
    }
    fn evaluate(&self, _: &dyn Artifact, _: &mut WalkerState) -> Option<Transition> {
        None
    }
}

fn pipeline(yaml: &str) -> PipelineDef {
    let def = load_pipeline(yaml.as_bytes()).expect("pipeline should parse");
    def.validate().expect("pipeline should validate");
    def
}

fn registry() -> NodeRegistry {
    let mut reg = NodeRegistry::new();
    reg.register("step", |d: &NodeDef| {
        Box::new(Step {
            name: d.name.clone(),
            confidence: 0.5,
        }) as Box<dyn Node>
    });
    reg.register("sure", |d: &NodeDef| {
        Box::new(Step {
            name: d.name.clone(),
            confidence: 0.95,
        }) as Box<dyn Node>
    });
    reg.register("broken", |d: &NodeDef| Box::new(Broken(d.name.clone())) as Box<dyn Node>);
    reg
}

fn edges() -> EdgeFactory {
    let mut f = EdgeFactory::new();
    f.register("SHORT", |d: &EdgeDef| {
        Box::new(Threshold {
            def: d.clone(),
            min: 0.9,
        }) as Box<dyn Edge>
    });
    f.register("AGAIN", |d: &EdgeDef| {
        Box::new(Bounded {
            def: d.clone(),
            limit: 3,
        }) as Box<dyn Edge>
    });
    f.register("FOREVER", |d: &EdgeDef| {
        Box::new(Bounded {
            def: d.clone(),
            limit: u32::MAX,
        }) as Box<dyn Edge>
    });
    f.register("NEVER", |d: &EdgeDef| Box::new(Never(d.clone())) as Box<dyn Edge>);
    f
}

fn graph(yaml: &str) -> Graph {
    build_graph(&pipeline(yaml), &registry(), &edges()).expect("graph should build")
}

fn walker() -> DirectWalker {
    let identity = persona_by_name("herald").expect("herald exists").identity;
    DirectWalker::new(identity, WalkerState::new("w-1"))
}

fn visited(state: &WalkerState) -> Vec<&str> {
    state.history.iter().map(|s| s.node.as_str()).collect()
}

fn edge_ids(state: &WalkerState) -> Vec<&str> {
    state.history.iter().map(|s| s.edge_id.as_str()).collect()
}

const LINEAR: &str = r#"
pipeline: linear
nodes:
  - {name: a, family: step}
  - {name: b, family: step}
  - {name: c, family: step}
edges:
  - {id: E1, name: first, from: a, to: b, condition: a finished}
  - {id: E2, name: second, from: b, to: c}
  - {id: E3, name: last, from: c, to: _done}
start: a
done: _done
"#;

// ---------------------------------------------------------------------------
// Test 1: Three-node linear walk
// ---------------------------------------------------------------------------

#[tokio::test]
async fn linear_walk_records_every_step() {
    let g = graph(LINEAR);
    let mut w = walker();
    g.walk(&CancellationToken::new(), &mut w, "a").await.unwrap();

    let state = w.state();
    assert_eq!(state.status, WalkStatus::Done);
    assert_eq!(visited(state), vec!["a", "b", "c"]);
    assert_eq!(edge_ids(state), vec!["E1", "E2", "E3"]);
    assert_eq!(state.history[0].explanation, "a finished");
    assert_eq!(state.current_node, "c");
    assert!(state.is_terminal());
}

// ---------------------------------------------------------------------------
// Test 2: Shortcut edge declared first wins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shortcut_skips_intermediate_node() {
    let g = graph(
        r#"
pipeline: shortcut
nodes:
  - {name: triage, family: sure}
  - {name: investigate, family: step}
  - {name: report, family: step}
edges:
  - {id: SHORT, name: confident, from: triage, to: report, shortcut: true}
  - {id: E1, name: dig, from: triage, to: investigate}
  - {id: E2, name: write, from: investigate, to: report}
  - {id: E3, name: end, from: report, to: _done}
start: triage
done: _done
"#,
    );
    let mut w = walker();
    g.walk(&CancellationToken::new(), &mut w, "triage").await.unwrap();

    assert_eq!(visited(w.state()), vec!["triage", "report"]);
    assert_eq!(w.state().history[0].edge_id, "SHORT");
    assert!(g.edges_from("triage")[0].is_shortcut());
}

// ---------------------------------------------------------------------------
// Test 3: Loop edge bounded by a walker-state counter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn loop_runs_exactly_its_bound() {
    let g = graph(
        r#"
pipeline: retry
nodes:
  - {name: attempt, family: step}
edges:
  - {id: AGAIN, name: retry, from: attempt, to: attempt, loop: true}
  - {id: OUT, name: give up, from: attempt, to: _done}
start: attempt
done: _done
"#,
    );
    let mut w = walker();
    g.walk(&CancellationToken::new(), &mut w, "attempt").await.unwrap();

    let state = w.state();
    assert_eq!(state.loop_count("AGAIN"), 3);
    assert_eq!(state.loop_count("attempt"), 0);
    assert_eq!(edge_ids(state), vec!["AGAIN", "AGAIN", "AGAIN", "OUT"]);
    assert_eq!(state.context["pass"], 3);
}

// ---------------------------------------------------------------------------
// Test 4: No matching edge keeps history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_matching_edge_fails_with_history_intact() {
    let g = graph(
        r#"
pipeline: stuck
nodes:
  - {name: a, family: step}
  - {name: b, family: step}
edges:
  - {id: E1, name: go, from: a, to: b}
  - {id: NEVER, name: blocked, from: b, to: _done}
start: a
done: _done
"#,
    );
    let mut w = walker();
    let err = g
        .walk(&CancellationToken::new(), &mut w, "a")
        .await
        .unwrap_err();

    match err {
        SwitchyardError::NoMatchingEdge { node, artifact_type } => {
            assert_eq!(node, "b");
            assert_eq!(artifact_type, "mark");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(w.state().status, WalkStatus::Error);
    assert_eq!(edge_ids(w.state()), vec!["E1"]);
}

// ---------------------------------------------------------------------------
// Test 5: Unknown start node
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_start_node_is_node_not_found() {
    let g = graph(LINEAR);
    let mut w = walker();
    let err = g
        .walk(&CancellationToken::new(), &mut w, "zz")
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchyardError::NodeNotFound { ref node, .. } if node == "zz"));
    assert_eq!(w.state().status, WalkStatus::Error);
    assert!(w.state().history.is_empty());
}

// ---------------------------------------------------------------------------
// Test 6: Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_token_stops_the_walk() {
    let g = graph(LINEAR);
    let mut w = walker();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = g.walk(&cancel, &mut w, "a").await.unwrap_err();
    assert!(matches!(err, SwitchyardError::Cancelled { ref node } if node == "a"));
    assert_eq!(w.state().status, WalkStatus::Error);
}

// ---------------------------------------------------------------------------
// Test 7: Node failure is wrapped with the node name
// ---------------------------------------------------------------------------

#[tokio::test]
async fn node_failure_names_the_node() {
    let g = graph(
        r#"
pipeline: fragile
nodes:
  - {name: a, family: step}
  - {name: write, family: broken}
edges:
  - {id: E1, name: go, from: a, to: write}
  - {id: E2, name: end, from: write, to: _done}
start: a
done: _done
"#,
    );
    let mut w = walker();
    let err = g
        .walk(&CancellationToken::new(), &mut w, "a")
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchyardError::NodeFailed { ref node, .. } if node == "write"));
    assert!(matches!(err.root(), SwitchyardError::HandlerError { .. }));
    assert_eq!(w.state().history.len(), 1);
}

// ---------------------------------------------------------------------------
// Test 8: Step ceiling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn step_ceiling_stops_runaway_loops() {
    let def = pipeline(
        r#"
pipeline: spin
nodes:
  - {name: spin, family: step}
edges:
  - {id: FOREVER, name: again, from: spin, to: spin, loop: true}
start: spin
done: _done
"#,
    );
    let g = build_graph_with(
        &def,
        &registry(),
        &edges(),
        GraphOptions::new().max_steps(Some(5)),
    )
    .unwrap();
    let mut w = walker();
    let err = g
        .walk(&CancellationToken::new(), &mut w, "spin")
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchyardError::StepLimitExceeded { limit: 5, .. }));
    assert_eq!(w.state().history.len(), 5);
}

// ---------------------------------------------------------------------------
// Test 9: Events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn events_trace_the_walk() {
    let emitter = EventEmitter::new(64);
    let mut rx = emitter.subscribe();
    let g = build_graph_with(
        &pipeline(LINEAR),
        &registry(),
        &edges(),
        GraphOptions::new().events(emitter),
    )
    .unwrap();
    let mut w = walker();
    g.walk(&CancellationToken::new(), &mut w, "a").await.unwrap();

    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    assert!(matches!(events.first(), Some(WalkEvent::WalkStarted { start, .. }) if start == "a"));
    assert!(matches!(events.last(), Some(WalkEvent::WalkCompleted { steps: 3, .. })));
    let matched = events
        .iter()
        .filter(|e| matches!(e, WalkEvent::EdgeMatched { .. }))
        .count();
    assert_eq!(matched, 3);
    assert!(events.iter().all(|e| e.walker_id() == "w-1"));
}

// ---------------------------------------------------------------------------
// Test 10: Failed walk state survives a checkpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_walk_checkpoint_roundtrip() {
    let g = graph(
        r#"
pipeline: stuck
nodes:
  - {name: a, family: step}
  - {name: b, family: step}
edges:
  - {id: E1, name: go, from: a, to: b}
  - {id: NEVER, name: blocked, from: b, to: _done}
start: a
done: _done
"#,
    );
    let mut w = walker();
    let _ = g.walk(&CancellationToken::new(), &mut w, "a").await;

    let dir = tempfile::tempdir().unwrap();
    save_state(w.state(), dir.path()).await.unwrap();
    let loaded = load_state(dir.path()).await.unwrap().unwrap();
    assert_eq!(loaded.status, WalkStatus::Error);
    assert_eq!(loaded.history.len(), 1);
    assert_eq!(loaded.history[0].edge_id, "E1");
}

// ---------------------------------------------------------------------------
// Court helpers
// ---------------------------------------------------------------------------

fn court_config() -> CourtConfig {
    CourtConfig {
        enabled: true,
        ..Default::default()
    }
}

fn indictment(confidence: f64) -> serde_json::Value {
    json!({
        "charged_classification": "product_bug",
        "prosecution_narrative": "null pointer in the parser",
        "evidence": [
            {"description": "NPE in parse()", "source": "ci log", "weight": 0.7},
            {"description": "fails on every run", "source": "history", "weight": 0.4}
        ],
        "confidence": confidence
    })
}

fn verdict(decision: &str, classification: &str) -> serde_json::Value {
    json!({
        "decision": decision,
        "final_classification": classification,
        "confidence": 0.8,
        "reasoning": "weighed both sides"
    })
}

fn remand_verdict() -> serde_json::Value {
    json!({
        "decision": "remand",
        "confidence": 0.4,
        "reasoning": "evidence item 1 is unexplained",
        "remand_feedback": {
            "challenged_evidence": [1],
            "specific_questions": ["Does it fail on a clean runner?"]
        }
    })
}

fn case(confidence: f64) -> CaseFile {
    CaseFile::new("C-42", "product_bug", confidence)
}

// ---------------------------------------------------------------------------
// Test 11: Fast-tracked case never reaches the hearing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fast_track_skips_discovery_and_hearing() {
    let responder = Arc::new(
        ScriptedResponder::new()
            .with(CourtStage::Indict, [indictment(0.97)])
            .with(
                CourtStage::Defend,
                [json!({
                    "challenges": [{"evidence_index": 0, "challenge": "log is from a retry"}],
                    "alternative_hypothesis": "flaky runner"
                })],
            )
            .with(CourtStage::Verdict, [verdict("affirm", "product_bug")]),
    );
    let res = run_court(&court_config(), &case(0.7), responder.clone(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(res.activated);
    assert_eq!(res.decision, Some(VerdictDecision::Affirm));
    assert!(!res.flipped);
    let state = res.state.unwrap();
    assert_eq!(visited(&state), vec!["indict", "defend", "verdict"]);
    assert_eq!(edge_ids(&state), vec!["HD1", "defend-verdict", "HD6"]);
    assert!(responder
        .requests()
        .iter()
        .all(|r| r.stage != CourtStage::Hearing && r.stage != CourtStage::Discover));
}

// ---------------------------------------------------------------------------
// Test 12: Contested case goes through a converging hearing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn contested_case_holds_a_hearing_and_can_flip() {
    let responder = Arc::new(
        ScriptedResponder::new()
            .with(CourtStage::Indict, [indictment(0.7)])
            .with(CourtStage::Discover, [json!({"sources": ["runner metrics"]})])
            .with(
                CourtStage::Defend,
                [json!({"challenges": [{"evidence_index": 1, "challenge": "only fails on runner 3"}]})],
            )
            .with(
                CourtStage::Hearing,
                [
                    json!({"prosecution_argument": "p1", "defense_rebuttal": "d1", "judge_notes": "n1", "converged": false}),
                    json!({"prosecution_argument": "p2", "defense_rebuttal": "d2", "judge_notes": "n2", "converged": true}),
                ],
            )
            .with(CourtStage::Verdict, [verdict("amend", "environment_issue")]),
    );
    let res = run_court(&court_config(), &case(0.6), responder.clone(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(res.decision, Some(VerdictDecision::Amend));
    assert_eq!(res.final_classification, "environment_issue");
    assert!(res.flipped);
    assert_eq!(res.handoffs, 5);
    let state = res.state.unwrap();
    assert_eq!(
        edge_ids(&state),
        vec!["indict-discover", "discover-defend", "HD3", "HD5", "HD7"]
    );
    let hearing_calls = responder
        .requests()
        .iter()
        .filter(|r| r.stage == CourtStage::Hearing)
        .count();
    assert_eq!(hearing_calls, 2);
}

// ---------------------------------------------------------------------------
// Test 13: Remand bound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn endless_remands_stop_after_max_remands() {
    let config = CourtConfig {
        max_remands: 2,
        max_handoffs: 100,
        ..court_config()
    };
    let responder = Arc::new(
        ScriptedResponder::new()
            .with(CourtStage::Indict, [indictment(0.7)])
            .with(CourtStage::Discover, [json!({})])
            .with(CourtStage::Defend, [json!({"plea_deal": true})])
            .with(CourtStage::Verdict, [remand_verdict()]),
    );
    let res = run_court(&config, &case(0.7), responder.clone(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(res.remand_count, 2);
    assert_eq!(res.decision, Some(VerdictDecision::Mistrial));
    assert_eq!(res.handoffs, 12);
    let state = res.state.unwrap();
    assert_eq!(state.status, WalkStatus::Done);
    assert_eq!(state.history.last().unwrap().edge_id, "HD11");
    assert_eq!(state.context["disposition"], "mistrial");

    let indict_prompts: Vec<String> = responder
        .requests()
        .into_iter()
        .filter(|r| r.stage == CourtStage::Indict)
        .map(|r| r.prompt)
        .collect();
    assert_eq!(indict_prompts.len(), 3);
    assert!(!indict_prompts[0].contains("REMAND FEEDBACK"));
    assert!(indict_prompts[1].contains("--- COURT REMAND FEEDBACK ---"));
    assert!(indict_prompts[1].contains("Does it fail on a clean runner?"));
}

// ---------------------------------------------------------------------------
// Test 14: Handoff bound
// ---------------------------------------------------------------------------

#[tokio::test]
async fn handoff_budget_ends_in_mistrial() {
    let config = CourtConfig {
        max_handoffs: 3,
        ..court_config()
    };
    let responder = Arc::new(
        ScriptedResponder::new()
            .with(CourtStage::Indict, [indictment(0.7)])
            .with(CourtStage::Discover, [json!({})])
            .with(CourtStage::Defend, [json!({"plea_deal": true})])
            .with(CourtStage::Verdict, [remand_verdict()]),
    );
    let res = run_court(&config, &case(0.7), responder.clone(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(res.decision, Some(VerdictDecision::Mistrial));
    assert_eq!(res.handoffs, 3);
    assert_eq!(responder.calls(), 3);
    assert!(res.reasoning.contains("handoff budget"));
    assert_eq!(res.state.unwrap().status, WalkStatus::Done);
}

#[tokio::test]
async fn remand_without_budget_for_another_cycle_is_hd10() {
    let config = CourtConfig {
        max_handoffs: 4,
        ..court_config()
    };
    let responder = Arc::new(
        ScriptedResponder::new()
            .with(CourtStage::Indict, [indictment(0.7)])
            .with(CourtStage::Discover, [json!({})])
            .with(CourtStage::Defend, [json!({"plea_deal": true})])
            .with(CourtStage::Verdict, [remand_verdict()]),
    );
    let res = run_court(&config, &case(0.7), responder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(res.decision, Some(VerdictDecision::Mistrial));
    assert_eq!(res.remand_count, 0);
    let state = res.state.unwrap();
    assert_eq!(state.history.last().unwrap().edge_id, "HD10");
}

// ---------------------------------------------------------------------------
// Test 15: Malformed response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_response_is_a_mistrial_not_an_error() {
    let responder = Arc::new(
        ScriptedResponder::new().with(CourtStage::Indict, [json!({"confidence": "very"})]),
    );
    let res = run_court(&court_config(), &case(0.7), responder, &CancellationToken::new())
        .await
        .unwrap();

    assert!(res.activated);
    assert!(res.is_mistrial());
    assert_eq!(res.final_classification, "product_bug");
    let state = res.state.unwrap();
    assert_eq!(state.status, WalkStatus::Done);
    assert!(state.history.is_empty());
    assert!(state.context["mistrial_reason"]
        .as_str()
        .unwrap()
        .contains("malformed"));
}

// ---------------------------------------------------------------------------
// Test 16: Activation band
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disabled_or_out_of_band_cases_are_not_tried() {
    let responder = Arc::new(ScriptedResponder::new());
    let cancel = CancellationToken::new();

    let off = run_court(&CourtConfig::default(), &case(0.7), responder.clone(), &cancel)
        .await
        .unwrap();
    assert!(!off.activated);

    for confidence in [0.3, 0.85, 0.99] {
        let res = run_court(&court_config(), &case(confidence), responder.clone(), &cancel)
            .await
            .unwrap();
        assert!(!res.activated, "confidence {confidence} should not activate");
    }
    assert_eq!(responder.calls(), 0);
}

// ---------------------------------------------------------------------------
// Test 17: Dialectic proceeding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dialectic_runs_on_its_own_node_names() {
    let responder = Arc::new(
        ScriptedResponder::new()
            .with(
                CourtStage::Indict,
                [json!({
                    "charged_classification": "product_bug",
                    "thesis_narrative": "the parser regressed",
                    "confidence": 0.96
                })],
            )
            .with(CourtStage::Defend, [json!({"concession": true})])
            .with(
                CourtStage::Verdict,
                [json!({"synthesis": "acquit", "final_classification": "automation_bug"})],
            ),
    );
    let res = run_dialectic(&court_config(), &case(0.55), responder.clone(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(res.decision, Some(VerdictDecision::Acquit));
    assert!(res.flipped);
    let state = res.state.unwrap();
    assert_eq!(state.id, "C-42-dialectic");
    assert_eq!(visited(&state), vec!["thesis", "antithesis", "synthesis"]);
    assert_eq!(edge_ids(&state), vec!["HD1", "HD2", "HD9"]);
    assert!(responder.requests()[0].prompt.contains("Dialectic step: indict"));
    assert!(responder.requests()[0].prompt.contains("Thesis-holder"));
}

// ---------------------------------------------------------------------------
// Test 18: Caller cancellation propagates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_is_not_absorbed_as_mistrial() {
    let responder = Arc::new(ScriptedResponder::new().with(CourtStage::Indict, [indictment(0.7)]));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = run_court(&court_config(), &case(0.7), responder, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), SwitchyardError::Cancelled { .. }));
}

// ---------------------------------------------------------------------------
// Test 19: A masked node changes the route
// ---------------------------------------------------------------------------

/// Confident only when the judgment flag is present in meta.
struct Review(String);

#[async_trait]
impl Node for Review {
    fn name(&self) -> &str {
        &self.0
    }
    async fn process(&self, nc: &NodeContext<'_>) -> Result<Box<dyn Artifact>> {
        let authorized = nc.meta.get("review_authority") == Some(&json!(true));
        Ok(Box::new(Mark {
            confidence: if authorized { 1.0 } else { 0.1 },
        }))
    }
}

const REVIEWED: &str = r#"
pipeline: reviewed
nodes:
  - {name: review, family: review}
  - {name: rework, family: step}
edges:
  - {id: SHORT, name: approve, from: review, to: _done, shortcut: true}
  - {id: E2, name: send back, from: review, to: rework}
  - {id: E3, name: finish, from: rework, to: _done}
start: review
done: _done
"#;

async fn walk_review(masked: bool) -> WalkerState {
    let mut reg = registry();
    reg.register("review", move |d: &NodeDef| {
        let node: Box<dyn Node> = Box::new(Review(d.name.clone()));
        if !masked {
            return node;
        }
        let judgment = default_light_masks()
            .get("mask-of-judgment")
            .expect("judgment mask registered");
        Box::new(equip_mask(node, judgment).expect("valid at review")) as Box<dyn Node>
    });
    let g = build_graph(&pipeline(REVIEWED), &reg, &edges()).unwrap();
    let mut w = walker();
    g.walk(&CancellationToken::new(), &mut w, "review").await.unwrap();
    w.into_state()
}

#[tokio::test]
async fn mask_meta_reaches_the_node_during_a_walk() {
    let plain = walk_review(false).await;
    assert_eq!(visited(&plain), vec!["review", "rework"]);

    let masked = walk_review(true).await;
    assert_eq!(visited(&masked), vec!["review"]);
    assert_eq!(edge_ids(&masked), vec!["SHORT"]);
    assert_eq!(masked.status, WalkStatus::Done);
}
