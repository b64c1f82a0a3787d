use std::cell::Cell;

use cqa_ai::pipeline::RagAnswerer;
use cqa_ai::route::{IntentLexicon, IntentRouter};
use cqa_ai::tools::NumericTool;
use cqa_core::domain::{RagAnswer, Route, SalaryEstimate};
use cqa_core::error::AppError;
use pretty_assertions::assert_eq;

#[derive(Default)]
struct MockRag {
    calls: Cell<u32>,
}

impl RagAnswerer for MockRag {
    fn answer(&self, query: &str) -> RagAnswer {
        self.calls.set(self.calls.get() + 1);
        RagAnswer {
            answer: format!("**Answer:**\n- about {query}"),
            citations: Vec::new(),
            score: 0.9,
            used: true,
            error: None,
        }
    }
}

struct MockTool {
    fail: bool,
    calls: Cell<u32>,
}

impl MockTool {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: Cell::new(0),
        }
    }
}

impl NumericTool for MockTool {
    fn name(&self) -> &str {
        "salary_tool"
    }

    fn estimate(&self, query: &str) -> Result<SalaryEstimate, AppError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(AppError::new("SALARY_TOOL_FAILED", "tool exploded"));
        }
        Ok(SalaryEstimate {
            query: query.to_string(),
            estimate_aud: Some(85_000),
            samples_used: 1,
            hits: Vec::new(),
            error: None,
            fallback_used: false,
        })
    }
}

#[test]
fn salary_question_goes_to_the_tool_only() {
    let (rag, tool) = (MockRag::default(), MockTool::new(false));
    let router = IntentRouter::new(IntentLexicon::default(), &rag, &tool);

    let resp = router.route("average salary for a data analyst in Hobart");
    assert_eq!(resp.route, Route::Salary);
    assert!(resp.rag.is_none());
    assert!(resp.tools.is_none());
    let branch = resp.tool.unwrap();
    assert_eq!(branch.name, "salary_tool");
    assert_eq!(branch.output.unwrap().estimate_aud, Some(85_000));
    assert_eq!(rag.calls.get(), 0);
}

#[test]
fn salary_and_duties_question_runs_both_branches() {
    let (rag, tool) = (MockRag::default(), MockTool::new(false));
    let router = IntentRouter::new(IntentLexicon::default(), &rag, &tool);

    let resp = router.route("average salary and main responsibilities of a software engineer");
    assert_eq!(resp.route, Route::Both);
    assert!(resp.rag.unwrap().used);
    assert!(resp.tool.is_none());
    let tools = resp.tools.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "salary_tool");
    assert!(tools[0].output.is_some());
}

#[test]
fn document_and_unmatched_questions_go_to_rag() {
    let (rag, tool) = (MockRag::default(), MockTool::new(false));
    let router = IntentRouter::new(IntentLexicon::default(), &rag, &tool);

    for q in ["What does an ICT business analyst do?", "hello there"] {
        let resp = router.route(q);
        assert_eq!(resp.route, Route::Rag, "{q}");
        assert!(resp.rag.is_some());
        assert!(resp.tool.is_none() && resp.tools.is_none());
    }
    assert_eq!(tool.calls.get(), 0);
}

#[test]
fn blank_query_is_rejected_without_downstream_calls() {
    let (rag, tool) = (MockRag::default(), MockTool::new(false));
    let router = IntentRouter::new(IntentLexicon::default(), &rag, &tool);

    let resp = router.route("   ");
    assert_eq!(resp.route, Route::Rag);
    assert_eq!(resp.error.unwrap().code, "EMPTY_QUERY");
    assert!(resp.rag.is_none());
    assert_eq!(rag.calls.get(), 0);
    assert_eq!(tool.calls.get(), 0);
}

#[test]
fn tool_failure_stays_in_its_branch() {
    let (rag, tool) = (MockRag::default(), MockTool::new(true));
    let router = IntentRouter::new(IntentLexicon::default(), &rag, &tool);

    let resp = router.route("what is the pay and key duties of a junior tester");
    assert_eq!(resp.route, Route::Both);
    assert!(resp.rag.unwrap().used);
    let tools = resp.tools.unwrap();
    assert!(tools[0].output.is_none());
    assert_eq!(
        tools[0].error.as_deref(),
        Some("[SALARY_TOOL_FAILED] tool exploded")
    );
}

#[test]
fn salary_route_serializes_only_its_branch() {
    let (rag, tool) = (MockRag::default(), MockTool::new(false));
    let router = IntentRouter::new(IntentLexicon::default(), &rag, &tool);

    let v = serde_json::to_value(router.route("how much does a data engineer earn")).unwrap();
    let keys = v.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys, vec!["route".to_string(), "tool".to_string()]);
    assert_eq!(v["tool"]["name"], "salary_tool");
}
