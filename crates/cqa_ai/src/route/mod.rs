use cqa_core::domain::{Route, RoutedResponse, ToolBranch};
use cqa_core::error::{codes, AppError};

use crate::pipeline::RagAnswerer;
use crate::tools::NumericTool;

/// Substring hints for intent detection, matched against the lower-cased query.
#[derive(Debug, Clone)]
pub struct IntentLexicon {
    pub salary_hints: Vec<String>,
    pub doc_hints: Vec<String>,
}

impl Default for IntentLexicon {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            salary_hints: owned(&[
                "salary", "median salary", "typical salary", "average salary", "typical pay",
                "average pay", "pay", "wage", "how much does", "how much do", "how much would",
                "annual salary", "yearly salary", "earn", "earns", "earning", "compensation",
                "remuneration", "hobart", "launceston", "tasmania", "regional", "part-time",
                "part time", "junior", "graduate", "entry level",
            ]),
            doc_hints: owned(&[
                "according to", "from the document", "osca", "ict", "job family", "explain",
                "describe", "responsibilit", "dutie", "scope", "role of", "summari", "what does",
                "overview", "tasks", "main tasks", "primary duty", "kind of work", "core duties",
                "responsibilities of", "what is the role", "what is the responsibility",
                "what kind of work", "key duties", "key tasks",
            ]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub salary_like: bool,
    pub doc_like: bool,
}

impl Intent {
    pub fn route(self) -> Route {
        match (self.salary_like, self.doc_like) {
            (true, true) => Route::Both,
            (true, false) => Route::Salary,
            (false, _) => Route::Rag,
        }
    }
}

impl IntentLexicon {
    pub fn classify(&self, query: &str) -> Intent {
        let ql = query.to_lowercase();
        let hit = |hints: &[String]| hints.iter().any(|h| ql.contains(h.as_str()));
        Intent {
            salary_like: hit(&self.salary_hints),
            doc_like: hit(&self.doc_hints),
        }
    }
}

pub struct IntentRouter<'a> {
    lexicon: IntentLexicon,
    rag: &'a dyn RagAnswerer,
    tool: &'a dyn NumericTool,
}

impl<'a> IntentRouter<'a> {
    pub fn new(
        lexicon: IntentLexicon,
        rag: &'a dyn RagAnswerer,
        tool: &'a dyn NumericTool,
    ) -> Self {
        Self { lexicon, rag, tool }
    }

    pub fn route(&self, query: &str) -> RoutedResponse {
        let q = query.trim();
        if q.is_empty() {
            let mut resp = RoutedResponse::new(Route::Rag);
            resp.error = Some(AppError::new(codes::EMPTY_QUERY, "Query must not be empty"));
            return resp;
        }

        let intent = self.lexicon.classify(q);
        let route = intent.route();
        tracing::info!(
            route = ?route,
            salary_like = intent.salary_like,
            doc_like = intent.doc_like,
            "Query routed."
        );

        let mut resp = RoutedResponse::new(route);
        match route {
            Route::Rag => resp.rag = Some(self.rag.answer(q)),
            Route::Salary => resp.tool = Some(self.run_tool(q)),
            Route::Both => {
                resp.rag = Some(self.rag.answer(q));
                resp.tools = Some(vec![self.run_tool(q)]);
            }
        }
        resp
    }

    fn run_tool(&self, query: &str) -> ToolBranch {
        match self.tool.estimate(query) {
            Ok(out) => ToolBranch {
                name: self.tool.name().to_string(),
                output: Some(out),
                error: None,
            },
            Err(e) => {
                tracing::warn!(tool = self.tool.name(), err = %e, "Numeric tool failed.");
                ToolBranch {
                    name: self.tool.name().to_string(),
                    output: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
