//! Orchestrator Constants
//!
//! Static tables: the path deny-list, the extension table, and the default
//! deterministic routing rules.

use crate::models::state::Intent;

/// Path substrings a request may never reference.
pub const BLOCKED_PATHS: &[&str] = &[
    "/etc",
    "/usr",
    ".env",
    ".ssh",
    "C:\\Windows",
    "C:\\Program Files",
    "node_modules",
    "__pycache__",
    ".git",
];

/// Returned instead of a handler result when the safety filter trips.
pub const DENIAL_MESSAGE: &str =
    "Access denied: this request references a protected path and cannot be processed.";

/// Returned when a handler fails or breaks its contract.
pub const HANDLER_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while handling that request. Please try again.";

/// Asked when the classifier wants clarification but supplied no question.
pub const DEFAULT_CLARIFICATION_QUESTION: &str =
    "Could you tell me a bit more about what you would like me to do?";

/// Confidence assigned to pattern-table and file-context matches.
pub const DETERMINISTIC_CONFIDENCE: f32 = 0.95;

/// Characters of code sent to the generator.
pub const PROMPT_CODE_LIMIT: usize = 5000;

/// Characters of a freshly read file sent for analysis.
pub const ANALYSIS_CODE_LIMIT: usize = 3000;

/// Verbs that turn a request about a loaded file into an edit.
pub const EDIT_VERBS: &[&str] = &[
    "add", "create", "insert", "remove", "delete", "change", "modify", "fix",
];

/// Extension → language.
pub const CODE_EXTENSIONS: &[(&str, &str)] = &[
    (".py", "python"),
    (".js", "javascript"),
    (".ts", "typescript"),
    (".jsx", "javascript"),
    (".tsx", "typescript"),
    (".java", "java"),
    (".cpp", "cpp"),
    (".c", "c"),
    (".cs", "csharp"),
    (".go", "go"),
    (".rs", "rust"),
    (".rb", "ruby"),
    (".php", "php"),
    (".html", "html"),
    (".css", "css"),
    (".sql", "sql"),
    (".json", "json"),
    (".yaml", "yaml"),
    (".yml", "yaml"),
    (".md", "markdown"),
];

/// Detect a language from a path's extension.
pub fn detect_language(path: &str) -> Option<&'static str> {
    let file_name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
    let dot = file_name.rfind('.')?;
    let ext = file_name[dot..].to_ascii_lowercase();
    CODE_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

/// One row of the deterministic routing table.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingRule {
    pub intent: Intent,
    /// Regexes, matched case-insensitively; any one matching selects the rule.
    pub patterns: Vec<String>,
    /// Lower wins.
    pub priority: u32,
}

impl RoutingRule {
    pub fn new(intent: Intent, priority: u32, patterns: &[&str]) -> Self {
        Self {
            intent,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            priority,
        }
    }
}

/// The built-in routing table.
pub fn default_routing_rules() -> Vec<RoutingRule> {
    let mut rules = command_prefix_rules();
    rules.extend(keyword_rules());
    rules
}

/// A request that opens with `<verb>:` names its intent outright, so these
/// outrank every keyword rule. The text after the colon is usually code and
/// must not be scanned for keywords.
fn command_prefix_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule::new(Intent::Refactor, 1, &[r"^\s*refactor\s*:"]),
        RoutingRule::new(Intent::Optimize, 2, &[r"^\s*optimi[sz]e\s*:"]),
        RoutingRule::new(
            Intent::Documentation,
            3,
            &[r"^\s*(document|documentation|docstrings?|docs?)\s*:"],
        ),
        RoutingRule::new(Intent::CodeReview, 4, &[r"^\s*review\s*:"]),
        RoutingRule::new(Intent::TestGen, 5, &[r"^\s*tests?\s*:"]),
        RoutingRule::new(Intent::Debug, 6, &[r"^\s*debug\s*:"]),
        RoutingRule::new(Intent::Explain, 7, &[r"^\s*explain\s*:"]),
    ]
}

/// Keyword rules, spaced by ten.
fn keyword_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule::new(
            Intent::RunCode,
            10,
            &[
                r"\brun\s+(python|code)\b",
                r"\bexecute\s+(python|code)\b",
                r"^\s*(run|execute)\s*:",
            ],
        ),
        RoutingRule::new(
            Intent::FileRead,
            20,
            &[
                r"read.*file",
                r"analy[sz]e.*file",
                r"open.*file",
                r"read and analy[sz]e",
                r"check.*file",
                r"\bshow\s+file\b",
                r"file:?\s*[A-Za-z]:\\",
                r"[A-Za-z]:\\.*\.(py|js|ts|java|cpp|c|go|rs|rb|php|html|css|json|md|txt)\b",
            ],
        ),
        RoutingRule::new(
            Intent::FileDelete,
            30,
            &[
                r"delete.*file",
                r"remove.*file",
                r"\bdelete\s+\S*[/\\.]\S*",
            ],
        ),
        RoutingRule::new(
            Intent::FileWrite,
            40,
            &[r"write.*file", r"save.*file", r"create.*file", r"\bsave\s+(to|as)\b"],
        ),
        RoutingRule::new(
            Intent::CodeReview,
            50,
            &[
                r"review.*code",
                r"code.*review",
                r"check.*quality",
                r"best.*practice",
                r"code.*smell",
            ],
        ),
        RoutingRule::new(
            Intent::Refactor,
            60,
            &[
                r"refactor",
                r"improve.*code",
                r"clean.*up",
                r"restructure",
                r"simplify",
            ],
        ),
        RoutingRule::new(
            Intent::TestGen,
            70,
            &[
                r"generate.*test",
                r"write.*test",
                r"create.*test",
                r"unit.*test",
                r"test.*case",
            ],
        ),
        RoutingRule::new(
            Intent::Documentation,
            80,
            &[
                r"add.*docstring",
                r"document.*code",
                r"add.*comment",
                r"generate.*doc",
                r"documentation",
                r"docstring",
            ],
        ),
        RoutingRule::new(
            Intent::Optimize,
            90,
            &[
                r"optimi[sz]e",
                r"performance",
                r"faster",
                r"efficient",
                r"speed.*up",
            ],
        ),
        RoutingRule::new(
            Intent::Debug,
            100,
            &[
                r"debug",
                r"fix.*bug",
                r"\berror\b",
                r"not.*working",
                r"broken",
                r"traceback",
            ],
        ),
        RoutingRule::new(
            Intent::Explain,
            110,
            &[r"explain", r"what.*does", r"how.*work", r"understand"],
        ),
        RoutingRule::new(
            Intent::FolderList,
            120,
            &[
                r"list.*file",
                r"list.*dir",
                r"show.*files",
                r"show.*folder",
                r"workspace",
            ],
        ),
        RoutingRule::new(
            Intent::FileEdit,
            130,
            &[r"edit.*file", r"modify.*file", r"change.*file", r"update.*file"],
        ),
    ]
}
