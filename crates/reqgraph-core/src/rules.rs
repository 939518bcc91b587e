//! Hand-tuned lookup tables for relationship scoring and diagnostics.
//!
//! Everything here is plain data. The scorer, fallback assigner and
//! diagnostics extractor read these tables but never branch on specific
//! entries, so tuning happens here without touching control flow.

/// Words dropped by the text normalizer.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "being", "between", "both", "but", "by", "can", "could", "did", "do", "does",
    "each", "etc", "for", "from", "had", "has", "have", "he", "her", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "just", "may", "more", "most", "must", "need", "needs",
    "no", "not", "of", "on", "only", "or", "other", "our", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "up", "us", "use", "uses", "used",
    "very", "via", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "within", "would", "you", "your",
];

/// Role synonym table. When any word of an actor's name equals a key, the
/// whole synonym list replaces the actor's own words for matching.
pub const ROLE_SYNONYMS: &[(&str, &[&str])] = &[
    (
        "owner",
        &["owner", "admin", "administrator", "management", "manager", "director"],
    ),
    (
        "consultant",
        &["consultant", "consultants", "contractor", "contractors", "freelancer", "vendor"],
    ),
    (
        "client",
        &["client", "clients", "customer", "customers", "portal", "viewing"],
    ),
    (
        "employee",
        &["employee", "employees", "staff", "worker", "workers", "team"],
    ),
    (
        "manager",
        &["manager", "managers", "management", "supervisor", "lead", "director"],
    ),
];

/// Name tokens that mark an actor as client-type. Client-type actors are
/// never force-connected and their edges to internal modules are suspicious.
pub const CLIENT_ROLE_TOKENS: &[&str] = &["client", "customer", "user"];

/// Keywords in an actor's expanded list that grant management affinity.
pub const MANAGEMENT_TOKENS: &[&str] = &["owner", "manager", "director", "accountant"];

/// Module name fragments that management-affine actors are drawn toward.
pub const ANALYTICS_KEYWORDS: &[&str] = &["report", "analytic", "dashboard", "status"];

/// An actor whose name contains `actor_marker` is treated as management when
/// some other actor's name contains `partner_marker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoManagerRule {
    pub actor_marker: &'static str,
    pub partner_marker: &'static str,
}

// Tied to a single historical dataset; keep it as data so it can be removed.
pub const CO_MANAGER_RULES: &[CoManagerRule] = &[CoManagerRule {
    actor_marker: "wife",
    partner_marker: "owner",
}];

/// Module name fragments that identify a generic entry point, used when an
/// actor scored nothing anywhere.
pub const ENTRY_POINT_PATTERNS: &[&str] = &["portal", "dashboard", "main", "home"];

/// Module name fragments that make a module acceptable for client-type actors.
pub const CLIENT_FACING_KEYWORDS: &[&str] = &["portal", "client", "viewing"];

/// Modules matching any of these (case-insensitive) are always expected to
/// be used by somebody.
pub const KEY_MODULE_PATTERNS: &[(&str, &str)] = &[
    (
        "invoice submission portal",
        r"(?i)invoice.*(submission|submit|portal)|(submission|portal).*invoice",
    ),
    ("status tracking", r"(?i)status.*track|track.*status"),
    ("reporting and analytics", r"(?i)report.*analytic|analytic.*report"),
    ("workflow dashboard", r"(?i)workflow.*dashboard"),
    ("dashboard", r"(?i)dashboard"),
];

/// Extraction guidance shared by the LLM prompts and the MCP server instructions.
pub const EXTRACTION_RULES: &str = "\
1. Actors are roles, not people. Name each actor after the role it plays (\"Owner\", \"Consultant\", \
\"Client (Acme)\"). Actor names must be unique within a summary.\n\
2. Every actor must use at least one module. If the transcript describes an actor but no module serves it, \
either a module is missing or the actor is out of scope. Say which in openQuestions.\n\
3. Client-type actors (clients, customers, external users) only reach client-facing modules: portals, \
client views, status viewing. They never reach internal automation or back-office modules directly.\n\
4. Module descriptions name who uses the module and what for, in plain words. A description with fewer \
than two meaningful words gives the relationship graph nothing to work with.\n\
5. Key modules (invoice submission portals, status tracking, reporting and analytics, workflow \
dashboards) always have at least one actor that uses them.\n\
6. Priorities are one of must-have, should-have, nice-to-have. Pain point impact is low, medium or high; \
frequency is rare, sometimes, often or constant.\n\
7. Tools are external systems currently in use, by product name (\"QuickBooks\", \"Excel\"). Mention the \
tool in the description of every module that replaces or integrates with it.\n\
8. Adjust content, never drop it. Keep uploaded documents, risks and open questions that are still valid.";

/// Render the tables as plain text.
pub fn describe_tables() -> String {
    let mut out = String::with_capacity(2048);

    out.push_str("ROLE SYNONYMS:\n");
    for (key, synonyms) in ROLE_SYNONYMS {
        out.push_str("  ");
        out.push_str(key);
        out.push_str(" -> ");
        out.push_str(&synonyms.join(", "));
        out.push('\n');
    }

    let lists: [(&str, &[&str]); 5] = [
        ("CLIENT ROLE TOKENS", CLIENT_ROLE_TOKENS),
        ("MANAGEMENT TOKENS", MANAGEMENT_TOKENS),
        ("ANALYTICS KEYWORDS", ANALYTICS_KEYWORDS),
        ("ENTRY POINT PATTERNS", ENTRY_POINT_PATTERNS),
        ("CLIENT FACING KEYWORDS", CLIENT_FACING_KEYWORDS),
    ];
    for (title, words) in lists {
        out.push_str(title);
        out.push_str(": ");
        out.push_str(&words.join(", "));
        out.push('\n');
    }

    out.push_str("CO-MANAGER RULES:\n");
    for rule in CO_MANAGER_RULES {
        out.push_str(&format!(
            "  actor name contains \"{}\" while another actor name contains \"{}\"\n",
            rule.actor_marker, rule.partner_marker
        ));
    }

    out.push_str("KEY MODULE PATTERNS:\n");
    for (label, pattern) in KEY_MODULE_PATTERNS {
        out.push_str(&format!("  {label}: {pattern}\n"));
    }

    out
}
