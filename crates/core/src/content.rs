//! Structural validation for scene component markup.
//!
//! Generated scene content is component source: a body of nested
//! `<Element ...>` tags with `{ ... }` expression blocks. Generation is
//! non-deterministic, so correctness checks here are structural, not
//! byte-level: does the markup parse, which top-level elements exist, did
//! an edit preserve the elements it was not asked to touch.

use regex::Regex;
use std::sync::OnceLock;

/// A structural problem in generated markup. The message is written to be
/// fed back to the generation backend as a correction hint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MarkupError(pub String);

/// A top-level element block: its tag name plus the exact source slice
/// from opening tag through matching close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementBlock {
    pub name: String,
    pub source: String,
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        // Opening, closing, or self-closing tag. Attribute text may contain
        // anything except angle brackets.
        Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9_.]*)((?s:[^<>])*?)(/?)>").expect("static regex")
    })
}

/// Validate that content parses as well-formed component markup.
///
/// Checks:
/// - non-empty after trimming;
/// - at least one element tag;
/// - every open tag has a matching close tag, properly nested;
/// - `{`/`}` expression braces are balanced.
pub fn validate_markup(content: &str) -> Result<(), MarkupError> {
    if content.trim().is_empty() {
        return Err(MarkupError("content is empty".to_string()));
    }

    let mut depth: i32 = 0;
    for (idx, ch) in content.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(MarkupError(format!(
                        "unmatched closing brace at byte {idx}"
                    )));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(MarkupError(format!("{depth} unclosed expression brace(s)")));
    }

    let mut stack: Vec<&str> = Vec::new();
    let mut saw_element = false;
    for cap in tag_regex().captures_iter(content) {
        saw_element = true;
        let closing = !cap[1].is_empty();
        let self_closing = !cap[4].is_empty();
        let name = cap.get(2).expect("tag name group").as_str();

        if closing {
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => {
                    return Err(MarkupError(format!(
                        "mismatched close tag: expected </{open}>, found </{name}>"
                    )))
                }
                None => {
                    return Err(MarkupError(format!(
                        "close tag </{name}> with no open tag"
                    )))
                }
            }
        } else if !self_closing {
            stack.push(cap.get(2).expect("tag name group").as_str());
        }
    }
    if let Some(open) = stack.last() {
        return Err(MarkupError(format!("unclosed element <{open}>")));
    }
    if !saw_element {
        return Err(MarkupError("content contains no elements".to_string()));
    }
    Ok(())
}

/// Extract the top-level (depth zero) element blocks of valid markup.
///
/// Call [`validate_markup`] first; on unbalanced input the result is
/// best-effort.
pub fn top_level_elements(content: &str) -> Vec<ElementBlock> {
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut open: Option<(usize, String)> = None;

    for cap in tag_regex().captures_iter(content) {
        let whole = cap.get(0).expect("whole match");
        let closing = !cap[1].is_empty();
        let self_closing = !cap[4].is_empty();
        let name = &cap[2];

        if closing {
            if depth > 0 {
                depth -= 1;
            }
            if depth == 0 {
                if let Some((start, open_name)) = open.take() {
                    blocks.push(ElementBlock {
                        name: open_name,
                        source: content[start..whole.end()].to_string(),
                    });
                }
            }
        } else if self_closing {
            if depth == 0 {
                blocks.push(ElementBlock {
                    name: name.to_string(),
                    source: whole.as_str().to_string(),
                });
            }
        } else {
            if depth == 0 {
                open = Some((whole.start(), name.to_string()));
            }
            depth += 1;
        }
    }
    blocks
}

/// Check that a surgical edit preserved everything it was not asked to
/// touch: every top-level element of `input` whose tag name is not
/// mentioned in `prompt` must appear byte-identical in `output`.
///
/// Many prompts describe a change without naming any element ("change the
/// color to blue"). Freezing every block would then reject any edit at
/// all, so when no input element name appears in the prompt the check
/// relaxes to element survival: blocks may change, but none may be
/// dropped outright.
///
/// Returns the names of the violated elements, for use as a correction
/// hint on retry.
pub fn surgical_preservation_violations(
    input: &str,
    output: &str,
    prompt: &str,
) -> Vec<String> {
    let prompt_lower = prompt.to_lowercase();
    let input_blocks = top_level_elements(input);
    let prompt_names_an_element = input_blocks
        .iter()
        .any(|block| prompt_lower.contains(&block.name.to_lowercase()));

    if !prompt_names_an_element {
        let output_names: Vec<String> = top_level_elements(output)
            .into_iter()
            .map(|block| block.name.to_lowercase())
            .collect();
        return input_blocks
            .into_iter()
            .filter(|block| !output_names.contains(&block.name.to_lowercase()))
            .map(|block| block.name)
            .collect();
    }

    input_blocks
        .into_iter()
        .filter(|block| !prompt_lower.contains(&block.name.to_lowercase()))
        .filter(|block| !output.contains(block.source.as_str()))
        .map(|block| block.name)
        .collect()
}

/// Structural similarity of two markup documents, as the ratio of their
/// top-level element counts (`min / max`, 1.0 when both are empty).
pub fn structural_similarity(a: &str, b: &str) -> f64 {
    let ca = top_level_elements(a).len();
    let cb = top_level_elements(b).len();
    if ca == 0 && cb == 0 {
        return 1.0;
    }
    let (lo, hi) = (ca.min(cb) as f64, ca.max(cb) as f64);
    lo / hi
}

/// Whether `content` still carries the reported error signature.
///
/// A fix rewrites the offending code, not the error prose, so matching
/// the whole message line would miss a scene that merely rephrases it.
/// Instead the match key is the offending identifier from the first
/// non-empty line of the signature: the first identifier-like token that
/// is neither error-message prose nor an error class name. A full stack
/// trace can be passed straight through. When no such token exists the
/// check falls back to whole-line containment.
pub fn contains_error_signature(content: &str, signature: &str) -> bool {
    let key = signature
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if key.is_empty() {
        return false;
    }
    let content_lower = content.to_lowercase();
    match offending_token(key) {
        Some(token) => content_lower.contains(&token.to_lowercase()),
        None => content_lower.contains(&key.to_lowercase()),
    }
}

fn ident_regex() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").expect("static regex"))
}

// Prose that appears in runtime error messages but never names the
// offending code.
const ERROR_PROSE: &[&str] = &[
    "is", "not", "defined", "cannot", "can't", "read", "reading", "properties", "property",
    "of", "the", "a", "an", "at", "in", "on", "to", "undefined", "null", "uncaught",
    "unexpected", "invalid", "missing", "failed", "error", "warning", "token",
];

fn offending_token(line: &str) -> Option<&str> {
    ident_regex()
        .find_iter(line)
        .map(|m| m.as_str())
        .find(|token| {
            let lower = token.to_lowercase();
            !ERROR_PROSE.contains(&lower.as_str())
                && !lower.ends_with("error")
                && !lower.ends_with("exception")
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
