//! Best-effort recovery of the JSON object an LLM was asked to emit.
//!
//! Models wrap output in code fences, add preambles, or stop mid-object when they hit the
//! token limit. [`repair`] always returns the compact text of a JSON object and is
//! idempotent; anything unrecoverable becomes [`EMPTY_TASKS`].

use serde_json::Value;

pub(crate) const EMPTY_TASKS: &str = r#"{"tasks":[]}"#;

pub(crate) fn repair(text: &str) -> String {
    let unfenced = strip_code_fence(text);

    let Some(start) = unfenced.find('{') else {
        return EMPTY_TASKS.to_string();
    };
    let candidate = match unfenced.rfind('}') {
        Some(end) if end > start => &unfenced[start..=end],
        _ => &unfenced[start..],
    };

    if let Some(value) = parse_object(candidate) {
        return canonical(&value);
    }

    close_truncated(candidate)
        .as_ref()
        .map(canonical)
        .unwrap_or_else(|| EMPTY_TASKS.to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text).ok().filter(Value::is_object)
}

fn canonical(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| EMPTY_TASKS.to_string())
}

/// Outcome of scanning a possibly truncated document.
struct Scan {
    /// Closers still owed, innermost last.
    open: Vec<char>,
    in_string: bool,
    dangling_escape: bool,
    /// Byte offset of the last separator comma outside strings, with the closers owed there.
    last_comma: Option<(usize, Vec<char>)>,
}

fn scan(text: &str) -> Option<Scan> {
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut last_comma = None;

    for (offset, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                if open.pop() != Some(ch) {
                    return None;
                }
            }
            ',' => last_comma = Some((offset, open.clone())),
            _ => {}
        }
    }

    Some(Scan { open, in_string, dangling_escape: escaped, last_comma })
}

fn closers(open: &[char]) -> String {
    open.iter().rev().collect()
}

/// Tries progressively more destructive completions and keeps the first that parses.
fn close_truncated(text: &str) -> Option<Value> {
    let scanned = scan(text)?;

    let mut body = text.to_string();
    if scanned.in_string {
        if scanned.dangling_escape {
            body.pop();
        }
        body.push('"');
    }

    let trimmed = body.trim_end();
    let tail = closers(&scanned.open);
    let mut attempts = Vec::with_capacity(4);

    if let Some(without_comma) = trimmed.strip_suffix(',') {
        attempts.push(format!("{without_comma}{tail}"));
    } else if trimmed.ends_with(':') {
        attempts.push(format!("{trimmed}null{tail}"));
    } else {
        attempts.push(format!("{trimmed}{tail}"));
        // Truncated right after an object key.
        attempts.push(format!("{trimmed}:null{tail}"));
    }

    // Drop the partial trailing element entirely.
    if let Some((offset, open_at_comma)) = &scanned.last_comma {
        attempts.push(format!("{}{}", &text[..*offset], closers(open_at_comma)));
    }

    attempts.iter().find_map(|attempt| parse_object(attempt))
}
