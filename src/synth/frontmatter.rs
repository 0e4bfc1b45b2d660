// src/synth/frontmatter.rs
//! Frontmatter parsing for generated posts.
//!
//! A document is `---`, a block of `key: value` lines, `---`, then the body.
//! Values are bare or quoted scalars, inline lists (`[a, "b"]`), or block
//! lists (`key:` followed by `- item` lines).

use chrono::NaiveDate;

use crate::error::GenerationError;
use crate::synth::types::GeneratedPost;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Empty,
    Scalar(String),
    List(Vec<String>),
}

/// Ordered key/value pairs of one frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    entries: Vec<(String, Value)>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Drop a surrounding Markdown code fence, if the model added one.
///
/// The trailing fence is only treated as the outer closer when the fences
/// left after the opener are unbalanced. A reply whose outer fence was never
/// closed keeps the closing fence of its last code block.
fn strip_code_fence(raw: &str) -> &str {
    let s = raw.trim();
    if !s.starts_with("```") {
        return s;
    }
    let Some(i) = s.find('\n') else {
        return "";
    };
    let inner = s[i + 1..].trim_end();
    let fences = inner.lines().filter(|l| is_fence(l)).count();
    let closes_outer = fences % 2 == 1 && inner.lines().last().map(str::trim) == Some("```");
    match inner.strip_suffix("```") {
        Some(stripped) if closes_outer => stripped,
        _ => inner,
    }
}

/// Split a document into (frontmatter block, body). Text before the opening
/// delimiter is ignored.
pub fn split_document(raw: &str) -> Result<(&str, &str), GenerationError> {
    let doc = strip_code_fence(raw);

    let mut offset = 0usize;
    let mut open: Option<usize> = None;
    for line in doc.split_inclusive('\n') {
        let end = offset + line.len();
        if line.trim() == DELIMITER {
            match open {
                None => open = Some(end),
                Some(start) => {
                    let block = &doc[start..offset];
                    let body = &doc[end..];
                    return Ok((block, body));
                }
            }
        }
        offset = end;
    }
    Err(GenerationError::MissingFrontmatter)
}

/// Parse a frontmatter block into ordered pairs. Duplicate keys, stray list
/// items and unterminated quotes are syntax errors.
pub fn parse_block(block: &str) -> Result<Frontmatter, GenerationError> {
    let mut fm = Frontmatter::default();

    for (idx, raw_line) in block.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix('-') {
            let Some((_, value)) = fm.entries.last_mut() else {
                return Err(syntax(line_no, "list item without a key"));
            };
            let item = unquote(item.trim(), line_no)?;
            match value {
                Value::Empty => *value = Value::List(vec![item]),
                Value::List(items) => items.push(item),
                Value::Scalar(_) => return Err(syntax(line_no, "list item after a scalar value")),
            }
            continue;
        }

        let Some((key, rest)) = line.split_once(':') else {
            return Err(syntax(line_no, "expected `key: value`"));
        };
        let key = key.trim();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(syntax(line_no, format!("invalid key `{key}`")));
        }
        if fm.get(key).is_some() {
            return Err(syntax(line_no, format!("duplicate key `{key}`")));
        }

        let rest = rest.trim();
        let value = if rest.is_empty() {
            Value::Empty
        } else if rest.starts_with('[') {
            Value::List(parse_inline_list(rest, line_no)?)
        } else {
            Value::Scalar(unquote(rest, line_no)?)
        };
        fm.entries.push((key.to_string(), value));
    }

    Ok(fm)
}

fn syntax(line: usize, reason: impl Into<String>) -> GenerationError {
    GenerationError::Syntax {
        line,
        reason: reason.into(),
    }
}

fn unquote(s: &str, line: usize) -> Result<String, GenerationError> {
    let mut chars = s.chars();
    match chars.next() {
        Some('"') => {
            let mut out = String::new();
            let mut it = s.char_indices().skip(1);
            while let Some((i, c)) = it.next() {
                match c {
                    '"' => {
                        if !s[i + 1..].trim().is_empty() {
                            return Err(syntax(line, "text after closing quote"));
                        }
                        return Ok(out);
                    }
                    '\\' => {
                        let Some((_, esc)) = it.next() else { break };
                        match esc {
                            'n' => out.push('\n'),
                            'r' => out.push('\r'),
                            't' => out.push('\t'),
                            'u' => {
                                let hex: String = it.by_ref().take(4).map(|(_, h)| h).collect();
                                let decoded = u32::from_str_radix(&hex, 16)
                                    .ok()
                                    .filter(|_| hex.len() == 4)
                                    .and_then(char::from_u32)
                                    .ok_or_else(|| {
                                        syntax(line, format!("invalid escape `\\u{hex}`"))
                                    })?;
                                out.push(decoded);
                            }
                            other => out.push(other),
                        }
                    }
                    _ => out.push(c),
                }
            }
            Err(syntax(line, "unterminated double quote"))
        }
        Some('\'') => {
            let inner = &s[1..];
            let mut out = String::new();
            let mut it = inner.char_indices().peekable();
            while let Some((i, c)) = it.next() {
                if c == '\'' {
                    if matches!(it.peek(), Some((_, '\''))) {
                        out.push('\'');
                        it.next();
                        continue;
                    }
                    if !inner[i + 1..].trim().is_empty() {
                        return Err(syntax(line, "text after closing quote"));
                    }
                    return Ok(out);
                }
                out.push(c);
            }
            Err(syntax(line, "unterminated single quote"))
        }
        _ => Ok(s.trim().to_string()),
    }
}

fn parse_inline_list(s: &str, line: usize) -> Result<Vec<String>, GenerationError> {
    let inner = s
        .strip_prefix('[')
        .and_then(|r| r.trim_end().strip_suffix(']'))
        .ok_or_else(|| syntax(line, "unterminated inline list"))?;

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c == ',' => {
                push_item(&mut items, &current, line)?;
                current.clear();
            }
            None => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(syntax(line, "unterminated quote in list"));
    }
    push_item(&mut items, &current, line)?;
    Ok(items)
}

fn push_item(items: &mut Vec<String>, raw: &str, line: usize) -> Result<(), GenerationError> {
    let raw = raw.trim();
    if !raw.is_empty() {
        items.push(unquote(raw, line)?);
    }
    Ok(())
}

fn scalar<'a>(fm: &'a Frontmatter, field: &'static str) -> Result<&'a str, GenerationError> {
    match fm.get(field) {
        None | Some(Value::Empty) => Err(GenerationError::MissingField(field)),
        Some(Value::List(_)) => Err(GenerationError::InvalidField {
            field,
            reason: "expected a single value, found a list".into(),
        }),
        Some(Value::Scalar(s)) => Ok(s.as_str()),
    }
}

/// `YYYY-MM-DD`, zero-padded, nothing before or after.
fn parse_date(s: &str) -> Result<NaiveDate, GenerationError> {
    let b = s.as_bytes();
    let shaped = b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        });
    let invalid = |detail: String| GenerationError::InvalidField {
        field: "date",
        reason: format!("`{s}` is not YYYY-MM-DD{detail}"),
    };
    if !shaped {
        return Err(invalid(String::new()));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| invalid(format!(" ({e})")))
}

fn parse_tags(fm: &Frontmatter) -> Result<Vec<String>, GenerationError> {
    let items = match fm.get("tags") {
        None => return Err(GenerationError::MissingField("tags")),
        Some(Value::Empty) => return Ok(Vec::new()),
        Some(Value::Scalar(s)) => {
            return Err(GenerationError::InvalidField {
                field: "tags",
                reason: format!("expected a list, found `{s}`"),
            })
        }
        Some(Value::List(items)) => items,
    };

    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for t in items {
        let t = t.trim();
        if t.is_empty() {
            return Err(GenerationError::InvalidField {
                field: "tags",
                reason: "empty tag".into(),
            });
        }
        if !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    Ok(out)
}

fn parse_featured(s: &str) -> Result<bool, GenerationError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(GenerationError::InvalidField {
            field: "featured",
            reason: format!("expected true or false, found `{s}`"),
        }),
    }
}

/// Parse a generated document into a validated post. Every field except the
/// title is required; a missing title falls back to `fallback_title`.
pub fn parse_post(raw: &str, fallback_title: &str) -> Result<GeneratedPost, GenerationError> {
    let (block, body) = split_document(raw)?;
    let fm = parse_block(block)?;

    let title = match fm.get("title") {
        Some(Value::Scalar(t)) if !t.trim().is_empty() => t.trim().to_string(),
        _ => {
            tracing::warn!(
                target: "synth",
                fallback = fallback_title,
                "generated post has no usable title, using fallback"
            );
            fallback_title.trim().to_string()
        }
    };

    let date = parse_date(scalar(&fm, "date")?.trim())?;

    let excerpt = scalar(&fm, "excerpt")?.trim().to_string();
    if excerpt.is_empty() {
        return Err(GenerationError::MissingField("excerpt"));
    }

    let tags = parse_tags(&fm)?;
    let featured = parse_featured(scalar(&fm, "featured")?.trim())?;

    let body = body.trim();
    if body.is_empty() {
        return Err(GenerationError::EmptyBody);
    }

    Ok(GeneratedPost {
        title,
        date,
        excerpt,
        tags,
        featured,
        body: body.to_string(),
    })
}
