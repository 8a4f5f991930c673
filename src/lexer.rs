/// Line types for the TJA chart format
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// `KEY:VALUE`, `#KEY value` or `#KEY:value` (key upper-cased)
    Directive { key: String, value: String },
    /// Note codes up to the first comma
    NoteRow {
        codes: String,
        terminated: bool,         // the row ended with a comma
        measure_override: Option<String>, // text after the comma, if any
    },
    /// A line that is neither a directive nor a note row
    Unrecognized(String),
}

/// A classified line with its 1-indexed position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedLine {
    pub kind: LineKind,
    pub line: usize,
}

/// Lexer for splitting TJA source into classified lines
pub struct Lexer<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        // A UTF-8 BOM is common in charts saved by Windows editors
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            lines: input.lines().enumerate(),
        }
    }

    pub fn tokenize(&mut self) -> Vec<LocatedLine> {
        let mut tokens = Vec::new();

        for (idx, raw) in self.lines.by_ref() {
            let content = strip_comment(raw).trim();
            if content.is_empty() {
                continue;
            }
            if let Some(kind) = classify(content) {
                tokens.push(LocatedLine { kind, line: idx + 1 });
            }
        }

        tokens
    }
}

/// Remove a trailing `//` comment.
fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// `None` for `#` comment lines (a `#` not directly followed by a key)
fn classify(content: &str) -> Option<LineKind> {
    if let Some(rest) = content.strip_prefix('#') {
        if rest.chars().next().map_or(true, char::is_whitespace) {
            return None;
        }
        let split = rest.find(|c: char| c == ':' || c.is_whitespace());
        let (key, value) = match split {
            Some(pos) => (&rest[..pos], rest[pos + 1..].trim()),
            None => (rest, ""),
        };
        return Some(LineKind::Directive {
            key: key.to_ascii_uppercase(),
            value: value.to_string(),
        });
    }

    let first = content.chars().next().unwrap_or(' ');
    if first.is_ascii_digit() || first == ',' {
        return Some(note_row(content));
    }

    if let Some((key, value)) = content.split_once(':') {
        let key = key.trim();
        if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Some(LineKind::Directive {
                key: key.to_ascii_uppercase(),
                value: value.trim().to_string(),
            });
        }
    }

    Some(LineKind::Unrecognized(content.to_string()))
}

fn note_row(content: &str) -> LineKind {
    let (codes, rest) = match content.split_once(',') {
        Some((codes, rest)) => (codes, Some(rest)),
        None => (content, None),
    };
    let codes: String = codes.chars().filter(|c| !c.is_whitespace()).collect();
    let measure_override = rest
        .map(|r| r.trim().trim_end_matches(',').trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    LineKind::NoteRow {
        codes,
        terminated: rest.is_some(),
        measure_override,
    }
}
