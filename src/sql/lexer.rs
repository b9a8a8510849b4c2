//! Statement text scanning
//!
//! Quote- and parenthesis-aware helpers the parser uses to cut statement text
//! into clauses and list items before handing the pieces to the grammar.

/// Trim a statement and strip any trailing `;`
pub fn strip_terminator(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Split on `delimiter` where it appears outside single-quoted text and
/// outside parentheses. Each piece is trimmed.
///
/// A quote inside a literal only ends it when followed by the delimiter, a
/// closing parenthesis, or the end of input (whitespace skipped).
pub fn split_top_level(input: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start = 0;

    for (i, ch) in input.char_indices() {
        match ch {
            '\'' if !in_quote => in_quote = true,
            '\'' => in_quote = !closes_literal(&input[i + 1..], delimiter),
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            c if c == delimiter && !in_quote && depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(input[start..].trim());
    parts
}

/// Split around the first whitespace-delimited, case-insensitive occurrence
/// of `keyword` outside single-quoted text.
///
/// The keyword must be preceded by whitespace and followed by whitespace or
/// the end of input. Returns the text before and after it, untrimmed.
pub fn split_at_keyword<'a>(input: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let mut in_quote = false;
    let mut prev: Option<char> = None;

    for (i, ch) in input.char_indices() {
        if ch == '\'' {
            in_quote = !in_quote || !closes_literal(&input[i + 1..], ',');
        } else if !in_quote && prev.map_or(false, char::is_whitespace) {
            let end = i + keyword.len();
            let candidate = input.get(i..end);
            if candidate.map_or(false, |c| c.eq_ignore_ascii_case(keyword)) {
                let after = &input[end..];
                if after.chars().next().map_or(true, char::is_whitespace) {
                    return Some((&input[..i], after));
                }
            }
        }
        prev = Some(ch);
    }

    None
}

/// Whether a quote followed by `rest` closes a text literal
fn closes_literal(rest: &str, delimiter: char) -> bool {
    match rest.trim_start().chars().next() {
        None => true,
        Some(c) => c == delimiter || c == ')' || rest.starts_with(char::is_whitespace),
    }
}
