//! Quote-aware command tokenizer.

/// Split on whitespace, keeping a double-quoted run as one token.
///
/// Quotes stay on the token: `mint "a b" c` yields `mint`, `"a b"`, `c`.
/// A quote with no closing partner is an ordinary character.
pub fn split_ignore_quotes(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        let quoted_end = rest
            .strip_prefix('"')
            .and_then(|inner| inner.find('"'))
            .map(|close| close + 2);
        let end = quoted_end
            .unwrap_or_else(|| rest.find(char::is_whitespace).unwrap_or(rest.len()));

        tokens.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    tokens
}

/// Strip one pair of surrounding double quotes, if present.
pub fn unquote(token: &str) -> &str {
    token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token)
}
