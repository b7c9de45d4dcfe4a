//! Argument tokenization.
//!
//! A token is either a maximal run of non-whitespace characters or a
//! double-quoted span with the quotes stripped. An unterminated quote is not
//! an error: the quote character is kept as part of an ordinary token.

/// A single lexical unit cut from raw argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text, without surrounding quotes.
    pub text: &'a str,
    /// Byte offset where the token starts in the input (at the opening quote if quoted).
    pub start: usize,
    /// Byte offset just past the token (past the closing quote if quoted).
    pub end: usize,
    pub quoted: bool,
}

/// Lazy token iterator. Clone it to restart from the same position.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    input: &'a str,
    pos: usize,
}

/// Tokenize `input`.
pub fn tokenize(input: &str) -> Tokens<'_> {
    Tokens { input, pos: 0 }
}

/// Collect every token's text.
pub fn split(input: &str) -> Vec<&str> {
    tokenize(input).map(|t| t.text).collect()
}

impl<'a> Tokens<'a> {
    /// The untokenized input after the last yielded token, leading whitespace removed.
    pub fn remainder(&self) -> &'a str {
        self.input[self.pos..].trim_start()
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        let start = self.input.len() - trimmed.len();
        if trimmed.is_empty() {
            self.pos = self.input.len();
            return None;
        }

        if let Some(body) = trimmed.strip_prefix('"') {
            if let Some(close) = body.find('"') {
                let end = start + 1 + close + 1;
                self.pos = end;
                return Some(Token { text: &body[..close], start, end, quoted: true });
            }
        }

        let len = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let end = start + len;
        self.pos = end;
        Some(Token { text: &self.input[start..end], start, end, quoted: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(split("").is_empty());
        assert!(split("   \t ").is_empty());
    }

    #[test]
    fn splits_on_any_whitespace() {
        assert_eq!(split("a  b\tc\nd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn quoted_span_is_one_token() {
        assert_eq!(split(r#""hello world" 2"#), vec!["hello world", "2"]);
        assert_eq!(split(r#"x "a b" "c d""#), vec!["x", "a b", "c d"]);
    }

    #[test]
    fn unterminated_quote_degrades_to_plain_tokens() {
        assert_eq!(split(r#""hello world"#), vec![r#""hello"#, "world"]);
        assert_eq!(split(r#"a "b"#), vec!["a", r#""b"#]);
    }

    #[test]
    fn spans_cover_quotes() {
        let input = r#"ban "bad user" now"#;
        let tokens: Vec<_> = tokenize(input).collect();
        assert_eq!(tokens[1].text, "bad user");
        assert!(tokens[1].quoted);
        assert_eq!(&input[tokens[1].start..tokens[1].end], r#""bad user""#);
        assert_eq!(&input[tokens[2].end..], "");
    }

    #[test]
    fn remainder_keeps_original_spacing() {
        let mut tokens = tokenize("add   one  two   three ");
        tokens.next();
        assert_eq!(tokens.remainder(), "one  two   three ");
    }

    #[test]
    fn tokens_restart_from_clone() {
        let tokens = tokenize("a b c");
        let first: Vec<_> = tokens.clone().map(|t| t.text).collect();
        let second: Vec<_> = tokens.map(|t| t.text).collect();
        assert_eq!(first, second);
    }
}
