/// Command tokenizer - quoting-aware argv splitting
///
/// Verification commands are written as single strings and executed inside
/// the container WITHOUT a shell, so this module turns a command string into
/// an argument vector.
///
/// **Supported:**
/// - Whitespace separates arguments outside quotes
/// - Single quotes group text; double quotes inside them are literal
/// - Double quotes group text; single quotes inside them are literal
///
/// **Not supported:**
/// - Backslash escapes, variable expansion, globbing, pipes, redirects
///
/// Unterminated quotes are not an error: the quote only toggles state.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split `input` into arguments
///
/// Never returns an empty vector. When nothing tokenizes (empty or blank
/// input) the original string is returned as the only argument.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote = Quote::None;
    // Set once a quote opened inside the current token, so `''` yields "".
    let mut quoted = false;

    for ch in input.chars() {
        match (ch, quote) {
            ('\'', Quote::None) => {
                quote = Quote::Single;
                quoted = true;
            }
            ('\'', Quote::Single) => quote = Quote::None,
            ('"', Quote::None) => {
                quote = Quote::Double;
                quoted = true;
            }
            ('"', Quote::Double) => quote = Quote::None,
            (c, Quote::None) if c.is_whitespace() => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            (c, _) => current.push(c),
        }
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    if tokens.is_empty() {
        return vec![input.to_string()];
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_words() {
        assert_eq!(tokenize("pg_isready -U postgres"), args(&["pg_isready", "-U", "postgres"]));
    }

    #[test]
    fn test_single_quoted_region() {
        assert_eq!(tokenize("a 'b c' d"), args(&["a", "b c", "d"]));
    }

    #[test]
    fn test_empty_input_returns_original() {
        assert_eq!(tokenize(""), args(&[""]));
        assert_eq!(tokenize("   "), args(&["   "]));
    }

    #[test]
    fn test_unterminated_quote_is_tolerated() {
        assert_eq!(tokenize("a 'b"), args(&["a", "b"]));
        assert_eq!(tokenize("a \"b c"), args(&["a", "b c"]));
    }

    #[test]
    fn test_nested_quote_characters_are_literal() {
        let cmd = r#"psql -c "SELECT '[1,2,3]'::vector <-> '[4,5,6]'::vector;""#;
        assert_eq!(
            tokenize(cmd),
            args(&["psql", "-c", "SELECT '[1,2,3]'::vector <-> '[4,5,6]'::vector;"])
        );

        assert_eq!(tokenize(r#"echo 'say "hi"'"#), args(&["echo", "say \"hi\""]));
    }

    #[test]
    fn test_quotes_join_adjacent_text() {
        assert_eq!(tokenize("--opt='a b'c"), args(&["--opt=a bc"]));
    }

    #[test]
    fn test_empty_quoted_argument_is_kept() {
        assert_eq!(tokenize("psql -c ''"), args(&["psql", "-c", ""]));
    }

    #[test]
    fn test_repeated_whitespace() {
        assert_eq!(tokenize("  a \t b\n"), args(&["a", "b"]));
    }

    #[test]
    fn test_no_shell_metacharacters_interpreted() {
        assert_eq!(
            tokenize("echo hi; rm -rf / | cat"),
            args(&["echo", "hi;", "rm", "-rf", "/", "|", "cat"])
        );
    }

    #[test]
    fn test_never_empty() {
        for input in ["", " ", "''", "\"\"", "x", "'", "\""] {
            assert!(!tokenize(input).is_empty(), "empty result for {:?}", input);
        }
    }
}
