//! Lexer / redirection splitter.
//!
//! Splits a line into at most two pipeline stages on `|`, then each stage
//! into an argument vector plus a redirection descriptor. Quoting and
//! variable expansion are out of scope — tokens are whitespace-separated,
//! full stop.

use crate::config::ShellConfig;
use crate::error::LexError;
use crate::redirect::RedirectionSpec;

/// One pipeline stage: the program + arguments to exec, and the
/// redirections extracted from its tokens.
#[derive(Debug, Clone)]
pub struct Stage {
    pub argv: Vec<String>,
    pub redirection: RedirectionSpec,
}

/// A fully parsed and validated input line.
#[derive(Debug, Clone)]
pub struct ParsedLine {
    pub stage1: Stage,
    pub stage2: Option<Stage>,
    pub background: bool,
}

/// Validate and split one input line.
pub fn parse_line(line: &str, config: &ShellConfig) -> Result<ParsedLine, LexError> {
    if line.is_empty() {
        return Err(LexError::EmptyLine);
    }
    if line.len() > config.max_line_len {
        return Err(LexError::LineTooLong {
            limit: config.max_line_len,
        });
    }

    let tokens: Vec<&str> = line.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() {
        return Err(LexError::EmptyLine);
    }
    for token in &tokens {
        if token.len() > config.max_token_len {
            return Err(LexError::TokenTooLong {
                limit: config.max_token_len,
            });
        }
    }

    // Split on a standalone "|" token; more than one is a syntax error.
    let pipe_positions: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| **t == "|")
        .map(|(i, _)| i)
        .collect();
    if pipe_positions.len() > 1 {
        return Err(LexError::MultiplePipes);
    }

    let mut stage2_tokens: Option<&[&str]> = None;
    let stage1_tokens: &[&str] = match pipe_positions.first() {
        Some(&at) => {
            stage2_tokens = Some(&tokens[at + 1..]);
            &tokens[..at]
        }
        None => &tokens[..],
    };

    // Trailing "&" marks a background job; it is stripped before either
    // stage is built.
    let mut last_tokens: Vec<&str> = stage2_tokens.unwrap_or(stage1_tokens).to_vec();
    let background = last_tokens.last() == Some(&"&");
    if background {
        last_tokens.pop();
    }

    let stage1 = match stage2_tokens {
        Some(_) => build_stage(stage1_tokens)?,
        None => build_stage(&last_tokens)?,
    };
    let stage2 = match stage2_tokens {
        Some(_) => Some(build_stage(&last_tokens)?),
        None => None,
    };

    Ok(ParsedLine {
        stage1,
        stage2,
        background,
    })
}

/// Split one stage's tokens into argv and a redirection descriptor.
fn build_stage(tokens: &[&str]) -> Result<Stage, LexError> {
    let mut argv = Vec::new();
    let mut redirection = RedirectionSpec::default();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            "<" => {
                redirection.stdin = Some(expect_target(tokens, &mut i, "<")?);
            }
            ">" => {
                redirection.stdout = Some(expect_target(tokens, &mut i, ">")?);
            }
            "2>" => {
                redirection.stderr = Some(expect_target(tokens, &mut i, "2>")?);
            }
            other => argv.push(other.to_string()),
        }
        i += 1;
    }

    if argv.is_empty() {
        return Err(LexError::EmptyStage);
    }

    Ok(Stage { argv, redirection })
}

/// Consume the token following a redirection operator as its target.
/// Advances `i` to point at the target token (the caller's `i += 1` in the
/// enclosing loop then moves past it). Last occurrence of a duplicated
/// operator wins because the caller simply overwrites the field.
fn expect_target(tokens: &[&str], i: &mut usize, operator: &'static str) -> Result<String, LexError> {
    *i += 1;
    tokens
        .get(*i)
        .map(|t| t.to_string())
        .ok_or(LexError::DanglingRedirection { operator })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ShellConfig {
        ShellConfig::default()
    }

    #[test]
    fn simple_command() {
        let parsed = parse_line("ls -la", &cfg()).unwrap();
        assert_eq!(parsed.stage1.argv, vec!["ls", "-la"]);
        assert!(parsed.stage2.is_none());
        assert!(!parsed.background);
    }

    #[test]
    fn redirections_extracted() {
        let parsed = parse_line("sort < in.txt > out.txt", &cfg()).unwrap();
        assert_eq!(parsed.stage1.argv, vec!["sort"]);
        assert_eq!(parsed.stage1.redirection.stdin.as_deref(), Some("in.txt"));
        assert_eq!(parsed.stage1.redirection.stdout.as_deref(), Some("out.txt"));
    }

    #[test]
    fn duplicate_operator_uses_last() {
        let parsed = parse_line("cmd > a.txt > b.txt", &cfg()).unwrap();
        assert_eq!(parsed.stage1.redirection.stdout.as_deref(), Some("b.txt"));
    }

    #[test]
    fn two_stage_pipeline() {
        let parsed = parse_line("cat in.txt | wc -l", &cfg()).unwrap();
        assert_eq!(parsed.stage1.argv, vec!["cat", "in.txt"]);
        assert_eq!(parsed.stage2.unwrap().argv, vec!["wc", "-l"]);
    }

    #[test]
    fn background_flag_on_last_stage() {
        let parsed = parse_line("sleep 100 &", &cfg()).unwrap();
        assert!(parsed.background);
        assert_eq!(parsed.stage1.argv, vec!["sleep", "100"]);
    }

    #[test]
    fn background_flag_after_pipeline() {
        let parsed = parse_line("cat | wc -l &", &cfg()).unwrap();
        assert!(parsed.background);
        assert_eq!(parsed.stage2.unwrap().argv, vec!["wc", "-l"]);
    }

    #[test]
    fn multiple_pipes_rejected() {
        assert_eq!(parse_line("a | b | c", &cfg()), Err(LexError::MultiplePipes));
    }

    #[test]
    fn empty_line_rejected() {
        assert_eq!(parse_line("", &cfg()), Err(LexError::EmptyLine));
        assert_eq!(parse_line("   ", &cfg()), Err(LexError::EmptyLine));
    }

    #[test]
    fn empty_stage_rejected() {
        assert_eq!(parse_line("cat |", &cfg()), Err(LexError::EmptyStage));
        assert_eq!(parse_line("| cat", &cfg()), Err(LexError::EmptyStage));
    }

    #[test]
    fn dangling_redirection_rejected() {
        assert_eq!(
            parse_line("echo hi >", &cfg()),
            Err(LexError::DanglingRedirection { operator: ">" })
        );
    }

    #[test]
    fn token_too_long_rejected() {
        let long = "x".repeat(31);
        let line = format!("echo {long}");
        assert_eq!(
            parse_line(&line, &cfg()),
            Err(LexError::TokenTooLong { limit: 30 })
        );
    }

    #[test]
    fn line_too_long_rejected() {
        let line = format!("echo {}", "x".repeat(2000));
        assert!(matches!(
            parse_line(&line, &cfg()),
            Err(LexError::LineTooLong { .. })
        ));
    }

    #[test]
    fn operator_recognized_only_standalone() {
        // "2>file" glued together is a plain argument, not a redirection:
        // partial matches inside other tokens are not operators.
        let parsed = parse_line("echo 2>file", &cfg()).unwrap();
        assert_eq!(parsed.stage1.argv, vec!["echo", "2>file"]);
    }
}
