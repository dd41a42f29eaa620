//! Debugger commands and their parser.

use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, Boxed, Parser};

pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const NEXT_COMMAND: &str = "next";
pub const NEXT_COMMAND_SHORT: &str = "n";
pub const STEP_INTO_COMMAND: &str = "step";
pub const STEP_INTO_COMMAND_SHORT: &str = "s";
pub const STEP_OUT_COMMAND: &str = "stepout";
pub const STEP_OUT_COMMAND_SHORT: &str = "o";
pub const PRINT_COMMAND: &str = "print";
pub const PRINT_COMMAND_SHORT: &str = "p";
pub const LIST_COMMAND: &str = "list";
pub const LIST_COMMAND_SHORT: &str = "l";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const QUIT_COMMAND: &str = "quit";
pub const QUIT_COMMAND_SHORT: &str = "q";

pub const USAGE: &str = "\
Available debugger commands:

c, continue         -- resume execution until the next `debugger` statement
n, next             -- run to the next statement at the same or a shallower call depth
s, step             -- stop at the very next statement, entering calls
o, stepout          -- run until the current function returns to its caller
p, print <>|<name>  -- print bindings of the enclosing scope, or a single binding
l, list <>|<n>      -- list source around the break, optionally resizing the window to n lines
h, help             -- print this message
q, quit             -- detach the debugger and let the script run to completion
";

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command")]
    Parsing(String),
}

/// Commands accepted at the debug prompt.
///
/// `List` carries `None` both for a bare `l` and for a malformed size
/// argument: an unreadable argument leaves the previous window size in
/// effect instead of failing the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Continue,
    Next,
    StepInto,
    StepOut,
    Print(Option<String>),
    List(Option<usize>),
    Help,
    Quit,
}

type Err<'a> = extra::Err<Rich<'a, char>>;

fn command<'a, I>(inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: chumsky::Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).boxed()
}

impl Command {
    /// Parse one input line into a command.
    pub fn parse(input: &str) -> Result<Command, CommandError> {
        Self::parser()
            .parse(input)
            .into_result()
            .map_err(|e| CommandError::Parsing(e[0].to_string()))
    }

    fn parser<'a>() -> impl chumsky::Parser<'a, &'a str, Command, Err<'a>> {
        let op = |sym| just(sym).padded();
        let op2 = |full, short| op(full).or(op(short));

        let r#continue = op2(CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT).to(Command::Continue);
        let next = op2(NEXT_COMMAND, NEXT_COMMAND_SHORT).to(Command::Next);
        let step_out = op2(STEP_OUT_COMMAND, STEP_OUT_COMMAND_SHORT).to(Command::StepOut);
        let step_into = op2(STEP_INTO_COMMAND, STEP_INTO_COMMAND_SHORT).to(Command::StepInto);
        let help = op2(HELP_COMMAND, HELP_COMMAND_SHORT).to(Command::Help);
        let quit = op2(QUIT_COMMAND, QUIT_COMMAND_SHORT).to(Command::Quit);

        let print = op2(PRINT_COMMAND, PRINT_COMMAND_SHORT)
            .ignore_then(any().repeated().to_slice())
            .map(|rest: &str| {
                let symbol = rest.trim();
                Command::Print((!symbol.is_empty()).then(|| symbol.to_string()))
            });

        let list = op2(LIST_COMMAND, LIST_COMMAND_SHORT)
            .ignore_then(any().repeated().to_slice())
            .map(|rest: &str| Command::List(rest.trim().parse().ok()));

        choice((
            command(r#continue),
            command(next),
            command(step_out),
            command(step_into),
            command(print),
            command(list),
            command(help),
            command(quit),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parser() {
        struct TestCase {
            inputs: Vec<&'static str>,
            command_matcher: fn(result: Result<Command, CommandError>),
        }
        let cases = vec![
            TestCase {
                inputs: vec!["c", "continue", "  continue  "],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::Continue),
            },
            TestCase {
                inputs: vec!["n", "next"],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::Next),
            },
            TestCase {
                inputs: vec!["s", "step"],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::StepInto),
            },
            TestCase {
                inputs: vec!["o", "stepout"],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::StepOut),
            },
            TestCase {
                inputs: vec!["h", "help"],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::Help),
            },
            TestCase {
                inputs: vec!["q", "quit"],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::Quit),
            },
            TestCase {
                inputs: vec!["p", "print", "p  "],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::Print(None)),
            },
            TestCase {
                inputs: vec!["p counter", "print counter", "p   counter "],
                command_matcher: |result| {
                    assert_eq!(
                        result.unwrap(),
                        Command::Print(Some("counter".to_string()))
                    )
                },
            },
            TestCase {
                inputs: vec!["l", "list"],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::List(None)),
            },
            TestCase {
                inputs: vec!["l 8", "list 8", "l   8 "],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::List(Some(8))),
            },
            // malformed size arguments degrade to a plain redisplay
            TestCase {
                inputs: vec!["l abc", "l -3", "l 1x"],
                command_matcher: |result| assert_eq!(result.unwrap(), Command::List(None)),
            },
            TestCase {
                inputs: vec!["", "   ", "x", "contixue", "n 5", "step 2"],
                command_matcher: |result| assert!(result.is_err()),
            },
        ];

        for tc in cases {
            for input in tc.inputs {
                (tc.command_matcher)(Command::parse(input));
            }
        }
    }
}
