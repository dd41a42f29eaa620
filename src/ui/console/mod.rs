//! Interactive console: the language shell and the debugger's command
//! prompt, both built on the same line editor.

pub mod editor;
pub mod print;

use self::editor::{create_editor, RLHelper};
use self::print::style::{ErrorView, KeywordView};
use crate::debugger::CommandPrompt;
use crate::interp::{parser, EnvRef, Interpreter};
use rustyline::error::ReadlineError;
use rustyline::history::MemHistory;
use rustyline::Editor;
use std::rc::Rc;

const WELCOME_TEXT: &str = "minnow shell (exit or quit to leave)";
const SHELL_PROMPT: &str = "(mn) ";
const DEBUG_PROMPT: &str = "(dbg) ";
const REPL_SOURCE: &str = "(repl)";

type MnEditor = Editor<RLHelper, MemHistory>;

/// The debugger's interactive command source.
pub struct ConsolePrompt {
    editor: MnEditor,
}

impl ConsolePrompt {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            editor: create_editor()?,
        })
    }
}

impl CommandPrompt for ConsolePrompt {
    fn read_command(&mut self) -> Option<String> {
        match self.editor.readline(DEBUG_PROMPT) {
            Ok(line) => {
                _ = self.editor.add_history_entry(&line);
                Some(line)
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => None,
            Err(err) => {
                println!("{}", ErrorView::from(format!("read error: {err:#}")));
                None
            }
        }
    }

    fn set_symbol_hints(&mut self, symbols: Vec<String>) {
        if let Some(helper) = self.editor.helper_mut() {
            helper.completer.replace_symbol_hints(symbols);
        }
    }
}

/// Read–eval–print loop over a persistent environment.
pub fn run_shell(env: &EnvRef, print_ast: bool) -> anyhow::Result<()> {
    let mut editor = create_editor()?;
    let mut interp = Interpreter::new();
    println!("{WELCOME_TEXT}");

    loop {
        match editor.readline(SHELL_PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if input == "exit" || input == "quit" {
                    break;
                }
                if input.is_empty() {
                    continue;
                }
                _ = editor.add_history_entry(&line);

                match parser::parse(REPL_SOURCE, input) {
                    Ok(ast) => {
                        let ast = Rc::new(ast);
                        if print_ast {
                            print!("{}", ast.dump());
                        }
                        match interp.eval(&ast, env) {
                            Ok(value) => println!("{}", KeywordView::from(value)),
                            Err(e) => println!("{}", ErrorView::from(e)),
                        }
                    }
                    Err(errors) => parser::report(REPL_SOURCE, input, &errors),
                }
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                println!("{}", ErrorView::from(format!("read error: {err:#}")));
                break;
            }
        }
    }
    Ok(())
}
