//! Line editor for the shell and the debug prompt: history hinting plus
//! completion over command names and, at a break, the symbols live in the
//! inspected scope.

use crate::debugger::command::{
    CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT, HELP_COMMAND, HELP_COMMAND_SHORT, LIST_COMMAND,
    LIST_COMMAND_SHORT, NEXT_COMMAND, NEXT_COMMAND_SHORT, PRINT_COMMAND, PRINT_COMMAND_SHORT,
    QUIT_COMMAND, QUIT_COMMAND_SHORT, STEP_INTO_COMMAND, STEP_INTO_COMMAND_SHORT,
    STEP_OUT_COMMAND, STEP_OUT_COMMAND_SHORT,
};
use chumsky::prelude::just;
use chumsky::text::whitespace;
use chumsky::{extra, Parser};
use crossterm::style::Stylize;
use rustyline::completion::{Completer, Pair};
use rustyline::hint::HistoryHinter;
use rustyline::history::MemHistory;
use rustyline::{CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Highlighter, Hinter, Validator};
use trie_rs::{Trie, TrieBuilder};

struct CommandHint {
    short: Option<String>,
    long: String,
}

impl CommandHint {
    fn display_with_short(&self) -> String {
        match &self.short {
            Some(short) if self.long.starts_with(short) => format!(
                "{}{}",
                short.clone().bold().underlined(),
                &self.long[short.len()..]
            ),
            Some(short) => format!("{}|{}", self.long, short.clone().bold().underlined()),
            None => self.long.clone(),
        }
    }
}

impl From<(&str, &str)> for CommandHint {
    fn from((short, long): (&str, &str)) -> Self {
        CommandHint {
            short: Some(short.to_string()),
            long: long.to_string(),
        }
    }
}

pub struct CommandCompleter {
    commands: Vec<CommandHint>,
    symbol_hints: Trie<u8>,
    symbols: Vec<String>,
}

impl CommandCompleter {
    fn new(commands: impl IntoIterator<Item = CommandHint>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            symbol_hints: TrieBuilder::new().build(),
            symbols: Vec::new(),
        }
    }

    /// Replace the symbol hints with the names live at the current break.
    pub fn replace_symbol_hints(&mut self, symbols: Vec<String>) {
        let mut builder = TrieBuilder::new();
        symbols.iter().for_each(|symbol| {
            builder.push(symbol);
        });
        self.symbols = symbols;
        self.symbol_hints = builder.build();
    }

    /// The symbol part of a `print`/`p` line, if this is one.
    fn symbol_query(line: &str) -> Option<&str> {
        let op = just::<_, _, extra::Default>;
        op(PRINT_COMMAND)
            .or(op(PRINT_COMMAND_SHORT))
            .then(whitespace().at_least(1))
            .ignore_then(any_rest())
            .parse(line)
            .into_result()
            .ok()
    }
}

fn any_rest<'a>() -> impl Parser<'a, &'a str, &'a str, extra::Default> {
    chumsky::prelude::any().repeated().to_slice()
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        if let Some(prefix) = Self::symbol_query(line) {
            let pos = line.len() - prefix.len();
            if prefix.is_empty() {
                let pairs = self
                    .symbols
                    .iter()
                    .map(|symbol| Pair {
                        display: symbol.clone(),
                        replacement: symbol.clone(),
                    })
                    .collect();
                return Ok((pos, pairs));
            }

            let variants = self.symbol_hints.predictive_search(prefix);
            let pairs = variants
                .iter()
                .map(|variant| {
                    let symbol =
                        std::str::from_utf8(variant.as_slice()).expect("invalid utf-8 string");
                    Pair {
                        display: symbol.to_string(),
                        replacement: symbol.to_string(),
                    }
                })
                .collect();
            return Ok((pos, pairs));
        }

        let pairs = self
            .commands
            .iter()
            .filter(|cmd| cmd.long.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.display_with_short(),
                replacement: cmd.long.clone(),
            })
            .collect();
        Ok((0, pairs))
    }
}

#[derive(Helper, Highlighter, Hinter, Validator)]
pub struct RLHelper {
    pub completer: CommandCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer.complete(line, pos, ctx)
    }
}

pub fn create_editor() -> anyhow::Result<Editor<RLHelper, MemHistory>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let commands = [
        (CONTINUE_COMMAND_SHORT, CONTINUE_COMMAND).into(),
        (NEXT_COMMAND_SHORT, NEXT_COMMAND).into(),
        (STEP_INTO_COMMAND_SHORT, STEP_INTO_COMMAND).into(),
        (STEP_OUT_COMMAND_SHORT, STEP_OUT_COMMAND).into(),
        (PRINT_COMMAND_SHORT, PRINT_COMMAND).into(),
        (LIST_COMMAND_SHORT, LIST_COMMAND).into(),
        (HELP_COMMAND_SHORT, HELP_COMMAND).into(),
        (QUIT_COMMAND_SHORT, QUIT_COMMAND).into(),
    ];

    let helper = RLHelper {
        completer: CommandCompleter::new(commands),
        hinter: HistoryHinter {},
    };

    let mut editor = Editor::with_history(config, MemHistory::new())?;
    editor.set_helper(Some(helper));
    Ok(editor)
}
