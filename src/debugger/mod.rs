//! Interactive source-level debugger for the minnow evaluator.
//!
//! One [`Debugger`] session lives for the whole run. The evaluator invokes it
//! through the [`DebugHook`] seam before every statement; the session decides
//! from its stepping state whether to suspend, and while suspended it blocks
//! the interpreter on a command prompt.

pub mod command;
pub mod error;
pub mod inspect;
pub mod source;

pub use self::error::Error;

use self::command::{Command, USAGE};
use self::source::SourceView;
use crate::interp::{Ast, DebugHook, Environment, NodeId};
use crate::ui::console::print::style::{ErrorView, FilePathView};
use log::debug;

/// Where execution should run to before the next suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// No stepping issued yet; only explicit breakpoints suspend.
    None,
    /// Run until the next explicit breakpoint.
    Continue,
    /// Suspend at the next statement at the same or a shallower call depth.
    Next,
    /// Suspend at the very next statement, whatever its depth.
    StepInto,
    /// Suspend once execution returns to a strictly shallower call depth.
    StepOut,
}

/// Stepping state of a debug session.
///
/// `break_level` is the call depth recorded when the last suspension ended;
/// `Next` and `StepOut` decisions compare against it. The quit flag is
/// monotonic: once set, the session never suspends again.
#[derive(Debug)]
pub struct StepState {
    mode: StepMode,
    break_level: usize,
    window: usize,
    quit: bool,
}

impl Default for StepState {
    fn default() -> Self {
        Self::new()
    }
}

impl StepState {
    pub fn new() -> Self {
        Self {
            mode: StepMode::None,
            break_level: 0,
            window: 4,
            quit: false,
        }
    }

    /// The suspension decision, evaluated before the evaluator's own
    /// `force_break` flag.
    pub fn should_suspend(&self, level: usize, force_break: bool) -> bool {
        match self.mode {
            StepMode::Next if level <= self.break_level => true,
            StepMode::StepInto => true,
            StepMode::StepOut if level < self.break_level => true,
            _ => force_break,
        }
    }

    /// Leave a suspension: record the stepping mode and anchor the depth the
    /// next decision compares against.
    pub fn resume(&mut self, mode: StepMode, level: usize) {
        self.mode = mode;
        self.break_level = level;
    }

    /// Permanently disable suspension for the rest of the run.
    pub fn request_quit(&mut self, level: usize) {
        self.quit = true;
        self.break_level = level;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn set_window(&mut self, lines: usize) {
        if lines > 0 {
            self.window = lines;
        }
    }
}

/// Source of debug command lines. The console implementation reads from the
/// line editor; tests script it.
pub trait CommandPrompt {
    /// Read one command line; `None` means the input stream ended.
    fn read_command(&mut self) -> Option<String>;

    /// Replace symbol completion hints before prompting. Default: ignore.
    fn set_symbol_hints(&mut self, _symbols: Vec<String>) {}
}

pub struct Debugger<P> {
    prompt: P,
    state: StepState,
    sources: SourceView,
    usage_shown: bool,
}

impl<P: CommandPrompt> Debugger<P> {
    pub fn new(prompt: P) -> Self {
        Self {
            prompt,
            state: StepState::new(),
            sources: SourceView::new(),
            usage_shown: false,
        }
    }

    /// Display failures must not end the session: report them and keep the
    /// command loop running without a listing.
    fn show_window(&self, ast: &Ast, node: NodeId) {
        let line = ast.line(node) as usize;
        match self
            .sources
            .render_window(ast.path(), line, self.state.window())
        {
            Ok(listing) => {
                println!();
                println!(
                    "Break in {}:{line}",
                    FilePathView::from(ast.path().display())
                );
                print!("{listing}");
            }
            Err(e) => println!("{}", ErrorView::from(format!("{e:#}"))),
        }
    }

    fn suspend(&mut self, ast: &Ast, node: NodeId, env: &Environment) {
        if !self.usage_shown {
            self.usage_shown = true;
            println!("{USAGE}");
        }
        self.show_window(ast, node);
        self.prompt
            .set_symbol_hints(inspect::scope_symbols(ast, node, env));

        let level = env.level();
        loop {
            let Some(input) = self.prompt.read_command() else {
                // input stream ended: detach like an explicit quit
                self.state.request_quit(level);
                return;
            };
            match Command::parse(&input) {
                Ok(Command::Help) => println!("{USAGE}"),
                Ok(Command::List(resize)) => {
                    if let Some(lines) = resize {
                        self.state.set_window(lines);
                    }
                    self.show_window(ast, node);
                }
                Ok(Command::Print(symbol)) => {
                    for line in inspect::render(ast, node, env, symbol.as_deref()) {
                        println!("{line}");
                    }
                }
                Ok(Command::Continue) => return self.state.resume(StepMode::Continue, level),
                Ok(Command::Next) => return self.state.resume(StepMode::Next, level),
                Ok(Command::StepInto) => return self.state.resume(StepMode::StepInto, level),
                Ok(Command::StepOut) => return self.state.resume(StepMode::StepOut, level),
                Ok(Command::Quit) => return self.state.request_quit(level),
                // anything unrecognized silently re-prompts
                Err(_) => {}
            }
        }
    }
}

impl<P: CommandPrompt> DebugHook for Debugger<P> {
    fn on_statement(&mut self, ast: &Ast, node: NodeId, env: &Environment, force_break: bool) {
        if self.state.quit_requested() {
            return;
        }
        if !self.state.should_suspend(env.level(), force_break) {
            return;
        }
        debug!(
            target: "debugger",
            "suspend at {}:{} (level {})",
            ast.path().display(),
            ast.line(node),
            env.level()
        );
        self.suspend(ast, node, env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_only_breaks_on_force() {
        let state = StepState::new();
        assert!(!state.should_suspend(0, false));
        assert!(!state.should_suspend(3, false));
        assert!(state.should_suspend(0, true));
        assert!(state.should_suspend(3, true));
    }

    #[test]
    fn next_skips_strictly_deeper_levels() {
        let mut state = StepState::new();
        state.resume(StepMode::Next, 1);

        assert!(!state.should_suspend(2, false));
        assert!(!state.should_suspend(3, false));
        assert!(state.should_suspend(1, false));
        assert!(state.should_suspend(0, false));
    }

    #[test]
    fn step_into_suspends_everywhere() {
        let mut state = StepState::new();
        state.resume(StepMode::StepInto, 1);

        for level in 0..5 {
            assert!(state.should_suspend(level, false));
        }
    }

    #[test]
    fn step_out_requires_a_strictly_shallower_level() {
        let mut state = StepState::new();
        state.resume(StepMode::StepOut, 2);

        assert!(!state.should_suspend(2, false));
        assert!(!state.should_suspend(3, false));
        assert!(state.should_suspend(1, false));
        assert!(state.should_suspend(0, false));
    }

    #[test]
    fn continue_only_breaks_on_force() {
        let mut state = StepState::new();
        state.resume(StepMode::Continue, 2);

        assert!(!state.should_suspend(0, false));
        assert!(!state.should_suspend(5, false));
        assert!(state.should_suspend(5, true));
    }

    #[test]
    fn resume_reanchors_the_break_level() {
        let mut state = StepState::new();
        state.resume(StepMode::Next, 3);
        assert!(!state.should_suspend(4, false));
        assert!(state.should_suspend(3, false));

        // a later resumption at a deeper frame moves the anchor
        state.resume(StepMode::Next, 4);
        assert!(state.should_suspend(4, false));
        assert!(!state.should_suspend(5, false));
    }

    #[test]
    fn quit_is_monotonic() {
        let mut state = StepState::new();
        state.request_quit(1);
        assert!(state.quit_requested());

        // no later transition clears it
        state.resume(StepMode::StepInto, 0);
        assert!(state.quit_requested());
    }

    #[test]
    fn window_resize_ignores_zero() {
        let mut state = StepState::new();
        assert_eq!(state.window(), 4);
        state.set_window(0);
        assert_eq!(state.window(), 4);
        state.set_window(9);
        assert_eq!(state.window(), 9);
    }
}
