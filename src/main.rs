use anyhow::{bail, Context};
use clap::Parser;
use minnow::debugger::Debugger;
use minnow::interp::{parser, Environment, Interpreter};
use minnow::ui::console::print::style::ErrorView;
use minnow::ui::console::{self, ConsolePrompt};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Attach the interactive debugger to script execution
    #[arg(short, long)]
    debug: bool,

    /// Print the syntax tree before evaluation
    #[arg(long)]
    ast: bool,

    /// Open an interactive shell after the scripts finish
    #[arg(long)]
    shell: bool,

    /// Script files to execute
    scripts: Vec<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{}", ErrorView::from(format!("{e:#}")));
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let env = Environment::global();

    let mut interp = if args.debug {
        Interpreter::with_hook(Box::new(Debugger::new(ConsolePrompt::new()?)))
    } else {
        Interpreter::new()
    };

    for path in &args.scripts {
        let src = fs::read_to_string(path)
            .with_context(|| format!("can't open '{}'", path.display()))?;

        let ast = match parser::parse(path.clone(), &src) {
            Ok(ast) => Rc::new(ast),
            Err(errors) => {
                parser::report(&path.to_string_lossy(), &src, &errors);
                bail!("can't parse '{}'", path.display());
            }
        };

        if args.ast {
            print!("{}", ast.dump());
        }

        interp
            .eval(&ast, &env)
            .with_context(|| format!("script '{}' failed", path.display()))?;
    }

    if args.shell || args.scripts.is_empty() {
        console::run_shell(&env, args.ast)?;
    }
    Ok(())
}
