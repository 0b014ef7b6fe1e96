use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use multeq::{process, File};

const USAGE: &str = "\
Usage: multeq [OPTIONS] [FILE]

Solves the equations in FILE, or on stdin when FILE is absent or `-`.

Options:
      --subst      print the flattened substitution instead of the solved form
  -h, --help       print this help
  -v, --version    print version
";

struct Options {
    subst: bool,
    path: Option<String>,
}

enum Command {
    Help,
    Version,
    Solve(Options),
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    let mut options = Options {
        subst: false,
        path: None,
    };
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "--subst" => options.subst = true,
            flag if flag.starts_with('-') && flag != "-" => bail!("unknown option `{flag}`"),
            _ if options.path.is_none() => options.path = Some(arg),
            _ => bail!("unexpected argument `{arg}`"),
        }
    }
    Ok(Command::Solve(options))
}

fn read_input(path: Option<&str>) -> anyhow::Result<File> {
    match path {
        None | Some("-") => {
            let mut contents = String::new();
            std::io::stdin()
                .read_to_string(&mut contents)
                .context("failed to read stdin")?;
            Ok(File::new("<stdin>", contents))
        }
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read `{path}`"))?;
            Ok(File::new(path, contents))
        }
    }
}

fn run() -> anyhow::Result<()> {
    let options = match parse_args(std::env::args().skip(1))? {
        Command::Help => {
            print!("{USAGE}");
            return Ok(());
        }
        Command::Version => {
            println!("multeq {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Solve(options) => options,
    };
    let file = read_input(options.path.as_deref())?;
    let solution = process(Arc::new(file))?;
    if options.subst {
        print!("{}", solution.substitution());
    } else {
        print!("{solution}");
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
