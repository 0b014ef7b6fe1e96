use std::sync::Arc;

use anyhow::Context;
use lex::Lex;
use parse::Parser;

pub mod build;
pub mod kanren;
pub mod lex;
pub mod parse;
mod print;
pub mod solve;
pub mod syntax;

pub use build::{build, VarTable};
pub use lex::File;
pub use parse::ParseError;
pub use solve::{solve, SolveError, SolvedClass, Solution, Substitution};
pub use syntax::{Equation, Term};

pub fn parse_file(file: Arc<File>) -> Result<Vec<Equation>, ParseError> {
    let mut lex = Lex::new(file);
    Parser::new(&mut lex).equations()
}

pub fn parse_equations(name: &str, contents: &str) -> Result<Vec<Equation>, ParseError> {
    parse_file(Arc::new(File::new(name, contents)))
}

/// Parses and solves a whole file.
pub fn process(file: Arc<File>) -> anyhow::Result<Solution> {
    let equations = match parse_file(Arc::clone(&file)) {
        Ok(equations) => equations,
        Err(e) => {
            return Err(e).context("parse error");
        }
    };
    log::info!("{}: {} equations", file.name(), equations.len());
    let solution = solve(&equations).context("unification failed")?;
    Ok(solution)
}

#[cfg(test)]
#[ctor::ctor]
fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_error(err: &anyhow::Error) -> String {
        let mut lines = vec!["error chain:".to_string()];
        for cause in err.chain() {
            lines.push(format!("  - {cause}"));
        }
        lines.join("\n")
    }

    #[test]
    fn process_reports_the_failing_stage() {
        let err = process(Arc::new(File::new("<test>", "f(X) = g(X)"))).unwrap_err();
        insta::assert_snapshot!(format_error(&err), @r###"
        error chain:
          - unification failed
          - functor-clash: f vs g
        "###);

        let err = process(Arc::new(File::new("<test>", "X = f(X)"))).unwrap_err();
        insta::assert_snapshot!(format_error(&err), @r###"
        error chain:
          - unification failed
          - occurs check failed: X would contain themselves
        "###);
    }

    #[test]
    fn process_solves_files() {
        let solution = process(Arc::new(File::new("<test>", "X = a;\nY = f(X);\n"))).unwrap();
        assert_eq!(solution.substitution().get("Y").unwrap().to_string(), "f(a)");
    }
}
