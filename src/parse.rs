use multeq_kernel::Symbol;
use thiserror::Error;

use crate::lex::{Lex, LexError, SourceInfo, Token, TokenKind};
use crate::syntax::{mk_app, mk_const, mk_var, Equation, Term};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("tokenize error")]
    Lex {
        #[from]
        lex_error: LexError,
    },
    #[error("parse error: {message} at {source_info}")]
    Parse {
        message: String,
        source_info: String,
    },
    #[error("unexpected end of input at {source_info}")]
    Eof { source_info: String },
}

pub struct Parser<'a> {
    lex: &'a mut Lex,
}

impl<'a> Parser<'a> {
    pub fn new(lex: &'a mut Lex) -> Self {
        Self { lex }
    }

    fn fail<R>(token: Token, message: impl Into<String>) -> Result<R, ParseError> {
        Err(ParseError::Parse {
            message: message.into(),
            source_info: token.source_info.to_string(),
        })
    }

    fn eof_error(&self) -> ParseError {
        ParseError::Eof {
            source_info: SourceInfo::eof(self.lex.input().clone()).to_string(),
        }
    }

    fn peek_opt(&mut self) -> Option<Token> {
        self.lex.clone().next().and_then(Result::ok)
    }

    fn any_token(&mut self) -> Result<Token, ParseError> {
        match self.lex.next() {
            Some(token) => Ok(token?),
            None => Err(self.eof_error()),
        }
    }

    fn advance(&mut self) {
        self.lex
            .next()
            .expect("unchecked advance")
            .expect("impossible lex error! probably due to unchecked advance");
    }

    pub fn eof(&mut self) -> Result<(), ParseError> {
        if let Some(token) = self.lex.clone().next() {
            Self::fail(token?, "expected EOF but tokens remain")?;
        }
        Ok(())
    }

    fn expect_symbol(&mut self, sym: &str) -> Result<(), ParseError> {
        let token = self.any_token()?;
        if token.is_symbol() && token.as_str() == sym {
            return Ok(());
        }
        Self::fail(token, format!("expected symbol '{}'", sym))
    }

    fn expect_symbol_opt(&mut self, sym: &str) -> Option<Token> {
        if let Some(token) = self.peek_opt() {
            if token.is_symbol() && token.as_str() == sym {
                self.advance();
                return Some(token);
            }
        }
        None
    }

    fn symbol_of(token: Token) -> Result<Symbol, ParseError> {
        match Symbol::intern(token.as_str()) {
            Ok(symbol) => Ok(symbol),
            Err(e) => Self::fail(token, e.to_string()),
        }
    }

    pub fn term(&mut self) -> Result<Term, ParseError> {
        let token = self.any_token()?;
        match token.kind {
            TokenKind::Var => Ok(mk_var(token.as_str())),
            TokenKind::NumLit => Ok(mk_const(Self::symbol_of(token)?)),
            TokenKind::Atom => {
                let functor = Self::symbol_of(token)?;
                if self.expect_symbol_opt("(").is_none() {
                    return Ok(mk_const(functor));
                }
                let mut args = vec![self.term()?];
                while self.expect_symbol_opt(",").is_some() {
                    args.push(self.term()?);
                }
                self.expect_symbol(")")?;
                Ok(mk_app(functor, args))
            }
            TokenKind::Symbol => Self::fail(token, "expected term"),
        }
    }

    pub fn equation(&mut self) -> Result<Equation, ParseError> {
        let left = self.term()?;
        self.expect_symbol("=")?;
        let right = self.term()?;
        Ok(Equation::new(left, right))
    }

    /// Equations separated by `;`, with an optional trailing `;`.
    pub fn equations(&mut self) -> Result<Vec<Equation>, ParseError> {
        let mut equations = vec![];
        while !self.lex.is_eof() {
            equations.push(self.equation()?);
            if self.expect_symbol_opt(";").is_none() {
                break;
            }
        }
        self.eof()?;
        Ok(equations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::File;
    use std::sync::Arc;

    fn parse(input: &str) -> Result<Vec<Equation>, ParseError> {
        let mut lex = Lex::new(Arc::new(File::new("<test>", input)));
        Parser::new(&mut lex).equations()
    }

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s).unwrap()
    }

    #[test]
    fn parses_nested_application() {
        let eqs = parse("f(X, g(a, 0)) = Y").unwrap();
        assert_eq!(
            eqs,
            vec![Equation::new(
                mk_app(
                    sym("f"),
                    vec![
                        mk_var("X"),
                        mk_app(sym("g"), vec![mk_const(sym("a")), mk_const(sym("0"))])
                    ]
                ),
                mk_var("Y")
            )]
        );
    }

    #[test]
    fn equations_are_separated_by_semicolons() {
        assert_eq!(parse("X = a; Y = b").unwrap().len(), 2);
        assert_eq!(parse("X = a; Y = b;").unwrap().len(), 2);
        assert_eq!(parse("").unwrap().len(), 0);
        assert_eq!(parse("-- nothing here\n").unwrap().len(), 0);
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = parse("X = a Y = b").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r###"
        parse error: expected EOF but tokens remain at <test>:1:7
        X = a Y = b
              ^
        "###);
    }

    #[test]
    fn unclosed_parenthesis_hits_eof() {
        let err = parse("f(X = a").unwrap_err();
        assert!(matches!(err, ParseError::Parse { .. }));
        let err = parse("f(X").unwrap_err();
        assert!(matches!(err, ParseError::Eof { .. }));
    }

    #[test]
    fn lex_errors_propagate() {
        let err = parse("X = $").unwrap_err();
        assert!(matches!(err, ParseError::Lex { .. }));
    }
}
