//! First-order terms and equations as written by the user.

use multeq_kernel::Symbol;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Var(String),
    // a constant is an application without arguments
    App(Symbol, Vec<Term>),
}

pub fn mk_var(name: impl Into<String>) -> Term {
    Term::Var(name.into())
}

pub fn mk_app(functor: Symbol, args: Vec<Term>) -> Term {
    Term::App(functor, args)
}

pub fn mk_const(symbol: Symbol) -> Term {
    Term::App(symbol, vec![])
}

impl Term {
    /// Variable occurrences in pre-order.
    pub fn vars(&self) -> Vec<&str> {
        let mut out = vec![];
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Term::Var(name) => out.push(name),
            Term::App(_, args) => {
                for arg in args {
                    arg.collect_vars(out);
                }
            }
        }
    }

    /// Replaces variables bound in `subst`, once. Bindings produced by
    /// solving are already fully expanded, so one pass is enough for those.
    pub fn apply(&self, subst: &BTreeMap<String, Term>) -> Term {
        match self {
            Term::Var(name) => subst.get(name).cloned().unwrap_or_else(|| self.clone()),
            Term::App(f, args) => Term::App(*f, args.iter().map(|arg| arg.apply(subst)).collect()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equation {
    pub left: Term,
    pub right: Term,
}

impl Equation {
    pub fn new(left: Term, right: Term) -> Self {
        Equation { left, right }
    }

    pub fn vars(&self) -> Vec<&str> {
        let mut vars = self.left.vars();
        vars.extend(self.right.vars());
        vars
    }
}
