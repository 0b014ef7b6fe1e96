use std::fmt::Display;
use std::iter::zip;
use std::mem;

use crate::{Error, Queue, Result, Symbol};

/// A variable. Only the identity matters; the [Registry](crate::Registry)
/// that created it knows which class owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);

impl Var {
    pub const fn new(raw: u32) -> Self {
        Var(raw)
    }

    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "_{}", self.0)
    }
}

/// One argument position of a [MultiTerm]: the variables claimed equal at
/// this position, and possibly a subterm claimed equal to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub vars: Queue<Var>,
    pub term: Option<Box<MultiTerm>>,
}

impl Cell {
    pub fn var(v: Var) -> Self {
        Cell {
            vars: Queue::singleton(v),
            term: None,
        }
    }

    pub fn nested(term: MultiTerm) -> Self {
        Cell {
            vars: Queue::new(),
            term: Some(Box::new(term)),
        }
    }

    /// Whether the cell is a single placeholder variable, as left by [reduce].
    pub fn is_collapsed(&self) -> bool {
        self.vars.len() == 1 && self.term.is_none()
    }
}

/// A function application in structure-shared form. A symbol is a multiterm
/// without arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiTerm {
    pub functor: Symbol,
    pub args: Vec<Cell>,
}

impl MultiTerm {
    pub fn new(functor: Symbol, args: Vec<Cell>) -> Self {
        MultiTerm { functor, args }
    }

    pub fn leaf(symbol: Symbol) -> Self {
        MultiTerm::new(symbol, vec![])
    }

    pub fn is_leaf(&self) -> bool {
        self.args.is_empty()
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Calls `f` on every variable occurrence at any depth.
    pub fn for_each_var(&self, f: &mut impl FnMut(Var)) {
        for cell in &self.args {
            for &v in &cell.vars {
                f(v);
            }
            if let Some(term) = &cell.term {
                term.for_each_var(f);
            }
        }
    }
}

/// Merges two optional committed terms into one, splicing the variable
/// queues of matching argument positions together.
pub fn merge_terms(left: Option<MultiTerm>, right: Option<MultiTerm>) -> Result<Option<MultiTerm>> {
    match (left, right) {
        (None, term) | (term, None) => Ok(term),
        (Some(left), Some(right)) => merge_multiterms(left, right).map(Some),
    }
}

fn merge_multiterms(mut left: MultiTerm, right: MultiTerm) -> Result<MultiTerm> {
    if left.functor != right.functor {
        if left.is_leaf() && right.is_leaf() {
            return Err(Error::SymbolMismatch {
                left: left.functor,
                right: right.functor,
            });
        }
        return Err(Error::FunctorClash {
            left: left.functor,
            right: right.functor,
        });
    }
    if left.arity() != right.arity() {
        return Err(Error::ArityMismatch {
            functor: left.functor,
            left: left.arity(),
            right: right.arity(),
        });
    }
    for (l, mut r) in zip(&mut left.args, right.args) {
        l.vars.append(&mut r.vars);
        let nested = merge_terms(l.term.take().map(|t| *t), r.term.map(|t| *t))?;
        l.term = nested.map(Box::new);
    }
    Ok(left)
}

/// Cells displaced by one [reduce] step.
pub type Frontier = Vec<Cell>;

/// Peels one layer off `term`.
///
/// Every argument cell that holds variables is moved out whole into the
/// returned frontier and replaced by a single placeholder, the first of its
/// variables. Cells holding only a subterm stay in place and are reduced
/// recursively, so `term` ends up as the common part of everything that was
/// merged into it.
pub fn reduce(term: &mut MultiTerm) -> Result<Frontier> {
    let mut frontier = vec![];
    reduce_into(term, &mut frontier)?;
    Ok(frontier)
}

fn reduce_into(term: &mut MultiTerm, frontier: &mut Frontier) -> Result<()> {
    for cell in &mut term.args {
        if let Some(&representative) = cell.vars.front() {
            frontier.push(mem::replace(cell, Cell::var(representative)));
        } else {
            let Some(nested) = cell.term.as_deref_mut() else {
                return Err(Error::EmptyInput);
            };
            reduce_into(nested, frontier)?;
        }
    }
    Ok(())
}
