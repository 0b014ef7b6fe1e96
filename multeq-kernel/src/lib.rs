//! Multiequation unification.
//!
//! A system of equations is kept as a pool of equivalence classes of
//! variables ([Class]), each optionally committed to one structure-shared
//! term ([MultiTerm]). The driver ([unify]) repeatedly takes a class that no
//! other term refers to any more, peels one layer off its term ([reduce]) and
//! folds the displaced argument cells back into the pool ([Pool::compact]).
//! The result is a [SolvedForm]: the discharged classes in order, whose terms
//! point at each other through representative variables.

mod pool;
mod queue;
mod registry;
mod symbol;
mod term;
mod unify;

pub use pool::Pool;
pub use queue::Queue;
pub use registry::{Class, ClassId, Registry};
pub use symbol::{InvalidSymbolError, Symbol};
pub use term::{merge_terms, reduce, Cell, Frontier, MultiTerm, Var};
pub use unify::{unify, SolvedForm};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The equations have no unifier.
    Unification,
    /// The pool or the term graph is malformed.
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("functor-clash: {left} vs {right}")]
    FunctorClash { left: Symbol, right: Symbol },
    #[error("arity-mismatch: {functor} applied to {left} and to {right} arguments")]
    ArityMismatch {
        functor: Symbol,
        left: usize,
        right: usize,
    },
    #[error("symbol-mismatch: {left} vs {right}")]
    SymbolMismatch { left: Symbol, right: Symbol },
    #[error("empty-input: argument cell holds neither variables nor a subterm")]
    EmptyInput,
    #[error("no-ready-classes: {remaining} classes remain but none is ready")]
    NoReadyClasses { remaining: usize },
    #[error("empty-queue: dequeue on an empty queue")]
    EmptyQueue,
    #[error("pending-underflow: pending count of {class} would drop below zero")]
    PendingUnderflow { class: ClassId },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FunctorClash { .. }
            | Error::ArityMismatch { .. }
            | Error::SymbolMismatch { .. } => ErrorKind::Unification,
            Error::EmptyInput
            | Error::NoReadyClasses { .. }
            | Error::EmptyQueue
            | Error::PendingUnderflow { .. } => ErrorKind::Invariant,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Error::FunctorClash { .. } => "functor-clash",
            Error::ArityMismatch { .. } => "arity-mismatch",
            Error::SymbolMismatch { .. } => "symbol-mismatch",
            Error::EmptyInput => "empty-input",
            Error::NoReadyClasses { .. } => "no-ready-classes",
            Error::EmptyQueue => "empty-queue",
            Error::PendingUnderflow { .. } => "pending-underflow",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
