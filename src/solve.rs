use std::collections::{BTreeMap, HashMap};

use easy_ext::ext;
use multeq_kernel::{Cell, Class, ClassId, Error as KernelError, MultiTerm, SolvedForm, Var};
use thiserror::Error;

use crate::build::{build, VarTable};
use crate::syntax::{mk_var, Equation, Term};

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("occurs check failed: {} would contain themselves", .vars.join(", "))]
    Occurs { vars: Vec<String> },
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

#[ext(ClassExt)]
impl Class {
    /// The member with the smallest id, which stands for the whole class.
    fn canonical(&self) -> Option<Var> {
        self.members().iter().copied().min()
    }
}

/// One finalized class as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedClass {
    pub members: Vec<String>,
    pub term: Option<Term>,
}

/// Flat bindings of user variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution(BTreeMap<String, Term>);

impl Substitution {
    pub fn get(&self, name: &str) -> Option<&Term> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Term)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies the bindings to `term`.
    pub fn apply(&self, term: &Term) -> Term {
        term.apply(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Solution {
    form: SolvedForm,
    vars: VarTable,
}

impl Solution {
    pub fn form(&self) -> &SolvedForm {
        &self.form
    }

    pub fn vars(&self) -> &VarTable {
        &self.vars
    }

    fn canonical_name(&self, id: ClassId) -> &str {
        match self.form.registry().class(id).canonical() {
            Some(v) => self.vars.name(v),
            None => "_",
        }
    }

    fn cell_owner(&self, cell: &Cell) -> Option<ClassId> {
        cell.vars.front().map(|&v| self.form.owner(v))
    }

    fn render(&self, term: &MultiTerm) -> Term {
        let args = term
            .args
            .iter()
            .map(|cell| match (self.cell_owner(cell), &cell.term) {
                (Some(id), _) => mk_var(self.canonical_name(id)),
                (None, Some(nested)) => self.render(nested),
                (None, None) => mk_var("_"),
            })
            .collect();
        Term::App(term.functor, args)
    }

    /// Classes in discharge order. Classes made only of hidden anchors are
    /// left out; their constraints live on in the classes they reference.
    pub fn classes(&self) -> Vec<SolvedClass> {
        self.form
            .classes()
            .filter_map(|(_, class)| {
                let mut members: Vec<Var> = class
                    .members()
                    .iter()
                    .copied()
                    .filter(|&v| !self.vars.is_hidden(v))
                    .collect();
                if members.is_empty() {
                    return None;
                }
                members.sort();
                Some(SolvedClass {
                    members: members.iter().map(|&v| self.vars.name(v).to_owned()).collect(),
                    term: class.term().map(|t| self.render(t)),
                })
            })
            .collect()
    }

    fn expand(&self, id: ClassId, memo: &mut HashMap<ClassId, Term>) -> Term {
        if let Some(term) = memo.get(&id) {
            return term.clone();
        }
        let class = self.form.registry().class(id);
        let expanded = match class.term() {
            None => mk_var(self.canonical_name(id)),
            Some(term) => self.expand_term(term, memo),
        };
        memo.insert(id, expanded.clone());
        expanded
    }

    fn expand_term(&self, term: &MultiTerm, memo: &mut HashMap<ClassId, Term>) -> Term {
        let args = term
            .args
            .iter()
            .map(|cell| match (self.cell_owner(cell), &cell.term) {
                (Some(id), _) => self.expand(id, memo),
                (None, Some(nested)) => self.expand_term(nested, memo),
                (None, None) => mk_var("_"),
            })
            .collect();
        Term::App(term.functor, args)
    }

    /// Walks the solved form into a flat most general unifier. Variables
    /// left unconstrained map to their class's canonical variable, unless
    /// they are canonical themselves.
    pub fn substitution(&self) -> Substitution {
        let mut memo = HashMap::new();
        let mut bindings = BTreeMap::new();
        for v in self.vars.user_vars() {
            let id = self.form.owner(v);
            let class = self.form.registry().class(id);
            if class.term().is_none() && class.canonical() == Some(v) {
                continue;
            }
            bindings.insert(self.vars.name(v).to_owned(), self.expand(id, &mut memo));
        }
        Substitution(bindings)
    }
}

/// Builds the pool for `equations` and runs the unifier on it.
pub fn solve(equations: &[Equation]) -> Result<Solution, SolveError> {
    let (mut pool, vars) = build(equations)?;
    match pool.discharge() {
        Ok(order) => {
            log::info!("solved {} equations into {} classes", equations.len(), order.len());
            Ok(Solution {
                form: SolvedForm::new(pool.into_registry(), order),
                vars,
            })
        }
        Err(KernelError::NoReadyClasses { remaining }) => {
            let registry = pool.registry();
            let mut stuck: Vec<Var> = pool
                .pending_classes()
                .flat_map(|id| registry.class(id).members().iter().copied())
                .filter(|&v| !vars.is_hidden(v))
                .collect();
            if stuck.is_empty() {
                return Err(KernelError::NoReadyClasses { remaining }.into());
            }
            stuck.sort();
            log::debug!("stalled with {remaining} classes left");
            Err(SolveError::Occurs {
                vars: stuck.iter().map(|&v| vars.name(v).to_owned()).collect(),
            })
        }
        Err(e) => Err(e.into()),
    }
}
