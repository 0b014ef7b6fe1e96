//! Turns parsed equations into the initial pool of the unifier.

use std::collections::HashMap;

use multeq_kernel::{Cell, MultiTerm, Pool, Registry, Result, Var};

use crate::syntax::{Equation, Term};

/// Names of the variables of one run, indexed by [Var].
#[derive(Debug, Clone, Default)]
pub struct VarTable {
    names: Vec<String>,
    ids: HashMap<String, Var>,
    hidden: Vec<bool>,
}

impl VarTable {
    fn intern(&mut self, registry: &mut Registry, name: &str) -> Var {
        if let Some(&v) = self.ids.get(name) {
            return v;
        }
        let v = registry.fresh_var();
        debug_assert_eq!(v.index(), self.names.len());
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), v);
        self.hidden.push(false);
        v
    }

    // anchors equations with no variable side; never visible to the user
    fn fresh_hidden(&mut self, registry: &mut Registry) -> Var {
        let v = registry.fresh_var();
        let count = self.hidden.iter().filter(|&&h| h).count();
        self.names.push(format!("?{count}"));
        self.hidden.push(true);
        v
    }

    pub fn get(&self, name: &str) -> Option<Var> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, v: Var) -> &str {
        &self.names[v.index()]
    }

    pub fn is_hidden(&self, v: Var) -> bool {
        self.hidden[v.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Variables written by the user, in first-occurrence order.
    pub fn user_vars(&self) -> impl Iterator<Item = Var> + '_ {
        (0..self.names.len() as u32)
            .map(Var::new)
            .filter(|&v| !self.is_hidden(v))
    }
}

fn multiterm(vars: &VarTable, functor: multeq_kernel::Symbol, args: &[Term]) -> MultiTerm {
    let cells = args
        .iter()
        .map(|arg| match arg {
            Term::Var(name) => Cell::var(vars.get(name).expect("variable interned up front")),
            Term::App(f, args) => Cell::nested(multiterm(vars, *f, args)),
        })
        .collect();
    MultiTerm::new(functor, cells)
}

/// Builds the initial pool for `equations`.
///
/// Every equation ends up in one class: the class of its variable side if
/// it has one, otherwise the class of a fresh hidden variable. Clashes
/// between top-level functors are reported right away.
pub fn build(equations: &[Equation]) -> Result<(Pool, VarTable)> {
    let mut registry = Registry::new();
    let mut vars = VarTable::default();
    for eq in equations {
        for name in eq.vars() {
            vars.intern(&mut registry, name);
        }
    }

    for eq in equations {
        let anchor = match (&eq.left, &eq.right) {
            (Term::Var(name), _) | (_, Term::Var(name)) => {
                vars.get(name).expect("variable interned up front")
            }
            _ => vars.fresh_hidden(&mut registry),
        };
        for side in [&eq.left, &eq.right] {
            let id = registry.find_owner(anchor);
            match side {
                Term::Var(name) => {
                    let v = vars.get(name).expect("variable interned up front");
                    let other = registry.find_owner(v);
                    registry.merge(id, other)?;
                }
                Term::App(f, args) => registry.commit(id, multiterm(&vars, *f, args))?,
            }
        }
    }

    registry.count_occurrences();
    let pool = Pool::new(registry);
    log::debug!(
        "built pool: {} equations, {} variables, {} classes",
        equations.len(),
        vars.len(),
        pool.remaining()
    );
    Ok((pool, vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_equations;

    fn build_str(input: &str) -> Result<(Pool, VarTable)> {
        let equations = parse_equations("<test>", input).unwrap();
        build(&equations)
    }

    fn pending_of(pool: &Pool, vars: &VarTable, name: &str) -> usize {
        let v = vars.get(name).unwrap();
        pool.registry().class(pool.registry().owner(v)).pending()
    }

    #[test]
    fn variables_are_numbered_in_first_occurrence_order() {
        let (_, vars) = build_str("f(X, g(Y)) = Z; Y = W").unwrap();
        let names: Vec<_> = vars.user_vars().map(|v| vars.name(v).to_owned()).collect();
        assert_eq!(names, vec!["X", "Y", "Z", "W"]);
    }

    #[test]
    fn equation_without_variable_side_gets_hidden_anchor() {
        let (pool, vars) = build_str("f(X) = f(a)").unwrap();
        assert_eq!(vars.len(), 2);
        let hidden = Var::new(1);
        assert!(vars.is_hidden(hidden));
        assert_eq!(vars.name(hidden), "?0");
        assert_eq!(vars.user_vars().count(), 1);
        let anchor = pool.registry().class(pool.registry().owner(hidden));
        assert_eq!(anchor.pending(), 0);
        assert_eq!(anchor.term().unwrap().arity(), 1);
    }

    #[test]
    fn pending_counts_every_occurrence_inside_terms() {
        let (pool, vars) = build_str("Z = f(X, g(X, Y)); W = h(Y)").unwrap();
        assert_eq!(pending_of(&pool, &vars, "X"), 2);
        assert_eq!(pending_of(&pool, &vars, "Y"), 2);
        assert_eq!(pending_of(&pool, &vars, "Z"), 0);
        assert_eq!(pending_of(&pool, &vars, "W"), 0);
        let ready: Vec<_> = pool.ready().collect();
        let registry = pool.registry();
        assert_eq!(
            ready,
            vec![
                registry.owner(vars.get("Z").unwrap()),
                registry.owner(vars.get("W").unwrap())
            ]
        );
    }

    #[test]
    fn variable_equations_merge_classes() {
        let (pool, vars) = build_str("X = Y; Y = Z; U = V").unwrap();
        let registry = pool.registry();
        let owner = |name| registry.owner(vars.get(name).unwrap());
        assert_eq!(owner("X"), owner("Z"));
        assert_ne!(owner("X"), owner("U"));
        assert_eq!(pool.remaining(), 2);
    }

    #[test]
    fn top_level_clash_is_reported_while_building() {
        let err = build_str("X = f(a); X = g(a)").unwrap_err();
        assert_eq!(err.reason(), "functor-clash");
        let err = build_str("f(a) = f(a, b)").unwrap_err();
        assert_eq!(err.reason(), "arity-mismatch");
    }

    #[test]
    fn cyclic_system_has_nothing_ready() {
        let (pool, vars) = build_str("X = f(Y); Y = g(X)").unwrap();
        assert_eq!(pool.ready().count(), 0);
        assert_eq!(pending_of(&pool, &vars, "X"), 1);
        assert_eq!(pending_of(&pool, &vars, "Y"), 1);
    }
}
