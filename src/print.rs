use std::fmt::Display;

use crate::solve::{SolvedClass, Solution, Substitution};
use crate::syntax::{Equation, Term};

impl Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{name}"),
            Term::App(functor, args) => {
                write!(f, "{functor}")?;
                if let Some((first, rest)) = args.split_first() {
                    write!(f, "({first}")?;
                    for arg in rest {
                        write!(f, ", {arg}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

impl Display for SolvedClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.members.join(", "))?;
        if let Some(term) = &self.term {
            write!(f, " = {term}")?;
        }
        Ok(())
    }
}

/// One class per line.
impl Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for class in self.classes() {
            writeln!(f, "{class}")?;
        }
        Ok(())
    }
}

impl Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, term) in self.iter() {
            writeln!(f, "{name} ↦ {term}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse_equations, solve};

    fn printed(input: &str) -> String {
        let equations = parse_equations("<test>", input).unwrap();
        solve(&equations).unwrap().to_string()
    }

    #[test]
    fn equations_print_back_as_parsed() {
        let equations = parse_equations("<test>", "f(X,g(a,0))=Y;Z=nil").unwrap();
        let printed: Vec<_> = equations.iter().map(|eq| eq.to_string()).collect();
        assert_eq!(printed, vec!["f(X, g(a, 0)) = Y", "Z = nil"]);
    }

    #[test]
    fn solved_form_lists_classes_in_discharge_order() {
        insta::assert_snapshot!(printed("f(X, Y) = f(a, b)"), @r###"
        {Y} = b
        {X} = a
        "###);
    }

    #[test]
    fn shared_structure_stays_shared() {
        insta::assert_snapshot!(printed("X = f(Y, Y); Y = g(Z, Z)"), @r###"
        {X} = f(Y, Y)
        {Y} = g(Z, Z)
        {Z}
        "###);
    }

    #[test]
    fn substitution_prints_one_binding_per_line() {
        let equations = parse_equations("<test>", "f(g(X), Y) = f(Y, g(h(Z)))").unwrap();
        let subst = solve(&equations).unwrap().substitution();
        insta::assert_snapshot!(subst.to_string(), @r###"
        X ↦ h(Z)
        Y ↦ g(h(Z))
        "###);
    }
}
