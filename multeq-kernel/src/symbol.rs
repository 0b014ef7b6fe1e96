use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::RwLock;
use thiserror::Error;

/// An interned function or constant symbol. Two symbols are equal iff they
/// were interned from the same string.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Symbol(usize);

#[derive(Default)]
struct SymbolTable {
    ids: HashMap<String, Symbol>,
    names: Vec<String>,
}

static SYMBOL_TABLE: Lazy<RwLock<SymbolTable>> = Lazy::new(Default::default);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid symbol: {0:?}")]
pub struct InvalidSymbolError(pub String);

impl TryFrom<&str> for Symbol {
    type Error = InvalidSymbolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Symbol::intern(value)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = SYMBOL_TABLE.read().unwrap();
        match table.names.get(self.0) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "#{}", self.0),
        }
    }
}

impl Symbol {
    pub fn intern(value: &str) -> Result<Symbol, InvalidSymbolError> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"^[\p{Alphabetic}\p{Number}_][\p{Alphabetic}\p{Number}_']*$").unwrap()
        });
        if !RE.is_match(value) {
            return Err(InvalidSymbolError(value.to_owned()));
        }
        if let Some(&symbol) = SYMBOL_TABLE.read().unwrap().ids.get(value) {
            return Ok(symbol);
        }
        let mut table = SYMBOL_TABLE.write().unwrap();
        // another writer may have won the race between the two locks
        if let Some(&symbol) = table.ids.get(value) {
            return Ok(symbol);
        }
        let symbol = Symbol(table.names.len());
        table.names.push(value.to_owned());
        table.ids.insert(value.to_owned(), symbol);
        Ok(symbol)
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let a = Symbol::intern("cons").unwrap();
        let b = Symbol::intern("cons").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, Symbol::intern("nil").unwrap());
        assert_eq!(a.name(), "cons");
    }

    #[test]
    fn numerals_and_primes_are_symbols() {
        assert!(Symbol::intern("0").is_ok());
        assert!(Symbol::intern("f'").is_ok());
        assert!(Symbol::intern("λ").is_ok());
    }

    #[test]
    fn malformed_names_are_rejected() {
        assert_eq!(
            Symbol::intern("f(x)"),
            Err(InvalidSymbolError("f(x)".to_owned()))
        );
        assert!(Symbol::intern("").is_err());
        assert!(Symbol::intern("'a").is_err());
    }
}
