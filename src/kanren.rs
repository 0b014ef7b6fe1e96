//! A small relational core: triangular substitutions, lazy streams of
//! states and the four goal constructors. The recursive unifier here is
//! independent of the multiequation engine and serves as its reference.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::rc::Rc;

use multeq_kernel::Symbol;

use crate::syntax::{Equation, Term};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Var(usize),
    Sym(Symbol),
    Bool(bool),
    Nil,
    Pair(Rc<Value>, Rc<Value>),
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(car), Rc::new(cdr))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        let items: Vec<_> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Value::Nil, |tail, head| Value::cons(head, tail))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Var(n) => write!(f, "#{n}"),
            Value::Sym(s) => write!(f, "{s}"),
            Value::Bool(true) => write!(f, "#t"),
            Value::Bool(false) => write!(f, "#f"),
            Value::Nil => write!(f, "()"),
            Value::Pair(car, cdr) => {
                write!(f, "({car}")?;
                let mut rest = cdr.as_ref();
                loop {
                    match rest {
                        Value::Nil => break,
                        Value::Pair(car, cdr) => {
                            write!(f, " {car}")?;
                            rest = cdr;
                        }
                        other => {
                            write!(f, " . {other}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug)]
struct Binding {
    var: usize,
    value: Value,
    next: Subst,
}

/// Association list from variables to values; extending it shares the tail.
#[derive(Debug, Clone, Default)]
pub struct Subst(Option<Rc<Binding>>);

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, var: usize, value: Value) -> Subst {
        Subst(Some(Rc::new(Binding {
            var,
            value,
            next: self.clone(),
        })))
    }

    pub fn assv(&self, var: usize) -> Option<&Value> {
        let mut cur = &self.0;
        while let Some(binding) = cur {
            if binding.var == var {
                return Some(&binding.value);
            }
            cur = &binding.next.0;
        }
        None
    }

    pub fn len(&self) -> usize {
        let mut n = 0;
        let mut cur = &self.0;
        while let Some(binding) = cur {
            n += 1;
            cur = &binding.next.0;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Chases variable bindings until an unbound variable or a non-variable.
    pub fn walk(&self, value: &Value) -> Value {
        let mut value = value;
        while let Value::Var(n) = value {
            match self.assv(*n) {
                Some(next) => value = next,
                None => break,
            }
        }
        value.clone()
    }

    /// [Subst::walk] applied all the way down.
    pub fn walk_star(&self, value: &Value) -> Value {
        match self.walk(value) {
            Value::Pair(car, cdr) => Value::cons(self.walk_star(&car), self.walk_star(&cdr)),
            other => other,
        }
    }

    fn occurs(&self, var: usize, value: &Value) -> bool {
        match self.walk(value) {
            Value::Var(n) => n == var,
            Value::Pair(car, cdr) => self.occurs(var, &car) || self.occurs(var, &cdr),
            _ => false,
        }
    }

    fn extend_checked(&self, var: usize, value: Value) -> Option<Subst> {
        if self.occurs(var, &value) {
            return None;
        }
        Some(self.extend(var, value))
    }
}

pub fn unify(u: &Value, v: &Value, s: &Subst) -> Option<Subst> {
    let u = s.walk(u);
    let v = s.walk(v);
    match (&u, &v) {
        (Value::Var(a), Value::Var(b)) if a == b => Some(s.clone()),
        (Value::Var(a), _) => s.extend_checked(*a, v.clone()),
        (_, Value::Var(b)) => s.extend_checked(*b, u.clone()),
        (Value::Pair(ua, ud), Value::Pair(va, vd)) => {
            let s = unify(ua, va, s)?;
            unify(ud, vd, &s)
        }
        _ if u == v => Some(s.clone()),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub sub: Subst,
    pub counter: usize,
}

pub enum Stream {
    Empty,
    Mature(State, Box<Stream>),
    Immature(Box<dyn FnOnce() -> Stream>),
}

impl Stream {
    pub fn unit(state: State) -> Stream {
        Stream::Mature(state, Box::new(Stream::Empty))
    }

    // forces immature heads until a state or the end shows up
    fn pull(self) -> Stream {
        let mut stream = self;
        loop {
            match stream {
                Stream::Immature(thunk) => stream = thunk(),
                other => return other,
            }
        }
    }
}

fn mplus(s1: Stream, s2: Stream) -> Stream {
    match s1 {
        Stream::Empty => s2,
        Stream::Mature(state, rest) => Stream::Mature(state, Box::new(mplus(*rest, s2))),
        // swap so the other stream gets a turn
        Stream::Immature(thunk) => Stream::Immature(Box::new(move || mplus(s2, thunk()))),
    }
}

fn bind(stream: Stream, goal: Goal) -> Stream {
    match stream {
        Stream::Empty => Stream::Empty,
        Stream::Mature(state, rest) => mplus(goal.apply(state), bind(*rest, goal)),
        Stream::Immature(thunk) => Stream::Immature(Box::new(move || bind(thunk(), goal))),
    }
}

#[derive(Clone)]
pub struct Goal(Rc<dyn Fn(State) -> Stream>);

impl Goal {
    pub fn new(f: impl Fn(State) -> Stream + 'static) -> Self {
        Goal(Rc::new(f))
    }

    pub fn apply(&self, state: State) -> Stream {
        (self.0)(state)
    }
}

pub fn succeed() -> Goal {
    Goal::new(Stream::unit)
}

pub fn fail() -> Goal {
    Goal::new(|_| Stream::Empty)
}

pub fn eq(u: Value, v: Value) -> Goal {
    Goal::new(move |state| match unify(&u, &v, &state.sub) {
        Some(sub) => Stream::unit(State {
            sub,
            counter: state.counter,
        }),
        None => Stream::Empty,
    })
}

pub fn call_fresh(f: impl Fn(Value) -> Goal + 'static) -> Goal {
    Goal::new(move |state| {
        let var = Value::Var(state.counter);
        f(var).apply(State {
            sub: state.sub,
            counter: state.counter + 1,
        })
    })
}

pub fn disj(g1: Goal, g2: Goal) -> Goal {
    Goal::new(move |state| mplus(g1.apply(state.clone()), g2.apply(state)))
}

pub fn conj(g1: Goal, g2: Goal) -> Goal {
    Goal::new(move |state| bind(g1.apply(state), g2.clone()))
}

/// Suspends goal construction, so recursive relations do not loop eagerly.
pub fn delay(f: impl Fn() -> Goal + 'static) -> Goal {
    let f = Rc::new(f);
    Goal::new(move |state| {
        let f = Rc::clone(&f);
        Stream::Immature(Box::new(move || f().apply(state)))
    })
}

pub fn take(n: usize, stream: Stream) -> Vec<State> {
    let mut out = vec![];
    let mut stream = stream;
    while out.len() < n {
        match stream.pull() {
            Stream::Mature(state, rest) => {
                out.push(state);
                stream = *rest;
            }
            _ => break,
        }
    }
    out
}

/// Diverges on an infinite stream.
pub fn take_all(stream: Stream) -> Vec<State> {
    take(usize::MAX, stream)
}

/// Encodes syntax terms as values: `f(a, X)` becomes the proper list
/// `(f a X)`, a constant becomes a bare symbol.
#[derive(Debug, Default)]
pub struct Encoder {
    ids: HashMap<String, usize>,
    names: Vec<String>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(&mut self, name: &str) -> usize {
        if let Some(&n) = self.ids.get(name) {
            return n;
        }
        let n = self.names.len();
        self.ids.insert(name.to_owned(), n);
        self.names.push(name.to_owned());
        n
    }

    pub fn encode(&mut self, term: &Term) -> Value {
        match term {
            Term::Var(name) => Value::Var(self.var(name)),
            Term::App(f, args) if args.is_empty() => Value::Sym(*f),
            Term::App(f, args) => {
                let mut items = vec![Value::Sym(*f)];
                items.extend(args.iter().map(|arg| self.encode(arg)));
                Value::list(items)
            }
        }
    }

    /// Inverse of [Encoder::encode] for values built from encoded terms.
    pub fn decode(&self, value: &Value) -> Option<Term> {
        match value {
            Value::Var(n) => self.names.get(*n).map(|name| Term::Var(name.clone())),
            Value::Sym(s) => Some(Term::App(*s, vec![])),
            Value::Pair(head, tail) => {
                let Value::Sym(f) = head.as_ref() else {
                    return None;
                };
                let mut args = vec![];
                let mut rest = tail.as_ref();
                while let Value::Pair(car, cdr) = rest {
                    args.push(self.decode(car)?);
                    rest = cdr;
                }
                (*rest == Value::Nil).then_some(Term::App(*f, args))
            }
            Value::Bool(_) | Value::Nil => None,
        }
    }

    /// Number of variables handed out so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Solves `equations` with the recursive unifier. Variables bound to
/// themselves are left out of the result.
pub fn run(equations: &[Equation]) -> Option<BTreeMap<String, Term>> {
    let mut encoder = Encoder::new();
    let goal = equations.iter().fold(succeed(), |goal, equation| {
        let left = encoder.encode(&equation.left);
        let right = encoder.encode(&equation.right);
        conj(goal, eq(left, right))
    });
    let start = State {
        sub: Subst::new(),
        counter: encoder.len(),
    };
    let state = take(1, goal.apply(start)).into_iter().next()?;
    let mut bindings = BTreeMap::new();
    for (n, name) in encoder.names.iter().enumerate() {
        let value = state.sub.walk_star(&Value::Var(n));
        if value == Value::Var(n) {
            continue;
        }
        bindings.insert(name.clone(), encoder.decode(&value)?);
    }
    Some(bindings)
}
