use std::fmt::Display;
use std::mem;

use crate::{merge_terms, Error, MultiTerm, Queue, Result, Var};

/// Stable identity of a class record.
///
/// A class absorbed by [Registry::merge] keeps its slot and forwards to the
/// survivor; every lookup goes through [Registry::find], so a stale
/// `ClassId` always reaches the live class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// A multiequation: variables asserted equal, and at most one committed term.
#[derive(Debug, Clone, Default)]
pub struct Class {
    members: Queue<Var>,
    member_count: usize,
    // frontier references still to be resolved before the term can be reduced
    pending: usize,
    term: Option<MultiTerm>,
    forward: Option<ClassId>,
}

impl Class {
    pub fn members(&self) -> &Queue<Var> {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.member_count
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn term(&self) -> Option<&MultiTerm> {
        self.term.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.forward.is_none()
    }
}

/// Owns every class record and maps each variable to its owning class.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    // indexed by Var; may point at an absorbed class
    owners: Vec<ClassId>,
    classes: Vec<Class>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a variable together with the singleton class that owns it.
    pub fn fresh_var(&mut self) -> Var {
        let v = Var::new(self.owners.len() as u32);
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(Class {
            members: Queue::singleton(v),
            member_count: 1,
            ..Default::default()
        });
        self.owners.push(id);
        v
    }

    pub fn var_count(&self) -> usize {
        self.owners.len()
    }

    pub fn vars(&self) -> impl Iterator<Item = Var> {
        (0..self.owners.len() as u32).map(Var::new)
    }

    /// Follows forward links to the live class, compressing the path.
    pub fn find(&mut self, id: ClassId) -> ClassId {
        let root = self.resolve(id);
        let mut cur = id;
        while let Some(next) = self.classes[cur.index()].forward {
            self.classes[cur.index()].forward = Some(root);
            if next == root {
                break;
            }
            cur = next;
        }
        root
    }

    /// Same as [Registry::find] without mutating anything.
    pub fn resolve(&self, mut id: ClassId) -> ClassId {
        while let Some(next) = self.classes[id.index()].forward {
            id = next;
        }
        id
    }

    pub fn find_owner(&mut self, v: Var) -> ClassId {
        let root = self.find(self.owners[v.index()]);
        self.owners[v.index()] = root;
        root
    }

    pub fn owner(&self, v: Var) -> ClassId {
        self.resolve(self.owners[v.index()])
    }

    /// The live class behind `id`.
    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[self.resolve(id).index()]
    }

    fn class_mut(&mut self, id: ClassId) -> &mut Class {
        let id = self.find(id);
        &mut self.classes[id.index()]
    }

    /// Whether `id` itself is a live record, without following forward links.
    pub fn is_live(&self, id: ClassId) -> bool {
        self.classes[id.index()].is_live()
    }

    pub fn live_classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32)
            .map(ClassId)
            .filter(|id| self.is_live(*id))
    }

    /// Merges `term` into the committed term of `id`.
    pub fn commit(&mut self, id: ClassId, term: MultiTerm) -> Result<()> {
        let class = self.class_mut(id);
        class.term = merge_terms(class.term.take(), Some(term))?;
        Ok(())
    }

    pub(crate) fn take_term(&mut self, id: ClassId) -> Option<MultiTerm> {
        self.class_mut(id).term.take()
    }

    pub fn set_pending(&mut self, id: ClassId, pending: usize) {
        self.class_mut(id).pending = pending;
    }

    /// Decrements the pending count of `id` and returns the new value.
    pub(crate) fn discharge_one(&mut self, id: ClassId) -> Result<usize> {
        let id = self.find(id);
        let class = &mut self.classes[id.index()];
        class.pending = class
            .pending
            .checked_sub(1)
            .ok_or(Error::PendingUnderflow { class: id })?;
        Ok(class.pending)
    }

    /// Sets every live pending count to the number of occurrences of the
    /// class's members inside the committed terms of all live classes.
    pub fn count_occurrences(&mut self) {
        let live: Vec<_> = self.live_classes().collect();
        let mut occurrences = vec![];
        for &id in &live {
            self.classes[id.index()].pending = 0;
            if let Some(term) = &self.classes[id.index()].term {
                term.for_each_var(&mut |v| occurrences.push(v));
            }
        }
        for v in occurrences {
            let owner = self.find_owner(v);
            self.classes[owner.index()].pending += 1;
        }
    }

    /// Unions the classes behind `a` and `b` and returns the survivor.
    ///
    /// The class with more members survives; on a tie `a` does. The survivor
    /// receives the union of members, the sum of pending counts and the merge
    /// of both committed terms. The other record becomes a forward link.
    pub fn merge(&mut self, a: ClassId, b: ClassId) -> Result<ClassId> {
        let a = self.find(a);
        let b = self.find(b);
        if a == b {
            return Ok(a);
        }
        let (survivor, absorbed) =
            if self.classes[a.index()].member_count >= self.classes[b.index()].member_count {
                (a, b)
            } else {
                (b, a)
            };
        let mut dead = mem::take(&mut self.classes[absorbed.index()]);
        self.classes[absorbed.index()].forward = Some(survivor);
        log::debug!(
            "merge {absorbed} ({} vars, pending {}) into {survivor}",
            dead.member_count,
            dead.pending
        );

        let class = &mut self.classes[survivor.index()];
        class.members.append(&mut dead.members);
        class.member_count += dead.member_count;
        class.pending += dead.pending;
        class.term = merge_terms(class.term.take(), dead.term.take())?;
        Ok(survivor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, Symbol};

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s).unwrap()
    }

    fn members(reg: &Registry, id: ClassId) -> Vec<Var> {
        let mut vs: Vec<_> = reg.class(id).members().iter().copied().collect();
        vs.sort();
        vs
    }

    #[test]
    fn fresh_vars_own_singleton_classes() {
        let mut reg = Registry::new();
        let x = reg.fresh_var();
        let y = reg.fresh_var();
        assert_ne!(reg.find_owner(x), reg.find_owner(y));
        assert_eq!(members(&reg, reg.owner(x)), vec![x]);
        assert_eq!(reg.live_classes().count(), 2);
    }

    #[test]
    fn merge_with_itself_is_noop() {
        let mut reg = Registry::new();
        let x = reg.fresh_var();
        let id = reg.find_owner(x);
        reg.set_pending(id, 3);
        assert_eq!(reg.merge(id, id), Ok(id));
        assert_eq!(reg.class(id).pending(), 3);
        assert_eq!(reg.class(id).member_count(), 1);
    }

    #[test]
    fn merge_sums_counts_and_redirects_owners() {
        let mut reg = Registry::new();
        let [v7, v8, v5] = [reg.fresh_var(), reg.fresh_var(), reg.fresh_var()];
        let c7 = reg.find_owner(v7);
        let c8 = reg.find_owner(v8);
        let c5 = reg.find_owner(v5);
        let three = reg.merge(c7, c8).unwrap();
        reg.set_pending(three, 3);
        reg.set_pending(c5, 2);

        let survivor = reg.merge(c5, three).unwrap();
        // the larger class survives regardless of argument order
        assert_eq!(survivor, three);
        assert_eq!(reg.class(survivor).pending(), 5);
        assert_eq!(reg.class(survivor).member_count(), 3);
        assert_eq!(members(&reg, survivor), vec![v7, v8, v5]);
        for v in [v7, v8, v5] {
            assert_eq!(reg.find_owner(v), survivor);
        }
        assert!(!reg.is_live(c5));
        assert_eq!(reg.find(c5), survivor);
        assert_eq!(reg.live_classes().count(), 1);
    }

    #[test]
    fn merge_is_symmetric_in_outcome() {
        let build = |flip: bool| {
            let mut reg = Registry::new();
            let x = reg.fresh_var();
            let y = reg.fresh_var();
            let (cx, cy) = (reg.find_owner(x), reg.find_owner(y));
            reg.commit(cy, MultiTerm::leaf(sym("v"))).unwrap();
            reg.set_pending(cx, 1);
            let survivor = if flip {
                reg.merge(cy, cx).unwrap()
            } else {
                reg.merge(cx, cy).unwrap()
            };
            (members(&reg, survivor), reg.class(survivor).pending(), reg.class(survivor).term().cloned())
        };
        assert_eq!(build(false), build(true));
    }

    #[test]
    fn merge_combines_committed_terms() {
        let mut reg = Registry::new();
        let [x, y, z] = [reg.fresh_var(), reg.fresh_var(), reg.fresh_var()];
        let (cx, cy) = (reg.find_owner(x), reg.find_owner(y));
        reg.commit(cx, MultiTerm::new(sym("g"), vec![Cell::var(z)])).unwrap();
        reg.commit(cy, MultiTerm::new(sym("g"), vec![Cell::var(x)])).unwrap();
        let survivor = reg.merge(cx, cy).unwrap();
        let term = reg.class(survivor).term().unwrap();
        assert_eq!(term.args[0].vars.iter().copied().collect::<Vec<_>>(), vec![z, x]);
    }

    #[test]
    fn merge_reports_clash() {
        let mut reg = Registry::new();
        let [x, y] = [reg.fresh_var(), reg.fresh_var()];
        let (cx, cy) = (reg.find_owner(x), reg.find_owner(y));
        reg.commit(cx, MultiTerm::leaf(sym("a"))).unwrap();
        reg.commit(cy, MultiTerm::leaf(sym("b"))).unwrap();
        assert_eq!(reg.merge(cx, cy).unwrap_err().reason(), "symbol-mismatch");
    }

    #[test]
    fn forward_chains_resolve_to_live_class() {
        let mut reg = Registry::new();
        let vs: Vec<_> = (0..4).map(|_| reg.fresh_var()).collect();
        let ids: Vec<_> = vs.iter().map(|&v| reg.find_owner(v)).collect();
        let ab = reg.merge(ids[0], ids[1]).unwrap();
        let cd = reg.merge(ids[2], ids[3]).unwrap();
        let all = reg.merge(cd, ab).unwrap();
        for &id in &ids {
            assert_eq!(reg.resolve(id), all);
            assert!(reg.class(id).is_live());
        }
        assert_eq!(members(&reg, all), vs);
    }

    #[test]
    fn count_occurrences_counts_every_depth() {
        let mut reg = Registry::new();
        let [x, y, z] = [reg.fresh_var(), reg.fresh_var(), reg.fresh_var()];
        let cz = reg.find_owner(z);
        let inner = MultiTerm::new(sym("g"), vec![Cell::var(x)]);
        let outer = MultiTerm::new(
            sym("f"),
            vec![
                Cell {
                    vars: [x, y].into_iter().collect(),
                    term: Some(Box::new(inner)),
                },
                Cell::var(y),
            ],
        );
        reg.commit(cz, outer).unwrap();
        reg.count_occurrences();
        assert_eq!(reg.class(reg.owner(x)).pending(), 2);
        assert_eq!(reg.class(reg.owner(y)).pending(), 2);
        assert_eq!(reg.class(cz).pending(), 0);
    }

    #[test]
    fn discharge_detects_underflow() {
        let mut reg = Registry::new();
        let x = reg.fresh_var();
        let cx = reg.find_owner(x);
        reg.set_pending(cx, 1);
        assert_eq!(reg.discharge_one(cx), Ok(0));
        assert_eq!(
            reg.discharge_one(cx),
            Err(Error::PendingUnderflow { class: cx })
        );
    }
}
