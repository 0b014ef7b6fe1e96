use std::collections::VecDeque;

use crate::{ClassId, Error, Frontier, Registry, Result};

/// Workspace of one unification run.
#[derive(Debug)]
pub struct Pool {
    registry: Registry,
    // classes neither discharged nor absorbed
    remaining: usize,
    ready: VecDeque<ClassId>,
    pending: Vec<ClassId>,
}

impl Pool {
    /// Takes the pending counts stored in `registry` as they are. Live
    /// classes at zero start out ready, in ascending id order.
    pub fn new(registry: Registry) -> Self {
        let mut ready = VecDeque::new();
        let mut pending = vec![];
        for id in registry.live_classes() {
            if registry.class(id).pending() == 0 {
                ready.push_back(id);
            } else {
                pending.push(id);
            }
        }
        let remaining = ready.len() + pending.len();
        Pool {
            registry,
            remaining,
            ready,
            pending,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn ready(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.ready.iter().map(|&id| self.registry.resolve(id))
    }

    /// Live classes still waiting for their pending count to reach zero.
    pub fn pending_classes(&self) -> impl Iterator<Item = ClassId> + '_ {
        let mut seen = vec![];
        self.pending
            .iter()
            .map(|&id| self.registry.resolve(id))
            .filter(move |&id| {
                if seen.contains(&id) || self.registry.class(id).pending() == 0 {
                    return false;
                }
                seen.push(id);
                true
            })
    }

    /// Removes the class at the front of the ready queue.
    pub fn select_ready(&mut self) -> Result<ClassId> {
        let Some(id) = self.ready.pop_front() else {
            return Err(Error::NoReadyClasses {
                remaining: self.remaining,
            });
        };
        self.remaining = self.remaining.saturating_sub(1);
        let id = self.registry.find(id);
        log::debug!("select {id} ({} remaining)", self.remaining);
        Ok(id)
    }

    /// [Registry::merge], keeping the remaining count in step.
    pub fn merge_classes(&mut self, a: ClassId, b: ClassId) -> Result<ClassId> {
        let a = self.registry.find(a);
        let b = self.registry.find(b);
        let survivor = self.registry.merge(a, b)?;
        if a != b {
            self.remaining -= 1;
        }
        Ok(survivor)
    }

    /// Folds the cells of `frontier` back into the pool.
    ///
    /// All variables of one cell end up in one class, the cell's subterm is
    /// merged into that class's term, and each variable occurrence pays off
    /// one unit of its class's pending count. A class reaching zero becomes
    /// ready.
    pub fn compact(&mut self, frontier: Frontier) -> Result<()> {
        for entry in frontier.into_iter().rev() {
            let mut vars = entry.vars;
            let first = vars.dequeue()?;
            let mut anchor = self.registry.find_owner(first);
            self.registry.discharge_one(anchor)?;
            for v in vars {
                let owner = self.registry.find_owner(v);
                // pay off before merging so the sum carries the new count
                self.registry.discharge_one(owner)?;
                if owner != anchor {
                    anchor = self.merge_classes(anchor, owner)?;
                }
            }
            if let Some(term) = entry.term {
                self.registry.commit(anchor, *term)?;
            }
            if self.registry.class(anchor).pending() == 0 {
                log::debug!("{anchor} is ready");
                self.ready.push_back(anchor);
            }
        }
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", self.dump());
        }
        Ok(())
    }

    fn dump(&self) -> String {
        let mut out = format!("pool: {} remaining\n", self.remaining);
        for id in self.registry.live_classes() {
            let class = self.registry.class(id);
            let members: Vec<_> = class.members().iter().map(|v| v.to_string()).collect();
            out.push_str(&format!(
                "  {id}: {{{}}} pending {} {}\n",
                members.join(", "),
                class.pending(),
                if class.term().is_some() { "with term" } else { "" }
            ));
        }
        out
    }
}
