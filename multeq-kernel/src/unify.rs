use crate::{reduce, Class, ClassId, Pool, Registry, Result, Var};

/// Discharged classes in discharge order. Committed terms refer to other
/// classes only through placeholder variables, so the whole thing is a DAG.
#[derive(Debug, Clone)]
pub struct SolvedForm {
    registry: Registry,
    order: Vec<ClassId>,
}

impl SolvedForm {
    pub fn new(registry: Registry, order: Vec<ClassId>) -> Self {
        SolvedForm { registry, order }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn order(&self) -> &[ClassId] {
        &self.order
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &Class)> + '_ {
        self.order.iter().map(|&id| (id, self.registry.class(id)))
    }

    pub fn owner(&self, v: Var) -> ClassId {
        self.registry.owner(v)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Pool {
    /// Runs the driver loop to completion and returns the discharge order.
    /// On error the pool is left mid-run and must not be reused.
    pub fn discharge(&mut self) -> Result<Vec<ClassId>> {
        let mut order = vec![];
        while self.remaining() != 0 {
            let id = self.select_ready()?;
            if let Some(mut term) = self.registry_mut().take_term(id) {
                let frontier = reduce(&mut term)?;
                log::trace!("{id}: frontier of {} cells", frontier.len());
                self.registry_mut().commit(id, term)?;
                self.compact(frontier)?;
            }
            order.push(self.registry_mut().find(id));
        }
        Ok(order)
    }
}

/// Solves the equations held by `pool`.
pub fn unify(mut pool: Pool) -> Result<SolvedForm> {
    let order = pool.discharge()?;
    Ok(SolvedForm::new(pool.into_registry(), order))
}
