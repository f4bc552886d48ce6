//! Behavior wiring re-run on every freshly swapped region.
//!
//! Field toggles, linked lookups, option highlighting and tooltips live
//! behind this hook. Hooks must be idempotent and must not touch navigation,
//! history or storage; they run while the page is locked.

use std::sync::Arc;

use crate::markup::Region;

pub trait RebindHook: Send + Sync {
    fn rebind(&self, region: &mut Region);
}

#[derive(Debug, Default)]
pub struct NoopRebind;

impl RebindHook for NoopRebind {
    fn rebind(&self, _region: &mut Region) {}
}

/// Runs several hooks in order
#[derive(Default, Clone)]
pub struct RebindChain {
    hooks: Vec<Arc<dyn RebindHook>>,
}

impl RebindChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hook: Arc<dyn RebindHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl RebindHook for RebindChain {
    fn rebind(&self, region: &mut Region) {
        for hook in &self.hooks {
            hook.rebind(region);
        }
    }
}

impl<F> RebindHook for F
where
    F: Fn(&mut Region) + Send + Sync,
{
    fn rebind(&self, region: &mut Region) {
        self(region)
    }
}
