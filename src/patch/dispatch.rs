use tracing::debug;

use crate::error::AppResult;
use crate::patch::operation::PatchOperation;
use crate::patch::target::DeferredCall;

/// Attribute handler: applies one operation to a target, recording any
/// follow-up call in the context.
pub type Handler<T> = fn(&mut T, &PatchOperation, &mut DispatchContext) -> AppResult<()>;

/// A patchable projection with a fixed attribute table.
pub trait PatchTarget: Sized {
    /// Resource kind used in logs.
    const KIND: &'static str;

    /// Handler registered for `attribute`, matched case-insensitively.
    fn handler(attribute: &str) -> Option<Handler<Self>>;
}

/// Effects accumulated while dispatching a patch request.
#[derive(Debug, Default)]
pub struct DispatchContext {
    deferred: Vec<DeferredCall>,
}

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, call: DeferredCall) {
        self.deferred.push(call);
    }

    /// Drop pending calls matching `predicate`, returning how many were dropped.
    pub fn cancel<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&DeferredCall) -> bool,
    {
        let before = self.deferred.len();
        self.deferred.retain(|call| !predicate(call));
        before - self.deferred.len()
    }

    pub fn deferred(&self) -> &[DeferredCall] {
        &self.deferred
    }

    pub fn into_deferred(self) -> Vec<DeferredCall> {
        self.deferred
    }
}

/// Apply one operation to `target`. Unknown attributes are ignored.
pub fn apply<T: PatchTarget>(
    operation: &PatchOperation,
    target: &mut T,
    context: &mut DispatchContext,
) -> AppResult<()> {
    match T::handler(operation.attribute()) {
        Some(handler) => handler(target, operation, context),
        None => {
            debug!(
                kind = T::KIND,
                attribute = operation.attribute(),
                "ignoring patch of unsupported attribute"
            );
            Ok(())
        }
    }
}

/// Apply operations strictly in order, stopping at the first error.
pub fn apply_all<'a, T, I>(
    operations: I,
    target: &mut T,
    context: &mut DispatchContext,
) -> AppResult<()>
where
    T: PatchTarget,
    I: IntoIterator<Item = &'a PatchOperation>,
{
    for operation in operations {
        apply(operation, target, context)?;
    }
    Ok(())
}
