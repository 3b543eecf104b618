use crate::error::InvokeError;

/// Receives the stages of a callback-style invocation. Exactly one of
/// `result` or `failure` is reported per invocation, followed by `complete`.
/// The stage hooks are optional.
pub trait InvocationCallback<R>: Send + Sync {
    fn sent(&self) {}

    fn received(&self) {}

    fn result(&self, response: R);

    fn failure(&self, error: InvokeError);

    fn complete(&self) {}

    fn retired(&self) {}
}
