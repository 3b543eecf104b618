/// Receives decoded intermediate responses published by the entity while
/// a blocking invocation is outstanding
pub trait InvokeMonitor<R>: Send + Sync {
    fn accept(&self, intermediate: R);
}

impl<R, F> InvokeMonitor<R> for F
where
    F: Fn(R) + Send + Sync,
{
    fn accept(&self, intermediate: R) {
        self(intermediate)
    }
}
