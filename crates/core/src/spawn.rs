/// Fire-and-forget task dispatch.
///
/// Resolved actions run independently of the request/response cycle: the
/// resolver hands the side effect to a `Spawner` and returns to its caller
/// without joining. There is deliberately no cancellation handle; a hung
/// action (say, a blocked subprocess) must not block the resolver.
pub trait Spawner: Send + Sync {
    fn spawn(&self, task: Box<dyn FnOnce() + Send + 'static>);
}

/// Dispatches tasks onto tokio's blocking pool. Actions shell out to OS
/// tooling, so the blocking pool is the right home for them.
#[derive(Debug, Default)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        tokio::task::spawn_blocking(task);
    }
}

/// Runs tasks synchronously on the calling thread, so tests observe action
/// side effects deterministically.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct InlineSpawner;

#[cfg(test)]
impl Spawner for InlineSpawner {
    fn spawn(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        task();
    }
}
