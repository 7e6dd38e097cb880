/// Watches an iterative process and optionally steers it.
///
/// The Newton solver emits one event per accepted iteration and asks its
/// observer for a verdict: `None` lets the iteration continue, `Some(action)`
/// requests a solver-defined control action (for the Newton solver, early
/// stopping at the best point seen). The event and action types are chosen
/// by each consumer, so this trait stays free of solver specifics.
///
/// Pass `()` for no observation, or a closure for ad-hoc monitoring:
/// anything implementing `FnMut(&E) -> Option<A>` is an observer.
pub trait Observer<E, A> {
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

/// The no-op observer: sees nothing, requests nothing.
impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
