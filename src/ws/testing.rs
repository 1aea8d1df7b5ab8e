use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::traits::HeartbeatTarget;

#[derive(Debug)]
struct State {
    alive: AtomicBool,
    open: AtomicBool,
    answers: bool,
    pings: AtomicUsize,
    terminated: AtomicBool,
}

/// In-memory [`HeartbeatTarget`]. An answering target acknowledges every probe at once.
#[derive(Debug, Clone)]
pub(crate) struct FakeTarget {
    state: Arc<State>,
}

impl FakeTarget {
    fn new(answers: bool) -> Self {
        Self {
            state: Arc::new(State {
                alive: AtomicBool::new(true),
                open: AtomicBool::new(true),
                answers,
                pings: AtomicUsize::new(0),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn silent() -> Self {
        Self::new(false)
    }

    pub(crate) fn answering() -> Self {
        Self::new(true)
    }

    pub(crate) fn alive(&self) -> bool {
        self.state.alive.load(Ordering::SeqCst)
    }

    pub(crate) fn pings(&self) -> usize {
        self.state.pings.load(Ordering::SeqCst)
    }

    pub(crate) fn terminated(&self) -> bool {
        self.state.terminated.load(Ordering::SeqCst)
    }

    pub(crate) fn set_open(&self, open: bool) {
        self.state.open.store(open, Ordering::SeqCst);
    }
}

impl PartialEq for FakeTarget {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl HeartbeatTarget for FakeTarget {
    fn is_open(&self) -> bool {
        self.state.open.load(Ordering::SeqCst)
    }

    fn take_alive(&self) -> bool {
        self.state.alive.swap(false, Ordering::SeqCst)
    }

    fn send_probe(&self) {
        self.state.pings.fetch_add(1, Ordering::SeqCst);
        if self.state.answers {
            self.state.alive.store(true, Ordering::SeqCst);
        }
    }

    fn force_close(&self) {
        self.state.terminated.store(true, Ordering::SeqCst);
        self.state.open.store(false, Ordering::SeqCst);
    }
}
