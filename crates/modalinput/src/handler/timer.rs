//! The idle timer abandons a partially typed sequence once no key has arrived for a while.
//!
//! There is a single timer thread per handler. It sleeps on a condition variable until the
//! deadline stored in the pending state, and every key that changes the deadline wakes it up to
//! look again, so no timer ever outlives the key that armed it.
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::MutexGuard;
use tracing::debug;

use super::{PendingState, Shared};

pub(super) fn spawn(shared: Arc<Shared>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("modalinput-timeout".into())
        .spawn(move || run(&shared))
}

fn run(shared: &Shared) {
    let mut st = shared.state.lock();

    loop {
        if shared.closed.load(Ordering::SeqCst) {
            return;
        }

        match st.deadline {
            None => {
                shared.timer.wait(&mut st);
            },
            Some(deadline) if Instant::now() < deadline => {
                let _ = shared.timer.wait_until(&mut st, deadline);
            },
            Some(_) => {
                if expire(shared, &mut st) {
                    MutexGuard::unlocked(&mut st, || shared.abandon_operator());
                }
            },
        }
    }
}

/// Clear the pending state after its deadline passed. Returns whether an operator was dropped.
fn expire(shared: &Shared, st: &mut PendingState) -> bool {
    st.deadline = None;

    if st.keys.is_empty() {
        return false;
    }

    debug!(keys = %st.keys, "pending keys timed out");

    let operator = st.operator.is_some();

    st.reset();
    shared.stats.timeouts.fetch_add(1, Ordering::Relaxed);

    return operator;
}
