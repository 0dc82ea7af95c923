// src/health/panic_hook.rs
//
// Panics raised by a check are reported through the registry's dispatch;
// this hook keeps the default hook from also printing them to stderr.
use std::cell::Cell;
use std::panic;
use std::sync::Once;

thread_local! {
    static IN_CHECK: Cell<bool> = const { Cell::new(false) };
}

static INSTALL: Once = Once::new();

/// Marks the current thread as running a check until dropped.
pub(crate) struct CheckScope {
    previous: bool,
}

impl CheckScope {
    pub(crate) fn enter() -> Self {
        let previous = IN_CHECK.with(|flag| flag.replace(true));
        Self { previous }
    }
}

impl Drop for CheckScope {
    fn drop(&mut self) {
        IN_CHECK.with(|flag| flag.set(self.previous));
    }
}

/// Whether the current thread is inside a check invocation.
pub fn is_running_check() -> bool {
    IN_CHECK.with(Cell::get)
}

/// Replace the process panic hook with one that stays quiet for panics
/// raised inside a check and delegates everything else to the previous
/// hook. Opt-in; only the first call has an effect.
pub fn install_quiet_panic_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !is_running_check() {
                previous(info);
            }
        }));
    });
}
