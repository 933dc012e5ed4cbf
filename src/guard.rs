//! Panic containment for test code.
//!
//! Bodies, hooks, actions, providers and instance factories run through [`guarded`], which turns a panic
//! into an [`Exception`] so `assert!`-style test code classifies like any returned failure.
//!
//! The default panic hook still prints every contained panic. Test binaries call
//! [`silence_contained_panics`] once so the console report is not interleaved with panic messages;
//! panics outside [`guarded`] keep the previous hook.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use verity_core::Exception;

thread_local! {
    static CONTAINED: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Run `f`, translating a panic into an exception.
pub(crate) fn guarded<T, F>(f: F) -> Result<T, Exception>
where
    F: FnOnce() -> Result<T, Exception>,
{
    let outer = CONTAINED.with(|contained| contained.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CONTAINED.with(|contained| contained.set(outer));

    match result {
        Ok(result) => result,
        Err(payload) => Err(Exception::from_panic(payload.as_ref())),
    }
}

/// Install a panic hook that stays quiet for panics raised inside [`guarded`].
///
/// Idempotent. Other panics are forwarded to the hook that was installed before.
pub(crate) fn silence_contained_panics() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !is_contained() {
                previous(info);
            }
        }));
    });
}

fn is_contained() -> bool {
    CONTAINED.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verity_core::exception::RUST_PANIC;

    #[test]
    fn test_passes_results_through() {
        assert_eq!(guarded(|| Ok::<_, Exception>(3)).unwrap(), 3);
        assert_eq!(
            guarded(|| Err::<(), _>(Exception::error("nope"))).unwrap_err().message(),
            "nope"
        );
    }

    #[test]
    fn test_translates_panics() {
        let e = guarded::<(), _>(|| panic!("exploded")).unwrap_err();
        assert!(e.is_instance_of(&RUST_PANIC));
        assert_eq!(e.message(), "exploded");
    }

    #[test]
    fn test_translates_assertion_panics() {
        let e = guarded::<(), _>(|| {
            assert_eq!(1, 2);
            Ok(())
        })
        .unwrap_err();
        assert!(e.is_assertion());
    }

    #[test]
    fn test_containment_flag_is_scoped() {
        assert!(!is_contained());
        let inner = guarded(|| {
            let nested = guarded(|| Ok(is_contained()));
            Ok((is_contained(), nested))
        })
        .unwrap();
        assert!(inner.0);
        assert!(matches!(inner.1, Ok(true)));
        assert!(!is_contained());

        let _ = guarded::<(), _>(|| panic!("reset after unwinding"));
        assert!(!is_contained());
    }

    #[test]
    fn test_silenced_panics_still_translate() {
        silence_contained_panics();
        silence_contained_panics();
        let e = guarded::<(), _>(|| panic!("quiet")).unwrap_err();
        assert_eq!(e.message(), "quiet");
    }
}
