//! Fixed trampoline routing the C progress callback to a per-call closure.
//!
//! `vault_decrypt_database` accepts a bare function pointer with no context
//! argument, so the per-task closure is parked in a thread-local slot for the
//! duration of the call. Registration is scoped: [`CallbackGuard`] clears the
//! slot on drop, on every exit path, so a registration can never outlive its
//! call or leak into a later task's callback.

use std::cell::Cell;
use std::marker::PhantomData;
use std::os::raw::c_int;

type ProgressClosure = dyn FnMut(u64, u64);

thread_local! {
    static ACTIVE_PROGRESS_CLOSURE: Cell<Option<*mut ProgressClosure>> =
        const { Cell::new(None) };
}

/// Scoped registration of a progress closure for the current thread.
///
/// Construct immediately before the native call and keep alive until it
/// returns; dropping deregisters. Intentionally `!Send`: the slot belongs to
/// the registering thread.
pub(crate) struct CallbackGuard {
    _not_send: PhantomData<*mut ()>,
}

impl CallbackGuard {
    pub(crate) fn register(closure: &mut (dyn FnMut(u64, u64) + '_)) -> Self {
        let ptr: *mut (dyn FnMut(u64, u64) + '_) = closure;
        // SAFETY: the borrow lifetime is erased, but the guard lives on the
        // caller's stack below the closure and clears the slot before the
        // borrow ends. The slot is thread-local, so no other thread can
        // observe the pointer.
        let ptr: *mut ProgressClosure = unsafe { std::mem::transmute(ptr) };
        ACTIVE_PROGRESS_CLOSURE.with(|slot| {
            debug_assert!(slot.get().is_none(), "nested callback registration");
            slot.set(Some(ptr));
        });
        Self {
            _not_send: PhantomData,
        }
    }
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        ACTIVE_PROGRESS_CLOSURE.with(|slot| slot.set(None));
    }
}

/// The function pointer handed to the native decrypt call.
///
/// Invoked synchronously on the calling thread. Invocations with no
/// registered closure (stale or spurious callbacks) are ignored.
pub(crate) extern "C" fn progress_trampoline(current: c_int, total: c_int) {
    ACTIVE_PROGRESS_CLOSURE.with(|slot| {
        if let Some(ptr) = slot.get() {
            // SAFETY: the pointer is valid while registered; see CallbackGuard.
            let closure = unsafe { &mut *ptr };
            closure(current.max(0) as u64, total.max(0) as u64);
        }
    });
}
