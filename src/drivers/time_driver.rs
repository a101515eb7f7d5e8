//! Time driver backing `async-io-mini` timers.
//!
//! The cycle tasks' phase waits use `async_io_mini::Timer`, which resolves
//! `_embassy_time_now` / `_embassy_time_schedule_wake` at link time.
//!
//! - **`target_os = "espidf"`**: provided here on top of `esp_timer`.
//! - **all other targets**: provided by `embassy-time`'s `std` driver,
//!   linked in from `lib.rs`.

#[cfg(target_os = "espidf")]
use core::time::Duration;

/// Microseconds since boot.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_now() -> u64 {
    unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
}

/// Wake `waker` once `at` (microseconds since boot) has passed.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_schedule_wake(at: u64, waker: *mut core::ffi::c_void) {
    if waker.is_null() {
        return;
    }

    // SAFETY: the caller passes a valid `Waker` for the duration of this
    // call; it is cloned before returning.
    let waker = unsafe { (&*(waker as *const core::task::Waker)).clone() };
    std::thread::spawn(move || {
        let now = _embassy_time_now();
        if at > now {
            std::thread::sleep(Duration::from_micros(at - now));
        }
        waker.wake();
    });
}
