//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `rollcall_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use rollcall_core::PresencePolicy;

fn main() {
    // Tiny probe to validate core crate wiring independently from the
    // embedding UI runtime.
    println!("rollcall_core ping={}", rollcall_core::ping());
    println!("rollcall_core version={}", rollcall_core::core_version());

    let policy = PresencePolicy::default();
    println!(
        "rollcall_core policy present_before={} late_before={}",
        policy.present_before, policy.late_before
    );
}
