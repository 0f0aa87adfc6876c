//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `doctrace_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("doctrace_core version={}", doctrace_core::core_version());
    println!(
        "doctrace_core default_log_level={}",
        doctrace_core::default_log_level()
    );
}
