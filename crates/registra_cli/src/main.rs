//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `registra_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("registra_core ping={}", registra_core::ping());
    println!("registra_core version={}", registra_core::core_version());
}
