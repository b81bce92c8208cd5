//! Build script for memwatch.
//!
//! Checks that the enabled features make sense for the target and prints
//! hints for integrating the watcher into firmware.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LINKER_SYMBOLS");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DIAGNOSTICS");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");

    let linker_symbols = env::var("CARGO_FEATURE_LINKER_SYMBOLS").is_ok();
    let diagnostics_enabled = env::var("CARGO_FEATURE_DIAGNOSTICS").is_ok();
    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();
    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";
    let target = env::var("TARGET").unwrap_or_default();
    let embedded = is_embedded_target(&target);

    // =========================================================================
    // Feature-specific diagnostics
    // =========================================================================

    if linker_symbols {
        emit_info("Raw memory access through linker symbols enabled");
        if !embedded {
            emit_warning(&format!("'linker-symbols' on a hosted target ({})", target));
            emit_note("__brkval and __bss_end are provided by the AVR C runtime.");
            emit_note("On a hosted target the link will fail or the boundaries will be wrong.");
            emit_note("Use SyntheticMemory for host-side simulation instead.");
        }
    }

    if diagnostics_enabled && is_release {
        emit_info("Diagnostics printed to stderr in release builds");
    }

    if parking_lot_enabled {
        emit_info("Using parking_lot for the region lock");
        if embedded {
            emit_warning("parking_lot needs an OS; disable it for bare-metal targets");
        }
    }

    if !log_enabled && !diagnostics_enabled && is_release {
        emit_note("Tip: with neither 'log' nor 'diagnostics' enabled, corruption is only");
        emit_note("visible through CorruptionReport and the operator command output.");
    }
}

fn is_embedded_target(target: &str) -> bool {
    target.starts_with("avr") || target.starts_with("thumb") || target.contains("-none")
}

// =============================================================================
// Diagnostic emission helpers
// =============================================================================

fn emit_info(msg: &str) {
    println!("cargo:warning=[memwatch] {}", msg);
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[memwatch]    {}", msg);
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[memwatch] warning: {}", msg);
}
