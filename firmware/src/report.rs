//! Log output for dispatcher passes.
//!
//! Quiet passes produce nothing. On the target the lines go out over
//! defmt/RTT; host builds print them so the drivers can be exercised
//! without a probe.

use supply_core::dispatcher::PassSummary;
use supply_core::errors::Severity;
use supply_core::hal::SupplyId;

pub fn log_pass(summary: &PassSummary) {
    if summary.is_quiet() {
        return;
    }
    for supply in summary.tripped_supplies() {
        emit_trip(supply);
    }
    if summary.dropped_edge {
        emit_dropped_edge();
    }
    for (code, severity) in &summary.reported {
        emit_fault(code.to_raw(), *severity);
    }
    if summary.limits_committed {
        emit_commit();
    }
}

#[cfg(target_os = "none")]
fn emit_trip(supply: SupplyId) {
    defmt::warn!("overcurrent: supply {=char} latched off", supply.label());
}

#[cfg(not(target_os = "none"))]
fn emit_trip(supply: SupplyId) {
    println!("overcurrent: supply {} latched off", supply.label());
}

#[cfg(target_os = "none")]
fn emit_dropped_edge() {
    defmt::warn!("buttons: edge queue full, edge dropped");
}

#[cfg(not(target_os = "none"))]
fn emit_dropped_edge() {
    println!("buttons: edge queue full, edge dropped");
}

#[cfg(target_os = "none")]
fn emit_fault(code: u32, severity: Severity) {
    match severity {
        Severity::Note => defmt::info!("fault: note {=u32:#x}", code),
        Severity::Warning | Severity::Fatal => defmt::warn!("fault: warning {=u32:#x}", code),
    }
}

#[cfg(not(target_os = "none"))]
fn emit_fault(code: u32, severity: Severity) {
    println!("fault: {} {:#x}", severity.label().trim_end_matches(':'), code);
}

#[cfg(target_os = "none")]
fn emit_commit() {
    defmt::info!("limits: committed");
}

#[cfg(not(target_os = "none"))]
fn emit_commit() {
    println!("limits: committed");
}
