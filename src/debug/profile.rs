//! CPU profiling and symbol resolution

use std::ffi::c_void;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AdminError, Result};

/// Sampling frequency of the CPU profiler, in Hz.
pub const SAMPLING_FREQUENCY: i32 = 100;

/// Allows one CPU profile at a time per server.
#[derive(Clone, Default)]
pub struct CpuProfiler {
    busy: Arc<AtomicBool>,
}

impl CpuProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples the whole process for `window` and returns a pprof protobuf.
    pub async fn capture(&self, window: Duration) -> Result<Vec<u8>> {
        let guard = BusyGuard::acquire(&self.busy)?;

        // The guard travels with the sampling thread, so a dropped request
        // keeps the profiler busy only until sampling actually ends.
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            sample(window)
        })
        .await
        .map_err(|e| AdminError::Internal(format!("profiler task failed: {e}")))
        .and_then(|profile| profile)
    }
}

/// Holds the profiler's busy flag; clears it on drop.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(busy: &Arc<AtomicBool>) -> Result<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AdminError::Busy("cpu profiling already in use".to_string()))?;
        Ok(Self(busy.clone()))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(unix)]
fn sample(window: Duration) -> Result<Vec<u8>> {
    use pprof::protos::Message;

    let profiling_err = |e: pprof::Error| AdminError::Internal(format!("could not profile: {e}"));

    let guard = pprof::ProfilerGuardBuilder::default()
        .frequency(SAMPLING_FREQUENCY)
        .blocklist(&["libc", "libgcc", "pthread", "vdso"])
        .build()
        .map_err(profiling_err)?;
    std::thread::sleep(window);

    let report = guard.report().build().map_err(profiling_err)?;
    let profile = report.pprof().map_err(profiling_err)?;
    Ok(profile.encode_to_vec())
}

#[cfg(not(unix))]
fn sample(_window: Duration) -> Result<Vec<u8>> {
    Err(AdminError::Unsupported(
        "cpu profiling is only available on unix".to_string(),
    ))
}

/// Resolves `0x..` addresses separated by `+` into `0x<addr> <symbol>` lines.
///
/// Addresses that do not parse or resolve are skipped. The output always
/// starts with `num_symbols: 1`.
pub fn resolve_symbols(input: &str) -> String {
    let mut out = String::from("num_symbols: 1\n");

    for word in input.split('+').map(str::trim).filter(|w| !w.is_empty()) {
        let Some(addr) = parse_address(word) else {
            continue;
        };

        // resolve() treats its argument as a return address and looks up
        // the byte before it; the callers here send exact program counters.
        let mut name = None;
        backtrace::resolve(addr.wrapping_add(1) as *mut c_void, |symbol| {
            if name.is_none() {
                name = symbol.name().map(|n| n.to_string());
            }
        });

        if let Some(name) = name {
            let _ = writeln!(out, "{addr:#x} {name}");
        }
    }
    out
}

fn parse_address(word: &str) -> Option<usize> {
    match word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => word.parse().ok(),
    }
}
