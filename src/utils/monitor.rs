use std::sync::Mutex;
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Resource snapshot taken at the end of a run phase.
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub phase_time: Duration,
    pub elapsed_time: Duration,
    pub memory_usage_mb: Option<u64>,
    pub peak_memory_mb: Option<u64>,
}

struct Clock {
    start: Instant,
    last_phase: Instant,
}

/// Tracks wall time per run phase (fetch, reconcile, export) and, with the
/// `cli` feature, resident memory of the current process.
pub struct RunMonitor {
    enabled: bool,
    clock: Mutex<Clock>,
    #[cfg(feature = "cli")]
    system: Mutex<System>,
    #[cfg(feature = "cli")]
    pid: Option<Pid>,
    #[cfg(feature = "cli")]
    peak_memory: Mutex<u64>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            clock: Mutex::new(Clock {
                start: now,
                last_phase: now,
            }),
            #[cfg(feature = "cli")]
            system: Mutex::new(System::new()),
            #[cfg(feature = "cli")]
            pid: sysinfo::get_current_pid().ok(),
            #[cfg(feature = "cli")]
            peak_memory: Mutex::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn memory_mb(&self) -> (Option<u64>, Option<u64>) {
        let Some(pid) = self.pid else {
            return (None, None);
        };
        let Ok(mut system) = self.system.lock() else {
            return (None, None);
        };
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let Some(current) = system.process(pid).map(|p| p.memory() / 1024 / 1024) else {
            return (None, None);
        };

        let peak = match self.peak_memory.lock() {
            Ok(mut peak) => {
                if current > *peak {
                    *peak = current;
                }
                Some(*peak)
            }
            Err(_) => None,
        };
        (Some(current), peak)
    }

    #[cfg(not(feature = "cli"))]
    fn memory_mb(&self) -> (Option<u64>, Option<u64>) {
        (None, None)
    }

    /// Closes the current phase and returns its stats; `None` when disabled.
    pub fn finish_phase(&self, phase: &str) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let (phase_time, elapsed_time) = {
            let mut clock = self.clock.lock().ok()?;
            let phase_time = now.duration_since(clock.last_phase);
            clock.last_phase = now;
            (phase_time, now.duration_since(clock.start))
        };
        let (memory_usage_mb, peak_memory_mb) = self.memory_mb();

        Some(PhaseStats {
            phase: phase.to_string(),
            phase_time,
            elapsed_time,
            memory_usage_mb,
            peak_memory_mb,
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.finish_phase(phase) {
            match stats.memory_usage_mb {
                Some(memory) => tracing::info!(
                    "📊 {} took {:?} (total {:?}), Memory: {}MB, Peak: {}MB",
                    stats.phase,
                    stats.phase_time,
                    stats.elapsed_time,
                    memory,
                    stats.peak_memory_mb.unwrap_or(memory)
                ),
                None => tracing::info!(
                    "📊 {} took {:?} (total {:?})",
                    stats.phase,
                    stats.phase_time,
                    stats.elapsed_time
                ),
            }
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let elapsed = self
            .clock
            .lock()
            .map(|clock| clock.start.elapsed())
            .unwrap_or_default();
        let (_, peak) = self.memory_mb();
        match peak {
            Some(peak) => tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                elapsed,
                peak
            ),
            None => tracing::info!("📊 Final Stats - Total Time: {:?}", elapsed),
        }
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
