//! Instantaneous system metrics gateway
//!
//! Synchronous request/response wrapper over the OS metrics provider.
//! Every call takes a fresh snapshot; nothing is cached between requests
//! beyond the interface counters the provider itself needs for rates.

use std::sync::Mutex;
use std::time::Instant;

use sysinfo::{CpuRefreshKind, Networks, RefreshKind, System};
use tracing::debug;

use crate::error::{Error, Result};

const BYTES_PER_MIB: f64 = (1024 * 1024) as f64;

/// Gateway over the OS metrics provider.
///
/// Interface throughput is a rate, so the provider keeps per-interface
/// counters between calls; the mutex serializes refreshes so two requests
/// cannot split one sample window.
pub struct MetricsGateway {
    cpu_count: usize,
    networks: Mutex<NetworkSampler>,
}

struct NetworkSampler {
    networks: Networks,
    last_refresh: Instant,
}

impl MetricsGateway {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::new().with_cpu(CpuRefreshKind::everything()),
        );

        Self {
            cpu_count: sys.cpus().len().max(1),
            networks: Mutex::new(NetworkSampler {
                networks: Networks::new_with_refreshed_list(),
                last_refresh: Instant::now(),
            }),
        }
    }

    /// Current aggregate compute load as a fraction of total capacity:
    /// the one-minute load average normalized by logical core count.
    pub fn current_compute_load(&self) -> Result<f64> {
        let load = System::load_average();
        if load.one < 0.0 {
            // Platforms without load averages report negative values.
            return Err(Error::MetricsUnavailable(
                "load average not reported on this platform".to_string(),
            ));
        }
        Ok(load.one / self.cpu_count as f64)
    }

    /// Combined receive+transmit rate for `interface` in MiB/s, measured
    /// over the window since the previous sample of that interface.
    pub fn current_network_throughput(&self, interface: &str) -> Result<f64> {
        let mut sampler = self.networks.lock().unwrap();

        let window = sampler.last_refresh.elapsed();
        sampler.networks.refresh();
        sampler.last_refresh = Instant::now();

        if !sampler.networks.list().contains_key(interface) {
            // The interface may have appeared since startup; re-detect
            // before declaring it missing.
            sampler.networks.refresh_list();
            debug!("Re-detected network interface list");
        }

        if sampler.networks.list().is_empty() {
            return Err(Error::MetricsUnavailable(
                "no network interfaces reported".to_string(),
            ));
        }

        let data = sampler
            .networks
            .list()
            .get(interface)
            .ok_or_else(|| Error::InterfaceNotFound(interface.to_string()))?;

        // received()/transmitted() are deltas since the previous refresh.
        let bytes = (data.received() + data.transmitted()) as f64;
        let secs = window.as_secs_f64().max(0.001);
        Ok(bytes / secs / BYTES_PER_MIB)
    }
}

impl Default for MetricsGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_interface_is_distinguishable() {
        let gateway = MetricsGateway::new();
        let err = gateway
            .current_network_throughput("definitely-not-a-nic0")
            .unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn compute_load_is_a_non_negative_fraction() {
        let gateway = MetricsGateway::new();
        let load = gateway.current_compute_load().unwrap();
        assert!(load >= 0.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn loopback_throughput_is_non_negative() {
        let gateway = MetricsGateway::new();
        let rate = gateway.current_network_throughput("lo").unwrap();
        assert!(rate >= 0.0);
    }
}
