// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! Device profiles - walk parameters and event policy for one simulated device

use serde::{Deserialize, Serialize};

use super::walk::{WalkSpec, DEFAULT_JITTER};

/// Nominal IAQ level the VOC coupling is measured against
pub const IAQ_BASELINE: f64 = 35.0;

/// Baseline of the first configured differential-pressure channel (HEPA stage)
pub const DP_PRIMARY_BASELINE: f64 = -80.0;

/// Baseline of every further channel (wafer stage)
pub const DP_SECONDARY_BASELINE: f64 = -95.0;

/// Rare excursions and cross-signal coupling applied on top of the walks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPolicy {
    /// Per-tick chance of a pollution spike on IAQ
    pub iaq_spike_probability: f64,
    pub iaq_spike_range: (f64, f64),

    /// VOC follows IAQ: `voc + U(-noise, noise) + gain * (iaq - baseline)`
    pub voc_noise: f64,
    pub voc_coupling_gain: f64,
    pub voc_coupling_baseline: f64,
    pub voc_range: (f64, f64),

    /// Per-tick chance of a CO2-equivalent excursion
    pub co2_spike_probability: f64,
    pub co2_spike_range: (f64, f64),
    pub co2_range: (f64, f64),

    /// Per-tick chance of a particulate burst. The bump is added to the
    /// PM2.5 walk and `pm10_scale` times the bump to the PM10 walk.
    pub pm_event_probability: f64,
    pub pm_event_range: (f64, f64),
    pub pm10_scale: f64,
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self {
            iaq_spike_probability: 0.02,
            iaq_spike_range: (20.0, 80.0),

            voc_noise: 3.0,
            voc_coupling_gain: 0.3,
            voc_coupling_baseline: IAQ_BASELINE,
            voc_range: (0.0, 500.0),

            co2_spike_probability: 0.02,
            co2_spike_range: (100.0, 300.0),
            co2_range: (400.0, 2000.0),

            pm_event_probability: 0.015,
            pm_event_range: (10.0, 30.0),
            pm10_scale: 1.2,
        }
    }
}

impl EventPolicy {
    /// No spikes, no bursts, no VOC noise. Coupling gain is kept.
    pub fn quiet() -> Self {
        Self {
            iaq_spike_probability: 0.0,
            voc_noise: 0.0,
            co2_spike_probability: 0.0,
            pm_event_probability: 0.0,
            ..Self::default()
        }
    }
}

/// Walk parameters for every quantity a device tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub temperature: WalkSpec,
    pub humidity: WalkSpec,
    pub pressure: WalkSpec,
    pub gas_resistance: WalkSpec,
    pub iaq: WalkSpec,
    pub voc_index: WalkSpec,
    pub co2_equivalent: WalkSpec,

    pub pm1_0: WalkSpec,
    pub pm2_5: WalkSpec,
    pub pm4_0: WalkSpec,
    pub pm10: WalkSpec,

    /// Offset drawn around each channel baseline at construction
    pub dp_spread: f64,
    pub dp_step: f64,
    pub dp_bounds: (f64, f64),

    /// Gaussian multiplier passed to every walk advance
    pub jitter: f64,
    pub events: EventPolicy,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            temperature: WalkSpec::new((18.0, 23.0), 0.05, 10.0, 35.0),
            humidity: WalkSpec::new((35.0, 55.0), 0.2, 15.0, 90.0),
            pressure: WalkSpec::fixed(101_325.0, 30.0, 98_000.0, 104_000.0),
            gas_resistance: WalkSpec::fixed(50_000.0, 500.0, 1_000.0, 200_000.0),
            // BSEC reports 0..500, capped lower here
            iaq: WalkSpec::fixed(IAQ_BASELINE, 2.5, 5.0, 250.0),
            voc_index: WalkSpec::fixed(15.0, 2.0, 0.0, 500.0),
            co2_equivalent: WalkSpec::fixed(600.0, 15.0, 400.0, 2000.0),

            pm1_0: WalkSpec::fixed(3.0, 0.5, 0.0, 100.0),
            pm2_5: WalkSpec::fixed(6.0, 0.8, 0.0, 200.0),
            pm4_0: WalkSpec::fixed(8.0, 1.0, 0.0, 250.0),
            pm10: WalkSpec::fixed(10.0, 1.2, 0.0, 300.0),

            dp_spread: 8.0,
            dp_step: 3.0,
            dp_bounds: (-300.0, 20.0),

            jitter: DEFAULT_JITTER,
            events: EventPolicy::default(),
        }
    }
}

impl DeviceProfile {
    /// Walk spec for the channel at `position` in the configured list.
    pub fn dp_spec(&self, position: usize) -> WalkSpec {
        let base = if position == 0 {
            DP_PRIMARY_BASELINE
        } else {
            DP_SECONDARY_BASELINE
        };
        WalkSpec::new(
            (base - self.dp_spread, base + self.dp_spread),
            self.dp_step,
            self.dp_bounds.0,
            self.dp_bounds.1,
        )
    }
}
