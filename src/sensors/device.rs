// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/envsim-rs

//! Simulated BME688 + SPS30 + differential-pressure device

use chrono::{DateTime, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::debug;

use super::payload::{
    ChannelId, EnvironmentalReading, ParticulateReading, Payload, PressureDropReading,
    StatusReport,
};
use super::profile::DeviceProfile;
use super::walk::{clamp, round_to, BoundedRandomWalk};
use crate::streaming::TopicNamespace;

/// Firmware string reported in status payloads
pub const DEFAULT_FIRMWARE: &str = "emu-1.1.0";

/// Reported RSSI range, dBm
const RSSI_RANGE: (i32, i32) = (-70, -45);

/// One simulated device: a walk per quantity plus coupling and event policy.
///
/// All randomness comes from the injected `R`, so a seeded generator replays
/// the exact same payload sequence.
pub struct DeviceSimulator<R: Rng = StdRng> {
    namespace: TopicNamespace,
    firmware: String,
    profile: DeviceProfile,
    rng: R,

    temperature: BoundedRandomWalk,
    humidity: BoundedRandomWalk,
    pressure: BoundedRandomWalk,
    gas_resistance: BoundedRandomWalk,
    iaq: BoundedRandomWalk,
    voc_index: BoundedRandomWalk,
    co2_equivalent: BoundedRandomWalk,

    pm1_0: BoundedRandomWalk,
    pm2_5: BoundedRandomWalk,
    pm4_0: BoundedRandomWalk,
    pm10: BoundedRandomWalk,

    // Configured order is preserved
    pressure_drop: Vec<(ChannelId, BoundedRandomWalk)>,
}

impl DeviceSimulator<StdRng> {
    /// Device with the reference profile and an OS-seeded generator.
    pub fn from_entropy(namespace: TopicNamespace, channels: &[ChannelId]) -> Self {
        Self::new(namespace, channels, DeviceProfile::default(), StdRng::from_entropy())
    }

    pub fn seeded(namespace: TopicNamespace, channels: &[ChannelId], profile: DeviceProfile, seed: u64) -> Self {
        Self::new(namespace, channels, profile, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DeviceSimulator<R> {
    pub fn new(namespace: TopicNamespace, channels: &[ChannelId], profile: DeviceProfile, mut rng: R) -> Self {
        let pressure_drop = channels
            .iter()
            .enumerate()
            .map(|(position, &channel)| (channel, profile.dp_spec(position).build(&mut rng)))
            .collect();

        Self {
            namespace,
            firmware: DEFAULT_FIRMWARE.to_string(),
            temperature: profile.temperature.build(&mut rng),
            humidity: profile.humidity.build(&mut rng),
            pressure: profile.pressure.build(&mut rng),
            gas_resistance: profile.gas_resistance.build(&mut rng),
            iaq: profile.iaq.build(&mut rng),
            voc_index: profile.voc_index.build(&mut rng),
            co2_equivalent: profile.co2_equivalent.build(&mut rng),
            pm1_0: profile.pm1_0.build(&mut rng),
            pm2_5: profile.pm2_5.build(&mut rng),
            pm4_0: profile.pm4_0.build(&mut rng),
            pm10: profile.pm10.build(&mut rng),
            pressure_drop,
            profile,
            rng,
        }
    }

    pub fn with_firmware(mut self, firmware: &str) -> Self {
        self.firmware = firmware.to_string();
        self
    }

    pub fn namespace(&self) -> &TopicNamespace {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        self.namespace.device()
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.pressure_drop.iter().map(|(channel, _)| *channel)
    }

    pub fn profile_mut(&mut self) -> &mut DeviceProfile {
        &mut self.profile
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen::<f64>() < probability
    }

    fn uniform(&mut self, (a, b): (f64, f64)) -> f64 {
        if a == b {
            a
        } else if a < b {
            self.rng.gen_range(a..=b)
        } else {
            self.rng.gen_range(b..=a)
        }
    }

    /// BME688 reading with IAQ spikes, VOC coupling and CO2 excursions.
    pub fn sample_environmental(&mut self, timestamp: DateTime<Utc>) -> EnvironmentalReading {
        let jitter = self.profile.jitter;

        let temperature = round_to(self.temperature.advance(&mut self.rng, jitter), 1);
        let humidity = round_to(self.humidity.advance(&mut self.rng, jitter), 1);
        let pressure = round_to(self.pressure.advance(&mut self.rng, jitter), 0);
        let gas_resistance = round_to(self.gas_resistance.advance(&mut self.rng, jitter), 0);

        let mut iaq = self.iaq.advance(&mut self.rng, jitter);
        if self.chance(self.profile.events.iaq_spike_probability) {
            let (lo, hi) = self.iaq.bounds();
            let spike = self.uniform(self.profile.events.iaq_spike_range);
            iaq = clamp(iaq + spike, lo, hi);
            debug!("{}: IAQ spike +{:.1}", self.name(), spike);
        }

        let voc_base = self.voc_index.advance(&mut self.rng, jitter);
        let noise = self.profile.events.voc_noise.abs();
        let voc_noise = self.uniform((-noise, noise));
        let coupling = self.profile.events.voc_coupling_gain * (iaq - self.profile.events.voc_coupling_baseline);
        let (voc_lo, voc_hi) = self.profile.events.voc_range;
        let voc_index = clamp(voc_base + voc_noise + coupling, voc_lo, voc_hi);

        let mut co2_equivalent = self.co2_equivalent.advance(&mut self.rng, jitter);
        if self.chance(self.profile.events.co2_spike_probability) {
            let (lo, hi) = self.profile.events.co2_range;
            let spike = self.uniform(self.profile.events.co2_spike_range);
            co2_equivalent = clamp(co2_equivalent + spike, lo, hi);
            debug!("{}: CO2 excursion +{:.0} ppm", self.name(), spike);
        }

        EnvironmentalReading {
            temperature,
            humidity,
            pressure,
            gas_resistance,
            iaq: round_to(iaq, 1),
            voc_index: round_to(voc_index, 1),
            co2_equivalent: round_to(co2_equivalent, 0),
            timestamp,
        }
    }

    /// SPS30 reading. A burst moves the PM2.5/PM10 walks themselves before
    /// they advance, so it carries into later ticks.
    pub fn sample_particulate(&mut self, timestamp: DateTime<Utc>) -> ParticulateReading {
        if self.chance(self.profile.events.pm_event_probability) {
            let bump = self.uniform(self.profile.events.pm_event_range);
            self.pm2_5.nudge(bump);
            self.pm10.nudge(bump * self.profile.events.pm10_scale);
            debug!("{}: particulate burst +{:.1} µg/m³", self.name(), bump);
        }

        let jitter = self.profile.jitter;
        ParticulateReading {
            pm1_0: round_to(self.pm1_0.advance(&mut self.rng, jitter), 1),
            pm2_5: round_to(self.pm2_5.advance(&mut self.rng, jitter), 1),
            pm4_0: round_to(self.pm4_0.advance(&mut self.rng, jitter), 1),
            pm10: round_to(self.pm10.advance(&mut self.rng, jitter), 1),
            timestamp,
        }
    }

    /// Reading for one configured channel, `None` if the channel is unknown.
    pub fn sample_differential_pressure(
        &mut self,
        channel: ChannelId,
        timestamp: DateTime<Utc>,
    ) -> Option<PressureDropReading> {
        let jitter = self.profile.jitter;
        let rng = &mut self.rng;
        self.pressure_drop
            .iter_mut()
            .find(|(id, _)| *id == channel)
            .map(|(_, walk)| PressureDropReading {
                dp_pa: round_to(walk.advance(rng, jitter), 1),
                timestamp,
            })
    }

    /// Status payload. RSSI is drawn fresh on every call.
    pub fn status_snapshot(&mut self, online: bool, timestamp: DateTime<Utc>) -> StatusReport {
        StatusReport {
            online,
            firmware_version: self.firmware.clone(),
            signal_strength_dbm: self.rng.gen_range(RSSI_RANGE.0..=RSSI_RANGE.1),
            timestamp,
        }
    }

    /// Every telemetry payload for one tick, sharing `timestamp`.
    pub fn tick(&mut self, timestamp: DateTime<Utc>) -> Vec<Payload> {
        let mut payloads = Vec::with_capacity(2 + self.pressure_drop.len());
        payloads.push(Payload::Environmental(self.sample_environmental(timestamp)));
        payloads.push(Payload::Particulate(self.sample_particulate(timestamp)));

        let channels: Vec<ChannelId> = self.channels().collect();
        for channel in channels {
            if let Some(reading) = self.sample_differential_pressure(channel, timestamp) {
                payloads.push(Payload::PressureDrop { channel, reading });
            }
        }

        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{EventPolicy, WalkSpec};
    use chrono::TimeZone;

    fn ns(device: &str) -> TopicNamespace {
        TopicNamespace::new("s", "r", device)
    }

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, secs).unwrap()
    }

    fn frozen_profile() -> DeviceProfile {
        DeviceProfile {
            iaq: WalkSpec::fixed(35.0, 0.0, 5.0, 250.0),
            voc_index: WalkSpec::fixed(15.0, 0.0, 0.0, 500.0),
            pm2_5: WalkSpec::fixed(6.0, 0.0, 0.0, 200.0),
            pm10: WalkSpec::fixed(10.0, 0.0, 0.0, 300.0),
            jitter: 0.0,
            events: EventPolicy::quiet(),
            ..DeviceProfile::default()
        }
    }

    fn has_one_decimal(v: f64) -> bool {
        ((v * 10.0).round() - v * 10.0).abs() < 1e-6
    }

    #[test]
    fn test_voc_without_coupling_at_baseline() {
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1], frozen_profile(), 3);

        for i in 0..20 {
            let r = sim.sample_environmental(ts(i));
            assert_eq!(r.iaq, 35.0);
            assert_eq!(r.voc_index, 15.0);
        }
    }

    #[test]
    fn test_voc_noise_only_at_baseline() {
        let mut profile = frozen_profile();
        profile.events.voc_noise = 3.0;
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1], profile, 11);

        for i in 0..200 {
            let r = sim.sample_environmental(ts(i % 60));
            assert!((12.0..=18.0).contains(&r.voc_index), "voc {}", r.voc_index);
        }
    }

    #[test]
    fn test_voc_tracks_iaq_deviation() {
        let mut profile = frozen_profile();
        profile.iaq = WalkSpec::fixed(135.0, 0.0, 5.0, 250.0);
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1], profile, 5);

        let r = sim.sample_environmental(ts(0));
        assert_eq!(r.voc_index, 45.0);
    }

    #[test]
    fn test_iaq_spike_is_clamped() {
        let mut profile = frozen_profile();
        profile.iaq = WalkSpec::fixed(240.0, 0.0, 5.0, 250.0);
        profile.events.iaq_spike_probability = 1.0;
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1], profile, 8);

        let r = sim.sample_environmental(ts(0));
        assert_eq!(r.iaq, 250.0);
        // the spike does not move the walk itself
        assert_eq!(sim.iaq.value(), 240.0);
    }

    #[test]
    fn test_co2_excursion_range() {
        let mut profile = frozen_profile();
        profile.co2_equivalent = WalkSpec::fixed(600.0, 0.0, 400.0, 2000.0);
        profile.events.co2_spike_probability = 1.0;
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1], profile, 21);

        for i in 0..50 {
            let r = sim.sample_environmental(ts(i));
            assert!((700.0..=900.0).contains(&r.co2_equivalent), "co2 {}", r.co2_equivalent);
        }
    }

    #[test]
    fn test_particulate_event_persists() {
        let mut profile = frozen_profile();
        profile.events.pm_event_probability = 1.0;
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1], profile, 42);

        let first = sim.sample_particulate(ts(0));
        assert!((16.0..=36.0).contains(&first.pm2_5), "pm2.5 {}", first.pm2_5);

        let bump = sim.pm2_5.value() - 6.0;
        assert!((sim.pm10.value() - (10.0 + bump * 1.2)).abs() < 1e-9);

        sim.profile_mut().events.pm_event_probability = 0.0;
        let second = sim.sample_particulate(ts(1));
        assert_eq!(second.pm2_5, first.pm2_5);
        assert_eq!(second.pm10, first.pm10);
    }

    #[test]
    fn test_particulate_event_clamps_to_walk_bounds() {
        let mut profile = frozen_profile();
        profile.pm2_5 = WalkSpec::fixed(195.0, 0.0, 0.0, 200.0);
        profile.pm10 = WalkSpec::fixed(295.0, 0.0, 0.0, 300.0);
        profile.events.pm_event_probability = 1.0;
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1], profile, 4);

        let r = sim.sample_particulate(ts(0));
        assert_eq!(r.pm2_5, 200.0);
        assert_eq!(r.pm10, 300.0);
    }

    #[test]
    fn test_seeded_replay_is_identical() {
        let mut a = DeviceSimulator::seeded(ns("d1"), &[1, 2], DeviceProfile::default(), 1234);
        let mut b = DeviceSimulator::seeded(ns("d1"), &[1, 2], DeviceProfile::default(), 1234);

        for i in 0..500 {
            let t = ts(i % 60);
            assert_eq!(a.tick(t), b.tick(t));
            assert_eq!(a.status_snapshot(true, t), b.status_snapshot(true, t));
        }
    }

    #[test]
    fn test_outputs_stay_in_domain_under_constant_events() {
        let mut profile = DeviceProfile::default();
        profile.events.iaq_spike_probability = 1.0;
        profile.events.co2_spike_probability = 1.0;
        profile.events.pm_event_probability = 1.0;
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1, 2], profile, 77);

        for i in 0..2_000 {
            let env = sim.sample_environmental(ts(i % 60));
            assert!((10.0..=35.0).contains(&env.temperature));
            assert!((15.0..=90.0).contains(&env.humidity));
            assert!((98_000.0..=104_000.0).contains(&env.pressure));
            assert!((1_000.0..=200_000.0).contains(&env.gas_resistance));
            assert!((5.0..=250.0).contains(&env.iaq));
            assert!((0.0..=500.0).contains(&env.voc_index));
            assert!((400.0..=2000.0).contains(&env.co2_equivalent));
            assert!(has_one_decimal(env.temperature) && has_one_decimal(env.voc_index));
            assert_eq!(env.pressure.fract(), 0.0);
            assert_eq!(env.co2_equivalent.fract(), 0.0);

            let pm = sim.sample_particulate(ts(i % 60));
            assert!((0.0..=100.0).contains(&pm.pm1_0));
            assert!((0.0..=200.0).contains(&pm.pm2_5));
            assert!((0.0..=250.0).contains(&pm.pm4_0));
            assert!((0.0..=300.0).contains(&pm.pm10));
            assert!(has_one_decimal(pm.pm2_5));

            let dp = sim.sample_differential_pressure(2, ts(i % 60)).unwrap();
            assert!((-300.0..=20.0).contains(&dp.dp_pa));
        }
    }

    #[test]
    fn test_dp_channel_seeds_by_position() {
        let mut profile = DeviceProfile::default();
        profile.dp_step = 0.0;
        profile.jitter = 0.0;
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[7, 3], profile, 9);

        let first = sim.sample_differential_pressure(7, ts(0)).unwrap();
        let second = sim.sample_differential_pressure(3, ts(0)).unwrap();
        assert!((-88.0..=-72.0).contains(&first.dp_pa));
        assert!((-103.0..=-87.0).contains(&second.dp_pa));
        assert!(sim.sample_differential_pressure(1, ts(0)).is_none());
    }

    #[test]
    fn test_tick_shares_timestamp() {
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[1, 2], DeviceProfile::default(), 6);
        let payloads = sim.tick(ts(30));

        assert_eq!(payloads.len(), 4);
        assert!(matches!(payloads[0], Payload::Environmental(_)));
        assert!(matches!(payloads[1], Payload::Particulate(_)));
        assert!(matches!(payloads[2], Payload::PressureDrop { channel: 1, .. }));
        assert!(matches!(payloads[3], Payload::PressureDrop { channel: 2, .. }));
        assert!(payloads.iter().all(|p| p.timestamp() == ts(30)));
    }

    #[test]
    fn test_status_snapshot() {
        let mut sim = DeviceSimulator::seeded(ns("d1"), &[], DeviceProfile::default(), 10)
            .with_firmware("emu-2.0.0");

        for i in 0..100 {
            let status = sim.status_snapshot(i % 2 == 0, ts(0));
            assert_eq!(status.online, i % 2 == 0);
            assert_eq!(status.firmware_version, "emu-2.0.0");
            assert!((-70..=-45).contains(&status.signal_strength_dbm));
        }
    }
}
