use std::collections::BTreeMap;

use crate::command::Device;

/// What a call to [`TimerRegistry::toggle`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerChange {
    Started,
    Stopped,
    Unchanged,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct OperationTimer {
    active: bool,
    elapsed_secs: u64,
}

/// Per-device operation time counters.
///
/// A counter only advances while its device is active. Stopping a counter
/// keeps the accumulated time, so a machine that pauses and resumes continues
/// where it left off.
#[derive(Clone, Debug, Default)]
pub struct TimerRegistry {
    timers: BTreeMap<Device, OperationTimer>,
}

impl TimerRegistry {
    pub fn toggle(&mut self, device: Device, active: bool) -> TimerChange {
        let timer = self.timers.entry(device).or_default();
        match (timer.active, active) {
            (false, true) => {
                timer.active = true;
                TimerChange::Started
            }
            (true, false) => {
                timer.active = false;
                TimerChange::Stopped
            }
            _ => TimerChange::Unchanged,
        }
    }

    /// Advances every active counter by one second and returns the devices
    /// that moved, with their new totals.
    pub fn tick(&mut self) -> Vec<(Device, u64)> {
        self.timers
            .iter_mut()
            .filter(|(_, timer)| timer.active)
            .map(|(device, timer)| {
                timer.elapsed_secs += 1;
                (*device, timer.elapsed_secs)
            })
            .collect()
    }

    pub fn is_active(&self, device: Device) -> bool {
        self.timers.get(&device).is_some_and(|timer| timer.active)
    }

    pub fn elapsed_secs(&self, device: Device) -> u64 {
        self.timers
            .get(&device)
            .map_or(0, |timer| timer.elapsed_secs)
    }
}

/// Formats seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_runs_only_while_active() {
        let mut timers = TimerRegistry::default();
        assert_eq!(timers.toggle(Device::Mixer, true), TimerChange::Started);

        for _ in 0..3 {
            timers.tick();
        }
        assert_eq!(timers.elapsed_secs(Device::Mixer), 3);

        assert_eq!(timers.toggle(Device::Mixer, false), TimerChange::Stopped);
        assert!(timers.tick().is_empty());
        assert_eq!(timers.elapsed_secs(Device::Mixer), 3);

        assert_eq!(timers.toggle(Device::Mixer, true), TimerChange::Started);
        assert_eq!(timers.tick(), vec![(Device::Mixer, 4)]);
    }

    #[test]
    fn test_toggle_is_idempotent() {
        let mut timers = TimerRegistry::default();
        assert_eq!(timers.toggle(Device::Robot, false), TimerChange::Unchanged);
        assert_eq!(timers.toggle(Device::Robot, true), TimerChange::Started);
        assert_eq!(timers.toggle(Device::Robot, true), TimerChange::Unchanged);

        // a repeated start must not double the tick rate
        assert_eq!(timers.tick(), vec![(Device::Robot, 1)]);
        assert!(timers.is_active(Device::Robot));
        assert!(!timers.is_active(Device::Packer));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(59), "00:00:59");
        assert_eq!(format_elapsed(3661), "01:01:01");
        assert_eq!(format_elapsed(100 * 3600), "100:00:00");
    }
}
