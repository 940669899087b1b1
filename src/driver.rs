use std::time::Instant;

/// Device-side timing interface.
///
/// The adaptive policies measure a launch by recording one event before and
/// one after it, synchronizing, and reading the elapsed time between the
/// pair, which is how CUDA- and HIP-style drivers expose kernel timing.
pub trait Device {
    type Event: DeviceEvent;

    /// Creates an unrecorded timing event.
    fn event(&self) -> Self::Event;

    /// Blocks until the device has completed all submitted work.
    fn synchronize(&self);
}

/// One recordable timestamp on the device timeline.
pub trait DeviceEvent {
    /// Captures the current device timestamp.
    fn record(&mut self);

    /// Milliseconds elapsed from `start` to `self`. Zero if either event
    /// was never recorded.
    fn elapsed_ms(&self, start: &Self) -> f64;
}

/// Host-clock device for CPU kernels and tests.
///
/// `synchronize` is a no-op; the host clock needs no draining.
pub struct HostDevice;

impl Device for HostDevice {
    type Event = HostEvent;

    fn event(&self) -> HostEvent {
        HostEvent { at: None }
    }

    fn synchronize(&self) {}
}

pub struct HostEvent {
    at: Option<Instant>,
}

impl DeviceEvent for HostEvent {
    fn record(&mut self) {
        self.at = Some(Instant::now());
    }

    fn elapsed_ms(&self, start: &Self) -> f64 {
        match (start.at, self.at) {
            (Some(start), Some(end)) => end.duration_since(start).as_secs_f64() * 1e3,
            _ => 0.0,
        }
    }
}
