//! Push-style wrapper around [`AnomalyDetector`].
//!
//! A [`Monitor`] takes readings one at a time, runs detection as soon as the
//! buffer is full and notifies subscribed observers. Observers are called
//! synchronously, in subscription order, before `process` returns.

use super::detector::{AnomalyDetector, DetectionResult};
use crate::error::Result;
use std::collections::HashMap;
use std::fmt;

/// Notification delivered to observers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MonitorEvent<'a> {
    /// A reading was accepted into the buffer. `ready` is true when the
    /// buffer is full and a detection follows.
    Data {
        features: &'a HashMap<String, f64>,
        ready: bool,
    },
    /// Detection flagged the current window
    Anomaly(&'a DetectionResult),
    /// Detection ran and found nothing unusual
    Normal(&'a DetectionResult),
}

impl MonitorEvent<'_> {
    /// The detection carried by `Anomaly` and `Normal` events.
    pub fn result(&self) -> Option<&DetectionResult> {
        match self {
            MonitorEvent::Data { .. } => None,
            MonitorEvent::Anomaly(r) | MonitorEvent::Normal(r) => Some(r),
        }
    }
}

/// Receiver of [`MonitorEvent`]s.
pub trait MonitorObserver {
    fn notify(&mut self, event: &MonitorEvent<'_>);
}

impl<F> MonitorObserver for F
where
    F: FnMut(&MonitorEvent<'_>),
{
    fn notify(&mut self, event: &MonitorEvent<'_>) {
        self(event)
    }
}

/// Detector plus a list of observers.
pub struct Monitor {
    detector: AnomalyDetector,
    observers: Vec<Box<dyn MonitorObserver>>,
}

impl Monitor {
    pub fn new(detector: AnomalyDetector) -> Self {
        Self {
            detector,
            observers: Vec::new(),
        }
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: MonitorObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Register a closure observer.
    pub fn on_event<F>(&mut self, f: F)
    where
        F: FnMut(&MonitorEvent<'_>) + 'static,
    {
        self.subscribe(f);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut AnomalyDetector {
        &mut self.detector
    }

    pub fn into_detector(self) -> AnomalyDetector {
        self.detector
    }

    /// Feed one reading.
    ///
    /// Emits `Data` for every accepted reading, then `Anomaly` or `Normal`
    /// once the buffer is full. Errors from binarization or detection are
    /// returned to the caller and stop further notifications for this call.
    pub fn process(&mut self, features: &HashMap<String, f64>) -> Result<Option<DetectionResult>> {
        let ready = self.detector.add_data_point(features)?;
        self.emit(&MonitorEvent::Data { features, ready });
        if !ready {
            return Ok(None);
        }

        let result = self.detector.detect()?;
        if let Some(r) = &result {
            let event = if r.is_anomaly {
                MonitorEvent::Anomaly(r)
            } else {
                MonitorEvent::Normal(r)
            };
            self.emit(&event);
        }
        Ok(result)
    }

    fn emit(&mut self, event: &MonitorEvent<'_>) {
        for observer in &mut self.observers {
            observer.notify(event);
        }
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("detector", &self.detector)
            .field("observers", &self.observers.len())
            .finish()
    }
}
