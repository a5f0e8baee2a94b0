//! Fusion of zero or more camera target streams into one filtered estimate.
//!
//! Each camera keeps its own median filters and staleness counter. A camera
//! "has a target" while fewer than `filter_window` consecutive updates went
//! by without a qualifying candidate; the fused outputs average every camera
//! that currently has one.

use robo_traits::{CameraFrame, TargetCandidate, TargetSource};

use crate::config::VisionCfg;
use crate::filter::MedianFilter;
use crate::status::SensorFault;

/// Robot-relative offset to the target in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Read-only copy of the tracker's outputs for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetView {
    pub offset: Option<Offset>,
    /// Degrees; positive means turn clockwise.
    pub heading_deg: Option<f64>,
    pub latency_s: Option<f64>,
    pub tag_id: Option<i32>,
}

impl TargetView {
    pub fn has_target(&self) -> bool {
        self.offset.is_some()
    }
}

#[derive(Debug, Clone)]
struct SensorTrack {
    x: MedianFilter,
    y: MedianFilter,
    z: MedianFilter,
    filtered: Offset,
    tag_id: i32,
    ambiguity: f64,
    latency_s: f64,
    staleness: usize,
}

impl SensorTrack {
    fn new(window: usize) -> Self {
        Self {
            x: MedianFilter::new(window),
            y: MedianFilter::new(window),
            z: MedianFilter::new(window),
            filtered: Offset::default(),
            tag_id: -1,
            ambiguity: f64::INFINITY,
            latency_s: 0.0,
            // no target until the first detection
            staleness: window,
        }
    }

    fn observe(&mut self, frame: &CameraFrame, sought_ids: &[i32]) {
        let best = frame
            .candidates
            .iter()
            .filter(|c| qualifies(c, sought_ids))
            .min_by(|a, b| a.ambiguity.total_cmp(&b.ambiguity));
        match best {
            Some(c) => {
                self.filtered = Offset {
                    x: self.x.calculate(c.x),
                    y: self.y.calculate(c.y),
                    z: self.z.calculate(c.z),
                };
                self.tag_id = c.tag_id;
                self.ambiguity = c.ambiguity;
                self.latency_s = frame.latency_s;
                self.staleness = 0;
            }
            None => self.staleness = self.staleness.saturating_add(1),
        }
    }

    fn has_target(&self, window: usize) -> bool {
        self.staleness < window
    }
}

fn qualifies(c: &TargetCandidate, sought_ids: &[i32]) -> bool {
    c.x.is_finite()
        && c.y.is_finite()
        && c.z.is_finite()
        && (sought_ids.is_empty() || sought_ids.contains(&c.tag_id))
}

pub struct VisionTracker<C: TargetSource> {
    cfg: VisionCfg,
    sensors: Vec<C>,
    tracks: Vec<SensorTrack>,
    view: TargetView,
}

impl<C: TargetSource> core::fmt::Debug for VisionTracker<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisionTracker")
            .field("sensors", &self.sensors.len())
            .field("view", &self.view)
            .finish()
    }
}

impl<C: TargetSource> VisionTracker<C> {
    pub fn new(cfg: VisionCfg, sensors: Vec<C>) -> Self {
        let window = cfg.filter_window.max(1);
        let tracks = sensors.iter().map(|_| SensorTrack::new(window)).collect();
        Self {
            cfg: VisionCfg {
                filter_window: window,
                ..cfg
            },
            sensors,
            tracks,
            view: TargetView::default(),
        }
    }

    pub fn add_sensor(&mut self, sensor: C) {
        self.sensors.push(sensor);
        self.tracks.push(SensorTrack::new(self.cfg.filter_window));
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn config(&self) -> &VisionCfg {
        &self.cfg
    }

    /// Pull the newest frame from every camera and refresh the fused view.
    ///
    /// A camera that fails to deliver counts as having seen nothing.
    pub fn update(&mut self) -> TargetView {
        for (idx, (sensor, track)) in self.sensors.iter_mut().zip(&mut self.tracks).enumerate() {
            let frame = match sensor.latest() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(camera = idx, error = %e, "camera read failed");
                    CameraFrame::default()
                }
            };
            let had = track.has_target(self.cfg.filter_window);
            track.observe(&frame, &self.cfg.sought_ids);
            if had && !track.has_target(self.cfg.filter_window) {
                tracing::debug!(camera = idx, "camera lost target");
            }
        }
        self.view = self.fuse();
        self.view
    }

    fn fuse(&self) -> TargetView {
        let window = self.cfg.filter_window;
        let live: Vec<&SensorTrack> = self.tracks.iter().filter(|t| t.has_target(window)).collect();
        if live.is_empty() {
            return TargetView::default();
        }
        let n = live.len() as f64;
        let offset = Offset {
            x: live.iter().map(|t| t.filtered.x).sum::<f64>() / n,
            y: live.iter().map(|t| t.filtered.y).sum::<f64>() / n,
            z: live.iter().map(|t| t.filtered.z).sum::<f64>() / n,
        };
        let latency = live.iter().map(|t| t.latency_s).sum::<f64>() / n;
        let tag_id = live
            .iter()
            .min_by(|a, b| a.ambiguity.total_cmp(&b.ambiguity))
            .map(|t| t.tag_id);
        let heading = self.cfg.heading_sign
            * (offset.y + self.cfg.mount_y)
                .atan2(offset.x + self.cfg.mount_x)
                .to_degrees();
        TargetView {
            offset: Some(offset),
            heading_deg: Some(heading),
            latency_s: Some(latency),
            tag_id,
        }
    }

    pub fn view(&self) -> TargetView {
        self.view
    }

    pub fn has_target(&self) -> bool {
        self.view.has_target()
    }

    pub fn offset(&self) -> Option<Offset> {
        self.view.offset
    }

    /// Degrees the robot must turn to face the target; positive is clockwise.
    pub fn heading_to_target(&self) -> Option<f64> {
        self.view.heading_deg
    }

    pub fn tag_id(&self) -> Option<i32> {
        self.view.tag_id
    }

    pub fn latency(&self) -> Option<f64> {
        self.view.latency_s
    }

    /// Consecutive updates camera `idx` went without a qualifying candidate.
    pub fn staleness(&self, idx: usize) -> Option<usize> {
        self.tracks.get(idx).map(|t| t.staleness)
    }

    /// `VisionStale` when cameras are attached but none has a target.
    pub fn fault(&self) -> Option<SensorFault> {
        (!self.sensors.is_empty() && !self.has_target()).then_some(SensorFault::VisionStale)
    }
}
