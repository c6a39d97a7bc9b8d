use std::time::{Duration, Instant};

use super::rendering::LightingStats;

/// Loop and lighting figures for one metrics interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_time_ms: f32,
    /// Mean over presented frames whose light mask was rebuilt since the previous present.
    pub avg_lights_drawn: f32,
    pub peak_lights_drawn: usize,
    pub masks_composited: u64,
    pub lights_pruned: u64,
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
    worst_frame_time: Duration,
    lit_frames: u32,
    lights_drawn_sum: u64,
    peak_lights_drawn: usize,
    masks_composited: u64,
    lights_pruned: u64,
    last_lighting: LightingStats,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
            worst_frame_time: Duration::ZERO,
            lit_frames: 0,
            lights_drawn_sum: 0,
            peak_lights_drawn: 0,
            masks_composited: 0,
            lights_pruned: 0,
            last_lighting: LightingStats::default(),
        }
    }

    /// Records one presented frame. `lighting` is the compositor's running stats,
    /// or `None` when the active scene has no lighting.
    pub(crate) fn record_frame(&mut self, frame_dt: Duration, lighting: Option<LightingStats>) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
        self.worst_frame_time = self.worst_frame_time.max(frame_dt);

        let Some(stats) = lighting else {
            return;
        };
        // Totals going backwards means the scene rebuilt its compositor.
        let previous = if stats.frames_composited < self.last_lighting.frames_composited {
            LightingStats::default()
        } else {
            self.last_lighting
        };
        let composited = stats.frames_composited - previous.frames_composited;
        self.masks_composited = self.masks_composited.saturating_add(composited);
        self.lights_pruned = self
            .lights_pruned
            .saturating_add(stats.lights_pruned_total.saturating_sub(previous.lights_pruned_total));
        if composited > 0 {
            self.lit_frames = self.lit_frames.saturating_add(1);
            self.lights_drawn_sum = self
                .lights_drawn_sum
                .saturating_add(stats.lights_drawn_last_frame as u64);
            self.peak_lights_drawn = self.peak_lights_drawn.max(stats.lights_drawn_last_frame);
        }
        self.last_lighting = stats;
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };
        let avg_lights_drawn = if self.lit_frames == 0 {
            0.0
        } else {
            self.lights_drawn_sum as f32 / self.lit_frames as f32
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
            worst_frame_time_ms: self.worst_frame_time.as_secs_f32() * 1000.0,
            avg_lights_drawn,
            peak_lights_drawn: self.peak_lights_drawn,
            masks_composited: self.masks_composited,
            lights_pruned: self.lights_pruned,
        };

        self.interval_start = now;
        self.frames = 0;
        self.ticks = 0;
        self.frame_time_sum = Duration::ZERO;
        self.worst_frame_time = Duration::ZERO;
        self.lit_frames = 0;
        self.lights_drawn_sum = 0;
        self.peak_lights_drawn = 0;
        self.masks_composited = 0;
        self.lights_pruned = 0;

        Some(snapshot)
    }
}
