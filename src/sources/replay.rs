//! Scripted datagram replay for simulation and tests

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};
use tracing::{debug, trace};

use crate::Result;
use crate::protocol::PacketBuilder;
use crate::source::{Datagram, DatagramSource};
use crate::types::RACE_SESSION_CODE;

/// Replays a fixed sequence of datagrams.
///
/// Each frame carries an offset from the replay start; receipt timestamps are
/// `start + offset`, so pause detection sees the scripted wall clock whether
/// or not playback is paced.
#[derive(Debug)]
pub struct ReplaySource {
    frames: VecDeque<(Duration, Vec<u8>)>,
    start: SystemTime,
    /// Playback speed multiplier, `None` to deliver as fast as possible
    speed: Option<f64>,
    last_offset: Duration,
    packet_rate: f64,
    delivered: usize,
}

impl ReplaySource {
    /// Frames at fixed offsets from the replay start.
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = (Duration, Vec<u8>)>,
    {
        let frames: VecDeque<_> = frames.into_iter().collect();
        let packet_rate = estimate_rate(&frames);
        Self {
            frames,
            start: SystemTime::now(),
            speed: None,
            last_offset: Duration::ZERO,
            packet_rate,
            delivered: 0,
        }
    }

    /// Frames spaced evenly at `rate_hz`.
    pub fn at_rate<I>(datagrams: I, rate_hz: f64) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let step = Duration::from_secs_f64(1.0 / rate_hz.max(f64::MIN_POSITIVE));
        Self::new(datagrams.into_iter().enumerate().map(|(i, bytes)| (step * i as u32, bytes)))
    }

    /// Anchor receipt timestamps at `start`.
    pub fn starting_at(mut self, start: SystemTime) -> Self {
        self.start = start;
        self
    }

    /// Sleep between frames to reproduce the scripted timing, scaled by `speed`.
    pub fn paced(mut self, speed: f64) -> Self {
        self.speed = Some(speed.clamp(0.1, 100.0));
        debug!("Replay pacing at {}x", speed);
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

fn estimate_rate(frames: &VecDeque<(Duration, Vec<u8>)>) -> f64 {
    match frames.back() {
        Some((last, _)) if frames.len() > 1 && !last.is_zero() => {
            (frames.len() - 1) as f64 / last.as_secs_f64()
        }
        _ => 60.0,
    }
}

#[async_trait::async_trait]
impl DatagramSource for ReplaySource {
    async fn next_datagram(&mut self) -> Result<Option<Datagram>> {
        let Some((offset, bytes)) = self.frames.pop_front() else {
            debug!("Replay finished after {} datagrams", self.delivered);
            return Ok(None);
        };

        if let Some(speed) = self.speed {
            let gap = offset.saturating_sub(self.last_offset);
            if !gap.is_zero() {
                tokio::time::sleep(gap.div_f64(speed)).await;
            }
        }
        self.last_offset = offset;
        self.delivered += 1;

        trace!(offset = ?offset, len = bytes.len(), "Replaying datagram");
        Ok(Some(Datagram::new(bytes, self.start + offset)))
    }

    fn packet_rate(&self) -> f64 {
        self.packet_rate
    }
}

/// Builds a scripted race as a datagram sequence.
///
/// Time advances in fixed ticks. While driving, both the game clock and the
/// wall clock advance; while paused, only the wall clock does.
///
/// ```rust
/// use pitlane_sr::sources::RaceScript;
///
/// let script = RaceScript::new(0xC0FFEE, 11)
///     .drive(5.0)
///     .complete_lap()
///     .off_track()
///     .drive(70.0)
///     .session_type(0);
/// assert!(script.len() > 700);
/// let source = script.into_source();
/// assert!(source.remaining() > 700);
/// ```
#[derive(Debug, Clone)]
pub struct RaceScript {
    packets: PacketBuilder,
    session_type: u8,
    track_id: i8,
    lap: u8,
    wings: (u8, u8, u8),
    session_time: f32,
    wall: Duration,
    tick: Duration,
    frame: u32,
    frames: Vec<(Duration, Vec<u8>)>,
}

impl RaceScript {
    /// A race session on `track_id`, ticking at 10 Hz.
    pub fn new(session_uid: u64, track_id: i8) -> Self {
        Self {
            packets: PacketBuilder::new(session_uid),
            session_type: RACE_SESSION_CODE,
            track_id,
            lap: 0,
            wings: (0, 0, 0),
            session_time: 0.0,
            wall: Duration::ZERO,
            tick: Duration::from_millis(100),
            frame: 0,
            frames: Vec::new(),
        }
    }

    pub fn tick_rate(mut self, hz: f64) -> Self {
        self.tick = Duration::from_secs_f64(1.0 / hz.max(1.0));
        self
    }

    fn builder(&mut self) -> PacketBuilder {
        self.frame += 1;
        self.packets.at(self.session_time).frame(self.frame)
    }

    fn advance(&mut self, game_clock_runs: bool) {
        self.wall += self.tick;
        if game_clock_runs {
            self.session_time += self.tick.as_secs_f32();
        }
    }

    fn emit(&mut self, bytes: Vec<u8>) {
        self.frames.push((self.wall, bytes));
    }

    fn emit_session(&mut self, paused: bool) {
        let bytes = self.builder().session(self.session_type, self.track_id, paused);
        self.emit(bytes);
    }

    fn emit_lap(&mut self, invalid: bool) {
        let bytes = self.builder().lap_data(self.lap, u8::from(invalid));
        self.emit(bytes);
    }

    /// Drive cleanly for `secs` of game time: a session and a lap packet per tick.
    pub fn drive(mut self, secs: f32) -> Self {
        let ticks = (secs / self.tick.as_secs_f32()).round() as u32;
        for _ in 0..ticks {
            self.advance(true);
            self.emit_session(false);
            self.emit_lap(false);
        }
        self
    }

    pub fn complete_lap(mut self) -> Self {
        self.lap = self.lap.saturating_add(1);
        self.advance(true);
        self.emit_lap(false);
        self
    }

    /// Leave the track for one tick and rejoin on the next.
    pub fn off_track(mut self) -> Self {
        self.advance(true);
        self.emit_lap(true);
        self.advance(true);
        self.emit_lap(false);
        self
    }

    /// Add `wing_damage` to the front-left wing.
    pub fn collision(mut self, wing_damage: u8) -> Self {
        self.wings.0 = self.wings.0.saturating_add(wing_damage);
        self.advance(true);
        let (front_left, front_right, rear) = self.wings;
        let bytes = self.builder().car_damage(front_left, front_right, rear);
        self.emit(bytes);
        self
    }

    /// Pause for `secs` of wall time with the game clock frozen.
    pub fn pause(mut self, secs: f32) -> Self {
        let ticks = (secs / self.tick.as_secs_f32()).round() as u32;
        for _ in 0..ticks {
            self.advance(false);
            self.emit_session(true);
        }
        self
    }

    /// Switch the session type and announce it.
    pub fn session_type(mut self, code: u8) -> Self {
        self.session_type = code;
        self.advance(true);
        self.emit_session(false);
        self
    }

    /// Start over in a new race session with a fresh game clock.
    pub fn new_session(mut self, session_uid: u64) -> Self {
        self.packets = PacketBuilder::new(session_uid);
        self.session_type = RACE_SESSION_CODE;
        self.session_time = 0.0;
        self.lap = 0;
        self.advance(true);
        self.emit_session(false);
        self
    }

    /// Append an arbitrary datagram at the current wall time.
    pub fn raw(mut self, bytes: Vec<u8>) -> Self {
        self.advance(true);
        self.emit(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Game clock reached so far.
    pub fn session_time(&self) -> f32 {
        self.session_time
    }

    pub fn frames(&self) -> &[(Duration, Vec<u8>)] {
        &self.frames
    }

    pub fn into_source(self) -> ReplaySource {
        ReplaySource::new(self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::TelemetryDecoder;
    use crate::protocol::F12019Decoder;

    #[tokio::test]
    async fn replay_stamps_scripted_receipt_times() -> anyhow::Result<()> {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(500);
        let mut source = ReplaySource::at_rate(vec![vec![1], vec![2], vec![3]], 10.0).starting_at(start);

        let mut stamps = Vec::new();
        while let Some(datagram) = source.next_datagram().await? {
            stamps.push(datagram.received_at);
        }

        assert_eq!(
            stamps,
            vec![start, start + Duration::from_millis(100), start + Duration::from_millis(200)]
        );
        assert_eq!(source.delivered(), 3);
        assert!((source.packet_rate() - 10.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn paced_replay_sleeps_between_frames() -> anyhow::Result<()> {
        let mut source = ReplaySource::at_rate(vec![vec![0]; 11], 10.0).paced(1.0);
        let begin = tokio::time::Instant::now();
        while source.next_datagram().await?.is_some() {}

        assert!(begin.elapsed() >= Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn scripted_pause_freezes_game_clock_only() {
        let script = RaceScript::new(1, 3).drive(1.0);
        let time_before = script.session_time();
        let script = script.pause(2.0);

        assert_eq!(script.session_time(), time_before);
        let (last_wall, _) = script.frames().last().expect("frames");
        assert!(*last_wall >= Duration::from_millis(2_900));
    }

    #[test]
    fn scripted_packets_decode() {
        let script = RaceScript::new(42, 5).drive(0.5).complete_lap().off_track().collision(9);
        let mut decoder = F12019Decoder::new();
        for (_, bytes) in script.frames() {
            assert!(decoder.decode(bytes).is_some());
        }

        let state = decoder.last_known().expect("state");
        assert_eq!(state.session_uid, 42);
        assert_eq!(state.track_id, 5);
        assert_eq!(state.current_lap, 1);
        assert!(!state.is_off_track);
        assert_eq!(state.damage.front_left, 9.0);
    }
}
