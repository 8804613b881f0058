//! Trajectory sources: where configurations come from

use crate::error::Result;
use crate::systems::DynamicalSystem;

/// Produces the configuration following `current`, or `None` at end of run
///
/// Configurations must be produced in trajectory order. Deterministic
/// sources (seeded engines, replays) make runs reproducible.
pub trait TrajectorySource {
    /// Configuration snapshot type
    type Config;

    /// Next configuration, `Ok(None)` when the source is exhausted
    fn next(&mut self, current: &Self::Config) -> Result<Option<Self::Config>>;
}

/// Adapter turning a [`DynamicalSystem`] into a trajectory source
///
/// Each call advances the engine `stride` integration steps and snapshots
/// it. The engine owns its state, so `current` is not consulted.
pub struct SystemSource<S> {
    system: S,
    stride: usize,
    max_frames: Option<u64>,
    produced: u64,
}

impl<S: DynamicalSystem> SystemSource<S> {
    /// One snapshot per integration step, unbounded
    pub fn new(system: S) -> Self {
        Self {
            system,
            stride: 1,
            max_frames: None,
            produced: 0,
        }
    }

    /// Integration steps between snapshots (at least 1)
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Stop after `max_frames` snapshots
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Snapshot of the engine's current configuration
    pub fn initial(&self) -> S::State {
        self.system.state()
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut S {
        &mut self.system
    }

    /// Snapshots produced so far
    pub fn produced(&self) -> u64 {
        self.produced
    }

    pub fn into_inner(self) -> S {
        self.system
    }
}

impl<S: DynamicalSystem> TrajectorySource for SystemSource<S> {
    type Config = S::State;

    fn next(&mut self, _current: &S::State) -> Result<Option<S::State>> {
        if self.max_frames.is_some_and(|max| self.produced >= max) {
            return Ok(None);
        }
        self.system.run(self.stride);
        self.produced += 1;
        Ok(Some(self.system.state()))
    }
}

/// Replays a pre-recorded trajectory
#[derive(Debug, Clone)]
pub struct ReplaySource<C> {
    frames: Vec<C>,
    cursor: usize,
}

impl<C: Clone> ReplaySource<C> {
    /// Replay `frames` in order; the initial configuration is not included
    pub fn new(frames: Vec<C>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Split a recorded trajectory into its initial frame and a replay of
    /// the rest; `None` for an empty trajectory
    pub fn from_trajectory(mut frames: Vec<C>) -> Option<(C, Self)> {
        if frames.is_empty() {
            return None;
        }
        let initial = frames.remove(0);
        Some((initial, Self::new(frames)))
    }

    /// Frames not yet replayed
    pub fn remaining(&self) -> usize {
        self.frames.len() - self.cursor
    }
}

impl<C: Clone> TrajectorySource for ReplaySource<C> {
    type Config = C;

    fn next(&mut self, _current: &C) -> Result<Option<C>> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        Ok(frame)
    }
}

/// Trajectory source from a closure `current -> next`
pub struct FnSource<C, F> {
    f: F,
    _config: std::marker::PhantomData<fn() -> C>,
}

impl<C, F> FnSource<C, F>
where
    F: FnMut(&C) -> Result<Option<C>>,
{
    pub fn new(f: F) -> Self {
        Self { f, _config: std::marker::PhantomData }
    }
}

impl<C, F> TrajectorySource for FnSource<C, F>
where
    F: FnMut(&C) -> Result<Option<C>>,
{
    type Config = C;

    fn next(&mut self, current: &C) -> Result<Option<C>> {
        (self.f)(current)
    }
}
