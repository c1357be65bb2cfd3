use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoopState {
    /// Waiting for the camera's first decodable frame.
    AwaitingFirstFrame,
    Idle,
    /// One inference in flight.
    Predicting,
    /// A tick found the model unavailable under `NotReadyPolicy::Stall`.
    Stalled,
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopState::AwaitingFirstFrame => "awaiting-first-frame",
            LoopState::Idle => "idle",
            LoopState::Predicting => "predicting",
            LoopState::Stalled => "stalled",
            LoopState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoopStats {
    /// Cycles that captured a frame and ran (or tried to run) the model.
    pub cycles: u64,
    pub published: u64,
    pub skipped_not_ready: u64,
    pub skipped_no_frame: u64,
    /// Ticks skipped while a timed-out inference was still running.
    pub skipped_busy: u64,
    pub failed: u64,
    pub timeouts: u64,
}
