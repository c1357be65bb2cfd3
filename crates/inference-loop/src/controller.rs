use crate::{CycleError, LoopConfig, LoopError, LoopState, LoopStats, NotReadyPolicy, ResultSink};
use camera_source::{CameraSource, FacingMode, StreamId};
use flower_model::{Classifier, LabelSet, ModelSlot, PredictError, PredictionResult};
use frame_preprocess::to_tensor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Requests handled between cycles.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    ToggleCamera,
    Configure(FacingMode),
    Teardown,
}

/// Control side of a running [`InferenceLoop`].
#[derive(Clone)]
pub struct LoopHandle {
    tx: mpsc::Sender<Command>,
    state: watch::Receiver<LoopState>,
}

impl LoopHandle {
    pub async fn toggle_camera(&self) -> Result<(), LoopError> {
        self.send(Command::ToggleCamera).await
    }

    pub async fn configure_camera(&self, facing: FacingMode) -> Result<(), LoopError> {
        self.send(Command::Configure(facing)).await
    }

    /// External teardown; the loop stops after any in-flight cycle.
    pub async fn teardown(&self) -> Result<(), LoopError> {
        self.send(Command::Teardown).await
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Wait until the loop reports `target`.
    pub async fn wait_for(&self, target: LoopState) -> Result<(), LoopError> {
        let mut rx = self.state.clone();
        rx.wait_for(|s| *s == target)
            .await
            .map(|_| ())
            .map_err(|_| LoopError::Closed)
    }

    async fn send(&self, cmd: Command) -> Result<(), LoopError> {
        self.tx.send(cmd).await.map_err(|_| LoopError::Closed)
    }
}

/// Capture, preprocess, predict, publish; one frame at a time.
pub struct InferenceLoop<S: ResultSink> {
    camera: CameraSource,
    model: ModelSlot,
    labels: LabelSet,
    sink: S,
    config: LoopConfig,
    state: LoopState,
    state_tx: watch::Sender<LoopState>,
    commands: mpsc::Receiver<Command>,
    stats: LoopStats,
    /// Stream that was active when the loop stalled.
    stalled_on: Option<StreamId>,
    not_ready_reported: bool,
    /// Inference that outlived its timeout. No new predict starts until it ends.
    abandoned: Option<JoinHandle<Result<PredictionResult, PredictError>>>,
}

impl<S: ResultSink> InferenceLoop<S> {
    pub fn new(
        camera: CameraSource,
        model: ModelSlot,
        sink: S,
        config: LoopConfig,
    ) -> (Self, LoopHandle) {
        let (tx, commands) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(LoopState::AwaitingFirstFrame);
        let this = Self {
            camera,
            model,
            labels: LabelSet::flowers(),
            sink,
            config,
            state: LoopState::AwaitingFirstFrame,
            state_tx,
            commands,
            stats: LoopStats::default(),
            stalled_on: None,
            not_ready_reported: false,
            abandoned: None,
        };
        let handle = LoopHandle {
            tx,
            state: state_rx,
        };
        (this, handle)
    }

    /// Drive the loop until teardown. Returns the final counters.
    pub async fn run(mut self) -> LoopStats {
        info!(
            policy = ?self.config.not_ready,
            interval_ms = self.config.frame_interval_ms,
            "inference loop started"
        );
        while self.state != LoopState::Stopped {
            let wait = self.next_wait();
            tokio::select! {
                biased;
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => self.set_state(LoopState::Stopped),
                },
                _ = tokio::time::sleep(wait) => self.on_tick().await,
            }
        }
        if let Some(task) = self.abandoned.take() {
            task.abort();
        }
        self.camera.shutdown();
        info!(stats = ?self.stats, "inference loop stopped");
        self.stats
    }

    fn next_wait(&self) -> Duration {
        match self.state {
            LoopState::Idle => self.config.frame_interval(),
            _ => self.config.first_frame_poll(),
        }
    }

    fn set_state(&mut self, state: LoopState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "loop state");
            self.state = state;
            self.state_tx.send_replace(state);
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        let outcome = match cmd {
            Command::ToggleCamera => self.camera.toggle().await,
            Command::Configure(facing) => self.camera.configure(facing).await,
            Command::Teardown => {
                info!("teardown requested");
                self.set_state(LoopState::Stopped);
                return;
            }
        };
        match outcome {
            Ok(stream) => info!(%stream, facing = %self.camera.facing(), "camera switched"),
            Err(err) => {
                error!(error = %err, "error accessing the camera");
                if err.is_device_access() {
                    self.sink
                        .alert("Error accessing the camera, please check device settings.");
                }
            }
        }
    }

    async fn on_tick(&mut self) {
        match self.state {
            LoopState::AwaitingFirstFrame => {
                if self.camera.has_data() {
                    info!("camera delivering frames");
                    self.set_state(LoopState::Idle);
                    self.cycle().await;
                }
            }
            LoopState::Idle => self.cycle().await,
            LoopState::Stalled => {
                let current = self.camera.active_stream_id();
                if current.is_some() && current != self.stalled_on && self.camera.has_data() {
                    info!("new camera stream has data; resuming predictions");
                    self.stalled_on = None;
                    self.set_state(LoopState::Idle);
                    self.cycle().await;
                }
            }
            LoopState::Predicting | LoopState::Stopped => {}
        }
    }

    async fn cycle(&mut self) {
        let Some(classifier) = self.model.classifier() else {
            self.on_model_unavailable();
            return;
        };
        self.not_ready_reported = false;
        if self.inference_still_running() {
            self.stats.skipped_busy += 1;
            return;
        }

        self.set_state(LoopState::Predicting);
        match self.predict_once(classifier).await {
            Ok(label) => {
                self.stats.cycles += 1;
                self.sink.publish(&label);
                self.stats.published += 1;
                info!("Detected: {label}");
            }
            Err(CycleError::Frame(err)) => {
                self.stats.skipped_no_frame += 1;
                debug!(error = %err, "no frame this tick");
            }
            Err(CycleError::Timeout(limit)) => {
                self.stats.cycles += 1;
                self.stats.timeouts += 1;
                warn!(?limit, "inference timed out; skipping frame");
            }
            Err(err) => {
                self.stats.cycles += 1;
                self.stats.failed += 1;
                warn!(error = %err, "prediction cycle failed");
            }
        }
        self.set_state(LoopState::Idle);
    }

    /// True while a timed-out inference has not yet finished.
    fn inference_still_running(&mut self) -> bool {
        let Some(task) = &self.abandoned else {
            return false;
        };
        if !task.is_finished() {
            debug!("timed-out inference still running; skipping tick");
            return true;
        }
        debug!("timed-out inference finished; result discarded");
        self.abandoned = None;
        false
    }

    fn on_model_unavailable(&mut self) {
        self.stats.skipped_not_ready += 1;
        if !self.not_ready_reported {
            if self.model.is_failed() {
                warn!("model failed to load; no predictions will be made");
            } else {
                info!("model not loaded yet");
            }
            self.not_ready_reported = true;
        }
        if self.config.not_ready == NotReadyPolicy::Stall {
            self.stalled_on = self.camera.active_stream_id();
            self.set_state(LoopState::Stalled);
        }
    }

    async fn predict_once(&mut self, classifier: Arc<dyn Classifier>) -> Result<String, CycleError> {
        let tensor = {
            let frame = self.camera.current_frame()?;
            to_tensor(&frame)?
        };
        let mut task = tokio::spawn(async move { classifier.predict(&tensor).await });
        let joined = match self.config.inference_timeout() {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, &mut task).await;
                match outcome {
                    Ok(joined) => joined,
                    Err(_) => {
                        self.abandoned = Some(task);
                        return Err(CycleError::Timeout(limit));
                    }
                }
            }
            None => task.await,
        };
        let result = joined.map_err(|e| PredictError::Backend(e.to_string()))??;
        let label = result
            .predicted_label(&self.labels)
            .ok_or(CycleError::NoLabel)?;
        debug!(label, confidence = ?result.confidence(), "prediction");
        Ok(label.to_string())
    }
}
