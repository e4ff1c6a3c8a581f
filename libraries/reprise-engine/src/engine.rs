//! Playback engine actor
//!
//! One tokio task owns the [`MediaBackend`]. Callers talk to it through an
//! [`EngineHandle`] that sends commands over a channel and awaits oneshot
//! replies, so every mutation of the backend is serialized. While a file is
//! loaded a sampler fires every `sampling_interval_ms` and reports elapsed
//! time as [`EngineEvent::Tick`] callbacks.

use crate::access::AccessGrant;
use crate::backend::MediaBackend;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::token::{LoadToken, Tagged};
use reprise_core::{clamp_time, MediaLocation};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Control operations that only apply to the currently loaded resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Play,
    Pause,
    Seek(f64),
}

/// A load request
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub location: MediaLocation,
    /// Seconds to seek to once the resource is ready; ignored when `<= 0`
    pub resume_at: f64,
}

/// Commands sent to the engine task
#[derive(Debug)]
pub enum EngineCommand {
    /// Tear down, then load a new resource
    Load {
        request: Tagged<LoadRequest>,
        reply: oneshot::Sender<Result<PlaybackHandle>>,
    },

    /// Play, pause or seek; rejected unless the token matches the loaded one
    Control {
        control: Tagged<Control>,
        reply: oneshot::Sender<bool>,
    },

    /// Set output volume
    SetVolume(f32),

    /// Release everything; the reply is optional for fire-and-forget use
    Teardown { reply: Option<oneshot::Sender<()>> },
}

/// Callbacks emitted by the engine task
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Duration became known (seconds)
    DurationLoaded(f64),

    /// Periodic sample of elapsed time (seconds)
    Tick(f64),

    /// The backend started or stopped advancing
    PlaybackStateChanged(bool),
}

/// Callback stamped with the load it belongs to
pub type EngineCallback = Tagged<EngineEvent>;

/// Receiving side of engine callbacks
pub type EngineEvents = mpsc::UnboundedReceiver<EngineCallback>;

/// Returned by a successful load; wires up end-of-media notification
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    token: LoadToken,
    ended: watch::Receiver<bool>,
}

impl PlaybackHandle {
    pub fn token(&self) -> &LoadToken {
        &self.token
    }

    /// Whether the media is currently sitting at its end
    pub fn has_ended(&self) -> bool {
        *self.ended.borrow()
    }

    /// Wait for the next end of media.
    ///
    /// Resolves each time the resource reaches its end; a seek or play that
    /// leaves the end re-arms it. Never resolves once the resource has been
    /// torn down.
    pub async fn ended(&mut self) {
        loop {
            if self.ended.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
            if *self.ended.borrow_and_update() {
                return;
            }
        }
    }
}

/// Cloneable client for the engine task
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
}

impl EngineHandle {
    /// Tear down whatever is loaded, then load `location`
    ///
    /// # Errors
    /// `ResourceUnavailable` if access cannot be granted or the backend
    /// refuses the file; `EngineGone` if the task has exited.
    pub async fn load(
        &self,
        location: MediaLocation,
        resume_at: f64,
        token: LoadToken,
    ) -> Result<PlaybackHandle> {
        let (reply, rx) = oneshot::channel();
        let request = Tagged::new(
            token,
            LoadRequest {
                location,
                resume_at,
            },
        );
        self.send(EngineCommand::Load { request, reply })?;
        rx.await.map_err(|_| EngineError::EngineGone)?
    }

    /// Returns whether the resource was in a startable state
    pub async fn play(&self, token: &LoadToken) -> bool {
        self.control(token, Control::Play).await
    }

    pub async fn pause(&self, token: &LoadToken) -> bool {
        self.control(token, Control::Pause).await
    }

    pub async fn seek(&self, token: &LoadToken, time: f64) -> bool {
        self.control(token, Control::Seek(time)).await
    }

    /// Level is applied as-is; callers validate the range
    pub fn set_volume(&self, level: f32) -> Result<()> {
        self.send(EngineCommand::SetVolume(level))
    }

    /// Tear down and wait until the resource is released
    pub async fn teardown(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Teardown { reply: Some(reply) })?;
        rx.await.map_err(|_| EngineError::EngineGone)
    }

    /// Request teardown without waiting
    pub fn fire_teardown(&self) {
        let _ = self.send(EngineCommand::Teardown { reply: None });
    }

    async fn control(&self, token: &LoadToken, control: Control) -> bool {
        let (reply, rx) = oneshot::channel();
        let command = EngineCommand::Control {
            control: Tagged::new(token.clone(), control),
            reply,
        };
        if self.send(command).is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::EngineGone)
    }
}

/// State for the currently loaded resource
struct Loaded {
    token: LoadToken,
    _grant: AccessGrant,
    sampler: Interval,
    duration: Option<f64>,
    /// Resume target waiting for the backend to become ready
    pending_resume: Option<f64>,
    reported_playing: bool,
    ended_tx: watch::Sender<bool>,
}

enum Step {
    Command(EngineCommand),
    Sample,
    Shutdown,
}

/// The engine task
pub struct PlaybackEngine {
    backend: Box<dyn MediaBackend>,
    config: EngineConfig,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    callbacks: mpsc::UnboundedSender<EngineCallback>,
    loaded: Option<Loaded>,
    volume: f32,
}

impl PlaybackEngine {
    /// Spawn the engine task on the current tokio runtime.
    ///
    /// The task exits, tearing down, once every [`EngineHandle`] is dropped.
    pub fn spawn(
        backend: Box<dyn MediaBackend>,
        config: EngineConfig,
    ) -> (EngineHandle, EngineEvents) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (callback_tx, callback_rx) = mpsc::unbounded_channel();

        let engine = Self {
            backend,
            config,
            commands: command_rx,
            callbacks: callback_tx,
            loaded: None,
            volume: 1.0,
        };
        tokio::spawn(engine.run());

        (
            EngineHandle {
                commands: command_tx,
            },
            callback_rx,
        )
    }

    async fn run(mut self) {
        debug!(
            interval_ms = self.config.sampling_interval_ms,
            "Playback engine started"
        );
        loop {
            let step = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Shutdown,
                },
                () = next_sample(&mut self.loaded) => Step::Sample,
            };

            match step {
                Step::Command(command) => self.handle(command),
                Step::Sample => self.sample(),
                Step::Shutdown => break,
            }
        }
        self.teardown();
        debug!("Playback engine stopped");
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Load { request, reply } => {
                let result = self.load(request);
                let _ = reply.send(result);
            }
            EngineCommand::Control { control, reply } => {
                let ok = self.control(control);
                let _ = reply.send(ok);
            }
            EngineCommand::SetVolume(level) => {
                self.volume = level;
                self.backend.set_volume(level);
            }
            EngineCommand::Teardown { reply } => {
                self.teardown();
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
        }
    }

    fn load(&mut self, request: Tagged<LoadRequest>) -> Result<PlaybackHandle> {
        // Loads always start from a clean slate
        self.teardown();

        let Tagged { token, payload } = request;
        info!(token = %token, location = %payload.location, "Loading");

        let grant = AccessGrant::acquire(&payload.location)?;
        self.backend.open(&payload.location)?;
        self.backend.set_volume(self.volume);

        let mut sampler = interval(self.config.sampling_interval());
        sampler.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (ended_tx, ended_rx) = watch::channel(false);
        let resume = clamp_time(payload.resume_at, None);

        self.loaded = Some(Loaded {
            token: token.clone(),
            _grant: grant,
            sampler,
            duration: None,
            pending_resume: (resume > 0.0).then_some(resume),
            reported_playing: false,
            ended_tx,
        });
        self.settle();

        Ok(PlaybackHandle {
            token,
            ended: ended_rx,
        })
    }

    fn control(&mut self, control: Tagged<Control>) -> bool {
        let current = self.loaded.as_ref().map(|l| &l.token);
        if !control.is_for(current) {
            trace!(token = %control.token, ?control.payload, "Ignoring command for stale load");
            return false;
        }

        match control.payload {
            Control::Play => {
                self.settle();
                if self.backend.reached_end() {
                    self.backend.seek(0.0);
                }
                let started = self.backend.play();
                if started {
                    self.rearm_end();
                }
                started
            }
            Control::Pause => {
                self.backend.pause();
                true
            }
            Control::Seek(time) => self.seek(time),
        }
    }

    fn seek(&mut self, time: f64) -> bool {
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };
        let target = clamp_time(time, loaded.duration);
        if loaded.pending_resume.is_some() && !self.backend.is_ready() {
            // Not seekable yet; retarget the resume instead
            loaded.pending_resume = Some(target);
            return true;
        }
        loaded.pending_resume = None;
        let moved = self.backend.seek(target);
        if moved && !self.backend.reached_end() {
            self.rearm_end();
        }
        moved
    }

    /// Pick up the duration and apply a pending resume once the backend
    /// is ready.
    fn settle(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        if loaded.duration.is_none() {
            if let Some(duration) = self.backend.duration() {
                debug!(token = %loaded.token, duration, "Duration loaded");
                loaded.duration = Some(duration);
                emit(
                    &self.callbacks,
                    &loaded.token,
                    EngineEvent::DurationLoaded(duration),
                );
            }
        }

        if let Some(target) = loaded.pending_resume {
            if self.backend.is_ready() {
                let target = clamp_time(target, loaded.duration);
                debug!(token = %loaded.token, target, "Applying resume position");
                self.backend.seek(target);
                loaded.pending_resume = None;
            }
        }
    }

    fn sample(&mut self) {
        self.settle();
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        let elapsed = loaded
            .pending_resume
            .unwrap_or_else(|| self.backend.position());
        let time = clamp_time(elapsed, loaded.duration);
        emit(&self.callbacks, &loaded.token, EngineEvent::Tick(time));

        if self.backend.is_playing() && self.backend.reached_end() {
            self.backend.pause();
            if !*loaded.ended_tx.borrow() {
                debug!(token = %loaded.token, "End of media");
                loaded.ended_tx.send_replace(true);
            }
        }

        let playing = self.backend.is_playing();
        if playing != loaded.reported_playing {
            loaded.reported_playing = playing;
            emit(
                &self.callbacks,
                &loaded.token,
                EngineEvent::PlaybackStateChanged(playing),
            );
        }
    }

    fn rearm_end(&mut self) {
        if let Some(loaded) = self.loaded.as_ref() {
            if *loaded.ended_tx.borrow() {
                loaded.ended_tx.send_replace(false);
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            debug!(token = %loaded.token, "Tearing down");
            self.backend.pause();
            self.backend.close();
        } else {
            // Nothing loaded; still make sure the backend holds nothing
            self.backend.close();
        }
    }
}

async fn next_sample(loaded: &mut Option<Loaded>) {
    match loaded {
        Some(loaded) => {
            loaded.sampler.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn emit(callbacks: &mpsc::UnboundedSender<EngineCallback>, token: &LoadToken, event: EngineEvent) {
    if callbacks.send(Tagged::new(token.clone(), event)).is_err() {
        warn!("Engine callback receiver dropped");
    }
}
