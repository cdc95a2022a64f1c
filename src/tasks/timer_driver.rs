//! Timer driver background task
//!
//! Each timer instance lives inside one task that exclusively owns its
//! `CountdownTimer`. Commands, frame ticks, fallback ticks and the precise
//! one-shots are all serialized through a single `select!` loop, so no two
//! ticks ever interleave.

use std::{future::pending, pin::Pin, sync::Arc};
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{interval, sleep_until, Interval, MissedTickBehavior, Sleep},
};
use tracing::{debug, info};

use crate::{
    error::PanelError,
    state::TimerStatus,
    timer::{
        CountdownTimer, MonotonicClock, StateBroadcast, Subscription, TickScheduler, TimerConfig,
        TimerHooks, TimerKind,
    },
};

/// Requests sent from handles to the driver task
#[derive(Debug)]
pub enum TimerCommand {
    Toggle(oneshot::Sender<TimerStatus>),
    Reset(oneshot::Sender<TimerStatus>),
    Prep(u64, oneshot::Sender<TimerStatus>),
    SetVisible(bool),
}

/// Cloneable handle to a running timer task.
///
/// The task stops, cancelling everything it had scheduled, once every
/// handle is dropped.
#[derive(Clone)]
pub struct TimerHandle {
    kind: TimerKind,
    commands: mpsc::UnboundedSender<TimerCommand>,
    status: watch::Receiver<TimerStatus>,
    broadcast: Arc<StateBroadcast>,
}

impl TimerHandle {
    /// Prep a timer and start its driver task
    pub fn spawn(config: TimerConfig, clock: MonotonicClock, hooks: TimerHooks) -> Self {
        let kind = config.kind;
        let timer = CountdownTimer::new(config, Arc::new(clock.clone()), hooks);
        let status = timer.status();
        let broadcast = timer.broadcast();
        let (commands, rx) = mpsc::unbounded_channel();

        tokio::spawn(timer_driver_task(timer, clock, rx));

        Self {
            kind,
            commands,
            status,
            broadcast,
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub async fn toggle(&self) -> Result<TimerStatus, PanelError> {
        self.request(TimerCommand::Toggle).await
    }

    pub async fn reset(&self) -> Result<TimerStatus, PanelError> {
        self.request(TimerCommand::Reset).await
    }

    pub async fn prep(&self, target_duration_ms: u64) -> Result<TimerStatus, PanelError> {
        self.request(|reply| TimerCommand::Prep(target_duration_ms, reply))
            .await
    }

    pub fn set_visible(&self, visible: bool) -> Result<(), PanelError> {
        self.commands
            .send(TimerCommand::SetVisible(visible))
            .map_err(|_| PanelError::TimerGone)
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(bool) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.broadcast.subscribe(callback)
    }

    /// Latest committed status
    pub fn status(&self) -> TimerStatus {
        self.status.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<TimerStatus> {
        self.status.clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().running
    }

    pub fn is_active(&self) -> bool {
        self.status.borrow().active
    }

    pub fn is_completed(&self) -> bool {
        self.status.borrow().completed
    }

    async fn request<F>(&self, make: F) -> Result<TimerStatus, PanelError>
    where
        F: FnOnce(oneshot::Sender<TimerStatus>) -> TimerCommand,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .map_err(|_| PanelError::TimerGone)?;
        rx.await.map_err(|_| PanelError::TimerGone)
    }
}

/// Concrete tokio handles built from the scheduler's plan
#[derive(Default)]
struct Armed {
    ticker: Option<Interval>,
    warning: Option<Pin<Box<Sleep>>>,
    end: Option<Pin<Box<Sleep>>>,
}

impl Armed {
    fn from_plan(plan: &TickScheduler, clock: &MonotonicClock) -> Self {
        let ticker = plan.cadence().map(|cadence| {
            let mut ticker = interval(cadence.period());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        Self {
            ticker,
            warning: plan
                .warning_due()
                .map(|due| Box::pin(sleep_until(clock.instant_at(due)))),
            end: plan
                .end_due()
                .map(|due| Box::pin(sleep_until(clock.instant_at(due)))),
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}

async fn deadline(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

/// Drive one timer until every handle is dropped
pub async fn timer_driver_task(
    mut timer: CountdownTimer,
    clock: MonotonicClock,
    mut commands: mpsc::UnboundedReceiver<TimerCommand>,
) {
    let kind = timer.config().kind.as_str();
    info!("Starting {} timer driver", kind);

    let status = timer.status();
    let mut armed = Armed::default();
    let mut generation = None;

    loop {
        // drop stale handles before anything else can fire
        if generation != Some(timer.scheduler().generation()) {
            generation = Some(timer.scheduler().generation());
            armed = Armed::from_plan(timer.scheduler(), &clock);
            debug!(
                "{} timer re-armed: cadence={:?} warning={:?} end={:?}",
                kind,
                timer.scheduler().cadence(),
                timer.scheduler().warning_due(),
                timer.scheduler().end_due()
            );
        }

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    TimerCommand::Toggle(reply) => {
                        timer.toggle();
                        let _ = reply.send(status.borrow().clone());
                    }
                    TimerCommand::Reset(reply) => {
                        timer.reset();
                        let _ = reply.send(status.borrow().clone());
                    }
                    TimerCommand::Prep(target, reply) => {
                        timer.prep(target);
                        let _ = reply.send(status.borrow().clone());
                    }
                    TimerCommand::SetVisible(visible) => timer.set_visible(visible),
                }
            }

            _ = next_tick(&mut armed.ticker) => timer.on_tick(),

            _ = deadline(&mut armed.warning) => {
                armed.warning = None;
                timer.on_warning_due();
            }

            _ = deadline(&mut armed.end) => {
                armed.end = None;
                timer.on_end_due();
            }
        }
    }

    info!("{} timer driver stopped", kind);
}
