//! Soak driver
//!
//! Mounts a dashboard of tick counters whose actors subscribe to an in-process
//! broadcast bus, publishes ticks, replaces a share of the counters halfway
//! through and finally checks that no removed counter saw a delivery after it
//! left the tree.
//!
//! The coordinator stays on the main task. The driver runs as a separate task
//! and only talks to it through its address.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use tether_core::prelude::*;
use tokio::sync::{broadcast, oneshot};

use crate::config::SoakConfig;

/// One published tick
#[derive(Clone, Copy, Debug)]
pub struct Tick(pub u64);

/// The bus every counter's actor subscribes to
#[derive(Clone)]
pub struct Bus {
    sender: broadcast::Sender<Tick>,
    subscriptions: Arc<AtomicUsize>,
}

impl Bus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            subscriptions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Forward every tick into `mailbox` until its actor exits
    fn subscribe(&self, mailbox: Mailbox) {
        let mut rx = self.sender.subscribe();
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(tick) => {
                        if mailbox.send(tick).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(instance = ?mailbox.id(), skipped, "subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    pub fn publish(&self, tick: Tick) -> usize {
        self.sender.send(tick).unwrap_or(0)
    }

    /// Subscriptions made since the bus was created
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

/// Counters shared between a tick counter and the dashboard
#[derive(Debug, Default)]
pub struct CounterStats {
    delivered: AtomicU64,
    out_of_order: AtomicU64,
}

impl CounterStats {
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn out_of_order(&self) -> u64 {
        self.out_of_order.load(Ordering::SeqCst)
    }
}

pub struct CounterProps {
    bus: Bus,
    stats: Arc<CounterStats>,
}

/// Counts the ticks its actor relays and checks they arrive in order
#[derive(Default)]
pub struct TickCounter {
    last: Option<u64>,
    stats: Arc<CounterStats>,
}

impl ActorComponent for TickCounter {
    type Props = CounterProps;
    type Message = Tick;

    fn on_mount(&mut self, props: &CounterProps, _cx: &mut Context<'_>) -> Mount {
        let bus = props.bus.clone();
        Mount::spawn(move |actor| bus.subscribe(actor.mailbox()))
    }

    fn on_update(&mut self, props: &CounterProps, _cx: &mut Context<'_>) {
        self.stats = props.stats.clone();
    }

    fn on_message(&mut self, Tick(n): Tick, _cx: &mut Context<'_>) -> Reply {
        if self.last.is_some_and(|last| n <= last) {
            self.stats.out_of_order.fetch_add(1, Ordering::SeqCst);
        }
        self.last = Some(n);
        self.stats.delivered.fetch_add(1, Ordering::SeqCst);
        Reply::Handled
    }
}

/// Commands the driver sends to the dashboard
pub enum Command {
    /// Replace the oldest `count` counters with fresh ones
    Churn { count: usize },
    /// Collect the run's numbers
    Report(oneshot::Sender<Report>),
}

struct Live {
    instance: InstanceId,
    stats: Arc<CounterStats>,
}

struct Removed {
    stats: Arc<CounterStats>,
    at_removal: u64,
}

/// The soak page: owns the tick counters
pub struct Dashboard {
    bus: Bus,
    instances: usize,
    next: usize,
    live: Vec<Live>,
    removed: Vec<Removed>,
}

impl Dashboard {
    pub fn new(bus: Bus, instances: usize) -> Self {
        Self {
            bus,
            instances,
            next: 0,
            live: Vec::new(),
            removed: Vec::new(),
        }
    }

    fn add_counter(&mut self, session: &mut Session) -> Result<(), TetherError> {
        let stats = Arc::new(CounterStats::default());
        let instance = session.render::<TickCounter>(
            format!("counter-{}", self.next),
            CounterProps {
                bus: self.bus.clone(),
                stats: stats.clone(),
            },
        )?;
        self.next += 1;
        self.live.push(Live { instance, stats });
        Ok(())
    }

    fn churn(&mut self, count: usize, session: &mut Session) -> Result<(), TetherError> {
        let count = count.min(self.live.len());
        for live in self.live.drain(..count).collect::<Vec<_>>() {
            session.remove(live.instance);
            self.removed.push(Removed {
                at_removal: live.stats.delivered(),
                stats: live.stats,
            });
        }
        for _ in 0..count {
            self.add_counter(session)?;
        }
        tracing::info!(replaced = count, "churned counters");
        Ok(())
    }

    pub fn report(&self) -> Report {
        let counters = self
            .live
            .iter()
            .map(|live| &live.stats)
            .chain(self.removed.iter().map(|removed| &removed.stats));
        let (delivered, out_of_order) =
            counters.fold((0, 0), |(delivered, out_of_order), stats| {
                (delivered + stats.delivered(), out_of_order + stats.out_of_order())
            });
        Report {
            live: self.live.len(),
            removed: self.removed.len(),
            delivered,
            out_of_order,
            late: self
                .removed
                .iter()
                .map(|removed| removed.stats.delivered() - removed.at_removal)
                .sum(),
            min_live_delivered: self
                .live
                .iter()
                .map(|live| live.stats.delivered())
                .min()
                .unwrap_or(0),
        }
    }
}

impl View for Dashboard {
    fn mount(&mut self, session: &mut Session) -> Result<(), TetherError> {
        for _ in 0..self.instances {
            self.add_counter(session)?;
        }
        tracing::info!(instances = self.instances, "dashboard mounted");
        Ok(())
    }

    fn handle_info(
        &mut self,
        message: AnyMessage,
        session: &mut Session,
    ) -> Result<(), TetherError> {
        match message.downcast::<Command>() {
            Ok(command) => match *command {
                Command::Churn { count } => self.churn(count, session)?,
                Command::Report(reply) => {
                    if reply.send(self.report()).is_err() {
                        tracing::warn!("report requested but nobody is waiting");
                    }
                }
            },
            Err(_) => tracing::debug!("ignoring unknown dashboard message"),
        }
        Ok(())
    }
}

/// Numbers collected at the end of a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub live: usize,
    pub removed: usize,
    pub delivered: u64,
    pub out_of_order: u64,
    /// Deliveries to counters after they were removed
    pub late: u64,
    pub min_live_delivered: u64,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.late == 0 && self.out_of_order == 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "live counters:      {}", self.live)?;
        writeln!(f, "removed counters:   {}", self.removed)?;
        writeln!(f, "ticks delivered:    {}", self.delivered)?;
        writeln!(f, "min per live:       {}", self.min_live_delivered)?;
        writeln!(f, "out of order:       {}", self.out_of_order)?;
        write!(f, "after removal:      {}", self.late)
    }
}

/// Drive one soak run against the coordinator at `address`
///
/// Shuts the coordinator down once the report is in, whatever the outcome.
pub async fn drive(address: CoordinatorAddress, bus: Bus, soak: SoakConfig) -> Result<Report> {
    let result = drive_inner(&address, &bus, &soak).await;
    if address.shutdown().is_err() {
        tracing::debug!("coordinator already gone");
    }
    result
}

async fn drive_inner(address: &CoordinatorAddress, bus: &Bus, soak: &SoakConfig) -> Result<Report> {
    let interval = Duration::from_millis(soak.tick_interval_ms);
    let churn = soak.churn_count();
    let half = soak.ticks / 2;

    wait_for_subscriptions(bus, soak.instances).await?;
    publish(bus, 0..half, interval).await;

    address.send(Command::Churn { count: churn })?;
    wait_for_subscriptions(bus, soak.instances + churn).await?;
    publish(bus, half..soak.ticks, interval).await;

    tokio::time::sleep(Duration::from_millis(soak.settle_ms)).await;

    let (tx, rx) = oneshot::channel();
    address.send(Command::Report(tx))?;
    rx.await.context("coordinator stopped before reporting")
}

async fn wait_for_subscriptions(bus: &Bus, expected: usize) -> Result<()> {
    tokio::time::timeout(Duration::from_secs(10), async {
        while bus.subscriptions() < expected {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .with_context(|| format!("timed out waiting for {} subscriptions", expected))
}

async fn publish(bus: &Bus, ticks: std::ops::Range<u64>, interval: Duration) {
    for n in ticks {
        let receivers = bus.publish(Tick(n));
        tracing::trace!(tick = n, receivers, "published");
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
}
