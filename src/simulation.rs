//! Periodic drivers around a [`World`]
//!
//! A running [`Simulation`] owns a set of tokio tasks:
//!
//! - the update driver ticks the world on the blocking pool every
//!   `update_ms`,
//! - an optional render driver paints into a shared surface every `draw_ms`,
//! - the growth drivers add a random node every `generation_ms` and a random
//!   edge every `connection_ms`.
//!
//! Shutdown is cooperative. [`Simulation::stop`] publishes on a watch channel
//! that every driver races against its next tick, so an idle driver exits
//! right away and a busy one after its current step. The drivers are then
//! joined under a timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinSet;
use tokio::sync::watch;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::color::Color;
use crate::config::{Config, TimingConfig};
use crate::error::{Error, Result};
use crate::generator;
use crate::input::Controller;
use crate::surface::{Font, ScreenPoint, Surface};
use crate::world::World;

/// Weight of the newest sample in the eased frame rates
pub const FPS_EASING: f64 = 0.2;
pub const FPS_MAX: f64 = 999.9;

const INFO_COLOR: Color = Color::WHITE.with_alpha(200);
const INFO_FONT: &str = "Lucida Console";
const INFO_FONT_SIZE: f64 = 8.0;
const INFO_WIDTH: i32 = 160;
const INFO_LINE_HEIGHT: i32 = 14;
const INFO_TOP: i32 = -3;
const BACKGROUND: Color = Color::BLACK;

/// Eased update and draw frame rates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub update_fps: f64,
    pub draw_fps: f64,
}

/// Blend the rate implied by `elapsed` into `current`
pub fn ease_fps(current: f64, elapsed: Duration) -> f64 {
    let sample = 1.0 / elapsed.as_secs_f64();
    (current + (sample - current) * FPS_EASING).min(FPS_MAX)
}

/// Lines of the info overlay
pub fn overlay_lines(stats: &Stats, nodes: usize, edges: usize, frames: u64) -> Vec<String> {
    vec![
        format!("{:<9}{:.1}", "Model", stats.update_fps),
        format!("{:<9}{:.1}", "Render", stats.draw_fps),
        format!("{:<9}{}", "Nodes", nodes),
        format!("{:<9}{}", "Edges", edges),
        format!("{:<9}{}", "Frames", frames),
    ]
}

#[derive(Default)]
struct Meter {
    stats: Stats,
    last_update: Option<Instant>,
    last_draw: Option<Instant>,
}

impl Meter {
    fn record_update(&mut self, now: Instant) {
        if let Some(last) = self.last_update.replace(now) {
            self.stats.update_fps = ease_fps(self.stats.update_fps, now - last);
        }
    }

    fn record_draw(&mut self, now: Instant) {
        if let Some(last) = self.last_draw.replace(now) {
            self.stats.draw_fps = ease_fps(self.stats.draw_fps, now - last);
        }
    }
}

/// Wait for the next tick; `false` once shutdown has been requested
async fn next_tick(ticker: &mut Interval, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return false;
    }
    let stopped = tokio::select! {
        _ = ticker.tick() => false,
        _ = stop.changed() => true,
    };
    !stopped && !*stop.borrow()
}

/// Everything a paint needs, cheap to clone into blocking tasks
#[derive(Clone)]
struct Painter {
    world: Arc<World>,
    meter: Arc<Mutex<Meter>>,
    show_labels: bool,
}

impl Painter {
    fn paint<S: Surface + ?Sized>(&self, surface: &mut S) {
        let width = surface.width() as i32;
        let height = surface.height() as i32;

        surface.clear(BACKGROUND);
        surface.translate(width / 2, height / 2);
        self.world.draw(surface, self.show_labels);
        surface.reset_transform();

        let stats = self.meter.lock().stats;
        let lines = overlay_lines(
            &stats,
            self.world.node_count(),
            self.world.edge_count(),
            self.world.frames(),
        );
        let font = Font::new(INFO_FONT, INFO_FONT_SIZE);
        let x = width - INFO_WIDTH;
        let mut y = INFO_TOP;
        for line in &lines {
            y += INFO_LINE_HEIGHT;
            surface.draw_text(line, &font, INFO_COLOR, ScreenPoint::new(x, y));
        }

        self.meter.lock().record_draw(Instant::now());
    }
}

/// A world with its drivers running
pub struct Simulation {
    painter: Painter,
    timing: TimingConfig,
    stop: watch::Sender<bool>,
    drivers: JoinSet<Result<()>>,
}

impl Simulation {
    /// Seed the world and start the update and growth drivers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config) -> Result<Self> {
        let world = Arc::new(World::new(config));

        if config.growth.anchors {
            generator::seed_anchors(&world);
        }
        if config.growth.bulk_seed {
            let mut rng = StdRng::from_entropy();
            generator::populate(&world, &mut rng, &config.growth.bulk, config.growth.node_color)?;
        }

        let mut simulation = Self {
            painter: Painter {
                world,
                meter: Arc::new(Mutex::new(Meter::default())),
                show_labels: config.renderer.show_labels,
            },
            timing: config.timing.clone(),
            stop: watch::Sender::new(false),
            drivers: JoinSet::new(),
        };

        simulation.spawn_updates();
        if config.growth.enabled {
            simulation.spawn_generation(config.growth.node_color);
            simulation.spawn_connections();
        }
        Ok(simulation)
    }

    pub fn world(&self) -> &Arc<World> {
        &self.painter.world
    }

    /// A pointer controller bound to this simulation's world
    pub fn controller(&self) -> Controller {
        Controller::new(self.painter.world.clone())
    }

    pub fn stats(&self) -> Stats {
        self.painter.meter.lock().stats
    }

    pub fn overlay(&self) -> Vec<String> {
        let world = &self.painter.world;
        overlay_lines(
            &self.stats(),
            world.node_count(),
            world.edge_count(),
            world.frames(),
        )
    }

    /// Draw one frame: the world centered on the surface, then the overlay
    pub fn paint<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.painter.paint(surface);
    }

    /// Paint into `surface` every `draw_ms` until stopped
    pub fn spawn_renderer<S>(&mut self, surface: Arc<Mutex<S>>)
    where
        S: Surface + Send + 'static,
    {
        let painter = self.painter.clone();
        let mut stop = self.stop.subscribe();
        let period = self.timing.draw_interval();

        self.drivers.spawn(async move {
            info!(?period, "render driver started");
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                if !next_tick(&mut ticker, &mut stop).await {
                    break;
                }
                let painter = painter.clone();
                let surface = surface.clone();
                tokio::task::spawn_blocking(move || painter.paint(&mut *surface.lock()))
                    .await
                    .map_err(|e| Error::DriverFailed(e.to_string()))?;
            }
            info!("render driver stopped");
            Ok(())
        });
    }

    fn spawn_updates(&mut self) {
        let world = self.painter.world.clone();
        let meter = self.painter.meter.clone();
        let mut stop = self.stop.subscribe();
        let period = self.timing.update_interval();

        self.drivers.spawn(async move {
            info!(?period, "update driver started");
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                if !next_tick(&mut ticker, &mut stop).await {
                    break;
                }
                meter.lock().record_update(Instant::now());
                let world = world.clone();
                tokio::task::spawn_blocking(move || world.update())
                    .await
                    .map_err(|e| Error::DriverFailed(e.to_string()))?;
            }
            info!("update driver stopped");
            Ok(())
        });
    }

    fn spawn_generation(&mut self, color: Color) {
        let world = self.painter.world.clone();
        let mut stop = self.stop.subscribe();
        let period = self.timing.generation_interval();

        self.drivers.spawn(async move {
            info!(?period, "generation driver started");
            let mut rng = StdRng::from_entropy();
            let mut ticker = time::interval(period);
            loop {
                if !next_tick(&mut ticker, &mut stop).await {
                    break;
                }
                let node = generator::random_node(&mut rng, color);
                world.grow(node, &mut rng);
            }
            info!("generation driver stopped");
            Ok(())
        });
    }

    /// Every period, retry until one new random edge lands. A saturated
    /// graph keeps this retrying until growth adds room.
    fn spawn_connections(&mut self) {
        let world = self.painter.world.clone();
        let mut stop = self.stop.subscribe();
        let period = self.timing.connection_interval();

        self.drivers.spawn(async move {
            info!(?period, "connection driver started");
            let mut rng = StdRng::from_entropy();
            let mut ticker = time::interval(period);
            'driver: loop {
                if !next_tick(&mut ticker, &mut stop).await {
                    break;
                }
                loop {
                    if *stop.borrow() {
                        break 'driver;
                    }
                    if world.try_connect_random(&mut rng).is_some() {
                        break;
                    }
                    tokio::task::yield_now().await;
                }
            }
            info!("connection driver stopped");
            Ok(())
        });
    }

    /// Signal every driver and wait for them within the shutdown timeout
    pub async fn stop(mut self) -> Result<()> {
        self.stop.send_replace(true);
        let timeout = self.timing.shutdown_timeout();
        let mut drivers = std::mem::take(&mut self.drivers);

        let joined = time::timeout(timeout, async {
            let mut outcome = Ok(());
            while let Some(joined) = drivers.join_next().await {
                let result = joined.map_err(|e| Error::DriverFailed(e.to_string())).and_then(|r| r);
                if let Err(err) = result {
                    warn!(%err, "driver failed");
                    if outcome.is_ok() {
                        outcome = Err(err);
                    }
                }
            }
            outcome
        })
        .await;

        match joined {
            Ok(outcome) => {
                info!("simulation stopped");
                outcome
            }
            Err(_) => {
                warn!(?timeout, "drivers did not stop in time");
                Err(Error::ShutdownTimeout(timeout))
            }
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.stop.send_replace(true);
    }
}
