//! Debounced background rendering of preview images.
//!
//! Slider drags produce a burst of parameter changes. The controller waits
//! for the burst to go quiet, renders the latest snapshot on a worker thread
//! and publishes the result, discarding anything a newer change has
//! superseded. All transitions happen on the thread that owns the controller;
//! workers only see an immutable snapshot plus a cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use image::DynamicImage;

use crate::state::{AdjustmentParameters, PreviewImage};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Renders a preview for one parameter snapshot. Runs on a worker thread.
pub type Processor = Arc<dyn Fn(&DynamicImage, &AdjustmentParameters) -> DynamicImage + Send + Sync>;

/// Called from the worker thread after it reports back, e.g. to request a repaint.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Debouncing,
    Running,
    Superseded,
}

struct Request {
    image: Arc<DynamicImage>,
    params: AdjustmentParameters,
    deadline: Instant,
}

struct Job {
    generation: u64,
    cancel: CancelToken,
}

enum State {
    Idle,
    Debouncing(Request),
    Running(Job),
    /// A cancelled job is still draining; `next` waits for it to acknowledge.
    Superseded { stale: Job, next: Option<Request> },
}

enum Outcome {
    Finished { generation: u64, preview: PreviewImage },
    Cancelled { generation: u64 },
}

impl Outcome {
    fn generation(&self) -> u64 {
        match self {
            Outcome::Finished { generation, .. } | Outcome::Cancelled { generation } => *generation,
        }
    }
}

pub struct PreviewController {
    state: State,
    debounce: Duration,
    processor: Processor,
    waker: Option<Waker>,
    generation: u64,
    dispatched: u64,
    tx: mpsc::Sender<Outcome>,
    rx: mpsc::Receiver<Outcome>,
}

impl PreviewController {
    pub fn new(debounce: Duration, processor: Processor) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            state: State::Idle,
            debounce,
            processor,
            waker: None,
            generation: 0,
            dispatched: 0,
            tx,
            rx,
        }
    }

    pub fn set_waker(&mut self, waker: Waker) {
        self.waker = Some(waker);
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Debouncing(_) => Phase::Debouncing,
            State::Running(_) => Phase::Running,
            State::Superseded { .. } => Phase::Superseded,
        }
    }

    /// True while a job is running or a debounce is pending.
    pub fn is_busy(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// Number of jobs handed to worker threads so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// When the pending debounce window closes, if one is open.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Debouncing(req) => Some(req.deadline),
            State::Superseded { next: Some(req), .. } => Some(req.deadline),
            _ => None,
        }
    }

    /// Records a parameter change observed at `now`.
    pub fn request(&mut self, image: Arc<DynamicImage>, params: AdjustmentParameters, now: Instant) {
        let req = Request {
            image,
            params,
            deadline: now + self.debounce,
        };
        self.state = match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle | State::Debouncing(_) => State::Debouncing(req),
            State::Running(job) => {
                tracing::debug!(generation = job.generation, "preview job superseded");
                job.cancel.cancel();
                State::Superseded {
                    stale: job,
                    next: Some(req),
                }
            }
            State::Superseded { stale, .. } => State::Superseded {
                stale,
                next: Some(req),
            },
        };
    }

    /// Cancels the live job and forgets any pending change.
    pub fn reset(&mut self) {
        self.state = match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle | State::Debouncing(_) => State::Idle,
            State::Running(job) => {
                job.cancel.cancel();
                State::Superseded {
                    stale: job,
                    next: None,
                }
            }
            State::Superseded { stale, .. } => State::Superseded { stale, next: None },
        };
    }

    /// Drains worker reports and fires an expired debounce.
    ///
    /// Returns the newly published preview, if any.
    pub fn poll(&mut self, now: Instant) -> Option<PreviewImage> {
        let mut published = None;

        while let Ok(outcome) = self.rx.try_recv() {
            let generation = outcome.generation();
            self.state = match std::mem::replace(&mut self.state, State::Idle) {
                State::Running(job) if job.generation == generation => match outcome {
                    Outcome::Finished { preview, .. } => {
                        tracing::debug!(generation, "preview published");
                        published = Some(preview);
                        State::Idle
                    }
                    // A running job is never cancelled, but an ack is still final.
                    Outcome::Cancelled { .. } => State::Idle,
                },
                State::Superseded { stale, next } if stale.generation == generation => {
                    tracing::debug!(generation, "superseded preview discarded");
                    match next {
                        Some(req) => State::Debouncing(req),
                        None => State::Idle,
                    }
                }
                other => other,
            };
        }

        if let State::Debouncing(req) = &self.state {
            if now >= req.deadline {
                if let State::Debouncing(req) = std::mem::replace(&mut self.state, State::Idle) {
                    self.state = State::Running(self.dispatch(req));
                }
            }
        }

        published
    }

    fn dispatch(&mut self, req: Request) -> Job {
        self.generation += 1;
        self.dispatched += 1;
        let generation = self.generation;
        let cancel = CancelToken::default();
        tracing::debug!(generation, temperature = req.params.temperature, "dispatching preview job");

        let token = cancel.clone();
        let processor = Arc::clone(&self.processor);
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        std::thread::spawn(move || {
            let outcome = if token.is_cancelled() {
                Outcome::Cancelled { generation }
            } else {
                let image = processor(&req.image, &req.params);
                if token.is_cancelled() {
                    Outcome::Cancelled { generation }
                } else {
                    Outcome::Finished {
                        generation,
                        preview: PreviewImage {
                            image,
                            params: req.params,
                        },
                    }
                }
            };
            let _ = tx.send(outcome);
            if let Some(waker) = waker {
                waker();
            }
        });

        Job { generation, cancel }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::{Duration, Instant};

    use image::{DynamicImage, ImageBuffer, Rgba};

    use crate::state::{AdjustmentParameters, PreviewImage};

    use super::{DEFAULT_DEBOUNCE, Phase, PreviewController, Processor};

    fn image() -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            2,
            2,
            Rgba([10, 10, 10, 255]),
        )))
    }

    fn temp(value: f32) -> AdjustmentParameters {
        AdjustmentParameters {
            temperature: value,
            ..Default::default()
        }
    }

    fn passthrough() -> Processor {
        Arc::new(|img: &DynamicImage, _: &AdjustmentParameters| img.clone())
    }

    /// Blocks each job until the test sends a token.
    fn gated() -> (Processor, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel::<()>();
        let rx = Mutex::new(rx);
        let processor: Processor = Arc::new(move |img: &DynamicImage, _: &AdjustmentParameters| {
            if let Ok(rx) = rx.lock() {
                let _ = rx.recv_timeout(Duration::from_secs(5));
            }
            img.clone()
        });
        (processor, tx)
    }

    /// Polls with a frozen clock until a preview arrives or the phase settles.
    fn wait_for(
        ctrl: &mut PreviewController,
        now: Instant,
        done: impl Fn(&PreviewController, &Option<PreviewImage>) -> bool,
    ) -> Option<PreviewImage> {
        let give_up = Instant::now() + Duration::from_secs(5);
        loop {
            let published = ctrl.poll(now);
            if done(ctrl, &published) || Instant::now() > give_up {
                return published;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn burst_of_changes_dispatches_one_job_with_the_last_value() {
        let mut ctrl = PreviewController::new(DEFAULT_DEBOUNCE, passthrough());
        let t0 = Instant::now();
        let img = image();
        for i in 0..10 {
            let now = t0 + Duration::from_millis(i * 10);
            ctrl.request(Arc::clone(&img), temp(i as f32 / 10.0), now);
            assert!(ctrl.poll(now).is_none());
        }
        assert_eq!(ctrl.phase(), Phase::Debouncing);
        assert_eq!(ctrl.dispatched(), 0);

        // Window is measured from the last change, not the first.
        let before = t0 + Duration::from_millis(90) + DEFAULT_DEBOUNCE - Duration::from_millis(1);
        ctrl.poll(before);
        assert_eq!(ctrl.dispatched(), 0);

        let after = t0 + Duration::from_millis(90) + DEFAULT_DEBOUNCE;
        ctrl.poll(after);
        assert_eq!(ctrl.dispatched(), 1);
        assert_eq!(ctrl.phase(), Phase::Running);

        let preview = wait_for(&mut ctrl, after, |_, p| p.is_some()).unwrap();
        assert_eq!(preview.params.temperature, 0.9);
        assert_eq!(ctrl.dispatched(), 1);
        assert_eq!(ctrl.phase(), Phase::Idle);
    }

    #[test]
    fn superseded_job_never_publishes() {
        let (processor, gate) = gated();
        let mut ctrl = PreviewController::new(DEFAULT_DEBOUNCE, processor);
        let t0 = Instant::now();
        let img = image();

        ctrl.request(Arc::clone(&img), temp(0.2), t0);
        let t1 = t0 + DEFAULT_DEBOUNCE;
        ctrl.poll(t1);
        assert_eq!(ctrl.phase(), Phase::Running);

        ctrl.request(Arc::clone(&img), temp(0.8), t1);
        assert_eq!(ctrl.phase(), Phase::Superseded);

        // Let the stale job finish; its result must be dropped.
        gate.send(()).unwrap();
        let published = wait_for(&mut ctrl, t1, |c, p| p.is_some() || c.phase() != Phase::Superseded);
        assert!(published.is_none());
        assert_eq!(ctrl.phase(), Phase::Debouncing);

        let t2 = t1 + DEFAULT_DEBOUNCE;
        ctrl.poll(t2);
        assert_eq!(ctrl.dispatched(), 2);
        gate.send(()).unwrap();
        let preview = wait_for(&mut ctrl, t2, |_, p| p.is_some()).unwrap();
        assert_eq!(preview.params.temperature, 0.8);
    }

    #[test]
    fn pending_change_waits_for_stale_job_to_drain() {
        let (processor, gate) = gated();
        let mut ctrl = PreviewController::new(DEFAULT_DEBOUNCE, processor);
        let t0 = Instant::now();
        let img = image();

        ctrl.request(Arc::clone(&img), temp(0.1), t0);
        ctrl.poll(t0 + DEFAULT_DEBOUNCE);
        ctrl.request(Arc::clone(&img), temp(0.5), t0 + DEFAULT_DEBOUNCE);

        // Deadline passes while the stale job is still blocked.
        let late = t0 + DEFAULT_DEBOUNCE * 3;
        ctrl.poll(late);
        assert_eq!(ctrl.dispatched(), 1);
        assert_eq!(ctrl.phase(), Phase::Superseded);

        gate.send(()).unwrap();
        wait_for(&mut ctrl, late, |c, _| c.dispatched() == 2);
        assert_eq!(ctrl.phase(), Phase::Running);
        gate.send(()).unwrap();
        let preview = wait_for(&mut ctrl, late, |_, p| p.is_some()).unwrap();
        assert_eq!(preview.params.temperature, 0.5);
    }

    #[test]
    fn reset_discards_pending_and_running_work() {
        let (processor, gate) = gated();
        let mut ctrl = PreviewController::new(DEFAULT_DEBOUNCE, processor);
        let t0 = Instant::now();
        let img = image();

        ctrl.request(Arc::clone(&img), temp(0.3), t0);
        ctrl.reset();
        assert_eq!(ctrl.phase(), Phase::Idle);

        ctrl.request(Arc::clone(&img), temp(0.3), t0);
        ctrl.poll(t0 + DEFAULT_DEBOUNCE);
        ctrl.reset();
        assert_eq!(ctrl.phase(), Phase::Superseded);
        assert_eq!(ctrl.next_deadline(), None);

        gate.send(()).unwrap();
        let published = wait_for(&mut ctrl, t0 + DEFAULT_DEBOUNCE, |c, p| {
            p.is_some() || c.phase() == Phase::Idle
        });
        assert!(published.is_none());
        assert_eq!(ctrl.phase(), Phase::Idle);
    }

    #[test]
    fn waker_runs_after_each_job() {
        let mut ctrl = PreviewController::new(Duration::ZERO, passthrough());
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        ctrl.set_waker(Arc::new(move || {
            if let Ok(tx) = tx.lock() {
                let _ = tx.send(());
            }
        }));
        let now = Instant::now();
        ctrl.request(image(), temp(0.0), now);
        ctrl.poll(now);
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
