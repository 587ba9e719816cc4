//! Gate controller state machine
//!
//! A single cooperative loop: poll the motion sensor while idle, then block
//! through capture, recognition, decision and actuation before polling again.
//! Cancellation is checked at every state boundary and inside every wait;
//! whatever state it interrupts, shutdown de-asserts the relay.

use chrono::{Local, NaiveDate};
use plategate_domain::service::{audit_event_for, decide};
use plategate_types::{
    AccessDecision, AuditEvent, CapturedFrame, HardwareError, PlateRecord, RecognitionResult,
};
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::pacer::{Pacer, ThreadPacer};

/// Audit detail for a grant that shutdown kept from opening the barrier
pub const SHUTDOWN_BEFORE_OPEN: &str = "Shutdown requested before barrier opened";

#[derive(Debug, Clone)]
pub enum GateState {
    Idle,
    Triggered,
    Capturing,
    Deciding(CapturedFrame),
    Actuating(PlateRecord),
    CoolingDown,
    ShuttingDown,
}

impl GateState {
    pub fn name(&self) -> &'static str {
        match self {
            GateState::Idle => "idle",
            GateState::Triggered => "triggered",
            GateState::Capturing => "capturing",
            GateState::Deciding(_) => "deciding",
            GateState::Actuating(_) => "actuating",
            GateState::CoolingDown => "cooling_down",
            GateState::ShuttingDown => "shutting_down",
        }
    }
}

pub struct GateController<P: Pacer = ThreadPacer> {
    ctx: AppContext,
    pacer: P,
    state: GateState,
    last_sweep: Option<NaiveDate>,
    attempts: u64,
}

impl GateController<ThreadPacer> {
    pub fn new(ctx: AppContext) -> Self {
        Self::with_pacer(ctx, ThreadPacer::default())
    }
}

impl<P: Pacer> GateController<P> {
    pub fn with_pacer(ctx: AppContext, pacer: P) -> Self {
        Self {
            ctx,
            pacer,
            state: GateState::Idle,
            last_sweep: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Number of capture attempts started so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Run until the token is cancelled, then release the hardware.
    ///
    /// The relay is de-asserted on the way out no matter where the loop was
    /// interrupted; a failure to do so is the only error returned.
    pub fn run(&mut self, token: &CancellationToken) -> Result<(), HardwareError> {
        tracing::info!("Gate controller started, waiting for motion");
        while !matches!(self.state, GateState::ShuttingDown) {
            self.step(token);
        }
        self.shutdown()
    }

    /// Advance the state machine by one transition
    pub fn step(&mut self, token: &CancellationToken) {
        let current = std::mem::replace(&mut self.state, GateState::Idle);
        let next = if token.is_cancelled() {
            self.interrupt(current)
        } else {
            self.transition(current, token)
        };

        tracing::trace!(state = next.name(), "Gate state");
        self.state = next;
    }

    fn transition(&mut self, state: GateState, token: &CancellationToken) -> GateState {
        match state {
            GateState::Idle => self.on_idle(token),
            GateState::Triggered => {
                tracing::info!("Motion detected, scanning plate");
                GateState::Capturing
            }
            GateState::Capturing => self.on_capturing(),
            GateState::Deciding(frame) => self.on_deciding(frame),
            GateState::Actuating(record) => self.on_actuating(record, token),
            GateState::CoolingDown => {
                self.pacer.wait(self.ctx.timings.cooldown, token);
                GateState::Idle
            }
            GateState::ShuttingDown => GateState::ShuttingDown,
        }
    }

    /// Leave `state` for shutdown. An attempt whose frame is already captured
    /// still gets its audit event; the barrier is never opened.
    fn interrupt(&mut self, state: GateState) -> GateState {
        match state {
            GateState::Deciding(frame) => {
                if let GateState::Actuating(record) = self.on_deciding(frame) {
                    self.skip_actuation(&record);
                }
            }
            GateState::Actuating(record) => self.skip_actuation(&record),
            _ => {}
        }
        GateState::ShuttingDown
    }

    fn on_idle(&mut self, token: &CancellationToken) -> GateState {
        self.sweep_if_new_day(Local::now().date_naive());

        match self.ctx.sensor.is_triggered() {
            Ok(true) => return GateState::Triggered,
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Motion sensor read failed"),
        }

        self.pacer.wait(self.ctx.timings.poll_interval, token);
        GateState::Idle
    }

    fn on_capturing(&mut self) -> GateState {
        self.attempts += 1;
        tracing::debug!(attempt = self.attempts, "Capturing frame");
        match self.ctx.camera.capture() {
            Ok(frame) => {
                tracing::debug!(width = frame.width(), height = frame.height(), "Frame captured");
                GateState::Deciding(frame)
            }
            Err(e) => {
                tracing::error!(error = %e, "Capture failed");
                self.record(&AuditEvent::camera_failure(&e));
                GateState::CoolingDown
            }
        }
    }

    fn on_deciding(&mut self, frame: CapturedFrame) -> GateState {
        let result = self.ctx.pipeline.recognize(&frame);
        let decision = decide(&result, &self.ctx.registry);
        self.store_photo(&frame, &result);

        match &decision {
            // granted attempts are recorded once the relay has been driven
            AccessDecision::Granted(record) => {
                tracing::info!(
                    plate = %record.plate,
                    model = %record.model,
                    owner = %record.owner,
                    "Access granted"
                );
                GateState::Actuating(record.clone())
            }
            AccessDecision::Denied(plate) => {
                self.record(&audit_event_for(&decision, &result));
                tracing::info!(plate = %plate, "Access denied");
                GateState::CoolingDown
            }
        }
    }

    fn on_actuating(&mut self, record: PlateRecord, token: &CancellationToken) -> GateState {
        match self.ctx.relay.set(true) {
            Ok(()) => {
                self.record(&AuditEvent::granted(&record));
                tracing::info!(plate = %record.plate, "Barrier open");
                if !self.pacer.wait(self.ctx.timings.relay_open, token) {
                    tracing::info!("Shutdown requested while barrier open");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to open barrier");
                self.record(
                    &AuditEvent::granted(&record).with_detail(format!("Barrier failed to open: {}", e)),
                );
            }
        }

        if let Err(e) = self.ctx.relay.set(false) {
            tracing::error!(error = %e, "Failed to close barrier");
        } else {
            tracing::info!("Barrier closed");
        }
        GateState::CoolingDown
    }

    fn skip_actuation(&self, record: &PlateRecord) {
        tracing::info!(plate = %record.plate, "Shutdown requested, barrier stays closed");
        self.record(&AuditEvent::granted(record).with_detail(SHUTDOWN_BEFORE_OPEN));
    }

    fn record(&self, event: &AuditEvent) {
        if let Err(e) = self.ctx.audit.append(event) {
            tracing::warn!(error = %e, status = %event.status, "Failed to write audit event");
        }
    }

    fn store_photo(&self, frame: &CapturedFrame, result: &RecognitionResult) {
        let plate = result.plate();
        if !self.ctx.photo_policy.should_store(plate.is_some()) {
            return;
        }
        match self.ctx.photos.store(frame, plate) {
            Ok(path) => tracing::info!(path = %path.display(), "Photo saved"),
            Err(e) => tracing::warn!(error = %e, "Failed to save photo"),
        }
    }

    fn sweep_if_new_day(&mut self, today: NaiveDate) {
        if self.last_sweep == Some(today) {
            return;
        }
        self.last_sweep = Some(today);

        let Some(retention) = &self.ctx.retention else {
            return;
        };
        match retention.sweep(today) {
            Ok(report) => tracing::info!(
                removed = report.removed,
                kept = report.kept,
                skipped = report.skipped,
                "Photo retention sweep"
            ),
            Err(e) => tracing::warn!(error = %e, "Photo retention sweep failed"),
        }
    }

    fn shutdown(&mut self) -> Result<(), HardwareError> {
        tracing::info!("Shutting down, releasing hardware");
        let relay = self.ctx.relay.release();
        if let Err(e) = &relay {
            tracing::error!(error = %e, "Failed to release relay");
        }
        if let Err(e) = self.ctx.sensor.release() {
            tracing::warn!(error = %e, "Failed to release motion sensor");
        }
        relay
    }
}
