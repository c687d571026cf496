use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{Result, SelectError};
use crate::geometry::Rect;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::SelectMetrics;
use crate::placement::{AnchorMode, OverlayMeasurement, Placement, compute_placement};

use super::audit::{NullOverlayAudit, OverlayAudit, OverlayAuditEvent, OverlayAuditStage};
use super::scheduler::{Scheduler, Wake};

const LOG_TARGET: &str = "floatmenu::overlay";

/// Guard window before option and backdrop clicks are armed, rejecting
/// the tail of an accidental double-tap.
pub const DEFAULT_INTERACTION_DELAY: Duration = Duration::from_millis(75);

/// Lifecycle states. Every open walks Closed → Opening → Open → Closing →
/// Closed; a close during Opening short-circuits straight to Closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Closed,
    Opening,
    Open,
    Closing,
}

/// Why a close was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Cancelled,
    /// A single-select option was chosen.
    Committed,
    BackdropClicked,
}

impl CloseReason {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Cancelled => "cancelled",
            Self::Committed => "committed",
            Self::BackdropClicked => "backdrop",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub has_backdrop: bool,
    pub anchor_mode: AnchorMode,
    pub interaction_delay: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            has_backdrop: true,
            anchor_mode: AnchorMode::FreeFloating,
            interaction_delay: DEFAULT_INTERACTION_DELAY,
        }
    }
}

/// Everything the coordinator asks of the rendering layer.
///
/// The coordinator owns the panel/backdrop subtree for the open lifetime
/// and drives it exclusively through this trait; it never measures before
/// the mount wakes have fired. Teardown calls must tolerate arriving
/// before the corresponding mount when an open is cancelled early.
pub trait OverlayHost {
    fn has_target(&self) -> bool;
    fn mount_backdrop(&mut self);
    fn mount_panel(&mut self);
    /// Snapshot layout. Only called after `mount_panel` plus one frame.
    fn measure(&mut self) -> OverlayMeasurement;
    /// Panel-local rect of the option to keep visible: the selection, the
    /// middle option when nothing is selected, `Rect::ZERO` when empty.
    fn centered_option(&mut self) -> Rect;
    fn apply_placement(&mut self, placement: &Placement);
    /// Drop the entry scale transform so the panel animates to size.
    fn release_entry_scale(&mut self);
    fn activate_interaction(&mut self);
    fn begin_close_transition(&mut self);
    fn unmount(&mut self);
}

/// Drives the overlay through its lifecycle.
///
/// Single-threaded and callback-driven: every wait is a [`Wake`] pushed
/// through the [`Scheduler`] and delivered back to [`wake`]. The
/// `is_removed` flag is the only cancellation mechanism; opening-phase
/// wakes that arrive after removal are dropped and audited.
///
/// [`wake`]: OverlayCoordinator::wake
pub struct OverlayCoordinator {
    config: OverlayConfig,
    state: OverlayState,
    is_removed: bool,
    interaction_active: bool,
    last_placement: Option<Placement>,
    audit: Arc<dyn OverlayAudit>,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<SelectMetrics>>>,
}

impl OverlayCoordinator {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            state: OverlayState::Closed,
            is_removed: false,
            interaction_active: false,
            last_placement: None,
            audit: Arc::new(NullOverlayAudit),
            logger: None,
            metrics: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn OverlayAudit>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Mutex<SelectMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == OverlayState::Open
    }

    /// Whether clicks are armed. False until the interaction delay fires,
    /// and again from the moment a close is requested.
    pub fn interaction_active(&self) -> bool {
        self.interaction_active
    }

    pub fn last_placement(&self) -> Option<&Placement> {
        self.last_placement.as_ref()
    }

    /// Request the open sequence. The panel mounts on the next tick, is
    /// measured and placed one frame later, and arms interaction after
    /// the configured delay.
    pub fn show(
        &mut self,
        host: &mut dyn OverlayHost,
        scheduler: &mut dyn Scheduler,
    ) -> Result<()> {
        if self.state != OverlayState::Closed {
            return Err(SelectError::AlreadyOpen);
        }
        if !host.has_target() {
            return Err(SelectError::MissingTarget);
        }

        self.state = OverlayState::Opening;
        self.is_removed = false;
        self.interaction_active = false;
        self.last_placement = None;
        self.record(OverlayAuditStage::ShowRequested, Vec::new());
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_open();
            }
        }
        self.log(LogLevel::Info, "overlay_show", std::iter::empty());
        scheduler.schedule(Wake::NextTick);
        Ok(())
    }

    pub fn cancel(&mut self, host: &mut dyn OverlayHost, scheduler: &mut dyn Scheduler) {
        self.close(CloseReason::Cancelled, host, scheduler);
    }

    /// Begin closing. A no-op when already closed or closing; honored
    /// immediately during Opening, in which case any still-pending
    /// opening wakes become no-ops.
    pub fn close(
        &mut self,
        reason: CloseReason,
        host: &mut dyn OverlayHost,
        scheduler: &mut dyn Scheduler,
    ) {
        if matches!(self.state, OverlayState::Closed | OverlayState::Closing) {
            return;
        }

        self.state = OverlayState::Closing;
        self.is_removed = true;
        self.interaction_active = false;
        self.record(
            OverlayAuditStage::CloseStarted,
            vec![("reason".to_string(), json!(reason.as_str()))],
        );
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_close();
            }
        }
        self.log(
            LogLevel::Info,
            "overlay_close",
            [json_kv("reason", json!(reason.as_str()))],
        );
        host.begin_close_transition();
        scheduler.schedule(Wake::TransitionEnd);
    }

    /// Deliver a previously scheduled wake.
    pub fn wake(
        &mut self,
        wake: Wake,
        host: &mut dyn OverlayHost,
        scheduler: &mut dyn Scheduler,
    ) {
        if wake == Wake::TransitionEnd {
            if self.state != OverlayState::Closing {
                self.skip(wake);
                return;
            }
            host.unmount();
            self.state = OverlayState::Closed;
            self.is_removed = false;
            self.record(OverlayAuditStage::Unmounted, Vec::new());
            self.log(LogLevel::Info, "overlay_unmounted", std::iter::empty());
            return;
        }

        // Opening-phase wakes are void once removal is flagged.
        if self.is_removed || !matches!(self.state, OverlayState::Opening) {
            self.skip(wake);
            return;
        }

        match wake {
            Wake::NextTick => {
                if self.config.has_backdrop {
                    host.mount_backdrop();
                }
                host.mount_panel();
                self.record(OverlayAuditStage::PanelMounted, Vec::new());
                scheduler.schedule(Wake::MeasureFrame);
            }
            Wake::MeasureFrame => {
                let measurement = host.measure();
                let centered = host.centered_option();
                let placement =
                    compute_placement(&measurement, centered, self.config.anchor_mode);
                host.apply_placement(&placement);
                self.record(
                    OverlayAuditStage::PlacementApplied,
                    vec![
                        ("left".to_string(), json!(placement.position.x)),
                        ("top".to_string(), json!(placement.position.y)),
                    ],
                );
                if let Some(metrics) = self.metrics.as_ref() {
                    if let Ok(mut guard) = metrics.lock() {
                        guard.record_placement();
                    }
                }
                self.last_placement = Some(placement);
                scheduler.schedule(Wake::SettleFrame);
                scheduler.schedule(Wake::InteractionDelay);
            }
            Wake::SettleFrame => {
                host.release_entry_scale();
            }
            Wake::InteractionDelay => {
                host.activate_interaction();
                self.interaction_active = true;
                self.state = OverlayState::Open;
                self.record(OverlayAuditStage::InteractionActivated, Vec::new());
                self.record(OverlayAuditStage::OpenFinished, Vec::new());
                self.log(LogLevel::Info, "overlay_open", std::iter::empty());
            }
            Wake::TransitionEnd => unreachable!("handled above"),
        }
    }

    fn skip(&self, wake: Wake) {
        self.record(
            OverlayAuditStage::WakeSkipped,
            vec![("wake".to_string(), json!(format!("{wake:?}")))],
        );
        self.log(
            LogLevel::Debug,
            "wake_skipped",
            [json_kv("wake", json!(format!("{wake:?}")))],
        );
    }

    fn record(&self, stage: OverlayAuditStage, details: Vec<(String, Value)>) {
        let mut event = OverlayAuditEvent::new(stage);
        for (key, value) in details {
            event = event.with_detail(key, value);
        }
        self.audit.record(event);
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::overlay::audit::MemoryOverlayAudit;
    use crate::overlay::scheduler::SimulatedScheduler;

    struct TestHost {
        target: bool,
        calls: Vec<&'static str>,
        placement: Option<Placement>,
    }

    impl TestHost {
        fn new() -> Self {
            Self {
                target: true,
                calls: Vec::new(),
                placement: None,
            }
        }
    }

    impl OverlayHost for TestHost {
        fn has_target(&self) -> bool {
            self.target
        }

        fn mount_backdrop(&mut self) {
            self.calls.push("mount_backdrop");
        }

        fn mount_panel(&mut self) {
            self.calls.push("mount_panel");
        }

        fn measure(&mut self) -> OverlayMeasurement {
            self.calls.push("measure");
            OverlayMeasurement {
                parent: Rect::new(0.0, 0.0, 800.0, 600.0),
                parent_scroll: Point::default(),
                target: Rect::new(100.0, 200.0, 50.0, 20.0),
                panel: Size::new(200.0, 300.0),
                content_visible: Size::new(200.0, 300.0),
                content_natural: Size::new(200.0, 300.0),
            }
        }

        fn centered_option(&mut self) -> Rect {
            self.calls.push("centered_option");
            Rect::ZERO
        }

        fn apply_placement(&mut self, placement: &Placement) {
            self.calls.push("apply_placement");
            self.placement = Some(*placement);
        }

        fn release_entry_scale(&mut self) {
            self.calls.push("release_entry_scale");
        }

        fn activate_interaction(&mut self) {
            self.calls.push("activate_interaction");
        }

        fn begin_close_transition(&mut self) {
            self.calls.push("begin_close_transition");
        }

        fn unmount(&mut self) {
            self.calls.push("unmount");
        }
    }

    fn drain(
        coordinator: &mut OverlayCoordinator,
        host: &mut TestHost,
        scheduler: &mut SimulatedScheduler,
    ) {
        while let Some(wake) = scheduler.pop() {
            coordinator.wake(wake, host, scheduler);
        }
    }

    #[test]
    fn open_sequence_runs_in_order() {
        let audit = Arc::new(MemoryOverlayAudit::new());
        let mut coordinator =
            OverlayCoordinator::new(OverlayConfig::default()).with_audit(audit.clone());
        let mut host = TestHost::new();
        let mut scheduler = SimulatedScheduler::new();

        coordinator.show(&mut host, &mut scheduler).unwrap();
        assert_eq!(coordinator.state(), OverlayState::Opening);
        assert!(!coordinator.interaction_active());

        drain(&mut coordinator, &mut host, &mut scheduler);
        assert_eq!(coordinator.state(), OverlayState::Open);
        assert!(coordinator.interaction_active());
        assert_eq!(
            host.calls,
            vec![
                "mount_backdrop",
                "mount_panel",
                "measure",
                "centered_option",
                "apply_placement",
                "release_entry_scale",
                "activate_interaction",
            ]
        );
        assert_eq!(
            audit.stages(),
            vec![
                OverlayAuditStage::ShowRequested,
                OverlayAuditStage::PanelMounted,
                OverlayAuditStage::PlacementApplied,
                OverlayAuditStage::InteractionActivated,
                OverlayAuditStage::OpenFinished,
            ]
        );
        assert!(coordinator.last_placement().is_some());
    }

    #[test]
    fn backdrop_is_optional() {
        let config = OverlayConfig {
            has_backdrop: false,
            ..OverlayConfig::default()
        };
        let mut coordinator = OverlayCoordinator::new(config);
        let mut host = TestHost::new();
        let mut scheduler = SimulatedScheduler::new();

        coordinator.show(&mut host, &mut scheduler).unwrap();
        drain(&mut coordinator, &mut host, &mut scheduler);
        assert!(!host.calls.contains(&"mount_backdrop"));
    }

    #[test]
    fn show_requires_a_target() {
        let mut coordinator = OverlayCoordinator::new(OverlayConfig::default());
        let mut host = TestHost::new();
        host.target = false;
        let mut scheduler = SimulatedScheduler::new();

        let err = coordinator.show(&mut host, &mut scheduler).unwrap_err();
        assert!(matches!(err, SelectError::MissingTarget));
        assert_eq!(coordinator.state(), OverlayState::Closed);
    }

    #[test]
    fn show_while_open_is_rejected() {
        let mut coordinator = OverlayCoordinator::new(OverlayConfig::default());
        let mut host = TestHost::new();
        let mut scheduler = SimulatedScheduler::new();

        coordinator.show(&mut host, &mut scheduler).unwrap();
        drain(&mut coordinator, &mut host, &mut scheduler);
        let err = coordinator.show(&mut host, &mut scheduler).unwrap_err();
        assert!(matches!(err, SelectError::AlreadyOpen));
    }

    #[test]
    fn close_during_opening_voids_pending_wakes() {
        let audit = Arc::new(MemoryOverlayAudit::new());
        let mut coordinator =
            OverlayCoordinator::new(OverlayConfig::default()).with_audit(audit.clone());
        let mut host = TestHost::new();
        let mut scheduler = SimulatedScheduler::new();

        coordinator.show(&mut host, &mut scheduler).unwrap();
        // Process the mount tick, then cancel before the measure frame.
        let wake = scheduler.pop().unwrap();
        coordinator.wake(wake, &mut host, &mut scheduler);
        coordinator.cancel(&mut host, &mut scheduler);

        drain(&mut coordinator, &mut host, &mut scheduler);
        assert_eq!(coordinator.state(), OverlayState::Closed);
        assert!(!host.calls.contains(&"measure"));
        assert!(host.calls.contains(&"unmount"));
        assert!(audit
            .stages()
            .contains(&OverlayAuditStage::WakeSkipped));
    }

    #[test]
    fn close_after_open_unmounts() {
        let mut coordinator = OverlayCoordinator::new(OverlayConfig::default());
        let mut host = TestHost::new();
        let mut scheduler = SimulatedScheduler::new();

        coordinator.show(&mut host, &mut scheduler).unwrap();
        drain(&mut coordinator, &mut host, &mut scheduler);
        coordinator.close(CloseReason::Committed, &mut host, &mut scheduler);
        assert_eq!(coordinator.state(), OverlayState::Closing);
        assert!(!coordinator.interaction_active());

        drain(&mut coordinator, &mut host, &mut scheduler);
        assert_eq!(coordinator.state(), OverlayState::Closed);
        assert!(host.calls.ends_with(&["begin_close_transition", "unmount"]));
    }

    #[test]
    fn redundant_close_is_a_noop() {
        let mut coordinator = OverlayCoordinator::new(OverlayConfig::default());
        let mut host = TestHost::new();
        let mut scheduler = SimulatedScheduler::new();

        coordinator.cancel(&mut host, &mut scheduler);
        assert_eq!(coordinator.state(), OverlayState::Closed);
        assert!(host.calls.is_empty());

        coordinator.show(&mut host, &mut scheduler).unwrap();
        drain(&mut coordinator, &mut host, &mut scheduler);
        coordinator.cancel(&mut host, &mut scheduler);
        coordinator.cancel(&mut host, &mut scheduler);
        let transitions = host
            .calls
            .iter()
            .filter(|call| **call == "begin_close_transition")
            .count();
        assert_eq!(transitions, 1);
    }

    #[test]
    fn open_and_close_are_counted() {
        let metrics = Arc::new(Mutex::new(SelectMetrics::new()));
        let mut coordinator =
            OverlayCoordinator::new(OverlayConfig::default()).with_metrics(metrics.clone());
        let mut host = TestHost::new();
        let mut scheduler = SimulatedScheduler::new();

        coordinator.show(&mut host, &mut scheduler).unwrap();
        drain(&mut coordinator, &mut host, &mut scheduler);
        coordinator.cancel(&mut host, &mut scheduler);
        drain(&mut coordinator, &mut host, &mut scheduler);

        let snapshot = metrics.lock().unwrap().snapshot(Duration::ZERO);
        assert_eq!(snapshot.opens, 1);
        assert_eq!(snapshot.closes, 1);
        assert_eq!(snapshot.placements, 1);
    }
}
