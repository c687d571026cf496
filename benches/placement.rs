use std::sync::{Arc, Mutex};

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use floatmenu::logging::{LogEvent, LogSink, LoggingResult};
use floatmenu::{
    AnchorMode, IdentityHasher, Logger, MemoryModel, OptionHandle, OptionValue,
    OverlayConfig, OverlayCoordinator, OverlayHost, OverlayMeasurement, Placement, Point, Rect,
    SelectionController, SimulatedScheduler, Size, compute_placement,
};

#[derive(Clone, Default)]
struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

struct BenchHost;

impl OverlayHost for BenchHost {
    fn has_target(&self) -> bool {
        true
    }
    fn mount_backdrop(&mut self) {}
    fn mount_panel(&mut self) {}
    fn measure(&mut self) -> OverlayMeasurement {
        measurement()
    }
    fn centered_option(&mut self) -> Rect {
        Rect::new(0.0, 200.0, 200.0, 20.0)
    }
    fn apply_placement(&mut self, _placement: &Placement) {}
    fn release_entry_scale(&mut self) {}
    fn activate_interaction(&mut self) {}
    fn begin_close_transition(&mut self) {}
    fn unmount(&mut self) {}
}

fn measurement() -> OverlayMeasurement {
    OverlayMeasurement {
        parent: Rect::new(0.0, 0.0, 1280.0, 800.0),
        parent_scroll: Point::new(0.0, 120.0),
        target: Rect::new(340.0, 260.0, 180.0, 32.0),
        panel: Size::new(240.0, 420.0),
        content_visible: Size::new(240.0, 380.0),
        content_natural: Size::new(240.0, 1600.0),
    }
}

fn placement_free_floating(c: &mut Criterion) {
    let m = measurement();
    let centered = Rect::new(8.0, 640.0, 224.0, 40.0);
    c.bench_function("placement_free_floating", |b| {
        b.iter(|| compute_placement(black_box(&m), black_box(centered), AnchorMode::FreeFloating));
    });
}

fn placement_anchored(c: &mut Criterion) {
    let m = measurement();
    c.bench_function("placement_anchored", |b| {
        b.iter(|| {
            compute_placement(
                black_box(&m),
                black_box(Rect::ZERO),
                AnchorMode::AnchoredToTarget,
            )
        });
    });
}

fn selection_click_cycle(c: &mut Criterion) {
    let values: Vec<OptionValue> = (0..64)
        .map(|i| OptionValue::new(json!({ "id": i })))
        .collect();
    c.bench_function("selection_click_cycle", |b| {
        b.iter(|| {
            let model = Arc::new(Mutex::new(MemoryModel::default()));
            let logger = Logger::new(NullSink);
            let mut ctrl =
                SelectionController::new(true, IdentityHasher::with_field_selector("id"), model)
                    .with_logger(logger);
            for value in &values {
                let key = ctrl.hash(value, None);
                ctrl.add_option(key.clone(), OptionHandle::new(value.clone()))
                    .expect("unique key");
                ctrl.handle_click(key, value.clone());
            }
            black_box(ctrl.selected_keys().len())
        });
    });
}

fn overlay_open_close(c: &mut Criterion) {
    c.bench_function("overlay_open_close", |b| {
        b.iter(|| {
            let mut coordinator = OverlayCoordinator::new(OverlayConfig::default());
            let mut host = BenchHost;
            let mut scheduler = SimulatedScheduler::new();
            coordinator.show(&mut host, &mut scheduler).expect("show");
            while let Some(wake) = scheduler.pop() {
                coordinator.wake(wake, &mut host, &mut scheduler);
            }
            coordinator.cancel(&mut host, &mut scheduler);
            while let Some(wake) = scheduler.pop() {
                coordinator.wake(wake, &mut host, &mut scheduler);
            }
            black_box(coordinator.is_open())
        });
    });
}

criterion_group!(
    benches,
    placement_free_floating,
    placement_anchored,
    selection_click_cycle,
    overlay_open_close
);
criterion_main!(benches);
