use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};
use std::cell::{Cell, RefCell};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::rc::Rc;
use tween_core::{Config, EaseKind, Engine, LoopType, Space, TransformTarget, TweenHandle};

/// Interior-mutability transform double; counts writes so tests can assert
/// that killed tweens stop touching the target.
struct StubTransform {
    position: Cell<Vector3<f32>>,
    local_position: Cell<Vector3<f32>>,
    rotation: Cell<UnitQuaternion<f32>>,
    local_rotation: Cell<UnitQuaternion<f32>>,
    euler: Cell<Vector3<f32>>,
    scale: Cell<Vector3<f32>>,
    alive: Cell<bool>,
    writes: Cell<usize>,
}

impl StubTransform {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            position: Cell::new(Vector3::zeros()),
            local_position: Cell::new(Vector3::zeros()),
            rotation: Cell::new(UnitQuaternion::identity()),
            local_rotation: Cell::new(UnitQuaternion::identity()),
            euler: Cell::new(Vector3::zeros()),
            scale: Cell::new(Vector3::new(1.0, 1.0, 1.0)),
            alive: Cell::new(true),
            writes: Cell::new(0),
        })
    }

    fn at(position: Vector3<f32>) -> Rc<Self> {
        let stub = Self::new();
        stub.position.set(position);
        stub
    }
}

impl TransformTarget for StubTransform {
    fn position(&self) -> Vector3<f32> {
        self.position.get()
    }
    fn set_position(&self, value: Vector3<f32>) {
        self.writes.set(self.writes.get() + 1);
        self.position.set(value);
    }
    fn local_position(&self) -> Vector3<f32> {
        self.local_position.get()
    }
    fn set_local_position(&self, value: Vector3<f32>) {
        self.writes.set(self.writes.get() + 1);
        self.local_position.set(value);
    }
    fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation.get()
    }
    fn set_rotation(&self, value: UnitQuaternion<f32>) {
        self.writes.set(self.writes.get() + 1);
        self.rotation.set(value);
    }
    fn local_rotation(&self) -> UnitQuaternion<f32> {
        self.local_rotation.get()
    }
    fn set_local_rotation(&self, value: UnitQuaternion<f32>) {
        self.writes.set(self.writes.get() + 1);
        self.local_rotation.set(value);
    }
    fn local_euler_angles(&self) -> Vector3<f32> {
        self.euler.get()
    }
    fn set_local_euler_angles(&self, value: Vector3<f32>) {
        self.writes.set(self.writes.get() + 1);
        self.euler.set(value);
    }
    fn local_scale(&self) -> Vector3<f32> {
        self.scale.get()
    }
    fn set_local_scale(&self, value: Vector3<f32>) {
        self.writes.set(self.writes.get() + 1);
        self.scale.set(value);
    }
    fn is_alive(&self) -> bool {
        self.alive.get()
    }
}

fn vec(x: f32, y: f32, z: f32) -> Vector3<f32> {
    Vector3::new(x, y, z)
}

#[test]
fn move_reaches_exact_end_value() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );

    for _ in 0..4 {
        engine.tick(0.25, 0.25);
    }
    assert_eq!(stub.position.get(), vec(10.0, 0.0, 0.0));
    assert!(!engine.is_valid(h));
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn move_samples_midway() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );

    engine.tick(0.5, 0.5);
    assert_relative_eq!(stub.position.get().x, 5.0, epsilon = 1e-5);
}

#[test]
fn move_to_captures_start_on_first_run() {
    let mut engine = Engine::default();
    let stub = StubTransform::at(vec(5.0, 0.0, 0.0));
    engine.move_to(stub.clone(), vec(10.0, 0.0, 0.0), 1.0, Space::World);

    engine.tick(0.5, 0.5);
    assert_relative_eq!(stub.position.get().x, 7.5, epsilon = 1e-5);
}

#[test]
fn move_by_is_relative_to_captured_start() {
    let mut engine = Engine::default();
    let stub = StubTransform::at(vec(2.0, 0.0, 0.0));
    engine.move_by(stub.clone(), vec(3.0, 0.0, 0.0), 1.0, Space::World);

    engine.tick(1.0, 1.0);
    assert_relative_eq!(stub.position.get().x, 5.0, epsilon = 1e-5);
}

#[test]
fn set_ease_shapes_the_curve() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    engine.set_ease(h, EaseKind::InQuad);

    engine.tick(0.5, 0.5);
    // t^2 at the midpoint.
    assert_relative_eq!(stub.position.get().x, 2.5, epsilon = 1e-5);
}

#[test]
fn delay_defers_the_first_write() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(1.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    engine.set_delay(h, 0.5);

    engine.tick(0.4, 0.4);
    assert_eq!(stub.writes.get(), 0);

    engine.tick(0.2, 0.2);
    assert!(stub.writes.get() > 0);
}

#[test]
fn yoyo_even_loop_count_returns_to_start() {
    let mut engine = Engine::default();
    let stub = StubTransform::at(vec(1.0, 1.0, 1.0));
    let h = engine.move_between(
        stub.clone(),
        vec(1.0, 1.0, 1.0),
        vec(9.0, 1.0, 1.0),
        0.5,
        Space::World,
    );
    engine.set_loops(h, 4, LoopType::Yoyo);

    engine.tick(2.0, 2.0);
    assert_eq!(stub.position.get(), vec(1.0, 1.0, 1.0));
    assert!(!engine.is_valid(h));
}

#[test]
fn yoyo_odd_loop_count_lands_on_end() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(9.0, 0.0, 0.0),
        0.5,
        Space::World,
    );
    engine.set_loops(h, 3, LoopType::Yoyo);

    engine.tick(1.5, 1.5);
    assert_eq!(stub.position.get(), vec(9.0, 0.0, 0.0));
}

#[test]
fn incremental_loops_accumulate_the_delta() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    engine.set_loops(h, 3, LoopType::Incremental);

    for _ in 0..6 {
        engine.tick(0.5, 0.5);
    }
    assert_relative_eq!(stub.position.get().x, 30.0, epsilon = 1e-4);
}

#[test]
fn loop_count_zero_is_normalized_to_one() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(4.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    engine.set_loops(h, 0, LoopType::Restart);

    engine.tick(1.0, 1.0);
    assert_eq!(stub.position.get(), vec(4.0, 0.0, 0.0));
    assert!(!engine.is_valid(h));
}

#[test]
fn kill_stops_writes_and_skips_completion() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let completed = Rc::new(Cell::new(false));
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    let flag = completed.clone();
    engine.on_complete(h, move || flag.set(true));

    engine.tick(0.25, 0.25);
    let writes_before = stub.writes.get();

    engine.kill(h);
    assert!(!engine.is_valid(h));

    engine.tick(0.25, 0.25);
    engine.tick(1.0, 1.0);
    assert_eq!(stub.writes.get(), writes_before);
    assert!(!completed.get());
}

#[test]
fn complete_on_infinite_tween_fires_exactly_once() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let fired = Rc::new(Cell::new(0u32));
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    engine.set_loops(h, -1, LoopType::Restart);
    let counter = fired.clone();
    engine.on_complete(h, move || counter.set(counter.get() + 1));

    engine.tick(0.3, 0.3);
    engine.complete(h);

    assert_eq!(stub.position.get(), vec(10.0, 0.0, 0.0));
    assert_eq!(fired.get(), 1);
    assert!(!engine.is_valid(h));

    // The lazy removal pass must not fire completion again.
    engine.tick(1.0, 1.0);
    assert_eq!(fired.get(), 1);
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn stale_handle_on_recycled_slot_is_invalid() {
    let mut engine = Engine::new(Config {
        initial_slots: 1,
        active_capacity: 4,
    });
    let stub = StubTransform::new();

    let a = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(1.0, 0.0, 0.0),
        0.0,
        Space::World,
    );
    // Zero duration: completes and recycles on the first tick.
    engine.tick(0.01, 0.01);
    assert!(!engine.is_valid(a));

    let b = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(2.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    assert!(engine.is_valid(b));
    assert!(!engine.is_valid(a));
    assert_ne!(a.id(), b.id());
}

#[test]
fn zero_duration_completes_immediately_with_terminal_value() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let fired = Rc::new(Cell::new(false));
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(7.0, 0.0, 0.0),
        0.0,
        Space::World,
    );
    let flag = fired.clone();
    engine.on_complete(h, move || flag.set(true));

    engine.tick(0.001, 0.001);
    assert_eq!(stub.position.get(), vec(7.0, 0.0, 0.0));
    assert!(fired.get());
}

#[test]
fn destroyed_target_yields_invalid_handle() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    stub.alive.set(false);

    let h = engine.move_to(stub.clone(), vec(1.0, 0.0, 0.0), 1.0, Space::World);
    assert_eq!(h, TweenHandle::invalid());
    assert!(!engine.is_valid(h));
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn target_loss_mid_run_removes_without_callbacks() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let fired = Rc::new(Cell::new(false));
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    let flag = fired.clone();
    engine.on_complete(h, move || flag.set(true));

    engine.tick(0.25, 0.25);
    stub.alive.set(false);
    engine.tick(0.25, 0.25);

    assert!(!engine.is_valid(h));
    assert!(!fired.get());
    assert_eq!(engine.active_count(), 0);
}

#[test]
fn update_callbacks_are_multicast_in_registration_order() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let log: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(1.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    let first = log.clone();
    engine.on_update(h, move |_| first.borrow_mut().push(1));
    let second = log.clone();
    engine.on_update(h, move |_| second.borrow_mut().push(2));

    engine.tick(0.5, 0.5);
    assert_eq!(*log.borrow(), vec![1, 2]);
}

#[test]
fn update_callback_reports_progress_for_targeted_tweens() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let seen = Rc::new(Cell::new(-1.0f32));
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    let slot = seen.clone();
    engine.on_update(h, move |p| slot.set(p));

    engine.tick(0.25, 0.25);
    assert_relative_eq!(seen.get(), 0.25, epsilon = 1e-5);
}

#[test]
fn scalar_tween_delivers_value_to_setter_and_update() {
    let mut engine = Engine::default();
    let setter_values: Rc<RefCell<Vec<f32>>> = Rc::new(RefCell::new(Vec::new()));
    let update_values: Rc<RefCell<Vec<f32>>> = Rc::new(RefCell::new(Vec::new()));

    let sink = setter_values.clone();
    let h = engine.tween_float(5.0, 10.0, 1.0, move |v| sink.borrow_mut().push(v));
    let sink = update_values.clone();
    engine.on_update(h, move |v| sink.borrow_mut().push(v));

    engine.tick(0.5, 0.5);
    assert_relative_eq!(setter_values.borrow()[0], 7.5, epsilon = 1e-5);
    assert_relative_eq!(update_values.borrow()[0], 7.5, epsilon = 1e-5);

    engine.tick(0.5, 0.5);
    assert_relative_eq!(*setter_values.borrow().last().unwrap(), 10.0);
}

#[test]
fn panicking_update_callback_terminates_the_tween() {
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));

    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let fired = Rc::new(Cell::new(false));
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    engine.on_update(h, |_| panic!("callback bug"));
    let flag = fired.clone();
    engine.on_complete(h, move || flag.set(true));

    engine.tick(0.25, 0.25);
    std::panic::set_hook(prev);

    assert!(!engine.is_valid(h));
    assert!(!fired.get());
    let writes = stub.writes.get();
    engine.tick(0.25, 0.25);
    assert_eq!(stub.writes.get(), writes);
}

#[test]
fn punch_returns_exactly_to_origin() {
    let mut engine = Engine::default();
    let stub = StubTransform::at(vec(3.0, 3.0, 3.0));
    engine.punch_position(stub.clone(), vec(1.0, 0.0, 0.0), 3, 1.0, Space::World);

    engine.tick(0.3, 0.3);
    engine.tick(0.8, 0.8);
    assert_eq!(stub.position.get(), vec(3.0, 3.0, 3.0));
}

#[test]
fn punch_scale_oscillates_around_captured_scale() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    stub.scale.set(vec(2.0, 2.0, 2.0));
    engine.punch_scale(stub.clone(), vec(0.5, 0.5, 0.5), 3, 1.0);

    engine.tick(0.1, 0.1);
    assert_ne!(stub.scale.get(), vec(2.0, 2.0, 2.0));

    engine.tick(1.0, 1.0);
    assert_eq!(stub.scale.get(), vec(2.0, 2.0, 2.0));
}

#[test]
fn jump_arcs_above_the_straight_line() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    engine.jump_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        2.0,
        1,
        1.0,
        Space::World,
    );

    engine.tick(0.5, 0.5);
    // Top of a single arc: straight-line y is 0, offset is the height.
    assert_relative_eq!(stub.position.get().y, 2.0, epsilon = 1e-4);

    engine.tick(0.5, 0.5);
    assert_eq!(stub.position.get(), vec(10.0, 0.0, 0.0));
}

#[test]
fn rotate_to_slerps_and_lands_exactly() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let end = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
    engine.rotate_to(stub.clone(), end, 1.0, Space::World);

    engine.tick(0.5, 0.5);
    assert_relative_eq!(stub.rotation.get().angle(), FRAC_PI_4, epsilon = 1e-4);

    engine.tick(0.5, 0.5);
    assert_relative_eq!(stub.rotation.get().angle(), FRAC_PI_2, epsilon = 1e-4);
}

#[test]
fn rotate_between_uses_the_explicit_start() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    // The target's own orientation must not matter.
    stub.rotation
        .set(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 1.0));
    let from = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4);
    let to = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
    engine.rotate_between(stub.clone(), from, to, 1.0, Space::World);

    engine.tick(0.5, 0.5);
    assert_relative_eq!(
        stub.rotation.get().angle(),
        (FRAC_PI_4 + FRAC_PI_2) / 2.0,
        epsilon = 1e-4
    );

    engine.tick(0.5, 0.5);
    assert_relative_eq!(stub.rotation.get().angle(), FRAC_PI_2, epsilon = 1e-4);
}

#[test]
fn rotate_by_interpolates_euler_components() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    stub.euler.set(vec(10.0, 20.0, 30.0));
    engine.rotate_by(stub.clone(), vec(0.0, 90.0, 0.0), 1.0);

    engine.tick(0.5, 0.5);
    assert_relative_eq!(stub.euler.get().y, 65.0, epsilon = 1e-4);

    engine.tick(0.5, 0.5);
    assert_relative_eq!(stub.euler.get().y, 110.0, epsilon = 1e-4);
    assert_relative_eq!(stub.euler.get().x, 10.0, epsilon = 1e-4);
}

#[test]
fn local_space_uses_local_accessors() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(4.0, 0.0, 0.0),
        1.0,
        Space::Local,
    );

    engine.tick(1.0, 1.0);
    assert_eq!(stub.local_position.get(), vec(4.0, 0.0, 0.0));
    assert_eq!(stub.position.get(), Vector3::zeros());
}

#[test]
fn ignore_time_scale_uses_the_unscaled_clock() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(10.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    engine.set_ignore_time_scale(h, true);

    // Scaled clock is frozen; the tween follows wall time.
    engine.tick(0.0, 0.5);
    assert_relative_eq!(stub.position.get().x, 5.0, epsilon = 1e-5);
}

#[test]
fn kill_all_empties_the_registry_silently() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let fired = Rc::new(Cell::new(false));
    let a = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(1.0, 0.0, 0.0),
        1.0,
        Space::World,
    );
    let b = engine.tween_float(0.0, 1.0, 1.0, |_| {});
    let flag = fired.clone();
    engine.on_complete(a, move || flag.set(true));

    engine.kill_all();
    assert_eq!(engine.active_count(), 0);
    assert!(!engine.is_valid(a));
    assert!(!engine.is_valid(b));
    assert!(!fired.get());
}

#[test]
fn mutators_are_noops_on_stale_handles() {
    let mut engine = Engine::default();
    let stub = StubTransform::new();
    let h = engine.move_between(
        stub.clone(),
        Vector3::zeros(),
        vec(1.0, 0.0, 0.0),
        0.0,
        Space::World,
    );
    engine.tick(0.01, 0.01);
    assert!(!engine.is_valid(h));

    // None of these may panic or resurrect the tween.
    engine.set_delay(h, 5.0);
    engine.set_loops(h, 10, LoopType::Yoyo);
    engine.set_speed_based(h);
    engine.on_complete(h, || {});
    engine.kill(h);
    engine.complete(h);
    assert_eq!(engine.delay_of(h), None);
}
