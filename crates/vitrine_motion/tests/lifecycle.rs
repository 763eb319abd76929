//! End-to-end checks of the motion layer against an in-memory page

use std::cell::RefCell;
use std::rc::Rc;

use vitrine_core::{
    EventKind, HostEvent, NodeSpec, Property, PropertyValue, Rect, SceneSurface, Selector, Surface, Viewport,
};
use vitrine_motion::{
    scroll_progress, DeviceTier, EffectId, GovernorLevel, MotionConfig, MotionState, Orchestrator, ScrollTracker,
    Threshold, TriggerConfig, TriggerKind,
};

type Page = Rc<RefCell<SceneSurface>>;

/// Hero, three service cards, a stats row and a footer
fn page(width: f32) -> Page {
    let mut scene = SceneSurface::new(Viewport::new(width, 800.0, 800.0));
    scene.insert_element(NodeSpec::new("div").id("scroll-progress").bounds(Rect::new(0.0, 0.0, width, 4.0)));
    scene.insert_element(NodeSpec::new("section").id("hero").bounds(Rect::new(0.0, 0.0, width, 800.0)));
    scene.insert_element(NodeSpec::new("h1").bounds(Rect::new(40.0, 200.0, 800.0, 80.0)));
    scene.insert_element(NodeSpec::new("p").bounds(Rect::new(40.0, 300.0, 800.0, 60.0)));
    scene.insert_element(
        NodeSpec::new("a")
            .class("cta-button")
            .bounds(Rect::new(40.0, 400.0, 200.0, 50.0)),
    );
    scene.insert_element(NodeSpec::new("section").id("services").bounds(Rect::new(0.0, 800.0, width, 1000.0)));
    for i in 0..3 {
        scene.insert_element(
            NodeSpec::new("div")
                .class("service-card")
                .bounds(Rect::new(40.0 + i as f32 * 400.0, 1000.0, 380.0, 300.0)),
        );
    }
    scene.insert_element(
        NodeSpec::new("span")
            .attr("data-count", "120")
            .bounds(Rect::new(40.0, 1600.0, 200.0, 60.0)),
    );
    scene.insert_element(NodeSpec::new("footer").bounds(Rect::new(0.0, 3600.0, width, 400.0)));
    Rc::new(RefCell::new(scene))
}

fn orchestrator(page: &Page) -> Orchestrator {
    Orchestrator::new(Box::new(Rc::clone(page)), MotionConfig::default())
}

/// Scroll the page and run one frame
fn scroll(motion: &mut Orchestrator, page: &Page, y: f32, now: f64) {
    let scroll_y = page.borrow_mut().scroll_to(y);
    motion.handle_event(&HostEvent::Scroll { scroll_y }, now);
    motion.frame(now);
}

fn opacity(page: &Page, class: &str) -> Vec<f32> {
    let page = page.borrow();
    page.query(&Selector::class(class))
        .into_iter()
        .filter_map(|n| page.property(n, Property::Opacity).and_then(|v| v.as_float()))
        .collect()
}

#[test]
fn test_device_tiers_follow_width() {
    for (width, tier, budget) in [
        (500.0, DeviceTier::Mobile, 15),
        (900.0, DeviceTier::Tablet, 25),
        (1440.0, DeviceTier::Desktop, 30),
    ] {
        let page = page(width);
        let mut motion = orchestrator(&page);
        motion.start(0.0);
        assert_eq!(motion.profile().tier, tier);
        assert_eq!(motion.particle_budget(), budget);
    }
}

#[test]
fn test_progress_is_zero_when_page_cannot_scroll() {
    let viewport = Viewport::new(1280.0, 800.0, 600.0);
    assert_eq!(scroll_progress(&viewport), 0.0);

    let page = Rc::new(RefCell::new(SceneSurface::new(Viewport::new(1280.0, 800.0, 800.0))));
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    motion.handle_event(&HostEvent::Scroll { scroll_y: 0.0 }, 16.0);
    motion.frame(16.0);
    assert_eq!(motion.scroll_progress().get(), 0.0);
}

#[test]
fn test_progress_tracks_scroll() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    let progress = motion.scroll_progress();

    scroll(&mut motion, &page, 1600.0, 16.0);
    assert_eq!(progress.get(), 0.5);
}

#[test]
fn test_teardown_releases_everything_and_is_idempotent() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    {
        let scene = page.borrow();
        assert!(scene.layer_node_count() > 0);
        assert_eq!(scene.canvas_count(), 1);
        assert_eq!(scene.listener_count(), EventKind::ALL.len());
    }

    motion.stop();
    motion.stop();
    assert_eq!(motion.state(), MotionState::TornDown);

    let scene = page.borrow();
    assert_eq!(scene.layer_node_count(), 0);
    assert_eq!(scene.canvas_count(), 0);
    assert_eq!(scene.listener_count(), 0);
    // Page styles are back to untouched
    assert!(opacity(&page, "service-card").is_empty());
}

#[test]
fn test_restart_creates_one_set_of_resources() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    let nodes = page.borrow().layer_node_count();

    motion.stop();
    motion.start(100.0);
    let scene = page.borrow();
    assert_eq!(scene.layer_nodes_with_class("floating-particles").len(), 1);
    assert_eq!(scene.layer_node_count(), nodes);
    assert_eq!(scene.listeners_of(EventKind::Scroll), 1);
    assert_eq!(scene.canvas_count(), 1);
}

#[test]
fn test_cards_reveal_as_they_scroll_in() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    assert_eq!(opacity(&page, "service-card"), [0.0, 0.0, 0.0]);

    // Card tops at 1000 cross 85% of the viewport (680px) at scroll 320
    let mut now = 16.0;
    scroll(&mut motion, &page, 400.0, now);
    for _ in 0..120 {
        now += 16.0;
        motion.frame(now);
    }
    assert_eq!(opacity(&page, "service-card"), [1.0, 1.0, 1.0]);
}

#[test]
fn test_trigger_fires_once_per_crossing() {
    let page = page(1280.0);
    let stat = page.borrow().query(&Selector::attribute("data-count"))[0];
    let threshold: Threshold = "top 80%".parse().unwrap();
    let mut tracker = ScrollTracker::new();
    tracker.register(TriggerConfig::new(stat, EffectId(0), threshold));

    let mut kinds = Vec::new();
    for y in [0.0, 500.0, 1000.0, 1100.0, 1700.0, 1800.0, 1500.0, 1400.0] {
        page.borrow_mut().scroll_to(y);
        let scene = page.borrow();
        kinds.extend(tracker.evaluate(&*scene).into_iter().map(|e| e.kind));
    }
    // Top at 1600 crosses 640px at scroll 960; the bottom leaves at 1660
    assert_eq!(kinds, [TriggerKind::Enter, TriggerKind::Leave, TriggerKind::EnterBack]);
}

#[test]
fn test_count_up_lands_on_target() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    let stat = page.borrow().query(&Selector::attribute("data-count"))[0];

    let mut now = 16.0;
    scroll(&mut motion, &page, 1200.0, now);
    for _ in 0..200 {
        now += 16.0;
        motion.frame(now);
    }
    assert_eq!(
        page.borrow().property(stat, Property::Counter),
        Some(PropertyValue::Float(120.0))
    );
}

/// Run `count` frames `dt` apart, returning the last timestamp
fn run_frames(motion: &mut Orchestrator, mut now: f64, count: usize, dt: f64) -> f64 {
    for _ in 0..count {
        now += dt;
        motion.frame(now);
    }
    now
}

#[test]
fn test_governor_degrades_and_restores() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    assert_eq!(motion.particle_budget(), 30);

    // The first frame opens the sampling window
    let mut now = run_frames(&mut motion, 0.0, 1, 50.0);

    // Three windows at 20 fps; the level holds once degraded
    for _ in 0..3 {
        now = run_frames(&mut motion, now, 20, 50.0);
        assert_eq!(motion.governor_level(), GovernorLevel::Degraded);
        assert_eq!(motion.particle_budget(), 15);
        assert_eq!(motion.time_scale(), 0.7);
    }

    // 63 frames at 16ms close one window at 63 fps
    for _ in 0..2 {
        now = run_frames(&mut motion, now, 63, 16.0);
        assert_eq!(motion.governor_level(), GovernorLevel::Normal);
        assert_eq!(motion.particle_budget(), 30);
        assert_eq!(motion.time_scale(), 1.0);
    }
}

#[test]
fn test_governor_scales_the_mobile_budget() {
    let page = page(500.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    assert_eq!(motion.profile().tier, DeviceTier::Mobile);
    assert_eq!(motion.particle_budget(), 15);

    let now = run_frames(&mut motion, 0.0, 21, 50.0);
    assert_eq!(motion.governor_level(), GovernorLevel::Degraded);
    assert_eq!(motion.particle_budget(), 7);
    assert_eq!(motion.time_scale(), 0.7);

    run_frames(&mut motion, now, 63, 16.0);
    assert_eq!(motion.governor_level(), GovernorLevel::Normal);
    assert_eq!(motion.particle_budget(), 15);
    assert_eq!(motion.time_scale(), 0.8);
}

#[test]
fn test_reduced_motion_starts_no_loops() {
    let page = page(1280.0);
    page.borrow_mut().set_reduced_motion(true);
    let mut motion = orchestrator(&page);
    motion.start(0.0);

    assert_eq!(motion.time_scale(), 0.0);
    assert_eq!(motion.particle_budget(), 0);
    assert_eq!(motion.context().scheduler.looping_count(), 0);
    assert!(!motion.context().scheduler.has_active_tweens());
    assert_eq!(page.borrow().layer_node_count(), 0);
    // Content is shown in its final state
    assert_eq!(opacity(&page, "service-card"), [1.0, 1.0, 1.0]);
}

#[test]
fn test_reduced_motion_switch_settles_page() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    assert!(motion.context().scheduler.looping_count() > 0);

    page.borrow_mut().set_reduced_motion(true);
    motion.frame(16.0);
    assert_eq!(motion.context().scheduler.looping_count(), 0);
    assert_eq!(page.borrow().layer_node_count(), 0);
    assert_eq!(page.borrow().listener_count(), EventKind::ALL.len());
}

#[test]
fn test_resize_reprofiles_after_settling() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);

    page.borrow_mut().resize(600.0, 800.0);
    motion.handle_event(&HostEvent::Resize { width: 600.0, height: 800.0 }, 10.0);
    motion.frame(50.0);
    assert_eq!(motion.profile().tier, DeviceTier::Desktop);

    motion.frame(120.0);
    assert_eq!(motion.profile().tier, DeviceTier::Mobile);
    assert_eq!(motion.particle_budget(), 15);
    // Desktop-only effects step aside
    assert!(page.borrow().layer_nodes_with_class("custom-cursor").is_empty());
}

#[test]
fn test_widening_to_desktop_scrubs_from_current_scroll() {
    let page = page(600.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    assert_eq!(motion.profile().tier, DeviceTier::Mobile);
    scroll(&mut motion, &page, 500.0, 16.0);
    let card = page.borrow().query(&Selector::class("service-card"))[0];
    assert_eq!(page.borrow().property(card, Property::YPercent), None);

    // No further scrolling after the resize
    page.borrow_mut().resize(1280.0, 800.0);
    motion.handle_event(&HostEvent::Resize { width: 1280.0, height: 800.0 }, 20.0);
    run_frames(&mut motion, 20.0, 30, 16.0);

    assert_eq!(motion.profile().tier, DeviceTier::Desktop);
    assert!(page.borrow().property(card, Property::YPercent).is_some());
}

#[test]
fn test_stale_frame_token_is_ignored() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    let stale = motion.frame_token().unwrap();

    motion.stop();
    motion.start(10.0);
    let presented = page.borrow().frames_presented();
    assert!(!motion.frame_with(stale, 20.0));
    assert_eq!(page.borrow().frames_presented(), presented);

    let current = motion.frame_token().unwrap();
    assert!(motion.frame_with(current, 30.0));
    assert_eq!(page.borrow().frames_presented(), presented + 1);
}

#[test]
fn test_overwrite_keeps_one_tween_per_property() {
    let page = page(1280.0);
    let mut motion = orchestrator(&page);
    motion.start(0.0);
    let card = page.borrow().query(&Selector::class("service-card"))[0];

    // Enter, leave upward and enter again in quick succession
    scroll(&mut motion, &page, 400.0, 16.0);
    let tweens = motion.context().scheduler.tween_count();
    scroll(&mut motion, &page, 0.0, 32.0);
    scroll(&mut motion, &page, 400.0, 48.0);
    assert!(motion.context().scheduler.is_animating(card, Property::Opacity));
    assert_eq!(motion.context().scheduler.tween_count(), tweens);

    let mut now = 48.0;
    for _ in 0..120 {
        now += 16.0;
        motion.frame(now);
    }
    assert_eq!(opacity(&page, "service-card"), [1.0, 1.0, 1.0]);
}
