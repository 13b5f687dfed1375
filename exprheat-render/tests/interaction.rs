use exprheat_core::{ContainerSize, GeneExpressionData, LayoutConfig, Setting};
use exprheat_render::{
    hit_test_cells, HeatmapView, InteractionState, LegendConfig, Marker, PointerEvent,
    PointerTarget, ViewConfig, ViewStatus,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

const DATA: &str = r#"{
    "samples": [
        {"id": "A", "attributes": {"Sex": "Male"}},
        {"id": "B", "attributes": {"Sex": "Female"}},
        {"id": "C", "attributes": {"Sex": "Male"}},
        {"id": "D", "attributes": {"Sex": "Female"}}
    ],
    "genes": [
        {"name": "ENSG1", "displayName": "TP53", "expressions": [-2, 0, 2, 5]},
        {"name": "ENSG2", "expressions": [1, 2, null, 4]},
        {"name": "ENSG3", "expressions": [-1, -2, -3, -4]}
    ],
    "metadata": {}
}"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn view_with(setting: &str) -> HeatmapView {
    init_logging();
    let data = GeneExpressionData::from_json_str(DATA).unwrap();
    let setting = Setting::from_json_str(setting).unwrap();
    let mut view = HeatmapView::new(data, setting, ViewConfig::default());
    view.resize(ContainerSize::new(1000.0, 1000.0, 800.0));
    view
}

#[test]
fn hit_test_resolves_column_and_row() {
    let cell = hit_test_cells(20.0, 30.0, 4, 3, 30.0, 75.0).unwrap();
    assert_eq!(cell.sample_column, 1);
    assert_eq!(cell.gene_row, 2);
}

#[test]
fn hover_tooltip_names_gene_sample_and_annotations() {
    let mut view = view_with(r#"{"additionalAnnotations": ["Sex"]}"#);
    let layout = *view.context().unwrap().layout();
    let now = Instant::now();

    // Columns: B, D (Female), A, C (Male); hover D on the TP53 row
    view.handle_pointer(
        PointerEvent::Move {
            target: PointerTarget::Canvas,
            x: layout.cell_width * 1.2,
            y: layout.cell_height * 0.4,
        },
        now,
    );
    let tooltip = view.tooltip().expect("tooltip");
    assert_eq!(
        tooltip.lines,
        vec!["Gene: TP53 (ENSG1)", "Sample: D", "Sex: Female", "Expression: 5.0000"]
    );

    // Missing value reads N/A; ENSG2 has null for C
    view.handle_pointer(
        PointerEvent::Move {
            target: PointerTarget::Canvas,
            x: layout.cell_width * 3.5,
            y: layout.cell_height * 1.5,
        },
        now,
    );
    assert_eq!(view.tooltip().unwrap().lines.last().unwrap(), "Expression: N/A");

    // Outside the grid clears everything
    view.handle_pointer(
        PointerEvent::Move { target: PointerTarget::Canvas, x: -3.0, y: 10.0 },
        now,
    );
    assert!(view.tooltip().is_none());
    assert_eq!(view.state(), InteractionState::Idle);
}

#[test]
fn rapid_drags_coalesce_into_one_callback() {
    let mut view = view_with("{}");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    view.set_range_callback(move |min, max| sink.borrow_mut().push((min, max)));

    let t0 = Instant::now();
    let track = view.slider().track_height();
    view.handle_pointer(PointerEvent::Down { target: PointerTarget::SliderTrack, x: 0.0, y: track }, t0);
    assert_eq!(view.state(), InteractionState::DraggingSlider(Marker::Bottom));

    let mut at = t0;
    for step in 1..=10 {
        at = t0 + Duration::from_millis(10 * step);
        view.handle_pointer(
            PointerEvent::Move { target: PointerTarget::SliderTrack, x: 0.0, y: track - step as f64 * 5.0 },
            at,
        );
        assert!(view.poll(at).is_none());
    }
    view.handle_pointer(PointerEvent::Up, at);

    assert!(view.poll(at + Duration::from_millis(99)).is_none());
    let (min, max) = view.poll(at + Duration::from_millis(100)).unwrap();
    assert_eq!(seen.borrow().as_slice(), &[(min, max)]);
    assert!(min < 0.0 && min > -view.slider().bound());
    assert_eq!(max, view.slider().bound());
}

#[test]
fn text_commit_updates_scale_and_reports() {
    let mut view = view_with(r#"{"maxValue": 1.0}"#);
    let now = Instant::now();
    assert_eq!(view.slider().top(), 1.0);

    assert!(view.commit_text(Marker::Top, "0.333", now));
    assert_eq!(view.slider().top(), 0.33);
    assert_eq!(view.context().unwrap().scale().top(), 0.33);
    assert!(!view.commit_text(Marker::Bottom, "   ", now));

    let (_, max) = view.poll(now + Duration::from_millis(100)).unwrap();
    assert_eq!(max, 0.33);
}

#[test]
fn hiding_every_category_shows_no_data() {
    let mut view = view_with(r#"{"additionalAnnotations": ["Sex"]}"#);
    view.set_visibility("Sex:Male", false);
    assert_eq!(view.context().unwrap().sample_count(), 2);
    view.set_visibility("Sex:Female", false);
    assert_eq!(view.status(), ViewStatus::NoData { genes: 3, samples: 0 });

    // the legend still lists both categories so they can be re-enabled
    let rows: Vec<String> = view.legend().rows().map(|r| r.key()).collect();
    assert_eq!(rows, vec!["Sex:Female", "Sex:Male"]);
    view.toggle_visibility("Sex:Male");
    assert_eq!(view.status(), ViewStatus::Ready);
}

#[test]
fn collapse_keeps_previous_layout() {
    let mut view = view_with("{}");
    let cfg = LayoutConfig::default();
    let before = *view.context().unwrap().layout();
    view.resize(ContainerSize::new(1000.0, 1000.0, cfg.chrome_height));
    assert_eq!(view.context().unwrap().layout(), &before);
}

#[test]
fn setting_change_without_room_drops_the_stale_frame() {
    // 200px leaves 12px of cells without annotation bars, none with one bar
    let mut view = view_with("{}");
    assert_eq!(view.resize(ContainerSize::new(1000.0, 1000.0, 200.0)), ViewStatus::Ready);
    assert_eq!(view.context().unwrap().sample_count(), 4);

    view.set_setting(
        Setting::from_json_str(
            r#"{"samples": {"included": ["A"]}, "additionalAnnotations": ["Sex"], "maxValue": 0.5}"#,
        )
        .unwrap(),
    );
    assert_eq!(view.status(), ViewStatus::Pending);
    assert!(view.context().is_none());
    assert!(view.tooltip().is_none());
    assert_eq!(view.slider().top(), 0.5);
    assert_eq!(view.legend().groups().len(), 1);

    // hovering the empty canvas does nothing
    let repaint = view.handle_pointer(
        PointerEvent::Move { target: PointerTarget::Canvas, x: 5.0, y: 5.0 },
        Instant::now(),
    );
    assert!(repaint.is_empty());
    assert_eq!(view.state(), InteractionState::Idle);

    assert_eq!(view.resize(ContainerSize::new(1000.0, 1000.0, 800.0)), ViewStatus::Ready);
    let ctx = view.context().unwrap();
    assert_eq!(ctx.sample_count(), 1);
    assert_eq!(ctx.sample_record(0).unwrap().id, "A");
    assert_eq!(ctx.annotations().len(), 1);
    assert_eq!(ctx.scale().top(), 0.5);
}

#[test]
fn visibility_change_without_room_drops_the_stale_frame() {
    let mut view = view_with(r#"{"additionalAnnotations": ["Sex"]}"#);
    // 210px leaves 7px of cells under one annotation bar
    assert_eq!(view.resize(ContainerSize::new(1000.0, 1000.0, 210.0)), ViewStatus::Ready);
    view.set_setting(
        Setting::from_json_str(r#"{"additionalAnnotations": ["Sex", "Batch"]}"#).unwrap(),
    );
    assert_eq!(view.status(), ViewStatus::Pending);

    view.set_visibility("Sex:Male", false);
    assert_eq!(view.status(), ViewStatus::Pending);
    assert!(view.context().is_none());

    assert_eq!(view.resize(ContainerSize::new(1000.0, 1000.0, 800.0)), ViewStatus::Ready);
    assert_eq!(view.context().unwrap().sample_count(), 2);
}

#[test]
fn new_setting_reruns_pipeline_and_resets_scale() {
    let mut view = view_with("{}");
    assert_eq!(view.slider().bound(), 3.0);
    assert_eq!(view.slider().top(), 3.0);

    view.set_setting(
        Setting::from_json_str(
            r#"{"samples": {"excluded": ["B"]}, "genes": {"included": ["ENSG3", "ENSG1"]},
                "minValue": -1.25, "maxValue": 9.0}"#,
        )
        .unwrap(),
    );
    assert_eq!(view.status(), ViewStatus::Ready);
    let ctx = view.context().unwrap();
    let ids: Vec<&str> = ctx.samples().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C", "D"]);
    assert_eq!(ctx.gene_count(), 2);
    // 9.0 clamps to the bound
    assert_eq!(view.slider().top(), 3.0);
    assert_eq!(view.slider().bottom(), -1.25);
    assert_eq!(ctx.scale().bottom(), -1.25);
}

#[test]
fn new_data_rederives_the_bound() {
    let mut view = view_with(r#"{"additionalAnnotations": ["Sex"]}"#);
    let data = GeneExpressionData::from_json_str(
        r#"{
            "samples": [
                {"id": "X", "attributes": {"Sex": "Male"}},
                {"id": "Y", "attributes": {"Sex": "Male"}}
            ],
            "genes": [{"name": "ENSG9", "expressions": [-1, 2]}]
        }"#,
    )
    .unwrap();
    view.set_data(data);

    assert_eq!(view.status(), ViewStatus::Ready);
    assert_eq!(view.slider().bound(), 0.75);
    assert_eq!(view.slider().top(), 0.75);
    assert_eq!(view.slider().bottom(), -0.75);
    let ctx = view.context().unwrap();
    assert_eq!((ctx.gene_count(), ctx.sample_count()), (1, 2));
    assert_eq!(ctx.scale().bound(), 0.75);
    let rows: Vec<String> = view.legend().rows().map(|r| r.key()).collect();
    assert_eq!(rows, vec!["Sex:Male"]);
}

#[test]
fn pending_range_change_is_delivered_before_a_new_setting() {
    let mut view = view_with("{}");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    view.set_range_callback(move |min, max| sink.borrow_mut().push((min, max)));

    let now = Instant::now();
    assert!(view.commit_text(Marker::Top, "1.5", now));
    view.set_setting(Setting::default());

    assert_eq!(seen.borrow().as_slice(), &[(-3.0, 1.5)]);
    assert!(!view.has_pending_range_change());
    assert_eq!(view.slider().top(), 3.0);
    assert!(view.poll(now + Duration::from_secs(1)).is_none());
}

#[test]
fn legend_click_requests_full_repaint() {
    let mut view = view_with(r#"{"additionalAnnotations": ["Sex"]}"#);
    let cfg = LegendConfig::default();
    let male_y = cfg.group_title_height + cfg.row_height + 1.0;

    let repaint = view.handle_pointer(
        PointerEvent::Down { target: PointerTarget::Legend, x: 4.0, y: male_y },
        Instant::now(),
    );
    assert!(repaint.full);
    assert_eq!(view.context().unwrap().sample_count(), 2);
}
