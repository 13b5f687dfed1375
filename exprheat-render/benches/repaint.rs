use criterion::{black_box, criterion_group, criterion_main, Criterion};
use exprheat_core::{
    build_context, data_scale_bound, CellCoord, ColorScale, ContainerSize, Gene,
    GeneExpressionData, LayoutConfig, RenderContext, Sample, Setting, VisibilityState,
};
use exprheat_render::{CellRenderer, RenderConfig};
use std::sync::Arc;

fn generate_matrix(genes: usize, samples: usize) -> GeneExpressionData {
    let samples: Vec<Sample> = (0..samples)
        .map(|i| Sample::new(format!("S{}", i)).with_attribute("Group", if i % 3 == 0 { "a" } else { "b" }))
        .collect();
    let n = samples.len();
    let genes = (0..genes)
        .map(|g| {
            let row = (0..n)
                .map(|s| {
                    let v = ((g * 31 + s * 17) % 200) as f64 / 20.0 - 5.0;
                    (s % 97 != 0).then_some(v)
                })
                .collect();
            Gene::new(format!("GENE{}", g), row)
        })
        .collect();
    GeneExpressionData { samples, genes, ..Default::default() }
}

fn context(genes: usize, samples: usize) -> RenderContext {
    let data = Arc::new(generate_matrix(genes, samples));
    let setting = Setting::from_json_str(r#"{"additionalAnnotations": ["Group"]}"#)
        .expect("setting");
    let scale = ColorScale::from_setting(&setting, data_scale_bound(&data));
    build_context(
        &data,
        &setting,
        &VisibilityState::new(),
        scale,
        ContainerSize::new(1600.0, 1600.0, 1200.0),
        &LayoutConfig::default(),
    )
    .expect("layout")
}

fn bench_full_repaint(c: &mut Criterion) {
    let renderer = CellRenderer::new(RenderConfig::default());

    let detailed = context(60, 80);
    let mut canvas = renderer.render(&detailed);
    c.bench_function("repaint_detailed_60x80", |b| {
        b.iter(|| black_box(renderer.paint_full(black_box(&detailed), &mut canvas)))
    });

    let crisp = context(2000, 200);
    let mut canvas = renderer.render(&crisp);
    c.bench_function("repaint_crisp_2000x200", |b| {
        b.iter(|| black_box(renderer.paint_full(black_box(&crisp), &mut canvas)))
    });
}

fn bench_scale_change(c: &mut Criterion) {
    let renderer = CellRenderer::new(RenderConfig::default());
    let ctx = context(2000, 200);
    let mut canvas = renderer.render(&ctx);
    let scale = *ctx.scale();

    c.bench_function("scale_drag_step_2000x200", |b| {
        b.iter(|| {
            let next = ctx.with_color_scale(scale.with_top(scale.top() * 0.5));
            black_box(renderer.paint_full(&next, &mut canvas))
        })
    });
}

fn bench_highlight(c: &mut Criterion) {
    let renderer = CellRenderer::new(RenderConfig::default());
    let mut ctx = context(60, 80);
    let mut canvas = renderer.render(&ctx);
    let mut column = 0;

    c.bench_function("highlight_move_60x80", |b| {
        b.iter(|| {
            column = (column + 1) % 80;
            black_box(renderer.update_highlight(&mut ctx, &mut canvas, Some(CellCoord::new(3, column))))
        })
    });
}

criterion_group!(benches, bench_full_repaint, bench_scale_change, bench_highlight);
criterion_main!(benches);
