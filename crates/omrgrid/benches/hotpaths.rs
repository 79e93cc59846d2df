use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::GrayImage;
use omrgrid::{
    bubble_fill_ratio, mark_bbox, render_bubble_sheet, BubbleRegistry, FillConfig, ScanConfig,
    Scanner, SheetLayout, SheetLayoutSpec, SheetMetadata,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Rendered blank sheet with roughly one bubble per question painted dark,
/// plus salt noise over the whole page.
fn make_scan_fixture(question_count: usize, seed: u64) -> (SheetLayout, GrayImage) {
    let layout = SheetLayout::generate(&SheetLayoutSpec::with_questions(question_count))
        .expect("default geometry should lay out");
    let mut page = render_bubble_sheet(&layout);
    let mut rng = StdRng::seed_from_u64(seed);

    let k = layout.spec.options_per_question;
    for group in layout.bubbles.chunks(k) {
        if rng.gen_bool(0.8) {
            let pick = &group[rng.gen_range(0..group.len())];
            mark_bbox(&mut page, &pick.bbox, rng.gen_range(0..60));
        }
    }
    let (w, h) = page.dimensions();
    for _ in 0..(w * h / 200) {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        page.put_pixel(x, y, image::Luma([rng.gen_range(0..=255)]));
    }
    (layout, page)
}

fn bench_fill_ratio(c: &mut Criterion) {
    let (layout, page) = make_scan_fixture(60, 11);
    let cfg = FillConfig::default();

    c.bench_function("fill_ratio_240_bubbles", |b| {
        b.iter(|| {
            let total: f32 = layout
                .bubbles
                .iter()
                .map(|bubble| bubble_fill_ratio(black_box(&page), &bubble.bbox, &cfg))
                .sum();
            black_box(total)
        })
    });
}

fn bench_scan_sheet(c: &mut Criterion) {
    let scanner = Scanner::new(ScanConfig::default()).expect("default config is valid");
    let (layout_60, page_60) = make_scan_fixture(60, 3);
    let registry_60 = layout_60.registry();

    c.bench_function("scan_sheet_60q", |b| {
        b.iter(|| {
            let scan = scanner
                .scan(black_box(&page_60), &registry_60, SheetMetadata::new())
                .expect("fixture scan should succeed");
            black_box(scan.output.answers.len())
        })
    });

    let highlight_scanner = Scanner::new(ScanConfig {
        collect_highlights: true,
        ..ScanConfig::default()
    })
    .expect("config is valid");
    c.bench_function("scan_sheet_60q_highlights", |b| {
        b.iter(|| {
            let scan = highlight_scanner
                .scan(black_box(&page_60), &registry_60, SheetMetadata::new())
                .expect("fixture scan should succeed");
            black_box(scan.highlights.len())
        })
    });
}

fn bench_registry_load(c: &mut Criterion) {
    let (layout, _) = make_scan_fixture(60, 5);
    let json = layout.registry().to_json().expect("serialize registry");

    c.bench_function("registry_parse_240_bubbles", |b| {
        b.iter(|| {
            let registry =
                BubbleRegistry::from_json_str(black_box(&json)).expect("registry should parse");
            black_box(registry.question_count())
        })
    });
}

criterion_group!(
    hotpaths,
    bench_fill_ratio,
    bench_scan_sheet,
    bench_registry_load
);
criterion_main!(hotpaths);
