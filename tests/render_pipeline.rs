// tests/render_pipeline.rs
//
// End-to-end renders without any font on disk: text is laid out with the
// fixed-advance fallback and skipped by the raster backend.
//
mod test_support;

use image::Rgba;
use serde_json::json;
use test_support::*;
use tkb_scheduler_server::background::BackgroundSource;
use tkb_scheduler_server::error::TkbError;
use tkb_scheduler_server::generator::GridRenderer;
use tkb_scheduler_server::layout::PALETTE;
use tkb_scheduler_server::schedule_api::RowInput;

fn overlapping_rows() -> RowInput {
    RowInput::Rows(vec![
        row(1, "IT3080", "Mạng máy tính", "Thứ 3, 1-3, D9-101", "1-15"),
        row(2, "IT3090", "Cơ sở dữ liệu", "Thứ 3, 2-4, D5-401", "1-15"),
    ])
}

#[test]
fn one_block_per_course_and_a_hatch_for_the_overlap() {
    let renderer = GridRenderer::new(None);
    let plan = renderer.plan(overlapping_rows(), None).unwrap();

    let mut canvas = RecordingCanvas::default();
    renderer.paint(&plan, &mut canvas);

    assert_eq!(plan.courses.len(), 2);
    assert_eq!(canvas.fills.len(), 2);
    assert_eq!(canvas.strokes.len(), 2);
    assert_eq!(canvas.hatches.len(), 1);
    assert_eq!(canvas.fills[0].1, PALETTE[0]);
    assert_eq!(canvas.fills[1].1, PALETTE[1]);
    assert!(canvas.texts.contains(&"- D5-401".to_string()));
}

#[test]
fn week_filter_drops_only_explicit_misses() {
    let rows = RowInput::Rows(vec![
        row(1, "A", "First half", "Thứ 2, 1-2, A", "1-8"),
        row(2, "B", "Second half", "Thứ 3, 1-2, B", "9-15"),
        row(3, "C", "No weeks", "Thứ 4, 1-2, C", ""),
    ]);

    let plan = GridRenderer::new(None).plan(rows, Some(10)).unwrap();
    let ids: Vec<&str> = plan.courses.iter().map(|(id, _)| id.as_str()).collect();

    assert_eq!(ids, vec!["2", "3"]);
}

#[test]
fn filtered_courses_do_not_conflict() {
    let rows = RowInput::Rows(vec![
        row(1, "A", "A", "Thứ 3, 1-3, X", "1-8"),
        row(2, "B", "B", "Thứ 3, 2-4, Y", "9-15"),
    ]);

    let renderer = GridRenderer::new(None);
    assert_eq!(renderer.plan(rows.clone(), None).unwrap().conflicts.len(), 1);
    assert!(renderer.plan(rows, Some(3)).unwrap().conflicts.is_empty());
}

#[tokio::test]
async fn nothing_parseable_gives_the_bare_background() {
    let rows = RowInput::Rows(vec![json!({"TT": "x"}), row(1, "A", "A", "chưa có lịch", "")]);
    let renderer = GridRenderer::new(None);

    let plan = renderer.plan(rows.clone(), None).unwrap();
    let mut canvas = RecordingCanvas::default();
    renderer.paint(&plan, &mut canvas);
    assert!(canvas.fills.is_empty() && canvas.texts.is_empty() && canvas.hatches.is_empty());

    let png = renderer.render_png(rows, &background(), None).await.unwrap();
    let rendered = image::load_from_memory(&png).unwrap().to_rgba8();
    let original = image::load_from_memory(&background_png()).unwrap().to_rgba8();

    assert_eq!(rendered.dimensions(), (BACKGROUND_WIDTH, BACKGROUND_HEIGHT));
    assert!(rendered == original);
}

#[tokio::test]
async fn conflict_area_is_hatched_in_red() {
    let png = GridRenderer::new(None)
        .render_png(overlapping_rows(), &background(), None)
        .await
        .unwrap();
    let image = image::load_from_memory(&png).unwrap().to_rgba8();

    // Conflict block: day 3, periods 2-3 -> x 897, y 513, 384 x 256.
    // Stripes cross the block where (dx - dy) is -256 + 30k.
    let on_stripe = image.get_pixel(897 + 114, 513 + 100);
    let between = image.get_pixel(897 + 129, 513 + 100);

    assert!(on_stripe[0] > 200 && on_stripe[1] < 60 && on_stripe[2] < 60, "{:?}", on_stripe);
    assert_eq!(*between, PALETTE[1]);

    // Period 1 belongs to the first course only, no hatch there
    assert_eq!(*image.get_pixel(897 + 114, 385 + 64), PALETTE[0]);
    // Outside every block the background is untouched
    assert_eq!(*image.get_pixel(100, 100), Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn same_input_same_pixels() {
    let renderer = GridRenderer::new(None);
    let bg = background();

    let first = renderer.render_png(overlapping_rows(), &bg, None).await.unwrap();
    let second = renderer.render_png(overlapping_rows(), &bg, None).await.unwrap();

    assert!(first == second);
}

#[tokio::test]
async fn data_uri_wraps_the_png() {
    let uri = GridRenderer::new(None)
        .generate_schedule_image(overlapping_rows(), &background(), None)
        .await
        .unwrap();

    assert!(uri.starts_with("data:image/png;base64,"));

    // The data URI is itself a valid background reference
    let source = BackgroundSource::parse(&uri).unwrap();
    let reloaded = GridRenderer::new(None)
        .render_png(RowInput::Rows(vec![]), &source, None)
        .await
        .unwrap();
    let image = image::load_from_memory(&reloaded).unwrap();
    assert_eq!((image.width(), image.height()), (BACKGROUND_WIDTH, BACKGROUND_HEIGHT));
}

#[tokio::test]
async fn missing_background_fails_the_render() {
    let source = BackgroundSource::File("/definitely/not/here/bg.png".into());
    let err = GridRenderer::new(None)
        .render_png(overlapping_rows(), &source, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TkbError::BackgroundRead(_)));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn undecodable_background_fails_the_render() {
    let source = BackgroundSource::Bytes(b"definitely not a png".to_vec());
    let err = GridRenderer::new(None)
        .render_png(overlapping_rows(), &source, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TkbError::BackgroundDecode(_)));
}

#[tokio::test]
async fn background_failure_wins_over_bad_rows() {
    let source = BackgroundSource::File("/definitely/not/here/bg.png".into());
    let err = GridRenderer::new(None)
        .render_png(RowInput::from("not json"), &source, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TkbError::BackgroundRead(_)));
}

#[tokio::test]
async fn invalid_row_text_fails_after_loading() {
    let err = GridRenderer::new(None)
        .render_png(RowInput::from("not json"), &background(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, TkbError::InvalidRows(_)));
}

#[test]
fn background_references() {
    assert_eq!(
        BackgroundSource::parse("https://example.com/bg.png").unwrap(),
        BackgroundSource::Url("https://example.com/bg.png".to_string())
    );
    assert_eq!(
        BackgroundSource::parse("assets/bg.png").unwrap(),
        BackgroundSource::File("assets/bg.png".into())
    );
    assert_eq!(
        BackgroundSource::parse("data:image/png;base64,AAEC").unwrap(),
        BackgroundSource::Bytes(vec![0, 1, 2])
    );
    assert!(BackgroundSource::parse("data:image/png,raw").is_err());
}

#[tokio::test]
async fn synchronous_draw_matches_the_full_render() {
    let renderer = GridRenderer::new(None);
    let decoded = image::load_from_memory(&background_png()).unwrap().to_rgba8();

    let (plan, png) = renderer.draw(decoded, overlapping_rows(), None).unwrap();
    let rendered = renderer.render_png(overlapping_rows(), &background(), None).await.unwrap();

    assert_eq!(plan.conflicts.len(), 1);
    assert!(png == rendered);
}
