// Shared helpers for the integration tests.
#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use std::io::Cursor;
use tkb_scheduler_server::background::BackgroundSource;
use tkb_scheduler_server::canvas::Canvas;
use tkb_scheduler_server::layout::{Rect, TextLine};

pub const BACKGROUND_WIDTH: u32 = 2100;
pub const BACKGROUND_HEIGHT: u32 = 1200;

/// Plain white PNG holding days 2-5 and periods 1-6 of the grid.
pub fn background_png() -> Vec<u8> {
    let image = RgbaImage::from_pixel(BACKGROUND_WIDTH, BACKGROUND_HEIGHT, Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode background");
    bytes
}

pub fn background() -> BackgroundSource {
    BackgroundSource::Bytes(background_png())
}

/// Row in the registration page dialect.
pub fn row(tt: i64, code: &str, name: &str, schedule: &str, weeks: &str) -> Value {
    json!({
        "TT": tt,
        "Mã lớp học phần": code,
        "Tên lớp học phần": name,
        "Giảng viên": "Nguyễn Văn A",
        "Thời khóa biểu": schedule,
        "Tuần học": weeks,
    })
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub fills: Vec<(Rect, Rgba<u8>)>,
    pub strokes: Vec<Rect>,
    pub texts: Vec<String>,
    pub hatches: Vec<Rect>,
}

impl Canvas for RecordingCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        self.fills.push((rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, _color: Rgba<u8>, _width: f32) {
        self.strokes.push(rect);
    }

    fn fill_text(&mut self, line: &TextLine, _color: Rgba<u8>) {
        self.texts.push(line.text.clone());
    }

    fn hatch(&mut self, rect: Rect, _color: Rgba<u8>, _spacing: f32, _line_width: f32) {
        self.hatches.push(rect);
    }
}
