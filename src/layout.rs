// ----------------------------------------------------------------------------
// Grid layout for the weekly timetable image.
//
// Everything here is pure: courses and conflicts go in, a list of draw
// commands comes out. The commands are executed against a `Canvas` in
// canvas.rs, which is the only place that touches pixels.
//
// Geometry is tied to the background template: column 0 is day 2, row 0 is
// period 1.
// ----------------------------------------------------------------------------

use crate::compute_conflicts::*;
use crate::schedule_api::*;
use image::Rgba;

pub const GRID_ORIGIN_X: f32 = 513.;
pub const GRID_ORIGIN_Y: f32 = 385.;
pub const CELL_WIDTH: f32 = 384.;
pub const CELL_HEIGHT: f32 = 128.;

pub const FIRST_DAY: i32 = 2;
pub const FIRST_PERIOD: i32 = 1;

pub const MAX_TEXT_WIDTH: f32 = 340.;
pub const TEXT_INSET_X: f32 = 20.;
pub const TEXT_INSET_Y: f32 = 25.;
pub const LINE_PADDING: f32 = 15.;

pub const FONT_SIZE_PX: f32 = 40.;
pub const FONT_FAMILIES: [&str; 3] = ["TableFont", "Arial", "sans-serif"];

pub const BORDER_WIDTH: f32 = 4.;
pub const HATCH_SPACING: f32 = 30.;
pub const HATCH_LINE_WIDTH: f32 = 3.;

pub const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const BORDER_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
// rgba(255, 0, 0, 0.8)
pub const CONFLICT_COLOR: Rgba<u8> = Rgba([255, 0, 0, 204]);

pub const PALETTE: [Rgba<u8>; 20] = [
    Rgba([0xEF, 0x9A, 0x9A, 0xFF]),
    Rgba([0x64, 0xB5, 0xF6, 0xFF]),
    Rgba([0x81, 0xC7, 0x84, 0xFF]),
    Rgba([0xFF, 0xF1, 0x76, 0xFF]),
    Rgba([0xBA, 0x68, 0xC8, 0xFF]),
    Rgba([0xFF, 0xB7, 0x4D, 0xFF]),
    Rgba([0x4D, 0xD0, 0xE1, 0xFF]),
    Rgba([0xAE, 0xD5, 0x81, 0xFF]),
    Rgba([0xFF, 0xAB, 0x91, 0xFF]),
    Rgba([0xBD, 0xBD, 0xBD, 0xFF]),
    Rgba([0xFF, 0xF5, 0x9D, 0xFF]),
    Rgba([0x4D, 0xB6, 0xAC, 0xFF]),
    Rgba([0xF0, 0x62, 0x92, 0xFF]),
    Rgba([0xFF, 0xD5, 0x4F, 0xFF]),
    Rgba([0x38, 0x8E, 0x3C, 0xFF]),
    Rgba([0x19, 0x76, 0xD2, 0xFF]),
    Rgba([0xFF, 0xA7, 0x26, 0xFF]),
    Rgba([0x7E, 0x57, 0xC2, 0xFF]),
    Rgba([0x00, 0xAC, 0xC1, 0xFF]),
    Rgba([0xE5, 0x73, 0x73, 0xFF]),
];

/// Text metrics needed by the word wrapper.
pub trait TextMeasure {
    /// Advance width of `text` in pixels
    fn width(&self, text: &str) -> f32;
    /// Ink height of `text` (ascent + descent of its bounding box)
    fn height(&self, text: &str) -> f32;
}

/// Every character advances by the same amount. Used when no font could be
/// loaded, and handy for predictable layouts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        FixedAdvance {
            advance: FONT_SIZE_PX * 0.5,
            line_height: FONT_SIZE_PX * 0.75,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn height(&self, text: &str) -> f32 {
        if text.trim().is_empty() {
            0.
        } else {
            self.line_height
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Cell block covering `start_period..=end_period` in the column of `day`.
    /// No bounds checks: odd values give odd rectangles.
    pub fn for_slot(day: i32, start_period: i32, end_period: i32) -> Rect {
        Rect {
            x: GRID_ORIGIN_X + (day as f32 - FIRST_DAY as f32) * CELL_WIDTH,
            y: GRID_ORIGIN_Y + (start_period as f32 - FIRST_PERIOD as f32) * CELL_HEIGHT,
            width: CELL_WIDTH,
            height: (end_period as f32 - start_period as f32 + 1.) * CELL_HEIGHT,
        }
    }

    /// Same rectangle with a non-negative width and height.
    pub fn normalized(&self) -> Rect {
        let mut rect = *self;
        if rect.width < 0. {
            rect.x += rect.width;
            rect.width = -rect.width;
        }
        if rect.height < 0. {
            rect.y += rect.height;
            rect.height = -rect.height;
        }
        rect
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Filled block with a border stroked on top
    BorderedRect {
        rect: Rect,
        fill: Rgba<u8>,
        border: Rgba<u8>,
        border_width: f32,
    },
    /// Lines already wrapped and positioned; `y` is the top of each line
    TextBlock {
        lines: Vec<TextLine>,
        color: Rgba<u8>,
    },
    /// 45 degree stripes clipped to `rect`
    Hatch {
        rect: Rect,
        color: Rgba<u8>,
        spacing: f32,
        line_width: f32,
    },
}

/// Pairs each course with its palette color, in order, wrapping after the
/// last palette entry.
pub fn assign_colors(courses: &[Course]) -> Vec<(&Course, Rgba<u8>)> {
    let (_, assignments) = courses.iter().fold(
        (0usize, Vec::with_capacity(courses.len())),
        |(index, mut assignments), course| {
            assignments.push((course, PALETTE[index % PALETTE.len()]));
            (index + 1, assignments)
        },
    );

    assignments
}

/// Greedy word wrap. Words are added to the current line until the line
/// (with a trailing space) would be wider than `max_width`; the first word
/// always stays on the first line. Returns the lines and the cursor below the
/// last one.
pub fn wrap_text(
    measure: &dyn TextMeasure,
    text: &str,
    x: f32,
    y: f32,
    max_width: f32,
    line_height: f32,
) -> (Vec<TextLine>, f32) {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut cursor_y = y;

    for (i, word) in text.split(' ').enumerate() {
        let test_line = format!("{}{} ", line, word);

        if measure.width(&test_line) > max_width && i > 0 {
            lines.push(TextLine {
                x: x + TEXT_INSET_X,
                y: cursor_y,
                text: line.trim_end().to_string(),
            });
            line = format!("{} ", word);
            cursor_y += line_height;
        } else {
            line = test_line;
        }
    }

    lines.push(TextLine {
        x: x + TEXT_INSET_X,
        y: cursor_y,
        text: line.trim_end().to_string(),
    });

    (lines, cursor_y + line_height)
}

/// Block, name and room commands for one course.
pub fn course_commands(course: &Course, fill: Rgba<u8>, measure: &dyn TextMeasure) -> Vec<DrawCommand> {
    let schedule = course.get_schedule();
    let rect = Rect::for_slot(schedule.day, schedule.start_period, schedule.end_period);

    // Line height comes from the untrimmed name and is shared by both blocks
    let line_height = measure.height(course.get_course_name()) + LINE_PADDING;

    let (name_lines, cursor_y) = wrap_text(
        measure,
        course.get_course_name().trim(),
        rect.x,
        rect.y + TEXT_INSET_Y,
        MAX_TEXT_WIDTH,
        line_height,
    );

    let (room_lines, _) = wrap_text(
        measure,
        &format!("- {}", course.get_room().trim()),
        rect.x,
        cursor_y,
        MAX_TEXT_WIDTH,
        line_height,
    );

    vec![
        DrawCommand::BorderedRect {
            rect,
            fill,
            border: BORDER_COLOR,
            border_width: BORDER_WIDTH,
        },
        DrawCommand::TextBlock {
            lines: name_lines,
            color: TEXT_COLOR,
        },
        DrawCommand::TextBlock {
            lines: room_lines,
            color: TEXT_COLOR,
        },
    ]
}

pub fn conflict_command(conflict: &Conflict) -> DrawCommand {
    DrawCommand::Hatch {
        rect: Rect::for_slot(conflict.day, conflict.conflict_start, conflict.conflict_end),
        color: CONFLICT_COLOR,
        spacing: HATCH_SPACING,
        line_width: HATCH_LINE_WIDTH,
    }
}

/// Full command list: every course in order, then every conflict overlay.
pub fn layout_grid(courses: &[Course], conflicts: &[Conflict], measure: &dyn TextMeasure) -> Vec<DrawCommand> {
    let mut commands: Vec<DrawCommand> = assign_colors(courses)
        .into_iter()
        .flat_map(|(course, fill)| course_commands(course, fill, measure))
        .collect();

    commands.extend(conflicts.iter().map(conflict_command));

    commands
}
