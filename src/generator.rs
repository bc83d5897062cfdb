use crate::background::*;
use crate::canvas::*;
use crate::compute_conflicts::*;
use crate::error::*;
use crate::layout::*;
use crate::schedule_api::*;
use crate::week_filter::*;
use ab_glyph::FontArc;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use log::debug;

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Everything decided before any pixel is touched.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPlan {
    /// Courses that survived the week filter, with their ids, in mapping order
    pub courses: Vec<(String, Course)>,
    pub conflicts: Vec<Conflict>,
    pub commands: Vec<DrawCommand>,
}

/// Renders timetables onto a background template. Holds only the font; every
/// render builds its own surface.
#[derive(Clone, Default)]
pub struct GridRenderer {
    font: Option<FontArc>,
}

impl GridRenderer {
    pub fn new(font: Option<FontArc>) -> Self {
        GridRenderer { font }
    }

    pub fn from_font_stack(fonts: &FontStack) -> Self {
        GridRenderer::new(fonts.resolve())
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn measure(&self) -> Box<dyn TextMeasure + '_> {
        match &self.font {
            Some(font) => Box::new(FontMeasure::new(font, em_scale(font, FONT_SIZE_PX))),
            None => Box::new(FixedAdvance::default()),
        }
    }

    /// Maps the rows, applies the optional week filter, finds conflicts and
    /// lays out the grid.
    pub fn plan(&self, rows: RowInput, week: Option<i32>) -> TkbResult<RenderPlan> {
        let mapped = parse_rows(rows)?;
        let mapped_count = mapped.len();

        let courses: Vec<(String, Course)> = mapped
            .into_entries()
            .into_iter()
            .filter(|(_, course)| match week {
                Some(week) => !check_course_week(course.get_week_info(), week).excludes(),
                None => true,
            })
            .collect();

        let course_list: Vec<Course> = courses.iter().map(|(_, course)| course.clone()).collect();
        let conflicts = compute_conflicts(&course_list);

        debug!(
            "Mapped {} courses, {} kept for week {:?}, {} conflicts",
            mapped_count,
            course_list.len(),
            week,
            conflicts.len()
        );

        let commands = layout_grid(&course_list, &conflicts, self.measure().as_ref());

        Ok(RenderPlan {
            courses,
            conflicts,
            commands,
        })
    }

    /// Draws a plan onto any canvas.
    pub fn paint<C: Canvas + ?Sized>(&self, plan: &RenderPlan, canvas: &mut C) {
        execute(&plan.commands, canvas);
    }

    /// Loads the background first, then plans and draws. Returns the plan
    /// alongside the PNG bytes.
    pub async fn render(
        &self,
        rows: RowInput,
        background: &BackgroundSource,
        week: Option<i32>,
    ) -> TkbResult<(RenderPlan, Vec<u8>)> {
        let background = load_background(background).await?;
        self.draw(background, rows, week)
    }

    /// The synchronous part of a render: plan, paint onto the already decoded
    /// background, encode. CPU bound.
    pub fn draw(
        &self,
        background: RgbaImage,
        rows: RowInput,
        week: Option<i32>,
    ) -> TkbResult<(RenderPlan, Vec<u8>)> {
        let plan = self.plan(rows, week)?;

        let mut canvas = RasterCanvas::new(background, self.font.as_ref());
        self.paint(&plan, &mut canvas);

        let png = canvas.encode_png()?;

        Ok((plan, png))
    }

    pub async fn render_png(
        &self,
        rows: RowInput,
        background: &BackgroundSource,
        week: Option<i32>,
    ) -> TkbResult<Vec<u8>> {
        let (_, png) = self.render(rows, background, week).await?;
        Ok(png)
    }

    /// The whole pipeline, answered as a PNG data URI.
    pub async fn generate_schedule_image(
        &self,
        rows: RowInput,
        background: &BackgroundSource,
        week: Option<i32>,
    ) -> TkbResult<String> {
        let png = self.render_png(rows, background, week).await?;
        Ok(png_data_uri(&png))
    }
}

pub fn png_data_uri(png: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URI_PREFIX, STANDARD.encode(png))
}
