//! SVG charts for the dashboard, drawn with Plotters.

use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;

use crate::data::StudentTable;
use crate::error::{AppError, Result};
use crate::stats::{self, BoxSummary};

type DrawResult = std::result::Result<(), Box<dyn Error>>;

const GRADES: [&str; 3] = ["G1", "G2", "G3"];
const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);
const KDE_POINTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    GradeDistribution,
    AbsencesVsGrade,
    StudytimeVsGrade,
    Correlation,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::GradeDistribution,
        ChartKind::AbsencesVsGrade,
        ChartKind::StudytimeVsGrade,
        ChartKind::Correlation,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::GradeDistribution => "grades",
            ChartKind::AbsencesVsGrade => "absences",
            ChartKind::StudytimeVsGrade => "studytime",
            ChartKind::Correlation => "correlation",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    pub fn heading(&self) -> &'static str {
        match self {
            ChartKind::GradeDistribution => "Grade Distribution (G1, G2, G3)",
            ChartKind::AbsencesVsGrade => "Absences and Final Grade",
            ChartKind::StudytimeVsGrade => "Study Time and Final Grade",
            ChartKind::Correlation => "Feature Correlation Heatmap",
        }
    }

    pub fn render(&self, table: &StudentTable) -> Result<String> {
        match self {
            ChartKind::GradeDistribution => grade_distribution(table),
            ChartKind::AbsencesVsGrade => grouped_box_plot(
                table,
                "absences",
                "Absences vs Final Grade (G3)",
            ),
            ChartKind::StudytimeVsGrade => grouped_box_plot(
                table,
                "studytime",
                "Studytime vs Final Grade (G3)",
            ),
            ChartKind::Correlation => correlation_heatmap(table),
        }
    }
}

fn chart_err(e: Box<dyn Error>) -> AppError {
    AppError::Chart(e.to_string())
}

/// Runs `draw` against an in-memory SVG canvas and returns the document.
fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String>
where
    F: FnOnce(DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, size).into_drawing_area();
        draw(root).map_err(chart_err)?;
    }
    Ok(buf)
}

/// Histograms of G1, G2 and G3 side by side, each with a density curve
/// scaled to the bar counts.
pub fn grade_distribution(table: &StudentTable) -> Result<String> {
    let columns = GRADES
        .iter()
        .map(|g| table.numeric_column(g))
        .collect::<Result<Vec<_>>>()?;

    render_svg((1500, 500), |root| {
        root.fill(&WHITE)?;
        let panels = root.split_evenly((1, 3));

        for ((panel, values), name) in panels.iter().zip(&columns).zip(GRADES) {
            let hist = stats::histogram(values, stats::sturges_bins(values.len()));
            let lo = hist.edges[0];
            let hi = hist.edges[hist.edges.len() - 1];
            let scale = values.len() as f64 * hist.bin_width();
            let curve = stats::kde(values, lo, hi, KDE_POINTS);
            let peak = curve
                .iter()
                .map(|(_, d)| d * scale)
                .fold(hist.max_count() as f64, f64::max);

            let mut chart = ChartBuilder::on(panel)
                .caption(format!("Distribution of {}", name), ("sans-serif", 22))
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(lo..hi, 0f64..peak * 1.1)?;

            chart
                .configure_mesh()
                .x_desc(name)
                .y_desc("Count")
                .disable_x_mesh()
                .draw()?;

            chart.draw_series(hist.counts.iter().enumerate().map(|(i, &count)| {
                Rectangle::new(
                    [(hist.edges[i], 0.0), (hist.edges[i + 1], count as f64)],
                    BAR_COLOR.mix(0.6).filled(),
                )
            }))?;
            chart.draw_series(LineSeries::new(
                curve.iter().map(|&(x, d)| (x, d * scale)),
                BAR_COLOR.stroke_width(2),
            ))?;
        }

        root.present()?;
        Ok(())
    })
}

/// Box plot of G3 for every distinct value of `group_column`.
pub fn grouped_box_plot(table: &StudentTable, group_column: &str, title: &str) -> Result<String> {
    let keys = table.numeric_column(group_column)?;
    let grades = table.numeric_column("G3")?;
    let groups: Vec<(f64, BoxSummary)> = stats::group_by(&keys, &grades)
        .into_iter()
        .filter_map(|(key, values)| stats::box_summary(&values).map(|s| (key, s)))
        .collect();
    let (g_lo, g_hi) = stats::min_max(&grades).unwrap_or((0.0, 20.0));
    let labels: Vec<String> = groups.iter().map(|(k, _)| format!("{}", k)).collect();
    let k = groups.len().max(1);

    render_svg((800, 600), |root| {
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5f64..(k as f64 - 0.5), (g_lo - 1.0)..(g_hi + 1.0))?;

        let label_at = |x: &f64| {
            let idx = x.round();
            if (x - idx).abs() < 1e-6 && idx >= 0.0 {
                labels.get(idx as usize).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        };

        chart
            .configure_mesh()
            .x_labels(k)
            .x_label_formatter(&label_at)
            .x_desc(group_column)
            .y_desc("G3")
            .disable_x_mesh()
            .draw()?;

        for (i, (_, summary)) in groups.iter().enumerate() {
            draw_box(&mut chart, i as f64, summary)?;
        }

        root.present()?;
        Ok(())
    })
}

type BoxChart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn draw_box(chart: &mut BoxChart<'_, '_>, x: f64, s: &BoxSummary) -> DrawResult {
    let half = 0.3;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(x - half, s.q1), (x + half, s.q3)],
        BAR_COLOR.mix(0.5).filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(x - half, s.q1), (x + half, s.q3)],
        BLACK.stroke_width(1),
    )))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x - half, s.median), (x + half, s.median)],
        BLACK.stroke_width(2),
    )))?;

    for (from, to) in [(s.q1, s.lower_whisker), (s.q3, s.upper_whisker)] {
        chart.draw_series(std::iter::once(PathElement::new(vec![(x, from), (x, to)], &BLACK)))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - half / 2.0, to), (x + half / 2.0, to)],
            &BLACK,
        )))?;
    }

    chart.draw_series(
        s.outliers
            .iter()
            .map(|&y| Circle::new((x, y), 3, BLACK.stroke_width(1))),
    )?;
    Ok(())
}

/// Diverging blue-white-red ramp for a coefficient in [-1, 1].
pub fn coolwarm(v: f64) -> RGBColor {
    if !v.is_finite() {
        return RGBColor(200, 200, 200);
    }
    let lerp = |a: u8, b: u8, t: f64| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    let (cold, mid, warm) = ((59u8, 76u8, 192u8), (221u8, 221u8, 221u8), (180u8, 4u8, 38u8));
    let t = v.clamp(-1.0, 1.0);
    let (from, to, frac) = if t < 0.0 { (cold, mid, t + 1.0) } else { (mid, warm, t) };
    RGBColor(
        lerp(from.0, to.0, frac),
        lerp(from.1, to.1, frac),
        lerp(from.2, to.2, frac),
    )
}

/// Annotated Pearson correlation matrix over every numeric column.
pub fn correlation_heatmap(table: &StudentTable) -> Result<String> {
    let names = table.numeric_columns();
    if names.is_empty() {
        return Err(AppError::Chart("dataset has no numeric columns".into()));
    }
    let columns = names
        .iter()
        .map(|n| table.numeric_column(n))
        .collect::<Result<Vec<_>>>()?;
    let matrix = stats::correlation_matrix(&columns);
    let k = names.len() as i32;

    let (width, height) = (1000u32, 800u32);
    let (label_area, margin) = (110u32, 10u32);
    let cell_w = (width - label_area - 2 * margin) as i32 / k;
    let cell_h = (height - label_area - 2 * margin - 40) as i32 / k;
    let font_size: u32 = if k > 12 { 9 } else { 13 };

    render_svg((width, height), |root| {
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Correlation Between Numeric Features", ("sans-serif", 24))
            .margin(margin)
            .x_label_area_size(label_area)
            .y_label_area_size(label_area)
            .build_cartesian_2d(0i32..k, k..0i32)?;

        let name_at = |i: &i32| names.get(*i as usize).cloned().unwrap_or_default();
        chart
            .configure_mesh()
            .x_labels(k as usize + 1)
            .y_labels(k as usize + 1)
            .x_label_formatter(&name_at)
            .y_label_formatter(&name_at)
            .x_label_offset(cell_w / 2)
            .y_label_offset(cell_h / 2)
            .disable_x_mesh()
            .disable_y_mesh()
            .label_style(("sans-serif", font_size))
            .draw()?;

        chart.draw_series(matrix.iter().enumerate().flat_map(|(row, values)| {
            values.iter().enumerate().map(move |(col, &v)| {
                let (x, y) = (col as i32, row as i32);
                Rectangle::new([(x, y), (x + 1, y + 1)], coolwarm(v).filled())
            })
        }))?;

        let annotation = TextStyle::from(("sans-serif", font_size).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(matrix.iter().enumerate().flat_map(|(row, values)| {
            let annotation = annotation.clone();
            values.iter().enumerate().map(move |(col, &v)| {
                EmptyElement::at((col as i32, row as i32))
                    + Text::new(format!("{:.2}", v), (cell_w / 2, cell_h / 2), annotation.clone())
            })
        }))?;

        root.present()?;
        Ok(())
    })
}
