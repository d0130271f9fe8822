//! Dashboard pages. A request names one [`View`]; [`render`] runs that
//! view's renderer and wraps it in the shared layout.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::charts::ChartKind;
use crate::data::StudentTable;
use crate::error::{AppError, Result};
use crate::model::{StudentInput, TrainedModel, PASS, SLIDERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Description,
    Dataset,
    Charts,
    Predict,
    Help,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Description,
        View::Dataset,
        View::Charts,
        View::Predict,
        View::Help,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            View::Description => "description",
            View::Dataset => "dataset",
            View::Charts => "charts",
            View::Predict => "predict",
            View::Help => "help",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Description => "Description",
            View::Dataset => "Dataset",
            View::Charts => "Charts",
            View::Predict => "Prediction",
            View::Help => "Help",
        }
    }
}

impl FromStr for View {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        View::ALL
            .into_iter()
            .find(|v| v.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::UnknownView(s.to_string()))
    }
}

/// Everything a dashboard request can carry, parsed from query pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardQuery {
    pub view: View,
    pub columns: Vec<String>,
    pub input: StudentInput,
}

impl DashboardQuery {
    /// Repeated `columns` keys accumulate; each value may also be a comma
    /// list. Slider fields are pinned into their ranges.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let mut query = DashboardQuery::default();
        let mut values = query.input.values();

        for (key, value) in pairs {
            if key == "view" {
                query.view = value.parse()?;
            } else if key == "columns" {
                query.columns.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string),
                );
            } else if let Some(idx) = SLIDERS.iter().position(|s| s.name == key.as_str()) {
                values[idx] = value.trim().parse::<f64>().map_err(|_| {
                    AppError::InvalidInput(format!("{} must be a number, got '{}'", key, value))
                })?;
            }
        }

        query.input = StudentInput {
            age: values[0],
            studytime: values[1],
            failures: values[2],
            absences: values[3],
            g1: values[4],
            g2: values[5],
        }
        .clamped();
        Ok(query)
    }
}

pub struct RenderContext<'a> {
    pub table: &'a StudentTable,
    pub model: &'a TrainedModel,
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the full page for the selected view. Exactly one view body is
/// produced per call.
pub fn render(ctx: &RenderContext<'_>, query: &DashboardQuery) -> Result<String> {
    let body = match query.view {
        View::Description => description(),
        View::Dataset => dataset(ctx.table, &query.columns),
        View::Charts => charts(ctx.table)?,
        View::Predict => predict(ctx.model, &query.input)?,
        View::Help => help(),
    };
    Ok(layout(query.view, &body))
}

fn layout(active: View, body: &str) -> String {
    let mut nav = String::new();
    for view in View::ALL {
        let _ = write!(
            nav,
            r#"<a class="menu{}" href="/?view={}"><span class="radio"></span>{}</a>"#,
            if view == active { " active" } else { "" },
            view.slug(),
            view.label()
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Student Pass Prediction</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 0; display: flex; }}
        nav {{ width: 220px; min-height: 100vh; background: #f0f2f6; padding: 20px; box-sizing: border-box; }}
        nav h2 {{ font-size: 18px; }}
        .menu {{ display: block; padding: 8px 0; color: #262730; text-decoration: none; }}
        .radio {{ display: inline-block; width: 12px; height: 12px; border: 2px solid #999; border-radius: 50%; margin-right: 8px; vertical-align: middle; }}
        .menu.active .radio {{ border-color: #ff4b4b; background: #ff4b4b; }}
        main {{ flex: 1; padding: 30px 50px; overflow-x: auto; }}
        table {{ border-collapse: collapse; font-size: 13px; }}
        th, td {{ padding: 4px 8px; border-bottom: 1px solid #ddd; text-align: right; }}
        th {{ background: #f8f9fa; }}
        pre {{ background: #f8f9fa; padding: 15px; border-radius: 5px; }}
        .pass {{ background: #d4edda; color: #155724; padding: 15px; border-radius: 5px; }}
        .fail {{ background: #f8d7da; color: #721c24; padding: 15px; border-radius: 5px; }}
        .slider {{ margin: 12px 0; }}
        .slider label {{ display: block; font-weight: bold; }}
        .slider input {{ width: 400px; }}
        svg {{ max-width: 100%; height: auto; }}
    </style>
</head>
<body>
    <nav><h2>SELECT MENU</h2>{}</nav>
    <main>{}</main>
</body>
</html>"#,
        nav, body
    )
}

fn description() -> String {
    r#"<section id="view-description">
    <h1>Student Pass Prediction</h1>
    <p>This web application analyses student records and predicts whether a student will pass
    based on age, weekly study time, number of past class failures, absences and the first and
    second period grades (G1 and G2). The dataset holds academic results, study habits and other
    factors that contribute to student performance.</p>
    <p>The data is explored through grade distribution charts, relationships between features and
    a correlation heatmap. Predictions come from a Random Forest classifier, an ensemble of decision
    trees that gives reliable results with high accuracy. A student passes when the final grade
    (G3) is above 10; otherwise the student is classed as not passing.</p>
</section>"#
        .to_string()
}

fn dataset(table: &StudentTable, requested: &[String]) -> String {
    let selected = table.select_columns(requested);
    let mut html = String::from(
        r#"<section id="view-dataset">
    <h1>Student Dataset</h1>
    <p>This page shows the dataset used by the application, including age, study time, past
    failures, absences and the G1 and G2 grades. Choose the columns to display below.</p>
    <form method="get" action="/">
    <input type="hidden" name="view" value="dataset">
    <label for="columns">Columns to display:</label><br>
    <select id="columns" name="columns" multiple size="8">"#,
    );

    for (idx, name) in table.headers().iter().enumerate() {
        let _ = write!(
            html,
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape(name),
            if selected.contains(&idx) { " selected" } else { "" }
        );
    }
    html.push_str(r#"</select> <button type="submit">Show</button></form>"#);

    let _ = write!(html, "<p>{} rows</p><table><thead><tr><th></th>", table.nrows());
    for &idx in &selected {
        let _ = write!(html, "<th>{}</th>", escape(&table.headers()[idx]));
    }
    html.push_str("</tr></thead><tbody>");
    for (i, row) in table.rows().iter().enumerate() {
        let _ = write!(html, "<tr><th>{}</th>", i);
        for &idx in &selected {
            let _ = write!(html, "<td>{}</td>", escape(&row[idx]));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></section>");
    html
}

fn charts(table: &StudentTable) -> Result<String> {
    let mut html = String::from(
        r#"<section id="view-charts">
    <h1>Student Data Charts</h1>
    <p>Charts that help reveal patterns in the dataset: grade distributions, the relationship
    between absences, study time and the final grade, and correlations between features.</p>"#,
    );
    for kind in ChartKind::ALL {
        let svg = kind.render(table)?;
        let _ = write!(html, "<h2>{}</h2><div class=\"chart\">{}</div>", kind.heading(), svg);
    }
    html.push_str("</section>");
    Ok(html)
}

fn predict(model: &TrainedModel, input: &StudentInput) -> Result<String> {
    let mut html = String::from(
        r#"<section id="view-predict">
    <h1>Student Pass Prediction</h1>
    <p>Enter a student's age, study time, past failures, absences and G1/G2 grades to predict
    whether the student will pass.</p>"#,
    );

    let _ = write!(
        html,
        "<p>Model accuracy: {:.2}</p><h3>Model evaluation report</h3><pre>{}</pre>",
        model.accuracy(),
        escape(&model.report().to_string())
    );

    html.push_str(
        r#"<h2>Enter student data</h2><form method="get" action="/">
    <input type="hidden" name="view" value="predict">"#,
    );
    for (bounds, value) in SLIDERS.iter().zip(input.values()) {
        let _ = write!(
            html,
            r#"<div class="slider"><label for="{name}">{label}: <output id="{name}-value">{value}</output></label>
    <input type="range" id="{name}" name="{name}" min="{min}" max="{max}" step="1" value="{value}"
    oninput="document.getElementById('{name}-value').value = this.value"></div>"#,
            name = bounds.name,
            label = bounds.label,
            min = bounds.min,
            max = bounds.max,
            value = value
        );
    }
    html.push_str(r#"<button type="submit">Predict</button></form>"#);

    let (class, _) = model.classify(input)?;
    if class == PASS {
        html.push_str(r#"<div class="pass" id="verdict">The student is predicted to PASS</div>"#);
    } else {
        html.push_str(r#"<div class="fail" id="verdict">The student is predicted to FAIL</div>"#);
    }
    html.push_str("</section>");
    Ok(html)
}

fn help() -> String {
    r#"<section id="view-help">
    <h1>How to Use the Application</h1>
    <p>1. Use the sidebar navigation to move between pages.</p>
    <p>2. The Description page explains the purpose of the application and how it works.</p>
    <p>3. The Dataset page shows the student data in use.</p>
    <p>4. The Charts page provides the key data visualizations.</p>
    <p>5. The Prediction page predicts whether a student passes from the data you enter.</p>
</section>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_view_parsing() {
        for view in View::ALL {
            assert_eq!(view.slug().parse::<View>().unwrap(), view);
        }
        assert_eq!("HELP".parse::<View>().unwrap(), View::Help);
        assert!(matches!("stats".parse::<View>(), Err(AppError::UnknownView(_))));
    }

    #[test]
    fn test_query_defaults() {
        let query = DashboardQuery::from_pairs(&[]).unwrap();
        assert_eq!(query.view, View::Description);
        assert!(query.columns.is_empty());
        assert_eq!(query.input, StudentInput::default());
    }

    #[test]
    fn test_query_collects_columns_and_clamps_sliders() {
        let query = DashboardQuery::from_pairs(&pairs(&[
            ("view", "predict"),
            ("columns", "age,G3"),
            ("columns", "school"),
            ("age", "99"),
            ("G1", "12"),
        ]))
        .unwrap();
        assert_eq!(query.view, View::Predict);
        assert_eq!(query.columns, vec!["age", "G3", "school"]);
        assert_eq!(query.input.age, 20.0);
        assert_eq!(query.input.g1, 12.0);
    }

    #[test]
    fn test_query_rejects_garbage_slider() {
        let err = DashboardQuery::from_pairs(&pairs(&[("absences", "lots")])).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_dataset_view_respects_selection() {
        let table = StudentTable::new(
            vec!["school".into(), "age".into()],
            vec![vec!["GP".into(), "15".into()]],
        );
        let html = dataset(&table, &["age".to_string()]);
        assert!(html.contains("<th>age</th>"));
        assert!(!html.contains("<th>school</th>"));
        assert!(html.contains("<td>15</td>"));
        assert!(!html.contains("<td>GP</td>"));
    }

    #[test]
    fn test_overflowing_slider_clamps_to_bound() {
        let query = DashboardQuery::from_pairs(&pairs(&[("age", "1e999"), ("absences", "-1e999")])).unwrap();
        assert_eq!(query.input.age, 20.0);
        assert_eq!(query.input.absences, 0.0);
    }

    #[test]
    fn test_predict_view_verdict_follows_class() {
        use crate::model::{train_model, ForestParams, FEATURES};

        let mut headers: Vec<String> = FEATURES.iter().map(|f| f.to_string()).collect();
        headers.push("G3".into());
        let rows = (0..40)
            .map(|i| {
                let grade = (i % 21).to_string();
                vec!["16".into(), "2".into(), "0".into(), "4".into(), grade.clone(), grade.clone(), grade]
            })
            .collect();
        let table = StudentTable::new(headers, rows);
        let model = train_model(&table, 0.2, ForestParams { n_trees: 10, ..Default::default() }).unwrap();

        for g in [2.0, 18.0] {
            let input = StudentInput { g1: g, g2: g, ..StudentInput::default() };
            let (class, _) = model.classify(&input).unwrap();
            let html = predict(&model, &input).unwrap();
            let expected = if class == PASS { "predicted to PASS" } else { "predicted to FAIL" };
            assert!(html.contains(expected));
            assert_eq!(model.predict(&input).unwrap().prediction, crate::model::verdict(class));
        }
    }
}
