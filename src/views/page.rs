use lazy_static::lazy_static;
use minijinja::Environment;
use serde::Serialize;

use crate::models::ForecastReport;
use crate::utils::encoding::data_uri;
use crate::utils::errors::AppError;

lazy_static! {
    static ref TEMPLATES: Environment<'static> = {
        let mut env = Environment::new();
        env.add_template("index.html", include_str!("../../templates/index.html"))
            .expect("index.html template must parse");
        env
    };
}

/// What the user typed, echoed back into the form
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormInput {
    pub stock_code: String,
    pub days: String,
}

/// The two states a page can be in
#[derive(Debug)]
pub enum PageState<'a> {
    /// Empty or re-displayed form, optionally with the error that sent us back
    AwaitingInput {
        input: FormInput,
        error: Option<&'a AppError>,
    },
    /// Results for a successful submission
    Completed {
        input: FormInput,
        report: &'a ForecastReport,
    },
}

#[derive(Serialize)]
struct ErrorView {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ChartView<'a> {
    title: &'a str,
    src: String,
}

#[derive(Serialize)]
struct RowView {
    date: String,
    price: String,
}

#[derive(Serialize)]
struct PageView<'a> {
    stock_code: &'a str,
    days: &'a str,
    max_horizon_days: u32,
    error: Option<ErrorView>,
    report: Option<&'a ForecastReport>,
    charts: Vec<ChartView<'a>>,
    rows: Vec<RowView>,
}

/// Render the single page for the given state
pub fn render_page(state: &PageState<'_>, max_horizon_days: u32) -> Result<String, AppError> {
    let view = match state {
        PageState::AwaitingInput { input, error } => PageView {
            stock_code: &input.stock_code,
            days: &input.days,
            max_horizon_days,
            error: error.map(|e| ErrorView {
                kind: e.kind(),
                message: e.user_message(),
            }),
            report: None,
            charts: Vec::new(),
            rows: Vec::new(),
        },
        PageState::Completed { input, report } => PageView {
            stock_code: &input.stock_code,
            days: &input.days,
            max_horizon_days,
            error: None,
            report: Some(*report),
            charts: [
                &report.chart_1_month,
                &report.chart_6_months,
                &report.chart_12_months,
                &report.chart_forecast,
            ]
            .into_iter()
            .map(|chart| ChartView {
                title: &chart.title,
                src: data_uri(&chart.base64_png),
            })
            .collect(),
            rows: report
                .forecast
                .iter()
                .map(|row| RowView {
                    date: row.date.format("%Y-%m-%d").to_string(),
                    price: format!("{:.2}", row.price),
                })
                .collect(),
        },
    };

    Ok(TEMPLATES.get_template("index.html")?.render(view)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyProfile, EncodedChart, ForecastPoint};
    use chrono::NaiveDate;

    fn chart(title: &str) -> EncodedChart {
        EncodedChart {
            title: title.to_string(),
            base64_png: "iVBORw0KGgo/+=".to_string(),
        }
    }

    fn report() -> ForecastReport {
        ForecastReport {
            symbol: "ACME".to_string(),
            horizon_days: 2,
            generated_on: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            profile: CompanyProfile {
                display_name: "Acme <Corp>".to_string(),
                description: Some("Anvils & rockets".to_string()),
                ..CompanyProfile::default()
            },
            chart_1_month: chart("one"),
            chart_6_months: chart("six"),
            chart_12_months: chart("twelve"),
            chart_forecast: chart("forecast"),
            forecast: vec![
                ForecastPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
                    price: 101.234,
                },
                ForecastPoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
                    price: 102.0,
                },
            ],
        }
    }

    #[test]
    fn test_empty_form() {
        let state = PageState::AwaitingInput {
            input: FormInput::default(),
            error: None,
        };
        let html = render_page(&state, 365).unwrap();

        assert!(html.contains("name=\"stock_code\""));
        assert!(html.contains("name=\"days\""));
        assert!(!html.contains("class=\"error\""));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_error_is_shown_with_previous_input() {
        let err = AppError::Input("Horizon must be a whole number of days.".to_string());
        let state = PageState::AwaitingInput {
            input: FormInput {
                stock_code: "ACME".to_string(),
                days: "abc".to_string(),
            },
            error: Some(&err),
        };
        let html = render_page(&state, 365).unwrap();

        assert!(html.contains("Input error"));
        assert!(html.contains("Horizon must be a whole number of days."));
        assert!(html.contains("value=\"abc\""));
    }

    #[test]
    fn test_completed_page_embeds_charts_and_table() {
        let report = report();
        let state = PageState::Completed {
            input: FormInput {
                stock_code: "ACME".to_string(),
                days: "2".to_string(),
            },
            report: &report,
        };
        let html = render_page(&state, 365).unwrap();

        assert_eq!(html.matches("src=\"data:image/png;base64,iVBORw0KGgo/+=\"").count(), 4);
        assert!(html.contains("<td>2024-01-11</td><td>101.23</td>"));
        assert!(html.contains("<td>2024-01-12</td><td>102.00</td>"));
        assert!(html.contains("Generated on 2024-01-10"));
        // provider text is escaped
        assert!(html.contains("Acme &lt;Corp&gt;"));
        assert!(html.contains("Anvils &amp; rockets"));
    }
}
