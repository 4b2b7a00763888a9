//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations for the loaded transactions:
//! - **Flow Chart**: Income and expense totals per day, or per month for long ranges
//! - **Expenses Chart**: Pie chart of expense totals per category
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with a container and an inline script that initializes the chart
//! and posts clicks back to the server as cross-filter selections.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, ItemStyle, JsFunction, Tooltip,
        Trigger,
    },
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::{
        aggregation::{CategoryExpense, DailyFlow, MonthlyFlow},
        range::format_day,
    },
    endpoints,
};

const INCOME_COLOR: &str = "#16a34a";
const EXPENSE_COLOR: &str = "#dc2626";

/// The element that chart clicks swap the updated dashboard into.
pub(super) const DASHBOARD_CONTENT_ID: &str = "dashboard-content";

/// A dashboard chart with its HTML container ID, ECharts configuration and click target.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
    /// Where clicks on a data point are sent.
    pub click: ChartClick,
}

/// Describes the request made when a data point of a chart is clicked.
pub(super) struct ChartClick {
    /// The endpoint the click is posted to.
    pub endpoint: &'static str,
    /// The name of the form field holding the clicked key.
    pub field: &'static str,
    /// The key for each data point, in the same order as the chart data.
    pub keys: Vec<String>,
}

/// The flow chart of income and expenses per day.
pub(super) fn daily_flow_chart(rows: &[DailyFlow]) -> DashboardChart {
    let labels = rows.iter().map(short_day_label).collect();
    let income = rows.iter().map(|row| row.income).collect();
    let expense = rows.iter().map(|row| row.expense).collect();

    DashboardChart {
        id: "flow-chart",
        options: flow_chart("Daily Flow", labels, income, expense).to_string(),
        click: ChartClick {
            endpoint: endpoints::SELECT_DAY,
            field: "day",
            keys: rows.iter().map(|row| row.day.to_string()).collect(),
        },
    }
}

/// The flow chart of income and expenses per month.
pub(super) fn monthly_flow_chart(rows: &[MonthlyFlow]) -> DashboardChart {
    let labels = rows.iter().map(|row| row.month.label()).collect();
    let income = rows.iter().map(|row| row.income).collect();
    let expense = rows.iter().map(|row| row.expense).collect();

    DashboardChart {
        id: "flow-chart",
        options: flow_chart("Monthly Flow", labels, income, expense).to_string(),
        click: ChartClick {
            endpoint: endpoints::SELECT_MONTH,
            field: "month",
            keys: rows.iter().map(|row| row.month.to_string()).collect(),
        },
    }
}

/// The pie chart of expenses per category.
pub(super) fn category_expenses_chart(rows: &[CategoryExpense]) -> DashboardChart {
    let data: Vec<(f64, &str)> = rows
        .iter()
        .map(|row| (row.expense, row.label.as_str()))
        .collect();

    let chart = Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext("Click a slice to filter the list"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("1%"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["35%", "65%"])
                .center(vec!["50%", "50%"])
                .data(data),
        );

    DashboardChart {
        id: "category-chart",
        options: chart.to_string(),
        click: ChartClick {
            endpoint: endpoints::SELECT_CATEGORY,
            field: "category",
            keys: rows.iter().map(|row| row.label.clone()).collect(),
        },
    }
}

fn short_day_label(row: &DailyFlow) -> String {
    // "DD/MM/YYYY" -> "DD/MM"
    let mut label = format_day(row.day);
    label.truncate(5);
    label
}

fn flow_chart(title: &str, labels: Vec<String>, income: Vec<f64>, expense: Vec<f64>) -> Chart {
    Chart::new()
        .title(
            Title::new()
                .text(title)
                .subtext("Click a bar to filter the list"),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().top("1%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(70)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            Bar::new()
                .name("Income")
                .item_style(ItemStyle::new().color(INCOME_COLOR))
                .data(income),
        )
        .series(
            Bar::new()
                .name("Expense")
                .item_style(ItemStyle::new().color(EXPENSE_COLOR))
                .data(expense),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'BRL'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

/// Renders the container for a chart followed by the script that draws it.
///
/// The script is inline so that it also runs when htmx swaps in new dashboard content.
pub(super) fn chart_view(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="min-h-[380px] rounded dark:bg-gray-100"
        {}

        script { (chart_script(chart)) }
    )
}

fn chart_script(chart: &DashboardChart) -> PreEscaped<String> {
    let keys = serde_json::to_string(&chart.click.keys).unwrap_or_else(|error| {
        tracing::error!("Could not serialize chart keys for {}: {error}", chart.id);
        "[]".to_owned()
    });
    // Category names are user input and must not close the script tag.
    let keys = keys.replace("</", "<\\/");
    let options = chart.options.replace("</", "<\\/");

    PreEscaped(format!(
        r#"(function() {{
            const chartDom = document.getElementById("{id}");
            const chart = echarts.init(chartDom);
            const option = {options};
            chart.setOption(option);

            const keys = {keys};
            chart.on('click', function(params) {{
                const key = keys[params.dataIndex];
                if (key === undefined) {{
                    return;
                }}
                htmx.ajax('POST', '{endpoint}', {{
                    target: '#{target}',
                    swap: 'innerHTML',
                    values: {{ '{field}': key }}
                }});
            }});

            window.addEventListener('resize', chart.resize);

            const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
            const updateTheme = () => {{
                const isDarkMode = darkModeMediaQuery.matches;
                chart.setTheme(isDarkMode ? 'dark' : 'default');
            }}
            darkModeMediaQuery.addEventListener('change', updateTheme);
            updateTheme();
        }})();"#,
        id = chart.id,
        options = options,
        keys = keys,
        endpoint = chart.click.endpoint,
        target = DASHBOARD_CONTENT_ID,
        field = chart.click.field,
    ))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        dashboard::{
            aggregation::{CategoryExpense, DailyFlow, MonthlyFlow},
            charts::{category_expenses_chart, chart_view, daily_flow_chart, monthly_flow_chart},
            range::YearMonth,
        },
        endpoints,
    };

    #[test]
    fn daily_chart_uses_short_labels_and_iso_keys() {
        let rows = [
            DailyFlow {
                day: date!(2024 - 03 - 01),
                income: 100.0,
                expense: 0.0,
            },
            DailyFlow {
                day: date!(2024 - 03 - 02),
                income: 0.0,
                expense: 30.0,
            },
        ];

        let chart = daily_flow_chart(&rows);

        assert!(chart.options.contains("\"01/03\""), "{}", chart.options);
        assert!(chart.options.contains("\"02/03\""), "{}", chart.options);
        assert_eq!(chart.click.endpoint, endpoints::SELECT_DAY);
        assert_eq!(chart.click.field, "day");
        assert_eq!(chart.click.keys, vec!["2024-03-01", "2024-03-02"]);
    }

    #[test]
    fn monthly_chart_posts_month_keys() {
        let rows = [MonthlyFlow {
            month: YearMonth::new(2024, time::Month::February),
            income: 10.0,
            expense: 5.0,
        }];

        let chart = monthly_flow_chart(&rows);

        assert!(chart.options.contains("Feb 2024"), "{}", chart.options);
        assert_eq!(chart.click.endpoint, endpoints::SELECT_MONTH);
        assert_eq!(chart.click.keys, vec!["2024-02"]);
    }

    #[test]
    fn category_chart_keys_follow_slice_order() {
        let rows = [
            CategoryExpense {
                label: "Food".to_owned(),
                expense: 80.0,
            },
            CategoryExpense {
                label: "Other".to_owned(),
                expense: 20.0,
            },
        ];

        let chart = category_expenses_chart(&rows);

        assert!(chart.options.contains("Food"), "{}", chart.options);
        assert_eq!(chart.click.endpoint, endpoints::SELECT_CATEGORY);
        assert_eq!(chart.click.field, "category");
        assert_eq!(chart.click.keys, vec!["Food", "Other"]);
    }

    #[test]
    fn chart_view_includes_container_and_script() {
        let chart = category_expenses_chart(&[CategoryExpense {
            label: "Food".to_owned(),
            expense: 80.0,
        }]);

        let markup = chart_view(&chart).into_string();

        assert!(markup.contains(r#"<div id="category-chart""#), "{markup}");
        assert!(markup.contains("echarts.init"), "{markup}");
        assert!(markup.contains(endpoints::SELECT_CATEGORY), "{markup}");
        assert!(markup.contains(r#"const keys = ["Food"];"#), "{markup}");
    }
}
