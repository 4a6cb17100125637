//! Dashboard summary view

use crate::auth::use_session;
use unidash_core::format::{format_compact_number, format_currency, format_percent};
use unidash_core::models::{DashboardQuery, DashboardSummary};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlSelectElement;
use yew::prelude::*;

/// Years offered in the filter, counting back from the current one
const YEAR_CHOICES: i32 = 6;

#[derive(Clone, PartialEq)]
enum Load {
    Loading,
    Ready(DashboardSummary),
    Failed(String),
}

#[derive(Properties, PartialEq)]
struct KpiCardProps {
    title: AttrValue,
    value: AttrValue,
    #[prop_or_default]
    detail: Option<AttrValue>,
}

#[function_component(KpiCard)]
fn kpi_card(props: &KpiCardProps) -> Html {
    html! {
        <div class="bg-white rounded-lg shadow p-4">
            <p class="text-sm text-gray-500">{&props.title}</p>
            <p class="text-3xl font-bold mt-2">{&props.value}</p>
            if let Some(detail) = &props.detail {
                <p class="text-sm text-gray-400 mt-1">{detail}</p>
            }
        </div>
    }
}

fn current_year() -> i32 {
    i32::try_from(js_sys::Date::new_0().get_full_year()).unwrap_or_default()
}

/// KPI cards for the selected year
#[function_component(DashboardView)]
pub fn dashboard_view() -> Html {
    let session = use_session();
    let year = use_state(current_year);
    let load = use_state(|| Load::Loading);

    {
        let load = load.clone();
        let gateway = session.services().gateway.clone();
        use_effect_with(*year, move |&year| {
            load.set(Load::Loading);
            spawn_local(async move {
                let query = DashboardQuery {
                    year: Some(year),
                    department: None,
                };
                match gateway.dashboard_summary(&query).await {
                    Ok(summary) => load.set(Load::Ready(summary)),
                    Err(err) => {
                        tracing::warn!(error = %err, year, "dashboard load failed");
                        load.set(Load::Failed(err.to_string()));
                    }
                }
            });
        });
    }

    let on_year = {
        let year = year.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            if let Ok(selected) = value.parse() {
                year.set(selected);
            }
        })
    };

    let this_year = current_year();
    let body = match &*load {
        Load::Loading => html! {
            <p class="text-gray-500">{"대시보드 데이터를 불러오는 중..."}</p>
        },
        Load::Failed(message) => html! {
            <div class="p-3 bg-red-50 text-red-700 rounded">{message}</div>
        },
        Load::Ready(summary) => summary_cards(summary),
    };

    html! {
        <div class="p-6">
            <div class="mb-6">
                <h1 class="text-2xl font-bold">{"대시보드"}</h1>
                <p class="text-gray-500">{"대학교 실적, 논문, 학생, 예산 현황을 한눈에 확인하세요"}</p>
            </div>
            <select class="mb-6 px-3 py-2 border rounded" onchange={on_year}>
                { for (0..YEAR_CHOICES).map(|back| {
                    let y = this_year - back;
                    html! {
                        <option value={y.to_string()} selected={y == *year}>{format!("{y}년")}</option>
                    }
                }) }
            </select>
            {body}
        </div>
    }
}

#[allow(clippy::cast_precision_loss)]
fn summary_cards(summary: &DashboardSummary) -> Html {
    let kpi = &summary.kpi_summary;
    let papers = &summary.publication_stats;
    let students = &summary.student_stats;
    let budget = &summary.budget_summary;

    html! {
        <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4">
            <KpiCard
                title="평균 취업률"
                value={format_percent(kpi.avg_employment_rate)}
                detail={format!("전임교원 {}명", kpi.total_full_time_faculty)}
            />
            <KpiCard
                title="논문 수"
                value={papers.total_papers.to_string()}
                detail={format!("SCIE {} · KCI {}", papers.scie_count, papers.kci_count)}
            />
            <KpiCard
                title="재학생 수"
                value={format_compact_number(students.total_students as f64)}
            />
            <KpiCard
                title="예산 집행률"
                value={format_percent(budget.execution_rate)}
                detail={format!("{} / {}", format_currency(budget.total_execution), format_currency(budget.total_budget))}
            />
        </div>
    }
}
