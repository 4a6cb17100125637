use crate::auth::{SessionProvider, use_session};
use crate::components::{DashboardView, LoginForm};
use crate::services::{Services, app_config};
use yew::prelude::*;

struct MenuItem {
    label: &'static str,
    href: &'static str,
    admin_only: bool,
}

const MENU: [MenuItem; 6] = [
    MenuItem { label: "통합 대시보드", href: "/dashboard", admin_only: false },
    MenuItem { label: "연구 성과", href: "/dashboard/research", admin_only: false },
    MenuItem { label: "학생 현황", href: "/dashboard/students", admin_only: false },
    MenuItem { label: "예산 집행", href: "/dashboard/budget", admin_only: true },
    MenuItem { label: "데이터 업로드", href: "/upload", admin_only: true },
    MenuItem { label: "데이터 조회", href: "/data", admin_only: false },
];

#[function_component(App)]
pub fn app() -> Html {
    let services = use_memo((), |_| Services::from_config(app_config()));

    match &*services {
        Ok(services) => html! {
            <SessionProvider services={services.clone()}>
                <AppContent />
            </SessionProvider>
        },
        Err(err) => {
            tracing::error!(error = %err, "client configuration rejected");
            html! {
                <div class="p-6 text-red-700">{format!("설정 오류: {err}")}</div>
            }
        }
    }
}

#[function_component(AppContent)]
fn app_content() -> Html {
    let session = use_session();

    if !session.is_restored() {
        return html! { <p class="p-6 text-gray-500">{"로딩 중..."}</p> };
    }

    let Some(user) = session.user() else {
        return html! { <LoginForm /> };
    };

    let on_logout = {
        let session = session.clone();
        Callback::from(move |_: MouseEvent| session.logout())
    };
    let is_admin = session.is_admin();
    let name = if user.full_name.is_empty() {
        user.email.clone()
    } else {
        user.full_name.clone()
    };

    html! {
        <div class="min-h-screen flex">
            <nav class="w-60 bg-gray-50 border-r p-4 space-y-1">
                { for MENU.iter().filter(|item| is_admin || !item.admin_only).map(|item| html! {
                    <a href={item.href} class="block px-3 py-2 rounded hover:bg-gray-200">{item.label}</a>
                }) }
            </nav>
            <div class="flex-1">
                <header class="flex items-center justify-end gap-4 px-6 py-3 border-b">
                    <span class="text-sm text-gray-600">{name}</span>
                    <button class="px-3 py-1 text-sm border rounded hover:bg-gray-100" onclick={on_logout}>
                        {"로그아웃"}
                    </button>
                </header>
                <DashboardView />
            </div>
        </div>
    }
}
