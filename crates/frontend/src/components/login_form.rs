//! Email and password sign-in form

use crate::auth::use_session;
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[function_component(LoginForm)]
pub fn login_form() -> Html {
    let session = use_session();
    let email = use_state(String::new);
    let password = use_state(String::new);

    let on_email = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            email.set(e.target_unchecked_into::<HtmlInputElement>().value());
        })
    };

    let on_password = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| {
            password.set(e.target_unchecked_into::<HtmlInputElement>().value());
        })
    };

    let on_submit = {
        let session = session.clone();
        let email = email.clone();
        let password = password.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            session.login(email.trim().to_string(), (*password).clone());
        })
    };

    html! {
        <div class="max-w-sm mx-auto mt-16 bg-white rounded-lg shadow p-8">
            <h1 class="text-2xl font-bold text-center mb-2">{"대학교 데이터 대시보드"}</h1>
            <p class="text-sm text-gray-500 text-center mb-6">{"로그인하여 계속하기"}</p>

            if let Some(error) = session.error() {
                <div class="mb-4 p-3 bg-red-50 text-red-700 rounded text-sm">
                    {error}
                </div>
            }

            <form onsubmit={on_submit} class="space-y-4">
                <input
                    type="email"
                    class="w-full px-3 py-2 border rounded"
                    placeholder="이메일"
                    autocomplete="email"
                    value={(*email).clone()}
                    oninput={on_email}
                />
                <input
                    type="password"
                    class="w-full px-3 py-2 border rounded"
                    placeholder="비밀번호"
                    autocomplete="current-password"
                    value={(*password).clone()}
                    oninput={on_password}
                />
                <button
                    type="submit"
                    class="w-full py-2 bg-blue-600 text-white rounded hover:bg-blue-700 disabled:opacity-50"
                    disabled={session.is_loading()}
                >
                    { if session.is_loading() { "로그인 중..." } else { "로그인" } }
                </button>
            </form>
        </div>
    }
}
