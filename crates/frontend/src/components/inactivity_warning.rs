//! Inactivity warning dialog

use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct InactivityWarningProps {
    pub open: bool,
    pub on_continue: Callback<()>,
}

/// Shown shortly before an idle session is signed out
#[function_component(InactivityWarningDialog)]
pub fn inactivity_warning_dialog(props: &InactivityWarningProps) -> Html {
    if !props.open {
        return html! {};
    }

    let on_click = props.on_continue.reform(|_: MouseEvent| ());

    html! {
        <div class="fixed inset-0 bg-black bg-opacity-50 flex items-center justify-center z-50"
            role="dialog"
            aria-labelledby="inactivity-dialog-title"
            aria-describedby="inactivity-dialog-description">
            <div class="bg-white rounded-lg p-6 max-w-md w-full mx-4 shadow-xl">
                <h2 id="inactivity-dialog-title" class="text-xl font-bold text-gray-900 mb-4">
                    {"비활성 상태 감지"}
                </h2>
                <p id="inactivity-dialog-description" class="text-gray-600 mb-6">
                    {"비활성 상태로 인해 곧 로그아웃됩니다."}
                    <br />
                    {"계속 사용하시겠습니까?"}
                    <br />
                    <br />
                    {"(1분 후 자동 로그아웃)"}
                </p>
                <div class="flex justify-end">
                    <button
                        class="px-4 py-2 bg-blue-600 text-white rounded hover:bg-blue-700"
                        onclick={on_click}
                        autofocus=true
                    >
                        {"계속 사용"}
                    </button>
                </div>
            </div>
        </div>
    }
}
