//! Banner for the `error` query parameter on the sign-in page.

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use session::{ERROR_PARAM, REDIRECT_PARAM};

use crate::util::auth_error::present;

#[component]
pub fn AuthErrorNotice() -> impl IntoView {
    let query = use_query_map();
    let notice = Memo::new(move |_| {
        query.with(|params| present(params.get(ERROR_PARAM).as_deref(), params.get(REDIRECT_PARAM).as_deref()))
    });

    move || {
        notice.get().map(|notice| {
            view! {
                <div class="auth-error" role="alert">
                    <p class="auth-error__message">{notice.message}</p>
                    {notice.retry_target.map(|target| {
                        view! { <a class="auth-error__retry" href=target>"Tentar novamente"</a> }
                    })}
                </div>
            }
        })
    }
}
