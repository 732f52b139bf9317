use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::services::{api_client, auth_service};

#[derive(Properties, PartialEq)]
pub struct LoginProps {
    pub on_done: Callback<()>,
}

#[function_component(Login)]
pub fn login(props: &LoginProps) -> Html {
    let username_ref = use_node_ref();
    let password_ref = use_node_ref();
    let err = use_state(String::new);
    let loading = use_state(|| false);

    let on_submit = {
        let username_ref = username_ref.clone();
        let password_ref = password_ref.clone();
        let err = err.clone();
        let loading = loading.clone();
        let on_done = props.on_done.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();

            let (Some(username_input), Some(password_input)) = (
                username_ref.cast::<HtmlInputElement>(),
                password_ref.cast::<HtmlInputElement>(),
            ) else {
                return;
            };

            let username = username_input.value();
            let password = password_input.value();

            let err = err.clone();
            let loading = loading.clone();
            let on_done = on_done.clone();
            loading.set(true);
            err.set(String::new());

            wasm_bindgen_futures::spawn_local(async move {
                match api_client::login(&username, &password).await {
                    Ok(auth) => {
                        auth_service::set_auth(&auth);
                        on_done.emit(());
                    }
                    Err(e) => {
                        log::error!("❌ Login fallido: {}", e);
                        err.set(e.to_string());
                    }
                }
                loading.set(false);
            });
        })
    };

    html! {
        <div class="container">
            <div class="card authCard">
                <h2>{"Iniciar sesión"}</h2>
                { if !err.is_empty() { html! { <div class="bad">{(*err).clone()}</div> } } else { html! {} } }
                <form onsubmit={on_submit}>
                    <label>{"Usuario"}</label>
                    <input class="input" ref={username_ref} autocomplete="off" />
                    <label>{"Contraseña"}</label>
                    <input class="input" type="password" ref={password_ref} autocomplete="off" />
                    <div style="margin-top:12px">
                        <button class="btn" style="width:100%" disabled={*loading}>
                            { if *loading { "Entrando…" } else { "Entrar" } }
                        </button>
                    </div>
                </form>
            </div>
        </div>
    }
}
