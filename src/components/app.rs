use yew::prelude::*;

use crate::components::{Admin, Driver, Login};
use crate::hooks::{use_idle_logout, DEFAULT_IDLE_MS};
use crate::models::Role;
use crate::services::auth_service;

/// Shell de sesión: decide la vista activa según el rol persistido y
/// fuerza el remount del dashboard en cada login/logout.
#[function_component(App)]
pub fn app() -> Html {
    // tick cambia las keys de los dashboards: dos sesiones seguidas del
    // mismo rol nunca comparten estado (selección, capturas, canal en vivo)
    let tick = use_state(|| 0u32);
    let role = auth_service::get_role();

    let logout = {
        let tick = tick.clone();
        Callback::from(move |_: ()| {
            auth_service::clear_auth();
            log::info!("👋 Logout");
            tick.set(*tick + 1);
        })
    };

    // el watchdog solo existe mientras hay sesión; al cerrar sesión el
    // cleanup del hook cancela el timer y quita los listeners
    use_idle_logout(role.is_some(), DEFAULT_IDLE_MS, logout.clone());

    let on_login_done = {
        let tick = tick.clone();
        Callback::from(move |_| tick.set(*tick + 1))
    };

    html! {
        <div class="container">
            <div class="header">
                <div class="brand">
                    <div class="brandDot" />
                    <h1 style="margin:0">{"ZERO LOGÍSTICA"}</h1>
                </div>
                {
                    if let Some(role) = role {
                        let logout = logout.clone();
                        html! {
                            <div class="row" style="align-items:center">
                                <span class="tag">{role.as_str()}</span>
                                <button
                                    class="btn secondary"
                                    onclick={Callback::from(move |_: MouseEvent| logout.emit(()))}
                                >
                                    {"Salir"}
                                </button>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>

            <hr />

            {
                match role {
                    None => html! { <Login on_done={on_login_done} /> },
                    Some(Role::Admin) => html! { <Admin key={format!("a-{}", *tick)} /> },
                    Some(Role::Driver) => html! { <Driver key={format!("d-{}", *tick)} /> },
                }
            }
        </div>
    }
}
