use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::components::admin_map::AdminMap;
use crate::components::scanner_modal::ScannerModal;
use crate::hooks::{refresh_selection, upsert_driver_position, use_live_sync};
use crate::models::{DriverStats, LiveEvent, MapData, Package, PackageStatus, ProofImage};
use crate::services::api_client;
use crate::utils::status::{eff_color, status_emoji, status_label};

fn eff_badge(eff: f64) -> Html {
    let pct = (eff * 100.0).round() as i64;
    html! { <span class={format!("pill {}", eff_color(eff))}>{format!("{}%", pct)}</span> }
}

fn proof_gallery(proofs: &[ProofImage]) -> Html {
    if proofs.is_empty() {
        return html! { <div class="small">{"Sin evidencias."}</div> };
    }
    let thumbs: Html = proofs
        .iter()
        .map(|p| {
            html! {
                <a key={p.id.to_string()} href={p.url.clone()} target="_blank" rel="noreferrer" title={p.proof_type.clone()}>
                    <img class="thumb" src={p.url.clone()} alt={p.proof_type.clone()} />
                </a>
            }
        })
        .collect();
    html! { <div class="thumbRow">{ thumbs }</div> }
}

/// Re-fetch de la lista principal. Mantiene fresca la selección: si el
/// driver seleccionado ya no existe en los datos nuevos, la selección
/// vuelve a ninguna. Devuelve la selección refrescada.
async fn load_stats(
    drivers: UseStateHandle<Vec<DriverStats>>,
    selected: UseStateHandle<Option<DriverStats>>,
    selected_ref: Rc<RefCell<Option<i64>>>,
    err: UseStateHandle<String>,
) -> Option<Option<DriverStats>> {
    match api_client::drivers_stats().await {
        Ok(list) => {
            let still = refresh_selection(&list, *selected_ref.borrow());
            if selected_ref.borrow().is_some() {
                selected.set(still.clone());
            }
            drivers.set(list);
            Some(still)
        }
        Err(e) => {
            err.set(e.to_string());
            None
        }
    }
}

async fn load_driver_packages(
    driver_id: i64,
    status: PackageStatus,
    driver_pkgs: UseStateHandle<Vec<Package>>,
    err: UseStateHandle<String>,
) -> Option<Vec<Package>> {
    match api_client::driver_packages_admin(driver_id, status.as_query()).await {
        Ok(pk) => {
            driver_pkgs.set(pk.clone());
            Some(pk)
        }
        Err(e) => {
            err.set(e.to_string());
            None
        }
    }
}

/// Carga del mapa: re-fetch y reemplazo completo, así los refrescos
/// duplicados (polling + evento empujado) convergen sin efectos raros.
async fn load_map(
    map_cell: Rc<RefCell<MapData>>,
    map_data: UseStateHandle<MapData>,
    err: UseStateHandle<String>,
) {
    match api_client::admin_map_data().await {
        Ok(data) => {
            *map_cell.borrow_mut() = data.clone();
            map_data.set(data);
        }
        Err(e) => err.set(e.to_string()),
    }
}

#[function_component(Admin)]
pub fn admin() -> Html {
    let err = use_state(String::new);
    let drivers = use_state(Vec::<DriverStats>::new);
    let selected = use_state(|| None::<DriverStats>);
    let driver_tab = use_state(|| PackageStatus::Assigned);
    let driver_pkgs = use_state(Vec::<Package>::new);
    let pkg_modal = use_state(|| None::<Package>);

    // el estado del mapa vive también en una celda: el canal en vivo la
    // muta y la vuelca al estado, sin leer snapshots rancios del montaje
    let map_cell = use_mut_ref(MapData::default);
    let map_data = use_state(MapData::default);

    let search_code = use_state(String::new);
    let scan_open = use_state(|| false);

    // celdas que el canal en vivo lee para observar la selección ACTUAL
    // en el momento de cada evento, no la del momento de la suscripción
    let selected_ref = use_mut_ref(|| None::<i64>);
    let tab_ref = use_mut_ref(|| PackageStatus::Assigned);
    let modal_ref = use_mut_ref(|| None::<i64>);

    {
        let selected_ref = selected_ref.clone();
        use_effect_with((*selected).clone(), move |sel| {
            *selected_ref.borrow_mut() = sel.as_ref().map(|d| d.id);
            || ()
        });
    }
    {
        let tab_ref = tab_ref.clone();
        use_effect_with(*driver_tab, move |tab| {
            *tab_ref.borrow_mut() = *tab;
            || ()
        });
    }
    {
        let modal_ref = modal_ref.clone();
        use_effect_with((*pkg_modal).clone(), move |modal| {
            *modal_ref.borrow_mut() = modal.as_ref().map(|p| p.id);
            || ()
        });
    }

    // carga inicial: lista de drivers + datos del mapa
    {
        let drivers = drivers.clone();
        let selected = selected.clone();
        let selected_ref = selected_ref.clone();
        let map_cell = map_cell.clone();
        let map_data = map_data.clone();
        let err = err.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                let _ = load_stats(drivers, selected, selected_ref, err.clone()).await;
                load_map(map_cell, map_data, err).await;
            });
            || ()
        });
    }

    // la pestaña del driver seleccionado se re-fetchea al cambiar selección o pestaña
    {
        let driver_pkgs = driver_pkgs.clone();
        let err = err.clone();
        let dep = ((*selected).as_ref().map(|d| d.id), *driver_tab);
        use_effect_with(dep, move |(sel_id, tab)| {
            if let Some(id) = *sel_id {
                let tab = *tab;
                wasm_bindgen_futures::spawn_local(async move {
                    let _ = load_driver_packages(id, tab, driver_pkgs, err).await;
                });
            }
            || ()
        });
    }

    // canal en vivo: un solo EventSource por montaje del dashboard, con
    // los eventos despachados en orden estricto de llegada
    {
        let drivers = drivers.clone();
        let selected = selected.clone();
        let driver_pkgs = driver_pkgs.clone();
        let pkg_modal = pkg_modal.clone();
        let map_cell = map_cell.clone();
        let map_data = map_data.clone();
        let err = err.clone();
        let selected_ref = selected_ref.clone();
        let tab_ref = tab_ref.clone();
        let modal_ref = modal_ref.clone();

        use_live_sync(move |event: LiveEvent| {
            let drivers = drivers.clone();
            let selected = selected.clone();
            let driver_pkgs = driver_pkgs.clone();
            let pkg_modal = pkg_modal.clone();
            let map_cell = map_cell.clone();
            let map_data = map_data.clone();
            let err = err.clone();
            let selected_ref = selected_ref.clone();
            let tab_ref = tab_ref.clone();
            let modal_ref = modal_ref.clone();

            async move {
                match event {
                    LiveEvent::DriverLocation(pos) => {
                        // upsert por identidad: en sitio si ya está, de
                        // primero si es nuevo; queda aplicado antes de que
                        // empiece el siguiente evento
                        let updated = {
                            let mut cell = map_cell.borrow_mut();
                            upsert_driver_position(&mut cell.drivers, pos);
                            cell.clone()
                        };
                        map_data.set(updated);
                    }
                    LiveEvent::PackageClosed(notice) => {
                        log::info!("🔄 Cierre de {} empujado por el servidor, reconciliando", notice.code);

                        // 1) lista principal
                        let Some(still) =
                            load_stats(drivers, selected, selected_ref, err.clone()).await
                        else {
                            return;
                        };

                        // 2) si hay un driver en pantalla, su pestaña actual
                        if let Some(sel) = still {
                            let tab = *tab_ref.borrow();
                            if let Some(pk) =
                                load_driver_packages(sel.id, tab, driver_pkgs, err).await
                            {
                                // 3) modal abierto: refrescar en sitio si el
                                // paquete sigue en los datos nuevos; si no,
                                // se queda mostrando lo que tenía en vez de
                                // cerrarse solo
                                let modal_id = *modal_ref.borrow();
                                if let Some(modal_id) = modal_id {
                                    if let Some(updated) = pk.iter().find(|p| p.id == modal_id) {
                                        pkg_modal.set(Some(updated.clone()));
                                    }
                                }
                            }
                        }
                    }
                    LiveEvent::Other => {}
                }
            }
        });
    }

    // refs de formularios
    let new_d_user_ref = use_node_ref();
    let new_d_name_ref = use_node_ref();
    let new_d_pass_ref = use_node_ref();
    let new_p_recipient_ref = use_node_ref();
    let new_p_address_ref = use_node_ref();
    let new_p_phone_ref = use_node_ref();
    let new_p_driver_ref = use_node_ref();
    let assign_driver_ref = use_node_ref();

    let reload_stats = {
        let drivers = drivers.clone();
        let selected = selected.clone();
        let selected_ref = selected_ref.clone();
        let err = err.clone();
        move || {
            let drivers = drivers.clone();
            let selected = selected.clone();
            let selected_ref = selected_ref.clone();
            let err = err.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let _ = load_stats(drivers, selected, selected_ref, err).await;
            });
        }
    };

    let on_refresh_map = {
        let map_cell = map_cell.clone();
        let map_data = map_data.clone();
        let err = err.clone();
        Callback::from(move |_| {
            let map_cell = map_cell.clone();
            let map_data = map_data.clone();
            let err = err.clone();
            wasm_bindgen_futures::spawn_local(load_map(map_cell, map_data, err));
        })
    };

    let on_create_driver = {
        let new_d_user_ref = new_d_user_ref.clone();
        let new_d_name_ref = new_d_name_ref.clone();
        let new_d_pass_ref = new_d_pass_ref.clone();
        let err = err.clone();
        let reload_stats = reload_stats.clone();
        Callback::from(move |_: MouseEvent| {
            let (Some(user), Some(name), Some(pass)) = (
                new_d_user_ref.cast::<HtmlInputElement>(),
                new_d_name_ref.cast::<HtmlInputElement>(),
                new_d_pass_ref.cast::<HtmlInputElement>(),
            ) else {
                return;
            };
            let err = err.clone();
            let reload_stats = reload_stats.clone();
            err.set(String::new());
            wasm_bindgen_futures::spawn_local(async move {
                match api_client::create_driver(&user.value(), &name.value(), &pass.value()).await
                {
                    Ok(_) => reload_stats(),
                    Err(e) => err.set(e.to_string()),
                }
            });
        })
    };

    let on_create_package = {
        let new_p_recipient_ref = new_p_recipient_ref.clone();
        let new_p_address_ref = new_p_address_ref.clone();
        let new_p_phone_ref = new_p_phone_ref.clone();
        let new_p_driver_ref = new_p_driver_ref.clone();
        let driver_pkgs = driver_pkgs.clone();
        let selected_ref = selected_ref.clone();
        let tab_ref = tab_ref.clone();
        let err = err.clone();
        let reload_stats = reload_stats.clone();
        Callback::from(move |_: MouseEvent| {
            let (Some(recipient), Some(address), Some(phone), Some(driver_sel)) = (
                new_p_recipient_ref.cast::<HtmlInputElement>(),
                new_p_address_ref.cast::<HtmlInputElement>(),
                new_p_phone_ref.cast::<HtmlInputElement>(),
                new_p_driver_ref.cast::<HtmlSelectElement>(),
            ) else {
                return;
            };
            err.set(String::new());
            let Ok(driver_id) = driver_sel.value().parse::<i64>() else {
                err.set("Selecciona un repartidor".to_string());
                return;
            };

            let err = err.clone();
            let reload_stats = reload_stats.clone();
            let driver_pkgs = driver_pkgs.clone();
            let selected_ref = selected_ref.clone();
            let tab_ref = tab_ref.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api_client::create_package(
                    &recipient.value(),
                    &address.value(),
                    &phone.value(),
                    driver_id,
                )
                .await
                {
                    Ok(_) => {
                        recipient.set_value("");
                        address.set_value("");
                        phone.set_value("");
                        reload_stats();
                        // si el pedido cayó en el driver que está en pantalla,
                        // refrescar también su pestaña
                        if *selected_ref.borrow() == Some(driver_id) {
                            let tab = *tab_ref.borrow();
                            let _ = load_driver_packages(driver_id, tab, driver_pkgs, err).await;
                        }
                    }
                    Err(e) => err.set(e.to_string()),
                }
            });
        })
    };

    let on_assign_by_code = {
        let search_code = search_code.clone();
        let assign_driver_ref = assign_driver_ref.clone();
        let err = err.clone();
        let reload_stats = reload_stats.clone();
        Callback::from(move |_: MouseEvent| {
            err.set(String::new());
            let code = search_code.trim().to_string();
            if code.is_empty() {
                err.set("Ingresa o escanea un código".to_string());
                return;
            }
            let Some(driver_sel) = assign_driver_ref.cast::<HtmlSelectElement>() else {
                return;
            };
            let Ok(driver_id) = driver_sel.value().parse::<i64>() else {
                err.set("Selecciona un repartidor".to_string());
                return;
            };

            let err = err.clone();
            let reload_stats = reload_stats.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match api_client::assign_by_code(&code, driver_id).await {
                    Ok(_) => reload_stats(),
                    Err(e) => err.set(e.to_string()),
                }
            });
        })
    };

    let err_slot = if !err.is_empty() {
        html! { <div class="bad">{(*err).clone()}</div> }
    } else {
        html! {}
    };

    // ------------------------------------------------------------------
    // Vista de un driver seleccionado
    // ------------------------------------------------------------------
    if let Some(sel) = (*selected).clone() {
        let on_back = {
            let selected = selected.clone();
            let driver_pkgs = driver_pkgs.clone();
            Callback::from(move |_: MouseEvent| {
                selected.set(None);
                driver_pkgs.set(Vec::new());
            })
        };

        let set_admin_tab = |target: PackageStatus| {
            let driver_tab = driver_tab.clone();
            Callback::from(move |_: MouseEvent| driver_tab.set(target))
        };

        let pkg_cards: Html = driver_pkgs
            .iter()
            .map(|p| {
                let open_modal = {
                    let pkg_modal = pkg_modal.clone();
                    let p = p.clone();
                    Callback::from(move |_: MouseEvent| pkg_modal.set(Some(p.clone())))
                };
                let reason = p
                    .non_delivery_reason
                    .as_ref()
                    .map(|r| format!(" • Motivo: {}", r))
                    .unwrap_or_default();
                html! {
                    <div key={p.id.to_string()} class="card" style="cursor:pointer" onclick={open_modal}>
                        <div class="listCard">
                            <div style="min-width:0">
                                <div style="font-weight:950;font-size:16px">
                                    {format!("{} {} ", status_emoji(&p.status), p.recipient_name)}
                                    <span class="tag">{&p.code}</span>
                                </div>
                                <div class="small">{&p.address}</div>
                                <div class="small">{format!("Estado: {}{}", status_label(&p.status), reason)}</div>
                            </div>
                            <span class="pill gray">{&p.status}</span>
                        </div>
                    </div>
                }
            })
            .collect();

        let modal = if let Some(pm) = (*pkg_modal).clone() {
            let close_modal = {
                let pkg_modal = pkg_modal.clone();
                Callback::from(move |_: MouseEvent| pkg_modal.set(None))
            };
            html! {
                <div class="modalBackdrop" onclick={close_modal.clone()}>
                    <div class="card modal" onclick={Callback::from(|e: MouseEvent| e.stop_propagation())}>
                        <div class="headerRow">
                            <h3>{format!("Resumen • {}", pm.code)}</h3>
                            <button class="btn secondary" onclick={close_modal}>{"Cerrar"}</button>
                        </div>
                        <div class="small">
                            {format!("{} {} • {}", status_emoji(&pm.status), status_label(&pm.status), pm.recipient_name)}
                        </div>
                        <hr />
                        <div class="small"><b>{"Dirección: "}</b>{&pm.address}</div>
                        <div class="small"><b>{"Teléfono: "}</b>{pm.phone.clone().unwrap_or_else(|| "—".to_string())}</div>
                        <div class="small"><b>{"Notas: "}</b>{pm.pod_notes.clone().unwrap_or_else(|| "—".to_string())}</div>
                        {
                            if let Some(reason) = &pm.non_delivery_reason {
                                html! { <div class="small"><b>{"Motivo: "}</b>{reason}</div> }
                            } else {
                                html! {}
                            }
                        }
                        <hr />
                        <h3>{"Evidencias"}</h3>
                        { proof_gallery(&pm.proofs) }
                    </div>
                </div>
            }
        } else {
            html! {}
        };

        return html! {
            <div class="container">
                <div class="card">
                    <div class="headerRow">
                        <div>
                            <h2 style="margin:0">{&sel.full_name}{" "}<span class="tag">{format!("@{}", sel.username)}</span></h2>
                            <div class="small">
                                {"Efectividad: "}{eff_badge(sel.effectiveness)}
                                {" • Cerrados "}<span class="kbd">{sel.closed}</span>
                            </div>
                        </div>
                        <button class="btn secondary" onclick={on_back}>{"Volver"}</button>
                    </div>

                    { err_slot }

                    <hr />
                    <div class="navTabs">
                        <button class={ if *driver_tab == PackageStatus::Delivered { "btn" } else { "btn secondary" } } onclick={set_admin_tab(PackageStatus::Delivered)}>{"Pedidos exitosos"}</button>
                        <button class={ if *driver_tab == PackageStatus::NotDelivered { "btn danger" } else { "btn secondary" } } onclick={set_admin_tab(PackageStatus::NotDelivered)}>{"Pedidos fallidos"}</button>
                        <button class={ if *driver_tab == PackageStatus::Assigned { "btn" } else { "btn secondary" } } onclick={set_admin_tab(PackageStatus::Assigned)}>{"Pendientes"}</button>
                    </div>

                    <hr />
                    <div style="display:grid;gap:10px">
                        { pkg_cards }
                        { if driver_pkgs.is_empty() { html! { <div class="small">{"No hay pedidos en esta categoría."}</div> } } else { html! {} } }
                    </div>

                    { modal }
                </div>
            </div>
        };
    }

    // ------------------------------------------------------------------
    // Lista de repartidores + formularios + mapa
    // ------------------------------------------------------------------
    let driver_cards: Html = drivers
        .iter()
        .map(|d| {
            let on_select = {
                let selected = selected.clone();
                let driver_tab = driver_tab.clone();
                let d = d.clone();
                Callback::from(move |_: MouseEvent| {
                    selected.set(Some(d.clone()));
                    driver_tab.set(PackageStatus::Assigned);
                })
            };
            html! {
                <div key={d.id.to_string()} class="card" style="cursor:pointer" onclick={on_select.clone()}>
                    <div class="listCard">
                        <div>
                            <div style="font-weight:950;font-size:18px">
                                {&d.full_name}{" "}<span class="tag">{format!("@{}", d.username)}</span>
                            </div>
                            <div class="small">
                                {"Cerrados: "}<span class="kbd">{d.closed}</span>
                                {format!(" • 🟩 {} • 🟥 {}", d.delivered, d.failed)}
                            </div>
                        </div>
                        <div class="row" style="align-items:center">
                            { eff_badge(d.effectiveness) }
                            <button class="btn secondary" onclick={on_select}>{"Ver pedidos"}</button>
                        </div>
                    </div>
                </div>
            }
        })
        .collect();

    let driver_options: Html = drivers
        .iter()
        .map(|d| {
            html! {
                <option key={d.id.to_string()} value={d.id.to_string()}>
                    {format!("{} (@{})", d.full_name, d.username)}
                </option>
            }
        })
        .collect();

    let on_search_code = {
        let search_code = search_code.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            search_code.set(input.value());
        })
    };

    html! {
        <div class="container">
            <div class="card">
                <h2>{"Repartidores"}</h2>
                <div class="small">{"Efectividad = Entregados / (Entregados + Fallidos). Pendientes no cuentan."}</div>
                { err_slot }
                <hr />
                <div style="display:grid;gap:10px">
                    { driver_cards }
                    { if drivers.is_empty() { html! { <div class="small">{"Aún no hay repartidores. Crea uno abajo."}</div> } } else { html! {} } }
                </div>

                <hr />
                <h3>{"Crear repartidor"}</h3>
                <div class="grid2">
                    <div>
                        <label>{"Usuario"}</label>
                        <input class="input" ref={new_d_user_ref} placeholder="driver1" />
                    </div>
                    <div>
                        <label>{"Nombre"}</label>
                        <input class="input" ref={new_d_name_ref} placeholder="Repartidor 1" />
                    </div>
                    <div>
                        <label>{"Contraseña"}</label>
                        <input class="input" ref={new_d_pass_ref} placeholder="driver123" />
                    </div>
                    <div style="display:flex;align-items:end">
                        <button class="btn" style="width:100%" onclick={on_create_driver}>{"Crear"}</button>
                    </div>
                </div>

                <hr />
                <h3>{"Cargar pedido (manual) y asignar"}</h3>
                <div class="grid2">
                    <div>
                        <label>{"Cliente"}</label>
                        <input class="input" ref={new_p_recipient_ref} />
                        <label>{"Dirección"}</label>
                        <input class="input" ref={new_p_address_ref} />
                        <label>{"Teléfono"}</label>
                        <input class="input" ref={new_p_phone_ref} />
                    </div>
                    <div>
                        <label>{"Repartidor"}</label>
                        <select class="input" ref={new_p_driver_ref}>{ driver_options.clone() }</select>
                        <div style="margin-top:12px">
                            <button class="btn" style="width:100%" onclick={on_create_package}>{"Crear pedido"}</button>
                        </div>

                        <hr />
                        <h3>{"Asignar por código"}</h3>
                        <div class="small">{"Escanea o escribe y asigna al driver."}</div>
                        <label>{"Buscar código"}</label>
                        <div class="row">
                            <input class="input" value={(*search_code).clone()} oninput={on_search_code} placeholder="ZERO0007" />
                            <button class="btn secondary" onclick={{
                                let scan_open = scan_open.clone();
                                Callback::from(move |_| scan_open.set(true))
                            }}>{"Escanear"}</button>
                        </div>
                        <label>{"Asignar a"}</label>
                        <select class="input" ref={assign_driver_ref}>{ driver_options }</select>
                        <div style="margin-top:12px">
                            <button class="btn" style="width:100%" onclick={on_assign_by_code}>{"Asignar"}</button>
                        </div>
                    </div>
                </div>

                <AdminMap data={(*map_data).clone()} on_refresh={on_refresh_map} />

                <ScannerModal
                    open={*scan_open}
                    on_close={{
                        let scan_open = scan_open.clone();
                        Callback::from(move |_| scan_open.set(false))
                    }}
                    on_result={{
                        let search_code = search_code.clone();
                        Callback::from(move |text: String| search_code.set(text))
                    }}
                />
            </div>
        </div>
    }
}
