use web_sys::{window, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

use crate::components::scanner_modal::ScannerModal;
use crate::hooks::use_location_beacon;
use crate::models::{
    CaptureError, CaptureSession, CloseOutcome, Package, PackageStatus, PickedFile,
};
use crate::services::{api_client, auth_service, geolocation};
use crate::utils::status::{status_emoji, status_label};

/// Pestañas del repartidor, cada una mapea a un estado de paquete.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DriverTab {
    Pending,
    Success,
    Failed,
}

impl DriverTab {
    fn matches(self, status: PackageStatus) -> bool {
        match self {
            DriverTab::Pending => status == PackageStatus::Assigned,
            DriverTab::Success => status == PackageStatus::Delivered,
            DriverTab::Failed => status == PackageStatus::NotDelivered,
        }
    }
}

/// Filtro combinado de búsqueda + pestaña, preservando el orden del server.
fn filter_packages(pkgs: &[Package], search: &str, tab: DriverTab) -> Vec<Package> {
    let q = search.trim().to_uppercase();
    pkgs.iter()
        .filter(|p| {
            let by_text = q.is_empty()
                || p.code.to_uppercase().contains(&q)
                || p.recipient_name.to_uppercase().contains(&q);
            by_text && tab.matches(p.status())
        })
        .cloned()
        .collect()
}

fn count_by(pkgs: &[Package], tab: DriverTab) -> usize {
    pkgs.iter().filter(|p| tab.matches(p.status())).count()
}

#[derive(Clone, PartialEq)]
enum Screen {
    List,
    Detail(Package),
    Deliver(Package),
    Report(Package),
}

fn open_whatsapp(phone: Option<&str>, text: &str) {
    let digits: String = phone
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let msg = String::from(js_sys::encode_uri_component(text));
    let url = if digits.is_empty() {
        format!("https://wa.me/?text={}", msg)
    } else {
        format!("https://wa.me/{}?text={}", digits, msg)
    };
    if let Some(win) = window() {
        let _ = win.open_with_url_and_target(&url, "_blank");
    }
}

fn open_maps(address: &str) {
    let query = String::from(js_sys::encode_uri_component(address));
    let url = format!("https://www.google.com/maps/search/?api=1&query={}", query);
    if let Some(win) = window() {
        let _ = win.open_with_url_and_target(&url, "_blank");
    }
}

fn call_phone(phone: Option<&str>) {
    let p = phone.unwrap_or("").trim().to_string();
    if let Some(win) = window() {
        let _ = win.location().set_href(&format!("tel:{}", p));
    }
}

fn wa_greeting(recipient: &str) -> String {
    format!("Hola {}, soy tu repartidor de ZERO LOGÍSTICA.", recipient)
}

async fn load(
    pkgs: UseStateHandle<Vec<Package>>,
    reasons: UseStateHandle<Vec<String>>,
    selected_reason: UseStateHandle<String>,
    err: UseStateHandle<String>,
) {
    match api_client::my_packages().await {
        Ok(p) => pkgs.set(p),
        Err(e) => {
            err.set(e.to_string());
            return;
        }
    }
    match api_client::reasons().await {
        Ok(rs) => {
            if selected_reason.is_empty() {
                if let Some(first) = rs.first() {
                    selected_reason.set(first.clone());
                }
            }
            reasons.set(rs);
        }
        Err(e) => err.set(e.to_string()),
    }
}

/// Handles que necesita el cierre de un paquete (entrega o reporte).
#[derive(Clone)]
struct CloseHandles {
    capture: UseStateHandle<CaptureSession>,
    pod_notes: UseStateHandle<String>,
    selected_reason: UseStateHandle<String>,
    screen: UseStateHandle<Screen>,
    tab: UseStateHandle<DriverTab>,
    pkgs: UseStateHandle<Vec<Package>>,
    reasons: UseStateHandle<Vec<String>>,
    err: UseStateHandle<String>,
}

/// Flujo de cierre completo: gate de fotos, GPS de mejor esfuerzo, envío,
/// recarga y vuelta a la lista en la pestaña del nuevo estado. Cualquier
/// error de validación corta antes de tocar la red.
fn spawn_close(pkg: Package, outcome: CloseOutcome, h: CloseHandles) {
    wasm_bindgen_futures::spawn_local(async move {
        h.err.set(String::new());

        let capture = (*h.capture).clone();
        if !capture.can_submit() {
            h.err.set(CaptureError::NotEnoughPhotos.to_string());
            return;
        }

        let (default_notes, reason, target_tab) = match outcome {
            CloseOutcome::Delivered => ("Entregado", None, DriverTab::Success),
            CloseOutcome::NotDelivered => (
                "No entregado",
                Some((*h.selected_reason).clone()),
                DriverTab::Failed,
            ),
        };
        let notes = if h.pod_notes.trim().is_empty() {
            default_notes.to_string()
        } else {
            (*h.pod_notes).clone()
        };

        // GPS una sola vez; si el usuario no da permiso se cierra sin ubicación
        let fix = geolocation::current_position(geolocation::GEO_TIMEOUT_MS).await;

        let payload = match capture.build_submission(&notes, reason.as_deref(), fix, outcome) {
            Ok(p) => p,
            Err(e) => {
                h.err.set(e.to_string());
                return;
            }
        };

        let result = match outcome {
            CloseOutcome::Delivered => api_client::close_delivered(pkg.id, &payload).await,
            CloseOutcome::NotDelivered => api_client::close_not_delivered(pkg.id, &payload).await,
        };

        match result {
            Ok(_) => {
                load(h.pkgs, h.reasons, h.selected_reason, h.err).await;
                h.capture.set(CaptureSession::new());
                h.pod_notes.set(String::new());
                h.screen.set(Screen::List);
                h.tab.set(target_tab);
            }
            Err(e) => h.err.set(e.to_string()),
        }
    });
}

#[function_component(Driver)]
pub fn driver() -> Html {
    let err = use_state(String::new);
    let pkgs = use_state(Vec::<Package>::new);
    let search = use_state(String::new);
    let scan_open = use_state(|| false);

    let screen = use_state(|| Screen::List);
    let reasons = use_state(Vec::<String>::new);
    let selected_reason = use_state(String::new);
    let pod_notes = use_state(String::new);
    let capture = use_state(CaptureSession::new);
    let tab = use_state(|| DriverTab::Pending);

    // GPS del repartidor cada 3 minutos para el mapa del admin
    use_location_beacon();

    {
        let pkgs = pkgs.clone();
        let reasons = reasons.clone();
        let selected_reason = selected_reason.clone();
        let err = err.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(load(pkgs, reasons, selected_reason, err));
            || ()
        });
    }

    let close_handles = CloseHandles {
        capture: capture.clone(),
        pod_notes: pod_notes.clone(),
        selected_reason: selected_reason.clone(),
        screen: screen.clone(),
        tab: tab.clone(),
        pkgs: pkgs.clone(),
        reasons: reasons.clone(),
        err: err.clone(),
    };

    // Acumula selecciones (el usuario elige 1 foto, luego otra) sin
    // duplicados; limpiar el value permite re-elegir el mismo archivo.
    let on_pick_images = {
        let capture = capture.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut picked = Vec::new();
            if let Some(files) = input.files() {
                for i in 0..files.length() {
                    if let Some(file) = files.get(i) {
                        picked.push(PickedFile::from_file(&file));
                    }
                }
            }
            input.set_value("");
            if picked.is_empty() {
                return;
            }
            let mut session = (*capture).clone();
            session.add_files(picked);
            capture.set(session);
        })
    };

    let go_list = {
        let screen = screen.clone();
        let pod_notes = pod_notes.clone();
        let capture = capture.clone();
        Callback::from(move |_: MouseEvent| {
            screen.set(Screen::List);
            pod_notes.set(String::new());
            capture.set(CaptureSession::new());
        })
    };

    let err_slot = if !err.is_empty() {
        html! { <div class="bad">{(*err).clone()}</div> }
    } else {
        html! {}
    };

    // ------------------------------------------------------------------
    // Detalle
    // ------------------------------------------------------------------
    if let Screen::Detail(p) = (*screen).clone() {
        let locked = p.is_terminal();

        let go_capture = |target: fn(Package) -> Screen| {
            let screen = screen.clone();
            let pod_notes = pod_notes.clone();
            let capture = capture.clone();
            let err = err.clone();
            let p = p.clone();
            Callback::from(move |_: MouseEvent| {
                // precondición, no solo UI escondida: un paquete terminal
                // no vuelve a entrar al flujo de captura
                if p.is_terminal() {
                    err.set(CaptureError::PackageClosed.to_string());
                    return;
                }
                pod_notes.set(String::new());
                capture.set(CaptureSession::new());
                screen.set(target(p.clone()));
            })
        };
        let go_deliver = go_capture(Screen::Deliver);
        let go_report = go_capture(Screen::Report);

        let proofs: Html = p
            .proofs
            .iter()
            .map(|pr| {
                html! {
                    <a key={pr.id.to_string()} href={pr.url.clone()} target="_blank" rel="noreferrer" title={pr.proof_type.clone()}>
                        <img class="thumb" src={pr.url.clone()} alt={pr.proof_type.clone()} />
                    </a>
                }
            })
            .collect();

        let phone = p.phone.clone();
        let phone_wa = p.phone.clone();
        let address = p.address.clone();
        let recipient = p.recipient_name.clone();

        return html! {
            <div class="container">
                <div class="card">
                    <div class="headerRow">
                        <h2 style="margin:0">{&p.recipient_name}</h2>
                        <button class="btn secondary" onclick={go_list.clone()}>{"Volver"}</button>
                    </div>
                    { err_slot }
                    <div class="small">
                        <span class="kbd">{&p.code}</span>
                        {format!(" • {} {}", status_emoji(&p.status), status_label(&p.status))}
                    </div>
                    <hr />
                    <div class="small">{format!("📍 {}", p.address)}</div>
                    <div class="row" style="margin-top:10px">
                        <button class="btn secondary" onclick={Callback::from(move |_| call_phone(phone.as_deref()))}>{"Llamar"}</button>
                        <button class="btn secondary" onclick={Callback::from(move |_| open_whatsapp(phone_wa.as_deref(), &wa_greeting(&recipient)))}>{"WhatsApp"}</button>
                        <button class="btn secondary" onclick={Callback::from(move |_| open_maps(&address))}>{"Maps"}</button>
                    </div>

                    <hr />
                    {
                        if locked {
                            html! {
                                <>
                                    <div class="small">{"🔒 Pedido cerrado. Solo lectura."}</div>
                                    <hr />
                                    <h3>{"Evidencias"}</h3>
                                    <div class="thumbRow">{ proofs }</div>
                                </>
                            }
                        } else {
                            html! {
                                <div class="row">
                                    <button class="btn" onclick={go_deliver}>{"Entregar"}</button>
                                    <button class="btn danger" onclick={go_report}>{"Reportar / No entregado"}</button>
                                </div>
                            }
                        }
                    }
                </div>
            </div>
        };
    }

    // ------------------------------------------------------------------
    // Entregar / Reportar (sesión de captura)
    // ------------------------------------------------------------------
    if let Screen::Deliver(p) | Screen::Report(p) = (*screen).clone() {
        let is_report = matches!(*screen, Screen::Report(_));
        let can_close = capture.can_submit();

        let back_to_detail = {
            let screen = screen.clone();
            let pod_notes = pod_notes.clone();
            let capture = capture.clone();
            let p = p.clone();
            Callback::from(move |_: MouseEvent| {
                // salir de la pantalla de captura descarta la sesión en curso
                pod_notes.set(String::new());
                capture.set(CaptureSession::new());
                screen.set(Screen::Detail(p.clone()));
            })
        };

        let picked_rows: Html = capture
            .files()
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let remove = {
                    let capture = capture.clone();
                    let err = err.clone();
                    Callback::from(move |_: MouseEvent| {
                        let mut session = (*capture).clone();
                        match session.remove_at(i) {
                            Ok(_) => capture.set(session),
                            Err(e) => err.set(e.to_string()),
                        }
                    })
                };
                html! {
                    <div key={format!("{}_{}_{}", f.name, f.size, f.last_modified)} class="row" style="justify-content:space-between;align-items:center">
                        <div class="small" style="min-width:0;overflow:hidden;text-overflow:ellipsis;white-space:nowrap">
                            {format!("{}. {}", i + 1, f.name)}
                        </div>
                        <button class="btn secondary" type="button" onclick={remove}>{"Quitar"}</button>
                    </div>
                }
            })
            .collect();

        let reason_options: Html = reasons
            .iter()
            .map(|r| html! { <option key={r.clone()} value={r.clone()} selected={*r == *selected_reason}>{r}</option> })
            .collect();

        let on_reason_change = {
            let selected_reason = selected_reason.clone();
            Callback::from(move |e: Event| {
                let select: HtmlSelectElement = e.target_unchecked_into();
                selected_reason.set(select.value());
            })
        };

        let on_notes_input = {
            let pod_notes = pod_notes.clone();
            Callback::from(move |e: InputEvent| {
                let area: HtmlTextAreaElement = e.target_unchecked_into();
                pod_notes.set(area.value());
            })
        };

        let on_close_pkg = {
            let h = close_handles.clone();
            let p = p.clone();
            let outcome = if is_report {
                CloseOutcome::NotDelivered
            } else {
                CloseOutcome::Delivered
            };
            Callback::from(move |_: MouseEvent| spawn_close(p.clone(), outcome, h.clone()))
        };

        return html! {
            <div class="container">
                <div class="card">
                    <div class="headerRow">
                        <h2 style="margin:0">{ if is_report { "Reportar / No entregado" } else { "Entregar" } }</h2>
                        <button class="btn secondary" onclick={back_to_detail}>{"Volver"}</button>
                    </div>
                    { err_slot }
                    <div class="small"><span class="kbd">{&p.code}</span>{format!(" • {}", p.recipient_name)}</div>

                    <hr />
                    <div class="card">
                        <h3>{"Evidencia (obligatoria)"}</h3>
                        <div class="small">
                            {"Para cerrar: "}<b>{"mínimo 2 fotos"}</b>{". "}
                            { if is_report { "No entregado: fachada + evidencia." } else { "Entregado: persona + fachada." } }
                        </div>

                        <label>{"Seleccionar fotos (mínimo 2)"}</label>
                        <input class="input" type="file" accept="image/*" multiple=true onchange={on_pick_images.clone()} />
                        <div class="small">{"Seleccionadas: "}<span class="kbd">{capture.len()}</span></div>

                        {
                            if !capture.is_empty() {
                                html! {
                                    <div class="card" style="margin-top:10px">
                                        <div class="small" style="margin-bottom:8px">{"📸 Tus evidencias (puedes quitar alguna si te equivocaste)"}</div>
                                        <div style="display:grid;gap:8px">{ picked_rows }</div>
                                    </div>
                                }
                            } else {
                                html! {}
                            }
                        }

                        {
                            if is_report {
                                html! {
                                    <>
                                        <label>{format!("Motivo ({} opciones)", reasons.len())}</label>
                                        <select class="input" onchange={on_reason_change}>{ reason_options }</select>
                                    </>
                                }
                            } else {
                                html! {}
                            }
                        }

                        <label>{"Notas (opcional)"}</label>
                        <textarea class="input" rows="3" value={(*pod_notes).clone()} oninput={on_notes_input} placeholder="Notas..." />
                    </div>

                    <hr />
                    <h3>{"Cerrar paquete"}</h3>
                    <div class="small">{"El botón se habilita solo cuando hay "}<b>{"2 fotos o más"}</b>{"."}</div>
                    <div class="row" style="margin-top:10px">
                        <button
                            class={ if is_report { "btn danger" } else { "btn" } }
                            disabled={!can_close}
                            onclick={on_close_pkg}
                        >
                            { if is_report { "Cerrar (No entregado)" } else { "Cerrar (Entregado)" } }
                        </button>
                    </div>
                </div>
            </div>
        };
    }

    // ------------------------------------------------------------------
    // Lista
    // ------------------------------------------------------------------
    let filtered = filter_packages(&pkgs, &search, *tab);
    let pending_count = count_by(&pkgs, DriverTab::Pending);
    let success_count = count_by(&pkgs, DriverTab::Success);
    let failed_count = count_by(&pkgs, DriverTab::Failed);

    let set_tab = |target: DriverTab| {
        let tab = tab.clone();
        Callback::from(move |_: MouseEvent| tab.set(target))
    };

    let on_search = {
        let search = search.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            search.set(input.value());
        })
    };

    let cards: Html = filtered
        .iter()
        .map(|p| {
            let open_detail = {
                let screen = screen.clone();
                let p = p.clone();
                Callback::from(move |_: MouseEvent| screen.set(Screen::Detail(p.clone())))
            };
            let phone = p.phone.clone();
            let phone_wa = p.phone.clone();
            let address = p.address.clone();
            let recipient = p.recipient_name.clone();

            html! {
                <div class="card" key={p.id.to_string()}>
                    <div class="listCard">
                        <div style="min-width:0">
                            <div style="font-weight:950;font-size:18px;cursor:pointer" onclick={open_detail}>
                                {format!("{} {}", status_emoji(&p.status), p.recipient_name)}
                            </div>
                            <div class="small"><span class="kbd">{&p.code}</span>{format!(" • {}", p.address)}</div>
                        </div>
                        <div class="row" style="align-items:center">
                            <span class="pill gray">{status_label(&p.status)}</span>
                            <button class="btn secondary" onclick={Callback::from(move |_| call_phone(phone.as_deref()))}>{"Llamar"}</button>
                            <button class="btn secondary" onclick={Callback::from(move |_| open_whatsapp(phone_wa.as_deref(), &wa_greeting(&recipient)))}>{"WhatsApp"}</button>
                            <button class="btn secondary" onclick={Callback::from(move |_| open_maps(&address))}>{"Maps"}</button>
                        </div>
                    </div>
                </div>
            }
        })
        .collect();

    html! {
        <div class="container">
            <div class="card">
                <div class="headerRow">
                    <h2 style="margin:0">{"Repartidor"}</h2>
                    <span class="tag">{auth_service::get_name().unwrap_or_else(|| "Driver".to_string())}</span>
                </div>

                { err_slot }

                <hr />
                <div class="navTabs">
                    <button class={ if *tab == DriverTab::Pending { "btn" } else { "btn secondary" } } onclick={set_tab(DriverTab::Pending)}>
                        {"Pendientes ⬜ "}<span class="kbd">{pending_count}</span>
                    </button>
                    <button class={ if *tab == DriverTab::Success { "btn" } else { "btn secondary" } } onclick={set_tab(DriverTab::Success)}>
                        {"Entregas exitosas 🟩 "}<span class="kbd">{success_count}</span>
                    </button>
                    <button class={ if *tab == DriverTab::Failed { "btn danger" } else { "btn secondary" } } onclick={set_tab(DriverTab::Failed)}>
                        {"Entregas fallidas 🟥 "}<span class="kbd">{failed_count}</span>
                    </button>
                </div>

                <hr />
                <div class="row">
                    <div style="flex:1 1 260px">
                        <label>{"Buscar código"}</label>
                        <input class="input" value={(*search).clone()} oninput={on_search} placeholder="ZERO0003 / Marina..." />
                    </div>
                    <div style="flex:0 0 160px;display:flex;align-items:end">
                        <button class="btn secondary" style="width:100%" onclick={{
                            let scan_open = scan_open.clone();
                            Callback::from(move |_| scan_open.set(true))
                        }}>{"Escanear"}</button>
                    </div>
                </div>
                <ScannerModal
                    open={*scan_open}
                    on_close={{
                        let scan_open = scan_open.clone();
                        Callback::from(move |_| scan_open.set(false))
                    }}
                    on_result={{
                        let search = search.clone();
                        Callback::from(move |text: String| search.set(text))
                    }}
                />

                <hr />
                <div style="display:grid;gap:10px">
                    { cards }
                    { if filtered.is_empty() { html! { <div class="small">{"Nada por aquí. (Eso es bueno 😌)"}</div> } } else { html! {} } }
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(id: i64, code: &str, recipient: &str, status: &str) -> Package {
        Package {
            id,
            code: code.to_string(),
            recipient_name: recipient.to_string(),
            address: "Av. Siempre Viva 123".to_string(),
            phone: None,
            driver_id: Some(1),
            status: status.to_string(),
            pod_notes: None,
            non_delivery_reason: None,
            closed_at: None,
            proofs: vec![],
        }
    }

    #[test]
    fn filtra_por_pestana() {
        let pkgs = vec![
            pkg(1, "ZERO0001", "Marina", "assigned"),
            pkg(2, "ZERO0002", "Luis", "delivered"),
            pkg(3, "ZERO0003", "Ana", "not_delivered"),
        ];

        let pending = filter_packages(&pkgs, "", DriverTab::Pending);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].code, "ZERO0001");

        assert_eq!(count_by(&pkgs, DriverTab::Success), 1);
        assert_eq!(count_by(&pkgs, DriverTab::Failed), 1);
    }

    #[test]
    fn busca_por_codigo_o_destinatario_sin_mayusculas() {
        let pkgs = vec![
            pkg(1, "ZERO0001", "Marina", "assigned"),
            pkg(2, "ZERO0002", "Luis", "assigned"),
        ];

        let by_code = filter_packages(&pkgs, "zero0002", DriverTab::Pending);
        assert_eq!(by_code.len(), 1);
        assert_eq!(by_code[0].recipient_name, "Luis");

        let by_name = filter_packages(&pkgs, "mari", DriverTab::Pending);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].code, "ZERO0001");

        // la búsqueda no cruza pestañas
        assert!(filter_packages(&pkgs, "marina", DriverTab::Success).is_empty());
    }

    #[test]
    fn orden_del_servidor_se_preserva() {
        let pkgs = vec![
            pkg(5, "ZERO0005", "A", "assigned"),
            pkg(1, "ZERO0001", "B", "assigned"),
            pkg(3, "ZERO0003", "C", "assigned"),
        ];
        let ids: Vec<i64> = filter_packages(&pkgs, "", DriverTab::Pending)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![5, 1, 3]);
    }
}
