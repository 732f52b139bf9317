use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event};
use yew::prelude::*;

pub const DEFAULT_IDLE_MS: u32 = 15 * 60 * 1000; // 15 minutos
// para pruebas manuales se puede pasar p.ej. 15 * 1000

const ACTIVITY_EVENTS: [&str; 5] = ["mousemove", "mousedown", "keydown", "scroll", "touchstart"];

/// Estado puro de la cuenta atrás, separado del DOM para poder probarlo.
/// Invariante: hay deadline si y solo si está armada; dispara una sola vez
/// por ciclo de armado.
#[derive(Clone, PartialEq, Debug)]
pub struct IdleCountdown {
    window_ms: u64,
    deadline: Option<u64>,
}

impl IdleCountdown {
    pub fn new(window_ms: u64) -> IdleCountdown {
        IdleCountdown {
            window_ms,
            deadline: None,
        }
    }

    /// (Re)arma la cuenta atrás a partir de `now`.
    pub fn reset(&mut self, now: u64) {
        self.deadline = Some(now + self.window_ms);
    }

    /// Desarma. Un timer que despierte después de esto no puede disparar.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Devuelve true exactamente una vez cuando la ventana expira; a
    /// partir de ahí queda inerte hasta el siguiente `reset`.
    pub fn try_expire(&mut self, now: u64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Watchdog de inactividad: mientras `is_active`, cualquier señal de
/// actividad (puntero, teclado, scroll, touch) reinicia una única cuenta
/// atrás; si expira sin reinicio, dispara `on_expire` una sola vez.
///
/// Con `is_active == false` no hay timer ni listeners (nada que filtrar
/// contra el shell sin sesión). El cleanup del efecto cancela el timer y
/// quita los listeners de forma determinista: tras un logout el timer
/// pendiente jamás dispara.
#[hook]
pub fn use_idle_logout(is_active: bool, idle_ms: u32, on_expire: Callback<()>) {
    let countdown = use_mut_ref(|| IdleCountdown::new(idle_ms as u64));
    let timer = use_mut_ref(|| None::<Timeout>);

    use_effect_with((is_active, idle_ms), move |(is_active, idle_ms)| {
        let mut listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)> = Vec::new();

        if *is_active {
            *countdown.borrow_mut() = IdleCountdown::new(*idle_ms as u64);

            let arm: Rc<dyn Fn()> = {
                let countdown = countdown.clone();
                let timer = timer.clone();
                let on_expire = on_expire.clone();
                let idle_ms = *idle_ms;
                Rc::new(move || {
                    countdown.borrow_mut().reset(now_ms());
                    let fire = {
                        let countdown = countdown.clone();
                        let on_expire = on_expire.clone();
                        move || {
                            // doble guarda contra timers rancios: el handle
                            // anterior ya fue cancelado, y la cuenta atrás
                            // solo expira si sigue armada
                            if countdown.borrow_mut().try_expire(now_ms()) {
                                log::info!("⏰ Sesión inactiva, cerrando sesión");
                                on_expire.emit(());
                            }
                        }
                    };
                    // reemplazar el handle dropea (cancela) el timeout anterior
                    *timer.borrow_mut() = Some(Timeout::new(idle_ms, fire));
                })
            };

            arm();

            if let Some(win) = web_sys::window() {
                let options = AddEventListenerOptions::new();
                options.set_passive(true);

                for name in ACTIVITY_EVENTS {
                    let arm = arm.clone();
                    let closure =
                        Closure::wrap(Box::new(move |_e: Event| arm()) as Box<dyn FnMut(Event)>);
                    let _ = win.add_event_listener_with_callback_and_add_event_listener_options(
                        name,
                        closure.as_ref().unchecked_ref(),
                        &options,
                    );
                    listeners.push((name, closure));
                }
            }
        }

        move || {
            countdown.borrow_mut().disarm();
            *timer.borrow_mut() = None; // drop cancela el timeout pendiente
            if let Some(win) = web_sys::window() {
                for (name, closure) in &listeners {
                    let _ = win
                        .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
                }
            }
            // los closures se dropean aquí: sin forget(), sin fugas
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: u64 = 60 * 1000;

    #[test]
    fn expira_una_sola_vez() {
        let mut countdown = IdleCountdown::new(15 * MIN);
        countdown.reset(0);

        assert!(!countdown.try_expire(14 * MIN));
        assert!(countdown.try_expire(15 * MIN));
        // ya inerte: ticks posteriores no vuelven a disparar
        assert!(!countdown.try_expire(16 * MIN));
        assert!(!countdown.is_armed());
    }

    #[test]
    fn actividad_en_minuto_14_pospone_a_minuto_29() {
        let mut countdown = IdleCountdown::new(15 * MIN);
        countdown.reset(0);

        countdown.reset(14 * MIN);
        assert!(!countdown.try_expire(15 * MIN));
        assert!(!countdown.try_expire(28 * MIN));
        assert!(countdown.try_expire(29 * MIN));
    }

    #[test]
    fn desarmar_impide_el_disparo_aunque_el_timer_despierte() {
        let mut countdown = IdleCountdown::new(15 * MIN);
        countdown.reset(0);
        countdown.disarm();

        // el callback del timeout original despierta tarde: no pasa nada
        assert!(!countdown.try_expire(15 * MIN));
        assert!(!countdown.try_expire(100 * MIN));
    }

    #[test]
    fn sin_armar_no_expira() {
        let mut countdown = IdleCountdown::new(15 * MIN);
        assert!(!countdown.try_expire(1000 * MIN));
    }
}
