mod components;
mod hooks;
mod models;
mod services;
mod utils;

use components::App;

fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("🚀 ZERO LOGÍSTICA iniciando...");

    yew::Renderer::<App>::new().render();
}
