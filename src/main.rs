#![allow(warnings)]
//! Daylist Frontend Entry Point

mod app;
mod components;
mod config;
mod context;
mod controller;
mod day;
mod list;
mod models;
mod persist;

use config::AppConfig;

fn main() {
    console_error_panic_hook::set_once();

    let config = AppConfig::default();
    if let Err(e) = rolling_logger::init(config.log_level, config.log_capacity) {
        web_sys::console::warn_1(&format!("logger already installed: {}", e).into());
    }

    wasm_bindgen_futures::spawn_local(app::start(config));
}
