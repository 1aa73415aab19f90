#![allow(warnings)]
//! Shopping List Frontend Entry Point

mod app;
mod components;
mod context;
mod demo;
mod grouping;
mod remote;
mod store;

use app::App;
use leptos::prelude::*;
use log::LevelFilter;

fn main() {
    console_error_panic_hook::set_once();
    let level = console_logger::parse_level(option_env!("SHOPPING_LOG"), LevelFilter::Info);
    if let Err(e) = console_logger::init_logger("Shopping List", level) {
        web_sys::console::error_1(&format!("Logger init failed: {}", e).into());
    }
    mount_to_body(App);
}
