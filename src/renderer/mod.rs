// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

mod types;
mod json;
mod plain;
mod raw;

pub use types::*;
pub use plain::{plain_renderer, render_plain};
pub use json::{json_renderer, render_json};
pub use raw::{raw_renderer, render_raw};
