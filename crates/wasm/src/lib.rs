use rnaviz_core::{Settings, FOLDER_NAME_DIVIDER};
use wasm_bindgen::prelude::*;

/// 80-character fingerprint of a sequence; empty for invalid input.
#[wasm_bindgen]
pub fn fingerprint(sequence: &str) -> String {
    rnaviz_core::fingerprint_string(sequence)
}

/// Format tag for a file extension (`CT`, `BPSEQ`, ...) or `NONE`.
#[wasm_bindgen]
pub fn classify_extension(ext: &str) -> String {
    rnaviz_core::classify_extension(ext)
        .map_or("NONE", |ty| ty.tag())
        .to_string()
}

/// Compose a numbered folder label; an empty `name` leaves out the divider.
///
/// `settings_json` is parsed as `Settings` with `#[serde(default)]`,
/// so an empty object uses the default divider.
#[wasm_bindgen]
pub fn compose_label(count: u32, name: &str, settings_json: &str) -> String {
    rnaviz_core::compose_label(count, Some(name), &divider(settings_json))
}

/// Folder name part of a label, split on the divider from `settings_json`.
#[wasm_bindgen]
pub fn sequence_name_from_label(label: &str, settings_json: &str) -> String {
    rnaviz_core::sequence_name_from_label(label, &divider(settings_json))
}

fn divider(settings_json: &str) -> String {
    serde_json::from_str::<Settings>(settings_json)
        .map(|s| s.divider)
        .unwrap_or_else(|_| FOLDER_NAME_DIVIDER.to_string())
}
