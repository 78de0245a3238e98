pub mod dashboard;
pub mod payments;
pub mod schedule;
pub mod settings;
pub mod students;

use crate::api::ApiClient;
use crate::config::AppSettings;
use yew::prelude::*;

/// Settings from the app context, or defaults outside the provider.
#[hook]
pub fn use_settings() -> AppSettings {
    use_context::<UseStateHandle<AppSettings>>()
        .map(|s| (*s).clone())
        .unwrap_or_default()
}

#[hook]
pub fn use_api() -> ApiClient {
    let settings = use_settings();
    ApiClient::new(&settings)
}

pub fn select_value(e: &Event) -> String {
    let input: web_sys::HtmlSelectElement = e.target_unchecked_into();
    input.value()
}

pub fn input_value(e: &InputEvent) -> Option<String> {
    e.target_dyn_into::<web_sys::HtmlInputElement>()
        .map(|input| input.value())
}
