use super::input_value;
use crate::components::{banner, page_shell};
use crate::config::{save_settings, AppSettings};
use yew::prelude::*;

#[function_component(SettingsPage)]
pub fn settings_page() -> Html {
    let settings = use_context::<UseStateHandle<AppSettings>>();
    let current = settings.as_ref().map(|s| (**s).clone()).unwrap_or_default();

    let api_base_url = use_state(|| current.api_base_url.clone());
    let image_base_url = use_state(|| current.image_base_url.clone());
    let currency_symbol = use_state(|| current.currency_symbol.clone());
    let monthly_fee = use_state(|| current.default_monthly_fee.to_string());
    let form_error = use_state(|| None::<String>);
    let form_success = use_state(|| None::<String>);

    let on_save = {
        let settings = settings.clone();
        let api_base_url = api_base_url.clone();
        let image_base_url = image_base_url.clone();
        let currency_symbol = currency_symbol.clone();
        let monthly_fee = monthly_fee.clone();
        let form_error = form_error.clone();
        let form_success = form_success.clone();
        Callback::from(move |_| {
            let Some(settings) = settings.as_ref() else {
                return;
            };
            let fee = match monthly_fee.trim().parse::<i64>() {
                Ok(fee) if fee > 0 => fee,
                _ => {
                    form_error.set(Some("Monthly fee must be a positive number.".to_string()));
                    form_success.set(None);
                    return;
                }
            };
            let next = AppSettings {
                api_base_url: (*api_base_url).clone(),
                image_base_url: (*image_base_url).clone(),
                currency_symbol: (*currency_symbol).clone(),
                default_monthly_fee: fee,
            }
            .normalized();
            save_settings(&next);
            log::info!("Settings saved, backend {}", next.api_base_url);
            api_base_url.set(next.api_base_url.clone());
            image_base_url.set(next.image_base_url.clone());
            currency_symbol.set(next.currency_symbol.clone());
            settings.set(next);
            form_error.set(None);
            form_success.set(Some("Settings saved.".to_string()));
        })
    };

    let on_reset = {
        let settings = settings.clone();
        let api_base_url = api_base_url.clone();
        let image_base_url = image_base_url.clone();
        let currency_symbol = currency_symbol.clone();
        let monthly_fee = monthly_fee.clone();
        let form_success = form_success.clone();
        Callback::from(move |_| {
            let defaults = AppSettings::default();
            api_base_url.set(defaults.api_base_url.clone());
            image_base_url.set(defaults.image_base_url.clone());
            currency_symbol.set(defaults.currency_symbol.clone());
            monthly_fee.set(defaults.default_monthly_fee.to_string());
            save_settings(&defaults);
            if let Some(settings) = settings.as_ref() {
                settings.set(defaults);
            }
            form_success.set(Some("Defaults restored.".to_string()));
        })
    };

    let text_field = |label: &'static str, hint: &'static str, state: UseStateHandle<String>| {
        let value = (*state).clone();
        html! {
            <div>
                <label class="block text-sm font-medium text-foreground mb-2">{ label }</label>
                <input value={value} oninput={Callback::from(move |e: InputEvent| {
                    if let Some(v) = input_value(&e) {
                        state.set(v);
                    }
                })} class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground focus:outline-none focus:ring-2 focus:ring-primary" />
                <p class="text-xs text-muted-foreground mt-2">{ hint }</p>
            </div>
        }
    };

    html! {
        { page_shell(
            "Settings",
            html! {},
            html! {
                <div class="bg-card rounded-lg p-6 border border-border max-w-2xl">
                    <h2 class="text-xl font-bold text-foreground mb-6">{"Preferences"}</h2>
                    <div class="space-y-4">
                        { text_field("API base URL", "REST backend every page talks to.", api_base_url.clone()) }
                        { text_field("Image base URL", "Host that relative student photo paths resolve against.", image_base_url.clone()) }
                        { text_field("Currency symbol", "Shown in front of fees and pending amounts.", currency_symbol.clone()) }
                        { text_field("Default monthly fee", "Used for pending amounts when a payment has no amount.", monthly_fee.clone()) }
                        <div class="flex gap-2">
                            <button onclick={on_save} class="bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90">{"Save"}</button>
                            <button onclick={on_reset} class="px-4 py-2 rounded-xl border border-border text-sm">{"Restore defaults"}</button>
                        </div>
                        { banner(&form_error, &form_success) }
                    </div>
                </div>
            }
        ) }
    }
}
