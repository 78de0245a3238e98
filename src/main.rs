mod api;
mod components;
mod config;
mod error;
mod fees;
mod format;
mod ledger;
mod models;
mod pages;
mod poll;
mod reconcile;
mod roster;
mod stepper;
mod timetable;

use components::Layout;
use config::{load_settings, AppSettings};
use pages::dashboard::DashboardPage;
use pages::payments::PaymentsPage;
use pages::schedule::SchedulePage;
use pages::settings::SettingsPage;
use pages::students::StudentsPage;
use yew::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Page {
    Dashboard,
    Students,
    Payments,
    Schedule,
    Settings,
}

#[function_component(App)]
fn app() -> Html {
    let active_page = use_state(|| Page::Dashboard);
    let settings = use_state(load_settings);
    let on_select = {
        let active_page = active_page.clone();
        Callback::from(move |page: Page| {
            log::debug!("Switching to {:?}", page);
            active_page.set(page)
        })
    };

    let content = match *active_page {
        Page::Dashboard => html! { <DashboardPage /> },
        Page::Students => html! { <StudentsPage /> },
        Page::Payments => html! { <PaymentsPage /> },
        Page::Schedule => html! { <SchedulePage /> },
        Page::Settings => html! { <SettingsPage /> },
    };

    html! {
        <ContextProvider<UseStateHandle<AppSettings>> context={settings}>
            <Layout active_page={*active_page} on_select={on_select}>
                { content }
            </Layout>
        </ContextProvider<UseStateHandle<AppSettings>>>
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    log::info!("Starting academy admin dashboard");
    yew::Renderer::<App>::new().render();
}
