use super::{select_value, use_api};
use crate::components::{banner, page_shell, StatCard, StatIcon};
use crate::models::Timetable;
use crate::timetable::{self, ALL_LOCATIONS, WEEKDAYS};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let api = use_api();
    let data = use_state(Timetable::new);
    let loading = use_state(|| true);
    let error = use_state(|| None::<String>);
    let location = use_state(|| ALL_LOCATIONS.to_string());

    {
        let data = data.clone();
        let loading = loading.clone();
        let error = error.clone();
        use_effect_with_deps(
            move |api| {
                let api = api.clone();
                spawn_local(async move {
                    match api.timetable().await {
                        Ok(timetable) => {
                            log::debug!("Timetable loaded for {} branches", timetable.len());
                            data.set(timetable);
                            error.set(None);
                        }
                        Err(e) => {
                            log::error!("Error fetching dashboard data: {}", e);
                            error.set(Some("Failed to load dashboard data".to_string()));
                        }
                    }
                    loading.set(false);
                });
                || ()
            },
            api,
        );
    }

    let on_location = {
        let location = location.clone();
        Callback::from(move |e: Event| location.set(select_value(&e)))
    };

    let cells = timetable::cells_for(&data, &location);
    let rows = timetable::sorted_time_rows(&cells);
    let total_students = timetable::distinct_students(&cells);
    let locations = timetable::locations(&data);

    html! {
        { page_shell(
            "Dashboard",
            html! {
                <select value={(*location).clone()} onchange={on_location} class="px-4 py-2 bg-input border border-input rounded-lg text-sm text-foreground">
                    { for locations.iter().map(|l| html! {
                        <option value={l.clone()} selected={*l == *location}>{ l.clone() }</option>
                    }) }
                </select>
            },
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                        <StatCard title="Total Students" value={total_students.to_string()} icon={StatIcon::Users} />
                    </div>

                    { banner(&error, &None) }

                    <div class="bg-card rounded-[10px] shadow-sm border border-border overflow-hidden">
                        <div class="p-6 flex justify-between items-center border-b border-border">
                            <h3 class="font-bold text-foreground text-lg">{"Weekly Timetable"}</h3>
                            <span class="text-xs text-muted-foreground">{ (*location).clone() }</span>
                        </div>
                        {
                            if *loading {
                                html! { <p class="p-6 text-sm text-muted-foreground">{"Loading timetable..."}</p> }
                            } else if rows.is_empty() {
                                html! { <p class="p-6 text-sm text-muted-foreground">{"No classes scheduled."}</p> }
                            } else {
                                html! {
                                    <div class="overflow-x-auto">
                                        <table class="w-full text-left border-collapse">
                                            <thead>
                                                <tr class="bg-muted/50 text-muted-foreground text-[10px] uppercase tracking-widest">
                                                    <th class="px-4 py-4 font-bold">{"Time"}</th>
                                                    { for WEEKDAYS.iter().map(|day| html! {
                                                        <th class="px-4 py-4 font-bold">{ *day }</th>
                                                    }) }
                                                </tr>
                                            </thead>
                                            <tbody class="divide-y divide-border">
                                                { for rows.iter().map(|time| {
                                                    let days = cells.get(time).cloned().unwrap_or_default();
                                                    html! {
                                                        <tr key={time.clone()} class="text-sm align-top">
                                                            <td class="px-4 py-3 font-semibold text-foreground whitespace-nowrap">{ time.clone() }</td>
                                                            { for WEEKDAYS.iter().map(|day| {
                                                                let students = days.get(*day).cloned().unwrap_or_default();
                                                                let (shown, hidden) = timetable::visible_students(&students);
                                                                html! {
                                                                    <td class="px-4 py-3">
                                                                        <div class="flex flex-col gap-1">
                                                                            { for shown.iter().map(|s| html! {
                                                                                <div class="flex items-center gap-2">
                                                                                    <img src={s.photo_url.clone()} alt={s.name.clone()} class="w-6 h-6 rounded-full object-cover" />
                                                                                    <span class="text-xs text-foreground">{ s.name.clone() }</span>
                                                                                </div>
                                                                            }) }
                                                                            {
                                                                                if hidden > 0 {
                                                                                    html! { <span class="text-[10px] text-muted-foreground font-bold">{ format!("+ {} more", hidden) }</span> }
                                                                                } else {
                                                                                    html! {}
                                                                                }
                                                                            }
                                                                        </div>
                                                                    </td>
                                                                }
                                                            }) }
                                                        </tr>
                                                    }
                                                }) }
                                            </tbody>
                                        </table>
                                    </div>
                                }
                            }
                        }
                    </div>
                </>
            }
        ) }
    }
}
