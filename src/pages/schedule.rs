use super::{input_value, select_value, use_api};
use crate::components::{banner, icon_plus, modal, page_shell};
use crate::models::{Branch, Course, Grade, Lecturer, ScheduleSlot};
use crate::timetable::{ScheduleForm, WEEKDAYS};
use std::collections::HashMap;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Clone, Default, PartialEq)]
struct Options {
    lecturers: Vec<Lecturer>,
    courses: Vec<Course>,
    grades: Vec<Grade>,
    branches: Vec<Branch>,
}

impl Options {
    fn lookup<T>(items: &[T], id: &Option<String>, key: fn(&T) -> &Option<String>, name: fn(&T) -> String) -> String {
        id.as_ref()
            .and_then(|id| items.iter().find(|i| key(i).as_ref() == Some(id)))
            .map(name)
            .unwrap_or_else(|| "N/A".to_string())
    }

    fn lecturer(&self, id: &Option<String>) -> String {
        Self::lookup(&self.lecturers, id, |l| &l.id, |l| l.display_name())
    }

    fn course(&self, id: &Option<String>) -> String {
        Self::lookup(&self.courses, id, |c| &c.id, |c| c.name.clone())
    }

    fn grade(&self, id: &Option<String>) -> String {
        Self::lookup(&self.grades, id, |g| &g.id, |g| g.grade_name.clone())
    }

    fn branch(&self, id: &Option<String>) -> String {
        Self::lookup(&self.branches, id, |b| &b.id, |b| b.branch_name.clone())
    }
}

fn id_options<T>(items: &[T], selected: &str, id: fn(&T) -> Option<String>, label: fn(&T) -> String) -> Html {
    html! {
        <>
            <option value="" selected={selected.is_empty()}>{"Select..."}</option>
            { for items.iter().filter_map(|item| id(item).map(|v| (v, label(item)))).map(|(value, text)| html! {
                <option value={value.clone()} selected={value == selected}>{ text }</option>
            }) }
        </>
    }
}

#[function_component(SchedulePage)]
pub fn schedule_page() -> Html {
    let api = use_api();
    let slots = use_state(Vec::<ScheduleSlot>::new);
    let options = use_state(Options::default);
    let form_grades = use_state(Vec::<Grade>::new);
    let loading = use_state(|| true);
    let reload = use_state(|| 0u32);
    let form = use_state(|| None::<ScheduleForm>);
    let form_error = use_state(|| None::<String>);
    let page_error = use_state(|| None::<String>);
    let page_success = use_state(|| None::<String>);
    let saving = use_state(|| false);

    {
        let slots = slots.clone();
        let loading = loading.clone();
        let page_error = page_error.clone();
        use_effect_with_deps(
            move |(api, _)| {
                let api = api.clone();
                spawn_local(async move {
                    match api.slots().await {
                        Ok(list) => slots.set(list),
                        Err(e) => {
                            log::error!("Error fetching schedules: {}", e);
                            page_error.set(Some(e.to_string()));
                        }
                    }
                    loading.set(false);
                });
                || ()
            },
            (api.clone(), *reload),
        );
    }

    {
        let options = options.clone();
        use_effect_with_deps(
            move |api| {
                let api = api.clone();
                spawn_local(async move {
                    let (lecturers, courses, grades, branches) = futures_util::join!(
                        api.lecturers(),
                        api.courses(),
                        api.grades(),
                        api.branches(),
                    );
                    let or_empty = |what: &str, e: &crate::error::ApiError| {
                        log::error!("Error fetching {}: {}", what, e);
                    };
                    options.set(Options {
                        lecturers: lecturers.unwrap_or_else(|e| {
                            or_empty("lecturers", &e);
                            Vec::new()
                        }),
                        courses: courses.unwrap_or_else(|e| {
                            or_empty("courses", &e);
                            Vec::new()
                        }),
                        grades: grades.unwrap_or_else(|e| {
                            or_empty("grades", &e);
                            Vec::new()
                        }),
                        branches: branches.unwrap_or_else(|e| {
                            or_empty("branches", &e);
                            Vec::new()
                        }),
                    });
                });
                || ()
            },
            api.clone(),
        );
    }

    let selected_course = form
        .as_ref()
        .map(|f| f.course_id.clone())
        .unwrap_or_default();
    {
        let form_grades = form_grades.clone();
        use_effect_with_deps(
            move |(api, course_id)| {
                let api = api.clone();
                let course_id = course_id.clone();
                if course_id.is_empty() {
                    form_grades.set(Vec::new());
                } else {
                    spawn_local(async move {
                        match api.course_grades(&course_id).await {
                            Ok(list) => form_grades.set(list),
                            Err(e) => {
                                log::error!("Error fetching grades for course {}: {}", course_id, e);
                                form_grades.set(Vec::new());
                            }
                        }
                    });
                }
                || ()
            },
            (api.clone(), selected_course),
        );
    }

    let update_form = {
        let form = form.clone();
        let form_error = form_error.clone();
        move |change: Box<dyn Fn(&mut ScheduleForm)>| {
            if let Some(current) = form.as_ref() {
                let mut next = current.clone();
                change(&mut next);
                form.set(Some(next));
                form_error.set(None);
            }
        }
    };

    let on_add = {
        let form = form.clone();
        let form_error = form_error.clone();
        Callback::from(move |_| {
            form.set(Some(ScheduleForm {
                start_period: "AM".to_string(),
                end_period: "AM".to_string(),
                ..Default::default()
            }));
            form_error.set(None);
        })
    };

    let on_close = {
        let form = form.clone();
        Callback::from(move |_| form.set(None))
    };

    let on_save = {
        let api = api.clone();
        let form = form.clone();
        let form_error = form_error.clone();
        let page_success = page_success.clone();
        let saving = saving.clone();
        let reload = reload.clone();
        Callback::from(move |_| {
            let Some(current) = (*form).clone() else {
                return;
            };
            let payload = match current.to_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    form_error.set(Some(e.to_string()));
                    return;
                }
            };
            let api = api.clone();
            let form = form.clone();
            let form_error = form_error.clone();
            let page_success = page_success.clone();
            let saving = saving.clone();
            let reload = reload.clone();
            saving.set(true);
            spawn_local(async move {
                let result = match current.slot_id.as_deref() {
                    Some(id) => api.update_slot(id, &payload).await,
                    None => api.create_slots(&payload).await,
                };
                match result {
                    Ok(()) => {
                        form.set(None);
                        page_success.set(Some("Schedule saved.".to_string()));
                        reload.set(*reload + 1);
                    }
                    Err(e) => form_error.set(Some(e.to_string())),
                }
                saving.set(false);
            });
        })
    };

    let on_edit = {
        let form = form.clone();
        let form_error = form_error.clone();
        Callback::from(move |slot: ScheduleSlot| {
            form.set(Some(ScheduleForm::from_slot(&slot)));
            form_error.set(None);
        })
    };

    let on_delete = {
        let api = api.clone();
        let page_error = page_error.clone();
        let page_success = page_success.clone();
        let reload = reload.clone();
        Callback::from(move |slot_id: String| {
            let confirmed = web_sys::window()
                .and_then(|w| w.confirm_with_message("Delete this schedule?").ok())
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            let api = api.clone();
            let page_error = page_error.clone();
            let page_success = page_success.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match api.delete_slot(&slot_id).await {
                    Ok(()) => {
                        page_error.set(None);
                        page_success.set(Some("Schedule deleted.".to_string()));
                        reload.set(*reload + 1);
                    }
                    Err(e) => page_error.set(Some(e.to_string())),
                }
            });
        })
    };

    let form_view = match form.as_ref() {
        None => html! {},
        Some(current) => {
            let select_field = |label: &'static str, choices: Html, set: fn(&mut ScheduleForm, String)| {
                let update_form = update_form.clone();
                html! {
                    <div>
                        <label class="block text-sm font-medium text-foreground mb-2">{ label }</label>
                        <select onchange={Callback::from(move |e: Event| {
                            let value = select_value(&e);
                            update_form(Box::new(move |f: &mut ScheduleForm| set(f, value.clone())));
                        })} class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground">
                            { choices }
                        </select>
                    </div>
                }
            };
            let time_field = |label: &'static str, time: String, period: String, set_time: fn(&mut ScheduleForm, String), set_period: fn(&mut ScheduleForm, String)| {
                let on_time = {
                    let update_form = update_form.clone();
                    Callback::from(move |e: InputEvent| {
                        if let Some(value) = input_value(&e) {
                            update_form(Box::new(move |f: &mut ScheduleForm| set_time(f, value.clone())));
                        }
                    })
                };
                let on_period = {
                    let update_form = update_form.clone();
                    Callback::from(move |e: Event| {
                        let value = select_value(&e);
                        update_form(Box::new(move |f: &mut ScheduleForm| set_period(f, value.clone())));
                    })
                };
                html! {
                    <div>
                        <label class="block text-sm font-medium text-foreground mb-2">{ label }</label>
                        <div class="flex gap-2">
                            <input placeholder="hh:mm" value={time} oninput={on_time} class="flex-1 px-4 py-2 bg-input border border-input rounded-lg text-foreground" />
                            <select onchange={on_period} class="px-3 py-2 bg-input border border-input rounded-lg text-foreground">
                                <option value="AM" selected={period != "PM"}>{"AM"}</option>
                                <option value="PM" selected={period == "PM"}>{"PM"}</option>
                            </select>
                        </div>
                    </div>
                }
            };
            let title = if current.slot_id.is_some() { "Edit Schedule" } else { "Add Schedule" };

            modal(
                title.to_string(),
                on_close.clone(),
                html! {
                    <>
                        <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                            { select_field("Lecturer", id_options(&options.lecturers, &current.lecturer_id, |l| l.id.clone(), |l| l.display_name()), |f, v| f.lecturer_id = v) }
                            { select_field("Branch", id_options(&options.branches, &current.branch_id, |b| b.id.clone(), |b| b.branch_name.clone()), |f, v| f.branch_id = v) }
                            { select_field("Course", id_options(&options.courses, &current.course_id, |c| c.id.clone(), |c| c.name.clone()), |f, v| {
                                f.course_id = v;
                                f.grade_id.clear();
                            }) }
                            { select_field("Grade", id_options(&form_grades, &current.grade_id, |g| g.id.clone(), |g| g.grade_name.clone()), |f, v| f.grade_id = v) }
                            { time_field("Start time", current.start_time.clone(), current.start_period.clone(), |f, v| f.start_time = v, |f, v| f.start_period = v) }
                            { time_field("End time", current.end_time.clone(), current.end_period.clone(), |f, v| f.end_time = v, |f, v| f.end_period = v) }
                        </div>
                        <div>
                            <label class="block text-sm font-medium text-foreground mb-2">{"Days"}</label>
                            <div class="flex flex-wrap gap-2">
                                { for WEEKDAYS.iter().map(|day| {
                                    let checked = current.days.iter().any(|d| d == day);
                                    let update_form = update_form.clone();
                                    let day = *day;
                                    html! {
                                        <label class="flex items-center gap-1 text-sm">
                                            <input type="checkbox" checked={checked} onclick={Callback::from(move |_| {
                                                update_form(Box::new(move |f: &mut ScheduleForm| f.toggle_day(day)));
                                            })} />
                                            { day }
                                        </label>
                                    }
                                }) }
                            </div>
                        </div>
                        { banner(&form_error, &None) }
                        <div class="flex justify-end">
                            <button onclick={on_save} disabled={*saving} class="bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90">
                                { if *saving { "Saving..." } else { "Save" } }
                            </button>
                        </div>
                    </>
                },
            )
        }
    };

    let grouped: HashMap<String, usize> = slots.iter().fold(HashMap::new(), |mut acc, s| {
        *acc.entry(s.day.clone()).or_insert(0) += 1;
        acc
    });
    let mut ordered: Vec<ScheduleSlot> = (*slots).clone();
    ordered.sort_by_key(|s| {
        (
            WEEKDAYS.iter().position(|d| *d == s.day).unwrap_or(WEEKDAYS.len()),
            s.start_time.clone().unwrap_or_default(),
        )
    });

    html! {
        { page_shell(
            "Schedule",
            html! {
                <button onclick={on_add} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                    { icon_plus() }
                    {"Add Schedule"}
                </button>
            },
            html! {
                <>
                    <div class="flex flex-wrap gap-2">
                        { for WEEKDAYS.iter().map(|day| html! {
                            <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold">
                                { format!("{}: {}", day, grouped.get(*day).copied().unwrap_or(0)) }
                            </span>
                        }) }
                    </div>
                    { banner(&page_error, &page_success) }
                    <div class="bg-card rounded-[10px] shadow-sm border border-border overflow-hidden">
                        <div class="overflow-x-auto">
                            <table class="w-full text-left border-collapse">
                                <thead>
                                    <tr class="bg-muted/50 text-muted-foreground text-[10px] uppercase tracking-widest">
                                        <th class="px-6 py-4 font-bold">{"Day"}</th>
                                        <th class="px-6 py-4 font-bold">{"Time"}</th>
                                        <th class="px-6 py-4 font-bold">{"Lecturer"}</th>
                                        <th class="px-6 py-4 font-bold">{"Course"}</th>
                                        <th class="px-6 py-4 font-bold">{"Grade"}</th>
                                        <th class="px-6 py-4 font-bold">{"Branch"}</th>
                                        <th class="px-6 py-4 font-bold text-right">{"Actions"}</th>
                                    </tr>
                                </thead>
                                <tbody class="divide-y divide-border">
                                    {
                                        if *loading {
                                            html! { <tr><td colspan="7" class="px-6 py-4 text-sm text-muted-foreground">{"Loading schedules..."}</td></tr> }
                                        } else if ordered.is_empty() {
                                            html! { <tr><td colspan="7" class="px-6 py-4 text-sm text-muted-foreground">{"No schedules yet."}</td></tr> }
                                        } else {
                                            html! {
                                                { for ordered.iter().map(|slot| {
                                                    let edit = {
                                                        let on_edit = on_edit.clone();
                                                        let slot = slot.clone();
                                                        Callback::from(move |_| on_edit.emit(slot.clone()))
                                                    };
                                                    let delete = {
                                                        let on_delete = on_delete.clone();
                                                        let id = slot.id.clone();
                                                        Callback::from(move |_| {
                                                            if let Some(id) = id.clone() {
                                                                on_delete.emit(id);
                                                            }
                                                        })
                                                    };
                                                    html! {
                                                        <tr class="text-sm hover:bg-muted/30 transition-colors">
                                                            <td class="px-6 py-4 text-foreground">{ slot.day.clone() }</td>
                                                            <td class="px-6 py-4 text-muted-foreground">{ slot.time.clone() }</td>
                                                            <td class="px-6 py-4 text-foreground">{ options.lecturer(&slot.lecturer_id) }</td>
                                                            <td class="px-6 py-4 text-foreground">{ options.course(&slot.course_id) }</td>
                                                            <td class="px-6 py-4 text-foreground">{ options.grade(&slot.grade_id) }</td>
                                                            <td class="px-6 py-4 text-foreground">{ options.branch(&slot.branch_id) }</td>
                                                            <td class="px-6 py-4 text-right space-x-2">
                                                                <button onclick={edit} class="text-xs font-bold text-[#1D617A]">{"Edit"}</button>
                                                                <button onclick={delete} class="text-xs font-bold text-red-600">{"Delete"}</button>
                                                            </td>
                                                        </tr>
                                                    }
                                                }) }
                                            }
                                        }
                                    }
                                </tbody>
                            </table>
                        </div>
                    </div>
                    { form_view }
                </>
            }
        ) }
    }
}
