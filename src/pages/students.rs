use super::{input_value, select_value, use_api};
use crate::components::{banner, icon_plus, modal, page_shell, StatCard, StatIcon};
use crate::models::{Branch, Course, Grade, ScheduleSlot, Student, StudentForm};
use crate::poll::{self, Backoff};
use crate::roster::{self, RosterFilter};
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

const REFRESH_BASE: Duration = Duration::from_millis(1500);
const REFRESH_MAX: Duration = Duration::from_secs(30);

/// Which student the form is editing; `None` id means a new student.
#[derive(Clone, PartialEq)]
struct Editing {
    id: Option<String>,
    form: StudentForm,
}

fn form_for(student: &Student) -> StudentForm {
    let mut names = student.name.splitn(2, ' ');
    let or_blank = |v: &str| if v == "N/A" { String::new() } else { v.to_string() };
    StudentForm {
        first_name: names.next().unwrap_or("").to_string(),
        last_name: names.next().unwrap_or("").to_string(),
        email: student.email.clone(),
        phn_num: or_blank(&student.phone),
        status: student.status.clone(),
        student_no: or_blank(&student.student_no),
        salutation: student.salutation.clone(),
        ice_contact: or_blank(&student.ice_contact),
        grade_ids: student
            .assigned_courses
            .iter()
            .filter_map(|c| c.grade_id.clone())
            .collect(),
        slot_ids: student.schedules.iter().filter_map(|s| s.id.clone()).collect(),
    }
}

fn picked_file(input: &NodeRef) -> Option<web_sys::File> {
    input
        .cast::<HtmlInputElement>()
        .and_then(|el| el.files())
        .and_then(|files| files.get(0))
}

#[function_component(StudentsPage)]
pub fn students_page() -> Html {
    let api = use_api();
    let students = use_state(Vec::<Student>::new);
    let loading = use_state(|| true);
    let filter = use_state(RosterFilter::default);
    let courses = use_state(Vec::<Course>::new);
    let branches = use_state(Vec::<Branch>::new);
    let editing = use_state(|| None::<Editing>);
    let pick_course = use_state(String::new);
    let pick_branch = use_state(String::new);
    let grade_choices = use_state(Vec::<Grade>::new);
    let slot_choices = use_state(Vec::<ScheduleSlot>::new);
    let photo_input = use_node_ref();
    let form_error = use_state(|| None::<String>);
    let page_error = use_state(|| None::<String>);
    let load_error = use_state(|| None::<String>);
    let page_success = use_state(|| None::<String>);
    let saving = use_state(|| false);

    {
        let students = students.clone();
        let loading = loading.clone();
        let load_error = load_error.clone();
        use_effect_with_deps(
            move |api| {
                let on_change = {
                    let students = students.clone();
                    let loading = loading.clone();
                    let load_error = load_error.clone();
                    Callback::from(move |list: Vec<Student>| {
                        log::debug!("Roster refreshed, {} students", list.len());
                        students.set(list);
                        loading.set(false);
                        load_error.set(None);
                    })
                };
                let on_error = Callback::from(move |message: String| {
                    load_error.set(Some(format!("Failed to load students: {}", message)));
                    students.set(Vec::new());
                    loading.set(false);
                });
                let api = api.clone();
                let subscription = poll::subscribe(
                    Backoff::new(REFRESH_BASE, REFRESH_MAX),
                    move || {
                        let api = api.clone();
                        async move { api.students().await }
                    },
                    on_change,
                    on_error,
                );
                move || drop(subscription)
            },
            api.clone(),
        );
    }

    {
        let courses = courses.clone();
        let branches = branches.clone();
        use_effect_with_deps(
            move |api| {
                let api = api.clone();
                spawn_local(async move {
                    let (course_list, branch_list) = futures_util::join!(api.courses(), api.branches());
                    match course_list {
                        Ok(list) => courses.set(list),
                        Err(e) => log::error!("Error fetching courses: {}", e),
                    }
                    match branch_list {
                        Ok(list) => branches.set(list),
                        Err(e) => log::error!("Error fetching branches: {}", e),
                    }
                });
                || ()
            },
            api.clone(),
        );
    }

    {
        let grade_choices = grade_choices.clone();
        use_effect_with_deps(
            move |(api, course_id)| {
                let api = api.clone();
                let course_id = course_id.clone();
                if course_id.is_empty() {
                    grade_choices.set(Vec::new());
                } else {
                    spawn_local(async move {
                        match api.course_grades(&course_id).await {
                            Ok(list) => grade_choices.set(list),
                            Err(e) => {
                                log::error!("Error fetching grades: {}", e);
                                grade_choices.set(Vec::new());
                            }
                        }
                    });
                }
                || ()
            },
            (api.clone(), (*pick_course).clone()),
        );
    }

    let chosen_grade = editing
        .as_ref()
        .and_then(|e| e.form.grade_ids.last().cloned())
        .unwrap_or_default();
    {
        let slot_choices = slot_choices.clone();
        use_effect_with_deps(
            move |(api, branch_id, course_id, grade_id)| {
                let api = api.clone();
                let (branch_id, course_id, grade_id) = (branch_id.clone(), course_id.clone(), grade_id.clone());
                if branch_id.is_empty() || course_id.is_empty() || grade_id.is_empty() {
                    slot_choices.set(Vec::new());
                } else {
                    spawn_local(async move {
                        match api.available_slots(&branch_id, &course_id, &grade_id).await {
                            Ok(list) => slot_choices.set(list),
                            Err(e) => {
                                log::error!("Error fetching available slots: {}", e);
                                slot_choices.set(Vec::new());
                            }
                        }
                    });
                }
                || ()
            },
            (
                api.clone(),
                (*pick_branch).clone(),
                (*pick_course).clone(),
                chosen_grade,
            ),
        );
    }

    let update_form = {
        let editing = editing.clone();
        let form_error = form_error.clone();
        move |change: Box<dyn Fn(&mut StudentForm)>| {
            if let Some(current) = editing.as_ref() {
                let mut next = current.clone();
                change(&mut next.form);
                editing.set(Some(next));
                form_error.set(None);
            }
        }
    };

    let open_form = {
        let editing = editing.clone();
        let form_error = form_error.clone();
        let pick_course = pick_course.clone();
        let pick_branch = pick_branch.clone();
        Callback::from(move |student: Option<Student>| {
            let next = match student {
                Some(s) => Editing {
                    id: Some(s.id.clone()),
                    form: form_for(&s),
                },
                None => Editing {
                    id: None,
                    form: StudentForm {
                        status: "active".to_string(),
                        ..Default::default()
                    },
                },
            };
            editing.set(Some(next));
            pick_course.set(String::new());
            pick_branch.set(String::new());
            form_error.set(None);
        })
    };

    let on_close = {
        let editing = editing.clone();
        Callback::from(move |_| editing.set(None))
    };

    let on_save = {
        let api = api.clone();
        let editing = editing.clone();
        let students = students.clone();
        let photo_input = photo_input.clone();
        let form_error = form_error.clone();
        let page_success = page_success.clone();
        let saving = saving.clone();
        Callback::from(move |_| {
            let Some(current) = (*editing).clone() else {
                return;
            };
            if current.form.first_name.trim().is_empty() || current.form.email.trim().is_empty() {
                form_error.set(Some("First name and email are required.".to_string()));
                return;
            }
            let photo = picked_file(&photo_input);
            let api = api.clone();
            let editing = editing.clone();
            let students = students.clone();
            let form_error = form_error.clone();
            let page_success = page_success.clone();
            let saving = saving.clone();
            saving.set(true);
            spawn_local(async move {
                let result = match current.id.as_deref() {
                    Some(id) => api.update_student(id, &current.form, photo).await,
                    None => api.create_student(&current.form, photo).await,
                };
                match result {
                    Ok(student) => {
                        let mut next = (*students).clone();
                        roster::upsert(&mut next, student);
                        students.set(next);
                        editing.set(None);
                        page_success.set(Some("Student saved.".to_string()));
                    }
                    Err(e) => {
                        log::error!("Error saving student: {}", e);
                        form_error.set(Some(e.to_string()));
                    }
                }
                saving.set(false);
            });
        })
    };

    let on_upload_photo = {
        let api = api.clone();
        let editing = editing.clone();
        let students = students.clone();
        let photo_input = photo_input.clone();
        let form_error = form_error.clone();
        let page_success = page_success.clone();
        Callback::from(move |_| {
            let Some(id) = editing.as_ref().and_then(|e| e.id.clone()) else {
                return;
            };
            let Some(photo) = picked_file(&photo_input) else {
                form_error.set(Some("Choose a photo first.".to_string()));
                return;
            };
            let api = api.clone();
            let students = students.clone();
            let form_error = form_error.clone();
            let page_success = page_success.clone();
            spawn_local(async move {
                match api.upload_student_photo(&id, photo).await {
                    Ok(photo_url) => {
                        let next: Vec<Student> = students
                            .iter()
                            .cloned()
                            .map(|mut s| {
                                if s.id == id {
                                    s.photo_url = photo_url.clone();
                                }
                                s
                            })
                            .collect();
                        students.set(next);
                        page_success.set(Some("Photo updated.".to_string()));
                    }
                    Err(e) => {
                        log::error!("Error uploading photo for {}: {}", id, e);
                        form_error.set(Some(e.to_string()));
                    }
                }
            });
        })
    };

    let on_delete = {
        let api = api.clone();
        let students = students.clone();
        let page_error = page_error.clone();
        let page_success = page_success.clone();
        Callback::from(move |student: Student| {
            let question = format!("Delete {}? This cannot be undone.", student.name);
            let confirmed = web_sys::window()
                .and_then(|w| w.confirm_with_message(&question).ok())
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            let api = api.clone();
            let students = students.clone();
            let page_error = page_error.clone();
            let page_success = page_success.clone();
            spawn_local(async move {
                match api.delete_student(&student.id).await {
                    Ok(()) => {
                        let next: Vec<Student> = students
                            .iter()
                            .filter(|s| s.id != student.id)
                            .cloned()
                            .collect();
                        students.set(next);
                        page_error.set(None);
                        page_success.set(Some(format!("{} deleted.", student.name)));
                    }
                    Err(e) => page_error.set(Some(e.to_string())),
                }
            });
        })
    };

    let on_search = {
        let filter = filter.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                filter.set(RosterFilter {
                    query: value,
                    ..(*filter).clone()
                });
            }
        })
    };
    let on_status = {
        let filter = filter.clone();
        Callback::from(move |e: Event| {
            filter.set(RosterFilter {
                status: select_value(&e),
                ..(*filter).clone()
            })
        })
    };
    let on_course = {
        let filter = filter.clone();
        Callback::from(move |e: Event| {
            filter.set(RosterFilter {
                course: select_value(&e),
                ..(*filter).clone()
            })
        })
    };

    let visible = filter.apply(&students);
    let active_count = students
        .iter()
        .filter(|s| roster::normalize_status(&s.status) == "active")
        .count();

    let form_view = match editing.as_ref() {
        None => html! {},
        Some(current) => {
            let text_field = |label: &'static str, value: String, set: fn(&mut StudentForm, String)| {
                let update_form = update_form.clone();
                html! {
                    <div>
                        <label class="block text-sm font-medium text-foreground mb-2">{ label }</label>
                        <input value={value} oninput={Callback::from(move |e: InputEvent| {
                            if let Some(v) = input_value(&e) {
                                update_form(Box::new(move |f: &mut StudentForm| set(f, v.clone())));
                            }
                        })} class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground" />
                    </div>
                }
            };
            let on_status_pick = {
                let update_form = update_form.clone();
                Callback::from(move |e: Event| {
                    let value = select_value(&e);
                    update_form(Box::new(move |f: &mut StudentForm| f.status = value.clone()));
                })
            };
            let on_pick_course = {
                let pick_course = pick_course.clone();
                Callback::from(move |e: Event| pick_course.set(select_value(&e)))
            };
            let on_pick_branch = {
                let pick_branch = pick_branch.clone();
                Callback::from(move |e: Event| pick_branch.set(select_value(&e)))
            };
            let on_pick_grade = {
                let update_form = update_form.clone();
                Callback::from(move |e: Event| {
                    let grade = select_value(&e);
                    update_form(Box::new(move |f: &mut StudentForm| {
                        if !grade.is_empty() && !f.grade_ids.contains(&grade) {
                            f.grade_ids.push(grade.clone());
                        }
                    }));
                })
            };
            let title = if current.id.is_some() { "Edit Student" } else { "Add Student" };

            modal(
                title.to_string(),
                on_close.clone(),
                html! {
                    <>
                        <div class="grid grid-cols-1 md:grid-cols-2 gap-4">
                            { text_field("Salutation", current.form.salutation.clone(), |f, v| f.salutation = v) }
                            { text_field("Student number", current.form.student_no.clone(), |f, v| f.student_no = v) }
                            { text_field("First name", current.form.first_name.clone(), |f, v| f.first_name = v) }
                            { text_field("Last name", current.form.last_name.clone(), |f, v| f.last_name = v) }
                            { text_field("Email", current.form.email.clone(), |f, v| f.email = v) }
                            { text_field("Phone", current.form.phn_num.clone(), |f, v| f.phn_num = v) }
                            { text_field("Emergency contact", current.form.ice_contact.clone(), |f, v| f.ice_contact = v) }
                            <div>
                                <label class="block text-sm font-medium text-foreground mb-2">{"Status"}</label>
                                <select onchange={on_status_pick} class="w-full px-4 py-2 bg-input border border-input rounded-lg text-foreground">
                                    { for ["active", "inactive"].iter().map(|s| html! {
                                        <option value={*s} selected={roster::normalize_status(&current.form.status) == *s}>{ *s }</option>
                                    }) }
                                </select>
                            </div>
                        </div>

                        <div>
                            <label class="block text-sm font-medium text-foreground mb-2">{"Photo"}</label>
                            <div class="flex items-center gap-3">
                                <input type="file" accept="image/*" ref={photo_input.clone()} class="text-sm" />
                                {
                                    if current.id.is_some() {
                                        html! { <button type="button" onclick={on_upload_photo.clone()} class="px-3 py-1 rounded-lg border border-border text-xs">{"Upload now"}</button> }
                                    } else {
                                        html! {}
                                    }
                                }
                            </div>
                        </div>

                        {
                            if current.id.is_some() {
                                html! {
                                    <div class="space-y-3 border-t border-border pt-4">
                                        <h4 class="text-sm font-bold text-foreground">{"Courses and slots"}</h4>
                                        <div class="grid grid-cols-1 md:grid-cols-3 gap-3">
                                            <select onchange={on_pick_course} class="px-3 py-2 bg-input border border-input rounded-lg text-sm">
                                                <option value="" selected={pick_course.is_empty()}>{"Course..."}</option>
                                                { for courses.iter().filter_map(|c| c.id.clone().map(|id| (id, c.name.clone()))).map(|(id, name)| html! {
                                                    <option value={id.clone()} selected={id == *pick_course}>{ name }</option>
                                                }) }
                                            </select>
                                            <select onchange={on_pick_grade} class="px-3 py-2 bg-input border border-input rounded-lg text-sm">
                                                <option value="">{"Grade..."}</option>
                                                { for grade_choices.iter().filter_map(|g| g.id.clone().map(|id| (id, g.grade_name.clone()))).map(|(id, name)| html! {
                                                    <option value={id}>{ name }</option>
                                                }) }
                                            </select>
                                            <select onchange={on_pick_branch} class="px-3 py-2 bg-input border border-input rounded-lg text-sm">
                                                <option value="" selected={pick_branch.is_empty()}>{"Branch..."}</option>
                                                { for branches.iter().filter_map(|b| b.id.clone().map(|id| (id, b.branch_name.clone()))).map(|(id, name)| html! {
                                                    <option value={id.clone()} selected={id == *pick_branch}>{ name }</option>
                                                }) }
                                            </select>
                                        </div>
                                        <p class="text-xs text-muted-foreground">{ format!("{} grade(s), {} slot(s) assigned", current.form.grade_ids.len(), current.form.slot_ids.len()) }</p>
                                        <div class="flex flex-wrap gap-2">
                                            { for slot_choices.iter().filter_map(|s| s.id.clone().map(|id| (id, format!("{} {}", s.day, s.time)))).map(|(id, label)| {
                                                let checked = current.form.slot_ids.contains(&id);
                                                let update_form = update_form.clone();
                                                html! {
                                                    <label class="flex items-center gap-1 text-xs">
                                                        <input type="checkbox" checked={checked} onclick={Callback::from(move |_| {
                                                            let id = id.clone();
                                                            update_form(Box::new(move |f: &mut StudentForm| {
                                                                if f.slot_ids.contains(&id) {
                                                                    f.slot_ids.retain(|s| *s != id);
                                                                } else {
                                                                    f.slot_ids.push(id.clone());
                                                                }
                                                            }));
                                                        })} />
                                                        { label }
                                                    </label>
                                                }
                                            }) }
                                        </div>
                                    </div>
                                }
                            } else {
                                html! {}
                            }
                        }

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

    let on_add = {
        let open_form = open_form.clone();
        Callback::from(move |_| open_form.emit(None))
    };

    html! {
        { page_shell(
            "Students",
            html! {
                <button onclick={on_add} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                    { icon_plus() }
                    {"Add Student"}
                </button>
            },
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                        <StatCard title="Students" value={students.len().to_string()} icon={StatIcon::Users} />
                        <StatCard title="Active" value={active_count.to_string()} icon={StatIcon::Users} />
                    </div>

                    <div class="flex flex-wrap gap-3">
                        <input placeholder="Search name, course, number or email" value={filter.query.clone()} oninput={on_search} class="flex-1 min-w-[240px] px-4 py-2 bg-input border border-input rounded-lg text-sm" />
                        <select onchange={on_status} class="px-4 py-2 bg-input border border-input rounded-lg text-sm">
                            <option value="" selected={filter.status.is_empty()}>{"All statuses"}</option>
                            <option value="active" selected={filter.status == "active"}>{"Active"}</option>
                            <option value="inactive" selected={filter.status == "inactive"}>{"Inactive"}</option>
                        </select>
                        <select onchange={on_course} class="px-4 py-2 bg-input border border-input rounded-lg text-sm">
                            <option value="" selected={filter.course.is_empty()}>{"All courses"}</option>
                            { for courses.iter().map(|c| html! {
                                <option value={c.name.clone()} selected={c.name == filter.course}>{ c.name.clone() }</option>
                            }) }
                        </select>
                    </div>

                    { banner(&load_error, &None) }
                    { banner(&page_error, &page_success) }

                    <div class="bg-card rounded-[10px] shadow-sm border border-border overflow-hidden">
                        <div class="overflow-x-auto">
                            <table class="w-full text-left border-collapse">
                                <thead>
                                    <tr class="bg-muted/50 text-muted-foreground text-[10px] uppercase tracking-widest">
                                        <th class="px-6 py-4 font-bold">{"Student"}</th>
                                        <th class="px-6 py-4 font-bold">{"Number"}</th>
                                        <th class="px-6 py-4 font-bold">{"Courses"}</th>
                                        <th class="px-6 py-4 font-bold">{"Branch"}</th>
                                        <th class="px-6 py-4 font-bold">{"Phone"}</th>
                                        <th class="px-6 py-4 font-bold">{"Status"}</th>
                                        <th class="px-6 py-4 font-bold text-right">{"Actions"}</th>
                                    </tr>
                                </thead>
                                <tbody class="divide-y divide-border">
                                    {
                                        if *loading {
                                            html! { <tr><td colspan="7" class="px-6 py-4 text-sm text-muted-foreground">{"Loading students..."}</td></tr> }
                                        } else if visible.is_empty() {
                                            html! { <tr><td colspan="7" class="px-6 py-4 text-sm text-muted-foreground">{"No students match."}</td></tr> }
                                        } else {
                                            html! {
                                                { for visible.iter().map(|student| {
                                                    let edit = {
                                                        let open_form = open_form.clone();
                                                        let student = student.clone();
                                                        Callback::from(move |_| open_form.emit(Some(student.clone())))
                                                    };
                                                    let delete = {
                                                        let on_delete = on_delete.clone();
                                                        let student = student.clone();
                                                        Callback::from(move |_| on_delete.emit(student.clone()))
                                                    };
                                                    html! {
                                                        <tr key={student.id.clone()} class="text-sm hover:bg-muted/30 transition-colors">
                                                            <td class="px-6 py-4">
                                                                <div class="flex items-center gap-3">
                                                                    <img src={student.photo_url.clone()} alt={student.name.clone()} class="w-8 h-8 rounded-full object-cover" />
                                                                    <div>
                                                                        <p class="font-semibold text-foreground">{ student.name.clone() }</p>
                                                                        <p class="text-xs text-muted-foreground">{ student.email.clone() }</p>
                                                                    </div>
                                                                </div>
                                                            </td>
                                                            <td class="px-6 py-4 text-muted-foreground">{ student.student_no.clone() }</td>
                                                            <td class="px-6 py-4 text-foreground">{ student.course.clone() }</td>
                                                            <td class="px-6 py-4 text-foreground">{ student.branch.clone() }</td>
                                                            <td class="px-6 py-4 text-muted-foreground">{ student.phone.clone() }</td>
                                                            <td class="px-6 py-4">
                                                                <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold">{ roster::normalize_status(&student.status) }</span>
                                                            </td>
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
