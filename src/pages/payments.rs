use super::{input_value, select_value, use_api, use_settings};
use crate::components::{banner, icon_plus, icon_refresh, modal, page_shell, StatCard, StatIcon};
use crate::fees::{self, MONTHS};
use crate::format::format_currency;
use crate::ledger::{self, ListingRequest, PaymentsAction, PaymentsStore, StateFilter};
use crate::models::{PaymentStatus, Receipt, StudentSummary};
use crate::reconcile::{ReconciledPayment, StatusFilter};
use crate::stepper::{Step, StepperAction, StepperState};
use chrono::Datelike;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

const REFRESH_AFTER_PAYMENT: Duration = Duration::from_secs(1);

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

#[function_component(PaymentsPage)]
pub fn payments_page() -> Html {
    let api = use_api();
    let settings = use_settings();
    let store = use_reducer(PaymentsStore::default);
    let stepper_open = use_state(|| false);
    let receipt = use_state(|| None::<Receipt>);
    let viewing = use_state(|| None::<ReconciledPayment>);

    {
        let store = store.clone();
        let request = store.listing_request();
        use_effect_with_deps(
            move |(api, request)| {
                let api = api.clone();
                let ListingRequest { generation, state, status } = *request;
                spawn_local(async move {
                    match api.payment_listing(state, status).await {
                        Ok(listing) => {
                            log::debug!(
                                "Loaded {} payments for generation {}",
                                listing.records.len(),
                                generation
                            );
                            store.dispatch(PaymentsAction::Loaded { generation, listing });
                        }
                        Err(e) => {
                            log::error!("Error fetching payments: {}", e);
                            store.dispatch(PaymentsAction::Failed {
                                generation,
                                message: "Failed to load payments. Please try again later.".to_string(),
                            });
                        }
                    }
                });
                || ()
            },
            (api.clone(), request),
        );
    }

    let on_state = {
        let store = store.clone();
        Callback::from(move |e: Event| {
            store.dispatch(PaymentsAction::SetState(StateFilter::from_label(&select_value(&e))))
        })
    };
    let on_status = {
        let store = store.clone();
        Callback::from(move |e: Event| {
            store.dispatch(PaymentsAction::SetStatus(StatusFilter::from_label(&select_value(&e))))
        })
    };
    let on_search = {
        let store = store.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                store.dispatch(PaymentsAction::SetQuery(value));
            }
        })
    };
    let on_refresh = {
        let store = store.clone();
        Callback::from(move |_| store.dispatch(PaymentsAction::Refresh))
    };
    let on_new = {
        let stepper_open = stepper_open.clone();
        Callback::from(move |_| stepper_open.set(true))
    };
    let on_stepper_close = {
        let stepper_open = stepper_open.clone();
        Callback::from(move |_| stepper_open.set(false))
    };
    let on_paid = {
        let store = store.clone();
        let stepper_open = stepper_open.clone();
        let receipt = receipt.clone();
        let default_fee = settings.default_monthly_fee;
        Callback::from(move |(done, payment_id): (Receipt, Option<String>)| {
            let record = ledger::record_from_receipt(&done, payment_id, today(), default_fee);
            store.dispatch(PaymentsAction::Register(record));
            stepper_open.set(false);
            receipt.set(Some(done));
            let store = store.clone();
            spawn_local(async move {
                if wasm_timer::Delay::new(REFRESH_AFTER_PAYMENT).await.is_err() {
                    log::warn!("Refresh timer failed after payment");
                }
                store.dispatch(PaymentsAction::Refresh);
            });
        })
    };

    let rows = store.rows(today(), settings.default_monthly_fee);
    let pending_total: i64 = rows.iter().map(|r| r.pending_amount).sum();
    let paid_count = rows.iter().filter(|r| r.status == PaymentStatus::Paid).count();
    let symbol = settings.currency_symbol.clone();
    let show_pending = store.status == StatusFilter::Pending;

    let details_view = match viewing.as_ref() {
        None => html! {},
        Some(row) => {
            let on_close = {
                let viewing = viewing.clone();
                let store = store.clone();
                Callback::from(move |_| {
                    viewing.set(None);
                    store.dispatch(PaymentsAction::Refresh);
                })
            };
            let history = row
                .record
                .student_details_id
                .as_ref()
                .and_then(|id| store.histories.get(id))
                .cloned()
                .unwrap_or_default();
            modal(
                format!("Payment of {}", row.name()),
                on_close,
                html! {
                    <>
                        <div class="grid grid-cols-2 gap-3 text-sm">
                            <span class="text-muted-foreground">{"Student number"}</span>
                            <span>{ row.record.student_no.clone().unwrap_or_else(|| "N/A".to_string()) }</span>
                            <span class="text-muted-foreground">{"Branch"}</span>
                            <span>{ row.record.branch_name.clone().unwrap_or_else(|| "N/A".to_string()) }</span>
                            <span class="text-muted-foreground">{"Last payment"}</span>
                            <span>{ row.formatted_pay_date.clone() }</span>
                            <span class="text-muted-foreground">{"Status"}</span>
                            <span>{ row.status.as_str() }</span>
                            <span class="text-muted-foreground">{"Pending"}</span>
                            <span>{ format!("{} ({})", format_currency(row.pending_amount, &symbol), row.pending_label()) }</span>
                        </div>
                        <h4 class="text-sm font-bold text-foreground">{"Pending history"}</h4>
                        {
                            if history.is_empty() {
                                html! { <p class="text-sm text-muted-foreground">{"No history recorded."}</p> }
                            } else {
                                html! {
                                    <table class="w-full text-left text-sm">
                                        <tbody class="divide-y divide-border">
                                            { for history.iter().map(|entry| html! {
                                                <tr>
                                                    <td class="py-2">{ entry.pay_date.clone().unwrap_or_else(|| "N/A".to_string()) }</td>
                                                    <td class="py-2">{ entry.branch.clone().unwrap_or_else(|| "N/A".to_string()) }</td>
                                                    <td class="py-2">{ format_currency(entry.amount.unwrap_or(settings.default_monthly_fee), &symbol) }</td>
                                                    <td class="py-2">{ entry.status.clone().unwrap_or_default() }</td>
                                                </tr>
                                            }) }
                                        </tbody>
                                    </table>
                                }
                            }
                        }
                    </>
                },
            )
        }
    };

    let receipt_modal = match receipt.as_ref() {
        None => html! {},
        Some(done) => {
            let on_close = {
                let receipt = receipt.clone();
                Callback::from(move |_| receipt.set(None))
            };
            let on_print = Callback::from(|_| {
                if let Some(window) = web_sys::window() {
                    if window.print().is_err() {
                        log::warn!("Printing the receipt failed");
                    }
                }
            });
            html! { <ReceiptView receipt={done.clone()} symbol={symbol.clone()} {on_close} {on_print} /> }
        }
    };

    html! {
        { page_shell(
            "Payments",
            html! {
                <div class="flex gap-2">
                    <button onclick={on_refresh} class="p-2 rounded-xl border border-border hover:bg-secondary" aria-label="Refresh">
                        { icon_refresh() }
                    </button>
                    <button onclick={on_new} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                        { icon_plus() }
                        {"New Payment"}
                    </button>
                </div>
            },
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                        <StatCard title="Students Listed" value={rows.len().to_string()} icon={StatIcon::Users} />
                        <StatCard title="Paid" value={paid_count.to_string()} icon={StatIcon::CreditCard} />
                        <StatCard title="Pending Amount" value={format_currency(pending_total, &symbol)} icon={StatIcon::Alert} />
                    </div>

                    <div class="flex flex-wrap gap-3">
                        <input placeholder="Search name, date or amount" value={store.query.clone()} oninput={on_search} class="flex-1 min-w-[240px] px-4 py-2 bg-input border border-input rounded-lg text-sm" />
                        <select onchange={on_state} class="px-4 py-2 bg-input border border-input rounded-lg text-sm">
                            { for StateFilter::ALL.iter().map(|s| html! {
                                <option value={s.label()} selected={*s == store.state}>{ s.label() }</option>
                            }) }
                        </select>
                        <select onchange={on_status} class="px-4 py-2 bg-input border border-input rounded-lg text-sm">
                            { for StatusFilter::ALL.iter().map(|s| html! {
                                <option value={s.as_str()} selected={*s == store.status}>{ s.as_str() }</option>
                            }) }
                        </select>
                    </div>

                    { banner(&store.error, &None) }
                    {
                        match store.notice.clone() {
                            Some(notice) => {
                                let on_dismiss = {
                                    let store = store.clone();
                                    Callback::from(move |_| store.dispatch(PaymentsAction::DismissNotice))
                                };
                                html! {
                                    <div class="flex items-center justify-between px-4 py-2 rounded-lg bg-amber-50 border border-amber-200 text-sm text-amber-800">
                                        <span>{ notice }</span>
                                        <button onclick={on_dismiss} class="text-xs font-bold">{"Dismiss"}</button>
                                    </div>
                                }
                            }
                            None => html! {},
                        }
                    }

                    <div class="bg-card rounded-[10px] shadow-sm border border-border overflow-hidden">
                        <div class="overflow-x-auto">
                            <table class="w-full text-left border-collapse">
                                <thead>
                                    <tr class="bg-muted/50 text-muted-foreground text-[10px] uppercase tracking-widest">
                                        <th class="px-6 py-4 font-bold">{"Name"}</th>
                                        <th class="px-6 py-4 font-bold">{"Pay Date"}</th>
                                        <th class="px-6 py-4 font-bold text-right">{ if show_pending { "Pending Amount" } else { "Amount" } }</th>
                                        {
                                            if show_pending {
                                                html! { <th class="px-6 py-4 font-bold">{"Duration"}</th> }
                                            } else {
                                                html! {}
                                            }
                                        }
                                        <th class="px-6 py-4 font-bold">{"Status"}</th>
                                        <th class="px-6 py-4 font-bold text-right">{"Actions"}</th>
                                    </tr>
                                </thead>
                                <tbody class="divide-y divide-border">
                                    {
                                        if store.loading {
                                            html! { <tr><td colspan="6" class="px-6 py-4 text-sm text-muted-foreground">{"Loading payments..."}</td></tr> }
                                        } else if rows.is_empty() {
                                            html! { <tr><td colspan="6" class="px-6 py-4 text-sm text-muted-foreground">{"No payments found."}</td></tr> }
                                        } else {
                                            html! {
                                                { for rows.iter().map(|row| {
                                                    let on_view = {
                                                        let viewing = viewing.clone();
                                                        let row = row.clone();
                                                        Callback::from(move |_| viewing.set(Some(row.clone())))
                                                    };
                                                    let badge = match row.status {
                                                        PaymentStatus::Paid => "bg-green-100 text-green-700 px-3 py-1 rounded-full text-[10px] font-bold",
                                                        PaymentStatus::Pending => "bg-red-100 text-red-700 px-3 py-1 rounded-full text-[10px] font-bold",
                                                    };
                                                    html! {
                                                        <tr key={row.record.student_key()} class="text-sm hover:bg-muted/30 transition-colors">
                                                            <td class="px-6 py-4 text-foreground">{ row.name().to_string() }</td>
                                                            <td class="px-6 py-4 text-muted-foreground">{ row.formatted_pay_date.clone() }</td>
                                                            <td class="px-6 py-4 text-right font-semibold text-foreground">{ format_currency(row.display_amount(store.status), &symbol) }</td>
                                                            {
                                                                if show_pending {
                                                                    html! { <td class="px-6 py-4 text-muted-foreground">{ row.pending_label() }</td> }
                                                                } else {
                                                                    html! {}
                                                                }
                                                            }
                                                            <td class="px-6 py-4"><span class={badge}>{ row.status.as_str() }</span></td>
                                                            <td class="px-6 py-4 text-right">
                                                                <button onclick={on_view} class="text-xs font-bold text-[#1D617A]">{"View"}</button>
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

                    {
                        if *stepper_open {
                            html! { <PaymentStepper on_close={on_stepper_close} on_paid={on_paid} /> }
                        } else {
                            html! {}
                        }
                    }
                    { details_view }
                    { receipt_modal }
                </>
            }
        ) }
    }
}

#[derive(Properties, PartialEq)]
struct PaymentStepperProps {
    on_close: Callback<MouseEvent>,
    on_paid: Callback<(Receipt, Option<String>)>,
}

#[function_component(PaymentStepper)]
fn payment_stepper(props: &PaymentStepperProps) -> Html {
    let api = use_api();
    let settings = use_settings();
    let state = use_reducer(StepperState::default);
    let search = use_state(String::new);
    let matches = use_state(Vec::<StudentSummary>::new);
    let searching = use_state(|| false);

    let on_search_input = {
        let search = search.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                search.set(value);
            }
        })
    };

    let on_find = {
        let api = api.clone();
        let search = search.clone();
        let matches = matches.clone();
        let searching = searching.clone();
        let state = state.clone();
        Callback::from(move |_| {
            let student_no = search.trim().to_string();
            if student_no.is_empty() {
                return;
            }
            let api = api.clone();
            let matches = matches.clone();
            let searching = searching.clone();
            let state = state.clone();
            searching.set(true);
            spawn_local(async move {
                match api.search_students(&student_no).await {
                    Ok(found) => {
                        if found.is_empty() {
                            state.dispatch(StepperAction::Failed(format!("No student found for {}", student_no)));
                        }
                        matches.set(found);
                    }
                    Err(e) => {
                        log::error!("Error searching students: {}", e);
                        state.dispatch(StepperAction::Failed(e.to_string()));
                        matches.set(Vec::new());
                    }
                }
                searching.set(false);
            });
        })
    };

    let on_next = {
        let api = api.clone();
        let state = state.clone();
        Callback::from(move |_| {
            let (student_id, months) = match state.next_request() {
                Ok(request) => request,
                Err(e) => {
                    state.dispatch(StepperAction::Failed(e.to_string()));
                    return;
                }
            };
            let api = api.clone();
            let state = state.clone();
            state.dispatch(StepperAction::Busy);
            spawn_local(async move {
                match api.fee_details(&student_id, &months).await {
                    Ok(details) => state.dispatch(StepperAction::FeesLoaded(details)),
                    Err(e) => {
                        log::error!("Error fetching fee details for {}: {}", student_id, e);
                        state.dispatch(StepperAction::Failed(e.to_string()));
                    }
                }
            });
        })
    };

    let on_back = {
        let state = state.clone();
        Callback::from(move |_| state.dispatch(StepperAction::Back))
    };

    let on_restart = {
        let state = state.clone();
        let matches = matches.clone();
        Callback::from(move |_| {
            matches.set(Vec::new());
            state.dispatch(StepperAction::Reset);
        })
    };

    let on_submit = {
        let api = api.clone();
        let state = state.clone();
        let on_paid = props.on_paid.clone();
        Callback::from(move |_| {
            let date = today().format("%d/%m/%Y").to_string();
            let (student_id, body, summary) = match state.submission(&date) {
                Ok(parts) => parts,
                Err(e) => {
                    state.dispatch(StepperAction::Failed(e.to_string()));
                    return;
                }
            };
            let Some(student) = state.student.clone() else {
                return;
            };
            let months = state.months.clone();
            let api = api.clone();
            let state = state.clone();
            let on_paid = on_paid.clone();
            state.dispatch(StepperAction::Busy);
            spawn_local(async move {
                match api.submit_payment(&student_id, &body).await {
                    Ok(confirmation) => {
                        let fallback_id = fees::local_transaction_id(chrono::Utc::now().timestamp_millis());
                        let done = fees::build_receipt(&student, &summary, &months, &confirmation, &date, fallback_id);
                        let payment_id = confirmation.id.clone().or(confirmation.payment_id.clone());
                        state.dispatch(StepperAction::Submitted);
                        on_paid.emit((done, payment_id));
                    }
                    Err(e) => {
                        log::error!("Error submitting payment for {}: {}", student_id, e);
                        state.dispatch(StepperAction::Failed(e.to_string()));
                    }
                }
            });
        })
    };

    let body = match state.step {
        Step::Student => html! {
            <>
                <div class="flex gap-2">
                    <input placeholder="Student number" value={(*search).clone()} oninput={on_search_input} class="flex-1 px-4 py-2 bg-input border border-input rounded-lg text-sm" />
                    <button onclick={on_find} disabled={*searching} class="px-4 py-2 rounded-xl border border-border text-sm">
                        { if *searching { "Searching..." } else { "Find" } }
                    </button>
                </div>
                <div class="divide-y divide-border">
                    { for matches.iter().map(|student| {
                        let selected = state.student.as_ref() == Some(student);
                        let on_pick = {
                            let state = state.clone();
                            let student = student.clone();
                            Callback::from(move |_| state.dispatch(StepperAction::SelectStudent(student.clone())))
                        };
                        let class_name = if selected {
                            "w-full text-left px-3 py-2 text-sm bg-[#B2CBDE] rounded"
                        } else {
                            "w-full text-left px-3 py-2 text-sm hover:bg-muted/30 rounded"
                        };
                        html! {
                            <button type="button" class={class_name} onclick={on_pick}>
                                { format!(
                                    "{} ({}) {}",
                                    student.full_name.clone().unwrap_or_else(|| "N/A".to_string()),
                                    student.student_no.clone().unwrap_or_else(|| "N/A".to_string()),
                                    student.branch_name.clone().unwrap_or_default()
                                ) }
                            </button>
                        }
                    }) }
                </div>
            </>
        },
        Step::Months => {
            let paid = state.paid_months();
            let current_month0 = today().month0();
            html! {
                <div class="grid grid-cols-4 gap-2">
                    { for MONTHS.iter().map(|month| {
                        let status = fees::month_status(month, &paid, current_month0);
                        let selected = state.months.iter().any(|m| m == month);
                        let on_toggle = {
                            let state = state.clone();
                            let month = month.to_string();
                            Callback::from(move |_| state.dispatch(StepperAction::ToggleMonth(month.clone())))
                        };
                        let class_name = classes!(
                            "px-3", "py-2", "rounded-lg", "border", "text-sm", "font-medium",
                            status.css_class(),
                            selected.then_some("bg-[#B2CBDE]"),
                        );
                        html! {
                            <button type="button" class={class_name} disabled={!fees::is_month_selectable(month, &paid)} onclick={on_toggle}>
                                { *month }
                            </button>
                        }
                    }) }
                </div>
            }
        }
        Step::Summary => {
            let summary = state
                .fees
                .as_ref()
                .map(|details| fees::summarize(details, &state.months));
            let rows = summary
                .as_ref()
                .map(|s| fees::fee_rows(&s.course_fees, &state.months))
                .unwrap_or_default();
            let on_status = {
                let state = state.clone();
                Callback::from(move |e: Event| {
                    let status = PaymentStatus::parse(&select_value(&e)).unwrap_or(PaymentStatus::Paid);
                    state.dispatch(StepperAction::SetStatus(status));
                })
            };
            html! {
                <>
                    <table class="w-full text-left text-sm">
                        <thead>
                            <tr class="text-muted-foreground text-[10px] uppercase tracking-widest">
                                <th class="py-2">{"Month"}</th>
                                <th class="py-2">{"Course"}</th>
                                <th class="py-2">{"Grade"}</th>
                                <th class="py-2 text-right">{"Fee"}</th>
                            </tr>
                        </thead>
                        <tbody class="divide-y divide-border">
                            { for rows.iter().map(|row| html! {
                                <tr>
                                    <td class="py-2">{ row.month.clone() }</td>
                                    <td class="py-2">{ row.course_name.clone() }</td>
                                    <td class="py-2">{ row.grade.clone() }</td>
                                    <td class="py-2 text-right">{ format_currency(row.fee, &settings.currency_symbol) }</td>
                                </tr>
                            }) }
                        </tbody>
                    </table>
                    {
                        match summary {
                            Some(s) => html! {
                                <div class="space-y-1 text-sm">
                                    <p>{ format!("Course fees: {}", format_currency(s.total_course_fees, &settings.currency_symbol)) }</p>
                                    <p>{ format!("Admission fee: {}", format_currency(s.admission_fee, &settings.currency_symbol)) }</p>
                                    <p class="font-bold">{ format!("Total: {}", format_currency(s.total_fees, &settings.currency_symbol)) }</p>
                                </div>
                            },
                            None => html! {},
                        }
                    }
                    <select onchange={on_status} class="px-4 py-2 bg-input border border-input rounded-lg text-sm">
                        <option value="Paid" selected={state.status == PaymentStatus::Paid}>{"Paid"}</option>
                        <option value="Pending" selected={state.status == PaymentStatus::Pending}>{"Pending"}</option>
                    </select>
                </>
            }
        }
    };

    let steps = [Step::Student, Step::Months, Step::Summary];

    modal(
        "New Payment".to_string(),
        props.on_close.clone(),
        html! {
            <>
                <div class="flex gap-4 text-xs font-bold uppercase tracking-widest">
                    { for steps.iter().map(|step| {
                        let class_name = if *step == state.step { "text-[#173E63]" } else { "text-slate-400" };
                        html! { <span class={class_name}>{ format!("{}. {}", step.number(), step.title()) }</span> }
                    }) }
                </div>
                { body }
                { banner(&state.error, &None) }
                <div class="flex justify-between">
                    <div class="flex gap-2">
                        <button onclick={on_back} disabled={state.step == Step::Student || state.busy} class="px-4 py-2 rounded-xl border border-border text-sm">{"Back"}</button>
                        <button onclick={on_restart} disabled={state.busy} class="px-4 py-2 rounded-xl text-sm text-muted-foreground">{"Start over"}</button>
                    </div>
                    {
                        if state.step == Step::Summary {
                            html! {
                                <button onclick={on_submit} disabled={!state.can_submit()} class="bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm">
                                    { if state.busy { "Submitting..." } else { "Submit" } }
                                </button>
                            }
                        } else {
                            html! {
                                <button onclick={on_next} disabled={!state.can_advance()} class="bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm">
                                    { if state.busy { "Loading..." } else { "Next" } }
                                </button>
                            }
                        }
                    }
                </div>
            </>
        },
    )
}

#[derive(Properties, PartialEq)]
struct ReceiptViewProps {
    receipt: Receipt,
    symbol: String,
    on_close: Callback<MouseEvent>,
    on_print: Callback<MouseEvent>,
}

#[function_component(ReceiptView)]
fn receipt_view(props: &ReceiptViewProps) -> Html {
    let r = &props.receipt;
    let line = |label: &'static str, value: String| {
        html! {
            <>
                <span class="text-muted-foreground">{ label }</span>
                <span class="text-foreground">{ value }</span>
            </>
        }
    };
    modal(
        "Payment Receipt".to_string(),
        props.on_close.clone(),
        html! {
            <>
                <div class="grid grid-cols-2 gap-2 text-sm">
                    { line("Transaction", r.transaction_id.clone()) }
                    { line("Date", r.date.clone()) }
                    { line("Student", r.full_name.clone()) }
                    { line("Student number", r.student_no.clone()) }
                    { line("Branch", r.branch_name.clone()) }
                    { line("Paid for", r.paid_for.clone()) }
                    { line("Status", r.status.as_str().to_string()) }
                </div>
                <div class="text-sm">
                    <h4 class="font-bold text-foreground mb-2">{"Subjects"}</h4>
                    { for r.subjects.iter().map(|s| html! {
                        <p>{ format!("{} (Grade {})", s.name, s.grade) }</p>
                    }) }
                </div>
                <div class="grid grid-cols-2 gap-2 text-sm">
                    { line("Course fees", format_currency(r.total_course_fees, &props.symbol)) }
                    { line("Admission fee", format_currency(r.admission_fee, &props.symbol)) }
                    { line("Total", format_currency(r.total_fees, &props.symbol)) }
                </div>
                <div class="flex justify-end">
                    <button onclick={props.on_print.clone()} class="bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm">{"Print"}</button>
                </div>
            </>
        },
    )
}
