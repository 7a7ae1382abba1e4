use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::calendar::{DayCell, MAX_DAYS};
use crate::view::{CalendarView, Notice, RunStatus};

/// Everything the page needs besides the view itself
pub struct PageContext<'a> {
    pub export_url: &'a str,
    pub notices: &'a [Notice],
}

pub fn render_page(view: &CalendarView, ctx: &PageContext<'_>) -> Markup {
    let inputs = view.inputs();
    let grids = view.grids();

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Exam Scheduler" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    h1 { "Exam Scheduler" }

                    @if !ctx.notices.is_empty() {
                        div.notices {
                            @for notice in ctx.notices {
                                (render_notice(notice))
                            }
                        }
                    }

                    section.panel {
                        h2 { "1. Configuration" }
                        form #"config-form" method="post" action="/inputs" {
                            label { "Number of days"
                                input #"numDays" type="number" min="0" max=(MAX_DAYS) name="num_days" value=(inputs.num_days);
                            }
                            label { "Start date"
                                input #"startDate" type="date" name="start_date" value=(inputs.start_date);
                            }
                            label { "Subjects (comma separated)"
                                input #"subjects" type="text" name="subjects" value=(inputs.subjects);
                            }
                            label { "Allowed emails (one per line)"
                                textarea #"allowedEmails" name="allowed_emails" rows="3" { (inputs.allowed_emails) }
                            }
                            label { "Form ID"
                                input #"formId" type="text" name="form_id" value=(inputs.form_id);
                            }
                            input type="hidden" name="form_title" value=(inputs.form_title);
                            button type="submit" { "Update calendar" }
                        }
                    }

                    section.panel {
                        h2 { "2. Holidays" }
                        p.hint { "Click a day to mark it as a holiday." }
                        div.calendar-grid #"calendar-grid" {
                            @for cell in &grids.input {
                                (render_input_cell(cell))
                            }
                        }
                    }

                    section.panel {
                        h2 { "3. Student form" }
                        form method="post" action="/form" {
                            input #"formTitle" type="text" name="title" value=(inputs.form_title);
                            button type="submit" { "Create form" }
                        }
                        @if let Some(link) = view.form_link() {
                            div #"form-link-container" {
                                "Form: "
                                a #"formURL" href=(link.url) target="_blank" { (link.url) }
                            }
                        }
                    }

                    section.panel {
                        h2 { "4. Schedule" }
                        form method="post" action="/run" {
                            button type="submit" { "Run scheduler" }
                        }
                        div.status.(status_class(view.status())) #"status-bar" {
                            (view.status().label())
                            @if let RunStatus::Error(message) = view.status() {
                                " " span.status-message { (message) }
                            }
                        }
                        @if let Some(summary) = view.summary() {
                            div #"result-area" {
                                p {
                                    "Algorithm: " strong #"algoName" { (summary.algo) }
                                    " | Penalty: " strong #"penaltyVal" { (summary.penalty_display()) }
                                }
                                a.export href=(ctx.export_url) { "Download Word schedule" }
                            }
                        }
                        div.calendar-grid #"result-calendar" {
                            @for cell in &grids.result {
                                (render_result_cell(cell))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_input_cell(cell: &DayCell) -> Markup {
    html! {
        form.day-form method="post" action={"/holidays/" (cell.index)} {
            button.day-box.is-holiday[cell.is_holiday] type="submit" data-index=(cell.index) {
                span { (cell.label) }
                br;
                span { "(" (cell.index + 1) ")" }
            }
        }
    }
}

fn render_result_cell(cell: &DayCell) -> Markup {
    html! {
        div.day-box.is-holiday[cell.is_holiday].has-exam[cell.has_exam()] data-index=(cell.index) {
            span { (cell.label) }
            @if let Some(text) = &cell.exam_text {
                div.day-content { (text) }
            }
        }
    }
}

fn render_notice(notice: &Notice) -> Markup {
    let (class, text) = match notice {
        Notice::Info(t) => ("info", t),
        Notice::Warning(t) => ("warning", t),
        Notice::Error(t) => ("error", t),
    };
    html! {
        div.notice.(class) { (text) }
    }
}

fn status_class(status: &RunStatus) -> &'static str {
    match status {
        RunStatus::Idle => "idle",
        RunStatus::Running => "running",
        RunStatus::Done => "done",
        RunStatus::Error(_) => "error",
    }
}

const CSS: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
    background: #f4f5f7;
    color: #222;
    line-height: 1.4;
}

.container {
    max-width: 1000px;
    margin: 0 auto;
    padding: 32px 20px 60px;
}

h1 {
    font-size: 2.2em;
    margin-bottom: 24px;
}

h2 {
    font-size: 1.1em;
    margin-bottom: 12px;
}

.panel {
    background: #fff;
    border: 1px solid #ddd;
    border-radius: 8px;
    padding: 20px;
    margin-bottom: 20px;
}

label {
    display: block;
    margin-bottom: 10px;
    font-size: 0.9em;
}

input, textarea {
    display: block;
    width: 100%;
    padding: 6px 8px;
    margin-top: 4px;
    border: 1px solid #ccc;
    border-radius: 4px;
}

button {
    padding: 6px 14px;
    border: 1px solid #888;
    border-radius: 4px;
    background: #fafafa;
    cursor: pointer;
}

.hint {
    color: #666;
    font-size: 0.85em;
    margin-bottom: 10px;
}

.calendar-grid {
    display: grid;
    grid-template-columns: repeat(7, 1fr);
    gap: 8px;
    margin-top: 12px;
}

.day-form {
    margin: 0;
}

.day-box {
    width: 100%;
    min-height: 64px;
    padding: 8px;
    border: 1px solid #ccc;
    border-radius: 6px;
    background: #fff;
    font-size: 0.8em;
    text-align: center;
}

.day-box.is-holiday {
    background: #ffd7d7;
    border-color: #e08080;
}

.day-box.has-exam {
    background: #d7f0ff;
    border-color: #5aa9d6;
}

.day-content {
    margin-top: 4px;
    font-weight: 700;
    white-space: pre-line;
}

.status {
    margin: 12px 0;
    font-weight: 700;
}

.status.error {
    color: #b00020;
}

.status.done {
    color: #1b7f3a;
}

.notice {
    padding: 10px 14px;
    border-radius: 6px;
    margin-bottom: 10px;
}

.notice.info {
    background: #e3f4e8;
}

.notice.warning {
    background: #fff4d6;
}

.notice.error {
    background: #fde2e2;
}

.export {
    display: inline-block;
    margin-top: 6px;
}

@media (max-width: 768px) {
    .calendar-grid {
        grid-template-columns: repeat(4, 1fr);
    }
}
"#;
