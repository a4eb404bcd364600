use crate::ledger::AttendanceCard;
use crate::models::{Day, DayStats, RosterPerson, RosterStats, Slot, Status, StatusFilter};
use chrono::{DateTime, FixedOffset, Utc};

const NOT_RECORDED: &str = "Not recorded";

/// Escapes text for use in element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Everything the tables dashboard shows.
pub struct AttendancePage<'a> {
    pub day: Day,
    pub stats: DayStats,
    pub cards: &'a [AttendanceCard],
    pub utc_offset: FixedOffset,
    pub form_error: Option<&'a str>,
    pub alert: Option<&'a str>,
}

/// Everything the roster dashboard shows.
pub struct RosterPage<'a> {
    pub filter: StatusFilter,
    pub stats: RosterStats,
    pub people: &'a [RosterPerson],
    pub form_error: Option<&'a str>,
    pub alert: Option<&'a str>,
}

fn format_time(value: DateTime<Utc>, offset: FixedOffset) -> String {
    value.with_timezone(&offset).format("%I:%M %p").to_string()
}

fn disabled_attr(disabled: bool) -> &'static str {
    if disabled { " disabled" } else { "" }
}

pub fn render_attendance_card(card: &AttendanceCard, day: Day, offset: FixedOffset) -> String {
    let person = &card.person;
    let id = escape_html(&person.id.to_string());
    let badge = match &person.category {
        Some(category) => format!(r#"<span class="badge">{}</span>"#, escape_html(category)),
        None => String::new(),
    };

    let mut rows = String::new();
    for (slot, value) in [(Slot::CheckIn, card.check_in), (Slot::CheckOut, card.check_out)] {
        let is_set = value.is_some();
        let time = value
            .map(|ts| format_time(ts, offset))
            .unwrap_or_else(|| NOT_RECORDED.to_string());
        let button = if is_set { "&#10003; Recorded" } else { "Record" };
        rows.push_str(&format!(
            r#"
      <div class="slot-row" data-slot="{slot_value}">
        <div class="slot-label">
          <span class="label">{label}</span>
          <span class="time{marked}">{time}</span>
        </div>
        <form method="post" action="/attendance" data-pending-label="Recording...">
          <input type="hidden" name="person_id" value="{id}" />
          <input type="hidden" name="day" value="{day}" />
          <input type="hidden" name="slot" value="{slot_value}" />
          <button class="btn-slot" type="submit"{disabled}>{button}</button>
        </form>
      </div>"#,
            slot_value = slot.form_value(),
            label = slot.label(),
            marked = if is_set { " marked" } else { "" },
            time = escape_html(&time),
            day = day.number(),
            disabled = disabled_attr(is_set),
        ));
    }

    format!(
        r#"
    <article class="card" data-person-id="{id}">
      <header class="card-header">
        <h3>{name}</h3>
        {badge}
      </header>{rows}
    </article>"#,
        name = escape_html(&person.name),
    )
}

pub fn render_roster_card(person: &RosterPerson, filter: StatusFilter) -> String {
    let id = escape_html(&person.id);
    let settled = person.status != Status::Pending;
    let mut buttons = String::new();
    for (status, class) in [
        (Status::Attended, "btn-attended"),
        (Status::NotAttended, "btn-absent"),
    ] {
        buttons.push_str(&format!(
            r#"
        <form method="post" action="/people/{id}/status" data-pending-label="Saving...">
          <input type="hidden" name="status" value="{value}" />
          <input type="hidden" name="filter" value="{filter}" />
          <button class="{class}" type="submit"{disabled}>{label}</button>
        </form>"#,
            value = status.as_str(),
            filter = filter.as_str(),
            label = status.label(),
            disabled = disabled_attr(settled),
        ));
    }

    format!(
        r#"
    <article class="card" data-person-id="{id}">
      <header class="card-header">
        <h3>{name}</h3>
        <span class="badge status-{status}">{status_label}</span>
      </header>
      <div class="card-actions">{buttons}
        <form method="post" action="/people/{id}/delete" data-pending-label="Deleting...">
          <input type="hidden" name="filter" value="{filter}" />
          <button class="btn-delete" type="submit">Delete</button>
        </form>
      </div>
    </article>"#,
        name = escape_html(&person.name),
        status = person.status.as_str(),
        status_label = person.status.label(),
        filter = filter.as_str(),
    )
}

fn render_alert(alert: Option<&str>) -> String {
    match alert {
        Some(message) => format!(
            r#"<div class="alert" role="alert">{}</div>"#,
            escape_html(message)
        ),
        None => String::new(),
    }
}

fn render_form_error(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(
            r#"<p class="form-error" role="alert">{}</p>"#,
            escape_html(message)
        ),
        None => String::new(),
    }
}

fn stat(label: &str, id: &str, value: usize) -> String {
    format!(
        r#"<div class="stat"><span class="label">{label}</span><span class="value" id="{id}">{value}</span></div>"#
    )
}

pub fn render_attendance_page(page: &AttendancePage<'_>) -> String {
    let mut body = String::new();
    body.push_str(&render_alert(page.alert));

    body.push_str(r#"<section class="panel">"#);
    body.push_str(&stat("People", "total-people", page.stats.total_people));
    body.push_str(&stat("Check-ins", "total-check-ins", page.stats.check_ins));
    body.push_str(&stat("Check-outs", "total-check-outs", page.stats.check_outs));
    body.push_str("</section>");

    body.push_str(r#"<nav class="tabs" aria-label="Event day">"#);
    for day in Day::ALL {
        body.push_str(&format!(
            r#"<a class="tab{active}" href="/?day={n}">Day {n}</a>"#,
            active = if day == page.day { " active" } else { "" },
            n = day.number(),
        ));
    }
    body.push_str("</nav>");

    body.push_str(&format!(
        r#"
    <section class="toolbar">
      <form class="add-form" method="post" action="/people" data-pending-label="Saving...">
        <input type="hidden" name="day" value="{day}" />
        <input name="name" placeholder="Full name" required />
        <input name="category" placeholder="Group (optional)" />
        <button class="btn-primary" type="submit">Add person</button>
        {form_error}
      </form>
      <a class="btn-secondary" href="/export?day={day}">Export spreadsheet</a>
      <form method="post" action="/logout">
        <button class="btn-secondary" type="submit">Sign out</button>
      </form>
    </section>"#,
        day = page.day.number(),
        form_error = render_form_error(page.form_error),
    ));

    if page.cards.is_empty() {
        body.push_str(
            r#"<section class="empty-state" id="empty-state"><p>No people registered yet. Add the first one above.</p></section>"#,
        );
    } else {
        body.push_str(r#"<section class="cards" id="cards">"#);
        for card in page.cards {
            body.push_str(&render_attendance_card(card, page.day, page.utc_offset));
        }
        body.push_str("</section>");
    }

    render_shell("Attendance", &body)
}

pub fn render_roster_page(page: &RosterPage<'_>) -> String {
    let mut body = String::new();
    body.push_str(&render_alert(page.alert));

    body.push_str(r#"<section class="panel">"#);
    body.push_str(&stat("People", "total-people", page.stats.total));
    body.push_str(&stat("Pending", "total-pending", page.stats.pending));
    body.push_str(&stat("Attended", "total-attended", page.stats.attended));
    body.push_str(&stat("Did not attend", "total-not-attended", page.stats.not_attended));
    body.push_str("</section>");

    body.push_str(r#"<nav class="tabs" aria-label="Status filter">"#);
    for filter in StatusFilter::ALL {
        body.push_str(&format!(
            r#"<a class="tab{active}" href="/?filter={value}">{label}</a>"#,
            active = if filter == page.filter { " active" } else { "" },
            value = filter.as_str(),
            label = filter.label(),
        ));
    }
    body.push_str("</nav>");

    body.push_str(&format!(
        r#"
    <section class="toolbar">
      <form class="add-form" method="post" action="/people" data-pending-label="Saving...">
        <input type="hidden" name="filter" value="{filter}" />
        <input name="name" placeholder="Full name" required />
        <button class="btn-primary" type="submit">Add person</button>
        {form_error}
      </form>
      <a class="btn-secondary" href="/export">Export JSON</a>
      <a class="btn-danger" href="/clear">Clear all</a>
    </section>"#,
        filter = page.filter.as_str(),
        form_error = render_form_error(page.form_error),
    ));

    if page.people.is_empty() {
        let message = if page.stats.total == 0 {
            "No people on the roster yet. Add the first one above."
        } else {
            "Nobody matches this filter."
        };
        body.push_str(&format!(
            r#"<section class="empty-state" id="empty-state"><p>{message}</p></section>"#
        ));
    } else {
        body.push_str(r#"<section class="cards" id="cards">"#);
        for person in page.people {
            body.push_str(&render_roster_card(person, page.filter));
        }
        body.push_str("</section>");
    }

    render_shell("Attendance roster", &body)
}

pub fn render_login(error: Option<&str>) -> String {
    let body = format!(
        r#"
    <form class="login" method="post" action="/login" data-pending-label="Signing in...">
      <label>Email <input type="email" name="email" required autofocus /></label>
      <label>Password <input type="password" name="password" required /></label>
      {error}
      <button class="btn-primary" type="submit">Sign in</button>
    </form>"#,
        error = render_form_error(error),
    );
    render_shell("Sign in", &body)
}

/// Question before the roster is wiped. The final form is only offered once
/// the first question came back answered.
pub fn render_clear_confirmation(first_confirmed: bool, total: usize) -> String {
    let body = if !first_confirmed {
        format!(
            r#"
    <section class="confirm">
      <p>This removes all {total} people from the roster. Continue?</p>
      <a class="btn-danger" href="/clear?step=2&amp;first=yes">Yes, continue</a>
      <a class="btn-secondary" href="/">Cancel</a>
    </section>"#
        )
    } else {
        format!(
            r#"
    <section class="confirm">
      <p>Are you absolutely sure? {total} people will be deleted and this cannot be undone.</p>
      <form method="post" action="/clear" data-pending-label="Clearing...">
        <input type="hidden" name="first" value="yes" />
        <button class="btn-danger" type="submit" name="second" value="yes">Delete everything</button>
      </form>
      <a class="btn-secondary" href="/">Cancel</a>
    </section>"#
        )
    };
    render_shell("Clear roster", &body)
}

fn render_shell(title: &str, body: &str) -> String {
    SHELL_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{BODY}}", body)
}

const SHELL_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --ok: #2d7a4b;
      --danger: #c63b2b;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    main {
      width: min(1080px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .panel, .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
    }

    .stat, .card, .confirm, .login, .empty-state {
      background: var(--card);
      border-radius: 18px;
      padding: 18px;
      box-shadow: var(--shadow);
    }

    .stat .label, .slot-label .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .tabs {
      display: flex;
      gap: 6px;
    }

    .tab {
      padding: 8px 14px;
      border-radius: 999px;
      color: #6b645d;
      text-decoration: none;
    }

    .tab.active {
      background: white;
      color: var(--accent-2);
    }

    .toolbar, .add-form, .card-actions {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    .card-header {
      display: flex;
      justify-content: space-between;
      align-items: baseline;
      gap: 8px;
    }

    .badge {
      font-size: 0.8rem;
      padding: 2px 10px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.08);
    }

    .status-attended { color: var(--ok); }
    .status-not-attended { color: var(--danger); }

    .slot-row {
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 8px 0;
    }

    .time.marked {
      color: var(--ok);
      font-weight: 600;
    }

    button, .btn-secondary, .btn-danger {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      text-decoration: none;
    }

    button:disabled {
      opacity: 0.5;
      cursor: default;
    }

    .btn-primary, .btn-slot, .btn-attended { background: var(--accent); color: white; }
    .btn-secondary { background: var(--accent-2); color: white; }
    .btn-danger, .btn-absent, .btn-delete { background: var(--danger); color: white; }

    .alert, .form-error {
      color: var(--danger);
    }

    .alert {
      background: white;
      border-left: 4px solid var(--danger);
      padding: 12px 16px;
      border-radius: 12px;
    }
  </style>
</head>
<body>
  <main>
    <h1>{{TITLE}}</h1>
    {{BODY}}
  </main>
  <script>
    document.querySelectorAll('form[data-pending-label]').forEach((form) => {
      form.addEventListener('submit', () => {
        const button = form.querySelector('button[type="submit"]');
        if (!button) return;
        button.disabled = true;
        button.textContent = form.dataset.pendingLabel;
      });
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Person;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn card(name: &str, category: Option<&str>) -> AttendanceCard {
        AttendanceCard {
            person: Person {
                id: Uuid::new_v4(),
                name: name.to_string(),
                category: category.map(str::to_string),
            },
            check_in: None,
            check_out: None,
        }
    }

    fn roster_person(name: &str, status: Status) -> RosterPerson {
        RosterPerson {
            id: "1741942800000".to_string(),
            name: name.to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            marked_at: None,
        }
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn injected_markup_is_escaped_in_every_user_field() {
        let attack = r#"<script>alert("x")</script>"#;
        let html = render_attendance_card(&card(attack, Some(attack)), Day::One, utc());
        assert!(!html.contains("<script>"));
        assert_eq!(html.matches("&lt;script&gt;").count(), 2);

        let html = render_roster_card(&roster_person(attack, Status::Pending), StatusFilter::All);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"));

        let html = render_login(Some(attack));
        assert!(!html.contains(r#"<script>alert("x")"#));
    }

    #[test]
    fn unset_slots_show_placeholder_and_enabled_buttons() {
        let html = render_attendance_card(&card("Ana", None), Day::Two, utc());
        assert_eq!(html.matches(NOT_RECORDED).count(), 2);
        assert!(!html.contains("disabled"));
        assert!(html.contains(r#"name="day" value="2""#));
    }

    #[test]
    fn set_slot_disables_only_its_button() {
        let mut card = card("Ana", None);
        card.check_in = Some(Utc.with_ymd_and_hms(2026, 3, 14, 15, 5, 0).unwrap());
        let html = render_attendance_card(&card, Day::One, utc());
        assert!(html.contains("03:05 PM"));
        assert_eq!(html.matches(" disabled").count(), 1);
        assert_eq!(html.matches(NOT_RECORDED).count(), 1);
    }

    #[test]
    fn roster_buttons_lock_once_status_is_set() {
        let pending = render_roster_card(&roster_person("Ana", Status::Pending), StatusFilter::All);
        assert!(!pending.contains(" disabled"));

        let attended =
            render_roster_card(&roster_person("Ana", Status::Attended), StatusFilter::All);
        assert_eq!(attended.matches(" disabled").count(), 2);
        assert!(attended.contains("Delete"));
    }

    #[test]
    fn empty_dashboard_shows_empty_state() {
        let page = AttendancePage {
            day: Day::One,
            stats: DayStats {
                day: Day::One,
                total_people: 0,
                check_ins: 0,
                check_outs: 0,
            },
            cards: &[],
            utc_offset: utc(),
            form_error: Some("Name is required."),
            alert: None,
        };
        let html = render_attendance_page(&page);
        assert!(html.contains("empty-state"));
        assert!(!html.contains(r#"id="cards""#));
        assert!(html.contains("Name is required."));
    }

    #[test]
    fn roster_page_marks_active_filter() {
        let people = vec![roster_person("Ana", Status::NotAttended)];
        let page = RosterPage {
            filter: StatusFilter::NotAttended,
            stats: RosterStats {
                total: 1,
                pending: 0,
                attended: 0,
                not_attended: 1,
            },
            people: &people,
            form_error: None,
            alert: Some("Something went wrong, please try again."),
        };
        let html = render_roster_page(&page);
        assert!(html.contains(r#"class="tab active" href="/?filter=not-attended""#));
        assert!(html.contains(r#"role="alert""#));
        assert!(html.contains(r#"id="cards""#));
    }

    #[test]
    fn clear_confirmation_has_two_steps() {
        let first = render_clear_confirmation(false, 3);
        assert!(first.contains("/clear?step=2&amp;first=yes"));
        assert!(!first.contains(r#"action="/clear""#));
        assert!(!first.contains(r#"name="second""#));

        let second = render_clear_confirmation(true, 3);
        assert!(second.contains(r#"action="/clear""#));
        assert!(second.contains(r#"name="first" value="yes""#));
        assert!(second.contains(r#"name="second" value="yes""#));
    }

    #[test]
    fn export_link_keeps_the_viewed_day() {
        let page = AttendancePage {
            day: Day::Two,
            stats: DayStats {
                day: Day::Two,
                total_people: 0,
                check_ins: 0,
                check_outs: 0,
            },
            cards: &[],
            utc_offset: utc(),
            form_error: None,
            alert: None,
        };
        let html = render_attendance_page(&page);
        assert!(html.contains(r#"href="/export?day=2""#));
    }
}
