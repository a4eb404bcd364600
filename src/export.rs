use crate::errors::{AppError, AppResult};
use crate::models::{AttendanceRecord, Day, Person, RosterPerson};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook};
use tracing::info;

pub const MISSING_VALUE: &str = "Sin registrar";
pub const SHEET_NAME: &str = "Asistencias";
pub const SPREADSHEET_PREFIX: &str = "Asistencias";
pub const ROSTER_PREFIX: &str = "Asistencia";

pub const HEADERS: [&str; 6] = [
    "Nombre",
    "OOAD",
    "Día 1 - Entrada",
    "Día 1 - Salida",
    "Día 2 - Entrada",
    "Día 2 - Salida",
];
const COLUMN_WIDTHS: [f64; 6] = [30.0, 25.0, 20.0, 20.0, 20.0, 20.0];

pub const EMPTY_EXPORT_MESSAGE: &str = "There is nobody on the roster to export yet.";

/// A generated download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn file_name(prefix: &str, date: NaiveDate, extension: &str) -> String {
    format!("{prefix}_{}.{extension}", date.format("%Y-%m-%d"))
}

pub fn format_timestamp(value: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    match value {
        Some(ts) => ts
            .with_timezone(&offset)
            .format("%d/%m/%Y, %I:%M %p")
            .to_string(),
        None => MISSING_VALUE.to_string(),
    }
}

/// One row per person: name, category, then both slots of both days.
pub fn attendance_rows(
    people: &[Person],
    records: &[AttendanceRecord],
    offset: FixedOffset,
) -> Vec<[String; 6]> {
    people
        .iter()
        .map(|person| {
            let record_for = |day: Day| {
                records
                    .iter()
                    .find(|record| record.person_id == person.id && record.day == day)
            };
            let one = record_for(Day::One);
            let two = record_for(Day::Two);
            [
                person.name.clone(),
                person.category.clone().unwrap_or_default(),
                format_timestamp(one.and_then(|r| r.check_in), offset),
                format_timestamp(one.and_then(|r| r.check_out), offset),
                format_timestamp(two.and_then(|r| r.check_in), offset),
                format_timestamp(two.and_then(|r| r.check_out), offset),
            ]
        })
        .collect()
}

pub fn attendance_workbook(
    people: &[Person],
    records: &[AttendanceRecord],
    offset: FixedOffset,
    today: NaiveDate,
) -> AppResult<ExportFile> {
    if people.is_empty() {
        return Err(AppError::validation(EMPTY_EXPORT_MESSAGE));
    }

    let rows = attendance_rows(people, records, offset);
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::RGB(0xFFFFFF))
            .set_background_color(Color::RGB(0x2F4858))
            .set_pattern(FormatPattern::Solid)
            .set_border(FormatBorder::Thin);
        let cell_format = Format::new().set_border(FormatBorder::Thin);

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }
        for (index, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string_with_format(
                    (index + 1) as u32,
                    col as u16,
                    value,
                    &cell_format,
                )?;
            }
        }
        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }
        worksheet.set_freeze_panes(1, 0)?;
    }

    let bytes = workbook.save_to_buffer()?;
    let name = file_name(SPREADSHEET_PREFIX, today, "xlsx");
    info!(file = %name, rows = rows.len(), "attendance spreadsheet exported");

    Ok(ExportFile {
        file_name: name,
        content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        bytes,
    })
}

pub fn roster_json(people: &[RosterPerson], today: NaiveDate) -> AppResult<ExportFile> {
    if people.is_empty() {
        return Err(AppError::validation(EMPTY_EXPORT_MESSAGE));
    }

    let bytes = serde_json::to_vec_pretty(people)?;
    let name = file_name(ROSTER_PREFIX, today, "json");
    info!(file = %name, people = people.len(), "roster exported");

    Ok(ExportFile {
        file_name: name,
        content_type: "application/json",
        bytes,
    })
}
