//! Roster spreadsheets: reading uploads and producing exports.
//!
//! Uploaded files are reduced to a grid of trimmed strings, either by
//! calamine (xlsx, xls, ods) or by the `csv` crate, and the grid is then
//! mapped onto [`RosterRow`]s by header name. Exports use the Italian headers
//! the event staff work with.

use std::{borrow::Cow, io::Cursor};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::{ReaderBuilder, WriterBuilder};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::{EngineError, Participant, ResultEngine};

pub const NAME_HEADER: &str = "Nome";
pub const SURNAME_HEADER: &str = "Cognome";
pub const ROLE_HEADER: &str = "Ruolo";
pub const COMPANY_HEADER: &str = "Azienda";
pub const ATTENDED_HEADER: &str = "Presente";

pub const EXPORT_HEADERS: [&str; 5] = [
    NAME_HEADER,
    SURNAME_HEADER,
    ROLE_HEADER,
    COMPANY_HEADER,
    ATTENDED_HEADER,
];

pub const SHEET_NAME: &str = "Partecipanti";
pub const XLSX_FILE_NAME: &str = "partecipanti.xlsx";
pub const CSV_FILE_NAME: &str = "partecipanti.csv";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// One participant read from an uploaded file. Absent columns are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterRow {
    pub name: String,
    pub surname: String,
    pub role: String,
    pub company: String,
}

impl RosterRow {
    fn is_blank(&self) -> bool {
        self.name.is_empty()
            && self.surname.is_empty()
            && self.role.is_empty()
            && self.company.is_empty()
    }
}

/// Positions of the known headers inside the header row.
#[derive(Debug, Default)]
struct Columns {
    name: Option<usize>,
    surname: Option<usize>,
    role: Option<usize>,
    company: Option<usize>,
}

impl Columns {
    fn locate(header: &[String]) -> ResultEngine<Self> {
        let find = |label: &str| header.iter().position(|cell| cell == label);
        let columns = Self {
            name: find(NAME_HEADER),
            surname: find(SURNAME_HEADER),
            role: find(ROLE_HEADER),
            company: find(COMPANY_HEADER),
        };

        if columns.name.is_none()
            && columns.surname.is_none()
            && columns.role.is_none()
            && columns.company.is_none()
        {
            return Err(EngineError::Import(format!(
                "no known column found, expected at least one of {NAME_HEADER}, \
                 {SURNAME_HEADER}, {ROLE_HEADER}, {COMPANY_HEADER}"
            )));
        }
        Ok(columns)
    }

    fn extract(&self, row: &[String]) -> RosterRow {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .cloned()
                .unwrap_or_default()
        };
        RosterRow {
            name: cell(self.name),
            surname: cell(self.surname),
            role: cell(self.role),
            company: cell(self.company),
        }
    }
}

/// Read the roster rows out of an uploaded file.
///
/// Files whose name ends in `.csv` are parsed as CSV (comma or semicolon
/// separated); anything else goes through calamine, which sniffs the actual
/// workbook format. The first non-empty row is the header.
pub fn parse_roster(file_name: &str, bytes: &[u8]) -> ResultEngine<Vec<RosterRow>> {
    let grid = if file_name.to_ascii_lowercase().ends_with(".csv") {
        csv_grid(bytes)?
    } else {
        workbook_grid(bytes)?
    };
    rows_from_grid(grid)
}

fn rows_from_grid(grid: Vec<Vec<String>>) -> ResultEngine<Vec<RosterRow>> {
    let mut rows = grid
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()));

    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = Columns::locate(&header)?;

    Ok(rows
        .map(|row| columns.extract(&row))
        .filter(|row| !row.is_blank())
        .collect())
}

fn workbook_grid(bytes: &[u8]) -> ResultEngine<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|err| EngineError::Import(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EngineError::Import("workbook has no sheets".to_string()))?
        .map_err(|err| EngineError::Import(err.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.trim().to_string(),
        // Spreadsheets store every number as a float; "3.0" should read "3".
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string().trim().to_string(),
    }
}

fn csv_grid(bytes: &[u8]) -> ResultEngine<Vec<Vec<String>>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text =
        std::str::from_utf8(bytes).map_err(|err| EngineError::Import(err.to_string()))?;

    let first_line = text.lines().next().unwrap_or_default();
    let delimiter = if first_line.contains(';') && !first_line.contains(',') {
        b';'
    } else {
        b','
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| EngineError::Import(err.to_string()))?;
        grid.push(
            record
                .iter()
                .map(|cell| unquote_csv_cell(cell.trim()).to_string())
                .collect(),
        );
    }
    Ok(grid)
}

/// Build the xlsx export of the given participants.
///
/// The `Presente` column carries the same label the dashboard shows.
pub fn export_xlsx(participants: &[Participant]) -> ResultEngine<Vec<u8>> {
    write_workbook(participants).map_err(|err| EngineError::Export(err.to_string()))
}

fn write_workbook(participants: &[Participant]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, header) in (0u16..).zip(EXPORT_HEADERS) {
        sheet.write_string_with_format(0, col, header, &header_format)?;
    }

    for (row, participant) in (1u32..).zip(participants) {
        sheet.write_string(row, 0, &participant.name)?;
        sheet.write_string(row, 1, &participant.surname)?;
        sheet.write_string(row, 2, &participant.role)?;
        sheet.write_string(row, 3, &participant.company)?;
        sheet.write_string(row, 4, participant.status_label())?;
    }
    sheet.autofit();

    workbook.save_to_buffer()
}

/// Characters that make a spreadsheet treat a CSV cell as a formula.
const FORMULA_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

/// Quote a cell that would otherwise be evaluated as a formula.
fn csv_cell(value: &str) -> Cow<'_, str> {
    if value.starts_with(FORMULA_PREFIXES) {
        Cow::Owned(format!("'{value}"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Undo [`csv_cell`] so exported files import back unchanged.
fn unquote_csv_cell(value: &str) -> &str {
    match value.strip_prefix('\'') {
        Some(rest) if rest.starts_with(FORMULA_PREFIXES) => rest,
        _ => value,
    }
}

/// Build the CSV export of the given participants, same columns as the xlsx.
///
/// Cells starting with a formula character are prefixed with `'`.
pub fn export_csv(participants: &[Participant]) -> ResultEngine<Vec<u8>> {
    let export_err = |err: csv::Error| EngineError::Export(err.to_string());

    let mut writer = WriterBuilder::new().from_writer(vec![]);
    writer.write_record(EXPORT_HEADERS).map_err(export_err)?;
    for participant in participants {
        writer
            .write_record(
                [
                    csv_cell(&participant.name),
                    csv_cell(&participant.surname),
                    csv_cell(&participant.role),
                    csv_cell(&participant.company),
                    Cow::Borrowed(participant.status_label()),
                ]
                .iter()
                .map(|cell| cell.as_bytes()),
            )
            .map_err(export_err)?;
    }

    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn participant(name: &str, surname: &str, attended: bool) -> Participant {
        Participant {
            id: 1,
            name: name.to_string(),
            surname: surname.to_string(),
            role: "CTO".to_string(),
            company: "Motus".to_string(),
            attended,
            created_at: Utc::now(),
        }
    }

    fn row(name: &str, surname: &str, role: &str, company: &str) -> RosterRow {
        RosterRow {
            name: name.to_string(),
            surname: surname.to_string(),
            role: role.to_string(),
            company: company.to_string(),
        }
    }

    #[test]
    fn csv_columns_are_found_by_header_in_any_order() {
        let data = "Azienda,Cognome,Nome,Ruolo\nAcme, Rossi ,Mario,CEO\n";
        let rows = parse_roster("roster.csv", data.as_bytes()).unwrap();
        assert_eq!(rows, vec![row("Mario", "Rossi", "CEO", "Acme")]);
    }

    #[test]
    fn missing_columns_default_to_empty() {
        let data = "Nome,Cognome\nMario,Rossi\nLuigi\n";
        let rows = parse_roster("roster.CSV", data.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![row("Mario", "Rossi", "", ""), row("Luigi", "", "", "")]
        );
    }

    #[test]
    fn semicolon_separated_csv_is_accepted() {
        let data = "\u{feff}Nome;Cognome;Azienda\nAnna;Bianchi;Enel\n";
        let rows = parse_roster("export.csv", data.as_bytes()).unwrap();
        assert_eq!(rows, vec![row("Anna", "Bianchi", "", "Enel")]);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let data = "Nome,Cognome,Note\n,,\nMario,Rossi,x\n,,only a note\n";
        let rows = parse_roster("roster.csv", data.as_bytes()).unwrap();
        assert_eq!(rows, vec![row("Mario", "Rossi", "", "")]);
    }

    #[test]
    fn header_without_known_columns_is_rejected() {
        let data = "first,last\nMario,Rossi\n";
        assert!(matches!(
            parse_roster("roster.csv", data.as_bytes()),
            Err(EngineError::Import(_))
        ));
    }

    #[test]
    fn empty_file_has_no_rows() {
        assert_eq!(parse_roster("roster.csv", b"").unwrap(), Vec::new());
    }

    #[test]
    fn garbage_workbook_is_an_import_error() {
        assert!(matches!(
            parse_roster("roster.xlsx", b"definitely not a workbook"),
            Err(EngineError::Import(_))
        ));
    }

    #[test]
    fn whole_numbers_lose_their_decimal_part() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::String("  Rossi ".to_string())), "Rossi");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn xlsx_export_reads_back_as_the_same_roster() {
        let participants = vec![
            participant("Mario", "Rossi", true),
            participant("Anna", "Bianchi", false),
        ];
        let bytes = export_xlsx(&participants).unwrap();
        assert!(bytes.starts_with(b"PK"));

        let rows = parse_roster(XLSX_FILE_NAME, &bytes).unwrap();
        assert_eq!(
            rows,
            vec![
                row("Mario", "Rossi", "CTO", "Motus"),
                row("Anna", "Bianchi", "CTO", "Motus"),
            ]
        );
    }

    #[test]
    fn csv_export_uses_status_labels() {
        let bytes = export_csv(&[participant("Mario", "Rossi", true)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Nome,Cognome,Ruolo,Azienda,Presente",
                "Mario,Rossi,CTO,Motus,Presente"
            ]
        );
    }

    #[test]
    fn csv_export_neutralizes_formulas() {
        let mut guest = participant("Mario", "Rossi", false);
        guest.company = "=HYPERLINK(\"http://x\")".to_string();
        guest.role = "-".to_string();

        let bytes = export_csv(&[guest]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("'=HYPERLINK"));
        assert!(text.contains(",'-,"));

        let rows = parse_roster(CSV_FILE_NAME, text.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![row("Mario", "Rossi", "-", "=HYPERLINK(\"http://x\")")]
        );
    }

    #[test]
    fn plain_apostrophes_survive_import() {
        let data = "Nome,Cognome,Azienda\nD'Amico,'Neri,'Acme\n";
        let rows = parse_roster("roster.csv", data.as_bytes()).unwrap();
        assert_eq!(rows, vec![row("D'Amico", "'Neri", "", "'Acme")]);
    }
}
