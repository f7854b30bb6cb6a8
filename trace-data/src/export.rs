use std::io::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use trace_core::format::{format_date, format_money};
use trace_core::models::{Device, DiscountRecord};
use trace_core::validation::{format_rut, validate_rut};
use tracing::{info, warn};

/// File stem for the full inventory export.
pub const INVENTORY_STEM: &str = "inventario_general";

/// File stem for the loss/theft discount report.
pub const DISCOUNTS_STEM: &str = "reporte_descuentos_robo_perdida";

/// Written for a missing model or phone number in the inventory sheet.
const NOT_AVAILABLE: &str = "N/A";

/// Byte order mark so spreadsheet tools detect UTF-8.
const BOM: &[u8] = "\u{FEFF}".as_bytes();

const DEVICE_HEADERS: [&str; 8] = [
    "Tipo",
    "Marca",
    "Modelo",
    "Serie/IMEI",
    "Número Teléfono",
    "Estado",
    "Sucursal",
    "Fecha Ingreso",
];

const DISCOUNT_HEADERS: [&str; 11] = [
    "Empleado",
    "RUT",
    "Sucursal",
    "Tipo Dispositivo",
    "Marca",
    "Modelo",
    "Serie/IMEI",
    "Fecha Reporte",
    "Monto Total",
    "Número Cuotas",
    "Mes Primera Cuota",
];

/// Errors that can occur while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,

    #[error("CSV write error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

/// `"{stem}_{YYYY-MM-DD}.csv"`.
pub fn dated_filename(
    stem: &str,
    date: NaiveDate,
) -> String {
    format!("{stem}_{}.csv", date.format("%Y-%m-%d"))
}

/// Writes the inventory sheet. Returns the number of data rows written.
pub fn export_devices<W: Write>(
    devices: &[Device],
    writer: W,
) -> Result<usize, ExportError> {
    let rows = devices.iter().map(|device| {
        vec![
            device.kind.sheet_label().to_string(),
            device.brand.clone(),
            device.model.as_deref().unwrap_or(NOT_AVAILABLE).to_string(),
            cell(device.serial_number.as_deref().or(device.imei.as_deref())),
            device
                .phone_number
                .as_deref()
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            device.status.sheet_label().to_string(),
            device.branch_label(),
            format_date(device.acquisition_date),
        ]
    });
    write_sheet(&DEVICE_HEADERS, rows, writer)
}

/// Writes the discount report. Returns the number of data rows written.
pub fn export_discounts<W: Write>(
    records: &[DiscountRecord],
    writer: W,
) -> Result<usize, ExportError> {
    let rows = records.iter().map(|record| {
        vec![
            cell(record.employee_name.as_deref()),
            record
                .employee_rut
                .as_deref()
                .map(rut_cell)
                .unwrap_or_default(),
            cell(record.branch.as_deref()),
            cell(record.device_kind.map(|k| k.sheet_label())),
            cell(record.brand.as_deref()),
            cell(record.model.as_deref()),
            cell(record.device_identifier.as_deref()),
            record.reported_on.map(format_date).unwrap_or_default(),
            money_cell(record.total_amount),
            record
                .installments
                .map(|n| n.to_string())
                .unwrap_or_default(),
            cell(record.first_installment_month.as_deref()),
        ]
    });
    write_sheet(&DISCOUNT_HEADERS, rows, writer)
}

fn write_sheet<W, I>(
    headers: &[&str],
    rows: I,
    mut writer: W,
) -> Result<usize, ExportError>
where
    W: Write,
    I: ExactSizeIterator<Item = Vec<String>>,
{
    if rows.len() == 0 {
        warn!("export requested with no rows");
        return Err(ExportError::Empty);
    }

    writer.write_all(BOM)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(headers)?;

    let mut written = 0;
    for row in rows {
        csv_writer.write_record(&row)?;
        written += 1;
    }
    csv_writer.flush()?;

    info!(rows = written, columns = headers.len(), "export written");
    Ok(written)
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Canonical `12.345.678-5` form. A RUT with a wrong check digit is
/// written as received.
fn rut_cell(rut: &str) -> String {
    if validate_rut(rut) {
        format_rut(rut)
    } else {
        warn!(rut, "discount report carries an invalid RUT");
        rut.to_string()
    }
}

fn money_cell(value: Option<Decimal>) -> String {
    value.map(format_money).unwrap_or_default()
}
