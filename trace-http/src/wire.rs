//! JSON bodies exchanged with the inventory backend. Field names follow the
//! backend; conversion into domain models happens through `TryFrom`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trace_core::api::{BackendError, Page};
use trace_core::lifecycle::ActionRequest;
use trace_core::models::{
    Assignment, AssignmentStatus, DeliveryKind, Device, DeviceKind, DeviceStatus,
    DiscountLetterParams, DiscountRecord, NewReturn, spanish_month_name,
};

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceDto {
    id: i64,
    tipo_equipo: String,
    marca: String,
    #[serde(default)]
    modelo: Option<String>,
    #[serde(default)]
    numero_serie: Option<String>,
    #[serde(default)]
    imei: Option<String>,
    #[serde(default)]
    numero_telefono: Option<String>,
    #[serde(default)]
    numero_factura: Option<String>,
    estado: String,
    sucursal: i64,
    #[serde(default)]
    sucursal_detail: Option<BranchDetailDto>,
    fecha_ingreso: NaiveDate,
    #[serde(default)]
    valor_inicial: Option<Decimal>,
    #[serde(default)]
    valor_depreciado: Option<Decimal>,
    #[serde(default)]
    es_valor_manual: bool,
    #[serde(default)]
    asignacion_activa: Option<bool>,
}

impl TryFrom<DeviceDto> for Device {
    type Error = BackendError;

    fn try_from(dto: DeviceDto) -> Result<Self, Self::Error> {
        let kind = DeviceKind::parse(&dto.tipo_equipo)
            .ok_or_else(|| BackendError::Decode(format!("unknown device type: {}", dto.tipo_equipo)))?;
        let status = DeviceStatus::parse(&dto.estado)
            .ok_or_else(|| BackendError::Decode(format!("unknown device status: {}", dto.estado)))?;

        Ok(Device {
            id: dto.id,
            kind,
            brand: dto.marca,
            model: non_empty(dto.modelo),
            serial_number: non_empty(dto.numero_serie),
            imei: non_empty(dto.imei),
            phone_number: non_empty(dto.numero_telefono),
            invoice_number: non_empty(dto.numero_factura),
            branch_id: dto.sucursal,
            branch_name: non_empty(dto.sucursal_detail.and_then(|b| b.nombre)),
            status,
            has_active_assignment: dto.asignacion_activa.unwrap_or(false),
            initial_value: dto.valor_inicial,
            acquisition_date: dto.fecha_ingreso,
            current_value: dto.valor_depreciado,
            is_manual_value: dto.es_valor_manual,
        })
    }
}

/// Transition endpoints answer either `{message, device}` or the bare device.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DeviceEnvelope {
    Wrapped {
        #[serde(default)]
        message: Option<String>,
        device: DeviceDto,
    },
    Bare(DeviceDto),
}

impl DeviceEnvelope {
    pub(crate) fn into_parts(self) -> (Option<String>, DeviceDto) {
        match self {
            Self::Wrapped { message, device } => (message, device),
            Self::Bare(device) => (None, device),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageDto<T> {
    count: u64,
    #[serde(default)]
    next: Option<String>,
    results: Vec<T>,
}

impl<T> PageDto<T> {
    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub(crate) fn into_results(self) -> Vec<T> {
        self.results
    }
}

impl TryFrom<PageDto<DeviceDto>> for Page<Device> {
    type Error = BackendError;

    fn try_from(dto: PageDto<DeviceDto>) -> Result<Self, Self::Error> {
        Ok(Page {
            count: dto.count,
            has_next: dto.next.is_some(),
            results: dto
                .results
                .into_iter()
                .map(Device::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentDto {
    id: i64,
    empleado: i64,
    dispositivo: i64,
    tipo_entrega: String,
    fecha_entrega: NaiveDate,
    #[serde(default)]
    fecha_devolucion: Option<NaiveDate>,
    estado_asignacion: String,
    #[serde(default)]
    observaciones: Option<String>,
}

impl TryFrom<AssignmentDto> for Assignment {
    type Error = BackendError;

    fn try_from(dto: AssignmentDto) -> Result<Self, Self::Error> {
        let delivery_kind = DeliveryKind::parse(&dto.tipo_entrega).ok_or_else(|| {
            BackendError::Decode(format!("unknown delivery type: {}", dto.tipo_entrega))
        })?;
        let status = AssignmentStatus::parse(&dto.estado_asignacion).ok_or_else(|| {
            BackendError::Decode(format!("unknown assignment status: {}", dto.estado_asignacion))
        })?;

        Ok(Assignment {
            id: dto.id,
            employee_id: dto.empleado,
            device_id: dto.dispositivo,
            delivery_kind,
            delivered_on: dto.fecha_entrega,
            returned_on: dto.fecha_devolucion,
            status,
            notes: non_empty(dto.observaciones),
        })
    }
}

/// An assignment from the discount report listing, with its employee and
/// device expanded.
#[derive(Debug, Deserialize)]
pub(crate) struct DiscountReportDto {
    id: i64,
    #[serde(default)]
    empleado_detail: Option<EmployeeDetailDto>,
    #[serde(default)]
    dispositivo_detail: Option<DeviceDetailDto>,
    #[serde(default)]
    discount_data: Option<DiscountDataDto>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmployeeDetailDto {
    #[serde(default)]
    nombre_completo: Option<String>,
    #[serde(default)]
    rut: Option<String>,
    #[serde(default)]
    sucursal_detail: Option<BranchDetailDto>,
}

#[derive(Debug, Deserialize)]
struct BranchDetailDto {
    #[serde(default)]
    nombre: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceDetailDto {
    #[serde(default)]
    tipo_equipo: Option<String>,
    #[serde(default)]
    marca: Option<String>,
    #[serde(default)]
    modelo: Option<String>,
    #[serde(default)]
    numero_serie: Option<String>,
    #[serde(default)]
    imei: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscountDataDto {
    #[serde(default)]
    monto_total: Option<Decimal>,
    #[serde(default)]
    numero_cuotas: Option<u32>,
    #[serde(default)]
    mes_primera_cuota: Option<String>,
    #[serde(default)]
    fecha_generacion: Option<String>,
}

impl From<DiscountReportDto> for DiscountRecord {
    fn from(dto: DiscountReportDto) -> Self {
        let employee = dto.empleado_detail;
        let device = dto.dispositivo_detail;
        let discount = dto.discount_data;

        let branch = employee
            .as_ref()
            .and_then(|e| e.sucursal_detail.as_ref())
            .and_then(|b| b.nombre.clone());
        let reported_on = discount
            .as_ref()
            .and_then(|d| d.fecha_generacion.as_deref())
            .or(dto.updated_at.as_deref())
            .and_then(leading_date);

        DiscountRecord {
            assignment_id: dto.id,
            branch: non_empty(branch),
            employee_name: non_empty(employee.as_ref().and_then(|e| e.nombre_completo.clone())),
            employee_rut: non_empty(employee.and_then(|e| e.rut)),
            device_kind: device
                .as_ref()
                .and_then(|d| d.tipo_equipo.as_deref())
                .and_then(DeviceKind::parse),
            brand: non_empty(device.as_ref().and_then(|d| d.marca.clone())),
            model: non_empty(device.as_ref().and_then(|d| d.modelo.clone())),
            device_identifier: device.and_then(|d| non_empty(d.numero_serie).or(non_empty(d.imei))),
            reported_on,
            total_amount: discount.as_ref().and_then(|d| d.monto_total),
            installments: discount.as_ref().and_then(|d| d.numero_cuotas),
            first_installment_month: non_empty(discount.and_then(|d| d.mes_primera_cuota)),
        }
    }
}

/// Date part of an ISO date or timestamp.
fn leading_date(value: &str) -> Option<NaiveDate> {
    let date = value.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogoutBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct TransitionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    motivo: Option<&'a str>,
    observaciones: &'a str,
}

impl<'a> From<&'a ActionRequest> for TransitionBody<'a> {
    fn from(request: &'a ActionRequest) -> Self {
        Self {
            motivo: request.reason(),
            observaciones: request.notes().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReturnBody<'a> {
    asignacion: i64,
    fecha_devolucion: NaiveDate,
    estado_dispositivo: &'static str,
    observaciones: &'a str,
}

impl<'a> From<&'a NewReturn> for ReturnBody<'a> {
    fn from(new_return: &'a NewReturn) -> Self {
        Self {
            asignacion: new_return.assignment_id,
            fecha_devolucion: new_return.returned_on,
            estado_dispositivo: new_return.condition.as_str(),
            observaciones: new_return.notes.as_deref().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DiscountLetterBody {
    company_key: &'static str,
    monto_total: Decimal,
    numero_cuotas: u32,
    mes_primera_cuota: &'static str,
}

impl From<&DiscountLetterParams> for DiscountLetterBody {
    fn from(params: &DiscountLetterParams) -> Self {
        Self {
            company_key: params.company().as_str(),
            monto_total: params.total_amount(),
            numero_cuotas: params.installments(),
            mes_primera_cuota: spanish_month_name(params.first_installment_month()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
