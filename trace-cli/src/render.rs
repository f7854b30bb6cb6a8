//! Plain-text views printed by the commands.

use std::fmt::Write;

use chrono::NaiveDate;
use trace_core::calculations::{DepreciationResult, ValuationForm};
use trace_core::controller::{DeviceMenu, ReturnOutcome};
use trace_core::format::{format_date, format_money, format_opt_money};
use trace_core::lifecycle::DeviceAction;
use trace_core::models::Device;
use trace_core::validation::validate_phone;

/// Command that performs `action`.
pub fn command_for(action: DeviceAction) -> &'static str {
    match action {
        DeviceAction::SendToMaintenance => "maintenance",
        DeviceAction::MarkAvailable => "mark-available",
        DeviceAction::ReturnFromMaintenance => "return-from-maintenance",
        DeviceAction::Retire => "retire",
    }
}

pub fn device_summary(device: &Device) -> String {
    let mut line = format!("#{} {} {}", device.id, device.kind.label(), device.brand);
    if let Some(model) = &device.model {
        let _ = write!(line, " {model}");
    }
    let _ = write!(line, " [{}]", device.display_identifier());
    line
}

pub fn device_details(
    device: &Device,
    today: NaiveDate,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", device_summary(device));
    let _ = writeln!(out, "  Status:      {}", device.status.label());
    let _ = writeln!(
        out,
        "  Assignment:  {}",
        if device.has_active_assignment { "active" } else { "none" }
    );
    let _ = writeln!(out, "  Branch:      {}", device.branch_label());
    if let Some(phone) = &device.phone_number {
        let note = if validate_phone(phone) { "" } else { " (not a mobile number)" };
        let _ = writeln!(out, "  Phone:       {phone}{note}");
    }
    if let Some(invoice) = &device.invoice_number {
        let _ = writeln!(out, "  Invoice:     {invoice}");
    }
    let _ = writeln!(out, "  Acquired:    {}", format_date(device.acquisition_date));
    if let Some(months) = device.age_in_months(today) {
        let unit = if months == 1 { "month" } else { "months" };
        let _ = writeln!(out, "  Age:         {months} {unit}");
    }
    if device.kind.depreciates() {
        let _ = writeln!(out, "  Initial:     {}", format_opt_money(&device.initial_value));
        let _ = writeln!(
            out,
            "  Current:     {}{}",
            format_opt_money(&device.current_value),
            if device.is_manual_value { " (manual)" } else { "" }
        );
    }
    out
}

pub fn device_row(device: &Device) -> String {
    format!("{:<12} {}", device.status.label(), device_summary(device))
}

pub fn menu(menu: &DeviceMenu) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", device_summary(&menu.device));
    let _ = writeln!(out, "  Status: {}", menu.device.status.label());

    if menu.actions.is_empty() {
        let _ = writeln!(out, "  No actions available.");
        return out;
    }
    for action in &menu.actions {
        let _ = writeln!(
            out,
            "  {:<24} {}",
            command_for(*action),
            action.description(menu.device.status)
        );
    }
    out
}

pub fn return_outcome(outcome: &ReturnOutcome) -> String {
    let mut out = format!(
        "Return recorded. {} is now {}.\n",
        device_summary(&outcome.device),
        outcome.device.status.label()
    );
    if !outcome.matches_preview() {
        let _ = writeln!(
            out,
            "Note: expected {}, the backend reports {}.",
            outcome.expected_status.label(),
            outcome.device.status.label()
        );
    }
    out
}

pub fn valuation(
    form: &ValuationForm,
    result: &DepreciationResult,
    today: NaiveDate,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Valuation on {}", format_date(today));
    let _ = writeln!(out, "  Periods:       {}", result.periods);
    let _ = writeln!(out, "  Depreciation:  {}%", result.depreciation_percent);
    let _ = writeln!(out, "  Computed:      {}", format_money(result.value));
    if form.is_manual_value() {
        let _ = writeln!(
            out,
            "  Entered:       {} (manual)",
            format_opt_money(&form.current_value())
        );
    }
    if result.fully_depreciated {
        let _ = writeln!(out, "  Fully depreciated.");
    }
    out
}
