use std::path::PathBuf;

use chrono::{Month, NaiveDate};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use trace_core::format::{parse_date, parse_money};
use trace_core::models::{
    CompanyKey, DEFAULT_INSTALLMENTS, DeviceKind, DeviceStatus, ReturnCondition, parse_month,
};

/// Device lifecycle and valuation tool for the TechTrace inventory backend.
#[derive(Debug, Parser)]
#[command(name = "techtrace", version)]
pub struct Cli {
    /// Configuration file. Defaults to `techtrace.toml` in the working
    /// directory when it exists.
    #[arg(long, global = true, env = "TECHTRACE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend to use, overriding the configuration file.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Backend base URL, overriding the configuration file.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Log level or filter directive, overriding the configuration file.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Hide log output on the terminal.
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and keep the session for later commands.
    Login {
        #[arg(long, short)]
        username: String,

        /// Asked on the terminal when not given.
        #[arg(long, env = "TECHTRACE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the stored session.
    Logout,

    /// Show one device.
    Show { device: i64 },

    /// List devices.
    List(ListArgs),

    /// Show the actions a device offers right now.
    Actions { device: i64 },

    /// Send a device to maintenance.
    Maintenance {
        device: i64,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a device in maintenance with no open assignment as available.
    MarkAvailable {
        device: i64,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Give a repaired device back to its employee.
    ReturnFromMaintenance {
        device: i64,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Retire a device permanently.
    Retire {
        device: i64,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        notes: Option<String>,

        /// Skip the confirmation question.
        #[arg(long, short)]
        yes: bool,
    },

    /// Record the return of an assigned device.
    Return {
        assignment: i64,

        /// optimal, damaged or non-functional.
        #[arg(long, value_parser = return_condition_arg)]
        condition: ReturnCondition,

        /// Return date (YYYY-MM-DD). Defaults to today.
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Generate the loss/theft discount letter for an assignment.
    DiscountLetter(DiscountLetterArgs),

    /// Compute the depreciated value of a device.
    Valuate(ValuateArgs),

    /// Write a CSV export.
    #[command(subcommand)]
    Export(ExportCommand),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, value_parser = status_arg)]
    pub status: Option<DeviceStatus>,

    #[arg(long, value_parser = kind_arg)]
    pub kind: Option<DeviceKind>,

    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Args)]
pub struct DiscountLetterArgs {
    pub assignment: i64,

    /// pompeyo_carrasco or pompeyo_automoviles.
    #[arg(long, value_parser = company_arg, default_value = "pompeyo_carrasco")]
    pub company: CompanyKey,

    /// Total to discount. Defaults to the device's current value.
    #[arg(long, value_parser = money_arg)]
    pub amount: Option<Decimal>,

    #[arg(long, default_value_t = DEFAULT_INSTALLMENTS)]
    pub installments: u32,

    /// Month of the first deduction: number, Spanish or English name.
    #[arg(long, value_parser = month_arg)]
    pub first_month: Month,

    /// Where to write the letter.
    #[arg(long)]
    pub out: PathBuf,

    /// Skip the confirmation question.
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct ValuateArgs {
    /// Purchase value.
    #[arg(long, value_parser = money_arg)]
    pub initial: Decimal,

    /// Acquisition date (YYYY-MM-DD).
    #[arg(long, value_parser = date_arg)]
    pub acquired: NaiveDate,

    /// Valuation date. Defaults to today.
    #[arg(long, value_parser = date_arg)]
    pub today: Option<NaiveDate>,

    #[arg(long, value_parser = kind_arg, default_value = "laptop")]
    pub kind: DeviceKind,

    /// A value typed by hand, compared against the computed one.
    #[arg(long, value_parser = money_arg)]
    pub value: Option<Decimal>,
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Inventory of devices.
    Devices {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(long, value_parser = status_arg)]
        status: Option<DeviceStatus>,

        #[arg(long, value_parser = kind_arg)]
        kind: Option<DeviceKind>,

        /// Brand, model, serial or IMEI text to match.
        #[arg(long)]
        search: Option<String>,
    },

    /// Loss/theft discounts issued in a period.
    Discounts {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(long, value_parser = date_arg)]
        from: Option<NaiveDate>,

        #[arg(long, value_parser = date_arg)]
        to: Option<NaiveDate>,

        #[arg(long, value_parser = kind_arg)]
        kind: Option<DeviceKind>,
    },
}

// ─── argument parsers ────────────────────────────────────────────────────────

fn normalize(input: &str) -> String {
    input.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Matches either the backend code or the English label.
fn choice<T: Copy>(
    input: &str,
    all: &[T],
    names: impl Fn(T) -> [&'static str; 2],
) -> Result<T, String> {
    let wanted = normalize(input);
    all.iter()
        .copied()
        .find(|item| names(*item).iter().any(|name| normalize(name) == wanted))
        .ok_or_else(|| {
            let options: Vec<_> = all.iter().map(|item| names(*item)[1].to_lowercase()).collect();
            format!("expected one of: {}", options.join(", "))
        })
}

pub fn kind_arg(input: &str) -> Result<DeviceKind, String> {
    choice(input, &DeviceKind::ALL, |k| [k.as_str(), k.label()])
}

pub fn status_arg(input: &str) -> Result<DeviceStatus, String> {
    choice(input, &DeviceStatus::ALL, |s| [s.as_str(), s.label()])
}

pub fn return_condition_arg(input: &str) -> Result<ReturnCondition, String> {
    choice(input, &ReturnCondition::ALL, |c| [c.as_str(), c.label()])
}

pub fn company_arg(input: &str) -> Result<CompanyKey, String> {
    CompanyKey::parse(&normalize(input))
        .ok_or_else(|| "expected pompeyo_carrasco or pompeyo_automoviles".to_string())
}

pub fn month_arg(input: &str) -> Result<Month, String> {
    parse_month(input).map_err(|e| e.to_string())
}

pub fn date_arg(input: &str) -> Result<NaiveDate, String> {
    parse_date(input).ok_or_else(|| format!("'{input}' is not a date (YYYY-MM-DD)"))
}

pub fn money_arg(input: &str) -> Result<Decimal, String> {
    parse_money(input).ok_or_else(|| format!("'{input}' is not an amount"))
}
