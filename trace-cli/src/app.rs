use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use trace_core::api::{
    BackendConfig, BackendError, BackendRegistry, DeviceBackend, DeviceFilter,
    DiscountReportFilter,
};
use trace_core::calculations::{DepreciationInput, DepreciationSchedule, ValuationForm};
use trace_core::controller::{ControllerError, DeviceController};
use trace_core::format::format_money;
use trace_core::lifecycle::{
    ActionRequest, DeviceAction, IrreversibleOperation, return_preview,
};
use trace_core::models::{DiscountLetterParams, NewReturn, spanish_month_name};
use trace_data::{
    DISCOUNTS_STEM, ExportError, INVENTORY_STEM, dated_filename, export_devices, export_discounts,
};
use trace_http::HttpBackendFactory;

use crate::cli::{Cli, Command, DiscountLetterArgs, ExportCommand, ListArgs, ValuateArgs};
use crate::config::{AppConfig, LoggingConfig};
use crate::session_store::SessionStore;
use crate::{logging, prompt, render};

/// Page size used when an export walks the whole device listing.
const EXPORT_PAGE_SIZE: u32 = 100;

/// Create a registry with every backend compiled into this binary.
pub fn build_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(Box::new(HttpBackendFactory));
    registry
}

pub async fn connect(config: &BackendConfig) -> anyhow::Result<Arc<dyn DeviceBackend>> {
    debug!(backend = %config.backend, base_url = %config.base_url, "creating backend");
    let backend = build_registry()
        .create(config)
        .await
        .context("cannot set up the backend")?;
    Ok(Arc::from(backend))
}

/// Loads configuration, applies it, and executes the parsed command against
/// stdin and stdout.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let explicit_level = cli.log_level.is_some();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.backend, cli.base_url, cli.log_level);
    apply_logging(&config.logging, explicit_level)?;

    let backend = connect(&config.backend).await?;
    let app = App::new(
        backend,
        SessionStore::new(&config.session.file),
        Local::now().date_naive(),
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    app.execute(cli.command, &mut stdin.lock(), &mut stdout.lock())
        .await
}

fn apply_logging(
    config: &LoggingConfig,
    explicit_level: bool,
) -> anyhow::Result<()> {
    if let Some(level) = &config.level {
        if explicit_level || !logging::env_filter_present() {
            logging::set_log_level(level)?;
        }
    }
    if let Some(file) = &config.file {
        logging::enable_file_logging(file)?;
    }
    Ok(())
}

pub struct App {
    backend: Arc<dyn DeviceBackend>,
    store: SessionStore,
    today: NaiveDate,
}

impl App {
    pub fn new(
        backend: Arc<dyn DeviceBackend>,
        store: SessionStore,
        today: NaiveDate,
    ) -> Self {
        Self {
            backend,
            store,
            today,
        }
    }

    pub async fn execute<R: BufRead, W: Write>(
        &self,
        command: Command,
        input: &mut R,
        out: &mut W,
    ) -> anyhow::Result<()> {
        match command {
            Command::Login { username, password } => {
                self.login(&username, password, input, out).await
            }
            Command::Logout => self.logout(out).await,
            Command::Show { device } => {
                let device = self.controller()?.device(device).await.map_err(explain)?;
                write!(out, "{}", render::device_details(&device, self.today))?;
                Ok(())
            }
            Command::List(args) => self.list(args, out).await,
            Command::Actions { device } => {
                let menu = self.controller()?.menu(device).await.map_err(explain)?;
                write!(out, "{}", render::menu(&menu))?;
                Ok(())
            }
            Command::Maintenance {
                device,
                reason,
                notes,
            } => {
                let request = ActionRequest::new(
                    DeviceAction::SendToMaintenance,
                    Some(reason.as_str()),
                    notes.as_deref(),
                )?;
                self.perform(device, request, false, input, out).await
            }
            Command::MarkAvailable { device, notes } => {
                let request = ActionRequest::new(DeviceAction::MarkAvailable, None, notes.as_deref())?;
                self.perform(device, request, false, input, out).await
            }
            Command::ReturnFromMaintenance { device, notes } => {
                let request = ActionRequest::new(
                    DeviceAction::ReturnFromMaintenance,
                    None,
                    notes.as_deref(),
                )?;
                self.perform(device, request, false, input, out).await
            }
            Command::Retire {
                device,
                reason,
                notes,
                yes,
            } => {
                let request =
                    ActionRequest::new(DeviceAction::Retire, Some(reason.as_str()), notes.as_deref())?;
                self.perform(device, request, yes, input, out).await
            }
            Command::Return {
                assignment,
                condition,
                date,
                notes,
            } => {
                let new_return = NewReturn {
                    assignment_id: assignment,
                    returned_on: date.unwrap_or(self.today),
                    condition,
                    notes: notes.filter(|n| !n.trim().is_empty()),
                };
                self.record_return(&new_return, out).await
            }
            Command::DiscountLetter(args) => self.discount_letter(args, input, out).await,
            Command::Valuate(args) => self.valuate(args, out),
            Command::Export(export) => self.export(export, out).await,
        }
    }

    fn controller(&self) -> anyhow::Result<DeviceController> {
        let session = self.store.load()?;
        if !session.is_authenticated() {
            bail!("not logged in; run `techtrace login` first");
        }
        Ok(DeviceController::new(self.backend.clone(), session))
    }

    async fn login<R: BufRead, W: Write>(
        &self,
        username: &str,
        password: Option<String>,
        input: &mut R,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let password = match password {
            Some(password) => password,
            None => prompt::ask("Password: ", &mut *input, &mut *out)?,
        };
        let session = self
            .backend
            .login(username, &password)
            .await
            .context("login failed")?;
        self.store.save(&session)?;
        writeln!(out, "Logged in as {username}.")?;
        Ok(())
    }

    async fn logout<W: Write>(
        &self,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let session = self.store.load()?;
        if session.is_authenticated() {
            if let Err(e) = self.backend.logout(&session).await {
                warn!(%e, "backend logout failed, clearing the local session anyway");
            }
        }
        self.store.clear()?;
        writeln!(out, "Logged out.")?;
        Ok(())
    }

    async fn list<W: Write>(
        &self,
        args: ListArgs,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let filter = DeviceFilter {
            status: args.status,
            kind: args.kind,
            search: args.search,
            page: args.page,
            page_size: args.page_size,
        };
        let page = self
            .controller()?
            .list_devices(&filter)
            .await
            .map_err(explain)?;

        for device in &page.results {
            writeln!(out, "{}", render::device_row(device))?;
        }
        writeln!(out, "{} of {} devices", page.results.len(), page.count)?;
        if page.has_next {
            writeln!(out, "More results: --page {}", args.page.unwrap_or(1) + 1)?;
        }
        Ok(())
    }

    async fn perform<R: BufRead, W: Write>(
        &self,
        device_id: i64,
        request: ActionRequest,
        assume_yes: bool,
        input: &mut R,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let controller = self.controller()?;
        let action = request.action();

        let confirmation = match IrreversibleOperation::for_action(action) {
            Some(operation) => match prompt::confirm(operation, assume_yes, &mut *input, &mut *out)? {
                Some(confirmation) => Some(confirmation),
                None => {
                    writeln!(out, "Cancelled.")?;
                    return Ok(());
                }
            },
            None => None,
        };

        let device = controller
            .perform(device_id, request, confirmation)
            .await
            .map_err(explain)?;
        writeln!(
            out,
            "{}: {} is now {}.",
            action.title(),
            render::device_summary(&device),
            device.status.label()
        )?;
        Ok(())
    }

    async fn record_return<W: Write>(
        &self,
        new_return: &NewReturn,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let controller = self.controller()?;
        writeln!(out, "{}", return_preview(new_return))?;
        let outcome = controller
            .record_return(new_return)
            .await
            .map_err(explain)?;
        write!(out, "{}", render::return_outcome(&outcome))?;
        Ok(())
    }

    async fn discount_letter<R: BufRead, W: Write>(
        &self,
        args: DiscountLetterArgs,
        input: &mut R,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let controller = self.controller()?;
        let amount = match args.amount {
            Some(amount) => amount,
            None => {
                let suggestion = controller
                    .discount_suggestion(args.assignment, self.today)
                    .await
                    .map_err(explain)?;
                writeln!(out, "Using the device's current value: {}", format_money(suggestion))?;
                suggestion
            }
        };
        let params =
            DiscountLetterParams::new(args.company, amount, args.installments, args.first_month)?;

        writeln!(
            out,
            "{} will deduct {} in {} installments of {} starting {}.",
            params.company().label(),
            format_money(params.total_amount()),
            params.installments(),
            format_money(params.installment_amount()),
            spanish_month_name(params.first_installment_month())
        )?;
        let Some(confirmation) = prompt::confirm(
            IrreversibleOperation::DiscountLetter,
            args.yes,
            &mut *input,
            &mut *out,
        )?
        else {
            writeln!(out, "Cancelled.")?;
            return Ok(());
        };

        let outcome = controller
            .generate_discount_letter(args.assignment, &params, Some(confirmation))
            .await
            .map_err(explain)?;
        std::fs::write(&args.out, &outcome.document)
            .with_context(|| format!("cannot write letter to '{}'", args.out.display()))?;
        writeln!(
            out,
            "Letter written to {}. {} is now {}.",
            args.out.display(),
            render::device_summary(&outcome.device),
            outcome.device.status.label()
        )?;
        Ok(())
    }

    fn valuate<W: Write>(
        &self,
        args: ValuateArgs,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let today = args.today.unwrap_or(self.today);
        let mut form = ValuationForm::new(args.kind);
        if !form.is_applicable() {
            writeln!(out, "{} devices are not valued.", args.kind.label())?;
            return Ok(());
        }

        form.set_initial_value(Some(args.initial), today);
        form.set_acquisition_date(Some(args.acquired), today);
        if let Some(value) = args.value {
            form.enter_current_value(Some(value), today);
        }

        let result = DepreciationSchedule::default().calculate(
            &DepreciationInput {
                initial_value: args.initial,
                acquisition_date: args.acquired,
            },
            today,
        )?;
        write!(out, "{}", render::valuation(&form, &result, today))?;
        Ok(())
    }

    async fn export<W: Write>(
        &self,
        command: ExportCommand,
        out: &mut W,
    ) -> anyhow::Result<()> {
        let controller = self.controller()?;
        match command {
            ExportCommand::Devices {
                out_dir,
                status,
                kind,
                search,
            } => {
                let mut filter = DeviceFilter {
                    status,
                    kind,
                    search,
                    page_size: Some(EXPORT_PAGE_SIZE),
                    ..DeviceFilter::default()
                };
                let mut devices = Vec::new();
                for page_number in 1.. {
                    filter.page = Some(page_number);
                    let page = controller.list_devices(&filter).await.map_err(explain)?;
                    devices.extend(page.results);
                    if !page.has_next {
                        break;
                    }
                }
                self.write_export(&out_dir, INVENTORY_STEM, out, |file| {
                    export_devices(&devices, file)
                })
            }
            ExportCommand::Discounts {
                out_dir,
                from,
                to,
                kind,
            } => {
                let records = controller
                    .discount_reports(&DiscountReportFilter { from, to, kind })
                    .await
                    .map_err(explain)?;
                self.write_export(&out_dir, DISCOUNTS_STEM, out, |file| {
                    export_discounts(&records, file)
                })
            }
        }
    }

    /// Writes one export file into `out_dir`. No file is left behind when
    /// there are no rows.
    fn write_export<W: Write>(
        &self,
        out_dir: &Path,
        stem: &str,
        out: &mut W,
        write: impl FnOnce(&mut BufWriter<File>) -> Result<usize, ExportError>,
    ) -> anyhow::Result<()> {
        let path = out_dir.join(dated_filename(stem, self.today));
        let mut file = BufWriter::new(
            File::create(&path).with_context(|| format!("cannot create '{}'", path.display()))?,
        );

        match write(&mut file) {
            Ok(rows) => {
                writeln!(out, "Wrote {rows} rows to {}.", path.display())?;
                Ok(())
            }
            Err(ExportError::Empty) => {
                drop(file);
                std::fs::remove_file(&path)
                    .with_context(|| format!("cannot remove '{}'", path.display()))?;
                writeln!(out, "Nothing to export.")?;
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("cannot write '{}'", path.display())),
        }
    }
}

/// Adds a hint to the errors a person can act on.
fn explain(err: ControllerError) -> anyhow::Error {
    match err {
        ControllerError::Backend(BackendError::Unauthorized) => {
            anyhow::anyhow!("the session has expired; run `techtrace login` again")
        }
        ControllerError::Backend(BackendError::NotFound) => {
            anyhow::anyhow!("no such device or assignment")
        }
        other => other.into(),
    }
}
