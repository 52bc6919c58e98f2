use anyhow::{Result, bail};
use application::printer::{LabelPrinter, PrinterManager};
use domain::driver::UsbHost;
use domain::{PrintOutcome, PrinterStatus, classify};
use infrastructure::PrinterAgentConfig;
use infrastructure::printer::{MockUsbHost, NusbHost, RecordedTransfer};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::{Command, DialectChoice};

pub fn build_printer(
    config: &PrinterAgentConfig,
    host: Arc<dyn UsbHost>,
) -> Result<LabelPrinter> {
    let manager = Arc::new(PrinterManager::new(host, config.allowlist()?));
    let printer = LabelPrinter::with_settings(manager, config.escpos.clone(), config.tspl.clone())
        .with_copy_delay(config.copy_delay());
    Ok(printer)
}

/// Simulated printer that passes the configured allowlist
fn dry_run_host(config: &PrinterAgentConfig) -> Result<MockUsbHost> {
    let allowlist = config.allowlist()?;
    let host = MockUsbHost::new();
    let product_id = host.product_id;
    Ok(match allowlist.filters().first() {
        Some(filter) => host.with_ids(filter.vendor_id, filter.product_id.unwrap_or(product_id)),
        None => host,
    })
}

/// Connect to the real printer, or to a simulated one for `--dry-run`
async fn open_printer(
    config: &PrinterAgentConfig,
    dry_run: bool,
) -> Result<(LabelPrinter, Option<MockUsbHost>)> {
    let mock = if dry_run {
        Some(dry_run_host(config)?)
    } else {
        None
    };
    let host: Arc<dyn UsbHost> = match &mock {
        Some(mock) => Arc::new(mock.clone()),
        None => Arc::new(NusbHost::new()),
    };

    let printer = build_printer(config, host)?;
    let status = printer.connect().await;
    if !status.connected {
        bail!(status_line(&status));
    }
    info!(printer = status.printer_name.as_deref().unwrap_or_default(), "🖨️ Printer ready");
    Ok((printer, mock))
}

pub fn status_line(status: &PrinterStatus) -> String {
    match (&status.printer_name, &status.error) {
        (Some(name), _) if status.connected => format!("Connected: {name}"),
        (_, Some(error)) => error.clone(),
        _ => "Disconnected".to_string(),
    }
}

/// Text payloads (TSPL) as-is, binary payloads (ESC/POS) as hex
pub fn render_payload(data: &[u8]) -> String {
    let is_text = data
        .iter()
        .all(|b| b.is_ascii_graphic() || matches!(b, b' ' | b'\r' | b'\n'));
    if is_text {
        String::from_utf8_lossy(data).replace("\r\n", "\n")
    } else {
        data.iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn dump_transfers(transfers: &[RecordedTransfer]) {
    for (i, transfer) in transfers.iter().enumerate() {
        println!(
            "--- transfer {} -> endpoint {:#04x} ({} bytes)",
            i + 1,
            transfer.endpoint,
            transfer.data.len()
        );
        println!("{}", render_payload(&transfer.data));
    }
}

async fn finish(
    printer: LabelPrinter,
    mock: Option<MockUsbHost>,
    outcome: PrintOutcome,
) -> Result<()> {
    printer.disconnect().await;
    if let Some(mock) = mock {
        dump_transfers(&mock.transfers().await);
    }
    match outcome.error {
        None => {
            println!("✅ Printed");
            Ok(())
        }
        Some(error) => bail!(error),
    }
}

pub async fn execute(command: Command, config: &PrinterAgentConfig) -> Result<()> {
    match command {
        Command::Detect { code } => {
            println!("{}", classify(&code));
            Ok(())
        }
        Command::Status => {
            let printer = build_printer(config, Arc::new(NusbHost::new()))?;
            if !printer.is_supported() {
                warn!("USB is not supported on this host");
            }
            let status = printer.connect().await;
            println!("{}", status_line(&status));
            printer.disconnect().await;
            Ok(())
        }
        Command::Print(args) => {
            let data = args.label_data();
            let label = args.label_config(&config.label);
            let (printer, mock) = open_printer(config, args.dry_run).await?;

            let outcome = match args.dialect {
                DialectChoice::Auto => printer.print_job(&data, &label).await,
                DialectChoice::Tspl => printer.print_labels_tspl(&data, &label).await,
                DialectChoice::Escpos => printer.print_labels(&data, &label).await,
            };
            finish(printer, mock, outcome).await
        }
        Command::TestPrint { dry_run } => {
            let (printer, mock) = open_printer(config, dry_run).await?;
            let outcome = printer.test_print().await;
            finish(printer, mock, outcome).await
        }
    }
}
