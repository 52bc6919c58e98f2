use std::sync::Arc;
use std::time::Duration;

use domain::{
    BarcodeSymbology, EscPosSettings, LabelConfig, LabelData, PrintOutcome, PrinterError,
    PrinterStatus, TsplSettings, classify,
};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::encoder::LabelEncoder;
use super::escpos::EscPosEncoder;
use super::manager::PrinterManager;
use super::tspl::TsplEncoder;

/// Pause between host-side copies; the printer has no flow control we can read
pub const DEFAULT_COPY_DELAY: Duration = Duration::from_millis(100);

/// Front door for printing labels.
///
/// `print_job` tries TSPL first (one script, copies replicated by the
/// printer) and falls back to ESC/POS (one sequence per copy) when TSPL
/// cannot be encoded or sent. Jobs run one at a time: every transfer of a
/// job, fallback included, reaches the printer before the next job starts.
pub struct LabelPrinter {
    manager: Arc<PrinterManager>,
    tspl: Box<dyn LabelEncoder>,
    escpos: Box<dyn LabelEncoder>,
    copy_delay: Duration,
    job_lock: Mutex<()>,
}

impl LabelPrinter {
    pub fn new(manager: Arc<PrinterManager>) -> Self {
        Self::with_settings(manager, EscPosSettings::default(), TsplSettings::default())
    }

    pub fn with_settings(
        manager: Arc<PrinterManager>,
        escpos: EscPosSettings,
        tspl: TsplSettings,
    ) -> Self {
        Self::with_encoders(
            manager,
            Box::new(TsplEncoder::new(tspl)),
            Box::new(EscPosEncoder::new(escpos)),
        )
    }

    pub fn with_encoders(
        manager: Arc<PrinterManager>,
        tspl: Box<dyn LabelEncoder>,
        escpos: Box<dyn LabelEncoder>,
    ) -> Self {
        Self {
            manager,
            tspl,
            escpos,
            copy_delay: DEFAULT_COPY_DELAY,
            job_lock: Mutex::new(()),
        }
    }

    pub fn with_copy_delay(mut self, copy_delay: Duration) -> Self {
        self.copy_delay = copy_delay;
        self
    }

    pub fn manager(&self) -> &Arc<PrinterManager> {
        &self.manager
    }

    pub fn is_supported(&self) -> bool {
        self.manager.is_supported()
    }

    pub async fn status(&self) -> PrinterStatus {
        self.manager.status().await
    }

    /// Waits for a running job, so its remaining transfers never move to a new handle
    pub async fn connect(&self) -> PrinterStatus {
        let _job = self.job_lock.lock().await;
        self.manager.connect().await
    }

    pub async fn disconnect(&self) {
        let _job = self.job_lock.lock().await;
        self.manager.disconnect().await
    }

    pub fn detect_barcode_type(&self, code: &str) -> BarcodeSymbology {
        classify(code)
    }

    /// Print with TSPL, falling back to ESC/POS.
    ///
    /// When both fail the ESC/POS error is reported. A TSPL transfer
    /// failure disconnects the printer, in which case the fallback fails
    /// with `NotConnected`.
    pub async fn print_job(&self, data: &LabelData, config: &LabelConfig) -> PrintOutcome {
        let span = info_span!("print_job", job_id = %Uuid::new_v4(), copies = config.copies);
        async {
            let _job = self.job_lock.lock().await;
            self.precheck(config).await?;

            match self.run(self.tspl.as_ref(), data, config).await {
                Ok(()) => Ok(()),
                Err(tspl_err) => {
                    warn!(error = %tspl_err, "TSPL print failed, falling back to ESC/POS");
                    self.run(self.escpos.as_ref(), data, config).await
                }
            }
        }
        .instrument(span)
        .await
        .into()
    }

    /// Print with ESC/POS only
    pub async fn print_labels(&self, data: &LabelData, config: &LabelConfig) -> PrintOutcome {
        self.print_single(self.escpos.as_ref(), data, config).await
    }

    /// Print with TSPL only
    pub async fn print_labels_tspl(&self, data: &LabelData, config: &LabelConfig) -> PrintOutcome {
        self.print_single(self.tspl.as_ref(), data, config).await
    }

    /// One ESC/POS sample label on the default 50x30 mm stock
    pub async fn test_print(&self) -> PrintOutcome {
        let sample = LabelData::new("1234567890123", "Test Item", Some(99.99));
        self.print_labels(&sample, &LabelConfig::default()).await
    }

    async fn print_single(
        &self,
        encoder: &dyn LabelEncoder,
        data: &LabelData,
        config: &LabelConfig,
    ) -> PrintOutcome {
        let span = info_span!(
            "print_labels",
            job_id = %Uuid::new_v4(),
            dialect = %encoder.dialect(),
            copies = config.copies
        );
        async {
            let _job = self.job_lock.lock().await;
            self.precheck(config).await?;
            self.run(encoder, data, config).await
        }
        .instrument(span)
        .await
        .into()
    }

    async fn precheck(&self, config: &LabelConfig) -> Result<(), PrinterError> {
        config
            .validate()
            .map_err(|e| PrinterError::InvalidJob(e.to_string()))?;
        if !self.manager.is_connected().await {
            return Err(PrinterError::NotConnected);
        }
        Ok(())
    }

    async fn run(
        &self,
        encoder: &dyn LabelEncoder,
        data: &LabelData,
        config: &LabelConfig,
    ) -> Result<(), PrinterError> {
        let job = encoder
            .encode(data, config)
            .map_err(|e| PrinterError::Encode(e.to_string()))?;

        for (copy, sequence) in job.sequences.iter().enumerate() {
            if copy > 0 {
                sleep(self.copy_delay).await;
            }
            for chunk in &sequence.chunks {
                self.manager.send(chunk).await?;
            }
        }

        info!(
            dialect = %job.dialect,
            transfers = job.transfer_count(),
            bytes = job.total_bytes(),
            "✅ Labels sent"
        );
        Ok(())
    }
}
