//! Turns one appointment request into an appointment or a clarification.
//!
//! Order is fixed: obtain text (OCR for images), extract the date/time,
//! resolve the department, then render in the requested zone. A request
//! without a date stops before department resolution, so it can never teach
//! the vocabulary anything.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};

use medibook_core::{
    AppointmentInput, ClarificationReason, OcrEngine, ParsedAppointment, ScheduleError,
    ScheduleOutcome, TimeExpressionExtractor,
};
use medibook_understanding::{
    format_in_zone, parse_timezone, DepartmentResolver, RuleBasedTimeExtractor,
};

use crate::clock::ReferenceClock;

/// Upper bound on a single OCR run unless configured otherwise.
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

/// Request pipeline shared by the HTTP gateway and the CLI. Cheap to clone;
/// clones share the department vocabulary.
#[derive(Clone)]
pub struct RequestOrchestrator {
    ocr: Arc<dyn OcrEngine>,
    extractor: Arc<dyn TimeExpressionExtractor>,
    resolver: DepartmentResolver,
    clock: ReferenceClock,
    ocr_timeout: Duration,
}

impl RequestOrchestrator {
    /// Pipeline with the rule-based extractor, the seeded vocabulary and the
    /// system clock.
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            ocr,
            extractor: Arc::new(RuleBasedTimeExtractor::new()),
            resolver: DepartmentResolver::default(),
            clock: ReferenceClock::System,
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TimeExpressionExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_resolver(mut self, resolver: DepartmentResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_clock(mut self, clock: ReferenceClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ocr_timeout(mut self, timeout: Duration) -> Self {
        self.ocr_timeout = timeout;
        self
    }

    pub fn resolver(&self) -> &DepartmentResolver {
        &self.resolver
    }

    /// Handle one request, rendering the result in `timezone`.
    #[instrument(skip_all, fields(input = input.kind(), tz = %timezone))]
    pub async fn handle(
        &self,
        input: AppointmentInput,
        timezone: &str,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let zone = parse_timezone(timezone);
        let text = match input {
            AppointmentInput::Text(text) => text,
            AppointmentInput::Image(path) => self.read_image(&path).await?,
        };
        self.process_text(&text, zone).await
    }

    async fn read_image(&self, path: &Path) -> Result<String, ScheduleError> {
        let recognized = tokio::time::timeout(self.ocr_timeout, self.ocr.recognize(path)).await;
        let text = match recognized {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(ScheduleError::Ocr(format!("{e:#}"))),
            Err(_) => {
                warn!(engine = self.ocr.name(), path = %path.display(), "OCR timed out");
                return Err(ScheduleError::OcrTimeout(self.ocr_timeout.as_secs()));
            }
        };
        if text.trim().is_empty() {
            return Err(ScheduleError::OcrExtractionFailed);
        }
        debug!(chars = text.len(), "OCR produced text");
        Ok(text)
    }

    /// An unknown `zone` only fails the final rendering step. Until then
    /// wall-clock phrases are read in UTC, so clarifications and learning
    /// behave as they would for a valid zone.
    async fn process_text(
        &self,
        text: &str,
        zone: Result<Tz, ScheduleError>,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let reference = self.clock.now();
        let reading_zone = match &zone {
            Ok(zone) => *zone,
            Err(e) => {
                debug!(error = %e, "Reading wall-clock phrases in UTC");
                Tz::UTC
            }
        };

        let Some(instant) = self.extractor.extract(text, reference, reading_zone) else {
            info!("No date or time found in request");
            return Ok(ScheduleOutcome::clarification(ClarificationReason::NoDate));
        };
        debug!(%instant, "Parsed appointment instant");

        let Some(department) = self.resolver.resolve(text).await else {
            info!("No department found in request");
            return Ok(ScheduleOutcome::clarification(ClarificationReason::NoDepartment));
        };

        let zone = zone?;
        let (date, time) = format_in_zone(instant, zone);
        info!(department = %department, date = %date, time = %time, "Appointment parsed");
        Ok(ScheduleOutcome::Scheduled(ParsedAppointment {
            department,
            date,
            time,
            timezone: zone.name().to_string(),
        }))
    }
}
