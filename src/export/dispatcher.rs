//! Builds, runs and renders one export request.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::db::DataStore;
use crate::error::Result;
use crate::format::{
    CalendarFormatter, ChartFormatter, CsvFormatter, JsonFormatter, QueryResults, ResultFormatter,
    SpreadsheetFormatter, TimelineFormatter,
};
use crate::query::{QueryBuilder, QueryExecutor};
use crate::schema::SchemaCatalog;
use crate::site::PageLinker;

use super::{ExportFormat, ExportRequest, ExportResponse};

/// Orchestrates an export: build the queries, run them in order, then
/// hand every result to the format's formatter.
pub struct ExportDispatcher<'a> {
    catalog: &'a SchemaCatalog,
    store: &'a dyn DataStore,
    config: &'a Config,
}

impl<'a> ExportDispatcher<'a> {
    pub fn new(catalog: &'a SchemaCatalog, store: &'a dyn DataStore, config: &'a Config) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    /// Handles one request. Never fails: configuration and execution
    /// problems come back as a message response, and a request without
    /// tables yields an empty response.
    pub async fn dispatch(&self, request: &ExportRequest) -> ExportResponse {
        if request.queries.is_empty() {
            info!("Export request names no tables; returning an empty response");
            return ExportResponse::empty();
        }

        match self.try_dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Export failed: {}", e);
                ExportResponse::message(self.config.messages.query_error(e.detail()))
            }
        }
    }

    async fn try_dispatch(&self, request: &ExportRequest) -> Result<ExportResponse> {
        let builder = QueryBuilder::new(self.catalog, &self.config.store);
        let mut specs = builder.build(&request.queries)?;

        let Some(format) = request.format.as_deref().and_then(ExportFormat::parse) else {
            warn!("Unknown export format: {:?}", request.format);
            return Ok(ExportResponse::message(
                self.config.messages.missing_format.clone(),
            ));
        };

        if format.first_query_only() {
            specs.truncate(1);
        }

        let formatter = self.formatter_for(format, request);
        formatter.prepare(&mut specs);

        // Every query completes before any output is produced.
        let executor = QueryExecutor::new(
            self.store,
            Duration::from_secs(self.config.store.query_timeout_secs),
        );
        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            let rows = executor.run(&spec).await?;
            results.push(QueryResults::new(spec, rows));
        }

        let row_count: usize = results.iter().map(|r| r.rows.len()).sum();
        let body = formatter.render(results)?;
        info!(
            "Exported {} row(s) as {} ({} bytes)",
            row_count,
            format,
            body.len()
        );

        Ok(ExportResponse::data(
            format,
            request.filename.as_deref(),
            body,
        ))
    }

    fn formatter_for(&self, format: ExportFormat, request: &ExportRequest) -> Box<dyn ResultFormatter> {
        let linker = PageLinker::new(&self.config.site);
        match format {
            ExportFormat::FullCalendar => Box::new(
                CalendarFormatter::new(linker)
                    .with_colors(request.colors.clone(), request.text_colors.clone())
                    .with_window(request.start.clone(), request.end.clone()),
            ),
            ExportFormat::Timeline => Box::new(TimelineFormatter::new(linker)),
            ExportFormat::Nvd3Chart => Box::new(ChartFormatter::new(
                self.config.messages.none.clone(),
                self.config.site.american_dates,
            )),
            ExportFormat::Csv => Box::new(CsvFormatter::new(
                request.delimiter.as_deref().unwrap_or(","),
            )),
            ExportFormat::Excel => Box::new(SpreadsheetFormatter::new()),
            ExportFormat::Json => Box::new(JsonFormatter::new()),
        }
    }
}
