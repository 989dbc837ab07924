//! Export orchestration: request parsing, format selection and responses.

mod dispatcher;
mod request;

pub use dispatcher::ExportDispatcher;
pub use request::{ExportRequest, RequestParams};

use std::fmt;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    FullCalendar,
    Timeline,
    Nvd3Chart,
    Csv,
    Excel,
    Json,
}

impl ExportFormat {
    pub const ALL: [Self; 6] = [
        Self::FullCalendar,
        Self::Timeline,
        Self::Nvd3Chart,
        Self::Csv,
        Self::Excel,
        Self::Json,
    ];

    /// Parses a request `format` value; matching is exact.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullCalendar => "fullcalendar",
            Self::Timeline => "timeline",
            Self::Nvd3Chart => "nvd3chart",
            Self::Csv => "csv",
            Self::Excel => "excel",
            Self::Json => "json",
        }
    }

    /// Formats that only ever use the first query of a request.
    pub fn first_query_only(&self) -> bool {
        matches!(self, Self::Nvd3Chart | Self::Excel)
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Excel => "application/vnd.ms-excel",
            _ => "application/json",
        }
    }

    /// Download filename used when the request names none; `None` for
    /// formats that are not downloaded as files.
    pub fn default_filename(&self) -> Option<&'static str> {
        match self {
            Self::Csv => Some("results.csv"),
            Self::Excel => Some("results.xls"),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of body a response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Encoded export data.
    Data,
    /// Nothing was requested.
    Empty,
    /// A user-facing message instead of data.
    Message,
}

/// Encoded body plus content metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub kind: ResponseKind,
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub cache_control: Option<String>,
    pub body: Vec<u8>,
}

impl ExportResponse {
    pub fn empty() -> Self {
        Self {
            kind: ResponseKind::Empty,
            content_type: "text/plain; charset=utf-8".to_string(),
            content_disposition: None,
            cache_control: None,
            body: Vec::new(),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Message,
            body: text.into().into_bytes(),
            ..Self::empty()
        }
    }

    /// A data response with the format's content metadata.
    pub fn data(format: ExportFormat, filename: Option<&str>, body: Vec<u8>) -> Self {
        let filename = filename.or(format.default_filename());
        Self {
            kind: ResponseKind::Data,
            content_type: format.content_type().to_string(),
            content_disposition: format
                .default_filename()
                .and(filename)
                .map(|name| format!("attachment; filename={name}")),
            cache_control: (format == ExportFormat::Excel).then(|| "max-age=0".to_string()),
            body,
        }
    }

    /// Header name/value pairs describing the body.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("Content-Type", self.content_type.clone())];
        if let Some(disposition) = &self.content_disposition {
            headers.push(("Content-Disposition", disposition.clone()));
        }
        if let Some(cache_control) = &self.cache_control {
            headers.push(("Cache-Control", cache_control.clone()));
        }
        headers
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        for format in ExportFormat::ALL {
            assert_eq!(ExportFormat::parse(format.as_str()), Some(format));
        }
        assert_eq!(ExportFormat::parse("CSV"), None);
        assert_eq!(ExportFormat::parse("xml"), None);
    }

    #[test]
    fn test_first_query_only_capability() {
        let first_only: Vec<ExportFormat> = ExportFormat::ALL
            .into_iter()
            .filter(ExportFormat::first_query_only)
            .collect();
        assert_eq!(first_only, vec![ExportFormat::Nvd3Chart, ExportFormat::Excel]);
    }

    #[test]
    fn test_file_like_metadata() {
        let csv = ExportResponse::data(ExportFormat::Csv, None, Vec::new());
        assert_eq!(csv.content_type, "text/csv");
        assert_eq!(
            csv.content_disposition.as_deref(),
            Some("attachment; filename=results.csv")
        );

        let excel = ExportResponse::data(ExportFormat::Excel, Some("books.xls"), Vec::new());
        assert_eq!(
            excel.headers(),
            vec![
                ("Content-Type", "application/vnd.ms-excel".to_string()),
                ("Content-Disposition", "attachment; filename=books.xls".to_string()),
                ("Cache-Control", "max-age=0".to_string()),
            ]
        );

        let json = ExportResponse::data(ExportFormat::Json, Some("ignored.json"), Vec::new());
        assert_eq!(json.content_disposition, None);
    }

    #[test]
    fn test_message_response() {
        let response = ExportResponse::message("No valid format");
        assert_eq!(response.kind, ResponseKind::Message);
        assert_eq!(response.body_text(), "No valid format");
    }
}
