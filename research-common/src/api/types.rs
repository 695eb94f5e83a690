//! Research API request/response types

use serde::{Deserialize, Serialize};

// ========================================
// Job Creation
// ========================================

/// Body of `POST /research`
///
/// Build it with [`JobRequest::new`] so the optional fields are normalized the
/// way the backend expects.
///
/// # Examples
///
/// ```
/// use research_common::api::JobRequest;
///
/// let request = JobRequest::new("Acme", "acme.com", "", "Berlin");
/// assert_eq!(request.company_url.as_deref(), Some("https://acme.com"));
/// assert!(request.industry.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Company to research
    pub company: String,

    /// Company website, always carrying a scheme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Headquarters location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hq_location: Option<String>,
}

impl JobRequest {
    /// Create a request from raw form input
    ///
    /// Blank optional fields are dropped. A URL without `http://` or
    /// `https://` gets `https://` prepended.
    pub fn new(
        company: impl Into<String>,
        company_url: &str,
        industry: &str,
        hq_location: &str,
    ) -> Self {
        Self {
            company: company.into().trim().to_string(),
            company_url: non_blank(company_url).map(|url| with_scheme(&url)),
            industry: non_blank(industry),
            hq_location: non_blank(hq_location),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Response of `POST /research`
///
/// `job_id` is optional on the wire: a 2xx response without it is still a
/// submission failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCreated {
    #[serde(default)]
    pub job_id: Option<String>,
}

// ========================================
// Report Export
// ========================================

/// Body of `POST /generate-pdf`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfRequest {
    /// Markdown report text
    pub report_content: String,
    pub company_name: String,
}
