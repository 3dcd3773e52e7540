//! PDF service client

use crate::config::PdfServiceConfig;
use crate::error::{FarmError, Result};
use crate::report::ReportDocument;
use reqwest::Client as HttpClient;

pub struct PdfService {
    config: PdfServiceConfig,
    http_client: HttpClient,
}

impl PdfService {
    pub fn new(config: PdfServiceConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Lay out a report document as PDF
    pub async fn render_report(&self, document: &ReportDocument) -> Result<Vec<u8>> {
        let url = format!("{}/generate-report", self.config.base_url.trim_end_matches('/'));

        let response = self.http_client
            .post(&url)
            .json(document)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FarmError::ServiceUnavailable(
                format!("PDF service returned {} - {}", status, error_text)
            ));
        }

        let pdf_data = response.bytes().await?.to_vec();
        if !Self::validate_pdf(&pdf_data) {
            return Err(FarmError::Render(
                "PDF service response is not a PDF document".to_string()
            ));
        }

        log::info!("Rendered report '{}' as PDF ({} bytes)", document.title, pdf_data.len());
        Ok(pdf_data)
    }

    /// Check PDF magic bytes
    pub fn validate_pdf(pdf_data: &[u8]) -> bool {
        pdf_data.len() >= 4 && pdf_data.starts_with(b"%PDF")
    }

    /// Fail fast before building a report the service cannot lay out
    pub async fn ensure_available(&self) -> Result<()> {
        let url = format!("{}/health", self.config.base_url.trim_end_matches('/'));

        match self.http_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(FarmError::ServiceUnavailable(format!(
                "PDF service at {} reported {}",
                self.config.base_url,
                response.status()
            ))),
            Err(e) => Err(FarmError::ServiceUnavailable(format!(
                "PDF service at {} is unreachable: {}",
                self.config.base_url, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_document() -> ReportDocument {
        ReportDocument {
            title: "TRYDT FARMSTEAD".to_string(),
            subtitle: "Farm Analytics Report".to_string(),
            header_lines: vec!["Report Period: January 1, 2024".to_string()],
            sections: Vec::new(),
            footer_lines: vec!["END OF REPORT".to_string()],
        }
    }

    #[test]
    fn test_validate_pdf() {
        assert!(PdfService::validate_pdf(b"%PDF-1.4\n...rest of pdf..."));
        assert!(!PdfService::validate_pdf(b"Not a PDF file"));
        assert!(!PdfService::validate_pdf(b""));
        assert!(!PdfService::validate_pdf(b"AB"));
    }

    #[tokio::test]
    async fn test_render_report_returns_pdf_bytes() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-report"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 body".to_vec()))
            .mount(&server)
            .await;

        let service = PdfService::new(PdfServiceConfig { base_url: server.uri() }).unwrap();
        let bytes = service.render_report(&sample_document()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_render_report_rejects_non_pdf_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-report"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let service = PdfService::new(PdfServiceConfig { base_url: server.uri() }).unwrap();
        let result = service.render_report(&sample_document()).await;
        assert!(matches!(result, Err(FarmError::Render(_))));
    }

    #[tokio::test]
    async fn test_ensure_available_checks_health_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let service = PdfService::new(PdfServiceConfig { base_url: server.uri() }).unwrap();
        service.ensure_available().await.unwrap();
    }

    #[tokio::test]
    async fn test_unhealthy_service_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = PdfService::new(PdfServiceConfig { base_url: server.uri() }).unwrap();
        let result = service.ensure_available().await;
        assert!(matches!(result, Err(FarmError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_service_error_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/generate-report"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let service = PdfService::new(PdfServiceConfig { base_url: server.uri() }).unwrap();
        let err = service.render_report(&sample_document()).await.unwrap_err();
        assert!(err.to_string().contains("502"));
    }
}
