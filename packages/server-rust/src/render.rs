//! Reference [`ReportRenderer`] producing a JSON document.

use healthins_core::ReportRenderer;
use serde_json::json;

/// Renders a report as `{"title", "header", "rows"}` JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportRenderer {
    pretty: bool,
}

impl JsonReportRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ReportRenderer for JsonReportRenderer {
    fn render(
        &self,
        title: &str,
        header: &[String],
        rows: &[Vec<String>],
    ) -> anyhow::Result<Vec<u8>> {
        let document = json!({
            "title": title,
            "header": header,
            "rows": rows,
        });
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&document)?
        } else {
            serde_json::to_vec(&document)?
        };
        Ok(bytes)
    }
}
