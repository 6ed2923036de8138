//! In-memory export payload for HTTP delivery.
//!
//! The transport layer owns header assembly and streaming; this module only
//! describes what it has to send.

use crate::conf::{C_CACHE_CONTROL_STREAM, C_CONTENT_TYPE_XLS_STREAM, C_CONTENT_TYPE_XLSX};
use crate::spec::EnumDeliveryMode;

/// Serialized document plus the metadata needed to deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxExport {
    /// Complete `.xlsx` document.
    pub bytes: Vec<u8>,
    /// Suggested download file name.
    pub filename: String,
    /// MIME content type.
    pub content_type: &'static str,
    /// Delivery flavour the headers are derived for.
    pub delivery_mode: EnumDeliveryMode,
}

impl SpecXlsxExport {
    pub fn new(bytes: Vec<u8>, filename: String, delivery_mode: EnumDeliveryMode) -> Self {
        Self {
            bytes,
            filename,
            content_type: derive_content_type(delivery_mode),
            delivery_mode,
        }
    }

    /// `Content-Disposition` value.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }

    /// Response headers in emission order.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut l_headers = vec![
            ("Content-Type", self.content_type.to_string()),
            ("Content-Disposition", self.content_disposition()),
        ];
        if self.delivery_mode == EnumDeliveryMode::Streamed {
            l_headers.push(("Cache-Control", C_CACHE_CONTROL_STREAM.to_string()));
        }
        l_headers
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// MIME content type for a delivery mode.
pub fn derive_content_type(delivery_mode: EnumDeliveryMode) -> &'static str {
    match delivery_mode {
        EnumDeliveryMode::Attachment => C_CONTENT_TYPE_XLSX,
        EnumDeliveryMode::Streamed => C_CONTENT_TYPE_XLS_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_headers() {
        let export = SpecXlsxExport::new(vec![1, 2], "r.xlsx".to_string(), Default::default());
        assert_eq!(
            export.headers(),
            vec![
                (
                    "Content-Type",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                        .to_string()
                ),
                (
                    "Content-Disposition",
                    "attachment; filename=\"r.xlsx\"".to_string()
                ),
            ]
        );
        assert_eq!(export.len(), 2);
    }

    #[test]
    fn test_streamed_headers_disable_caching() {
        let export =
            SpecXlsxExport::new(vec![], "r.xlsx".to_string(), EnumDeliveryMode::Streamed);
        let l_headers = export.headers();
        assert_eq!(l_headers[0].1, "application/vnd.ms-excel");
        assert_eq!(l_headers[2], ("Cache-Control", "max-age=0".to_string()));
        assert!(export.is_empty());
    }
}
