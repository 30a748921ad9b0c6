use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Raw upload as handed over by the HTTP surface.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    pub bytes: Bytes,
    pub declared_mime: Option<String>,
}

impl SourceAsset {
    pub fn new(bytes: impl Into<Bytes>, declared_mime: Option<String>) -> Self {
        Self { bytes: bytes.into(), declared_mime }
    }
}

/// Transport-ready payload: base64 data plus its content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAsset {
    pub mime_type: String,
    pub data: String,
}

pub fn encode(asset: &SourceAsset) -> Result<EncodedAsset> {
    if asset.bytes.is_empty() {
        return Err(GenerationError::Encoding("uploaded file is empty".into()));
    }
    let declared = asset
        .declared_mime
        .as_deref()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| m.starts_with("image/"));

    let mime_type = match declared {
        Some(mime) => mime,
        None => image::guess_format(&asset.bytes)
            .map(|format| format.to_mime_type().to_string())
            .map_err(|_| GenerationError::Encoding("file is not a recognised image".into()))?,
    };

    Ok(EncodedAsset {
        mime_type,
        data: base64::engine::general_purpose::STANDARD.encode(&asset.bytes),
    })
}

impl EncodedAsset {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Splits a `data:<mime>;base64,<payload>` URL. A missing mime means png.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| GenerationError::Encoding("not a data URL".into()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| GenerationError::Encoding("data URL has no payload".into()))?;
        let mime = header.strip_suffix(";base64").unwrap_or(header);
        if data.is_empty() {
            return Err(GenerationError::Encoding("data URL has no payload".into()));
        }
        Ok(Self {
            mime_type: if mime.is_empty() { "image/png".to_string() } else { mime.to_string() },
            data: data.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn declared_image_mime_is_kept() {
        let asset = SourceAsset::new(vec![1u8, 2, 3], Some("image/webp".into()));
        let encoded = encode(&asset).unwrap();
        assert_eq!(encoded.mime_type, "image/webp");
        assert_eq!(encoded.data, "AQID");
    }

    #[test]
    fn mime_is_sniffed_when_declared_type_is_generic() {
        let asset = SourceAsset::new(PNG_MAGIC.to_vec(), Some("application/octet-stream".into()));
        assert_eq!(encode(&asset).unwrap().mime_type, "image/png");
    }

    #[test]
    fn rejects_empty_and_unknown_payloads() {
        assert!(matches!(encode(&SourceAsset::new(Vec::<u8>::new(), None)), Err(GenerationError::Encoding(_))));
        assert!(matches!(
            encode(&SourceAsset::new(b"plain text".to_vec(), Some("text/plain".into()))),
            Err(GenerationError::Encoding(_))
        ));
    }

    #[test]
    fn data_url_parsing() {
        let parsed = EncodedAsset::from_data_url("data:image/jpeg;base64,AAAA").unwrap();
        assert_eq!(parsed, EncodedAsset { mime_type: "image/jpeg".into(), data: "AAAA".into() });
        assert_eq!(parsed.to_data_url(), "data:image/jpeg;base64,AAAA");
        assert_eq!(EncodedAsset::from_data_url("data:;base64,AAAA").unwrap().mime_type, "image/png");
        assert!(EncodedAsset::from_data_url("https://example.com/a.png").is_err());
        assert!(EncodedAsset::from_data_url("data:image/png;base64,").is_err());
    }
}
