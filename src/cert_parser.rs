// src/cert_parser.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::prelude::FromDer;

use crate::error::{LookupError, Result};

/// PEM label used for certificate blocks
pub const PEM_CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Certificate decoded from the DER bytes stored in the CT database
#[derive(Debug, Clone, Serialize)]
pub struct DecodedCertificate {
    /// Subject common name, empty when the subject carries none
    pub common_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub issuer: String,
    pub dns_names: Vec<String>,
    /// SHA-256 over the DER encoding, lowercase hex
    pub fingerprint: String,
    #[serde(skip)]
    pub raw: Vec<u8>,
}

/// Certificate parser for DER rows
pub struct CertificateParser;

impl CertificateParser {
    /// Parse a DER encoded X.509 certificate
    pub fn parse_der(der_bytes: &[u8]) -> Result<DecodedCertificate> {
        let fingerprint = {
            let mut hasher = Sha256::new();
            hasher.update(der_bytes);
            hex::encode(hasher.finalize())
        };

        let (_, cert) = X509Certificate::from_der(der_bytes)
            .map_err(|e| LookupError::CertificateParse(format!("{:?}", e)))?;

        let mut dns_names = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
                for general_name in &san.general_names {
                    if let GeneralName::DNSName(dns_name) = general_name {
                        dns_names.push(dns_name.to_string());
                    }
                }
            }
        }

        let validity = cert.validity();
        let not_before = Self::to_datetime(validity.not_before.timestamp())?;
        let not_after = Self::to_datetime(validity.not_after.timestamp())?;

        Ok(DecodedCertificate {
            common_name: Self::extract_cn(&cert).unwrap_or_default(),
            not_before,
            not_after,
            issuer: cert.issuer().to_string(),
            dns_names,
            fingerprint,
            raw: der_bytes.to_vec(),
        })
    }

    /// Extract Common Name (CN) from certificate subject
    fn extract_cn(cert: &X509Certificate) -> Option<String> {
        cert.subject()
            .iter_common_name()
            .find_map(|attr| attr.as_str().ok())
            .map(str::to_string)
    }

    fn to_datetime(timestamp: i64) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
            LookupError::CertificateParse(format!("validity timestamp out of range: {}", timestamp))
        })
    }
}

/// Armor DER bytes as a `CERTIFICATE` PEM block with LF line endings
pub fn to_pem(der_bytes: &[u8]) -> String {
    let block = pem::Pem::new(PEM_CERTIFICATE_TAG, der_bytes.to_vec());
    pem::encode_config(
        &block,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Decode a single `CERTIFICATE` PEM block back into DER bytes
pub fn from_pem(text: &str) -> Result<Vec<u8>> {
    let block = pem::parse(text).map_err(|e| LookupError::CertificateParse(e.to_string()))?;
    if block.tag() != PEM_CERTIFICATE_TAG {
        return Err(LookupError::CertificateParse(format!(
            "unexpected PEM label {}",
            block.tag()
        )));
    }
    Ok(block.into_contents())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB_PEM: &str = include_str!("../tests/fixtures/github.pem");
    const NO_CN_PEM: &str = include_str!("../tests/fixtures/no_common_name.pem");

    #[test]
    fn test_parse_common_name_and_validity() {
        let der = from_pem(GITHUB_PEM).unwrap();
        let cert = CertificateParser::parse_der(&der).unwrap();

        assert_eq!(cert.common_name, "github.com");
        assert_eq!(cert.not_before.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(cert.not_after.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert_eq!(cert.dns_names, vec!["github.com", "www.github.com"]);
        assert!(cert.issuer.contains("github.com"));
        assert_eq!(cert.raw, der);
    }

    #[test]
    fn test_fingerprint_is_sha256_of_der() {
        let der = from_pem(GITHUB_PEM).unwrap();
        let cert = CertificateParser::parse_der(&der).unwrap();
        assert_eq!(
            cert.fingerprint,
            "9758997ba84a5b5ec5ceaaa3e98e27eef1fd71a0880e797d26425d03795ef8a0"
        );
    }

    #[test]
    fn test_missing_common_name_is_empty() {
        let der = from_pem(NO_CN_PEM).unwrap();
        let cert = CertificateParser::parse_der(&der).unwrap();
        assert_eq!(cert.common_name, "");
        assert!(cert.dns_names.is_empty());
    }

    #[test]
    fn test_parse_garbage_fails() {
        let result = CertificateParser::parse_der(b"definitely not DER");
        assert!(matches!(result, Err(LookupError::CertificateParse(_))));
    }

    #[test]
    fn test_parse_truncated_certificate_fails() {
        let der = from_pem(GITHUB_PEM).unwrap();
        let result = CertificateParser::parse_der(&der[..der.len() / 2]);
        assert!(matches!(result, Err(LookupError::CertificateParse(_))));
    }

    #[test]
    fn test_pem_round_trip() {
        let der = from_pem(GITHUB_PEM).unwrap();
        let armored = to_pem(&der);

        assert!(armored.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(armored.ends_with("-----END CERTIFICATE-----\n"));
        assert!(!armored.contains('\r'));
        assert_eq!(from_pem(&armored).unwrap(), der);
    }

    #[test]
    fn test_pem_round_trip_arbitrary_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(from_pem(&to_pem(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_from_pem_rejects_other_labels() {
        let block = pem::encode(&pem::Pem::new("PRIVATE KEY", vec![1, 2, 3]));
        assert!(matches!(
            from_pem(&block),
            Err(LookupError::CertificateParse(_))
        ));
    }
}
