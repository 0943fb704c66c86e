//! Shared Key request signing.
//!
//! Blob, queue and file requests use the Shared Key scheme; table requests
//! use Shared Key Lite. Both sign with HMAC-SHA256 over the decoded account
//! key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::Request;
use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use sha2::Sha256;

use crate::storage::{Result, StorageError};

type HmacSha256 = Hmac<Sha256>;

/// Which string-to-sign layout a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    SharedKey,
    SharedKeyLite,
}

/// Signs requests for one storage account.
#[derive(Clone)]
pub struct SharedKeyCredential {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyCredential")
            .field("account", &self.account)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SharedKeyCredential {
    #[must_use]
    pub const fn new(account: String, key: Vec<u8>) -> Self {
        Self { account, key }
    }

    /// Set the `Authorization` header of `request`.
    ///
    /// Must run after every other header has been set; `x-ms-date` and
    /// `x-ms-version` are part of the signature.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the key cannot seed the HMAC.
    pub fn sign(&self, request: &mut Request, scheme: SignatureScheme) -> Result<()> {
        let (label, string_to_sign) = match scheme {
            SignatureScheme::SharedKey => ("SharedKey", self.shared_key_string(request)),
            SignatureScheme::SharedKeyLite => ("SharedKeyLite", self.shared_key_lite_string(request)),
        };

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| StorageError::Config(format!("account key: {e}")))?;
        mac.update(string_to_sign.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        let value = HeaderValue::from_str(&format!("{label} {}:{signature}", self.account))
            .map_err(|e| StorageError::Config(format!("authorization header: {e}")))?;
        request
            .headers_mut()
            .insert(reqwest::header::AUTHORIZATION, value);
        Ok(())
    }

    /// String-to-sign for the Shared Key scheme.
    ///
    /// ```text
    /// VERB \n Content-Encoding \n Content-Language \n Content-Length \n
    /// Content-MD5 \n Content-Type \n Date \n If-Modified-Since \n If-Match \n
    /// If-None-Match \n If-Unmodified-Since \n Range \n
    /// CanonicalizedHeaders CanonicalizedResource
    /// ```
    pub(crate) fn shared_key_string(&self, request: &Request) -> String {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };

        // A zero length is signed as empty.
        let body_length = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map_or(0, <[u8]>::len);
        let content_length = if body_length > 0 {
            body_length.to_string()
        } else {
            header(CONTENT_LENGTH.as_str())
                .parse::<u64>()
                .ok()
                .filter(|len| *len > 0)
                .map(|len| len.to_string())
                .unwrap_or_default()
        };

        let mut ms_headers: Vec<(String, String)> = request
            .headers()
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("x-ms-"))
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or("").trim().to_string(),
                )
            })
            .collect();
        ms_headers.sort();
        let canonicalized_headers: String = ms_headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();

        let url = request.url();
        let mut resource = format!("/{}{}", self.account, url.path());
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
            .collect();
        params.sort();
        for (name, value) in params {
            resource.push('\n');
            resource.push_str(&name);
            resource.push(':');
            resource.push_str(&value);
        }

        format!(
            "{verb}\n{encoding}\n{language}\n{content_length}\n{md5}\n{content_type}\n{date}\n{if_modified}\n{if_match}\n{if_none_match}\n{if_unmodified}\n{range}\n{canonicalized_headers}{resource}",
            verb = request.method().as_str(),
            encoding = header("content-encoding"),
            language = header("content-language"),
            md5 = header("content-md5"),
            content_type = header(CONTENT_TYPE.as_str()),
            date = header("date"),
            if_modified = header("if-modified-since"),
            if_match = header("if-match"),
            if_none_match = header("if-none-match"),
            if_unmodified = header("if-unmodified-since"),
            range = header("range"),
        )
    }

    /// String-to-sign for the table service's Shared Key Lite scheme:
    /// `x-ms-date \n /account/path[?comp=value]`.
    pub(crate) fn shared_key_lite_string(&self, request: &Request) -> String {
        let date = request
            .headers()
            .get("x-ms-date")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let url = request.url();
        let mut resource = format!("/{}{}", self.account, url.path());
        if let Some((_, comp)) = url.query_pairs().find(|(k, _)| k == "comp") {
            resource.push_str("?comp=");
            resource.push_str(&comp);
        }
        format!("{date}\n{resource}")
    }
}

/// Current time in the RFC 1123 form the services expect in `x-ms-date`.
#[must_use]
pub fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::Method;

    use super::*;

    const DATE: &str = "Mon, 01 Jan 2024 00:00:00 GMT";

    fn credential() -> SharedKeyCredential {
        SharedKeyCredential::new("myaccount".to_string(), b"0123456789abcdef".to_vec())
    }

    #[test]
    fn test_shared_key_string_for_blob_upload() {
        let request = reqwest::Client::new()
            .request(
                Method::PUT,
                "https://myaccount.blob.core.windows.net/product-images/a.png",
            )
            .header("x-ms-version", "2021-12-02")
            .header("x-ms-date", DATE)
            .header("x-ms-blob-type", "BlockBlob")
            .header("content-type", "image/png")
            .body(vec![1u8, 2, 3])
            .build()
            .unwrap();

        let expected = format!(
            "PUT\n\n\n3\n\nimage/png\n\n\n\n\n\n\nx-ms-blob-type:BlockBlob\nx-ms-date:{DATE}\nx-ms-version:2021-12-02\n/myaccount/product-images/a.png"
        );
        assert_eq!(credential().shared_key_string(&request), expected);
    }

    #[test]
    fn test_shared_key_string_sorts_query_parameters() {
        let request = reqwest::Client::new()
            .request(
                Method::PUT,
                "https://myaccount.file.core.windows.net/contracts/payments/f.pdf?comp=range",
            )
            .header("x-ms-date", DATE)
            .header("x-ms-version", "2021-12-02")
            .build()
            .unwrap();

        let string = credential().shared_key_string(&request);
        assert!(string.starts_with("PUT\n\n\n\n"));
        assert!(string.ends_with("/myaccount/contracts/payments/f.pdf\ncomp:range"));
    }

    #[test]
    fn test_shared_key_lite_string_for_table() {
        let request = reqwest::Client::new()
            .request(
                Method::GET,
                "https://myaccount.table.core.windows.net/Customers()?NextPartitionKey=Customer",
            )
            .header("x-ms-date", DATE)
            .build()
            .unwrap();

        assert_eq!(
            credential().shared_key_lite_string(&request),
            format!("{DATE}\n/myaccount/Customers()")
        );
    }

    #[test]
    fn test_sign_sets_authorization_header() {
        let mut request = reqwest::Client::new()
            .request(Method::GET, "https://myaccount.queue.core.windows.net/q/messages")
            .header("x-ms-date", DATE)
            .build()
            .unwrap();

        credential()
            .sign(&mut request, SignatureScheme::SharedKey)
            .unwrap();
        let value = request
            .headers()
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap();
        let signature = value.strip_prefix("SharedKey myaccount:").unwrap();
        assert_eq!(BASE64.decode(signature).unwrap().len(), 32);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let build = || {
            reqwest::Client::new()
                .request(Method::DELETE, "https://myaccount.blob.core.windows.net/c/b")
                .header("x-ms-date", DATE)
                .build()
                .unwrap()
        };
        let (mut a, mut b) = (build(), build());
        credential().sign(&mut a, SignatureScheme::SharedKey).unwrap();
        credential().sign(&mut b, SignatureScheme::SharedKey).unwrap();
        assert_eq!(a.headers().get("authorization"), b.headers().get("authorization"));
    }

    #[test]
    fn test_rfc1123_format() {
        let now = rfc1123_now();
        assert!(now.ends_with(" GMT"));
        assert_eq!(now.len(), DATE.len());
    }
}
