use crate::constants::{
    AUTHORIZATION, AWS4_HMAC_SHA256, AWS4_REQUEST, AWS_URI_ENCODE_SET, HOST,
    X_AMZ_CONTENT_SHA_256, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::Credential;
use async_trait::async_trait;
use edgesign_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use edgesign_core::time::{format_date, format_iso8601, now, DateTime};
use edgesign_core::utils::Redact;
use edgesign_core::{
    CanonicalRequest, Error, Result, SignRequest, SignatureResult, SigningCredential,
};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;
use std::fmt::Write;

/// How the request path is turned into the canonical URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UriEncoding {
    /// Normalize `.`/`..`/empty segments, then URI-encode the path as received.
    ///
    /// Existing `%XX` escapes get encoded again. Every service except S3
    /// expects this.
    #[default]
    Double,
    /// Percent-decode the path, then URI-encode it once. S3 expects this.
    Single,
}

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    region: String,
    uri_encoding: UriEncoding,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for AWS V4.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),
            uri_encoding: UriEncoding::default(),

            time: None,
        }
    }

    /// Set how the canonical URI is encoded.
    pub fn with_uri_encoding(mut self, uri_encoding: UriEncoding) -> Self {
        self.uri_encoding = uri_encoding;
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// The service this signer is scoped to.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The region this signer is scoped to.
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        req: &CanonicalRequest,
        cred: &Self::Credential,
    ) -> Result<SignatureResult> {
        if !cred.is_valid() {
            return Err(Error::config_invalid(
                "access key id and secret access key are required for signing",
            ));
        }
        if self.region.is_empty() || self.service.is_empty() {
            return Err(Error::config_invalid(
                "region and service are required for signing",
            ));
        }

        let now = self.time.unwrap_or_else(now);
        let payload_hash = req.payload_hash();

        // canonicalize context
        let headers = canonicalize_header(req, cred, &payload_hash, now);
        let signed_headers = headers.keys().map(String::as_str).collect::<Vec<_>>();
        let signed_headers = signed_headers.join(";");

        // build canonical request and string to sign.
        let creq = canonical_request_string(
            req,
            &headers,
            &signed_headers,
            &payload_hash,
            self.uri_encoding,
        )?;
        debug!("calculated canonical request: {creq}");
        let encoded_req = hex_sha256(creq.as_bytes());

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = format!(
            "{}/{}/{}/{AWS4_REQUEST}",
            format_date(now),
            self.region,
            self.service
        );
        debug!("calculated scope: {scope}");

        // StringToSign:
        //
        // AWS4-HMAC-SHA256
        // 20220313T072004Z
        // 20220313/<region>/<service>/aws4_request
        // <hashed_canonical_request>
        let string_to_sign = {
            let mut f = String::new();
            writeln!(f, "{AWS4_HMAC_SHA256}")?;
            writeln!(f, "{}", format_iso8601(now))?;
            writeln!(f, "{}", &scope)?;
            write!(f, "{}", &encoded_req)?;
            f
        };
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, now, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());
        debug!("calculated signature: {:?}", Redact::from(&signature));

        let authorization = format!(
            "{AWS4_HMAC_SHA256} Credential={}/{}, SignedHeaders={}, Signature={}",
            cred.access_key_id, scope, signed_headers, signature
        );

        let mut result = SignatureResult::new();
        for (k, v) in headers {
            result.insert(k, v);
        }
        result.insert(AUTHORIZATION, authorization);
        Ok(result)
    }
}

/// Collect the headers to sign, keyed and sorted by lower-cased name.
fn canonicalize_header(
    req: &CanonicalRequest,
    cred: &Credential,
    payload_hash: &str,
    now: DateTime,
) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    // Header names and values need to be normalized according to Step 4 of https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html
    for (k, v) in &req.headers {
        headers.insert(k.to_ascii_lowercase(), header_value_normalize(v));
    }

    // The logical host always wins over whatever the caller passed.
    headers.insert(HOST.to_string(), header_value_normalize(&req.host));
    headers.insert(X_AMZ_DATE.to_string(), format_iso8601(now));
    headers.insert(X_AMZ_CONTENT_SHA_256.to_string(), payload_hash.to_string());

    if let Some(token) = &cred.session_token {
        headers.insert(X_AMZ_SECURITY_TOKEN.to_string(), token.clone());
    }

    headers
}

/// Trim the value and collapse inner runs of whitespace into one space.
fn header_value_normalize(v: &str) -> String {
    v.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_request_string(
    req: &CanonicalRequest,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    payload_hash: &str,
    uri_encoding: UriEncoding,
) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    // Insert method
    writeln!(f, "{}", req.method)?;
    // Insert encoded path
    writeln!(f, "{}", canonical_uri(&req.path, uri_encoding)?)?;
    // Insert query, the query string is never signed.
    writeln!(f)?;
    // Insert signed headers
    for (k, v) in headers {
        writeln!(f, "{k}:{v}")?;
    }
    writeln!(f)?;
    writeln!(f, "{signed_headers}")?;
    write!(f, "{payload_hash}")?;

    Ok(f)
}

fn canonical_uri(path: &str, uri_encoding: UriEncoding) -> Result<String> {
    let path = if path.is_empty() { "/" } else { path };

    match uri_encoding {
        UriEncoding::Double => {
            let normalized = normalize_path(path);
            Ok(utf8_percent_encode(&normalized, &AWS_URI_ENCODE_SET).to_string())
        }
        UriEncoding::Single => {
            let decoded = percent_decode_str(path).decode_utf8().map_err(|e| {
                Error::unexpected(format!("failed to decode path: {e}")).with_source(e)
            })?;
            Ok(utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
        }
    }
}

/// Remove empty, `.` and `..` segments, keeping a leading and trailing slash.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    if path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(&segments.join("/"));
    if !segments.is_empty() && path.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), AWS4_REQUEST.as_bytes())
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use aws_credential_types::Credentials;
    use aws_sigv4::http_request::PayloadChecksumKind;
    use aws_sigv4::http_request::PercentEncodingMode;
    use aws_sigv4::http_request::SignableBody;
    use aws_sigv4::http_request::SignableRequest;
    use aws_sigv4::http_request::SigningSettings;
    use aws_sigv4::sign::v4;
    use chrono::TimeZone;
    use chrono::Utc;
    use edgesign_core::hash::EMPTY_SHA256;
    use http::Method;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const HOST_NAME: &str = "abcdef1234.execute-api.us-east-1.amazonaws.com";

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
    }

    fn signer() -> RequestSigner {
        RequestSigner::new("execute-api", "us-east-1").with_time(test_time())
    }

    fn credential() -> Credential {
        Credential::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
    }

    /// Sign the same request with the aws-sigv4 reference implementation.
    fn reference_sign(req: &CanonicalRequest, cred: &Credential) -> http::Request<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut ss = SigningSettings::default();
        ss.percent_encoding_mode = PercentEncodingMode::Double;
        ss.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
        let id = Credentials::new(
            cred.access_key_id.clone(),
            cred.secret_access_key.clone(),
            cred.session_token.clone(),
            None,
            "hardcoded-credentials",
        )
        .into();
        let sp = v4::SigningParams::builder()
            .identity(&id)
            .region("us-east-1")
            .name("execute-api")
            .time(SystemTime::from(test_time()))
            .settings(ss)
            .build()
            .expect("signing params must be valid");

        let uri = format!("https://{}{}", req.host, req.path);
        let body = match &req.body {
            Some(bs) => SignableBody::Bytes(bs),
            None => SignableBody::Bytes(&[]),
        };
        let output = aws_sigv4::http_request::sign(
            SignableRequest::new(req.method.as_str(), uri.clone(), std::iter::empty(), body)
                .expect("signable request must be valid"),
            &sp.into(),
        )
        .expect("reference signing must succeed");

        let mut expected = http::Request::builder()
            .method(req.method.as_str())
            .uri(uri)
            .body(())
            .expect("request must be valid");
        let (instructions, _) = output.into_parts();
        instructions.apply_to_request_http1x(&mut expected);
        expected
    }

    #[track_caller]
    fn assert_matches_reference(req: CanonicalRequest, cred: Credential) {
        let actual = tokio_block_on(signer().sign_request(&req, &cred)).expect("sign must succeed");
        let expected = reference_sign(&req, &cred);

        for name in [
            AUTHORIZATION,
            X_AMZ_DATE,
            X_AMZ_CONTENT_SHA_256,
            X_AMZ_SECURITY_TOKEN,
        ] {
            assert_eq!(
                actual.get(name),
                expected
                    .headers()
                    .get(name)
                    .map(|v| v.to_str().expect("must be valid header")),
                "{} {} header {name} mismatch",
                req.method,
                req.path
            );
        }
    }

    fn tokio_block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime must build")
            .block_on(f)
    }

    #[test_case(Method::GET, "/api/widgets", None ; "get")]
    #[test_case(Method::GET, "/api", None ; "get root segment")]
    #[test_case(Method::GET, "/api/widgets/", None ; "trailing slash")]
    #[test_case(Method::GET, "/api/hello%20world", None ; "encoded path")]
    #[test_case(Method::DELETE, "/ws/session/42", None ; "delete")]
    #[test_case(Method::POST, "/api/widgets", Some(b"{\"name\":\"gear\"}".to_vec()) ; "post json")]
    #[test_case(Method::PUT, "/lexmind/doc", Some("héllo wörld".as_bytes().to_vec()) ; "put utf8")]
    fn test_matches_reference(method: Method, path: &str, body: Option<Vec<u8>>) {
        let req = CanonicalRequest::new(method, HOST_NAME, path).with_body(body);
        assert_matches_reference(req.clone(), credential());
        assert_matches_reference(req, credential().with_session_token("session-token"));
    }

    #[tokio::test]
    async fn test_signed_headers() -> Result<()> {
        let req = CanonicalRequest::new(Method::GET, HOST_NAME, "/api/widgets");
        let cred = credential().with_session_token("session-token");
        let result = signer().sign_request(&req, &cred).await?;

        let names: Vec<_> = result.iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec![
                HOST,
                X_AMZ_CONTENT_SHA_256,
                X_AMZ_DATE,
                X_AMZ_SECURITY_TOKEN,
                AUTHORIZATION
            ]
        );
        assert_eq!(result.get(HOST), Some(HOST_NAME));
        assert_eq!(result.get(X_AMZ_DATE), Some("20240517T093000Z"));
        assert_eq!(result.get(X_AMZ_CONTENT_SHA_256), Some(EMPTY_SHA256));
        assert_eq!(result.get(X_AMZ_SECURITY_TOKEN), Some("session-token"));

        let authorization = result.get(AUTHORIZATION).unwrap();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240517/us-east-1/execute-api/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date;x-amz-security-token, Signature="
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_signature_is_stable() -> Result<()> {
        let req = CanonicalRequest::new(Method::POST, HOST_NAME, "/api/widgets")
            .with_body(Some(b"{}".to_vec()));
        let a = signer().sign_request(&req, &credential()).await?;
        let b = signer().sign_request(&req, &credential()).await?;
        assert_eq!(a, b);
        Ok(())
    }

    #[tokio::test]
    async fn test_signature_is_sensitive() -> Result<()> {
        let base = CanonicalRequest::new(Method::POST, HOST_NAME, "/api/widgets")
            .with_body(Some(b"{}".to_vec()));
        let sign = |req: CanonicalRequest| async move {
            signer()
                .sign_request(&req, &credential())
                .await
                .map(|v| v.get(AUTHORIZATION).unwrap().to_string())
        };

        let original = sign(base.clone()).await?;

        let mut method = base.clone();
        method.method = Method::PUT;
        let mut path = base.clone();
        path.path = "/api/gadgets".to_string();
        let body = base.clone().with_body(Some(b"{\"a\":1}".to_vec()));

        for changed in [method, path, body] {
            assert_ne!(original, sign(changed).await?);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_credential_is_config_error() {
        let req = CanonicalRequest::new(Method::GET, HOST_NAME, "/api");
        let err = signer()
            .sign_request(&req, &Credential::new("", ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), edgesign_core::ErrorKind::ConfigInvalid);
        assert!(!err.is_blocking());
    }

    #[test_case("/api/widgets", "/api/widgets")]
    #[test_case("/api//widgets", "/api/widgets")]
    #[test_case("/api/./widgets/../gadgets", "/api/gadgets")]
    #[test_case("/api/widgets/", "/api/widgets/")]
    #[test_case("/", "/")]
    #[test_case("/../", "/")]
    fn test_normalize_path(input: &str, expected: &str) {
        assert_eq!(normalize_path(input), expected);
    }

    #[test_case("/api/hello%20world", UriEncoding::Double, "/api/hello%2520world")]
    #[test_case("/api/hello%20world", UriEncoding::Single, "/api/hello%20world")]
    #[test_case("/api/a b", UriEncoding::Double, "/api/a%20b")]
    #[test_case("/api/~user_1.txt", UriEncoding::Single, "/api/~user_1.txt")]
    #[test_case("", UriEncoding::Double, "/")]
    fn test_canonical_uri(path: &str, encoding: UriEncoding, expected: &str) {
        assert_eq!(canonical_uri(path, encoding).unwrap(), expected);
    }

    #[test]
    fn test_header_value_normalize() {
        assert_eq!(header_value_normalize("  a   b \t c "), "a b c");
    }
}
