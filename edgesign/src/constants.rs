// Env values read by the interceptor config.
pub const JWT_SECRET: &str = "JWT_SECRET";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const EDGESIGN_SERVICE: &str = "EDGESIGN_SERVICE";
pub const EDGESIGN_CREDENTIAL_HEADER: &str = "EDGESIGN_CREDENTIAL_HEADER";
pub const EDGESIGN_JWT_LEEWAY: &str = "EDGESIGN_JWT_LEEWAY";
pub const EDGESIGN_PROTECTED_SEGMENTS: &str = "EDGESIGN_PROTECTED_SEGMENTS";
pub const EDGESIGN_PROTECTED_PATTERN: &str = "EDGESIGN_PROTECTED_PATTERN";
pub const EDGESIGN_SIGNING_HOST: &str = "EDGESIGN_SIGNING_HOST";
pub const EDGESIGN_BODY_SIGNING: &str = "EDGESIGN_BODY_SIGNING";
pub const EDGESIGN_URI_ENCODING: &str = "EDGESIGN_URI_ENCODING";

// Defaults.
pub const DEFAULT_CREDENTIAL_HEADER: &str = "x-auth";
pub const DEFAULT_SERVICE: &str = "execute-api";
/// Largest clock skew accepted for time claims, one day.
pub const MAX_JWT_LEEWAY: u64 = 24 * 60 * 60;
pub const DEFAULT_PROTECTED_SEGMENTS: &[&str] = &["api", "ws", "lexmind", "confidence", "lexhyper"];
