pub mod base64;
pub mod errors;
pub mod json;
pub mod jwt;
pub mod url;

pub use self::base64::{
    base64_encode_bytes, base64_url_decode, base64_url_decode_bytes, base64_url_encode,
    base64_url_encode_bytes, DecodeBase64Error,
};
pub use self::errors::{
    core_error, invalid_argument, login_error, CoreErrorCode, ErrorData, ErrorFactory,
    GraphRequestErrorKind, LoginErrorCode, SdkError, SdkResult,
};
pub use self::json::{json_object, JsonObject};
pub use self::jwt::{decode_segment, split_token, user_id_from_signed_request, TokenSegments};
pub use self::url::{query_parameters, QueryParameters};
