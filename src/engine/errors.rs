// Error taxonomy - remote errors are classified from the message text
// because structured codes are not consistently available

use crate::api::ApiError;

/// Numeric code the remote API uses for an exhausted survey
const SURVEY_EXHAUSTED_CODE: i32 = 4224;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiErrorKind {
    /// Purchase rejected for lack of credits - refresh agent/credits
    InsufficientFunds,
    /// Local ship state disagrees with the server - refresh that ship
    ShipStateStale,
    /// Action attempted while on cooldown, with the parsed remaining seconds
    OnCooldown(Option<f64>),
    /// Waypoint was charted by someone else - refresh that waypoint
    AlreadyCharted,
    /// Global rate limit hit - pause all remote calls
    RateLimited,
    /// The survey used for extraction is spent - discard it silently
    SurveyExhausted,
    /// Anything else - log and count against the error budget
    Other,
}

pub fn classify_api_error(error: &ApiError) -> ApiErrorKind {
    if error.code == Some(SURVEY_EXHAUSTED_CODE) {
        return ApiErrorKind::SurveyExhausted;
    }

    let message = error.message.to_lowercase();

    if message.contains("insufficient funds") || message.contains("insufficient credits") {
        return ApiErrorKind::InsufficientFunds;
    }
    if message.contains("rate limit") || message.contains("429") {
        return ApiErrorKind::RateLimited;
    }
    if message.contains("cooldown") {
        return ApiErrorKind::OnCooldown(extract_cooldown_seconds(&message));
    }
    if message.contains("already been charted") || message.contains("already charted") {
        return ApiErrorKind::AlreadyCharted;
    }
    if message.contains("in transit")
        || message.contains("in-transit")
        || message.contains("currently docked")
        || message.contains("currently in orbit")
        || message.contains("cargo does not contain")
        || message.contains("is not at")
    {
        return ApiErrorKind::ShipStateStale;
    }

    ApiErrorKind::Other
}

/// Parse the remaining seconds out of messages like
/// "... is on cooldown for 27 second(s)"
fn extract_cooldown_seconds(message: &str) -> Option<f64> {
    let start = message.find("cooldown for ")?;
    let rest = &message[start + "cooldown for ".len()..];
    let end = rest.find(" second")?;
    rest[..end].trim().parse::<f64>().ok()
}
