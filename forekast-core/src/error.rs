use thiserror::Error;

/// Failure of a weather service call.
///
/// Cloneable so a failed fetch can sit in the result cache next to successes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("weather service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode weather service response: {0}")]
    Decode(String),

    #[error("no API key configured.\nHint: run `forekast configure` or set FOREKAST_API_KEY.")]
    MissingApiKey,
}

impl ApiError {
    /// Build a `Status` error, preferring the service's own message over the raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct Envelope {
            error: Inner,
        }
        #[derive(serde::Deserialize)]
        struct Inner {
            message: String,
        }

        let body = match serde_json::from_str::<Envelope>(body) {
            Ok(env) => truncate_body(&env.error.message),
            Err(_) => truncate_body(body),
        };
        Self::Status { status, body }
    }

    /// Short message suitable for a single output line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Status { status: 401 | 403, .. } => {
                "The API key was rejected. Run `forekast configure`.".to_string()
            }
            Self::Status { body, .. } => format!("Weather service error: {body}"),
            Self::Decode(_) => "Unexpected response from the weather service.".to_string(),
            Self::MissingApiKey => "No API key configured.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Failure reading or writing persisted settings.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode or decode value for key '{key}': {source}")]
    Codec {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize settings for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
