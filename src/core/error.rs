use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationMissingArgument,
    ValidationInvalidArgument,
    ValidationInvalidYaml,

    RecipeNotFound,
    ManifestNotFound,
    SeedNotFound,
    RepoPathNotFound,
    MilestoneNotFound,

    ApiRequestFailed,
    ApiErrorStatus,
    ApiTokenMissing,

    GitCommandFailed,
    GitNoRemotes,
    PrCreateFailed,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidYaml => "validation.invalid_yaml",

            ErrorCode::RecipeNotFound => "recipe.not_found",
            ErrorCode::ManifestNotFound => "manifest.not_found",
            ErrorCode::SeedNotFound => "seed.not_found",
            ErrorCode::RepoPathNotFound => "repo_path.not_found",
            ErrorCode::MilestoneNotFound => "milestone.not_found",

            ErrorCode::ApiRequestFailed => "api.request_failed",
            ErrorCode::ApiErrorStatus => "api.error_status",
            ErrorCode::ApiTokenMissing => "api.token_missing",

            ErrorCode::GitCommandFailed => "git.command_failed",
            ErrorCode::GitNoRemotes => "git.no_remotes",
            ErrorCode::PrCreateFailed => "pr.create_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorStatusDetails {
    pub status: u16,
    pub body: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            serde_json::json!({ "args": args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = serde_json::to_value(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            tried,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn validation_invalid_yaml(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidYaml,
            "Invalid YAML",
            serde_json::json!({ "context": context.into(), "error": err.to_string() }),
        )
    }

    pub fn recipe_not_found(path: impl Into<String>) -> Self {
        Self::not_found(ErrorCode::RecipeNotFound, "Recipe file not found", path)
            .with_hint("Pass the recipe path with --recipe")
    }

    pub fn manifest_not_found(path: impl Into<String>) -> Self {
        Self::not_found(
            ErrorCode::ManifestNotFound,
            "Repository manifest not found",
            path,
        )
    }

    pub fn seed_not_found(source: impl Into<String>) -> Self {
        Self::not_found(ErrorCode::SeedNotFound, "Seed environment not found", source)
    }

    pub fn repo_path_not_found(path: impl Into<String>) -> Self {
        Self::not_found(
            ErrorCode::RepoPathNotFound,
            "Repository path not found",
            path,
        )
    }

    pub fn milestone_not_found(title: impl Into<String>) -> Self {
        Self::not_found(ErrorCode::MilestoneNotFound, "Milestone not found", title)
    }

    fn not_found(code: ErrorCode, message: &str, id: impl Into<String>) -> Self {
        let details = serde_json::to_value(NotFoundDetails { id: id.into() })
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
        Self::new(code, message, details)
    }

    pub fn api_request_failed(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::ApiRequestFailed,
            format!("API request failed: {}", err),
            serde_json::json!({ "context": context.into() }),
        )
        .with_retryable(true)
    }

    pub fn api_error_status(status: u16, body: impl Into<String>, url: impl Into<String>) -> Self {
        let details = serde_json::to_value(ApiErrorStatusDetails {
            status,
            body: body.into(),
            url: url.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ApiErrorStatus,
            format!("API error: HTTP {}", status),
            details,
        )
    }

    pub fn api_token_missing(env_var: impl Into<String>) -> Self {
        let env_var = env_var.into();
        Self::new(
            ErrorCode::ApiTokenMissing,
            format!("Hosting API token not set in {}", env_var),
            serde_json::json!({ "envVar": env_var }),
        )
        .with_hint("Export a personal access token before running this command")
    }

    pub fn git_command_failed(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitCommandFailed,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }

    pub fn git_no_remotes(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::GitNoRemotes,
            "No git remotes configured",
            serde_json::json!({ "path": path.into() }),
        )
    }

    pub fn pr_create_failed(repo: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::PrCreateFailed,
            "Failed to create pull request",
            serde_json::json!({ "repo": repo.into(), "stderr": stderr.into() }),
        )
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            serde_json::json!({ "key": key.into(), "path": path }),
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            serde_json::json!({ "key": key.into(), "value": value, "problem": problem.into() }),
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            serde_json::json!({ "error": err.to_string(), "context": context }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::to_value(InternalIoErrorDetails {
            error: error.into(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(ErrorCode::InternalIoError, "I/O error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_unexpected(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            message,
            Value::Object(serde_json::Map::new()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_dotted_strings() {
        assert_eq!(ErrorCode::GitCommandFailed.as_str(), "git.command_failed");
        assert_eq!(ErrorCode::ApiErrorStatus.as_str(), "api.error_status");
        assert_eq!(
            ErrorCode::ValidationInvalidArgument.as_str(),
            "validation.invalid_argument"
        );
    }

    #[test]
    fn with_hint_accumulates() {
        let err = Error::internal_unexpected("boom")
            .with_hint("first")
            .with_hint("second");
        assert_eq!(err.hints.len(), 2);
        assert_eq!(err.hints[0].message, "first");
    }

    #[test]
    fn api_request_failed_is_retryable() {
        let err = Error::api_request_failed("list tags", "connection reset");
        assert_eq!(err.retryable, Some(true));
    }
}
