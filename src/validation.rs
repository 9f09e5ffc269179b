// region:    --- Imports
use crate::error::AppError;
use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

// endregion: --- Imports

/// JSON 역직렬화 후 validator 검증까지 하는 추출기
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| AppError::Validation(format_validation_errors(&errors)))?;

        Ok(Self(value))
    }
}

/// "field: message; field: message"
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.errors() {
        let field_errors = match field_errors {
            validator::ValidationErrorsKind::Field(errs) => errs,
            _ => continue,
        };
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| match error.code.as_ref() {
                    "email" => "올바른 이메일 형식이 아닙니다.".to_string(),
                    "length" => "길이가 올바르지 않습니다.".to_string(),
                    "range" => "허용 범위를 벗어났습니다.".to_string(),
                    code => format!("유효하지 않은 값입니다 ({})", code),
                });
            if *field == "__all__" {
                messages.push(message);
            } else {
                messages.push(format!("{}: {}", field, message));
            }
        }
    }

    if messages.is_empty() {
        "입력값 검증 실패".to_string()
    } else {
        messages.sort();
        messages.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
        #[validate(length(min = 8, message = "too short"))]
        password: String,
    }

    #[test]
    fn messages_name_each_field() {
        let sample = Sample {
            email: "nope".into(),
            password: "x".into(),
        };
        let errors = sample.validate().unwrap_err();
        let text = format_validation_errors(&errors);
        assert!(text.contains("email: 올바른 이메일 형식이 아닙니다."));
        assert!(text.contains("password: too short"));
    }
}
