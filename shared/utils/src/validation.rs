use crate::error::{CrosstabError, CrosstabResult};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

pub fn validate_model<T: Validate>(model: &T) -> CrosstabResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(CrosstabError::validation("config", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages("", errors, &mut messages);
    messages.sort();
    messages.join(", ")
}

fn collect_messages(prefix: &str, errors: &ValidationErrors, messages: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match &error.message {
                        Some(message) => format!("{}: {}", path, message),
                        None => match error.code.as_ref() {
                            "length" => format!("Length validation failed for field '{}'", path),
                            "range" => format!("Value out of range for field '{}'", path),
                            "required" => format!("Field '{}' is required", path),
                            code => format!("Validation failed for field '{}': {}", path, code),
                        },
                    };
                    messages.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(&path, nested, messages),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    collect_messages(&format!("{}[{}]", path, idx), nested, messages);
                }
            }
        }
    }
}
