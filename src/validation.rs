use rocket::request::FlashMessage;
use serde::Serialize;
use std::collections::BTreeMap;
use validator::Validate;

/// Per-field messages rendered next to form inputs.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn with_error(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<validator::ValidationErrors> for FormErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut error_map = BTreeMap::new();

        for (field, field_errors) in errors.field_errors() {
            let error_messages: Vec<String> = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .clone()
                        .unwrap_or_else(|| "Invalid value".into())
                        .to_string()
                })
                .collect();

            error_map.insert(field.to_string(), error_messages);
        }

        Self { errors: error_map }
    }
}

pub trait ValidateFormExt {
    fn validate_form(&self) -> Result<(), FormErrors>;
}

impl<T: Validate> ValidateFormExt for T {
    fn validate_form(&self) -> Result<(), FormErrors> {
        self.validate().map_err(FormErrors::from)
    }
}

/// A flash-style message handed to a template, either carried over from a
/// redirect or raised while rendering the current request.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Notice {
    pub kind: String,
    pub message: String,
}

impl Notice {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new("danger", message)
    }

    pub fn from_flash(flash: Option<FlashMessage<'_>>) -> Option<Self> {
        flash.map(|f| Self::new(f.kind(), f.message()))
    }
}
