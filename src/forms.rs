use serde::Serialize;

pub const REQUIRED: &str = "This field is required.";

/// Validation errors bound to form fields, plus errors about the form as a whole.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: Vec<(&'static str, String)>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, msg: impl Into<String>) {
        self.fields.push((field, msg.into()));
    }

    pub fn add_non_field(&mut self, msg: impl Into<String>) {
        self.non_field.push(msg.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| *name == field)
    }

    pub fn field(&self, field: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(name, _)| *name == field)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }
}

/// One input as the templates render it.
#[derive(Clone, Debug, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub errors: Vec<String>,
}

impl FieldView {
    pub fn new(
        name: &'static str,
        label: &'static str,
        input_type: &'static str,
        value: Option<&str>,
        errors: &FormErrors,
    ) -> Self {
        let value = if input_type == "password" {
            String::new()
        } else {
            value.unwrap_or_default().to_string()
        };
        Self {
            name,
            label,
            input_type,
            value,
            errors: errors.field(name),
        }
    }
}

pub fn require(errors: &mut FormErrors, field: &'static str, value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, REQUIRED);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_flags_missing_and_blank_values() {
        let mut errors = FormErrors::default();
        assert_eq!(require(&mut errors, "username", Some(" bob ")), Some("bob".to_string()));
        assert_eq!(require(&mut errors, "email", Some("   ")), None);
        assert_eq!(require(&mut errors, "password", None), None);
        assert_eq!(errors.field("email"), vec![REQUIRED.to_string()]);
        assert!(errors.has("password"));
        assert!(!errors.has("username"));
    }

    #[test]
    fn password_fields_never_echo_their_value() {
        let errors = FormErrors::default();
        let view = FieldView::new("password1", "Password", "password", Some("secret"), &errors);
        assert!(view.value.is_empty());
    }
}
