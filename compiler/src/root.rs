use crate::{types::MessageMap, utils::to_pascal_case};

pub const FALLBACK_ROOT: &str = "FormSchema";
pub const EXCLUDED_ROOTS: [&str; 3] = ["ValidationRule", "Field", "ProfileFormPreset"];

/// Chooses the message that represents an app's form:
/// `PascalCase(app_id) + "Form"`, then `FormSchema`, then the first declared
/// message not in `excluded`.
pub fn pick_root<'m, S: AsRef<str>>(app_id: &str, messages: &'m MessageMap, excluded: &[S]) -> Option<&'m str> {
    let expected = format!("{}Form", to_pascal_case(app_id));
    if let Some((name, _)) = messages.get_key_value(&expected) {
        return Some(name);
    }
    if let Some((name, _)) = messages.get_key_value(FALLBACK_ROOT) {
        return Some(name);
    }
    messages
        .keys()
        .find(|name| !excluded.iter().any(|e| e.as_ref() == name.as_str()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageDef;

    fn messages(names: &[&str]) -> MessageMap {
        names
            .iter()
            .map(|n| (n.to_string(), MessageDef { name: n.to_string(), fields: vec![] }))
            .collect()
    }

    #[test]
    fn test_prefers_app_named_form() {
        let m = messages(&["Other", "InvoiceForm", "FormSchema"]);
        assert_eq!(pick_root("invoice", &m, &EXCLUDED_ROOTS), Some("InvoiceForm"));
    }

    #[test]
    fn test_falls_back_to_form_schema() {
        let m = messages(&["Other", "FormSchema"]);
        assert_eq!(pick_root("x", &m, &EXCLUDED_ROOTS), Some("FormSchema"));
    }

    #[test]
    fn test_first_non_excluded_message() {
        let m = messages(&["Field", "Address", "Person"]);
        assert_eq!(pick_root("x", &m, &EXCLUDED_ROOTS), Some("Address"));
    }

    #[test]
    fn test_only_excluded_messages() {
        let m = messages(&["ValidationRule"]);
        assert_eq!(pick_root("x", &m, &EXCLUDED_ROOTS), None);
    }

    #[test]
    fn test_multi_segment_app_id() {
        let m = messages(&["Misc", "UserProfileForm"]);
        assert_eq!(pick_root("user_profile", &m, &EXCLUDED_ROOTS), Some("UserProfileForm"));
    }
}
