/// Derive a plus-addressed alias of `base_email` tagged with `first_name`.
///
/// The tag is the first name lowercased with all whitespace removed. Returns
/// `None` when the address does not split into exactly one local part and one
/// domain, or when the tag would be empty.
#[must_use]
pub fn derive_plus_address(base_email: &str, first_name: &str) -> Option<String> {
    let base_email = base_email.trim();
    let mut parts = base_email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    if local.is_empty() || domain.is_empty() {
        return None;
    }

    let tag: String = first_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    if tag.is_empty() {
        return None;
    }

    Some(format!("{local}+{tag}@{domain}"))
}

/// Pick the email for a student user.
///
/// A non-blank provided address wins; otherwise an alias of the parent's
/// address is derived.
#[must_use]
pub fn resolve_student_email(
    provided: Option<&str>,
    parent_email: Option<&str>,
    student_first_name: &str,
) -> Option<String> {
    if let Some(email) = provided.map(str::trim).filter(|e| !e.is_empty()) {
        return Some(email.to_string());
    }
    derive_plus_address(parent_email?, student_first_name)
}
