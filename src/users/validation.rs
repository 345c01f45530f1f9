//! Field rules for creating and updating users.
//!
//! `validate_create` and `validate_update` are pure: they normalize the input
//! and record at most one violated [`Rule`] per [`Field`]. Checks that need
//! I/O (active-email uniqueness, domain resolution) run afterwards in the
//! service layer, and only for an email that passed its own syntax rules.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::i18n::Locale;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest};
use crate::users::repo_types::{NewUser, UserChanges, UserStatus};

pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 150;
pub const PHONE_MIN_CHARS: usize = 7;
pub const PHONE_MAX_CHARS: usize = 20;

lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[\p{Latin}\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9\s+()\-]+$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[a-z0-9!#$%&'*+/=?^_`{|}~.-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$"
    )
    .unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Phone,
    Status,
}

impl Field {
    /// Name of the field in request and response bodies.
    pub fn key(self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Status => "status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MaxChars(usize),
    MinChars(usize),
    LettersAndSpaces,
    EmailFormat,
    EmailDomain,
    EmailTaken,
    PhoneChars,
    StatusValue,
}

/// First violated rule per field, ordered as [`Field`] is declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(BTreeMap<Field, Rule>);

impl Violations {
    /// Keeps the earlier rule if the field already failed one.
    pub fn record(&mut self, field: Field, rule: Rule) {
        self.0.entry(field).or_insert(rule);
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn get(&self, field: Field) -> Option<Rule> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.0.keys().map(|f| f.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Field key → rendered message, in field declaration order.
    pub fn messages(&self, locale: Locale) -> IndexMap<String, String> {
        self.0
            .iter()
            .map(|(field, rule)| (field.key().to_string(), locale.rule_message(*field, *rule)))
            .collect()
    }
}

/// Normalized input plus whatever the pure rules rejected.
#[derive(Debug, Clone)]
pub struct Checked<T> {
    pub value: T,
    pub violations: Violations,
}

impl<T> Checked<T> {
    pub fn into_result(self) -> Result<T, Violations> {
        if self.violations.is_empty() {
            Ok(self.value)
        } else {
            Err(self.violations)
        }
    }
}

pub fn validate_create(req: CreateUserRequest) -> Checked<NewUser> {
    let mut violations = Violations::default();

    let first_name = settle(
        &mut violations,
        Field::FirstName,
        required(req.first_name).and_then(check_name),
    );
    let last_name = settle(
        &mut violations,
        Field::LastName,
        required(req.last_name).and_then(check_name),
    );
    let email = settle(
        &mut violations,
        Field::Email,
        required(req.email)
            .map(normalize_email)
            .and_then(check_email_syntax)
            .and_then(check_email_length),
    );
    let phone = settle(
        &mut violations,
        Field::Phone,
        required(req.phone).and_then(check_phone),
    );

    Checked {
        value: NewUser {
            first_name,
            last_name,
            email,
            phone,
        },
        violations,
    }
}

/// Email length is left to [`check_updated_email`], which runs after the
/// domain lookup.
pub fn validate_update(req: UpdateUserRequest) -> Checked<UserChanges> {
    let mut violations = Violations::default();

    let first_name = settle_supplied(&mut violations, Field::FirstName, req.first_name, check_name);
    let last_name = settle_supplied(&mut violations, Field::LastName, req.last_name, check_name);
    let email = settle_supplied(&mut violations, Field::Email, req.email, |raw| {
        check_email_syntax(normalize_email(raw))
    });
    let phone = settle_supplied(&mut violations, Field::Phone, req.phone, check_phone);
    let status = match req.status {
        None => None,
        Some(raw) => match raw.as_deref().map(str::trim).map(str::parse::<UserStatus>) {
            Some(Ok(status)) => Some(status),
            _ => {
                violations.record(Field::Status, Rule::StatusValue);
                None
            }
        },
    };

    Checked {
        value: UserChanges {
            first_name,
            last_name,
            email,
            phone,
            status,
        },
        violations,
    }
}

/// Rules for a supplied update email that follow its syntax check: the
/// domain must resolve, then the length limit applies.
pub fn check_updated_email(violations: &mut Violations, email: &str, domain_resolves: bool) {
    if !domain_resolves {
        violations.record(Field::Email, Rule::EmailDomain);
    } else if let Err(rule) = check_email_length(email.to_string()) {
        violations.record(Field::Email, rule);
    }
}

/// Domain part of an already-validated email.
pub fn email_domain(email: &str) -> Option<&str> {
    email.rsplit_once('@').map(|(_, domain)| domain)
}

fn settle(violations: &mut Violations, field: Field, res: Result<String, Rule>) -> String {
    match res {
        Ok(v) => v,
        Err(rule) => {
            violations.record(field, rule);
            String::new()
        }
    }
}

/// `None` skips the field; `Some(None)` is an explicit null and fails as
/// required.
fn settle_supplied(
    violations: &mut Violations,
    field: Field,
    raw: Option<Option<String>>,
    check: impl FnOnce(String) -> Result<String, Rule>,
) -> Option<String> {
    let raw = raw?;
    match required(raw).and_then(check) {
        Ok(v) => Some(v),
        Err(rule) => {
            violations.record(field, rule);
            None
        }
    }
}

fn required(raw: Option<String>) -> Result<String, Rule> {
    match raw.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Rule::Required),
    }
}

fn check_name(v: String) -> Result<String, Rule> {
    if v.chars().count() > NAME_MAX_CHARS {
        return Err(Rule::MaxChars(NAME_MAX_CHARS));
    }
    if !NAME_RE.is_match(&v) {
        return Err(Rule::LettersAndSpaces);
    }
    Ok(v)
}

fn normalize_email(v: String) -> String {
    v.trim().to_lowercase()
}

fn check_email_syntax(v: String) -> Result<String, Rule> {
    let Some((local, _)) = v.split_once('@') else {
        return Err(Rule::EmailFormat);
    };
    let dotted_badly = local.starts_with('.') || local.ends_with('.') || local.contains("..");
    if dotted_badly || local.len() > 64 || !EMAIL_RE.is_match(&v) {
        return Err(Rule::EmailFormat);
    }
    Ok(v)
}

fn check_email_length(v: String) -> Result<String, Rule> {
    if v.chars().count() > EMAIL_MAX_CHARS {
        return Err(Rule::MaxChars(EMAIL_MAX_CHARS));
    }
    Ok(v)
}

fn check_phone(v: String) -> Result<String, Rule> {
    if !PHONE_RE.is_match(&v) {
        return Err(Rule::PhoneChars);
    }
    let len = v.chars().count();
    if len < PHONE_MIN_CHARS {
        return Err(Rule::MinChars(PHONE_MIN_CHARS));
    }
    if len > PHONE_MAX_CHARS {
        return Err(Rule::MaxChars(PHONE_MAX_CHARS));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> CreateUserRequest {
        CreateUserRequest::new("Ana", "Gomez", "ana@x.com", "+57 300 1234567")
    }

    #[test]
    fn accepts_valid_create() {
        let new = validate_create(ana()).into_result().unwrap();
        assert_eq!(new.first_name, "Ana");
        assert_eq!(new.email, "ana@x.com");
        assert_eq!(new.phone, "+57 300 1234567");
    }

    #[test]
    fn every_field_is_required_on_create() {
        let v = validate_create(CreateUserRequest::default()).violations;
        assert_eq!(v.len(), 4);
        for field in [Field::FirstName, Field::LastName, Field::Email, Field::Phone] {
            assert_eq!(v.get(field), Some(Rule::Required));
        }
    }

    #[test]
    fn blank_counts_as_missing() {
        let mut req = ana();
        req.last_name = Some("   ".into());
        let v = validate_create(req).violations;
        assert_eq!(v.get(Field::LastName), Some(Rule::Required));
    }

    #[test]
    fn digits_in_names_are_rejected() {
        let mut req = ana();
        req.first_name = Some("Ana2".into());
        let v = validate_create(req).violations;
        assert_eq!(v.get(Field::FirstName), Some(Rule::LettersAndSpaces));
        assert_eq!(
            v.messages(Locale::En)["firstName"],
            "The first name may only contain letters and spaces."
        );
    }

    #[test]
    fn accented_names_pass() {
        let mut req = ana();
        req.first_name = Some("María José".into());
        req.last_name = Some("Pérez Muñoz".into());
        assert!(validate_create(req).into_result().is_ok());
    }

    #[test]
    fn name_length_counts_characters() {
        let mut req = ana();
        req.first_name = Some("á".repeat(NAME_MAX_CHARS));
        assert!(validate_create(req.clone()).into_result().is_ok());
        req.first_name = Some("á".repeat(NAME_MAX_CHARS + 1));
        let v = validate_create(req).violations;
        assert_eq!(v.get(Field::FirstName), Some(Rule::MaxChars(NAME_MAX_CHARS)));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let mut req = ana();
        req.email = Some("  Ana.Gomez@Example.COM ".into());
        let new = validate_create(req).into_result().unwrap();
        assert_eq!(new.email, "ana.gomez@example.com");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["ana", "ana@", "@x.com", "ana@x", "a..b@x.com", ".a@x.com", "a b@x.com"] {
            let mut req = ana();
            req.email = Some(bad.into());
            let v = validate_create(req).violations;
            assert_eq!(v.get(Field::Email), Some(Rule::EmailFormat), "{bad}");
        }
    }

    #[test]
    fn long_email_is_rejected() {
        let mut req = ana();
        let domain = format!("{}.com", "d".repeat(60));
        let labels = vec![domain.as_str(); 3].join(".");
        req.email = Some(format!("ana@{labels}"));
        let v = validate_create(req).violations;
        assert_eq!(v.get(Field::Email), Some(Rule::MaxChars(EMAIL_MAX_CHARS)));
    }

    #[test]
    fn phone_rules_apply_in_order() {
        let cases = [
            ("300-ABC-1234", Rule::PhoneChars),
            ("12 34", Rule::MinChars(PHONE_MIN_CHARS)),
            ("+57 (300) 123-4567 89 0", Rule::MaxChars(PHONE_MAX_CHARS)),
        ];
        for (phone, rule) in cases {
            let mut req = ana();
            req.phone = Some(phone.into());
            let v = validate_create(req).violations;
            assert_eq!(v.get(Field::Phone), Some(rule), "{phone}");
        }
    }

    #[test]
    fn empty_update_is_valid_and_changes_nothing() {
        let changes = validate_update(UpdateUserRequest::default())
            .into_result()
            .unwrap();
        assert_eq!(changes, UserChanges::default());
    }

    #[test]
    fn update_validates_only_supplied_fields() {
        let req = UpdateUserRequest::default().phone("12");
        let v = validate_update(req).violations;
        assert_eq!(v.len(), 1);
        assert_eq!(v.get(Field::Phone), Some(Rule::MinChars(PHONE_MIN_CHARS)));
    }

    #[test]
    fn supplied_blank_field_is_required_on_update() {
        let req = UpdateUserRequest::default().first_name("");
        let v = validate_update(req).violations;
        assert_eq!(v.get(Field::FirstName), Some(Rule::Required));
    }

    #[test]
    fn null_field_is_required_on_update() {
        let req = UpdateUserRequest {
            first_name: Some(None),
            last_name: Some(None),
            email: Some(None),
            phone: Some(None),
            status: Some(None),
        };
        let v = validate_update(req).violations;
        for field in [Field::FirstName, Field::LastName, Field::Email, Field::Phone] {
            assert_eq!(v.get(field), Some(Rule::Required), "{field:?}");
        }
        assert_eq!(v.get(Field::Status), Some(Rule::StatusValue));
    }

    #[test]
    fn messages_follow_field_order() {
        let v = validate_create(CreateUserRequest::default()).violations;
        let keys: Vec<String> = v.messages(Locale::En).into_keys().collect();
        assert_eq!(keys, vec!["firstName", "lastName", "email", "phone"]);
    }

    #[test]
    fn update_email_domain_is_checked_before_length() {
        let long = format!("ana@{}.{}.{}.com", "d".repeat(63), "e".repeat(63), "f".repeat(20));
        assert!(long.chars().count() > EMAIL_MAX_CHARS);

        let changes = validate_update(UpdateUserRequest::default().email(long.as_str()))
            .into_result()
            .unwrap();
        assert_eq!(changes.email.as_deref(), Some(long.as_str()));

        let mut v = Violations::default();
        check_updated_email(&mut v, &long, false);
        assert_eq!(v.get(Field::Email), Some(Rule::EmailDomain));

        let mut v = Violations::default();
        check_updated_email(&mut v, &long, true);
        assert_eq!(v.get(Field::Email), Some(Rule::MaxChars(EMAIL_MAX_CHARS)));

        let mut v = Violations::default();
        check_updated_email(&mut v, "ana@x.com", true);
        assert!(v.is_empty());
    }

    #[test]
    fn update_status_must_be_known() {
        let req = UpdateUserRequest::default().status("deleted");
        let v = validate_update(req).violations;
        assert_eq!(v.get(Field::Status), Some(Rule::StatusValue));

        let req = UpdateUserRequest::default().status("inactive");
        let changes = validate_update(req).into_result().unwrap();
        assert_eq!(changes.status, Some(UserStatus::Inactive));
    }

    #[test]
    fn first_recorded_rule_wins() {
        let mut v = Violations::default();
        v.record(Field::Email, Rule::EmailFormat);
        v.record(Field::Email, Rule::EmailTaken);
        assert_eq!(v.get(Field::Email), Some(Rule::EmailFormat));
    }

    #[test]
    fn extracts_email_domain() {
        assert_eq!(email_domain("ana@x.com"), Some("x.com"));
        assert_eq!(email_domain("nope"), None);
    }
}
