use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::types::{ApprovedByBoard, StatementInput};

pub const BLANK: &str = "can't be blank";
pub const NOT_INCLUDED: &str = "is not included in the list";

/// Field-level validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Human-readable messages: `Approved by board is not included in the list`.
    pub fn full_messages(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(field, messages)| {
                let label = humanize(field);
                messages.iter().map(move |m| format!("{label} {m}"))
            })
            .collect()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn humanize(field: &str) -> String {
    let spaced = field.trim_end_matches("_id").replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Validate a statement before it is written.
///
/// The url is always required. The three verification fields are only
/// constrained once a verifier is recorded.
pub fn validate_statement(input: &StatementInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if input.url.trim().is_empty() {
        errors.add("url", BLANK);
    }

    if input.verified() {
        let board_ok = input
            .approved_by_board
            .as_deref()
            .is_some_and(|v| v.parse::<ApprovedByBoard>().is_ok());
        if !board_ok {
            errors.add("approved_by_board", NOT_INCLUDED);
        }
        if input.link_on_front_page.is_none() {
            errors.add("link_on_front_page", NOT_INCLUDED);
        }
        if input.signed_by_director.is_none() {
            errors.add("signed_by_director", NOT_INCLUDED);
        }
    }

    errors.into_result()
}
