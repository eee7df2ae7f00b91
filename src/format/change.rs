use crate::feed::record::{ChangeKind, ChangeRecord};
use crate::format::links::LinkBuilder;
use crate::format::truncate::truncate;
use thiserror::Error;

/// Comments longer than this are cut on a word boundary
pub const COMMENT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("change {id} is missing field '{field}'")]
    MissingField { id: u64, field: &'static str },

    #[error("line contains a control character: {0:?}")]
    ControlCharacter(String),
}

/// Result of formatting a single change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    Formatted(String),
    /// The change is of a kind that is never reported
    Suppressed,
}

/// Reject lines that would break a line-oriented sink.
pub fn reject_control_characters(line: String) -> Result<String, FormatError> {
    if line.chars().any(|c| c < ' ') {
        return Err(FormatError::ControlCharacter(line));
    }
    Ok(line)
}

fn required<'a, T: ?Sized>(
    change: &ChangeRecord,
    value: Option<&'a T>,
    field: &'static str,
) -> Result<&'a T, FormatError> {
    value.ok_or(FormatError::MissingField {
        id: change.id,
        field,
    })
}

fn required_copy<T: Copy>(
    change: &ChangeRecord,
    value: Option<T>,
    field: &'static str,
) -> Result<T, FormatError> {
    value.ok_or(FormatError::MissingField {
        id: change.id,
        field,
    })
}

/// Renders changes as one-line notifications.
#[derive(Debug, Clone)]
pub struct ChangeFormatter {
    links: LinkBuilder,
}

impl ChangeFormatter {
    pub fn new(links: LinkBuilder) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    /// Format `change` as `"{user} {verb} {title} ({delta}, {comment}): {url}"`.
    ///
    /// The parenthetical and the URL are left out when empty. The returned
    /// line has not been checked for control characters yet.
    pub fn format(&self, change: &ChangeRecord) -> Result<FormatOutcome, FormatError> {
        let title = required(change, change.title.as_deref(), "title")?;
        let logtype = change.logtype.as_deref();

        let (verb, title, url, show_delta) = match (change.kind, logtype) {
            (ChangeKind::New, _) => {
                let revid = required_copy(change, change.revid, "revid")?;
                ("created", title.to_string(), Some(self.links.revision(revid)), true)
            }
            (ChangeKind::Edit, _) => {
                let revid = required_copy(change, change.revid, "revid")?;
                let old_revid = required_copy(change, change.old_revid, "old_revid")?;
                (
                    "edited",
                    title.to_string(),
                    Some(self.links.diff(revid, old_revid)),
                    true,
                )
            }
            (ChangeKind::Log, Some("delete")) => ("deleted", title.to_string(), None, false),
            (ChangeKind::Log, Some("upload")) => {
                ("uploaded", title.to_string(), Some(self.links.page(title)), false)
            }
            (ChangeKind::Log, Some("move")) => {
                let target = change
                    .logparams
                    .as_ref()
                    .and_then(|params| params.target_title.as_deref());
                let target = required(change, target, "logparams.target_title")?;
                (
                    "moved",
                    format!("{} to {}", title, target),
                    Some(self.links.page(target)),
                    false,
                )
            }
            (ChangeKind::Log, Some("rights")) => {
                ("changed the user rights of", title.to_string(), None, false)
            }
            _ => return Ok(FormatOutcome::Suppressed),
        };

        let comment = required(change, change.comment.as_deref(), "comment")?;
        let comment = if comment.is_empty() {
            String::new()
        } else {
            truncate(comment, COMMENT_LIMIT)
        };

        let delta = if show_delta {
            let old_length = required_copy(change, change.old_length, "oldlen")?;
            let new_length = required_copy(change, change.new_length, "newlen")?;
            format!("{:+}", new_length - old_length)
        } else {
            String::new()
        };

        let details = match (delta.is_empty(), comment.is_empty()) {
            (true, true) => String::new(),
            (false, true) => format!(" ({})", delta),
            (true, false) => format!(" ({})", comment),
            (false, false) => format!(" ({}, {})", delta, comment),
        };

        let url = match url {
            Some(url) => format!(": {}", url),
            None => String::new(),
        };

        let user = required(change, change.user.as_deref(), "user")?;

        Ok(FormatOutcome::Formatted(format!(
            "{} {} {}{}{}",
            user, verb, title, details, url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use url::Url;

    fn formatter() -> ChangeFormatter {
        ChangeFormatter::new(LinkBuilder::new(
            Url::parse("https://wiki.example.org/").unwrap(),
        ))
    }

    fn record(value: serde_json::Value) -> ChangeRecord {
        serde_json::from_value(value).unwrap()
    }

    fn line(value: serde_json::Value) -> String {
        match formatter().format(&record(value)).unwrap() {
            FormatOutcome::Formatted(line) => line,
            FormatOutcome::Suppressed => panic!("change was suppressed"),
        }
    }

    fn edit(old_length: i64, new_length: i64, comment: &str) -> serde_json::Value {
        json!({
            "type": "edit", "rcid": 1, "timestamp": "2024-05-01T10:00:00Z",
            "ns": 0, "title": "Main Page", "user": "Alice",
            "revid": 11, "old_revid": 10,
            "oldlen": old_length, "newlen": new_length, "comment": comment
        })
    }

    #[test]
    fn test_edit_with_comment() {
        assert_eq!(
            line(edit(80, 100, "typo")),
            "Alice edited Main Page (+20, typo): https://wiki.example.org/?diff=11&oldid=10"
        );
    }

    #[test]
    fn test_delta_sign() {
        assert!(line(edit(100, 80, "")).contains("(-20)"));
        assert!(line(edit(80, 100, "")).contains("(+20)"));
        assert!(line(edit(80, 80, "")).contains("(+0)"));
    }

    #[test]
    fn test_long_comment_is_truncated() {
        let formatted = line(edit(
            1,
            2,
            "fixed the broken links in the infobox and updated the status",
        ));
        assert!(formatted.contains("(+1, fixed the broken links in the infobox and…)"));
    }

    #[test]
    fn test_page_creation() {
        assert_eq!(
            line(json!({
                "type": "new", "rcid": 2, "timestamp": "2024-05-01T10:00:00Z",
                "ns": 0, "title": "New Project", "user": "Bob",
                "revid": 50, "old_revid": 0, "oldlen": 0, "newlen": 1234, "comment": ""
            })),
            "Bob created New Project (+1234): https://wiki.example.org/?oldid=50"
        );
    }

    #[test]
    fn test_delete_has_no_url_or_delta() {
        assert_eq!(
            line(json!({
                "type": "log", "logtype": "delete", "rcid": 3,
                "timestamp": "2024-05-01T10:00:00Z", "ns": 0,
                "title": "Spam", "user": "Admin", "comment": ""
            })),
            "Admin deleted Spam"
        );
    }

    #[test]
    fn test_upload_links_to_title() {
        assert_eq!(
            line(json!({
                "type": "log", "logtype": "upload", "rcid": 4,
                "timestamp": "2024-05-01T10:00:00Z", "ns": 6,
                "title": "File:Logo.png", "user": "Carol", "comment": "new logo"
            })),
            "Carol uploaded File:Logo.png (new logo): https://wiki.example.org/?title=File%3ALogo.png"
        );
    }

    #[test]
    fn test_move_links_to_target() {
        assert_eq!(
            line(json!({
                "type": "log", "logtype": "move", "rcid": 5,
                "timestamp": "2024-05-01T10:00:00Z", "ns": 0,
                "title": "Old Name", "user": "Dave", "comment": "rename",
                "logparams": { "target_ns": 0, "target_title": "New Name" }
            })),
            "Dave moved Old Name to New Name (rename): https://wiki.example.org/?title=New%20Name"
        );
    }

    #[test]
    fn test_rights_change() {
        assert_eq!(
            line(json!({
                "type": "log", "logtype": "rights", "rcid": 6,
                "timestamp": "2024-05-01T10:00:00Z", "ns": 2,
                "title": "User:Eve", "user": "Admin", "comment": ""
            })),
            "Admin changed the user rights of User:Eve"
        );
    }

    #[test]
    fn test_unhandled_log_type_is_suppressed() {
        let outcome = formatter()
            .format(&record(json!({
                "type": "log", "logtype": "patrol", "rcid": 7,
                "timestamp": "2024-05-01T10:00:00Z", "ns": 0,
                "title": "Main Page", "user": "Admin", "comment": ""
            })))
            .unwrap();
        assert_eq!(outcome, FormatOutcome::Suppressed);
    }

    #[test]
    fn test_unknown_type_is_suppressed() {
        let outcome = formatter()
            .format(&record(json!({
                "type": "categorize", "rcid": 8,
                "timestamp": "2024-05-01T10:00:00Z", "title": "Category:X"
            })))
            .unwrap();
        assert_eq!(outcome, FormatOutcome::Suppressed);
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let mut value = edit(1, 2, "");
        value.as_object_mut().unwrap().remove("old_revid");

        let err = formatter().format(&record(value)).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingField {
                id: 1,
                field: "old_revid"
            }
        );
    }

    #[test]
    fn test_missing_move_target_is_an_error() {
        let err = formatter()
            .format(&record(json!({
                "type": "log", "logtype": "move", "rcid": 9,
                "timestamp": "2024-05-01T10:00:00Z",
                "title": "Old", "user": "Dave", "comment": ""
            })))
            .unwrap_err();
        assert!(matches!(
            err,
            FormatError::MissingField {
                field: "logparams.target_title",
                ..
            }
        ));
    }

    #[test]
    fn test_reject_control_characters() {
        assert_eq!(
            reject_control_characters("plain line".to_string()),
            Ok("plain line".to_string())
        );
        assert!(matches!(
            reject_control_characters("broken\nline".to_string()),
            Err(FormatError::ControlCharacter(_))
        ));
        assert!(reject_control_characters("tab\there".to_string()).is_err());
    }
}
