use bookshelf_http::error::AppError;
use serde::{Deserialize, Deserializer, Serialize};

/// Column width of `title` and `author`, in characters.
pub const MAX_FIELD_CHARS: usize = 120;

pub const MISSING_FIELDS: &str = "Missing title or author";
pub const EMPTY_FIELDS: &str = "Title and author must not be empty";
pub const FIELDS_TOO_LONG: &str = "Title and author must be at most 120 characters";

/// A persisted book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Server-assigned identifier, never reused
    pub id: i64,
    pub title: String,
    pub author: String,
}

/// Request body for creating a book. Both fields are required; they are
/// optional here so a missing field reports the domain error rather than a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// Request body for a partial update.
///
/// The outer `Option` records whether the field was present at all, the
/// inner one whether it was `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub author: Option<Option<String>>,
}

/// Validated fields for a new book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

/// Validated changes; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn check_length(value: &str) -> Result<(), AppError> {
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(AppError::validation(FIELDS_TOO_LONG));
    }
    Ok(())
}

impl CreateBook {
    pub fn validate(self) -> Result<NewBook, AppError> {
        let title = self.title.filter(|title| !title.is_empty());
        let author = self.author.filter(|author| !author.is_empty());

        let (Some(title), Some(author)) = (title, author) else {
            return Err(AppError::validation(MISSING_FIELDS));
        };
        check_length(&title)?;
        check_length(&author)?;

        Ok(NewBook { title, author })
    }
}

impl UpdateBook {
    pub fn validate(self) -> Result<BookChanges, AppError> {
        let field = |value: Option<Option<String>>| -> Result<Option<String>, AppError> {
            match value {
                None => Ok(None),
                Some(None) => Err(AppError::validation(EMPTY_FIELDS)),
                Some(Some(text)) if text.is_empty() => Err(AppError::validation(EMPTY_FIELDS)),
                Some(Some(text)) => {
                    check_length(&text)?;
                    Ok(Some(text))
                }
            }
        };

        Ok(BookChanges {
            title: field(self.title)?,
            author: field(self.author)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(error: AppError) -> String {
        match error {
            AppError::Validation { message } => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_requires_both_fields() {
        let body: CreateBook = serde_json::from_str(r#"{"title":"Dune"}"#).unwrap();
        assert_eq!(message(body.validate().unwrap_err()), MISSING_FIELDS);

        let body: CreateBook = serde_json::from_str(r#"{"title":"","author":"Herbert"}"#).unwrap();
        assert_eq!(message(body.validate().unwrap_err()), MISSING_FIELDS);

        let body: CreateBook = serde_json::from_str(r#"{"title":null,"author":"Herbert"}"#).unwrap();
        assert_eq!(message(body.validate().unwrap_err()), MISSING_FIELDS);
    }

    #[test]
    fn create_accepts_complete_body() {
        let body: CreateBook =
            serde_json::from_str(r#"{"title":"Dune","author":"Herbert","year":1965}"#).unwrap();
        assert_eq!(
            body.validate().unwrap(),
            NewBook {
                title: "Dune".to_string(),
                author: "Herbert".to_string()
            }
        );
    }

    #[test]
    fn create_rejects_overlong_fields() {
        let body = CreateBook {
            title: Some("x".repeat(MAX_FIELD_CHARS + 1)),
            author: Some("Herbert".to_string()),
        };
        assert_eq!(message(body.validate().unwrap_err()), FIELDS_TOO_LONG);

        // Width is counted in characters, not bytes
        let body = CreateBook {
            title: Some("é".repeat(MAX_FIELD_CHARS)),
            author: Some("Herbert".to_string()),
        };
        assert!(body.validate().is_ok());
    }

    #[test]
    fn update_distinguishes_absent_from_null() {
        let body: UpdateBook = serde_json::from_str(r#"{"author":"New Author"}"#).unwrap();
        assert_eq!(body.title, None);
        assert_eq!(body.author, Some(Some("New Author".to_string())));

        let body: UpdateBook = serde_json::from_str(r#"{"title":null}"#).unwrap();
        assert_eq!(body.title, Some(None));
        assert_eq!(message(body.validate().unwrap_err()), EMPTY_FIELDS);
    }

    #[test]
    fn update_keeps_absent_fields() {
        let body: UpdateBook = serde_json::from_str("{}").unwrap();
        assert_eq!(body.validate().unwrap(), BookChanges::default());
    }

    #[test]
    fn update_rejects_empty_strings() {
        let body: UpdateBook = serde_json::from_str(r#"{"author":""}"#).unwrap();
        assert_eq!(message(body.validate().unwrap_err()), EMPTY_FIELDS);
    }
}
