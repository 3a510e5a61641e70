use serde::{Deserialize, Deserializer, Serialize};

/// A book record as stored in the `books` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct Book {
    /// Database-generated identifier
    #[serde(rename = "bookID")]
    #[sqlx(rename = "bookid")]
    pub id: i64,
    /// Title of the book
    pub name: String,
    /// Author of the book
    pub author: String,
    /// Publisher of the book
    pub publisher: String,
}

/// Request body for creating or updating a book.
///
/// Any `bookID` sent by the client is ignored; the id comes from the
/// database on create and from the path on update. Missing and `null`
/// fields both become empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBook {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub publisher: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl NewBook {
    /// Attach an identifier, producing the stored shape.
    pub fn with_id(self, id: i64) -> Book {
        Book {
            id,
            name: self.name,
            author: self.author,
            publisher: self.publisher,
        }
    }
}

/// Outcome envelope returned by create, update and delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl MutationResponse {
    pub fn new(id: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}

fn is_zero(id: &i64) -> bool {
    *id == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn book_uses_wire_field_names() {
        let book = Book {
            id: 7,
            name: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            publisher: "Chilton".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&book).unwrap(),
            json!({
                "bookID": 7,
                "name": "Dune",
                "author": "Frank Herbert",
                "publisher": "Chilton"
            })
        );

        let decoded: Book = serde_json::from_str(&serde_json::to_string(&book).unwrap()).unwrap();
        assert_eq!(decoded, book);
    }

    #[test]
    fn new_book_ignores_client_id_and_defaults_missing_fields() {
        let decoded: NewBook =
            serde_json::from_value(json!({"bookID": 99, "name": "Emma"})).unwrap();

        assert_eq!(
            decoded,
            NewBook {
                name: "Emma".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn new_book_treats_null_as_empty() {
        let decoded: NewBook =
            serde_json::from_value(json!({"name": null, "author": "Austen", "publisher": null}))
                .unwrap();

        assert_eq!(
            decoded,
            NewBook {
                author: "Austen".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn new_book_rejects_wrong_types() {
        let result = serde_json::from_value::<NewBook>(json!({"name": 12}));
        assert!(result.is_err());
    }

    #[test]
    fn response_omits_empty_fields() {
        assert_eq!(
            serde_json::to_value(MutationResponse::new(3, "done")).unwrap(),
            json!({"id": 3, "message": "done"})
        );
        assert_eq!(
            serde_json::to_value(MutationResponse::new(0, "")).unwrap(),
            json!({})
        );
    }
}
