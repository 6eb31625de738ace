//! SQL access to the `book` table. Every operation is a single statement.

use anyhow::Context;
use bookshelf_kernel::Db;

use super::models::{Book, BookChanges, NewBook};

#[derive(Debug, Clone)]
pub struct BookRepository {
    db: Db,
}

impl BookRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// All books in ascending id order.
    pub async fn list(&self) -> anyhow::Result<Vec<Book>> {
        sqlx::query_as::<_, Book>("SELECT id, title, author FROM book ORDER BY id")
            .fetch_all(self.db.pool())
            .await
            .context("failed to list books")
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<Book>> {
        sqlx::query_as::<_, Book>("SELECT id, title, author FROM book WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .with_context(|| format!("failed to load book {id}"))
    }

    pub async fn create(&self, book: &NewBook) -> anyhow::Result<Book> {
        sqlx::query_as::<_, Book>(
            "INSERT INTO book (title, author) VALUES (?, ?) RETURNING id, title, author",
        )
        .bind(&book.title)
        .bind(&book.author)
        .fetch_one(self.db.pool())
        .await
        .context("failed to insert book")
    }

    /// Apply `changes` to the book with `id`. Returns `None` if it does not exist.
    pub async fn update(&self, id: i64, changes: &BookChanges) -> anyhow::Result<Option<Book>> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE book
               SET title  = COALESCE(?, title),
                   author = COALESCE(?, author)
             WHERE id = ?
            RETURNING id, title, author
            "#,
        )
        .bind(changes.title.as_deref())
        .bind(changes.author.as_deref())
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .with_context(|| format!("failed to update book {id}"))
    }

    /// Remove the book with `id`. Returns whether a row was deleted.
    pub async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM book WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .with_context(|| format!("failed to delete book {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::BooksModule;
    use bookshelf_kernel::Module;

    async fn repository() -> BookRepository {
        let db = Db::in_memory().await.unwrap();
        let migrations: Vec<_> = BooksModule::new()
            .migrations()
            .into_iter()
            .map(|migration| ("books".to_string(), migration))
            .collect();
        db.migrate(&migrations).await.unwrap();
        BookRepository::new(db)
    }

    fn new_book(title: &str, author: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let repo = repository().await;
        let created = repo.create(&new_book("Dune", "Herbert")).await.unwrap();

        assert_eq!(repo.get(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(repo.get(created.id + 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_is_ordered_by_id() {
        let repo = repository().await;
        assert!(repo.list().await.unwrap().is_empty());

        let first = repo.create(&new_book("Dune", "Herbert")).await.unwrap();
        let second = repo.create(&new_book("Emma", "Austen")).await.unwrap();

        assert_eq!(repo.list().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn update_only_touches_given_fields() {
        let repo = repository().await;
        let book = repo.create(&new_book("Dune", "Herbert")).await.unwrap();

        let changes = BookChanges {
            title: None,
            author: Some("Frank Herbert".to_string()),
        };
        let updated = repo.update(book.id, &changes).await.unwrap().unwrap();

        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.author, "Frank Herbert");
        assert_eq!(repo.update(book.id + 100, &changes).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let repo = repository().await;
        let first = repo.create(&new_book("Dune", "Herbert")).await.unwrap();

        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());

        let second = repo.create(&new_book("Emma", "Austen")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn table_rejects_empty_values() {
        let repo = repository().await;
        assert!(repo.create(&new_book("", "Herbert")).await.is_err());
    }
}
