use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use super::StoreError;
use crate::models::{HelperKind, HelperRef};

/// Read access to the volunteer, caregiver and medical-professional tables.
///
/// Helper management screens live elsewhere; this only seeds helpers and
/// resolves them for assignments.
pub struct HelperDirectory {
    pool: Arc<SqlitePool>,
}

impl HelperDirectory {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Insert a helper of the given kind and return a reference to it
    pub async fn register(
        &self,
        kind: HelperKind,
        name: &str,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<HelperRef, StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("helper name is required".into()));
        }

        let id = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO {} (id, name, email, phone_number) VALUES (?, ?, ?, ?)",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(name.trim())
            .bind(email)
            .bind(phone_number)
            .execute(&*self.pool)
            .await?;

        tracing::info!(helper_id = %id, helper_type = %kind, "Helper registered");
        Ok(HelperRef::new(kind, id))
    }
}

/// Name of the referenced helper, or `None` if no helper of that kind has the id
pub async fn display_name(
    conn: &mut SqliteConnection,
    helper: HelperRef,
) -> Result<Option<String>, StoreError> {
    let sql = format!("SELECT name FROM {} WHERE id = ?", helper.kind().table());
    let name = sqlx::query_scalar::<_, String>(&sql)
        .bind(helper.id())
        .fetch_optional(conn)
        .await?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_pool;

    #[tokio::test]
    async fn registered_helpers_resolve_by_kind() {
        let pool = Arc::new(memory_pool().await);
        let directory = HelperDirectory::new(pool.clone());

        let mut helpers = Vec::new();
        for kind in HelperKind::ALL {
            let helper = directory
                .register(kind, &format!("{kind} one"), None, None)
                .await
                .unwrap();
            assert_eq!(helper.kind(), kind);
            helpers.push(helper);
        }

        let mut conn = pool.acquire().await.unwrap();
        for helper in helpers {
            assert_eq!(
                display_name(&mut conn, helper).await.unwrap().as_deref(),
                Some(format!("{} one", helper.kind()).as_str())
            );
        }
    }

    #[tokio::test]
    async fn helper_is_not_found_under_another_kind() {
        let pool = Arc::new(memory_pool().await);
        let directory = HelperDirectory::new(pool.clone());
        let volunteer = directory
            .register(HelperKind::Volunteer, "Vera", Some("vera@example.org"), None)
            .await
            .unwrap();

        let as_caregiver = HelperRef::Caregiver(volunteer.id());
        let mut conn = pool.acquire().await.unwrap();
        assert!(display_name(&mut conn, volunteer).await.unwrap().is_some());
        assert!(display_name(&mut conn, as_caregiver).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let pool = Arc::new(memory_pool().await);
        let directory = HelperDirectory::new(pool);
        let result = directory
            .register(HelperKind::Caregiver, "  ", None, None)
            .await;
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }
}
