use chrono::{Local, NaiveDate};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use super::helper_directory;
use super::{StoreError, UnitOfWork};
use crate::models::{
    Assignment, AssignmentRequest, AssignmentStatus, CreatedAssignment, HelperKind, HelperRef,
};

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    patient_id: Uuid,
    helper_id: Uuid,
    helper_type: String,
    assigned_date: NaiveDate,
    status: String,
    patient_name: String,
    helper_name: Option<String>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = StoreError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        let helper_type = row
            .helper_type
            .parse::<HelperKind>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.to_string().into())))?;
        let status = row
            .status
            .parse::<AssignmentStatus>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(Assignment {
            id: row.id,
            patient_id: row.patient_id,
            helper_id: row.helper_id,
            helper_type,
            assigned_date: row.assigned_date,
            status,
            patient_name: row.patient_name,
            helper_name: row.helper_name,
        })
    }
}

/// Which helper is responsible for which patient.
///
/// A patient has at most one active helper of each kind. Assignments are
/// never deleted: removal marks them inactive, and reassigning the same kind
/// creates a new row.
pub struct AssignmentRegistry {
    pool: Arc<SqlitePool>,
}

impl AssignmentRegistry {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Active assignments with patient and helper names resolved
    pub async fn list(&self) -> Result<Vec<Assignment>, StoreError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT a.id, a.patient_id, a.helper_id, a.helper_type, a.assigned_date, a.status,
                    p.name AS patient_name,
                    CASE a.helper_type
                        WHEN 'volunteer' THEN v.name
                        WHEN 'caregiver' THEN c.name
                        WHEN 'medical_professional' THEN m.name
                    END AS helper_name
             FROM assignments a
             JOIN patients p ON p.id = a.patient_id
             LEFT JOIN volunteers v ON v.id = a.helper_id
             LEFT JOIN caregivers c ON c.id = a.helper_id
             LEFT JOIN medical_professionals m ON m.id = a.helper_id
             WHERE a.status = 'active'
             ORDER BY a.assigned_date DESC, p.name",
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.into_iter().map(Assignment::try_from).collect()
    }

    /// Validate a request body and assign the helper it names
    pub async fn create_from_request(
        &self,
        request: AssignmentRequest,
    ) -> Result<CreatedAssignment, StoreError> {
        let patient_id = request
            .patient_id
            .ok_or_else(|| StoreError::InvalidInput("patientId is required".into()))?;
        let helper_id = request
            .helper_id
            .ok_or_else(|| StoreError::InvalidInput("helperId is required".into()))?;
        let kind = request
            .helper_type
            .as_deref()
            .ok_or_else(|| StoreError::InvalidInput("helperType is required".into()))?
            .parse::<HelperKind>()
            .map_err(|e| StoreError::InvalidInput(e.to_string()))?;

        self.create(patient_id, HelperRef::new(kind, helper_id)).await
    }

    /// Make `helper` the active helper of its kind for the patient.
    ///
    /// Fails with `Conflict`, writing nothing, if the patient already has an
    /// active helper of that kind.
    pub async fn create(
        &self,
        patient_id: Uuid,
        helper: HelperRef,
    ) -> Result<CreatedAssignment, StoreError> {
        let kind = helper.kind();
        let mut uow = UnitOfWork::begin(&self.pool, "assignment.create").await?;

        let patient = sqlx::query_scalar::<_, i64>("SELECT 1 FROM patients WHERE id = ?")
            .bind(patient_id)
            .fetch_optional(uow.conn())
            .await?;
        if patient.is_none() {
            return Err(StoreError::not_found("Patient", patient_id));
        }
        let Some(helper_name) = helper_directory::display_name(uow.conn(), helper).await? else {
            return Err(StoreError::not_found("Helper", helper.id()));
        };

        let active = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM assignments
             WHERE patient_id = ? AND helper_type = ? AND status = 'active'",
        )
        .bind(patient_id)
        .bind(kind.as_str())
        .fetch_optional(uow.conn())
        .await?;
        if let Some(existing) = active {
            uow.rollback().await?;
            tracing::warn!(
                patient_id = %patient_id,
                helper_type = %kind,
                existing = %existing,
                "Patient already has an active helper of this type"
            );
            return Err(duplicate_active(kind));
        }

        let id = Uuid::new_v4();
        let assigned_date = Local::now().date_naive();
        sqlx::query(
            "INSERT INTO assignments (id, patient_id, helper_id, helper_type, assigned_date, status)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(patient_id)
        .bind(helper.id())
        .bind(kind.as_str())
        .bind(assigned_date)
        .bind(AssignmentStatus::Active.as_str())
        .execute(uow.conn())
        .await
        .map_err(|e| match e {
            // a concurrent creator won the race for the partial unique index
            sqlx::Error::Database(db) if db.is_unique_violation() => duplicate_active(kind),
            other => StoreError::Database(other),
        })?;

        uow.commit().await?;
        tracing::info!(
            assignment_id = %id,
            patient_id = %patient_id,
            helper_type = %kind,
            helper = %helper_name,
            "Helper assigned"
        );
        Ok(CreatedAssignment { id, assigned_date })
    }

    /// Mark an assignment inactive.
    ///
    /// Returns whether a row changed; an unknown or already inactive id is
    /// not an error.
    pub async fn remove(&self, assignment_id: Uuid) -> Result<bool, StoreError> {
        let changed = sqlx::query(
            "UPDATE assignments SET status = 'inactive' WHERE id = ? AND status = 'active'",
        )
        .bind(assignment_id)
        .execute(&*self.pool)
        .await?
        .rows_affected();

        if changed == 0 {
            tracing::debug!(assignment_id = %assignment_id, "No active assignment to remove");
        } else {
            tracing::info!(assignment_id = %assignment_id, "Assignment deactivated");
        }
        Ok(changed > 0)
    }
}

fn duplicate_active(kind: HelperKind) -> StoreError {
    StoreError::Conflict(format!(
        "Patient already has an active helper of type {kind}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{file_pool, memory_pool};
    use crate::db::{HelperDirectory, PatientRepository};
    use crate::models::{PatientFields, PatientInput};

    struct Fixture {
        pool: Arc<SqlitePool>,
        registry: AssignmentRegistry,
        patient_id: Uuid,
        helpers: HelperDirectory,
    }

    async fn setup() -> Fixture {
        let pool = Arc::new(memory_pool().await);
        let patient_id = PatientRepository::new(pool.clone())
            .create(PatientInput {
                patient: PatientFields {
                    name: "Jane Doe".to_string(),
                    phone_number: Some("5551234".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
            .unwrap();

        Fixture {
            registry: AssignmentRegistry::new(pool.clone()),
            helpers: HelperDirectory::new(pool.clone()),
            pool,
            patient_id,
        }
    }

    async fn status_of(pool: &SqlitePool, id: Uuid) -> String {
        sqlx::query_scalar("SELECT status FROM assignments WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_list_resolves_names() {
        let fx = setup().await;
        let volunteer = fx
            .helpers
            .register(HelperKind::Volunteer, "Vera Volunteer", None, None)
            .await
            .unwrap();
        let professional = fx
            .helpers
            .register(HelperKind::MedicalProfessional, "Dr. Patel", None, None)
            .await
            .unwrap();

        let created = fx.registry.create(fx.patient_id, volunteer).await.unwrap();
        assert_eq!(created.assigned_date, Local::now().date_naive());
        fx.registry.create(fx.patient_id, professional).await.unwrap();

        let listed = fx.registry.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|a| a.patient_name == "Jane Doe"));

        let names: Vec<_> = listed.iter().filter_map(|a| a.helper_name.clone()).collect();
        assert!(names.contains(&"Vera Volunteer".to_string()));
        assert!(names.contains(&"Dr. Patel".to_string()));
    }

    #[tokio::test]
    async fn second_active_helper_of_same_kind_conflicts() {
        let fx = setup().await;
        let first = fx
            .helpers
            .register(HelperKind::Volunteer, "V1", None, None)
            .await
            .unwrap();
        let second = fx
            .helpers
            .register(HelperKind::Volunteer, "V2", None, None)
            .await
            .unwrap();

        let created = fx.registry.create(fx.patient_id, first).await.unwrap();
        let result = fx.registry.create(fx.patient_id, second).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));

        let listed = fx.registry.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].helper_id, first.id());
        assert_eq!(listed[0].status, AssignmentStatus::Active);
    }

    #[tokio::test]
    async fn different_kinds_can_be_active_together() {
        let fx = setup().await;
        for kind in HelperKind::ALL {
            let helper = fx.helpers.register(kind, "Helper", None, None).await.unwrap();
            fx.registry.create(fx.patient_id, helper).await.unwrap();
        }
        assert_eq!(fx.registry.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn removal_is_soft_and_allows_reassignment() {
        let fx = setup().await;
        let first = fx
            .helpers
            .register(HelperKind::Caregiver, "C1", None, None)
            .await
            .unwrap();
        let second = fx
            .helpers
            .register(HelperKind::Caregiver, "C2", None, None)
            .await
            .unwrap();

        let created = fx.registry.create(fx.patient_id, first).await.unwrap();
        assert!(fx.registry.remove(created.id).await.unwrap());
        assert_eq!(status_of(&fx.pool, created.id).await, "inactive");
        assert!(fx.registry.list().await.unwrap().is_empty());

        fx.registry.create(fx.patient_id, second).await.unwrap();
        let listed = fx.registry.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].helper_id, second.id());
        assert_eq!(status_of(&fx.pool, created.id).await, "inactive");
    }

    #[tokio::test]
    async fn removing_unknown_id_changes_nothing() {
        let fx = setup().await;
        let helper = fx
            .helpers
            .register(HelperKind::Volunteer, "V1", None, None)
            .await
            .unwrap();
        let created = fx.registry.create(fx.patient_id, helper).await.unwrap();

        assert!(!fx.registry.remove(Uuid::new_v4()).await.unwrap());
        assert_eq!(status_of(&fx.pool, created.id).await, "active");
    }

    #[tokio::test]
    async fn unknown_patient_or_helper_is_not_found() {
        let fx = setup().await;
        let helper = fx
            .helpers
            .register(HelperKind::Volunteer, "V1", None, None)
            .await
            .unwrap();

        let result = fx.registry.create(Uuid::new_v4(), helper).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));

        let result = fx
            .registry
            .create(fx.patient_id, HelperRef::Caregiver(helper.id()))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn request_validation_checks_presence_and_kind() {
        let fx = setup().await;
        let missing = AssignmentRequest {
            patient_id: Some(fx.patient_id),
            helper_id: None,
            helper_type: Some("volunteer".to_string()),
        };
        assert!(matches!(
            fx.registry.create_from_request(missing).await,
            Err(StoreError::InvalidInput(_))
        ));

        let bad_kind = AssignmentRequest {
            patient_id: Some(fx.patient_id),
            helper_id: Some(Uuid::new_v4()),
            helper_type: Some("nurse".to_string()),
        };
        assert!(matches!(
            fx.registry.create_from_request(bad_kind).await,
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn unique_index_rejects_a_second_active_row() {
        let fx = setup().await;
        let helper = fx
            .helpers
            .register(HelperKind::Volunteer, "V1", None, None)
            .await
            .unwrap();
        fx.registry.create(fx.patient_id, helper).await.unwrap();

        let raw = sqlx::query(
            "INSERT INTO assignments (id, patient_id, helper_id, helper_type, assigned_date, status)
             VALUES (?, ?, ?, 'volunteer', '2024-01-01', 'active')",
        )
        .bind(Uuid::new_v4())
        .bind(fx.patient_id)
        .bind(helper.id())
        .execute(&*fx.pool)
        .await;
        assert!(raw.is_err());
    }

    #[tokio::test]
    async fn deleting_patient_closes_its_assignments() {
        let fx = setup().await;
        let helper = fx
            .helpers
            .register(HelperKind::Volunteer, "V1", None, None)
            .await
            .unwrap();
        let created = fx.registry.create(fx.patient_id, helper).await.unwrap();

        PatientRepository::new(fx.pool.clone())
            .delete(fx.patient_id)
            .await
            .unwrap();

        assert_eq!(status_of(&fx.pool, created.id).await, "inactive");
        assert!(fx.registry.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_yield_one_assignment_and_conflicts() {
        let (_dir, pool) = file_pool().await;
        let pool = Arc::new(pool);
        let patient_id = PatientRepository::new(pool.clone())
            .create(PatientInput {
                patient: PatientFields {
                    name: "Jane Doe".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .await
            .unwrap();

        let directory = HelperDirectory::new(pool.clone());
        let mut volunteers = Vec::new();
        for i in 0..8 {
            volunteers.push(
                directory
                    .register(HelperKind::Volunteer, &format!("V{i}"), None, None)
                    .await
                    .unwrap(),
            );
        }

        let tasks: Vec<_> = volunteers
            .into_iter()
            .map(|helper| {
                let registry = AssignmentRegistry::new(pool.clone());
                tokio::spawn(async move { registry.create(patient_id, helper).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(created, 1);

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM assignments WHERE patient_id = ? AND status = 'active'",
        )
        .bind(patient_id)
        .fetch_one(&*pool)
        .await
        .unwrap();
        assert_eq!(active, 1);
    }
}
