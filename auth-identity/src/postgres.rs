//! PostgreSQL-backed identity storage
//!
//! Schema lives in `database-layer/migrations`. Email uniqueness is the
//! `identities_email_key` unique index on `lower(email)`; extensions cascade
//! with their identity.

use crate::error::{IdentityError, Result};
use crate::models::{
    Availability, DoctorProfile, Identity, NurseProfile, PatientProfile, Role, RoleExtension,
    RoleProfile, WorkingHours,
};
use crate::repository::IdentityRepository;
use async_trait::async_trait;
use database_layer::{DatabasePool, TransactionManager};
use sqlx::{postgres::PgRow, Executor, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

pub struct PgIdentityRepository {
    pool: DatabasePool,
    transactions: TransactionManager,
}

impl PgIdentityRepository {
    #[must_use]
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            transactions: TransactionManager::new(pool.clone()),
            pool,
        }
    }

    async fn role_of(&self, identity_id: Uuid) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT role FROM identities WHERE id = $1")
            .bind(identity_id)
            .fetch_optional(self.pool.pool())
            .await?;

        row.map(|row| -> Result<Role> {
            let role: String = row.try_get("role")?;
            role.parse().map_err(stored_role)
        })
        .transpose()
    }
}

#[async_trait]
impl IdentityRepository for PgIdentityRepository {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, age, password_hash, role, created_at
            FROM identities
            WHERE lower(email) = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool.pool())
        .await?;

        row.as_ref().map(identity_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, age, password_hash, role, created_at
            FROM identities
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        row.as_ref().map(identity_from_row).transpose()
    }

    async fn insert_identity(&self, identity: &Identity) -> Result<()> {
        write_identity(self.pool.pool(), identity).await?;
        debug!(identity_id = %identity.id, "Identity row inserted");
        Ok(())
    }

    async fn insert_extension(&self, extension: &RoleExtension) -> Result<()> {
        write_extension(self.pool.pool(), extension).await?;
        debug!(identity_id = %extension.identity_id, role = %extension.role(), "Extension row inserted");
        Ok(())
    }

    async fn find_extension(&self, identity_id: Uuid) -> Result<Option<RoleExtension>> {
        let Some(role) = self.role_of(identity_id).await? else {
            return Ok(None);
        };

        let query = match role {
            Role::Doctor => {
                r"
                SELECT identity_id, specialization, experience_years, available_days,
                       working_hours_start, working_hours_end, consultation_fee,
                       created_at, updated_at
                FROM doctor_profiles WHERE identity_id = $1
                "
            }
            Role::Nurse => {
                r"
                SELECT identity_id, department, shift, created_at, updated_at
                FROM nurse_profiles WHERE identity_id = $1
                "
            }
            Role::Patient => {
                r"
                SELECT identity_id, medical_history, allergies, blood_group, created_at, updated_at
                FROM patient_profiles WHERE identity_id = $1
                "
            }
        };

        let row = sqlx::query(query)
            .bind(identity_id)
            .fetch_optional(self.pool.pool())
            .await?;

        row.map(|row| extension_from_row(role, &row)).transpose()
    }

    async fn delete_identity(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;
        debug!(identity_id = %id, rows = result.rows_affected(), "Identity delete executed");
        Ok(())
    }

    fn supports_transactions(&self) -> bool {
        true
    }

    async fn insert_identity_with_extension(
        &self,
        identity: &Identity,
        extension: &RoleExtension,
    ) -> Result<()> {
        let mut tx = self.transactions.begin().await?;

        write_identity(&mut *tx, identity).await?;
        write_extension(&mut *tx, extension).await?;

        tx.commit().await?;

        info!(identity_id = %identity.id, role = %identity.role, "Identity and extension committed");
        Ok(())
    }
}

async fn write_identity<'e, E>(executor: E, identity: &Identity) -> Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r"
        INSERT INTO identities (id, name, email, age, password_hash, role, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(identity.id)
    .bind(&identity.name)
    .bind(&identity.email)
    .bind(identity.age)
    .bind(&identity.password_hash)
    .bind(identity.role.as_str())
    .bind(identity.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

async fn write_extension<'e, E>(executor: E, extension: &RoleExtension) -> Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    match &extension.profile {
        RoleProfile::Doctor(doctor) => {
            sqlx::query(
                r"
                INSERT INTO doctor_profiles (
                    identity_id, specialization, experience_years, available_days,
                    working_hours_start, working_hours_end, consultation_fee,
                    created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(extension.identity_id)
            .bind(&doctor.specialization)
            .bind(doctor.experience_years)
            .bind(&doctor.availability.days)
            .bind(&doctor.availability.working_hours.start)
            .bind(&doctor.availability.working_hours.end)
            .bind(doctor.consultation_fee)
            .bind(extension.created_at)
            .bind(extension.updated_at)
            .execute(executor)
            .await?;
        }
        RoleProfile::Nurse(nurse) => {
            sqlx::query(
                r"
                INSERT INTO nurse_profiles (identity_id, department, shift, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(extension.identity_id)
            .bind(&nurse.department)
            .bind(&nurse.shift)
            .bind(extension.created_at)
            .bind(extension.updated_at)
            .execute(executor)
            .await?;
        }
        RoleProfile::Patient(patient) => {
            sqlx::query(
                r"
                INSERT INTO patient_profiles (
                    identity_id, medical_history, allergies, blood_group, created_at, updated_at
                ) VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(extension.identity_id)
            .bind(&patient.medical_history)
            .bind(&patient.allergies)
            .bind(&patient.blood_group)
            .bind(extension.created_at)
            .bind(extension.updated_at)
            .execute(executor)
            .await?;
        }
    }
    Ok(())
}

fn identity_from_row(row: &PgRow) -> Result<Identity> {
    let role: String = row.try_get("role")?;
    Ok(Identity {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        age: row.try_get("age")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse().map_err(stored_role)?,
        created_at: row.try_get("created_at")?,
    })
}

fn extension_from_row(role: Role, row: &PgRow) -> Result<RoleExtension> {
    let profile = match role {
        Role::Doctor => RoleProfile::Doctor(DoctorProfile {
            specialization: row.try_get("specialization")?,
            experience_years: row.try_get("experience_years")?,
            availability: Availability {
                days: row.try_get("available_days")?,
                working_hours: WorkingHours {
                    start: row.try_get("working_hours_start")?,
                    end: row.try_get("working_hours_end")?,
                },
            },
            consultation_fee: row.try_get("consultation_fee")?,
        }),
        Role::Nurse => RoleProfile::Nurse(NurseProfile {
            department: row.try_get("department")?,
            shift: row.try_get("shift")?,
        }),
        Role::Patient => RoleProfile::Patient(PatientProfile {
            medical_history: row.try_get("medical_history")?,
            allergies: row.try_get("allergies")?,
            blood_group: row.try_get("blood_group")?,
        }),
    };

    Ok(RoleExtension {
        identity_id: row.try_get("identity_id")?,
        profile,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn stored_role(error: IdentityError) -> IdentityError {
    IdentityError::Storage(format!("unreadable role column: {error}"))
}
