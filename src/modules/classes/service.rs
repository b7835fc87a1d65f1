use anyhow::anyhow;
use eduzas_auth::Role;
use eduzas_auth::policy::{
    ClassAccess, SearchScope, can_create_content, can_manage_class, can_moderate_class,
    can_unenroll, can_view_class, scope_for,
};
use eduzas_core::{AppError, Paginated, PaginationParams};
use eduzas_db::{Filters, fetch_page};
use eduzas_models::HexColor;
use eduzas_models::classes::{
    AddProfessorDto, CLASS_CODE_ALPHABET, CLASS_CODE_LEN, Class, ClassCriteria, ClassProfessor,
    CreateClassDto, EnrollStudentDto, Enrollment, UpdateClassDto,
};
use eduzas_models::users::{USER_COLUMNS, User};
use rand::Rng;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics::{track_class_created, track_enrollment};
use crate::modules::users::service::UserService;
use crate::utils::db::{conflict_on_unique, map_insert_error};

const MAX_CODE_ATTEMPTS: usize = 5;

const STUDENT_IN_CLASS: &str =
    "EXISTS (SELECT 1 FROM class_students cs WHERE cs.class_id = c.id AND cs.student_id = ";
const VISIBLE_STUDENT_IN_CLASS: &str = "EXISTS (SELECT 1 FROM class_students cs \
     WHERE cs.class_id = c.id AND NOT cs.hidden AND cs.student_id = ";
const PROFESSOR_IN_CLASS: &str = "EXISTS (SELECT 1 FROM class_professors cp \
     WHERE cp.class_id = c.id AND cp.professor_id = ";

pub struct ClassService;

fn generate_class_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CLASS_CODE_LEN)
        .map(|_| CLASS_CODE_ALPHABET[rng.gen_range(0..CLASS_CODE_ALPHABET.len())] as char)
        .collect()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Looks up how `user_id` relates to the class. 404 when the class is missing.
#[instrument(skip(db))]
pub async fn class_access(db: &PgPool, class_id: &str, user_id: Uuid) -> Result<ClassAccess, AppError> {
    let (is_professor, is_owner, is_enrolled): (bool, bool, bool) = sqlx::query_as(
        "SELECT
             EXISTS (SELECT 1 FROM class_professors WHERE class_id = c.id AND professor_id = $2),
             EXISTS (SELECT 1 FROM class_professors WHERE class_id = c.id AND professor_id = $2 AND is_owner),
             EXISTS (SELECT 1 FROM class_students WHERE class_id = c.id AND student_id = $2)
         FROM classes c
         WHERE c.id = $1",
    )
    .bind(class_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))?;

    Ok(ClassAccess {
        is_professor,
        is_owner,
        is_enrolled,
    })
}

impl ClassService {
    async fn fetch_class(db: &PgPool, id: &str) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))
    }

    /// Creates a class owned by the caller, or by `owner_id` when an admin
    /// creates it.
    #[instrument(skip(db, dto), fields(class_name = %dto.class_name))]
    pub async fn create_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        dto: CreateClassDto,
    ) -> Result<Class, AppError> {
        if !can_create_content(caller_role) {
            return Err(AppError::forbidden("Only professors and admins can create classes"));
        }

        let owner_id = if caller_role.is_admin() {
            let owner_id = dto.owner_id.ok_or_else(|| {
                AppError::bad_request(anyhow!("owner_id is required when an admin creates a class"))
            })?;
            UserService::ensure_role(db, owner_id, Role::Professor).await?;
            owner_id
        } else {
            caller_id
        };

        let color = dto.color.unwrap_or_default();
        let mut tx = db.begin().await?;

        let mut created = None;
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_class_code();
            created = sqlx::query_as::<_, Class>(
                "INSERT INTO classes (id, class_name, subject, section, color)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO NOTHING
                 RETURNING *",
            )
            .bind(&code)
            .bind(dto.class_name.trim())
            .bind(trimmed(dto.subject.clone()))
            .bind(trimmed(dto.section.clone()))
            .bind(&color)
            .fetch_optional(&mut *tx)
            .await?;

            if created.is_some() {
                break;
            }
            warn!(attempt, code = %code, "Class code collision");
        }

        let class = created.ok_or_else(|| {
            AppError::internal_error("Could not generate a unique class code")
        })?;

        sqlx::query(
            "INSERT INTO class_professors (class_id, professor_id, is_owner) VALUES ($1, $2, TRUE)",
        )
        .bind(&class.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        track_class_created();
        info!(class_id = %class.id, owner_id = %owner_id, "Class created");
        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn search_classes(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        criteria: ClassCriteria,
    ) -> Result<Paginated<Class>, AppError> {
        let mut filters = Filters::new();
        filters
            .where_string_query("c.class_name", criteria.class_name.as_ref())
            .where_string_query("c.subject", criteria.subject.as_ref())
            .where_string_query("c.section", criteria.section.as_ref())
            .where_optional("c.active", criteria.active);

        match scope_for(caller_role, caller_id) {
            SearchScope::Student(student_id) => {
                let enrolled = if criteria.include_hidden {
                    STUDENT_IN_CLASS
                } else {
                    VISIBLE_STUDENT_IN_CLASS
                };
                filters
                    .where_bound(enrolled, student_id, ")")
                    .where_bound_optional(PROFESSOR_IN_CLASS, criteria.with_professor, ")");
            }
            SearchScope::Professor(professor_id) => {
                filters
                    .where_bound(PROFESSOR_IN_CLASS, professor_id, ")")
                    .where_bound_optional(STUDENT_IN_CLASS, criteria.with_student, ")");
            }
            SearchScope::Everything => {
                filters
                    .where_bound_optional(STUDENT_IN_CLASS, criteria.with_student, ")")
                    .where_bound_optional(PROFESSOR_IN_CLASS, criteria.with_professor, ")");
            }
        }

        let page = fetch_page::<Class>(
            db,
            "SELECT c.* FROM classes c",
            "SELECT COUNT(*) FROM classes c",
            &filters,
            "c.created_at DESC, c.id",
            &criteria.pagination,
        )
        .await?;

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn get_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: &str,
    ) -> Result<Class, AppError> {
        let access = class_access(db, id, caller_id).await?;
        if !can_view_class(caller_role, access) {
            return Err(AppError::forbidden("You are not a member of this class"));
        }
        Self::fetch_class(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn update_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: &str,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        let access = class_access(db, id, caller_id).await?;
        if !can_manage_class(caller_role, access) {
            return Err(AppError::forbidden("Only an owner of the class can update it"));
        }

        let class = Self::fetch_class(db, id).await?;
        let class_name = dto
            .class_name
            .map(|v| v.trim().to_string())
            .unwrap_or(class.class_name);
        let subject = match dto.subject {
            Some(value) => trimmed(value),
            None => class.subject,
        };
        let section = match dto.section {
            Some(value) => trimmed(value),
            None => class.section,
        };
        let color: HexColor = dto.color.unwrap_or(class.color);
        let active = dto.active.unwrap_or(class.active);

        let class = sqlx::query_as::<_, Class>(
            "UPDATE classes
             SET class_name = $1, subject = $2, section = $3, color = $4, active = $5,
                 modified_at = NOW()
             WHERE id = $6
             RETURNING *",
        )
        .bind(&class_name)
        .bind(&subject)
        .bind(&section)
        .bind(&color)
        .bind(active)
        .bind(id)
        .fetch_one(db)
        .await?;

        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn delete_class(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        id: &str,
    ) -> Result<(), AppError> {
        let access = class_access(db, id, caller_id).await?;
        if !can_manage_class(caller_role, access) {
            return Err(AppError::forbidden("Only an owner of the class can delete it"));
        }

        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        info!(class_id = %id, "Class deleted");
        Ok(())
    }

    /// Students enroll themselves; admins enroll `dto.student_id`.
    #[instrument(skip(db))]
    pub async fn enroll_student(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
        dto: EnrollStudentDto,
    ) -> Result<Enrollment, AppError> {
        let student_id = match caller_role {
            Role::Student => caller_id,
            Role::Admin => dto.student_id.ok_or_else(|| {
                AppError::bad_request(anyhow!("student_id is required when an admin enrolls"))
            })?,
            Role::Professor => {
                return Err(AppError::forbidden("Professors cannot enroll in classes"));
            }
        };

        let class = Self::fetch_class(db, class_id).await?;
        if !class.active {
            return Err(AppError::bad_request(anyhow!("Class is not active")));
        }

        if caller_role.is_admin() {
            UserService::ensure_role(db, student_id, Role::Student).await?;
        }

        let enrollment = sqlx::query_as::<_, Enrollment>(
            "INSERT INTO class_students (class_id, student_id)
             VALUES ($1, $2)
             RETURNING class_id, student_id, hidden, created_at",
        )
        .bind(class_id)
        .bind(student_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            map_insert_error(e, "Student is already enrolled in this class", "User not found")
        })?;

        track_enrollment();
        info!(class_id = %class_id, student_id = %student_id, "Student enrolled");
        Ok(enrollment)
    }

    #[instrument(skip(db))]
    pub async fn unenroll_student(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
        student_id: Uuid,
    ) -> Result<(), AppError> {
        let access = class_access(db, class_id, caller_id).await?;
        if !can_unenroll(caller_role, caller_id, student_id, access) {
            return Err(AppError::forbidden("You cannot remove this student from the class"));
        }

        let result = sqlx::query("DELETE FROM class_students WHERE class_id = $1 AND student_id = $2")
            .bind(class_id)
            .bind(student_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Student is not enrolled in this class")));
        }

        info!(class_id = %class_id, student_id = %student_id, "Student unenrolled");
        Ok(())
    }

    /// Hides or shows the class in the student's own listing.
    #[instrument(skip(db))]
    pub async fn set_hidden(
        db: &PgPool,
        student_id: Uuid,
        class_id: &str,
        hidden: bool,
    ) -> Result<Enrollment, AppError> {
        sqlx::query_as::<_, Enrollment>(
            "UPDATE class_students SET hidden = $1
             WHERE class_id = $2 AND student_id = $3
             RETURNING class_id, student_id, hidden, created_at",
        )
        .bind(hidden)
        .bind(class_id)
        .bind(student_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("You are not enrolled in this class")))
    }

    #[instrument(skip(db))]
    pub async fn list_students(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
        pagination: PaginationParams,
    ) -> Result<Paginated<User>, AppError> {
        let access = class_access(db, class_id, caller_id).await?;
        if !can_moderate_class(caller_role, access) {
            return Err(AppError::forbidden("Only professors of the class can list its students"));
        }

        let mut filters = Filters::new();
        filters.where_bound("cs.class_id = ", class_id, "");

        let page = fetch_page::<User>(
            db,
            &format!(
                "SELECT {} FROM users u JOIN class_students cs ON cs.student_id = u.id",
                USER_COLUMNS
            ),
            "SELECT COUNT(*) FROM users u JOIN class_students cs ON cs.student_id = u.id",
            &filters,
            "u.father_lastname, u.first_name, u.id",
            &pagination,
        )
        .await?;

        Ok(page)
    }

    #[instrument(skip(db))]
    pub async fn add_professor(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
        dto: AddProfessorDto,
    ) -> Result<ClassProfessor, AppError> {
        let access = class_access(db, class_id, caller_id).await?;
        if !can_manage_class(caller_role, access) {
            return Err(AppError::forbidden("Only an owner of the class can add professors"));
        }

        UserService::ensure_role(db, dto.professor_id, Role::Professor).await?;

        sqlx::query(
            "INSERT INTO class_professors (class_id, professor_id, is_owner) VALUES ($1, $2, $3)",
        )
        .bind(class_id)
        .bind(dto.professor_id)
        .bind(dto.is_owner)
        .execute(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Professor already teaches this class"))?;

        let professor = sqlx::query_as::<_, ClassProfessor>(&format!(
            "SELECT {}, cp.is_owner
             FROM class_professors cp
             JOIN users u ON u.id = cp.professor_id
             WHERE cp.class_id = $1 AND cp.professor_id = $2",
            USER_COLUMNS
        ))
        .bind(class_id)
        .bind(dto.professor_id)
        .fetch_one(db)
        .await?;

        info!(class_id = %class_id, professor_id = %dto.professor_id, is_owner = dto.is_owner, "Professor added to class");
        Ok(professor)
    }

    /// A class always keeps at least one owner.
    #[instrument(skip(db))]
    pub async fn remove_professor(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
        professor_id: Uuid,
    ) -> Result<(), AppError> {
        let access = class_access(db, class_id, caller_id).await?;
        if !can_manage_class(caller_role, access) {
            return Err(AppError::forbidden("Only an owner of the class can remove professors"));
        }

        let mut tx = db.begin().await?;

        let owners: Vec<Uuid> = sqlx::query_scalar(
            "SELECT professor_id FROM class_professors
             WHERE class_id = $1 AND is_owner
             FOR UPDATE",
        )
        .bind(class_id)
        .fetch_all(&mut *tx)
        .await?;

        if owners.len() == 1 && owners[0] == professor_id {
            return Err(AppError::bad_request(anyhow!(
                "Cannot remove the last owner of a class"
            )));
        }

        let result =
            sqlx::query("DELETE FROM class_professors WHERE class_id = $1 AND professor_id = $2")
                .bind(class_id)
                .bind(professor_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Professor does not teach this class")));
        }

        tx.commit().await?;

        info!(class_id = %class_id, professor_id = %professor_id, "Professor removed from class");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_professors(
        db: &PgPool,
        caller_id: Uuid,
        caller_role: Role,
        class_id: &str,
    ) -> Result<Vec<ClassProfessor>, AppError> {
        let access = class_access(db, class_id, caller_id).await?;
        if !can_view_class(caller_role, access) {
            return Err(AppError::forbidden("You are not a member of this class"));
        }

        let professors = sqlx::query_as::<_, ClassProfessor>(&format!(
            "SELECT {}, cp.is_owner
             FROM class_professors cp
             JOIN users u ON u.id = cp.professor_id
             WHERE cp.class_id = $1
             ORDER BY cp.is_owner DESC, u.father_lastname, u.first_name",
            USER_COLUMNS
        ))
        .bind(class_id)
        .fetch_all(db)
        .await?;

        Ok(professors)
    }
}
