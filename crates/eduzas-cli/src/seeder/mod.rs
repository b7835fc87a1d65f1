//! Development data seeding.
//!
//! Every seeded account uses an email under [`SEED_EMAIL_DOMAIN`], which is
//! how [`clear_all`] tells seeded rows apart from real ones. All seeded users
//! share the password [`SEED_PASSWORD`], hashed once per run.

pub mod classes;
pub mod models;
pub mod users;

use eduzas_auth::Role;
use eduzas_core::hash_password;
use sqlx::PgPool;
use std::time::Instant;

pub use models::{ClassSeed, SeedConfig, UserSeed};

pub const SEED_EMAIL_DOMAIN: &str = "seed.eduzas.app";
pub const SEED_PASSWORD: &str = "password123";

pub async fn seed_all(db: &PgPool, config: SeedConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🌱 Seeding database...");

    let password_hash = hash_password(SEED_PASSWORD)
        .map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let professor_ids =
        users::seed_users(db, Role::Professor, config.professors, &password_hash).await?;
    let student_ids =
        users::seed_users(db, Role::Student, config.students, &password_hash).await?;

    if professor_ids.is_empty() {
        println!("   ⚠ No professors, skipping classes");
    } else {
        let class_codes = classes::seed_classes(db, &professor_ids, config.classes).await?;
        classes::seed_enrollments(db, &class_codes, &student_ids, config.students_per_class)
            .await?;
    }

    println!("\n✅ Seeding finished in {:?}", start_time.elapsed());
    println!("   Password for every seeded user: {}", SEED_PASSWORD);
    Ok(())
}

pub async fn clear_all(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let pattern = format!("%@{}", SEED_EMAIL_DOMAIN);

    classes::clear_classes(db, &pattern).await?;
    users::clear_users(db).await?;

    println!("\n✅ Seeded data cleared in {:?}", start_time.elapsed());
    Ok(())
}
