//! Fake professors and students.

use eduzas_auth::Role;
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use super::SEED_EMAIL_DOMAIN;
use super::models::UserSeed;

// 6 params per user
const BATCH_SIZE: usize = 1000;

fn email_part(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

/// Generates `count` users of `role`. The index keeps emails unique.
pub fn generate_users(role: Role, count: usize, password_hash: &str) -> Vec<UserSeed> {
    let prefix = role.as_str().to_lowercase();
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let father_lastname: String = LastName().fake();
            let mother_lastname = (idx % 2 == 0).then(|| LastName().fake::<String>());
            let email = format!(
                "{}.{}+{}{}@{}",
                email_part(&first_name),
                email_part(&father_lastname),
                prefix,
                idx,
                SEED_EMAIL_DOMAIN
            );

            UserSeed {
                first_name,
                father_lastname,
                mother_lastname,
                email,
                password_hash: password_hash.to_string(),
                role,
            }
        })
        .collect()
}

pub async fn seed_users(
    db: &PgPool,
    role: Role,
    count: usize,
    password_hash: &str,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("👥 Seeding {} {} users...", count, role);

    let users = generate_users(role, count, password_hash);
    let ids = insert_users_batch(db, &users).await?;

    println!("   ✓ Inserted {} users in {:?}", ids.len(), start_time.elapsed());
    Ok(ids)
}

/// Inserts users in batches. Emails that already exist are skipped.
pub async fn insert_users_batch(
    db: &PgPool,
    users: &[UserSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;
    let mut ids = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        ids.extend(insert_users_chunk(&mut tx, chunk).await?);
    }

    tx.commit().await?;
    Ok(ids)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from(
        "INSERT INTO users (first_name, father_lastname, mother_lastname, email, password, role) VALUES ",
    );
    for i in 0..users.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 6;
        query.push_str(&format!(
            "(${}, ${}, ${}, ${}, ${}, ${})",
            p + 1,
            p + 2,
            p + 3,
            p + 4,
            p + 5,
            p + 6
        ));
    }
    query.push_str(" ON CONFLICT (email) DO NOTHING RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for user in users {
        q = q
            .bind(&user.first_name)
            .bind(&user.father_lastname)
            .bind(&user.mother_lastname)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role);
    }

    let ids: Vec<Uuid> = q.fetch_all(&mut **tx).await?;
    Ok(ids)
}

pub async fn clear_users(db: &PgPool) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded users...");

    let deleted = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(format!("%@{}", SEED_EMAIL_DOMAIN))
        .execute(db)
        .await?
        .rows_affected();

    println!("   ✓ Deleted {} users in {:?}", deleted, start_time.elapsed());
    Ok(deleted)
}
