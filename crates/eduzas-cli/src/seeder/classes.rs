//! Fake classes, owners and enrollments.

use eduzas_models::classes::{CLASS_CODE_ALPHABET, CLASS_CODE_LEN};
use rand::Rng;
use rand::seq::SliceRandom;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashSet;
use std::time::Instant;
use uuid::Uuid;

use super::models::ClassSeed;

const SUBJECTS: &[&str] = &[
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "History",
    "Literature",
    "Programming",
    "Economics",
];

const SECTIONS: &[&str] = &["A", "B", "C", "D"];

// 4 params per class
const CLASS_BATCH_SIZE: usize = 1000;
// 2 params per enrollment
const ENROLLMENT_BATCH_SIZE: usize = 5000;

fn class_code(rng: &mut impl Rng) -> String {
    (0..CLASS_CODE_LEN)
        .map(|_| CLASS_CODE_ALPHABET[rng.gen_range(0..CLASS_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generates classes owned by random professors, with distinct codes.
pub fn generate_classes(professor_ids: &[Uuid], count: usize) -> Vec<ClassSeed> {
    let mut rng = rand::thread_rng();
    let mut codes = HashSet::with_capacity(count);
    let mut classes = Vec::with_capacity(count);

    while classes.len() < count {
        let Some(&owner_id) = professor_ids.choose(&mut rng) else {
            break;
        };
        let code = class_code(&mut rng);
        if !codes.insert(code.clone()) {
            continue;
        }
        let subject = SUBJECTS[rng.gen_range(0..SUBJECTS.len())];
        let section = SECTIONS[rng.gen_range(0..SECTIONS.len())];
        classes.push(ClassSeed {
            class_name: format!("{} {}", subject, classes.len() + 1),
            subject: subject.to_string(),
            section: section.to_string(),
            code,
            owner_id,
        });
    }

    classes
}

/// Picks `per_class` distinct students for every class.
pub fn generate_enrollments(
    class_codes: &[String],
    student_ids: &[Uuid],
    per_class: usize,
) -> Vec<(String, Uuid)> {
    let mut rng = rand::thread_rng();
    class_codes
        .iter()
        .flat_map(|code| {
            student_ids
                .choose_multiple(&mut rng, per_class)
                .map(|&student_id| (code.clone(), student_id))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn seed_classes(
    db: &PgPool,
    professor_ids: &[Uuid],
    count: usize,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🏫 Seeding {} classes...", count);

    let classes = generate_classes(professor_ids, count);
    let mut tx = db.begin().await?;
    let mut codes = Vec::with_capacity(classes.len());

    for chunk in classes.chunks(CLASS_BATCH_SIZE) {
        codes.extend(insert_classes_chunk(&mut tx, chunk).await?);
    }

    tx.commit().await?;
    println!("   ✓ Inserted {} classes in {:?}", codes.len(), start_time.elapsed());
    Ok(codes)
}

async fn insert_classes_chunk(
    tx: &mut Transaction<'_, Postgres>,
    classes: &[ClassSeed],
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if classes.is_empty() {
        return Ok(Vec::new());
    }

    let mut query =
        String::from("INSERT INTO classes (id, class_name, subject, section) VALUES ");
    for i in 0..classes.len() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 4;
        query.push_str(&format!("(${}, ${}, ${}, ${})", p + 1, p + 2, p + 3, p + 4));
    }
    query.push_str(" ON CONFLICT (id) DO NOTHING RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for class in classes {
        q = q
            .bind(&class.code)
            .bind(&class.class_name)
            .bind(&class.subject)
            .bind(&class.section);
    }
    let inserted: Vec<String> = q.fetch_all(&mut **tx).await?;

    // Codes already taken by real classes are skipped, and so are their owners.
    let inserted_set: HashSet<&str> = inserted.iter().map(String::as_str).collect();
    let (codes, owners): (Vec<String>, Vec<Uuid>) = classes
        .iter()
        .filter(|class| inserted_set.contains(class.code.as_str()))
        .map(|class| (class.code.clone(), class.owner_id))
        .unzip();

    sqlx::query(
        "INSERT INTO class_professors (class_id, professor_id, is_owner)
         SELECT class_id, professor_id, TRUE
         FROM UNNEST($1::text[], $2::uuid[]) AS t(class_id, professor_id)",
    )
    .bind(&codes)
    .bind(&owners)
    .execute(&mut **tx)
    .await?;

    Ok(inserted)
}

pub async fn seed_enrollments(
    db: &PgPool,
    class_codes: &[String],
    student_ids: &[Uuid],
    per_class: usize,
) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let enrollments = generate_enrollments(class_codes, student_ids, per_class);
    println!("🎓 Enrolling {} students...", enrollments.len());

    let mut tx = db.begin().await?;
    let mut total = 0;

    for chunk in enrollments.chunks(ENROLLMENT_BATCH_SIZE) {
        let (codes, students): (Vec<String>, Vec<Uuid>) = chunk.iter().cloned().unzip();
        total += sqlx::query(
            "INSERT INTO class_students (class_id, student_id)
             SELECT * FROM UNNEST($1::text[], $2::uuid[])
             ON CONFLICT DO NOTHING",
        )
        .bind(&codes)
        .bind(&students)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    println!("   ✓ Created {} enrollments in {:?}", total, start_time.elapsed());
    Ok(total)
}

/// Deletes classes owned by seeded professors. Must run before the users go.
pub async fn clear_classes(db: &PgPool, email_pattern: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded classes...");

    let deleted = sqlx::query(
        "DELETE FROM classes c
         WHERE EXISTS (
             SELECT 1 FROM class_professors cp
             JOIN users u ON u.id = cp.professor_id
             WHERE cp.class_id = c.id AND cp.is_owner AND u.email LIKE $1
         )",
    )
    .bind(email_pattern)
    .execute(db)
    .await?
    .rows_affected();

    println!("   ✓ Deleted {} classes in {:?}", deleted, start_time.elapsed());
    Ok(deleted)
}
