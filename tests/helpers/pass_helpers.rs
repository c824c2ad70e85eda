use gatepass::database::Database;
use gatepass::models::{Pass, PassStatus, User};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// RFC3339 timestamp at an offset from now, in minutes.
pub fn stamp(offset_minutes: i64) -> String {
    (OffsetDateTime::now_utc() + Duration::minutes(offset_minutes))
        .format(&Rfc3339)
        .unwrap()
}

pub async fn seed_pass(
    db: &Database,
    owner: &User,
    status: PassStatus,
    from_mins: i64,
    to_mins: i64,
) -> Pass {
    seed_pass_created_at(db, owner, status, from_mins, to_mins, 0).await
}

pub async fn seed_pass_created_at(
    db: &Database,
    owner: &User,
    status: PassStatus,
    from_mins: i64,
    to_mins: i64,
    created_offset_mins: i64,
) -> Pass {
    let created = stamp(created_offset_mins);
    let pass = Pass {
        id: Uuid::new_v4().to_string(),
        user_id: owner.id.clone(),
        pass_type: "outing".to_string(),
        purpose: Some("weekend outing".to_string()),
        valid_from: stamp(from_mins),
        valid_to: stamp(to_mins),
        barcode: Uuid::new_v4().simple().to_string(),
        status,
        rejection_reason: None,
        exit_time: None,
        entry_time: None,
        created_at: created.clone(),
        updated_at: created,
        version: 0,
    };
    db.create_pass(&pass).await.expect("Failed to seed pass");
    pass
}

/// A pass that has already completed its exit scan.
pub async fn seed_exited_pass(
    db: &Database,
    owner: &User,
    from_mins: i64,
    to_mins: i64,
) -> Pass {
    let pass = seed_pass(db, owner, PassStatus::Active, from_mins, to_mins).await;
    db.mark_exit(&pass.id, pass.version, &stamp(from_mins))
        .await
        .expect("Failed to mark exit")
}
