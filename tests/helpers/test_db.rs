use gatepass::database::Database;

pub async fn setup_test_db() -> Database {
    // Install drivers for AnyPool (required for tests)
    sqlx::any::install_default_drivers();

    // Use file-based SQLite for tests (unique UUID per test for parallel execution)
    use uuid::Uuid;
    let temp_file = format!("test_{}.db", Uuid::new_v4());
    let db_url = format!("sqlite://{}?mode=rwc", temp_file);

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");

    setup_schema(&db).await;

    db
}

async fn setup_schema(db: &Database) {
    let pool = db.pool();

    sqlx::query(
        "CREATE TABLE users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'student' CHECK (role IN ('student', 'parent', 'warden', 'guard', 'admin')),
            parent_id TEXT REFERENCES users(id),
            device_token TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create users table");

    sqlx::query("CREATE INDEX idx_users_parent ON users(parent_id)")
        .execute(pool)
        .await
        .ok();

    sqlx::query(
        "CREATE TABLE passes (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            pass_type TEXT NOT NULL,
            purpose TEXT,
            valid_from TEXT NOT NULL,
            valid_to TEXT NOT NULL,
            barcode TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'active', 'approved_parent', 'approved_warden', 'approved', 'rejected', 'exited', 'entered')),
            rejection_reason TEXT,
            exit_time TEXT,
            entry_time TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 0
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create passes table");

    sqlx::query("CREATE INDEX idx_passes_status ON passes(status)")
        .execute(pool)
        .await
        .ok();

    sqlx::query(
        "CREATE TABLE sos_alerts (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES users(id),
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            alert_type TEXT NOT NULL DEFAULT 'manual',
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'resolved')),
            resolved_at TEXT,
            resolved_by TEXT,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create sos_alerts table");

    sqlx::query(
        "CREATE TABLE locations (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES users(id),
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            accuracy REAL,
            geofence_violation INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .expect("Failed to create locations table");
}
