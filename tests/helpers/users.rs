use gatepass::database::Database;
use gatepass::models::{Role, User};
use uuid::Uuid;

pub async fn create_user(db: &Database, name: &str, role: Role) -> User {
    let email = format!("{}@campus.test", Uuid::new_v4());
    let user = User::new(name.to_string(), email, role);
    db.create_user(&user).await.expect("Failed to create user");
    user
}

/// A student with their parent already linked.
pub async fn create_linked_family(db: &Database) -> (User, User) {
    let parent = create_user(db, "Priya Kumar", Role::Parent).await;
    let student = create_user(db, "Arjun Kumar", Role::Student).await;

    let now = chrono::Utc::now().to_rfc3339();
    let student = db
        .link_parent(&student.id, &parent.id, &now)
        .await
        .expect("Failed to link parent");

    (student, parent)
}
