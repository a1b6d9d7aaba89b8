pub mod courses;
pub mod explanations;
pub mod migrations;
pub mod pods;
pub mod pool;
pub mod presence;
pub mod swipes;
pub mod users;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use courses::{CourseRecord, CourseStorageError, get_course, upsert_course};
pub use explanations::{
    ExplanationStorageError, explanation_cache_key, fetch_explanation, store_explanation,
};
pub use migrations::{MigrationError, run_migrations};
pub use pods::{
    PodRecord, PodStorageError, add_pod_member, create_pod, find_pod_for_user, set_hub_link,
};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked};
pub use presence::{PresenceStorageError, last_seen_for_course, record_heartbeat};
pub use swipes::{
    SwipeDecision, SwipeStorageError, decided_user_ids, has_accepted, mutual_accepts, upsert_swipe,
};
pub use users::{
    ProfileUpdate, UserRecord, UserStorageError, add_course_to_user, create_user, get_user,
    list_course_members, upsert_profile, user_course_codes,
};
