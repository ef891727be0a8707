// Esquema Diesel del motor de inscripciones.
// Tablas: courses, course_versions, lessons, enrollments, progress_records,
// certificates. Ids como Text (uuid), fechas como epoch seconds (*_ts).
use diesel::allow_tables_to_appear_in_same_query;

diesel::table! {
    courses (id) {
        id -> Text,
        title -> Text,
        description -> Text,
        instructor_id -> Text,
        category_id -> Text,
        status -> Text,
        difficulty -> Text,
        current_version_id -> Nullable<Text>,
        total_enrollments -> BigInt,
        created_at_ts -> BigInt,
        updated_at_ts -> Nullable<BigInt>,
    }
}

diesel::table! {
    course_versions (id) {
        id -> Text,
        course_id -> Text,
        version_number -> Integer,
        changelog -> Nullable<Text>,
        is_active -> Bool,
        published_at_ts -> BigInt,
    }
}

diesel::table! {
    lessons (id) {
        id -> Text,
        course_version_id -> Text,
        title -> Text,
        description -> Nullable<Text>,
        content_type -> Text,
        content_url -> Nullable<Text>,
        order_index -> Integer,
        duration_minutes -> Integer,
        is_free -> Bool,
        created_at_ts -> BigInt,
    }
}

diesel::table! {
    enrollments (id) {
        id -> Text,
        student_id -> Text,
        course_id -> Text,
        course_version_id -> Text,
        status -> Text,
        progress_percentage -> Double,
        enrolled_at_ts -> BigInt,
        completed_at_ts -> Nullable<BigInt>,
        last_accessed_at_ts -> Nullable<BigInt>,
    }
}

diesel::table! {
    progress_records (id) {
        id -> Text,
        enrollment_id -> Text,
        lesson_id -> Text,
        is_completed -> Bool,
        completed_at_ts -> Nullable<BigInt>,
        time_spent_minutes -> Integer,
        last_accessed_at_ts -> BigInt,
    }
}

diesel::table! {
    certificates (id) {
        id -> Text,
        student_id -> Text,
        course_id -> Text,
        verification_id -> Text,
        issued_at_ts -> BigInt,
        certificate_url -> Nullable<Text>,
    }
}

allow_tables_to_appear_in_same_query!(courses, course_versions, lessons, enrollments, progress_records, certificates);
