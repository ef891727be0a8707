//! Implementación de persistencia para los traits `CourseRepository` y
//! `EnrollmentRepository` del motor de inscripciones. Este archivo expone el
//! módulo `schema` y reexporta el repositorio Diesel; la implementación
//! detallada está en `learn_persistence.rs`.

mod learn_persistence;
pub mod schema;

#[cfg(not(feature = "pg"))]
pub use learn_persistence::new_sqlite_for_test;
pub use learn_persistence::{new_from_env, DieselLearnRepository, MIGRATIONS};
