//! Crate `enroll` — motor del ciclo de vida de inscripciones
//!
//! Este crate define la taxonomía de fallos (`EnrollError`), los contratos
//! de persistencia (`CourseRepository`, `EnrollmentRepository`), los cuatro
//! componentes del motor (`CourseCatalog`, `EnrollmentEngine`,
//! `ProgressTracker`, `CertificateIssuer`), la fachada `EnrollmentService`
//! y una implementación en memoria útil para pruebas
//! (`InMemoryLearnRepository`).
//!
//! Diseño resumido:
//! - Versión anclada: cada inscripción captura la versión activa del curso
//!   al inscribirse y el avance se mide siempre contra ese conjunto de
//!   lecciones, aunque el curso active versiones nuevas después.
//! - Atomicidad: inscripción + contador, upsert de avance + porcentaje y
//!   emisión de constancias son unidades de trabajo del repositorio; la
//!   unicidad la garantiza la restricción del almacenamiento, no la
//!   pre-comprobación del motor.
//! - Idempotencia: emitir dos veces la constancia del mismo par devuelve
//!   el mismo registro.
//!
//! Ejemplo rápido:
//! ```rust
//! use enroll::stubs::InMemoryLearnRepository;
//! use enroll::EnrollmentService;
//! use std::sync::Arc;
//! let repo = Arc::new(InMemoryLearnRepository::new());
//! let service = EnrollmentService::new(repo);
//! ```
pub mod catalog;
pub mod certificates;
pub mod engine;
pub mod errors;
pub mod progress;
pub mod repository;
pub mod service;
pub mod stubs;

pub use catalog::*;
pub use certificates::*;
pub use engine::*;
pub use errors::*;
pub use progress::*;
pub use repository::*;
pub use service::*;
pub use stubs::*;
