// Archivo: errors.rs
// Propósito: definir la taxonomía de fallos de dominio del motor de
// inscripciones y el alias Result<T> usado por las APIs del crate. Todos
// son resultados esperados del dominio, no caídas: el motor los registra
// con sus claves identificadoras y los devuelve al llamador sin traducirlos.
use learn_domain::DomainError;
use thiserror::Error;
use uuid::Uuid;

/// Fallos de dominio del ciclo de vida de inscripciones.
///
/// - Los fallos de almacenamiento (conexión, violación de restricción no
///   mapeable) se propagan como `Storage` y este núcleo nunca los reintenta:
///   la política de reintento es del llamador o de la infraestructura.
#[derive(Error, Debug)]
pub enum EnrollError {
    /// Ya existe una inscripción para el par (estudiante, curso).
    #[error("El estudiante {student_id} ya está inscrito en el curso {course_id}")]
    AlreadyEnrolled { student_id: Uuid, course_id: Uuid },
    /// No existe inscripción para el par (estudiante, curso).
    #[error("El estudiante {student_id} no está inscrito en el curso {course_id}")]
    NotEnrolled { student_id: Uuid, course_id: Uuid },
    /// El curso no existe o no está publicado.
    #[error("El curso {course_id} no admite inscripciones")]
    CourseNotEnrollable { course_id: Uuid },
    /// El curso no tiene ninguna versión marcada como activa.
    #[error("El curso {course_id} no tiene versión activa")]
    NoActiveVersion { course_id: Uuid },
    /// La inscripción está completada; el historial completado es permanente.
    #[error("No se puede anular la inscripción completada del estudiante {student_id} en el curso {course_id}")]
    CannotUnenrollCompleted { student_id: Uuid, course_id: Uuid },
    /// La lección no existe.
    #[error("No existe la lección {lesson_id}")]
    NoSuchLesson { lesson_id: Uuid },
    /// El estudiante no tiene inscripción anclada a la versión de la lección.
    #[error("El estudiante {student_id} no está inscrito en la versión {version_id}")]
    NotEnrolledInVersion { student_id: Uuid, version_id: Uuid },
    /// El avance calculado es menor a 100.
    #[error("El curso {course_id} no puede completarse: avance {percentage}%")]
    IncompleteProgress { course_id: Uuid, percentage: f64 },
    /// La inscripción no existe o no está completada.
    #[error("El estudiante {student_id} no ha completado el curso {course_id}")]
    CourseNotCompleted { student_id: Uuid, course_id: Uuid },
    /// Entidad no encontrada fuera de los casos con nombre propio.
    #[error("No encontrado: {0}")]
    NotFound(String),
    /// Regla de dominio violada (validación o transición inválida).
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// Error de la capa de almacenamiento (BD, pool, etc.).
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, EnrollError>;
