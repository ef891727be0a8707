// Archivo: repository.rs
// Propósito: definir los traits `CourseRepository` y `EnrollmentRepository`,
// el contrato que deben implementar las persistencias (Diesel, in-memory,
// etc.). Un trait por raíz de agregado; un mismo backend concreto suele
// implementar ambos sobre el mismo almacenamiento.
use crate::errors::Result;
use learn_domain::{Certificate, Course, CourseVersion, Enrollment, Lesson, Progress};
use uuid::Uuid;

/// Contrato de persistencia del catálogo: cursos, versiones y lecciones.
pub trait CourseRepository: Send + Sync {
    /// Inserta o reemplaza un curso y devuelve su `Uuid`.
    fn save_course(&self, course: &Course) -> Result<Uuid>;

    /// Recupera un curso por id.
    fn get_course(&self, id: &Uuid) -> Result<Option<Course>>;

    /// Lista todos los cursos.
    fn list_courses(&self) -> Result<Vec<Course>>;

    /// Lista los cursos publicados.
    fn published_courses(&self) -> Result<Vec<Course>>;

    /// Lista los cursos de un instructor.
    fn courses_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>>;

    /// Elimina un curso. La regla "sólo en borrador" la aplica el catálogo;
    /// el repositorio sólo borra.
    fn delete_course(&self, id: &Uuid) -> Result<()>;

    /// Inserta o reemplaza una versión y devuelve su `Uuid`. Las versiones
    /// se agregan, nunca se reescriben en sitio.
    fn save_version(&self, version: &CourseVersion) -> Result<Uuid>;

    /// Recupera una versión por id.
    fn get_version(&self, id: &Uuid) -> Result<Option<CourseVersion>>;

    /// Lista las versiones de un curso ordenadas por número.
    fn versions_for_course(&self, course_id: &Uuid) -> Result<Vec<CourseVersion>>;

    /// Devuelve la versión marcada activa del curso, si existe.
    fn active_version(&self, course_id: &Uuid) -> Result<Option<CourseVersion>>;

    /// Activa la versión dada y desactiva las hermanas, actualizando el
    /// puntero `current_version_id` del curso. Debe ser atómico: a lo sumo
    /// una versión activa por curso.
    fn activate_version(&self, course_id: &Uuid, version_id: &Uuid) -> Result<()>;

    /// Inserta o reemplaza una lección y devuelve su `Uuid`.
    fn save_lesson(&self, lesson: &Lesson) -> Result<Uuid>;

    /// Recupera una lección por id.
    fn get_lesson(&self, id: &Uuid) -> Result<Option<Lesson>>;

    /// Lista las lecciones de una versión ordenadas por `order_index`.
    fn lessons_for_version(&self, version_id: &Uuid) -> Result<Vec<Lesson>>;
}

/// Contrato de persistencia del ciclo de vida: inscripciones, avance y
/// constancias.
///
/// Las operaciones compuestas (`insert_enrollment`, `remove_enrollment`,
/// `record_progress`, `insert_certificate`) son unidades de trabajo: el
/// backend debe aplicarlas completas o no aplicarlas, y la restricción de
/// unicidad del almacenamiento es la fuente de verdad bajo concurrencia,
/// no la pre-comprobación del motor.
pub trait EnrollmentRepository: Send + Sync {
    /// Busca la inscripción por par (estudiante, curso).
    fn find_enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>>;

    /// Busca la inscripción anclada a una versión concreta. Nótese la clave:
    /// id de versión, no id de curso; la versión anclada de un estudiante
    /// puede no ser la versión activa actual del curso.
    fn find_enrollment_by_version(&self, student_id: &Uuid, version_id: &Uuid) -> Result<Option<Enrollment>>;

    /// Lista las inscripciones de un estudiante.
    fn enrollments_for_student(&self, student_id: &Uuid) -> Result<Vec<Enrollment>>;

    /// Lista las inscripciones de un curso.
    fn enrollments_for_course(&self, course_id: &Uuid) -> Result<Vec<Enrollment>>;

    /// Inserta la inscripción e incrementa `total_enrollments` del curso en
    /// la misma transacción. Devuelve `AlreadyEnrolled` si el par ya existe
    /// (restricción única del almacenamiento).
    fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment>;

    /// Elimina la inscripción y decrementa `total_enrollments` del curso en
    /// la misma transacción. Devuelve `NotEnrolled` si el par no existe.
    fn remove_enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<()>;

    /// Reemplaza el estado de una inscripción existente (estado, porcentaje,
    /// fechas).
    fn update_enrollment(&self, enrollment: &Enrollment) -> Result<()>;

    /// Unidad de trabajo del rastreador: upsert del registro (inscripción,
    /// lección), recálculo del porcentaje contra el conjunto completo de
    /// lecciones de la versión anclada y persistencia del porcentaje, todo
    /// en una sola transacción. Devuelve el porcentaje nuevo.
    fn record_progress(&self, enrollment: &Enrollment, lesson: &Lesson, completed: bool) -> Result<f64>;

    /// Recupera el registro de avance del par (inscripción, lección).
    fn find_progress(&self, enrollment_id: &Uuid, lesson_id: &Uuid) -> Result<Option<Progress>>;

    /// Lista los registros de avance de una inscripción.
    fn progress_for_enrollment(&self, enrollment_id: &Uuid) -> Result<Vec<Progress>>;

    /// Inserta la constancia si no existe una para el par (estudiante,
    /// curso); si ya existe, devuelve la existente sin modificarla. La
    /// comprobación y la inserción son atómicas.
    fn insert_certificate(&self, certificate: &Certificate) -> Result<Certificate>;

    /// Busca la constancia del par (estudiante, curso).
    fn find_certificate(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Certificate>>;

    /// Busca una constancia por su código de verificación.
    fn find_certificate_by_verification(&self, verification_id: &str) -> Result<Option<Certificate>>;

    /// Lista las constancias de un estudiante.
    fn certificates_for_student(&self, student_id: &Uuid) -> Result<Vec<Certificate>>;
}
