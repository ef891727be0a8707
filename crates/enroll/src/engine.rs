// Archivo: engine.rs
// Propósito: implementar `EnrollmentEngine`, el motor que crea y elimina la
// relación estudiante–curso: valida las reglas de inscripción, ancla la
// versión activa del momento y delega en el repositorio las escrituras
// compuestas (inscripción + contador del curso en una transacción).
use crate::errors::{EnrollError, Result};
use crate::repository::{CourseRepository, EnrollmentRepository};
use learn_domain::Enrollment;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Motor de inscripciones.
///
/// Nota sobre concurrencia: la pre-comprobación de duplicados existe para
/// dar un error preciso, pero la fuente de verdad es la restricción única
/// del almacenamiento dentro de `insert_enrollment`: dos `enroll`
/// concurrentes para el mismo par terminan en exactamente una inscripción
/// y un `AlreadyEnrolled`.
pub struct EnrollmentEngine<R>
    where R: CourseRepository + EnrollmentRepository
{
    repo: Arc<R>,
}

impl<R> EnrollmentEngine<R> where R: CourseRepository + EnrollmentRepository
{
    /// Crea el motor inyectando el repositorio de forma explícita.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Inscribe al estudiante en el curso, anclando la versión activa.
    ///
    /// Fallos, en orden de comprobación:
    /// - `AlreadyEnrolled` si el par ya existe.
    /// - `CourseNotEnrollable` si el curso falta o no está publicado.
    /// - `NoActiveVersion` si ninguna versión está marcada activa.
    pub fn enroll(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Enrollment> {
        if self.repo.find_enrollment(student_id, course_id)?.is_some() {
            warn!("estudiante {} ya inscrito en curso {}", student_id, course_id);
            return Err(EnrollError::AlreadyEnrolled { student_id: *student_id, course_id: *course_id });
        }

        let course = match self.repo.get_course(course_id)? {
            Some(c) if c.is_enrollable() => c,
            _ => {
                warn!("curso {} no disponible para inscripción", course_id);
                return Err(EnrollError::CourseNotEnrollable { course_id: *course_id });
            }
        };

        let active = match self.repo.active_version(course_id)? {
            Some(v) => v,
            None => {
                warn!("curso {} sin versión activa", course_id);
                return Err(EnrollError::NoActiveVersion { course_id: *course_id });
            }
        };

        let enrollment = Enrollment::new(*student_id, course.id(), active.id());
        // inserción + incremento del contador en una sola transacción
        let created = self.repo.insert_enrollment(&enrollment)?;
        info!("estudiante {} inscrito en curso {} (versión v{})",
              student_id,
              course_id,
              active.version_number());
        Ok(created)
    }

    /// Anula la inscripción y decrementa el contador del curso.
    ///
    /// - `NotEnrolled` si el par no existe.
    /// - `CannotUnenrollCompleted` si el estado es `Completed`.
    pub fn unenroll(&self, student_id: &Uuid, course_id: &Uuid) -> Result<()> {
        let enrollment = self.repo
                             .find_enrollment(student_id, course_id)?
                             .ok_or(EnrollError::NotEnrolled { student_id: *student_id, course_id: *course_id })?;

        if enrollment.is_completed() {
            warn!("no se puede anular la inscripción completada de {} en {}", student_id, course_id);
            return Err(EnrollError::CannotUnenrollCompleted { student_id: *student_id, course_id: *course_id });
        }

        // eliminación + decremento del contador en una sola transacción
        self.repo.remove_enrollment(student_id, course_id)?;
        info!("estudiante {} anuló su inscripción en curso {}", student_id, course_id);
        Ok(())
    }

    /// Inscripción del par (estudiante, curso), si existe.
    pub fn enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>> {
        self.repo.find_enrollment(student_id, course_id)
    }

    pub fn is_enrolled(&self, student_id: &Uuid, course_id: &Uuid) -> Result<bool> {
        Ok(self.repo.find_enrollment(student_id, course_id)?.is_some())
    }

    /// Comprobación consultiva previa a `enroll`: par libre y curso
    /// publicado. No sustituye a las validaciones de `enroll`.
    pub fn can_enroll(&self, student_id: &Uuid, course_id: &Uuid) -> Result<bool> {
        if self.repo.find_enrollment(student_id, course_id)?.is_some() {
            return Ok(false);
        }
        Ok(self.repo
               .get_course(course_id)?
               .map(|c| c.is_enrollable())
               .unwrap_or(false))
    }

    pub fn student_enrollments(&self, student_id: &Uuid) -> Result<Vec<Enrollment>> {
        self.repo.enrollments_for_student(student_id)
    }

    pub fn course_enrollments(&self, course_id: &Uuid) -> Result<Vec<Enrollment>> {
        self.repo.enrollments_for_course(course_id)
    }
}
