// Archivo: progress.rs
// Propósito: implementar `ProgressTracker`, el rastreador de avance por
// lección: resuelve la lección y la inscripción anclada a su versión,
// delega el upsert + recálculo en el repositorio como unidad de trabajo y
// expone los cálculos de avance de sólo lectura.
use crate::errors::{EnrollError, Result};
use crate::repository::{CourseRepository, EnrollmentRepository};
use learn_domain::{progress_percentage, Progress};
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Rastreador de avance por lección.
pub struct ProgressTracker<R>
    where R: CourseRepository + EnrollmentRepository
{
    repo: Arc<R>,
}

impl<R> ProgressTracker<R> where R: CourseRepository + EnrollmentRepository
{
    /// Crea el rastreador inyectando el repositorio de forma explícita.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Registra el avance de una lección para el estudiante y devuelve el
    /// porcentaje recalculado de la inscripción.
    ///
    /// La inscripción se resuelve contra la versión dueña de la lección
    /// (clave de versión, no de curso): si el estudiante quedó anclado a una
    /// versión anterior, las lecciones de versiones nuevas fallan con
    /// `NotEnrolledInVersion`. El upsert del registro y el recálculo del
    /// porcentaje ocurren en una sola unidad de trabajo del repositorio:
    /// un registro escrito con porcentaje rancio no es un resultado válido.
    pub fn record_lesson_progress(&self, student_id: &Uuid, lesson_id: &Uuid, completed: bool) -> Result<f64> {
        let lesson = self.repo
                         .get_lesson(lesson_id)?
                         .ok_or(EnrollError::NoSuchLesson { lesson_id: *lesson_id })?;

        let version_id = lesson.course_version_id();
        let enrollment = match self.repo.find_enrollment_by_version(student_id, &version_id)? {
            Some(e) => e,
            None => {
                warn!("estudiante {} sin inscripción en versión {}", student_id, version_id);
                return Err(EnrollError::NotEnrolledInVersion { student_id: *student_id, version_id });
            }
        };

        let percentage = self.repo.record_progress(&enrollment, &lesson, completed)?;
        info!("avance de {} en lección {}: {} ({}%)", student_id, lesson_id, completed, percentage);
        Ok(percentage)
    }

    /// Recalcula el porcentaje de avance en sólo lectura, sin persistir.
    ///
    /// Devuelve 0 cuando no hay inscripción o cuando la versión anclada no
    /// tiene lecciones (definido como 0%, no como error).
    pub fn calculate_completion(&self, student_id: &Uuid, course_id: &Uuid) -> Result<f64> {
        let enrollment = match self.repo.find_enrollment(student_id, course_id)? {
            Some(e) => e,
            None => return Ok(0.0),
        };

        let lessons = self.repo.lessons_for_version(&enrollment.course_version_id())?;
        if lessons.is_empty() {
            return Ok(0.0);
        }

        let records = self.repo.progress_for_enrollment(&enrollment.id())?;
        let completed = records.iter().filter(|p| p.is_completed()).count();
        Ok(progress_percentage(completed, lessons.len()))
    }

    /// Registro de avance del estudiante en una lección concreta.
    pub fn lesson_progress(&self, student_id: &Uuid, lesson_id: &Uuid) -> Result<Option<Progress>> {
        let lesson = self.repo
                         .get_lesson(lesson_id)?
                         .ok_or(EnrollError::NoSuchLesson { lesson_id: *lesson_id })?;
        let enrollment = self.repo
                             .find_enrollment_by_version(student_id, &lesson.course_version_id())?;
        match enrollment {
            Some(e) => self.repo.find_progress(&e.id(), lesson_id),
            None => Ok(None),
        }
    }

    /// Registros de avance del estudiante en el curso, restringidos a las
    /// lecciones de su versión anclada.
    pub fn course_progress(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Vec<Progress>> {
        let enrollment = match self.repo.find_enrollment(student_id, course_id)? {
            Some(e) => e,
            None => return Ok(Vec::new()),
        };
        let lesson_ids: Vec<Uuid> = self.repo
                                        .lessons_for_version(&enrollment.course_version_id())?
                                        .iter()
                                        .map(|l| l.id())
                                        .collect();
        let records = self.repo.progress_for_enrollment(&enrollment.id())?;
        Ok(records.into_iter()
                  .filter(|p| lesson_ids.contains(&p.lesson_id()))
                  .collect())
    }
}
