// Archivo: certificates.rs
// Propósito: implementar `CertificateIssuer`: la transición a `Completed`
// con su compuerta de avance al 100%, y la emisión idempotente de
// constancias de finalización.
use crate::errors::{EnrollError, Result};
use crate::progress::ProgressTracker;
use crate::repository::{CourseRepository, EnrollmentRepository};
use learn_domain::Certificate;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Emisor de finalizaciones y constancias.
pub struct CertificateIssuer<R>
    where R: CourseRepository + EnrollmentRepository
{
    repo: Arc<R>,
    tracker: ProgressTracker<R>,
}

impl<R> CertificateIssuer<R> where R: CourseRepository + EnrollmentRepository
{
    /// Crea el emisor inyectando el repositorio de forma explícita.
    pub fn new(repo: Arc<R>) -> Self {
        let tracker = ProgressTracker::new(repo.clone());
        Self { repo, tracker }
    }

    /// Completa el curso para el estudiante y emite su constancia.
    ///
    /// - `NotEnrolled` si no hay inscripción.
    /// - `IncompleteProgress` si el porcentaje calculado es menor a 100; la
    ///   transición sólo procede con el 100% exacto.
    ///
    /// Al completar: estado `Completed`, fecha de finalización y porcentaje
    /// fijado en 100. La generación de la constancia es continuación de la
    /// misma operación lógica.
    pub fn complete_course(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Certificate> {
        let enrollment = self.repo
                             .find_enrollment(student_id, course_id)?
                             .ok_or(EnrollError::NotEnrolled { student_id: *student_id, course_id: *course_id })?;

        let percentage = self.tracker.calculate_completion(student_id, course_id)?;
        if percentage < 100.0 {
            warn!("curso {} incompleto para {}: {}%", course_id, student_id, percentage);
            return Err(EnrollError::IncompleteProgress { course_id: *course_id, percentage });
        }

        if !enrollment.is_completed() {
            self.repo.update_enrollment(&enrollment.completed())?;
            info!("estudiante {} completó el curso {}", student_id, course_id);
        }

        self.generate_certificate(student_id, course_id)
    }

    /// Emite la constancia del par (estudiante, curso), de forma
    /// idempotente: si ya existe, devuelve la existente sin cambios.
    ///
    /// Falla con `CourseNotCompleted` si la inscripción falta o no está en
    /// `Completed`. La comprobación de existencia y la inserción son
    /// atómicas en el repositorio, de modo que intentos concurrentes de
    /// finalización producen una sola constancia.
    pub fn generate_certificate(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Certificate> {
        let enrollment = self.repo.find_enrollment(student_id, course_id)?;
        match enrollment {
            Some(e) if e.is_completed() => {}
            _ => {
                warn!("no se puede emitir constancia: {} no ha completado {}", student_id, course_id);
                return Err(EnrollError::CourseNotCompleted { student_id: *student_id, course_id: *course_id });
            }
        }

        let fresh = Certificate::new(*student_id, *course_id);
        let issued = self.repo.insert_certificate(&fresh)?;
        if issued.id() == fresh.id() {
            info!("constancia {} emitida para {}", issued.verification_id(), student_id);
        } else {
            info!("constancia ya existente para {} en curso {}", student_id, course_id);
        }
        Ok(issued)
    }

    /// Busca una constancia por su código de verificación público.
    pub fn verify_certificate(&self, verification_id: &str) -> Result<Option<Certificate>> {
        self.repo.find_certificate_by_verification(verification_id)
    }

    /// Constancias emitidas a un estudiante.
    pub fn student_certificates(&self, student_id: &Uuid) -> Result<Vec<Certificate>> {
        self.repo.certificates_for_student(student_id)
    }

    pub fn has_completed(&self, student_id: &Uuid, course_id: &Uuid) -> Result<bool> {
        Ok(self.repo
               .find_enrollment(student_id, course_id)?
               .map(|e| e.is_completed())
               .unwrap_or(false))
    }
}
