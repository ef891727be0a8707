// Archivo: service.rs
// Propósito: implementar `EnrollmentService`, la fachada que compone el
// catálogo, el motor de inscripciones, el rastreador de avance y el emisor
// de constancias sobre un mismo repositorio compartido. Esta capa está
// pensada para ser invocada desde handlers HTTP o desde una CLI.
use crate::catalog::CourseCatalog;
use crate::certificates::CertificateIssuer;
use crate::engine::EnrollmentEngine;
use crate::errors::Result;
use crate::progress::ProgressTracker;
use crate::repository::{CourseRepository, EnrollmentRepository};
use learn_domain::{Certificate, Enrollment, Progress};
use std::sync::Arc;
use uuid::Uuid;

/// Fachada de alto nivel del ciclo de vida de inscripciones.
///
/// Construye los cuatro componentes con el mismo `Arc<R>` inyectado; no hay
/// estado perezoso ni singletons ocultos.
pub struct EnrollmentService<R>
    where R: CourseRepository + EnrollmentRepository
{
    catalog: CourseCatalog<R>,
    engine: EnrollmentEngine<R>,
    tracker: ProgressTracker<R>,
    issuer: CertificateIssuer<R>,
}

impl<R> EnrollmentService<R> where R: CourseRepository + EnrollmentRepository + 'static
{
    /// Crea el servicio inyectando el repositorio compartido.
    pub fn new(repo: Arc<R>) -> Self {
        Self { catalog: CourseCatalog::new(repo.clone()),
               engine: EnrollmentEngine::new(repo.clone()),
               tracker: ProgressTracker::new(repo.clone()),
               issuer: CertificateIssuer::new(repo) }
    }

    /// Acceso directo al catálogo de cursos y versiones.
    pub fn catalog(&self) -> &CourseCatalog<R> {
        &self.catalog
    }

    /// Inscribe al estudiante en el curso (ancla la versión activa).
    pub fn enroll(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Enrollment> {
        self.engine.enroll(student_id, course_id)
    }

    /// Anula la inscripción (no permitida sobre cursos completados).
    pub fn unenroll(&self, student_id: &Uuid, course_id: &Uuid) -> Result<()> {
        self.engine.unenroll(student_id, course_id)
    }

    pub fn enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>> {
        self.engine.enrollment(student_id, course_id)
    }

    pub fn is_enrolled(&self, student_id: &Uuid, course_id: &Uuid) -> Result<bool> {
        self.engine.is_enrolled(student_id, course_id)
    }

    pub fn can_enroll(&self, student_id: &Uuid, course_id: &Uuid) -> Result<bool> {
        self.engine.can_enroll(student_id, course_id)
    }

    pub fn student_enrollments(&self, student_id: &Uuid) -> Result<Vec<Enrollment>> {
        self.engine.student_enrollments(student_id)
    }

    pub fn course_enrollments(&self, course_id: &Uuid) -> Result<Vec<Enrollment>> {
        self.engine.course_enrollments(course_id)
    }

    /// Registra avance de lección y devuelve el porcentaje recalculado.
    pub fn record_lesson_progress(&self, student_id: &Uuid, lesson_id: &Uuid, completed: bool) -> Result<f64> {
        self.tracker.record_lesson_progress(student_id, lesson_id, completed)
    }

    /// Porcentaje de avance en sólo lectura.
    pub fn calculate_completion(&self, student_id: &Uuid, course_id: &Uuid) -> Result<f64> {
        self.tracker.calculate_completion(student_id, course_id)
    }

    pub fn lesson_progress(&self, student_id: &Uuid, lesson_id: &Uuid) -> Result<Option<Progress>> {
        self.tracker.lesson_progress(student_id, lesson_id)
    }

    pub fn course_progress(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Vec<Progress>> {
        self.tracker.course_progress(student_id, course_id)
    }

    /// Completa el curso (requiere 100%) y devuelve la constancia.
    pub fn complete_course(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Certificate> {
        self.issuer.complete_course(student_id, course_id)
    }

    /// Emisión idempotente de la constancia de un curso completado.
    pub fn generate_certificate(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Certificate> {
        self.issuer.generate_certificate(student_id, course_id)
    }

    pub fn verify_certificate(&self, verification_id: &str) -> Result<Option<Certificate>> {
        self.issuer.verify_certificate(verification_id)
    }

    pub fn student_certificates(&self, student_id: &Uuid) -> Result<Vec<Certificate>> {
        self.issuer.student_certificates(student_id)
    }

    pub fn has_completed(&self, student_id: &Uuid, course_id: &Uuid) -> Result<bool> {
        self.issuer.has_completed(student_id, course_id)
    }
}
