// Archivo: stubs.rs
// Propósito: implementación en memoria de los repositorios para pruebas y
// wiring rápido. No es durable; sirve para demos, tests unitarios y de
// integración locales.
//
// Las operaciones compuestas toman los mutex de sus tablas en orden fijo
// (courses → versions → lessons → enrollments → progress → certificates) y
// mutan dentro de una sola sección crítica, de modo que la unicidad y los
// contadores se comportan como las transacciones + restricciones únicas del
// backend SQL.
use crate::errors::{EnrollError, Result};
use crate::repository::{CourseRepository, EnrollmentRepository};
use learn_domain::{progress_percentage, Certificate, Course, CourseVersion, Enrollment, Lesson, Progress};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Repositorio en memoria que implementa ambos contratos de persistencia.
pub struct InMemoryLearnRepository {
    /// Cursos indexados por id.
    courses: Mutex<HashMap<Uuid, Course>>,
    /// Versiones indexadas por id.
    versions: Mutex<HashMap<Uuid, CourseVersion>>,
    /// Lecciones indexadas por id.
    lessons: Mutex<HashMap<Uuid, Lesson>>,
    /// Inscripciones indexadas por id.
    enrollments: Mutex<HashMap<Uuid, Enrollment>>,
    /// Registros de avance indexados por id.
    progress: Mutex<HashMap<Uuid, Progress>>,
    /// Constancias indexadas por id.
    certificates: Mutex<HashMap<Uuid, Certificate>>,
}

impl InMemoryLearnRepository {
    /// Crea una nueva instancia vacía.
    pub fn new() -> Self {
        Self { courses: Mutex::new(HashMap::new()),
               versions: Mutex::new(HashMap::new()),
               lessons: Mutex::new(HashMap::new()),
               enrollments: Mutex::new(HashMap::new()),
               progress: Mutex::new(HashMap::new()),
               certificates: Mutex::new(HashMap::new()) }
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `EnrollError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, EnrollError> {
        m.lock().map_err(|e| EnrollError::Storage(format!("mutex poisoned: {:?}", e)))
    }
}

impl Default for InMemoryLearnRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CourseRepository for InMemoryLearnRepository {
    fn save_course(&self, course: &Course) -> Result<Uuid> {
        let id = course.id();
        self.lock(&self.courses)?.insert(id, course.clone());
        Ok(id)
    }

    fn get_course(&self, id: &Uuid) -> Result<Option<Course>> {
        Ok(self.lock(&self.courses)?.get(id).cloned())
    }

    fn list_courses(&self) -> Result<Vec<Course>> {
        Ok(self.lock(&self.courses)?.values().cloned().collect())
    }

    fn published_courses(&self) -> Result<Vec<Course>> {
        Ok(self.lock(&self.courses)?
               .values()
               .filter(|c| c.is_enrollable())
               .cloned()
               .collect())
    }

    fn courses_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>> {
        Ok(self.lock(&self.courses)?
               .values()
               .filter(|c| c.instructor_id() == *instructor_id)
               .cloned()
               .collect())
    }

    fn delete_course(&self, id: &Uuid) -> Result<()> {
        self.lock(&self.courses)?.remove(id);
        Ok(())
    }

    fn save_version(&self, version: &CourseVersion) -> Result<Uuid> {
        let id = version.id();
        self.lock(&self.versions)?.insert(id, version.clone());
        Ok(id)
    }

    fn get_version(&self, id: &Uuid) -> Result<Option<CourseVersion>> {
        Ok(self.lock(&self.versions)?.get(id).cloned())
    }

    fn versions_for_course(&self, course_id: &Uuid) -> Result<Vec<CourseVersion>> {
        let mut out: Vec<CourseVersion> = self.lock(&self.versions)?
                                              .values()
                                              .filter(|v| v.course_id() == *course_id)
                                              .cloned()
                                              .collect();
        out.sort_by_key(|v| v.version_number());
        Ok(out)
    }

    fn active_version(&self, course_id: &Uuid) -> Result<Option<CourseVersion>> {
        Ok(self.lock(&self.versions)?
               .values()
               .find(|v| v.course_id() == *course_id && v.is_active())
               .cloned())
    }

    /// Activación atómica: desactiva las hermanas, activa la versión dada y
    /// actualiza el puntero del curso bajo los mismos locks.
    fn activate_version(&self, course_id: &Uuid, version_id: &Uuid) -> Result<()> {
        let mut courses = self.lock(&self.courses)?;
        let mut versions = self.lock(&self.versions)?;

        let target = versions.get(version_id)
                             .cloned()
                             .ok_or(EnrollError::NotFound(format!("versión {}", version_id)))?;
        if target.course_id() != *course_id {
            return Err(EnrollError::NotFound(format!("versión {} no pertenece al curso {}", version_id, course_id)));
        }

        for v in versions.values_mut() {
            if v.course_id() == *course_id {
                *v = v.with_active(v.id() == *version_id);
            }
        }

        if let Some(course) = courses.get(course_id).cloned() {
            courses.insert(*course_id, course.with_current_version(Some(*version_id)));
        }
        Ok(())
    }

    fn save_lesson(&self, lesson: &Lesson) -> Result<Uuid> {
        let id = lesson.id();
        self.lock(&self.lessons)?.insert(id, lesson.clone());
        Ok(id)
    }

    fn get_lesson(&self, id: &Uuid) -> Result<Option<Lesson>> {
        Ok(self.lock(&self.lessons)?.get(id).cloned())
    }

    fn lessons_for_version(&self, version_id: &Uuid) -> Result<Vec<Lesson>> {
        let mut out: Vec<Lesson> = self.lock(&self.lessons)?
                                       .values()
                                       .filter(|l| l.course_version_id() == *version_id)
                                       .cloned()
                                       .collect();
        out.sort_by_key(|l| l.order_index());
        Ok(out)
    }
}

impl EnrollmentRepository for InMemoryLearnRepository {
    fn find_enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>> {
        Ok(self.lock(&self.enrollments)?
               .values()
               .find(|e| e.student_id() == *student_id && e.course_id() == *course_id)
               .cloned())
    }

    fn find_enrollment_by_version(&self, student_id: &Uuid, version_id: &Uuid) -> Result<Option<Enrollment>> {
        Ok(self.lock(&self.enrollments)?
               .values()
               .find(|e| e.student_id() == *student_id && e.course_version_id() == *version_id)
               .cloned())
    }

    fn enrollments_for_student(&self, student_id: &Uuid) -> Result<Vec<Enrollment>> {
        Ok(self.lock(&self.enrollments)?
               .values()
               .filter(|e| e.student_id() == *student_id)
               .cloned()
               .collect())
    }

    fn enrollments_for_course(&self, course_id: &Uuid) -> Result<Vec<Enrollment>> {
        Ok(self.lock(&self.enrollments)?
               .values()
               .filter(|e| e.course_id() == *course_id)
               .cloned()
               .collect())
    }

    /// Inserción atómica: la unicidad del par se comprueba bajo el lock de
    /// la tabla (fuente de verdad frente a dos `enroll` concurrentes) y el
    /// contador del curso se incrementa en la misma sección crítica.
    fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment> {
        let mut courses = self.lock(&self.courses)?;
        let mut enrollments = self.lock(&self.enrollments)?;

        let duplicate = enrollments.values()
                                   .any(|e| {
                                       e.student_id() == enrollment.student_id()
                                       && e.course_id() == enrollment.course_id()
                                   });
        if duplicate {
            return Err(EnrollError::AlreadyEnrolled { student_id: enrollment.student_id(),
                                                      course_id: enrollment.course_id() });
        }

        let course = courses.get(&enrollment.course_id())
                            .cloned()
                            .ok_or(EnrollError::CourseNotEnrollable { course_id: enrollment.course_id() })?;
        courses.insert(course.id(), course.with_total_enrollments(course.total_enrollments() + 1));
        enrollments.insert(enrollment.id(), enrollment.clone());
        Ok(enrollment.clone())
    }

    /// Eliminación atómica: quita la inscripción y decrementa el contador
    /// del curso bajo los mismos locks.
    fn remove_enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<()> {
        let mut courses = self.lock(&self.courses)?;
        let mut enrollments = self.lock(&self.enrollments)?;

        let id = enrollments.values()
                            .find(|e| e.student_id() == *student_id && e.course_id() == *course_id)
                            .map(|e| e.id())
                            .ok_or(EnrollError::NotEnrolled { student_id: *student_id, course_id: *course_id })?;
        enrollments.remove(&id);

        if let Some(course) = courses.get(course_id).cloned() {
            courses.insert(course.id(), course.with_total_enrollments(course.total_enrollments() - 1));
        }
        Ok(())
    }

    fn update_enrollment(&self, enrollment: &Enrollment) -> Result<()> {
        let mut enrollments = self.lock(&self.enrollments)?;
        if !enrollments.contains_key(&enrollment.id()) {
            return Err(EnrollError::NotFound(format!("inscripción {}", enrollment.id())));
        }
        enrollments.insert(enrollment.id(), enrollment.clone());
        Ok(())
    }

    /// Unidad de trabajo del avance: upsert del registro y recálculo del
    /// porcentaje contra el conjunto de lecciones de la versión anclada,
    /// bajo los mismos locks. El porcentaje observa el estado posterior al
    /// upsert, nunca una instantánea rancia.
    fn record_progress(&self, enrollment: &Enrollment, lesson: &Lesson, completed: bool) -> Result<f64> {
        let lessons = self.lock(&self.lessons)?;
        let mut enrollments = self.lock(&self.enrollments)?;
        let mut progress = self.lock(&self.progress)?;

        let current = enrollments.get(&enrollment.id())
                                 .cloned()
                                 .ok_or(EnrollError::NotFound(format!("inscripción {}", enrollment.id())))?;

        // upsert por clave compuesta (inscripción, lección)
        let existing = progress.values()
                               .find(|p| p.enrollment_id() == current.id() && p.lesson_id() == lesson.id())
                               .cloned();
        match existing {
            Some(p) => {
                progress.insert(p.id(), p.with_completed(completed));
            }
            None => {
                let p = Progress::new(current.id(), lesson.id(), completed);
                progress.insert(p.id(), p);
            }
        }

        // recálculo contra la versión anclada de la inscripción
        let version_id = current.course_version_id();
        let lesson_ids: Vec<Uuid> = lessons.values()
                                           .filter(|l| l.course_version_id() == version_id)
                                           .map(|l| l.id())
                                           .collect();
        let done = progress.values()
                           .filter(|p| {
                               p.enrollment_id() == current.id()
                               && p.is_completed()
                               && lesson_ids.contains(&p.lesson_id())
                           })
                           .count();
        let percentage = progress_percentage(done, lesson_ids.len());
        enrollments.insert(current.id(), current.with_progress(percentage));
        Ok(percentage)
    }

    fn find_progress(&self, enrollment_id: &Uuid, lesson_id: &Uuid) -> Result<Option<Progress>> {
        Ok(self.lock(&self.progress)?
               .values()
               .find(|p| p.enrollment_id() == *enrollment_id && p.lesson_id() == *lesson_id)
               .cloned())
    }

    fn progress_for_enrollment(&self, enrollment_id: &Uuid) -> Result<Vec<Progress>> {
        Ok(self.lock(&self.progress)?
               .values()
               .filter(|p| p.enrollment_id() == *enrollment_id)
               .cloned()
               .collect())
    }

    /// Inserción idempotente: si el par (estudiante, curso) ya tiene
    /// constancia, devuelve la existente bajo el mismo lock.
    fn insert_certificate(&self, certificate: &Certificate) -> Result<Certificate> {
        let mut certificates = self.lock(&self.certificates)?;
        if let Some(existing) = certificates.values()
                                            .find(|c| {
                                                c.student_id() == certificate.student_id()
                                                && c.course_id() == certificate.course_id()
                                            })
                                            .cloned()
        {
            return Ok(existing);
        }
        certificates.insert(certificate.id(), certificate.clone());
        Ok(certificate.clone())
    }

    fn find_certificate(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Certificate>> {
        Ok(self.lock(&self.certificates)?
               .values()
               .find(|c| c.student_id() == *student_id && c.course_id() == *course_id)
               .cloned())
    }

    fn find_certificate_by_verification(&self, verification_id: &str) -> Result<Option<Certificate>> {
        Ok(self.lock(&self.certificates)?
               .values()
               .find(|c| c.verification_id() == verification_id)
               .cloned())
    }

    fn certificates_for_student(&self, student_id: &Uuid) -> Result<Vec<Certificate>> {
        Ok(self.lock(&self.certificates)?
               .values()
               .filter(|c| c.student_id() == *student_id)
               .cloned()
               .collect())
    }
}
