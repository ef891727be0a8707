// Archivo: catalog.rs
// Propósito: implementar `CourseCatalog`, el almacén de cursos y versiones:
// ciclo de vida editorial del curso, alta de versiones y lecciones, y
// resolución de la versión activa que anclan las inscripciones nuevas.
use crate::errors::{EnrollError, Result};
use crate::repository::CourseRepository;
use learn_domain::{ContentType, Course, CourseVersion, DifficultyLevel, Lesson};
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Catálogo de cursos y versiones.
///
/// Orquesta las transiciones puras de `Course` contra el repositorio y
/// resuelve la versión activa de un curso. Los callers que obtienen
/// `NoActiveVersion` deben tratar el curso como no-inscribible.
pub struct CourseCatalog<R>
    where R: CourseRepository
{
    repo: Arc<R>,
}

impl<R> CourseCatalog<R> where R: CourseRepository
{
    /// Crea el catálogo inyectando el repositorio de forma explícita.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Crea un curso en borrador y lo persiste.
    pub fn create_course(&self,
                         title: impl Into<String>,
                         description: impl Into<String>,
                         instructor_id: Uuid,
                         category_id: Uuid)
                         -> Result<Course> {
        let course = Course::new(title, description, instructor_id, category_id)?;
        self.repo.save_course(&course)?;
        info!("curso {} creado por instructor {}", course.id(), instructor_id);
        Ok(course)
    }

    pub fn get_course(&self, course_id: &Uuid) -> Result<Option<Course>> {
        self.repo.get_course(course_id)
    }

    pub fn list_courses(&self) -> Result<Vec<Course>> {
        self.repo.list_courses()
    }

    pub fn published_courses(&self) -> Result<Vec<Course>> {
        self.repo.published_courses()
    }

    pub fn courses_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>> {
        self.repo.courses_by_instructor(instructor_id)
    }

    /// Búsqueda por subcadena (título o descripción) sobre los cursos
    /// publicados. Término vacío devuelve todos los publicados.
    pub fn search_courses(&self, term: &str) -> Result<Vec<Course>> {
        let published = self.repo.published_courses()?;
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Ok(published);
        }
        Ok(published.into_iter()
                    .filter(|c| {
                        c.title().to_lowercase().contains(&term) || c.description().to_lowercase().contains(&term)
                    })
                    .collect())
    }

    /// Sólo el instructor dueño puede editar el curso.
    pub fn can_edit(&self, course_id: &Uuid, user_id: &Uuid) -> Result<bool> {
        Ok(self.repo
               .get_course(course_id)?
               .map(|c| c.instructor_id() == *user_id)
               .unwrap_or(false))
    }

    fn load_course(&self, course_id: &Uuid) -> Result<Course> {
        self.repo
            .get_course(course_id)?
            .ok_or(EnrollError::CourseNotEnrollable { course_id: *course_id })
    }

    fn apply_transition<F>(&self, course_id: &Uuid, op: &str, f: F) -> Result<Course>
        where F: FnOnce(&Course) -> std::result::Result<Course, learn_domain::DomainError>
    {
        let course = self.load_course(course_id)?;
        let next = match f(&course) {
            Ok(next) => next,
            Err(e) => {
                warn!("transición '{}' rechazada para curso {}: {}", op, course_id, e);
                return Err(e.into());
            }
        };
        self.repo.save_course(&next)?;
        info!("curso {}: {} -> {}", course_id, course.status(), next.status());
        Ok(next)
    }

    /// Draft → UnderReview.
    pub fn submit_for_review(&self, course_id: &Uuid) -> Result<Course> {
        self.apply_transition(course_id, "submit_for_review", Course::submit_for_review)
    }

    /// UnderReview → Published.
    pub fn approve(&self, course_id: &Uuid) -> Result<Course> {
        self.apply_transition(course_id, "approve", Course::approve)
    }

    /// UnderReview → Draft. El motivo sólo se registra en la bitácora.
    pub fn reject(&self, course_id: &Uuid, reason: &str) -> Result<Course> {
        let course = self.apply_transition(course_id, "reject", Course::reject)?;
        info!("curso {} rechazado: {}", course_id, reason);
        Ok(course)
    }

    /// Publicación directa (override administrativo).
    pub fn publish(&self, course_id: &Uuid) -> Result<Course> {
        self.apply_transition(course_id, "publish", Course::publish)
    }

    /// Published → Archived.
    pub fn archive(&self, course_id: &Uuid) -> Result<Course> {
        self.apply_transition(course_id, "archive", Course::archive)
    }

    /// Elimina un curso. Sólo se permite mientras está en borrador.
    pub fn delete_course(&self, course_id: &Uuid) -> Result<()> {
        let course = self.load_course(course_id)?;
        if !course.is_draft() {
            warn!("intento de eliminar curso {} en estado {}", course_id, course.status());
            return Err(learn_domain::DomainError::InvalidTransition(format!(
                "sólo se pueden eliminar cursos en borrador, no en estado {}",
                course.status()
            )).into());
        }
        self.repo.delete_course(course_id)?;
        info!("curso {} eliminado", course_id);
        Ok(())
    }

    /// Agrega una versión nueva con número `max + 1`. Si `activate` es
    /// verdadero, la activa de inmediato (desactivando las hermanas).
    pub fn new_version(&self, course_id: &Uuid, changelog: Option<String>, activate: bool) -> Result<CourseVersion> {
        let _course = self.load_course(course_id)?;
        let next_number = self.repo
                              .versions_for_course(course_id)?
                              .iter()
                              .map(|v| v.version_number())
                              .max()
                              .unwrap_or(0)
                          + 1;
        let version = CourseVersion::new(*course_id, next_number, changelog)?;
        self.repo.save_version(&version)?;
        if activate {
            self.repo.activate_version(course_id, &version.id())?;
        }
        info!("curso {}: versión v{} creada (activa: {})", course_id, next_number, activate);
        // releer para reflejar el flag que fijó el repositorio
        Ok(self.repo
               .get_version(&version.id())?
               .unwrap_or(version))
    }

    /// Marca la versión dada como activa; a lo sumo una activa por curso.
    pub fn activate_version(&self, course_id: &Uuid, version_id: &Uuid) -> Result<()> {
        self.repo.activate_version(course_id, version_id)?;
        info!("curso {}: versión {} activada", course_id, version_id);
        Ok(())
    }

    /// Versiones del curso ordenadas por número.
    pub fn versions(&self, course_id: &Uuid) -> Result<Vec<CourseVersion>> {
        self.repo.versions_for_course(course_id)
    }

    /// Resuelve la versión activa del curso. Falla con `NoActiveVersion`
    /// cuando ninguna versión está marcada activa (p.ej. un borrador sin
    /// contenido publicado): el curso no es inscribible.
    pub fn resolve_active_version(&self, course_id: &Uuid) -> Result<CourseVersion> {
        match self.repo.active_version(course_id)? {
            Some(v) => Ok(v),
            None => {
                warn!("curso {} sin versión activa", course_id);
                Err(EnrollError::NoActiveVersion { course_id: *course_id })
            }
        }
    }

    /// Agrega una lección a una versión existente.
    #[allow(clippy::too_many_arguments)]
    pub fn add_lesson(&self,
                      version_id: &Uuid,
                      title: impl Into<String>,
                      description: Option<String>,
                      content_type: ContentType,
                      content_url: Option<String>,
                      order_index: i32,
                      duration_minutes: i32,
                      is_free: bool)
                      -> Result<Lesson> {
        if self.repo.get_version(version_id)?.is_none() {
            return Err(EnrollError::NotFound(format!("versión {}", version_id)));
        }
        let lesson = Lesson::new(*version_id,
                                 title,
                                 description,
                                 content_type,
                                 content_url,
                                 order_index,
                                 duration_minutes,
                                 is_free)?;
        self.repo.save_lesson(&lesson)?;
        Ok(lesson)
    }

    /// Lecciones de una versión, ordenadas por `order_index`.
    pub fn lessons(&self, version_id: &Uuid) -> Result<Vec<Lesson>> {
        self.repo.lessons_for_version(version_id)
    }

    /// Cambia la dificultad declarada del curso.
    pub fn set_difficulty(&self, course_id: &Uuid, difficulty: DifficultyLevel) -> Result<Course> {
        let course = self.load_course(course_id)?;
        let next = course.with_difficulty(difficulty);
        self.repo.save_course(&next)?;
        Ok(next)
    }
}
