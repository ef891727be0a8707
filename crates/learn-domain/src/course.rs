// course.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Estados del ciclo de vida editorial de un curso.
///
/// Las transiciones permitidas son lineales: Draft → UnderReview →
/// Published → Archived, con un bucle de rechazo UnderReview → Draft y una
/// publicación directa Draft → Published (override administrativo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseStatus {
  Draft,
  UnderReview,
  Published,
  Archived,
}

impl CourseStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      CourseStatus::Draft => "draft",
      CourseStatus::UnderReview => "under_review",
      CourseStatus::Published => "published",
      CourseStatus::Archived => "archived",
    }
  }
}

impl FromStr for CourseStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "draft" => Ok(CourseStatus::Draft),
      "under_review" => Ok(CourseStatus::UnderReview),
      "published" => Ok(CourseStatus::Published),
      "archived" => Ok(CourseStatus::Archived),
      other => Err(DomainError::ValidationError(format!("Estado de curso desconocido: {}", other))),
    }
  }
}

impl fmt::Display for CourseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Nivel de dificultad declarado por el instructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyLevel {
  Beginner,
  Intermediate,
  Advanced,
  Expert,
}

impl DifficultyLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      DifficultyLevel::Beginner => "beginner",
      DifficultyLevel::Intermediate => "intermediate",
      DifficultyLevel::Advanced => "advanced",
      DifficultyLevel::Expert => "expert",
    }
  }
}

impl FromStr for DifficultyLevel {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "beginner" => Ok(DifficultyLevel::Beginner),
      "intermediate" => Ok(DifficultyLevel::Intermediate),
      "advanced" => Ok(DifficultyLevel::Advanced),
      "expert" => Ok(DifficultyLevel::Expert),
      other => Err(DomainError::ValidationError(format!("Nivel de dificultad desconocido: {}", other))),
    }
  }
}

/// Unidad de contenido instruccional creada por un instructor.
///
/// El curso es el agregado dueño del estado editorial y del contador de
/// inscripciones; el contenido concreto vive en sus `CourseVersion`. El
/// puntero `current_version_id` señala la versión activa (si existe).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
  id: Uuid,
  title: String,
  description: String,
  instructor_id: Uuid,
  category_id: Uuid,
  status: CourseStatus,
  difficulty: DifficultyLevel,
  current_version_id: Option<Uuid>,
  total_enrollments: i64,
  created_at: DateTime<Utc>,
  updated_at: Option<DateTime<Utc>>,
}

impl Course {
  /// Crea un curso nuevo en estado `Draft` con contador en cero.
  pub fn new(title: impl Into<String>,
             description: impl Into<String>,
             instructor_id: Uuid,
             category_id: Uuid)
             -> Result<Self, DomainError> {
    let title = title.into();
    let description = description.into();
    if title.trim().is_empty() {
      return Err(DomainError::ValidationError("El título del curso no puede estar vacío".to_string()));
    }
    if description.trim().is_empty() {
      return Err(DomainError::ValidationError("La descripción del curso no puede estar vacía".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              title,
              description,
              instructor_id,
              category_id,
              status: CourseStatus::Draft,
              difficulty: DifficultyLevel::Beginner,
              current_version_id: None,
              total_enrollments: 0,
              created_at: Utc::now(),
              updated_at: None })
  }

  /// Reconstruye un curso desde persistencia sin validar de nuevo.
  #[allow(clippy::too_many_arguments)]
  pub fn from_parts(id: Uuid,
                    title: String,
                    description: String,
                    instructor_id: Uuid,
                    category_id: Uuid,
                    status: CourseStatus,
                    difficulty: DifficultyLevel,
                    current_version_id: Option<Uuid>,
                    total_enrollments: i64,
                    created_at: DateTime<Utc>,
                    updated_at: Option<DateTime<Utc>>)
                    -> Self {
    Self { id,
           title,
           description,
           instructor_id,
           category_id,
           status,
           difficulty,
           current_version_id,
           total_enrollments,
           created_at,
           updated_at }
  }

  fn transitioned(&self, next: CourseStatus) -> Self {
    let mut c = self.clone();
    c.status = next;
    c.updated_at = Some(Utc::now());
    c
  }

  /// Draft → UnderReview: el instructor envía el curso a revisión.
  pub fn submit_for_review(&self) -> Result<Self, DomainError> {
    match self.status {
      CourseStatus::Draft => Ok(self.transitioned(CourseStatus::UnderReview)),
      other => Err(DomainError::InvalidTransition(format!("no se puede enviar a revisión un curso en estado {}", other))),
    }
  }

  /// UnderReview → Published: revisión aprobada.
  pub fn approve(&self) -> Result<Self, DomainError> {
    match self.status {
      CourseStatus::UnderReview => Ok(self.transitioned(CourseStatus::Published)),
      other => Err(DomainError::InvalidTransition(format!("no se puede aprobar un curso en estado {}", other))),
    }
  }

  /// UnderReview → Draft: revisión rechazada, vuelve a borrador.
  pub fn reject(&self) -> Result<Self, DomainError> {
    match self.status {
      CourseStatus::UnderReview => Ok(self.transitioned(CourseStatus::Draft)),
      other => Err(DomainError::InvalidTransition(format!("no se puede rechazar un curso en estado {}", other))),
    }
  }

  /// Draft|UnderReview → Published: publicación directa (override
  /// administrativo).
  pub fn publish(&self) -> Result<Self, DomainError> {
    match self.status {
      CourseStatus::Draft | CourseStatus::UnderReview => Ok(self.transitioned(CourseStatus::Published)),
      other => Err(DomainError::InvalidTransition(format!("no se puede publicar un curso en estado {}", other))),
    }
  }

  /// Published → Archived: retira el curso del catálogo.
  pub fn archive(&self) -> Result<Self, DomainError> {
    match self.status {
      CourseStatus::Published => Ok(self.transitioned(CourseStatus::Archived)),
      other => Err(DomainError::InvalidTransition(format!("no se puede archivar un curso en estado {}", other))),
    }
  }

  /// Devuelve una copia con la dificultad indicada.
  pub fn with_difficulty(&self, difficulty: DifficultyLevel) -> Self {
    let mut c = self.clone();
    c.difficulty = difficulty;
    c
  }

  /// Devuelve una copia con el puntero de versión activa actualizado.
  pub fn with_current_version(&self, version_id: Option<Uuid>) -> Self {
    let mut c = self.clone();
    c.current_version_id = version_id;
    c.updated_at = Some(Utc::now());
    c
  }

  /// Devuelve una copia con el contador de inscripciones dado. El contador
  /// sólo debe mutarse dentro de la misma transacción que crea o elimina la
  /// inscripción que cuenta.
  pub fn with_total_enrollments(&self, total: i64) -> Self {
    let mut c = self.clone();
    c.total_enrollments = total;
    c
  }

  pub fn is_enrollable(&self) -> bool {
    self.status == CourseStatus::Published
  }

  pub fn is_draft(&self) -> bool {
    self.status == CourseStatus::Draft
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn instructor_id(&self) -> Uuid {
    self.instructor_id
  }

  pub fn category_id(&self) -> Uuid {
    self.category_id
  }

  pub fn status(&self) -> CourseStatus {
    self.status
  }

  pub fn difficulty(&self) -> DifficultyLevel {
    self.difficulty
  }

  pub fn current_version_id(&self) -> Option<Uuid> {
    self.current_version_id
  }

  pub fn total_enrollments(&self) -> i64 {
    self.total_enrollments
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  pub fn updated_at(&self) -> Option<DateTime<Utc>> {
    self.updated_at
  }
}

impl fmt::Display for Course {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Course(id: {}, title: {}, status: {})", self.id, self.title, self.status)
  }
}
