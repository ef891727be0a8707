// lesson.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tipo de contenido de una lección.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
  Video,
  Pdf,
  Text,
  Interactive,
  Quiz,
}

impl ContentType {
  pub fn as_str(&self) -> &'static str {
    match self {
      ContentType::Video => "video",
      ContentType::Pdf => "pdf",
      ContentType::Text => "text",
      ContentType::Interactive => "interactive",
      ContentType::Quiz => "quiz",
    }
  }
}

impl FromStr for ContentType {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "video" => Ok(ContentType::Video),
      "pdf" => Ok(ContentType::Pdf),
      "text" => Ok(ContentType::Text),
      "interactive" => Ok(ContentType::Interactive),
      "quiz" => Ok(ContentType::Quiz),
      other => Err(DomainError::ValidationError(format!("Tipo de contenido desconocido: {}", other))),
    }
  }
}

/// Lección dentro de una `CourseVersion`.
///
/// El `order_index` define la posición en la secuencia; se espera único por
/// versión aunque el almacenamiento no lo impone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
  id: Uuid,
  course_version_id: Uuid,
  title: String,
  description: Option<String>,
  content_type: ContentType,
  content_url: Option<String>,
  order_index: i32,
  duration_minutes: i32,
  is_free: bool,
  created_at: DateTime<Utc>,
}

impl Lesson {
  #[allow(clippy::too_many_arguments)]
  pub fn new(course_version_id: Uuid,
             title: impl Into<String>,
             description: Option<String>,
             content_type: ContentType,
             content_url: Option<String>,
             order_index: i32,
             duration_minutes: i32,
             is_free: bool)
             -> Result<Self, DomainError> {
    let title = title.into();
    if title.trim().is_empty() {
      return Err(DomainError::ValidationError("El título de la lección no puede estar vacío".to_string()));
    }
    if order_index < 0 {
      return Err(DomainError::ValidationError("El índice de orden no puede ser negativo".to_string()));
    }
    if duration_minutes < 0 {
      return Err(DomainError::ValidationError("La duración no puede ser negativa".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              course_version_id,
              title,
              description,
              content_type,
              content_url,
              order_index,
              duration_minutes,
              is_free,
              created_at: Utc::now() })
  }

  /// Reconstruye una lección desde persistencia.
  #[allow(clippy::too_many_arguments)]
  pub fn from_parts(id: Uuid,
                    course_version_id: Uuid,
                    title: String,
                    description: Option<String>,
                    content_type: ContentType,
                    content_url: Option<String>,
                    order_index: i32,
                    duration_minutes: i32,
                    is_free: bool,
                    created_at: DateTime<Utc>)
                    -> Self {
    Self { id,
           course_version_id,
           title,
           description,
           content_type,
           content_url,
           order_index,
           duration_minutes,
           is_free,
           created_at }
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn course_version_id(&self) -> Uuid {
    self.course_version_id
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn content_type(&self) -> ContentType {
    self.content_type
  }

  pub fn content_url(&self) -> Option<&str> {
    self.content_url.as_deref()
  }

  pub fn order_index(&self) -> i32 {
    self.order_index
  }

  pub fn duration_minutes(&self) -> i32 {
    self.duration_minutes
  }

  pub fn is_free(&self) -> bool {
    self.is_free
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }
}

impl fmt::Display for Lesson {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Lesson(#{} {}, version: {})",
           self.order_index, self.title, self.course_version_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lesson_requires_title() {
    let res = Lesson::new(Uuid::new_v4(), "", None, ContentType::Video, None, 0, 10, false);
    assert!(matches!(res, Err(DomainError::ValidationError(_))));
  }

  #[test]
  fn content_type_round_trips_through_str() {
    for t in [ContentType::Video, ContentType::Pdf, ContentType::Text, ContentType::Interactive, ContentType::Quiz] {
      assert_eq!(t.as_str().parse::<ContentType>().expect("parse"), t);
    }
  }
}
